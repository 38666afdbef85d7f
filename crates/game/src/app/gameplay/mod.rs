use std::fs;
use std::path::Path;

use engine::{
    Body, BodyId, BoxContent, CollectibleEffect, GameRegistry, InputAction, InputSnapshot,
    LevelLibrary, LevelMap, PhysicsWorld, PlayerSize, PortalDirection, Rect, Scene, SceneCommand,
    SceneKey,
    SessionContext, SolidGrid, SpawnKind, SpawnPoint, TimerQueue,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

const RUN_ACCELERATION: f32 = 500.0;
const JUMP_VELOCITY: f32 = -200.0;
const STOMP_BOUNCE_VELOCITY: f32 = -100.0;
const DEATH_LEAP_VELOCITY: f32 = -180.0;
const MAX_VELOCITY_X: f32 = 50.0;
const MAX_VELOCITY_Y: f32 = 300.0;
const SMALL_BODY_WIDTH: f32 = 6.0;
const SMALL_BODY_HEIGHT: f32 = 12.0;
const BIG_BODY_WIDTH: f32 = 8.0;
const BIG_BODY_HEIGHT: f32 = 16.0;
const BULLET_SPEED: f32 = 300.0;
const BULLET_WIDTH: f32 = 4.0;
const BULLET_HEIGHT: f32 = 4.0;
const BULLET_LIFETIME_TICKS: u64 = 120;
const INVULNERABILITY_TICKS: u64 = 100;
const ENEMY_FADE_TICKS: u64 = 60;
const FLOWER_RISE_TICKS: u64 = 12;
const DANCE_EXIT_TICKS: u64 = 180;
const DEATH_EXIT_TICKS: u64 = 180;
const DANCE_TARGET_X: f32 = 744.0;
const DANCE_DRIFT_SPEED: f32 = 20.0;
const GOOMBA_WALK_SPEED: f32 = 20.0;
const COLLECTIBLE_WALK_SPEED: f32 = 30.0;
const COLLECTIBLE_WIDTH: f32 = 12.0;
const COLLECTIBLE_HEIGHT: f32 = 12.0;
const PLATFORM_TRAVEL_RANGE: f32 = 48.0;
const PLATFORM_SPEED: f32 = 30.0;
const STOMP_SCORE: u32 = 100;
const SHOT_SCORE: u32 = 100;
const BOX_COIN_SCORE: u32 = 100;
const BOX_COLLECTIBLE_SCORE: u32 = 1000;
const DEFAULT_LEVEL: &str = "level1";
const BIG_FRAME_OFFSET: u32 = 6;
const BIG_CROUCH_FRAME: u32 = 13;

include!("types.rs");
include!("player.rs");
include!("systems.rs");
include!("scene_state.rs");
include!("scene_impl.rs");
include!("util.rs");

pub(crate) fn build_level_scene(tuning: Tuning) -> Box<dyn Scene> {
    Box::new(GameplayScene::new(tuning))
}
