mod input;
mod loop_runner;
mod metrics;
mod physics;
mod registry;
mod scene;
mod timer;

pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{
    run_app, run_app_with_context, AppError, InputFeed, LoopConfig, REGISTRY_STATE_FILE,
};
pub use metrics::{LoopMetricsSnapshot, SLOW_TICK_ENV_VAR};
pub use physics::{
    Body, BodyId, PhysicsWorld, Rect, Sides, SolidGrid, SolidGridError, DEFAULT_GRAVITY_Y,
};
pub use registry::{GameRegistry, PlayerSize, RegistryEvent, SavedRegistry, SpawnPoint};
pub use scene::{Scene, SceneCommand, SceneKey, SceneMachine, SessionContext, Vec2};
pub use timer::TimerQueue;
