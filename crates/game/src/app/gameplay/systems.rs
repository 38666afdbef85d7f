/// Category pairs the dispatcher walks every tick, in a fixed order.
/// Earlier pairs see the world before later ones; the player/enemy pair
/// runs first so a lethal hit settles before portals or pickups look at
/// the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchPair {
    PlayerEnemy,
    BulletEnemy,
    PlayerBox,
    PlayerBrick,
    PlayerCollectible,
    PlayerPortal,
    PlayerPlatform,
    PlayerPrincess,
}

const DISPATCH_ORDER: [DispatchPair; 8] = [
    DispatchPair::PlayerEnemy,
    DispatchPair::BulletEnemy,
    DispatchPair::PlayerBox,
    DispatchPair::PlayerBrick,
    DispatchPair::PlayerCollectible,
    DispatchPair::PlayerPortal,
    DispatchPair::PlayerPlatform,
    DispatchPair::PlayerPrincess,
];

struct DispatchContext<'a> {
    physics: &'a mut PhysicsWorld,
    registry: &'a mut GameRegistry,
    input: &'a InputSnapshot,
    player: &'a mut PlayerAvatar,
    bullet: &'a mut BulletSlot,
    enemies: &'a mut Vec<Enemy>,
    boxes: &'a mut Vec<BoxEntity>,
    bricks: &'a [Brick],
    collectibles: &'a mut Vec<Collectible>,
    portals: &'a [Portal],
    platforms: &'a [Platform],
    princess: &'a Option<Princess>,
    levels: &'a LevelLibrary,
    timers: &'a mut TimerQueue<TimerAction>,
    events: &'a mut GameplayEventBus,
    effects: &'a mut EffectQueue,
    next_entity_id: &'a mut u64,
    now_tick: u64,
    pending_command: &'a mut SceneCommand,
}

fn run_dispatch_pair(pair: DispatchPair, ctx: &mut DispatchContext<'_>) {
    match pair {
        DispatchPair::PlayerEnemy => dispatch_player_enemy(ctx),
        DispatchPair::BulletEnemy => dispatch_bullet_enemy(ctx),
        DispatchPair::PlayerBox => dispatch_player_box(ctx),
        DispatchPair::PlayerBrick => dispatch_player_brick(ctx),
        DispatchPair::PlayerCollectible => dispatch_player_collectible(ctx),
        DispatchPair::PlayerPortal => dispatch_player_portal(ctx),
        DispatchPair::PlayerPlatform => dispatch_player_platform(ctx),
        DispatchPair::PlayerPrincess => dispatch_player_princess(ctx),
    }
}

fn dispatch_player_enemy(ctx: &mut DispatchContext<'_>) {
    if ctx.player.life != LifeState::Alive {
        return;
    }
    for enemy in ctx.enemies.iter_mut() {
        if enemy.state != EnemyState::Walking {
            continue;
        }
        if !ctx.physics.collide(ctx.player.body, enemy.body) {
            continue;
        }

        let stomped = ctx
            .physics
            .body(enemy.body)
            .map(|body| body.touching.up)
            .unwrap_or(false);
        if stomped {
            squash_enemy(enemy, ctx.physics, ctx.timers, ctx.effects, ctx.now_tick);
            if let Some(body) = ctx.physics.body_mut(ctx.player.body) {
                body.velocity.y = STOMP_BOUNCE_VELOCITY;
                let center = body.center();
                ctx.effects.emit(EffectKind::StompHop, center.x, center.y);
            }
            ctx.registry.add_score(STOMP_SCORE);
            ctx.events
                .emit(GameplayEvent::EnemyStomped { enemy_id: enemy.id });
        } else {
            resolve_lethal_contact(
                ctx.physics,
                ctx.registry,
                ctx.player,
                ctx.timers,
                ctx.events,
                ctx.effects,
                ctx.now_tick,
            );
            if ctx.player.life != LifeState::Alive {
                return;
            }
        }
    }
}

fn dispatch_bullet_enemy(ctx: &mut DispatchContext<'_>) {
    let Some(bullet_body) = ctx.bullet.body else {
        return;
    };
    for enemy in ctx.enemies.iter_mut() {
        if enemy.state != EnemyState::Walking {
            continue;
        }
        if !ctx.physics.overlap(bullet_body, enemy.body) {
            continue;
        }
        ctx.bullet.remove(ctx.physics);
        squash_enemy(enemy, ctx.physics, ctx.timers, ctx.effects, ctx.now_tick);
        ctx.registry.add_score(SHOT_SCORE);
        ctx.events
            .emit(GameplayEvent::EnemyShot { enemy_id: enemy.id });
        return;
    }
}

fn dispatch_player_box(ctx: &mut DispatchContext<'_>) {
    if ctx.player.life != LifeState::Alive {
        return;
    }
    for entity in ctx.boxes.iter_mut() {
        if !ctx.physics.collide(ctx.player.body, entity.body) {
            continue;
        }
        let bumped_from_below = ctx
            .physics
            .body(entity.body)
            .map(|body| body.touching.down)
            .unwrap_or(false);
        if !bumped_from_below || entity.used {
            continue;
        }
        entity.used = true;

        let Some(box_rect) = ctx.physics.body(entity.body).map(Body::rect) else {
            continue;
        };
        ctx.effects
            .emit(EffectKind::BoxBounce, box_rect.center().x, box_rect.y);
        ctx.events.emit(GameplayEvent::BoxOpened {
            content: entity.content,
        });

        match entity.content {
            BoxContent::Coin | BoxContent::RotatingCoin => {
                ctx.registry.add_coins(1);
                ctx.registry.add_score(BOX_COIN_SCORE);
                ctx.effects
                    .emit(EffectKind::CoinRise, box_rect.center().x, box_rect.y);
            }
            BoxContent::Flower => {
                let flower_id = spawn_box_collectible(
                    ctx.physics,
                    ctx.collectibles,
                    ctx.next_entity_id,
                    box_rect,
                    CollectibleEffect::Flower,
                    CollectibleState::Emerging,
                );
                ctx.timers.schedule(
                    ctx.now_tick,
                    FLOWER_RISE_TICKS,
                    TimerAction::ActivateFlower(flower_id),
                );
                ctx.effects
                    .emit(EffectKind::ContentReveal, box_rect.center().x, box_rect.y);
            }
            BoxContent::Mushroom | BoxContent::Star => {
                let effect = if entity.content == BoxContent::Mushroom {
                    CollectibleEffect::Mushroom
                } else {
                    CollectibleEffect::Star
                };
                spawn_box_collectible(
                    ctx.physics,
                    ctx.collectibles,
                    ctx.next_entity_id,
                    box_rect,
                    effect,
                    CollectibleState::Active,
                );
                ctx.effects
                    .emit(EffectKind::ContentReveal, box_rect.center().x, box_rect.y);
            }
            BoxContent::Empty => {}
        }
    }
}

// Bricks are plain colliders; a bump from below only bounces them.
fn dispatch_player_brick(ctx: &mut DispatchContext<'_>) {
    if ctx.player.life != LifeState::Alive {
        return;
    }
    for brick in ctx.bricks {
        if !ctx.physics.collide(ctx.player.body, brick.body) {
            continue;
        }
        let bumped_from_below = ctx
            .physics
            .body(brick.body)
            .map(|body| body.touching.down)
            .unwrap_or(false);
        if !bumped_from_below {
            continue;
        }
        if let Some(rect) = ctx.physics.body(brick.body).map(Body::rect) {
            ctx.effects.emit(EffectKind::BoxBounce, rect.center().x, rect.y);
        }
    }
}

fn dispatch_player_collectible(ctx: &mut DispatchContext<'_>) {
    if ctx.player.life != LifeState::Alive {
        return;
    }
    let mut picked: Vec<EntityId> = Vec::new();
    for collectible in ctx.collectibles.iter() {
        if collectible.state != CollectibleState::Active {
            continue;
        }
        if !ctx.physics.overlap(ctx.player.body, collectible.body) {
            continue;
        }
        if collectible.effect == CollectibleEffect::Mushroom {
            ctx.player.grow(ctx.physics);
        }
        ctx.registry.add_score(collectible.points);
        ctx.events.emit(GameplayEvent::CollectiblePicked {
            effect: collectible.effect,
        });
        picked.push(collectible.id);
    }
    if picked.is_empty() {
        return;
    }
    let physics = &mut *ctx.physics;
    ctx.collectibles.retain(|collectible| {
        if picked.contains(&collectible.id) {
            physics.remove_body(collectible.body);
            false
        } else {
            true
        }
    });
}

fn dispatch_player_portal(ctx: &mut DispatchContext<'_>) {
    if ctx.player.life != LifeState::Alive {
        return;
    }
    for portal in ctx.portals {
        if !ctx.physics.overlap(ctx.player.body, portal.body) {
            continue;
        }
        match &portal.target {
            PortalTarget::Exit => {
                ctx.events.emit(GameplayEvent::LevelExited);
                *ctx.pending_command = SceneCommand::SwitchTo(SceneKey::Menu);
                return;
            }
            PortalTarget::Level {
                direction,
                destination,
                spawn,
            } => {
                let entering = match direction {
                    PortalDirection::Down => ctx.input.is_down(InputAction::Down),
                    PortalDirection::Right => ctx.input.is_down(InputAction::Right),
                };
                if !entering {
                    continue;
                }
                if !ctx.levels.contains(destination) {
                    warn!(destination = %destination, "portal_destination_unknown");
                    continue;
                }
                ctx.registry.set_level(destination);
                ctx.registry.set_spawn(*spawn);
                ctx.events.emit(GameplayEvent::PortalEntered);
                *ctx.pending_command = SceneCommand::HardResetTo(SceneKey::Level);
                return;
            }
        }
    }
}

fn dispatch_player_platform(ctx: &mut DispatchContext<'_>) {
    if ctx.player.life != LifeState::Alive {
        return;
    }
    for platform in ctx.platforms {
        if !ctx.physics.collide(ctx.player.body, platform.body) {
            continue;
        }
        let standing = ctx
            .physics
            .body(platform.body)
            .map(|body| body.touching.up)
            .unwrap_or(false);
        if !standing || platform.axis != PlatformAxis::Horizontal {
            continue;
        }
        // The ride: keep the player's center over the platform's.
        let Some(platform_center_x) =
            ctx.physics.body(platform.body).map(|body| body.center().x)
        else {
            continue;
        };
        if let Some(body) = ctx.physics.body_mut(ctx.player.body) {
            body.position.x = platform_center_x - body.width / 2.0;
        }
    }
}

fn dispatch_player_princess(ctx: &mut DispatchContext<'_>) {
    if ctx.player.life != LifeState::Alive {
        return;
    }
    let Some(princess) = ctx.princess else {
        return;
    };
    if !ctx.physics.overlap(ctx.player.body, princess.body) {
        return;
    }
    ctx.player.start_dance(ctx.physics);
    ctx.timers
        .schedule(ctx.now_tick, DANCE_EXIT_TICKS, TimerAction::FinishDance);
    ctx.events.emit(GameplayEvent::DanceStarted);
    if let Some(body) = ctx.physics.body(ctx.player.body) {
        let center = body.center();
        ctx.effects.emit(EffectKind::DanceSway, center.x, center.y);
    }
}

fn squash_enemy(
    enemy: &mut Enemy,
    physics: &mut PhysicsWorld,
    timers: &mut TimerQueue<TimerAction>,
    effects: &mut EffectQueue,
    now_tick: u64,
) {
    enemy.state = EnemyState::Squashed;
    if let Some(body) = physics.body_mut(enemy.body) {
        body.stop();
        body.enable = false;
        let center = body.center();
        effects.emit(EffectKind::EnemyFade, center.x, center.y);
    }
    timers.schedule(now_tick, ENEMY_FADE_TICKS, TimerAction::RemoveEnemy(enemy.id));
}

/// Enemy contact that was not a stomp. With lives in reserve the hit
/// costs one and sends the player back to the spawn point; on the last
/// life a big player shrinks and a small player starts dying.
fn resolve_lethal_contact(
    physics: &mut PhysicsWorld,
    registry: &mut GameRegistry,
    player: &mut PlayerAvatar,
    timers: &mut TimerQueue<TimerAction>,
    events: &mut GameplayEventBus,
    effects: &mut EffectQueue,
    now_tick: u64,
) {
    if player.is_invulnerable() {
        return;
    }
    if registry.lives() > 0 {
        let lives_left = registry.lose_life();
        player.revive_at(physics, registry.spawn());
        events.emit(GameplayEvent::PlayerRevived { lives_left });
        return;
    }
    if player.size == PlayerSize::Big {
        player.shrink(physics);
        events.emit(GameplayEvent::PlayerDamaged);
    } else {
        begin_death(physics, player, timers, events, effects, now_tick);
    }
}

/// Starts the death leap and schedules the exit back to the menu.
/// Ignores invulnerability and remaining lives; callers decide whether
/// those soften the hit first.
fn begin_death(
    physics: &mut PhysicsWorld,
    player: &mut PlayerAvatar,
    timers: &mut TimerQueue<TimerAction>,
    events: &mut GameplayEventBus,
    effects: &mut EffectQueue,
    now_tick: u64,
) {
    player.start_dying(physics);
    if let Some(body) = physics.body(player.body) {
        let center = body.center();
        effects.emit(EffectKind::DeathLeap, center.x, center.y);
    }
    events.emit(GameplayEvent::PlayerDied);
    timers.schedule(now_tick, DEATH_EXIT_TICKS, TimerAction::FinishDeath);
}

fn spawn_box_collectible(
    physics: &mut PhysicsWorld,
    collectibles: &mut Vec<Collectible>,
    next_entity_id: &mut u64,
    box_rect: Rect,
    effect: CollectibleEffect,
    state: CollectibleState,
) -> EntityId {
    let id = EntityId(*next_entity_id);
    *next_entity_id = next_entity_id.saturating_add(1);

    let mut body = Body::new(
        box_rect.center().x - COLLECTIBLE_WIDTH / 2.0,
        box_rect.y - COLLECTIBLE_HEIGHT,
        COLLECTIBLE_WIDTH,
        COLLECTIBLE_HEIGHT,
    );
    match state {
        CollectibleState::Emerging => {
            // Dormant on top of the box until the rise timer enables it.
            body.allow_gravity = false;
            body.enable = false;
        }
        CollectibleState::Active => {
            body.velocity.x = COLLECTIBLE_WALK_SPEED;
        }
    }
    let body_id = physics.create_body(body);
    collectibles.push(Collectible {
        id,
        body: body_id,
        effect,
        points: BOX_COLLECTIBLE_SCORE,
        state,
    });
    id
}
