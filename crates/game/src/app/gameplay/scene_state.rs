struct GameplayScene {
    level_name: String,
    solids: SolidGrid,
    player: Option<PlayerAvatar>,
    bullet: BulletSlot,
    enemies: Vec<Enemy>,
    boxes: Vec<BoxEntity>,
    bricks: Vec<Brick>,
    collectibles: Vec<Collectible>,
    portals: Vec<Portal>,
    platforms: Vec<Platform>,
    princess: Option<Princess>,
    timers: TimerQueue<TimerAction>,
    events: GameplayEventBus,
    effects: EffectQueue,
    next_entity_id: u64,
    now_tick: u64,
    pending_command: SceneCommand,
    tuning: Tuning,
}

impl GameplayScene {
    fn new(tuning: Tuning) -> Self {
        Self {
            level_name: String::new(),
            solids: SolidGrid::empty(),
            player: None,
            bullet: BulletSlot::default(),
            enemies: Vec::new(),
            boxes: Vec::new(),
            bricks: Vec::new(),
            collectibles: Vec::new(),
            portals: Vec::new(),
            platforms: Vec::new(),
            princess: None,
            timers: TimerQueue::new(),
            events: GameplayEventBus::default(),
            effects: EffectQueue::default(),
            next_entity_id: 0,
            now_tick: 0,
            pending_command: SceneCommand::None,
            tuning,
        }
    }

    fn alloc_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);
        id
    }

    /// Populates the physics world from a parsed level. The spawn point
    /// recorded in the registry wins over the level's own player object;
    /// a zeroed spawn means no portal has been taken yet.
    fn populate_from_map(&mut self, map: &LevelMap, context: &mut SessionContext) {
        self.level_name = map.name().to_string();

        let mut player_spawn: Option<(f32, f32)> = None;
        for desc in map.spawns() {
            match &desc.kind {
                SpawnKind::Player => {
                    player_spawn = Some((desc.x, desc.y));
                }
                SpawnKind::Goomba => {
                    let id = self.alloc_entity_id();
                    let mut body = Body::new(desc.x, desc.y, desc.width, desc.height);
                    body.velocity.x = -GOOMBA_WALK_SPEED;
                    let body_id = context.physics.create_body(body);
                    self.enemies.push(Enemy {
                        id,
                        body: body_id,
                        state: EnemyState::Walking,
                        walk_velocity: -GOOMBA_WALK_SPEED,
                    });
                }
                SpawnKind::Princess => {
                    let id = self.alloc_entity_id();
                    let mut body = Body::new(desc.x, desc.y, desc.width, desc.height);
                    body.immovable = true;
                    body.allow_gravity = false;
                    let body_id = context.physics.create_body(body);
                    self.princess = Some(Princess { id, body: body_id });
                }
                SpawnKind::Brick => {
                    let id = self.alloc_entity_id();
                    let mut body = Body::new(desc.x, desc.y, desc.width, desc.height);
                    body.immovable = true;
                    body.allow_gravity = false;
                    let body_id = context.physics.create_body(body);
                    self.bricks.push(Brick { id, body: body_id });
                }
                SpawnKind::Box { content } => {
                    let id = self.alloc_entity_id();
                    let mut body = Body::new(desc.x, desc.y, desc.width, desc.height);
                    body.immovable = true;
                    body.allow_gravity = false;
                    let body_id = context.physics.create_body(body);
                    self.boxes.push(BoxEntity {
                        id,
                        body: body_id,
                        content: *content,
                        used: false,
                    });
                }
                SpawnKind::Collectible { effect, points } => {
                    let id = self.alloc_entity_id();
                    let mut body = Body::new(desc.x, desc.y, desc.width, desc.height);
                    body.allow_gravity = false;
                    let body_id = context.physics.create_body(body);
                    self.collectibles.push(Collectible {
                        id,
                        body: body_id,
                        effect: *effect,
                        points: *points,
                        state: CollectibleState::Active,
                    });
                }
                SpawnKind::Portal {
                    direction,
                    destination,
                    spawn,
                } => {
                    let id = self.alloc_entity_id();
                    let mut body = Body::new(desc.x, desc.y, desc.width, desc.height);
                    body.immovable = true;
                    body.allow_gravity = false;
                    let body_id = context.physics.create_body(body);
                    self.portals.push(Portal {
                        id,
                        body: body_id,
                        target: PortalTarget::Level {
                            direction: *direction,
                            destination: destination.clone(),
                            spawn: *spawn,
                        },
                    });
                }
                SpawnKind::Exit => {
                    let id = self.alloc_entity_id();
                    let mut body = Body::new(desc.x, desc.y, desc.width, desc.height);
                    body.immovable = true;
                    body.allow_gravity = false;
                    let body_id = context.physics.create_body(body);
                    self.portals.push(Portal {
                        id,
                        body: body_id,
                        target: PortalTarget::Exit,
                    });
                }
                SpawnKind::PlatformLeftRight => {
                    self.spawn_platform(context, desc, PlatformAxis::Horizontal);
                }
                SpawnKind::PlatformUpDown => {
                    self.spawn_platform(context, desc, PlatformAxis::Vertical);
                }
            }
        }

        let registry_spawn = context.registry.spawn();
        let (spawn_x, spawn_y) = if registry_spawn != SpawnPoint::default() {
            (registry_spawn.x, registry_spawn.y)
        } else {
            let (map_x, map_y) = player_spawn.unwrap_or((0.0, 0.0));
            if player_spawn.is_none() {
                warn!(level = %self.level_name, "level_has_no_player_spawn");
            }
            (map_x, map_y)
        };
        // Record the resolved spawn so a later revive lands here.
        context.registry.set_spawn(SpawnPoint {
            x: spawn_x,
            y: spawn_y,
        });
        self.player = Some(PlayerAvatar::spawn(
            &mut context.physics,
            spawn_x,
            spawn_y,
            context.registry.player_size(),
        ));
    }

    fn spawn_platform(
        &mut self,
        context: &mut SessionContext,
        desc: &engine::SpawnDesc,
        axis: PlatformAxis,
    ) {
        let id = self.alloc_entity_id();
        let mut body = Body::new(desc.x, desc.y, desc.width, desc.height);
        body.immovable = true;
        body.allow_gravity = false;
        let body_id = context.physics.create_body(body);
        self.platforms.push(Platform {
            id,
            body: body_id,
            axis,
            origin_x: desc.x,
            origin_y: desc.y,
            forward: true,
        });
    }

    /// Pre-physics motion for everything that is not the player: enemies
    /// keep walking and flip when blocked, emerged collectibles flip the
    /// same way, and platforms oscillate around their origin.
    fn advance_autonomous_bodies(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        for enemy in &mut self.enemies {
            if enemy.state != EnemyState::Walking {
                continue;
            }
            let Some(body) = physics.body_mut(enemy.body) else {
                continue;
            };
            if body.blocked.left {
                enemy.walk_velocity = enemy.walk_velocity.abs();
            } else if body.blocked.right {
                enemy.walk_velocity = -enemy.walk_velocity.abs();
            }
            body.velocity.x = enemy.walk_velocity;
        }

        for collectible in &self.collectibles {
            if collectible.state != CollectibleState::Active {
                continue;
            }
            let Some(body) = physics.body_mut(collectible.body) else {
                continue;
            };
            if body.allow_gravity {
                if body.blocked.left {
                    body.velocity.x = COLLECTIBLE_WALK_SPEED;
                } else if body.blocked.right {
                    body.velocity.x = -COLLECTIBLE_WALK_SPEED;
                }
            }
        }

        for platform in &mut self.platforms {
            let Some(body) = physics.body_mut(platform.body) else {
                continue;
            };
            let step = PLATFORM_SPEED * dt * if platform.forward { 1.0 } else { -1.0 };
            match platform.axis {
                PlatformAxis::Horizontal => {
                    body.position.x += step;
                    let offset = body.position.x - platform.origin_x;
                    if offset.abs() >= PLATFORM_TRAVEL_RANGE {
                        platform.forward = !platform.forward;
                        body.position.x =
                            platform.origin_x + PLATFORM_TRAVEL_RANGE * offset.signum();
                    }
                }
                PlatformAxis::Vertical => {
                    body.position.y += step;
                    let offset = body.position.y - platform.origin_y;
                    if offset.abs() >= PLATFORM_TRAVEL_RANGE {
                        platform.forward = !platform.forward;
                        body.position.y =
                            platform.origin_y + PLATFORM_TRAVEL_RANGE * offset.signum();
                    }
                }
            }
        }
    }

    fn apply_timer_action(&mut self, action: TimerAction, context: &mut SessionContext) {
        match action {
            TimerAction::ExpireBullet => {
                self.bullet.remove(&mut context.physics);
            }
            TimerAction::RemoveEnemy(enemy_id) => {
                let physics = &mut context.physics;
                self.enemies.retain(|enemy| {
                    if enemy.id == enemy_id {
                        physics.remove_body(enemy.body);
                        false
                    } else {
                        true
                    }
                });
            }
            TimerAction::ActivateFlower(collectible_id) => {
                let Some(collectible) = self
                    .collectibles
                    .iter_mut()
                    .find(|collectible| collectible.id == collectible_id)
                else {
                    return;
                };
                collectible.state = CollectibleState::Active;
                if let Some(body) = context.physics.body_mut(collectible.body) {
                    body.enable = true;
                }
            }
            TimerAction::FinishDance | TimerAction::FinishDeath => {
                self.pending_command = SceneCommand::SwitchTo(SceneKey::Menu);
            }
        }
    }

    /// A live player that has fallen below the level dies outright;
    /// reserve lives and invulnerability only soften enemy contact, not
    /// the pit.
    fn handle_fall_out(&mut self, context: &mut SessionContext) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        if player.life != LifeState::Alive {
            return;
        }
        let Some(body) = context.physics.body(player.body) else {
            return;
        };
        if body.position.y <= self.solids.pixel_height() {
            return;
        }
        begin_death(
            &mut context.physics,
            player,
            &mut self.timers,
            &mut self.events,
            &mut self.effects,
            self.now_tick,
        );
    }

    fn drain_registry_notifications(&mut self, context: &mut SessionContext) {
        for event in context.registry.drain_events() {
            match event {
                engine::RegistryEvent::ScoreChanged(score) => {
                    debug!(score, "score_changed");
                }
                engine::RegistryEvent::CoinsChanged(coins) => {
                    debug!(coins, "coins_changed");
                }
                engine::RegistryEvent::LivesChanged(lives) => {
                    info!(lives, "lives_changed");
                }
            }
        }
    }

    fn clear_level_state(&mut self, context: &mut SessionContext) {
        if let Some(player) = self.player.take() {
            context.physics.remove_body(player.body);
        }
        self.bullet.remove(&mut context.physics);
        for enemy in self.enemies.drain(..) {
            context.physics.remove_body(enemy.body);
        }
        for entity in self.boxes.drain(..) {
            context.physics.remove_body(entity.body);
        }
        for brick in self.bricks.drain(..) {
            context.physics.remove_body(brick.body);
        }
        for collectible in self.collectibles.drain(..) {
            context.physics.remove_body(collectible.body);
        }
        for portal in self.portals.drain(..) {
            context.physics.remove_body(portal.body);
        }
        for platform in self.platforms.drain(..) {
            context.physics.remove_body(platform.body);
        }
        if let Some(princess) = self.princess.take() {
            context.physics.remove_body(princess.body);
        }
        self.solids = SolidGrid::empty();
        self.level_name.clear();
        self.next_entity_id = 0;
        self.pending_command = SceneCommand::None;
        self.timers.bump_epoch();
        self.events.clear();
        self.effects.drain();
    }
}
