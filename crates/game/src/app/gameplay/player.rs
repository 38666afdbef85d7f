/// What the player wants this tick, separated from what actually
/// happens to the world. Firing is resolved by the scene because it
/// needs the bullet slot and the physics world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PlayerIntent {
    fire: bool,
}

struct PlayerAvatar {
    body: BodyId,
    size: PlayerSize,
    facing: Facing,
    life: LifeState,
    invulnerable_ticks_left: u64,
}

fn body_dimensions(size: PlayerSize) -> (f32, f32) {
    match size {
        PlayerSize::Small => (SMALL_BODY_WIDTH, SMALL_BODY_HEIGHT),
        PlayerSize::Big => (BIG_BODY_WIDTH, BIG_BODY_HEIGHT),
    }
}

impl PlayerAvatar {
    fn spawn(physics: &mut PhysicsWorld, x: f32, y: f32, size: PlayerSize) -> Self {
        let (width, height) = body_dimensions(size);
        let mut body = Body::new(x, y, width, height);
        body.max_velocity = engine::Vec2 {
            x: MAX_VELOCITY_X,
            y: MAX_VELOCITY_Y,
        };
        let body_id = physics.create_body(body);
        Self {
            body: body_id,
            size,
            facing: Facing::Right,
            life: LifeState::Alive,
            invulnerable_ticks_left: 0,
        }
    }

    fn is_invulnerable(&self) -> bool {
        self.invulnerable_ticks_left > 0
    }

    /// Resolves this tick's input into motion and an intent. The chain is
    /// ordered on held keys: run right wins over firing, firing wins over
    /// running left, and firing deliberately leaves the current motion
    /// untouched. Holding shoot keeps the fire intent up every tick.
    fn resolve_input(
        &mut self,
        input: &InputSnapshot,
        tuning: &Tuning,
        physics: &mut PhysicsWorld,
    ) -> PlayerIntent {
        let mut intent = PlayerIntent::default();
        if self.invulnerable_ticks_left > 0 {
            self.invulnerable_ticks_left -= 1;
        }

        let Some(body) = physics.body_mut(self.body) else {
            return intent;
        };

        match self.life {
            LifeState::Dying => return intent,
            LifeState::Dancing => {
                Self::drift_toward_dance_target(body);
                return intent;
            }
            LifeState::Alive => {}
        }

        if input.is_down(InputAction::Right) {
            body.acceleration.x = tuning.run_acceleration;
            self.facing = Facing::Right;
        } else if input.is_down(InputAction::Shoot) {
            intent.fire = true;
        } else if input.is_down(InputAction::Left) {
            body.acceleration.x = -tuning.run_acceleration;
            self.facing = Facing::Left;
        } else {
            body.velocity.x = 0.0;
            body.acceleration.x = 0.0;
        }

        if input.is_down(InputAction::Jump) && body.on_floor() {
            body.velocity.y = tuning.jump_velocity;
        }

        intent
    }

    fn drift_toward_dance_target(body: &mut Body) {
        let center_x = body.center().x;
        if (center_x - DANCE_TARGET_X).abs() <= 1.0 {
            body.position.x = DANCE_TARGET_X - body.width / 2.0;
            body.velocity.x = 0.0;
        } else if center_x < DANCE_TARGET_X {
            body.velocity.x = DANCE_DRIFT_SPEED;
        } else {
            body.velocity.x = -DANCE_DRIFT_SPEED;
        }
        body.acceleration.x = 0.0;
    }

    fn grow(&mut self, physics: &mut PhysicsWorld) {
        if self.size == PlayerSize::Big {
            return;
        }
        self.size = PlayerSize::Big;
        if let Some(body) = physics.body_mut(self.body) {
            body.resize(BIG_BODY_WIDTH, BIG_BODY_HEIGHT);
        }
    }

    fn shrink(&mut self, physics: &mut PhysicsWorld) {
        self.size = PlayerSize::Small;
        self.invulnerable_ticks_left = INVULNERABILITY_TICKS;
        if let Some(body) = physics.body_mut(self.body) {
            body.resize(SMALL_BODY_WIDTH, SMALL_BODY_HEIGHT);
        }
    }

    /// Lethal-hit transition: the body leaps upward with every collision
    /// side disabled, so it falls straight through the level on the way
    /// out.
    fn start_dying(&mut self, physics: &mut PhysicsWorld) {
        self.life = LifeState::Dying;
        if let Some(body) = physics.body_mut(self.body) {
            body.velocity = engine::Vec2 {
                x: 0.0,
                y: DEATH_LEAP_VELOCITY,
            };
            body.acceleration = engine::Vec2::default();
            body.check_collision = engine::Sides::none();
        }
    }

    fn start_dance(&mut self, physics: &mut PhysicsWorld) {
        self.life = LifeState::Dancing;
        if let Some(body) = physics.body_mut(self.body) {
            body.stop();
        }
    }

    fn revive_at(&mut self, physics: &mut PhysicsWorld, spawn: SpawnPoint) {
        self.life = LifeState::Alive;
        self.invulnerable_ticks_left = INVULNERABILITY_TICKS;
        if let Some(body) = physics.body_mut(self.body) {
            body.position = engine::Vec2 {
                x: spawn.x,
                y: spawn.y,
            };
            body.stop();
            body.check_collision = engine::Sides::all();
        }
    }
}

/// At most one bullet exists at a time. Firing with a live bullet
/// repositions it at the muzzle without touching its expiry timer, so a
/// rapid second shot still dies on the first shot's schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BulletSlot {
    body: Option<BodyId>,
}

impl BulletSlot {
    fn fire(
        &mut self,
        physics: &mut PhysicsWorld,
        timers: &mut TimerQueue<TimerAction>,
        now_tick: u64,
        muzzle: engine::Vec2,
        facing: Facing,
        tuning: &Tuning,
    ) {
        let velocity_x = facing.sign() * tuning.bullet_speed;
        if let Some(existing) = self.body {
            if let Some(body) = physics.body_mut(existing) {
                body.position = engine::Vec2 {
                    x: muzzle.x - BULLET_WIDTH / 2.0,
                    y: muzzle.y - BULLET_HEIGHT / 2.0,
                };
                body.velocity.x = velocity_x;
                return;
            }
            self.body = None;
        }

        let mut body = Body::new(
            muzzle.x - BULLET_WIDTH / 2.0,
            muzzle.y - BULLET_HEIGHT / 2.0,
            BULLET_WIDTH,
            BULLET_HEIGHT,
        );
        body.allow_gravity = false;
        body.velocity.x = velocity_x;
        self.body = Some(physics.create_body(body));
        timers.schedule(now_tick, BULLET_LIFETIME_TICKS, TimerAction::ExpireBullet);
    }

    fn remove(&mut self, physics: &mut PhysicsWorld) {
        if let Some(body) = self.body.take() {
            physics.remove_body(body);
        }
    }
}
