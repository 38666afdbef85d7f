impl Scene for GameplayScene {
    fn load(&mut self, context: &mut SessionContext) {
        let level_name = if context.registry.level().is_empty() {
            DEFAULT_LEVEL.to_string()
        } else {
            context.registry.level().to_string()
        };
        let map = match context.levels.load(&level_name) {
            Ok(map) => map,
            Err(error) => {
                warn!(level = %level_name, error = %error, "level_load_failed");
                self.pending_command = SceneCommand::SwitchTo(SceneKey::Menu);
                return;
            }
        };
        let solids = match map.solid_grid() {
            Ok(solids) => solids,
            Err(error) => {
                warn!(level = %level_name, error = %error, "level_tile_layer_broken");
                self.pending_command = SceneCommand::SwitchTo(SceneKey::Menu);
                return;
            }
        };

        context.physics.set_gravity_y(self.tuning.gravity_y);
        self.solids = solids;
        self.populate_from_map(&map, context);

        info!(
            level = %self.level_name,
            enemies = self.enemies.len(),
            boxes = self.boxes.len(),
            portals = self.portals.len(),
            solid_tiles = self.solids.solid_count(),
            "level_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        context: &mut SessionContext,
    ) -> SceneCommand {
        self.now_tick = self.now_tick.saturating_add(1);

        let Some(player) = self.player.as_mut() else {
            return std::mem::replace(&mut self.pending_command, SceneCommand::None);
        };

        let intent = player.resolve_input(input, &self.tuning, &mut context.physics);
        if intent.fire {
            if let Some(muzzle) = context.physics.body(player.body).map(Body::center) {
                self.bullet.fire(
                    &mut context.physics,
                    &mut self.timers,
                    self.now_tick,
                    muzzle,
                    player.facing,
                    &self.tuning,
                );
            }
        }

        self.advance_autonomous_bodies(&mut context.physics, fixed_dt_seconds);
        context.physics.step(fixed_dt_seconds, &self.solids);

        // A bullet that ran into level geometry is spent.
        if let Some(bullet_body) = self.bullet.body {
            let hit_wall = context
                .physics
                .body(bullet_body)
                .map(|body| body.blocked.left || body.blocked.right)
                .unwrap_or(true);
            if hit_wall {
                self.bullet.remove(&mut context.physics);
            }
        }

        if let Some(player) = self.player.as_mut() {
            let mut ctx = DispatchContext {
                physics: &mut context.physics,
                registry: &mut context.registry,
                input,
                player,
                bullet: &mut self.bullet,
                enemies: &mut self.enemies,
                boxes: &mut self.boxes,
                bricks: &self.bricks,
                collectibles: &mut self.collectibles,
                portals: &self.portals,
                platforms: &self.platforms,
                princess: &self.princess,
                levels: &context.levels,
                timers: &mut self.timers,
                events: &mut self.events,
                effects: &mut self.effects,
                next_entity_id: &mut self.next_entity_id,
                now_tick: self.now_tick,
                pending_command: &mut self.pending_command,
            };
            for pair in DISPATCH_ORDER {
                run_dispatch_pair(pair, &mut ctx);
            }
        }

        self.handle_fall_out(context);

        for action in self.timers.drain_due(self.now_tick) {
            self.apply_timer_action(action, context);
        }

        if let Some(player) = self.player.as_ref() {
            context.registry.set_player_size(player.size);
        }
        self.drain_registry_notifications(context);

        self.events.finish_tick_rollover();
        let counts = self.events.last_tick_counts();
        if counts.total > 0 {
            debug!(events = counts.total, "gameplay_events");
        }
        self.effects.drain();

        std::mem::replace(&mut self.pending_command, SceneCommand::None)
    }

    fn unload(&mut self, context: &mut SessionContext) {
        let level = std::mem::take(&mut self.level_name);
        self.clear_level_state(context);
        info!(level = %level, "level_unloaded");
    }

    fn debug_title(&self, context: &SessionContext) -> Option<String> {
        Some(format!(
            "{} | score {} coins {} lives {}",
            self.level_name,
            context.registry.score(),
            context.registry.coins(),
            context.registry.lives()
        ))
    }
}
