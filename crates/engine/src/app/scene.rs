use super::input::InputSnapshot;
use super::physics::PhysicsWorld;
use super::registry::GameRegistry;
use crate::level::LevelLibrary;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Menu,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    HardResetTo(SceneKey),
    Quit,
}

/// Session state shared by every scene: the physics world, the game
/// registry, and the level library. The registry deliberately survives
/// hard scene resets; a level transition keeps score, coins, and lives.
pub struct SessionContext {
    pub physics: PhysicsWorld,
    pub registry: GameRegistry,
    pub levels: LevelLibrary,
}

impl SessionContext {
    pub fn new(levels: LevelLibrary) -> Self {
        Self {
            physics: PhysicsWorld::default(),
            registry: GameRegistry::default(),
            levels,
        }
    }
}

pub trait Scene {
    fn load(&mut self, context: &mut SessionContext);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        context: &mut SessionContext,
    ) -> SceneCommand;
    fn unload(&mut self, context: &mut SessionContext);
    fn debug_title(&self, _context: &SessionContext) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

pub struct SceneMachine {
    menu: SceneRuntime,
    level: SceneRuntime,
    active_scene: SceneKey,
    context: SessionContext,
}

impl SceneMachine {
    pub fn new(
        menu: Box<dyn Scene>,
        level: Box<dyn Scene>,
        active_scene: SceneKey,
        context: SessionContext,
    ) -> Self {
        Self {
            menu: SceneRuntime {
                scene: menu,
                is_loaded: false,
            },
            level: SceneRuntime {
                scene: level,
                is_loaded: false,
            },
            active_scene,
            context,
        }
    }

    pub fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn load_active(&mut self) {
        let runtime = match self.active_scene {
            SceneKey::Menu => &mut self.menu,
            SceneKey::Level => &mut self.level,
        };
        if runtime.is_loaded {
            return;
        }
        runtime.scene.load(&mut self.context);
        runtime.is_loaded = true;
    }

    pub fn update_active(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> SceneCommand {
        let runtime = match self.active_scene {
            SceneKey::Menu => &mut self.menu,
            SceneKey::Level => &mut self.level,
        };
        runtime
            .scene
            .update(fixed_dt_seconds, input, &mut self.context)
    }

    pub fn debug_title_active(&self) -> Option<String> {
        let runtime = match self.active_scene {
            SceneKey::Menu => &self.menu,
            SceneKey::Level => &self.level,
        };
        runtime.scene.debug_title(&self.context)
    }

    pub fn switch_to(&mut self, next_scene: SceneKey) -> bool {
        if self.active_scene == next_scene {
            return false;
        }
        self.load_scene_if_needed(next_scene);
        self.active_scene = next_scene;
        true
    }

    /// Unloads the target scene if needed, clears the physics world, and
    /// loads it fresh. The registry is untouched; this is the level
    /// transition path, not a new session.
    pub fn hard_reset_to(&mut self, next_scene: SceneKey) -> bool {
        {
            let runtime = Self::runtime_mut(&mut self.menu, &mut self.level, next_scene);
            if runtime.is_loaded {
                runtime.scene.unload(&mut self.context);
            }
        }
        self.context.physics.clear();
        {
            let runtime = Self::runtime_mut(&mut self.menu, &mut self.level, next_scene);
            runtime.scene.load(&mut self.context);
            runtime.is_loaded = true;
        }
        let changed = self.active_scene != next_scene;
        self.active_scene = next_scene;
        changed
    }

    pub fn shutdown_all(&mut self) {
        for key in [SceneKey::Menu, SceneKey::Level] {
            let runtime = Self::runtime_mut(&mut self.menu, &mut self.level, key);
            if runtime.is_loaded {
                runtime.scene.unload(&mut self.context);
                runtime.is_loaded = false;
            }
        }
        self.context.physics.clear();
    }

    fn load_scene_if_needed(&mut self, key: SceneKey) {
        let runtime = Self::runtime_mut(&mut self.menu, &mut self.level, key);
        if runtime.is_loaded {
            return;
        }
        runtime.scene.load(&mut self.context);
        runtime.is_loaded = true;
    }

    fn runtime_mut<'a>(
        menu: &'a mut SceneRuntime,
        level: &'a mut SceneRuntime,
        key: SceneKey,
    ) -> &'a mut SceneRuntime {
        match key {
            SceneKey::Menu => menu,
            SceneKey::Level => level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::physics::Body;

    struct CountingScene {
        loads: u32,
        updates: u32,
        unloads: u32,
        command: SceneCommand,
        spawn_body_on_load: bool,
    }

    impl CountingScene {
        fn new(spawn_body_on_load: bool) -> Self {
            Self {
                loads: 0,
                updates: 0,
                unloads: 0,
                command: SceneCommand::None,
                spawn_body_on_load,
            }
        }
    }

    impl Scene for CountingScene {
        fn load(&mut self, context: &mut SessionContext) {
            self.loads += 1;
            if self.spawn_body_on_load {
                context.physics.create_body(Body::new(0.0, 0.0, 8.0, 8.0));
            }
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _context: &mut SessionContext,
        ) -> SceneCommand {
            self.updates += 1;
            self.command
        }

        fn unload(&mut self, _context: &mut SessionContext) {
            self.unloads += 1;
        }
    }

    fn machine_with_counting_scenes() -> SceneMachine {
        SceneMachine::new(
            Box::new(CountingScene::new(false)),
            Box::new(CountingScene::new(true)),
            SceneKey::Menu,
            SessionContext::new(LevelLibrary::empty()),
        )
    }

    #[test]
    fn load_active_is_idempotent() {
        let mut machine = machine_with_counting_scenes();
        machine.load_active();
        machine.load_active();
        assert_eq!(machine.active_scene(), SceneKey::Menu);
    }

    #[test]
    fn switch_to_same_scene_is_noop() {
        let mut machine = machine_with_counting_scenes();
        machine.load_active();
        assert!(!machine.switch_to(SceneKey::Menu));
        assert!(machine.switch_to(SceneKey::Level));
        assert_eq!(machine.active_scene(), SceneKey::Level);
    }

    #[test]
    fn hard_reset_clears_physics_and_reloads() {
        let mut machine = machine_with_counting_scenes();
        machine.load_active();
        machine.switch_to(SceneKey::Level);
        assert_eq!(machine.context().physics.body_count(), 1);

        machine
            .context_mut()
            .physics
            .create_body(Body::new(1.0, 1.0, 4.0, 4.0));
        machine.hard_reset_to(SceneKey::Level);

        // Only the body spawned by the fresh load remains.
        assert_eq!(machine.context().physics.body_count(), 1);
    }

    #[test]
    fn hard_reset_preserves_registry() {
        let mut machine = machine_with_counting_scenes();
        machine.load_active();
        machine.context_mut().registry.new_session("level1", 2);
        machine.context_mut().registry.add_score(300);
        machine.context_mut().registry.drain_events();

        machine.hard_reset_to(SceneKey::Level);

        assert_eq!(machine.context().registry.score(), 300);
        assert_eq!(machine.context().registry.lives(), 2);
    }
}
