use engine::{InputAction, InputSnapshot, Scene, SceneCommand, SceneKey, SessionContext};
use tracing::info;

const DEFAULT_LEVEL: &str = "level1";
const STARTING_LIVES: u32 = 2;

/// Title screen. Owns nothing in the world; its one job is to start a
/// fresh session when the player presses jump.
pub(crate) struct MenuScene;

impl MenuScene {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl Scene for MenuScene {
    fn load(&mut self, _context: &mut SessionContext) {
        info!("menu_ready");
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        context: &mut SessionContext,
    ) -> SceneCommand {
        if input.pressed(InputAction::Jump) {
            context.registry.new_session(DEFAULT_LEVEL, STARTING_LIVES);
            info!(level = DEFAULT_LEVEL, lives = STARTING_LIVES, "session_started");
            return SceneCommand::HardResetTo(SceneKey::Level);
        }
        SceneCommand::None
    }

    fn unload(&mut self, _context: &mut SessionContext) {}

    fn debug_title(&self, _context: &SessionContext) -> Option<String> {
        Some("menu".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::LevelLibrary;

    fn context() -> SessionContext {
        SessionContext::new(LevelLibrary::empty())
    }

    #[test]
    fn idle_input_stays_on_menu() {
        let mut menu = MenuScene::new();
        let mut context = context();
        let command = menu.update(1.0 / 60.0, &InputSnapshot::empty(), &mut context);
        assert_eq!(command, SceneCommand::None);
    }

    #[test]
    fn jump_press_starts_a_session_and_resets_into_the_level() {
        let mut menu = MenuScene::new();
        let mut context = context();
        context.registry.add_score(500);

        let input = InputSnapshot::empty().with_action_down(InputAction::Jump, true);
        let command = menu.update(1.0 / 60.0, &input, &mut context);

        assert_eq!(command, SceneCommand::HardResetTo(SceneKey::Level));
        assert_eq!(context.registry.level(), DEFAULT_LEVEL);
        assert_eq!(context.registry.lives(), STARTING_LIVES);
        assert_eq!(context.registry.score(), 0);
    }

    #[test]
    fn held_jump_does_not_retrigger() {
        let mut menu = MenuScene::new();
        let mut context = context();
        let held = InputSnapshot::empty()
            .with_action_down(InputAction::Jump, true)
            .with_previous_action_down(InputAction::Jump, true);
        let command = menu.update(1.0 / 60.0, &held, &mut context);
        assert_eq!(command, SceneCommand::None);
    }
}
