use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::level::{LevelError, LevelLibrary};
use crate::{resolve_app_paths, StartupError};

use super::metrics::MetricsAccumulator;
use super::registry::GameRegistry;
use super::scene::{Scene, SceneCommand, SceneKey, SceneMachine, SessionContext};
use super::{InputSnapshot, LoopMetricsSnapshot};

pub const REGISTRY_STATE_FILE: &str = "registry.json";

/// Produces one input snapshot per tick. The embedding owns the device
/// plumbing; the loop only ever sees snapshots.
pub trait InputFeed {
    fn next_tick(&mut self) -> InputSnapshot;
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub tick_hz: u32,
    pub max_ticks: Option<u64>,
    pub start_scene: SceneKey,
    /// Disabled by tests that want to chew through ticks as fast as
    /// possible.
    pub sleep_between_ticks: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            max_ticks: None,
            start_scene: SceneKey::Menu,
            sleep_between_ticks: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("failed to persist registry state to {path}: {source}")]
    SaveState {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn run_app(
    config: LoopConfig,
    menu: Box<dyn Scene>,
    level: Box<dyn Scene>,
    feed: &mut dyn InputFeed,
) -> Result<LoopMetricsSnapshot, AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        levels_dir = %app_paths.levels_dir.display(),
        state_dir = %app_paths.state_dir.display(),
        "startup"
    );

    let levels = LevelLibrary::discover(&app_paths.levels_dir)?;
    let mut context = SessionContext::new(levels);
    let state_path = app_paths.state_dir.join(REGISTRY_STATE_FILE);
    if let Some(saved) = GameRegistry::restore_from(&state_path) {
        info!(level = %saved.level, score = saved.score, "registry_state_restored");
        context.registry.apply_saved(saved);
    }

    run_app_with_context(config, menu, level, feed, context, Some(state_path))
}

/// Loop body shared with tests: no path resolution, no disk discovery,
/// registry persistence only when a state path is provided.
pub fn run_app_with_context(
    config: LoopConfig,
    menu: Box<dyn Scene>,
    level: Box<dyn Scene>,
    feed: &mut dyn InputFeed,
    context: SessionContext,
    state_path: Option<PathBuf>,
) -> Result<LoopMetricsSnapshot, AppError> {
    let tick_hz = config.tick_hz.max(1);
    let fixed_dt_seconds = 1.0 / tick_hz as f32;
    let tick_duration = Duration::from_secs_f64(1.0 / tick_hz as f64);

    let mut machine = SceneMachine::new(menu, level, config.start_scene, context);
    machine.load_active();

    let mut metrics = MetricsAccumulator::with_threshold_from_env();
    let mut ticks_run = 0u64;

    loop {
        if let Some(max_ticks) = config.max_ticks {
            if ticks_run >= max_ticks {
                debug!(ticks_run, "max_ticks_reached");
                break;
            }
        }

        let input = feed.next_tick();
        if input.quit_requested() {
            break;
        }

        let tick_start = Instant::now();
        let command = machine.update_active(fixed_dt_seconds, &input);
        metrics.record_tick(tick_start.elapsed());
        ticks_run = ticks_run.saturating_add(1);

        match command {
            SceneCommand::None => {}
            SceneCommand::SwitchTo(next_scene) => {
                machine.switch_to(next_scene);
            }
            SceneCommand::HardResetTo(next_scene) => {
                machine.hard_reset_to(next_scene);
            }
            SceneCommand::Quit => break,
        }

        if config.sleep_between_ticks {
            let elapsed = tick_start.elapsed();
            if elapsed < tick_duration {
                thread::sleep(tick_duration - elapsed);
            }
        }
    }

    machine.shutdown_all();

    if let Some(state_path) = state_path {
        machine
            .context()
            .registry
            .save_to(&state_path)
            .map_err(|source| AppError::SaveState {
                path: state_path,
                source,
            })?;
    }

    let snapshot = metrics.snapshot();
    info!(
        tick_count = snapshot.tick_count,
        slow_tick_count = snapshot.slow_tick_count,
        average_tick_ms = snapshot.average_tick_ms,
        max_tick_ms = snapshot.max_tick_ms,
        "loop_finished"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::InputAction;

    struct ScriptedFeed {
        snapshots: Vec<InputSnapshot>,
        cursor: usize,
    }

    impl ScriptedFeed {
        fn new(snapshots: Vec<InputSnapshot>) -> Self {
            Self {
                snapshots,
                cursor: 0,
            }
        }

        fn idle() -> Self {
            Self::new(Vec::new())
        }
    }

    impl InputFeed for ScriptedFeed {
        fn next_tick(&mut self) -> InputSnapshot {
            let snapshot = self
                .snapshots
                .get(self.cursor)
                .copied()
                .unwrap_or_else(InputSnapshot::empty);
            self.cursor += 1;
            snapshot
        }
    }

    struct ProbeScene {
        command_on_update: SceneCommand,
        updates_seen: std::rc::Rc<std::cell::Cell<u64>>,
    }

    impl Scene for ProbeScene {
        fn load(&mut self, _context: &mut SessionContext) {}

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _context: &mut SessionContext,
        ) -> SceneCommand {
            self.updates_seen.set(self.updates_seen.get() + 1);
            self.command_on_update
        }

        fn unload(&mut self, _context: &mut SessionContext) {}
    }

    fn test_config(max_ticks: u64) -> LoopConfig {
        LoopConfig {
            max_ticks: Some(max_ticks),
            sleep_between_ticks: false,
            ..LoopConfig::default()
        }
    }

    fn probe_pair() -> (
        Box<dyn Scene>,
        Box<dyn Scene>,
        std::rc::Rc<std::cell::Cell<u64>>,
    ) {
        let updates = std::rc::Rc::new(std::cell::Cell::new(0));
        let menu = Box::new(ProbeScene {
            command_on_update: SceneCommand::None,
            updates_seen: updates.clone(),
        });
        let level = Box::new(ProbeScene {
            command_on_update: SceneCommand::None,
            updates_seen: updates.clone(),
        });
        (menu, level, updates)
    }

    #[test]
    fn runs_exactly_max_ticks() {
        let (menu, level, updates) = probe_pair();
        let mut feed = ScriptedFeed::idle();
        let snapshot = run_app_with_context(
            test_config(25),
            menu,
            level,
            &mut feed,
            SessionContext::new(LevelLibrary::empty()),
            None,
        )
        .expect("loop");

        assert_eq!(snapshot.tick_count, 25);
        assert_eq!(updates.get(), 25);
    }

    #[test]
    fn quit_requested_stops_the_loop_before_update() {
        let (menu, level, updates) = probe_pair();
        let mut feed = ScriptedFeed::new(vec![
            InputSnapshot::empty(),
            InputSnapshot::empty().with_quit_requested(true),
        ]);
        let snapshot = run_app_with_context(
            test_config(100),
            menu,
            level,
            &mut feed,
            SessionContext::new(LevelLibrary::empty()),
            None,
        )
        .expect("loop");

        assert_eq!(snapshot.tick_count, 1);
        assert_eq!(updates.get(), 1);
    }

    #[test]
    fn quit_command_from_scene_stops_the_loop() {
        let updates = std::rc::Rc::new(std::cell::Cell::new(0));
        let menu = Box::new(ProbeScene {
            command_on_update: SceneCommand::Quit,
            updates_seen: updates.clone(),
        });
        let level = Box::new(ProbeScene {
            command_on_update: SceneCommand::None,
            updates_seen: updates.clone(),
        });
        let mut feed = ScriptedFeed::idle();
        let snapshot = run_app_with_context(
            test_config(100),
            menu,
            level,
            &mut feed,
            SessionContext::new(LevelLibrary::empty()),
            None,
        )
        .expect("loop");

        assert_eq!(snapshot.tick_count, 1);
    }

    #[test]
    fn registry_state_is_flushed_on_exit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state_path = dir.path().join(REGISTRY_STATE_FILE);

        let (menu, level, _) = probe_pair();
        let mut context = SessionContext::new(LevelLibrary::empty());
        context.registry.new_session("level1", 2);
        context.registry.add_score(800);
        context.registry.drain_events();

        let mut feed = ScriptedFeed::idle();
        run_app_with_context(
            test_config(3),
            menu,
            level,
            &mut feed,
            context,
            Some(state_path.clone()),
        )
        .expect("loop");

        let saved = GameRegistry::restore_from(&state_path).expect("saved state");
        assert_eq!(saved.score, 800);
    }

    #[test]
    fn switch_command_changes_active_scene_for_next_tick() {
        // Menu switches to Level on its first update; Level then records
        // the remaining updates.
        let menu_updates = std::rc::Rc::new(std::cell::Cell::new(0));
        let level_updates = std::rc::Rc::new(std::cell::Cell::new(0));
        let menu = Box::new(ProbeScene {
            command_on_update: SceneCommand::SwitchTo(SceneKey::Level),
            updates_seen: menu_updates.clone(),
        });
        let level = Box::new(ProbeScene {
            command_on_update: SceneCommand::None,
            updates_seen: level_updates.clone(),
        });
        let mut feed = ScriptedFeed::idle();
        run_app_with_context(
            test_config(5),
            menu,
            level,
            &mut feed,
            SessionContext::new(LevelLibrary::empty()),
            None,
        )
        .expect("loop");

        assert_eq!(menu_updates.get(), 1);
        assert_eq!(level_updates.get(), 4);
    }

    #[test]
    fn snapshot_from_actions_feed_shape_is_stable() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::Jump, true)
            .advanced_with(&[InputAction::Jump]);
        assert!(snapshot.is_down(InputAction::Jump));
        assert!(!snapshot.pressed(InputAction::Jump));
    }
}
