use engine::{resolve_app_paths, InputFeed, InputSnapshot, LoopConfig, Scene};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, Tuning};
use super::menu::MenuScene;

const MAX_TICKS_ENV_VAR: &str = "PIPEWORLD_MAX_TICKS";
const TUNING_FILE: &str = "tuning.json";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) menu: Box<dyn Scene>,
    pub(crate) level: Box<dyn Scene>,
    pub(crate) feed: Box<dyn InputFeed>,
}

/// Default feed for headless runs: no device is wired up, so every tick
/// sees an empty snapshot. Embeddings with real input swap this out.
struct IdleFeed;

impl InputFeed for IdleFeed {
    fn next_tick(&mut self) -> InputSnapshot {
        InputSnapshot::empty()
    }
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Pipeworld Startup ===");

    let tuning = match resolve_app_paths() {
        Ok(paths) => gameplay::load_tuning(&paths.root.join(TUNING_FILE)),
        Err(error) => {
            warn!(error = %error, "tuning_skipped_no_root");
            Tuning::default()
        }
    };

    let config = LoopConfig {
        max_ticks: parse_max_ticks_from_env(),
        ..LoopConfig::default()
    };

    AppWiring {
        config,
        menu: Box::new(MenuScene::new()),
        level: gameplay::build_level_scene(tuning),
        feed: Box::new(IdleFeed),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_max_ticks_from_env() -> Option<u64> {
    let raw = std::env::var(MAX_TICKS_ENV_VAR).ok()?;
    match raw.trim().parse() {
        Ok(ticks) => Some(ticks),
        Err(_) => {
            warn!(value = %raw, "invalid_max_ticks_ignored");
            None
        }
    }
}
