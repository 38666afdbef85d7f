use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod level;

pub use app::{
    run_app, run_app_with_context, AppError, Body, BodyId, GameRegistry, InputAction, InputFeed,
    InputSnapshot, LoopConfig, LoopMetricsSnapshot, PhysicsWorld, PlayerSize, Rect, RegistryEvent,
    SavedRegistry, Scene, SceneCommand, SceneKey, SceneMachine, SessionContext, Sides, SolidGrid,
    SolidGridError, SpawnPoint, TimerQueue, Vec2, DEFAULT_GRAVITY_Y, REGISTRY_STATE_FILE,
    SLOW_TICK_ENV_VAR,
};
pub use level::{
    load_level, BoxContent, CollectibleEffect, LevelError, LevelLibrary, LevelMap,
    PortalDirection, SpawnDesc, SpawnKind,
};

pub const ROOT_ENV_VAR: &str = "PIPEWORLD_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub levels_dir: PathBuf,
    pub state_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create state directory at {path}: {source}")]
    CreateStateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "PIPEWORLD_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or levels/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or levels/.\n\
Set {env_var} explicitly, for example:\n\
PowerShell: $env:{env_var}=\"C:\\path\\to\\pipeworld\"\n\
Bash/zsh: export {env_var}=\"/path/to/pipeworld\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let levels_dir = root.join("levels");
    let state_dir = root.join("state");

    fs::create_dir_all(&state_dir).map_err(|source| StartupError::CreateStateDir {
        path: state_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        levels_dir,
        state_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_levels = path.join("levels").is_dir();

    cargo_toml && (has_crates || has_levels)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
