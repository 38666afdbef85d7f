use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSize {
    #[default]
    Small,
    Big,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    ScoreChanged(u32),
    CoinsChanged(u32),
    LivesChanged(u32),
}

/// Session-wide shared state. Every mutator writes the field first and only
/// then queues the matching notification; observers drain the queue after
/// the write has landed, so a handler reacting to `ScoreChanged` always
/// sees the new score.
#[derive(Debug, Default)]
pub struct GameRegistry {
    score: u32,
    coins: u32,
    lives: u32,
    level: String,
    spawn: SpawnPoint,
    player_size: PlayerSize,
    events: Vec<RegistryEvent>,
}

impl GameRegistry {
    pub fn new_session(&mut self, level: &str, lives: u32) {
        self.score = 0;
        self.coins = 0;
        self.lives = lives;
        self.level = level.to_string();
        self.spawn = SpawnPoint::default();
        self.player_size = PlayerSize::Small;
        self.events.clear();
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn spawn(&self) -> SpawnPoint {
        self.spawn
    }

    pub fn player_size(&self) -> PlayerSize {
        self.player_size
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.events.push(RegistryEvent::ScoreChanged(self.score));
    }

    pub fn add_coins(&mut self, coins: u32) {
        self.coins = self.coins.saturating_add(coins);
        self.events.push(RegistryEvent::CoinsChanged(self.coins));
    }

    /// Consumes one life, returning the lives left after the write.
    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(RegistryEvent::LivesChanged(self.lives));
        self.lives
    }

    pub fn set_level(&mut self, level: &str) {
        self.level = level.to_string();
    }

    pub fn set_spawn(&mut self, spawn: SpawnPoint) {
        self.spawn = spawn;
    }

    pub fn set_player_size(&mut self, player_size: PlayerSize) {
        self.player_size = player_size;
    }

    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn to_saved(&self) -> SavedRegistry {
        SavedRegistry {
            save_version: SAVE_VERSION,
            score: self.score,
            coins: self.coins,
            lives: self.lives,
            level: self.level.clone(),
            spawn: self.spawn,
            player_size: self.player_size,
        }
    }

    pub fn apply_saved(&mut self, saved: SavedRegistry) {
        self.score = saved.score;
        self.coins = saved.coins;
        self.lives = saved.lives;
        self.level = saved.level;
        self.spawn = saved.spawn;
        self.player_size = saved.player_size;
        self.events.clear();
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.to_saved())
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
        write_text_atomic(path, &json)
    }

    /// Loads a previously saved registry. Missing file and malformed
    /// content both yield `None`; a corrupt save must not stop the app.
    pub fn restore_from(path: &Path) -> Option<SavedRegistry> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "registry_state_unreadable");
                return None;
            }
        };
        match serde_json::from_str::<SavedRegistry>(&raw) {
            Ok(saved) if saved.save_version == SAVE_VERSION => Some(saved),
            Ok(saved) => {
                warn!(
                    path = %path.display(),
                    save_version = saved.save_version,
                    "registry_state_version_mismatch"
                );
                None
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "registry_state_malformed");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRegistry {
    pub save_version: u32,
    pub score: u32,
    pub coins: u32,
    pub lives: u32,
    pub level: String,
    pub spawn: SpawnPoint,
    pub player_size: PlayerSize,
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;
    replace_file(&tmp_path, path)
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    match fs::remove_file(final_path) {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(tmp_path);
            return Err(error);
        }
    }

    if let Err(error) = fs::rename(tmp_path, final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("registry.tmp");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
