mod library;
mod tmx;
mod types;

pub use library::LevelLibrary;
pub use tmx::{load_level, LevelError};
pub use types::{
    BoxContent, CollectibleEffect, LevelMap, PortalDirection, SpawnDesc, SpawnKind,
};
