use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::tmx::{load_level, LevelError};
use super::types::LevelMap;

/// Catalog of loadable levels. In the shipped app this is a directory of
/// .tmx files discovered at startup; tests build one from in-memory maps
/// instead.
pub struct LevelLibrary {
    levels_dir: Option<PathBuf>,
    names: Vec<String>,
    preloaded: Vec<LevelMap>,
}

impl LevelLibrary {
    pub fn empty() -> Self {
        Self {
            levels_dir: None,
            names: Vec::new(),
            preloaded: Vec::new(),
        }
    }

    pub fn from_maps(maps: Vec<LevelMap>) -> Self {
        let names = maps.iter().map(|map| map.name().to_string()).collect();
        Self {
            levels_dir: None,
            names,
            preloaded: maps,
        }
    }

    pub fn discover(levels_dir: &Path) -> Result<Self, LevelError> {
        let entries = fs::read_dir(levels_dir).map_err(|source| LevelError::Scan {
            path: levels_dir.to_path_buf(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LevelError::Scan {
                path: levels_dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("tmx") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();

        info!(
            levels_dir = %levels_dir.display(),
            level_count = names.len(),
            "levels_discovered"
        );
        Ok(Self {
            levels_dir: Some(levels_dir.to_path_buf()),
            names,
            preloaded: Vec::new(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|known| known == name)
    }

    pub fn load(&self, name: &str) -> Result<LevelMap, LevelError> {
        if let Some(map) = self.preloaded.iter().find(|map| map.name() == name) {
            return Ok(map.clone());
        }
        if let Some(levels_dir) = &self.levels_dir {
            if self.contains(name) {
                return load_level(&levels_dir.join(format!("{name}.tmx")));
            }
        }
        Err(LevelError::UnknownLevel {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY_TMX: &str = r#"
<map width="2" height="2" tilewidth="16" tileheight="16">
  <layer><data encoding="csv">0,0,1,1</data></layer>
</map>
"#;

    #[test]
    fn discover_lists_tmx_stems_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("level2.tmx"), TINY_TMX).expect("write");
        fs::write(dir.path().join("level1.tmx"), TINY_TMX).expect("write");
        fs::write(dir.path().join("notes.txt"), "ignore me").expect("write");

        let library = LevelLibrary::discover(dir.path()).expect("discover");
        assert_eq!(library.names(), ["level1", "level2"]);
    }

    #[test]
    fn load_reads_discovered_level_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("level1.tmx"), TINY_TMX).expect("write");

        let library = LevelLibrary::discover(dir.path()).expect("discover");
        let map = library.load("level1").expect("load");
        assert_eq!(map.name(), "level1");
        assert_eq!(map.solid_count(), 2);
    }

    #[test]
    fn unknown_level_is_an_error() {
        let library = LevelLibrary::empty();
        let error = library.load("level9").expect_err("unknown");
        assert!(matches!(error, LevelError::UnknownLevel { name } if name == "level9"));
    }

    #[test]
    fn preloaded_maps_win_over_disk() {
        let map = crate::level::tmx::parse_level("level1", TINY_TMX).expect("parse");
        let library = LevelLibrary::from_maps(vec![map]);
        assert!(library.contains("level1"));
        assert_eq!(library.load("level1").expect("load").solid_count(), 2);
    }
}
