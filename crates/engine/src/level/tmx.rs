use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::app::SpawnPoint;

use super::types::{
    BoxContent, CollectibleEffect, LevelMap, PortalDirection, SpawnDesc, SpawnKind,
};

const EXIT_PORTAL_NAME: &str = "exit";

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level XML in {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: roxmltree::Error,
    },
    #[error("level {source_name} is missing required element <{element}>")]
    MissingElement {
        source_name: String,
        element: &'static str,
    },
    #[error("level {source_name} has an invalid or missing value for {what}")]
    InvalidValue {
        source_name: String,
        what: &'static str,
    },
    #[error("level {name} tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("unknown level '{name}'")]
    UnknownLevel { name: String },
    #[error("failed to scan levels directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn load_level(path: &Path) -> Result<LevelMap, LevelError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("level");
    parse_level(name, &raw)
}

/// Parses a TMX document. The collision layer is the first tile layer;
/// any non-zero gid is a solid cell. Objects come from the first object
/// group; unrecognized object types are skipped with a warning so a level
/// authored for a newer build still loads.
pub(crate) fn parse_level(name: &str, xml: &str) -> Result<LevelMap, LevelError> {
    let document = roxmltree::Document::parse(xml).map_err(|source| LevelError::Parse {
        source_name: name.to_string(),
        source,
    })?;
    let map = document.root_element();
    if !map.has_tag_name("map") {
        return Err(LevelError::MissingElement {
            source_name: name.to_string(),
            element: "map",
        });
    }

    let width = required_attr_u32(name, &map, "width")?;
    let height = required_attr_u32(name, &map, "height")?;
    let tile_width = required_attr_f32(name, &map, "tilewidth")?;
    let tile_height = required_attr_f32(name, &map, "tileheight")?;

    let layer = map
        .children()
        .find(|node| node.has_tag_name("layer"))
        .ok_or_else(|| LevelError::MissingElement {
            source_name: name.to_string(),
            element: "layer",
        })?;
    let data = layer
        .children()
        .find(|node| node.has_tag_name("data"))
        .ok_or_else(|| LevelError::MissingElement {
            source_name: name.to_string(),
            element: "data",
        })?;
    let csv = data.text().unwrap_or_default();

    let mut solid = Vec::with_capacity(width as usize * height as usize);
    for token in csv.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let gid: u32 = token.parse().map_err(|_| LevelError::InvalidValue {
            source_name: name.to_string(),
            what: "tile gid",
        })?;
        solid.push(gid != 0);
    }

    let mut spawns = Vec::new();
    if let Some(object_group) = map.children().find(|node| node.has_tag_name("objectgroup")) {
        for object in object_group
            .children()
            .filter(|node| node.has_tag_name("object"))
        {
            match parse_object(name, &object)? {
                Some(spawn) => spawns.push(spawn),
                None => continue,
            }
        }
    }

    LevelMap::from_parts(name, width, height, tile_width, tile_height, solid, spawns)
}

fn parse_object(
    level_name: &str,
    object: &roxmltree::Node<'_, '_>,
) -> Result<Option<SpawnDesc>, LevelError> {
    let object_name = object.attribute("name").unwrap_or_default().to_string();
    let object_type = object
        .attribute("type")
        .or_else(|| object.attribute("class"))
        .unwrap_or_default();
    let x = required_attr_f32(level_name, object, "x")?;
    let y = required_attr_f32(level_name, object, "y")?;
    let width = optional_attr_f32(level_name, object, "width")?.unwrap_or(0.0);
    let height = optional_attr_f32(level_name, object, "height")?.unwrap_or(0.0);

    let kind = match object_type {
        "player" => SpawnKind::Player,
        "goomba" => SpawnKind::Goomba,
        "princess" => SpawnKind::Princess,
        "brick" => SpawnKind::Brick,
        "box" => SpawnKind::Box {
            content: BoxContent::from_token(
                property_value(object, "content").unwrap_or_default(),
            ),
        },
        "collectible" => SpawnKind::Collectible {
            effect: CollectibleEffect::from_token(
                property_value(object, "effect").unwrap_or_default(),
            ),
            points: property_value(object, "points")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(0),
        },
        "portal" => {
            if object_name == EXIT_PORTAL_NAME {
                SpawnKind::Exit
            } else {
                let direction = match property_value(object, "direction") {
                    Some("down") => PortalDirection::Down,
                    Some("right") => PortalDirection::Right,
                    _ => {
                        return Err(LevelError::InvalidValue {
                            source_name: level_name.to_string(),
                            what: "portal direction",
                        })
                    }
                };
                let destination = property_value(object, "destination")
                    .ok_or_else(|| LevelError::InvalidValue {
                        source_name: level_name.to_string(),
                        what: "portal destination",
                    })?
                    .to_string();
                let spawn_x = property_value(object, "spawnX")
                    .and_then(|raw| raw.parse().ok())
                    .ok_or_else(|| LevelError::InvalidValue {
                        source_name: level_name.to_string(),
                        what: "portal spawnX",
                    })?;
                let spawn_y = property_value(object, "spawnY")
                    .and_then(|raw| raw.parse().ok())
                    .ok_or_else(|| LevelError::InvalidValue {
                        source_name: level_name.to_string(),
                        what: "portal spawnY",
                    })?;
                SpawnKind::Portal {
                    direction,
                    destination,
                    spawn: SpawnPoint {
                        x: spawn_x,
                        y: spawn_y,
                    },
                }
            }
        }
        "platformMovingLeftAndRight" => SpawnKind::PlatformLeftRight,
        "platformMovingUpAndDown" => SpawnKind::PlatformUpDown,
        other => {
            warn!(
                level = level_name,
                object_type = other,
                object_name = %object_name,
                "unknown_object_type_skipped"
            );
            return Ok(None);
        }
    };

    Ok(Some(SpawnDesc {
        name: object_name,
        kind,
        x,
        y,
        width,
        height,
    }))
}

fn property_value<'a>(object: &roxmltree::Node<'a, '_>, key: &str) -> Option<&'a str> {
    object
        .children()
        .find(|node| node.has_tag_name("properties"))?
        .children()
        .find(|node| node.has_tag_name("property") && node.attribute("name") == Some(key))?
        .attribute("value")
}

fn required_attr_u32(
    level_name: &str,
    node: &roxmltree::Node<'_, '_>,
    attribute: &'static str,
) -> Result<u32, LevelError> {
    node.attribute(attribute)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| LevelError::InvalidValue {
            source_name: level_name.to_string(),
            what: attribute,
        })
}

fn required_attr_f32(
    level_name: &str,
    node: &roxmltree::Node<'_, '_>,
    attribute: &'static str,
) -> Result<f32, LevelError> {
    node.attribute(attribute)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| LevelError::InvalidValue {
            source_name: level_name.to_string(),
            what: attribute,
        })
}

fn optional_attr_f32(
    level_name: &str,
    node: &roxmltree::Node<'_, '_>,
    attribute: &'static str,
) -> Result<Option<f32>, LevelError> {
    match node.attribute(attribute) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| LevelError::InvalidValue {
                source_name: level_name.to_string(),
                what: attribute,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TMX: &str = r#"
<map version="1.2" width="4" height="3" tilewidth="16" tileheight="16">
  <layer name="collision" width="4" height="3">
    <data encoding="csv">
0,0,0,0,
0,0,0,0,
1,1,1,1
    </data>
  </layer>
  <objectgroup name="objects">
    <object name="mario" type="player" x="16" y="16" width="16" height="16"/>
    <object name="walker" type="goomba" x="32" y="16" width="16" height="16"/>
    <object name="box1" type="box" x="48" y="16" width="16" height="16">
      <properties>
        <property name="content" value="coin"/>
      </properties>
    </object>
    <object name="pipe1" type="portal" x="48" y="32" width="16" height="16">
      <properties>
        <property name="direction" value="down"/>
        <property name="destination" value="level2"/>
        <property name="spawnX" value="40"/>
        <property name="spawnY" value="48"/>
      </properties>
    </object>
    <object name="exit" type="portal" x="0" y="32" width="16" height="16"/>
    <object name="decor" type="cloud" x="8" y="8"/>
  </objectgroup>
</map>
"#;

    #[test]
    fn parses_dimensions_and_solid_cells() {
        let map = parse_level("sample", SAMPLE_TMX).expect("parse");
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        assert_eq!(map.solid_count(), 4);
        assert!(map.is_solid(0, 2));
        assert!(!map.is_solid(0, 0));
    }

    #[test]
    fn parses_objects_and_skips_unknown_types() {
        let map = parse_level("sample", SAMPLE_TMX).expect("parse");
        assert_eq!(map.spawns().len(), 5);

        let player = map
            .spawns()
            .iter()
            .find(|spawn| spawn.kind == SpawnKind::Player)
            .expect("player");
        assert_eq!(player.name, "mario");
        assert!((player.x - 16.0).abs() < 0.001);

        assert!(map
            .spawns()
            .iter()
            .any(|spawn| spawn.kind == SpawnKind::Box {
                content: BoxContent::Coin
            }));
    }

    #[test]
    fn portal_properties_are_required() {
        let broken = r#"
<map width="1" height="1" tilewidth="16" tileheight="16">
  <layer><data encoding="csv">0</data></layer>
  <objectgroup>
    <object name="pipe" type="portal" x="0" y="0"/>
  </objectgroup>
</map>
"#;
        let error = parse_level("broken", broken).expect_err("portal without properties");
        assert!(matches!(error, LevelError::InvalidValue { what, .. } if what == "portal direction"));
    }

    #[test]
    fn exit_named_portal_needs_no_properties() {
        let map = parse_level("sample", SAMPLE_TMX).expect("parse");
        assert!(map
            .spawns()
            .iter()
            .any(|spawn| spawn.kind == SpawnKind::Exit && spawn.name == "exit"));
    }

    #[test]
    fn portal_spawn_round_trips() {
        let map = parse_level("sample", SAMPLE_TMX).expect("parse");
        let portal = map
            .spawns()
            .iter()
            .find_map(|spawn| match &spawn.kind {
                SpawnKind::Portal {
                    direction,
                    destination,
                    spawn,
                } => Some((*direction, destination.clone(), *spawn)),
                _ => None,
            })
            .expect("portal");
        assert_eq!(portal.0, PortalDirection::Down);
        assert_eq!(portal.1, "level2");
        assert!((portal.2.x - 40.0).abs() < 0.001);
        assert!((portal.2.y - 48.0).abs() < 0.001);
    }

    #[test]
    fn missing_layer_is_an_error() {
        let broken = r#"<map width="1" height="1" tilewidth="16" tileheight="16"></map>"#;
        let error = parse_level("broken", broken).expect_err("no layer");
        assert!(matches!(
            error,
            LevelError::MissingElement { element: "layer", .. }
        ));
    }

    #[test]
    fn tile_count_mismatch_is_reported() {
        let broken = r#"
<map width="4" height="4" tilewidth="16" tileheight="16">
  <layer><data encoding="csv">0,0,0</data></layer>
</map>
"#;
        let error = parse_level("broken", broken).expect_err("short csv");
        assert!(matches!(
            error,
            LevelError::TileCountMismatch {
                expected: 16,
                actual: 3,
                ..
            }
        ));
    }
}
