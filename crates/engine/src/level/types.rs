use crate::app::{SolidGrid, SolidGridError, SpawnPoint};

use super::tmx::LevelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalDirection {
    Down,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxContent {
    Coin,
    RotatingCoin,
    Flower,
    Mushroom,
    Star,
    Empty,
}

impl BoxContent {
    /// Level data is hand-authored; anything unrecognized degrades to an
    /// empty box instead of failing the load.
    pub fn from_token(token: &str) -> Self {
        match token {
            "coin" => Self::Coin,
            "rotatingCoin" => Self::RotatingCoin,
            "flower" => Self::Flower,
            "mushroom" => Self::Mushroom,
            "star" => Self::Star,
            _ => Self::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectibleEffect {
    Mushroom,
    Flower,
    Star,
    Other,
}

impl CollectibleEffect {
    pub fn from_token(token: &str) -> Self {
        match token {
            "mushroom" => Self::Mushroom,
            "flower" => Self::Flower,
            "star" => Self::Star,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnKind {
    Player,
    Goomba,
    Princess,
    Brick,
    Box {
        content: BoxContent,
    },
    Collectible {
        effect: CollectibleEffect,
        points: u32,
    },
    Portal {
        direction: PortalDirection,
        destination: String,
        spawn: SpawnPoint,
    },
    Exit,
    PlatformLeftRight,
    PlatformUpDown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnDesc {
    pub name: String,
    pub kind: SpawnKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelMap {
    name: String,
    width: u32,
    height: u32,
    tile_width: f32,
    tile_height: f32,
    solid: Vec<bool>,
    spawns: Vec<SpawnDesc>,
}

impl LevelMap {
    pub fn from_parts(
        name: &str,
        width: u32,
        height: u32,
        tile_width: f32,
        tile_height: f32,
        solid: Vec<bool>,
        spawns: Vec<SpawnDesc>,
    ) -> Result<Self, LevelError> {
        let expected = width as usize * height as usize;
        if solid.len() != expected {
            return Err(LevelError::TileCountMismatch {
                name: name.to_string(),
                expected,
                actual: solid.len(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            tile_width,
            tile_height,
            solid,
            spawns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> f32 {
        self.tile_height
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_width
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_height
    }

    pub fn is_solid(&self, tile_x: u32, tile_y: u32) -> bool {
        if tile_x >= self.width || tile_y >= self.height {
            return false;
        }
        self.solid[tile_y as usize * self.width as usize + tile_x as usize]
    }

    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|cell| **cell).count()
    }

    pub fn spawns(&self) -> &[SpawnDesc] {
        &self.spawns
    }

    pub fn solid_grid(&self) -> Result<SolidGrid, SolidGridError> {
        SolidGrid::new(
            self.width,
            self.height,
            self.tile_width,
            self.tile_height,
            self.solid.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_content_tokens_are_lenient() {
        assert_eq!(BoxContent::from_token("coin"), BoxContent::Coin);
        assert_eq!(BoxContent::from_token("rotatingCoin"), BoxContent::RotatingCoin);
        assert_eq!(BoxContent::from_token("mystery?!"), BoxContent::Empty);
    }

    #[test]
    fn collectible_effect_tokens_are_lenient() {
        assert_eq!(
            CollectibleEffect::from_token("mushroom"),
            CollectibleEffect::Mushroom
        );
        assert_eq!(CollectibleEffect::from_token("???"), CollectibleEffect::Other);
    }

    #[test]
    fn from_parts_rejects_cell_count_mismatch() {
        let error = LevelMap::from_parts("broken", 4, 4, 16.0, 16.0, vec![false; 5], Vec::new())
            .expect_err("mismatch");
        assert!(matches!(error, LevelError::TileCountMismatch { .. }));
    }

    #[test]
    fn solid_lookup_is_false_outside_bounds() {
        let map = LevelMap::from_parts("tiny", 2, 2, 16.0, 16.0, vec![true; 4], Vec::new())
            .expect("map");
        assert!(map.is_solid(1, 1));
        assert!(!map.is_solid(2, 0));
        assert!(!map.is_solid(0, 2));
    }
}
