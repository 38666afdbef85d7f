use thiserror::Error;

use super::scene::Vec2;

const SEPARATION_EPSILON: f32 = 0.0001;

/// Per-side contact flags, arcade style. `check_collision` uses them to
/// gate which sides of a body may collide at all; `touching` and `blocked`
/// report contacts made during the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sides {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Sides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            up: true,
            down: true,
            left: true,
            right: true,
        }
    }

    pub fn any(self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u64);

/// Axis-aligned dynamic body. `position` is the top-left corner in pixels;
/// y grows downward.
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub max_velocity: Vec2,
    pub allow_gravity: bool,
    pub immovable: bool,
    pub enable: bool,
    pub check_collision: Sides,
    pub touching: Sides,
    pub blocked: Sides,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2 { x, y },
            width,
            height,
            velocity: Vec2::default(),
            acceleration: Vec2::default(),
            max_velocity: Vec2 {
                x: 10_000.0,
                y: 10_000.0,
            },
            allow_gravity: true,
            immovable: false,
            enable: true,
            check_collision: Sides::all(),
            touching: Sides::none(),
            blocked: Sides::none(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Changes the body's size while keeping its feet (bottom-center) in
    /// place, the way a character growing or shrinking is expected to stay
    /// planted on the ground it stands on.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.position.x += (self.width - width) / 2.0;
        self.position.y += self.height - height;
        self.width = width;
        self.height = height;
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::default();
        self.acceleration = Vec2::default();
    }

    pub fn on_floor(&self) -> bool {
        self.blocked.down || self.touching.down
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolidGridError {
    #[error("solid cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
}

/// Solid-tile lookup for the static level geometry. Cells outside the grid
/// are treated as open so bodies can leave the level (falling into a pit is
/// gameplay, not a wall).
#[derive(Debug, Clone, PartialEq)]
pub struct SolidGrid {
    width: u32,
    height: u32,
    tile_width: f32,
    tile_height: f32,
    solid: Vec<bool>,
}

impl SolidGrid {
    pub fn new(
        width: u32,
        height: u32,
        tile_width: f32,
        tile_height: f32,
        solid: Vec<bool>,
    ) -> Result<Self, SolidGridError> {
        let expected = width as usize * height as usize;
        let actual = solid.len();
        if expected != actual {
            return Err(SolidGridError::CellCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
            solid,
        })
    }

    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            tile_width: 1.0,
            tile_height: 1.0,
            solid: Vec::new(),
        }
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

    pub fn is_solid(&self, tile_x: i32, tile_y: i32) -> bool {
        if tile_x < 0 || tile_y < 0 {
            return false;
        }
        let (tile_x, tile_y) = (tile_x as u32, tile_y as u32);
        if tile_x >= self.width || tile_y >= self.height {
            return false;
        }
        self.solid[tile_y as usize * self.width as usize + tile_x as usize]
    }

    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|cell| **cell).count()
    }
}

#[derive(Debug)]
pub struct PhysicsWorld {
    gravity_y: f32,
    next_id: u64,
    bodies: Vec<(BodyId, Body)>,
}

pub const DEFAULT_GRAVITY_Y: f32 = 475.0;

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY_Y)
    }
}

impl PhysicsWorld {
    pub fn new(gravity_y: f32) -> Self {
        Self {
            gravity_y,
            next_id: 0,
            bodies: Vec::new(),
        }
    }

    pub fn gravity_y(&self) -> f32 {
        self.gravity_y
    }

    pub fn set_gravity_y(&mut self, gravity_y: f32) {
        self.gravity_y = gravity_y;
    }

    pub fn create_body(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.bodies.push((id, body));
        id
    }

    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|(body_id, _)| *body_id != id);
        self.bodies.len() != before
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies
            .iter()
            .find(|(body_id, _)| *body_id == id)
            .map(|(_, body)| body)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies
            .iter_mut()
            .find(|(body_id, _)| *body_id == id)
            .map(|(_, body)| body)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.next_id = 0;
    }

    /// Integrates every enabled movable body and separates it against the
    /// solid grid, X axis first, then Y. Per-tick contact flags are cleared
    /// up front for every body, including immovable ones.
    pub fn step(&mut self, dt: f32, solids: &SolidGrid) {
        for (_, body) in &mut self.bodies {
            body.touching = Sides::none();
            body.blocked = Sides::none();
            if !body.enable || body.immovable {
                continue;
            }

            body.velocity.x += body.acceleration.x * dt;
            body.velocity.y += body.acceleration.y * dt;
            if body.allow_gravity {
                body.velocity.y += self.gravity_y * dt;
            }
            body.velocity.x = body.velocity.x.clamp(-body.max_velocity.x, body.max_velocity.x);
            body.velocity.y = body.velocity.y.clamp(-body.max_velocity.y, body.max_velocity.y);

            body.position.x += body.velocity.x * dt;
            Self::separate_from_solids_x(body, solids);
            body.position.y += body.velocity.y * dt;
            Self::separate_from_solids_y(body, solids);
        }
    }

    fn overlapped_rows(body: &Body, solids: &SolidGrid) -> (i32, i32) {
        let top = (body.position.y / solids.tile_height).floor() as i32;
        let bottom =
            ((body.position.y + body.height - SEPARATION_EPSILON) / solids.tile_height).floor()
                as i32;
        (top, bottom)
    }

    fn overlapped_columns(body: &Body, solids: &SolidGrid) -> (i32, i32) {
        let left = (body.position.x / solids.tile_width).floor() as i32;
        let right =
            ((body.position.x + body.width - SEPARATION_EPSILON) / solids.tile_width).floor()
                as i32;
        (left, right)
    }

    fn separate_from_solids_x(body: &mut Body, solids: &SolidGrid) {
        if solids.width() == 0 {
            return;
        }
        let (top, bottom) = Self::overlapped_rows(body, solids);

        if body.velocity.x > 0.0 && body.check_collision.right {
            let leading = ((body.position.x + body.width - SEPARATION_EPSILON)
                / solids.tile_width)
                .floor() as i32;
            if (top..=bottom).any(|row| solids.is_solid(leading, row)) {
                body.position.x = leading as f32 * solids.tile_width - body.width;
                body.blocked.right = true;
                body.velocity.x = 0.0;
            }
        } else if body.velocity.x < 0.0 && body.check_collision.left {
            let leading = (body.position.x / solids.tile_width).floor() as i32;
            if (top..=bottom).any(|row| solids.is_solid(leading, row)) {
                body.position.x = (leading + 1) as f32 * solids.tile_width;
                body.blocked.left = true;
                body.velocity.x = 0.0;
            }
        }
    }

    fn separate_from_solids_y(body: &mut Body, solids: &SolidGrid) {
        if solids.width() == 0 {
            return;
        }
        let (left, right) = Self::overlapped_columns(body, solids);

        if body.velocity.y > 0.0 && body.check_collision.down {
            let leading = ((body.position.y + body.height - SEPARATION_EPSILON)
                / solids.tile_height)
                .floor() as i32;
            if (left..=right).any(|column| solids.is_solid(column, leading)) {
                body.position.y = leading as f32 * solids.tile_height - body.height;
                body.blocked.down = true;
                body.velocity.y = 0.0;
            }
        } else if body.velocity.y < 0.0 && body.check_collision.up {
            let leading = (body.position.y / solids.tile_height).floor() as i32;
            if (left..=right).any(|column| solids.is_solid(column, leading)) {
                body.position.y = (leading + 1) as f32 * solids.tile_height;
                body.blocked.up = true;
                body.velocity.y = 0.0;
            }
        }
    }

    /// AABB test with no separation and no flag updates. Disabled bodies
    /// never overlap anything.
    pub fn overlap(&self, a: BodyId, b: BodyId) -> bool {
        let (Some(body_a), Some(body_b)) = (self.body(a), self.body(b)) else {
            return false;
        };
        if !body_a.enable || !body_b.enable {
            return false;
        }
        body_a.rect().intersects(&body_b.rect())
    }

    /// Separates two bodies along the axis of least overlap, honoring each
    /// body's `check_collision` sides, and records `touching` on both.
    /// Returns whether contact was made.
    pub fn collide(&mut self, a: BodyId, b: BodyId) -> bool {
        let Some((body_a, body_b)) = self.pair_mut(a, b) else {
            return false;
        };
        if !body_a.enable || !body_b.enable {
            return false;
        }

        let rect_a = body_a.rect();
        let rect_b = body_b.rect();
        if !rect_a.intersects(&rect_b) {
            return false;
        }

        let overlap_x = rect_a.right().min(rect_b.right()) - rect_a.x.max(rect_b.x);
        let overlap_y = rect_a.bottom().min(rect_b.bottom()) - rect_a.y.max(rect_b.y);

        if overlap_y <= overlap_x {
            Self::separate_pair_y(body_a, body_b, overlap_y)
        } else {
            Self::separate_pair_x(body_a, body_b, overlap_x)
        }
    }

    fn separate_pair_y(a: &mut Body, b: &mut Body, overlap: f32) -> bool {
        let a_above = a.center().y < b.center().y;
        let (allowed, top, bottom) = if a_above {
            (a.check_collision.down && b.check_collision.up, a, b)
        } else {
            (b.check_collision.down && a.check_collision.up, b, a)
        };
        if !allowed {
            return false;
        }

        top.touching.down = true;
        bottom.touching.up = true;

        match (top.immovable, bottom.immovable) {
            (false, true) => {
                top.position.y -= overlap;
                if top.velocity.y > 0.0 {
                    top.velocity.y = 0.0;
                }
            }
            (true, false) => {
                bottom.position.y += overlap;
                if bottom.velocity.y < 0.0 {
                    bottom.velocity.y = 0.0;
                }
            }
            (false, false) => {
                top.position.y -= overlap / 2.0;
                bottom.position.y += overlap / 2.0;
                if top.velocity.y > 0.0 {
                    top.velocity.y = 0.0;
                }
                if bottom.velocity.y < 0.0 {
                    bottom.velocity.y = 0.0;
                }
            }
            (true, true) => {}
        }
        true
    }

    fn separate_pair_x(a: &mut Body, b: &mut Body, overlap: f32) -> bool {
        let a_left = a.center().x < b.center().x;
        let (allowed, left, right) = if a_left {
            (a.check_collision.right && b.check_collision.left, a, b)
        } else {
            (b.check_collision.right && a.check_collision.left, b, a)
        };
        if !allowed {
            return false;
        }

        left.touching.right = true;
        right.touching.left = true;

        match (left.immovable, right.immovable) {
            (false, true) => {
                left.position.x -= overlap;
                if left.velocity.x > 0.0 {
                    left.velocity.x = 0.0;
                }
            }
            (true, false) => {
                right.position.x += overlap;
                if right.velocity.x < 0.0 {
                    right.velocity.x = 0.0;
                }
            }
            (false, false) => {
                left.position.x -= overlap / 2.0;
                right.position.x += overlap / 2.0;
                if left.velocity.x > 0.0 {
                    left.velocity.x = 0.0;
                }
                if right.velocity.x < 0.0 {
                    right.velocity.x = 0.0;
                }
            }
            (true, true) => {}
        }
        true
    }

    fn pair_mut(&mut self, a: BodyId, b: BodyId) -> Option<(&mut Body, &mut Body)> {
        if a == b {
            return None;
        }
        let index_a = self.bodies.iter().position(|(id, _)| *id == a)?;
        let index_b = self.bodies.iter().position(|(id, _)| *id == b)?;
        let (low, high, swap) = if index_a < index_b {
            (index_a, index_b, false)
        } else {
            (index_b, index_a, true)
        };
        let (head, tail) = self.bodies.split_at_mut(high);
        let first = &mut head[low].1;
        let second = &mut tail[0].1;
        if swap {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }
}
