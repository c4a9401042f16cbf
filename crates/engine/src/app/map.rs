use glam::Vec2;
use thiserror::Error;

const CONTACT_EPSILON: f32 = 1e-4;

pub const TILE_EMPTY: u16 = 0;

/// Tilemap origin convention:
/// - `origin` is the world position of tile (0,0) bottom-left corner.
/// - The center of tile (x,y) is `origin + (x + 0.5, y + 0.5)`.
/// - Any tile id other than [`TILE_EMPTY`] is solid.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    origin: Vec2,
    tiles: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactFlags {
    pub bottom: bool,
    pub top: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionOutcome {
    pub position: Vec2,
    pub contacts: ContactFlags,
}

impl Default for Tilemap {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            origin: Vec2::ZERO,
            tiles: Vec::new(),
        }
    }
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        origin: Vec2,
        tiles: Vec<u16>,
    ) -> Result<Self, TilemapError> {
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            origin,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u16> {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn tile_center_world(&self, x: u32, y: u32) -> Option<Vec2> {
        self.index_of(x, y)?;
        Some(self.origin + Vec2::new(x as f32 + 0.5, y as f32 + 0.5))
    }

    /// Iterates `(x, y, tile_id)` for every non-empty tile.
    pub fn solid_tiles(&self) -> impl Iterator<Item = (u32, u32, u16)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile != TILE_EMPTY)
            .map(move |(index, tile)| {
                let x = (index % self.width as usize) as u32;
                let y = (index / self.width as usize) as u32;
                (x, y, *tile)
            })
    }

    /// Moves an axis-aligned box by `displacement`, stopping it against solid
    /// tiles. Vertical motion is resolved before horizontal motion.
    pub fn resolve_motion(
        &self,
        position: Vec2,
        half_extents: Vec2,
        displacement: Vec2,
    ) -> CollisionOutcome {
        let mut position = position;
        let mut contacts = ContactFlags::default();

        if displacement.y != 0.0 {
            position.y = self.sweep_vertical(position, half_extents, displacement.y, &mut contacts);
        }
        if displacement.x != 0.0 {
            position.x =
                self.sweep_horizontal(position, half_extents, displacement.x, &mut contacts);
        }

        CollisionOutcome { position, contacts }
    }

    fn sweep_vertical(
        &self,
        position: Vec2,
        half: Vec2,
        dy: f32,
        contacts: &mut ContactFlags,
    ) -> f32 {
        let target = position.y + dy;
        let (x0, x1) = cell_span(
            position.x - half.x - self.origin.x + CONTACT_EPSILON,
            position.x + half.x - self.origin.x - CONTACT_EPSILON,
        );
        let (y0, y1) = cell_span(
            target - half.y - self.origin.y,
            target + half.y - self.origin.y,
        );
        let start_bottom = position.y - half.y;
        let start_top = position.y + half.y;

        let mut resolved = target;
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if !self.is_solid_cell(cx, cy) {
                    continue;
                }
                let tile_bottom = self.origin.y + cy as f32;
                let tile_top = tile_bottom + 1.0;
                if dy < 0.0 && tile_top <= start_bottom + CONTACT_EPSILON {
                    resolved = resolved.max(tile_top + half.y);
                    contacts.bottom = true;
                } else if dy > 0.0 && tile_bottom >= start_top - CONTACT_EPSILON {
                    resolved = resolved.min(tile_bottom - half.y);
                    contacts.top = true;
                }
            }
        }
        resolved
    }

    fn sweep_horizontal(
        &self,
        position: Vec2,
        half: Vec2,
        dx: f32,
        contacts: &mut ContactFlags,
    ) -> f32 {
        let target = position.x + dx;
        let (x0, x1) = cell_span(
            target - half.x - self.origin.x,
            target + half.x - self.origin.x,
        );
        let (y0, y1) = cell_span(
            position.y - half.y - self.origin.y + CONTACT_EPSILON,
            position.y + half.y - self.origin.y - CONTACT_EPSILON,
        );
        let start_left = position.x - half.x;
        let start_right = position.x + half.x;

        let mut resolved = target;
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if !self.is_solid_cell(cx, cy) {
                    continue;
                }
                let tile_left = self.origin.x + cx as f32;
                let tile_right = tile_left + 1.0;
                if dx < 0.0 && tile_right <= start_left + CONTACT_EPSILON {
                    resolved = resolved.max(tile_right + half.x);
                    contacts.left = true;
                } else if dx > 0.0 && tile_left >= start_right - CONTACT_EPSILON {
                    resolved = resolved.min(tile_left - half.x);
                    contacts.right = true;
                }
            }
        }
        resolved
    }

    fn is_solid_cell(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return false;
        };
        self.tile_at(x, y).is_some_and(|tile| tile != TILE_EMPTY)
    }
}

/// Inclusive range of unit cells overlapped by the open interval `(lo, hi)`.
fn cell_span(lo: f32, hi: f32) -> (i64, i64) {
    (lo.floor() as i64, hi.ceil() as i64 - 1)
}
