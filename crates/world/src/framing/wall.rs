//! 4-way wall framing: cardinal mask, full-surround refinement and the
//! 20-entry frame table.

use crate::grid::World;

use super::{FramePoint, WALL_FRAME_SIZE};

/// Active tile ids that visually terminate a wall edge without carrying a
/// wall of their own (torches, doors, chests, signs and similar fixtures).
/// A plain active tile outside this set does not count as a wall neighbor.
pub const TRUNCATES_WALLS: &[u16] = &[4, 10, 11, 21, 55, 79, 85, 88];

/// 16 cardinal masks plus 5 disambiguated full-surround entries.
pub const WALL_TABLE_LEN: usize = 20;

const NORTH: u8 = 1;
const WEST: u8 = 2;
const EAST: u8 = 4;
const SOUTH: u8 = 8;

// Sub-variant for fully surrounded walls, indexed [x mod 3][y mod 3];
// maps the naive mask 15 onto entries 15..=19.
const CENTER_LOOKUP: [[usize; 3]; 3] = [[15, 16, 17], [18, 19, 15], [16, 17, 18]];

fn counts_as_wall_neighbor(world: &World, x: i32, y: i32) -> bool {
    match world.get(x, y) {
        Some(t) => t.wall != 0 || (t.is_active && TRUNCATES_WALLS.contains(&t.tile_type)),
        None => false,
    }
}

/// Table index for the wall at `(x, y)`. The caller has already excluded
/// grid-edge coordinates, so all four neighbors are in bounds.
pub(super) fn wall_index(world: &World, x: i32, y: i32) -> usize {
    let mut mask = 0u8;
    if counts_as_wall_neighbor(world, x, y - 1) {
        mask |= NORTH;
    }
    if counts_as_wall_neighbor(world, x - 1, y) {
        mask |= WEST;
    }
    if counts_as_wall_neighbor(world, x + 1, y) {
        mask |= EAST;
    }
    if counts_as_wall_neighbor(world, x, y + 1) {
        mask |= SOUTH;
    }

    if mask == NORTH | WEST | EAST | SOUTH {
        CENTER_LOOKUP[x.rem_euclid(3) as usize][y.rem_euclid(3) as usize]
    } else {
        mask as usize
    }
}

/// The 20-entry wall frame table: 4 variants per entry, every coordinate a
/// multiple of the 36 px wall cell.
#[derive(Debug)]
pub struct WallTable {
    entries: [[FramePoint; 4]; WALL_TABLE_LEN],
}

impl WallTable {
    pub fn build() -> Self {
        let mut entries = [[FramePoint::ZERO; 4]; WALL_TABLE_LEN];
        for (index, entry) in entries.iter_mut().enumerate() {
            for (variant, slot) in entry.iter_mut().enumerate() {
                *slot = FramePoint {
                    u: WALL_FRAME_SIZE * variant as i16,
                    v: WALL_FRAME_SIZE * index as i16,
                };
            }
        }
        Self { entries }
    }

    pub fn frame(&self, index: usize, variant: u8) -> FramePoint {
        self.entries[index.min(WALL_TABLE_LEN - 1)][variant as usize % 4]
    }

    pub fn entries(&self) -> &[[FramePoint; 4]; WALL_TABLE_LEN] {
        &self.entries
    }
}
