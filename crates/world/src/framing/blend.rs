//! 8-way same-type blending: the neighbor mask and its 47-entry frame table.

use crate::grid::World;
use crate::tile::TileRecord;

use super::{FramePoint, TILE_FRAME_SIZE};

pub const UP: u8 = 0x01;
pub const LEFT: u8 = 0x02;
pub const RIGHT: u8 = 0x04;
pub const DOWN: u8 = 0x08;
pub const UP_LEFT: u8 = 0x10;
pub const UP_RIGHT: u8 = 0x20;
pub const DOWN_LEFT: u8 = 0x40;
pub const DOWN_RIGHT: u8 = 0x80;

/// A corner bit only counts when both of its supporting cardinals are set:
/// two cells cannot visually connect diagonally unless both straight sides
/// already connect.
pub fn is_valid_mask(mask: u8) -> bool {
    let gated = [
        (UP_LEFT, UP | LEFT),
        (UP_RIGHT, UP | RIGHT),
        (DOWN_LEFT, DOWN | LEFT),
        (DOWN_RIGHT, DOWN | RIGHT),
    ];
    gated
        .iter()
        .all(|&(corner, cardinals)| mask & corner == 0 || mask & cardinals == cardinals)
}

/// Whether the cardinal face between two cells is open on both sides.
fn faces_open(target: &TileRecord, neighbor: &TileRecord, dx: i32, dy: i32) -> bool {
    match (dx, dy) {
        (0, -1) => !target.brick_style.blocks_top() && !neighbor.brick_style.blocks_bottom(),
        (0, 1) => !target.brick_style.blocks_bottom() && !neighbor.brick_style.blocks_top(),
        (-1, 0) => !target.brick_style.blocks_left() && !neighbor.brick_style.blocks_right(),
        (1, 0) => !target.brick_style.blocks_right() && !neighbor.brick_style.blocks_left(),
        _ => unreachable!("not a cardinal offset"),
    }
}

// Strict type equality: two cells only blend when they share the exact
// same tile id, never tile-family equality.
fn will_it_blend(tile_type: u16, neighbor: Option<&TileRecord>) -> bool {
    matches!(neighbor, Some(n) if n.is_active && n.tile_type == tile_type)
}

/// Compute the 8-bit neighbor mask for the active tile at `(x, y)`.
///
/// The caller guarantees the coordinate is in bounds and the cell active;
/// neighbors off the edge simply do not connect.
pub(super) fn blend_mask(world: &World, x: i32, y: i32) -> u8 {
    let target = world.get(x, y).expect("caller checked bounds");
    let t = target.tile_type;

    let mut mask = 0u8;
    let cardinals = [(UP, 0, -1), (LEFT, -1, 0), (RIGHT, 1, 0), (DOWN, 0, 1)];
    for (bit, dx, dy) in cardinals {
        if let Some(neighbor) = world.get(x + dx, y + dy) {
            if neighbor.is_active
                && neighbor.tile_type == t
                && faces_open(target, neighbor, dx, dy)
            {
                mask |= bit;
            }
        }
    }

    let corners = [
        (UP_LEFT, -1, -1, UP | LEFT),
        (UP_RIGHT, 1, -1, UP | RIGHT),
        (DOWN_LEFT, -1, 1, DOWN | LEFT),
        (DOWN_RIGHT, 1, 1, DOWN | RIGHT),
    ];
    for (bit, dx, dy, gate) in corners {
        if mask & gate == gate && will_it_blend(t, world.get(x + dx, y + dy)) {
            mask |= bit;
        }
    }

    mask
}

/// The 256-slot frame table. Exactly 47 masks (those passing corner
/// gating) have a defined entry of 3 frame variants; every other slot is
/// an explicit sentinel that falls back to the mask-0 "isolated" entry.
#[derive(Debug)]
pub struct BlendTable {
    entries: [Option<[FramePoint; 3]>; 256],
}

impl BlendTable {
    /// Assign shape rows in ascending mask order; variants run along U and
    /// shapes along V, every coordinate a multiple of the 18 px cell.
    pub fn build() -> Self {
        let mut entries = [None; 256];
        let mut shape = 0i16;
        for mask in 0..256usize {
            if is_valid_mask(mask as u8) {
                let mut variants = [FramePoint::ZERO; 3];
                for (i, slot) in variants.iter_mut().enumerate() {
                    *slot = FramePoint {
                        u: TILE_FRAME_SIZE * i as i16,
                        v: TILE_FRAME_SIZE * shape,
                    };
                }
                entries[mask] = Some(variants);
                shape += 1;
            }
        }
        debug_assert_eq!(shape, 47);
        Self { entries }
    }

    /// Frame for a mask and variant. Undefined masks fall back to the
    /// isolated (mask 0) entry rather than failing.
    pub fn frame(&self, mask: u8, variant: u8) -> FramePoint {
        let entry = self.entries[mask as usize]
            .unwrap_or_else(|| self.entries[0].expect("mask 0 is always defined"));
        entry[variant as usize % 3]
    }

    pub fn entry(&self, mask: u8) -> Option<&[FramePoint; 3]> {
        self.entries[mask as usize].as_ref()
    }
}
