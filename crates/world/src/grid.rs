//! The in-memory world: a flat column-major tile grid, the header block
//! and the entity side tables.

use crate::entities::{Chest, Npc, Sign, TileEntity};
use crate::tile::TileRecord;
use crate::version_table::CURRENT_VERSION;

/// World header metadata. Field order here has no wire meaning; the codec
/// owns the byte layout and its per-version conditionals.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldHeader {
    pub version: u32,
    pub name: String,
    pub world_id: i32,
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
    pub spawn_x: i32,
    pub spawn_y: i32,
    pub world_surface: f64,
    pub rock_layer: f64,
    pub time: f64,
    pub is_day: bool,
    pub moon_phase: i32,
    pub is_blood_moon: bool,
    pub dungeon_x: i32,
    pub dungeon_y: i32,
    pub boss_1_downed: bool,
    pub boss_2_downed: bool,
    pub boss_3_downed: bool,
    pub shadow_orbs_smashed: bool,
    pub shadow_orb_count: u8,
    pub invasion_delay: i32,
    pub invasion_size: i32,
    pub invasion_type: i32,
    pub invasion_x: f64,
    /// Stored only for version >= 6; defaults to false on older files.
    pub hard_mode: bool,
}

impl Default for WorldHeader {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            name: String::new(),
            world_id: 0,
            left: 0,
            right: 0,
            top: 0,
            bottom: 0,
            spawn_x: 0,
            spawn_y: 0,
            world_surface: 0.0,
            rock_layer: 0.0,
            time: 0.0,
            is_day: true,
            moon_phase: 0,
            is_blood_moon: false,
            dungeon_x: 0,
            dungeon_y: 0,
            boss_1_downed: false,
            boss_2_downed: false,
            boss_3_downed: false,
            shadow_orbs_smashed: false,
            shadow_orb_count: 0,
            invasion_delay: 0,
            invasion_size: 0,
            invasion_type: 0,
            invasion_x: 0.0,
            hard_mode: false,
        }
    }
}

/// A loaded (or freshly created) world. Grid dimensions are fixed at
/// construction; tiles are stored column-major (`x` outer, `y` inner) to
/// match the wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub header: WorldHeader,
    width: usize,
    height: usize,
    tiles: Vec<TileRecord>,
    pub chests: Vec<Chest>,
    pub signs: Vec<Sign>,
    pub tile_entities: Vec<TileEntity>,
    pub npcs: Vec<Npc>,
}

impl World {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            header: WorldHeader::default(),
            width,
            height,
            tiles: vec![TileRecord::default(); width * height],
            chests: Vec::new(),
            signs: Vec::new(),
            tile_entities: Vec::new(),
            npcs: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds. Use [`World::get`] for
    /// queries that may run off the edge.
    pub fn tile(&self, x: usize, y: usize) -> &TileRecord {
        assert!(x < self.width && y < self.height, "tile ({x}, {y}) out of bounds");
        &self.tiles[x * self.height + y]
    }

    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    pub fn tile_mut(&mut self, x: usize, y: usize) -> &mut TileRecord {
        assert!(x < self.width && y < self.height, "tile ({x}, {y}) out of bounds");
        &mut self.tiles[x * self.height + y]
    }

    /// Bounds-checked lookup with signed coordinates.
    pub fn get(&self, x: i32, y: i32) -> Option<&TileRecord> {
        if self.in_bounds(x, y) {
            Some(&self.tiles[x as usize * self.height + y as usize])
        } else {
            None
        }
    }

    pub fn chest_at(&self, x: i32, y: i32) -> Option<&Chest> {
        self.chests.iter().find(|c| c.x == x && c.y == y)
    }

    pub fn remove_chest_at(&mut self, x: i32, y: i32) -> Option<Chest> {
        let idx = self.chests.iter().position(|c| c.x == x && c.y == y)?;
        Some(self.chests.remove(idx))
    }

    pub fn sign_at(&self, x: i32, y: i32) -> Option<&Sign> {
        self.signs.iter().find(|s| s.x == x && s.y == y)
    }

    pub fn remove_sign_at(&mut self, x: i32, y: i32) -> Option<Sign> {
        let idx = self.signs.iter().position(|s| s.x == x && s.y == y)?;
        Some(self.signs.remove(idx))
    }

    pub fn tile_entity_at(&self, x: i32, y: i32) -> Option<&TileEntity> {
        self.tile_entities
            .iter()
            .find(|t| i32::from(t.x) == x && i32::from(t.y) == y)
    }

    pub fn remove_tile_entity_at(&mut self, x: i32, y: i32) -> Option<TileEntity> {
        let idx = self
            .tile_entities
            .iter()
            .position(|t| i32::from(t.x) == x && i32::from(t.y) == y)?;
        Some(self.tile_entities.remove(idx))
    }
}
