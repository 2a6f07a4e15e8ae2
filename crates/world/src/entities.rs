//! Entity side tables: records attached to a tile coordinate beyond the
//! base TileRecord fields. Created and destroyed in lockstep with tile
//! placement by the editing layer; the codec only preserves them and drops
//! entries whose anchor tile is missing or of the wrong type on load.

/// Number of item slots in a chest (current format).
pub const CHEST_SLOTS: usize = 40;

/// Chest slot count before format version 6.
pub const CHEST_SLOTS_LEGACY: usize = 20;

/// Tile ids that anchor a chest record.
pub const CHEST_TILES: &[u16] = &[21, 88];

/// Tile ids that anchor a sign record.
pub const SIGN_TILES: &[u16] = &[55, 85];

/// Tile ids that anchor a tile entity record.
pub const TILE_ENTITY_TILES: &[u16] = &[395, 423, 470, 471, 520];

pub fn is_chest_tile(id: u16) -> bool {
    CHEST_TILES.contains(&id)
}

pub fn is_sign_tile(id: u16) -> bool {
    SIGN_TILES.contains(&id)
}

pub fn is_tile_entity_tile(id: u16) -> bool {
    TILE_ENTITY_TILES.contains(&id)
}

/// One chest item slot. `stack == 0` means the slot is empty and the name
/// and prefix are not stored on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChestItem {
    pub name: String,
    pub stack: u8,
    pub prefix: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chest {
    pub x: i32,
    pub y: i32,
    pub items: Vec<ChestItem>,
}

impl Chest {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            items: vec![ChestItem::default(); CHEST_SLOTS],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sign {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// Compact item reference used inside tile entity payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemStub {
    pub id: i16,
    pub prefix: u8,
    pub stack: i16,
}

/// Per-kind payload of a tile entity. Each kind has a different wire shape,
/// keyed by a type byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileEntityKind {
    LogicSensor { check_type: u8, on: bool },
    ItemFrame(ItemStub),
    FoodPlatter(ItemStub),
    WeaponRack(ItemStub),
    DisplayDoll { items: [ItemStub; 8], dyes: [ItemStub; 8] },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEntity {
    pub id: i32,
    pub x: i16,
    pub y: i16,
    pub kind: TileEntityKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub is_homeless: bool,
    pub home_x: i32,
    pub home_y: i32,
}
