pub mod entities;
pub mod framing;
pub mod grid;
pub mod tile;
pub mod version_table;

pub use entities::{Chest, ChestItem, ItemStub, Npc, Sign, TileEntity, TileEntityKind};
pub use framing::{FramePoint, TileFraming};
pub use grid::{World, WorldHeader};
pub use tile::{BrickStyle, LiquidType, TileRecord};
pub use version_table::{VersionInfo, VersionTable, VersionTableError, CURRENT_VERSION};
