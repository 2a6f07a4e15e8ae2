//! Binary codec for the versioned world-save format, plus the undo
//! journal built on the same per-cell primitive.
//!
//! The version table from the `world` crate drives all per-version
//! branching; the codec holds no other state, so independent worlds can
//! be loaded concurrently against one shared table.

mod atomic_write;
mod entity_codec;
mod error;
mod rw;
mod tile_codec;
mod undo;
mod world_codec;

pub use atomic_write::atomic_write;
pub use entity_codec::{
    chest_slots, read_chest, read_npc, read_sign, read_tile_entity, write_chest, write_npc,
    write_sign, write_tile_entity,
};
pub use error::WorldError;
pub use tile_codec::{deserialize_tile, serialize_tile};
pub use undo::{apply_redo, apply_undo, UndoBatch, UndoReader, UndoRecord, UndoWriter};
pub use world_codec::{WorldCodec, MAX_CHESTS, MAX_SIGNS};

#[cfg(test)]
mod tests_mutation;
#[cfg(test)]
mod tests_roundtrip;
#[cfg(test)]
mod tests_undo;
