//! Append-only undo/redo journal.
//!
//! Editing operations record before/after snapshots of each touched cell
//! (plus entity snapshots for chest/sign/tile-entity-bearing tiles) into
//! batches on a scratch sink, so undo does not need full-grid copies in
//! memory. Cell bytes go through the same single-cell primitive as the
//! world codec, so snapshots taken against a world version replay
//! losslessly. Single-writer by design; the only consumer is the editing
//! session that wrote it.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::warn;

use world::entities::{Chest, Sign, TileEntity};
use world::tile::TileRecord;
use world::version_table::VersionInfo;
use world::World;

use crate::entity_codec::{
    read_chest, read_sign, read_tile_entity, write_chest, write_sign, write_tile_entity,
};
use crate::error::WorldError;
use crate::tile_codec::{deserialize_tile, serialize_tile};

const SNAP_CHEST_BEFORE: u8 = 0x01;
const SNAP_CHEST_AFTER: u8 = 0x02;
const SNAP_SIGN_BEFORE: u8 = 0x04;
const SNAP_SIGN_AFTER: u8 = 0x08;
const SNAP_ENTITY_BEFORE: u8 = 0x10;
const SNAP_ENTITY_AFTER: u8 = 0x20;

/// One edited cell: location, tile snapshots, and optional entity
/// snapshots for entity-bearing tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoRecord {
    pub x: i32,
    pub y: i32,
    pub before: TileRecord,
    pub after: TileRecord,
    pub chest_before: Option<Chest>,
    pub chest_after: Option<Chest>,
    pub sign_before: Option<Sign>,
    pub sign_after: Option<Sign>,
    pub entity_before: Option<TileEntity>,
    pub entity_after: Option<TileEntity>,
}

impl UndoRecord {
    /// A plain tile edit with no entity involvement.
    pub fn tiles(x: i32, y: i32, before: TileRecord, after: TileRecord) -> Self {
        Self {
            x,
            y,
            before,
            after,
            chest_before: None,
            chest_after: None,
            sign_before: None,
            sign_after: None,
            entity_before: None,
            entity_after: None,
        }
    }

    fn snapshot_flags(&self) -> u8 {
        let mut flags = 0;
        if self.chest_before.is_some() {
            flags |= SNAP_CHEST_BEFORE;
        }
        if self.chest_after.is_some() {
            flags |= SNAP_CHEST_AFTER;
        }
        if self.sign_before.is_some() {
            flags |= SNAP_SIGN_BEFORE;
        }
        if self.sign_after.is_some() {
            flags |= SNAP_SIGN_AFTER;
        }
        if self.entity_before.is_some() {
            flags |= SNAP_ENTITY_BEFORE;
        }
        if self.entity_after.is_some() {
            flags |= SNAP_ENTITY_AFTER;
        }
        flags
    }
}

/// One committed group of records; the unit of undo and redo.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UndoBatch {
    pub records: Vec<UndoRecord>,
}

/// Appends edit batches to a scratch sink. Records accumulate in memory
/// until `commit_batch`; an abandoned batch is simply discarded.
pub struct UndoWriter<'a, W: Write> {
    sink: W,
    version: u32,
    info: &'a VersionInfo,
    pending: Vec<UndoRecord>,
}

impl<'a, W: Write> UndoWriter<'a, W> {
    pub fn new(sink: W, version: u32, info: &'a VersionInfo) -> Self {
        Self {
            sink,
            version,
            info,
            pending: Vec::new(),
        }
    }

    pub fn record(&mut self, record: UndoRecord) {
        self.pending.push(record);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn discard_batch(&mut self) {
        self.pending.clear();
    }

    /// Write the pending records as one batch and flush. Empty batches
    /// are not written.
    pub fn commit_batch(&mut self) -> Result<(), WorldError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.sink
            .write_u32::<LittleEndian>(self.pending.len() as u32)?;
        let records = std::mem::take(&mut self.pending);
        for record in &records {
            self.write_record(record)?;
        }
        self.sink.flush()?;
        Ok(())
    }

    fn write_record(&mut self, record: &UndoRecord) -> Result<(), WorldError> {
        let w = &mut self.sink;
        w.write_i32::<LittleEndian>(record.x)?;
        w.write_i32::<LittleEndian>(record.y)?;
        serialize_tile(&record.before, self.version, self.info, w)?;
        serialize_tile(&record.after, self.version, self.info, w)?;
        w.write_u8(record.snapshot_flags())?;
        for chest in [&record.chest_before, &record.chest_after].into_iter().flatten() {
            write_chest(chest, self.version, w)?;
        }
        for sign in [&record.sign_before, &record.sign_after].into_iter().flatten() {
            write_sign(sign, w)?;
        }
        for entity in [&record.entity_before, &record.entity_after]
            .into_iter()
            .flatten()
        {
            write_tile_entity(entity, w)?;
        }
        Ok(())
    }
}

/// Replays batches from a scratch source in the order they were written.
pub struct UndoReader<'a, R: Read> {
    src: R,
    version: u32,
    info: &'a VersionInfo,
}

impl<'a, R: Read> UndoReader<'a, R> {
    pub fn new(src: R, version: u32, info: &'a VersionInfo) -> Self {
        Self { src, version, info }
    }

    /// Next batch, or `None` at a clean end of stream. A stream ending
    /// mid-batch is an I/O error, not a clean end.
    pub fn read_batch(&mut self) -> Result<Option<UndoBatch>, WorldError> {
        let mut count_bytes = [0u8; 4];
        match self.src.read_exact(&mut count_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let count = u32::from_le_bytes(count_bytes);

        let mut batch = UndoBatch::default();
        for _ in 0..count {
            batch.records.push(self.read_record()?);
        }
        Ok(Some(batch))
    }

    fn read_record(&mut self) -> Result<UndoRecord, WorldError> {
        let r = &mut self.src;
        let x = r.read_i32::<LittleEndian>()?;
        let y = r.read_i32::<LittleEndian>()?;
        let before = deserialize_tile(self.version, self.info, r)?;
        let after = deserialize_tile(self.version, self.info, r)?;
        let flags = r.read_u8()?;

        let mut record = UndoRecord::tiles(x, y, before, after);
        if flags & SNAP_CHEST_BEFORE != 0 {
            record.chest_before = Some(read_chest(self.version, r)?);
        }
        if flags & SNAP_CHEST_AFTER != 0 {
            record.chest_after = Some(read_chest(self.version, r)?);
        }
        if flags & SNAP_SIGN_BEFORE != 0 {
            record.sign_before = Some(read_sign(r)?);
        }
        if flags & SNAP_SIGN_AFTER != 0 {
            record.sign_after = Some(read_sign(r)?);
        }
        if flags & SNAP_ENTITY_BEFORE != 0 {
            record.entity_before = Some(read_tile_entity(r)?);
        }
        if flags & SNAP_ENTITY_AFTER != 0 {
            record.entity_after = Some(read_tile_entity(r)?);
        }
        Ok(record)
    }
}

/// Apply a batch as an undo: records in reverse order, `before` values win.
pub fn apply_undo(world: &mut World, batch: &UndoBatch) {
    for record in batch.records.iter().rev() {
        apply_side(world, record, true);
    }
}

/// Apply a batch as a redo: records in forward order, `after` values win.
pub fn apply_redo(world: &mut World, batch: &UndoBatch) {
    for record in &batch.records {
        apply_side(world, record, false);
    }
}

fn apply_side(world: &mut World, record: &UndoRecord, undo: bool) {
    if !world.in_bounds(record.x, record.y) {
        warn!(
            "undo record at ({}, {}) is outside the grid; skipping",
            record.x, record.y
        );
        return;
    }
    let tile = if undo { &record.before } else { &record.after };
    *world.tile_mut(record.x as usize, record.y as usize) = tile.clone();

    let chest = if undo {
        &record.chest_before
    } else {
        &record.chest_after
    };
    if record.chest_before.is_some() || record.chest_after.is_some() {
        world.remove_chest_at(record.x, record.y);
        if let Some(c) = chest {
            world.chests.push(c.clone());
        }
    }

    let sign = if undo {
        &record.sign_before
    } else {
        &record.sign_after
    };
    if record.sign_before.is_some() || record.sign_after.is_some() {
        world.remove_sign_at(record.x, record.y);
        if let Some(s) = sign {
            world.signs.push(s.clone());
        }
    }

    let entity = if undo {
        &record.entity_before
    } else {
        &record.entity_after
    };
    if record.entity_before.is_some() || record.entity_after.is_some() {
        world.remove_tile_entity_at(record.x, record.y);
        if let Some(e) = entity {
            world.tile_entities.push(e.clone());
        }
    }
}
