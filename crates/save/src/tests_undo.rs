//! Undo journal behavior: batch framing, replay order, and entity
//! snapshot restore.

use world::entities::{Chest, ChestItem};
use world::tile::TileRecord;
use world::version_table::{VersionTable, CURRENT_VERSION};
use world::World;

use crate::undo::{apply_redo, apply_undo, UndoReader, UndoRecord, UndoWriter};

fn dirt() -> TileRecord {
    TileRecord::active(0)
}

fn stone() -> TileRecord {
    TileRecord::active(1)
}

fn read_all(bytes: &[u8]) -> Vec<crate::undo::UndoBatch> {
    let table = VersionTable::embedded().unwrap();
    let info = table.info(CURRENT_VERSION).unwrap();
    let mut reader = UndoReader::new(bytes, CURRENT_VERSION, info);
    let mut batches = Vec::new();
    while let Some(batch) = reader.read_batch().unwrap() {
        batches.push(batch);
    }
    batches
}

#[test]
fn test_batch_roundtrip_through_scratch_sink() {
    let table = VersionTable::embedded().unwrap();
    let info = table.info(CURRENT_VERSION).unwrap();

    let mut sink = Vec::new();
    let mut writer = UndoWriter::new(&mut sink, CURRENT_VERSION, info);
    writer.record(UndoRecord::tiles(3, 4, TileRecord::default(), dirt()));
    writer.record(UndoRecord::tiles(3, 5, dirt(), stone()));
    writer.commit_batch().unwrap();
    writer.record(UndoRecord::tiles(7, 7, stone(), TileRecord::default()));
    writer.commit_batch().unwrap();

    let batches = read_all(&sink);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].records.len(), 2);
    assert_eq!(batches[0].records[0].x, 3);
    assert_eq!(batches[0].records[0].after, dirt());
    assert_eq!(batches[1].records.len(), 1);
    assert_eq!(batches[1].records[0].before, stone());
}

#[test]
fn test_reader_returns_none_at_clean_end() {
    let table = VersionTable::embedded().unwrap();
    let info = table.info(CURRENT_VERSION).unwrap();
    let mut reader = UndoReader::new(&[][..], CURRENT_VERSION, info);
    assert!(reader.read_batch().unwrap().is_none());
}

#[test]
fn test_truncated_batch_is_an_error() {
    let table = VersionTable::embedded().unwrap();
    let info = table.info(CURRENT_VERSION).unwrap();

    let mut sink = Vec::new();
    let mut writer = UndoWriter::new(&mut sink, CURRENT_VERSION, info);
    writer.record(UndoRecord::tiles(0, 0, dirt(), stone()));
    writer.commit_batch().unwrap();

    let cut = &sink[..sink.len() - 2];
    let mut reader = UndoReader::new(cut, CURRENT_VERSION, info);
    assert!(reader.read_batch().is_err(), "mid-record end is not clean");
}

#[test]
fn test_empty_commit_writes_nothing() {
    let table = VersionTable::embedded().unwrap();
    let info = table.info(CURRENT_VERSION).unwrap();

    let mut sink = Vec::new();
    let mut writer = UndoWriter::new(&mut sink, CURRENT_VERSION, info);
    writer.commit_batch().unwrap();
    assert!(sink.is_empty());
}

#[test]
fn test_discard_batch_drops_pending_records() {
    let table = VersionTable::embedded().unwrap();
    let info = table.info(CURRENT_VERSION).unwrap();

    let mut sink = Vec::new();
    let mut writer = UndoWriter::new(&mut sink, CURRENT_VERSION, info);
    writer.record(UndoRecord::tiles(1, 1, dirt(), stone()));
    assert_eq!(writer.pending_len(), 1);
    writer.discard_batch();
    assert_eq!(writer.pending_len(), 0);
    writer.commit_batch().unwrap();
    assert!(sink.is_empty());
}

#[test]
fn test_undo_replays_in_reverse_and_redo_forward() {
    // Two records touch the same cell: A -> B, then B -> C. Undo must
    // land on A (reverse order), redo back on C (forward order).
    let mut world = World::new(4, 4);
    let a = TileRecord::default();
    let b = dirt();
    let c = stone();
    *world.tile_mut(2, 2) = c.clone();

    let batch = crate::undo::UndoBatch {
        records: vec![
            UndoRecord::tiles(2, 2, a.clone(), b.clone()),
            UndoRecord::tiles(2, 2, b.clone(), c.clone()),
        ],
    };

    apply_undo(&mut world, &batch);
    assert_eq!(*world.tile(2, 2), a, "undo lands on the first before");

    apply_redo(&mut world, &batch);
    assert_eq!(*world.tile(2, 2), c, "redo lands on the last after");
}

#[test]
fn test_undo_restores_removed_chest() {
    let mut world = World::new(8, 8);
    let mut chest_tile = TileRecord::active(21);
    chest_tile.u = 0;
    chest_tile.v = 0;
    *world.tile_mut(4, 4) = chest_tile.clone();
    let mut chest = Chest::new(4, 4);
    chest.items[0] = ChestItem {
        name: "Compass".into(),
        stack: 1,
        prefix: 0,
    };
    world.chests.push(chest.clone());

    // Simulate deleting the chest: tile goes empty, snapshot keeps it.
    let mut record = UndoRecord::tiles(4, 4, chest_tile, TileRecord::default());
    record.chest_before = Some(chest.clone());
    *world.tile_mut(4, 4) = TileRecord::default();
    world.chests.clear();

    let batch = crate::undo::UndoBatch {
        records: vec![record],
    };
    apply_undo(&mut world, &batch);
    assert_eq!(world.chests, vec![chest]);
    assert_eq!(world.tile(4, 4).tile_type, 21);

    apply_redo(&mut world, &batch);
    assert!(world.chests.is_empty(), "redo removes the chest again");
    assert!(!world.tile(4, 4).is_active);
}

#[test]
fn test_entity_snapshots_survive_the_journal() {
    let table = VersionTable::embedded().unwrap();
    let info = table.info(CURRENT_VERSION).unwrap();

    let mut chest = Chest::new(2, 3);
    chest.items[5] = ChestItem {
        name: "Acorn".into(),
        stack: 99,
        prefix: 0,
    };
    let mut record = UndoRecord::tiles(2, 3, TileRecord::active(21), TileRecord::default());
    record.chest_before = Some(chest);

    let mut sink = Vec::new();
    let mut writer = UndoWriter::new(&mut sink, CURRENT_VERSION, info);
    writer.record(record.clone());
    writer.commit_batch().unwrap();

    let batches = read_all(&sink);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].records, vec![record]);
}

#[test]
fn test_out_of_bounds_record_is_skipped() {
    let mut world = World::new(4, 4);
    let batch = crate::undo::UndoBatch {
        records: vec![UndoRecord::tiles(100, 100, dirt(), stone())],
    };
    // Stale journal against a resized world: must not panic.
    apply_undo(&mut world, &batch);
    apply_redo(&mut world, &batch);
}
