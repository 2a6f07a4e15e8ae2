//! Whole-world round-trip tests across format versions.

use world::entities::{Chest, ChestItem, ItemStub, Npc, Sign, TileEntity, TileEntityKind};
use world::tile::{BrickStyle, LiquidType, TileRecord};
use world::version_table::{VersionTable, CURRENT_VERSION};
use world::World;

use crate::error::WorldError;
use crate::world_codec::WorldCodec;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A 24x16 world exercising every feature expressible at `version`.
pub(crate) fn sample_world(version: u32) -> World {
    let mut world = World::new(24, 16);
    world.header.version = version;
    world.header.name = "Roundtrip Vale".into();
    world.header.world_id = 771_420;
    world.header.left = 0;
    world.header.right = 24 * 16;
    world.header.top = 0;
    world.header.bottom = 16 * 16;
    world.header.spawn_x = 12;
    world.header.spawn_y = 4;
    world.header.world_surface = 6.0;
    world.header.rock_layer = 10.0;
    world.header.time = 13500.0;
    world.header.is_day = false;
    world.header.moon_phase = 3;
    world.header.is_blood_moon = true;
    world.header.dungeon_x = 20;
    world.header.dungeon_y = 5;
    world.header.boss_1_downed = true;
    world.header.boss_3_downed = true;
    world.header.shadow_orbs_smashed = true;
    world.header.shadow_orb_count = 2;
    world.header.invasion_delay = 30;
    world.header.invasion_size = 120;
    world.header.invasion_type = 1;
    world.header.invasion_x = 384.5;
    if version >= 6 {
        world.header.hard_mode = true;
    }

    // A dirt band with some walls and water.
    for x in 0..24 {
        for y in 8..16 {
            let t = world.tile_mut(x, y);
            t.is_active = true;
            t.tile_type = 0;
            t.wall = 2;
        }
    }
    for x in 3..9 {
        let t = world.tile_mut(x, 6);
        t.liquid = 200;
        t.liquid_type = LiquidType::Water;
    }
    world.tile_mut(10, 7).wire_red = true;

    if version >= 4 {
        let t = world.tile_mut(11, 8);
        t.wire_green = true;
        t.wire_yellow = true;
        t.actuator = true;
        t.in_active = true;
        world.tile_mut(12, 8).brick_style = BrickStyle::SlopeTopLeft;
        world.tile_mut(13, 8).brick_style = BrickStyle::HalfBrick;
    }
    if version >= 5 {
        world.tile_mut(14, 8).tile_color = 12;
        world.tile_mut(14, 8).wall_color = 7;
    }
    if version >= 8 {
        let t = world.tile_mut(2, 5);
        t.liquid = 90;
        t.liquid_type = LiquidType::Shimmer;
    }

    // Chest anchored on a chest tile (frame-important in all versions).
    let anchor = world.tile_mut(5, 7);
    anchor.is_active = true;
    anchor.tile_type = 21;
    anchor.u = 36;
    anchor.v = 0;
    let mut chest = Chest::new(5, 7);
    chest.items[0] = ChestItem {
        name: "Grappling Hook".into(),
        stack: 1,
        prefix: if version >= 4 { 57 } else { 0 },
    };
    chest.items[1] = ChestItem {
        name: "Torch".into(),
        stack: 42,
        prefix: 0,
    };
    world.chests.push(chest);

    // Sign anchored on a sign tile.
    let anchor = world.tile_mut(8, 7);
    anchor.is_active = true;
    anchor.tile_type = 55;
    anchor.u = 0;
    anchor.v = 18;
    world.signs.push(Sign {
        text: "mind the gap".into(),
        x: 8,
        y: 7,
    });

    if version >= 6 {
        let anchor = world.tile_mut(17, 7);
        anchor.is_active = true;
        anchor.tile_type = 423;
        anchor.u = 0;
        anchor.v = 0;
        world.tile_entities.push(TileEntity {
            id: 1,
            x: 17,
            y: 7,
            kind: TileEntityKind::LogicSensor {
                check_type: 1,
                on: true,
            },
        });
    }
    if version >= 2 {
        world.npcs.push(Npc {
            name: "Guide".into(),
            x: 192.0,
            y: 112.0,
            is_homeless: false,
            home_x: 12,
            home_y: 7,
        });
    }

    world
}

fn roundtrip(world: &World) -> World {
    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);
    let mut bytes = Vec::new();
    codec.save(world, &mut bytes).expect("save");
    codec.load(&mut bytes.as_slice()).expect("load")
}

#[test]
fn test_roundtrip_current_version() {
    init_logs();
    let world = sample_world(CURRENT_VERSION);
    assert_eq!(roundtrip(&world), world);
}

#[test]
fn test_roundtrip_every_supported_version() {
    for version in 1..=CURRENT_VERSION {
        let world = sample_world(version);
        assert_eq!(roundtrip(&world), world, "version {version} round trip");
    }
}

#[test]
fn test_roundtrip_preserves_header_fields() {
    let world = sample_world(CURRENT_VERSION);
    let restored = roundtrip(&world);
    assert_eq!(restored.header, world.header);
    assert_eq!(restored.width(), 24);
    assert_eq!(restored.height(), 16);
}

#[test]
fn test_roundtrip_preserves_entity_order() {
    let mut world = sample_world(CURRENT_VERSION);
    for (i, x) in [2usize, 12, 20].into_iter().enumerate() {
        let anchor = world.tile_mut(x, 3);
        anchor.is_active = true;
        anchor.tile_type = 55;
        anchor.u = 0;
        anchor.v = 0;
        world.signs.push(Sign {
            text: format!("sign {i}"),
            x: x as i32,
            y: 3,
        });
    }
    let restored = roundtrip(&world);
    assert_eq!(restored.signs, world.signs, "sign order must be stable");
}

#[test]
fn test_stored_frames_only_for_frame_important_tiles() {
    let mut world = sample_world(CURRENT_VERSION);
    // Simulate a derived frame left on a plain tile by the framing engine.
    world.tile_mut(0, 8).u = 54;
    world.tile_mut(0, 8).v = 72;
    let restored = roundtrip(&world);
    assert_eq!(restored.tile(0, 8).u, -1, "derived frames are not persisted");
    assert_eq!(restored.tile(0, 8).v, -1);
    assert_eq!(restored.tile(5, 7).u, 36, "stored frames are persisted");
}

#[test]
fn test_orphaned_entities_dropped_on_load() {
    init_logs();
    let mut world = sample_world(CURRENT_VERSION);
    // Chest record with no chest tile under it.
    world.chests.push(Chest::new(1, 1));
    // Sign anchored on an active non-sign tile.
    world.signs.push(Sign {
        text: "floating".into(),
        x: 0,
        y: 8,
    });
    // Tile entity anchored out of bounds.
    world.tile_entities.push(TileEntity {
        id: 9,
        x: 1000,
        y: 1000,
        kind: TileEntityKind::ItemFrame(ItemStub {
            id: 1,
            prefix: 0,
            stack: 1,
        }),
    });

    let restored = roundtrip(&world);
    assert_eq!(restored.chests.len(), 1, "orphan chest dropped");
    assert_eq!(restored.signs.len(), 1, "orphan sign dropped");
    assert_eq!(restored.tile_entities.len(), 1, "orphan tile entity dropped");
    assert!(restored.chest_at(5, 7).is_some(), "anchored chest kept");
}

#[test]
fn test_save_as_older_version_re_encodes() {
    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);

    let world = sample_world(1); // only v1-expressible content
    let mut world_v9 = world.clone();
    world_v9.header.version = CURRENT_VERSION;

    let mut bytes = Vec::new();
    codec
        .save_as_version(&world_v9, 1, &mut bytes)
        .expect("down-convert");
    let restored = codec.load(&mut bytes.as_slice()).unwrap();
    assert_eq!(restored.header.version, 1);
    assert_eq!(restored.tile(5, 7).tile_type, 21);
}

#[test]
fn test_save_as_older_version_rejects_inexpressible_data() {
    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);
    let world = sample_world(CURRENT_VERSION);

    // v5 cannot store the logic sensor tile entity.
    let err = codec
        .save_as_version(&world, 5, &mut Vec::new())
        .unwrap_err();
    assert!(matches!(err, WorldError::Format(_)), "got: {err}");

    // v1 cannot store NPCs either.
    let err = codec
        .save_as_version(&sample_world(2), 1, &mut Vec::new())
        .unwrap_err();
    assert!(matches!(err, WorldError::Format(_)), "got: {err}");
}

#[test]
fn test_save_file_and_load_file() {
    let dir = std::env::temp_dir().join("world_codec_file_test");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("vale.wld");

    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);
    let world = sample_world(CURRENT_VERSION);

    codec.save_file(&world, &path).expect("save_file");
    assert!(!dir.join("vale.wld.tmp").exists(), "no temp file left");
    let restored = codec.load_file(&path).expect("load_file");
    assert_eq!(restored, world);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_blank_world_roundtrip() {
    let mut world = World::new(5, 5);
    world.header.name = "empty".into();
    assert_eq!(roundtrip(&world), world);
}

#[test]
fn test_two_codecs_share_one_table() {
    // The table is read-only after construction; two codecs over it must
    // not interfere.
    let table = VersionTable::embedded().unwrap();
    let codec_a = WorldCodec::new(&table);
    let codec_b = WorldCodec::new(&table);

    let world = sample_world(CURRENT_VERSION);
    let mut bytes_a = Vec::new();
    let mut bytes_b = Vec::new();
    codec_a.save(&world, &mut bytes_a).unwrap();
    codec_b.save(&world, &mut bytes_b).unwrap();
    assert_eq!(bytes_a, bytes_b, "save must be deterministic");
}
