//! Wire codecs for the entity side-table records: chests, signs, tile
//! entities and NPCs. The world codec handles the surrounding table
//! framing (slot counts, termination flags); these functions read and
//! write one record each, and the undo journal reuses them for entity
//! snapshots.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use world::entities::{
    Chest, ChestItem, ItemStub, Npc, Sign, TileEntity, TileEntityKind, CHEST_SLOTS,
    CHEST_SLOTS_LEGACY,
};

use crate::error::WorldError;
use crate::rw::{read_string, write_string};

/// Chest slot count stored on the wire for a format version.
pub fn chest_slots(version: u32) -> usize {
    if version >= 6 {
        CHEST_SLOTS
    } else {
        CHEST_SLOTS_LEGACY
    }
}

pub fn write_chest(chest: &Chest, version: u32, w: &mut impl Write) -> Result<(), WorldError> {
    let slots = chest_slots(version);
    for item in chest.items.iter().skip(slots) {
        if item.stack > 0 {
            return Err(WorldError::Format(format!(
                "chest at ({}, {}) uses slot beyond the {slots} stored in format v{version}",
                chest.x, chest.y
            )));
        }
    }

    w.write_i32::<LittleEndian>(chest.x)?;
    w.write_i32::<LittleEndian>(chest.y)?;
    for slot in 0..slots {
        let item = chest.items.get(slot).cloned().unwrap_or_default();
        w.write_u8(item.stack)?;
        if item.stack > 0 {
            write_string(w, &item.name)?;
            if version >= 4 {
                w.write_u8(item.prefix)?;
            } else if item.prefix != 0 {
                return Err(WorldError::Format(format!(
                    "item prefix not representable in format v{version}"
                )));
            }
        }
    }
    Ok(())
}

pub fn read_chest(version: u32, r: &mut impl Read) -> Result<Chest, WorldError> {
    let x = r.read_i32::<LittleEndian>()?;
    let y = r.read_i32::<LittleEndian>()?;
    let mut chest = Chest::new(x, y);
    for slot in 0..chest_slots(version) {
        let stack = r.read_u8()?;
        if stack > 0 {
            chest.items[slot] = ChestItem {
                name: read_string(r)?,
                stack,
                prefix: if version >= 4 { r.read_u8()? } else { 0 },
            };
        }
    }
    Ok(chest)
}

pub fn write_sign(sign: &Sign, w: &mut impl Write) -> Result<(), WorldError> {
    write_string(w, &sign.text)?;
    w.write_i32::<LittleEndian>(sign.x)?;
    w.write_i32::<LittleEndian>(sign.y)?;
    Ok(())
}

pub fn read_sign(r: &mut impl Read) -> Result<Sign, WorldError> {
    Ok(Sign {
        text: read_string(r)?,
        x: r.read_i32::<LittleEndian>()?,
        y: r.read_i32::<LittleEndian>()?,
    })
}

fn write_item_stub(item: &ItemStub, w: &mut impl Write) -> Result<(), WorldError> {
    w.write_i16::<LittleEndian>(item.id)?;
    w.write_u8(item.prefix)?;
    w.write_i16::<LittleEndian>(item.stack)?;
    Ok(())
}

fn read_item_stub(r: &mut impl Read) -> Result<ItemStub, WorldError> {
    Ok(ItemStub {
        id: r.read_i16::<LittleEndian>()?,
        prefix: r.read_u8()?,
        stack: r.read_i16::<LittleEndian>()?,
    })
}

fn kind_tag(kind: &TileEntityKind) -> u8 {
    match kind {
        TileEntityKind::LogicSensor { .. } => 0,
        TileEntityKind::ItemFrame(_) => 1,
        TileEntityKind::FoodPlatter(_) => 2,
        TileEntityKind::WeaponRack(_) => 3,
        TileEntityKind::DisplayDoll { .. } => 4,
    }
}

pub fn write_tile_entity(entity: &TileEntity, w: &mut impl Write) -> Result<(), WorldError> {
    w.write_u8(kind_tag(&entity.kind))?;
    w.write_i32::<LittleEndian>(entity.id)?;
    w.write_i16::<LittleEndian>(entity.x)?;
    w.write_i16::<LittleEndian>(entity.y)?;
    match &entity.kind {
        TileEntityKind::LogicSensor { check_type, on } => {
            w.write_u8(*check_type)?;
            w.write_u8(u8::from(*on))?;
        }
        TileEntityKind::ItemFrame(item)
        | TileEntityKind::FoodPlatter(item)
        | TileEntityKind::WeaponRack(item) => write_item_stub(item, w)?,
        TileEntityKind::DisplayDoll { items, dyes } => {
            for item in items.iter().chain(dyes) {
                write_item_stub(item, w)?;
            }
        }
    }
    Ok(())
}

pub fn read_tile_entity(r: &mut impl Read) -> Result<TileEntity, WorldError> {
    let tag = r.read_u8()?;
    let id = r.read_i32::<LittleEndian>()?;
    let x = r.read_i16::<LittleEndian>()?;
    let y = r.read_i16::<LittleEndian>()?;
    let kind = match tag {
        0 => {
            let check_type = r.read_u8()?;
            let on = match r.read_u8()? {
                0 => false,
                1 => true,
                b => {
                    return Err(WorldError::Format(format!(
                        "invalid logic sensor state byte {b:#04x}"
                    )))
                }
            };
            TileEntityKind::LogicSensor { check_type, on }
        }
        1 => TileEntityKind::ItemFrame(read_item_stub(r)?),
        2 => TileEntityKind::FoodPlatter(read_item_stub(r)?),
        3 => TileEntityKind::WeaponRack(read_item_stub(r)?),
        4 => {
            let mut items = [ItemStub::default(); 8];
            let mut dyes = [ItemStub::default(); 8];
            for slot in &mut items {
                *slot = read_item_stub(r)?;
            }
            for slot in &mut dyes {
                *slot = read_item_stub(r)?;
            }
            TileEntityKind::DisplayDoll { items, dyes }
        }
        t => {
            return Err(WorldError::Format(format!(
                "unknown tile entity kind {t:#04x}"
            )))
        }
    };
    Ok(TileEntity { id, x, y, kind })
}

pub fn write_npc(npc: &Npc, w: &mut impl Write) -> Result<(), WorldError> {
    write_string(w, &npc.name)?;
    w.write_f32::<LittleEndian>(npc.x)?;
    w.write_f32::<LittleEndian>(npc.y)?;
    w.write_u8(u8::from(npc.is_homeless))?;
    w.write_i32::<LittleEndian>(npc.home_x)?;
    w.write_i32::<LittleEndian>(npc.home_y)?;
    Ok(())
}

pub fn read_npc(r: &mut impl Read) -> Result<Npc, WorldError> {
    Ok(Npc {
        name: read_string(r)?,
        x: r.read_f32::<LittleEndian>()?,
        y: r.read_f32::<LittleEndian>()?,
        is_homeless: crate::rw::read_bool(r)?,
        home_x: r.read_i32::<LittleEndian>()?,
        home_y: r.read_i32::<LittleEndian>()?,
    })
}
