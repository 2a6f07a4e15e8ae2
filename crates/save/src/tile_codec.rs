//! The single-cell serialization primitive.
//!
//! One pair of pure functions converts a `TileRecord` to and from exactly
//! the byte sequence the grid stream uses for one cell. The grid codec and
//! the undo journal both go through these, so a snapshot taken against a
//! given version serializes identically to the main codec. RLE repeat
//! counts are the grid layer's concern, not the cell's.
//!
//! Per-version layout:
//! - active tile id, then U/V only for frame-important ids
//! - v5+: optional paint bytes for tile and wall
//! - v4+: a flags byte (wires, actuator, inactive) with an optional
//!   extension byte carrying the brick style; v1-3 store a single
//!   discrete red-wire bool and cannot express the rest
//! - optional wall id, optional liquid (amount + type; shimmer v8+)

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use world::tile::{BrickStyle, LiquidType, TileRecord};
use world::version_table::VersionInfo;

use crate::error::WorldError;
use crate::rw::{read_bool, write_bool};

const FLAG_WIRE_RED: u8 = 0x01;
const FLAG_WIRE_GREEN: u8 = 0x02;
const FLAG_WIRE_BLUE: u8 = 0x04;
const FLAG_WIRE_YELLOW: u8 = 0x08;
const FLAG_ACTUATOR: u8 = 0x10;
const FLAG_IN_ACTIVE: u8 = 0x20;
const FLAG_EXTENDED: u8 = 0x40;

pub fn brick_style_to_u8(style: BrickStyle) -> u8 {
    match style {
        BrickStyle::Full => 0,
        BrickStyle::HalfBrick => 1,
        BrickStyle::SlopeTopRight => 2,
        BrickStyle::SlopeTopLeft => 3,
        BrickStyle::SlopeBottomRight => 4,
        BrickStyle::SlopeBottomLeft => 5,
    }
}

pub fn u8_to_brick_style(v: u8) -> Option<BrickStyle> {
    match v {
        0 => Some(BrickStyle::Full),
        1 => Some(BrickStyle::HalfBrick),
        2 => Some(BrickStyle::SlopeTopRight),
        3 => Some(BrickStyle::SlopeTopLeft),
        4 => Some(BrickStyle::SlopeBottomRight),
        5 => Some(BrickStyle::SlopeBottomLeft),
        _ => None,
    }
}

pub fn liquid_type_to_u8(l: LiquidType) -> u8 {
    match l {
        LiquidType::None => 0,
        LiquidType::Water => 1,
        LiquidType::Lava => 2,
        LiquidType::Honey => 3,
        LiquidType::Shimmer => 4,
    }
}

pub fn u8_to_liquid_type(v: u8) -> Option<LiquidType> {
    match v {
        1 => Some(LiquidType::Water),
        2 => Some(LiquidType::Lava),
        3 => Some(LiquidType::Honey),
        4 => Some(LiquidType::Shimmer),
        _ => None,
    }
}

/// Reject attributes the target version's layout cannot store. Dropping
/// them silently would corrupt the world on a load/save cycle, so a
/// down-conversion with inexpressible data is an explicit error.
fn check_representable(tile: &TileRecord, version: u32) -> Result<(), WorldError> {
    if version < 4 {
        if tile.wire_green || tile.wire_blue || tile.wire_yellow {
            return Err(WorldError::Format(format!(
                "colored wire not representable in format v{version}"
            )));
        }
        if tile.actuator || tile.in_active {
            return Err(WorldError::Format(format!(
                "actuator state not representable in format v{version}"
            )));
        }
        if tile.brick_style != BrickStyle::Full {
            return Err(WorldError::Format(format!(
                "brick style not representable in format v{version}"
            )));
        }
    }
    if version < 5 && (tile.tile_color != 0 || tile.wall_color != 0) {
        return Err(WorldError::Format(format!(
            "paint not representable in format v{version}"
        )));
    }
    if version < 8 && tile.liquid_type == LiquidType::Shimmer {
        return Err(WorldError::Format(format!(
            "shimmer liquid not representable in format v{version}"
        )));
    }
    Ok(())
}

/// Serialize one cell. Pure function of its inputs; validates id bounds
/// and version representability before writing anything.
pub fn serialize_tile(
    tile: &TileRecord,
    version: u32,
    info: &VersionInfo,
    w: &mut impl Write,
) -> Result<(), WorldError> {
    check_representable(tile, version)?;
    if tile.is_active && tile.tile_type > info.max_tile_id {
        return Err(WorldError::IdOutOfRange {
            kind: "tile",
            id: tile.tile_type,
            max: info.max_tile_id,
        });
    }
    if tile.wall > info.max_wall_id {
        return Err(WorldError::IdOutOfRange {
            kind: "wall",
            id: tile.wall,
            max: info.max_wall_id,
        });
    }

    write_bool(w, tile.is_active)?;
    if tile.is_active {
        w.write_u16::<LittleEndian>(tile.tile_type)?;
        if info.is_frame_important(tile.tile_type) {
            w.write_i16::<LittleEndian>(tile.u)?;
            w.write_i16::<LittleEndian>(tile.v)?;
        }
        if version >= 5 {
            write_bool(w, tile.tile_color != 0)?;
            if tile.tile_color != 0 {
                w.write_u8(tile.tile_color)?;
            }
        }
    }

    if version < 4 {
        write_bool(w, tile.wire_red)?;
    } else {
        let mut flags = 0u8;
        if tile.wire_red {
            flags |= FLAG_WIRE_RED;
        }
        if tile.wire_green {
            flags |= FLAG_WIRE_GREEN;
        }
        if tile.wire_blue {
            flags |= FLAG_WIRE_BLUE;
        }
        if tile.wire_yellow {
            flags |= FLAG_WIRE_YELLOW;
        }
        if tile.actuator {
            flags |= FLAG_ACTUATOR;
        }
        if tile.in_active {
            flags |= FLAG_IN_ACTIVE;
        }
        if tile.brick_style != BrickStyle::Full {
            flags |= FLAG_EXTENDED;
        }
        w.write_u8(flags)?;
        if flags & FLAG_EXTENDED != 0 {
            w.write_u8(brick_style_to_u8(tile.brick_style))?;
        }
    }

    write_bool(w, tile.wall != 0)?;
    if tile.wall != 0 {
        w.write_u16::<LittleEndian>(tile.wall)?;
        if version >= 5 {
            write_bool(w, tile.wall_color != 0)?;
            if tile.wall_color != 0 {
                w.write_u8(tile.wall_color)?;
            }
        }
    }

    let has_liquid = tile.has_liquid();
    write_bool(w, has_liquid)?;
    if has_liquid {
        w.write_u8(tile.liquid)?;
        w.write_u8(liquid_type_to_u8(tile.liquid_type))?;
    }

    Ok(())
}

/// Deserialize one cell. The inverse of [`serialize_tile`]; leaves `u`/`v`
/// at -1 for tiles the version does not store a frame for.
pub fn deserialize_tile(
    version: u32,
    info: &VersionInfo,
    r: &mut impl Read,
) -> Result<TileRecord, WorldError> {
    let mut tile = TileRecord::default();

    tile.is_active = read_bool(r)?;
    if tile.is_active {
        tile.tile_type = r.read_u16::<LittleEndian>()?;
        if tile.tile_type > info.max_tile_id {
            return Err(WorldError::IdOutOfRange {
                kind: "tile",
                id: tile.tile_type,
                max: info.max_tile_id,
            });
        }
        if info.is_frame_important(tile.tile_type) {
            tile.u = r.read_i16::<LittleEndian>()?;
            tile.v = r.read_i16::<LittleEndian>()?;
        }
        if version >= 5 && read_bool(r)? {
            tile.tile_color = r.read_u8()?;
        }
    }

    if version < 4 {
        tile.wire_red = read_bool(r)?;
    } else {
        let flags = r.read_u8()?;
        if flags & !(FLAG_WIRE_RED
            | FLAG_WIRE_GREEN
            | FLAG_WIRE_BLUE
            | FLAG_WIRE_YELLOW
            | FLAG_ACTUATOR
            | FLAG_IN_ACTIVE
            | FLAG_EXTENDED)
            != 0
        {
            return Err(WorldError::Format(format!(
                "unknown tile flag bits in {flags:#04x}"
            )));
        }
        tile.wire_red = flags & FLAG_WIRE_RED != 0;
        tile.wire_green = flags & FLAG_WIRE_GREEN != 0;
        tile.wire_blue = flags & FLAG_WIRE_BLUE != 0;
        tile.wire_yellow = flags & FLAG_WIRE_YELLOW != 0;
        tile.actuator = flags & FLAG_ACTUATOR != 0;
        tile.in_active = flags & FLAG_IN_ACTIVE != 0;
        if flags & FLAG_EXTENDED != 0 {
            let extra = r.read_u8()?;
            tile.brick_style = u8_to_brick_style(extra).ok_or_else(|| {
                WorldError::Format(format!("invalid brick style byte {extra:#04x}"))
            })?;
        }
    }

    if read_bool(r)? {
        tile.wall = r.read_u16::<LittleEndian>()?;
        if tile.wall > info.max_wall_id {
            return Err(WorldError::IdOutOfRange {
                kind: "wall",
                id: tile.wall,
                max: info.max_wall_id,
            });
        }
        if tile.wall == 0 {
            return Err(WorldError::Format(
                "wall presence flag set but wall id is zero".into(),
            ));
        }
        if version >= 5 && read_bool(r)? {
            tile.wall_color = r.read_u8()?;
        }
    }

    if read_bool(r)? {
        tile.liquid = r.read_u8()?;
        if tile.liquid == 0 {
            return Err(WorldError::Format(
                "liquid presence flag set but amount is zero".into(),
            ));
        }
        let ty = r.read_u8()?;
        tile.liquid_type = u8_to_liquid_type(ty)
            .ok_or_else(|| WorldError::Format(format!("invalid liquid type byte {ty:#04x}")))?;
        if tile.liquid_type == LiquidType::Shimmer && version < 8 {
            return Err(WorldError::Format(format!(
                "shimmer liquid is not defined in format v{version}"
            )));
        }
    }

    Ok(tile)
}
