//! The world binary codec: header, RLE tile grid, entity side tables and
//! the trailing consistency footer.
//!
//! Reading is staged the same way the bytes are laid out: header, grid,
//! chests, signs, tile entities (v6+), NPCs (v2+), footer (v8+). Writing
//! is the exact inverse. All per-version branching consults the
//! `VersionTable` entry for the file's declared version; the codec itself
//! is stateless beyond the borrowed table and can load independent worlds
//! concurrently.

use std::io::{BufReader, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info, warn};

use world::entities::{is_chest_tile, is_sign_tile, is_tile_entity_tile};
use world::version_table::{VersionInfo, VersionTable, MIN_VERSION};
use world::{World, WorldHeader};

use crate::atomic_write::atomic_write;
use crate::entity_codec::{
    read_chest, read_npc, read_sign, read_tile_entity, write_chest, write_npc, write_sign,
    write_tile_entity,
};
use crate::error::WorldError;
use crate::rw::{read_bool, read_string, write_bool, write_string};
use crate::tile_codec::{deserialize_tile, serialize_tile};

/// Fixed chest table size: this many presence-flagged slots on the wire.
pub const MAX_CHESTS: usize = 1000;

/// Fixed sign table size.
pub const MAX_SIGNS: usize = 1000;

// Dimension sanity bound; anything larger is corruption, not a world.
const MAX_DIMENSION: i32 = 100_000;

const MAX_TILE_ENTITIES: i32 = 1_000_000;

/// Reader/writer for the versioned world format. Borrows the version
/// table; construct once and reuse.
pub struct WorldCodec<'a> {
    table: &'a VersionTable,
}

impl<'a> WorldCodec<'a> {
    pub fn new(table: &'a VersionTable) -> Self {
        Self { table }
    }

    /// Load a world from a byte stream.
    ///
    /// # Errors
    ///
    /// `WorldError::Io` for truncated or unreadable streams,
    /// `WorldError::UnsupportedVersion` when the file declares a version
    /// past this build's ceiling, and `WorldError::Format` (with the
    /// offending position where known) for structural corruption.
    pub fn load(&self, r: &mut impl Read) -> Result<World, WorldError> {
        let raw_version = r.read_i32::<LittleEndian>()?;
        if raw_version < MIN_VERSION as i32 {
            return Err(WorldError::Format(format!(
                "leading bytes are not a recognized format version ({raw_version})"
            )));
        }
        let version = raw_version as u32;
        let ceiling = self.table.max_version();
        if version > ceiling {
            return Err(WorldError::UnsupportedVersion {
                supported: ceiling,
                found: version,
            });
        }
        let info = self.table.info(version)?;

        let (header, width, height) = read_header(version, r)?;
        let mut world = World::new(width, height);
        world.header = header;

        self.read_tiles(&mut world, version, info, r)?;
        read_chest_table(&mut world, version, r)?;
        read_sign_table(&mut world, r)?;
        if version >= 6 {
            read_tile_entity_table(&mut world, r)?;
        }
        if version >= 2 {
            read_npc_table(&mut world, r)?;
        }
        if version > 7 {
            read_footer(&world, r)?;
        }

        drop_orphaned_entities(&mut world);

        info!(
            "loaded world {:?} ({}x{}, format v{})",
            world.header.name,
            world.width(),
            world.height(),
            version
        );
        debug!(
            "{} chests, {} signs, {} tile entities, {} npcs",
            world.chests.len(),
            world.signs.len(),
            world.tile_entities.len(),
            world.npcs.len()
        );
        Ok(world)
    }

    /// Save a world at its own header version (preserve-version policy).
    pub fn save(&self, world: &World, w: &mut impl Write) -> Result<(), WorldError> {
        self.save_as_version(world, world.header.version, w)
    }

    /// Re-encode a world at an explicit format version.
    ///
    /// Down-conversion is strict: data the target version cannot express
    /// (tile entities before v6, NPCs before v2, shimmer before v8,
    /// slopes and colored wire before v4, paint before v5) is rejected
    /// with a format error rather than silently dropped.
    pub fn save_as_version(
        &self,
        world: &World,
        version: u32,
        w: &mut impl Write,
    ) -> Result<(), WorldError> {
        let info = self.table.info(version)?;
        check_expressible(world, version)?;

        w.write_i32::<LittleEndian>(version as i32)?;
        write_header(&world.header, version, world.width(), world.height(), w)?;
        self.write_tiles(world, version, info, w)?;
        write_chest_table(world, version, w)?;
        write_sign_table(world, w)?;
        if version >= 6 {
            write_tile_entity_table(world, w)?;
        }
        if version >= 2 {
            write_npc_table(world, w)?;
        }
        if version > 7 {
            write_bool(w, true)?;
            write_string(w, &world.header.name)?;
            w.write_i32::<LittleEndian>(world.header.world_id)?;
        }

        debug!(
            "saved world {:?} at format v{version}",
            world.header.name
        );
        Ok(())
    }

    /// Load a world from a file path (buffered).
    pub fn load_file(&self, path: &Path) -> Result<World, WorldError> {
        let file = std::fs::File::open(path)?;
        self.load(&mut BufReader::new(file))
    }

    /// Save a world to a file path using the write-rename pattern, so a
    /// crash mid-save never corrupts the existing file.
    pub fn save_file(&self, world: &World, path: &Path) -> Result<(), WorldError> {
        let mut bytes = Vec::new();
        self.save(world, &mut bytes)?;
        atomic_write(path, &bytes)?;
        Ok(())
    }

    fn read_tiles(
        &self,
        world: &mut World,
        version: u32,
        info: &VersionInfo,
        r: &mut impl Read,
    ) -> Result<(), WorldError> {
        let height = world.height();
        let total = world.width() * height;
        let rle = version >= 3;

        let mut index = 0usize;
        while index < total {
            let (x, y) = (index / height, index % height);
            let tile = deserialize_tile(version, info, r).map_err(|e| e.at_tile(x, y))?;
            *world.tile_mut(x, y) = tile.clone();
            index += 1;

            if rle {
                let repeat = r.read_i16::<LittleEndian>()?;
                if repeat < 0 {
                    return Err(WorldError::Format(format!(
                        "negative RLE repeat count {repeat} at tile ({x}, {y})"
                    )));
                }
                for _ in 0..repeat {
                    if index >= total {
                        return Err(WorldError::Format(format!(
                            "RLE run of {repeat} at tile ({x}, {y}) overruns the grid"
                        )));
                    }
                    *world.tile_mut(index / height, index % height) = tile.clone();
                    index += 1;
                }
            }
        }
        Ok(())
    }

    fn write_tiles(
        &self,
        world: &World,
        version: u32,
        info: &VersionInfo,
        w: &mut impl Write,
    ) -> Result<(), WorldError> {
        let rle = version >= 3;
        // Runs are detected on the serialized bytes, so two cells only
        // merge when every stored field matches.
        let mut pending: Option<(Vec<u8>, i16)> = None;

        for x in 0..world.width() {
            for y in 0..world.height() {
                let mut cell = Vec::with_capacity(16);
                serialize_tile(world.tile(x, y), version, info, &mut cell)
                    .map_err(|e| e.at_tile(x, y))?;

                match &mut pending {
                    Some((bytes, count)) if rle && *bytes == cell && *count < i16::MAX => {
                        *count += 1;
                    }
                    Some((bytes, count)) => {
                        w.write_all(bytes)?;
                        if rle {
                            w.write_i16::<LittleEndian>(*count)?;
                        }
                        *bytes = cell;
                        *count = 0;
                    }
                    None => pending = Some((cell, 0)),
                }
            }
        }
        if let Some((bytes, count)) = pending {
            w.write_all(&bytes)?;
            if rle {
                w.write_i16::<LittleEndian>(count)?;
            }
        }
        Ok(())
    }
}

fn read_header(
    version: u32,
    r: &mut impl Read,
) -> Result<(WorldHeader, usize, usize), WorldError> {
    let mut header = WorldHeader {
        version,
        name: read_string(r)?,
        world_id: r.read_i32::<LittleEndian>()?,
        left: r.read_i32::<LittleEndian>()?,
        right: r.read_i32::<LittleEndian>()?,
        top: r.read_i32::<LittleEndian>()?,
        bottom: r.read_i32::<LittleEndian>()?,
        ..Default::default()
    };

    let max_tiles_y = r.read_i32::<LittleEndian>()?;
    let max_tiles_x = r.read_i32::<LittleEndian>()?;
    for (axis, value) in [("height", max_tiles_y), ("width", max_tiles_x)] {
        if value <= 0 || value > MAX_DIMENSION {
            return Err(WorldError::Format(format!(
                "implausible world {axis} {value}"
            )));
        }
    }

    header.spawn_x = r.read_i32::<LittleEndian>()?;
    header.spawn_y = r.read_i32::<LittleEndian>()?;
    header.world_surface = r.read_f64::<LittleEndian>()?;
    header.rock_layer = r.read_f64::<LittleEndian>()?;
    header.time = r.read_f64::<LittleEndian>()?;
    header.is_day = read_bool(r)?;
    header.moon_phase = r.read_i32::<LittleEndian>()?;
    header.is_blood_moon = read_bool(r)?;
    header.dungeon_x = r.read_i32::<LittleEndian>()?;
    header.dungeon_y = r.read_i32::<LittleEndian>()?;
    header.boss_1_downed = read_bool(r)?;
    header.boss_2_downed = read_bool(r)?;
    header.boss_3_downed = read_bool(r)?;
    header.shadow_orbs_smashed = read_bool(r)?;
    header.shadow_orb_count = r.read_u8()?;
    header.invasion_delay = r.read_i32::<LittleEndian>()?;
    header.invasion_size = r.read_i32::<LittleEndian>()?;
    header.invasion_type = r.read_i32::<LittleEndian>()?;
    header.invasion_x = r.read_f64::<LittleEndian>()?;
    // Fields appended by later format revisions; default on older files.
    if version >= 6 {
        header.hard_mode = read_bool(r)?;
    }

    Ok((header, max_tiles_x as usize, max_tiles_y as usize))
}

fn write_header(
    header: &WorldHeader,
    version: u32,
    width: usize,
    height: usize,
    w: &mut impl Write,
) -> Result<(), WorldError> {
    write_string(w, &header.name)?;
    w.write_i32::<LittleEndian>(header.world_id)?;
    w.write_i32::<LittleEndian>(header.left)?;
    w.write_i32::<LittleEndian>(header.right)?;
    w.write_i32::<LittleEndian>(header.top)?;
    w.write_i32::<LittleEndian>(header.bottom)?;
    w.write_i32::<LittleEndian>(height as i32)?;
    w.write_i32::<LittleEndian>(width as i32)?;
    w.write_i32::<LittleEndian>(header.spawn_x)?;
    w.write_i32::<LittleEndian>(header.spawn_y)?;
    w.write_f64::<LittleEndian>(header.world_surface)?;
    w.write_f64::<LittleEndian>(header.rock_layer)?;
    w.write_f64::<LittleEndian>(header.time)?;
    write_bool(w, header.is_day)?;
    w.write_i32::<LittleEndian>(header.moon_phase)?;
    write_bool(w, header.is_blood_moon)?;
    w.write_i32::<LittleEndian>(header.dungeon_x)?;
    w.write_i32::<LittleEndian>(header.dungeon_y)?;
    write_bool(w, header.boss_1_downed)?;
    write_bool(w, header.boss_2_downed)?;
    write_bool(w, header.boss_3_downed)?;
    write_bool(w, header.shadow_orbs_smashed)?;
    w.write_u8(header.shadow_orb_count)?;
    w.write_i32::<LittleEndian>(header.invasion_delay)?;
    w.write_i32::<LittleEndian>(header.invasion_size)?;
    w.write_i32::<LittleEndian>(header.invasion_type)?;
    w.write_f64::<LittleEndian>(header.invasion_x)?;
    if version >= 6 {
        write_bool(w, header.hard_mode)?;
    }
    Ok(())
}

fn check_expressible(world: &World, version: u32) -> Result<(), WorldError> {
    // The loader rejects these dimensions, so writing them would produce a
    // stream nothing can read back.
    for (axis, value) in [("height", world.height()), ("width", world.width())] {
        if value == 0 || value > MAX_DIMENSION as usize {
            return Err(WorldError::Format(format!(
                "implausible world {axis} {value}"
            )));
        }
    }
    if version < 6 && !world.tile_entities.is_empty() {
        return Err(WorldError::Format(format!(
            "{} tile entities cannot be stored in format v{version}",
            world.tile_entities.len()
        )));
    }
    if version < 2 && !world.npcs.is_empty() {
        return Err(WorldError::Format(format!(
            "{} NPCs cannot be stored in format v{version}",
            world.npcs.len()
        )));
    }
    if world.chests.len() > MAX_CHESTS {
        return Err(WorldError::Format(format!(
            "{} chests exceed the table size of {MAX_CHESTS}",
            world.chests.len()
        )));
    }
    if world.signs.len() > MAX_SIGNS {
        return Err(WorldError::Format(format!(
            "{} signs exceed the table size of {MAX_SIGNS}",
            world.signs.len()
        )));
    }
    Ok(())
}

fn read_chest_table(
    world: &mut World,
    version: u32,
    r: &mut impl Read,
) -> Result<(), WorldError> {
    for _ in 0..MAX_CHESTS {
        if read_bool(r)? {
            world.chests.push(read_chest(version, r)?);
        }
    }
    Ok(())
}

fn write_chest_table(world: &World, version: u32, w: &mut impl Write) -> Result<(), WorldError> {
    for chest in &world.chests {
        write_bool(w, true)?;
        write_chest(chest, version, w)?;
    }
    for _ in world.chests.len()..MAX_CHESTS {
        write_bool(w, false)?;
    }
    Ok(())
}

fn read_sign_table(world: &mut World, r: &mut impl Read) -> Result<(), WorldError> {
    for _ in 0..MAX_SIGNS {
        if read_bool(r)? {
            world.signs.push(read_sign(r)?);
        }
    }
    Ok(())
}

fn write_sign_table(world: &World, w: &mut impl Write) -> Result<(), WorldError> {
    for sign in &world.signs {
        write_bool(w, true)?;
        write_sign(sign, w)?;
    }
    for _ in world.signs.len()..MAX_SIGNS {
        write_bool(w, false)?;
    }
    Ok(())
}

fn read_tile_entity_table(world: &mut World, r: &mut impl Read) -> Result<(), WorldError> {
    let count = r.read_i32::<LittleEndian>()?;
    if !(0..=MAX_TILE_ENTITIES).contains(&count) {
        return Err(WorldError::Format(format!(
            "implausible tile entity count {count}"
        )));
    }
    for _ in 0..count {
        world.tile_entities.push(read_tile_entity(r)?);
    }
    Ok(())
}

fn write_tile_entity_table(world: &World, w: &mut impl Write) -> Result<(), WorldError> {
    w.write_i32::<LittleEndian>(world.tile_entities.len() as i32)?;
    for entity in &world.tile_entities {
        write_tile_entity(entity, w)?;
    }
    Ok(())
}

fn read_npc_table(world: &mut World, r: &mut impl Read) -> Result<(), WorldError> {
    while read_bool(r)? {
        world.npcs.push(read_npc(r)?);
    }
    Ok(())
}

fn write_npc_table(world: &World, w: &mut impl Write) -> Result<(), WorldError> {
    for npc in &world.npcs {
        write_bool(w, true)?;
        write_npc(npc, w)?;
    }
    write_bool(w, false)?;
    Ok(())
}

fn read_footer(world: &World, r: &mut impl Read) -> Result<(), WorldError> {
    if !read_bool(r)? {
        return Err(WorldError::Format(
            "footer validity flag is unset: file truncated or corrupted".into(),
        ));
    }
    let name = read_string(r)?;
    if name != world.header.name {
        return Err(WorldError::FooterMismatch { field: "name" });
    }
    let world_id = r.read_i32::<LittleEndian>()?;
    if world_id != world.header.world_id {
        return Err(WorldError::FooterMismatch { field: "world_id" });
    }
    Ok(())
}

/// Drop side-table entries whose anchor tile is out of bounds, inactive
/// or of the wrong type. Third-party editors produce these; keeping them
/// would re-save dangling references.
fn drop_orphaned_entities(world: &mut World) {
    let anchored = |world: &World, x: i32, y: i32, classify: fn(u16) -> bool| match world
        .get(x, y)
    {
        Some(t) => t.is_active && classify(t.tile_type),
        None => false,
    };

    let mut kept = std::mem::take(&mut world.chests);
    kept.retain(|c| {
        let ok = anchored(world, c.x, c.y, is_chest_tile);
        if !ok {
            warn!("dropping chest at ({}, {}): no chest tile at anchor", c.x, c.y);
        }
        ok
    });
    world.chests = kept;

    let mut kept = std::mem::take(&mut world.signs);
    kept.retain(|s| {
        let ok = anchored(world, s.x, s.y, is_sign_tile);
        if !ok {
            warn!("dropping sign at ({}, {}): no sign tile at anchor", s.x, s.y);
        }
        ok
    });
    world.signs = kept;

    let mut kept = std::mem::take(&mut world.tile_entities);
    kept.retain(|t| {
        let ok = anchored(world, t.x.into(), t.y.into(), is_tile_entity_tile);
        if !ok {
            warn!(
                "dropping tile entity {} at ({}, {}): no anchor tile",
                t.id, t.x, t.y
            );
        }
        ok
    });
    world.tile_entities = kept;
}
