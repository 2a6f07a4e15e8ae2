//! Per-format-version field metadata: the maximum valid tile and wall ids
//! and the set of tile ids that carry a stored frame. One entry per format
//! version, parsed once from an embedded JSON document and immutable
//! afterwards; the codec and framing engine take the table by reference.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Newest format version this build reads and writes.
pub const CURRENT_VERSION: u32 = 9;

/// Oldest format version this build reads.
pub const MIN_VERSION: u32 = 1;

/// Errors raised while loading or querying the version table. A lookup for
/// an unknown version is a build/config mismatch, not a bad file, and the
/// codec must fail fast rather than guess at id bounds.
#[derive(Debug)]
pub enum VersionTableError {
    Parse(String),
    UnknownVersion(u32),
}

impl fmt::Display for VersionTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionTableError::Parse(msg) => write!(f, "version table parse error: {msg}"),
            VersionTableError::UnknownVersion(v) => {
                write!(f, "no version table entry for format version {v}")
            }
        }
    }
}

impl std::error::Error for VersionTableError {}

#[derive(Debug, Deserialize)]
struct RawVersionInfo {
    version: u32,
    max_tile_id: u16,
    max_wall_id: u16,
    frame_important: Vec<u16>,
}

/// Field metadata for one format version.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: u32,
    pub max_tile_id: u16,
    pub max_wall_id: u16,
    frame_important: Vec<bool>,
}

impl VersionInfo {
    /// Whether the given tile id persists its U/V frame in this version.
    /// Ids beyond the version's tile bound are never frame-important.
    pub fn is_frame_important(&self, tile_id: u16) -> bool {
        self.frame_important
            .get(tile_id as usize)
            .copied()
            .unwrap_or(false)
    }
}

/// The full per-version table, keyed by format version number.
#[derive(Debug, Clone)]
pub struct VersionTable {
    infos: BTreeMap<u32, VersionInfo>,
}

const EMBEDDED_JSON: &str = include_str!("versions.json");

impl VersionTable {
    /// Parse a table from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns `VersionTableError::Parse` for malformed JSON, duplicate
    /// version entries, or a frame-important id beyond the tile bound.
    pub fn from_json(json: &str) -> Result<Self, VersionTableError> {
        let raw: Vec<RawVersionInfo> =
            serde_json::from_str(json).map_err(|e| VersionTableError::Parse(e.to_string()))?;

        let mut infos = BTreeMap::new();
        for entry in raw {
            let mut frame_important = vec![false; entry.max_tile_id as usize + 1];
            for id in &entry.frame_important {
                let slot = frame_important.get_mut(*id as usize).ok_or_else(|| {
                    VersionTableError::Parse(format!(
                        "v{}: frame-important id {} exceeds max tile id {}",
                        entry.version, id, entry.max_tile_id
                    ))
                })?;
                *slot = true;
            }
            let info = VersionInfo {
                version: entry.version,
                max_tile_id: entry.max_tile_id,
                max_wall_id: entry.max_wall_id,
                frame_important,
            };
            if infos.insert(entry.version, info).is_some() {
                return Err(VersionTableError::Parse(format!(
                    "duplicate entry for version {}",
                    entry.version
                )));
            }
        }
        if infos.is_empty() {
            return Err(VersionTableError::Parse("no version entries".into()));
        }
        Ok(Self { infos })
    }

    /// The table shipped with this build, covering `MIN_VERSION..=CURRENT_VERSION`.
    pub fn embedded() -> Result<Self, VersionTableError> {
        Self::from_json(EMBEDDED_JSON)
    }

    /// Metadata for one format version.
    ///
    /// # Errors
    ///
    /// `VersionTableError::UnknownVersion` if the table has no entry.
    pub fn info(&self, version: u32) -> Result<&VersionInfo, VersionTableError> {
        self.infos
            .get(&version)
            .ok_or(VersionTableError::UnknownVersion(version))
    }

    pub fn supports(&self, version: u32) -> bool {
        self.infos.contains_key(&version)
    }

    /// Highest version present in the table (the write/read ceiling).
    pub fn max_version(&self) -> u32 {
        // from_json rejects empty tables.
        *self.infos.keys().next_back().expect("table is never empty")
    }
}
