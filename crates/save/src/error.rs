// ---------------------------------------------------------------------------
// WorldError: typed errors for world load/save operations
// ---------------------------------------------------------------------------

use std::fmt;

use world::version_table::VersionTableError;

/// Errors that can occur while reading or writing a world file.
///
/// `Io` is a stream failure (truncation, permission) and not recoverable
/// locally. The structural variants carry enough context for a user-facing
/// "corrupt or unsupported file" message; malformed data is never silently
/// coerced to defaults, since that would corrupt the file on re-save.
#[derive(Debug)]
pub enum WorldError {
    /// I/O error (file not found, truncated stream, permission denied).
    Io(std::io::Error),
    /// Structurally invalid data (bad flag byte, bad string, bad tag).
    Format(String),
    /// A tile or wall id beyond the version's bound.
    IdOutOfRange {
        kind: &'static str,
        id: u16,
        max: u16,
    },
    /// The file declares a format version newer than this build supports.
    UnsupportedVersion { supported: u32, found: u32 },
    /// The trailing footer does not restate the header.
    FooterMismatch { field: &'static str },
    /// The version table has no entry for an otherwise supported version;
    /// a build/config mismatch, not a bad file.
    VersionTable(VersionTableError),
}

impl WorldError {
    /// Attach a tile coordinate to a structural error. I/O errors pass
    /// through untouched; position context would only obscure them.
    pub(crate) fn at_tile(self, x: usize, y: usize) -> WorldError {
        match self {
            WorldError::Io(e) => WorldError::Io(e),
            other => WorldError::Format(format!("tile ({x}, {y}): {other}")),
        }
    }
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::Io(e) => write!(f, "I/O error: {e}"),
            WorldError::Format(msg) => write!(f, "Format error: {msg}"),
            WorldError::IdOutOfRange { kind, id, max } => {
                write!(f, "{kind} id {id} exceeds the version's maximum of {max}")
            }
            WorldError::UnsupportedVersion { supported, found } => write!(
                f,
                "World file is format v{found}, but this build only supports up to v{supported}"
            ),
            WorldError::FooterMismatch { field } => write!(
                f,
                "Footer {field} does not match the header: file truncated or corrupted"
            ),
            WorldError::VersionTable(e) => write!(f, "Version table error: {e}"),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorldError::Io(e) => Some(e),
            WorldError::VersionTable(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WorldError {
    fn from(e: std::io::Error) -> Self {
        WorldError::Io(e)
    }
}

impl From<VersionTableError> for WorldError {
    fn from(e: VersionTableError) -> Self {
        WorldError::VersionTable(e)
    }
}
