//! RGSSAD container format detection.
//!
//! An archive is classified by its first 8 bytes. Everything after the
//! header is format-specific and handled by the metadata parsers.

pub(crate) mod parser;

use crate::{Error, Result};

/// Length of the container header.
pub const HEADER_LEN: usize = 8;

/// Magic carried by RGSS archives, including the terminating NUL; the
/// eighth byte is the version.
pub(crate) const RGSSAD_MAGIC: &[u8; 7] = b"RGSSAD\0";

/// Magic of the Fux2Pack variant; fills the whole header.
pub(crate) const FUX2PACK_MAGIC: &[u8; 8] = b"Fux2Pack";

/// Detected container flavor.
///
/// Versions 1 and 2 share the legacy inline layout; version 3 and Fux2Pack
/// share the entry-table layout and differ only in how the metadata key is
/// derived from the stored seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// `RGSSAD\0` version 1 (RPG Maker XP).
    V1,
    /// `RGSSAD\0` version 2 (RPG Maker VX).
    V2,
    /// `RGSSAD\0` version 3 (RPG Maker VX Ace).
    V3,
    /// `Fux2Pack`: version 3 layout, raw metadata key.
    Fux2Pack,
}

impl ArchiveFormat {
    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            ArchiveFormat::V1 => "RGSSAD v1",
            ArchiveFormat::V2 => "RGSSAD v2",
            ArchiveFormat::V3 => "RGSSAD v3",
            ArchiveFormat::Fux2Pack => "Fux2Pack",
        }
    }

    /// Whether this format uses the legacy inline entry layout.
    pub fn uses_legacy_layout(&self) -> bool {
        matches!(self, ArchiveFormat::V1 | ArchiveFormat::V2)
    }

    /// Whether the metadata key is derived from the stored seed
    /// (`seed·9 + 3 mod 2^32`) rather than used as-is.
    pub(crate) fn derives_metadata_key(&self) -> bool {
        matches!(self, ArchiveFormat::V3)
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classifies an 8-byte container header.
pub(crate) fn detect_format(header: &[u8; HEADER_LEN]) -> Result<ArchiveFormat> {
    if header[..7] == RGSSAD_MAGIC[..] {
        return match header[7] {
            1 => Ok(ArchiveFormat::V1),
            2 => Ok(ArchiveFormat::V2),
            3 => Ok(ArchiveFormat::V3),
            version => Err(Error::UnsupportedFormat(format!(
                "RGSSAD version {version}"
            ))),
        };
    }
    if header == FUX2PACK_MAGIC {
        return Ok(ArchiveFormat::Fux2Pack);
    }
    Err(Error::UnsupportedFormat(format!(
        "unknown magic {:02x?}",
        &header[..]
    )))
}
