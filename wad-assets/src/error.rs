//! Error types for lump payload decoding

use thiserror::Error;
use wad_archive::WadError;

/// Result type for asset decoding operations.
pub type Result<T> = std::result::Result<T, AssetError>;

#[derive(Error, Debug)]
pub enum AssetError {
    /// Container-level failure while locating or reading a lump.
    #[error(transparent)]
    Archive(#[from] WadError),

    /// Structurally malformed lump payload.
    #[error("invalid lump format: {0}")]
    InvalidFormat(String),

    /// No directory entry carries the requested name.
    #[error("lump {0} not found")]
    LumpNotFound(String),

    /// The map marker has no directory entry.
    #[error("map {0} not found")]
    MapNotFound(String),

    /// A record table's byte size is not a multiple of its record width.
    #[error("table {lump} is {size} bytes, not a multiple of {record_size}-byte records")]
    TruncatedTable {
        lump: String,
        size: usize,
        record_size: usize,
    },
}
