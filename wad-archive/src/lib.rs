//! WAD archive container parsing
//!
//! A WAD file is a flat archive: a 12-byte header followed by named,
//! offset-addressed binary blobs ("lumps") described by a directory table.
//! This crate parses the header and directory, resolves names to byte
//! ranges, and hands out bounds-checked lump slices. It knows nothing about
//! the payload formats inside the lumps; see the `wad-assets` crate for
//! those.

pub mod container;
pub mod error;
pub mod types;

pub use container::WadArchive;
pub use error::{Result, WadError};
pub use types::{DirectoryEntry, Name8, WadKind};
