//! Decoders for the binary payload formats carried inside WAD archives
//!
//! The container layer (`wad-archive`) resolves names to byte ranges; this
//! crate decodes what those ranges hold: the 256-entry palette, run-length
//! column graphics and raw flats, map geometry tables, and digitized
//! sound. [`AssetStore`] ties them together with per-archive memoization
//! so each resource is decoded at most once.

pub mod cache;
pub mod error;
pub mod map;
pub mod palette;
pub mod patch;
pub mod sound;
pub mod store;

pub use cache::ResourceCache;
pub use error::{AssetError, Result};
pub use map::{LineDef, MapData, Sector, SideDef, Thing, Vertex};
pub use palette::Palette;
pub use patch::{Raster, decode_flat, decode_patch};
pub use sound::{PcmBuffer, decode_sound};
pub use store::AssetStore;
