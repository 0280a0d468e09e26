//! Archive-scoped asset resolution facade

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;
use wad_archive::{Name8, WadArchive};

use crate::cache::ResourceCache;
use crate::error::{AssetError, Result};
use crate::map::{self, MapData};
use crate::palette::Palette;
use crate::patch::{self, Raster};
use crate::sound::{self, PcmBuffer};

/// Lazily decodes and memoizes the assets of one opened archive.
///
/// All accessors take `&self`; a store shared behind an `Arc` serves any
/// number of threads. Decoding is pure CPU work over the archive's
/// immutable bytes, so distinct names parallelize freely.
pub struct AssetStore {
    archive: Arc<WadArchive>,
    /// Double-checked lazy cell. A racing first use may resolve the
    /// palette twice; resolution is deterministic, so the duplicate is
    /// only wasted work.
    palette: RwLock<Option<Arc<Palette>>>,
    patches: ResourceCache<Raster>,
    flats: ResourceCache<Raster>,
    sounds: ResourceCache<PcmBuffer>,
}

impl AssetStore {
    pub fn new(archive: WadArchive) -> Self {
        Self::with_archive(Arc::new(archive))
    }

    pub fn with_archive(archive: Arc<WadArchive>) -> Self {
        debug!("asset store over {:?} with {} lumps", archive.kind(), archive.len());
        Self {
            archive,
            palette: RwLock::new(None),
            patches: ResourceCache::new(),
            flats: ResourceCache::new(),
            sounds: ResourceCache::new(),
        }
    }

    pub fn archive(&self) -> &WadArchive {
        &self.archive
    }

    /// The archive palette, resolved on first use and cached for the
    /// lifetime of the store.
    pub fn palette(&self) -> Arc<Palette> {
        if let Some(palette) = self.palette.read().as_ref() {
            return Arc::clone(palette);
        }
        let fresh = Arc::new(Palette::resolve(&self.archive));
        let mut slot = self.palette.write();
        Arc::clone(slot.get_or_insert(fresh))
    }

    /// Decoded patch raster, or `None` when the lump is missing or
    /// malformed (logged once per name).
    pub fn patch(&self, name: &str) -> Option<Arc<Raster>> {
        let name = Name8::new(name);
        self.patches.get_or_decode(name, || {
            let bytes = self.lump(name)?;
            patch::decode_patch(bytes, &self.palette())
        })
    }

    /// Decoded 64x64 flat raster.
    pub fn flat(&self, name: &str) -> Option<Arc<Raster>> {
        let name = Name8::new(name);
        self.flats.get_or_decode(name, || {
            let bytes = self.lump(name)?;
            patch::decode_flat(bytes, &self.palette())
        })
    }

    /// Decoded PCM sound buffer.
    pub fn sound(&self, name: &str) -> Option<Arc<PcmBuffer>> {
        let name = Name8::new(name);
        self.sounds
            .get_or_decode(name, || sound::decode_sound(self.lump(name)?))
    }

    /// Decode the geometry tables of a map. Geometry is consumed once by
    /// level construction, so results are not cached.
    pub fn map(&self, marker: &str) -> Result<MapData> {
        map::decode_map(&self.archive, marker)
    }

    fn lump(&self, name: Name8) -> Result<&[u8]> {
        let entry = self
            .archive
            .find_name(name)
            .ok_or_else(|| AssetError::LumpNotFound(name.to_string()))?;
        Ok(self.archive.read_lump(entry)?)
    }
}
