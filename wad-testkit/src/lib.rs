//! Test utilities for wad-rs
//!
//! Builds synthetic in-memory WAD fixtures so tests and examples never
//! depend on retail game data.

/// Builder for synthetic WAD archives.
///
/// Lump payloads are laid out immediately after the 12-byte header in
/// insertion order; the directory is appended last, matching the layout
/// produced by common archive tools.
pub struct WadBuilder {
    magic: [u8; 4],
    lumps: Vec<(String, Vec<u8>)>,
}

impl WadBuilder {
    /// Start a base archive (`IWAD`).
    pub fn iwad() -> Self {
        Self::with_magic(*b"IWAD")
    }

    /// Start a patch/override archive (`PWAD`).
    pub fn pwad() -> Self {
        Self::with_magic(*b"PWAD")
    }

    /// Start an archive with an arbitrary magic tag, valid or not.
    pub fn with_magic(magic: [u8; 4]) -> Self {
        Self {
            magic,
            lumps: Vec::new(),
        }
    }

    /// Append a named lump.
    #[must_use]
    pub fn lump(mut self, name: &str, data: &[u8]) -> Self {
        self.lumps.push((name.to_string(), data.to_vec()));
        self
    }

    /// Append a zero-length marker lump.
    #[must_use]
    pub fn marker(self, name: &str) -> Self {
        self.lump(name, &[])
    }

    /// Serialize to archive bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        let mut directory = Vec::new();
        for (name, data) in &self.lumps {
            let offset = 12 + payload.len() as u32;
            directory.extend_from_slice(&offset.to_le_bytes());
            directory.extend_from_slice(&(data.len() as u32).to_le_bytes());
            let mut raw = [0u8; 8];
            for (dst, byte) in raw.iter_mut().zip(name.bytes()) {
                *dst = byte;
            }
            directory.extend_from_slice(&raw);
            payload.extend_from_slice(data);
        }

        let mut wad = Vec::with_capacity(12 + payload.len() + directory.len());
        wad.extend_from_slice(&self.magic);
        wad.extend_from_slice(&(self.lumps.len() as u32).to_le_bytes());
        wad.extend_from_slice(&(12 + payload.len() as u32).to_le_bytes());
        wad.extend_from_slice(&payload);
        wad.extend_from_slice(&directory);
        wad
    }

    /// Write the archive to a named temporary file.
    pub fn write_temp(&self) -> std::io::Result<tempfile::NamedTempFile> {
        let file = tempfile::NamedTempFile::new()?;
        std::fs::write(file.path(), self.build())?;
        Ok(file)
    }
}

/// A 768-byte palette lump where entry `i` is `(i, i*3 mod 256, 255-i)`.
pub fn palette_lump() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(768);
    for i in 0..=255u8 {
        bytes.push(i);
        bytes.push(i.wrapping_mul(3));
        bytes.push(255 - i);
    }
    bytes
}

/// A digitized-sound lump with the given declared rate and payload.
pub fn sound_lump(sample_rate: u16, samples: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + samples.len());
    bytes.extend_from_slice(&3u16.to_le_bytes()); // format marker
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    bytes.extend_from_slice(samples);
    bytes
}

/// A patch lump whose every column is the same single post.
///
/// All column pointers share one post: `top_delta`, then `pixels` as
/// palette indices.
pub fn solid_patch_lump(width: i16, height: i16, top_delta: u8, pixels: &[u8]) -> Vec<u8> {
    let mut post = Vec::new();
    post.push(top_delta);
    post.push(pixels.len() as u8);
    post.push(0); // padding
    post.extend_from_slice(pixels);
    post.push(0); // padding
    post.push(0xFF); // column terminator

    let data_start = 8 + width as usize * 4;
    let mut lump = Vec::new();
    lump.extend_from_slice(&width.to_le_bytes());
    lump.extend_from_slice(&height.to_le_bytes());
    lump.extend_from_slice(&0i16.to_le_bytes()); // left offset
    lump.extend_from_slice(&0i16.to_le_bytes()); // top offset
    for _ in 0..width {
        lump.extend_from_slice(&(data_start as i32).to_le_bytes());
    }
    lump.extend_from_slice(&post);
    lump
}

/// A `VERTEXES` table from `(x, y)` pairs.
pub fn vertex_lump(vertices: &[(i16, i16)]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vertices.len() * 4);
    for &(x, y) in vertices {
        bytes.extend_from_slice(&x.to_le_bytes());
        bytes.extend_from_slice(&y.to_le_bytes());
    }
    bytes
}
