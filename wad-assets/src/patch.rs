//! Indexed-color raster decoding: column/post patches and raw flats
//!
//! A patch stores an image as per-column run-length "posts" with gaps, so
//! a sprite's empty space costs nothing and decodes to transparent
//! pixels. Flats are raw 64x64 index grids with no header at all.

use tracing::trace;

use crate::error::{AssetError, Result};
use crate::palette::Palette;

/// Patch header: width, height, left offset, top offset, each `i16le`.
const PATCH_HEADER_SIZE: usize = 8;

/// Post terminator sentinel in column data.
const COLUMN_END: u8 = 0xFF;

/// Side length of a raw floor/ceiling flat.
const FLAT_DIM: usize = 64;

/// A decoded RGBA image with draw-anchoring offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u16,
    pub height: u16,
    /// Horizontal draw anchor, pixels left of the origin.
    pub left_offset: i16,
    /// Vertical draw anchor, pixels above the origin.
    pub top_offset: i16,
    /// Row-major RGBA, `width * height * 4` bytes. Pixels no post wrote
    /// keep alpha 0.
    pub pixels: Vec<u8>,
}

impl Raster {
    fn transparent(width: u16, height: u16, left_offset: i16, top_offset: i16) -> Self {
        Self {
            width,
            height,
            left_offset,
            top_offset,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// RGBA value at `(x, y)`; `None` outside the canvas.
    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[at..at + 4].try_into().ok()
    }

    fn put(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let at = (y * self.width as usize + x) * 4;
        self.pixels[at..at + 4].copy_from_slice(&rgba);
    }
}

/// Decode a column/post run-length patch lump into an RGBA raster.
///
/// A malformed column pointer skips that one column; the rest of the
/// image still decodes. Only a header that cannot describe an image at
/// all fails the whole lump.
pub fn decode_patch(lump: &[u8], palette: &Palette) -> Result<Raster> {
    if lump.len() < PATCH_HEADER_SIZE {
        return Err(AssetError::InvalidFormat(format!(
            "patch lump is {} bytes, header needs {PATCH_HEADER_SIZE}",
            lump.len()
        )));
    }
    let width = i16::from_le_bytes([lump[0], lump[1]]);
    let height = i16::from_le_bytes([lump[2], lump[3]]);
    let left_offset = i16::from_le_bytes([lump[4], lump[5]]);
    let top_offset = i16::from_le_bytes([lump[6], lump[7]]);

    if width <= 0 || height <= 0 {
        return Err(AssetError::InvalidFormat(format!(
            "patch dimensions {width}x{height}"
        )));
    }

    let table_end = PATCH_HEADER_SIZE + width as usize * 4;
    if lump.len() < table_end {
        return Err(AssetError::InvalidFormat(format!(
            "column table needs {table_end} bytes, lump has {}",
            lump.len()
        )));
    }

    let mut raster = Raster::transparent(width as u16, height as u16, left_offset, top_offset);

    for x in 0..width as usize {
        let at = PATCH_HEADER_SIZE + x * 4;
        let pointer = i32::from_le_bytes([lump[at], lump[at + 1], lump[at + 2], lump[at + 3]]);
        if pointer < 0 || pointer as usize >= lump.len() {
            trace!(
                "column {x} pointer {pointer} outside lump of {} bytes, left transparent",
                lump.len()
            );
            continue;
        }
        decode_column(lump, pointer as usize, x, &mut raster, palette);
    }

    Ok(raster)
}

/// Walk one column's posts. Damage inside a single column terminates that
/// column only.
fn decode_column(lump: &[u8], mut p: usize, x: usize, raster: &mut Raster, palette: &Palette) {
    let height = raster.height as usize;
    loop {
        let Some(&top_delta) = lump.get(p) else {
            return;
        };
        if top_delta == COLUMN_END {
            return;
        }
        let Some(&length) = lump.get(p + 1) else {
            return;
        };
        // One padding byte before the pixel run, one after.
        let run = p + 3;
        let Some(pixels) = lump.get(run..run + length as usize) else {
            return;
        };
        for (i, &index) in pixels.iter().enumerate() {
            let y = top_delta as usize + i;
            // Rows past the canvas are dropped, never fatal.
            if y < height {
                raster.put(x, y, palette.rgba(index));
            }
        }
        p = run + length as usize + 1;
    }
}

/// Decode a raw 64x64 indexed-color flat into a fully opaque raster.
pub fn decode_flat(lump: &[u8], palette: &Palette) -> Result<Raster> {
    const FLAT_LEN: usize = FLAT_DIM * FLAT_DIM;
    if lump.len() < FLAT_LEN {
        return Err(AssetError::InvalidFormat(format!(
            "flat lump is {} bytes, expected {FLAT_LEN}",
            lump.len()
        )));
    }
    let mut raster = Raster::transparent(FLAT_DIM as u16, FLAT_DIM as u16, 0, 0);
    for (i, &index) in lump[..FLAT_LEN].iter().enumerate() {
        raster.put(i % FLAT_DIM, i / FLAT_DIM, palette.rgba(index));
    }
    Ok(raster)
}
