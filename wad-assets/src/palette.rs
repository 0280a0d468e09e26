//! 256-entry RGBA palette resolution

use tracing::warn;
use wad_archive::WadArchive;

/// Canonical palette lump name.
pub const PALETTE_LUMP: &str = "PLAYPAL";

/// Number of colors in a palette.
pub const PALETTE_SIZE: usize = 256;

/// Byte length of one complete RGB palette on disk.
const PALETTE_LUMP_LEN: usize = PALETTE_SIZE * 3;

/// Fixed 256-entry RGBA lookup table for indexed-color graphics.
///
/// Every entry is fully opaque; transparency in decoded rasters comes from
/// pixels no post ever writes, not from the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [[u8; 4]; PALETTE_SIZE],
}

impl Palette {
    /// Decode the archive's palette lump, falling back to a grayscale ramp
    /// when it is missing, unreadable, or too short. Graphics must keep
    /// rendering either way, if degraded.
    pub fn resolve(archive: &WadArchive) -> Self {
        let lump = match archive.read_by_name(PALETTE_LUMP) {
            Some(Ok(bytes)) => bytes,
            Some(Err(err)) => {
                warn!("{PALETTE_LUMP} unreadable, using grayscale ramp: {err}");
                return Self::grayscale();
            }
            None => {
                warn!("no {PALETTE_LUMP} lump, using grayscale ramp");
                return Self::grayscale();
            }
        };
        Self::from_lump(lump).unwrap_or_else(|| {
            warn!(
                "{PALETTE_LUMP} is {} bytes, expected at least {PALETTE_LUMP_LEN}; using grayscale ramp",
                lump.len()
            );
            Self::grayscale()
        })
    }

    /// Decode 256 consecutive RGB triples into opaque RGBA entries.
    /// `None` when fewer than 768 bytes are present.
    pub fn from_lump(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < PALETTE_LUMP_LEN {
            return None;
        }
        let mut colors = [[0u8; 4]; PALETTE_SIZE];
        for (i, color) in colors.iter_mut().enumerate() {
            let rgb = &bytes[i * 3..i * 3 + 3];
            *color = [rgb[0], rgb[1], rgb[2], 0xFF];
        }
        Some(Self { colors })
    }

    /// Deterministic fallback ramp: index `i` maps to `(i, i, i, 255)`.
    pub fn grayscale() -> Self {
        let mut colors = [[0u8; 4]; PALETTE_SIZE];
        for (i, color) in colors.iter_mut().enumerate() {
            *color = [i as u8, i as u8, i as u8, 0xFF];
        }
        Self { colors }
    }

    /// RGBA color for an indexed-color value.
    pub fn rgba(&self, index: u8) -> [u8; 4] {
        self.colors[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wad_archive::WadArchive;
    use wad_testkit::WadBuilder;

    #[test]
    fn decodes_full_palette_lump() {
        let wad = WadArchive::from_bytes(
            WadBuilder::iwad()
                .lump(PALETTE_LUMP, &wad_testkit::palette_lump())
                .build(),
        )
        .unwrap();

        let palette = Palette::resolve(&wad);
        assert_eq!(palette.rgba(0), [0, 0, 255, 255]);
        assert_eq!(palette.rgba(1), [1, 3, 254, 255]);
        assert_eq!(palette.rgba(255), [255, 253, 0, 255]);
    }

    #[test]
    fn short_lump_falls_back_to_grayscale() {
        let wad = WadArchive::from_bytes(
            WadBuilder::iwad().lump(PALETTE_LUMP, &[1, 2, 3]).build(),
        )
        .unwrap();

        let palette = Palette::resolve(&wad);
        for i in 0..=255u8 {
            assert_eq!(palette.rgba(i), [i, i, i, 255]);
        }
    }

    #[test]
    fn missing_lump_falls_back_to_grayscale() {
        let wad = WadArchive::from_bytes(WadBuilder::iwad().build()).unwrap();
        assert_eq!(Palette::resolve(&wad), Palette::grayscale());
    }

    #[test]
    fn extra_palettes_in_lump_are_ignored() {
        // Retail archives carry 14 palettes back to back; only the first
        // is the draw palette.
        let mut lump = wad_testkit::palette_lump();
        lump.extend_from_slice(&[0xAB; 768]);
        let palette = Palette::from_lump(&lump).unwrap();
        assert_eq!(palette.rgba(0), [0, 0, 255, 255]);
    }
}
