//! Digitized sound transcoding to signed 8-bit PCM

use tracing::warn;

use crate::error::{AssetError, Result};

/// Substituted when a lump declares a sample rate of zero.
pub const FALLBACK_SAMPLE_RATE: u32 = 11_025;

/// Fixed header: format marker, sample rate, sample count.
const SOUND_HEADER_SIZE: usize = 8;

/// Mono signed 8-bit PCM decoded from a digitized-sound lump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    /// Always 1; the source format is mono.
    pub channels: u8,
    pub samples: Vec<i8>,
}

/// Decode a digitized-sound lump.
///
/// The source format centers silence at 128; output is rebiased to
/// standard signed PCM centered at 0, which playback depends on for
/// correct loudness and polarity. A sample count that disagrees with the
/// lump's actual length is clamped, never read past.
pub fn decode_sound(lump: &[u8]) -> Result<PcmBuffer> {
    if lump.len() < SOUND_HEADER_SIZE {
        return Err(AssetError::InvalidFormat(format!(
            "sound lump is {} bytes, header needs {SOUND_HEADER_SIZE}",
            lump.len()
        )));
    }

    // 2-byte format marker, checked for presence only.
    let declared_rate = u16::from_le_bytes([lump[2], lump[3]]);
    let declared_count = u32::from_le_bytes([lump[4], lump[5], lump[6], lump[7]]) as usize;

    let sample_rate = if declared_rate == 0 {
        warn!("sound lump declares a zero sample rate, substituting {FALLBACK_SAMPLE_RATE} Hz");
        FALLBACK_SAMPLE_RATE
    } else {
        u32::from(declared_rate)
    };

    let available = lump.len() - SOUND_HEADER_SIZE;
    let count = if declared_count == 0 || declared_count > available {
        warn!("sound lump declares {declared_count} samples but carries {available}, clamping");
        available
    } else {
        declared_count
    };

    let samples = lump[SOUND_HEADER_SIZE..SOUND_HEADER_SIZE + count]
        .iter()
        .map(|&byte| (i16::from(byte) - 128) as i8)
        .collect();

    Ok(PcmBuffer {
        sample_rate,
        channels: 1,
        samples,
    })
}
