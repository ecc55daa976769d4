//! Byte-exact IEEE-float RIFF/WAVE encoder.
//!
//! # Layout
//!
//! ```text
//! offset  size  field
//!      0     4  "RIFF"
//!      4     4  chunk size = 4 + 48 + 12 + 8 + data_bytes + data_bytes % 2
//!      8     4  "WAVE"
//!     12     4  "fmt "
//!     16     4  18
//!     20     2  format tag = 3 (IEEE float)
//!     22     2  channels
//!     24     4  sample rate
//!     28     4  byte rate   = rate · block align
//!     32     2  block align = channels · 4
//!     34     2  bits per sample = 32
//!     36     2  extension size = 0
//!     38     4  "fact"
//!     42     4  4
//!     46     4  channels · samples
//!     50     4  "data"
//!     54     4  data_bytes
//!     58     …  interleaved f32 LE, one block per sample index
//! ```
//!
//! All integers are little-endian.

use crate::audio::PcmBuffer;

use super::{EncodedClip, ExportError};

/// MIME type of the float WAV container.
pub const WAV_FLOAT_MIME: &str = "audio/wav; codecs=3";

const FORMAT_IEEE_FLOAT: u16 = 3;
const BYTES_PER_SAMPLE: u16 = 4;
/// Size of everything before the sample data.
pub const HEADER_LEN: usize = 58;
/// Bytes the RIFF size adds on top of the data for the float layout.
const FLOAT_RIFF_OVERHEAD: u32 = 4 + 48 + 12 + 8;

/// Sizes written into a RIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSizes {
    pub data: u32,
    pub riff: u32,
}

/// Data and RIFF chunk sizes for `frames` sample blocks of `block_align`
/// bytes, where the RIFF size is `overhead + data + data % 2`.
///
/// # Errors
///
/// [`ExportError::TooLarge`] when either size does not fit in 32 bits.
///
/// ```
/// use auo::export::wav::chunk_sizes;
///
/// let sizes = chunk_sizes(96_000, 4, 72).unwrap();
/// assert_eq!((sizes.data, sizes.riff), (384_000, 384_072));
/// assert!(chunk_sizes(134_217_728, 32, 72).is_err());
/// ```
pub fn chunk_sizes(frames: usize, block_align: u16, overhead: u32) -> Result<ChunkSizes, ExportError> {
    let too_large = || ExportError::TooLarge { frames };
    let data = u32::try_from(frames)
        .ok()
        .and_then(|f| f.checked_mul(block_align as u32))
        .ok_or_else(too_large)?;
    let riff = overhead
        .checked_add(data)
        .and_then(|size| size.checked_add(data % 2))
        .ok_or_else(too_large)?;
    Ok(ChunkSizes { data, riff })
}

/// Encode `[start, end)` seconds of `pcm` as a float WAV file.
///
/// Bounds are converted to samples with `round(t · rate)` and clamped to
/// the buffer; an inverted range yields a header with no data.
///
/// # Errors
///
/// [`ExportError::TooLarge`] when the selection exceeds what the 32-bit
/// RIFF sizes can describe.
///
/// ```
/// use auo::audio::PcmBuffer;
/// use auo::export::encode_wav;
///
/// let pcm = PcmBuffer { channels: vec![vec![0.0; 96_000]], sample_rate: 48_000 };
/// let clip = encode_wav(&pcm, 0.0, 2.0).unwrap();
/// assert_eq!(&clip.bytes[4..8], &384_072u32.to_le_bytes());
/// ```
pub fn encode_wav(pcm: &PcmBuffer, start_secs: f64, end_secs: f64) -> Result<EncodedClip, ExportError> {
    let start = pcm.sample_at(start_secs);
    let end = pcm.sample_at(end_secs).max(start);
    let samples = end - start;
    let channels = pcm.channel_count().max(1) as u16;

    let block_align = channels * BYTES_PER_SAMPLE;
    let ChunkSizes { data: data_bytes, riff: riff_size } =
        chunk_sizes(samples, block_align, FLOAT_RIFF_OVERHEAD)?;
    let byte_rate = pcm
        .sample_rate
        .checked_mul(block_align as u32)
        .ok_or(ExportError::TooLarge { frames: samples })?;

    let mut out = Vec::with_capacity(HEADER_LEN + data_bytes as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&18u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_IEEE_FLOAT.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&pcm.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&(BYTES_PER_SAMPLE * 8).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    out.extend_from_slice(b"fact");
    out.extend_from_slice(&4u32.to_le_bytes());
    // Bounded by `data_bytes / 4`, which fits.
    out.extend_from_slice(&(channels as u32 * samples as u32).to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_bytes.to_le_bytes());
    for i in start..end {
        for channel in &pcm.channels {
            out.extend_from_slice(&channel[i].to_le_bytes());
        }
    }

    log::debug!(
        "wav: encoded {samples} samples × {channels} ch ({} bytes)",
        out.len()
    );
    Ok(EncodedClip {
        bytes: out,
        mime: WAV_FLOAT_MIME.to_string(),
        duration_secs: samples as f64 / pcm.sample_rate.max(1) as f64,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
