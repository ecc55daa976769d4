//! Streaming encode sessions.
//!
//! An [`EncodeSession`] runs a [`StreamEncoder`] on its own tokio task.  The
//! trimmed range is fed in blocks over a channel; every block may yield an
//! output chunk.  Once the feeding side closes, the encoder is flushed and
//! the concatenated chunks are delivered through a oneshot, which is the
//! session's completion signal.
//!
//! ```text
//! encode_range ──block──▶ mpsc ──▶ task: encode_block → chunks
//!              ──close──▶         task: finish → oneshot(bytes)
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::audio::PcmBuffer;

use super::wav::chunk_sizes;
use super::{EncodedClip, ExportError};

/// MIME type of the 16-bit PCM container.
pub const PCM16_MIME: &str = "audio/wav; codecs=1";

/// Blocks buffered between the feeder and the encode task.
const FEED_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// StreamEncoder
// ---------------------------------------------------------------------------

/// Incremental encoder fed with channel-major sample blocks.
pub trait StreamEncoder: Send {
    fn mime_type(&self) -> &'static str;

    /// Encode one block into the next output chunk.
    fn encode_block(&mut self, block: &[Vec<f32>]) -> Result<Vec<u8>, ExportError>;

    /// Flush everything still buffered.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, ExportError>;
}

// ---------------------------------------------------------------------------
// Pcm16Encoder
// ---------------------------------------------------------------------------

const PCM16_HEADER_LEN: usize = 44;
const PCM16_RIFF_OVERHEAD: u32 = 36;

/// 16-bit integer WAV emitted block by block.
///
/// The frame count is fixed up front, so the RIFF header goes out with the
/// first chunk and every block after it is plain little-endian sample data.
pub struct Pcm16Encoder {
    header: Option<Vec<u8>>,
    channels: u16,
    frames: usize,
    written: usize,
}

impl Pcm16Encoder {
    /// Encoder for exactly `frames` sample blocks.
    ///
    /// # Errors
    ///
    /// [`ExportError::TooLarge`] when `frames` cannot be described by a
    /// 32-bit RIFF header.
    pub fn new(sample_rate: u32, channels: u16, frames: usize) -> Result<Self, ExportError> {
        let channels = channels.max(1);
        let block_align = channels * 2;
        let sizes = chunk_sizes(frames, block_align, PCM16_RIFF_OVERHEAD)?;
        let byte_rate = sample_rate
            .checked_mul(block_align as u32)
            .ok_or(ExportError::TooLarge { frames })?;

        let mut header = Vec::with_capacity(PCM16_HEADER_LEN);
        header.extend_from_slice(b"RIFF");
        header.extend_from_slice(&sizes.riff.to_le_bytes());
        header.extend_from_slice(b"WAVE");
        header.extend_from_slice(b"fmt ");
        header.extend_from_slice(&16u32.to_le_bytes());
        header.extend_from_slice(&1u16.to_le_bytes());
        header.extend_from_slice(&channels.to_le_bytes());
        header.extend_from_slice(&sample_rate.to_le_bytes());
        header.extend_from_slice(&byte_rate.to_le_bytes());
        header.extend_from_slice(&block_align.to_le_bytes());
        header.extend_from_slice(&16u16.to_le_bytes());
        header.extend_from_slice(b"data");
        header.extend_from_slice(&sizes.data.to_le_bytes());

        Ok(Self {
            header: Some(header),
            channels,
            frames,
            written: 0,
        })
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

impl StreamEncoder for Pcm16Encoder {
    fn mime_type(&self) -> &'static str {
        PCM16_MIME
    }

    fn encode_block(&mut self, block: &[Vec<f32>]) -> Result<Vec<u8>, ExportError> {
        let frames = block.first().map_or(0, Vec::len);
        if self.written + frames > self.frames {
            return Err(ExportError::LengthMismatch {
                expected: self.frames,
                written: self.written + frames,
            });
        }

        let mut chunk = self.header.take().unwrap_or_default();
        chunk.reserve(frames * self.channels as usize * 2);
        for i in 0..frames {
            for c in 0..self.channels as usize {
                // Missing channels are written as silence.
                let sample = block.get(c).map_or(0.0, |channel| channel[i]);
                chunk.extend_from_slice(&to_i16(sample).to_le_bytes());
            }
        }
        self.written += frames;
        Ok(chunk)
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, ExportError> {
        if self.written != self.frames {
            return Err(ExportError::LengthMismatch {
                expected: self.frames,
                written: self.written,
            });
        }
        // Only an empty clip still holds its header here.
        Ok(self.header.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// EncodeSession
// ---------------------------------------------------------------------------

/// A running encode task.
pub struct EncodeSession {
    feed: mpsc::Sender<Vec<Vec<f32>>>,
    done: oneshot::Receiver<Result<Vec<u8>, ExportError>>,
    mime: &'static str,
}

impl EncodeSession {
    /// Spawn `encoder` on the current tokio runtime.
    pub fn spawn(encoder: Box<dyn StreamEncoder>) -> Self {
        let mime = encoder.mime_type();
        let (feed, rx) = mpsc::channel(FEED_DEPTH);
        let (done_tx, done) = oneshot::channel();
        tokio::spawn(async move {
            let result = drive(encoder, rx).await;
            if done_tx.send(result).is_err() {
                log::debug!("encode: session dropped before completion");
            }
        });
        Self { feed, done, mime }
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime
    }

    /// Feed one channel-major block.
    pub async fn feed(&self, block: Vec<Vec<f32>>) -> Result<(), ExportError> {
        self.feed
            .send(block)
            .await
            .map_err(|_| ExportError::SessionClosed)
    }

    /// Close the feed and wait until the encoder has flushed.
    pub async fn finish(self) -> Result<Vec<u8>, ExportError> {
        drop(self.feed);
        self.done.await.map_err(|_| ExportError::SessionClosed)?
    }
}

async fn drive(
    mut encoder: Box<dyn StreamEncoder>,
    mut rx: mpsc::Receiver<Vec<Vec<f32>>>,
) -> Result<Vec<u8>, ExportError> {
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    while let Some(block) = rx.recv().await {
        let chunk = encoder.encode_block(&block)?;
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
    }
    chunks.push(encoder.finish()?);
    log::debug!("encode: session flushed {} chunk(s)", chunks.len());
    Ok(chunks.concat())
}

/// Stream `[start, end)` seconds of `pcm` through `encoder` in blocks of
/// `block_frames` samples.
pub async fn encode_range(
    pcm: Arc<PcmBuffer>,
    start_secs: f64,
    end_secs: f64,
    encoder: Box<dyn StreamEncoder>,
    block_frames: usize,
) -> Result<EncodedClip, ExportError> {
    let start = pcm.sample_at(start_secs);
    let end = pcm.sample_at(end_secs).max(start);
    let block_frames = block_frames.max(1);

    let session = EncodeSession::spawn(encoder);
    let mime = session.mime_type();
    let mut at = start;
    while at < end {
        let next = (at + block_frames).min(end);
        let block = pcm.channels.iter().map(|c| c[at..next].to_vec()).collect();
        if let Err(e) = session.feed(block).await {
            // The task stopped early; its own error explains why.
            return Err(session.finish().await.err().unwrap_or(e));
        }
        at = next;
    }
    let bytes = session.finish().await?;

    Ok(EncodedClip {
        bytes,
        mime: mime.to_string(),
        duration_secs: (end - start) as f64 / pcm.sample_rate.max(1) as f64,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
