//! Clip export: encoders and destinations.
//!
//! # Pipeline
//!
//! ```text
//! PcmBuffer[start..end) ──┬─ Wav   ─▶ encode_wav (blocking task) ─┐
//!                         └─ Pcm16 ─▶ EncodeSession (async task) ─┴─▶ ClipSink
//!                                                                  (file / POST)
//! ```
//!
//! [`run_export`] is what the widget runtime spawns for a save request.

pub mod sink;
pub mod stream;
pub mod wav;

use std::sync::Arc;

use thiserror::Error;

use crate::audio::PcmBuffer;
use crate::config::{ExportConfig, ExportFormat};

pub use sink::{extension_for, interpret_response, sink_for, ClipSink, HttpSink, LocalDirSink, SavedClip};
pub use stream::{encode_range, EncodeSession, Pcm16Encoder, StreamEncoder, PCM16_MIME};
pub use wav::{chunk_sizes, encode_wav, ChunkSizes, WAV_FLOAT_MIME};

// ---------------------------------------------------------------------------
// ExportError
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding or saving a clip.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export")]
    EmptyClip,

    #[error("selection of {frames} frames is too large for a WAV header")]
    TooLarge { frames: usize },

    #[error("encoder expected {expected} frames but was fed {written}")]
    LengthMismatch { expected: usize, written: usize },

    #[error("encode session ended before completion")]
    SessionClosed,

    #[error("failed to write clip: {0}")]
    Io(#[from] std::io::Error),

    #[error("no upload URL configured")]
    NoUploadUrl,

    #[error("upload failed: {0}")]
    Request(String),

    #[error("upload timed out")]
    Timeout,

    #[error("server rejected the upload (HTTP {status})")]
    Rejected { status: u16 },

    #[error("server accepted the upload but returned no URL")]
    EmptyUrl,
}

impl From<reqwest::Error> for ExportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ExportError::Timeout
        } else {
            ExportError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// EncodedClip / ExportJob
// ---------------------------------------------------------------------------

/// Encoded bytes plus their container/codec label.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedClip {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub duration_secs: f64,
}

/// One save request: a snapshot of the buffer and the selection.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub pcm: Arc<PcmBuffer>,
    pub start: f64,
    pub end: f64,
    pub config: ExportConfig,
}

/// Encode `job` with the configured format and hand it to the configured
/// destination.
pub async fn run_export(job: ExportJob) -> Result<SavedClip, ExportError> {
    if job.pcm.is_empty() || job.start >= job.end {
        return Err(ExportError::EmptyClip);
    }
    let sink = sink_for(&job.config)?;

    let clip = match job.config.format {
        ExportFormat::Wav => {
            let ExportJob { pcm, start, end, .. } = job.clone();
            tokio::task::spawn_blocking(move || encode_wav(&pcm, start, end))
                .await
                .map_err(|_| ExportError::SessionClosed)??
        }
        ExportFormat::Pcm16 => {
            let frames = job.pcm.sample_at(job.end).saturating_sub(job.pcm.sample_at(job.start));
            let encoder = Pcm16Encoder::new(
                job.pcm.sample_rate,
                job.pcm.channel_count() as u16,
                frames,
            )?;
            encode_range(
                Arc::clone(&job.pcm),
                job.start,
                job.end,
                Box::new(encoder),
                job.config.stream_block_frames,
            )
            .await?
        }
    };
    log::info!(
        "export: encoded {:.3}s as {} ({} bytes)",
        clip.duration_secs,
        clip.mime,
        clip.bytes.len()
    );

    sink.save(&clip).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode_wav;
    use tempfile::tempdir;

    fn job(format: ExportFormat, dir: &std::path::Path) -> ExportJob {
        ExportJob {
            pcm: Arc::new(PcmBuffer {
                channels: vec![vec![0.5; 16_000]],
                sample_rate: 16_000,
            }),
            start: 0.25,
            end: 0.75,
            config: ExportConfig {
                format,
                output_dir: Some(dir.to_path_buf()),
                ..ExportConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn both_formats_cover_the_selection() {
        let dir = tempdir().expect("temp dir");
        for format in [ExportFormat::Wav, ExportFormat::Pcm16] {
            let saved = run_export(job(format, dir.path())).await.expect("export");
            let SavedClip::Local(path) = saved else {
                panic!("expected local save");
            };
            let file = std::fs::File::open(&path).expect("open");
            let audio = decode_wav(std::io::BufReader::new(file)).expect("decode");
            assert_eq!(audio.channels[0].len(), 8_000, "{format:?}");
        }
    }

    #[tokio::test]
    async fn empty_selection_is_refused() {
        let dir = tempdir().expect("temp dir");
        let mut job = job(ExportFormat::Wav, dir.path());
        job.end = job.start;
        assert!(matches!(run_export(job).await, Err(ExportError::EmptyClip)));
    }
}
