//! Microphone capture via `cpal`.
//!
//! [`CpalInput`] wraps the cpal host/device/stream lifecycle.  Call
//! [`CpalInput::start`] with a sink closure; every hardware block is split
//! into a channel-major [`Frame`] and handed to the sink on the audio
//! thread.  The returned [`StreamHandle`] is a RAII guard: dropping it stops
//! the underlying cpal stream, so no frame is delivered after the drop.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::Frame;

// ---------------------------------------------------------------------------
// StreamFormat
// ---------------------------------------------------------------------------

/// Format of the frames a capture stream delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Sample rate in Hz (device-determined, e.g. 44 100 or 48 000).
    pub sample_rate: u32,
    /// Channels per frame (≥ 1).
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal input stream alive.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up the audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("input device delivers {0:?} samples; only f32 is supported")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// CpalInput
// ---------------------------------------------------------------------------

/// Microphone capture device wrapper built on top of `cpal`.
///
/// ```rust,no_run
/// use auo::audio::CpalInput;
///
/// let input = CpalInput::new(None).unwrap();
/// let _handle = input
///     .start(|frame| println!("{} samples", frame.len()))
///     .unwrap();
/// // `_handle` keeps the stream alive; drop it to stop capturing.
/// ```
pub struct CpalInput {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: StreamFormat,
}

impl CpalInput {
    /// Open the system default input device with its preferred stream
    /// configuration.
    ///
    /// `block_size` pins the device block length in frames; `None` lets
    /// the device choose.
    ///
    /// # Errors
    ///
    /// [`CaptureError::NoDevice`] when no input device is available (e.g.
    /// no microphone or no permission), [`CaptureError::DefaultConfig`] when
    /// the device cannot report a configuration, and
    /// [`CaptureError::UnsupportedSampleFormat`] for non-float devices.
    pub fn new(block_size: Option<u32>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(CaptureError::UnsupportedSampleFormat(
                supported.sample_format(),
            ));
        }

        let format = StreamFormat {
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
        };
        let mut config: cpal::StreamConfig = supported.into();
        if let Some(frames) = block_size {
            config.buffer_size = cpal::BufferSize::Fixed(frames);
        }

        Ok(Self {
            device,
            config,
            format,
        })
    }

    /// Start capturing and hand every block to `sink` as a [`Frame`].
    ///
    /// `sink` runs on cpal's audio thread and must not block.
    ///
    /// # Errors
    ///
    /// [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`] if the
    /// platform rejects the stream configuration.
    pub fn start<F>(&self, mut sink: F) -> Result<StreamHandle, CaptureError>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        let channels = self.format.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sink(Frame::from_interleaved(data, channels));
            },
            |err: cpal::StreamError| {
                log::error!("capture: cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        log::info!(
            "capture: started ({} Hz, {} ch)",
            self.format.sample_rate,
            self.format.channels
        );
        Ok(StreamHandle { _stream: stream })
    }

    /// Format of the frames this input delivers.
    pub fn format(&self) -> StreamFormat {
        self.format
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
