//! Audio output boundary: scheduled playback, end notification, clock.
//!
//! [`AudioOutput`] is the seam the playback engine drives.  It can
//!
//! * play an arbitrary sample range of a shared [`PcmBuffer`],
//! * report the natural end of that range exactly once through the
//!   notifier it was built with,
//! * expose a monotonic clock in seconds, and
//! * echo captured frames for pass-through monitoring.
//!
//! [`CpalOutput`] is the device-backed implementation.  Each playback gets
//! its own cpal stream which is dropped by [`AudioOutput::halt`], so a
//! halted playback never fires another callback.

use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::resample::{interleave, remap_channels, resample};
use super::{Frame, PcmBuffer, RingBuffer};

// ---------------------------------------------------------------------------
// PlaybackId
// ---------------------------------------------------------------------------

/// Identifies one scheduled playback on an [`AudioOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub u64);

/// Callback used by an output to report that playback `id` reached the end
/// of its range.  Invoked from the device thread.
pub type EndNotifier = Arc<dyn Fn(PlaybackId) + Send + Sync>;

// ---------------------------------------------------------------------------
// OutputError
// ---------------------------------------------------------------------------

/// Errors that can occur while opening an output stream.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to query supported output configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("empty playback range {start}..{end}")]
    EmptyRange { start: usize, end: usize },
}

// ---------------------------------------------------------------------------
// AudioOutput
// ---------------------------------------------------------------------------

/// Playback capability required by the playback engine.
pub trait AudioOutput {
    /// Start playing `buffer[range]` (sample offsets, all channels).
    fn play(&mut self, buffer: Arc<PcmBuffer>, range: Range<usize>)
        -> Result<PlaybackId, OutputError>;

    /// Stop playback `id` and release its device handle synchronously.
    /// Unknown or already finished ids are ignored.
    fn halt(&mut self, id: PlaybackId);

    /// Monotonic output clock in seconds.
    fn now(&self) -> f64;

    /// Echo one captured frame unmodified.  Outputs without a monitor path
    /// discard it.
    fn monitor(&mut self, _frame: &Frame) {}

    /// Release every device handle (playback and monitor).
    fn release(&mut self) {}
}

// ---------------------------------------------------------------------------
// CpalOutput
// ---------------------------------------------------------------------------

/// Monitor latency bound: half a second of interleaved stereo at 48 kHz.
const MONITOR_QUEUE: usize = 48_000;

struct MonitorStream {
    _stream: cpal::Stream,
    queue: Arc<Mutex<RingBuffer<f32>>>,
    channels: usize,
}

/// [`AudioOutput`] on the default cpal output device.
pub struct CpalOutput {
    device: cpal::Device,
    notify: EndNotifier,
    epoch: Instant,
    next_id: u64,
    active: Option<(PlaybackId, cpal::Stream)>,
    monitor: Option<MonitorStream>,
    monitor_failed: bool,
}

impl CpalOutput {
    /// Open the default output device.  `notify` receives end-of-range
    /// reports for every playback started on this output.
    ///
    /// # Errors
    ///
    /// [`OutputError::NoDevice`] when the host has no output device.
    pub fn new(notify: EndNotifier) -> Result<Self, OutputError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(OutputError::NoDevice)?;

        Ok(Self {
            device,
            notify,
            epoch: Instant::now(),
            next_id: 0,
            active: None,
            monitor: None,
            monitor_failed: false,
        })
    }

    /// Stream config for a clip at `sample_rate`: the device's default
    /// channel count, at `sample_rate` when the device supports it and at its
    /// default rate otherwise.
    fn stream_config(&self, sample_rate: u32) -> Result<cpal::StreamConfig, OutputError> {
        let default = self.device.default_output_config()?;
        let channels = default.channels();
        let supports_rate = self.device.supported_output_configs()?.any(|range| {
            range.channels() == channels
                && range.sample_format() == cpal::SampleFormat::F32
                && range.min_sample_rate().0 <= sample_rate
                && sample_rate <= range.max_sample_rate().0
        });
        let rate = if supports_rate {
            sample_rate
        } else {
            default.sample_rate().0
        };

        Ok(cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(rate),
            buffer_size: cpal::BufferSize::Default,
        })
    }

    fn open_monitor(&mut self) -> Result<MonitorStream, OutputError> {
        let default = self.device.default_output_config()?;
        let config: cpal::StreamConfig = default.into();
        let queue = Arc::new(Mutex::new(RingBuffer::new(MONITOR_QUEUE)));
        let reader = Arc::clone(&queue);

        let stream = self.device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let written = match reader.lock() {
                    Ok(mut q) => q.pop_into(data),
                    Err(_) => 0,
                };
                data[written..].fill(0.0);
            },
            |err: cpal::StreamError| log::error!("monitor: cpal stream error: {err}"),
            None,
        )?;
        stream.play()?;

        Ok(MonitorStream {
            _stream: stream,
            queue,
            channels: config.channels as usize,
        })
    }

    /// Convert `buffer[range]` to the device's interleaved layout and rate.
    fn prepare(buffer: &PcmBuffer, range: Range<usize>, config: &cpal::StreamConfig) -> Vec<f32> {
        let clip: Vec<Vec<f32>> = buffer
            .channels
            .iter()
            .map(|c| c[range.clone()].to_vec())
            .collect();
        let mapped = remap_channels(&clip, config.channels as usize);
        let rated: Vec<Vec<f32>> = mapped
            .iter()
            .map(|c| resample(c, buffer.sample_rate, config.sample_rate.0))
            .collect();
        interleave(&rated)
    }
}

impl AudioOutput for CpalOutput {
    fn play(
        &mut self,
        buffer: Arc<PcmBuffer>,
        range: Range<usize>,
    ) -> Result<PlaybackId, OutputError> {
        if range.start >= range.end || range.end > buffer.len() {
            return Err(OutputError::EmptyRange {
                start: range.start,
                end: range.end,
            });
        }

        if let Some((previous, _)) = self.active.take() {
            log::debug!("output: replacing playback {previous:?}");
        }

        let config = self.stream_config(buffer.sample_rate)?;
        let samples = Self::prepare(&buffer, range, &config);

        self.next_id += 1;
        let id = PlaybackId(self.next_id);
        let notify = Arc::clone(&self.notify);
        let mut finished = false;
        let mut cursor = 0usize;

        let stream = self.device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let n = data.len().min(samples.len() - cursor);
                data[..n].copy_from_slice(&samples[cursor..cursor + n]);
                data[n..].fill(0.0);
                cursor += n;
                if cursor == samples.len() && !finished {
                    finished = true;
                    notify(id);
                }
            },
            |err: cpal::StreamError| log::error!("output: cpal stream error: {err}"),
            None,
        )?;
        stream.play()?;

        log::debug!(
            "output: playback {id:?} started ({} Hz, {} ch)",
            config.sample_rate.0,
            config.channels
        );
        self.active = Some((id, stream));
        Ok(id)
    }

    fn halt(&mut self, id: PlaybackId) {
        if self.active.as_ref().is_some_and(|(active, _)| *active == id) {
            self.active = None;
            log::debug!("output: playback {id:?} halted");
        }
    }

    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn monitor(&mut self, frame: &Frame) {
        if self.monitor.is_none() && !self.monitor_failed {
            match self.open_monitor() {
                Ok(stream) => self.monitor = Some(stream),
                Err(e) => {
                    log::warn!("monitor: output unavailable, pass-through disabled: {e}");
                    self.monitor_failed = true;
                }
            }
        }
        let Some(monitor) = &self.monitor else {
            return;
        };

        let samples = interleave(&remap_channels(frame.channels(), monitor.channels));
        if let Ok(mut q) = monitor.queue.lock() {
            q.push_slice(&samples);
        }
    }

    fn release(&mut self) {
        self.active = None;
        self.monitor = None;
        log::debug!("output: released all streams");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_interleaves_and_duplicates_mono() {
        let buffer = PcmBuffer {
            channels: vec![vec![0.1, 0.2, 0.3, 0.4]],
            sample_rate: 48_000,
        };
        let config = cpal::StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(48_000),
            buffer_size: cpal::BufferSize::Default,
        };
        let out = CpalOutput::prepare(&buffer, 1..3, &config);
        assert_eq!(out, vec![0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn prepare_resamples_to_device_rate() {
        let buffer = PcmBuffer {
            channels: vec![vec![0.5; 480]],
            sample_rate: 48_000,
        };
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(16_000),
            buffer_size: cpal::BufferSize::Default,
        };
        assert_eq!(CpalOutput::prepare(&buffer, 0..480, &config).len(), 160);
    }

    #[test]
    fn end_notifier_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EndNotifier>();
    }
}
