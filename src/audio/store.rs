//! Append-only accumulation of captured audio frames.
//!
//! [`SampleStore`] keeps every [`Frame`] of the current recording (or loaded
//! file) in arrival order.  Aggregates that the renderer and the playback
//! engine ask for on every tick, total sample count and elapsed time, are
//! maintained by a [`ProcessedCursor`] that advances once per append, so no
//! query ever walks frames that were already counted.
//!
//! # Lifecycle
//!
//! ```text
//! begin(rate, channels) ──▶ open ──append()*──▶ seal() ──▶ sealed
//!        ▲                                                   │
//!        └──────────────────── reset() / replace() ◀─────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use auo::audio::{Frame, SampleStore};
//!
//! let mut store = SampleStore::new();
//! store.begin(48_000, 1).unwrap();
//! store.append(Frame::mono(vec![0.0; 4_800])).unwrap();
//! store.append(Frame::mono(vec![0.0; 4_800])).unwrap();
//! store.seal();
//!
//! assert_eq!(store.total_samples(), 9_600);
//! assert!((store.elapsed_secs() - 0.2).abs() < 1e-12);
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One device-delivered block of audio, stored channel-major.
///
/// Every channel holds the same number of samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    channels: Vec<Vec<f32>>,
}

impl Frame {
    /// Build a frame from per-channel sample arrays.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyFrame`] when `channels` is empty and
    /// [`StoreError::RaggedFrame`] when the channels differ in length.
    pub fn new(channels: Vec<Vec<f32>>) -> Result<Self, StoreError> {
        let first = channels.first().ok_or(StoreError::EmptyFrame)?.len();
        if let Some(bad) = channels.iter().find(|c| c.len() != first) {
            return Err(StoreError::RaggedFrame {
                expected: first,
                got: bad.len(),
            });
        }
        Ok(Self { channels })
    }

    /// Single-channel frame.
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            channels: vec![samples],
        }
    }

    /// Split interleaved device samples into a channel-major frame.
    ///
    /// Trailing samples that do not complete a multi-channel group are
    /// dropped.  `channels == 0` is treated as mono.
    pub fn from_interleaved(samples: &[f32], channels: u16) -> Self {
        Self {
            channels: super::resample::deinterleave(samples, channels.max(1)),
        }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Returns `true` when the frame carries no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of channels (always ≥ 1).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples of channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= channel_count()`.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// All channels, channel-major.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Reasons a store operation was rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("frame has no channels")]
    EmptyFrame,

    #[error("frame channels differ in length: expected {expected}, got {got}")]
    RaggedFrame { expected: usize, got: usize },

    #[error("frame has {got} channels but the recording has {expected}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("store is sealed; begin a new recording first")]
    Sealed,

    #[error("store cannot be reset while a recording is open")]
    Recording,

    #[error("invalid stream format: {sample_rate} Hz, {channels} channels")]
    InvalidFormat { sample_rate: u32, channels: usize },
}

// ---------------------------------------------------------------------------
// ProcessedCursor
// ---------------------------------------------------------------------------

/// Running aggregate over the frames appended so far.
///
/// `frames` always equals the number of frames in the store; `samples` is
/// the sum of their lengths.  Both only ever move forward until a reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessedCursor {
    pub frames: usize,
    pub samples: usize,
}

// ---------------------------------------------------------------------------
// SampleStore
// ---------------------------------------------------------------------------

/// Append-only frame store for one recording or loaded clip.
#[derive(Debug, Default)]
pub struct SampleStore {
    frames: Vec<Frame>,
    /// Start offset (in samples) of each frame, parallel to `frames`.
    offsets: Vec<usize>,
    cursor: ProcessedCursor,
    sample_rate: u32,
    channel_count: usize,
    open: bool,
    dirty: bool,
    /// Bumped on every reset so derived buffers can detect a new recording.
    generation: u64,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the store and open it for a new recording.
    ///
    /// # Errors
    ///
    /// [`StoreError::Recording`] if a recording is already open and
    /// [`StoreError::InvalidFormat`] for a zero rate or channel count.
    pub fn begin(&mut self, sample_rate: u32, channels: usize) -> Result<(), StoreError> {
        if sample_rate == 0 || channels == 0 {
            return Err(StoreError::InvalidFormat {
                sample_rate,
                channels,
            });
        }
        self.reset()?;
        self.sample_rate = sample_rate;
        self.channel_count = channels;
        self.open = true;
        Ok(())
    }

    /// Append one frame.  O(1) amortised.
    ///
    /// # Errors
    ///
    /// [`StoreError::Sealed`] when no recording is open and
    /// [`StoreError::ChannelMismatch`] when the frame's channel count differs
    /// from the recording's.
    pub fn append(&mut self, frame: Frame) -> Result<(), StoreError> {
        if !self.open {
            return Err(StoreError::Sealed);
        }
        if frame.channel_count() != self.channel_count {
            return Err(StoreError::ChannelMismatch {
                expected: self.channel_count,
                got: frame.channel_count(),
            });
        }

        self.offsets.push(self.cursor.samples);
        self.cursor.frames += 1;
        self.cursor.samples += frame.len();
        self.frames.push(frame);
        self.dirty = true;
        Ok(())
    }

    /// Close the store; it stays immutable until the next reset.
    pub fn seal(&mut self) {
        self.open = false;
    }

    /// Clear frames and counters.
    ///
    /// # Errors
    ///
    /// [`StoreError::Recording`] while a recording is open.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        if self.open {
            return Err(StoreError::Recording);
        }
        self.frames.clear();
        self.offsets.clear();
        self.cursor = ProcessedCursor::default();
        self.generation += 1;
        self.dirty = true;
        Ok(())
    }

    /// Replace the whole store with decoded file contents, sealed, as if it
    /// had just been recorded.
    pub fn replace(&mut self, sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<(), StoreError> {
        let frame = Frame::new(channels)?;
        self.begin(sample_rate, frame.channel_count())?;
        let appended = self.append(frame);
        self.seal();
        appended
    }

    /// Total samples per channel, from the running cursor.
    pub fn total_samples(&self) -> usize {
        self.cursor.samples
    }

    /// Recorded duration in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.cursor.samples as f64 / self.sample_rate as f64
    }

    /// Current aggregate cursor.
    pub fn cursor(&self) -> ProcessedCursor {
        self.cursor
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` while a recording is open for appends.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.samples == 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Frames starting at index `from`, in arrival order.
    pub fn frames_from(&self, from: usize) -> &[Frame] {
        self.frames.get(from..).unwrap_or(&[])
    }

    /// Sample `index` of `channel`, or `None` when out of range.
    ///
    /// Locates the owning frame by binary search over the frame offsets.
    pub fn sample(&self, channel: usize, index: usize) -> Option<f32> {
        if index >= self.cursor.samples || channel >= self.channel_count {
            return None;
        }
        let frame_idx = self.offsets.partition_point(|&start| start <= index) - 1;
        let within = index - self.offsets[frame_idx];
        self.frames[frame_idx].channel(channel).get(within).copied()
    }

    /// Report and clear the "data changed since last draw" flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
