//! Audio plumbing: capture → sample store → materialised buffer → output.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → Frame → SampleStore ──▶ MaterializedBuffer
//!                                  │                        │
//!                                  └─▶ monitor echo         └─▶ AudioOutput / export
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use auo::audio::{CpalInput, SampleStore};
//!
//! let input = CpalInput::new(None).unwrap();
//! let format = input.format();
//! let mut store = SampleStore::new();
//! store.begin(format.sample_rate, format.channels as usize).unwrap();
//! let _handle = input.start(|frame| println!("{} samples", frame.len())).unwrap();
//! ```

pub mod buffer;
pub mod capture;
pub mod load;
pub mod materialize;
pub mod output;
pub mod resample;
pub mod store;

pub use buffer::RingBuffer;
pub use capture::{CaptureError, CpalInput, StreamFormat, StreamHandle};
pub use load::{decode_wav, load_file, load_first, LoadError, LoadedAudio};
pub use materialize::{MaterializedBuffer, PcmBuffer};
pub use output::{AudioOutput, CpalOutput, EndNotifier, OutputError, PlaybackId};
pub use resample::{deinterleave, interleave, remap_channels, resample};
pub use store::{Frame, ProcessedCursor, SampleStore, StoreError};
