//! Recording / playback pipeline around one [`Session`].
//!
//! # Architecture
//!
//! ```text
//! Frame ──▶ RecordingPipeline ──append──▶ Session.store
//!                                            │
//!                 PlaybackEngine ◀──materialize┘──▶ AudioOutput
//! ```
//!
//! [`Mode`] is shared by both halves: the recorder moves it through
//! `Recording → FinalizingRecording → Idle`, the engine through
//! `Idle → Playing → Idle`.
//!
//! # Quick start
//!
//! ```rust
//! use auo::audio::{Frame, StreamFormat};
//! use auo::pipeline::{Mode, RecordingPipeline, Session};
//! use auo::render::View;
//!
//! let mut session = Session::new(View::new(800.0, 100.0));
//! let mut recorder = RecordingPipeline::new();
//! let format = StreamFormat { sample_rate: 48_000, channels: 1 };
//!
//! recorder.start(&mut session, format).unwrap();
//! recorder.deliver(&mut session, Frame::mono(vec![0.0; 480]));
//! recorder.stop(&mut session);
//! // one event-loop turn later:
//! recorder.finalize(&mut session);
//!
//! assert_eq!(session.mode, Mode::Idle);
//! assert_eq!(session.store.total_samples(), 480);
//! ```

pub mod playback;
pub mod recorder;
pub mod session;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use playback::{PlayOutcome, PlaybackEngine, PlaybackError};
pub use recorder::{FrameOutcome, RecordingPipeline};
pub use session::{Session, SyncFlags};
pub use state::{Controls, Mode};
