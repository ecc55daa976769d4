//! Message types flowing into and out of the [`Widget`](super::Widget).
//!
//! * [`Event`]  : everything that can happen: device callbacks, user input,
//!   scheduler ticks and completions of spawned work.
//! * [`Command`]: work the widget asks the runtime to do on its behalf.
//! * [`Notice`] : what the shell shows the user.

use std::path::PathBuf;

use crate::audio::{Frame, LoadError, LoadedAudio, PlaybackId, StreamFormat};
use crate::export::{ExportError, ExportJob, SavedClip};
use crate::interact::DragSubject;
use crate::pipeline::{Controls, Mode};
use crate::render::WaveformFrame;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Inputs to the widget state machine.
#[derive(Debug)]
pub enum Event {
    // ---- devices ----
    /// The capture stream is running with this format.
    InputReady(StreamFormat),
    /// No input device could be opened; recording stays disabled.
    InputUnavailable(String),
    /// One captured block.
    Frame(Frame),
    /// The output finished playing a range.
    PlaybackEnded(PlaybackId),

    // ---- buttons ----
    Record,
    Stop,
    Play,
    Save,
    Load(Vec<PathBuf>),

    // ---- editor ----
    /// Set trim bounds in seconds; `None` leaves a bound unchanged.
    SetTrim {
        start: Option<f64>,
        end: Option<f64>,
    },
    ZoomIn,
    ZoomOut,
    Resize {
        width: f64,
        height: f64,
    },
    DragStart {
        subject: DragSubject,
        x: f64,
    },
    DragMove {
        x: f64,
    },
    Drop,

    // ---- scheduling ----
    /// Deferred finalize after a stop while recording.
    FinalizeRecording,
    /// Render scheduler tick.
    Tick,
    /// The surface finished presenting the last frame.
    DrawComplete,
    ExportFinished(Result<SavedClip, ExportError>),
    Loaded(Result<LoadedAudio, LoadError>),

    /// Release every device and scheduler and end the loop.
    Suspend,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Side effects requested by the widget.
#[derive(Debug)]
pub enum Command {
    /// Re-enqueue behind everything already queued.
    Defer(Event),
    /// Paint a frame; answer with [`Event::DrawComplete`].
    Present(WaveformFrame),
    /// Encode and save; answer with [`Event::ExportFinished`].
    Export(ExportJob),
    /// Decode the first file; answer with [`Event::Loaded`].
    Load(Vec<PathBuf>),
    Notify(Notice),
    Shutdown,
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// User-visible updates for the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Mode(Mode),
    Controls(Controls),
    /// A finalized recording or loaded file is ready for editing.
    ClipReady { duration_secs: f64 },
    Saved(SavedClip),
    Error(String),
}
