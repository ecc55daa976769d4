//! Per-widget session: the recording, its trim bounds and the view onto it.
//!
//! A [`Session`] is constructed once per widget and reset on every new
//! recording or load.  Components borrow it for the duration of one event;
//! nothing else holds a reference to the store.
//!
//! Trim bounds are seconds cut from the head (`trim_start`) and the tail
//! (`trim_end`).  Every setter clamps so that
//! `0 ≤ trim_start`, `0 ≤ trim_end` and `trim_start + trim_end ≤ elapsed`.

use crate::audio::{LoadedAudio, MaterializedBuffer, SampleStore, StoreError};
use crate::render::{Markers, View};

use super::Mode;

/// Auto-follow flags.  While a flag is off, the render loop leaves the
/// corresponding marker where the user's drag put it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncFlags {
    pub ticker: bool,
    pub trim: bool,
}

impl Default for SyncFlags {
    fn default() -> Self {
        Self {
            ticker: true,
            trim: true,
        }
    }
}

/// Typed state of one widget instance.
#[derive(Debug)]
pub struct Session {
    pub store: SampleStore,
    pub materialized: MaterializedBuffer,
    pub mode: Mode,
    pub view: View,
    pub sync: SyncFlags,
    trim_start: f64,
    trim_end: f64,
}

impl Session {
    pub fn new(view: View) -> Self {
        Self {
            store: SampleStore::new(),
            materialized: MaterializedBuffer::new(),
            mode: Mode::Idle,
            view,
            sync: SyncFlags::default(),
            trim_start: 0.0,
            trim_end: 0.0,
        }
    }

    /// Recorded (or loaded) duration in seconds.
    pub fn elapsed_time(&self) -> f64 {
        self.store.elapsed_secs()
    }

    pub fn sample_rate(&self) -> u32 {
        self.store.sample_rate()
    }

    pub fn channel_count(&self) -> usize {
        self.store.channel_count()
    }

    /// A finalized recording or loaded file is available.
    pub fn has_clip(&self) -> bool {
        !self.store.is_empty() && !self.store.is_open()
    }

    // ---- trim ------------------------------------------------------------

    pub fn trim_start(&self) -> f64 {
        self.trim_start
    }

    pub fn trim_end(&self) -> f64 {
        self.trim_end
    }

    /// Set the head trim, clamped to `[0, elapsed − trim_end]`.
    pub fn set_trim_start(&mut self, secs: f64) -> f64 {
        let max = (self.elapsed_time() - self.trim_end).max(0.0);
        self.trim_start = clamp_secs(secs, max);
        self.trim_start
    }

    /// Set the tail trim, clamped to `[0, elapsed − trim_start]`.
    pub fn set_trim_end(&mut self, secs: f64) -> f64 {
        let max = (self.elapsed_time() - self.trim_start).max(0.0);
        self.trim_end = clamp_secs(secs, max);
        self.trim_end
    }

    /// Selected range `[trim_start, elapsed − trim_end)` in seconds.
    ///
    /// ```
    /// use auo::audio::Frame;
    /// use auo::pipeline::Session;
    /// use auo::render::View;
    ///
    /// let mut session = Session::new(View::new(800.0, 100.0));
    /// session.store.begin(1_000, 1).unwrap();
    /// session.store.append(Frame::mono(vec![0.0; 2_000])).unwrap();
    /// session.set_trim_start(0.5);
    /// session.set_trim_end(0.25);
    /// assert_eq!(session.selection(), (0.5, 1.75));
    /// ```
    pub fn selection(&self) -> (f64, f64) {
        (self.trim_start, self.elapsed_time() - self.trim_end)
    }

    /// Clamp a playback position into the selection for display.
    pub fn clamp_position(&self, secs: f64) -> f64 {
        let (start, end) = self.selection();
        if end <= start {
            return start;
        }
        secs.clamp(start, end)
    }

    /// Overlay positions for the renderer.
    pub fn markers(&self, ticker: Option<f64>) -> Markers {
        Markers {
            ticker: ticker.map(|t| self.clamp_position(t)),
            trim_start: self.trim_start,
            trim_end: self.trim_end,
        }
    }

    // ---- lifecycle -------------------------------------------------------

    /// Fresh state for a new recording at the device's format.
    pub fn reset_for_recording(&mut self, sample_rate: u32, channels: usize) -> Result<(), StoreError> {
        self.store.begin(sample_rate, channels)?;
        self.reset_editor();
        Ok(())
    }

    /// Replace the store with a decoded file, as if it had just been
    /// recorded.
    pub fn load(&mut self, audio: LoadedAudio) -> Result<(), StoreError> {
        self.store.replace(audio.sample_rate, audio.channels)?;
        self.reset_editor();
        self.materialize();
        Ok(())
    }

    /// Bring the materialized buffer up to date.  Returns `true` when
    /// anything was copied.
    pub fn materialize(&mut self) -> bool {
        self.materialized.ensure(&self.store)
    }

    fn reset_editor(&mut self) {
        self.trim_start = 0.0;
        self.trim_end = 0.0;
        self.sync = SyncFlags::default();
        let canvas = self.view.geometry(0).canvas_width();
        self.view.set_scroll(0.0, canvas);
    }
}

fn clamp_secs(secs: f64, max: f64) -> f64 {
    if secs.is_nan() {
        return 0.0;
    }
    secs.clamp(0.0, max)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
