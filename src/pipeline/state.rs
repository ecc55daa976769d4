//! Widget mode state machine and the button snapshot derived from it.
//!
//! [`Mode`] is the single source of truth for what the widget is doing.
//! [`Controls`] is what the shell shows: which buttons are enabled in the
//! current mode.

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What the widget is currently doing.
///
/// ```text
/// Idle ──record──▶ Recording ──stop──▶ FinalizingRecording ──(next turn)──▶ Idle (editor)
/// Idle ──play────▶ Playing   ──stop / end of clip──▶ Idle
/// Idle ──ticker drag──▶ Scrubbing ──drop──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Nothing running.  With a clip present this is the editor state.
    #[default]
    Idle,

    /// Frames are being appended to the sample store.
    Recording,

    /// Stop was requested; frames already in flight still land before the
    /// deferred finalize step seals the store.
    FinalizingRecording,

    /// A trimmed range is playing.
    Playing,

    /// The user is dragging the ticker.
    Scrubbing,
}

impl Mode {
    /// Returns `true` while captured frames must be appended.
    ///
    /// ```
    /// use auo::pipeline::Mode;
    ///
    /// assert!(Mode::Recording.accepts_frames());
    /// assert!(Mode::FinalizingRecording.accepts_frames());
    /// assert!(!Mode::Idle.accepts_frames());
    /// assert!(!Mode::Playing.accepts_frames());
    /// ```
    pub fn accepts_frames(&self) -> bool {
        matches!(self, Mode::Recording | Mode::FinalizingRecording)
    }

    /// A short human-readable label for the shell's status line.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Recording => "Recording",
            Mode::FinalizingRecording => "Finalizing",
            Mode::Playing => "Playing",
            Mode::Scrubbing => "Scrubbing",
        }
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Enabled state of the widget's buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub record: bool,
    pub play: bool,
    pub stop: bool,
    pub save: bool,
    pub load: bool,
}

impl Controls {
    /// Button states for `mode`.
    ///
    /// * `has_clip`: the store holds a finalized recording or loaded file.
    /// * `capture_available`: an input device was acquired.
    /// * `saving`: an export is in flight.
    pub fn for_mode(mode: Mode, has_clip: bool, capture_available: bool, saving: bool) -> Self {
        match mode {
            Mode::Recording => Self {
                stop: true,
                ..Self::default()
            },
            Mode::FinalizingRecording => Self::default(),
            Mode::Playing => Self {
                stop: true,
                ..Self::default()
            },
            Mode::Idle | Mode::Scrubbing => Self {
                record: capture_available && !saving,
                play: has_clip,
                stop: false,
                save: has_clip && !saving,
                load: !saving,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Mode --------------------------------------------------------------

    #[test]
    fn default_mode_is_idle() {
        assert_eq!(Mode::default(), Mode::Idle);
    }

    #[test]
    fn finalizing_still_accepts_frames() {
        assert!(Mode::FinalizingRecording.accepts_frames());
        assert!(!Mode::Scrubbing.accepts_frames());
    }

    #[test]
    fn labels() {
        assert_eq!(Mode::Idle.label(), "Idle");
        assert_eq!(Mode::Recording.label(), "Recording");
        assert_eq!(Mode::FinalizingRecording.label(), "Finalizing");
        assert_eq!(Mode::Playing.label(), "Playing");
        assert_eq!(Mode::Scrubbing.label(), "Scrubbing");
    }

    // ---- Controls ----------------------------------------------------------

    #[test]
    fn recording_enables_only_stop() {
        let c = Controls::for_mode(Mode::Recording, true, true, false);
        assert_eq!(
            c,
            Controls {
                stop: true,
                ..Controls::default()
            }
        );
    }

    #[test]
    fn editor_enables_play_and_save() {
        let c = Controls::for_mode(Mode::Idle, true, true, false);
        assert!(c.record && c.play && c.save && c.load);
        assert!(!c.stop);
    }

    #[test]
    fn no_device_disables_record() {
        let c = Controls::for_mode(Mode::Idle, false, false, false);
        assert!(!c.record);
        assert!(!c.play);
        assert!(c.load);
    }

    #[test]
    fn saving_disables_save_and_load() {
        let c = Controls::for_mode(Mode::Idle, true, true, true);
        assert!(!c.save && !c.load && !c.record);
        assert!(c.play);
    }
}
