//! Recording pipeline: frame delivery → sample store, with deferred finalize.
//!
//! ```text
//! Idle ──start──▶ Recording ──stop──▶ FinalizingRecording ──finalize──▶ Idle (editor)
//! ```
//!
//! `stop` does not seal the store.  It only flags a finalize as pending; the
//! caller schedules [`RecordingPipeline::finalize`] one event-loop turn
//! later so a frame that was already in flight when stop arrived is still
//! appended.  Frames delivered after finalize are passed through only.

use crate::audio::{Frame, StoreError, StreamFormat};

use super::{Mode, Session};

/// What happened to one delivered frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Appended to the store.
    Appended,
    /// Not recording; the frame is only monitored.
    PassedThrough,
    /// The store refused the frame.
    Rejected(StoreError),
}

/// Drives the Recording → FinalizingRecording → Idle transitions.
#[derive(Debug, Default)]
pub struct RecordingPipeline {
    finalize_pending: bool,
    /// Frames appended since stop was requested.
    late_frames: usize,
}

impl RecordingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new recording at the capture device's `format`.
    ///
    /// Returns `Ok(false)` when the session is busy (recording, finalizing
    /// or playing).
    pub fn start(&mut self, session: &mut Session, format: StreamFormat) -> Result<bool, StoreError> {
        if !matches!(session.mode, Mode::Idle | Mode::Scrubbing) {
            log::debug!("recorder: start ignored in {:?}", session.mode);
            return Ok(false);
        }
        session.reset_for_recording(format.sample_rate, format.channels as usize)?;
        session.mode = Mode::Recording;
        self.finalize_pending = false;
        self.late_frames = 0;
        log::info!(
            "recorder: recording at {} Hz, {} ch",
            format.sample_rate,
            format.channels
        );
        Ok(true)
    }

    /// Request stop.  Returns `true` when a finalize must now be scheduled.
    pub fn stop(&mut self, session: &mut Session) -> bool {
        if session.mode != Mode::Recording {
            return false;
        }
        session.mode = Mode::FinalizingRecording;
        self.finalize_pending = true;
        self.late_frames = 0;
        log::debug!("recorder: stop requested, finalize deferred");
        true
    }

    /// Deliver one captured frame.
    pub fn deliver(&mut self, session: &mut Session, frame: Frame) -> FrameOutcome {
        if !session.mode.accepts_frames() {
            return FrameOutcome::PassedThrough;
        }
        match session.store.append(frame) {
            Ok(()) => {
                if self.finalize_pending {
                    self.late_frames += 1;
                }
                FrameOutcome::Appended
            }
            Err(e) => {
                log::warn!("recorder: frame dropped: {e}");
                FrameOutcome::Rejected(e)
            }
        }
    }

    /// Seal the store and build the materialized buffer.  Returns `false`
    /// when no finalize was pending.
    pub fn finalize(&mut self, session: &mut Session) -> bool {
        if !self.finalize_pending || session.mode != Mode::FinalizingRecording {
            return false;
        }
        session.store.seal();
        session.materialize();
        session.mode = Mode::Idle;
        self.finalize_pending = false;
        log::info!(
            "recorder: finalized {:.3}s ({} samples, {} frame(s) after stop)",
            session.elapsed_time(),
            session.store.total_samples(),
            self.late_frames
        );
        true
    }

    /// Seal immediately, skipping the deferral.  Used on suspend.
    pub fn abort(&mut self, session: &mut Session) {
        if session.mode.accepts_frames() {
            session.store.seal();
            session.mode = Mode::Idle;
            log::info!("recorder: recording aborted");
        }
        self.finalize_pending = false;
    }

    /// A finalize was requested and has not run yet.
    pub fn finalize_pending(&self) -> bool {
        self.finalize_pending
    }

    /// Frames appended between stop and finalize.
    pub fn late_frames(&self) -> usize {
        self.late_frames
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::View;

    const FORMAT: StreamFormat = StreamFormat {
        sample_rate: 48_000,
        channels: 1,
    };

    fn block() -> Frame {
        Frame::mono(vec![0.0; 480])
    }

    #[test]
    fn in_flight_frame_survives_stop() {
        let mut session = Session::new(View::new(800.0, 100.0));
        let mut rec = RecordingPipeline::new();
        assert!(rec.start(&mut session, FORMAT).expect("start"));

        assert_eq!(rec.deliver(&mut session, block()), FrameOutcome::Appended);
        assert!(rec.stop(&mut session));
        assert!(rec.finalize_pending());
        assert_eq!(rec.deliver(&mut session, block()), FrameOutcome::Appended);
        assert!(rec.finalize(&mut session));

        assert_eq!(session.store.total_samples(), 960);
        assert_eq!(rec.late_frames(), 1);
        assert_eq!(session.mode, Mode::Idle);
        assert!(session.has_clip());
        assert_eq!(session.materialized.len(), 960);
    }

    #[test]
    fn frames_after_finalize_pass_through() {
        let mut session = Session::new(View::new(800.0, 100.0));
        let mut rec = RecordingPipeline::new();
        rec.start(&mut session, FORMAT).expect("start");
        rec.stop(&mut session);
        rec.finalize(&mut session);

        assert_eq!(rec.deliver(&mut session, block()), FrameOutcome::PassedThrough);
        assert!(session.store.is_empty());
    }

    #[test]
    fn idle_frames_are_not_recorded() {
        let mut session = Session::new(View::new(800.0, 100.0));
        let mut rec = RecordingPipeline::new();
        assert_eq!(rec.deliver(&mut session, block()), FrameOutcome::PassedThrough);
        assert!(!rec.stop(&mut session));
        assert!(!rec.finalize(&mut session));
    }

    #[test]
    fn wrong_channel_count_is_rejected() {
        let mut session = Session::new(View::new(800.0, 100.0));
        let mut rec = RecordingPipeline::new();
        rec.start(&mut session, FORMAT).expect("start");
        let stereo = Frame::new(vec![vec![0.0; 4], vec![0.0; 4]]).expect("frame");
        assert!(matches!(
            rec.deliver(&mut session, stereo),
            FrameOutcome::Rejected(StoreError::ChannelMismatch { .. })
        ));
    }

    #[test]
    fn start_while_recording_is_ignored() {
        let mut session = Session::new(View::new(800.0, 100.0));
        let mut rec = RecordingPipeline::new();
        rec.start(&mut session, FORMAT).expect("start");
        rec.deliver(&mut session, block());
        assert!(!rec.start(&mut session, FORMAT).expect("start"));
        assert_eq!(session.store.total_samples(), 480);
    }

    #[test]
    fn abort_seals_without_deferral() {
        let mut session = Session::new(View::new(800.0, 100.0));
        let mut rec = RecordingPipeline::new();
        rec.start(&mut session, FORMAT).expect("start");
        rec.deliver(&mut session, block());
        rec.abort(&mut session);
        assert!(!session.store.is_open());
        assert_eq!(session.mode, Mode::Idle);
    }
}
