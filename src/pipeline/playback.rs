//! Playback engine: plays the trimmed selection and tracks the position.
//!
//! [`PlaybackEngine`] owns at most one active playback on an
//! [`AudioOutput`].  While playing, the position is a live clock
//! (`now − started_at + offset`); otherwise it is a frozen value set by
//! stop, end of clip or a ticker drop.
//!
//! # Resume vs. restart
//!
//! `play` resumes from the frozen position when it lies strictly before the
//! selection end by more than `epsilon`; otherwise it restarts from the trim
//! start.  A clip that just finished therefore plays again from the start
//! without an explicit rewind.
//!
//! # End of clip
//!
//! The output reports the natural end with the [`PlaybackId`] it was given.
//! [`PlaybackEngine::on_ended`] only acts when that id is still the active
//! one, so an end report racing a user stop is handled once.

use thiserror::Error;

use crate::audio::{AudioOutput, OutputError, PlaybackId};

use super::{Mode, Session};

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio output failed: {0}")]
    Output(#[from] OutputError),
}

// ---------------------------------------------------------------------------
// PlayOutcome
// ---------------------------------------------------------------------------

/// Result of a `play` request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayOutcome {
    /// Playback started covering `[start, end)` seconds.
    Started { start: f64, end: f64 },
    /// A playback is already running; nothing was scheduled.
    AlreadyPlaying,
    /// The selection is empty (`start >= end`); nothing was scheduled.
    EmptyRange,
}

#[derive(Debug, Clone, Copy)]
struct ActivePlayback {
    id: PlaybackId,
    started_at: f64,
    offset: f64,
    end: f64,
}

// ---------------------------------------------------------------------------
// PlaybackEngine
// ---------------------------------------------------------------------------

/// Plays sub-ranges of the session's materialized buffer.
#[derive(Debug)]
pub struct PlaybackEngine {
    epsilon: f64,
    active: Option<ActivePlayback>,
    frozen: f64,
}

impl PlaybackEngine {
    /// `epsilon` is the resume tolerance in seconds.
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.max(0.0),
            active: None,
            frozen: 0.0,
        }
    }

    /// Play the session's selection `[trim_start, elapsed − trim_end)`.
    pub fn play<O: AudioOutput>(
        &mut self,
        session: &mut Session,
        output: &mut O,
    ) -> Result<PlayOutcome, PlaybackError> {
        if self.active.is_some() {
            return Ok(PlayOutcome::AlreadyPlaying);
        }
        let (start, end) = session.selection();
        if start >= end {
            log::debug!("playback: empty selection {start:.3}..{end:.3}");
            return Ok(PlayOutcome::EmptyRange);
        }

        if session.materialize() {
            log::debug!("playback: materialized buffer refreshed");
        }

        let effective = self.resume_point(start, end);
        let pcm = session.materialized.shared();
        let range = pcm.sample_at(effective)..pcm.sample_at(end);
        if range.start >= range.end {
            return Ok(PlayOutcome::EmptyRange);
        }

        let id = output.play(pcm, range)?;
        self.active = Some(ActivePlayback {
            id,
            started_at: output.now(),
            offset: effective,
            end,
        });
        session.mode = Mode::Playing;
        log::info!("playback: {id:?} playing {effective:.3}s..{end:.3}s");
        Ok(PlayOutcome::Started {
            start: effective,
            end,
        })
    }

    /// Where the next playback of `[start, end)` begins.
    pub fn resume_point(&self, start: f64, end: f64) -> f64 {
        if self.frozen < end - self.epsilon {
            self.frozen.max(start)
        } else {
            start
        }
    }

    /// Current position in seconds, never negative.
    pub fn current_position<O: AudioOutput>(&self, output: &O) -> f64 {
        match &self.active {
            Some(active) => (output.now() - active.started_at + active.offset).max(0.0),
            None => self.frozen,
        }
    }

    /// Halt the active playback and freeze its position.  Returns `false`
    /// when nothing was playing.
    pub fn stop<O: AudioOutput>(&mut self, session: &mut Session, output: &mut O) -> bool {
        let position = self.current_position(output);
        let Some(active) = self.active.take() else {
            return false;
        };
        output.halt(active.id);
        self.frozen = position.min(active.end);
        if session.mode == Mode::Playing {
            session.mode = Mode::Idle;
        }
        log::info!("playback: {:?} stopped at {:.3}s", active.id, self.frozen);
        true
    }

    /// Natural end of playback `id`.  Returns `false` for stale ids.
    pub fn on_ended<O: AudioOutput>(
        &mut self,
        id: PlaybackId,
        session: &mut Session,
        output: &mut O,
    ) -> bool {
        match self.active {
            Some(active) if active.id == id => {
                self.active = None;
                output.halt(id);
                self.frozen = active.end;
                if session.mode == Mode::Playing {
                    session.mode = Mode::Idle;
                }
                log::info!("playback: {id:?} reached end at {:.3}s", active.end);
                true
            }
            _ => {
                log::debug!("playback: ignoring end of stale {id:?}");
                false
            }
        }
    }

    /// Freeze the position at `secs` (ticker drop, new recording).
    pub fn set_position(&mut self, secs: f64) {
        self.frozen = secs.max(0.0);
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_id(&self) -> Option<PlaybackId> {
        self.active.map(|a| a.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Frame, PcmBuffer};
    use crate::render::View;
    use std::ops::Range;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeOutput {
        clock: f64,
        next: u64,
        played: Vec<(PlaybackId, Range<usize>)>,
        halted: Vec<PlaybackId>,
    }

    impl AudioOutput for FakeOutput {
        fn play(
            &mut self,
            _buffer: Arc<PcmBuffer>,
            range: Range<usize>,
        ) -> Result<PlaybackId, OutputError> {
            self.next += 1;
            let id = PlaybackId(self.next);
            self.played.push((id, range));
            Ok(id)
        }

        fn halt(&mut self, id: PlaybackId) {
            self.halted.push(id);
        }

        fn now(&self) -> f64 {
            self.clock
        }
    }

    fn two_second_clip() -> Session {
        let mut session = Session::new(View::new(800.0, 100.0));
        session.reset_for_recording(48_000, 1).expect("begin");
        session
            .store
            .append(Frame::mono(vec![0.0; 96_000]))
            .expect("append");
        session.store.seal();
        session
    }

    #[test]
    fn trimmed_selection_plays_one_second() {
        let mut session = two_second_clip();
        session.set_trim_start(0.5);
        session.set_trim_end(0.5);
        let mut out = FakeOutput::default();
        let mut engine = PlaybackEngine::new(1e-10);

        let outcome = engine.play(&mut session, &mut out).expect("play");
        assert_eq!(outcome, PlayOutcome::Started { start: 0.5, end: 1.5 });
        assert_eq!(out.played[0].1, 24_000..72_000);
        assert_eq!(session.mode, Mode::Playing);
    }

    #[test]
    fn position_follows_clock() {
        let mut session = two_second_clip();
        let mut out = FakeOutput {
            clock: 10.0,
            ..FakeOutput::default()
        };
        let mut engine = PlaybackEngine::new(1e-10);
        engine.play(&mut session, &mut out).expect("play");

        out.clock = 10.75;
        assert!((engine.current_position(&out) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn stop_twice_is_idempotent() {
        let mut session = two_second_clip();
        let mut out = FakeOutput::default();
        let mut engine = PlaybackEngine::new(1e-10);
        engine.play(&mut session, &mut out).expect("play");
        out.clock = 0.4;

        assert!(engine.stop(&mut session, &mut out));
        assert!(!engine.stop(&mut session, &mut out));
        assert_eq!(out.halted.len(), 1);
        assert_eq!(engine.current_position(&out), 0.4);
        assert_eq!(session.mode, Mode::Idle);
    }

    #[test]
    fn play_while_playing_schedules_nothing() {
        let mut session = two_second_clip();
        let mut out = FakeOutput::default();
        let mut engine = PlaybackEngine::new(1e-10);
        engine.play(&mut session, &mut out).expect("play");
        assert_eq!(
            engine.play(&mut session, &mut out).expect("play"),
            PlayOutcome::AlreadyPlaying
        );
        assert_eq!(out.played.len(), 1);
    }

    #[test]
    fn stop_then_play_resumes() {
        let mut session = two_second_clip();
        let mut out = FakeOutput::default();
        let mut engine = PlaybackEngine::new(1e-10);
        engine.play(&mut session, &mut out).expect("play");
        out.clock = 0.5;
        engine.stop(&mut session, &mut out);

        let outcome = engine.play(&mut session, &mut out).expect("play");
        assert_eq!(outcome, PlayOutcome::Started { start: 0.5, end: 2.0 });
    }

    #[test]
    fn ended_then_stop_handles_end_once() {
        let mut session = two_second_clip();
        let mut out = FakeOutput::default();
        let mut engine = PlaybackEngine::new(1e-10);
        engine.play(&mut session, &mut out).expect("play");
        let id = engine.active_id().expect("active");

        assert!(engine.on_ended(id, &mut session, &mut out));
        assert!(!engine.on_ended(id, &mut session, &mut out));
        assert!(!engine.stop(&mut session, &mut out));
        assert_eq!(out.halted, vec![id]);
        assert_eq!(engine.current_position(&out), 2.0);

        let outcome = engine.play(&mut session, &mut out).expect("play");
        assert_eq!(outcome, PlayOutcome::Started { start: 0.0, end: 2.0 });
    }

    #[test]
    fn stale_end_after_restart_is_ignored() {
        let mut session = two_second_clip();
        let mut out = FakeOutput::default();
        let mut engine = PlaybackEngine::new(1e-10);
        engine.play(&mut session, &mut out).expect("play");
        let first = engine.active_id().expect("active");
        engine.stop(&mut session, &mut out);
        engine.play(&mut session, &mut out).expect("play");

        assert!(!engine.on_ended(first, &mut session, &mut out));
        assert!(engine.is_playing());
    }

    #[test]
    fn empty_selection_is_a_silent_no_op() {
        let mut session = two_second_clip();
        session.set_trim_start(1.0);
        session.set_trim_end(1.0);
        let mut out = FakeOutput::default();
        let mut engine = PlaybackEngine::new(1e-10);

        assert_eq!(
            engine.play(&mut session, &mut out).expect("play"),
            PlayOutcome::EmptyRange
        );
        assert!(out.played.is_empty());
        assert_eq!(session.mode, Mode::Idle);
    }

    #[test]
    fn play_rebuilds_stale_buffer() {
        let mut session = two_second_clip();
        assert!(session.materialized.is_stale(&session.store));
        let mut out = FakeOutput::default();
        PlaybackEngine::new(1e-10)
            .play(&mut session, &mut out)
            .expect("play");
        assert_eq!(session.materialized.len(), 96_000);
    }
}
