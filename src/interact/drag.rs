//! Drag state machine for the trim handles, the ticker and panning.
//!
//! Only one drag can be active at a time; [`DragController`] holds it in a
//! single optional slot.
//!
//! ```text
//! Idle ──begin(subject, x)──▶ Dragging ──move(x)*──▶ Dragging ──drop──▶ Idle
//! ```
//!
//! On every move the pointer delta is converted from canvas pixels to
//! seconds and added to the value captured at drag start, then clamped:
//!
//! | Subject   | Value                       | Clamp                        |
//! |-----------|-----------------------------|------------------------------|
//! | StartTrim | `ref + Δs`                  | `[0, elapsed − trim_end]`    |
//! | EndTrim   | `ref − Δs` (tail handle)    | `[0, elapsed − trim_start]`  |
//! | Ticker    | `ref + Δs`                  | `[0, elapsed]`               |
//! | Pan       | `scroll_ref − Δpx`          | `[0, canvas − viewport]`     |
//!
//! `trim_end` counts seconds from the tail, so the end handle moves right
//! when the value shrinks; subtracting keeps the handle under the pointer.

use crate::pipeline::{Mode, Session};
use crate::render::convert_units;

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSubject {
    StartTrim,
    EndTrim,
    Ticker,
    Pan,
}

/// One drag from press to drop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub subject: DragSubject,
    /// Pointer x at drag start, in canvas pixels.
    pub reference_coordinate: f64,
    /// Subject value at drag start (seconds, or pixels for pan).
    pub reference_value: f64,
    /// Last clamped value.
    pub value: f64,
}

/// Value applied by a move or drop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragUpdate {
    pub subject: DragSubject,
    pub value: f64,
}

/// Single-slot drag tracker.
#[derive(Debug, Default)]
pub struct DragController {
    active: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging `subject` at pointer `x`.
    ///
    /// `position` is the current playback position, used as the ticker's
    /// reference value.  Returns `false` when another drag is active.  The
    /// caller must stop playback before a ticker drag.
    pub fn begin(&mut self, subject: DragSubject, x: f64, session: &mut Session, position: f64) -> bool {
        if self.active.is_some() {
            return false;
        }
        let reference_value = match subject {
            DragSubject::StartTrim => {
                session.sync.trim = false;
                session.trim_start()
            }
            DragSubject::EndTrim => {
                session.sync.trim = false;
                session.trim_end()
            }
            DragSubject::Ticker => {
                session.sync.ticker = false;
                session.mode = Mode::Scrubbing;
                position.clamp(0.0, session.elapsed_time().max(0.0))
            }
            DragSubject::Pan => session.view.scroll(),
        };
        self.active = Some(DragSession {
            subject,
            reference_coordinate: x,
            reference_value,
            value: reference_value,
        });
        log::debug!("drag: {subject:?} started at x={x:.1}");
        true
    }

    /// Pointer moved to `x`.  Applies trims and scroll to the session and
    /// returns the new clamped value.
    pub fn drag_move(&mut self, x: f64, session: &mut Session) -> Option<DragUpdate> {
        let drag = self.active.as_mut()?;
        let delta_px = x - drag.reference_coordinate;
        let elapsed = session.elapsed_time();
        let canvas = session.view.geometry(session.store.total_samples()).canvas_width();
        let delta_secs = convert_units(delta_px, canvas, elapsed);

        drag.value = match drag.subject {
            DragSubject::StartTrim => session.set_trim_start(drag.reference_value + delta_secs),
            DragSubject::EndTrim => session.set_trim_end(drag.reference_value - delta_secs),
            DragSubject::Ticker => (drag.reference_value + delta_secs).clamp(0.0, elapsed.max(0.0)),
            DragSubject::Pan => session.view.set_scroll(drag.reference_value - delta_px, canvas),
        };
        Some(DragUpdate {
            subject: drag.subject,
            value: drag.value,
        })
    }

    /// End the drag, restoring auto-sync.  Returns the final value.
    pub fn drop_drag(&mut self, session: &mut Session) -> Option<DragUpdate> {
        let drag = self.active.take()?;
        match drag.subject {
            DragSubject::StartTrim | DragSubject::EndTrim => session.sync.trim = true,
            DragSubject::Ticker => {
                session.sync.ticker = true;
                if session.mode == Mode::Scrubbing {
                    session.mode = Mode::Idle;
                }
            }
            DragSubject::Pan => {}
        }
        log::debug!("drag: {:?} dropped at {:.3}", drag.subject, drag.value);
        Some(DragUpdate {
            subject: drag.subject,
            value: drag.value,
        })
    }

    pub fn active(&self) -> Option<&DragSession> {
        self.active.as_ref()
    }

    /// Current scrub value while the ticker is being dragged.
    pub fn scrub_value(&self) -> Option<f64> {
        self.active
            .filter(|d| d.subject == DragSubject::Ticker)
            .map(|d| d.value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Frame;
    use crate::render::{View, Zoom};

    /// 2 s clip on an 800 px canvas: 400 px per second.
    fn clip() -> Session {
        let mut session = Session::new(View::new(800.0, 100.0));
        session.reset_for_recording(48_000, 1).expect("begin");
        session
            .store
            .append(Frame::mono(vec![0.0; 96_000]))
            .expect("append");
        session.store.seal();
        session
    }

    // ---- trims -------------------------------------------------------------

    #[test]
    fn start_trim_follows_pointer() {
        let mut s = clip();
        let mut drag = DragController::new();
        assert!(drag.begin(DragSubject::StartTrim, 0.0, &mut s, 0.0));
        assert!(!s.sync.trim);

        let update = drag.drag_move(200.0, &mut s).expect("active");
        assert_eq!(update.value, 0.5);
        assert_eq!(s.trim_start(), 0.5);

        drag.drop_drag(&mut s);
        assert!(s.sync.trim);
        assert!(drag.active().is_none());
    }

    #[test]
    fn end_trim_clamps_exactly_to_remaining() {
        let mut s = clip();
        s.set_trim_start(0.75);
        let mut drag = DragController::new();
        drag.begin(DragSubject::EndTrim, 800.0, &mut s, 0.0);

        let update = drag.drag_move(-5_000.0, &mut s).expect("active");
        assert_eq!(update.value, s.elapsed_time() - s.trim_start());
        assert_eq!(s.trim_end(), 1.25);
    }

    #[test]
    fn trims_never_overlap_for_any_delta() {
        let mut s = clip();
        let mut drag = DragController::new();
        for (i, subject) in [DragSubject::StartTrim, DragSubject::EndTrim]
            .into_iter()
            .cycle()
            .take(40)
            .enumerate()
        {
            drag.begin(subject, 400.0, &mut s, 0.0);
            for step in -20..=20 {
                let x = 400.0 + step as f64 * 97.0 * (i as f64 + 1.0);
                drag.drag_move(x, &mut s);
                assert!(s.trim_start() >= 0.0 && s.trim_end() >= 0.0);
                assert!(s.trim_start() + s.trim_end() <= s.elapsed_time() + 1e-12);
            }
            drag.drop_drag(&mut s);
        }
    }

    // ---- ticker ------------------------------------------------------------

    #[test]
    fn ticker_drag_scrubs_within_clip() {
        let mut s = clip();
        let mut drag = DragController::new();
        assert!(drag.begin(DragSubject::Ticker, 400.0, &mut s, 1.0));
        assert_eq!(s.mode, Mode::Scrubbing);
        assert!(!s.sync.ticker);

        drag.drag_move(600.0, &mut s);
        assert_eq!(drag.scrub_value(), Some(1.5));
        drag.drag_move(10_000.0, &mut s);
        assert_eq!(drag.scrub_value(), Some(2.0));
        drag.drag_move(-10_000.0, &mut s);

        let done = drag.drop_drag(&mut s).expect("active");
        assert_eq!(done.value, 0.0);
        assert_eq!(s.mode, Mode::Idle);
        assert!(s.sync.ticker);
    }

    #[test]
    fn only_one_drag_at_a_time() {
        let mut s = clip();
        let mut drag = DragController::new();
        assert!(drag.begin(DragSubject::Ticker, 0.0, &mut s, 0.0));
        assert!(!drag.begin(DragSubject::StartTrim, 0.0, &mut s, 0.0));
        assert_eq!(drag.active().map(|d| d.subject), Some(DragSubject::Ticker));
        assert!(s.sync.trim);
    }

    #[test]
    fn move_without_drag_is_ignored() {
        let mut s = clip();
        let mut drag = DragController::new();
        assert!(drag.drag_move(100.0, &mut s).is_none());
        assert!(drag.drop_drag(&mut s).is_none());
    }

    // ---- pan ---------------------------------------------------------------

    #[test]
    fn pan_scrolls_without_touching_trims() {
        let mut s = clip();
        s.view.zoom = Zoom::new(8);
        let canvas = s.view.geometry(96_000).canvas_width();
        let mut drag = DragController::new();
        drag.begin(DragSubject::Pan, 500.0, &mut s, 0.0);

        drag.drag_move(300.0, &mut s);
        assert_eq!(s.view.scroll(), 200.0);
        drag.drag_move(-1e6, &mut s);
        assert!((s.view.scroll() - (canvas - 800.0)).abs() < 1e-9);
        drag.drag_move(1e6, &mut s);
        assert_eq!(s.view.scroll(), 0.0);
        assert_eq!((s.trim_start(), s.trim_end()), (0.0, 0.0));
    }
}
