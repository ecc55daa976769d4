//! The recorder widget: one [`Session`] driven by an event dispatcher.
//!
//! # Architecture
//!
//! ```text
//! cpal input ──Frame──┐
//! shell input ────────┤                         ┌─▶ Present  → surface  → DrawComplete
//! output end ─────────┼─▶ Event ─▶ Widget::handle ─┼─▶ Export   → task     → ExportFinished
//! tasks ──────────────┤        (sync, one at a time) ├─▶ Load     → blocking → Loaded
//! render ticks ───────┘                         ├─▶ Defer    → back of the queue
//!                                               └─▶ Notify   → shell
//! ```
//!
//! [`Widget::handle`] runs one event to completion and returns the
//! [`Command`]s it needs executed; it never blocks and never awaits.  The
//! async [`Runtime`] owns the queue and carries the commands out.
//!
//! Stop while recording answers with `Defer(FinalizeRecording)`.  Frames
//! that were already queued when Stop arrived are handled before the
//! finalize runs, so the last in-flight block is kept.

pub mod event;
pub mod runtime;

pub use event::{Command, Event, Notice};
pub use runtime::Runtime;

use crate::audio::{AudioOutput, LoadError, LoadedAudio, StreamFormat};
use crate::config::AppConfig;
use crate::export::ExportJob;
use crate::interact::{DragController, DragSubject};
use crate::pipeline::{
    Controls, FrameOutcome, Mode, PlayOutcome, PlaybackEngine, RecordingPipeline, Session,
};
use crate::render::{Markers, TickOutcome, View, WaveformRenderer};

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// Event-driven recorder/editor over an [`AudioOutput`].
pub struct Widget<O: AudioOutput> {
    session: Session,
    recorder: RecordingPipeline,
    engine: PlaybackEngine,
    renderer: WaveformRenderer,
    drag: DragController,
    output: O,
    config: AppConfig,
    input: Option<StreamFormat>,
    input_failed: bool,
    saving: bool,
    loading: bool,
    published_mode: Option<Mode>,
    published_controls: Option<Controls>,
}

impl<O: AudioOutput> Widget<O> {
    pub fn new(config: AppConfig, output: O) -> Self {
        let view = View::new(config.render.viewport_width, config.render.viewport_height);
        Self {
            session: Session::new(view),
            recorder: RecordingPipeline::new(),
            engine: PlaybackEngine::new(config.playback.resume_epsilon_secs),
            renderer: WaveformRenderer::new(config.render.target_labels),
            drag: DragController::new(),
            output,
            config,
            input: None,
            input_failed: false,
            saving: false,
            loading: false,
            published_mode: None,
            published_controls: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn renderer(&self) -> &WaveformRenderer {
        &self.renderer
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current playback / scrub position in seconds.
    ///
    /// Follows the playback clock while ticker sync is on; otherwise holds
    /// the value of the ticker drag.
    pub fn position(&self) -> f64 {
        if !self.session.sync.ticker {
            if let Some(held) = self.drag.scrub_value() {
                return held;
            }
        }
        self.engine.current_position(&self.output)
    }

    /// Enabled buttons for the current state.
    pub fn controls(&self) -> Controls {
        Controls::for_mode(
            self.session.mode,
            self.session.has_clip(),
            self.input.is_some(),
            self.saving || self.loading,
        )
    }

    /// Handle one event to completion.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut shutdown = false;
        match event {
            Event::InputReady(format) => {
                log::info!(
                    "widget: input ready ({} Hz, {} ch)",
                    format.sample_rate,
                    format.channels
                );
                self.input = Some(format);
            }
            Event::InputUnavailable(reason) => {
                self.input = None;
                if !self.input_failed {
                    self.input_failed = true;
                    log::warn!("widget: recording disabled: {reason}");
                    commands.push(notify_error(format!("microphone unavailable: {reason}")));
                }
            }
            Event::Frame(frame) => {
                if self.config.audio.monitor {
                    self.output.monitor(&frame);
                }
                if let FrameOutcome::Rejected(e) = self.recorder.deliver(&mut self.session, frame) {
                    log::debug!("widget: frame rejected: {e}");
                }
            }
            Event::PlaybackEnded(id) => {
                if self.engine.on_ended(id, &mut self.session, &mut self.output) {
                    self.renderer.request_redraw();
                }
            }

            Event::Record => self.on_record(&mut commands),
            Event::Stop => self.on_stop(&mut commands),
            Event::FinalizeRecording => {
                if self.recorder.finalize(&mut self.session) {
                    self.renderer.request_redraw();
                    commands.push(Command::Notify(Notice::ClipReady {
                        duration_secs: self.session.elapsed_time(),
                    }));
                }
            }
            Event::Play => self.on_play(&mut commands),
            Event::Save => self.on_save(&mut commands),
            Event::ExportFinished(result) => {
                self.saving = false;
                match result {
                    Ok(saved) => {
                        log::info!("widget: clip {saved}");
                        commands.push(Command::Notify(Notice::Saved(saved)));
                    }
                    Err(e) => {
                        log::warn!("widget: save failed: {e}");
                        commands.push(notify_error(format!("save failed: {e}")));
                    }
                }
            }
            Event::Load(paths) => {
                if self.controls().load {
                    self.loading = true;
                    commands.push(Command::Load(paths));
                }
            }
            Event::Loaded(result) => {
                self.loading = false;
                self.on_loaded(result, &mut commands);
            }

            Event::SetTrim { start, end } => {
                // A handle under the user's pointer is not moved from outside.
                if self.editable() && self.session.sync.trim {
                    if let Some(start) = start {
                        self.session.set_trim_start(start);
                    }
                    if let Some(end) = end {
                        self.session.set_trim_end(end);
                    }
                    self.renderer.request_redraw();
                }
            }
            Event::ZoomIn => self.on_zoom(true),
            Event::ZoomOut => self.on_zoom(false),
            Event::Resize { width, height } => {
                let total = self.session.store.total_samples();
                self.session.view.resize(width, height, total);
                self.renderer.request_redraw();
            }
            Event::DragStart { subject, x } => self.on_drag_start(subject, x),
            Event::DragMove { x } => {
                if self.drag.drag_move(x, &mut self.session).is_some() {
                    self.renderer.request_redraw();
                }
            }
            Event::Drop => {
                if let Some(update) = self.drag.drop_drag(&mut self.session) {
                    if update.subject == DragSubject::Ticker {
                        self.engine.set_position(update.value);
                    }
                    self.renderer.request_redraw();
                }
            }

            Event::Tick => self.on_tick(&mut commands),
            Event::DrawComplete => self.renderer.finish_draw(),
            Event::Suspend => {
                self.drag.drop_drag(&mut self.session);
                self.engine.stop(&mut self.session, &mut self.output);
                self.recorder.abort(&mut self.session);
                self.output.release();
                log::info!("widget: suspended");
                shutdown = true;
            }
        }

        self.publish(&mut commands);
        if shutdown {
            // Last, so the final mode and controls still reach the shell.
            commands.push(Command::Shutdown);
        }
        commands
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn on_record(&mut self, commands: &mut Vec<Command>) {
        let Some(format) = self.input else {
            commands.push(notify_error("recording unavailable: no input device".into()));
            return;
        };
        if !self.controls().record {
            log::debug!("widget: record ignored in {:?}", self.session.mode);
            return;
        }
        self.drag.drop_drag(&mut self.session);
        match self.recorder.start(&mut self.session, format) {
            Ok(true) => {
                self.engine.set_position(0.0);
                self.renderer.request_redraw();
            }
            Ok(false) => {}
            Err(e) => commands.push(notify_error(format!("cannot start recording: {e}"))),
        }
    }

    fn on_stop(&mut self, commands: &mut Vec<Command>) {
        match self.session.mode {
            Mode::Recording => {
                if self.recorder.stop(&mut self.session) {
                    commands.push(Command::Defer(Event::FinalizeRecording));
                }
            }
            Mode::Playing => {
                if self.engine.stop(&mut self.session, &mut self.output) {
                    self.renderer.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn on_play(&mut self, commands: &mut Vec<Command>) {
        if !self.controls().play || self.drag.active().is_some() {
            return;
        }
        match self.engine.play(&mut self.session, &mut self.output) {
            Ok(PlayOutcome::Started { .. }) => self.renderer.request_redraw(),
            Ok(PlayOutcome::AlreadyPlaying) | Ok(PlayOutcome::EmptyRange) => {}
            Err(e) => {
                log::warn!("widget: playback failed: {e}");
                commands.push(notify_error(format!("playback failed: {e}")));
            }
        }
    }

    fn on_save(&mut self, commands: &mut Vec<Command>) {
        if !self.controls().save {
            return;
        }
        let (start, end) = self.session.selection();
        if start >= end {
            log::debug!("widget: save ignored, empty selection");
            return;
        }
        self.session.materialize();
        self.saving = true;
        commands.push(Command::Export(ExportJob {
            pcm: self.session.materialized.shared(),
            start,
            end,
            config: self.config.export.clone(),
        }));
    }

    fn on_loaded(&mut self, result: Result<LoadedAudio, LoadError>, commands: &mut Vec<Command>) {
        let audio = match result {
            Ok(audio) => audio,
            Err(e) => {
                log::warn!("widget: load failed: {e}");
                commands.push(notify_error(format!("load failed: {e}")));
                return;
            }
        };
        if !matches!(self.session.mode, Mode::Idle | Mode::Scrubbing) {
            log::debug!("widget: load discarded in {:?}", self.session.mode);
            return;
        }
        self.drag.drop_drag(&mut self.session);
        match self.session.load(audio) {
            Ok(()) => {
                self.engine.set_position(0.0);
                self.renderer.request_redraw();
                commands.push(Command::Notify(Notice::ClipReady {
                    duration_secs: self.session.elapsed_time(),
                }));
            }
            Err(e) => commands.push(notify_error(format!("load failed: {e}"))),
        }
    }

    fn on_zoom(&mut self, zoom_in: bool) {
        let zoom = &mut self.session.view.zoom;
        let changed = if zoom_in { zoom.zoom_in() } else { zoom.zoom_out() };
        if !changed {
            return;
        }
        let total = self.session.store.total_samples();
        let canvas = self.session.view.geometry(total).canvas_width();
        let scroll = self.session.view.scroll();
        self.session.view.set_scroll(scroll, canvas);
        self.renderer.request_redraw();
    }

    fn on_drag_start(&mut self, subject: DragSubject, x: f64) {
        if !self.editable() {
            return;
        }
        if subject == DragSubject::Ticker {
            self.engine.stop(&mut self.session, &mut self.output);
        }
        let position = self.engine.current_position(&self.output);
        if self.drag.begin(subject, x, &mut self.session, position) {
            self.renderer.request_redraw();
        }
    }

    fn on_tick(&mut self, commands: &mut Vec<Command>) {
        if self.engine.is_playing() {
            self.renderer.request_redraw();
        }
        let markers = self.markers();
        if let TickOutcome::Draw(frame) =
            self.renderer
                .tick(&mut self.session.store, &self.session.view, markers)
        {
            commands.push(Command::Present(frame));
        }
    }

    /// Marker positions for the next frame.  A trim handle whose sync is
    /// off shows the value held by the active drag.
    fn markers(&self) -> Markers {
        let ticker = self.session.has_clip().then(|| self.position());
        let mut markers = self.session.markers(ticker);
        if !self.session.sync.trim {
            if let Some(drag) = self.drag.active() {
                match drag.subject {
                    DragSubject::StartTrim => markers.trim_start = drag.value,
                    DragSubject::EndTrim => markers.trim_end = drag.value,
                    DragSubject::Ticker | DragSubject::Pan => {}
                }
            }
        }
        markers
    }

    /// Trim and drag need a finished clip and no recording in progress.
    fn editable(&self) -> bool {
        self.session.has_clip() && !self.session.mode.accepts_frames()
    }

    fn publish(&mut self, commands: &mut Vec<Command>) {
        let mode = self.session.mode;
        if self.published_mode != Some(mode) {
            self.published_mode = Some(mode);
            commands.push(Command::Notify(Notice::Mode(mode)));
        }
        let controls = self.controls();
        if self.published_controls != Some(controls) {
            self.published_controls = Some(controls);
            commands.push(Command::Notify(Notice::Controls(controls)));
        }
    }
}

fn notify_error(message: String) -> Command {
    Command::Notify(Notice::Error(message))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
