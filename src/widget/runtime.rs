//! Async event loop around a [`Widget`].
//!
//! The runtime is meant for a current-thread tokio runtime: the widget, and
//! with it the audio output, never leaves the loop's thread.  Two sources
//! feed the loop:
//!
//! * the event queue (device callbacks, shell input, completions), and
//! * the render interval at `render.fps`; ticks missed while the loop was
//!   busy are skipped, not replayed.
//!
//! Blocking work (surface painting, WAV encoding, file decoding) goes to
//! `spawn_blocking`; uploads run as ordinary tasks.  Each reports back as
//! an [`Event`] on the same queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::audio::{load_first, AudioOutput};
use crate::export::run_export;
use crate::render::{WaveformFrame, WaveformSurface};

use super::{Command, Event, Notice, Widget};

/// Drives a [`Widget`] until it asks to shut down.
pub struct Runtime<O: AudioOutput, S: WaveformSurface + 'static> {
    widget: Widget<O>,
    surface: Arc<Mutex<S>>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl<O: AudioOutput, S: WaveformSurface + 'static> Runtime<O, S> {
    /// `events_tx` must be the sending half of `events_rx`; device
    /// callbacks built before the runtime hold clones of it.
    pub fn new(
        widget: Widget<O>,
        surface: S,
        events_tx: mpsc::UnboundedSender<Event>,
        events_rx: mpsc::UnboundedReceiver<Event>,
        notices: mpsc::UnboundedSender<Notice>,
    ) -> Self {
        Self {
            widget,
            surface: Arc::new(Mutex::new(surface)),
            events_tx,
            events_rx,
            notices,
        }
    }

    /// Sender for device callbacks and shell input.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.events_tx.clone()
    }

    /// Run until [`Event::Suspend`] is handled.  Returns the widget.
    pub async fn run(mut self) -> Widget<O> {
        let fps = self.widget.config().render.fps.max(1);
        let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!("runtime: started ({fps} fps)");

        loop {
            let event = tokio::select! {
                biased;
                Some(event) = self.events_rx.recv() => event,
                _ = ticker.tick() => Event::Tick,
            };

            for command in self.widget.handle(event) {
                if !self.execute(command) {
                    log::info!("runtime: shut down");
                    return self.widget;
                }
            }
        }
    }

    /// Carry out one command.  Returns `false` on shutdown.
    fn execute(&self, command: Command) -> bool {
        match command {
            Command::Defer(event) => self.send(event),
            Command::Present(frame) => self.present(frame),
            Command::Export(job) => {
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = run_export(job).await;
                    if tx.send(Event::ExportFinished(result)).is_err() {
                        log::debug!("runtime: export finished after shutdown");
                    }
                });
            }
            Command::Load(paths) => {
                let tx = self.events_tx.clone();
                tokio::task::spawn_blocking(move || {
                    if tx.send(Event::Loaded(load_first(&paths))).is_err() {
                        log::debug!("runtime: load finished after shutdown");
                    }
                });
            }
            Command::Notify(notice) => {
                if self.notices.send(notice).is_err() {
                    log::debug!("runtime: no shell listening for notices");
                }
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn present(&self, frame: WaveformFrame) {
        let surface = Arc::clone(&self.surface);
        let done = DrawCompletion(self.events_tx.clone());
        tokio::task::spawn_blocking(move || {
            let _done = done;
            // A surface that panicked earlier left the lock poisoned; its
            // state is only a writer, so keep painting.
            let mut surface = surface.lock().unwrap_or_else(|poisoned| {
                log::warn!("runtime: surface recovered after a panic");
                poisoned.into_inner()
            });
            if let Err(e) = surface.present(&frame) {
                log::warn!("runtime: present failed: {e}");
            }
        });
    }

    fn send(&self, event: Event) {
        // The receiver lives in `self`, so this cannot fail while running.
        let _ = self.events_tx.send(event);
    }
}

/// Reports [`Event::DrawComplete`] when dropped, so the renderer's drawing
/// guard is released even if the surface panics.
struct DrawCompletion(mpsc::UnboundedSender<Event>);

impl Drop for DrawCompletion {
    fn drop(&mut self) {
        let _ = self.0.send(Event::DrawComplete);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Frame, StreamFormat};
    use crate::config::AppConfig;
    use crate::pipeline::Mode;
    use crate::widget::tests::FakeOutput;
    use std::io;

    #[derive(Clone, Default)]
    struct RecordingSurface {
        frames: Arc<Mutex<Vec<WaveformFrame>>>,
    }

    impl WaveformSurface for RecordingSurface {
        fn present(&mut self, frame: &WaveformFrame) -> io::Result<()> {
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    /// Panics on its first frame, then records like [`RecordingSurface`].
    #[derive(Clone, Default)]
    struct PanicOnce {
        panicked: Arc<std::sync::atomic::AtomicBool>,
        frames: Arc<Mutex<Vec<WaveformFrame>>>,
    }

    impl WaveformSurface for PanicOnce {
        fn present(&mut self, frame: &WaveformFrame) -> io::Result<()> {
            use std::sync::atomic::Ordering;
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("surface failure");
            }
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    async fn wait_for(
        notices: &mut mpsc::UnboundedReceiver<Notice>,
        pred: impl Fn(&Notice) -> bool,
    ) -> Notice {
        loop {
            let notice = notices.recv().await.expect("notice channel open");
            if pred(&notice) {
                return notice;
            }
        }
    }

    #[tokio::test]
    async fn record_stop_finalize_keeps_in_flight_frame() {
        let surface = RecordingSurface::default();
        let (notice_tx, mut notices) = mpsc::unbounded_channel();
        let widget = Widget::new(AppConfig::default(), FakeOutput::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Runtime::new(widget, surface.clone(), tx.clone(), rx, notice_tx);
        let handle = tokio::spawn(runtime.run());

        tx.send(Event::InputReady(StreamFormat {
            sample_rate: 48_000,
            channels: 1,
        }))
        .unwrap();
        tx.send(Event::Record).unwrap();
        tx.send(Event::Frame(Frame::mono(vec![0.1; 4_800]))).unwrap();
        tx.send(Event::Stop).unwrap();
        tx.send(Event::Frame(Frame::mono(vec![0.1; 4_800]))).unwrap();

        let ready = wait_for(&mut notices, |n| matches!(n, Notice::ClipReady { .. })).await;
        assert_eq!(ready, Notice::ClipReady { duration_secs: 0.2 });

        tx.send(Event::Suspend).unwrap();
        let widget = handle.await.expect("runtime task");
        assert_eq!(widget.session().store.total_samples(), 9_600);
        assert_eq!(widget.session().mode, Mode::Idle);
        assert!(widget.output().released);
        assert!(!surface.frames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_error_is_reported() {
        let (notice_tx, mut notices) = mpsc::unbounded_channel();
        let widget = Widget::new(AppConfig::default(), FakeOutput::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Runtime::new(widget, RecordingSurface::default(), tx.clone(), rx, notice_tx);
        let handle = tokio::spawn(runtime.run());

        tx.send(Event::Load(vec!["/definitely/missing.wav".into()]))
            .unwrap();
        let notice = wait_for(&mut notices, |n| matches!(n, Notice::Error(_))).await;
        let Notice::Error(message) = notice else {
            unreachable!()
        };
        assert!(message.contains("missing.wav"), "{message}");

        tx.send(Event::Suspend).unwrap();
        handle.await.expect("runtime task");
    }

    #[tokio::test]
    async fn drawing_resumes_after_surface_panic() {
        let surface = PanicOnce::default();
        let (notice_tx, _notices) = mpsc::unbounded_channel();
        let widget = Widget::new(AppConfig::default(), FakeOutput::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Runtime::new(widget, surface.clone(), tx.clone(), rx, notice_tx);
        let handle = tokio::spawn(runtime.run());

        tx.send(Event::InputReady(StreamFormat {
            sample_rate: 48_000,
            channels: 1,
        }))
        .unwrap();
        tx.send(Event::Record).unwrap();

        let drawn = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                tx.send(Event::Frame(Frame::mono(vec![0.1; 480]))).unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
                if !surface.frames.lock().unwrap().is_empty() {
                    break;
                }
            }
        })
        .await;
        assert!(drawn.is_ok(), "no frame presented after the panic");
        assert!(surface.panicked.load(std::sync::atomic::Ordering::SeqCst));

        tx.send(Event::Suspend).unwrap();
        handle.await.expect("runtime task");
    }
}
