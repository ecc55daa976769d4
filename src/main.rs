//! Application entry point: console clip recorder.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the event and notice channels.
//! 4. Open the cpal output; its end-of-playback callback feeds the event
//!    queue.
//! 5. Open the cpal input and start capturing.  Failure is reported to the
//!    widget, which keeps recording disabled.
//! 6. Spawn the shell listener thread on stdin.
//! 7. Run the widget [`Runtime`] on a current-thread tokio runtime until
//!    `quit` or end of input.  The audio streams are not `Send`, so
//!    everything device-related stays on the main thread.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use auo::{
    audio::{CpalInput, CpalOutput, EndNotifier, StreamHandle},
    config::AppConfig,
    render::TerminalSurface,
    shell::{describe, ShellListener, HELP},
    widget::{Event, Notice, Runtime, Widget},
};

/// Width of the terminal sparkline in characters.
const SPARKLINE_COLUMNS: usize = 64;

// ---------------------------------------------------------------------------
// Notice printer
// ---------------------------------------------------------------------------

/// Print every notice on its own line until the runtime drops its sender.
async fn print_notices(mut notices: mpsc::UnboundedReceiver<Notice>) {
    while let Some(notice) = notices.recv().await {
        if let Notice::Error(message) = &notice {
            log::warn!("{message}");
        }
        println!("\n{}", describe(&notice));
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Open the default input and forward its frames.  Returns the stream guard
/// on success; either way the widget learns whether capture is available.
fn start_capture(config: &AppConfig, events: &mpsc::UnboundedSender<Event>) -> Option<StreamHandle> {
    let frames = events.clone();
    let started = CpalInput::new(config.audio.block_size).and_then(|input| {
        let format = input.format();
        let handle = input.start(move |frame| {
            let _ = frames.send(Event::Frame(frame));
        })?;
        Ok((handle, format))
    });

    match started {
        Ok((handle, format)) => {
            log::info!(
                "Capture started: {} Hz, {} channel(s)",
                format.sample_rate,
                format.channels
            );
            let _ = events.send(Event::InputReady(format));
            Some(handle)
        }
        Err(e) => {
            log::warn!("Audio capture unavailable: {e}");
            let _ = events.send(Event::InputUnavailable(e.to_string()));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("auo starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Channels
    let (events_tx, events_rx) = mpsc::unbounded_channel::<Event>();
    let (notice_tx, notice_rx) = mpsc::unbounded_channel::<Notice>();

    // 4. Output device
    let ended = events_tx.clone();
    let notify: EndNotifier = Arc::new(move |id| {
        let _ = ended.send(Event::PlaybackEnded(id));
    });
    let output = CpalOutput::new(notify).context("failed to open the audio output")?;

    // 5. Input device (kept alive until the runtime returns)
    let capture = start_capture(&config, &events_tx);

    // 6. Shell
    println!("{HELP}");
    let stdin = std::io::BufReader::new(std::io::stdin());
    let _shell = ShellListener::start(stdin, std::io::stdout(), events_tx.clone())
        .context("failed to spawn the shell thread")?;

    // 7. Runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let widget = Widget::new(config, output);
    let surface = TerminalSurface::stdout(SPARKLINE_COLUMNS);
    let runtime = Runtime::new(widget, surface, events_tx, events_rx, notice_tx);

    rt.block_on(async move {
        let printer = tokio::spawn(print_notices(notice_rx));
        let widget = runtime.run().await;
        // The runtime owned the notice sender; the printer drains and exits.
        if printer.await.is_err() {
            log::warn!("notice printer panicked");
        }
        log::info!(
            "Session ended with {} sample(s) recorded",
            widget.session().store.total_samples()
        );
    });
    drop(capture);

    Ok(())
}
