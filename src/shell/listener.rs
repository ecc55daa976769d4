//! Dedicated OS-thread reader for shell commands.
//!
//! Reading stdin blocks, so it lives on its own thread rather than in a
//! tokio task.  [`ShellListener`] owns that thread and a stop flag; dropping
//! it sets the flag so lines read afterwards are discarded.
//!
//! End of input is treated like `quit`.

use std::io::{BufRead, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::{parse_line, HELP};
use crate::widget::Event;

// ---------------------------------------------------------------------------
// ShellListener
// ---------------------------------------------------------------------------

/// Handle to a running shell reader thread.
///
/// The thread stays blocked in `read_line` until the next line or end of
/// input, even after the handle is dropped.
pub struct ShellListener {
    stop: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

impl ShellListener {
    /// Spawn a thread that reads `input` line by line and forwards the
    /// parsed events on `tx`.  Parse errors and `help` go to `feedback`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be created.
    pub fn start<R, W>(
        input: R,
        mut feedback: W,
        tx: mpsc::UnboundedSender<Event>,
    ) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("shell-input".into())
            .spawn(move || {
                for line in input.lines() {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            log::error!("shell-input: read failed: {e}");
                            break;
                        }
                    };

                    let reply = match parse_line(&line) {
                        Ok(events) => {
                            let quitting = events.iter().any(|e| matches!(e, Event::Suspend));
                            for event in events {
                                if tx.send(event).is_err() {
                                    return;
                                }
                            }
                            if quitting {
                                return;
                            }
                            line.trim().eq_ignore_ascii_case("help").then(|| HELP.to_string())
                        }
                        Err(e) => Some(e.to_string()),
                    };

                    if let Some(reply) = reply {
                        let _ = writeln!(feedback, "{reply}");
                    }
                }

                log::info!("shell-input: end of input");
                let _ = tx.send(Event::Suspend);
            })?;

        Ok(Self {
            stop,
            _thread: thread,
        })
    }
}

impl Drop for ShellListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
