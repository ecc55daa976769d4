//! Drawing targets for rendered waveform frames.
//!
//! A [`WaveformSurface`] receives each [`WaveformFrame`] on a blocking task
//! and paints it.  [`TerminalSurface`] draws the visible window of the first
//! channel as a one-line sparkline with the trim handles and ticker overlaid.

use std::io::{self, Write};

use super::WaveformFrame;

/// Block characters from quiet to loud.
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Something that can paint a [`WaveformFrame`].
pub trait WaveformSurface: Send {
    fn present(&mut self, frame: &WaveformFrame) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// TerminalSurface
// ---------------------------------------------------------------------------

/// One-line sparkline on a terminal, redrawn in place with `\r`.
pub struct TerminalSurface {
    out: Box<dyn Write + Send>,
    columns: usize,
}

impl TerminalSurface {
    pub fn new(out: Box<dyn Write + Send>, columns: usize) -> Self {
        Self {
            out,
            columns: columns.max(1),
        }
    }

    /// Terminal on stdout.
    pub fn stdout(columns: usize) -> Self {
        Self::new(Box::new(io::stdout()), columns)
    }

    /// Render the visible window of `frame` into a line of text.
    pub fn line(&self, frame: &WaveformFrame) -> String {
        let mut peaks = vec![0.0_f64; self.columns];
        let column_of = |x: f64| -> Option<usize> {
            let rel = (x - frame.scroll) / frame.viewport_width;
            if !(0.0..1.0).contains(&rel) {
                return None;
            }
            Some(((rel * self.columns as f64) as usize).min(self.columns - 1))
        };

        if let Some(layer) = frame.layers.first() {
            for &(x, y) in &layer.points {
                if let Some(col) = column_of(x) {
                    let amplitude = (1.0 - 2.0 * y / frame.canvas_height).abs();
                    peaks[col] = peaks[col].max(amplitude);
                }
            }
        }

        let mut cells: Vec<char> = peaks
            .iter()
            .map(|&p| {
                let idx = (p.clamp(0.0, 1.0) * (LEVELS.len() - 1) as f64).round() as usize;
                LEVELS[idx]
            })
            .collect();

        if let Some(col) = column_of(frame.trim_start_x) {
            cells[col] = '[';
        }
        if let Some(col) = column_of(frame.trim_end_x) {
            cells[col] = ']';
        }
        if let Some(col) = frame.ticker_x.and_then(column_of) {
            cells[col] = '|';
        }

        let mut line: String = cells.into_iter().collect();
        line.push_str(&format!(" {:>8.2}s", frame.elapsed));
        line
    }
}

impl WaveformSurface for TerminalSurface {
    fn present(&mut self, frame: &WaveformFrame) -> io::Result<()> {
        let line = self.line(frame);
        write!(self.out, "\r{line}")?;
        self.out.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
