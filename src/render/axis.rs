//! Time-axis labels.
//!
//! Roughly `target` labels are placed per visible window.  The step between
//! labels decides how many decimals they show, so a zoomed-in view reads
//! `0.125` where a full view reads `0.5`.

use super::Geometry;

/// Most decimals a label ever shows.
pub const MAX_PRECISION: usize = 6;

/// One tick on the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    /// Time in seconds.
    pub time: f64,
    /// Pixel x on the canvas.
    pub x: f64,
    pub text: String,
}

/// Decimal places for labels spaced `step` seconds apart:
/// `clamp(0, 6, floor(2 − log10(step)))`.
///
/// ```
/// use auo::render::label_precision;
///
/// assert_eq!(label_precision(0.2), 2);
/// assert_eq!(label_precision(10.0), 1);
/// assert_eq!(label_precision(500.0), 0);
/// ```
pub fn label_precision(step: f64) -> usize {
    if !step.is_finite() || step <= 0.0 {
        return 0;
    }
    let raw = (2.0 - step.log10()).floor();
    raw.clamp(0.0, MAX_PRECISION as f64) as usize
}

/// Labels for a clip lasting `elapsed` seconds drawn with `geometry`.
///
/// The visible window covers `elapsed · viewport / canvas` seconds; labels
/// sit at whole multiples of `visible / target` up to `elapsed`.
pub fn time_labels(elapsed: f64, geometry: &Geometry, target: usize) -> Vec<AxisLabel> {
    let canvas = geometry.canvas_width();
    if elapsed <= 0.0 || target == 0 || canvas <= 0.0 {
        return Vec::new();
    }

    let visible = elapsed * geometry.viewport_width / canvas;
    let step = visible / target as f64;
    if step <= 0.0 {
        return Vec::new();
    }
    let precision = label_precision(step);

    let count = (elapsed / step + 1e-9).floor() as usize;
    (0..=count)
        .map(|k| {
            let time = k as f64 * step;
            AxisLabel {
                time,
                x: geometry.x_of_time(time, elapsed),
                text: format!("{time:.precision$}"),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
