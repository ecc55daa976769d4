//! Zoom, viewport and the sample ↔ pixel coordinate mapping.
//!
//! All waveform geometry derives from four numbers: total samples, zoom
//! factor, viewport width and canvas height.
//!
//! ```text
//! canvas_width = max(viewport, total · zoom · viewport / total)
//! x(sample)    = sample · zoom · viewport / total
//! y(value)     = ½ · (1 − value) · height          [-1, 1] → [height, 0]
//! interval     = max(1, round(total / canvas_width))
//! ```

// ---------------------------------------------------------------------------
// Zoom
// ---------------------------------------------------------------------------

/// Lowest zoom level (whole clip fits the viewport).
pub const ZOOM_MIN: i32 = 0;
/// Highest zoom level.
pub const ZOOM_MAX: i32 = 16;
/// Growth of the canvas width per zoom level.
pub const ZOOM_BASE: f64 = 1.2;

/// Integer zoom level in `[ZOOM_MIN, ZOOM_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Zoom {
    level: i32,
}

impl Zoom {
    /// Zoom at `level`, clamped to the valid range.
    pub fn new(level: i32) -> Self {
        Self {
            level: level.clamp(ZOOM_MIN, ZOOM_MAX),
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// `ZOOM_BASE ^ level`.
    ///
    /// ```
    /// use auo::render::Zoom;
    ///
    /// assert_eq!(Zoom::new(0).factor(), 1.0);
    /// assert!((Zoom::new(2).factor() - 1.44).abs() < 1e-12);
    /// ```
    pub fn factor(&self) -> f64 {
        ZOOM_BASE.powi(self.level)
    }

    /// Step one level in.  Returns `false` at the maximum.
    pub fn zoom_in(&mut self) -> bool {
        self.step(1)
    }

    /// Step one level out.  Returns `false` at the minimum.
    pub fn zoom_out(&mut self) -> bool {
        self.step(-1)
    }

    fn step(&mut self, delta: i32) -> bool {
        let next = (self.level + delta).clamp(ZOOM_MIN, ZOOM_MAX);
        let changed = next != self.level;
        self.level = next;
        changed
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Viewport size, zoom and horizontal scroll of the waveform display.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub zoom: Zoom,
    scroll: f64,
}

impl View {
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            viewport_width: viewport_width.max(1.0),
            viewport_height: viewport_height.max(1.0),
            zoom: Zoom::default(),
            scroll: 0.0,
        }
    }

    /// Geometry of this view over `total_samples` samples.
    pub fn geometry(&self, total_samples: usize) -> Geometry {
        Geometry {
            total_samples,
            zoom_factor: self.zoom.factor(),
            viewport_width: self.viewport_width,
            canvas_height: self.viewport_height,
        }
    }

    /// Horizontal scroll offset in pixels.
    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    /// Set the scroll offset, clamped to `[0, canvas_width − viewport_width]`.
    pub fn set_scroll(&mut self, offset: f64, canvas_width: f64) -> f64 {
        let max = (canvas_width - self.viewport_width).max(0.0);
        self.scroll = offset.clamp(0.0, max);
        self.scroll
    }

    /// Resize the viewport; the scroll offset is re-clamped.
    pub fn resize(&mut self, width: f64, height: f64, total_samples: usize) {
        self.viewport_width = width.max(1.0);
        self.viewport_height = height.max(1.0);
        let canvas = self.geometry(total_samples).canvas_width();
        self.set_scroll(self.scroll, canvas);
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Coordinate mapping for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub total_samples: usize,
    pub zoom_factor: f64,
    pub viewport_width: f64,
    pub canvas_height: f64,
}

impl Geometry {
    /// Canvas width in pixels: grows with zoom, never below the viewport.
    pub fn canvas_width(&self) -> f64 {
        if self.total_samples == 0 {
            return self.viewport_width;
        }
        let total = self.total_samples as f64;
        (total * self.zoom_factor * self.viewport_width / total).max(self.viewport_width)
    }

    /// Pixel x of sample index `sample`.
    pub fn x_of_sample(&self, sample: usize) -> f64 {
        if self.total_samples == 0 {
            return 0.0;
        }
        sample as f64 * self.zoom_factor * self.viewport_width / self.total_samples as f64
    }

    /// Pixel y of a sample value in `[-1, 1]`.
    pub fn y_of_value(&self, value: f32) -> f64 {
        0.5 * (1.0 - value as f64) * self.canvas_height
    }

    /// Samples per drawn vertex, bounding a draw to O(canvas width).
    pub fn interval(&self) -> usize {
        let pixels = self.canvas_width().round().max(1.0);
        ((self.total_samples as f64 / pixels).round() as usize).max(1)
    }

    /// Pixel x of time `secs` on a clip lasting `elapsed` seconds.
    pub fn x_of_time(&self, secs: f64, elapsed: f64) -> f64 {
        if elapsed <= 0.0 {
            return 0.0;
        }
        secs / elapsed * self.canvas_width()
    }

    /// Convert a pixel distance on the canvas to seconds.
    pub fn pixels_to_secs(&self, pixels: f64, elapsed: f64) -> f64 {
        convert_units(pixels, self.canvas_width(), elapsed)
    }
}

/// Scale `value` from a `from`-unit range onto a `to`-unit range.
///
/// Used to turn pointer deltas (pixels over the canvas width) into seconds
/// (over the clip duration).  A zero `from` range yields `0.0`.
pub fn convert_units(value: f64, from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    value * to / from
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
