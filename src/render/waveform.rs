//! Waveform renderer: sample store → per-channel line plot.
//!
//! The renderer is ticked by a fixed-rate scheduler.  A tick only produces a
//! [`WaveformFrame`] when the store reports new data or a redraw was forced
//! (zoom, resize, moving ticker).  While a frame is still being presented
//! the `drawing` guard is set and further ticks are dropped, not queued; the
//! dirty flag is left untouched so the next tick after
//! [`WaveformRenderer::finish_draw`] picks the pending data up.
//!
//! ```text
//! tick ──▶ drawing? ──yes──▶ Skipped
//!              │no
//!              ▼
//!      dirty || forced? ──no──▶ Idle
//!              │yes
//!              ▼
//!        Draw(frame)  … present …  finish_draw()
//! ```
//!
//! Vertices are taken every [`Geometry::interval`] samples, so a draw costs
//! O(canvas width) however long the recording is.  Sampled values are
//! cached in a [`PlotCache`] and extended incrementally while the interval
//! and the recording stay the same.

use crate::audio::SampleStore;

use super::axis::{time_labels, AxisLabel};
use super::{Geometry, View};

// ---------------------------------------------------------------------------
// Frame types
// ---------------------------------------------------------------------------

/// Polyline of one channel, in canvas pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelLayer {
    pub points: Vec<(f64, f64)>,
}

/// Overlay positions in seconds, supplied by the session on every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Markers {
    /// Playback / scrub position, if a ticker is shown.
    pub ticker: Option<f64>,
    /// Seconds trimmed from the head.
    pub trim_start: f64,
    /// Seconds trimmed from the tail.
    pub trim_end: f64,
}

/// Everything a surface needs to paint one waveform frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformFrame {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub viewport_width: f64,
    pub scroll: f64,
    pub elapsed: f64,
    /// One layer per channel, stacked, sharing the x mapping.
    pub layers: Vec<ChannelLayer>,
    pub labels: Vec<AxisLabel>,
    pub ticker_x: Option<f64>,
    pub trim_start_x: f64,
    pub trim_end_x: f64,
}

/// Result of one scheduler tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing changed since the last draw.
    Idle,
    /// A previous draw is still in progress; this tick was dropped.
    Skipped,
    /// A new frame must be presented, then [`WaveformRenderer::finish_draw`]
    /// called.
    Draw(WaveformFrame),
}

/// Draw counters, for tests and debug logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draws: u64,
    pub skipped: u64,
}

// ---------------------------------------------------------------------------
// PlotCache
// ---------------------------------------------------------------------------

/// Values sampled at `k · interval` for every channel.
#[derive(Debug, Default)]
pub struct PlotCache {
    interval: usize,
    generation: u64,
    channel_count: usize,
    /// Next sample index to read.
    next_index: usize,
    values: Vec<Vec<f32>>,
}

impl PlotCache {
    /// Bring the cache up to date with `store` at `interval`.
    ///
    /// Returns the number of values read from the store.
    pub fn update(&mut self, store: &SampleStore, interval: usize) -> usize {
        let interval = interval.max(1);
        if interval != self.interval
            || store.generation() != self.generation
            || store.channel_count() != self.channel_count
            || self.next_index > store.total_samples()
        {
            self.interval = interval;
            self.generation = store.generation();
            self.channel_count = store.channel_count();
            self.next_index = 0;
            self.values = vec![Vec::new(); store.channel_count()];
        }

        let mut read = 0;
        let total = store.total_samples();
        while self.next_index < total {
            for (ch, values) in self.values.iter_mut().enumerate() {
                values.push(store.sample(ch, self.next_index).unwrap_or(0.0));
                read += 1;
            }
            self.next_index += interval;
        }
        read
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Cached values of `channel`.
    pub fn values(&self, channel: usize) -> &[f32] {
        self.values.get(channel).map_or(&[], Vec::as_slice)
    }
}

// ---------------------------------------------------------------------------
// WaveformRenderer
// ---------------------------------------------------------------------------

/// Turns the sample store into [`WaveformFrame`]s, at most one draw at a
/// time.
#[derive(Debug)]
pub struct WaveformRenderer {
    drawing: bool,
    forced: bool,
    target_labels: usize,
    cache: PlotCache,
    stats: RenderStats,
}

impl WaveformRenderer {
    pub fn new(target_labels: usize) -> Self {
        Self {
            drawing: false,
            forced: true,
            target_labels,
            cache: PlotCache::default(),
            stats: RenderStats::default(),
        }
    }

    /// One scheduler tick.
    pub fn tick(&mut self, store: &mut SampleStore, view: &View, markers: Markers) -> TickOutcome {
        if self.drawing {
            self.stats.skipped += 1;
            log::trace!("render: tick skipped, draw in progress");
            return TickOutcome::Skipped;
        }
        let dirty = store.take_dirty();
        if !dirty && !self.forced {
            return TickOutcome::Idle;
        }

        self.forced = false;
        self.drawing = true;
        self.stats.draws += 1;
        TickOutcome::Draw(self.build(store, view, markers))
    }

    /// Mark the in-flight draw as presented.
    pub fn finish_draw(&mut self) {
        self.drawing = false;
    }

    /// Force a draw on the next tick even without new data.
    pub fn request_redraw(&mut self) {
        self.forced = true;
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    fn build(&mut self, store: &SampleStore, view: &View, markers: Markers) -> WaveformFrame {
        let total = store.total_samples();
        let elapsed = store.elapsed_secs();
        let geometry = view.geometry(total);
        let interval = geometry.interval();
        self.cache.update(store, interval);

        let layers = (0..store.channel_count())
            .map(|ch| layer(&geometry, self.cache.values(ch), interval))
            .collect();

        let clip_end = (elapsed - markers.trim_end).max(0.0);
        WaveformFrame {
            canvas_width: geometry.canvas_width(),
            canvas_height: geometry.canvas_height,
            viewport_width: geometry.viewport_width,
            scroll: view.scroll(),
            elapsed,
            layers,
            labels: time_labels(elapsed, &geometry, self.target_labels),
            ticker_x: markers
                .ticker
                .map(|t| geometry.x_of_time(t.clamp(0.0, elapsed), elapsed)),
            trim_start_x: geometry.x_of_time(markers.trim_start, elapsed),
            trim_end_x: if elapsed > 0.0 {
                geometry.x_of_time(clip_end, elapsed)
            } else {
                geometry.canvas_width()
            },
        }
    }
}

fn layer(geometry: &Geometry, values: &[f32], interval: usize) -> ChannelLayer {
    ChannelLayer {
        points: values
            .iter()
            .enumerate()
            .map(|(k, &v)| (geometry.x_of_sample(k * interval), geometry.y_of_value(v)))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Frame;
    use crate::render::Zoom;

    fn recording(samples: usize) -> SampleStore {
        let mut store = SampleStore::new();
        store.begin(48_000, 1).expect("begin");
        store
            .append(Frame::mono(vec![0.0; samples]))
            .expect("append");
        store
    }

    fn expect_draw(outcome: TickOutcome) -> WaveformFrame {
        match outcome {
            TickOutcome::Draw(frame) => frame,
            other => panic!("expected a draw, got {other:?}"),
        }
    }

    // ---- scheduling --------------------------------------------------------

    #[test]
    fn tick_during_draw_is_dropped_and_dirty_kept() {
        let mut store = recording(4_800);
        let view = View::new(800.0, 100.0);
        let mut renderer = WaveformRenderer::new(10);

        let first = expect_draw(renderer.tick(&mut store, &view, Markers::default()));
        assert_eq!(first.layers[0].points.len(), 800);

        store
            .append(Frame::mono(vec![0.5; 4_800]))
            .expect("append");
        assert_eq!(
            renderer.tick(&mut store, &view, Markers::default()),
            TickOutcome::Skipped
        );
        assert!(store.is_dirty());

        renderer.finish_draw();
        let next = expect_draw(renderer.tick(&mut store, &view, Markers::default()));
        assert_eq!(next.elapsed, 0.2);
        assert_eq!(renderer.stats(), RenderStats { draws: 2, skipped: 1 });
    }

    #[test]
    fn idle_without_changes() {
        let mut store = recording(480);
        let view = View::new(800.0, 100.0);
        let mut renderer = WaveformRenderer::new(10);

        expect_draw(renderer.tick(&mut store, &view, Markers::default()));
        renderer.finish_draw();
        assert_eq!(
            renderer.tick(&mut store, &view, Markers::default()),
            TickOutcome::Idle
        );

        renderer.request_redraw();
        expect_draw(renderer.tick(&mut store, &view, Markers::default()));
    }

    // ---- geometry ----------------------------------------------------------

    #[test]
    fn vertex_count_bounded_by_canvas_width() {
        let mut store = recording(96_000 * 10);
        let view = View::new(800.0, 100.0);
        let mut renderer = WaveformRenderer::new(10);

        let frame = expect_draw(renderer.tick(&mut store, &view, Markers::default()));
        assert_eq!(frame.layers[0].points.len(), 800);
        assert!(frame
            .layers[0]
            .points
            .iter()
            .all(|&(x, y)| x < 800.0 && y == 50.0));
    }

    #[test]
    fn one_layer_per_channel() {
        let mut store = SampleStore::new();
        store.begin(8_000, 2).expect("begin");
        let frame = Frame::new(vec![vec![1.0; 800], vec![-1.0; 800]]).expect("frame");
        store.append(frame).expect("append");
        let mut renderer = WaveformRenderer::new(10);

        let out = expect_draw(renderer.tick(&mut store, &View::new(800.0, 100.0), Markers::default()));
        assert_eq!(out.layers.len(), 2);
        assert!(out.layers[0].points.iter().all(|&(_, y)| y == 0.0));
        assert!(out.layers[1].points.iter().all(|&(_, y)| y == 100.0));
        assert_eq!(out.layers[0].points[5].0, out.layers[1].points[5].0);
    }

    #[test]
    fn markers_map_to_canvas_pixels() {
        let mut store = recording(96_000);
        let mut view = View::new(800.0, 100.0);
        view.zoom = Zoom::new(0);
        let mut renderer = WaveformRenderer::new(10);
        let markers = Markers {
            ticker: Some(1.0),
            trim_start: 0.5,
            trim_end: 0.5,
        };

        let frame = expect_draw(renderer.tick(&mut store, &view, markers));
        assert_eq!(frame.ticker_x, Some(400.0));
        assert_eq!(frame.trim_start_x, 200.0);
        assert_eq!(frame.trim_end_x, 600.0);
    }

    // ---- cache -------------------------------------------------------------

    #[test]
    fn cache_extends_incrementally() {
        let mut store = recording(1_000);
        let mut cache = PlotCache::default();
        assert_eq!(cache.update(&store, 10), 100);

        store.append(Frame::mono(vec![0.0; 1_000])).expect("append");
        assert_eq!(cache.update(&store, 10), 100);
        assert_eq!(cache.values(0).len(), 200);

        assert_eq!(cache.update(&store, 20), 100);
        assert_eq!(cache.interval(), 20);
    }

    #[test]
    fn cache_rebuilds_after_reset() {
        let mut store = recording(1_000);
        let mut cache = PlotCache::default();
        cache.update(&store, 10);

        store.seal();
        store.begin(48_000, 1).expect("begin");
        store.append(Frame::mono(vec![0.0; 50])).expect("append");
        assert_eq!(cache.update(&store, 10), 5);
        assert_eq!(cache.values(0).len(), 5);
    }
}
