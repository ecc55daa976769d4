//! Waveform rendering: coordinate math, axis labels, frame building and
//! drawing surfaces.
//!
//! # Pipeline
//!
//! ```text
//! SampleStore ──tick──▶ WaveformRenderer ──WaveformFrame──▶ WaveformSurface
//!                         (View/Geometry,                    (terminal, …)
//!                          PlotCache, axis)
//! ```

pub mod axis;
pub mod surface;
pub mod view;
pub mod waveform;

pub use axis::{label_precision, time_labels, AxisLabel};
pub use surface::{TerminalSurface, WaveformSurface};
pub use view::{convert_units, Geometry, View, Zoom, ZOOM_BASE, ZOOM_MAX, ZOOM_MIN};
pub use waveform::{
    ChannelLayer, Markers, PlotCache, RenderStats, TickOutcome, WaveformFrame, WaveformRenderer,
};
