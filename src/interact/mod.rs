//! Pointer interaction with the waveform: trim handles, ticker and pan.

pub mod drag;

pub use drag::{DragController, DragSession, DragSubject, DragUpdate};
