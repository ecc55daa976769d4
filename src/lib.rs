//! auo: record, trim, play back and export audio clips.
//!
//! # Modules
//!
//! | Module       | Role                                                      |
//! |--------------|-----------------------------------------------------------|
//! | [`audio`]    | frames, sample store, materialized buffer, cpal devices   |
//! | [`config`]   | `settings.toml` persistence                               |
//! | [`pipeline`] | session, recorder state machine, playback engine          |
//! | [`render`]   | zoomable waveform geometry, axis labels, surfaces         |
//! | [`interact`] | trim handle / ticker / pan drags                          |
//! | [`export`]   | WAV and streaming encoders, local and HTTP destinations   |
//! | [`widget`]   | event dispatcher and async runtime                        |
//! | [`shell`]    | console command parser and stdin listener                 |

pub mod audio;
pub mod config;
pub mod export;
pub mod interact;
pub mod pipeline;
pub mod render;
pub mod shell;
pub mod widget;
