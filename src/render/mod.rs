//! Drawing surfaces.
//!
//! - [`canvas`] – the [`canvas::Canvas`] trait, draw layers and state stack
//! - [`raylib_canvas`] – canvas backed by a raylib draw handle
//! - [`recording`] – canvas that records operations, for tests and headless runs

pub mod canvas;
pub mod raylib_canvas;
pub mod recording;
