//! Window size resource.
//!
//! Tracks the actual window dimensions in pixels. Updated each frame from the
//! raylib handle; the camera resize system compares it against the camera's
//! viewport.

use bevy_ecs::prelude::Resource;

/// Current window size in pixels.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSize {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl WindowSize {
    pub fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }

    pub fn as_f32(&self) -> (f32, f32) {
        (self.w.max(0) as f32, self.h.max(0) as f32)
    }
}
