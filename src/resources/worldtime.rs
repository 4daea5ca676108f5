//! Simulation and wall-clock time resources.
//!
//! [`WorldTime`] holds the clamped, scaled frame delta every simulation
//! system reads. [`WallTime`] holds the raw clock reading for the frame; the
//! scene uses it for deferred actions and background animation, which run on
//! wall-clock intervals rather than on the clamped delta.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }
}

/// Wall-clock reading of the current frame.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct WallTime {
    /// Seconds since the loop's clock origin.
    pub now: f64,
    /// Frames per second measured by the game loop.
    pub fps: f32,
}
