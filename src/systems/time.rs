//! Time update system.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! and [`WallTime`](crate::resources::worldtime::WallTime) resources once per
//! frame from the game loop's [`Frame`](crate::gameloop::Frame).
use bevy_ecs::prelude::*;

use crate::gameloop::Frame;
use crate::resources::worldtime::{WallTime, WorldTime};

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is expected to be the unscaled (but already clamped) frame delta in
/// seconds. The current `time_scale` is applied before storing it.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
}

/// Copy a loop frame into both time resources.
pub fn apply_frame(world: &mut World, frame: &Frame) {
    update_world_time(world, frame.dt);
    let mut wall = world.resource_mut::<WallTime>();
    wall.now = frame.now;
    wall.fps = frame.fps;
}
