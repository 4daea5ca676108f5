//! Per-frame scene simulation.

use bevy_ecs::prelude::*;

use crate::resources::scenemanager::SceneManager;
use crate::resources::worldtime::{WallTime, WorldTime};

/// Advance the scene with the clamped frame delta and the wall-clock reading.
pub fn scene_update_system(
    time: Res<WorldTime>,
    wall: Res<WallTime>,
    mut scene: ResMut<SceneManager>,
) {
    scene.update(time.delta, wall.now);
}
