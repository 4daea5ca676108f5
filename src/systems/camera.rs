//! Keeps the [`Camera`] viewport in sync with the window.

use bevy_ecs::prelude::*;
use log::debug;

use crate::resources::camera::Camera;
use crate::resources::windowsize::WindowSize;

pub fn camera_resize_system(window: Res<WindowSize>, mut camera: ResMut<Camera>) {
    let (w, h) = window.as_f32();
    if camera.viewport_width == w && camera.viewport_height == h {
        return;
    }
    camera.resize(w, h);
    debug!("viewport {}x{}, scale {}", w, h, camera.scale);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_window_size() {
        let mut world = World::new();
        world.insert_resource(Camera::new(320.0, 180.0));
        world.insert_resource(WindowSize::new(960, 540));
        let mut schedule = Schedule::default();
        schedule.add_systems(camera_resize_system);
        schedule.run(&mut world);
        assert_eq!(world.resource::<Camera>().scale, 3.0);

        world.resource_mut::<WindowSize>().w = 1280;
        world.resource_mut::<WindowSize>().h = 720;
        schedule.run(&mut world);
        let cam = world.resource::<Camera>();
        assert_eq!(cam.viewport_width, 1280.0);
        assert_eq!(cam.scale, 4.0);
    }
}
