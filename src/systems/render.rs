//! Frame rendering.
//!
//! Rendering reads the world and never mutates it: [`render_frame`] hands the
//! [`SceneManager`] a canvas with the camera and asset store, and the scene
//! composes its fixed layer order. [`render_to_window`] wraps that in a raylib
//! drawing scope.

use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::render::canvas::Canvas;
use crate::render::raylib_canvas::RaylibCanvas;
use crate::resources::assetstore::AssetStore;
use crate::resources::camera::Camera;
use crate::resources::scenemanager::SceneManager;
use crate::resources::texturestore::TextureStore;

/// Draw the current scene onto any canvas.
pub fn render_frame(world: &World, canvas: &mut dyn Canvas) {
    let (Some(scene), Some(camera), Some(assets)) = (
        world.get_resource::<SceneManager>(),
        world.get_resource::<Camera>(),
        world.get_resource::<AssetStore>(),
    ) else {
        return;
    };
    scene.draw(canvas, camera, assets);
}

/// Draw one frame into the window.
pub fn render_to_window(world: &World, rl: &mut RaylibHandle, thread: &RaylibThread) {
    let mut d = rl.begin_drawing(thread);
    d.clear_background(Color::BLACK);
    let Some(textures) = world.get_resource::<TextureStore>() else {
        return;
    };
    let mut canvas = RaylibCanvas::new(&mut d, textures);
    render_frame(world, &mut canvas);
}
