//! World and schedule assembly shared by the binary and the tests.
//!
//! [`build_world`] inserts every resource the systems expect, and
//! [`build_schedule`] chains the per-frame systems:
//!
//! 1. `poll_event_feed` (only when an [`EventFeed`] exists)
//! 2. `update_agent_event_messages`
//! 3. `apply_agent_events`
//! 4. `camera_resize_system`
//! 5. `scene_update_system`
//!
//! [`step`] runs one frame: copy the loop's timing into the time resources,
//! then run the schedule.

use bevy_ecs::prelude::*;
use raylib::prelude::Vector2;

use crate::components::particles::ParticleSystem;
use crate::events::agentevent::AgentEvent;
use crate::gameloop::Frame;
use crate::resources::assetstore::AssetStore;
use crate::resources::camera::Camera;
use crate::resources::eventfeed::EventFeed;
use crate::resources::gameconfig::GameConfig;
use crate::resources::scenecatalog::{SceneConfig, SceneError};
use crate::resources::scenemanager::SceneManager;
use crate::resources::sprites::builtin_sprites;
use crate::resources::texturestore::TextureStore;
use crate::resources::windowsize::WindowSize;
use crate::resources::worldtime::{WallTime, WorldTime};
use crate::systems::agentevents::{apply_agent_events, poll_event_feed, update_agent_event_messages};
use crate::systems::camera::camera_resize_system;
use crate::systems::scene::scene_update_system;
use crate::systems::time::apply_frame;

/// Build a world for `scene` with an inactive [`SceneManager`].
pub fn build_world(config: &GameConfig, scene: SceneConfig) -> Result<World, SceneError> {
    let (ww, wh) = config.world_size();
    let particles =
        ParticleSystem::new(config.particle_capacity).with_gravity_mode(config.gravity_mode);
    let scene = SceneManager::new(scene, Vector2 { x: ww, y: wh }, particles)?;

    let mut camera = Camera::new(ww, wh);
    camera.resize(config.window_width as f32, config.window_height as f32);

    let mut assets = AssetStore::new();
    assets.extend_sprites(builtin_sprites());

    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(1.0));
    world.insert_resource(WallTime::default());
    world.insert_resource(WindowSize::new(config.window_width as i32, config.window_height as i32));
    world.insert_resource(camera);
    world.insert_resource(config.clone());
    world.insert_resource(scene);
    world.insert_resource(assets);
    world.insert_resource(TextureStore::new());
    world.insert_resource(Messages::<AgentEvent>::default());
    Ok(world)
}

pub fn build_schedule(world: &mut World) -> Result<Schedule, String> {
    let mut update = Schedule::default();
    update.add_systems(
        (
            poll_event_feed.run_if(resource_exists::<EventFeed>),
            update_agent_event_messages,
            apply_agent_events,
            camera_resize_system,
            scene_update_system,
        )
            .chain(),
    );
    update
        .initialize(world)
        .map_err(|e| format!("Failed to initialize schedule: {}", e))?;
    Ok(update)
}

/// Run one frame of simulation.
pub fn step(world: &mut World, schedule: &mut Schedule, frame: &Frame) {
    apply_frame(world, frame);
    schedule.run(world);
    world.clear_trackers();
}
