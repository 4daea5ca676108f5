//! ECS systems.
//!
//! Submodules overview
//! - [`agentevents`] – drain the event feed and apply events to the scene
//! - [`assets`] – request scene images and upload finished loads
//! - [`camera`] – keep the camera viewport in sync with the window
//! - [`render`] – draw the scene through a canvas
//! - [`scene`] – advance the scene simulation
//! - [`time`] – update simulation and wall-clock time

pub mod agentevents;
pub mod assets;
pub mod camera;
pub mod render;
pub mod scene;
pub mod time;
