//! wizardwatch library.
//!
//! A pixel-art scene where a wizard acts out what a coding agent is doing.
//! This module exposes the scene components, resources, systems and events
//! for use by the binary and by integration tests.

pub mod app;
pub mod components;
pub mod events;
pub mod gameloop;
pub mod render;
pub mod resources;
pub mod systems;
