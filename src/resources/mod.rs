//! ECS resources made available to systems.
//!
//! Overview
//! - `assetloader` – background thread reading image files
//! - `assetstore` – procedural sprites and image readiness by key
//! - `camera` – world-to-viewport mapping and letterboxing
//! - `eventfeed` – background thread reading agent events
//! - `gameconfig` – settings loaded from the INI file
//! - `scenecatalog` – built-in static scene configurations
//! - `scenemanager` – the running scene
//! - `sprites` – procedural pixel art for the wizard and props
//! - `texturestore` – uploaded textures keyed by string IDs
//! - `windowsize` – current window dimensions in pixels
//! - `worldtime` – simulation time and wall-clock time
pub mod assetloader;
pub mod assetstore;
pub mod camera;
pub mod eventfeed;
pub mod gameconfig;
pub mod scenecatalog;
pub mod scenemanager;
pub mod sprites;
pub mod texturestore;
pub mod windowsize;
pub mod worldtime;
