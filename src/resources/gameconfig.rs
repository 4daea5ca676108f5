//! Configuration resource.
//!
//! Settings loaded from an INI file. Every value has a safe default, so a
//! missing file or a missing key only means "use the default".
//!
//! # Configuration File Format
//!
//! ```ini
//! [world]
//! width = 320
//! height = 180
//!
//! [window]
//! width = 1280
//! height = 720
//! target_fps = 60
//! vsync = true
//! fullscreen = false
//!
//! [scene]
//! id = library
//! assets_dir = ./assets
//!
//! [particles]
//! capacity = 256
//! gravity = first_emitter
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::components::particles::{DEFAULT_CAPACITY, GravityMode};

// Defaults used when the file or a key is missing.
const DEFAULT_WORLD_WIDTH: u32 = 320;
const DEFAULT_WORLD_HEIGHT: u32 = 180;
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_VSYNC: bool = true;
const DEFAULT_FULLSCREEN: bool = false;
const DEFAULT_SCENE: &str = "library";
const DEFAULT_ASSETS_DIR: &str = "./assets";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Logical world width in world units.
    pub world_width: u32,
    /// Logical world height in world units.
    pub world_height: u32,
    /// Initial window width in pixels.
    pub window_width: u32,
    /// Initial window height in pixels.
    pub window_height: u32,
    pub target_fps: u32,
    pub vsync: bool,
    pub fullscreen: bool,
    /// Built-in scene to start with.
    pub scene_id: String,
    /// Root for background and sheet images.
    pub assets_dir: PathBuf,
    pub particle_capacity: usize,
    pub gravity_mode: GravityMode,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Built-in defaults, reading `./config.ini`.
    pub fn new() -> Self {
        Self {
            world_width: DEFAULT_WORLD_WIDTH,
            world_height: DEFAULT_WORLD_HEIGHT,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            vsync: DEFAULT_VSYNC,
            fullscreen: DEFAULT_FULLSCREEN,
            scene_id: DEFAULT_SCENE.to_string(),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            particle_capacity: DEFAULT_CAPACITY,
            gravity_mode: GravityMode::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Defaults, reading and writing `path` instead.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Keys that are missing or fail to parse keep their current value. Only an
    /// unreadable or malformed file is an error.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [world] section
        if let Some(width) = config.getuint("world", "width").ok().flatten() {
            self.world_width = width as u32;
        }
        if let Some(height) = config.getuint("world", "height").ok().flatten() {
            self.world_height = height as u32;
        }

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }
        if let Some(vsync) = config.getbool("window", "vsync").ok().flatten() {
            self.vsync = vsync;
        }
        if let Some(fullscreen) = config.getbool("window", "fullscreen").ok().flatten() {
            self.fullscreen = fullscreen;
        }

        // [scene] section
        if let Some(id) = config.get("scene", "id") {
            self.scene_id = id.trim().to_string();
        }
        if let Some(dir) = config.get("scene", "assets_dir") {
            self.assets_dir = PathBuf::from(dir.trim());
        }

        // [particles] section
        if let Some(capacity) = config.getuint("particles", "capacity").ok().flatten() {
            self.particle_capacity = capacity as usize;
        }
        if let Some(gravity) = config.get("particles", "gravity") {
            match gravity.parse::<GravityMode>() {
                Ok(mode) => self.gravity_mode = mode,
                Err(e) => warn!("{}; keeping {:?}", e, self.gravity_mode),
            }
        }

        info!(
            "Loaded config: {}x{} world, {}x{} window, fps={}, vsync={}, fullscreen={}",
            self.world_width,
            self.world_height,
            self.window_width,
            self.window_height,
            self.target_fps,
            self.vsync,
            self.fullscreen
        );
        info!(
            "Loaded config: scene={}, particles={} ({:?})",
            self.scene_id, self.particle_capacity, self.gravity_mode
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Every section is written, so the file doubles as documentation.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("world", "width", Some(self.world_width.to_string()));
        config.set("world", "height", Some(self.world_height.to_string()));

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("window", "vsync", Some(self.vsync.to_string()));
        config.set("window", "fullscreen", Some(self.fullscreen.to_string()));

        config.set("scene", "id", Some(self.scene_id.clone()));
        config.set(
            "scene",
            "assets_dir",
            Some(self.assets_dir.display().to_string()),
        );

        config.set("particles", "capacity", Some(self.particle_capacity.to_string()));
        config.set("particles", "gravity", Some(self.gravity_mode.as_str().to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Get the window size.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Get the logical world size as floats.
    pub fn world_size(&self) -> (f32, f32) {
        (self.world_width as f32, self.world_height as f32)
    }
}
