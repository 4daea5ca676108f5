//! Image asset requests and main-thread texture upload.
//!
//! [`request_scene_assets`] asks the [`AssetLoader`] thread for every image
//! the current scene wants. [`upload_loaded_assets`] runs once per frame on
//! the main thread: it takes the finished loads, drops the ones requested by
//! an older scene generation, and turns the rest into textures through a
//! [`TextureUploader`]. Whatever fails leaves the scene on its procedural
//! fallback.

use std::ffi::CString;

use bevy_ecs::prelude::*;
use log::{debug, info, warn};
use raylib::prelude::*;

use crate::resources::assetloader::{AssetLoader, LoadedAsset};
use crate::resources::assetstore::{AssetStore, ImageInfo};
use crate::resources::gameconfig::GameConfig;
use crate::resources::scenemanager::SceneManager;
use crate::resources::texturestore::TextureStore;

/// Turns encoded image bytes into a drawable texture stored under `key`.
pub trait TextureUploader {
    fn upload(
        &mut self,
        textures: &mut TextureStore,
        key: &str,
        bytes: &[u8],
        extension: &str,
    ) -> Result<ImageInfo, String>;
}

/// Uploads through raylib. Needs the window's GL context.
pub struct RaylibUploader<'a> {
    pub rl: &'a mut RaylibHandle,
    pub thread: &'a RaylibThread,
}

impl TextureUploader for RaylibUploader<'_> {
    fn upload(
        &mut self,
        textures: &mut TextureStore,
        key: &str,
        bytes: &[u8],
        extension: &str,
    ) -> Result<ImageInfo, String> {
        let c_ext = CString::new(extension).map_err(|e| e.to_string())?;
        let image = unsafe {
            let raw = ffi::LoadImageFromMemory(c_ext.as_ptr(), bytes.as_ptr(), bytes.len() as i32);
            if raw.data.is_null() {
                return Err(format!("could not decode {} bytes as {}", bytes.len(), extension));
            }
            Image::from_raw(raw)
        };
        let texture = self
            .rl
            .load_texture_from_image(self.thread, &image)
            .map_err(|e| e.to_string())?;
        let info = ImageInfo {
            width: texture.width.max(0) as u32,
            height: texture.height.max(0) as u32,
        };
        textures.insert(key, texture);
        Ok(info)
    }
}

/// Mark every scene image pending and queue it on the loader.
pub fn request_scene_assets(world: &mut World) {
    let assets_dir = world.resource::<GameConfig>().assets_dir.clone();
    let (requests, generation) = {
        let scene = world.resource::<SceneManager>();
        (scene.asset_requests(), scene.generation())
    };
    let Some(loader) = world.get_resource::<AssetLoader>() else {
        debug!("no asset loader, staying procedural");
        return;
    };
    let mut queued = Vec::new();
    for (key, path) in requests {
        if loader.request(key.clone(), assets_dir.join(&path), generation) {
            queued.push(key);
        }
    }
    let mut store = world.resource_mut::<AssetStore>();
    for key in queued {
        store.mark_pending(key);
    }
}

/// Upload finished loads. Returns the number of textures created.
pub fn upload_loaded_assets(world: &mut World, uploader: &mut dyn TextureUploader) -> usize {
    let loaded: Vec<LoadedAsset> = match world.get_resource::<AssetLoader>() {
        Some(loader) => loader.drain(),
        None => return 0,
    };
    if loaded.is_empty() {
        return 0;
    }
    let generation = world.get_resource::<SceneManager>().map(|s| s.generation());

    let mut uploaded = 0;
    for item in loaded {
        if Some(item.generation) != generation {
            debug!(
                "ignoring '{}' from generation {} (current {:?})",
                item.key, item.generation, generation
            );
            continue;
        }
        let result = match &item.bytes {
            Ok(bytes) => {
                let mut textures = world.resource_mut::<TextureStore>();
                uploader.upload(&mut textures, &item.key, bytes, &item.extension())
            }
            Err(e) => Err(e.clone()),
        };
        match result {
            Ok(info) => {
                info!("loaded '{}' ({}x{})", item.key, info.width, info.height);
                world.resource_mut::<AssetStore>().mark_ready(item.key.clone(), info);
                if let Some(scene) = world.get_resource::<SceneManager>() {
                    scene.on_image_ready(&item.key, info);
                }
                uploaded += 1;
            }
            Err(e) => {
                warn!("'{}' unavailable, using procedural art: {}", item.key, e);
                world.resource_mut::<AssetStore>().mark_failed(item.key, e);
            }
        }
    }
    uploaded
}
