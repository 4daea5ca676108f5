//! Asset lookup keyed by string identifiers.
//!
//! Two kinds of assets exist:
//! - procedural sprites ([`SpriteData`]): pixel grids generated in code,
//!   always available
//! - images ([`ImageInfo`]): files loaded in the background by
//!   [`crate::resources::assetloader`]; only visible through [`AssetLookup::image`]
//!   once their texture is uploaded
//!
//! Scene code only ever asks "given a key, what do I draw?" through
//! [`AssetLookup`]; it never triggers I/O itself.

use bevy_ecs::prelude::Resource;
use raylib::prelude::Color;
use rustc_hash::FxHashMap;

/// Procedural pixel data. `None` pixels are transparent.
#[derive(Debug, Clone)]
pub struct SpriteData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Option<Color>>,
}

impl SpriteData {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; (width * height) as usize],
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize]
    }

    /// Set one pixel; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize] = Some(color);
    }

    pub fn fill(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, color);
            }
        }
    }

    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_some()).count()
    }
}

/// Dimensions of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Load state of an image key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSlot {
    Pending,
    Ready(ImageInfo),
    Failed(String),
}

/// Read access to assets by key.
pub trait AssetLookup {
    fn sprite(&self, key: &str) -> Option<&SpriteData>;
    /// `Some` only once the image is loaded and drawable.
    fn image(&self, key: &str) -> Option<ImageInfo>;

    fn image_ready(&self, key: &str) -> bool {
        self.image(key).is_some()
    }
}

/// Registry of procedural sprites and image load states.
#[derive(Resource, Debug, Default)]
pub struct AssetStore {
    sprites: FxHashMap<String, SpriteData>,
    images: FxHashMap<String, ImageSlot>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sprite(&mut self, key: impl Into<String>, sprite: SpriteData) {
        self.sprites.insert(key.into(), sprite);
    }

    pub fn extend_sprites(&mut self, sprites: impl IntoIterator<Item = (String, SpriteData)>) {
        self.sprites.extend(sprites);
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn mark_pending(&mut self, key: impl Into<String>) {
        self.images.insert(key.into(), ImageSlot::Pending);
    }

    pub fn mark_ready(&mut self, key: impl Into<String>, info: ImageInfo) {
        self.images.insert(key.into(), ImageSlot::Ready(info));
    }

    pub fn mark_failed(&mut self, key: impl Into<String>, error: impl Into<String>) {
        self.images.insert(key.into(), ImageSlot::Failed(error.into()));
    }

    pub fn image_slot(&self, key: &str) -> Option<&ImageSlot> {
        self.images.get(key)
    }

    /// Forget every image, e.g. when the scene that requested them is destroyed.
    pub fn clear_images(&mut self) {
        self.images.clear();
    }
}

impl AssetLookup for AssetStore {
    fn sprite(&self, key: &str) -> Option<&SpriteData> {
        self.sprites.get(key)
    }

    fn image(&self, key: &str) -> Option<ImageInfo> {
        match self.images.get(key) {
            Some(ImageSlot::Ready(info)) => Some(*info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_is_only_visible_once_ready() {
        let mut store = AssetStore::new();
        assert!(store.image("bg").is_none());
        store.mark_pending("bg");
        assert!(!store.image_ready("bg"));
        store.mark_ready(
            "bg",
            ImageInfo {
                width: 320,
                height: 180,
            },
        );
        assert_eq!(store.image("bg").map(|i| i.width), Some(320));
    }

    #[test]
    fn failed_image_stays_unavailable() {
        let mut store = AssetStore::new();
        store.mark_failed("sheet", "no such file");
        assert!(store.image("sheet").is_none());
        assert!(matches!(store.image_slot("sheet"), Some(ImageSlot::Failed(_))));
    }

    #[test]
    fn sprite_set_ignores_out_of_bounds() {
        let mut s = SpriteData::new(2, 2);
        s.set(-1, 0, Color::WHITE);
        s.set(2, 1, Color::WHITE);
        s.set(1, 1, Color::WHITE);
        assert_eq!(s.opaque_count(), 1);
        assert!(s.get(1, 1).is_some());
        assert!(s.get(5, 5).is_none());
    }
}
