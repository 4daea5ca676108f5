//! World-to-viewport camera.
//!
//! The scene is authored in a fixed logical world rectangle (for example
//! 320x180). The camera maps that rectangle onto whatever physical surface the
//! window currently has:
//!
//! - a uniform scale `min(vw / ww, vh / wh)`; values >= 1 are floored to an
//!   integer so pixel art stays crisp, values below 1 are kept fractional
//! - integer offsets that center the scaled world in the viewport
//! - the bars outside the world rectangle are filled by [`Camera::draw_letterbox`]

use bevy_ecs::prelude::Resource;
use raylib::prelude::{Color, Rectangle, Vector2};

use crate::render::canvas::{Canvas, Transform2D};

/// Shared camera resource. Call [`Camera::resize`] whenever the window changes.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Camera {
    pub world_width: f32,
    pub world_height: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Camera {
    /// Create a camera for the given world size. The viewport starts equal to
    /// the world (scale 1, no offset).
    pub fn new(world_width: f32, world_height: f32) -> Self {
        let mut cam = Self {
            world_width,
            world_height,
            viewport_width: world_width,
            viewport_height: world_height,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        cam.resize(world_width, world_height);
        cam
    }

    /// Recompute scale and centering for a new viewport size.
    ///
    /// A zero-sized viewport produces a scale of zero; that state is tolerated
    /// but nothing meaningful can be drawn until a positive size arrives.
    pub fn resize(&mut self, viewport_width: f32, viewport_height: f32) {
        self.viewport_width = viewport_width;
        self.viewport_height = viewport_height;

        let scale_x = viewport_width / self.world_width;
        let scale_y = viewport_height / self.world_height;
        let mut scale = scale_x.min(scale_y);
        if !scale.is_finite() {
            scale = 0.0;
        }
        if scale >= 1.0 {
            scale = scale.floor();
        }
        self.scale = scale;

        self.offset_x = ((viewport_width - self.world_width * scale) / 2.0).round();
        self.offset_y = ((viewport_height - self.world_height * scale) / 2.0).round();
    }

    pub fn world_to_screen(&self, p: Vector2) -> Vector2 {
        Vector2 {
            x: p.x * self.scale + self.offset_x,
            y: p.y * self.scale + self.offset_y,
        }
    }

    /// Inverse of [`Camera::world_to_screen`]. Returns the world origin while the
    /// scale is not positive.
    pub fn screen_to_world(&self, p: Vector2) -> Vector2 {
        if self.scale <= 0.0 {
            return Vector2 { x: 0.0, y: 0.0 };
        }
        Vector2 {
            x: (p.x - self.offset_x) / self.scale,
            y: (p.y - self.offset_y) / self.scale,
        }
    }

    /// The world rectangle in screen pixels.
    pub fn world_rect(&self) -> Rectangle {
        Rectangle {
            x: self.offset_x,
            y: self.offset_y,
            width: self.world_width * self.scale,
            height: self.world_height * self.scale,
        }
    }

    pub fn transform(&self) -> Transform2D {
        Transform2D::new(self.scale, self.offset_x, self.offset_y)
    }

    /// Switch `canvas` to world-space coordinates.
    pub fn apply_transform(&self, canvas: &mut dyn Canvas) {
        canvas.set_transform(self.transform());
    }

    /// Switch `canvas` back to raw screen pixels.
    pub fn reset_transform(&self, canvas: &mut dyn Canvas) {
        canvas.set_transform(Transform2D::IDENTITY);
    }

    /// The up to four bars outside the world rectangle, in screen pixels.
    /// Empty bars are omitted.
    pub fn letterbox_bars(&self) -> Vec<Rectangle> {
        let world = self.world_rect();
        let right = world.x + world.width;
        let bottom = world.y + world.height;
        let candidates = [
            // top
            Rectangle::new(0.0, 0.0, self.viewport_width, world.y),
            // bottom
            Rectangle::new(0.0, bottom, self.viewport_width, self.viewport_height - bottom),
            // left
            Rectangle::new(0.0, world.y, world.x, world.height),
            // right
            Rectangle::new(right, world.y, self.viewport_width - right, world.height),
        ];
        candidates
            .into_iter()
            .filter(|r| r.width > 0.0 && r.height > 0.0)
            .collect()
    }

    /// Fill the letterbox/pillarbox bars. Expects a screen-space canvas.
    pub fn draw_letterbox(&self, canvas: &mut dyn Canvas, color: Color) {
        for bar in self.letterbox_bars() {
            canvas.fill_rect(bar, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn integer_scale_when_upscaling() {
        let mut cam = Camera::new(320.0, 180.0);
        cam.resize(1000.0, 600.0); // 3.125 x 3.33 -> 3
        assert!(approx_eq(cam.scale, 3.0));
        assert!(approx_eq(cam.offset_x, 20.0));
        assert!(approx_eq(cam.offset_y, 30.0));
    }

    #[test]
    fn fractional_scale_when_downscaling() {
        let mut cam = Camera::new(320.0, 180.0);
        cam.resize(160.0, 180.0);
        assert!(approx_eq(cam.scale, 0.5));
        assert!(approx_eq(cam.offset_x, 0.0));
        assert!(approx_eq(cam.offset_y, 45.0));
    }

    #[test]
    fn offsets_are_rounded() {
        let mut cam = Camera::new(320.0, 180.0);
        cam.resize(641.0, 361.0);
        assert!(approx_eq(cam.scale, 2.0));
        assert_eq!(cam.offset_x, cam.offset_x.round());
        assert_eq!(cam.offset_y, cam.offset_y.round());
    }

    #[test]
    fn round_trip_recovers_world_points() {
        let sizes = [
            (320.0, 180.0),
            (1280.0, 720.0),
            (1920.0, 1200.0),
            (333.0, 777.0),
            (200.0, 90.0),
            (3841.0, 2161.0),
        ];
        let mut cam = Camera::new(320.0, 180.0);
        for (w, h) in sizes {
            cam.resize(w, h);
            for i in 0..=16 {
                for j in 0..=9 {
                    let p = Vector2 {
                        x: i as f32 * 20.0,
                        y: j as f32 * 20.0,
                    };
                    let back = cam.screen_to_world(cam.world_to_screen(p));
                    assert!(approx_eq(back.x, p.x), "{w}x{h}: {} vs {}", back.x, p.x);
                    assert!(approx_eq(back.y, p.y), "{w}x{h}: {} vs {}", back.y, p.y);
                }
            }
        }
    }

    #[test]
    fn zero_viewport_is_tolerated() {
        let mut cam = Camera::new(320.0, 180.0);
        cam.resize(0.0, 0.0);
        assert!(cam.scale <= 0.0);
        let p = cam.screen_to_world(Vector2 { x: 10.0, y: 10.0 });
        assert!(p.x.is_finite() && p.y.is_finite());
        assert!(cam.letterbox_bars().is_empty());
    }

    #[test]
    fn letterbox_bars_cover_everything_outside_world() {
        let mut cam = Camera::new(320.0, 180.0);
        cam.resize(1000.0, 600.0);
        let bars = cam.letterbox_bars();
        assert_eq!(bars.len(), 4);
        let world = cam.world_rect();
        let bar_area: f32 = bars.iter().map(|b| b.width * b.height).sum();
        let total = 1000.0 * 600.0;
        assert!(approx_eq(bar_area + world.width * world.height, total));
    }

    #[test]
    fn exact_fit_has_no_bars() {
        let mut cam = Camera::new(320.0, 180.0);
        cam.resize(1280.0, 720.0);
        assert!(cam.letterbox_bars().is_empty());
    }
}
