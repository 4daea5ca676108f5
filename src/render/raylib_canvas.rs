//! [`Canvas`] implementation on top of a raylib draw handle.
//!
//! Geometry is mapped through the current [`Transform2D`] before it reaches
//! raylib, so raylib itself always draws in window pixels. Blend changes are
//! applied lazily right before the next draw call.

use std::ffi::CString;

use raylib::prelude::*;

use super::canvas::{Blend, Canvas, StateStack, Transform2D, with_alpha};
use crate::resources::texturestore::TextureStore;

pub struct RaylibCanvas<'a, 'b> {
    d: &'a mut RaylibDrawHandle<'b>,
    textures: &'a TextureStore,
    stack: StateStack,
    applied: Blend,
}

impl<'a, 'b> RaylibCanvas<'a, 'b> {
    pub fn new(d: &'a mut RaylibDrawHandle<'b>, textures: &'a TextureStore) -> Self {
        Self {
            d,
            textures,
            stack: StateStack::default(),
            applied: Blend::Alpha,
        }
    }

    fn tint(&self, color: Color) -> Color {
        with_alpha(color, self.stack.current.alpha)
    }

    fn sync_blend(&mut self) {
        let wanted = self.stack.current.blend;
        if wanted == self.applied {
            return;
        }
        let mode = match wanted {
            Blend::Alpha => BlendMode::BLEND_ALPHA,
            Blend::Additive => BlendMode::BLEND_ADDITIVE,
        };
        unsafe {
            ffi::EndBlendMode();
            if wanted != Blend::Alpha {
                ffi::BeginBlendMode(mode as i32);
            }
        }
        self.applied = wanted;
    }
}

impl Drop for RaylibCanvas<'_, '_> {
    fn drop(&mut self) {
        if self.applied != Blend::Alpha {
            unsafe { ffi::EndBlendMode() };
        }
    }
}

impl Canvas for RaylibCanvas<'_, '_> {
    fn save(&mut self) {
        self.stack.save();
    }

    fn restore(&mut self) {
        self.stack.restore();
    }

    fn transform(&self) -> Transform2D {
        self.stack.current.transform
    }

    fn set_transform(&mut self, transform: Transform2D) {
        self.stack.current.transform = transform;
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.stack.current.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_blend(&mut self, blend: Blend) {
        self.stack.current.blend = blend;
    }

    fn fill_rect(&mut self, rect: Rectangle, color: Color) {
        self.sync_blend();
        let rect = self.stack.current.transform.apply_rect(rect);
        let color = self.tint(color);
        self.d.draw_rectangle_rec(rect, color);
    }

    fn fill_circle(&mut self, center: Vector2, radius: f32, color: Color) {
        self.sync_blend();
        let t = self.stack.current.transform;
        let color = self.tint(color);
        self.d.draw_circle_v(t.apply(center), radius * t.scale, color);
    }

    fn radial_glow(&mut self, center: Vector2, radius: f32, inner: Color, outer: Color) {
        self.sync_blend();
        let t = self.stack.current.transform;
        let c = t.apply(center);
        let (inner, outer) = (self.tint(inner), self.tint(outer));
        self.d
            .draw_circle_gradient(c.x as i32, c.y as i32, radius * t.scale, inner, outer);
    }

    fn draw_text(&mut self, text: &str, pos: Vector2, size: f32, color: Color) {
        self.sync_blend();
        let t = self.stack.current.transform;
        let p = t.apply(pos);
        let color = self.tint(color);
        self.d
            .draw_text(text, p.x as i32, p.y as i32, (size * t.scale).round() as i32, color);
    }

    fn measure_text(&self, text: &str, size: f32) -> f32 {
        let scale = self.stack.current.transform.scale;
        if scale <= 0.0 {
            return 0.0;
        }
        let Ok(c_text) = CString::new(text) else {
            return 0.0;
        };
        let px = unsafe { ffi::MeasureText(c_text.as_ptr(), (size * scale).round() as i32) };
        px as f32 / scale
    }

    fn draw_image(&mut self, key: &str, src: Rectangle, dest: Rectangle, flip_h: bool) {
        let Some(texture) = self.textures.get(key) else {
            return;
        };
        self.sync_blend();
        let mut src = src;
        if flip_h {
            src.width = -src.width;
        }
        let dest = self.stack.current.transform.apply_rect(dest);
        let tint = self.tint(Color::WHITE);
        self.d
            .draw_texture_pro(texture, src, dest, Vector2 { x: 0.0, y: 0.0 }, 0.0, tint);
    }
}
