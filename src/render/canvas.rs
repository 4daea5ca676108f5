//! Drawing surface abstraction.
//!
//! Scene code never talks to raylib directly: it draws through the [`Canvas`]
//! trait, which carries a small piece of mutable state (transform, alpha and
//! blend mode) with explicit `save`/`restore` bracketing. Every drawing routine
//! is expected to restore whatever it changed before returning so siblings in
//! the draw order never observe leaked state.
//!
//! Two implementations exist:
//! - [`crate::render::raylib_canvas::RaylibCanvas`] – draws with a raylib draw handle
//! - [`crate::render::recording::RecordingCanvas`] – records operations for tests

use raylib::prelude::{Color, Rectangle, Vector2};
use smallvec::SmallVec;

use crate::resources::assetstore::SpriteData;

/// Uniform scale followed by a translation, mapping the current coordinate
/// space onto physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub scale: f32,
    pub offset: Vector2,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        scale: 1.0,
        offset: Vector2 { x: 0.0, y: 0.0 },
    };

    pub fn new(scale: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            scale,
            offset: Vector2 {
                x: offset_x,
                y: offset_y,
            },
        }
    }

    /// Map a point into physical pixels.
    pub fn apply(&self, p: Vector2) -> Vector2 {
        Vector2 {
            x: p.x * self.scale + self.offset.x,
            y: p.y * self.scale + self.offset.y,
        }
    }

    /// Map a rectangle into physical pixels.
    pub fn apply_rect(&self, r: Rectangle) -> Rectangle {
        let tl = self.apply(Vector2 { x: r.x, y: r.y });
        Rectangle {
            x: tl.x,
            y: tl.y,
            width: r.width * self.scale,
            height: r.height * self.scale,
        }
    }
}

/// Compositing mode for subsequent draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blend {
    #[default]
    Alpha,
    Additive,
}

/// The fixed layers a scene frame is composed of, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawLayer {
    Background,
    Floor,
    BackProps,
    Character,
    ForeProps,
    Particles,
    Lighting,
    DamageFlash,
    Vignette,
    /// Marker: the canvas switches from world space to screen space here.
    ScreenSpace,
    Letterbox,
    UiText,
    Transition,
}

impl DrawLayer {
    pub const ORDER: [DrawLayer; 13] = [
        DrawLayer::Background,
        DrawLayer::Floor,
        DrawLayer::BackProps,
        DrawLayer::Character,
        DrawLayer::ForeProps,
        DrawLayer::Particles,
        DrawLayer::Lighting,
        DrawLayer::DamageFlash,
        DrawLayer::Vignette,
        DrawLayer::ScreenSpace,
        DrawLayer::Letterbox,
        DrawLayer::UiText,
        DrawLayer::Transition,
    ];

    /// True for layers drawn after the switch to screen coordinates.
    pub fn is_screen_space(self) -> bool {
        matches!(
            self,
            DrawLayer::ScreenSpace
                | DrawLayer::Letterbox
                | DrawLayer::UiText
                | DrawLayer::Transition
        )
    }
}

/// Mutable drawing state saved and restored as a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasState {
    pub transform: Transform2D,
    pub alpha: f32,
    pub blend: Blend,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Transform2D::IDENTITY,
            alpha: 1.0,
            blend: Blend::Alpha,
        }
    }
}

/// Save/restore stack shared by canvas implementations.
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    pub current: CanvasState,
    saved: SmallVec<[CanvasState; 8]>,
}

impl StateStack {
    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    /// Pop the last saved state. An unbalanced restore resets to defaults.
    pub fn restore(&mut self) -> CanvasState {
        self.current = self.saved.pop().unwrap_or_default();
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

/// Scale a colour's alpha channel by `alpha` (0..1).
pub fn with_alpha(color: Color, alpha: f32) -> Color {
    let a = (color.a as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
    Color::new(color.r, color.g, color.b, a)
}

/// Linear blend between two colours.
pub fn mix(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let l = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color::new(l(a.r, b.r), l(a.g, b.g), l(a.b, b.b), l(a.a, b.a))
}

/// A drawing surface with save/restore state discipline.
///
/// Coordinates passed to drawing methods are in the space selected by the
/// current transform (world units after [`Camera::apply_transform`], pixels
/// after [`Camera::reset_transform`]).
///
/// [`Camera::apply_transform`]: crate::resources::camera::Camera::apply_transform
/// [`Camera::reset_transform`]: crate::resources::camera::Camera::reset_transform
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);

    fn transform(&self) -> Transform2D;
    fn set_transform(&mut self, transform: Transform2D);

    /// Set the global alpha multiplier applied to every subsequent draw.
    fn set_alpha(&mut self, alpha: f32);
    fn set_blend(&mut self, blend: Blend);

    fn fill_rect(&mut self, rect: Rectangle, color: Color);
    fn fill_circle(&mut self, center: Vector2, radius: f32, color: Color);
    /// Radial gradient from `inner` at the centre to `outer` at `radius`.
    fn radial_glow(&mut self, center: Vector2, radius: f32, inner: Color, outer: Color);
    fn draw_text(&mut self, text: &str, pos: Vector2, size: f32, color: Color);
    /// Width of `text` in current units.
    fn measure_text(&self, text: &str, size: f32) -> f32;
    /// Draw a slice of a loaded image. Missing images are skipped.
    fn draw_image(&mut self, key: &str, src: Rectangle, dest: Rectangle, flip_h: bool);

    /// Draw procedural pixel data with its top-left corner at `pos`, one pixel
    /// per unit.
    fn draw_sprite(&mut self, sprite: &SpriteData, pos: Vector2, flip_h: bool) {
        let w = sprite.width as usize;
        for (i, px) in sprite.pixels.iter().enumerate() {
            let Some(color) = px else {
                continue;
            };
            let (col, row) = (i % w, i / w);
            let col = if flip_h { w - 1 - col } else { col };
            self.fill_rect(
                Rectangle {
                    x: pos.x + col as f32,
                    y: pos.y + row as f32,
                    width: 1.0,
                    height: 1.0,
                },
                *color,
            );
        }
    }

    /// Hook called at the start of every layer. Used by diagnostics.
    fn begin_layer(&mut self, _layer: DrawLayer) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn transform_applies_scale_then_offset() {
        let t = Transform2D::new(3.0, 10.0, 20.0);
        let p = t.apply(Vector2 { x: 2.0, y: 1.0 });
        assert!(approx_eq(p.x, 16.0));
        assert!(approx_eq(p.y, 23.0));
        let r = t.apply_rect(Rectangle::new(1.0, 1.0, 4.0, 2.0));
        assert!(approx_eq(r.x, 13.0));
        assert!(approx_eq(r.width, 12.0));
        assert!(approx_eq(r.height, 6.0));
    }

    #[test]
    fn state_stack_restores_in_lifo_order() {
        let mut stack = StateStack::default();
        stack.current.alpha = 0.5;
        stack.save();
        stack.current.alpha = 0.25;
        stack.save();
        stack.current.blend = Blend::Additive;
        assert_eq!(stack.depth(), 2);
        assert!(approx_eq(stack.restore().alpha, 0.25));
        assert_eq!(stack.current.blend, Blend::Alpha);
        assert!(approx_eq(stack.restore().alpha, 0.5));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn unbalanced_restore_resets_to_default() {
        let mut stack = StateStack::default();
        stack.current.alpha = 0.1;
        let s = stack.restore();
        assert!(approx_eq(s.alpha, 1.0));
    }

    #[test]
    fn with_alpha_scales_existing_alpha() {
        let c = with_alpha(Color::new(10, 20, 30, 200), 0.5);
        assert_eq!(c.a, 100);
        assert_eq!(c.r, 10);
    }

    #[test]
    fn layer_order_has_thirteen_steps_ending_with_transition() {
        assert_eq!(DrawLayer::ORDER.len(), 13);
        assert_eq!(DrawLayer::ORDER[0], DrawLayer::Background);
        assert_eq!(DrawLayer::ORDER[12], DrawLayer::Transition);
        let first_screen = DrawLayer::ORDER
            .iter()
            .position(|l| l.is_screen_space())
            .unwrap();
        assert_eq!(DrawLayer::ORDER[first_screen], DrawLayer::ScreenSpace);
        assert!(DrawLayer::ORDER[first_screen..].iter().all(|l| l.is_screen_space()));
    }
}
