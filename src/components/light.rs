//! Point lights composited in the lighting layer.

use raylib::prelude::{Color, Vector2};

use crate::render::canvas::{Blend, Canvas, with_alpha};

#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub position: Vector2,
    pub radius: f32,
    pub color: Color,
    /// 0..1 strength of the glow's centre.
    pub intensity: f32,
    /// Amplitude of the flicker; 0 for a steady light.
    pub flicker: f32,
    /// Phase offset so neighbouring lights do not pulse together.
    pub phase: f32,
}

impl Light {
    pub fn new(x: f32, y: f32, radius: f32, color: Color, intensity: f32) -> Self {
        Self {
            position: Vector2 { x, y },
            radius,
            color,
            intensity,
            flicker: 0.0,
            phase: 0.0,
        }
    }

    pub fn with_flicker(mut self, flicker: f32, phase: f32) -> Self {
        self.flicker = flicker;
        self.phase = phase;
        self
    }

    /// Intensity at scene time `t`, in 0..1.
    pub fn intensity_at(&self, t: f32) -> f32 {
        if self.flicker <= 0.0 {
            return self.intensity.clamp(0.0, 1.0);
        }
        // Two incommensurate sines read as candle flicker.
        let wobble = (t * 7.3 + self.phase).sin() * 0.6 + (t * 17.9 + self.phase * 2.0).sin() * 0.4;
        (self.intensity * (1.0 + wobble * self.flicker)).clamp(0.0, 1.0)
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, t: f32) {
        let k = self.intensity_at(t);
        if k <= 0.0 || self.radius <= 0.0 {
            return;
        }
        canvas.save();
        canvas.set_blend(Blend::Additive);
        canvas.radial_glow(
            self.position,
            self.radius,
            with_alpha(self.color, k),
            with_alpha(self.color, 0.0),
        );
        canvas.restore();
    }
}
