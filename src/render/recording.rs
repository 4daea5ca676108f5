//! Canvas that records draw operations instead of rasterizing them.
//!
//! Used by tests and by the `--headless` smoke run to inspect layer order,
//! emitted text and save/restore balance without opening a window.

use raylib::prelude::{Color, Rectangle, Vector2};

use super::canvas::{Blend, Canvas, DrawLayer, StateStack, Transform2D, with_alpha};

/// A single recorded operation. Geometry is stored in physical pixels.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Layer(DrawLayer),
    Rect {
        rect: Rectangle,
        color: Color,
        blend: Blend,
    },
    Circle {
        center: Vector2,
        radius: f32,
        color: Color,
    },
    Glow {
        center: Vector2,
        radius: f32,
        inner: Color,
    },
    Text {
        text: String,
        pos: Vector2,
        size: f32,
        color: Color,
    },
    Image {
        key: String,
        src: Rectangle,
        dest: Rectangle,
        flip_h: bool,
    },
}

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    stack: StateStack,
    ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Layers in the order they were started.
    pub fn layers(&self) -> Vec<DrawLayer> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Layer(l) => Some(*l),
                _ => None,
            })
            .collect()
    }

    /// Every text string drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<&DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .collect()
    }

    /// Operations recorded between the start of `layer` and the next layer.
    pub fn ops_in_layer(&self, layer: DrawLayer) -> Vec<&DrawOp> {
        let mut out = Vec::new();
        let mut inside = false;
        for op in &self.ops {
            if let DrawOp::Layer(l) = op {
                inside = *l == layer;
                continue;
            }
            if inside {
                out.push(op);
            }
        }
        out
    }

    /// Number of `save` calls still awaiting a `restore`.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    fn tint(&self, color: Color) -> Color {
        with_alpha(color, self.stack.current.alpha)
    }
}

impl Canvas for RecordingCanvas {
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
        let rect = self.stack.current.transform.apply_rect(rect);
        let color = self.tint(color);
        let blend = self.stack.current.blend;
        self.ops.push(DrawOp::Rect { rect, color, blend });
    }

    fn fill_circle(&mut self, center: Vector2, radius: f32, color: Color) {
        let t = self.stack.current.transform;
        self.ops.push(DrawOp::Circle {
            center: t.apply(center),
            radius: radius * t.scale,
            color: self.tint(color),
        });
    }

    fn radial_glow(&mut self, center: Vector2, radius: f32, inner: Color, _outer: Color) {
        let t = self.stack.current.transform;
        self.ops.push(DrawOp::Glow {
            center: t.apply(center),
            radius: radius * t.scale,
            inner: self.tint(inner),
        });
    }

    fn draw_text(&mut self, text: &str, pos: Vector2, size: f32, color: Color) {
        let t = self.stack.current.transform;
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            pos: t.apply(pos),
            size: size * t.scale,
            color: self.tint(color),
        });
    }

    fn measure_text(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.6
    }

    fn draw_image(&mut self, key: &str, src: Rectangle, dest: Rectangle, flip_h: bool) {
        let dest = self.stack.current.transform.apply_rect(dest);
        self.ops.push(DrawOp::Image {
            key: key.to_string(),
            src,
            dest,
            flip_h,
        });
    }

    fn begin_layer(&mut self, layer: DrawLayer) {
        self.ops.push(DrawOp::Layer(layer));
    }
}
