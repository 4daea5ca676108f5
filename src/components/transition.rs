//! Banner and fade sequences.
//!
//! Three independent, strictly linear sequences:
//!
//! | Sequence | Phases |
//! |---|---|
//! | entry | `FadeOut(0.6) -> TitleDisplay(2.0) -> FadeIn(0.8)` |
//! | death | `DeathFlash(0.3) -> DeathText(1.5) -> DeathHold(2.0)` |
//! | victory | `VictoryBanner(1.2) -> VictoryHold(2.5)` |
//!
//! Every sequence ends in [`TransitionPhase::None`]. [`SceneTransition::update`]
//! returns the finished [`TransitionKind`] on the call where the last phase
//! expires, and only then. Starting a sequence replaces whatever was running;
//! the replaced sequence never reports completion.
//!
//! Drawing reads only the phase and its progress.

use log::debug;
use raylib::prelude::{Color, Rectangle, Vector2};

use crate::render::canvas::{Canvas, with_alpha};
use crate::resources::camera::Camera;

/// Tolerance when comparing accumulated phase time against a duration.
const PHASE_EPSILON: f32 = 1e-4;
/// Text height in world pixels; multiplied by the camera scale.
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Entry,
    Death,
    Victory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    #[default]
    None,
    FadeOut,
    TitleDisplay,
    FadeIn,
    DeathFlash,
    DeathText,
    DeathHold,
    VictoryBanner,
    VictoryHold,
}

impl TransitionPhase {
    pub fn duration(self) -> f32 {
        match self {
            TransitionPhase::None => 0.0,
            TransitionPhase::FadeOut => 0.6,
            TransitionPhase::TitleDisplay => 2.0,
            TransitionPhase::FadeIn => 0.8,
            TransitionPhase::DeathFlash => 0.3,
            TransitionPhase::DeathText => 1.5,
            TransitionPhase::DeathHold => 2.0,
            TransitionPhase::VictoryBanner => 1.2,
            TransitionPhase::VictoryHold => 2.5,
        }
    }

    pub fn next(self) -> TransitionPhase {
        match self {
            TransitionPhase::FadeOut => TransitionPhase::TitleDisplay,
            TransitionPhase::TitleDisplay => TransitionPhase::FadeIn,
            TransitionPhase::DeathFlash => TransitionPhase::DeathText,
            TransitionPhase::DeathText => TransitionPhase::DeathHold,
            TransitionPhase::VictoryBanner => TransitionPhase::VictoryHold,
            TransitionPhase::None
            | TransitionPhase::FadeIn
            | TransitionPhase::DeathHold
            | TransitionPhase::VictoryHold => TransitionPhase::None,
        }
    }
}

impl TransitionKind {
    pub fn first_phase(self) -> TransitionPhase {
        match self {
            TransitionKind::Entry => TransitionPhase::FadeOut,
            TransitionKind::Death => TransitionPhase::DeathFlash,
            TransitionKind::Victory => TransitionPhase::VictoryBanner,
        }
    }

    /// Sum of all phase durations.
    pub fn total_duration(self) -> f32 {
        let mut phase = self.first_phase();
        let mut total = 0.0;
        while phase != TransitionPhase::None {
            total += phase.duration();
            phase = phase.next();
        }
        total
    }
}

/// Smoothstep-shaped ease over 0..1.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// What a phase looks like at a given progress.
#[derive(Debug, Clone, Copy)]
pub struct TransitionLook {
    /// Full-screen overlay colour, alpha included.
    pub overlay: Color,
    /// 0..1 opacity of the primary and secondary text.
    pub text_alpha: f32,
    /// 0..1 opacity of the victory banner strip.
    pub banner_alpha: f32,
}

const DEATH_FLASH: Color = Color::new(200, 24, 24, 255);
const NIGHT: Color = Color::new(6, 4, 12, 255);

/// Pure mapping from `(phase, progress)` to the overlay parameters.
pub fn look(phase: TransitionPhase, progress: f32) -> TransitionLook {
    let p = progress.clamp(0.0, 1.0);
    let clear = Color::new(0, 0, 0, 0);
    let (overlay, text_alpha, banner_alpha) = match phase {
        TransitionPhase::None => (clear, 0.0, 0.0),
        TransitionPhase::FadeOut => (with_alpha(NIGHT, p), 0.0, 0.0),
        TransitionPhase::TitleDisplay => {
            // in over the first third, out over the last quarter
            let fade_in = ease_in_out(p * 3.0);
            let fade_out = 1.0 - ease_in_out((p - 0.75) * 4.0);
            (NIGHT, fade_in.min(fade_out), 0.0)
        }
        TransitionPhase::FadeIn => (with_alpha(NIGHT, 1.0 - p), 0.0, 0.0),
        TransitionPhase::DeathFlash => (with_alpha(DEATH_FLASH, 0.8 * (1.0 - p)), 0.0, 0.0),
        TransitionPhase::DeathText => {
            (with_alpha(NIGHT, 0.7 * ease_in_out(p)), ease_in_out(p), 0.0)
        }
        TransitionPhase::DeathHold => (with_alpha(NIGHT, 0.7), 1.0, 0.0),
        TransitionPhase::VictoryBanner => (clear, ease_in_out(p), ease_in_out(p)),
        TransitionPhase::VictoryHold => {
            let out = 1.0 - ease_in_out((p - 0.8) * 5.0);
            (clear, out, out)
        }
    };
    TransitionLook {
        overlay,
        text_alpha,
        banner_alpha,
    }
}

#[derive(Debug, Clone)]
pub struct SceneTransition {
    phase: TransitionPhase,
    elapsed: f32,
    duration: f32,
    title: String,
    subtitle: String,
    text_color: Color,
    kind: Option<TransitionKind>,
}

impl Default for SceneTransition {
    fn default() -> Self {
        Self {
            phase: TransitionPhase::None,
            elapsed: 0.0,
            duration: 0.0,
            title: String::new(),
            subtitle: String::new(),
            text_color: Color::WHITE,
            kind: None,
        }
    }
}

impl SceneTransition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_active(&self) -> bool {
        self.phase != TransitionPhase::None
    }

    pub fn kind(&self) -> Option<TransitionKind> {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn start_entry(&mut self, title: impl Into<String>, subtitle: impl Into<String>) {
        self.start(
            TransitionKind::Entry,
            title.into(),
            subtitle.into(),
            Color::new(240, 220, 160, 255),
        );
    }

    pub fn start_death(&mut self, title: impl Into<String>, subtitle: impl Into<String>) {
        self.start(
            TransitionKind::Death,
            title.into(),
            subtitle.into(),
            Color::new(230, 60, 50, 255),
        );
    }

    pub fn start_victory(&mut self, title: impl Into<String>, subtitle: impl Into<String>) {
        self.start(
            TransitionKind::Victory,
            title.into(),
            subtitle.into(),
            Color::new(255, 214, 90, 255),
        );
    }

    fn start(&mut self, kind: TransitionKind, title: String, subtitle: String, text_color: Color) {
        if let Some(previous) = self.kind {
            debug!("transition {:?} replaced by {:?}", previous, kind);
        }
        self.phase = kind.first_phase();
        self.elapsed = 0.0;
        self.duration = self.phase.duration();
        self.title = title;
        self.subtitle = subtitle;
        self.text_color = text_color;
        self.kind = Some(kind);
    }

    /// Stop without reporting completion.
    pub fn cancel(&mut self) {
        self.phase = TransitionPhase::None;
        self.elapsed = 0.0;
        self.duration = 0.0;
        self.kind = None;
    }

    /// Advance; returns the sequence kind on the call that finishes it.
    pub fn update(&mut self, dt: f32) -> Option<TransitionKind> {
        if self.phase == TransitionPhase::None {
            return None;
        }
        self.elapsed += dt;
        while self.elapsed + PHASE_EPSILON >= self.duration {
            self.elapsed = (self.elapsed - self.duration).max(0.0);
            self.phase = self.phase.next();
            self.duration = self.phase.duration();
            if self.phase == TransitionPhase::None {
                self.elapsed = 0.0;
                let done = self.kind.take();
                debug!("transition {:?} finished", done);
                return done;
            }
        }
        None
    }

    /// Draw over the whole viewport. Expects a screen-space canvas.
    pub fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera) {
        if !self.is_active() {
            return;
        }
        let l = look(self.phase, self.progress());
        let (vw, vh) = (camera.viewport_width, camera.viewport_height);
        let scale = camera.scale.max(1.0);
        canvas.save();

        if l.overlay.a > 0 {
            canvas.fill_rect(Rectangle::new(0.0, 0.0, vw, vh), l.overlay);
        }
        if l.banner_alpha > 0.0 {
            let h = 40.0 * scale;
            canvas.fill_rect(
                Rectangle::new(0.0, (vh - h) / 2.0, vw, h),
                with_alpha(Color::new(20, 14, 40, 220), l.banner_alpha),
            );
        }
        if l.text_alpha > 0.0 {
            let title_size = TITLE_SIZE * scale;
            let sub_size = SUBTITLE_SIZE * scale;
            let cy = vh / 2.0;
            canvas.set_alpha(l.text_alpha);
            self.centered(canvas, &self.title, vw, cy - title_size * 0.75, title_size);
            if !self.subtitle.is_empty() {
                self.centered(canvas, &self.subtitle, vw, cy + title_size * 0.5, sub_size);
            }
        }
        canvas.restore();
    }

    fn centered(&self, canvas: &mut dyn Canvas, text: &str, vw: f32, y: f32, size: f32) {
        let w = canvas.measure_text(text, size);
        let pos = Vector2 {
            x: ((vw - w) / 2.0).round(),
            y: y.round(),
        };
        canvas.draw_text(text, pos, size, self.text_color);
    }
}
