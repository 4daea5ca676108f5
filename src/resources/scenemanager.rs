//! Scene orchestration.
//!
//! [`SceneManager`] owns everything that lives in one scene: the character,
//! the particle pool, the lights and the banner transitions. It is built from
//! a [`SceneConfig`] and driven from outside with three calls:
//!
//! - [`SceneManager::set_animation_state`] when an agent event arrives
//! - [`SceneManager::update`] once per frame with the clamped delta and the
//!   wall-clock reading
//! - [`SceneManager::draw`] once per frame, composing the fixed
//!   [`DrawLayer::ORDER`]
//!
//! Some reactions happen later than the event that caused them (the fallback
//! to idle after the entry walk, the victory banner). Those are stored as
//! wall-clock deadlines tagged with the state epoch they were scheduled in; a
//! newer state change makes them stale and they are dropped when due.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::Resource;
use log::{debug, info};
use raylib::prelude::{Color, Rectangle, Vector2};
use smallvec::SmallVec;

use crate::components::animationstate::AnimationState;
use crate::components::character::{CharacterController, SheetLayout};
use crate::components::light::Light;
use crate::components::particles::{EmitterConfig, ParticleSystem};
use crate::components::transition::{SceneTransition, TransitionKind};
use crate::render::canvas::{Blend, Canvas, DrawLayer, mix, with_alpha};
use crate::resources::assetstore::{AssetLookup, ImageInfo};
use crate::resources::camera::Camera;
use crate::resources::scenecatalog::{
    Decoration, FLOOR_Y, MAX_LIGHTS, PropLayer, SceneConfig, SceneError,
};
use crate::resources::sprites::{wizard_animations, wizard_sheet_animator};

/// Wall-clock delay between the end of the entry walk request and the
/// fallback to idle.
pub const ENTER_IDLE_DELAY: f64 = 1.5;
/// Wall-clock delay between the victory animation and its banner.
pub const VICTORY_BANNER_DELAY: f64 = 1.0;
/// Seconds the red stagger overlay stays visible.
pub const DAMAGE_FLASH: f32 = 0.35;

const STAGGER_BURST: usize = 24;
const VICTORY_BURST: usize = 48;
/// Top of the procedural floor.
const FLOOR_TOP: f32 = FLOOR_Y - 10.0;
const UI_TEXT_SIZE: f32 = 8.0;
/// Longest status message kept; the line never shows more than this.
pub const STATUS_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredKind {
    EnterToIdle,
    VictoryBanner,
}

#[derive(Debug, Clone, Copy)]
struct Deferred {
    at: f64,
    kind: DeferredKind,
    epoch: u64,
}

#[derive(Resource, Debug)]
pub struct SceneManager {
    config: SceneConfig,
    world: Vector2,
    character: CharacterController,
    particles: ParticleSystem,
    lights: ArrayVec<Light, MAX_LIGHTS>,
    transition: SceneTransition,
    state: AnimationState,
    /// Bumped on every state change; deferred actions from older epochs are stale.
    epoch: u64,
    deferred: SmallVec<[Deferred; 4]>,
    flash: f32,
    /// Scene time driving light flicker and fog drift.
    time: f32,
    background_frame: u32,
    background_next: f64,
    /// Bumped on destroy so late asset completions can be recognised.
    generation: u64,
    status: String,
    active: bool,
}

impl SceneManager {
    /// Build an inactive scene. Call [`SceneManager::activate`] to start it.
    pub fn new(
        config: SceneConfig,
        world: Vector2,
        particles: ParticleSystem,
    ) -> Result<Self, SceneError> {
        config.validate(world.x, world.y)?;

        let mut character = CharacterController::new(config.spawn, wizard_animations())
            .with_targets(config.actions.iter().map(|(s, p)| (*s, *p)));
        if let Some(sheet) = &config.sheet {
            let layout = SheetLayout {
                key: sheet.key.clone(),
                cell_width: sheet.cell_width,
                cell_height: sheet.cell_height,
            };
            character = character.with_sheet(wizard_sheet_animator(&sheet.key), layout);
        }

        let mut scene = Self {
            config,
            world,
            character,
            particles,
            lights: ArrayVec::new(),
            transition: SceneTransition::new(),
            state: AnimationState::Idle,
            epoch: 0,
            deferred: SmallVec::new(),
            flash: 0.0,
            time: 0.0,
            background_frame: 0,
            background_next: 0.0,
            generation: 0,
            status: String::new(),
            active: false,
        };
        scene.reset_lights();
        Ok(scene)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn character(&self) -> &CharacterController {
        &self.character
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn transition(&self) -> &SceneTransition {
        &self.transition
    }

    /// Last state requested through [`SceneManager::set_animation_state`].
    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn flash_active(&self) -> bool {
        self.flash > 0.0
    }

    pub fn background_frame(&self) -> u32 {
        self.background_frame
    }

    /// Deferred actions still waiting, stale ones included.
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Keeps at most [`STATUS_MAX_CHARS`] characters.
    pub fn set_status(&mut self, status: impl Into<String>) {
        let mut status = status.into();
        if let Some((cut, _)) = status.char_indices().nth(STATUS_MAX_CHARS) {
            status.truncate(cut);
        }
        self.status = status;
    }

    /// Image files this scene would like loaded, as `(key, relative path)`.
    pub fn asset_requests(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(bg) = &self.config.background {
            out.push((bg.key.clone(), bg.path.clone()));
        }
        if let Some(sheet) = &self.config.sheet {
            out.push((sheet.key.clone(), sheet.path.clone()));
        }
        out
    }

    /// Called when an image finished uploading.
    pub fn on_image_ready(&self, key: &str, info: ImageInfo) {
        let Some(layout) = self.character.sheet_layout() else {
            return;
        };
        if layout.key != key || layout.cell_width == 0 {
            return;
        }
        let columns = info.width / layout.cell_width;
        let bad = self.character.sheet().validate(columns);
        if bad.is_empty() {
            debug!("sheet '{}' has {} columns, all animations fit", key, columns);
        }
    }

    /// Reset the scene and play the entry sequence.
    pub fn activate(&mut self, now: f64) {
        self.particles.clear();
        self.particles.set_emitters(self.config.emitters.iter().cloned());
        self.reset_lights();
        self.character.teleport(self.config.spawn);
        self.character.play_animation(AnimationState::Idle.as_str());

        self.state = AnimationState::Enter;
        self.epoch += 1;
        self.deferred.clear();
        self.flash = 0.0;
        self.background_frame = 0;
        self.background_next = now + self.background_interval().unwrap_or(0.0);
        self.transition
            .start_entry(self.config.title.clone(), self.config.subtitle.clone());
        self.active = true;
        info!("scene '{}' activated (generation {})", self.config.id, self.generation);
    }

    pub fn set_animation_state(&mut self, state: AnimationState, now: f64) {
        if !self.active {
            debug!("scene '{}' inactive, ignoring {}", self.config.id, state);
            return;
        }
        debug!("scene state {} -> {}", self.state, state);
        self.epoch += 1;
        match state {
            AnimationState::Enter => {
                self.activate(now);
                return;
            }
            AnimationState::Exit => {
                self.transition.start_death("Farewell", "the session has ended");
                self.character.set_state(state);
            }
            AnimationState::Victory => {
                self.character.set_state(state);
                let burst = self.config.victory_burst.clone();
                self.burst_at_character(burst, VICTORY_BURST);
                self.schedule(DeferredKind::VictoryBanner, now + VICTORY_BANNER_DELAY);
            }
            AnimationState::Stagger => {
                self.character.set_state(state);
                self.flash = DAMAGE_FLASH;
                let burst = self.config.stagger_burst.clone();
                self.burst_at_character(burst, STAGGER_BURST);
            }
            other => self.character.set_state(other),
        }
        self.state = state;
    }

    pub fn update(&mut self, dt: f32, now: f64) {
        if !self.active {
            return;
        }
        self.time += dt;
        if let Some(kind) = self.transition.update(dt) {
            self.on_transition_finished(kind, now);
        }
        self.run_deferred(now);
        self.character.update(dt);
        self.particles.update(dt);
        self.flash = (self.flash - dt).max(0.0);
        self.advance_background(now);
    }

    /// Cancel pending work and invalidate outstanding asset loads.
    pub fn destroy(&mut self) {
        self.deferred.clear();
        self.generation += 1;
        self.transition.cancel();
        self.particles.clear();
        self.flash = 0.0;
        self.active = false;
        info!("scene '{}' destroyed (generation {})", self.config.id, self.generation);
    }

    fn reset_lights(&mut self) {
        self.lights.clear();
        for light in self.config.lights.iter().take(MAX_LIGHTS) {
            self.lights.push(*light);
        }
    }

    fn schedule(&mut self, kind: DeferredKind, at: f64) {
        self.deferred.push(Deferred {
            at,
            kind,
            epoch: self.epoch,
        });
    }

    fn burst_at_character(&mut self, mut config: EmitterConfig, count: usize) {
        let pos = self.character.position();
        config.origin = Vector2 {
            x: pos.x,
            y: pos.y - 16.0,
        };
        self.particles.burst(&config, count);
    }

    fn on_transition_finished(&mut self, kind: TransitionKind, now: f64) {
        match kind {
            TransitionKind::Entry => {
                if self.state == AnimationState::Enter {
                    self.character.set_state(AnimationState::Enter);
                    self.schedule(DeferredKind::EnterToIdle, now + ENTER_IDLE_DELAY);
                }
            }
            TransitionKind::Death => info!("scene '{}' ended", self.config.id),
            TransitionKind::Victory => {}
        }
    }

    fn run_deferred(&mut self, now: f64) {
        let epoch = self.epoch;
        let mut due: SmallVec<[DeferredKind; 4]> = SmallVec::new();
        self.deferred.retain(|d| {
            if d.at > now {
                return true;
            }
            if d.epoch == epoch {
                due.push(d.kind);
            } else {
                debug!("skipping superseded {:?}", d.kind);
            }
            false
        });
        for kind in due {
            match kind {
                DeferredKind::EnterToIdle => {
                    self.state = AnimationState::Idle;
                    self.character.set_state(AnimationState::Idle);
                }
                DeferredKind::VictoryBanner => {
                    self.transition
                        .start_victory("Quest complete", self.config.title.clone());
                }
            }
        }
    }

    fn background_interval(&self) -> Option<f64> {
        self.config
            .background
            .as_ref()
            .filter(|bg| bg.is_animated() && bg.frame_interval > 0.0)
            .map(|bg| bg.frame_interval)
    }

    fn advance_background(&mut self, now: f64) {
        let (Some(interval), Some(bg)) = (self.background_interval(), &self.config.background)
        else {
            return;
        };
        let count = bg.frame_count.max(1);
        // After a long stall resync instead of spinning through frames.
        if now - self.background_next > interval * count as f64 {
            self.background_next = now;
        }
        while now >= self.background_next {
            self.background_frame = (self.background_frame + 1) % count;
            self.background_next += interval;
        }
    }

    /// Draw one frame in [`DrawLayer::ORDER`].
    pub fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera, assets: &dyn AssetLookup) {
        canvas.save();
        camera.apply_transform(canvas);
        for layer in DrawLayer::ORDER {
            if layer == DrawLayer::DamageFlash && !self.flash_active() {
                continue;
            }
            canvas.begin_layer(layer);
            match layer {
                DrawLayer::Background => self.draw_background(canvas, assets),
                DrawLayer::Floor => self.draw_floor(canvas, assets),
                DrawLayer::BackProps => self.draw_props(canvas, assets, PropLayer::Back),
                DrawLayer::Character => self.character.draw(canvas, assets),
                DrawLayer::ForeProps => self.draw_props(canvas, assets, PropLayer::Fore),
                DrawLayer::Particles => self.particles.draw(canvas),
                DrawLayer::Lighting => self.draw_lighting(canvas),
                DrawLayer::DamageFlash => self.draw_damage_flash(canvas),
                DrawLayer::Vignette => self.draw_vignette(canvas),
                DrawLayer::ScreenSpace => camera.reset_transform(canvas),
                DrawLayer::Letterbox => {
                    canvas.save();
                    camera.draw_letterbox(canvas, self.config.palette.letterbox);
                    canvas.restore();
                }
                DrawLayer::UiText => self.draw_status(canvas, camera),
                DrawLayer::Transition => self.transition.draw(canvas, camera),
            }
        }
        canvas.restore();
    }

    fn world_rect(&self) -> Rectangle {
        Rectangle::new(0.0, 0.0, self.world.x, self.world.y)
    }

    fn background_image(&self, assets: &dyn AssetLookup) -> Option<ImageInfo> {
        assets.image(&self.config.background.as_ref()?.key)
    }

    fn draw_background(&self, canvas: &mut dyn Canvas, assets: &dyn AssetLookup) {
        canvas.save();
        if let Some(bg) = &self.config.background
            && let Some(info) = assets.image(&bg.key)
        {
            let frames = bg.frame_count.max(1);
            let frame_width = (info.width / frames).max(1);
            let frame = self.background_frame % frames;
            let src = Rectangle::new(
                (frame * frame_width) as f32,
                0.0,
                frame_width as f32,
                info.height as f32,
            );
            canvas.draw_image(&bg.key, src, self.world_rect(), false);
        } else {
            self.draw_procedural_wall(canvas);
        }
        canvas.restore();
    }

    fn draw_procedural_wall(&self, canvas: &mut dyn Canvas) {
        let palette = &self.config.palette;
        let bands = 12;
        let band_h = FLOOR_TOP / bands as f32;
        for i in 0..bands {
            let t = i as f32 / (bands - 1) as f32;
            canvas.fill_rect(
                Rectangle::new(0.0, i as f32 * band_h, self.world.x, band_h + 1.0),
                mix(palette.wall_top, palette.wall_bottom, t),
            );
        }

        let shade = mix(palette.wall_top, Color::BLACK, 0.45);
        match self.config.decoration {
            Decoration::None => {}
            Decoration::Arches => {
                let mut x = 0.0;
                while x <= self.world.x {
                    canvas.fill_rect(Rectangle::new(x - 5.0, 20.0, 10.0, FLOOR_TOP - 20.0), shade);
                    let center = Vector2 { x: x + 40.0, y: 36.0 };
                    canvas.fill_circle(center, 34.0, with_alpha(shade, 0.35));
                    x += 80.0;
                }
            }
            Decoration::Bricks => {
                let mut row = 0;
                let mut y = 6.0;
                while y < FLOOR_TOP {
                    canvas.fill_rect(Rectangle::new(0.0, y, self.world.x, 1.0), shade);
                    let offset = if row % 2 == 0 { 0.0 } else { 12.0 };
                    let mut x = offset;
                    while x < self.world.x {
                        canvas.fill_rect(Rectangle::new(x, y - 9.0, 1.0, 9.0), shade);
                        x += 24.0;
                    }
                    row += 1;
                    y += 10.0;
                }
            }
            Decoration::Stars => {
                for i in 0..48u32 {
                    let x = (i * 73 % 317) as f32 + 1.5;
                    let y = (i * 37 % 101) as f32 + 2.0;
                    let twinkle = 0.5 + 0.5 * (self.time * 1.7 + i as f32).sin();
                    let size = if i % 7 == 0 { 2.0 } else { 1.0 };
                    canvas.fill_rect(
                        Rectangle::new(x, y, size, size),
                        with_alpha(Color::new(230, 230, 255, 255), 0.3 + 0.7 * twinkle),
                    );
                }
            }
        }

        canvas.set_blend(Blend::Additive);
        for glow in &self.config.glows {
            canvas.radial_glow(glow.position, glow.radius, glow.color, with_alpha(glow.color, 0.0));
        }
    }

    fn draw_floor(&self, canvas: &mut dyn Canvas, assets: &dyn AssetLookup) {
        if self.background_image(assets).is_some() {
            return;
        }
        let palette = &self.config.palette;
        canvas.save();
        let (tile_w, tile_h) = (16.0, 8.0);
        let mut row = 0;
        let mut y = FLOOR_TOP;
        while y < self.world.y {
            let offset = if row % 2 == 0 { 0.0 } else { tile_w / 2.0 };
            let mut col = 0;
            let mut x = -offset;
            while x < self.world.x {
                let color = if (row + col) % 2 == 0 {
                    palette.floor_a
                } else {
                    palette.floor_b
                };
                canvas.fill_rect(Rectangle::new(x, y, tile_w, tile_h), color);
                x += tile_w;
                col += 1;
            }
            row += 1;
            y += tile_h;
        }

        for i in 0..3 {
            let drift = (self.time * 0.3 + i as f32 * 2.1).sin() * 12.0;
            let y = FLOOR_TOP - 4.0 + i as f32 * 7.0;
            canvas.fill_rect(
                Rectangle::new(drift - 20.0, y, self.world.x + 40.0, 5.0),
                palette.fog,
            );
        }
        canvas.restore();
    }

    fn draw_props(&self, canvas: &mut dyn Canvas, assets: &dyn AssetLookup, layer: PropLayer) {
        canvas.save();
        for prop in self.config.props.iter().filter(|p| p.layer == layer) {
            let Some(sprite) = assets.sprite(prop.kind.key()) else {
                continue;
            };
            let pos = Vector2 {
                x: (prop.position.x - sprite.width as f32 / 2.0).round(),
                y: (prop.position.y - sprite.height as f32).round(),
            };
            canvas.draw_sprite(sprite, pos, false);
        }
        canvas.restore();
    }

    fn draw_lighting(&self, canvas: &mut dyn Canvas) {
        canvas.save();
        canvas.fill_rect(self.world_rect(), self.config.palette.ambient);
        for light in &self.lights {
            light.draw(canvas, self.time);
        }
        canvas.restore();
    }

    fn draw_damage_flash(&self, canvas: &mut dyn Canvas) {
        let k = (self.flash / DAMAGE_FLASH).clamp(0.0, 1.0);
        canvas.save();
        canvas.set_alpha(0.45 * k);
        canvas.fill_rect(self.world_rect(), Color::new(200, 30, 30, 255));
        canvas.restore();
    }

    fn draw_vignette(&self, canvas: &mut dyn Canvas) {
        let color = self.config.palette.vignette;
        let (w, h) = (self.world.x, self.world.y);
        let band = 6.0;
        canvas.save();
        for i in 0..4 {
            let inset = i as f32 * band;
            let c = with_alpha(color, 0.4 - i as f32 * 0.09);
            canvas.fill_rect(Rectangle::new(inset, inset, w - 2.0 * inset, band), c);
            canvas.fill_rect(Rectangle::new(inset, h - inset - band, w - 2.0 * inset, band), c);
            canvas.fill_rect(
                Rectangle::new(inset, inset + band, band, h - 2.0 * (inset + band)),
                c,
            );
            canvas.fill_rect(
                Rectangle::new(w - inset - band, inset + band, band, h - 2.0 * (inset + band)),
                c,
            );
        }
        canvas.restore();
    }

    fn draw_status(&self, canvas: &mut dyn Canvas, camera: &Camera) {
        let label = self.state.label();
        let text = if self.status.is_empty() {
            label.to_string()
        } else {
            format!("{} - {}", label, self.status)
        };
        let world = camera.world_rect();
        let scale = camera.scale.max(1.0);
        let size = UI_TEXT_SIZE * scale;
        let margin = 4.0 * scale;
        let line = fit_text(canvas, &text, size, world.width - 2.0 * margin);
        if line.is_empty() {
            return;
        }
        canvas.save();
        let pos = Vector2 {
            x: (world.x + margin).round(),
            y: (world.y + world.height - size - margin).round(),
        };
        canvas.draw_text(&line, pos, size, self.config.palette.text);
        canvas.restore();
    }
}

/// Shorten `text` with a trailing "..." until it fits `max_width`.
///
/// The cut is found by binary search over char boundaries, so the number of
/// measurements grows with the log of the length.
pub fn fit_text(canvas: &dyn Canvas, text: &str, size: f32, max_width: f32) -> String {
    if canvas.measure_text(text, size) <= max_width {
        return text.to_string();
    }
    // Byte offset after each char count; ends[k] is the end of the k-char prefix.
    let ends: Vec<usize> = std::iter::once(0)
        .chain(text.char_indices().skip(1).map(|(i, _)| i))
        .collect();
    let fits = |k: usize| {
        let candidate = format!("{}...", &text[..ends[k]]);
        canvas.measure_text(&candidate, size) <= max_width
    };
    if !fits(0) {
        return String::new();
    }
    // Invariant: fits(lo), and every count >= hi is too wide (the full text is).
    let (mut lo, mut hi) = (0, ends.len());
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    format!("{}...", &text[..ends[lo]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transition::TransitionPhase;
    use crate::render::recording::RecordingCanvas;
    use crate::resources::assetstore::AssetStore;
    use crate::resources::scenecatalog::SceneCatalog;
    use crate::resources::sprites::builtin_sprites;

    const STEP: f32 = 0.05;

    fn scene(id: &str) -> SceneManager {
        let config = SceneCatalog::builtin().get(id).unwrap().clone();
        SceneManager::new(
            config,
            Vector2 { x: 320.0, y: 180.0 },
            ParticleSystem::new(256).with_seed(7),
        )
        .unwrap()
    }

    fn run(scene: &mut SceneManager, now: &mut f64, seconds: f32) {
        let steps = (seconds / STEP).round() as usize;
        for _ in 0..steps {
            *now += STEP as f64;
            scene.update(STEP, *now);
        }
    }

    fn camera() -> Camera {
        let mut cam = Camera::new(320.0, 180.0);
        cam.resize(1280.0, 800.0);
        cam
    }

    fn assets() -> AssetStore {
        let mut store = AssetStore::new();
        store.extend_sprites(builtin_sprites());
        store
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SceneCatalog::builtin().get("library").unwrap().clone();
        config.actions.clear();
        let size = Vector2 { x: 320.0, y: 180.0 };
        let err = SceneManager::new(config, size, ParticleSystem::default());
        assert!(matches!(err, Err(SceneError::NoActions { .. })));
    }

    #[test]
    fn activation_starts_entry_off_stage() {
        let mut s = scene("library");
        assert!(!s.is_active());
        s.activate(0.0);
        assert!(s.is_active());
        assert_eq!(s.state(), AnimationState::Enter);
        assert_eq!(s.transition().phase(), TransitionPhase::FadeOut);
        assert_eq!(s.character().position().x, s.config().spawn.x);
        assert_eq!(s.particles().emitter_count(), s.config().emitters.len());
    }

    #[test]
    fn entry_walks_in_then_falls_back_to_idle() {
        let mut s = scene("library");
        let mut now = 0.0;
        s.activate(now);
        run(&mut s, &mut now, TransitionKind::Entry.total_duration() + STEP);
        assert!(!s.transition().is_active());
        assert_eq!(s.character().state(), AnimationState::Enter);
        assert!(s.character().is_walking());
        assert_eq!(s.deferred_count(), 1);

        run(&mut s, &mut now, ENTER_IDLE_DELAY as f32 + STEP);
        assert_eq!(s.state(), AnimationState::Idle);
        assert_eq!(s.character().state(), AnimationState::Idle);
        assert_eq!(s.deferred_count(), 0);
    }

    #[test]
    fn superseded_fallback_is_skipped() {
        let mut s = scene("library");
        let mut now = 0.0;
        s.activate(now);
        run(&mut s, &mut now, TransitionKind::Entry.total_duration() + STEP);
        run(&mut s, &mut now, 0.5);
        s.set_animation_state(AnimationState::Read, now);
        run(&mut s, &mut now, 2.0);
        assert_eq!(s.state(), AnimationState::Read);
        assert_eq!(s.character().state(), AnimationState::Read);
        assert_eq!(s.deferred_count(), 0);
    }

    #[test]
    fn victory_banner_follows_after_delay() {
        let mut s = scene("forge");
        let mut now = 0.0;
        s.activate(now);
        run(&mut s, &mut now, 4.0);
        let before = s.particles().total_spawned();
        s.set_animation_state(AnimationState::Victory, now);
        assert!(s.particles().total_spawned() >= before + VICTORY_BURST as u64);
        run(&mut s, &mut now, 0.5);
        assert!(!s.transition().is_active());
        run(&mut s, &mut now, 0.6);
        assert_eq!(s.transition().kind(), Some(TransitionKind::Victory));
    }

    #[test]
    fn victory_banner_is_dropped_when_superseded() {
        let mut s = scene("forge");
        let mut now = 0.0;
        s.activate(now);
        run(&mut s, &mut now, 4.0);
        s.set_animation_state(AnimationState::Victory, now);
        s.set_animation_state(AnimationState::Forge, now + 0.2);
        run(&mut s, &mut now, 1.5);
        assert!(!s.transition().is_active());
    }

    #[test]
    fn exit_plays_death_sequence() {
        let mut s = scene("observatory");
        let mut now = 0.0;
        s.activate(now);
        run(&mut s, &mut now, 4.0);
        s.set_animation_state(AnimationState::Exit, now);
        assert_eq!(s.transition().kind(), Some(TransitionKind::Death));
        assert_eq!(s.character().state(), AnimationState::Exit);
    }

    #[test]
    fn enter_event_restarts_the_scene() {
        let mut s = scene("library");
        let mut now = 0.0;
        s.activate(now);
        run(&mut s, &mut now, 6.0);
        s.set_animation_state(AnimationState::Enter, now);
        assert_eq!(s.state(), AnimationState::Enter);
        assert_eq!(s.character().position().x, s.config().spawn.x);
        assert_eq!(s.transition().kind(), Some(TransitionKind::Entry));
    }

    #[test]
    fn stagger_flash_layer_is_temporary() {
        let mut s = scene("library");
        let mut now = 0.0;
        let (cam, store) = (camera(), assets());
        s.activate(now);
        run(&mut s, &mut now, 4.0);
        s.set_animation_state(AnimationState::Stagger, now);

        let mut canvas = RecordingCanvas::new();
        s.draw(&mut canvas, &cam, &store);
        assert!(canvas.layers().contains(&DrawLayer::DamageFlash));

        run(&mut s, &mut now, 0.5);
        let mut canvas = RecordingCanvas::new();
        s.draw(&mut canvas, &cam, &store);
        assert!(!canvas.layers().contains(&DrawLayer::DamageFlash));
        assert_eq!(canvas.layers().len(), DrawLayer::ORDER.len() - 1);
    }

    #[test]
    fn draw_is_balanced_and_procedural_without_images() {
        let mut s = scene("library");
        s.activate(0.0);
        let (cam, store) = (camera(), assets());
        let mut canvas = RecordingCanvas::new();
        s.draw(&mut canvas, &cam, &store);
        assert_eq!(canvas.depth(), 0);
        assert!(canvas.images().is_empty());
        assert!(!canvas.ops_in_layer(DrawLayer::Floor).is_empty());
        assert!(!canvas.ops_in_layer(DrawLayer::Background).is_empty());
    }

    #[test]
    fn loaded_background_replaces_procedural_floor() {
        let mut s = scene("forge");
        s.activate(0.0);
        let cam = camera();
        let mut store = assets();
        let key = s.config().background.as_ref().unwrap().key.clone();
        store.mark_ready(
            key.clone(),
            ImageInfo {
                width: 1280,
                height: 180,
            },
        );
        let mut canvas = RecordingCanvas::new();
        s.draw(&mut canvas, &cam, &store);
        assert_eq!(canvas.images().len(), 1);
        assert!(canvas.ops_in_layer(DrawLayer::Floor).is_empty());
    }

    #[test]
    fn animated_background_follows_wall_clock() {
        let mut s = scene("forge");
        let bg = s.config().background.clone().unwrap();
        assert!(bg.is_animated());
        s.activate(0.0);
        s.update(0.01, bg.frame_interval + 0.001);
        assert_eq!(s.background_frame(), 1);
        s.update(0.01, bg.frame_interval * bg.frame_count as f64 + 0.002);
        assert_eq!(s.background_frame(), 0);
    }

    #[test]
    fn destroy_invalidates_and_ignores_events() {
        let mut s = scene("library");
        s.activate(0.0);
        s.set_animation_state(AnimationState::Victory, 0.0);
        s.destroy();
        assert_eq!(s.generation(), 1);
        assert!(!s.transition().is_active());
        assert_eq!(s.deferred_count(), 0);
        s.set_animation_state(AnimationState::Read, 0.1);
        assert_eq!(s.state(), AnimationState::Victory);
    }

    #[test]
    fn status_is_truncated_to_the_window() {
        let mut s = scene("library");
        s.activate(0.0);
        s.set_status("x".repeat(400));
        let (cam, store) = (camera(), assets());
        let mut canvas = RecordingCanvas::new();
        s.draw(&mut canvas, &cam, &store);
        let line = canvas
            .texts()
            .into_iter()
            .find(|t| t.ends_with("..."))
            .map(str::to_string)
            .unwrap();
        let size = UI_TEXT_SIZE * cam.scale;
        assert!(canvas.measure_text(&line, size) <= cam.world_rect().width);
    }

    #[test]
    fn huge_messages_are_capped_and_still_fit() {
        let mut s = scene("library");
        s.activate(0.0);
        s.set_status("é".repeat(12_000));
        assert_eq!(s.status().chars().count(), STATUS_MAX_CHARS);

        let canvas = RecordingCanvas::new();
        let long = "x".repeat(10_000);
        let line = fit_text(&canvas, &long, 32.0, 320.0 * 4.0);
        assert!(line.ends_with("..."));
        assert!(canvas.measure_text(&line, 32.0) <= 1280.0);
        // One more char would not fit.
        let wider = format!("x{}", line);
        assert!(canvas.measure_text(&wider, 32.0) > 1280.0);
    }

    #[test]
    fn fit_text_cuts_on_char_boundaries() {
        let canvas = RecordingCanvas::new();
        // 6 px per char: "ää..." is 30 px, "äää..." is 36.
        let line = fit_text(&canvas, "äääääääää", 10.0, 33.0);
        assert_eq!(line, "ää...");
        assert_eq!(fit_text(&canvas, "abcdef", 10.0, 18.0), "...");
    }

    #[test]
    fn fit_text_keeps_short_text() {
        let canvas = RecordingCanvas::new();
        assert_eq!(fit_text(&canvas, "Idle", 8.0, 100.0), "Idle");
        assert_eq!(fit_text(&canvas, "Idle", 8.0, 0.0), "");
    }
}
