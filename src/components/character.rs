//! Walk-to-station-then-act character controller.
//!
//! The controller has two logical states:
//! - idle-at-target: the animation for the current [`AnimationState`] plays
//! - walking: the walk animation plays while the position moves toward the
//!   target at [`WALK_SPEED`]; the requested animation starts on arrival
//!
//! Each state may have an action position. States without one play in place.
//!
//! Two animators run in lockstep: a procedural [`AnimationController`] that is
//! always drawable, and an [`ImageAnimator`] used once its sheet is loaded.
//! Only [`CharacterController::draw`] cares which tier is visible.

use raylib::prelude::{Color, Rectangle, Vector2};
use rustc_hash::FxHashMap;

use super::animation::AnimationController;
use super::animationstate::AnimationState;
use super::animator::{Animator, Visual};
use super::imageanimator::ImageAnimator;
use crate::render::canvas::{Canvas, with_alpha};
use crate::resources::assetstore::AssetLookup;

/// World units per second.
pub const WALK_SPEED: f32 = 60.0;
/// Distance under which a state change does not start a walk.
pub const ARRIVAL_THRESHOLD: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Sheet geometry for the image tier. The column count comes from the
/// loaded image width.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub key: String,
    pub cell_width: u32,
    pub cell_height: u32,
}

/// Which animator [`CharacterController::draw`] will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualTier {
    Procedural,
    Sheet,
}

#[derive(Debug, Clone)]
pub struct CharacterController {
    position: Vector2,
    target: Vector2,
    state: AnimationState,
    facing: Facing,
    walking: bool,
    pending: Option<AnimationState>,
    targets: FxHashMap<AnimationState, Vector2>,
    procedural: AnimationController,
    sheet: ImageAnimator,
    layout: Option<SheetLayout>,
}

impl CharacterController {
    pub fn new(position: Vector2, procedural: AnimationController) -> Self {
        let mut c = Self {
            position,
            target: position,
            state: AnimationState::Idle,
            facing: Facing::Right,
            walking: false,
            pending: None,
            targets: FxHashMap::default(),
            procedural,
            sheet: ImageAnimator::new(),
            layout: None,
        };
        c.play_state(AnimationState::Idle);
        c
    }

    pub fn with_sheet(mut self, sheet: ImageAnimator, layout: SheetLayout) -> Self {
        self.sheet = sheet;
        self.layout = Some(layout);
        self.play_state(self.state);
        self
    }

    pub fn with_targets(
        mut self,
        targets: impl IntoIterator<Item = (AnimationState, Vector2)>,
    ) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn set_target(&mut self, state: AnimationState, pos: Vector2) {
        self.targets.insert(state, pos);
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn target(&self) -> Vector2 {
        self.target
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_walking(&self) -> bool {
        self.walking
    }

    pub fn pending(&self) -> Option<AnimationState> {
        self.pending
    }

    pub fn procedural(&self) -> &AnimationController {
        &self.procedural
    }

    pub fn sheet(&self) -> &ImageAnimator {
        &self.sheet
    }

    pub fn sheet_layout(&self) -> Option<&SheetLayout> {
        self.layout.as_ref()
    }

    /// Jump to `pos`, cancelling any walk.
    pub fn teleport(&mut self, pos: Vector2) {
        self.position = pos;
        self.target = pos;
        self.walking = false;
        self.pending = None;
    }

    pub fn set_state(&mut self, state: AnimationState) {
        self.state = state;
        let target = self.targets.get(&state).copied().unwrap_or(self.position);
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist > ARRIVAL_THRESHOLD {
            self.target = target;
            self.walking = true;
            self.pending = Some(state);
            self.face(dx);
            self.play_walk();
        } else {
            self.target = self.position;
            self.walking = false;
            self.pending = None;
            self.play_state(state);
        }
    }

    /// Play `name` on both animators, bypassing the state machine.
    pub fn play_animation(&mut self, name: &str) {
        self.procedural.play(name);
        self.sheet.play(name);
    }

    pub fn update(&mut self, dt: f32) {
        self.procedural.update(dt);
        self.sheet.update(dt);
        self.sync_after_finish();

        if !self.walking {
            return;
        }
        let dx = self.target.x - self.position.x;
        let dy = self.target.y - self.position.y;
        let dist = (dx * dx + dy * dy).sqrt();
        let step = WALK_SPEED * dt;
        let before = self.facing;
        self.face(dx);
        if self.facing != before {
            self.play_walk();
        }

        if step >= dist {
            self.position = self.target;
            self.walking = false;
            if let Some(state) = self.pending.take() {
                self.play_state(state);
            }
        } else {
            self.position.x += dx / dist * step;
            self.position.y += dy / dist * step;
        }
    }

    pub fn visual_tier(&self, assets: &dyn AssetLookup) -> VisualTier {
        match &self.layout {
            Some(layout) if assets.image_ready(&layout.key) && self.sheet.visual().is_some() => {
                VisualTier::Sheet
            }
            _ => VisualTier::Procedural,
        }
    }

    /// Draw anchored at the feet (bottom centre of the frame).
    pub fn draw(&self, canvas: &mut dyn Canvas, assets: &dyn AssetLookup) {
        canvas.save();
        canvas.fill_rect(
            Rectangle::new(self.position.x - 7.0, self.position.y - 1.0, 14.0, 2.0),
            with_alpha(Color::BLACK, 0.35),
        );
        match self.visual_tier(assets) {
            VisualTier::Sheet => self.draw_sheet(canvas, assets),
            VisualTier::Procedural => self.draw_procedural(canvas, assets),
        }
        canvas.restore();
    }

    fn draw_sheet(&self, canvas: &mut dyn Canvas, assets: &dyn AssetLookup) {
        let (Some(layout), Some(Visual::Cell { sheet, row, column })) =
            (&self.layout, self.sheet.visual())
        else {
            return;
        };
        let Some(info) = assets.image(sheet) else {
            return;
        };
        let columns = (info.width / layout.cell_width.max(1)).max(1);
        let column = column.min(columns - 1);
        let (w, h) = (layout.cell_width as f32, layout.cell_height as f32);
        let src = Rectangle::new(column as f32 * w, row as f32 * h, w, h);
        let dest = Rectangle::new(self.position.x - w / 2.0, self.position.y - h, w, h);
        canvas.draw_image(sheet, src, dest, self.sheet_flipped());
    }

    /// The sheet is authored facing right except for the left-walking `exit`
    /// row; everything else is mirrored when facing left.
    fn sheet_flipped(&self) -> bool {
        self.facing == Facing::Left
            && self.sheet.current_name() != Some(AnimationState::Exit.as_str())
    }

    fn draw_procedural(&self, canvas: &mut dyn Canvas, assets: &dyn AssetLookup) {
        let Some(Visual::Frame { key }) = self.procedural.visual() else {
            return;
        };
        let Some(sprite) = assets.sprite(key) else {
            return;
        };
        let pos = Vector2 {
            x: (self.position.x - sprite.width as f32 / 2.0).round(),
            y: (self.position.y - sprite.height as f32).round(),
        };
        canvas.draw_sprite(sprite, pos, self.facing == Facing::Left);
    }

    fn face(&mut self, dx: f32) {
        if dx > 0.0 {
            self.facing = Facing::Right;
        } else if dx < 0.0 {
            self.facing = Facing::Left;
        }
    }

    fn play_walk(&mut self) {
        self.procedural.play(AnimationState::Walk.as_str());
        let variant = match self.facing {
            Facing::Right => AnimationState::Enter,
            Facing::Left => AnimationState::Exit,
        };
        if self.sheet.has(variant.as_str()) {
            self.sheet.play(variant.as_str());
        } else {
            play_or_idle(&mut self.sheet, AnimationState::Walk.as_str());
        }
    }

    /// When the procedural one-shot hands off, move the sheet to the same
    /// animation so both tiers keep showing the same thing.
    fn sync_after_finish(&mut self) {
        self.sheet.take_finished();
        if self.procedural.take_finished().is_none() {
            return;
        }
        if let Some(now) = self.procedural.current_name().map(str::to_string) {
            play_or_idle(&mut self.sheet, &now);
        }
    }

    fn play_state(&mut self, state: AnimationState) {
        play_or_idle(&mut self.procedural, state.as_str());
        play_or_idle(&mut self.sheet, state.as_str());
    }
}

fn play_or_idle(animator: &mut dyn Animator, name: &str) {
    if animator.has(name) {
        animator.play(name);
    } else {
        animator.play(AnimationState::Idle.as_str());
    }
}
