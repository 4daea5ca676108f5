//! Sheet-based animation player.
//!
//! Frames are cells of a single image addressed by row (direction) and column
//! (time step). The player only tracks which cell is current; slicing the
//! texture is up to the renderer.

use log::warn;
use rustc_hash::FxHashMap;

use super::animator::{Animator, Playhead, Visual};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnimationDefinition {
    pub sheet: String,
    pub row: u32,
    pub start_column: u32,
    pub frame_count: u32,
    pub frame_duration: f32,
    pub looped: bool,
    /// Started when this one-shot finishes on its own.
    pub next: Option<String>,
}

impl ImageAnimationDefinition {
    pub fn new(
        sheet: impl Into<String>,
        row: u32,
        start_column: u32,
        frame_count: u32,
        frame_duration: f32,
        looped: bool,
    ) -> Option<Self> {
        if frame_count == 0 || frame_duration <= 0.0 || !frame_duration.is_finite() {
            return None;
        }
        Some(Self {
            sheet: sheet.into(),
            row,
            start_column,
            frame_count,
            frame_duration,
            looped,
            next: None,
        })
    }

    pub fn with_next(mut self, name: impl Into<String>) -> Self {
        self.next = Some(name.into());
        self
    }

    /// One past the last column this animation touches.
    pub fn end_column(&self) -> u32 {
        self.start_column + self.frame_count
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageAnimator {
    animations: FxHashMap<String, ImageAnimationDefinition>,
    current: Option<String>,
    playhead: Playhead,
    finished: Option<String>,
}

impl ImageAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_animation(
        mut self,
        name: impl Into<String>,
        def: ImageAnimationDefinition,
    ) -> Self {
        self.animations.insert(name.into(), def);
        self
    }

    fn current_def(&self) -> Option<&ImageAnimationDefinition> {
        self.animations.get(self.current.as_deref()?)
    }

    pub fn sheet(&self) -> Option<&str> {
        self.current_def().map(|d| d.sheet.as_str())
    }

    pub fn row(&self) -> u32 {
        self.current_def().map_or(0, |d| d.row)
    }

    pub fn column(&self) -> u32 {
        self.current_def()
            .map_or(0, |d| d.start_column + self.playhead.frame as u32)
    }

    /// Names of animations running past `columns`, the sheet's authored width.
    pub fn validate(&self, columns: u32) -> Vec<String> {
        let mut bad: Vec<String> = self
            .animations
            .iter()
            .filter(|(_, d)| d.end_column() > columns)
            .map(|(name, d)| {
                warn!(
                    "sheet animation '{}' spans columns {}..{} but '{}' has {}",
                    name,
                    d.start_column,
                    d.end_column(),
                    d.sheet,
                    columns
                );
                name.clone()
            })
            .collect();
        bad.sort();
        bad
    }
}

impl Animator for ImageAnimator {
    fn play(&mut self, name: &str) {
        if !self.animations.contains_key(name) {
            return;
        }
        if !self.playhead.finished && self.current.as_deref() == Some(name) {
            return;
        }
        self.current = Some(name.to_string());
        self.playhead.reset();
    }

    fn update(&mut self, dt: f32) {
        let Some(def) = self.current_def() else {
            return;
        };
        let (duration, count, looped) = (def.frame_duration, def.frame_count as usize, def.looped);
        let follow_up = def.next.clone();
        if !self.playhead.advance(dt, duration, count, looped) {
            return;
        }
        self.finished = self.current.clone();
        if let Some(next) = follow_up.filter(|n| self.animations.contains_key(n.as_str())) {
            self.current = Some(next);
            self.playhead.reset();
        }
    }

    fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn is_finished(&self) -> bool {
        self.playhead.finished
    }

    fn take_finished(&mut self) -> Option<String> {
        self.finished.take()
    }

    fn has(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    fn visual(&self) -> Option<Visual<'_>> {
        let def = self.current_def()?;
        Some(Visual::Cell {
            sheet: def.sheet.as_str(),
            row: def.row,
            column: def.start_column + self.playhead.frame as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator() -> ImageAnimator {
        ImageAnimator::new()
            .with_animation(
                "idle",
                ImageAnimationDefinition::new("wizard", 0, 0, 4, 0.2, true).unwrap(),
            )
            .with_animation(
                "forge",
                ImageAnimationDefinition::new("wizard", 3, 2, 3, 0.1, false).unwrap(),
            )
    }

    #[test]
    fn column_is_start_plus_frame() {
        let mut a = animator();
        a.play("forge");
        assert_eq!(a.sheet(), Some("wizard"));
        assert_eq!(a.row(), 3);
        assert_eq!(a.column(), 2);
        a.update(0.1);
        assert_eq!(a.column(), 3);
        a.update(0.5);
        assert_eq!(a.column(), 4);
        assert!(a.is_finished());
    }

    #[test]
    fn looping_sheet_wraps() {
        let mut a = animator();
        a.play("idle");
        a.update(0.8);
        assert_eq!(a.column(), 0);
        assert!(!a.is_finished());
    }

    #[test]
    fn replaying_active_is_noop() {
        let mut a = animator();
        a.play("idle");
        a.update(0.2);
        a.play("idle");
        assert_eq!(a.column(), 1);
    }

    #[test]
    fn validate_reports_out_of_range() {
        let a = animator();
        assert!(a.validate(5).is_empty());
        assert_eq!(a.validate(4), vec!["forge".to_string()]);
    }

    #[test]
    fn visual_is_a_cell() {
        let mut a = animator();
        assert!(a.visual().is_none());
        a.play("idle");
        assert_eq!(
            a.visual(),
            Some(Visual::Cell {
                sheet: "wizard",
                row: 0,
                column: 0
            })
        );
    }

    #[test]
    fn one_shot_hands_off_to_its_follow_up() {
        let mut a = animator().with_animation(
            "stagger",
            ImageAnimationDefinition::new("wizard", 7, 0, 2, 0.1, false)
                .unwrap()
                .with_next("idle"),
        );
        a.play("stagger");
        a.update(0.1);
        assert_eq!(a.row(), 7);
        a.update(0.1);
        assert_eq!(a.current_name(), Some("idle"));
        assert_eq!((a.row(), a.column()), (0, 0));
        assert_eq!(a.take_finished().as_deref(), Some("stagger"));
    }

    #[test]
    fn unknown_follow_up_freezes_instead() {
        let mut a = animator().with_animation(
            "stagger",
            ImageAnimationDefinition::new("wizard", 7, 0, 2, 0.1, false)
                .unwrap()
                .with_next("nope"),
        );
        a.play("stagger");
        a.update(0.5);
        assert_eq!(a.current_name(), Some("stagger"));
        assert!(a.is_finished());
        assert_eq!(a.take_finished().as_deref(), Some("stagger"));
    }
}
