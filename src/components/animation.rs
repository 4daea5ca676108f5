//! Procedural frame-list animation player.
//!
//! An [`AnimationController`] holds a table of named [`AnimationDefinition`]s,
//! each an ordered list of sprite keys. It additionally supports a transition
//! map: asking for animation `X` when a transition `Y` is registered for it
//! plays `Y` first and switches to `X` when `Y` finishes on its own.

use rustc_hash::FxHashMap;

use super::animator::{Animator, Playhead, Visual};

/// Immutable description of a procedural animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDefinition {
    pub frames: Vec<String>,
    pub frame_duration: f32,
    pub looped: bool,
    /// Started when this one-shot finishes on its own.
    pub next: Option<String>,
}

impl AnimationDefinition {
    /// Returns `None` for an empty frame list or a non-positive duration.
    pub fn new<S: Into<String>>(
        frames: impl IntoIterator<Item = S>,
        frame_duration: f32,
        looped: bool,
    ) -> Option<Self> {
        let frames: Vec<String> = frames.into_iter().map(Into::into).collect();
        if frames.is_empty() || frame_duration <= 0.0 || !frame_duration.is_finite() {
            return None;
        }
        Some(Self {
            frames,
            frame_duration,
            looped,
            next: None,
        })
    }

    pub fn with_next(mut self, name: impl Into<String>) -> Self {
        self.next = Some(name.into());
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnimationController {
    animations: FxHashMap<String, AnimationDefinition>,
    /// requested animation -> animation played before it
    transitions: FxHashMap<String, String>,
    current: Option<String>,
    queued: Option<String>,
    playhead: Playhead,
    finished: Option<String>,
}

impl AnimationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_animation(mut self, name: impl Into<String>, def: AnimationDefinition) -> Self {
        self.insert(name, def);
        self
    }

    pub fn with_transition(mut self, target: impl Into<String>, via: impl Into<String>) -> Self {
        self.transitions.insert(target.into(), via.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, def: AnimationDefinition) {
        self.animations.insert(name.into(), def);
    }

    pub fn definition(&self, name: &str) -> Option<&AnimationDefinition> {
        self.animations.get(name)
    }

    /// Current frame's sprite key.
    pub fn current_frame(&self) -> Option<&str> {
        let def = self.animations.get(self.current.as_deref()?)?;
        def.frames.get(self.playhead.frame).map(String::as_str)
    }

    pub fn frame_index(&self) -> usize {
        self.playhead.frame
    }

    /// Animation that will start once the running transition finishes.
    pub fn queued(&self) -> Option<&str> {
        self.queued.as_deref()
    }

    fn start(&mut self, name: &str) {
        self.current = Some(name.to_string());
        self.playhead.reset();
    }
}

impl Animator for AnimationController {
    fn play(&mut self, name: &str) {
        if !self.animations.contains_key(name) {
            return;
        }
        let active = !self.playhead.finished;
        if active && self.current.as_deref() == Some(name) {
            return;
        }
        // Already on the way there through its transition.
        if active && self.queued.as_deref() == Some(name) {
            return;
        }

        let via = self
            .transitions
            .get(name)
            .filter(|via| via.as_str() != name && self.animations.contains_key(via.as_str()))
            .cloned();
        match via {
            Some(via) => {
                self.start(&via);
                self.queued = Some(name.to_string());
            }
            None => {
                self.start(name);
                self.queued = None;
            }
        }
    }

    fn update(&mut self, dt: f32) {
        let Some(def) = self.current.as_deref().and_then(|c| self.animations.get(c)) else {
            return;
        };
        let (duration, count, looped) = (def.frame_duration, def.frame_count(), def.looped);
        let follow_up = def.next.clone();
        if !self.playhead.advance(dt, duration, count, looped) {
            return;
        }
        self.finished = self.current.clone();
        // A pending transition target wins over the definition's own follow-up.
        let next = self
            .queued
            .take()
            .or(follow_up)
            .filter(|n| self.animations.contains_key(n.as_str()));
        if let Some(next) = next {
            self.start(&next);
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
        self.current_frame().map(|key| Visual::Frame { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}_{i}")).collect()
    }

    fn controller() -> AnimationController {
        AnimationController::new()
            .with_animation(
                "idle",
                AnimationDefinition::new(frames("idle", 2), 0.5, true).unwrap(),
            )
            .with_animation(
                "cast",
                AnimationDefinition::new(frames("cast", 6), 0.1, false).unwrap(),
            )
            .with_animation(
                "sit",
                AnimationDefinition::new(frames("sit", 2), 0.2, false).unwrap(),
            )
            .with_animation(
                "rest",
                AnimationDefinition::new(frames("rest", 2), 0.4, true).unwrap(),
            )
            .with_transition("rest", "sit")
    }

    #[test]
    fn definition_rejects_invalid_input() {
        assert!(AnimationDefinition::new(Vec::<String>::new(), 0.1, true).is_none());
        assert!(AnimationDefinition::new(["a"], 0.0, true).is_none());
        assert!(AnimationDefinition::new(["a"], -1.0, true).is_none());
    }

    #[test]
    fn one_shot_finishes_exactly_on_sixth_update() {
        let mut c = controller();
        c.play("cast");
        for i in 1..=5 {
            c.update(0.1);
            assert!(!c.is_finished(), "finished early at update {i}");
        }
        c.update(0.1);
        assert!(c.is_finished());
        let frozen = c.current_frame().map(str::to_string);
        assert_eq!(frozen.as_deref(), Some("cast_5"));
        for _ in 0..10 {
            c.update(0.1);
            assert_eq!(c.current_frame(), frozen.as_deref());
        }
    }

    #[test]
    fn play_same_active_animation_is_noop() {
        let mut c = controller();
        c.play("idle");
        c.update(0.5);
        assert_eq!(c.frame_index(), 1);
        c.play("idle");
        assert_eq!(c.frame_index(), 1);
    }

    #[test]
    fn play_finished_animation_restarts_it() {
        let mut c = controller();
        c.play("cast");
        c.update(1.0);
        assert!(c.is_finished());
        c.play("cast");
        assert!(!c.is_finished());
        assert_eq!(c.frame_index(), 0);
    }

    #[test]
    fn unknown_name_is_ignored() {
        let mut c = controller();
        c.play("idle");
        c.play("teleport");
        assert_eq!(c.current_name(), Some("idle"));
    }

    #[test]
    fn transition_plays_first_then_switches() {
        let mut c = controller();
        c.play("rest");
        assert_eq!(c.current_name(), Some("sit"));
        assert_eq!(c.queued(), Some("rest"));
        c.update(0.2);
        assert_eq!(c.current_name(), Some("sit"));
        c.update(0.2);
        assert_eq!(c.current_name(), Some("rest"));
        assert_eq!(c.frame_index(), 0);
        assert!(!c.is_finished());
        assert!(c.queued().is_none());
    }

    #[test]
    fn requesting_target_during_transition_does_not_restart() {
        let mut c = controller();
        c.play("rest");
        c.update(0.2);
        c.play("rest");
        assert_eq!(c.current_name(), Some("sit"));
        assert_eq!(c.frame_index(), 1);
    }

    #[test]
    fn interrupting_a_transition_drops_the_queue() {
        let mut c = controller();
        c.play("rest");
        c.play("cast");
        assert_eq!(c.current_name(), Some("cast"));
        assert!(c.queued().is_none());
    }

    #[test]
    fn visual_reports_frame_key() {
        let mut c = controller();
        assert!(c.visual().is_none());
        c.play("idle");
        assert_eq!(c.visual(), Some(Visual::Frame { key: "idle_0" }));
    }

    #[test]
    fn one_shot_hands_off_to_its_follow_up() {
        let mut c = controller().with_animation(
            "stagger",
            AnimationDefinition::new(frames("stagger", 3), 0.1, false)
                .unwrap()
                .with_next("idle"),
        );
        c.play("stagger");
        c.update(0.2);
        assert_eq!(c.take_finished(), None);
        c.update(0.1);
        assert_eq!(c.current_name(), Some("idle"));
        assert!(!c.is_finished());
        assert_eq!(c.take_finished().as_deref(), Some("stagger"));
        assert_eq!(c.take_finished(), None);
    }

    #[test]
    fn one_shot_without_follow_up_reports_and_freezes() {
        let mut c = controller();
        c.play("cast");
        c.update(1.0);
        assert_eq!(c.current_frame(), Some("cast_5"));
        assert_eq!(c.take_finished().as_deref(), Some("cast"));
        c.update(1.0);
        assert_eq!(c.take_finished(), None);
    }

    #[test]
    fn transition_target_wins_over_follow_up() {
        let mut c = controller().with_animation(
            "sit",
            AnimationDefinition::new(frames("sit", 2), 0.2, false)
                .unwrap()
                .with_next("idle"),
        );
        c.play("rest");
        c.update(0.4);
        assert_eq!(c.current_name(), Some("rest"));
        assert_eq!(c.take_finished().as_deref(), Some("sit"));
    }
}
