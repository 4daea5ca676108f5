//! Shared animator capability.
//!
//! The character owns two players: the procedural
//! [`AnimationController`](super::animation::AnimationController) and the
//! sheet-based [`ImageAnimator`](super::imageanimator::ImageAnimator). Both
//! are driven identically through [`Animator`]; only the [`Visual`] they
//! report differs, and the renderer picks one of them with a single "is the
//! sheet loaded" check.
//!
//! A one-shot definition may name a follow-up (`next`) that starts on the
//! update that finishes it. Without one the animation freezes on its last
//! frame. Either way the end is reported once through
//! [`Animator::take_finished`].

/// What an animator wants drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visual<'a> {
    /// A procedural sprite identified by its key.
    Frame { key: &'a str },
    /// One cell of an image sheet.
    Cell { sheet: &'a str, row: u32, column: u32 },
}

pub trait Animator {
    /// Start `name`. Unknown names are ignored; the active, unfinished
    /// animation is never restarted.
    fn play(&mut self, name: &str);
    fn update(&mut self, dt: f32);
    fn current_name(&self) -> Option<&str>;
    fn is_finished(&self) -> bool;
    /// Name of the one-shot that ended since the last call, if any. Reading
    /// it clears it. Set even when a follow-up animation took over.
    fn take_finished(&mut self) -> Option<String>;
    fn has(&self, name: &str) -> bool;
    fn visual(&self) -> Option<Visual<'_>>;
}

/// Frame cursor shared by both animators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Playhead {
    pub frame: usize,
    pub elapsed: f32,
    pub finished: bool,
}

impl Playhead {
    pub fn reset(&mut self) {
        *self = Playhead::default();
    }

    /// Consume `dt`, stepping one frame per whole `frame_duration`.
    ///
    /// Returns `true` on the call that finishes a one-shot animation.
    pub fn advance(
        &mut self,
        dt: f32,
        frame_duration: f32,
        frame_count: usize,
        looped: bool,
    ) -> bool {
        if self.finished || frame_count == 0 || frame_duration <= 0.0 {
            return false;
        }
        self.elapsed += dt;
        while self.elapsed >= frame_duration {
            self.elapsed -= frame_duration;
            self.frame += 1;
            if self.frame >= frame_count {
                if looped {
                    self.frame = 0;
                } else {
                    self.frame = frame_count - 1; // stay on last frame
                    self.elapsed = 0.0;
                    self.finished = true;
                    return true;
                }
            }
        }
        false
    }
}
