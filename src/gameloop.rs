//! Frame driver.
//!
//! [`GameLoop`] turns the host's per-frame callback (the raylib window loop in
//! `main`, a manual stepping loop in tests) into clamped update and render
//! calls:
//!
//! 1. The first tick after [`GameLoop::start`] only records a timestamp.
//! 2. Every later tick computes `dt` from the clock, clamped to [`MAX_FRAME_DT`].
//! 3. All update callbacks run, in registration order, then all render callbacks.
//! 4. While the surface is not visible, ticks are skipped and the baseline is
//!    dropped so the first visible tick does not see an inflated `dt`.
//!
//! Time comes from a [`Clock`], so tests can use [`ManualClock`] and step
//! frames deterministically.

use std::cell::Cell;
use std::time::Instant;

use log::debug;

/// Largest delta passed to callbacks, in seconds.
pub const MAX_FRAME_DT: f32 = 0.1;

/// FPS is recomputed after this much accumulated frame time, in seconds.
const FPS_WINDOW: f32 = 1.0;

/// Monotonic time source in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Timing information handed to each callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Clamped seconds since the previous frame.
    pub dt: f32,
    /// Clock reading for this frame, in seconds.
    pub now: f64,
    /// Most recent frames-per-second measurement.
    pub fps: f32,
}

pub type FrameCallback<Ctx> = Box<dyn FnMut(&mut Ctx, &Frame)>;

/// Per-frame driver over a shared context `Ctx` (the ECS `World` in the binary).
pub struct GameLoop<Ctx, C: Clock = SystemClock> {
    clock: C,
    running: bool,
    last: Option<f64>,
    updates: Vec<FrameCallback<Ctx>>,
    renders: Vec<FrameCallback<Ctx>>,
    fps: f32,
    fps_time: f32,
    fps_frames: u32,
    frames: u64,
}

impl<Ctx, C: Clock> GameLoop<Ctx, C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            running: false,
            last: None,
            updates: Vec::new(),
            renders: Vec::new(),
            fps: 0.0,
            fps_time: 0.0,
            fps_frames: 0,
            frames: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn on_update(&mut self, callback: impl FnMut(&mut Ctx, &Frame) + 'static) {
        self.updates.push(Box::new(callback));
    }

    pub fn on_render(&mut self, callback: impl FnMut(&mut Ctx, &Frame) + 'static) {
        self.renders.push(Box::new(callback));
    }

    /// Begin producing frames. Calling it while running does nothing.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        debug!("game loop started");
        self.running = true;
        self.last = None;
    }

    /// Stop producing frames. Calling it while stopped does nothing.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        debug!("game loop stopped after {} frames", self.frames);
        self.running = false;
        self.last = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Frames that actually ran callbacks.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Host per-frame entry point. Returns the frame that ran, if any.
    pub fn tick(&mut self, ctx: &mut Ctx, visible: bool) -> Option<Frame> {
        if !self.running {
            return None;
        }
        if !visible {
            self.last = None;
            return None;
        }

        let now = self.clock.now();
        let Some(last) = self.last.replace(now) else {
            return None;
        };

        let raw = (now - last).max(0.0) as f32;
        let dt = raw.min(MAX_FRAME_DT);

        self.fps_time += dt;
        self.fps_frames += 1;
        if self.fps_time >= FPS_WINDOW {
            self.fps = self.fps_frames as f32 / self.fps_time;
            self.fps_time = 0.0;
            self.fps_frames = 0;
        }

        let frame = Frame {
            dt,
            now,
            fps: self.fps,
        };
        for cb in self.updates.iter_mut() {
            cb(ctx, &frame);
        }
        for cb in self.renders.iter_mut() {
            cb(ctx, &frame);
        }
        self.frames += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn recording_loop() -> GameLoop<Vec<String>, ManualClock> {
        let mut gl = GameLoop::new(ManualClock::new());
        gl.on_render(|log: &mut Vec<String>, _| log.push("render-a".into()));
        gl.on_update(|log: &mut Vec<String>, _| log.push("update-a".into()));
        gl.on_update(|log: &mut Vec<String>, _| log.push("update-b".into()));
        gl.on_render(|log: &mut Vec<String>, _| log.push("render-b".into()));
        gl
    }

    #[test]
    fn first_tick_only_sets_baseline() {
        let mut gl = recording_loop();
        let mut log = Vec::new();
        gl.start();
        assert!(gl.tick(&mut log, true).is_none());
        assert!(log.is_empty());
        gl.clock().advance(0.016);
        assert!(gl.tick(&mut log, true).is_some());
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn updates_run_before_renders_in_registration_order() {
        let mut gl = recording_loop();
        let mut log = Vec::new();
        gl.start();
        gl.tick(&mut log, true);
        gl.clock().advance(0.016);
        gl.tick(&mut log, true);
        assert_eq!(log, vec!["update-a", "update-b", "render-a", "render-b"]);
    }

    #[test]
    fn stalls_are_clamped() {
        let mut gl: GameLoop<(), ManualClock> = GameLoop::new(ManualClock::new());
        gl.start();
        gl.tick(&mut (), true);
        gl.clock().advance(3.0);
        let frame = gl.tick(&mut (), true).unwrap();
        assert!(approx_eq(frame.dt, MAX_FRAME_DT));
    }

    #[test]
    fn clamp_holds_for_mixed_deltas() {
        let mut gl: GameLoop<(), ManualClock> = GameLoop::new(ManualClock::new());
        gl.start();
        gl.tick(&mut (), true);

        let deltas = [0.016, 0.1, 0.25, 0.05, 3.0, 0.1, 0.099, 0.101];
        let mut total = 0.0;
        for delta in deltas {
            gl.clock().advance(delta);
            let frame = gl.tick(&mut (), true).unwrap();
            assert!(frame.dt <= MAX_FRAME_DT, "dt {} for delta {delta}", frame.dt);
            assert!(approx_eq(frame.dt, (delta as f32).min(MAX_FRAME_DT)));
            total += frame.dt;
        }
        let expected: f32 = deltas.iter().map(|d| (*d as f32).min(MAX_FRAME_DT)).sum();
        assert!((total - expected).abs() < 1e-4, "{total} != {expected}");
        assert_eq!(gl.frames(), deltas.len() as u64);
    }

    #[test]
    fn hidden_ticks_are_skipped_and_reset_baseline() {
        let mut gl: GameLoop<u32, ManualClock> = GameLoop::new(ManualClock::new());
        gl.on_update(|n: &mut u32, _| *n += 1);
        let mut n = 0;
        gl.start();
        gl.tick(&mut n, true);
        gl.clock().advance(0.05);
        gl.tick(&mut n, true);
        assert_eq!(n, 1);

        gl.clock().advance(0.05);
        assert!(gl.tick(&mut n, false).is_none());
        gl.clock().advance(10.0);
        // First visible tick re-establishes the baseline.
        assert!(gl.tick(&mut n, true).is_none());
        gl.clock().advance(0.02);
        let frame = gl.tick(&mut n, true).unwrap();
        assert!(approx_eq(frame.dt, 0.02));
        assert_eq!(n, 2);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut gl: GameLoop<(), ManualClock> = GameLoop::new(ManualClock::new());
        gl.start();
        gl.tick(&mut (), true);
        gl.start(); // must not drop the baseline
        gl.clock().advance(0.01);
        assert!(gl.tick(&mut (), true).is_some());
        gl.stop();
        gl.stop();
        assert!(!gl.is_running());
        gl.clock().advance(0.01);
        assert!(gl.tick(&mut (), true).is_none());
    }

    #[test]
    fn fps_is_measured_per_second() {
        let mut gl: GameLoop<(), ManualClock> = GameLoop::new(ManualClock::new());
        gl.start();
        gl.tick(&mut (), true);
        for _ in 0..60 {
            gl.clock().advance(0.02);
            gl.tick(&mut (), true);
        }
        assert!((gl.fps() - 50.0).abs() < 1.0, "fps = {}", gl.fps());
    }
}
