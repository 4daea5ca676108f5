//! Pooled particle simulator.
//!
//! A [`ParticleSystem`] owns a fixed number of [`Particle`] slots allocated up
//! front. Spawning pops a free slot index; when none is left the spawn is
//! dropped. Retired particles push their slot back, so nothing is allocated
//! while the scene runs.
//!
//! Continuous emission uses a per-emitter fractional accumulator: each update
//! adds `rate * dt` and spawns one particle per whole unit, keeping the
//! remainder. [`ParticleSystem::burst`] spawns a fixed count immediately.
//!
//! Angles are in degrees, 0° pointing up and increasing clockwise.

use raylib::prelude::{Color, Rectangle, Vector2};
use smallvec::SmallVec;

use crate::render::canvas::{Canvas, with_alpha};

pub const DEFAULT_CAPACITY: usize = 256;
/// Positional jitter applied on spawn, in world units either side.
pub const SPAWN_JITTER: f32 = 2.0;

/// Where a particle's gravity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GravityMode {
    /// The first registered emitter's gravity applies to every particle.
    #[default]
    FirstEmitter,
    /// Each particle keeps the gravity of the config that spawned it.
    PerParticle,
}

impl GravityMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GravityMode::FirstEmitter => "first_emitter",
            GravityMode::PerParticle => "per_particle",
        }
    }
}

impl std::str::FromStr for GravityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_emitter" => Ok(GravityMode::FirstEmitter),
            "per_particle" => Ok(GravityMode::PerParticle),
            other => Err(format!("unknown gravity mode '{}'", other)),
        }
    }
}

/// Spawn area around the emitter origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum EmitterShape {
    #[default]
    Point,
    /// Uniform within a centred rectangle.
    Rect { width: f32, height: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub pos: Vector2,
    pub vel: Vector2,
    pub color: Color,
    pub alpha: f32,
    pub alpha_max: f32,
    /// Normalized remaining life, 1 at spawn and 0 at retirement.
    pub life: f32,
    /// Lifetime in seconds.
    pub max_life: f32,
    pub size: f32,
    pub gravity: f32,
    pub emitter: Option<usize>,
    pub active: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vector2 { x: 0.0, y: 0.0 },
            vel: Vector2 { x: 0.0, y: 0.0 },
            color: Color::WHITE,
            alpha: 0.0,
            alpha_max: 1.0,
            life: 0.0,
            max_life: 1.0,
            size: 1.0,
            gravity: 0.0,
            emitter: None,
            active: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Particles per second. Zero disables continuous emission.
    pub rate: f32,
    pub origin: Vector2,
    pub shape: EmitterShape,
    /// Centre direction in degrees.
    pub angle: f32,
    /// Full angular spread in degrees.
    pub spread: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub colors: SmallVec<[Color; 4]>,
    pub lifetime_min: f32,
    pub lifetime_max: f32,
    /// Downward acceleration in world units per second squared.
    pub gravity: f32,
    pub size_min: f32,
    pub size_max: f32,
    /// Cap on live particles spawned by this emitter. `None` means no cap.
    pub max_particles: Option<usize>,
    pub alpha_max: Option<f32>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            rate: 0.0,
            origin: Vector2 { x: 0.0, y: 0.0 },
            shape: EmitterShape::Point,
            angle: 0.0,
            spread: 360.0,
            speed_min: 0.0,
            speed_max: 0.0,
            colors: SmallVec::from_slice(&[Color::WHITE]),
            lifetime_min: 1.0,
            lifetime_max: 1.0,
            gravity: 0.0,
            size_min: 1.0,
            size_max: 1.0,
            max_particles: None,
            alpha_max: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Emitter {
    config: EmitterConfig,
    accumulator: f32,
    live: usize,
}

#[derive(Debug, Clone)]
struct Pool {
    particles: Vec<Particle>,
    /// Free slot indices used as a stack. A fresh pool hands out the lowest
    /// index first; after that the most recently retired slot is reused first.
    free: Vec<usize>,
}

impl Pool {
    fn new(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::default(); capacity],
            free: (0..capacity).rev().collect(),
        }
    }

    fn reset(&mut self) {
        for p in self.particles.iter_mut() {
            p.active = false;
        }
        self.free.clear();
        self.free.extend((0..self.particles.len()).rev());
    }

    fn active_count(&self) -> usize {
        self.particles.len() - self.free.len()
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pool: Pool,
    emitters: SmallVec<[Emitter; 4]>,
    gravity_mode: GravityMode,
    rng: fastrand::Rng,
    spawned: u64,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ParticleSystem {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: Pool::new(capacity),
            emitters: SmallVec::new(),
            gravity_mode: GravityMode::default(),
            rng: fastrand::Rng::new(),
            spawned: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    pub fn with_gravity_mode(mut self, mode: GravityMode) -> Self {
        self.gravity_mode = mode;
        self
    }

    pub fn gravity_mode(&self) -> GravityMode {
        self.gravity_mode
    }

    pub fn capacity(&self) -> usize {
        self.pool.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Particles successfully spawned since creation.
    pub fn total_spawned(&self) -> u64 {
        self.spawned
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.pool.particles.iter().filter(|p| p.active)
    }

    pub fn add_emitter(&mut self, config: EmitterConfig) {
        self.emitters.push(Emitter {
            config,
            accumulator: 0.0,
            live: 0,
        });
    }

    /// Replace all emitters. Live particles are detached and fade out on
    /// their own.
    pub fn set_emitters(&mut self, configs: impl IntoIterator<Item = EmitterConfig>) {
        for p in self.pool.particles.iter_mut() {
            p.emitter = None;
        }
        self.emitters.clear();
        for config in configs {
            self.add_emitter(config);
        }
    }

    /// Retire every particle and zero the accumulators.
    pub fn clear(&mut self) {
        self.pool.reset();
        for e in self.emitters.iter_mut() {
            e.accumulator = 0.0;
            e.live = 0;
        }
    }

    /// Spawn `count` particles from `config` right away.
    pub fn burst(&mut self, config: &EmitterConfig, count: usize) {
        for _ in 0..count {
            if spawn(&mut self.pool, &mut self.rng, config, None).is_none() {
                break;
            }
            self.spawned += 1;
        }
    }

    pub fn update(&mut self, dt: f32) {
        let Self {
            pool,
            emitters,
            rng,
            spawned,
            gravity_mode,
        } = self;

        for (i, emitter) in emitters.iter_mut().enumerate() {
            if emitter.config.rate <= 0.0 {
                continue;
            }
            emitter.accumulator += emitter.config.rate * dt;
            while emitter.accumulator >= 1.0 {
                emitter.accumulator -= 1.0;
                let capped = emitter
                    .config
                    .max_particles
                    .is_some_and(|cap| emitter.live >= cap);
                if capped {
                    continue;
                }
                if spawn(pool, rng, &emitter.config, Some(i)).is_some() {
                    emitter.live += 1;
                    *spawned += 1;
                }
            }
        }

        let shared_gravity = match gravity_mode {
            GravityMode::FirstEmitter => emitters.first().map(|e| e.config.gravity),
            GravityMode::PerParticle => None,
        };

        for (idx, p) in pool.particles.iter_mut().enumerate() {
            if !p.active {
                continue;
            }
            p.life -= dt / p.max_life;
            if p.life <= 0.0 {
                p.active = false;
                pool.free.push(idx);
                if let Some(e) = p.emitter.and_then(|e| emitters.get_mut(e)) {
                    e.live = e.live.saturating_sub(1);
                }
                continue;
            }
            let gravity = shared_gravity.unwrap_or(p.gravity);
            p.vel.y += gravity * dt;
            p.pos.x += p.vel.x * dt;
            p.pos.y += p.vel.y * dt;
            p.alpha = p.life * p.alpha_max;
        }
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.save();
        for p in self.particles() {
            let color = with_alpha(p.color, p.alpha);
            if p.size >= 3.0 {
                canvas.fill_circle(p.pos, p.size / 2.0, color);
            } else {
                let half = p.size / 2.0;
                canvas.fill_rect(
                    Rectangle::new(p.pos.x - half, p.pos.y - half, p.size, p.size),
                    color,
                );
            }
        }
        canvas.restore();
    }
}

fn range(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.f32() * (max - min)
}

fn spawn(
    pool: &mut Pool,
    rng: &mut fastrand::Rng,
    config: &EmitterConfig,
    emitter: Option<usize>,
) -> Option<usize> {
    let idx = pool.free.pop()?;

    let (ox, oy) = match config.shape {
        EmitterShape::Point => (0.0, 0.0),
        EmitterShape::Rect { width, height } => (
            range(rng, -width / 2.0, width / 2.0),
            range(rng, -height / 2.0, height / 2.0),
        ),
    };
    let jx = range(rng, -SPAWN_JITTER, SPAWN_JITTER);
    let jy = range(rng, -SPAWN_JITTER, SPAWN_JITTER);

    let angle = (config.angle + range(rng, -config.spread / 2.0, config.spread / 2.0)).to_radians();
    let speed = range(rng, config.speed_min, config.speed_max);
    let color = if config.colors.is_empty() {
        Color::WHITE
    } else {
        config.colors[rng.usize(..config.colors.len())]
    };
    let alpha_max = config.alpha_max.unwrap_or(1.0).clamp(0.0, 1.0);

    pool.particles[idx] = Particle {
        pos: Vector2 {
            x: config.origin.x + ox + jx,
            y: config.origin.y + oy + jy,
        },
        vel: Vector2 {
            x: angle.sin() * speed,
            y: -angle.cos() * speed,
        },
        color,
        alpha: alpha_max,
        alpha_max,
        life: 1.0,
        max_life: range(rng, config.lifetime_min, config.lifetime_max).max(f32::EPSILON),
        size: range(rng, config.size_min, config.size_max),
        gravity: config.gravity,
        emitter,
        active: true,
    };
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn config(rate: f32) -> EmitterConfig {
        EmitterConfig {
            rate,
            lifetime_min: 1.0,
            lifetime_max: 1.0,
            speed_min: 5.0,
            speed_max: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn spawn_rate_converges() {
        let mut ps = ParticleSystem::default().with_seed(7);
        ps.add_emitter(config(10.0));
        for _ in 0..300 {
            ps.update(1.0 / 60.0);
        }
        let n = ps.total_spawned();
        assert!((49..=51).contains(&n), "spawned {n}");
    }

    #[test]
    fn exhaustion_drops_silently() {
        let mut ps = ParticleSystem::new(8).with_seed(1);
        ps.burst(&config(0.0), 20);
        assert_eq!(ps.active_count(), 8);
        assert_eq!(ps.total_spawned(), 8);
    }

    #[test]
    fn retired_slots_are_reused() {
        let mut ps = ParticleSystem::new(4).with_seed(1);
        let short = EmitterConfig {
            lifetime_min: 0.1,
            lifetime_max: 0.1,
            ..config(0.0)
        };
        ps.burst(&short, 4);
        ps.update(0.2);
        assert_eq!(ps.active_count(), 0);
        ps.burst(&short, 4);
        assert_eq!(ps.active_count(), 4);
    }

    #[test]
    fn alpha_follows_life() {
        let mut ps = ParticleSystem::new(1).with_seed(3);
        let cfg = EmitterConfig {
            lifetime_min: 2.0,
            lifetime_max: 2.0,
            alpha_max: Some(0.5),
            ..config(0.0)
        };
        ps.burst(&cfg, 1);
        ps.update(0.5);
        let p = ps.particles().next().unwrap();
        assert!(approx_eq(p.life, 0.75));
        assert!(approx_eq(p.alpha, 0.375));
    }

    #[test]
    fn jitter_stays_within_two_units() {
        let mut ps = ParticleSystem::new(64).with_seed(11);
        let cfg = EmitterConfig {
            origin: Vector2 { x: 50.0, y: 50.0 },
            speed_min: 0.0,
            speed_max: 0.0,
            ..config(0.0)
        };
        ps.burst(&cfg, 64);
        for p in ps.particles() {
            assert!((p.pos.x - 50.0).abs() <= SPAWN_JITTER);
            assert!((p.pos.y - 50.0).abs() <= SPAWN_JITTER);
        }
    }

    #[test]
    fn first_emitter_gravity_applies_to_all() {
        let mut ps = ParticleSystem::new(4).with_seed(5);
        ps.add_emitter(EmitterConfig {
            gravity: 100.0,
            ..config(0.0)
        });
        let floaty = EmitterConfig {
            gravity: 0.0,
            speed_min: 0.0,
            speed_max: 0.0,
            ..config(0.0)
        };
        ps.burst(&floaty, 1);
        ps.update(0.1);
        let p = ps.particles().next().unwrap();
        assert!(approx_eq(p.vel.y, 10.0));
    }

    #[test]
    fn per_particle_gravity_keeps_origin() {
        let mut ps = ParticleSystem::new(4)
            .with_seed(5)
            .with_gravity_mode(GravityMode::PerParticle);
        ps.add_emitter(EmitterConfig {
            gravity: 100.0,
            ..config(0.0)
        });
        let floaty = EmitterConfig {
            gravity: 0.0,
            speed_min: 0.0,
            speed_max: 0.0,
            ..config(0.0)
        };
        ps.burst(&floaty, 1);
        ps.update(0.1);
        let p = ps.particles().next().unwrap();
        assert!(approx_eq(p.vel.y, 0.0));
    }

    #[test]
    fn emitter_share_is_capped() {
        let mut ps = ParticleSystem::new(64).with_seed(9);
        ps.add_emitter(EmitterConfig {
            max_particles: Some(5),
            lifetime_min: 10.0,
            lifetime_max: 10.0,
            ..config(100.0)
        });
        for _ in 0..60 {
            ps.update(1.0 / 60.0);
        }
        assert_eq!(ps.active_count(), 5);
    }

    fn active_slots(ps: &ParticleSystem) -> Vec<usize> {
        ps.pool
            .particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn retired_slots_are_reused_most_recent_first() {
        let mut ps = ParticleSystem::new(4).with_seed(3);
        ps.burst(&config(0.0), 3);
        assert_eq!(active_slots(&ps), vec![0, 1, 2]);

        // Slots 0 and 2 retire in the same pass, pushed in index order.
        ps.pool.particles[0].life = 1e-6;
        ps.pool.particles[2].life = 1e-6;
        ps.update(0.01);
        assert_eq!(active_slots(&ps), vec![1]);

        ps.burst(&config(0.0), 1);
        assert_eq!(active_slots(&ps), vec![1, 2]);
        ps.burst(&config(0.0), 1);
        assert_eq!(active_slots(&ps), vec![0, 1, 2]);
    }

    #[test]
    fn clear_frees_every_slot() {
        let mut ps = ParticleSystem::new(16).with_seed(2);
        ps.burst(&config(0.0), 10);
        ps.clear();
        assert_eq!(ps.active_count(), 0);
        ps.burst(&config(0.0), 16);
        assert_eq!(ps.active_count(), 16);
    }

    #[test]
    fn gravity_mode_parses() {
        assert_eq!("per_particle".parse::<GravityMode>(), Ok(GravityMode::PerParticle));
        assert_eq!(" First_Emitter ".parse::<GravityMode>(), Ok(GravityMode::FirstEmitter));
        assert!("sideways".parse::<GravityMode>().is_err());
    }
}
