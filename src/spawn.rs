//! Spawn distribution for galaxy particles.
//!
//! Particles are drawn from a two-population mixture: a spherical bulge
//! with a Gaussian radial falloff, and a thin disk with four logarithmic
//! spiral arms. All randomness flows through one seeded [`SmallRng`], so a
//! seed fully determines the initial buffer and every later respawn.

use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Share of particles that belong to the central bulge.
pub const BULGE_FRACTION: f32 = 0.3;

/// Bulge radii are clamped here (five standard deviations).
pub const BULGE_MAX_RADIUS: f32 = 12.5;

/// Upper bound on |position| for a disk spawn: outer radius 30, arm
/// width jitter ×1.2, plus the disk half-thickness.
pub const DISK_MAX_RADIUS: f32 = 37.0;

/// Number of spiral arms in the disk.
pub const ARM_COUNT: u32 = 4;

const BULGE_SIGMA: f32 = 2.5;

/// Which population a spawn was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    Bulge,
    Disk,
}

impl Population {
    /// Largest |position| this population can produce.
    pub fn max_radius(self) -> f32 {
        match self {
            Population::Bulge => BULGE_MAX_RADIUS,
            Population::Disk => DISK_MAX_RADIUS,
        }
    }
}

/// A freshly drawn position plus the per-particle attributes that go with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub population: Population,
    pub position: Vec3,
    /// Sprite jitter in `[-1, 1]²`.
    pub offset: Vec2,
    /// Relative sprite size in `(0, 1]`.
    pub size: f32,
}

/// Seeded sampler for the bulge/disk mixture.
///
/// ```ignore
/// let mut spawner = GalaxySpawner::new(42);
/// let spawn = spawner.spawn();
/// assert!(spawn.position.length() <= spawn.population.max_radius());
/// ```
#[derive(Debug, Clone)]
pub struct GalaxySpawner {
    rng: SmallRng,
}

impl GalaxySpawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[-1, 1)`.
    #[inline]
    pub fn random_signed(&mut self) -> f32 {
        self.rng.gen_range(-1.0..1.0)
    }

    /// Absolute value of a standard normal sample (Box–Muller).
    fn half_normal(&mut self) -> f32 {
        // 1 - [0, 1) keeps ln away from zero
        let u = 1.0 - self.random();
        let v = self.random();
        ((-2.0 * u.ln()).sqrt() * (TAU * v).cos()).abs()
    }

    // ========== Populations ==========

    /// Draw from the mixture: 30% bulge, 70% disk.
    pub fn spawn(&mut self) -> Spawn {
        if self.random() < BULGE_FRACTION {
            self.bulge()
        } else {
            self.disk()
        }
    }

    /// Draw from a fixed population.
    pub fn spawn_from(&mut self, population: Population) -> Spawn {
        match population {
            Population::Bulge => self.bulge(),
            Population::Disk => self.disk(),
        }
    }

    /// Spherical bulge, flattened by half along y.
    pub fn bulge(&mut self) -> Spawn {
        let r = (self.half_normal() * BULGE_SIGMA).min(BULGE_MAX_RADIUS);
        let theta = self.random() * TAU;
        let phi = (2.0 * self.random() - 1.0).clamp(-1.0, 1.0).acos();

        let position = Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin() * 0.5,
            r * phi.cos(),
        );
        let offset = self.offset();
        // Inner stars are smaller and brighter
        let size = 0.3 + (position.length() / 5.0) * 0.7 * self.random();

        Spawn {
            population: Population::Bulge,
            position,
            offset,
            size: clamp_size(size),
        }
    }

    /// Thin disk with logarithmic spiral arms.
    pub fn disk(&mut self) -> Spawn {
        // Power law favoring small radii, with a sparser outer tail
        let radius = if self.random() < 0.7 {
            self.random().powi(2) * 15.0 + 3.0
        } else {
            self.random().powf(1.5) * 25.0 + 5.0
        };
        let height = self.random_signed() * (0.2 + radius * 0.02);

        let angle = self.random() * TAU;
        let arm = self.rng.gen_range(0..ARM_COUNT);
        let arm_offset = arm as f32 / ARM_COUNT as f32 * TAU;
        let tightness = 0.4 + self.random() * 0.3;
        let spiral = angle + arm_offset + radius * tightness;

        let arm_width = 0.15 + 0.05 * self.random();
        let arm_factor = if self.random() > arm_width { 1.0 } else { 1.2 };

        let position = Vec3::new(
            radius * spiral.cos() * arm_factor,
            height,
            radius * spiral.sin() * arm_factor,
        );
        let offset = self.offset();
        let planar = Vec2::new(position.x, position.z).length();
        let brightness = 0.5 + 0.5 * self.random();
        let size = (0.2 + (planar / 25.0) * 0.6) * brightness;

        Spawn {
            population: Population::Disk,
            position,
            offset,
            size: clamp_size(size),
        }
    }

    fn offset(&mut self) -> Vec2 {
        Vec2::new(self.random_signed(), self.random_signed())
    }

    // ========== Lifetimes ==========

    /// Age for a particle created at buffer initialization, in `[0, 10)`.
    ///
    /// Staggers deaths so the buffer does not pulse.
    pub fn initial_age(&mut self) -> f32 {
        self.random() * 10.0
    }

    /// Lifetime in `[10, 30)` seconds.
    pub fn lifetime(&mut self) -> f32 {
        10.0 + self.random() * 20.0
    }

    /// Turbulence jitter, uniform in `[-1, 1)³`.
    pub fn jitter(&mut self) -> Vec3 {
        Vec3::new(self.random_signed(), self.random_signed(), self.random_signed())
    }
}

fn clamp_size(size: f32) -> f32 {
    size.clamp(0.05, 1.0)
}
