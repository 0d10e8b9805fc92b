//! The particle state buffer and its per-frame simulation step.
//!
//! Every live particle is advected through the curl-noise field blended
//! with a Keplerian orbit around the galactic axis (y). Near the center the
//! orbit dominates; toward the rim the noise takes over. Slots are never
//! freed: a particle whose age passes its lifetime is respawned in place.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::noise::{curl3, SimplexNoise, CURL_EPSILON};
use crate::params::{ParticleParams, MAX_PARTICLES};
use crate::spawn::{GalaxySpawner, Population, Spawn, BULGE_FRACTION};

/// Simulation time runs at this fraction of `animationSpeed`.
pub const TIME_SCALE: f32 = 0.5;

/// Particles further than this from the origin are pulled back in.
pub const CONTAINMENT_RADIUS: f32 = 30.0;

/// Radius a contained particle is reprojected onto.
pub const CONTAINMENT_RETURN: f32 = 29.0;

/// Fraction of height removed per second of simulation time.
pub const PLANE_PULL: f32 = 0.25;

/// One slot in the state buffer, laid out for direct GPU upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: [f32; 3],
    /// Sprite jitter in `[-1, 1]²`.
    pub offset: [f32; 2],
    /// Seconds since (re)spawn. Never exceeds `lifetime` after a step.
    pub age: f32,
    pub lifetime: f32,
    /// Relative sprite size in `(0, 1]`.
    pub size: f32,
}

impl Particle {
    fn from_spawn(spawn: Spawn, age: f32, lifetime: f32) -> Self {
        Self {
            position: spawn.position.to_array(),
            offset: spawn.offset.to_array(),
            age,
            lifetime,
            size: spawn.size,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    pub fn offset(&self) -> Vec2 {
        Vec2::from_array(self.offset)
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        if self.age > self.lifetime {
            Lifecycle::Expired
        } else {
            Lifecycle::Alive
        }
    }
}

/// Per-slot state, resolved inline each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Alive,
    /// Past its lifetime; respawned in the same slot this step.
    Expired,
}

/// Owns the particle buffer, the spawn sampler and the noise field.
pub struct ParticleSystem {
    particles: Vec<Particle>,
    spawner: GalaxySpawner,
    noise: SimplexNoise,
}

impl ParticleSystem {
    /// Create a buffer of `count` particles (clamped to `1..=MAX_PARTICLES`).
    pub fn new(count: u32, seed: u64) -> Self {
        let mut system = Self {
            particles: Vec::new(),
            spawner: GalaxySpawner::new(seed),
            noise: SimplexNoise::new(seed),
        };
        system.reinitialize(count);
        system
    }

    /// Discard every particle and draw `count` fresh ones.
    ///
    /// The first 30% of slots form the bulge, the rest the disk. Ages are
    /// randomized so deaths are staggered.
    pub fn reinitialize(&mut self, count: u32) {
        let count = count.clamp(1, MAX_PARTICLES) as usize;
        let bulge = (count as f32 * BULGE_FRACTION) as usize;

        self.particles.clear();
        self.particles.reserve_exact(count);
        for i in 0..count {
            let population = if i < bulge { Population::Bulge } else { Population::Disk };
            let spawn = self.spawner.spawn_from(population);
            let age = self.spawner.initial_age();
            let lifetime = self.spawner.lifetime();
            self.particles.push(Particle::from_spawn(spawn, age, lifetime));
        }
        log::info!("Initialized {} particles", count);
    }

    /// Reinitialize if the configured count differs from the buffer length.
    ///
    /// Returns true if the buffer was rebuilt.
    pub fn sync_count(&mut self, count: u32) -> bool {
        let count = count.clamp(1, MAX_PARTICLES);
        if count as usize == self.particles.len() {
            return false;
        }
        self.reinitialize(count);
        true
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn count(&self) -> u32 {
        self.particles.len() as u32
    }

    /// Advance every particle by one frame.
    ///
    /// `delta_time` is wall-clock seconds; it is scaled by `animationSpeed`
    /// and [`TIME_SCALE`]. A zero (or negative) step leaves the buffer untouched.
    pub fn advance(&mut self, params: &ParticleParams, time: f32, delta_time: f32) {
        let dt = delta_time * params.animation_speed * TIME_SCALE;
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        let inv_noise_scale = 1.0 / params.noise_scale;
        let noise_time = time * 0.05;
        let turbulence = params.turbulence * 0.3;

        for particle in &mut self.particles {
            particle.age += dt;
            match particle.lifecycle() {
                Lifecycle::Expired => {
                    // Keep the slot's lifetime and size; new place, age zero
                    let spawn = self.spawner.spawn();
                    particle.position = spawn.position.to_array();
                    particle.offset = spawn.offset.to_array();
                    particle.age = 0.0;
                }
                Lifecycle::Alive => {
                    let jitter = self.spawner.jitter() * turbulence * dt;
                    let p = step_position(
                        &self.noise,
                        particle.position(),
                        jitter,
                        params.curl_intensity,
                        inv_noise_scale,
                        noise_time,
                        dt,
                    );
                    particle.position = p.to_array();
                }
            }
        }
    }
}

/// Move one live particle by `dt` of simulation time.
fn step_position(
    noise: &SimplexNoise,
    p: Vec3,
    jitter: Vec3,
    curl_intensity: f32,
    inv_noise_scale: f32,
    noise_time: f32,
    dt: f32,
) -> Vec3 {
    let curl = curl3(noise, p * inv_noise_scale, noise_time, CURL_EPSILON);

    // Keplerian orbit in the XZ plane, clamped near the axis
    let radius = (p.x * p.x + p.z * p.z).sqrt();
    let orbital = if radius < 0.1 { 1.0 } else { 0.4 / radius.sqrt() };
    let tangent_x = -p.z / (radius + 1e-4);
    let tangent_z = p.x / (radius + 1e-4);

    // Orbit dominates toward the center
    let blend = (0.8 + 0.15 * (1.0 - (radius / 15.0).min(1.0))).min(0.95);
    let speed = 0.1 + (radius / 30.0) * 0.1;

    let mut next = p;
    next.x += (curl.x * curl_intensity * (1.0 - blend) + tangent_x * orbital * blend + jitter.x)
        * dt
        * 1.5
        * speed;
    next.y += (curl.y * curl_intensity * 0.05 + jitter.y) * dt * 0.5 * speed;
    next.z += (curl.z * curl_intensity * (1.0 - blend) + tangent_z * orbital * blend + jitter.z)
        * dt
        * 1.5
        * speed;

    let distance = next.length();
    if distance > CONTAINMENT_RADIUS {
        next *= CONTAINMENT_RETURN / distance;
    }

    next.y -= next.y * PLANE_PULL * dt;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{ParticlePreset, Preset};

    #[test]
    fn test_particle_layout() {
        assert_eq!(std::mem::size_of::<Particle>(), 32);
    }

    #[test]
    fn test_initial_split() {
        let system = ParticleSystem::new(1000, 1);
        assert_eq!(system.count(), 1000);
        let bulge = &system.particles()[..300];
        assert!(bulge.iter().all(|p| p.position().length() <= 12.5 + 1e-3));
        let disk = &system.particles()[300..];
        assert!(disk
            .iter()
            .all(|p| Vec2::new(p.position[0], p.position[2]).length() >= 3.0 - 1e-3));
    }

    #[test]
    fn test_initial_ages_staggered() {
        let system = ParticleSystem::new(2000, 2);
        let ages: Vec<f32> = system.particles().iter().map(|p| p.age).collect();
        assert!(ages.iter().all(|a| (0.0..10.0).contains(a)));
        let min = ages.iter().cloned().fold(f32::MAX, f32::min);
        let max = ages.iter().cloned().fold(f32::MIN, f32::max);
        assert!(max - min > 5.0);
    }

    #[test]
    fn test_count_clamped() {
        assert_eq!(ParticleSystem::new(0, 1).count(), 1);
        assert_eq!(ParticleSystem::new(u32::MAX, 1).count(), MAX_PARTICLES);
    }

    #[test]
    fn test_zero_speed_is_noop() {
        let mut params = ParticlePreset::Default.params();
        params.animation_speed = 0.0;
        let mut system = ParticleSystem::new(500, 3);
        let before = system.particles().to_vec();
        system.advance(&params, 1.0, 0.016);
        assert_eq!(system.particles(), &before[..]);
    }

    #[test]
    fn test_expired_particle_respawns_in_place() {
        let params = ParticlePreset::Default.params();
        let mut system = ParticleSystem::new(10, 4);
        system.particles[3].age = system.particles[3].lifetime;
        let lifetime = system.particles[3].lifetime;
        let size = system.particles[3].size;

        system.advance(&params, 0.0, 0.1);
        let p = system.particles[3];
        assert_eq!(p.age, 0.0);
        assert_eq!(p.lifetime, lifetime);
        assert_eq!(p.size, size);
        assert!(p.position().length() <= crate::spawn::DISK_MAX_RADIUS);
        assert_eq!(system.count(), 10);
    }

    #[test]
    fn test_containment() {
        let noise = SimplexNoise::new(1);
        let p = step_position(&noise, Vec3::new(40.0, 0.0, 0.0), Vec3::ZERO, 1.5, 1.0 / 3.0, 0.0, 0.01);
        assert!(p.length() <= CONTAINMENT_RETURN + 1e-3);
    }

    #[test]
    fn test_plane_pull_flattens() {
        let noise = SimplexNoise::new(1);
        let start = Vec3::new(5.0, 2.0, 5.0);
        let p = step_position(&noise, start, Vec3::ZERO, 0.0, 1.0 / 3.0, 0.0, 0.5);
        assert!(p.y.abs() < start.y.abs());
    }

    #[test]
    fn test_orbit_direction() {
        // Without noise a particle on +x moves toward +z
        let noise = SimplexNoise::new(1);
        let p = step_position(&noise, Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, 0.0, 1.0, 0.0, 0.1);
        assert!(p.z > 0.0);
    }

    #[test]
    fn test_sync_count() {
        let mut system = ParticleSystem::new(100, 5);
        assert!(!system.sync_count(100));
        assert!(system.sync_count(250));
        assert_eq!(system.count(), 250);
    }
}
