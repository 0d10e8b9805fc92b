//! End-to-end scenarios for the simulation, the distance estimator, the
//! ray marcher, the camera and the parameter store.

use cosmoscope::camera::{CameraProfile, OrbitCamera, PITCH_LIMIT};
use cosmoscope::fractal::distance_estimate;
use cosmoscope::params::{ParameterSet, Theme};
use cosmoscope::presets::{FractalPreset, ParameterStore, ParticlePreset, Preset, PresetMode};
use cosmoscope::raymarch::{raymarch, ShadingEnv};
use cosmoscope::spawn::{BULGE_MAX_RADIUS, DISK_MAX_RADIUS};
use cosmoscope::ParticleSystem;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// ========== Particles ==========

#[test]
fn test_age_stays_within_lifetime() {
    let mut params = ParticlePreset::Default.params();
    params.set("animationSpeed", 3.0).unwrap();
    let mut system = ParticleSystem::new(2_000, 11);

    for frame in 0..60 {
        system.advance(&params, frame as f32 * 0.5, 0.5);
        for p in system.particles() {
            assert!(p.age >= 0.0, "negative age {}", p.age);
            assert!(p.age <= p.lifetime, "age {} past lifetime {}", p.age, p.lifetime);
        }
    }
}

#[test]
fn test_respawn_is_position_bounded() {
    let mut params = ParticlePreset::Default.params();
    params.set("animationSpeed", 3.0).unwrap();
    let mut system = ParticleSystem::new(3_000, 5);
    let limit = BULGE_MAX_RADIUS.max(DISK_MAX_RADIUS);

    let mut respawned = 0;
    for frame in 0..40 {
        system.advance(&params, frame as f32, 1.0);
        for p in system.particles().iter().filter(|p| p.age == 0.0) {
            respawned += 1;
            assert!(
                p.position().length() <= limit,
                "respawned at radius {}",
                p.position().length()
            );
        }
    }
    assert!(respawned > 0, "no particle expired in 60 s of simulation time");
}

#[test]
fn test_zero_step_is_idempotent() {
    let params = ParticlePreset::Nebula.params();
    let mut system = ParticleSystem::new(1_000, 3);
    system.advance(&params, 0.0, 0.016);

    let before = system.particles().to_vec();
    system.advance(&params, 1.0, 0.0);
    let once = system.particles().to_vec();
    system.advance(&params, 2.0, 0.0);

    assert_eq!(before, once);
    assert_eq!(once, system.particles());
}

#[test]
fn test_seeded_step_is_finite() {
    let params = ParticlePreset::Default.params();
    let mut system = ParticleSystem::new(1_000, 42);
    system.advance(&params, 0.0, 0.016);

    assert_eq!(system.count(), 1_000);
    for p in system.particles() {
        assert!(p.position().is_finite(), "non-finite position {:?}", p.position);
    }
}

#[test]
fn test_same_seed_same_buffer() {
    let params = ParticlePreset::Default.params();
    let mut a = ParticleSystem::new(500, 9);
    let mut b = ParticleSystem::new(500, 9);
    for frame in 0..10 {
        a.advance(&params, frame as f32 * 0.016, 0.016);
        b.advance(&params, frame as f32 * 0.016, 0.016);
    }
    assert_eq!(a.particles(), b.particles());
}

#[test]
fn test_count_change_reinitializes_everything() {
    let mut store = ParameterStore::new(ParticlePreset::Default);
    let mut system = ParticleSystem::new(store.params().particle_count, 1);
    assert_eq!(system.count(), 45_000);

    // Let every slot age past the initial spread
    for frame in 0..20 {
        system.advance(store.params(), frame as f32, 1.0);
    }

    store.set("particleCount", 80_000.0).unwrap();
    assert!(store.tick(0.016));
    assert!(system.sync_count(store.params().particle_count));

    assert_eq!(system.count(), 80_000);
    // Fresh slots carry initial ages below 10 s and sit inside the spawn radius
    for p in system.particles() {
        assert!(p.age < 10.0);
        assert!(p.position().length() <= DISK_MAX_RADIUS);
    }
}

// ========== Fractal ==========

#[test]
fn test_distance_estimate_near_origin() {
    let d = distance_estimate(Vec3::new(0.01, 0.0, 0.0), 8.0, 9, 2.0);
    assert!(d.is_finite());
    assert!(d >= 0.0);
}

#[test]
fn test_distance_estimate_non_negative_when_sampled() {
    let mut rng = SmallRng::seed_from_u64(17);
    for _ in 0..2_000 {
        let p = Vec3::new(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
        );
        let d = distance_estimate(p, 8.0, 9, 2.0);
        assert!(d.is_finite() && d >= 0.0, "DE({:?}) = {}", p, d);
    }
}

#[test]
fn test_ray_from_front_hits_default_bulb() {
    let mut params = FractalPreset::Default.params();
    params.set("maxSteps", 100.0).unwrap();
    let env = ShadingEnv {
        theme: Theme::Dark,
        time: 0.0,
    };
    let origin = Vec3::new(0.0, 0.0, 3.0);
    let directions = [
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.05, 0.0, -1.0),
        Vec3::new(0.0, 0.05, -1.0),
        Vec3::new(-0.05, -0.05, -1.0),
    ];

    let hits = directions
        .iter()
        .filter(|d| raymarch(origin, d.normalize(), &params, &env).hit)
        .count();
    assert!(hits >= 1);
}

#[test]
fn test_ray_away_from_bulb_misses() {
    let params = FractalPreset::Default.params();
    let hit = raymarch(
        Vec3::new(0.0, 0.0, 3.0),
        Vec3::Z,
        &params,
        &ShadingEnv::default(),
    );
    assert!(!hit.hit);
    assert!(hit.color.is_finite());
}

// ========== Camera ==========

#[test]
fn test_pitch_clamped_under_any_input() {
    let mut rng = SmallRng::seed_from_u64(23);
    for profile in [CameraProfile::PARTICLES, CameraProfile::FRACTAL] {
        let mut camera = OrbitCamera::new(profile);
        for _ in 0..5_000 {
            let dx = rng.gen_range(-500.0..500.0);
            let dy = rng.gen_range(-2_000.0..2_000.0);
            camera.orbit(dx, dy);
            camera.auto_rotate(0.1, rng.gen_range(0.0..100.0), 10.0);
            assert!(camera.pitch().abs() <= PITCH_LIMIT);
            assert!(camera.pitch().abs() < std::f32::consts::FRAC_PI_2);
        }
    }
}

// ========== Presets ==========

#[test]
fn test_preset_round_trip_after_blend() {
    let mut store = ParameterStore::new(FractalPreset::Default);
    store.set("power", 3.3).unwrap();
    store.load(FractalPreset::Ocean, PresetMode::Blend);

    let mut elapsed = 0.0;
    while elapsed < 1.0 {
        store.tick(0.05);
        elapsed += 0.05;
    }

    assert!(!store.is_blending());
    assert_eq!(store.params(), &FractalPreset::Ocean.params());
    assert_eq!(store.preset(), Some(FractalPreset::Ocean));
}

#[test]
fn test_every_particle_preset_round_trips() {
    for &preset in ParticlePreset::ALL {
        let mut store = ParameterStore::new(ParticlePreset::Performance);
        store.load(preset, PresetMode::Blend);
        for _ in 0..20 {
            store.tick(0.05);
        }
        assert_eq!(store.params(), &preset.params(), "{}", preset.name());
    }
}
