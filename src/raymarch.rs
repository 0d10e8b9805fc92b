//! Sphere tracing and shading of the Mandelbulb.
//!
//! This is the CPU twin of `shaders/mandelbulb.wgsl`: same constants, same
//! bounded loop with early exit, same lighting. The window renders with the
//! shader; this module is used by tests, benchmarks and anything that needs
//! to probe the surface from the host.

use glam::{Vec3, Vec4};

use crate::fractal::Mandelbulb;
use crate::params::{FractalColorMode, FractalParams, Theme, MAX_MARCH_STEPS};

/// Distance along the ray where marching starts.
pub const START_DISTANCE: f32 = 0.01;

/// Rays that travel further than this are treated as misses.
pub const MAX_DISTANCE: f32 = 20.0;

/// Smallest advance per step, so the march cannot stall.
pub const MIN_STEP: f32 = 0.005;

/// Primary light direction (unnormalized).
pub const KEY_LIGHT: Vec3 = Vec3::new(1.0, 0.8, 0.6);

/// Secondary light direction (unnormalized).
pub const FILL_LIGHT: Vec3 = Vec3::new(-0.5, 0.2, 0.3);

/// Per-frame inputs to shading that are not fractal parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadingEnv {
    pub theme: Theme,
    /// Seconds since start, drives the palette shimmer and glow pulse.
    pub time: f32,
}

/// Result of marching one ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub hit: bool,
    /// Final RGBA, alpha always 1.
    pub color: Vec4,
    /// Sum of the distance estimates along the ray.
    pub distance_traveled: f32,
    /// Ray parameter at the hit (or where marching stopped).
    pub t: f32,
    pub steps: u32,
}

/// Fog, background and glow colors for one theme and color mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeColors {
    pub fog: Vec3,
    pub background: Vec3,
    pub glow: Vec3,
    /// Glow strength multiplier.
    pub glow_strength: f32,
}

impl ThemeColors {
    pub fn new(theme: Theme, mode: FractalColorMode) -> Self {
        use FractalColorMode as M;
        match theme {
            Theme::Dark => Self {
                fog: match mode {
                    M::Fiery => Vec3::new(0.03, 0.01, 0.01),
                    M::Ocean => Vec3::new(0.01, 0.02, 0.05),
                    M::Neon => Vec3::new(0.02, 0.0, 0.08),
                    _ => Vec3::new(0.01, 0.01, 0.03),
                },
                background: match mode {
                    M::Fiery => Vec3::new(0.02, 0.0, 0.01),
                    M::Ocean => Vec3::new(0.0, 0.01, 0.03),
                    M::Neon => Vec3::new(0.01, 0.0, 0.04),
                    _ => Vec3::new(0.0, 0.0, 0.02),
                },
                glow: match mode {
                    M::Grayscale => Vec3::new(0.4, 0.4, 0.4),
                    M::Fiery => Vec3::new(0.5, 0.3, 0.2),
                    M::Ocean => Vec3::new(0.2, 0.3, 0.6),
                    M::Neon => Vec3::new(0.4, 0.0, 0.7),
                    _ => Vec3::new(0.3, 0.3, 0.4),
                },
                glow_strength: 0.4,
            },
            Theme::Light => Self {
                fog: match mode {
                    M::Fiery => Vec3::new(0.98, 0.95, 0.93),
                    M::Ocean => Vec3::new(0.95, 0.97, 1.0),
                    M::Neon => Vec3::new(0.97, 0.95, 1.0),
                    _ => Vec3::new(0.95, 0.95, 0.97),
                },
                background: match mode {
                    M::Fiery => Vec3::new(0.99, 0.97, 0.96),
                    M::Ocean => Vec3::new(0.96, 0.98, 1.0),
                    M::Neon => Vec3::new(0.98, 0.96, 1.0),
                    _ => Vec3::new(0.97, 0.97, 0.99),
                },
                glow: match mode {
                    M::Grayscale => Vec3::new(0.7, 0.7, 0.7),
                    M::Fiery => Vec3::new(0.8, 0.5, 0.3),
                    M::Ocean => Vec3::new(0.4, 0.6, 0.9),
                    M::Neon => Vec3::new(0.6, 0.3, 0.9),
                    _ => Vec3::new(0.6, 0.6, 0.7),
                },
                glow_strength: 0.2,
            },
        }
    }
}

/// Surface color for palette coordinate `t`.
pub fn palette(t: f32, params: &FractalParams, time: f32) -> Vec3 {
    use std::f32::consts::TAU;
    let t = (t * params.color_scale).fract();
    let cycles = params.color_cycles;

    let col = match params.color_mode {
        FractalColorMode::Grayscale => Vec3::splat(0.2 + 0.6 * t),
        FractalColorMode::Fiery => Vec3::new(
            0.5 + 0.5 * (t * 3.0 * cycles).sin(),
            0.2 + 0.3 * (t * 2.5 * cycles + 0.5).sin(),
            0.1 + 0.2 * (t * 2.0 * cycles + 1.0).sin(),
        ),
        FractalColorMode::Ocean => Vec3::new(
            0.1 + 0.1 * (t * 3.0 * cycles).sin(),
            0.2 + 0.2 * (t * 5.0 * cycles + 1.0).sin(),
            0.3 + 0.5 * (t * cycles + 2.0).sin(),
        ),
        FractalColorMode::Monochrome => {
            let v = 0.1 + 0.25 * t;
            Vec3::new(v, v * 1.05, v * 1.1)
        }
        FractalColorMode::Midnight => Vec3::new(
            0.1 + 0.2 * (t * TAU).sin(),
            0.2 + 0.2 * (t * TAU + 2.0).sin(),
            0.4 + 0.4 * (t * TAU + 4.0).sin(),
        ),
        FractalColorMode::Neon => Vec3::new(
            0.1 + 0.3 * (t * cycles * 0.8 + 2.0).sin(),
            0.2 * (t * cycles * 1.5 + 4.0).sin(),
            0.5 + 0.5 * (t * cycles * 0.7).sin(),
        ),
        FractalColorMode::Rainbow => Vec3::new(
            0.5 + 0.5 * (t * TAU).sin(),
            0.5 + 0.5 * (t * TAU + 2.0).sin(),
            0.5 + 0.5 * (t * TAU + 4.0).sin(),
        ),
    };

    let shimmer = (time * 0.2).sin() * 0.05;
    (col + Vec3::splat(shimmer)).clamp(Vec3::ZERO, Vec3::ONE)
}

/// March one ray against the Mandelbulb and shade the result.
///
/// `direction` must be normalized.
pub fn raymarch(origin: Vec3, direction: Vec3, params: &FractalParams, env: &ShadingEnv) -> RayHit {
    let bulb = Mandelbulb::from_params(params);
    let max_steps = params.max_steps.min(MAX_MARCH_STEPS);
    let colors = ThemeColors::new(env.theme, params.color_mode);

    let mut t = START_DISTANCE;
    let mut glow = 0.0_f32;
    let mut ao = 0.0_f32;
    let mut traveled = 0.0_f32;
    let mut steps = 0_u32;

    // Larger strides when the camera is far out
    let adaptive = 0.5 + 0.5 * (1.0 - (-origin.length() * 0.1).exp());

    for i in 0..MAX_MARCH_STEPS {
        if i >= max_steps {
            break;
        }
        steps += 1;

        let pos = origin + direction * t;
        let d = bulb.distance(pos);
        traveled += d;
        glow += 1.0 / (1.0 + d * d * 100.0) * (1.0 - i as f32 / max_steps as f32);
        ao += d * (-(i as f32) * 0.05).exp();

        if d < params.epsilon * t {
            let ao_factor = (ao / steps as f32).clamp(0.0, 1.0);
            let color = shade(&bulb, pos, direction, t, traveled, ao_factor, params, env, &colors);
            return RayHit {
                hit: true,
                color: color.extend(1.0),
                distance_traveled: traveled,
                t,
                steps,
            };
        }

        if t > MAX_DISTANCE {
            break;
        }
        t += (d * adaptive).max(MIN_STEP);
    }

    let pulse = 0.95 + 0.05 * (env.time * 0.5).sin();
    let glow_factor = (glow * 0.01).powf(1.5) * colors.glow_strength * pulse;
    RayHit {
        hit: false,
        color: colors.background.lerp(colors.glow, glow_factor).extend(1.0),
        distance_traveled: traveled,
        t,
        steps,
    }
}

#[allow(clippy::too_many_arguments)]
fn shade(
    bulb: &Mandelbulb,
    pos: Vec3,
    direction: Vec3,
    t: f32,
    traveled: f32,
    ao_factor: f32,
    params: &FractalParams,
    env: &ShadingEnv,
    colors: &ThemeColors,
) -> Vec3 {
    let view = -direction;
    let normal = bulb.normal(pos, view);
    let key = KEY_LIGHT.normalize();
    let fill = FILL_LIGHT.normalize();
    let half_key = (key + view).normalize_or_zero();
    let half_fill = (fill + view).normalize_or_zero();

    let diffuse_key = normal.dot(key).max(0.0);
    let diffuse_fill = normal.dot(fill).max(0.0) * 0.4;
    let specular_key = normal.dot(half_key).max(0.0).powf(params.shininess);
    let specular_fill = normal.dot(half_fill).max(0.0).powf(params.shininess) * 0.3;
    let fresnel = (1.0 - normal.dot(view).max(0.0)).powi(4);

    let palette_t = 0.5 + 0.5 * (pos.length() * 3.0 + traveled * 0.1).sin();
    let base = palette(palette_t, params, env.time);

    let mut color = base * params.ambient * (0.5 + 0.5 * ao_factor);
    color += base * params.diffuse * diffuse_key;
    color += base * params.diffuse * 0.5 * diffuse_fill;
    color += Vec3::new(1.0, 0.98, 0.95) * params.specular * specular_key;
    color += Vec3::new(0.9, 0.95, 1.0) * params.specular * specular_fill;
    color += base * fresnel * 0.3;

    let fog = 1.0 - (-t * params.fog_density).exp();
    color.lerp(colors.fog, fog)
}
