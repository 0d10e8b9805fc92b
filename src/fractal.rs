//! Distance estimator for the power-N Mandelbulb.
//!
//! The recurrence runs in spherical coordinates with a running derivative,
//! giving the usual `0.5·ln(r)·r/dr` lower bound on the distance to the
//! surface. The loop is bounded by [`MAX_ITERATIONS`] and breaks early on
//! the configured count, the same shape as the fragment shader's loop.

use glam::Vec3;

use crate::params::{FractalParams, MAX_ITERATIONS};

/// Radii are clamped to at least this before division or logarithm.
pub const MIN_RADIUS: f32 = 1e-6;

/// Offset used by [`Mandelbulb::normal`].
pub const NORMAL_EPSILON: f32 = 1e-4;

/// Lower bound on the distance from `p` to the Mandelbulb surface.
///
/// `iterations` is truncated to [`MAX_ITERATIONS`]. The result is never
/// negative: points inside the set report zero.
pub fn distance_estimate(p: Vec3, power: f32, iterations: u32, bailout: f32) -> f32 {
    let mut z = p;
    let mut dr = 1.0_f32;
    let mut r = 0.0_f32;

    for i in 0..MAX_ITERATIONS {
        if i >= iterations {
            break;
        }
        r = z.length();
        if r > bailout {
            break;
        }

        let rc = r.max(MIN_RADIUS);
        let theta = z.y.atan2(z.x);
        let phi = (z.z / rc).clamp(-1.0, 1.0).acos();
        dr = rc.powf(power - 1.0) * power * dr + 1.0;

        let zr = rc.powf(power);
        let (sin_phi, cos_phi) = (phi * power).sin_cos();
        let (sin_theta, cos_theta) = (theta * power).sin_cos();
        z = zr * Vec3::new(sin_phi * cos_theta, sin_phi * sin_theta, cos_phi) + p;
    }

    let rc = r.max(MIN_RADIUS);
    let de = 0.5 * rc.ln() * r / dr;
    if de.is_finite() {
        de.max(0.0)
    } else {
        0.0
    }
}

/// The fractal-shape subset of [`FractalParams`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mandelbulb {
    pub power: f32,
    pub iterations: u32,
    pub bailout: f32,
}

impl Mandelbulb {
    pub fn new(power: f32, iterations: u32, bailout: f32) -> Self {
        Self {
            power,
            iterations: iterations.min(MAX_ITERATIONS),
            bailout,
        }
    }

    pub fn from_params(params: &FractalParams) -> Self {
        Self::new(params.power, params.iterations, params.bailout)
    }

    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        distance_estimate(p, self.power, self.iterations, self.bailout)
    }

    /// Surface normal from four tetrahedral samples of the estimator.
    ///
    /// Falls back to `fallback` where the gradient vanishes.
    pub fn normal(&self, p: Vec3, fallback: Vec3) -> Vec3 {
        let h = NORMAL_EPSILON;
        let a = Vec3::new(1.0, -1.0, -1.0);
        let b = Vec3::new(-1.0, -1.0, 1.0);
        let c = Vec3::new(-1.0, 1.0, -1.0);
        let d = Vec3::new(1.0, 1.0, 1.0);
        let gradient = a * self.distance(p + a * h)
            + b * self.distance(p + b * h)
            + c * self.distance(p + c * h)
            + d * self.distance(p + d * h);

        let n = gradient.normalize_or_zero();
        if n == Vec3::ZERO {
            fallback
        } else {
            n
        }
    }
}

impl Default for Mandelbulb {
    fn default() -> Self {
        Self::new(8.0, 9, 2.0)
    }
}
