//! Seeded 3D simplex noise and its time-advected curl.
//!
//! [`SimplexNoise::noise3`] is Gustavson's simplex noise over a permutation
//! table shuffled from a seed. [`curl3`] differentiates it numerically to
//! get the flow field particles are advected through.
//!
//! Neither function allocates; the permutation tables are built once.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Default finite-difference step for [`curl3`].
pub const CURL_EPSILON: f32 = 1e-4;

/// Weight of the cross-axis detail term added to the curl.
pub const DETAIL_WEIGHT: f32 = 0.3;

const F3: f32 = 1.0 / 3.0;
const G3: f32 = 1.0 / 6.0;

const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// Deterministic simplex noise for one seed.
#[derive(Debug, Clone)]
pub struct SimplexNoise {
    perm: [u8; 512],
    perm_mod12: [u8; 512],
}

impl SimplexNoise {
    /// Build the permutation tables for `seed`.
    pub fn new(seed: u64) -> Self {
        let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
        table.shuffle(&mut SmallRng::seed_from_u64(seed));

        let mut perm = [0u8; 512];
        let mut perm_mod12 = [0u8; 512];
        for i in 0..512 {
            perm[i] = table[i & 255];
            perm_mod12[i] = perm[i] % 12;
        }
        Self { perm, perm_mod12 }
    }

    #[inline]
    fn corner(&self, gradient: usize, x: f32, y: f32, z: f32) -> f32 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            return 0.0;
        }
        let g = GRAD3[self.perm_mod12[gradient] as usize];
        let t2 = t * t;
        t2 * t2 * (g[0] * x + g[1] * y + g[2] * z)
    }

    /// Sample the noise field. Output lies in `[-1, 1]`.
    pub fn noise3(&self, x: f32, y: f32, z: f32) -> f32 {
        // Skew into simplex cell space
        let s = (x + y + z) * F3;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();
        let t = (i + j + k) * G3;

        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let z0 = z - (k - t);

        // Which of the six tetrahedra we are in
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f32 + G3;
        let y1 = y0 - j1 as f32 + G3;
        let z1 = z0 - k1 as f32 + G3;
        let x2 = x0 - i2 as f32 + 2.0 * G3;
        let y2 = y0 - j2 as f32 + 2.0 * G3;
        let z2 = z0 - k2 as f32 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i as i32 & 255) as usize;
        let jj = (j as i32 & 255) as usize;
        let kk = (k as i32 & 255) as usize;
        let p = &self.perm;

        let g0 = ii + p[jj + p[kk] as usize] as usize;
        let g1 = ii + i1 + p[jj + j1 + p[kk + k1] as usize] as usize;
        let g2 = ii + i2 + p[jj + j2 + p[kk + k2] as usize] as usize;
        let g3 = ii + 1 + p[jj + 1 + p[kk + 1] as usize] as usize;

        let n = self.corner(g0, x0, y0, z0)
            + self.corner(g1, x1, y1, z1)
            + self.corner(g2, x2, y2, z2)
            + self.corner(g3, x3, y3, z3);

        (32.0 * n).clamp(-1.0, 1.0)
    }

    #[inline]
    fn sample(&self, p: Vec3) -> f32 {
        self.noise3(p.x, p.y, p.z)
    }
}

/// Numerical curl of the noise field advected by `time`.
///
/// The sample point drifts with time at different rates per axis. Six
/// central differences give the curl, normalized by `1/(2ε)`; three
/// cross-axis differences add an unnormalized detail term weighted by
/// [`DETAIL_WEIGHT`].
pub fn curl3(noise: &SimplexNoise, p: Vec3, time: f32, epsilon: f32) -> Vec3 {
    let q = Vec3::new(p.x + time, p.y + time * 0.8, p.z + time * 1.2);
    let e = epsilon;
    let dx = Vec3::new(e, 0.0, 0.0);
    let dy = Vec3::new(0.0, e, 0.0);
    let dz = Vec3::new(0.0, 0.0, e);

    let n1 = noise.sample(q + dx) - noise.sample(q - dx);
    let n2 = noise.sample(q + dy) - noise.sample(q - dy);
    let n3 = noise.sample(q + dz) - noise.sample(q - dz);
    let n4 = noise.sample(q + dy + dz) - noise.sample(q - dy - dz);
    let n5 = noise.sample(q + dx + dz) - noise.sample(q - dx - dz);
    let n6 = noise.sample(q + dx + dy) - noise.sample(q - dx - dy);

    let inv = 1.0 / (2.0 * e);
    Vec3::new(
        (n2 - n3) * inv + (n4 - n6) * DETAIL_WEIGHT,
        (n3 - n1) * inv + (n5 - n4) * DETAIL_WEIGHT,
        (n1 - n2) * inv + (n6 - n5) * DETAIL_WEIGHT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_noise_deterministic() {
        let a = SimplexNoise::new(7);
        let b = SimplexNoise::new(7);
        for i in 0..50 {
            let x = i as f32 * 0.37 - 5.0;
            assert_eq!(a.noise3(x, x * 0.5, -x), b.noise3(x, x * 0.5, -x));
        }
    }

    #[test]
    fn test_noise_range() {
        let noise = SimplexNoise::new(1);
        let mut rng = SmallRng::seed_from_u64(99);
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for _ in 0..10_000 {
            let v = noise.noise3(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
            );
            assert!((-1.0..=1.0).contains(&v));
            min = min.min(v);
            max = max.max(v);
        }
        // Not a constant field
        assert!(max - min > 0.5);
    }

    #[test]
    fn test_noise_zero_at_lattice_origin() {
        let noise = SimplexNoise::new(3);
        assert!(noise.noise3(0.0, 0.0, 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_seeds_differ() {
        let a = SimplexNoise::new(1);
        let b = SimplexNoise::new(2);
        let differs = (0..20).any(|i| {
            let x = i as f32 * 0.71 + 0.3;
            a.noise3(x, 1.3, 2.9) != b.noise3(x, 1.3, 2.9)
        });
        assert!(differs);
    }

    #[test]
    fn test_noise_is_continuous() {
        let noise = SimplexNoise::new(11);
        let a = noise.noise3(1.234, 5.678, -0.9);
        let b = noise.noise3(1.234 + 1e-3, 5.678, -0.9);
        assert!((a - b).abs() < 0.05);
    }

    #[test]
    fn test_curl_finite_and_deterministic() {
        let noise = SimplexNoise::new(42);
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..500 {
            let p = Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-10.0..10.0),
            );
            let c = curl3(&noise, p, 3.5, CURL_EPSILON);
            assert!(c.is_finite());
            assert_eq!(c, curl3(&noise, p, 3.5, CURL_EPSILON));
        }
    }

    #[test]
    fn test_curl_changes_with_time() {
        let noise = SimplexNoise::new(42);
        let p = Vec3::new(0.4, 0.2, -0.7);
        assert_ne!(curl3(&noise, p, 0.0, CURL_EPSILON), curl3(&noise, p, 1.0, CURL_EPSILON));
    }
}
