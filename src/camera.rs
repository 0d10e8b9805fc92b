//! Orbit camera shared by both pipelines.
//!
//! The camera sits on a sphere around `target`, parameterized by yaw,
//! pitch and distance. Every mutation clamps distance to the pipeline's
//! [`CameraProfile`] range and pitch to ±[`PITCH_LIMIT`], so the look-at
//! basis never degenerates at the poles.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Pitch is kept within `(-PITCH_LIMIT, PITCH_LIMIT)`.
pub const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.1;

/// Radians of rotation per pixel of drag.
pub const ORBIT_SENSITIVITY: f32 = 0.005;

/// Exponential zoom rate per scroll line.
pub const ZOOM_RATE: f32 = 0.1;

/// World units of pan per pixel, per unit of distance.
pub const PAN_RATE: f32 = 0.002;

/// Seconds the animated reset takes.
pub const RESET_DURATION: f32 = 0.7;

/// Focal length used to build primary rays for the ray marcher.
pub const FOCAL_LENGTH: f32 = 1.5;

/// Pipeline-specific camera limits and defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProfile {
    pub min_distance: f32,
    pub max_distance: f32,
    pub home_distance: f32,
    pub home_yaw: f32,
    pub home_pitch: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Auto-rotate yaw speed in radians per second at speed 1.
    pub auto_yaw_rate: f32,
    /// Amplitude of the auto-rotate pitch wobble in radians per second.
    pub auto_pitch_rate: f32,
}

impl CameraProfile {
    /// Wide orbit around the galaxy.
    pub const PARTICLES: CameraProfile = CameraProfile {
        min_distance: 5.0,
        max_distance: 90.0,
        home_distance: 40.0,
        home_yaw: 0.0,
        home_pitch: 0.3,
        fov_y: PI / 3.0,
        near: 0.1,
        far: 100.0,
        auto_yaw_rate: 0.08,
        auto_pitch_rate: 0.03,
    };

    /// Close orbit around the Mandelbulb.
    pub const FRACTAL: CameraProfile = CameraProfile {
        min_distance: 0.5,
        max_distance: 10.0,
        home_distance: 2.5,
        home_yaw: 0.0,
        home_pitch: 0.0,
        fov_y: PI / 3.0,
        near: 0.01,
        far: 20.0,
        auto_yaw_rate: 0.3,
        auto_pitch_rate: 0.03,
    };
}

/// Orthonormal camera frame. `forward` points from the target to the eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Pose {
    yaw: f32,
    pitch: f32,
    distance: f32,
    target: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct ResetAnimation {
    from: Pose,
    elapsed: f32,
}

/// Orbit camera for viewing either pipeline.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    yaw: f32,
    pitch: f32,
    distance: f32,
    target: Vec3,
    profile: CameraProfile,
    reset: Option<ResetAnimation>,
}

impl OrbitCamera {
    /// Create a camera at the profile's home pose.
    pub fn new(profile: CameraProfile) -> Self {
        Self {
            yaw: profile.home_yaw,
            pitch: profile.home_pitch,
            distance: profile.home_distance,
            target: Vec3::ZERO,
            profile,
            reset: None,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn profile(&self) -> &CameraProfile {
        &self.profile
    }

    fn clamp(&mut self) {
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.distance = self
            .distance
            .clamp(self.profile.min_distance, self.profile.max_distance);
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Look-at frame for the current pose.
    pub fn basis(&self) -> CameraBasis {
        let forward = (self.position() - self.target).normalize_or_zero();
        let forward = if forward == Vec3::ZERO { Vec3::Z } else { forward };
        let right = Vec3::Y.cross(forward).normalize_or_zero();
        let right = if right == Vec3::ZERO { Vec3::X } else { right };
        let up = forward.cross(right);
        CameraBasis { right, up, forward }
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        let CameraBasis { right, up, forward } = self.basis();
        let eye = self.position();
        Mat4::from_cols(
            Vec4::new(right.x, up.x, forward.x, 0.0),
            Vec4::new(right.y, up.y, forward.y, 0.0),
            Vec4::new(right.z, up.z, forward.z, 0.0),
            Vec4::new(-right.dot(eye), -up.dot(eye), -forward.dot(eye), 1.0),
        )
    }

    /// Perspective projection with wgpu's `[0, 1]` depth range.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.profile.fov_y, aspect, self.profile.near, self.profile.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Primary ray direction through `uv` in `[-1, 1]²` (y up).
    pub fn ray_direction(&self, uv: Vec2, aspect: f32) -> Vec3 {
        let CameraBasis { right, up, forward } = self.basis();
        (right * uv.x * aspect + up * uv.y - forward * FOCAL_LENGTH).normalize()
    }

    // ========== Input ==========

    /// Rotate by a pointer drag, in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.reset = None;
        self.yaw -= dx * ORBIT_SENSITIVITY;
        self.pitch += dy * ORBIT_SENSITIVITY;
        self.clamp();
    }

    /// Zoom by scroll lines; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.reset = None;
        self.distance *= (-lines * ZOOM_RATE).exp();
        self.clamp();
    }

    /// Slide the target within the view plane by a drag, in pixels.
    ///
    /// Pan speed scales with distance, so close-up panning is finer.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.reset = None;
        let CameraBasis { right, up, .. } = self.basis();
        let speed = self.distance * PAN_RATE;
        self.target += (-right * dx + up * dy) * speed;
    }

    /// Advance the auto-rotate driver.
    pub fn auto_rotate(&mut self, dt: f32, time: f32, speed: f32) {
        if self.reset.is_some() {
            return;
        }
        self.yaw += self.profile.auto_yaw_rate * dt * speed;
        self.pitch += self.profile.auto_pitch_rate * dt * speed * (time * 0.2).sin();
        self.clamp();
    }

    // ========== Reset ==========

    /// Start easing back to the home pose.
    pub fn begin_reset(&mut self) {
        // Shortest way around to the home yaw
        let home = self.profile.home_yaw;
        let yaw = home + (self.yaw - home + PI).rem_euclid(TAU) - PI;
        self.reset = Some(ResetAnimation {
            from: Pose {
                yaw,
                pitch: self.pitch,
                distance: self.distance,
                target: self.target,
            },
            elapsed: 0.0,
        });
    }

    /// Whether a reset animation is running.
    pub fn is_resetting(&self) -> bool {
        self.reset.is_some()
    }

    /// Advance any running reset. Returns true while the camera is moving.
    pub fn update(&mut self, dt: f32) -> bool {
        let Some(reset) = &mut self.reset else {
            return false;
        };
        reset.elapsed += dt.max(0.0);
        let p = (reset.elapsed / RESET_DURATION).min(1.0);
        let eased = 1.0 - (1.0 - p).powi(3);
        let from = reset.from;

        let home = &self.profile;
        self.yaw = from.yaw + (home.home_yaw - from.yaw) * eased;
        self.pitch = from.pitch + (home.home_pitch - from.pitch) * eased;
        self.distance = from.distance + (home.home_distance - from.distance) * eased;
        self.target = from.target.lerp(Vec3::ZERO, eased);
        self.clamp();

        if p >= 1.0 {
            self.reset = None;
        }
        true
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraProfile::PARTICLES)
    }
}
