//! Uniform blocks shared with the WGSL shaders.
//!
//! Both structs mirror a `struct Uniforms` declared in the matching shader
//! under `src/shaders/`. Every `vec3` is followed by a scalar so that each
//! row packs into one 16-byte slot with no implicit padding.

use bytemuck::{Pod, Zeroable};

use crate::camera::{CameraBasis, OrbitCamera};
use crate::params::{FractalParams, MAX_ITERATIONS, MAX_MARCH_STEPS, ParticleParams, Theme};
use crate::raymarch::ThemeColors;

/// Per-frame inputs of `particles.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub time: f32,
    pub particle_size: f32,
    pub color_mode: u32,
    pub color_intensity: f32,
    pub glow_intensity: f32,
    pub light_theme: u32,
}

impl ParticleUniforms {
    /// `viewport` is the offscreen target size in pixels.
    pub fn new(
        camera: &OrbitCamera,
        viewport: (u32, u32),
        params: &ParticleParams,
        theme: Theme,
        time: f32,
    ) -> Self {
        let (width, height) = (viewport.0.max(1) as f32, viewport.1.max(1) as f32);
        Self {
            view_proj: camera.view_proj(width / height).to_cols_array_2d(),
            viewport: [width, height],
            time,
            particle_size: params.particle_size,
            color_mode: params.color_mode.index(),
            color_intensity: params.color_intensity,
            glow_intensity: params.glow_intensity,
            light_theme: theme.is_light() as u32,
        }
    }
}

/// Per-frame inputs of `mandelbulb.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FractalUniforms {
    pub camera_position: [f32; 3],
    pub time: f32,
    pub camera_right: [f32; 3],
    pub aspect: f32,
    pub camera_up: [f32; 3],
    pub light_theme: u32,
    pub camera_forward: [f32; 3],
    pub power: f32,
    pub fog_color: [f32; 3],
    pub glow_strength: f32,
    pub background_color: [f32; 3],
    pub epsilon: f32,
    pub glow_color: [f32; 3],
    pub bailout: f32,
    pub iterations: u32,
    pub max_steps: u32,
    pub color_mode: u32,
    pub shininess: f32,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub color_scale: f32,
    pub color_cycles: f32,
    pub fog_density: f32,
    pub _padding: [f32; 2],
}

impl FractalUniforms {
    pub fn new(camera: &OrbitCamera, aspect: f32, params: &FractalParams, theme: Theme, time: f32) -> Self {
        let CameraBasis { right, up, forward } = camera.basis();
        let colors = ThemeColors::new(theme, params.color_mode);
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Self {
            camera_position: camera.position().to_array(),
            time,
            camera_right: right.to_array(),
            aspect,
            camera_up: up.to_array(),
            light_theme: theme.is_light() as u32,
            camera_forward: forward.to_array(),
            power: params.power,
            fog_color: colors.fog.to_array(),
            glow_strength: colors.glow_strength,
            background_color: colors.background.to_array(),
            epsilon: params.epsilon,
            glow_color: colors.glow.to_array(),
            bailout: params.bailout,
            iterations: params.iterations.min(MAX_ITERATIONS),
            max_steps: params.max_steps.min(MAX_MARCH_STEPS),
            color_mode: params.color_mode.index(),
            shininess: params.shininess,
            ambient: params.ambient,
            diffuse: params.diffuse,
            specular: params.specular,
            color_scale: params.color_scale,
            color_cycles: params.color_cycles,
            fog_density: params.fog_density,
            _padding: [0.0; 2],
        }
    }
}
