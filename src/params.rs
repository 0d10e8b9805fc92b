//! The parameter store.
//!
//! Each pipeline has one flat set of named knobs. External collaborators
//! (input handlers, presets, the CLI) mutate it between ticks; the render
//! loop reads it once per frame. Values outside a field's documented range
//! are clamped to the nearest bound rather than rejected.
//!
//! ```ignore
//! let mut params = ParticleParams::default();
//! params.set("noiseScale", 4.0)?;
//! params.set("particleCount", 1.0e9)?; // clamped to 200000
//! ```

use std::fmt;

use crate::error::ParamError;

/// Hard ceiling on the particle state buffer length.
pub const MAX_PARTICLES: u32 = 200_000;

/// Hard cap on Mandelbulb iterations; the shader loop unrolls to this bound.
pub const MAX_ITERATIONS: u32 = 16;

/// Hard cap on ray-march steps per pixel.
pub const MAX_MARCH_STEPS: u32 = 200;

/// How a field's value is quantized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any value in range.
    Continuous,
    /// Rounded to the nearest whole number; interpolates during preset blends.
    Integer,
    /// Discrete choice; switches instantly during preset blends.
    Enum,
}

/// Documented range of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// camelCase field name used by presets, input and the CLI.
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    /// Slider granularity.
    pub step: f32,
    pub kind: FieldKind,
}

impl ParamSpec {
    const fn continuous(name: &'static str, min: f32, max: f32, step: f32) -> Self {
        Self { name, min, max, step, kind: FieldKind::Continuous }
    }

    const fn integer(name: &'static str, min: f32, max: f32, step: f32) -> Self {
        Self { name, min, max, step, kind: FieldKind::Integer }
    }

    const fn choice(name: &'static str, variants: u32) -> Self {
        Self {
            name,
            min: 0.0,
            max: (variants - 1) as f32,
            step: 1.0,
            kind: FieldKind::Enum,
        }
    }

    /// Clamp a raw value into this field's range, rounding discrete kinds.
    ///
    /// Non-finite input falls back to the minimum.
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.min;
        }
        let v = value.clamp(self.min, self.max);
        match self.kind {
            FieldKind::Continuous => v,
            FieldKind::Integer | FieldKind::Enum => v.round(),
        }
    }
}

/// A family of named numeric knobs.
pub trait ParameterSet: Clone + PartialEq + fmt::Debug {
    /// The field table, in display order.
    const FIELDS: &'static [ParamSpec];

    /// Read a field by name.
    fn get(&self, name: &str) -> Option<f32>;

    /// Store an already-clamped value. Returns false for unknown names.
    fn write(&mut self, name: &str, value: f32) -> bool;

    /// Look up a field's range.
    fn spec(name: &str) -> Option<&'static ParamSpec> {
        Self::FIELDS.iter().find(|s| s.name == name)
    }

    /// Set a field, clamping to its range. Returns the value actually stored.
    fn set(&mut self, name: &str, value: f32) -> Result<f32, ParamError> {
        let spec = Self::spec(name).ok_or_else(|| ParamError::UnknownField(name.to_string()))?;
        let applied = spec.clamp(value);
        if applied != value {
            log::debug!("{} = {} is outside [{}, {}], using {}", name, value, spec.min, spec.max, applied);
        }
        self.write(name, applied);
        Ok(applied)
    }

    /// Parse and apply a `name=value` assignment.
    fn assign(&mut self, text: &str) -> Result<f32, ParamError> {
        let (name, value) = text
            .split_once('=')
            .ok_or_else(|| ParamError::Malformed(text.to_string()))?;
        let value: f32 = value
            .trim()
            .parse()
            .map_err(|_| ParamError::Malformed(text.to_string()))?;
        self.set(name.trim(), value)
    }

    /// Clamp every field into range.
    fn sanitize(&mut self) {
        for spec in Self::FIELDS {
            if let Some(value) = self.get(spec.name) {
                self.write(spec.name, spec.clamp(value));
            }
        }
    }
}

/// Color scheme for the particle pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleColorMode {
    #[default]
    CosmicBlue,
    NebulaPurple,
    Aurora,
    Moonlight,
    Sunset,
    Rainbow,
    /// Star temperature tiers with twinkle.
    Galaxy,
}

impl ParticleColorMode {
    pub const ALL: [ParticleColorMode; 7] = [
        ParticleColorMode::CosmicBlue,
        ParticleColorMode::NebulaPurple,
        ParticleColorMode::Aurora,
        ParticleColorMode::Moonlight,
        ParticleColorMode::Sunset,
        ParticleColorMode::Rainbow,
        ParticleColorMode::Galaxy,
    ];

    /// Map an index to a mode, saturating at the last one.
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index as usize).min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Color scheme for the fractal pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FractalColorMode {
    #[default]
    Grayscale,
    Fiery,
    Ocean,
    Monochrome,
    Midnight,
    Neon,
    Rainbow,
}

impl FractalColorMode {
    pub const ALL: [FractalColorMode; 7] = [
        FractalColorMode::Grayscale,
        FractalColorMode::Fiery,
        FractalColorMode::Ocean,
        FractalColorMode::Monochrome,
        FractalColorMode::Midnight,
        FractalColorMode::Neon,
        FractalColorMode::Rainbow,
    ];

    /// Map an index to a mode, saturating at the last one.
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index as usize).min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Light or dark presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn is_light(self) -> bool {
        self == Theme::Light
    }
}

/// Knobs for the galaxy particle pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleParams {
    /// Live slots in the state buffer. Changing it reinitializes the buffer.
    pub particle_count: u32,
    pub particle_size: f32,
    pub animation_speed: f32,
    /// Spatial period of the noise field; sample coordinates are divided by it.
    pub noise_scale: f32,
    pub curl_intensity: f32,
    pub turbulence: f32,
    pub color_mode: ParticleColorMode,
    pub color_intensity: f32,
    pub glow_intensity: f32,
    /// Render-scale factor applied to the viewport.
    pub quality: f32,
}

impl ParameterSet for ParticleParams {
    const FIELDS: &'static [ParamSpec] = &[
        ParamSpec::integer("particleCount", 1.0, MAX_PARTICLES as f32, 1000.0),
        ParamSpec::continuous("particleSize", 0.1, 5.0, 0.1),
        ParamSpec::continuous("animationSpeed", 0.0, 3.0, 0.05),
        ParamSpec::continuous("noiseScale", 0.5, 10.0, 0.1),
        ParamSpec::continuous("curlIntensity", 0.0, 5.0, 0.1),
        ParamSpec::continuous("turbulence", 0.0, 2.0, 0.01),
        ParamSpec::choice("colorMode", 7),
        ParamSpec::continuous("colorIntensity", 0.1, 2.0, 0.1),
        ParamSpec::continuous("glowIntensity", 0.0, 3.0, 0.1),
        ParamSpec::continuous("quality", 0.25, 1.0, 0.05),
    ];

    fn get(&self, name: &str) -> Option<f32> {
        Some(match name {
            "particleCount" => self.particle_count as f32,
            "particleSize" => self.particle_size,
            "animationSpeed" => self.animation_speed,
            "noiseScale" => self.noise_scale,
            "curlIntensity" => self.curl_intensity,
            "turbulence" => self.turbulence,
            "colorMode" => self.color_mode.index() as f32,
            "colorIntensity" => self.color_intensity,
            "glowIntensity" => self.glow_intensity,
            "quality" => self.quality,
            _ => return None,
        })
    }

    fn write(&mut self, name: &str, value: f32) -> bool {
        match name {
            "particleCount" => self.particle_count = value as u32,
            "particleSize" => self.particle_size = value,
            "animationSpeed" => self.animation_speed = value,
            "noiseScale" => self.noise_scale = value,
            "curlIntensity" => self.curl_intensity = value,
            "turbulence" => self.turbulence = value,
            "colorMode" => self.color_mode = ParticleColorMode::from_index(value as u32),
            "colorIntensity" => self.color_intensity = value,
            "glowIntensity" => self.glow_intensity = value,
            "quality" => self.quality = value,
            _ => return false,
        }
        true
    }
}

/// Knobs for the Mandelbulb pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FractalParams {
    /// Exponent of the Mandelbulb recurrence.
    pub power: f32,
    /// Configured iteration count, never above [`MAX_ITERATIONS`].
    pub iterations: u32,
    /// Ray-march step budget, never above [`MAX_MARCH_STEPS`].
    pub max_steps: u32,
    /// Hit tolerance, scaled by distance travelled.
    pub epsilon: f32,
    pub bailout: f32,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
    pub color_mode: FractalColorMode,
    pub color_scale: f32,
    pub color_cycles: f32,
    pub fog_density: f32,
    pub quality: f32,
}

impl FractalParams {
    /// Finest hit tolerance reachable with the detail shortcut.
    pub const MIN_EPSILON: f32 = 0.0001;
    /// Coarsest hit tolerance reachable with the detail shortcut.
    pub const MAX_EPSILON: f32 = 0.01;

    /// Tighten the hit tolerance by 20%.
    pub fn refine_detail(&mut self) {
        self.epsilon = (self.epsilon * 0.8).max(Self::MIN_EPSILON);
    }

    /// Loosen the hit tolerance by 25%.
    pub fn coarsen_detail(&mut self) {
        self.epsilon = (self.epsilon * 1.25).min(Self::MAX_EPSILON);
    }
}

impl ParameterSet for FractalParams {
    const FIELDS: &'static [ParamSpec] = &[
        ParamSpec::continuous("power", 1.0, 16.0, 0.1),
        ParamSpec::integer("iterations", 1.0, MAX_ITERATIONS as f32, 1.0),
        ParamSpec::integer("maxSteps", 10.0, MAX_MARCH_STEPS as f32, 1.0),
        ParamSpec::continuous("epsilon", FractalParams::MIN_EPSILON, FractalParams::MAX_EPSILON, 0.0001),
        ParamSpec::continuous("bailout", 1.0, 10.0, 0.1),
        ParamSpec::continuous("ambient", 0.0, 1.0, 0.01),
        ParamSpec::continuous("diffuse", 0.0, 1.0, 0.01),
        ParamSpec::continuous("specular", 0.0, 1.0, 0.01),
        ParamSpec::continuous("shininess", 1.0, 100.0, 1.0),
        ParamSpec::choice("colorMode", 7),
        ParamSpec::continuous("colorScale", 0.1, 3.0, 0.1),
        ParamSpec::continuous("colorCycles", 1.0, 10.0, 0.5),
        ParamSpec::continuous("fogDensity", 0.0, 1.0, 0.01),
        ParamSpec::continuous("quality", 0.25, 1.0, 0.05),
    ];

    fn get(&self, name: &str) -> Option<f32> {
        Some(match name {
            "power" => self.power,
            "iterations" => self.iterations as f32,
            "maxSteps" => self.max_steps as f32,
            "epsilon" => self.epsilon,
            "bailout" => self.bailout,
            "ambient" => self.ambient,
            "diffuse" => self.diffuse,
            "specular" => self.specular,
            "shininess" => self.shininess,
            "colorMode" => self.color_mode.index() as f32,
            "colorScale" => self.color_scale,
            "colorCycles" => self.color_cycles,
            "fogDensity" => self.fog_density,
            "quality" => self.quality,
            _ => return None,
        })
    }

    fn write(&mut self, name: &str, value: f32) -> bool {
        match name {
            "power" => self.power = value,
            "iterations" => self.iterations = value as u32,
            "maxSteps" => self.max_steps = value as u32,
            "epsilon" => self.epsilon = value,
            "bailout" => self.bailout = value,
            "ambient" => self.ambient = value,
            "diffuse" => self.diffuse = value,
            "specular" => self.specular = value,
            "shininess" => self.shininess = value,
            "colorMode" => self.color_mode = FractalColorMode::from_index(value as u32),
            "colorScale" => self.color_scale = value,
            "colorCycles" => self.color_cycles = value,
            "fogDensity" => self.fog_density = value,
            "quality" => self.quality = value,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{FractalPreset, ParticlePreset, Preset};

    #[test]
    fn test_set_clamps_to_range() {
        let mut params = ParticlePreset::Default.params();
        assert_eq!(params.set("particleCount", 1.0e9), Ok(MAX_PARTICLES as f32));
        assert_eq!(params.particle_count, MAX_PARTICLES);

        assert_eq!(params.set("noiseScale", -3.0), Ok(0.5));
        assert_eq!(params.noise_scale, 0.5);
    }

    #[test]
    fn test_set_unknown_field() {
        let mut params = FractalPreset::Default.params();
        let before = params.clone();
        assert_eq!(
            params.set("warpFactor", 9.0),
            Err(ParamError::UnknownField("warpFactor".into()))
        );
        assert_eq!(params, before);
    }

    #[test]
    fn test_iterations_never_exceed_cap() {
        let mut params = FractalPreset::Default.params();
        params.set("iterations", 64.0).unwrap();
        assert_eq!(params.iterations, MAX_ITERATIONS);
        params.set("maxSteps", 5000.0).unwrap();
        assert_eq!(params.max_steps, MAX_MARCH_STEPS);
    }

    #[test]
    fn test_integer_fields_round() {
        let mut params = FractalPreset::Default.params();
        assert_eq!(params.set("iterations", 6.6), Ok(7.0));
        assert_eq!(params.iterations, 7);
    }

    #[test]
    fn test_color_modes_are_namespaced() {
        let mut particles = ParticlePreset::Default.params();
        let mut fractal = FractalPreset::Default.params();
        particles.set("colorMode", 6.0).unwrap();
        particles.set("quality", 0.5).unwrap();
        assert_eq!(particles.color_mode, ParticleColorMode::Galaxy);
        assert_eq!(fractal.color_mode, FractalColorMode::Grayscale);
        assert_eq!(fractal.quality, 1.0);

        fractal.set("colorMode", 40.0).unwrap();
        assert_eq!(fractal.color_mode, FractalColorMode::Rainbow);
    }

    #[test]
    fn test_non_finite_falls_back_to_min() {
        let mut params = ParticlePreset::Default.params();
        assert_eq!(params.set("turbulence", f32::NAN), Ok(0.0));
    }

    #[test]
    fn test_assign() {
        let mut params = FractalPreset::Default.params();
        assert_eq!(params.assign("power = 4.5"), Ok(4.5));
        assert_eq!(params.power, 4.5);
        assert!(matches!(params.assign("power"), Err(ParamError::Malformed(_))));
        assert!(matches!(params.assign("power=abc"), Err(ParamError::Malformed(_))));
    }

    #[test]
    fn test_every_field_round_trips_through_get() {
        let params = ParticlePreset::Nebula.params();
        for spec in ParticleParams::FIELDS {
            let value = params.get(spec.name).unwrap();
            let mut copy = params.clone();
            copy.write(spec.name, value);
            assert_eq!(copy, params, "{}", spec.name);
        }
        let params = FractalPreset::Midnight.params();
        for spec in FractalParams::FIELDS {
            assert!(params.get(spec.name).is_some(), "{}", spec.name);
        }
    }

    #[test]
    fn test_detail_adjustment_bounds() {
        let mut params = FractalPreset::Default.params();
        for _ in 0..100 {
            params.refine_detail();
        }
        assert_eq!(params.epsilon, FractalParams::MIN_EPSILON);
        for _ in 0..100 {
            params.coarsen_detail();
        }
        assert_eq!(params.epsilon, FractalParams::MAX_EPSILON);
    }

    #[test]
    fn test_sanitize() {
        let mut params = FractalPreset::Default.params();
        params.iterations = 99;
        params.epsilon = 0.0;
        params.sanitize();
        assert_eq!(params.iterations, MAX_ITERATIONS);
        assert_eq!(params.epsilon, FractalParams::MIN_EPSILON);
    }
}
