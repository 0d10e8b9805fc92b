//! Named parameter snapshots and eased blending between them.
//!
//! Presets are closed sets: one enum per pipeline. Loading a preset either
//! replaces the parameters at once or starts a [`PresetTransition`] that
//! lerps every numeric field over [`BLEND_DURATION`] seconds. Enum fields
//! (color modes) switch when the blend starts. When the blend finishes the
//! exact snapshot is assigned, so reading the parameters back afterwards
//! yields the preset's values bit for bit.

use std::fmt;

use crate::error::ParamError;
use crate::params::{
    FieldKind, FractalColorMode, FractalParams, ParameterSet, ParticleColorMode, ParticleParams,
};

/// Seconds a blended preset load takes.
pub const BLEND_DURATION: f32 = 0.8;

/// Cubic ease-in-out on `[0, 1]`.
pub fn ease_in_out_cubic(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        4.0 * p * p * p
    } else {
        1.0 - (-2.0 * p + 2.0).powi(3) / 2.0
    }
}

/// A closed, enumerable set of named snapshots.
pub trait Preset: Copy + PartialEq + fmt::Debug + 'static {
    type Params: ParameterSet;

    /// Every preset, in menu order.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn params(self) -> Self::Params;

    /// Case-insensitive lookup by name.
    fn from_name(name: &str) -> Result<Self, ParamError> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParamError::UnknownPreset(name.to_string()))
    }
}

/// Presets for the galaxy particle pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticlePreset {
    Default,
    Nebula,
    Galaxy,
    Stardust,
    Energetic,
    Performance,
}

impl Preset for ParticlePreset {
    type Params = ParticleParams;

    const ALL: &'static [Self] = &[
        ParticlePreset::Default,
        ParticlePreset::Nebula,
        ParticlePreset::Galaxy,
        ParticlePreset::Stardust,
        ParticlePreset::Energetic,
        ParticlePreset::Performance,
    ];

    fn name(self) -> &'static str {
        match self {
            ParticlePreset::Default => "default",
            ParticlePreset::Nebula => "nebula",
            ParticlePreset::Galaxy => "galaxy",
            ParticlePreset::Stardust => "stardust",
            ParticlePreset::Energetic => "energetic",
            ParticlePreset::Performance => "performance",
        }
    }

    fn params(self) -> ParticleParams {
        let (count, size, speed, noise, curl, turb, mode, color, glow, quality) = match self {
            ParticlePreset::Default => (45_000, 2.0, 1.0, 3.0, 1.5, 0.5, 0, 0.8, 1.0, 1.0),
            ParticlePreset::Nebula => (80_000, 1.8, 0.7, 2.5, 1.8, 0.8, 1, 1.2, 1.5, 1.0),
            ParticlePreset::Galaxy => (150_000, 0.8, 0.05, 8.0, 0.3, 0.02, 6, 1.4, 1.8, 1.0),
            ParticlePreset::Stardust => (150_000, 1.0, 1.2, 2.0, 1.0, 0.6, 3, 0.7, 0.8, 1.0),
            ParticlePreset::Energetic => (70_000, 2.2, 1.5, 1.5, 2.5, 1.2, 4, 1.5, 1.8, 1.0),
            ParticlePreset::Performance => (20_000, 3.0, 0.8, 5.0, 1.0, 0.3, 0, 0.7, 0.6, 0.5),
        };
        ParticleParams {
            particle_count: count,
            particle_size: size,
            animation_speed: speed,
            noise_scale: noise,
            curl_intensity: curl,
            turbulence: turb,
            color_mode: ParticleColorMode::from_index(mode),
            color_intensity: color,
            glow_intensity: glow,
            quality,
        }
    }
}

/// Presets for the Mandelbulb pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractalPreset {
    Default,
    Psychedelic,
    Fiery,
    Ocean,
    Performance,
    Midnight,
}

impl Preset for FractalPreset {
    type Params = FractalParams;

    const ALL: &'static [Self] = &[
        FractalPreset::Default,
        FractalPreset::Psychedelic,
        FractalPreset::Fiery,
        FractalPreset::Ocean,
        FractalPreset::Performance,
        FractalPreset::Midnight,
    ];

    fn name(self) -> &'static str {
        match self {
            FractalPreset::Default => "default",
            FractalPreset::Psychedelic => "psychedelic",
            FractalPreset::Fiery => "fiery",
            FractalPreset::Ocean => "ocean",
            FractalPreset::Performance => "performance",
            FractalPreset::Midnight => "midnight",
        }
    }

    fn params(self) -> FractalParams {
        #[rustfmt::skip]
        let (power, iterations, max_steps, epsilon, bailout, ambient, diffuse, specular, shininess, mode, scale, cycles, fog, quality) = match self {
            FractalPreset::Default => (8.0, 9, 100, 0.001, 2.0, 0.2, 0.7, 0.3, 30.0, 0, 0.5, 3.0, 0.15, 1.0),
            FractalPreset::Psychedelic => (9.2, 8, 100, 0.001, 3.0, 0.3, 0.6, 0.5, 20.0, 2, 1.2, 6.0, 0.05, 1.0),
            FractalPreset::Fiery => (7.5, 8, 100, 0.001, 2.0, 0.2, 0.8, 0.4, 40.0, 1, 0.7, 2.0, 0.12, 1.0),
            FractalPreset::Ocean => (8.3, 7, 100, 0.001, 2.0, 0.3, 0.6, 0.7, 50.0, 2, 0.5, 3.0, 0.2, 1.0),
            FractalPreset::Performance => (8.0, 5, 60, 0.002, 2.0, 0.3, 0.7, 0.2, 20.0, 3, 0.5, 3.0, 0.1, 0.5),
            FractalPreset::Midnight => (8.8, 10, 120, 0.0008, 2.5, 0.15, 0.65, 0.8, 60.0, 5, 0.6, 5.0, 0.25, 1.0),
        };
        FractalParams {
            power,
            iterations,
            max_steps,
            epsilon,
            bailout,
            ambient,
            diffuse,
            specular,
            shininess,
            color_mode: FractalColorMode::from_index(mode),
            color_scale: scale,
            color_cycles: cycles,
            fog_density: fog,
            quality,
        }
    }
}

impl Default for ParticleParams {
    fn default() -> Self {
        ParticlePreset::Default.params()
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        FractalPreset::Default.params()
    }
}

/// How a preset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresetMode {
    /// Replace every field immediately.
    Instant,
    /// Ease toward the snapshot over [`BLEND_DURATION`].
    #[default]
    Blend,
}

/// An in-flight eased blend between two parameter snapshots.
#[derive(Debug, Clone)]
pub struct PresetTransition<P: ParameterSet> {
    from: P,
    to: P,
    elapsed: f32,
    duration: f32,
}

impl<P: ParameterSet> PresetTransition<P> {
    /// Start blending `current` toward `target`.
    ///
    /// Enum fields of `current` are switched to the target's values now.
    pub fn begin(current: &mut P, target: P) -> Self {
        for spec in P::FIELDS.iter().filter(|s| s.kind == FieldKind::Enum) {
            if let Some(value) = target.get(spec.name) {
                current.write(spec.name, value);
            }
        }
        Self {
            from: current.clone(),
            to: target,
            elapsed: 0.0,
            duration: BLEND_DURATION,
        }
    }

    /// Override the blend duration (seconds).
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration.max(0.0);
        self
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn target(&self) -> &P {
        &self.to
    }

    /// Advance by `dt` seconds and write the blended values into `params`.
    ///
    /// Returns true once the blend has finished and `params` equals the target.
    pub fn advance(&mut self, dt: f32, params: &mut P) -> bool {
        self.elapsed += dt.max(0.0);
        let p = self.progress();
        if p >= 1.0 {
            *params = self.to.clone();
            return true;
        }

        let eased = ease_in_out_cubic(p);
        for spec in P::FIELDS {
            let (Some(a), Some(b)) = (self.from.get(spec.name), self.to.get(spec.name)) else {
                continue;
            };
            let value = a + (b - a) * eased;
            match spec.kind {
                FieldKind::Continuous => params.write(spec.name, value),
                FieldKind::Integer => params.write(spec.name, value.round()),
                FieldKind::Enum => continue,
            };
        }
        false
    }
}

/// One row per preset in menu order, each holding its field values in
/// field order.
pub fn preset_table<Pr: Preset>() -> Vec<(&'static str, Vec<(&'static str, f32)>)> {
    Pr::ALL
        .iter()
        .map(|preset| {
            let params = preset.params();
            let values = Pr::Params::FIELDS
                .iter()
                .filter_map(|spec| params.get(spec.name).map(|v| (spec.name, v)))
                .collect();
            (preset.name(), values)
        })
        .collect()
}

/// The parameter store of one pipeline.
///
/// Owns the live parameters, the most recently loaded preset and any
/// running blend. Mutations mark the store dirty; [`ParameterStore::tick`]
/// reports whether anything changed since the previous tick.
#[derive(Debug, Clone)]
pub struct ParameterStore<Pr: Preset> {
    params: Pr::Params,
    preset: Option<Pr>,
    transition: Option<PresetTransition<Pr::Params>>,
    dirty: bool,
}

impl<Pr: Preset> ParameterStore<Pr> {
    /// Start from a preset's snapshot.
    pub fn new(preset: Pr) -> Self {
        Self {
            params: preset.params(),
            preset: Some(preset),
            transition: None,
            dirty: true,
        }
    }

    pub fn params(&self) -> &Pr::Params {
        &self.params
    }

    /// The last preset loaded, or `None` once a field has been edited by hand.
    pub fn preset(&self) -> Option<Pr> {
        self.preset
    }

    /// Whether a blended preset load is in progress.
    pub fn is_blending(&self) -> bool {
        self.transition.is_some()
    }

    /// Set one field by name. Cancels any running blend.
    pub fn set(&mut self, name: &str, value: f32) -> Result<f32, ParamError> {
        let applied = self.params.set(name, value)?;
        self.transition = None;
        self.preset = None;
        self.dirty = true;
        Ok(applied)
    }

    /// Apply a `name=value` assignment. Cancels any running blend.
    pub fn assign(&mut self, text: &str) -> Result<f32, ParamError> {
        let applied = self.params.assign(text)?;
        self.transition = None;
        self.preset = None;
        self.dirty = true;
        Ok(applied)
    }

    /// Apply an arbitrary edit, then clamp every field. Cancels any running blend.
    pub fn update(&mut self, edit: impl FnOnce(&mut Pr::Params)) {
        edit(&mut self.params);
        self.params.sanitize();
        self.transition = None;
        self.preset = None;
        self.dirty = true;
    }

    /// Load a preset.
    pub fn load(&mut self, preset: Pr, mode: PresetMode) {
        log::debug!("Loading preset '{}' ({:?})", preset.name(), mode);
        match mode {
            PresetMode::Instant => {
                self.params = preset.params();
                self.transition = None;
            }
            PresetMode::Blend => {
                self.transition = Some(PresetTransition::begin(&mut self.params, preset.params()));
            }
        }
        self.preset = Some(preset);
        self.dirty = true;
    }

    /// Apply pending changes for this frame.
    ///
    /// Advances any running blend by `dt` and returns true if the parameters
    /// changed since the previous tick.
    pub fn tick(&mut self, dt: f32) -> bool {
        let mut changed = std::mem::take(&mut self.dirty);
        if let Some(transition) = &mut self.transition {
            changed = true;
            if transition.advance(dt, &mut self.params) {
                log::debug!("Preset blend finished");
                self.transition = None;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
        assert!(ease_in_out_cubic(0.25) < 0.25);
        assert!(ease_in_out_cubic(0.75) > 0.75);
    }

    #[test]
    fn test_preset_names_round_trip() {
        for preset in ParticlePreset::ALL {
            assert_eq!(ParticlePreset::from_name(preset.name()), Ok(*preset));
        }
        for preset in FractalPreset::ALL {
            assert_eq!(FractalPreset::from_name(preset.name()), Ok(*preset));
        }
        assert_eq!(FractalPreset::from_name("MIDNIGHT"), Ok(FractalPreset::Midnight));
        assert!(ParticlePreset::from_name("supernova").is_err());
    }

    #[test]
    fn test_preset_table_lists_every_field() {
        let table = preset_table::<FractalPreset>();
        assert_eq!(table.len(), FractalPreset::ALL.len());
        for (name, values) in &table {
            assert_eq!(values.len(), FractalParams::FIELDS.len(), "{}", name);
        }
        assert_eq!(table[0].0, "default");
        assert!(table[0].1.contains(&("power", 8.0)));

        let table = preset_table::<ParticlePreset>();
        assert!(table[0].1.contains(&("particleCount", 45_000.0)));
    }

    #[test]
    fn test_presets_are_within_ranges() {
        for preset in ParticlePreset::ALL {
            let mut params = preset.params();
            params.sanitize();
            assert_eq!(params, preset.params(), "{}", preset.name());
        }
        for preset in FractalPreset::ALL {
            let mut params = preset.params();
            params.sanitize();
            assert_eq!(params, preset.params(), "{}", preset.name());
        }
    }

    #[test]
    fn test_blend_switches_enums_at_start() {
        let mut params = ParticlePreset::Default.params();
        let mut transition = PresetTransition::begin(&mut params, ParticlePreset::Galaxy.params());
        assert_eq!(params.color_mode, ParticleColorMode::Galaxy);
        assert_eq!(params.particle_count, 45_000);

        transition.advance(0.4, &mut params);
        assert!(params.particle_count > 45_000 && params.particle_count < 150_000);
        assert!(params.noise_scale > 3.0 && params.noise_scale < 8.0);
    }

    #[test]
    fn test_blend_finishes_exactly_on_target() {
        let mut params = FractalPreset::Default.params();
        let mut transition = PresetTransition::begin(&mut params, FractalPreset::Midnight.params());
        let mut finished = false;
        for _ in 0..100 {
            if transition.advance(1.0 / 60.0, &mut params) {
                finished = true;
                break;
            }
        }
        assert!(finished);
        assert_eq!(params, FractalPreset::Midnight.params());
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut params = ParticlePreset::Default.params();
        let mut transition = PresetTransition::begin(&mut params, ParticlePreset::Nebula.params())
            .with_duration(0.0);
        assert!(transition.advance(0.0, &mut params));
        assert_eq!(params, ParticlePreset::Nebula.params());
    }

    #[test]
    fn test_store_tick_reports_changes() {
        let mut store = ParameterStore::new(FractalPreset::Default);
        assert!(store.tick(0.016));
        assert!(!store.tick(0.016));

        store.set("power", 3.0).unwrap();
        assert_eq!(store.preset(), None);
        assert!(store.tick(0.016));
        assert!(!store.tick(0.016));
    }

    #[test]
    fn test_store_manual_edit_cancels_blend() {
        let mut store = ParameterStore::new(ParticlePreset::Default);
        store.load(ParticlePreset::Energetic, PresetMode::Blend);
        store.tick(0.1);
        assert!(store.is_blending());
        store.set("turbulence", 0.1).unwrap();
        assert!(!store.is_blending());
        store.tick(1.0);
        assert_eq!(store.params().turbulence, 0.1);
    }

    #[test]
    fn test_store_instant_load() {
        let mut store = ParameterStore::new(ParticlePreset::Default);
        store.load(ParticlePreset::Stardust, PresetMode::Instant);
        assert!(!store.is_blending());
        assert_eq!(store.params(), &ParticlePreset::Stardust.params());
        assert_eq!(store.preset(), Some(ParticlePreset::Stardust));
    }
}
