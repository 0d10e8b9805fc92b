//! The two pipelines behind one interface.
//!
//! A [`Scene`] owns its parameter store and whatever state its simulation
//! needs. The app owns the camera, theme and scheduler and drives a scene
//! through this trait, so the render loop is written once.

use crate::camera::{CameraProfile, OrbitCamera};
use crate::error::GpuError;
use crate::gpu::{FractalPass, GpuContext, OffscreenTarget, ParticlePass};
use crate::params::Theme;
use crate::particles::ParticleSystem;
use crate::presets::{FractalPreset, ParameterStore, ParticlePreset, Preset, PresetMode};
use crate::raymarch::ThemeColors;
use crate::uniforms::{FractalUniforms, ParticleUniforms};

/// Particle pipeline clear colors per theme.
const PARTICLE_CLEAR_DARK: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};
const PARTICLE_CLEAR_LIGHT: wgpu::Color = wgpu::Color {
    r: 0.98,
    g: 0.98,
    b: 0.99,
    a: 1.0,
};

/// One renderable pipeline.
pub trait Scene: 'static {
    type Preset: Preset;
    /// GPU resources for drawing this scene.
    type Pass;

    /// Shown in the window title.
    const NAME: &'static str;
    /// Unit of [`Scene::item_count`].
    const ITEM_LABEL: &'static str;
    const CAMERA: CameraProfile;

    /// Start from `preset`. `seed` drives any randomness the scene has.
    fn build(preset: Self::Preset, seed: u64) -> Self;

    fn store(&self) -> &ParameterStore<Self::Preset>;

    fn store_mut(&mut self) -> &mut ParameterStore<Self::Preset>;

    /// Offscreen resolution factor in `(0, 1]`.
    fn quality(&self) -> f32;

    /// Advance the simulation after parameters were applied.
    ///
    /// Returns true if scene state changed in a way that needs a fresh frame
    /// beyond the parameter change itself.
    fn step(&mut self, time: f32, dt: f32) -> bool;

    /// Items processed per frame for a viewport of `viewport` pixels.
    fn item_count(&self, viewport: (u32, u32)) -> u64;

    /// File stem for still-image export.
    fn capture_stem(&self) -> String;

    fn clear_color(&self, theme: Theme) -> wgpu::Color;

    /// Make the surface finer (`finer`) or coarser. Returns true if anything changed.
    fn adjust_detail(&mut self, _finer: bool) -> bool {
        false
    }

    fn create_pass(gpu: &GpuContext, format: wgpu::TextureFormat) -> Result<Self::Pass, GpuError>;

    /// Upload this frame's inputs and record the scene draw into `target`.
    #[allow(clippy::too_many_arguments)]
    fn render(
        &self,
        pass: &mut Self::Pass,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &OffscreenTarget,
        camera: &OrbitCamera,
        theme: Theme,
        time: f32,
    );

    /// Load the `index`-th preset with blending. Out-of-range indices are ignored.
    fn load_preset(&mut self, index: usize) -> bool {
        let Some(&preset) = Self::Preset::ALL.get(index) else {
            return false;
        };
        log::info!("{} preset '{}'", Self::NAME, preset.name());
        self.store_mut().load(preset, PresetMode::Blend);
        true
    }

    /// Name of the active preset, or `custom` after manual edits.
    fn preset_label(&self) -> &'static str {
        self.store().preset().map_or("custom", |p| p.name())
    }
}

// ========== Galaxy ==========

/// Curl-noise galaxy of instanced particles.
pub struct ParticleScene {
    store: ParameterStore<ParticlePreset>,
    system: ParticleSystem,
}

impl ParticleScene {
    pub fn new(preset: ParticlePreset, seed: u64) -> Self {
        let store = ParameterStore::new(preset);
        let system = ParticleSystem::new(store.params().particle_count, seed);
        Self { store, system }
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }
}

impl Scene for ParticleScene {
    type Preset = ParticlePreset;
    type Pass = ParticlePass;

    const NAME: &'static str = "Galaxy";
    const ITEM_LABEL: &'static str = "particles";
    const CAMERA: CameraProfile = CameraProfile::PARTICLES;

    fn build(preset: ParticlePreset, seed: u64) -> Self {
        Self::new(preset, seed)
    }

    fn store(&self) -> &ParameterStore<ParticlePreset> {
        &self.store
    }

    fn store_mut(&mut self) -> &mut ParameterStore<ParticlePreset> {
        &mut self.store
    }

    fn quality(&self) -> f32 {
        self.store.params().quality
    }

    fn step(&mut self, time: f32, dt: f32) -> bool {
        let params = self.store.params();
        let rebuilt = self.system.sync_count(params.particle_count);
        self.system.advance(params, time, dt);
        rebuilt
    }

    fn item_count(&self, _viewport: (u32, u32)) -> u64 {
        self.system.count() as u64
    }

    fn capture_stem(&self) -> String {
        format!("galaxy-{}", self.preset_label())
    }

    fn clear_color(&self, theme: Theme) -> wgpu::Color {
        match theme {
            Theme::Dark => PARTICLE_CLEAR_DARK,
            Theme::Light => PARTICLE_CLEAR_LIGHT,
        }
    }

    fn create_pass(gpu: &GpuContext, format: wgpu::TextureFormat) -> Result<ParticlePass, GpuError> {
        ParticlePass::new(gpu, format)
    }

    fn render(
        &self,
        pass: &mut ParticlePass,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &OffscreenTarget,
        camera: &OrbitCamera,
        theme: Theme,
        time: f32,
    ) {
        let uniforms = ParticleUniforms::new(camera, target.size(), self.store.params(), theme, time);
        pass.write_uniforms(gpu, &uniforms);
        pass.upload(gpu, self.system.particles());
        pass.draw(encoder, target, self.clear_color(theme));
    }
}

// ========== Mandelbulb ==========

/// Ray-marched power-N Mandelbulb.
pub struct FractalScene {
    store: ParameterStore<FractalPreset>,
}

impl FractalScene {
    pub fn new(preset: FractalPreset) -> Self {
        Self {
            store: ParameterStore::new(preset),
        }
    }
}

impl Scene for FractalScene {
    type Preset = FractalPreset;
    type Pass = FractalPass;

    const NAME: &'static str = "Mandelbulb";
    const ITEM_LABEL: &'static str = "pixels";
    const CAMERA: CameraProfile = CameraProfile::FRACTAL;

    fn build(preset: FractalPreset, _seed: u64) -> Self {
        Self::new(preset)
    }

    fn store(&self) -> &ParameterStore<FractalPreset> {
        &self.store
    }

    fn store_mut(&mut self) -> &mut ParameterStore<FractalPreset> {
        &mut self.store
    }

    fn quality(&self) -> f32 {
        self.store.params().quality
    }

    fn step(&mut self, _time: f32, _dt: f32) -> bool {
        false
    }

    fn item_count(&self, viewport: (u32, u32)) -> u64 {
        viewport.0 as u64 * viewport.1 as u64
    }

    fn capture_stem(&self) -> String {
        format!("mandelbulb-{}-p{:.1}", self.preset_label(), self.store.params().power)
    }

    fn clear_color(&self, theme: Theme) -> wgpu::Color {
        let bg = ThemeColors::new(theme, self.store.params().color_mode).background;
        wgpu::Color {
            r: bg.x as f64,
            g: bg.y as f64,
            b: bg.z as f64,
            a: 1.0,
        }
    }

    fn adjust_detail(&mut self, finer: bool) -> bool {
        let before = self.store.params().epsilon;
        self.store.update(|p| {
            if finer {
                p.refine_detail();
            } else {
                p.coarsen_detail();
            }
        });
        let after = self.store.params().epsilon;
        log::debug!("Surface epsilon {} -> {}", before, after);
        after != before
    }

    fn create_pass(gpu: &GpuContext, format: wgpu::TextureFormat) -> Result<FractalPass, GpuError> {
        FractalPass::new(gpu, format)
    }

    fn render(
        &self,
        pass: &mut FractalPass,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &OffscreenTarget,
        camera: &OrbitCamera,
        theme: Theme,
        time: f32,
    ) {
        let uniforms = FractalUniforms::new(camera, target.aspect(), self.store.params(), theme, time);
        pass.write_uniforms(gpu, &uniforms);
        pass.draw(encoder, target, self.clear_color(theme));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_scene_follows_count_changes() {
        let mut scene = ParticleScene::new(ParticlePreset::Performance, 7);
        assert_eq!(scene.item_count((1, 1)), 20_000);

        scene.store_mut().set("particleCount", 25_000.0).unwrap();
        scene.store_mut().tick(0.016);
        assert!(scene.step(1.0, 0.016));
        assert_eq!(scene.item_count((1, 1)), 25_000);
        assert!(!scene.step(1.016, 0.016));
    }

    #[test]
    fn test_capture_stems() {
        let particles = ParticleScene::new(ParticlePreset::Nebula, 1);
        assert_eq!(particles.capture_stem(), "galaxy-nebula");

        let mut fractal = FractalScene::new(FractalPreset::Psychedelic);
        assert_eq!(fractal.capture_stem(), "mandelbulb-psychedelic-p9.2");
        fractal.store_mut().set("power", 4.0).unwrap();
        assert_eq!(fractal.capture_stem(), "mandelbulb-custom-p4.0");
    }

    #[test]
    fn test_fractal_item_count_is_pixels() {
        let scene = FractalScene::new(FractalPreset::Default);
        assert_eq!(scene.item_count((320, 200)), 64_000);
    }

    #[test]
    fn test_detail_adjustment_clamps() {
        let mut scene = FractalScene::new(FractalPreset::Default);
        assert!(scene.adjust_detail(true));
        assert!((scene.store().params().epsilon - 0.0008).abs() < 1e-7);

        for _ in 0..100 {
            scene.adjust_detail(false);
        }
        assert_eq!(scene.store().params().epsilon, 0.01);
        assert!(!scene.adjust_detail(false));

        let mut particles = ParticleScene::new(ParticlePreset::Default, 1);
        assert!(!particles.adjust_detail(true));
    }

    #[test]
    fn test_load_preset_by_index() {
        let mut scene = FractalScene::new(FractalPreset::Default);
        assert!(scene.load_preset(5));
        assert_eq!(scene.preset_label(), "midnight");
        assert!(!scene.load_preset(6));
        assert_eq!(scene.preset_label(), "midnight");
    }

    #[test]
    fn test_clear_colors_follow_theme() {
        let particles = ParticleScene::new(ParticlePreset::Default, 1);
        assert_eq!(particles.clear_color(Theme::Dark), PARTICLE_CLEAR_DARK);
        assert_eq!(particles.clear_color(Theme::Light), PARTICLE_CLEAR_LIGHT);

        let fractal = FractalScene::new(FractalPreset::Default);
        let dark = fractal.clear_color(Theme::Dark);
        let light = fractal.clear_color(Theme::Light);
        assert!(dark.r < 0.1 && light.r > 0.9);
    }
}
