//! # Cosmoscope
//!
//! Two real-time GPU visualizations behind one render loop:
//!
//! - a **galaxy** of particles advected by a time-varying curl-noise field
//!   around a Keplerian orbit, drawn as additive sprites
//! - a **Mandelbulb** of arbitrary power, sphere-traced per pixel with a
//!   distance estimator and shaded with two lights, fog and glow
//!
//! ## Quick Start
//!
//! ```ignore
//! use cosmoscope::prelude::*;
//!
//! fn main() -> Result<(), VisualizerError> {
//!     Visualizer::particles()
//!         .with_preset(ParticlePreset::Nebula)
//!         .with_seed(42)
//!         .with_auto_rotate(true)
//!         .run()
//! }
//! ```
//!
//! ## Parameters and Presets
//!
//! Each pipeline has a parameter family ([`ParticleParams`],
//! [`FractalParams`]) with a documented range per field. Values outside a
//! range are clamped, never rejected. Presets are closed enums; loading one
//! with [`PresetMode::Blend`] eases every numeric field over 0.8 s.
//!
//! ```ignore
//! let mut store = ParameterStore::new(FractalPreset::Default);
//! store.set("power", 12.0)?;
//! store.load(FractalPreset::Midnight, PresetMode::Blend);
//! while store.is_blending() {
//!     store.tick(1.0 / 60.0);
//! }
//! assert_eq!(store.params(), &FractalPreset::Midnight.params());
//! ```
//!
//! ## Headless Use
//!
//! The simulation and the distance estimator run on the CPU without a
//! window:
//!
//! ```ignore
//! let params = ParticlePreset::Default.params();
//! let mut system = ParticleSystem::new(1_000, 7);
//! system.advance(&params, 0.0, 0.016);
//!
//! let d = distance_estimate(Vec3::new(0.0, 0.0, 1.5), 8.0, 9, 2.0);
//! ```
//!
//! The fractal shader mirrors [`raymarch`]; the CPU version exists for
//! tests and tooling.

pub mod app;
pub mod camera;
pub mod error;
pub mod fractal;
pub mod gpu;
pub mod input;
pub mod noise;
pub mod params;
pub mod particles;
pub mod presets;
pub mod raymarch;
pub mod scene;
pub mod scheduler;
pub mod shader;
pub mod spawn;
pub mod time;
pub mod uniforms;

pub use app::{Session, ViewSettings, Visualizer};
pub use camera::{CameraProfile, OrbitCamera};
pub use error::{CaptureError, GpuError, ParamError, VisualizerError};
pub use fractal::distance_estimate;
pub use glam::{Vec2, Vec3};
pub use params::{
    FractalColorMode, FractalParams, ParamSpec, ParameterSet, ParticleColorMode, ParticleParams, Theme,
};
pub use particles::{Particle, ParticleSystem};
pub use presets::{FractalPreset, ParameterStore, ParticlePreset, Preset, PresetMode};
pub use raymarch::{raymarch, RayHit, ShadingEnv};
pub use scene::{FractalScene, ParticleScene, Scene};
pub use scheduler::{FrameStats, RenderState};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::app::Visualizer;
    pub use crate::error::VisualizerError;
    pub use crate::fractal::distance_estimate;
    pub use crate::params::{FractalParams, ParameterSet, ParticleParams, Theme};
    pub use crate::particles::ParticleSystem;
    pub use crate::presets::{FractalPreset, ParameterStore, ParticlePreset, Preset, PresetMode};
    pub use glam::Vec3;
}
