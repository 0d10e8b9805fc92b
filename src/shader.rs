//! WGSL sources, embedded at compile time.

/// Instanced additive particle sprites.
pub const PARTICLES_SOURCE: &str = include_str!("shaders/particles.wgsl");

/// Full-screen Mandelbulb ray marcher with post-processing.
pub const MANDELBULB_SOURCE: &str = include_str!("shaders/mandelbulb.wgsl");

/// Offscreen target to swapchain copy.
pub const BLIT_SOURCE: &str = include_str!("shaders/blit.wgsl");

/// Every shader with a label, for validation and diagnostics.
pub const ALL_SOURCES: [(&str, &str); 3] = [
    ("particles.wgsl", PARTICLES_SOURCE),
    ("mandelbulb.wgsl", MANDELBULB_SOURCE),
    ("blit.wgsl", BLIT_SOURCE),
];
