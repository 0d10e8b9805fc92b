//! Error types for cosmoscope.
//!
//! Initialization failures (no adapter, shader rejected, surface creation)
//! are fatal to a pipeline. Still-image export has its own error so a failed
//! save never tears down the render loop. Parameter lookups fail only on
//! unknown names; out-of-range values are clamped instead.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// A WGSL module or pipeline was rejected by the device.
    ShaderCompilation(String),
    /// Failed to map buffer for reading.
    BufferMapping(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while exporting a still image.
#[derive(Debug)]
pub enum CaptureError {
    /// Reading the frame back from the GPU failed.
    Gpu(GpuError),
    /// Failed to encode the PNG.
    Image(image::ImageError),
    /// Failed to create the output directory or file.
    Io(std::io::Error),
    /// No frame has been rendered yet.
    EmptyFrame,
    /// The render target's texel format has no PNG mapping.
    UnsupportedFormat(wgpu::TextureFormat),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Gpu(e) => write!(f, "Failed to read back frame: {}", e),
            CaptureError::Image(e) => write!(f, "Failed to encode image: {}", e),
            CaptureError::Io(e) => write!(f, "Failed to write image file: {}", e),
            CaptureError::EmptyFrame => write!(f, "No frame available to capture"),
            CaptureError::UnsupportedFormat(format) => {
                write!(f, "Cannot export frames in format {:?}", format)
            }
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Gpu(e) => Some(e),
            CaptureError::Image(e) => Some(e),
            CaptureError::Io(e) => Some(e),
            CaptureError::EmptyFrame | CaptureError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<GpuError> for CaptureError {
    fn from(e: GpuError) -> Self {
        CaptureError::Gpu(e)
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(e: image::ImageError) -> Self {
        CaptureError::Image(e)
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::Io(e)
    }
}

/// Errors from parameter and preset lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    /// No field with this name exists in the parameter family.
    UnknownField(String),
    /// No preset with this name exists for the pipeline.
    UnknownPreset(String),
    /// A `name=value` assignment could not be parsed.
    Malformed(String),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::UnknownField(name) => write!(f, "Unknown parameter '{}'", name),
            ParamError::UnknownPreset(name) => write!(f, "Unknown preset '{}'", name),
            ParamError::Malformed(text) => write!(f, "Expected NAME=VALUE, got '{}'", text),
        }
    }
}

impl std::error::Error for ParamError {}

/// Errors that can occur when running a visualizer.
#[derive(Debug)]
pub enum VisualizerError {
    /// Failed to create or run the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Invalid parameter or preset in the configuration.
    Param(ParamError),
}

impl fmt::Display for VisualizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualizerError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            VisualizerError::Window(e) => write!(f, "Failed to create window: {}", e),
            VisualizerError::Gpu(e) => write!(f, "GPU error: {}", e),
            VisualizerError::Param(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for VisualizerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VisualizerError::EventLoop(e) => Some(e),
            VisualizerError::Window(e) => Some(e),
            VisualizerError::Gpu(e) => Some(e),
            VisualizerError::Param(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for VisualizerError {
    fn from(e: winit::error::EventLoopError) -> Self {
        VisualizerError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for VisualizerError {
    fn from(e: winit::error::OsError) -> Self {
        VisualizerError::Window(e)
    }
}

impl From<GpuError> for VisualizerError {
    fn from(e: GpuError) -> Self {
        VisualizerError::Gpu(e)
    }
}

impl From<ParamError> for VisualizerError {
    fn from(e: ParamError) -> Self {
        VisualizerError::Param(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_param_error_display() {
        let err = ParamError::UnknownField("warpFactor".into());
        assert_eq!(err.to_string(), "Unknown parameter 'warpFactor'");
    }

    #[test]
    fn test_visualizer_error_source_chain() {
        let err = VisualizerError::from(ParamError::UnknownPreset("nope".into()));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_capture_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CaptureError::from(io);
        assert!(matches!(err, CaptureError::Io(_)));
        assert!(err.source().is_some());
    }
}
