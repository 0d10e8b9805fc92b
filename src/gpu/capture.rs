//! Still-image export of the offscreen target.
//!
//! The texture is copied into a mappable staging buffer whose rows are
//! padded to `COPY_BYTES_PER_ROW_ALIGNMENT`. The padding is stripped and
//! BGRA texels are swizzled before the pixels go to the PNG encoder.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::error::{CaptureError, GpuError};

use super::{GpuContext, OffscreenTarget};

const BYTES_PER_PIXEL: u32 = 4;

/// Byte order of a 4-byte color texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TexelOrder {
    Rgba,
    Bgra,
}

impl TexelOrder {
    fn of(format: wgpu::TextureFormat) -> Option<Self> {
        match format {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Some(TexelOrder::Rgba),
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => Some(TexelOrder::Bgra),
            _ => None,
        }
    }
}

/// Padded row length for a texture copy of `width` pixels.
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip row padding and reorder texels to RGBA.
fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32, order: TexelOrder) -> Vec<u8> {
    let row_len = (width * BYTES_PER_PIXEL) as usize;
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in data.chunks(padded_row as usize).take(height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }
    if order == TexelOrder::Bgra {
        for texel in pixels.chunks_exact_mut(BYTES_PER_PIXEL as usize) {
            texel.swap(0, 2);
        }
    }
    pixels
}

/// Reads frames back from an [`OffscreenTarget`].
pub struct FrameCapture;

impl FrameCapture {
    /// Copy the target into CPU memory as tightly packed RGBA8.
    ///
    /// Blocks until the GPU has finished the copy.
    pub fn read(gpu: &GpuContext, target: &OffscreenTarget) -> Result<image::RgbaImage, CaptureError> {
        let order = TexelOrder::of(target.format).ok_or(CaptureError::UnsupportedFormat(target.format))?;
        let (width, height) = target.size();
        let padded_row = padded_bytes_per_row(width);

        let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Staging Buffer"),
            size: (padded_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        gpu.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(GpuError::BufferMapping(e.to_string()).into()),
            Err(e) => return Err(GpuError::BufferMapping(e.to_string()).into()),
        }

        let pixels = {
            let data = slice.get_mapped_range();
            unpad_rows(&data, width, height, padded_row, order)
        };
        staging.unmap();

        image::RgbaImage::from_raw(width, height, pixels).ok_or(CaptureError::EmptyFrame)
    }

    /// Read the target and write it to `path` as PNG.
    pub fn save(gpu: &GpuContext, target: &OffscreenTarget, path: &Path) -> Result<(), CaptureError> {
        let frame = Self::read(gpu, target)?;
        encode_png(&frame, path)
    }
}

/// Write `frame` to `path` as PNG, creating parent directories.
pub fn encode_png(frame: &image::RgbaImage, path: &Path) -> Result<(), CaptureError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(CaptureError::EmptyFrame);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    frame.save_with_format(path, image::ImageFormat::Png)?;
    log::info!("Saved {}x{} frame to {}", frame.width(), frame.height(), path.display());
    Ok(())
}

/// `<dir>/<stem>-<unix millis>.png`
pub(crate) fn timestamped_path(dir: &Path, stem: &str, unix_millis: u128) -> PathBuf {
    dir.join(format!("{}-{}.png", stem, unix_millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_row_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1280), 5120);
    }

    #[test]
    fn test_unpad_strips_padding_and_swizzles() {
        let width = 2;
        let height = 2;
        let padded = padded_bytes_per_row(width);
        let mut data = vec![0xEE_u8; (padded * height) as usize];
        // Row 0: two BGRA texels
        data[0..8].copy_from_slice(&[1, 2, 3, 255, 4, 5, 6, 255]);
        // Row 1
        let r1 = padded as usize;
        data[r1..r1 + 8].copy_from_slice(&[7, 8, 9, 255, 10, 11, 12, 255]);

        let pixels = unpad_rows(&data, width, height, padded, TexelOrder::Bgra);
        assert_eq!(
            pixels,
            vec![3, 2, 1, 255, 6, 5, 4, 255, 9, 8, 7, 255, 12, 11, 10, 255]
        );
    }

    #[test]
    fn test_rgba_passthrough() {
        let data = [10, 20, 30, 40];
        let pixels = unpad_rows(&data, 1, 1, 4, TexelOrder::Rgba);
        assert_eq!(pixels, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_texel_order_of_formats() {
        assert_eq!(TexelOrder::of(wgpu::TextureFormat::Bgra8UnormSrgb), Some(TexelOrder::Bgra));
        assert_eq!(TexelOrder::of(wgpu::TextureFormat::Rgba8Unorm), Some(TexelOrder::Rgba));
        assert_eq!(TexelOrder::of(wgpu::TextureFormat::Rgba16Float), None);
    }

    #[test]
    fn test_encode_png_writes_file() {
        let dir = std::env::temp_dir().join(format!("cosmoscope-capture-{}", std::process::id()));
        let path = timestamped_path(&dir, "galaxy-default", 42);
        assert!(path.ends_with("galaxy-default-42.png"));

        let frame = image::RgbaImage::from_pixel(4, 3, image::Rgba([255, 0, 0, 255]));
        encode_png(&frame, &path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(1, 1), &image::Rgba([255, 0, 0, 255]));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_encode_empty_frame_rejected() {
        let frame = image::RgbaImage::new(0, 0);
        let err = encode_png(&frame, Path::new("never-written.png")).unwrap_err();
        assert!(matches!(err, CaptureError::EmptyFrame));
    }
}
