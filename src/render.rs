// ============================================================================
// RENDER TRIGGER — source image, output frame, and the renderer seam
// ============================================================================
//
// A renderer turns (SourceImage, FilterParams) into a complete Frame.  The GPU
// renderer (gpu::GpuRenderer) draws a full-screen quad through the filter
// shader; the CPU renderer evaluates the same transform with rayon.
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;

use crate::error::Result;
use crate::ops::adjustments::{ColorTransform, SaturationModel};
use crate::params::FilterParams;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// An immutable decoded image.  Cloning shares the pixels.
#[derive(Clone, Debug)]
pub struct SourceImage {
    id: u64,
    pixels: Arc<RgbaImage>,
    /// Where it came from (URL or path), for logging.
    pub origin: String,
}

impl SourceImage {
    /// Wrap decoded pixels; every call gets a fresh id.
    pub fn new(pixels: RgbaImage, origin: impl Into<String>) -> Self {
        Self {
            id: NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed),
            pixels: Arc::new(pixels),
            origin: origin.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// The most recent render.  Always complete, never partially updated.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    /// Parameters the frame was rendered with.
    pub params: FilterParams,
    /// Id of the source image the frame was rendered from.
    pub source_id: u64,
}

impl Frame {
    pub fn into_image(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels)
    }
}

/// Anything that can produce a frame from a source image and a parameter set.
pub trait FrameRenderer {
    /// Short human-readable backend name (e.g. the GPU adapter).
    fn name(&self) -> &str;

    fn render(&mut self, source: &SourceImage, params: &FilterParams) -> Result<Frame>;
}

/// CPU reference renderer.
#[derive(Debug, Default)]
pub struct CpuRenderer {
    transform: ColorTransform,
}

impl CpuRenderer {
    pub fn new(model: SaturationModel) -> Self {
        Self {
            transform: ColorTransform::new(model),
        }
    }
}

impl FrameRenderer for CpuRenderer {
    fn name(&self) -> &str {
        "CPU"
    }

    fn render(&mut self, source: &SourceImage, params: &FilterParams) -> Result<Frame> {
        let out = self.transform.apply_to_image(source.pixels(), params);
        Ok(Frame {
            width: out.width(),
            height: out.height(),
            pixels: out.into_raw(),
            params: *params,
            source_id: source.id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_ids_are_unique_and_increasing() {
        let a = SourceImage::new(RgbaImage::new(1, 1), "a");
        let b = SourceImage::new(RgbaImage::new(1, 1), "b");
        assert!(b.id() > a.id());
        let c = a.clone();
        assert_eq!(c.id(), a.id());
    }

    #[test]
    fn cpu_renderer_produces_a_full_frame() {
        let img = RgbaImage::from_pixel(4, 2, image::Rgba([204, 51, 51, 255]));
        let src = SourceImage::new(img, "test");
        let params = FilterParams { brightness: 0.1, contrast: 1.5, ..FilterParams::DEFAULT };
        let mut renderer = CpuRenderer::default();
        let frame = renderer.render(&src, &params).unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.pixels.len(), 4 * 2 * 4);
        assert_eq!(frame.source_id, src.id());
        assert_eq!(frame.params, params);
        // 0.8 * 1.5 + 0.1 → clamp 1.0; 0.2 * 1.5 + 0.1 = 0.4
        assert_eq!(&frame.pixels[..4], &[255, 102, 102, 255]);
        let img = frame.into_image().unwrap();
        assert_eq!(img.dimensions(), (4, 2));
    }
}
