// ============================================================================
// GPU RENDERER — top-level coordinator for GPU filter rendering
// ============================================================================

use super::context::GpuContext;
use super::filter::{FilterPipeline, FilterUniforms, readback_texture};
use super::texture::{RenderTarget, SourceTexture};
use crate::error::{FilterError, Result};
use crate::{log_info, log_warn};
use crate::ops::adjustments::SaturationModel;
use crate::params::FilterParams;
use crate::render::{Frame, FrameRenderer, SourceImage};

pub struct GpuRenderer {
    pub ctx: GpuContext,
    pipeline: FilterPipeline,
    model: SaturationModel,
    /// Uploaded once per load, reused for every parameter change.
    source: Option<SourceTexture>,
    target: Option<RenderTarget>,
    staging: Option<(wgpu::Buffer, u64)>,
}

impl GpuRenderer {
    /// Create the device and compile the filter pipeline.
    pub fn new(preferred_gpu: &str, model: SaturationModel) -> Result<Self> {
        let ctx = GpuContext::new(preferred_gpu)?;
        Self::with_context(ctx, model)
    }

    pub fn with_context(ctx: GpuContext, model: SaturationModel) -> Result<Self> {
        let pipeline = FilterPipeline::new(&ctx)?;
        Ok(Self {
            ctx,
            pipeline,
            model,
            source: None,
            target: None,
            staging: None,
        })
    }

    /// Upload `source` unless it is already resident.  A new image replaces
    /// the previous texture entirely.
    fn ensure_source(&mut self, source: &SourceImage) -> Result<()> {
        if self.source.as_ref().is_some_and(|t| t.is_for(source)) {
            return Ok(());
        }
        let (w, h) = (source.width(), source.height());
        if w == 0 || h == 0 {
            return Err(FilterError::EmptyImage);
        }
        if !self.ctx.supports_size(w, h) {
            log_warn!(
                "[GPU] {}x{} exceeds device limits ({}px per side, {} byte buffers)",
                w,
                h,
                self.ctx.max_texture_dim,
                self.ctx.max_buffer_size
            );
            return Err(FilterError::TooLarge { width: w, height: h });
        }
        log_info!("[GPU] Uploading source #{} ({}x{})", source.id(), w, h);
        self.source = Some(SourceTexture::new(
            &self.ctx.device,
            &self.ctx.queue,
            &self.pipeline.texture_bgl,
            source,
        ));
        Ok(())
    }

    fn ensure_target(&mut self, width: u32, height: u32) {
        if !self.target.as_ref().is_some_and(|t| t.matches(width, height)) {
            self.target = Some(RenderTarget::new(&self.ctx.device, width, height));
        }
    }
}

impl FrameRenderer for GpuRenderer {
    fn name(&self) -> &str {
        &self.ctx.adapter_name
    }

    fn render(&mut self, source: &SourceImage, params: &FilterParams) -> Result<Frame> {
        self.ensure_source(source)?;
        let (width, height) = (source.width(), source.height());
        self.ensure_target(width, height);

        let (Some(src_tex), Some(target)) = (self.source.as_ref(), self.target.as_ref()) else {
            return Err(FilterError::Readback("render resources missing".into()));
        };

        let uniforms = FilterUniforms::new(params, self.model);
        self.pipeline.draw(&self.ctx, src_tex, target, &uniforms);
        let pixels = readback_texture(&self.ctx, &target.texture, width, height, &mut self.staging)?;

        Ok(Frame {
            width,
            height,
            pixels,
            params: *params,
            source_id: source.id(),
        })
    }
}
