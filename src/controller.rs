// ============================================================================
// FILTER CONTROLLER — the one context object behind the UI and the CLI
// ============================================================================
//
// Owns the parameter store, the single source-image slot, the renderer, and
// the most recent frame.  Every mutation is followed by exactly one complete
// render; a failed load or render leaves parameters and frame as they were.
// ============================================================================

use crate::error::{FilterError, Result};
use crate::params::{FilterParams, ParamField, ParamValue, ParameterStore};
use crate::render::{Frame, FrameRenderer, SourceImage};
use crate::{log_err, log_info, log_warn};

pub struct FilterController {
    params: ParameterStore,
    source: Option<SourceImage>,
    /// `None` when the GPU could not be initialised; renders become no-ops.
    renderer: Option<Box<dyn FrameRenderer>>,
    frame: Option<Frame>,
    /// Number of completed renders.
    render_count: u64,
}

impl FilterController {
    pub fn new(renderer: Option<Box<dyn FrameRenderer>>) -> Self {
        match &renderer {
            Some(r) => log_info!("[controller] Rendering with {}", r.name()),
            None => log_warn!("[controller] No renderer available, frames will not be produced"),
        }
        Self {
            params: ParameterStore::new(),
            source: None,
            renderer,
            frame: None,
            render_count: 0,
        }
    }

    pub fn with_params(mut self, params: FilterParams) -> Self {
        self.params = ParameterStore::with_params(params);
        self
    }

    // ------------------------------------------------------------------
    // Parameter updates, each followed by a render
    // ------------------------------------------------------------------

    pub fn set(&mut self, field: ParamField, value: impl Into<ParamValue>) -> Option<&Frame> {
        self.params.set(field, value);
        self.render_if_requested()
    }

    pub fn toggle_greyscale(&mut self) -> Option<&Frame> {
        self.params.toggle_greyscale();
        self.render_if_requested()
    }

    pub fn reset(&mut self) -> Option<&Frame> {
        self.params.reset();
        self.render_if_requested()
    }

    /// Re-render with the current parameters ("apply").
    pub fn apply(&mut self) -> Option<&Frame> {
        self.render()
    }

    // ------------------------------------------------------------------
    // Source image
    // ------------------------------------------------------------------

    /// Handle a finished load.  The new image only replaces the current one
    /// once it has rendered; a failed fetch or a failed first render is
    /// logged and changes nothing.
    pub fn finish_load(&mut self, result: Result<SourceImage>) -> Option<&Frame> {
        let source = match result {
            Ok(source) => source,
            Err(e) => {
                self.log_load_failure(&e);
                return self.frame.as_ref();
            }
        };
        log_info!(
            "[controller] New source #{} from {} ({}x{})",
            source.id(),
            source.origin,
            source.width(),
            source.height()
        );
        let _ = self.params.take_render_request();

        let rendered = match self.renderer.as_mut() {
            Some(r) => r.render(&source, &self.params.snapshot()).map(Some),
            None => Ok(None),
        };
        match rendered {
            Ok(Some(frame)) => {
                self.source = Some(source);
                self.frame = Some(frame);
                self.render_count += 1;
            }
            // No renderer, nothing to draw
            Ok(None) => self.source = Some(source),
            Err(e) => self.log_load_failure(&e),
        }
        self.frame.as_ref()
    }

    fn log_load_failure(&self, e: &FilterError) {
        if e.is_load_failure() {
            log_warn!("[controller] Image load failed, keeping current image: {}", e);
        } else {
            log_err!("[controller] New image could not be rendered, keeping current image: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn render_if_requested(&mut self) -> Option<&Frame> {
        if self.params.take_render_request() {
            self.render()
        } else {
            self.frame.as_ref()
        }
    }

    /// Render the current source with the current snapshot.  Errors keep the
    /// previous frame.
    pub fn render(&mut self) -> Option<&Frame> {
        let _ = self.params.take_render_request();
        match self.try_render() {
            Ok(frame) => {
                self.frame = Some(frame);
                self.render_count += 1;
            }
            Err(None) => {}
            Err(Some(e)) => log_err!("[controller] Render failed: {}", e),
        }
        self.frame.as_ref()
    }

    /// `Err(None)`: nothing to render (no source or no renderer).
    fn try_render(&mut self) -> std::result::Result<Frame, Option<FilterError>> {
        let (Some(renderer), Some(source)) = (self.renderer.as_mut(), self.source.as_ref()) else {
            return Err(None);
        };
        renderer.render(source, &self.params.snapshot()).map_err(Some)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn params(&self) -> FilterParams {
        self.params.snapshot()
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn renderer_name(&self) -> Option<&str> {
        self.renderer.as_ref().map(|r| r.name())
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CpuRenderer;
    use image::RgbaImage;

    fn cpu_controller() -> FilterController {
        FilterController::new(Some(Box::new(CpuRenderer::default())))
    }

    fn red_source() -> SourceImage {
        SourceImage::new(RgbaImage::from_pixel(2, 2, image::Rgba([153, 51, 51, 255])), "red")
    }

    /// CPU renderer that refuses anything wider than `max_width`.
    struct NarrowRenderer {
        inner: CpuRenderer,
        max_width: u32,
    }

    impl FrameRenderer for NarrowRenderer {
        fn name(&self) -> &str {
            "narrow"
        }

        fn render(&mut self, source: &SourceImage, params: &FilterParams) -> Result<Frame> {
            if source.width() > self.max_width {
                return Err(FilterError::TooLarge { width: source.width(), height: source.height() });
            }
            self.inner.render(source, params)
        }
    }

    /// Renderer that always fails, for the error path.
    struct BrokenRenderer;

    impl FrameRenderer for BrokenRenderer {
        fn name(&self) -> &str {
            "broken"
        }

        fn render(&mut self, _: &SourceImage, _: &FilterParams) -> Result<Frame> {
            Err(FilterError::Readback("device lost".into()))
        }
    }

    #[test]
    fn nothing_renders_before_an_image_loads() {
        let mut c = cpu_controller();
        assert!(c.set(ParamField::Brightness, 0.5).is_none());
        assert_eq!(c.render_count(), 0);
        assert_eq!(c.params().brightness, 0.5);
    }

    #[test]
    fn load_then_every_change_renders_a_full_frame() {
        let mut c = cpu_controller();
        let src = red_source();
        let id = src.id();
        let frame = c.finish_load(Ok(src)).unwrap();
        assert_eq!(frame.source_id, id);
        assert_eq!(frame.pixels.len(), 2 * 2 * 4);
        assert_eq!(c.render_count(), 1);

        let frame = c.toggle_greyscale().unwrap();
        assert!(frame.params.greyscale);
        // (0.6 + 0.2 + 0.2) / 3 = 0.333 → 85
        assert_eq!(&frame.pixels[..4], &[85, 85, 85, 255]);
        assert_eq!(c.render_count(), 2);

        c.set(ParamField::Contrast, 2.0);
        c.apply();
        assert_eq!(c.render_count(), 4);
        assert_eq!(c.frame().unwrap().params.contrast, 2.0);
    }

    #[test]
    fn failed_load_keeps_params_and_frame() {
        let mut c = cpu_controller();
        c.finish_load(Ok(red_source()));
        c.set(ParamField::Saturation, 0.0);
        let before_params = c.params();
        let before_pixels = c.frame().unwrap().pixels.clone();
        let before_source = c.source().unwrap().id();
        let renders = c.render_count();

        let frame = c.finish_load(Err(FilterError::HttpStatus {
            url: "https://example.invalid/random".into(),
            status: 500,
        }));
        assert_eq!(frame.unwrap().pixels, before_pixels);
        assert_eq!(c.params(), before_params);
        assert_eq!(c.source().unwrap().id(), before_source);
        assert_eq!(c.render_count(), renders);
    }

    #[test]
    fn failed_first_load_leaves_nothing_displayed() {
        let mut c = cpu_controller();
        assert!(c.finish_load(Err(FilterError::EmptyImage)).is_none());
        assert!(c.source().is_none());
    }

    #[test]
    fn new_load_replaces_source_wholesale() {
        let mut c = cpu_controller();
        c.finish_load(Ok(red_source()));
        let next = SourceImage::new(RgbaImage::new(5, 1), "next");
        let next_id = next.id();
        let frame = c.finish_load(Ok(next)).unwrap();
        assert_eq!((frame.width, frame.height), (5, 1));
        assert_eq!(frame.source_id, next_id);
    }

    #[test]
    fn missing_renderer_makes_renders_no_ops() {
        let mut c = FilterController::new(None);
        assert!(!c.has_renderer());
        assert!(c.finish_load(Ok(red_source())).is_none());
        assert!(c.set(ParamField::Contrast, 2.0).is_none());
        assert!(c.source().is_some());
        assert_eq!(c.params().contrast, 2.0);
    }

    #[test]
    fn render_errors_keep_previous_frame() {
        let mut c = FilterController::new(Some(Box::new(BrokenRenderer)));
        assert!(c.finish_load(Ok(red_source())).is_none());
        assert!(c.source().is_none());
        assert_eq!(c.renderer_name(), Some("broken"));
        assert_eq!(c.render_count(), 0);
    }

    #[test]
    fn unrenderable_load_keeps_previous_image_live() {
        let mut c = FilterController::new(Some(Box::new(NarrowRenderer {
            inner: CpuRenderer::default(),
            max_width: 4,
        })));
        let small = red_source();
        let small_id = small.id();
        c.finish_load(Ok(small));

        let big = SourceImage::new(RgbaImage::new(8, 8), "big");
        let frame = c.finish_load(Ok(big)).unwrap();
        assert_eq!(frame.source_id, small_id);
        assert_eq!(c.source().unwrap().id(), small_id);
        assert_eq!(c.render_count(), 1);

        // Later changes still reach the screen through the old image
        let frame = c.set(ParamField::Brightness, 0.5).unwrap();
        assert_eq!(frame.params.brightness, 0.5);
        assert_eq!((frame.width, frame.height), (2, 2));
        assert_eq!(c.render_count(), 2);
    }

    #[test]
    fn reset_restores_defaults_and_renders() {
        let mut c = cpu_controller().with_params(FilterParams {
            brightness: 0.3,
            ..FilterParams::DEFAULT
        });
        c.finish_load(Ok(red_source()));
        let frame = c.reset().unwrap();
        assert!(frame.params.is_identity());
        assert_eq!(&frame.pixels[..4], &[153, 51, 51, 255]);
    }
}
