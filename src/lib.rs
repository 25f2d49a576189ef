pub mod logger;

pub mod controller;
pub mod error;
pub mod gpu;
pub mod io;
pub mod ops;
pub mod params;
pub mod render;
pub mod settings;

pub use controller::FilterController;
pub use error::{FilterError, Result};
pub use params::{FilterParams, ParamField, ParameterStore};
pub use render::{CpuRenderer, Frame, FrameRenderer, SourceImage};
pub use settings::{AppSettings, Backend};

use ops::adjustments::SaturationModel;

/// Build the renderer for `backend`.  GPU setup failure is logged once and
/// yields `None`; the caller keeps running without frames.
pub fn build_renderer(
    backend: Backend,
    preferred_gpu: &str,
    model: SaturationModel,
) -> Option<Box<dyn FrameRenderer>> {
    match backend {
        Backend::Cpu => Some(Box::new(CpuRenderer::new(model))),
        Backend::Gpu => match gpu::GpuRenderer::new(preferred_gpu, model) {
            Ok(r) => Some(Box::new(r)),
            Err(e) => {
                log_err!("[gpu] Setup failed, rendering disabled: {}", e);
                None
            }
        },
    }
}
