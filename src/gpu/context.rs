// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::sync::Arc;

use crate::error::{FilterError, Result};
use crate::{log_info, log_warn};

/// Holds the core wgpu resources.  Created once per session; failure to
/// create it is fatal for GPU rendering and is not retried.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
    /// Largest buffer the device accepts; bounds the readback staging buffer.
    pub max_buffer_size: u64,
}

impl GpuContext {
    /// Tries a hardware adapter first, then the software rasterizer
    /// (`force_fallback_adapter`).
    ///
    /// `pollster::block_on` because eframe doesn't expose its own device to
    /// application code and the filter renders offscreen.
    pub fn new(preferred_gpu: &str) -> Result<Self> {
        match pollster::block_on(Self::new_async(preferred_gpu, false)) {
            Ok(ctx) => return Ok(ctx),
            Err(e) => log_warn!("[GPU] Hardware adapter unavailable ({}), trying software fallback", e),
        }
        pollster::block_on(Self::new_async(preferred_gpu, true))
    }

    async fn new_async(preferred_gpu: &str, force_fallback: bool) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power_preference(preferred_gpu),
                compatible_surface: None, // headless, offscreen target only
                force_fallback_adapter: force_fallback,
            })
            .await
            .ok_or_else(|| FilterError::GpuUnavailable("no compatible adapter".into()))?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("PhotoFX GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        max_buffer_size: limits.max_buffer_size,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
            .map_err(|e| FilterError::GpuUnavailable(e.to_string()))?;

        log_info!(
            "[GPU] Using adapter '{}' (max texture {}px, max buffer {} MiB{})",
            adapter_name,
            limits.max_texture_dimension_2d,
            limits.max_buffer_size >> 20,
            if force_fallback { ", software" } else { "" }
        );

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
            max_buffer_size: limits.max_buffer_size,
        })
    }

    /// Check if an image of the given dimensions can be rendered and read back.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        super::fits_limits(width, height, self.max_texture_dim, self.max_buffer_size)
    }

    /// Submit a single encoder's commands.
    pub fn submit_one(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Run `create` inside a validation error scope.  Shader compile and
    /// pipeline link problems surface here instead of as an uncaptured panic.
    pub fn validated<T>(
        &self,
        create: impl FnOnce(&wgpu::Device) -> T,
        on_error: impl FnOnce(String) -> FilterError,
    ) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(self.device.as_ref());
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(value),
            Some(err) => Err(on_error(err.to_string())),
        }
    }
}

/// Map the settings string onto a wgpu power preference.
pub fn power_preference(preferred_gpu: &str) -> wgpu::PowerPreference {
    match preferred_gpu.trim().to_lowercase().as_str() {
        "low power" | "integrated" => wgpu::PowerPreference::LowPower,
        "high performance" | "discrete" => wgpu::PowerPreference::HighPerformance,
        _ => wgpu::PowerPreference::HighPerformance,
    }
}
