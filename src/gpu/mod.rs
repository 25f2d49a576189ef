// ============================================================================
// GPU MODULE — hardware-accelerated filter rendering for PhotoFX
// ============================================================================
//
// Architecture:
//   context.rs  — wgpu Device, Queue, adapter init, validation scopes
//   shaders.rs  — WGSL shader source (inline strings)
//   texture.rs  — SourceTexture upload + offscreen RenderTarget
//   filter.rs   — render pipeline, uniforms, readback
//   renderer.rs — GpuRenderer: FrameRenderer over the pieces above
// ============================================================================

pub mod context;
pub mod filter;
pub mod renderer;
pub mod shaders;
pub mod texture;

pub use context::GpuContext;
pub use renderer::GpuRenderer;

/// Format of the source texture and the render target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// `bytes_per_row` of a texture→buffer copy must be a multiple of 256.
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Size of the padded readback buffer for a `width` x `height` target.
pub fn readback_size(width: u32, height: u32) -> u64 {
    aligned_bytes_per_row(width) as u64 * height as u64
}

/// Whether a `width` x `height` image can be uploaded, drawn, and read back
/// within a device's texture and buffer limits.
pub fn fits_limits(width: u32, height: u32, max_texture_dim: u32, max_buffer_size: u64) -> bool {
    width <= max_texture_dim
        && height <= max_texture_dim
        && readback_size(width, height) <= max_buffer_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_256_bytes() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
        assert_eq!(aligned_bytes_per_row(640), 2560);
    }

    #[test]
    fn readback_size_does_not_wrap_at_u32() {
        // 32768 * 4 bytes per row * 32768 rows = 4 GiB
        assert_eq!(readback_size(32768, 32768), 1 << 32);
    }

    #[test]
    fn buffer_limit_rejects_images_within_texture_limit() {
        let max_buffer = 256 << 20;
        assert!(fits_limits(1024, 768, 16384, max_buffer));
        // 40192 bytes per row * 7000 rows is about 281 MB
        assert!(!fits_limits(10000, 7000, 16384, max_buffer));
        assert!(fits_limits(10000, 7000, 16384, 1 << 30));
        assert!(!fits_limits(16385, 1, 16384, 1 << 30));
    }
}
