// ============================================================================
// ERRORS — one crate-wide error type
// ============================================================================

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Debug, Error)]
pub enum FilterError {
    /// No usable adapter or device. Fatal for the GPU session.
    #[error("GPU unavailable: {0}")]
    GpuUnavailable(String),

    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("pipeline creation failed: {0}")]
    PipelineCreation(String),

    #[error("GPU readback failed: {0}")]
    Readback(String),

    #[error("image is {width}x{height}, too large for this GPU")]
    TooLarge { width: u32, height: u32 },

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server answered {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("download from {url} exceeds {limit} bytes")]
    DownloadTooLarge { url: String, limit: u64 },

    #[error("image loader crashed: {0}")]
    LoaderPanic(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("unsupported output format '{0}'")]
    UnsupportedFormat(String),

    #[error("config error: {0}")]
    Config(String),
}

impl FilterError {
    /// Load failures are non-fatal: the previous image stays on screen.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            FilterError::Network(_)
                | FilterError::HttpStatus { .. }
                | FilterError::DownloadTooLarge { .. }
                | FilterError::LoaderPanic(_)
                | FilterError::Io(_)
                | FilterError::Decode(_)
                | FilterError::EmptyImage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failures_are_classified() {
        assert!(FilterError::EmptyImage.is_load_failure());
        assert!(
            FilterError::HttpStatus { url: "https://x".into(), status: 404 }.is_load_failure()
        );
        assert!(FilterError::LoaderPanic("boom".into()).is_load_failure());
        assert!(!FilterError::TooLarge { width: 9, height: 9 }.is_load_failure());
        assert!(!FilterError::ShaderCompile("bad".into()).is_load_failure());
        assert!(!FilterError::GpuUnavailable("none".into()).is_load_failure());
    }

    #[test]
    fn messages_carry_diagnostics() {
        let e = FilterError::ShaderCompile("expected ';'".into());
        assert_eq!(e.to_string(), "shader compilation failed: expected ';'");
        let e = FilterError::HttpStatus { url: "https://host/img".into(), status: 503 };
        assert_eq!(e.to_string(), "server answered 503 for https://host/img");
    }
}
