// ============================================================================
// SETTINGS — read-only `key = value` configuration
// ============================================================================
//
// Nothing is ever written back; a missing file simply means defaults.
//
//   preferred_gpu        = auto | high performance | low power
//   image_url            = https://picsum.photos/1024/768
//   request_timeout_secs = 30
//   saturation_model     = linear | hsl
//   backend              = gpu | cpu
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{FilterError, Result};
use crate::log_warn;
use crate::ops::adjustments::SaturationModel;

pub const DEFAULT_IMAGE_URL: &str = "https://picsum.photos/1024/768";
const SETTINGS_FILE: &str = "photofx_settings.cfg";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Gpu,
    Cpu,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gpu" | "wgpu" => Ok(Backend::Gpu),
            "cpu" => Ok(Backend::Cpu),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Gpu => "gpu",
            Backend::Cpu => "cpu",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Adapter power preference passed to `GpuContext::new`.
    pub preferred_gpu: String,
    /// Endpoint returning a random raster image.
    pub image_url: String,
    pub request_timeout_secs: u64,
    pub saturation_model: SaturationModel,
    pub backend: Backend,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            preferred_gpu: "auto".to_string(),
            image_url: DEFAULT_IMAGE_URL.to_string(),
            request_timeout_secs: 30,
            saturation_model: SaturationModel::Linear,
            backend: Backend::Gpu,
        }
    }
}

impl AppSettings {
    /// `<config dir>/PhotoFX/photofx_settings.cfg`
    pub fn settings_path() -> PathBuf {
        config_dir().join("PhotoFX").join(SETTINGS_FILE)
    }

    /// Load from the default location; defaults when missing or unreadable.
    pub fn load() -> Self {
        match std::fs::read_to_string(Self::settings_path()) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Load an explicitly named file.  Unlike `load`, a missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FilterError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Self::parse(&content))
    }

    /// Parse `key = value` lines.  Comments (`#`), blank lines, and unknown keys
    /// are skipped; malformed values keep the default and log a warning.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "preferred_gpu" => s.preferred_gpu = val.to_string(),
                "image_url" => {
                    if val.is_empty() {
                        log_warn!("[settings] empty image_url, keeping {}", s.image_url);
                    } else {
                        s.image_url = val.to_string();
                    }
                }
                "request_timeout_secs" => match val.parse::<u64>() {
                    Ok(v) if v > 0 => s.request_timeout_secs = v,
                    _ => log_warn!("[settings] bad request_timeout_secs '{}'", val),
                },
                "saturation_model" => match val.parse() {
                    Ok(m) => s.saturation_model = m,
                    Err(e) => log_warn!("[settings] {}", e),
                },
                "backend" => match val.parse() {
                    Ok(b) => s.backend = b,
                    Err(e) => log_warn!("[settings] {}", e),
                },
                _ => {}
            }
        }
        s
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config");
        }
    }
    crate::logger::data_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_content_gives_defaults() {
        assert_eq!(AppSettings::parse(""), AppSettings::default());
    }

    #[test]
    fn parses_known_keys() {
        let s = AppSettings::parse(
            "# demo config\n\
             preferred_gpu = low power\n\
             image_url=https://example.com/random\n\
             request_timeout_secs = 5\n\
             saturation_model = HSL\n\
             backend = cpu\n",
        );
        assert_eq!(s.preferred_gpu, "low power");
        assert_eq!(s.image_url, "https://example.com/random");
        assert_eq!(s.request_timeout(), Duration::from_secs(5));
        assert_eq!(s.saturation_model, SaturationModel::Hsl);
        assert_eq!(s.backend, Backend::Cpu);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let s = AppSettings::parse(
            "request_timeout_secs = soon\n\
             saturation_model = lab\n\
             backend = tpu\n\
             image_url =\n\
             no_equals_sign\n\
             mystery = 42\n",
        );
        assert_eq!(s, AppSettings::default());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let s = AppSettings::parse("request_timeout_secs = 0");
        assert_eq!(s.request_timeout_secs, 30);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend = cpu").unwrap();
        let s = AppSettings::load_from(file.path()).unwrap();
        assert_eq!(s.backend, Backend::Cpu);
    }

    #[test]
    fn load_from_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppSettings::load_from(&dir.path().join("nope.cfg")).unwrap_err();
        assert!(matches!(err, FilterError::Config(_)));
    }
}
