// ============================================================================
// IMAGE IO — fetch / read, decode, and background loading
// ============================================================================
//
// Loads never block the UI thread: `ImageLoader::request` runs the fetch and
// decode on a worker thread and hands the result back over a channel, which
// the controller polls once per frame.  Only the most recent request counts;
// anything that finishes after a newer request was issued is dropped.
// ============================================================================

use std::fmt;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::error::{FilterError, Result};
use crate::render::SourceImage;
use crate::{log_info, log_warn};

/// Upper bound on a downloaded image body.
pub const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Where a source image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageLocation {
    Url(String),
    Path(PathBuf),
}

impl ImageLocation {
    /// `http://` / `https://` strings are URLs, everything else is a path.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageLocation::Url(trimmed.to_string())
        } else {
            ImageLocation::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for ImageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLocation::Url(u) => f.write_str(u),
            ImageLocation::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Fetch or read, then decode to RGBA8.
pub fn load_image_sync(location: &ImageLocation, timeout: Duration) -> Result<SourceImage> {
    let started = Instant::now();
    let bytes = match location {
        ImageLocation::Url(url) => fetch_bytes(url, timeout)?,
        ImageLocation::Path(path) => std::fs::read(path)?,
    };
    let img = decode_rgba(&bytes)?;
    log_info!(
        "[io] Loaded {} ({}x{}, {} bytes) in {:.0}ms",
        location,
        img.width(),
        img.height(),
        bytes.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(SourceImage::new(img, location.to_string()))
}

/// Decode any format the `image` crate recognizes.  Zero-sized images are
/// rejected since there is nothing to upload.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(FilterError::EmptyImage);
    }
    Ok(img)
}

fn fetch_bytes(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("PhotoFX/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FilterError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    if let Some(len) = response.content_length()
        && len > MAX_DOWNLOAD_BYTES
    {
        return Err(FilterError::DownloadTooLarge {
            url: url.to_string(),
            limit: MAX_DOWNLOAD_BYTES,
        });
    }
    read_limited(response, url, MAX_DOWNLOAD_BYTES)
}

/// Read at most `limit` bytes.  Bodies that keep going past the limit are
/// rejected rather than truncated.
fn read_limited(reader: impl Read, url: &str, limit: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(limit + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > limit {
        return Err(FilterError::DownloadTooLarge {
            url: url.to_string(),
            limit,
        });
    }
    Ok(buf)
}

/// Encode a frame to disk; the format follows the file extension.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "png" | "bmp" | "tga" | "tif" | "tiff" | "ico" => {
            img.save(path)?;
        }
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel
            image::DynamicImage::ImageRgba8(img.clone()).to_rgb8().save(path)?;
        }
        other => return Err(FilterError::UnsupportedFormat(other.to_string())),
    }
    Ok(())
}

// ============================================================================
// BACKGROUND LOADER
// ============================================================================

/// A finished load, tagged with the request that started it.
pub struct LoadOutcome {
    pub request: u64,
    pub location: ImageLocation,
    pub result: Result<SourceImage>,
}

pub struct ImageLoader {
    sender: mpsc::Sender<LoadOutcome>,
    receiver: mpsc::Receiver<LoadOutcome>,
    timeout: Duration,
    latest_request: u64,
    /// Requests whose outcome hasn't been received yet (stale ones included).
    in_flight: usize,
}

impl ImageLoader {
    pub fn new(timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            timeout,
            latest_request: 0,
            in_flight: 0,
        }
    }

    /// Start loading in the background.  Returns the request number.
    pub fn request(&mut self, location: ImageLocation) -> u64 {
        let timeout = self.timeout;
        self.spawn_with(location, move |loc| load_image_sync(loc, timeout))
    }

    fn spawn_with<F>(&mut self, location: ImageLocation, job: F) -> u64
    where
        F: FnOnce(&ImageLocation) -> Result<SourceImage> + Send + 'static,
    {
        self.latest_request += 1;
        self.in_flight += 1;
        let request = self.latest_request;
        let sender = self.sender.clone();
        log_info!("[io] Load #{} requested: {}", request, location);
        std::thread::spawn(move || {
            // A panicking decoder still reports back, so is_loading() clears
            let result = panic::catch_unwind(AssertUnwindSafe(|| job(&location)))
                .unwrap_or_else(|payload| Err(FilterError::LoaderPanic(panic_message(&*payload))));
            let _ = sender.send(LoadOutcome {
                request,
                location,
                result,
            });
        });
        request
    }

    /// True while any requested load hasn't reported back.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Non-blocking: drain finished loads and return the newest request's
    /// result if it has arrived.
    pub fn poll(&mut self) -> Option<Result<SourceImage>> {
        let mut fresh = None;
        while let Ok(outcome) = self.receiver.try_recv() {
            if let Some(result) = self.accept(outcome) {
                fresh = Some(result);
            }
        }
        fresh
    }

    fn accept(&mut self, outcome: LoadOutcome) -> Option<Result<SourceImage>> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if outcome.request != self.latest_request {
            log_warn!(
                "[io] Dropping stale load #{} ({}), newest is #{}",
                outcome.request,
                outcome.location,
                self.latest_request
            );
            return None;
        }
        Some(outcome.result)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl ImageLoader {
        /// Block up to `timeout` for the newest request's result.
        fn wait(&mut self, timeout: Duration) -> Option<Result<SourceImage>> {
            let deadline = Instant::now() + timeout;
            loop {
                let left = deadline.checked_duration_since(Instant::now())?;
                let outcome = self.receiver.recv_timeout(left).ok()?;
                if let Some(result) = self.accept(outcome) {
                    return Some(result);
                }
            }
        }
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn location_parsing() {
        assert_eq!(
            ImageLocation::parse("https://picsum.photos/200"),
            ImageLocation::Url("https://picsum.photos/200".into())
        );
        assert_eq!(
            ImageLocation::parse(" HTTP://host/a.png "),
            ImageLocation::Url("HTTP://host/a.png".into())
        );
        assert_eq!(
            ImageLocation::parse("photos/cat.jpg"),
            ImageLocation::Path(PathBuf::from("photos/cat.jpg"))
        );
    }

    #[test]
    fn loads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 3, 2);
        let img = load_image_sync(&ImageLocation::Path(path), Duration::from_secs(1)).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.pixels().get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loc = ImageLocation::Path(dir.path().join("missing.png"));
        let err = load_image_sync(&loc, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, FilterError::Io(_)));
        assert!(err.is_load_failure());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_rgba(b"definitely not an image").unwrap_err();
        assert!(matches!(err, FilterError::Decode(_)));
    }

    #[test]
    fn save_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::new(1, 1);
        let err = save_image(&img, &dir.path().join("out.xyz")).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedFormat(_)));
        save_image(&img, &dir.path().join("out.png")).unwrap();
        save_image(&img, &dir.path().join("out.jpg")).unwrap();
    }

    #[test]
    fn background_load_delivers_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "b.png", 4, 4);
        let mut loader = ImageLoader::new(Duration::from_secs(1));
        loader.request(ImageLocation::Path(path));
        assert!(loader.is_loading());
        let img = loader.wait(Duration::from_secs(10)).unwrap().unwrap();
        assert_eq!(img.width(), 4);
        assert!(!loader.is_loading());
        assert!(loader.poll().is_none());
    }

    #[test]
    fn background_failure_is_reported_not_panicked() {
        let mut loader = ImageLoader::new(Duration::from_secs(1));
        loader.request(ImageLocation::Path(PathBuf::from("/definitely/not/here.png")));
        let result = loader.wait(Duration::from_secs(10)).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn panicking_job_reports_an_error_and_clears_loading() {
        let mut loader = ImageLoader::new(Duration::from_secs(1));
        loader.spawn_with(ImageLocation::Path("boom.png".into()), |_| {
            panic!("decoder blew up")
        });
        let err = loader.wait(Duration::from_secs(10)).unwrap().unwrap_err();
        match err {
            FilterError::LoaderPanic(msg) => assert_eq!(msg, "decoder blew up"),
            other => panic!("unexpected error {other}"),
        }
        assert!(!loader.is_loading());
    }

    #[test]
    fn body_reads_are_capped() {
        let body = vec![7u8; 100];
        assert_eq!(read_limited(&body[..], "mem", 100).unwrap().len(), 100);
        let err = read_limited(&body[..], "mem", 99).unwrap_err();
        assert!(matches!(err, FilterError::DownloadTooLarge { limit: 99, .. }));
        assert!(err.is_load_failure());
    }

    #[test]
    fn stale_completions_are_dropped() {
        let mut loader = ImageLoader::new(Duration::from_secs(1));
        let (gate_tx, gate_rx) = mpsc::channel::<()>();

        let first = loader.spawn_with(ImageLocation::Path("slow".into()), move |loc| {
            let _ = gate_rx.recv();
            Ok(SourceImage::new(RgbaImage::new(1, 1), loc.to_string()))
        });
        let second = loader.spawn_with(ImageLocation::Path("fast".into()), |loc| {
            Ok(SourceImage::new(RgbaImage::new(2, 2), loc.to_string()))
        });
        assert!(second > first);

        let img = loader.wait(Duration::from_secs(10)).unwrap().unwrap();
        assert_eq!(img.origin, "fast");

        gate_tx.send(()).unwrap();
        assert!(loader.wait(Duration::from_millis(500)).is_none());
        assert!(!loader.is_loading());
    }
}
