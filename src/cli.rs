// ============================================================================
// PhotoFX CLI — headless filtering via command-line arguments
// ============================================================================
//
// Usage examples:
//   photofx --input random --output out.png --contrast 1.4
//   photofx -i photo.jpg -o grey.png --greyscale
//   photofx -i https://picsum.photos/800/600 -o warm.jpg -b 0.1 -s 1.3
//   photofx -i photo.png -o out.png --backend cpu --saturation-model hsl
//
// No window is opened.  The image is loaded synchronously on the current
// thread, rendered once through the same controller the GUI uses, and saved.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use photofx::io::{ImageLocation, load_image_sync, save_image};
use photofx::ops::adjustments::SaturationModel;
use photofx::{AppSettings, Backend, FilterController, FilterParams, build_renderer, logger};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// PhotoFX headless image filter.
#[derive(Parser, Debug)]
#[command(
    name = "photofx",
    about = "PhotoFX headless brightness / contrast / saturation filter",
    long_about = "Load an image from a URL or file, apply brightness, contrast,\n\
                  saturation and greyscale adjustments on the GPU (or CPU), and\n\
                  write the result. The output format follows the file extension.\n\n\
                  Example:\n  \
                  photofx --input random --output out.png --contrast 1.4"
)]
pub struct CliArgs {
    /// Image URL, local path, or "random" for the configured endpoint.
    #[arg(short, long, value_name = "URL|PATH|random")]
    pub input: String,

    /// Output file (png, jpg, bmp, tga, tiff, ico).
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Added after contrast. UI range is -1..1.
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub brightness: f32,

    /// Multiplier around zero. UI range is 0..3.
    #[arg(short, long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub contrast: f32,

    /// 0 = grey, 1 = unchanged, >1 = boosted. UI range is 0..3.
    #[arg(short, long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub saturation: f32,

    /// Replace each pixel with the mean of its channels.
    #[arg(short, long)]
    pub greyscale: bool,

    /// gpu or cpu. Defaults to the settings file, then gpu.
    #[arg(long, value_name = "gpu|cpu")]
    pub backend: Option<Backend>,

    /// linear or hsl. Defaults to the settings file, then linear.
    #[arg(long, value_name = "linear|hsl")]
    pub saturation_model: Option<SaturationModel>,

    /// Settings file to use instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Echo log lines to stderr and print timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }

    fn params(&self) -> FilterParams {
        FilterParams {
            brightness: self.brightness,
            contrast: self.contrast,
            saturation: self.saturation,
            greyscale: self.greyscale,
        }
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the filter and return an OS exit code.
/// `0` = frame written, `1` = anything failed.
pub fn run(args: CliArgs) -> ExitCode {
    logger::set_echo(args.verbose);
    let start = Instant::now();
    match run_one(&args) {
        Ok(()) => {
            if args.verbose {
                println!(
                    "  → {} ({:.0}ms)",
                    args.output.display(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Load → render → save
// ============================================================================

fn run_one(args: &CliArgs) -> Result<(), String> {
    let settings = match &args.config {
        Some(path) => AppSettings::load_from(path).map_err(|e| e.to_string())?,
        None => AppSettings::load(),
    };
    let backend = args.backend.unwrap_or(settings.backend);
    let model = args.saturation_model.unwrap_or(settings.saturation_model);

    let location = if args.input.eq_ignore_ascii_case("random") {
        ImageLocation::Url(settings.image_url.clone())
    } else {
        ImageLocation::parse(&args.input)
    };

    // -- Step 1: Renderer ------------------------------------------------
    let renderer = build_renderer(backend, &settings.preferred_gpu, model).ok_or_else(|| {
        "no GPU renderer could be created (try --backend cpu)".to_string()
    })?;
    let mut controller = FilterController::new(Some(renderer)).with_params(args.params());

    // -- Step 2: Load and render -----------------------------------------
    let source = load_image_sync(&location, settings.request_timeout())
        .map_err(|e| format!("load failed: {}", e))?;
    let frame = controller
        .finish_load(Ok(source))
        .cloned()
        .ok_or_else(|| "render failed (see log)".to_string())?;

    // -- Step 3: Save ----------------------------------------------------
    let img = frame
        .into_image()
        .ok_or_else(|| "rendered frame has invalid dimensions".to_string())?;
    save_image(&img, &args.output).map_err(|e| format!("save failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn parses_all_flags() {
        let args = CliArgs::try_parse_from([
            "photofx",
            "-i",
            "random",
            "-o",
            "out.png",
            "--brightness",
            "-0.25",
            "-c",
            "1.5",
            "--saturation",
            "0",
            "--greyscale",
            "--backend",
            "cpu",
            "--saturation-model",
            "hsl",
        ])
        .unwrap();
        assert_eq!(args.input, "random");
        assert_eq!(args.brightness, -0.25);
        assert_eq!(args.contrast, 1.5);
        assert_eq!(args.saturation, 0.0);
        assert!(args.greyscale);
        assert_eq!(args.backend, Some(Backend::Cpu));
        assert_eq!(args.saturation_model, Some(SaturationModel::Hsl));
    }

    #[test]
    fn defaults_are_identity() {
        let args = CliArgs::try_parse_from(["photofx", "-i", "a.png", "-o", "b.png"]).unwrap();
        assert!(args.params().is_identity());
        assert!(args.backend.is_none());
    }

    #[test]
    fn output_is_required() {
        assert!(CliArgs::try_parse_from(["photofx", "-i", "a.png"]).is_err());
    }

    #[test]
    fn cpu_run_writes_filtered_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        RgbaImage::from_pixel(4, 3, image::Rgba([153, 51, 51, 200]))
            .save(&input)
            .unwrap();

        let args = CliArgs::try_parse_from([
            "photofx",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--greyscale",
            "--backend",
            "cpu",
        ])
        .unwrap();
        run_one(&args).unwrap();

        let out = image::open(&output).unwrap().to_rgba8();
        assert_eq!(out.dimensions(), (4, 3));
        assert_eq!(out.get_pixel(2, 1).0, [85, 85, 85, 200]);
    }

    #[test]
    fn missing_input_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let args = CliArgs::try_parse_from([
            "photofx",
            "-i",
            dir.path().join("nope.png").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--backend",
            "cpu",
        ])
        .unwrap();
        let err = run_one(&args).unwrap_err();
        assert!(err.starts_with("load failed"));
        assert!(!output.exists());
    }
}
