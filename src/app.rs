use eframe::egui;

use photofx::io::{ImageLoader, ImageLocation};
use photofx::{AppSettings, FilterController, ParamField, build_renderer, log_info, logger};

const BRIGHTNESS_RANGE: std::ops::RangeInclusive<f32> = -1.0..=1.0;
const CONTRAST_RANGE: std::ops::RangeInclusive<f32> = 0.0..=3.0;
const SATURATION_RANGE: std::ops::RangeInclusive<f32> = 0.0..=3.0;

// ============================================================================
// APP — control panel on the left, filtered frame in the middle
// ============================================================================

pub struct PhotoFxApp {
    settings: AppSettings,
    controller: FilterController,
    loader: ImageLoader,
    /// Texture holding the latest frame; replaced in place on re-render.
    frame_texture: Option<egui::TextureHandle>,
    /// `controller.render_count()` at the last texture upload.
    uploaded_render: u64,
}

impl PhotoFxApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        log_info!(
            "[app] Settings: backend={} gpu='{}' model={} url={}",
            settings.backend,
            settings.preferred_gpu,
            settings.saturation_model,
            settings.image_url
        );

        let renderer = build_renderer(
            settings.backend,
            &settings.preferred_gpu,
            settings.saturation_model,
        );
        let controller = FilterController::new(renderer);
        let mut loader = ImageLoader::new(settings.request_timeout());

        // First image on startup
        loader.request(ImageLocation::Url(settings.image_url.clone()));

        Self {
            settings,
            controller,
            loader,
            frame_texture: None,
            uploaded_render: 0,
        }
    }

    fn request_random_image(&mut self) {
        self.loader
            .request(ImageLocation::Url(self.settings.image_url.clone()));
    }

    /// Push the controller's frame to the GPU texture egui draws from.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        if self.controller.render_count() == self.uploaded_render {
            return;
        }
        let Some(frame) = self.controller.frame() else { return };
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            &frame.pixels,
        );
        match &mut self.frame_texture {
            Some(tex) => tex.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.frame_texture =
                    Some(ctx.load_texture("photofx_frame", image, egui::TextureOptions::LINEAR));
            }
        }
        self.uploaded_render = self.controller.render_count();
    }

    fn controls_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Adjustments");
        ui.add_space(8.0);

        let mut p = self.controller.params();

        if ui
            .add(egui::Slider::new(&mut p.brightness, BRIGHTNESS_RANGE).text(ParamField::Brightness.label()))
            .changed()
        {
            self.controller.set(ParamField::Brightness, p.brightness);
        }
        if ui
            .add(egui::Slider::new(&mut p.contrast, CONTRAST_RANGE).text(ParamField::Contrast.label()))
            .changed()
        {
            self.controller.set(ParamField::Contrast, p.contrast);
        }
        if ui
            .add(egui::Slider::new(&mut p.saturation, SATURATION_RANGE).text(ParamField::Saturation.label()))
            .changed()
        {
            self.controller.set(ParamField::Saturation, p.saturation);
        }
        if ui.toggle_value(&mut p.greyscale, ParamField::Greyscale.label()).clicked() {
            self.controller.toggle_greyscale();
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                self.controller.apply();
            }
            if ui.button("Reset").clicked() {
                self.controller.reset();
            }
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let loading = self.loader.is_loading();
            if ui
                .add_enabled(!loading, egui::Button::new("Load random image"))
                .clicked()
            {
                self.request_random_image();
            }
            if loading {
                ui.spinner();
            }
        });

        ui.separator();
        ui.weak(match self.controller.renderer_name() {
            Some(name) => format!("Renderer: {}", name),
            None => "Renderer: unavailable".to_string(),
        });
        if let Some(src) = self.controller.source() {
            ui.weak(format!("{}x{}", src.width(), src.height()));
        }
        if let Some(path) = logger::log_path() {
            ui.weak(format!("Log: {}", path.display()));
        }
    }

    fn frame_view(&self, ui: &mut egui::Ui) {
        let Some(tex) = &self.frame_texture else {
            ui.centered_and_justified(|ui| {
                if self.loader.is_loading() {
                    ui.spinner();
                } else if !self.controller.has_renderer() {
                    ui.label("No GPU available. See the log for details.");
                } else {
                    ui.label("No image loaded.");
                }
            });
            return;
        };

        // Scale to fit, never up
        let avail = ui.available_size();
        let [w, h] = tex.size();
        let scale = (avail.x / w as f32).min(avail.y / h as f32).min(1.0);
        let size = egui::vec2(w as f32 * scale, h as f32 * scale);
        ui.vertical_centered(|ui| {
            ui.add_space(((avail.y - size.y) * 0.5).max(0.0));
            ui.add(egui::Image::new(egui::load::SizedTexture::new(tex.id(), size)).fit_to_exact_size(size));
        });
    }
}

impl eframe::App for PhotoFxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- Finished loads: newest wins, failures keep the current image ---
        if let Some(result) = self.loader.poll() {
            self.controller.finish_load(result);
        }
        if self.loader.is_loading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }

        egui::SidePanel::left("photofx_controls")
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| self.controls_panel(ui));

        self.sync_texture(ctx);

        egui::CentralPanel::default().show(ctx, |ui| self.frame_view(ui));
    }
}
