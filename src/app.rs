use eframe::egui;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jonnybox::config::AppConfig;
use jonnybox::geometry::{self, Presentation, ScreenRect, SurfaceSize};
use jonnybox::loader::{LoadKind, Loader};
use jonnybox::model::Rgb;
use jonnybox::render::{self, Surface};
use jonnybox::{project, AnnotateError, Category, Document, ImagePoint, Interaction};
use jonnybox::{PointerEvent, Response};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

fn to_color32(c: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(c.r, c.g, c.b)
}

/// Blocking notice with a single OK button.
fn notify(message: impl Into<String>) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title("Jonnybox")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

// ── Canvas placement ────────────────────────────────────────────────────────

/// Where the rendered surface sits inside the central panel this frame.
struct Placement {
    image_rect: egui::Rect,
    screen: ScreenRect,
    /// Surface size as presented (width and height swap when rotated).
    buffer: SurfaceSize,
    /// Display pixels per surface pixel.
    scale: f32,
    presentation: Presentation,
}

impl Placement {
    fn new(panel: egui::Rect, canvas: SurfaceSize, presentation: Presentation) -> Option<Self> {
        let buffer = match presentation {
            Presentation::Upright => canvas,
            Presentation::Rotated => SurfaceSize::new(canvas.height, canvas.width),
        };
        let (w, h) = geometry::fit_to_viewport((panel.width(), panel.height()), buffer);
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        let image_rect = egui::Rect::from_center_size(panel.center(), egui::vec2(w, h));
        Some(Self {
            image_rect,
            screen: ScreenRect::new(image_rect.left(), image_rect.top(), w, h),
            buffer,
            scale: w / buffer.width as f32,
            presentation,
        })
    }

    fn contains(&self, pos: egui::Pos2) -> bool {
        self.screen.contains(pos.x, pos.y)
    }

    fn to_image(&self, pos: egui::Pos2) -> ImagePoint {
        match self.presentation {
            Presentation::Upright => {
                geometry::map_pointer(self.screen, self.buffer, pos.x, pos.y, self.presentation)
            }
            Presentation::Rotated => {
                // Rotated mapping works in unscaled surface units.
                let x = self.screen.left + (pos.x - self.screen.left) / self.scale;
                let y = self.screen.top + (pos.y - self.screen.top) / self.scale;
                geometry::map_pointer(self.screen, self.buffer, x, y, self.presentation)
            }
        }
    }

    fn paint(&self, painter: &egui::Painter, texture: &egui::TextureHandle) {
        let white = egui::Color32::WHITE;
        match self.presentation {
            Presentation::Upright => {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(texture.id(), self.image_rect, uv, white);
            }
            Presentation::Rotated => {
                // Quarter turn clockwise: the image's top edge runs down the right side.
                let r = self.image_rect;
                let mut mesh = egui::Mesh::with_texture(texture.id());
                for (pos, uv) in [
                    (r.left_top(), egui::pos2(0.0, 1.0)),
                    (r.right_top(), egui::pos2(0.0, 0.0)),
                    (r.right_bottom(), egui::pos2(1.0, 0.0)),
                    (r.left_bottom(), egui::pos2(1.0, 1.0)),
                ] {
                    mesh.vertices.push(egui::epaint::Vertex {
                        pos,
                        uv,
                        color: white,
                    });
                }
                mesh.indices.extend([0, 1, 2, 0, 2, 3]);
                painter.add(egui::Shape::mesh(mesh));
            }
        }
    }
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct JonnyboxApp {
    document: Document,
    interaction: Interaction,
    loader: Loader,
    config: AppConfig,

    /// File the current Document came from, used to name PNG exports.
    source_path: Option<PathBuf>,

    surface: Option<Surface>,
    texture: Option<egui::TextureHandle>,
    needs_render: bool,

    instructions: String,
    status: String,
}

impl JonnyboxApp {
    pub fn new(config: AppConfig, open: Option<PathBuf>) -> Self {
        let interaction = Interaction::new(config.data.default_category);
        let mut app = Self {
            document: Document::new(),
            interaction,
            loader: Loader::new(),
            config,
            source_path: None,
            surface: None,
            texture: None,
            needs_render: true,
            instructions: String::new(),
            status: String::new(),
        };

        if let Some(path) = open {
            let kind = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
                LoadKind::Project
            } else {
                LoadKind::Image
            };
            app.start_load(kind, path);
        }
        app
    }

    fn presentation(&self) -> Presentation {
        self.config.data.presentation()
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            tracing::error!("Failed to save config: {}", e);
        }
    }

    fn report(&mut self, err: AnnotateError) {
        tracing::warn!("{}", err);
        match &err {
            // A stray click in a freehand mode is not worth a dialog.
            AnnotateError::InvalidGeometry { .. } => self.status = err.to_string(),
            _ => notify(err.to_string()),
        }
    }

    fn file_dialog(&self) -> rfd::FileDialog {
        let dialog = rfd::FileDialog::new();
        match &self.config.data.last_directory {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }

    fn remember_directory(&mut self, file: &Path) {
        if self.config.remember_directory(file) {
            self.save_config();
        }
    }

    // ── Commands ────────────────────────────────────────────────────────────

    fn start_load(&mut self, kind: LoadKind, path: PathBuf) {
        self.remember_directory(&path);
        match self.loader.start(kind, path) {
            Ok(()) => self.status = self.loader.describe().unwrap_or_default(),
            Err(e) => self.report(e),
        }
    }

    fn pick_image(&mut self) {
        let picked = self
            .file_dialog()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.start_load(LoadKind::Image, path);
        }
    }

    fn pick_project(&mut self) {
        let picked = self
            .file_dialog()
            .add_filter("Project", &["json"])
            .pick_file();
        if let Some(path) = picked {
            self.start_load(LoadKind::Project, path);
        }
    }

    fn export_project(&mut self) {
        if let Err(e) = self.try_export_project() {
            self.report(e);
        }
    }

    fn try_export_project(&mut self) -> jonnybox::Result<()> {
        let bytes = project::serialize(&self.document)?;
        let Some(path) = self
            .file_dialog()
            .add_filter("Project", &["json"])
            .set_file_name(&self.config.data.export_file_name)
            .save_file()
        else {
            return Ok(());
        };
        std::fs::write(&path, bytes)?;
        tracing::info!(path = ?path, markers = self.document.store().len(), "project exported");
        self.status = format!("Saved {}", path.display());
        self.remember_directory(&path);
        Ok(())
    }

    fn export_png(&mut self) {
        if let Err(e) = self.try_export_png() {
            self.report(e);
        }
    }

    fn try_export_png(&mut self) -> jonnybox::Result<()> {
        let flat = render::flatten(&self.document)?;
        let stem = self
            .source_path
            .as_deref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("jonnybox");
        let Some(path) = self
            .file_dialog()
            .add_filter("PNG", &["png"])
            .set_file_name(format!("{stem}_annotated.png"))
            .save_file()
        else {
            return Ok(());
        };
        flat.save_with_format(&path, image::ImageFormat::Png)?;
        tracing::info!(path = ?path, "flattened image exported");
        self.status = format!("Exported {}", path.display());
        self.remember_directory(&path);
        Ok(())
    }

    fn undo(&mut self) {
        match self.document.store_mut().undo_last() {
            Ok(marker) => {
                self.status = format!("Removed {}", marker.step_label());
                self.needs_render = true;
            }
            // Undo on an empty list is a no-op.
            Err(AnnotateError::NoMarkers) => {}
            Err(e) => self.report(e),
        }
    }

    fn add_instructions(&mut self) {
        match self.document.store_mut().set_last_instructions(&self.instructions) {
            Ok(marker) => {
                self.status = format!("Instructions added to step #{}", marker.number);
                self.instructions.clear();
            }
            Err(e) => self.report(e),
        }
    }

    fn set_category(&mut self, category: Category) {
        self.interaction.set_active_category(category);
        if self.config.data.default_category != category {
            self.config.data.default_category = category;
            self.save_config();
        }
    }

    // ── Frame plumbing ─────────────────────────────────────────────────────

    fn poll_loader(&mut self, ctx: &egui::Context) {
        match self.loader.poll() {
            Some(Ok(loaded)) => {
                self.document = loaded.document;
                self.interaction.reset();
                self.instructions.clear();
                self.source_path = Some(loaded.source);
                self.needs_render = true;
                self.status = match loaded.kind {
                    LoadKind::Image => "Image loaded".to_string(),
                    LoadKind::Project => {
                        format!("Project loaded with {} steps", self.document.store().len())
                    }
                };
            }
            Some(Err(e)) => {
                self.status.clear();
                self.report(e);
            }
            None if self.loader.is_busy() => {
                ctx.request_repaint_after(Duration::from_millis(30));
            }
            None => {}
        }
    }

    fn apply_pointer(&mut self, event: PointerEvent) {
        match self.interaction.handle(&mut self.document, event) {
            Ok(Response::Unchanged) => {}
            Ok(Response::Redraw) => self.needs_render = true,
            Ok(Response::Committed { category, number }) => {
                self.status = format!("Added #{number} ({})", category.label());
                self.needs_render = true;
            }
            Err(e) => {
                self.needs_render = true;
                self.report(e);
            }
        }
    }

    fn handle_canvas_input(&mut self, ctx: &egui::Context, placement: &Placement) {
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            let pointer = match event {
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    ..
                } => {
                    if !placement.contains(pos) {
                        continue;
                    }
                    PointerEvent::Down(placement.to_image(pos))
                }
                egui::Event::PointerButton {
                    button: egui::PointerButton::Primary,
                    pressed: false,
                    ..
                } => PointerEvent::Up,
                egui::Event::PointerMoved(pos) => {
                    if !self.interaction.is_capturing() {
                        continue;
                    }
                    if placement.contains(pos) {
                        PointerEvent::Move(placement.to_image(pos))
                    } else {
                        PointerEvent::Leave
                    }
                }
                egui::Event::PointerGone => PointerEvent::Leave,
                egui::Event::Touch {
                    phase: egui::TouchPhase::Cancel,
                    ..
                } => PointerEvent::Cancel,
                _ => continue,
            };
            self.apply_pointer(pointer);
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.needs_render && self.texture.is_some() {
            return;
        }
        let canvas = self.document.canvas();
        let reusable = self.surface.as_mut().is_some_and(|s| s.resize(canvas));
        if !reusable {
            self.surface = Surface::new(canvas);
        }
        let Some(surface) = self.surface.as_mut() else {
            tracing::error!(?canvas, "cannot allocate drawing surface");
            return;
        };
        render::render(surface, &self.document, self.interaction.pending());

        let size = surface.size();
        let color_image = egui::ColorImage::from_rgba_premultiplied(
            [size.width as usize, size.height as usize],
            surface.data(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("canvas", color_image, egui::TextureOptions::LINEAR));
            }
        }
        self.needs_render = false;
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Jonnybox");
        ui.add_space(4.0);

        let busy = self.loader.is_busy();
        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Load image")).clicked() {
                self.pick_image();
            }
            if ui.add_enabled(!busy, egui::Button::new("Import")).clicked() {
                self.pick_project();
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Export project").clicked() {
                self.export_project();
            }
            if ui.button("Export PNG").clicked() {
                self.export_png();
            }
        });

        ui.separator();
        ui.label("Mode");
        let active = self.interaction.active_category();
        for category in Category::ALL {
            let text = egui::RichText::new(category.label()).color(to_color32(category.color()));
            if ui.selectable_label(active == category, text).clicked() {
                self.set_category(category);
            }
        }

        let mut rotated = self.config.data.rotated_presentation;
        if ui.checkbox(&mut rotated, "Rotate view").changed() {
            self.interaction.reset();
            self.config.data.rotated_presentation = rotated;
            self.needs_render = true;
            self.save_config();
        }

        ui.separator();
        ui.label("Instructions for the last step");
        ui.add(egui::TextEdit::multiline(&mut self.instructions).desired_rows(3));
        ui.horizontal(|ui| {
            if ui.button("Add instructions").clicked() {
                self.add_instructions();
            }
            let can_undo = !self.document.store().is_empty();
            if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                self.undo();
            }
        });

        ui.separator();
        ui.label("Steps");
        egui::ScrollArea::vertical().show(ui, |ui| {
            for marker in self.document.store().markers() {
                let text = egui::RichText::new(marker.step_label())
                    .color(to_color32(marker.category.color()));
                ui.label(text);
            }
        });
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for JonnyboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(reason) = self.config.take_reset_reason() {
            notify(reason);
        }

        self.poll_loader(ctx);

        if !ctx.wants_keyboard_input() {
            let (undo, save) = ctx.input(|i| {
                (
                    i.modifiers.ctrl && i.key_pressed(egui::Key::Z),
                    i.modifiers.ctrl && i.key_pressed(egui::Key::S),
                )
            });
            if undo {
                self.undo();
            }
            if save {
                self.export_project();
            }
        }

        egui::SidePanel::left("tools")
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| self.side_panel(ui));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let panel = response.rect;
            painter.rect_filled(panel, 0.0, egui::Color32::from_gray(40));

            let Some(placement) = Placement::new(panel, self.document.canvas(), self.presentation())
            else {
                return;
            };

            self.handle_canvas_input(ctx, &placement);
            self.refresh_texture(ctx);
            if let Some(texture) = &self.texture {
                placement.paint(&painter, texture);
            }
        });
    }
}
