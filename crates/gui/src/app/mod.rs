//! Main application module

mod keyboard;
mod menus;
mod styles;

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Instant;

use eframe::egui;
use kurbo::Size;

use blockmatch_lib::diagnostics::Diagnostic;
use blockmatch_lib::sync::ImageTicket;
use shared::ExercisePayload;

use crate::i18n::{set_lang, t};
use crate::loader::{ImageLoader, ImageSource, LoadedImage};
use crate::state::AppSettings;
use crate::ui::{status_bar, word_bank};
use crate::viewport::{DropZoneSurface, ExerciseViewport, HostSession, PainterSurface};

/// Everything the panels read and mutate
pub struct AppState {
    pub settings: AppSettings,
    pub session: HostSession,
    /// Directory relative image paths are resolved against
    pub exercise_dir: Option<PathBuf>,
    pub texture: Option<egui::TextureHandle>,
    pub show_word_bank: bool,
    pub show_settings_window: bool,
    /// Color placed words by correctness
    pub show_result: bool,
    /// Transient message shown in the status bar
    pub notice: Option<String>,
    loader: Option<ImageLoader>,
    /// Recent diagnostic messages for the status bar tooltip
    pub warnings: Vec<Diagnostic>,
}

impl AppState {
    fn new(settings: AppSettings) -> Self {
        let loader = match ImageLoader::new() {
            Ok(loader) => Some(loader),
            Err(e) => {
                tracing::error!("Failed to start image loader: {e}");
                None
            }
        };
        let session = HostSession::new(
            PainterSurface::new(),
            DropZoneSurface::new(),
            settings.engine.session_config(),
        );
        Self {
            settings,
            session,
            exercise_dir: None,
            texture: None,
            show_word_bank: true,
            show_settings_window: false,
            show_result: false,
            notice: None,
            loader,
            warnings: Vec::new(),
        }
    }

    /// Read an exercise file and start it.
    pub fn open_exercise(&mut self, ctx: &egui::Context, path: &Path) {
        let payload = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| serde_json::from_str::<ExercisePayload>(&json).map_err(|e| e.to_string()));
        match payload {
            Ok(payload) => {
                tracing::info!("Loaded exercise from {} ({} words)", path.display(), payload.words.len());
                self.exercise_dir = path.parent().map(Path::to_path_buf);
                self.settings.last_exercise = Some(path.to_path_buf());
                self.settings.save();
                self.start(ctx, &payload);
            }
            Err(e) => {
                tracing::error!("Failed to open exercise {}: {e}", path.display());
                self.notice = Some(format!("{}: {e}", t("notice.load_failed")));
            }
        }
    }

    fn start(&mut self, ctx: &egui::Context, payload: &ExercisePayload) {
        self.texture = None;
        self.show_result = false;
        self.notice = None;
        let ticket = self.session.load(payload, Instant::now());
        self.request_image(ctx, ticket);
    }

    /// Fetch the backdrop again for the current exercise.
    pub fn reload_image(&mut self, ctx: &egui::Context) {
        if let Some(ticket) = self.session.current_ticket() {
            self.request_image(ctx, ticket);
        }
    }

    fn request_image(&mut self, ctx: &egui::Context, ticket: ImageTicket) {
        let url = self.session.model().image_url.clone();
        let source = match ImageSource::resolve(&url, self.exercise_dir.as_deref()) {
            Ok(source) => source,
            Err(e) => {
                self.session.image_failed(ticket, e.to_string());
                return;
            }
        };
        match &self.loader {
            Some(loader) => {
                loader.request(ticket, source, self.session.config().image_timeout, ctx.clone());
            }
            None => self.session.image_failed(ticket, "image loader unavailable"),
        }
    }

    fn poll_images(&mut self, ctx: &egui::Context) {
        let Some(loader) = &self.loader else {
            return;
        };
        for LoadedImage { ticket, result } in loader.poll() {
            if self.session.current_ticket() != Some(ticket) {
                tracing::debug!(generation = ticket.generation(), "dropping stale image");
                continue;
            }
            match result {
                Ok(image) => {
                    let size = [image.width as usize, image.height as usize];
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.rgba);
                    self.texture = Some(ctx.load_texture(
                        "exercise_backdrop",
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ));
                    self.session.image_loaded(
                        ticket,
                        Size::new(f64::from(image.native_width), f64::from(image.native_height)),
                    );
                }
                Err(e) => self.session.image_failed(ticket, e.to_string()),
            }
        }
    }

    /// Reveal correctness once every word is placed.
    pub fn check(&mut self) {
        if self.session.placement().can_submit() {
            self.show_result = true;
            let placement = self.session.placement();
            self.notice = Some(format!(
                "{}: {}/{}",
                t("notice.result"),
                placement.correct_count(),
                placement.total()
            ));
        } else {
            self.notice = Some(t("notice.incomplete").to_string());
        }
    }

    pub fn reset_answers(&mut self) {
        self.session.reset_placements();
        self.show_result = false;
        self.notice = None;
    }
}

/// Main application
pub struct MatchApp {
    state: AppState,
    viewport: ExerciseViewport,
    diagnostics: Receiver<Diagnostic>,
    /// Last applied font size (to detect changes)
    last_font_size: f32,
}

impl MatchApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_exercise: Option<PathBuf>) -> Self {
        let settings = AppSettings::load();
        set_lang(settings.ui.language.into());
        styles::configure_styles(&cc.egui_ctx, settings.ui.font_size);

        let last_font_size = settings.ui.font_size;
        let mut state = AppState::new(settings);
        let diagnostics = state.session.diagnostics_mut().subscribe();

        // CLI argument takes priority, then the last opened exercise
        if let Some(path) = initial_exercise.or_else(|| state.settings.last_exercise.clone()) {
            state.open_exercise(&cc.egui_ctx, &path);
        }

        Self {
            state,
            viewport: ExerciseViewport::new(),
            diagnostics,
            last_font_size,
        }
    }

    fn collect_diagnostics(&mut self) {
        const KEEP: usize = 20;
        self.state.warnings.extend(self.diagnostics.try_iter());
        let excess = self.state.warnings.len().saturating_sub(KEEP);
        self.state.warnings.drain(..excess);
    }
}

impl eframe::App for MatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.settings.ui.font_size != self.last_font_size {
            styles::apply_font_size(ctx, self.state.settings.ui.font_size);
            self.last_font_size = self.state.settings.ui.font_size;
        }

        self.state.poll_images(ctx);
        keyboard::handle_keyboard(ctx, &mut self.state);

        // ── Menu bar ──────────────────────────────────────────
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                menus::file_menu(ui, &mut self.state);
                menus::exercise_menu(ui, &mut self.state);
                menus::view_menu(ui, &mut self.state);
                menus::settings_menu(ui, &mut self.state);
            });
        });

        // ── Settings window ──────────────────────────────────
        menus::settings_window(ctx, &mut self.state);

        // ── Status bar ───────────────────────────────────────
        self.collect_diagnostics();
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 2)),
            )
            .show(ctx, |ui| {
                status_bar::show(ui, &self.state);
            });

        // ── Right panel: Word bank ───────────────────────────
        if self.state.show_word_bank {
            egui::SidePanel::right("word_bank")
                .default_width(220.0)
                .width_range(160.0..=400.0)
                .resizable(true)
                .show(ctx, |ui| {
                    word_bank::show(ui, &mut self.state);
                });
        }

        // ── Central panel: Exercise viewport ─────────────────
        let now = Instant::now();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(
                    ui,
                    &mut self.state.session,
                    self.state.texture.as_ref(),
                    self.state.show_result,
                    self.state.settings.ui.debug_outlines,
                    now,
                );
            });

        // Drops collected this frame, due resize bursts and image timeouts
        let outcomes = self.state.session.tick(Instant::now());
        if !outcomes.is_empty() {
            tracing::debug!(?outcomes, "placements changed");
            self.state.show_result = false;
        }

        if self.state.session.render_mut().take_repaint() {
            ctx.request_repaint();
        }
        if let Some(at) = self.state.session.next_wakeup() {
            ctx.request_repaint_after(at.saturating_duration_since(Instant::now()));
        }
    }
}
