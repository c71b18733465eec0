//! Application menu bar and settings window

use std::time::Instant;

use eframe::egui;

use blockmatch_lib::geometry::FitMode;

use super::AppState;
use crate::i18n::{lang, set_lang, t, Lang};
use crate::state::{AppSettings, Language};

/// Show the file menu
pub fn file_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.file"), |ui| {
        if ui.button(t("menu.open")).clicked() {
            ui.close_menu();
            if let Some(path) = rfd::FileDialog::new()
                .set_title(t("menu.open_title"))
                .add_filter("JSON", &["json"])
                .pick_file()
            {
                state.open_exercise(ui.ctx(), &path);
            }
        }
        let can_save = state.session.placement().can_submit();
        if ui
            .add_enabled(can_save, egui::Button::new(t("menu.save_answers")))
            .clicked()
        {
            ui.close_menu();
            save_answers(state);
        }
        ui.separator();
        if ui.button(t("menu.quit")).clicked() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

fn save_answers(state: &mut AppState) {
    let Some(submission) = state.session.submit() else {
        state.notice = Some(t("notice.incomplete").to_string());
        return;
    };
    let file_name = format!("answers-{}.json", submission.test_id);
    let Some(path) = rfd::FileDialog::new()
        .set_title(t("menu.save_answers_title"))
        .add_filter("JSON", &["json"])
        .set_file_name(&file_name)
        .save_file()
    else {
        return;
    };
    let written = serde_json::to_string_pretty(&submission)
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));
    match written {
        Ok(()) => {
            tracing::info!("Saved answers to {}", path.display());
            state.notice = Some(t("notice.saved").to_string());
        }
        Err(e) => {
            tracing::error!("Failed to write answers: {e}");
            state.notice = Some(format!("{}: {e}", t("notice.save_failed")));
        }
    }
}

/// Show the exercise menu
pub fn exercise_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.exercise"), |ui| {
        if ui
            .add_enabled(state.session.placement().can_submit(), egui::Button::new(t("menu.check")))
            .clicked()
        {
            state.check();
            ui.close_menu();
        }
        if ui.button(t("menu.reset")).clicked() {
            state.reset_answers();
            ui.close_menu();
        }
        ui.separator();
        if ui
            .add_enabled(
                state.session.current_ticket().is_some(),
                egui::Button::new(t("menu.reload_image")),
            )
            .clicked()
        {
            state.reload_image(ui.ctx());
            ui.close_menu();
        }
    });
}

/// Show the view menu
pub fn view_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.view"), |ui| {
        ui.checkbox(&mut state.show_word_bank, t("menu.word_bank"));
        if ui
            .checkbox(&mut state.settings.ui.debug_outlines, t("menu.outlines"))
            .changed()
        {
            state.settings.save();
        }
        ui.separator();
        if ui.button(t("menu.recenter")).clicked() {
            state.session.recenter(Instant::now());
            ui.close_menu();
        }
        ui.separator();
        ui.menu_button(t("menu.language"), |ui| {
            for (l, label) in [(Lang::Ru, "Русский"), (Lang::En, "English")] {
                if ui.selectable_label(lang() == l, label).clicked() {
                    set_lang(l);
                    state.settings.ui.language = Language::from(l);
                    state.settings.save();
                    ui.close_menu();
                }
            }
        });
    });
}

/// Show the settings menu
pub fn settings_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.settings"), |ui| {
        if ui.button(t("menu.preferences")).clicked() {
            state.show_settings_window = true;
            ui.close_menu();
        }
    });
}

/// Show the settings window
pub fn settings_window(ctx: &egui::Context, state: &mut AppState) {
    let mut open = state.show_settings_window;
    egui::Window::new(t("settings.title"))
        .open(&mut open)
        .resizable(true)
        .default_width(360.0)
        .show(ctx, |ui| {
            show_engine_settings(ui, state);
            show_ui_settings(ui, state);
            show_settings_buttons(ui, state);
        });
    state.show_settings_window = open && state.show_settings_window;
}

fn fit_mode_label(mode: FitMode) -> &'static str {
    match mode {
        FitMode::FitContainMargin => t("settings.mode_contain"),
        FitMode::NoUpscaleCentered => t("settings.mode_no_upscale"),
    }
}

fn show_engine_settings(ui: &mut egui::Ui, state: &mut AppState) {
    let engine = &mut state.settings.engine;
    ui.heading(t("settings.engine"));

    ui.horizontal(|ui| {
        ui.label(t("settings.resize_debounce"));
        ui.add(
            egui::DragValue::new(&mut engine.resize_debounce_ms)
                .speed(5)
                .range(0..=1000)
                .suffix(" ms"),
        );
    });

    ui.horizontal(|ui| {
        ui.label(t("settings.image_timeout"));
        ui.add(
            egui::DragValue::new(&mut engine.image_timeout_secs)
                .speed(1)
                .range(1..=120)
                .suffix(" s"),
        );
    });

    ui.horizontal(|ui| {
        ui.label(t("settings.resize_mode"));
        egui::ComboBox::from_id_salt("resize_mode")
            .selected_text(fit_mode_label(engine.resize_mode))
            .show_ui(ui, |ui| {
                for mode in FitMode::all() {
                    ui.selectable_value(&mut engine.resize_mode, *mode, fit_mode_label(*mode));
                }
            });
    });
    ui.add_space(10.0);
}

fn show_ui_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(t("settings.ui"));
    ui.horizontal(|ui| {
        ui.label(t("settings.font_size"));
        ui.add(
            egui::DragValue::new(&mut state.settings.ui.font_size)
                .speed(0.5)
                .range(8.0..=24.0)
                .suffix(" pt"),
        );
    });
    ui.add_space(10.0);
}

fn show_settings_buttons(ui: &mut egui::Ui, state: &mut AppState) {
    ui.separator();
    ui.horizontal(|ui| {
        if ui.button(t("settings.apply")).clicked() {
            state
                .session
                .set_config(state.settings.engine.session_config());
            state.settings.save();
        }
        if ui.button(t("settings.reset")).clicked() {
            state.settings = AppSettings {
                last_exercise: state.settings.last_exercise.take(),
                ..AppSettings::default()
            };
            set_lang(state.settings.ui.language.into());
        }
        if ui.button(t("settings.close")).clicked() {
            state.show_settings_window = false;
        }
    });
}
