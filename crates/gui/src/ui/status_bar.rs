use egui::Ui;

use blockmatch_lib::sync::ImageState;

use crate::app::AppState;
use crate::i18n::t;

pub fn show(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui| {
        let placement = state.session.placement();
        ui.weak(format!(
            "{}: {}/{}",
            t("status.placed"),
            placement.placed_count(),
            placement.total()
        ));
        let (placed, _) = placement.progress();
        ui.add(egui::ProgressBar::new(placed as f32).desired_width(80.0));

        if state.show_result {
            ui.separator();
            ui.label(format!(
                "{}: {}/{}",
                t("status.correct"),
                placement.correct_count(),
                placement.total()
            ));
        }

        ui.separator();

        let image = match state.session.image_state() {
            ImageState::Idle => t("status.image_idle"),
            ImageState::Pending { .. } => t("status.image_pending"),
            ImageState::Ready { .. } => t("status.image_ready"),
            ImageState::Unavailable { .. } => t("status.image_unavailable"),
        };
        ui.weak(format!("{}: {image}", t("status.image")));

        ui.separator();
        ui.weak(format!("{}: {}", t("status.pass"), state.session.engine().passes()));

        if !state.warnings.is_empty() {
            ui.separator();
            ui.colored_label(
                egui::Color32::from_rgb(255, 200, 100),
                format!("{}: {}", t("status.warnings"), state.warnings.len()),
            )
            .on_hover_ui(|ui| {
                for warning in &state.warnings {
                    ui.label(&warning.message);
                }
            });
        }

        if let Some(notice) = &state.notice {
            ui.separator();
            ui.colored_label(egui::Color32::YELLOW, notice);
        } else if placement.can_submit() {
            ui.separator();
            ui.colored_label(egui::Color32::LIGHT_GREEN, t("status.complete"));
        }

        // Right-aligned version
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.weak("blockmatch v0.1");
        });
    });
}
