//! Side panel with the words to place.
//!
//! Unplaced words are drag sources. The whole panel is a drop zone too:
//! dragging a placed word back onto it takes the word off its block.

use egui::{Color32, Ui};

use shared::WordId;

use crate::app::AppState;
use crate::i18n::t;

fn word_chip(ui: &mut Ui, word_id: &WordId, text: &str) {
    ui.dnd_drag_source(
        egui::Id::new(("bank_word", word_id.as_str())),
        word_id.clone(),
        |ui| {
            egui::Frame::NONE
                .fill(Color32::from_rgb(50, 55, 70))
                .corner_radius(egui::CornerRadius::same(4))
                .inner_margin(egui::Margin::symmetric(8, 4))
                .show(ui, |ui| {
                    ui.label(text);
                });
        },
    );
}

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading(t("bank.title"));
    ui.separator();

    if state.session.model().words().is_empty() {
        ui.weak(t("bank.no_exercise"));
        return;
    }

    let frame = egui::Frame::NONE.inner_margin(egui::Margin::same(4));
    let (_, dropped) = ui.dnd_drop_zone::<WordId, ()>(frame, |ui| {
        ui.set_min_width(ui.available_width());
        ui.label(t("bank.unplaced"));

        let model = state.session.model();
        let unplaced: Vec<(WordId, String)> = state
            .session
            .placement()
            .unplaced_words()
            .filter_map(|id| model.word(id).map(|w| (id.clone(), w.text.clone())))
            .collect();

        if unplaced.is_empty() {
            ui.weak(t("bank.empty"));
        } else {
            ui.horizontal_wrapped(|ui| {
                for (id, text) in &unplaced {
                    word_chip(ui, id, text);
                }
            });
        }
        ui.add_space(4.0);
        ui.weak(t("bank.drop_hint"));
    });

    if let Some(word_id) = dropped {
        if let Err(e) = state.session.remove_word(&word_id) {
            tracing::debug!("take back ignored: {e}");
        }
        state.show_result = false;
    }

    ui.add_space(8.0);
    ui.label(t("bank.placed"));

    let placed: Vec<(WordId, String, String)> = {
        let model = state.session.model();
        let placement = state.session.placement();
        model
            .words()
            .iter()
            .filter_map(|word| {
                placement
                    .block_of(&word.id)
                    .map(|block| (word.id.clone(), word.text.clone(), block.clone()))
            })
            .collect()
    };

    let mut remove = None;
    egui::ScrollArea::vertical()
        .id_salt("placed_words")
        .max_height((ui.available_height() - 40.0).max(60.0))
        .show(ui, |ui| {
            for (word_id, text, block_id) in &placed {
                ui.horizontal(|ui| {
                    ui.label(text);
                    ui.weak(format!("→ {} {block_id}", t("bank.block")));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✖").on_hover_text(t("bank.remove")).clicked() {
                            remove = Some(word_id.clone());
                        }
                    });
                });
            }
        });

    if let Some(word_id) = remove {
        if let Err(e) = state.session.remove_word(&word_id) {
            tracing::debug!("remove ignored: {e}");
        }
        state.show_result = false;
    }

    ui.separator();
    let can_check = state.session.placement().can_submit();
    if ui
        .add_enabled(can_check, egui::Button::new(t("bank.check")))
        .clicked()
    {
        state.check();
    }
}
