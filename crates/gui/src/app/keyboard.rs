//! Keyboard shortcut handling

use eframe::egui;
use std::time::Instant;

use super::AppState;

/// Handle keyboard shortcuts for the application
pub fn handle_keyboard(ctx: &egui::Context, state: &mut AppState) {
    // Don't handle shortcuts when a text field is focused
    if ctx.memory(|m| m.focused().is_some()) {
        return;
    }

    let (recenter, reset, check, escape) = ctx.input(|i| {
        (
            i.key_pressed(egui::Key::F) && !i.modifiers.command,
            i.modifiers.command && i.key_pressed(egui::Key::R),
            i.modifiers.command && i.key_pressed(egui::Key::Enter),
            i.key_pressed(egui::Key::Escape),
        )
    });

    if recenter {
        state.session.recenter(Instant::now());
    }
    if reset {
        state.reset_answers();
    }
    if check {
        state.check();
    }
    // Escape hides the result colors and clears the notice
    if escape {
        state.show_result = false;
        state.notice = None;
    }
}
