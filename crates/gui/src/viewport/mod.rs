//! Exercise viewport: backdrop, shapes and drop zones over one container rect

mod drop_zones;
mod painter;

use std::collections::HashMap;
use std::time::Instant;

use egui::{Pos2, Ui};
use kurbo::Size;

use blockmatch_lib::session::ExerciseSession;

pub use drop_zones::{DropZoneSurface, Occupant};
pub use painter::PainterSurface;

/// Session type of the native host
pub type HostSession = ExerciseSession<PainterSurface, DropZoneSurface>;

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(24, 24, 28);

pub(crate) fn to_screen_pos(origin: Pos2, p: kurbo::Point) -> Pos2 {
    egui::pos2(origin.x + p.x as f32, origin.y + p.y as f32)
}

pub(crate) fn to_screen_rect(origin: Pos2, r: kurbo::Rect) -> egui::Rect {
    egui::Rect::from_min_max(
        to_screen_pos(origin, kurbo::Point::new(r.x0, r.y0)),
        to_screen_pos(origin, kurbo::Point::new(r.x1, r.y1)),
    )
}

/// Central panel hosting both surfaces
#[derive(Default)]
pub struct ExerciseViewport {
    /// Container size last reported to the session
    last_size: Option<Size>,
}

impl ExerciseViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        session: &mut HostSession,
        texture: Option<&egui::TextureHandle>,
        show_result: bool,
        outlines: bool,
        now: Instant,
    ) {
        let (rect, _response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());

        let size = Size::new(f64::from(rect.width()), f64::from(rect.height()));
        if self.last_size != Some(size) {
            self.last_size = Some(size);
            session.resize(size, now);
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);
        session.render().paint(&painter, rect.min, texture);

        let occupants = occupants(session);
        session
            .overlay_mut()
            .show(ui, rect.min, &occupants, show_result, outlines);
    }
}

fn occupants(session: &HostSession) -> HashMap<shared::BlockId, Occupant> {
    let model = session.model();
    let placement = session.placement();
    model
        .blocks()
        .iter()
        .filter_map(|block| {
            let word_id = placement.occupant(&block.id)?;
            let word = model.word(word_id)?;
            Some((
                block.id.clone(),
                Occupant {
                    word_id: word_id.clone(),
                    text: word.text.clone(),
                    correct: word_id == &block.id,
                },
            ))
        })
        .collect()
}
