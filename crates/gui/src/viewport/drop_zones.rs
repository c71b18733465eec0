//! Overlay surface: one egui drop zone per block.
//!
//! Zones are positioned from the same rects the painter draws. A word chip
//! released over a zone becomes a [`DropEvent`]; the session drains them.

use std::collections::HashMap;

use egui::{Color32, Pos2, Stroke, StrokeKind};
use kurbo::Rect;

use blockmatch_lib::surface::{DropEvent, OverlaySurface, RegionHandle};
use shared::{BlockId, WordId};

use super::to_screen_rect;

const HOVER_FILL: Color32 = Color32::from_rgba_premultiplied(40, 120, 60, 90);
const OUTLINE: Color32 = Color32::from_rgb(255, 0, 255);

/// Word shown inside a block
pub struct Occupant {
    pub word_id: WordId,
    pub text: String,
    pub correct: bool,
}

#[derive(Default)]
pub struct DropZoneSurface {
    regions: HashMap<RegionHandle, (BlockId, Rect)>,
    next_handle: u32,
    drops: Vec<DropEvent>,
}

impl DropZoneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out the zones for this frame and collect released words.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        origin: Pos2,
        occupants: &HashMap<BlockId, Occupant>,
        show_result: bool,
        outlines: bool,
    ) {
        let mut zones: Vec<(RegionHandle, BlockId, egui::Rect)> = self
            .regions
            .iter()
            .map(|(handle, (block_id, rect))| (*handle, block_id.clone(), to_screen_rect(origin, *rect)))
            .collect();
        zones.sort_by_key(|(handle, _, _)| handle.0);

        let dragging = egui::DragAndDrop::has_payload_of_type::<WordId>(ui.ctx());
        let released = ui.input(|i| i.pointer.any_released());

        for (_, block_id, zone) in zones {
            let hovered = ui.rect_contains_pointer(zone);

            if dragging && hovered {
                ui.painter().rect_filled(zone, 3.0, HOVER_FILL);
            }
            if outlines {
                ui.painter()
                    .rect_stroke(zone, 0.0, Stroke::new(1.0, OUTLINE), StrokeKind::Outside);
            }

            if let Some(occupant) = occupants.get(&block_id) {
                let color = match (show_result, occupant.correct) {
                    (false, _) => Color32::from_rgb(230, 230, 230),
                    (true, true) => Color32::from_rgb(120, 220, 120),
                    (true, false) => Color32::from_rgb(240, 110, 100),
                };
                ui.scope_builder(egui::UiBuilder::new().max_rect(zone.shrink(2.0)), |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.dnd_drag_source(
                            egui::Id::new(("placed_word", occupant.word_id.as_str())),
                            occupant.word_id.clone(),
                            |ui| ui.colored_label(color, &occupant.text),
                        );
                    });
                });
            }

            if dragging && hovered && released {
                if let Some(word_id) = egui::DragAndDrop::take_payload::<WordId>(ui.ctx()) {
                    tracing::debug!(word = %word_id, block = %block_id, "word released on block");
                    self.drops.push(DropEvent {
                        dragged_word_id: (*word_id).clone(),
                        block_id: block_id.clone(),
                    });
                }
            }
        }
    }
}

impl OverlaySurface for DropZoneSurface {
    fn create_region(&mut self, block_id: &str, rect: Rect) -> RegionHandle {
        let handle = RegionHandle(self.next_handle);
        self.next_handle += 1;
        self.regions.insert(handle, (block_id.to_string(), rect));
        handle
    }

    fn update_region(&mut self, handle: RegionHandle, rect: Rect) {
        if let Some(entry) = self.regions.get_mut(&handle) {
            entry.1 = rect;
        }
    }

    fn remove_region(&mut self, handle: RegionHandle) {
        self.regions.remove(&handle);
    }

    fn clear(&mut self) {
        self.regions.clear();
        self.drops.clear();
    }

    fn drain_drops(&mut self) -> Vec<DropEvent> {
        std::mem::take(&mut self.drops)
    }
}
