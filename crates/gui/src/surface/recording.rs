//! In-memory surfaces for headless sessions.
//!
//! They store exactly what the engine wrote so tests and the validator can
//! compare the two surfaces after each pass.

use std::collections::{HashMap, VecDeque};

use kurbo::Rect;

use super::{
    Backdrop, DropEvent, OverlaySurface, RegionHandle, RenderSurface, ShapeHandle,
};
use crate::geometry::ArrowGeometry;

#[derive(Debug, Clone)]
pub struct RecordingRenderSurface {
    backdrop: Backdrop,
    display: Option<Rect>,
    blocks: HashMap<ShapeHandle, (String, Rect)>,
    arrows: HashMap<ShapeHandle, (String, ArrowGeometry)>,
    repaints: u64,
}

impl Default for RecordingRenderSurface {
    fn default() -> Self {
        Self {
            backdrop: Backdrop::Pending,
            display: None,
            blocks: HashMap::new(),
            arrows: HashMap::new(),
            repaints: 0,
        }
    }
}

impl RecordingRenderSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backdrop(&self) -> Backdrop {
        self.backdrop
    }

    pub fn display_rect(&self) -> Option<Rect> {
        self.display
    }

    pub fn block_rect(&self, block_id: &str) -> Option<Rect> {
        self.blocks
            .values()
            .find(|(id, _)| id == block_id)
            .map(|(_, rect)| *rect)
    }

    pub fn arrow(&self, arrow_id: &str) -> Option<&ArrowGeometry> {
        self.arrows
            .values()
            .find(|(id, _)| id == arrow_id)
            .map(|(_, geometry)| geometry)
    }

    /// Every block shape as `(block_id, rect)`
    pub fn blocks(&self) -> impl Iterator<Item = (&str, Rect)> {
        self.blocks.values().map(|(id, rect)| (id.as_str(), *rect))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn arrow_count(&self) -> usize {
        self.arrows.len()
    }

    /// Repaints requested since creation
    pub fn repaints(&self) -> u64 {
        self.repaints
    }
}

impl RenderSurface for RecordingRenderSurface {
    fn set_backdrop(&mut self, backdrop: Backdrop, display: Option<Rect>) {
        self.backdrop = backdrop;
        self.display = display;
    }

    fn upsert_block(&mut self, handle: ShapeHandle, block_id: &str, rect: Rect) {
        self.blocks.insert(handle, (block_id.to_string(), rect));
    }

    fn upsert_arrow(&mut self, handle: ShapeHandle, arrow_id: &str, geometry: &ArrowGeometry) {
        self.arrows
            .insert(handle, (arrow_id.to_string(), geometry.clone()));
    }

    fn remove_shape(&mut self, handle: ShapeHandle) {
        self.blocks.remove(&handle);
        self.arrows.remove(&handle);
    }

    fn clear(&mut self) {
        self.blocks.clear();
        self.arrows.clear();
        self.backdrop = Backdrop::Pending;
        self.display = None;
    }

    fn request_repaint(&mut self) {
        self.repaints += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingOverlaySurface {
    regions: HashMap<RegionHandle, (String, Rect)>,
    next_handle: u32,
    drops: VecDeque<DropEvent>,
}

impl RecordingOverlaySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region_rect(&self, block_id: &str) -> Option<Rect> {
        self.regions
            .values()
            .find(|(id, _)| id == block_id)
            .map(|(_, rect)| *rect)
    }

    /// Every region as `(block_id, rect)`
    pub fn regions(&self) -> impl Iterator<Item = (&str, Rect)> {
        self.regions.values().map(|(id, rect)| (id.as_str(), *rect))
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Queue a drop as the platform gesture source would.
    pub fn simulate_drop(&mut self, word_id: &str, block_id: &str) {
        self.drops.push_back(DropEvent {
            dragged_word_id: word_id.to_string(),
            block_id: block_id.to_string(),
        });
    }
}

impl OverlaySurface for RecordingOverlaySurface {
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
        self.drops.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_region_lifecycle() {
        let mut overlay = RecordingOverlaySurface::new();
        let h = overlay.create_region("1", Rect::new(0.0, 0.0, 10.0, 10.0));
        overlay.update_region(h, Rect::new(5.0, 5.0, 15.0, 15.0));
        assert_eq!(overlay.region_rect("1"), Some(Rect::new(5.0, 5.0, 15.0, 15.0)));

        overlay.remove_region(h);
        assert_eq!(overlay.region_count(), 0);
        // Updating a removed region is ignored
        overlay.update_region(h, Rect::ZERO);
        assert_eq!(overlay.region_count(), 0);
    }

    #[test]
    fn test_drops_drain_in_order() {
        let mut overlay = RecordingOverlaySurface::new();
        overlay.simulate_drop("1", "2");
        overlay.simulate_drop("3", "4");
        let drops = overlay.drain_drops();
        assert_eq!(drops.len(), 2);
        assert_eq!(drops[0].dragged_word_id, "1");
        assert_eq!(drops[1].block_id, "4");
        assert!(overlay.drain_drops().is_empty());
    }

    #[test]
    fn test_render_remove_and_clear() {
        let mut render = RecordingRenderSurface::new();
        render.upsert_block(ShapeHandle(0), "1", Rect::new(0.0, 0.0, 1.0, 1.0));
        render.upsert_block(ShapeHandle(1), "2", Rect::new(0.0, 0.0, 2.0, 2.0));
        render.remove_shape(ShapeHandle(0));
        assert!(render.block_rect("1").is_none());
        assert_eq!(render.block_count(), 1);

        render.request_repaint();
        render.clear();
        assert_eq!(render.block_count(), 0);
        assert_eq!(render.repaints(), 1);
        assert_eq!(render.backdrop(), Backdrop::Pending);
    }
}
