//! Capability interfaces of the two visual surfaces.
//!
//! The render surface draws block hit-shapes and arrows; the overlay surface
//! owns the native interactive regions that receive drops. The sync engine
//! writes identical geometry to both in one pass.

pub mod recording;

use std::collections::HashMap;

use kurbo::{Rect, Size};
use serde::Serialize;
use shared::{BlockId, EntityId, WordId};

use crate::geometry::ArrowGeometry;

pub use recording::{RecordingOverlaySurface, RecordingRenderSurface};

/// Opaque handle of a shape on the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ShapeHandle(pub u32);

/// Opaque handle of a region on the overlay surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RegionHandle(pub u32);

/// What the render surface shows behind the shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Backdrop {
    /// Image still loading; nothing is drawn
    Pending,
    Image { native_width: f64, native_height: f64 },
    /// Image failed or timed out; transparent, shapes still drawn
    Unavailable,
}

impl Backdrop {
    pub fn image(native: Size) -> Self {
        Self::Image {
            native_width: native.width,
            native_height: native.height,
        }
    }
}

/// A word released over an overlay region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropEvent {
    pub dragged_word_id: WordId,
    pub block_id: BlockId,
}

pub trait RenderSurface {
    /// Show `backdrop`, drawn into `display` when the image is placed
    fn set_backdrop(&mut self, backdrop: Backdrop, display: Option<Rect>);

    /// Create or move the hit-shape of a block
    fn upsert_block(&mut self, handle: ShapeHandle, block_id: &str, rect: Rect);

    /// Create or replace an arrow
    fn upsert_arrow(&mut self, handle: ShapeHandle, arrow_id: &str, geometry: &ArrowGeometry);

    fn remove_shape(&mut self, handle: ShapeHandle);

    fn clear(&mut self);

    fn request_repaint(&mut self);
}

pub trait OverlaySurface {
    fn create_region(&mut self, block_id: &str, rect: Rect) -> RegionHandle;

    fn update_region(&mut self, handle: RegionHandle, rect: Rect);

    fn remove_region(&mut self, handle: RegionHandle);

    fn clear(&mut self);

    /// Drops received since the last call, in arrival order
    fn drain_drops(&mut self) -> Vec<DropEvent>;
}

/// Id → handle lookup for everything currently on the surfaces.
///
/// Rebuilt once per sync pass; interactions never search the surfaces.
#[derive(Debug, Default, Clone)]
pub struct ShapeIndex {
    blocks: HashMap<BlockId, (ShapeHandle, RegionHandle)>,
    arrows: HashMap<EntityId, ShapeHandle>,
    next_shape: u32,
}

impl ShapeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, block_id: &str) -> Option<(ShapeHandle, RegionHandle)> {
        self.blocks.get(block_id).copied()
    }

    pub fn arrow(&self, arrow_id: &str) -> Option<ShapeHandle> {
        self.arrows.get(arrow_id).copied()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn arrow_count(&self) -> usize {
        self.arrows.len()
    }

    pub fn block_ids(&self) -> impl Iterator<Item = &BlockId> {
        self.blocks.keys()
    }

    pub fn arrow_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.arrows.keys()
    }

    /// Allocate a fresh render handle
    pub fn allocate_shape(&mut self) -> ShapeHandle {
        let handle = ShapeHandle(self.next_shape);
        self.next_shape += 1;
        handle
    }

    pub fn insert_block(&mut self, block_id: BlockId, shape: ShapeHandle, region: RegionHandle) {
        self.blocks.insert(block_id, (shape, region));
    }

    pub fn insert_arrow(&mut self, arrow_id: EntityId, shape: ShapeHandle) {
        self.arrows.insert(arrow_id, shape);
    }

    pub fn remove_block(&mut self, block_id: &str) -> Option<(ShapeHandle, RegionHandle)> {
        self.blocks.remove(block_id)
    }

    pub fn remove_arrow(&mut self, arrow_id: &str) -> Option<ShapeHandle> {
        self.arrows.remove(arrow_id)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.arrows.clear();
        self.next_shape = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_allocates_unique_handles() {
        let mut index = ShapeIndex::new();
        let a = index.allocate_shape();
        let b = index.allocate_shape();
        assert_ne!(a, b);

        index.insert_block("1".into(), a, RegionHandle(7));
        index.insert_arrow("a1".into(), b);
        assert_eq!(index.block("1"), Some((a, RegionHandle(7))));
        assert_eq!(index.arrow("a1"), Some(b));

        assert_eq!(index.remove_block("1"), Some((a, RegionHandle(7))));
        assert_eq!(index.block_count(), 0);

        index.clear();
        assert_eq!(index.arrow_count(), 0);
        assert_eq!(index.allocate_shape(), ShapeHandle(0));
    }

    #[test]
    fn test_backdrop_serializes_with_state_tag() {
        let json = serde_json::to_value(Backdrop::image(Size::new(10.0, 20.0))).unwrap();
        assert_eq!(json["state"], "image");
        assert_eq!(json["native_height"], 20.0);
    }
}
