//! Sync engine: one authoritative recompute-and-repaint pass.
//!
//! A pass fits the image, resolves every block and arrow against that single
//! transform into a [`SyncFrame`], and only then writes the frame to both
//! surfaces. A failed fit leaves the surfaces and the previous frame untouched.

pub mod debounce;
pub mod image_gate;

use std::collections::HashSet;

use kurbo::{Rect, Size};
use serde::Serialize;
use shared::{BlockId, EntityId};

use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, EntityKind, Result};
use crate::geometry::{fit_image, resolve_rect, resolve_segment, ArrowGeometry, FitMode, ImageTransform};
use crate::model::ExerciseModel;
use crate::surface::{Backdrop, OverlaySurface, RenderSurface, ShapeIndex};

pub use debounce::{PendingViewport, ResizeDebouncer, ViewportRequest, DEFAULT_RESIZE_DEBOUNCE};
pub use image_gate::{GateEvent, ImageGate, ImageState, ImageTicket, DEFAULT_IMAGE_TIMEOUT};

/// What caused a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    /// Image decoded, or given up on with a reference size to fall back to
    Load,
    Resize,
    Recenter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBlock {
    pub block_id: BlockId,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedArrow {
    pub arrow_id: EntityId,
    pub geometry: ArrowGeometry,
}

/// Complete geometry of one pass, all resolved with the same transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncFrame {
    pub pass: u64,
    pub mode: FitMode,
    pub transform: ImageTransform,
    pub blocks: Vec<ResolvedBlock>,
    pub arrows: Vec<ResolvedArrow>,
}

impl SyncFrame {
    pub fn block_rect(&self, block_id: &str) -> Option<Rect> {
        self.blocks
            .iter()
            .find(|b| b.block_id == block_id)
            .map(|b| b.rect)
    }

    pub fn arrow(&self, arrow_id: &str) -> Option<&ArrowGeometry> {
        self.arrows
            .iter()
            .find(|a| a.arrow_id == arrow_id)
            .map(|a| &a.geometry)
    }

    /// Same transform and geometry, ignoring the pass number
    pub fn same_geometry(&self, other: &SyncFrame) -> bool {
        self.transform == other.transform && self.blocks == other.blocks && self.arrows == other.arrows
    }
}

pub struct SyncEngine {
    container: Option<Size>,
    reference: Option<Size>,
    backdrop: Backdrop,
    resize_mode: FitMode,
    frame: Option<SyncFrame>,
    index: ShapeIndex,
    passes: u64,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(FitMode::NoUpscaleCentered)
    }
}

impl SyncEngine {
    pub fn new(resize_mode: FitMode) -> Self {
        Self {
            container: None,
            reference: None,
            backdrop: Backdrop::Pending,
            resize_mode,
            frame: None,
            index: ShapeIndex::new(),
            passes: 0,
        }
    }

    // ── State ─────────────────────────────────────────────────

    pub fn container(&self) -> Option<Size> {
        self.container
    }

    pub fn set_container(&mut self, size: Size) {
        self.container = Some(size);
    }

    /// Native size the next pass fits against
    pub fn reference(&self) -> Option<Size> {
        self.reference
    }

    pub fn set_reference(&mut self, reference: Option<Size>, backdrop: Backdrop) {
        self.reference = reference;
        self.backdrop = backdrop;
    }

    pub fn backdrop(&self) -> Backdrop {
        self.backdrop
    }

    pub fn resize_mode(&self) -> FitMode {
        self.resize_mode
    }

    pub fn set_resize_mode(&mut self, mode: FitMode) {
        self.resize_mode = mode;
    }

    /// Last committed frame, `None` before the first successful pass
    pub fn frame(&self) -> Option<&SyncFrame> {
        self.frame.as_ref()
    }

    pub fn transform(&self) -> Option<ImageTransform> {
        self.frame.as_ref().map(|f| f.transform)
    }

    pub fn index(&self) -> &ShapeIndex {
        &self.index
    }

    /// Number of committed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Fit mode a trigger uses. The first fit of an image always contains it.
    pub fn mode_for(&self, trigger: SyncTrigger) -> FitMode {
        match trigger {
            SyncTrigger::Resize if self.frame.is_some() => self.resize_mode,
            _ => FitMode::FitContainMargin,
        }
    }

    // ── Passes ────────────────────────────────────────────────

    /// Run one pass. On a fit failure the error is reported and the current
    /// frame stays on screen.
    pub fn run_pass(
        &mut self,
        trigger: SyncTrigger,
        model: &ExerciseModel,
        render: &mut dyn RenderSurface,
        overlay: &mut dyn OverlaySurface,
        diagnostics: &mut Diagnostics,
    ) -> Result<&SyncFrame> {
        let frame = match self.compute_frame(trigger, model, diagnostics) {
            Ok(frame) => frame,
            Err(err) => {
                diagnostics.report(&err);
                return Err(err);
            }
        };
        self.commit(&frame, render, overlay);
        self.passes = frame.pass;
        tracing::debug!(
            pass = frame.pass,
            ?trigger,
            mode = ?frame.mode,
            blocks = frame.blocks.len(),
            arrows = frame.arrows.len(),
            "sync pass committed"
        );
        let frame: &SyncFrame = self.frame.insert(frame);
        Ok(frame)
    }

    fn compute_frame(
        &self,
        trigger: SyncTrigger,
        model: &ExerciseModel,
        diagnostics: &mut Diagnostics,
    ) -> Result<SyncFrame> {
        let container = self.container.ok_or(EngineError::ContainerSize {
            width: 0.0,
            height: 0.0,
        })?;
        let reference = self.reference.ok_or(EngineError::NoReferenceSize)?;
        let mode = self.mode_for(trigger);
        let transform = fit_image(container, reference, mode)?;

        let mut blocks = Vec::with_capacity(model.blocks().len());
        for block in model.blocks() {
            match resolve_rect(&block.coordinates, &transform) {
                Ok(rect) => blocks.push(ResolvedBlock {
                    block_id: block.id.clone(),
                    rect,
                }),
                Err(issue) => {
                    diagnostics.report(&EngineError::data(EntityKind::Block, &block.id, issue))
                }
            }
        }

        let stroke_scale = transform.stroke_scale();
        let mut arrows = Vec::with_capacity(model.arrows().len());
        for arrow in model.arrows() {
            match resolve_segment(&arrow.start, &arrow.end, &transform) {
                Ok(segment) => arrows.push(ResolvedArrow {
                    arrow_id: arrow.id.clone(),
                    geometry: ArrowGeometry::new(segment, &arrow.style, stroke_scale),
                }),
                Err(issue) => {
                    diagnostics.report(&EngineError::data(EntityKind::Arrow, &arrow.id, issue))
                }
            }
        }

        Ok(SyncFrame {
            pass: self.passes + 1,
            mode,
            transform,
            blocks,
            arrows,
        })
    }

    fn commit(
        &mut self,
        frame: &SyncFrame,
        render: &mut dyn RenderSurface,
        overlay: &mut dyn OverlaySurface,
    ) {
        render.set_backdrop(self.backdrop, Some(frame.transform.display_rect()));

        let mut live_blocks = HashSet::with_capacity(frame.blocks.len());
        for block in &frame.blocks {
            live_blocks.insert(block.block_id.as_str());
            match self.index.block(&block.block_id) {
                Some((shape, region)) => {
                    render.upsert_block(shape, &block.block_id, block.rect);
                    overlay.update_region(region, block.rect);
                }
                None => {
                    let shape = self.index.allocate_shape();
                    let region = overlay.create_region(&block.block_id, block.rect);
                    render.upsert_block(shape, &block.block_id, block.rect);
                    self.index.insert_block(block.block_id.clone(), shape, region);
                }
            }
        }
        let stale: Vec<BlockId> = self
            .index
            .block_ids()
            .filter(|id| !live_blocks.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if let Some((shape, region)) = self.index.remove_block(&id) {
                render.remove_shape(shape);
                overlay.remove_region(region);
            }
        }

        let mut live_arrows = HashSet::with_capacity(frame.arrows.len());
        for arrow in &frame.arrows {
            live_arrows.insert(arrow.arrow_id.as_str());
            let shape = match self.index.arrow(&arrow.arrow_id) {
                Some(shape) => shape,
                None => {
                    let shape = self.index.allocate_shape();
                    self.index.insert_arrow(arrow.arrow_id.clone(), shape);
                    shape
                }
            };
            render.upsert_arrow(shape, &arrow.arrow_id, &arrow.geometry);
        }
        let stale: Vec<EntityId> = self
            .index
            .arrow_ids()
            .filter(|id| !live_arrows.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if let Some(shape) = self.index.remove_arrow(&id) {
                render.remove_shape(shape);
            }
        }

        render.request_repaint();
    }

    /// Push the current backdrop without recomputing geometry.
    pub fn show_backdrop(&self, render: &mut dyn RenderSurface) {
        render.set_backdrop(self.backdrop, self.transform().map(|t| t.display_rect()));
        render.request_repaint();
    }

    /// Drop every shape and region, e.g. before loading another exercise.
    /// The measured container is kept.
    pub fn reset(&mut self, render: &mut dyn RenderSurface, overlay: &mut dyn OverlaySurface) {
        render.clear();
        overlay.clear();
        self.index.clear();
        self.frame = None;
        self.reference = None;
        self.backdrop = Backdrop::Pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::fixtures::*;
    use crate::surface::{RecordingOverlaySurface, RecordingRenderSurface};

    struct Rig {
        engine: SyncEngine,
        model: ExerciseModel,
        render: RecordingRenderSurface,
        overlay: RecordingOverlaySurface,
        diagnostics: Diagnostics,
    }

    impl Rig {
        fn new(payload: shared::ExercisePayload) -> Self {
            let mut diagnostics = Diagnostics::new();
            let model = ExerciseModel::from_payload(&payload, &mut diagnostics);
            let mut engine = SyncEngine::default();
            engine.set_container(Size::new(800.0, 600.0));
            engine.set_reference(
                Some(Size::new(NATIVE.0, NATIVE.1)),
                Backdrop::image(Size::new(NATIVE.0, NATIVE.1)),
            );
            Self {
                engine,
                model,
                render: RecordingRenderSurface::new(),
                overlay: RecordingOverlaySurface::new(),
                diagnostics,
            }
        }

        fn pass(&mut self, trigger: SyncTrigger) -> Result<SyncFrame> {
            self.engine
                .run_pass(
                    trigger,
                    &self.model,
                    &mut self.render,
                    &mut self.overlay,
                    &mut self.diagnostics,
                )
                .cloned()
        }
    }

    #[test]
    fn test_pass_writes_identical_geometry_to_both_surfaces() {
        let mut rig = Rig::new(six_word_payload());
        let frame = rig.pass(SyncTrigger::Load).unwrap();

        assert_eq!(frame.blocks.len(), 6);
        assert_eq!(rig.render.block_count(), 6);
        assert_eq!(rig.overlay.region_count(), 6);
        for block in &frame.blocks {
            assert_eq!(rig.render.block_rect(&block.block_id), Some(block.rect));
            assert_eq!(rig.overlay.region_rect(&block.block_id), Some(block.rect));
        }
        assert_eq!(rig.render.arrow_count(), 2);
        assert_eq!(rig.render.repaints(), 1);
        assert_eq!(rig.render.display_rect(), Some(frame.transform.display_rect()));
    }

    #[test]
    fn test_idempotent_passes() {
        let mut rig = Rig::new(six_word_payload());
        let first = rig.pass(SyncTrigger::Load).unwrap();
        let second = rig.pass(SyncTrigger::Recenter).unwrap();
        assert!(first.same_geometry(&second));
        assert_eq!(second.pass, 2);
        assert_eq!(rig.overlay.region_count(), 6);
        assert_eq!(rig.render.repaints(), 2);
    }

    #[test]
    fn test_first_fit_contains_then_resize_uses_session_mode() {
        let mut rig = Rig::new(six_word_payload());
        rig.engine.set_container(Size::new(2000.0, 1500.0));
        assert_eq!(rig.engine.mode_for(SyncTrigger::Resize), FitMode::FitContainMargin);
        let first = rig.pass(SyncTrigger::Resize).unwrap();
        assert_eq!(first.mode, FitMode::FitContainMargin);

        rig.engine.set_container(Size::new(1700.0, 1300.0));
        let resized = rig.pass(SyncTrigger::Resize).unwrap();
        assert_eq!(resized.mode, FitMode::NoUpscaleCentered);
        assert_eq!(resized.transform.display_width, 1600.0);
        assert_eq!(resized.transform.offset_x, 50.0);
    }

    #[test]
    fn test_failed_fit_keeps_previous_frame() {
        let mut rig = Rig::new(six_word_payload());
        let good = rig.pass(SyncTrigger::Load).unwrap();
        let rect = rig.overlay.region_rect("3");

        rig.engine.set_container(Size::new(0.0, 600.0));
        assert!(matches!(
            rig.pass(SyncTrigger::Resize),
            Err(EngineError::ContainerSize { .. })
        ));
        assert_eq!(rig.engine.frame(), Some(&good));
        assert_eq!(rig.overlay.region_rect("3"), rect);
        assert_eq!(rig.render.repaints(), 1);
        assert_eq!(rig.diagnostics.count_of(DiagnosticKind::Geometry), 1);
    }

    #[test]
    fn test_no_reference_defers() {
        let mut rig = Rig::new(six_word_payload());
        rig.engine.set_reference(None, Backdrop::Unavailable);
        assert!(matches!(
            rig.pass(SyncTrigger::Load),
            Err(EngineError::NoReferenceSize)
        ));
        assert_eq!(rig.overlay.region_count(), 0);
        assert!(rig.engine.frame().is_none());
    }

    #[test]
    fn test_unresolvable_entities_skipped_others_render() {
        let mut payload = six_word_payload();
        payload.blocks.push(absolute_block("7", 5000.0, 10.0, 50.0, 50.0));
        payload.arrows.push(arrow(
            "bad",
            None,
            absolute_point(0.0, 0.0),
            absolute_point(1.0e8, 0.0),
        ));
        let mut rig = Rig::new(payload);
        let frame = rig.pass(SyncTrigger::Load).unwrap();

        assert_eq!(frame.blocks.len(), 6);
        assert!(frame.block_rect("7").is_none());
        assert!(frame.arrow("bad").is_none());
        assert_eq!(rig.render.arrow_count(), 2);
        assert_eq!(rig.diagnostics.count_of(DiagnosticKind::Data), 2);
    }

    #[test]
    fn test_block_leaving_image_removed_from_both_surfaces() {
        let mut rig = Rig::new(six_word_payload());
        rig.pass(SyncTrigger::Load).unwrap();
        assert!(rig.engine.index().block("5").is_some());

        // A smaller reference image pushes absolute block 5 outside it.
        rig.engine.set_reference(
            Some(Size::new(800.0, 600.0)),
            Backdrop::image(Size::new(800.0, 600.0)),
        );
        let frame = rig.pass(SyncTrigger::Recenter).unwrap();
        assert!(frame.block_rect("5").is_none());
        assert!(rig.render.block_rect("5").is_none());
        assert!(rig.overlay.region_rect("5").is_none());
        assert!(rig.engine.index().block("5").is_none());
        assert_eq!(rig.render.block_count(), rig.overlay.region_count());
    }

    #[test]
    fn test_arrow_stroke_scales_with_transform() {
        let mut rig = Rig::new(six_word_payload());
        let frame = rig.pass(SyncTrigger::Load).unwrap();
        let a1 = frame.arrow("a1").unwrap();
        assert!((a1.stroke_width - 2.0 * frame.transform.stroke_scale()).abs() < 1e-9);
        assert!(frame.arrow("a2").unwrap().dash.is_some());
    }

    #[test]
    fn test_reset_clears_surfaces() {
        let mut rig = Rig::new(six_word_payload());
        rig.pass(SyncTrigger::Load).unwrap();
        rig.engine.reset(&mut rig.render, &mut rig.overlay);
        assert_eq!(rig.render.block_count(), 0);
        assert_eq!(rig.overlay.region_count(), 0);
        assert_eq!(rig.engine.index().block_count(), 0);
        assert!(rig.engine.frame().is_none());
        assert_eq!(rig.engine.container(), Some(Size::new(800.0, 600.0)));
    }
}
