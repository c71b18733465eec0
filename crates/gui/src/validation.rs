//! Surface validation utilities.
//!
//! `SurfaceValidator` checks that the render and overlay surfaces agree after
//! a sync pass: same set of blocks, identical rects, all inside the image.

use kurbo::Rect;

use crate::surface::{RecordingOverlaySurface, RecordingRenderSurface};
use crate::sync::SyncFrame;

/// Tolerance for rect comparisons, in container pixels
pub const RECT_EPSILON: f64 = 1e-9;

fn rects_match(a: Rect, b: Rect, epsilon: f64) -> bool {
    (a.x0 - b.x0).abs() <= epsilon
        && (a.y0 - b.y0).abs() <= epsilon
        && (a.x1 - b.x1).abs() <= epsilon
        && (a.y1 - b.y1).abs() <= epsilon
}

/// Validator over a pair of recording surfaces and the frame they show.
pub struct SurfaceValidator<'a> {
    render: &'a RecordingRenderSurface,
    overlay: &'a RecordingOverlaySurface,
    frame: Option<&'a SyncFrame>,
}

impl<'a> SurfaceValidator<'a> {
    pub fn new(
        render: &'a RecordingRenderSurface,
        overlay: &'a RecordingOverlaySurface,
        frame: Option<&'a SyncFrame>,
    ) -> Self {
        Self {
            render,
            overlay,
            frame,
        }
    }

    /// Every block shape has exactly one region with the same rect, and
    /// the other way round.
    pub fn surfaces_mirror(&self) -> bool {
        self.render.block_count() == self.overlay.region_count()
            && self.render.blocks().all(|(id, rect)| {
                self.overlay
                    .region_rect(id)
                    .is_some_and(|r| rects_match(r, rect, RECT_EPSILON))
            })
    }

    /// Surfaces show exactly the blocks and arrows of the frame.
    pub fn matches_frame(&self) -> bool {
        let Some(frame) = self.frame else {
            return self.render.block_count() == 0 && self.overlay.region_count() == 0;
        };
        self.render.block_count() == frame.blocks.len()
            && self.render.arrow_count() == frame.arrows.len()
            && frame.blocks.iter().all(|b| {
                self.render
                    .block_rect(&b.block_id)
                    .is_some_and(|r| rects_match(r, b.rect, RECT_EPSILON))
            })
            && frame
                .arrows
                .iter()
                .all(|a| self.render.arrow(&a.arrow_id) == Some(&a.geometry))
    }

    /// No region extends past the image's display rect.
    pub fn regions_inside_image(&self) -> bool {
        let Some(frame) = self.frame else {
            return true;
        };
        let bounds = frame.transform.display_rect();
        self.overlay.regions().all(|(_, r)| {
            r.x0 >= bounds.x0 - RECT_EPSILON
                && r.y0 >= bounds.y0 - RECT_EPSILON
                && r.x1 <= bounds.x1 + RECT_EPSILON
                && r.y1 <= bounds.y1 + RECT_EPSILON
                && r.area() > 0.0
        })
    }

    /// Run all validation checks and return a list of error messages.
    /// An empty list means the surfaces are consistent.
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.surfaces_mirror() {
            let drifted: Vec<&str> = self
                .render
                .blocks()
                .filter(|(id, rect)| {
                    !self
                        .overlay
                        .region_rect(id)
                        .is_some_and(|r| rects_match(r, *rect, RECT_EPSILON))
                })
                .map(|(id, _)| id)
                .collect();
            errors.push(format!(
                "Render has {} blocks, overlay has {} regions; mismatched: {:?}",
                self.render.block_count(),
                self.overlay.region_count(),
                drifted
            ));
        }

        if !self.matches_frame() {
            errors.push("Surfaces do not show the last committed frame".to_string());
        }

        if !self.regions_inside_image() {
            errors.push("Overlay region extends past the image".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{OverlaySurface, RenderSurface, ShapeHandle};

    #[test]
    fn test_empty_surfaces_are_valid() {
        let render = RecordingRenderSurface::new();
        let overlay = RecordingOverlaySurface::new();
        let v = SurfaceValidator::new(&render, &overlay, None);
        assert!(v.validate_all().is_empty());
    }

    #[test]
    fn test_detects_drift() {
        let mut render = RecordingRenderSurface::new();
        let mut overlay = RecordingOverlaySurface::new();
        render.upsert_block(ShapeHandle(0), "1", Rect::new(0.0, 0.0, 10.0, 10.0));
        overlay.create_region("1", Rect::new(0.0, 0.0, 10.0, 10.5));

        let v = SurfaceValidator::new(&render, &overlay, None);
        assert!(!v.surfaces_mirror());
        let errors = v.validate_all();
        assert!(errors[0].contains("\"1\""), "{errors:?}");
    }

    #[test]
    fn test_detects_missing_region() {
        let mut render = RecordingRenderSurface::new();
        let overlay = RecordingOverlaySurface::new();
        render.upsert_block(ShapeHandle(0), "1", Rect::new(0.0, 0.0, 10.0, 10.0));
        let v = SurfaceValidator::new(&render, &overlay, None);
        assert_eq!(v.validate_all().len(), 2);
    }
}
