//! Coordinate resolution: authored coordinates → on-screen geometry.
//!
//! One primitive per shape kind, shared by blocks and arrows. Relative
//! coordinates scale against their own recorded native size so data authored
//! against a different reference width still lands in the right place.

use kurbo::{Line, Point, Rect, Vec2};
use serde::Serialize;
use shared::{CoordinateSpec, PointSpec};
use thiserror::Error;

use super::fit::ImageTransform;
use crate::model::{Rgba, StrokeStyle};

/// Resolved coordinates beyond this magnitude are treated as corrupt data
pub const SANITY_BOUND: f64 = 10_000.0;

/// Arrow head length and half width at unit stroke scale
const HEAD_LENGTH: f64 = 12.0;
const HEAD_HALF_WIDTH: f64 = 7.0;

/// Dash pattern at unit stroke scale
const DASH_LENGTH: f64 = 8.0;
const DASH_GAP: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ResolveIssue {
    #[error("resolved geometry lies outside the image")]
    OutsideImage,
    #[error("resolved coordinate {value} exceeds sanity bound")]
    OutOfBounds { value: f64 },
    #[error("resolved coordinate is not finite")]
    NonFinite,
}

fn check(value: f64) -> Result<f64, ResolveIssue> {
    if !value.is_finite() {
        Err(ResolveIssue::NonFinite)
    } else if value.abs() > SANITY_BOUND {
        Err(ResolveIssue::OutOfBounds { value })
    } else {
        Ok(value)
    }
}

/// Resolve a point without any bounds checks.
pub fn resolve_point(spec: &PointSpec, transform: &ImageTransform) -> Point {
    match *spec {
        PointSpec::Absolute { x, y } => Point::new(
            transform.offset_x + x * transform.scale_x,
            transform.offset_y + y * transform.scale_y,
        ),
        PointSpec::Relative {
            rel_x,
            rel_y,
            native_width,
            native_height,
        } => {
            let sx = transform.display_width / native_width;
            let sy = transform.display_height / native_height;
            Point::new(
                transform.offset_x + (rel_x / 100.0) * native_width * sx,
                transform.offset_y + (rel_y / 100.0) * native_height * sy,
            )
        }
    }
}

/// Resolve a rect as authored, before clipping. The origin goes through
/// [`resolve_point`]; only the size is scaled here.
pub fn resolve_rect_unclipped(spec: &CoordinateSpec, transform: &ImageTransform) -> Rect {
    let (origin, size) = match *spec {
        CoordinateSpec::Absolute {
            x,
            y,
            width,
            height,
        } => (
            PointSpec::Absolute { x, y },
            (width * transform.scale_x, height * transform.scale_y),
        ),
        CoordinateSpec::Relative {
            rel_x,
            rel_y,
            rel_width,
            rel_height,
            native_width,
            native_height,
        } => {
            let sx = transform.display_width / native_width;
            let sy = transform.display_height / native_height;
            (
                PointSpec::Relative {
                    rel_x,
                    rel_y,
                    native_width,
                    native_height,
                },
                (
                    (rel_width / 100.0) * native_width * sx,
                    (rel_height / 100.0) * native_height * sy,
                ),
            )
        }
    };
    Rect::from_origin_size(resolve_point(&origin, transform), size)
}

/// Resolve a block rect and clip it to the image's display bounds.
pub fn resolve_rect(spec: &CoordinateSpec, transform: &ImageTransform) -> Result<Rect, ResolveIssue> {
    let raw = resolve_rect_unclipped(spec, transform);
    for v in [raw.x0, raw.y0, raw.x1, raw.y1] {
        check(v)?;
    }
    let clipped = raw.intersect(transform.display_rect());
    if clipped.area() <= 0.0 {
        return Err(ResolveIssue::OutsideImage);
    }
    Ok(clipped)
}

/// Resolve both ends of a segment, rejecting corrupt magnitudes.
pub fn resolve_segment(
    start: &PointSpec,
    end: &PointSpec,
    transform: &ImageTransform,
) -> Result<Line, ResolveIssue> {
    let p0 = resolve_point(start, transform);
    let p1 = resolve_point(end, transform);
    for v in [p0.x, p0.y, p1.x, p1.y] {
        check(v)?;
    }
    Ok(Line::new(p0, p1))
}

/// Everything a render surface needs to draw one arrow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowGeometry {
    pub start: Point,
    pub end: Point,
    pub stroke_width: f64,
    /// Tip, left and right corners of the pointer, if the segment has a length
    pub head: Option<[Point; 3]>,
    /// Dash length and gap, for dashed arrows
    pub dash: Option<(f64, f64)>,
    pub color: Rgba,
    pub opacity: f64,
}

impl ArrowGeometry {
    /// Build from a resolved segment, scaling line weight with the image.
    pub fn new(segment: Line, style: &StrokeStyle, stroke_scale: f64) -> Self {
        let weight = stroke_scale * style.thickness / shared::ArrowStyle::DEFAULT_THICKNESS;
        let direction: Vec2 = segment.p1 - segment.p0;
        let length = direction.hypot();

        let head = (length > f64::EPSILON).then(|| {
            let unit = direction / length;
            let head_length = (HEAD_LENGTH * weight).min(length);
            let normal = Vec2::new(-unit.y, unit.x) * (HEAD_HALF_WIDTH * weight);
            let base = segment.p1 - unit * head_length;
            [segment.p1, base + normal, base - normal]
        });

        Self {
            start: segment.p0,
            end: segment.p1,
            stroke_width: style.thickness * stroke_scale,
            head,
            dash: style
                .dashed
                .then(|| (DASH_LENGTH * weight, DASH_GAP * weight)),
            color: style.color,
            opacity: style.opacity,
        }
    }
}
