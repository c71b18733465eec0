//! Geometry core: image fitting and coordinate resolution.

pub mod fit;
pub mod resolve;

pub use fit::{fit_image, FitMode, ImageTransform, CONTAIN_MARGIN};
pub use resolve::{
    resolve_point, resolve_rect, resolve_rect_unclipped, resolve_segment, ArrowGeometry,
    ResolveIssue, SANITY_BOUND,
};
