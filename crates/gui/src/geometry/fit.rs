//! Image fitting: native image size + container size → display transform.

use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Fraction of the container the image may occupy along its limiting axis
pub const CONTAIN_MARGIN: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Contain within 95% of the container, never above native size
    #[default]
    FitContainMargin,
    /// Keep native size when it already fits, else contain with margin
    NoUpscaleCentered,
}

impl FitMode {
    pub fn all() -> &'static [FitMode] {
        &[FitMode::FitContainMargin, FitMode::NoUpscaleCentered]
    }
}

/// Scale + offset from native image pixels to container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageTransform {
    pub offset_x: f64,
    pub offset_y: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ImageTransform {
    /// Where the image is drawn, in container coordinates
    pub fn display_rect(&self) -> Rect {
        Rect::new(
            self.offset_x,
            self.offset_y,
            self.offset_x + self.display_width,
            self.offset_y + self.display_height,
        )
    }

    /// Uniform factor for stroke widths and arrow heads
    pub fn stroke_scale(&self) -> f64 {
        self.scale_x.min(self.scale_y)
    }
}

fn usable(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Contain `image` inside `container` leaving a margin, without upscaling.
fn contain_with_margin(container: Size, image: Size) -> (f64, f64) {
    let ar_img = image.width / image.height;
    let ar_container = container.width / container.height;

    let (mut width, mut height) = if ar_img > ar_container {
        let w = (container.width * CONTAIN_MARGIN).min(image.width);
        (w, w / ar_img)
    } else {
        let h = (container.height * CONTAIN_MARGIN).min(image.height);
        (h * ar_img, h)
    };

    // Absorb rounding drift: shrink proportionally if still out of bounds.
    if width > container.width {
        let k = container.width / width;
        width = container.width;
        height *= k;
    }
    if height > container.height {
        let k = container.height / height;
        height = container.height;
        width *= k;
    }
    (width, height)
}

/// Compute the display transform for `image` inside `container`.
///
/// Fails with [`EngineError::ContainerSize`] while the container cannot be
/// measured and with [`EngineError::ImageSize`] for unusable native sizes.
pub fn fit_image(container: Size, image: Size, mode: FitMode) -> Result<ImageTransform> {
    if !usable(container.width) || !usable(container.height) {
        return Err(EngineError::ContainerSize {
            width: container.width,
            height: container.height,
        });
    }
    if !usable(image.width) || !usable(image.height) {
        return Err(EngineError::ImageSize {
            width: image.width,
            height: image.height,
        });
    }

    let (display_width, display_height) = match mode {
        FitMode::NoUpscaleCentered
            if image.width <= container.width && image.height <= container.height =>
        {
            (image.width, image.height)
        }
        _ => contain_with_margin(container, image),
    };

    Ok(ImageTransform {
        offset_x: (container.width - display_width) / 2.0,
        offset_y: (container.height - display_height) / 2.0,
        display_width,
        display_height,
        scale_x: display_width / image.width,
        scale_y: display_height / image.height,
    })
}
