//! Render surface backed by the egui painter.
//!
//! Shapes are retained between frames in container coordinates and painted
//! every frame at the viewport origin.

use std::collections::HashMap;

use egui::{Color32, Pos2, Stroke, StrokeKind};
use kurbo::Rect;

use blockmatch_lib::geometry::ArrowGeometry;
use blockmatch_lib::surface::{Backdrop, RenderSurface, ShapeHandle};

use super::{to_screen_pos, to_screen_rect};
use crate::i18n::t;

const BLOCK_FILL: Color32 = Color32::from_rgba_premultiplied(20, 60, 110, 60);
const BLOCK_STROKE: Color32 = Color32::from_rgb(90, 160, 230);

pub struct PainterSurface {
    backdrop: Backdrop,
    display: Option<Rect>,
    blocks: HashMap<ShapeHandle, (String, Rect)>,
    arrows: HashMap<ShapeHandle, (String, ArrowGeometry)>,
    needs_repaint: bool,
}

impl Default for PainterSurface {
    fn default() -> Self {
        Self {
            backdrop: Backdrop::Pending,
            display: None,
            blocks: HashMap::new(),
            arrows: HashMap::new(),
            needs_repaint: false,
        }
    }
}

impl PainterSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the engine asked for a repaint since the last call
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.needs_repaint)
    }

    /// Paint backdrop, blocks and arrows with the container at `origin`.
    pub fn paint(&self, painter: &egui::Painter, origin: Pos2, texture: Option<&egui::TextureHandle>) {
        match (self.backdrop, self.display, texture) {
            (Backdrop::Image { .. }, Some(display), Some(texture)) => {
                painter.image(
                    texture.id(),
                    to_screen_rect(origin, display),
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    Color32::WHITE,
                );
            }
            (Backdrop::Unavailable, display, _) => {
                let at = display
                    .map(|d| to_screen_rect(origin, d).center_top() + egui::vec2(0.0, 12.0))
                    .unwrap_or(origin + egui::vec2(12.0, 12.0));
                painter.text(
                    at,
                    egui::Align2::CENTER_TOP,
                    t("viewport.image_unavailable"),
                    egui::FontId::proportional(13.0),
                    Color32::from_rgb(255, 200, 100),
                );
            }
            (Backdrop::Pending, None, _) => {
                painter.text(
                    painter.clip_rect().center(),
                    egui::Align2::CENTER_CENTER,
                    t("viewport.loading"),
                    egui::FontId::proportional(15.0),
                    Color32::GRAY,
                );
            }
            _ => {}
        }

        let mut blocks: Vec<_> = self.blocks.iter().collect();
        blocks.sort_by_key(|(handle, _)| handle.0);
        for (_, (_, rect)) in blocks {
            let r = to_screen_rect(origin, *rect);
            painter.rect_filled(r, 3.0, BLOCK_FILL);
            painter.rect_stroke(r, 3.0, Stroke::new(1.5, BLOCK_STROKE), StrokeKind::Inside);
        }

        let mut arrows: Vec<_> = self.arrows.iter().collect();
        arrows.sort_by_key(|(handle, _)| handle.0);
        for (_, (_, geometry)) in arrows {
            paint_arrow(painter, origin, geometry);
        }
    }
}

fn arrow_color(geometry: &ArrowGeometry) -> Color32 {
    let [r, g, b, a] = geometry.color;
    let alpha = (f64::from(a) * geometry.opacity).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

fn paint_arrow(painter: &egui::Painter, origin: Pos2, geometry: &ArrowGeometry) {
    let color = arrow_color(geometry);
    let stroke = Stroke::new(geometry.stroke_width as f32, color);
    let start = to_screen_pos(origin, geometry.start);
    // The shaft stops at the base of the head so wide strokes stay hidden under it.
    let end = match geometry.head {
        Some([_, left, right]) => to_screen_pos(origin, left.midpoint(right)),
        None => to_screen_pos(origin, geometry.end),
    };

    match geometry.dash {
        Some((dash, gap)) => draw_dashed_line_2d(painter, start, end, stroke, dash as f32, gap as f32),
        None => {
            painter.line_segment([start, end], stroke);
        }
    }

    if let Some(head) = geometry.head {
        let points = head.iter().map(|p| to_screen_pos(origin, *p)).collect();
        painter.add(egui::Shape::convex_polygon(points, color, Stroke::NONE));
    }
}

/// Draw a dashed line in 2D screen space
fn draw_dashed_line_2d(
    painter: &egui::Painter,
    start: Pos2,
    end: Pos2,
    stroke: Stroke,
    dash_length: f32,
    gap_length: f32,
) {
    let delta = end - start;
    let length = delta.length();
    if length < 0.1 || dash_length <= 0.0 {
        return;
    }
    let dir = delta / length;

    let mut pos = 0.0;
    let mut drawing = true;
    while pos < length {
        if drawing {
            let segment_end = (pos + dash_length).min(length);
            painter.line_segment([start + dir * pos, start + dir * segment_end], stroke);
            pos = segment_end;
        } else {
            pos += gap_length.max(0.5);
        }
        drawing = !drawing;
    }
}

impl RenderSurface for PainterSurface {
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
        self.needs_repaint = true;
    }

    fn request_repaint(&mut self) {
        self.needs_repaint = true;
    }
}
