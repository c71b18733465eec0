//! Exercise model: the validated, read-only form of a load payload.
//!
//! Built once per load. Entities whose authored data cannot be used are left
//! out and reported as data diagnostics; everything else is kept.

use std::collections::HashMap;

use shared::{
    ArrowPayload, ArrowStyle, BlockId, BlockPayload, CoordinateSpec, EntityId, ExercisePayload,
    PointSpec, WordId,
};

use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, EntityKind, Result};

/// Straight-alpha RGBA color
pub type Rgba = [u8; 4];

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub coordinates: CoordinateSpec,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    /// Thickness in native image pixels
    pub thickness: f64,
    pub dashed: bool,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub id: EntityId,
    pub block_id: Option<BlockId>,
    pub start: PointSpec,
    pub end: PointSpec,
    pub style: StrokeStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: WordId,
    pub text: String,
}

/// Parse `#rrggbb` or `#rrggbbaa`
pub fn parse_hex_color(s: &str) -> Option<Rgba> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        6 => Some([channel(0)?, channel(2)?, channel(4)?, 255]),
        8 => Some([channel(0)?, channel(2)?, channel(4)?, channel(6)?]),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseModel {
    pub test_id: EntityId,
    pub test_name: String,
    pub image_url: String,
    recorded_image_size: Option<(f64, f64)>,
    blocks: Vec<Block>,
    arrows: Vec<Arrow>,
    words: Vec<Word>,
    block_index: HashMap<BlockId, usize>,
    word_index: HashMap<WordId, usize>,
}

impl ExerciseModel {
    /// Build the model, reporting every skipped entity to `diagnostics`.
    pub fn from_payload(payload: &ExercisePayload, diagnostics: &mut Diagnostics) -> Self {
        let mut model = Self {
            test_id: payload.test_id.clone(),
            test_name: payload.test_name.clone(),
            image_url: payload.image_url.clone(),
            recorded_image_size: match (payload.image_width, payload.image_height) {
                (Some(w), Some(h)) if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 => {
                    Some((w, h))
                }
                _ => None,
            },
            ..Self::default()
        };

        for block in &payload.blocks {
            match model.validate_block(block) {
                Ok(b) => {
                    model.block_index.insert(b.id.clone(), model.blocks.len());
                    model.blocks.push(b);
                }
                Err(e) => diagnostics.report(&e),
            }
        }

        for arrow in &payload.arrows {
            if model.arrows.iter().any(|a| a.id == arrow.id) {
                diagnostics.report(&EngineError::data(
                    EntityKind::Arrow,
                    &arrow.id,
                    "duplicate arrow id",
                ));
                continue;
            }
            match Self::validate_arrow(arrow, diagnostics) {
                Ok(a) => {
                    if let Some(owner) = a.block_id.as_ref().filter(|id| !model.has_block(id)) {
                        diagnostics.report(&EngineError::data(
                            EntityKind::Arrow,
                            &a.id,
                            format!("owner block `{owner}` does not exist"),
                        ));
                    }
                    model.arrows.push(a);
                }
                Err(e) => diagnostics.report(&e),
            }
        }

        for word in &payload.words {
            if model.word_index.contains_key(&word.id) {
                diagnostics.report(&EngineError::data(
                    EntityKind::Word,
                    &word.id,
                    "duplicate word id",
                ));
                continue;
            }
            model.word_index.insert(word.id.clone(), model.words.len());
            model.words.push(Word {
                id: word.id.clone(),
                text: word.text.clone(),
            });
        }

        tracing::info!(
            test_id = %model.test_id,
            blocks = model.blocks.len(),
            arrows = model.arrows.len(),
            words = model.words.len(),
            "exercise model built"
        );
        model
    }

    pub fn from_json(json: &str, diagnostics: &mut Diagnostics) -> Result<Self> {
        let payload: ExercisePayload = serde_json::from_str(json).map_err(|e| {
            let err = EngineError::Payload(e.to_string());
            diagnostics.report(&err);
            err
        })?;
        Ok(Self::from_payload(&payload, diagnostics))
    }

    fn validate_block(&self, block: &BlockPayload) -> Result<Block> {
        if self.block_index.contains_key(&block.id) {
            return Err(EngineError::data(EntityKind::Block, &block.id, "duplicate block id"));
        }
        let raw = block.coordinates.as_ref().ok_or_else(|| {
            EngineError::data(EntityKind::Block, &block.id, "coordinates are missing")
        })?;
        let coordinates = CoordinateSpec::try_from(raw)
            .map_err(|e| EngineError::data(EntityKind::Block, &block.id, e))?;
        Ok(Block {
            id: block.id.clone(),
            coordinates,
        })
    }

    fn validate_arrow(arrow: &ArrowPayload, diagnostics: &mut Diagnostics) -> Result<Arrow> {
        let point = |raw: Option<&shared::RawPoint>, which: &str| -> Result<PointSpec> {
            let raw = raw.ok_or_else(|| {
                EngineError::data(EntityKind::Arrow, &arrow.id, format!("{which} point is missing"))
            })?;
            PointSpec::try_from(raw).map_err(|e| {
                EngineError::data(EntityKind::Arrow, &arrow.id, format!("{which} point: {e}"))
            })
        };
        let start = point(arrow.start.as_ref(), "start")?;
        let end = point(arrow.end.as_ref(), "end")?;

        Ok(Arrow {
            id: arrow.id.clone(),
            block_id: arrow.block_id.clone(),
            start,
            end,
            style: Self::validate_style(&arrow.id, &arrow.style, diagnostics),
        })
    }

    /// Style problems never drop the arrow; bad values fall back to defaults.
    fn validate_style(id: &str, style: &ArrowStyle, diagnostics: &mut Diagnostics) -> StrokeStyle {
        let default_color = parse_hex_color(ArrowStyle::DEFAULT_COLOR).unwrap_or([229, 57, 53, 255]);
        let color = parse_hex_color(&style.color).unwrap_or_else(|| {
            diagnostics.report(&EngineError::data(
                EntityKind::Arrow,
                id,
                format!("unparsable color `{}`, using default", style.color),
            ));
            default_color
        });
        let thickness = if style.thickness.is_finite() && style.thickness > 0.0 {
            style.thickness
        } else {
            diagnostics.report(&EngineError::data(
                EntityKind::Arrow,
                id,
                format!("thickness {} is not positive, using default", style.thickness),
            ));
            ArrowStyle::DEFAULT_THICKNESS
        };
        let opacity = if style.opacity.is_finite() {
            style.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        StrokeStyle {
            color,
            thickness,
            dashed: style.dashed,
            opacity,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.block_index.get(id).map(|&i| &self.blocks[i])
    }

    pub fn word(&self, id: &str) -> Option<&Word> {
        self.word_index.get(id).map(|&i| &self.words[i])
    }

    pub fn has_block(&self, id: &str) -> bool {
        self.block_index.contains_key(id)
    }

    pub fn has_word(&self, id: &str) -> bool {
        self.word_index.contains_key(id)
    }

    /// Native size to fit against when the image itself is unavailable:
    /// the recorded payload size, else the first recorded relative size.
    pub fn reference_size(&self) -> Option<(f64, f64)> {
        self.recorded_image_size
            .or_else(|| {
                self.blocks
                    .iter()
                    .find_map(|b| b.coordinates.recorded_native_size())
            })
            .or_else(|| {
                self.arrows.iter().find_map(|a| {
                    a.start
                        .recorded_native_size()
                        .or_else(|| a.end.recorded_native_size())
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::fixtures::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0080"), Some([255, 0, 128, 255]));
        assert_eq!(parse_hex_color("#ff008040"), Some([255, 0, 128, 64]));
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#ff00"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_valid_payload() {
        let mut diagnostics = Diagnostics::new();
        let model = ExerciseModel::from_payload(&six_word_payload(), &mut diagnostics);
        assert_eq!(model.blocks().len(), 6);
        assert_eq!(model.words().len(), 6);
        assert_eq!(model.arrows().len(), 2);
        assert_eq!(diagnostics.total(), 0);
        assert!(model.has_block("3"));
        assert_eq!(model.word("4").map(|w| w.text.as_str()), Some("word 4"));
    }

    #[test]
    fn test_bad_block_is_skipped_others_kept() {
        let mut payload = six_word_payload();
        payload.blocks[2].coordinates = None;
        payload.blocks.push(absolute_block("1", 0.0, 0.0, 10.0, 10.0));

        let mut diagnostics = Diagnostics::new();
        let model = ExerciseModel::from_payload(&payload, &mut diagnostics);
        assert_eq!(model.blocks().len(), 5);
        assert!(!model.has_block("3"));
        assert_eq!(diagnostics.count_of(DiagnosticKind::Data), 2);
    }

    #[test]
    fn test_bad_style_keeps_arrow() {
        let mut payload = six_word_payload();
        payload.arrows[0].style.color = "nope".into();
        payload.arrows[0].style.thickness = -1.0;
        payload.arrows[0].style.opacity = 4.0;

        let mut diagnostics = Diagnostics::new();
        let model = ExerciseModel::from_payload(&payload, &mut diagnostics);
        let arrow = &model.arrows()[0];
        assert_eq!(arrow.style.color, [229, 57, 53, 255]);
        assert_eq!(arrow.style.thickness, ArrowStyle::DEFAULT_THICKNESS);
        assert_eq!(arrow.style.opacity, 1.0);
        assert_eq!(diagnostics.count_of(DiagnosticKind::Data), 2);
    }

    #[test]
    fn test_arrow_with_unknown_owner_is_kept() {
        let mut payload = six_word_payload();
        payload.arrows[0].block_id = Some("99".into());

        let mut diagnostics = Diagnostics::new();
        let model = ExerciseModel::from_payload(&payload, &mut diagnostics);
        assert_eq!(model.arrows().len(), 2);
        assert_eq!(diagnostics.count_of(DiagnosticKind::Data), 1);
    }

    #[test]
    fn test_duplicate_arrow_id_first_wins() {
        let mut payload = six_word_payload();
        let mut copy = payload.arrows[0].clone();
        copy.start = payload.arrows[1].start.clone();
        payload.arrows.push(copy);

        let mut diagnostics = Diagnostics::new();
        let original = ExerciseModel::from_payload(&six_word_payload(), &mut diagnostics);
        let model = ExerciseModel::from_payload(&payload, &mut diagnostics);
        assert_eq!(model.arrows(), original.arrows());
        assert_eq!(diagnostics.count_of(DiagnosticKind::Data), 1);
    }

    #[test]
    fn test_reference_size_fallbacks() {
        let mut diagnostics = Diagnostics::new();
        let model = ExerciseModel::from_payload(&six_word_payload(), &mut diagnostics);
        assert_eq!(model.reference_size(), Some((1600.0, 1200.0)));

        let payload = exercise_payload(
            vec![absolute_block("1", 0.0, 0.0, 10.0, 10.0)],
            vec![],
            vec![word("1", "one")],
        );
        let model = ExerciseModel::from_payload(&payload, &mut diagnostics);
        assert_eq!(model.reference_size(), None);
    }

    #[test]
    fn test_from_json_reports_payload_error() {
        let mut diagnostics = Diagnostics::new();
        let result = ExerciseModel::from_json("{not json", &mut diagnostics);
        assert!(matches!(result, Err(EngineError::Payload(_))));
        assert_eq!(diagnostics.count_of(DiagnosticKind::Data), 1);
    }
}
