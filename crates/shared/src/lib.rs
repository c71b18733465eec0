use serde::{Deserialize, Deserializer, Serialize};

mod coordinates;

pub use coordinates::{CoordinateError, CoordinateSpec, PointSpec, RawCoordinates, RawPoint};

/// Идентификатор блока, стрелки или слова.
/// На входе допускаются как строки, так и целые числа (`3` и `"3"` обозначают один и тот же объект).
pub type EntityId = String;

/// Идентификатор блока (зоны сброса)
pub type BlockId = EntityId;

/// Идентификатор слова
pub type WordId = EntityId;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Str(String),
}

impl From<IdRepr> for EntityId {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Int(n) => n.to_string(),
            IdRepr::Str(s) => s,
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<EntityId, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(deserializer).map(EntityId::from)
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(EntityId::from))
}

/// Упражнение в том виде, в каком его отдаёт внешний API загрузки
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub test_id: EntityId,
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub image_url: String,
    /// Размер исходного изображения, записанный при создании упражнения (если есть)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<f64>,
    #[serde(default)]
    pub blocks: Vec<BlockPayload>,
    #[serde(default)]
    pub arrows: Vec<ArrowPayload>,
    #[serde(default)]
    pub words: Vec<WordPayload>,
}

/// Блок: прямоугольная зона сброса поверх изображения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: BlockId,
    #[serde(default)]
    pub coordinates: Option<RawCoordinates>,
}

/// Стрелка-указатель, опционально привязанная к блоку
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowPayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub block_id: Option<BlockId>,
    #[serde(default)]
    pub start: Option<RawPoint>,
    #[serde(default)]
    pub end: Option<RawPoint>,
    #[serde(default)]
    pub style: ArrowStyle,
}

/// Оформление стрелки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowStyle {
    /// Цвет в формате `#rrggbb` или `#rrggbbaa`
    pub color: String,
    /// Толщина линии в пикселях исходного изображения
    pub thickness: f64,
    pub dashed: bool,
    /// Непрозрачность (0.0 - 1.0)
    pub opacity: f64,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            color: ArrowStyle::DEFAULT_COLOR.to_string(),
            thickness: ArrowStyle::DEFAULT_THICKNESS,
            dashed: false,
            opacity: 1.0,
        }
    }
}

impl ArrowStyle {
    pub const DEFAULT_COLOR: &'static str = "#e53935";
    pub const DEFAULT_THICKNESS: f64 = 2.0;
}

/// Слово, которое ученик перетаскивает на блок
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: WordId,
    #[serde(default)]
    pub text: String,
}

/// Ответ по одному слову для внешнего API отправки
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub question_id: WordId,
    pub actual_block_id: Option<BlockId>,
    pub expected_block_id: BlockId,
    pub is_correct: bool,
}

/// Итог: сколько слов размещено верно
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub correct: usize,
    pub total: usize,
}

/// Полная отправка результата
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub test_id: EntityId,
    pub answers: Vec<SubmissionRecord>,
    pub summary: SubmissionSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_ids() {
        let json = r#"{
            "testId": 42,
            "testName": "Anatomy",
            "imageUrl": "heart.png",
            "blocks": [{"id": 3, "coordinates": {"x": 1, "y": 2, "width": 3, "height": 4}}],
            "arrows": [{"id": "a1", "blockId": 3, "start": {"x": 0, "y": 0}, "end": {"x": 5, "y": 5}}],
            "words": [{"id": "3", "text": "atrium"}]
        }"#;
        let payload: ExercisePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.test_id, "42");
        assert_eq!(payload.blocks[0].id, "3");
        assert_eq!(payload.arrows[0].block_id.as_deref(), Some("3"));
        assert_eq!(payload.words[0].id, payload.blocks[0].id);
    }

    #[test]
    fn test_style_defaults() {
        let json = r#"{"id": 1, "start": {"x": 0, "y": 0}, "end": {"x": 1, "y": 1}, "style": {"dashed": true}}"#;
        let arrow: ArrowPayload = serde_json::from_str(json).unwrap();
        assert!(arrow.style.dashed);
        assert_eq!(arrow.style.color, ArrowStyle::DEFAULT_COLOR);
        assert_eq!(arrow.style.thickness, ArrowStyle::DEFAULT_THICKNESS);
        assert_eq!(arrow.style.opacity, 1.0);
        assert!(arrow.block_id.is_none());
    }

    #[test]
    fn test_missing_coordinates_is_not_a_parse_error() {
        let json = r#"{"id": 7}"#;
        let block: BlockPayload = serde_json::from_str(json).unwrap();
        assert!(block.coordinates.is_none());
    }

    #[test]
    fn test_submission_wire_names() {
        let submission = Submission {
            test_id: "t1".into(),
            answers: vec![SubmissionRecord {
                question_id: "2".into(),
                actual_block_id: None,
                expected_block_id: "2".into(),
                is_correct: false,
            }],
            summary: SubmissionSummary { correct: 0, total: 1 },
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["testId"], "t1");
        assert_eq!(value["answers"][0]["questionId"], "2");
        assert!(value["answers"][0]["actualBlockId"].is_null());
        assert_eq!(value["answers"][0]["expectedBlockId"], "2");
        assert_eq!(value["summary"]["total"], 1);
    }
}
