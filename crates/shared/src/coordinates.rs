//! Координаты блоков и стрелок: сырая форма с провода и проверенная форма.
//!
//! Координаты приходят либо в абсолютных пикселях исходного изображения,
//! либо в процентах от записанного размера изображения. Сырая запись
//! допускает любые комбинации полей; преобразование в [`CoordinateSpec`] /
//! [`PointSpec`] отбрасывает всё, что не является ровно одной полной формой.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Число с провода: нечисловые значения превращаются в NaN и отсеиваются при проверке
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Null => None,
        serde_json::Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Some(s.trim().parse::<f64>().unwrap_or(f64::NAN)),
        _ => Some(f64::NAN),
    }))
}

/// Координаты прямоугольника в том виде, как они пришли
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCoordinates {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub rel_x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub rel_y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub rel_width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub rel_height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub native_image_width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub native_image_height: Option<f64>,
}

/// Точка (начало или конец стрелки) в том виде, как она пришла
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPoint {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub rel_x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub rel_y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub native_image_width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub native_image_height: Option<f64>,
}

/// Проверенные координаты прямоугольника
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoordinateSpec {
    /// Пиксели исходного изображения
    Absolute {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Проценты от записанного размера изображения
    Relative {
        rel_x: f64,
        rel_y: f64,
        rel_width: f64,
        rel_height: f64,
        native_width: f64,
        native_height: f64,
    },
}

/// Проверенная точка
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointSpec {
    Absolute {
        x: f64,
        y: f64,
    },
    Relative {
        rel_x: f64,
        rel_y: f64,
        native_width: f64,
        native_height: f64,
    },
}

/// Причина, по которой координаты отвергнуты
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinates are missing")]
    Missing,
    #[error("both absolute and relative coordinates are populated")]
    Ambiguous,
    #[error("{form} coordinates are missing `{field}`")]
    Incomplete {
        form: &'static str,
        field: &'static str,
    },
    #[error("`{field}` is not a finite number")]
    NonFinite { field: &'static str },
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

fn require(
    value: Option<f64>,
    form: &'static str,
    field: &'static str,
) -> Result<f64, CoordinateError> {
    let v = value.ok_or(CoordinateError::Incomplete { form, field })?;
    if !v.is_finite() {
        return Err(CoordinateError::NonFinite { field });
    }
    Ok(v)
}

fn require_positive(
    value: Option<f64>,
    form: &'static str,
    field: &'static str,
) -> Result<f64, CoordinateError> {
    let v = require(value, form, field)?;
    if v <= 0.0 {
        return Err(CoordinateError::NonPositive { field, value: v });
    }
    Ok(v)
}

impl RawCoordinates {
    fn has_absolute(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }

    fn has_relative(&self) -> bool {
        self.rel_x.is_some()
            || self.rel_y.is_some()
            || self.rel_width.is_some()
            || self.rel_height.is_some()
            || self.native_image_width.is_some()
            || self.native_image_height.is_some()
    }
}

impl TryFrom<&RawCoordinates> for CoordinateSpec {
    type Error = CoordinateError;

    fn try_from(raw: &RawCoordinates) -> Result<Self, Self::Error> {
        match (raw.has_absolute(), raw.has_relative()) {
            (true, true) => Err(CoordinateError::Ambiguous),
            (false, false) => Err(CoordinateError::Missing),
            (true, false) => Ok(CoordinateSpec::Absolute {
                x: require(raw.x, "absolute", "x")?,
                y: require(raw.y, "absolute", "y")?,
                width: require_positive(raw.width, "absolute", "width")?,
                height: require_positive(raw.height, "absolute", "height")?,
            }),
            (false, true) => Ok(CoordinateSpec::Relative {
                rel_x: require(raw.rel_x, "relative", "relX")?,
                rel_y: require(raw.rel_y, "relative", "relY")?,
                rel_width: require_positive(raw.rel_width, "relative", "relWidth")?,
                rel_height: require_positive(raw.rel_height, "relative", "relHeight")?,
                native_width: require_positive(
                    raw.native_image_width,
                    "relative",
                    "nativeImageWidth",
                )?,
                native_height: require_positive(
                    raw.native_image_height,
                    "relative",
                    "nativeImageHeight",
                )?,
            }),
        }
    }
}

impl TryFrom<&RawPoint> for PointSpec {
    type Error = CoordinateError;

    fn try_from(raw: &RawPoint) -> Result<Self, Self::Error> {
        let absolute = raw.x.is_some() || raw.y.is_some();
        let relative = raw.rel_x.is_some()
            || raw.rel_y.is_some()
            || raw.native_image_width.is_some()
            || raw.native_image_height.is_some();
        match (absolute, relative) {
            (true, true) => Err(CoordinateError::Ambiguous),
            (false, false) => Err(CoordinateError::Missing),
            (true, false) => Ok(PointSpec::Absolute {
                x: require(raw.x, "absolute", "x")?,
                y: require(raw.y, "absolute", "y")?,
            }),
            (false, true) => Ok(PointSpec::Relative {
                rel_x: require(raw.rel_x, "relative", "relX")?,
                rel_y: require(raw.rel_y, "relative", "relY")?,
                native_width: require_positive(
                    raw.native_image_width,
                    "relative",
                    "nativeImageWidth",
                )?,
                native_height: require_positive(
                    raw.native_image_height,
                    "relative",
                    "nativeImageHeight",
                )?,
            }),
        }
    }
}

impl CoordinateSpec {
    /// Записанный размер исходного изображения (только для относительной формы)
    pub fn recorded_native_size(&self) -> Option<(f64, f64)> {
        match *self {
            CoordinateSpec::Relative {
                native_width,
                native_height,
                ..
            } => Some((native_width, native_height)),
            CoordinateSpec::Absolute { .. } => None,
        }
    }
}

impl PointSpec {
    pub fn recorded_native_size(&self) -> Option<(f64, f64)> {
        match *self {
            PointSpec::Relative {
                native_width,
                native_height,
                ..
            } => Some((native_width, native_height)),
            PointSpec::Absolute { .. } => None,
        }
    }
}
