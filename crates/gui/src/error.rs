//! Error taxonomy of the exercise engine.
//!
//! None of these are fatal: every variant maps to a [`DiagnosticKind`] and the
//! engine keeps the last good state when one is raised.

use std::fmt;

use thiserror::Error;

use crate::diagnostics::DiagnosticKind;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Kind of authored entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Block,
    Arrow,
    Word,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Block => "block",
            EntityKind::Arrow => "arrow",
            EntityKind::Word => "word",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{entity} `{id}` skipped: {reason}")]
    Data {
        entity: EntityKind,
        id: String,
        reason: String,
    },

    #[error("invalid exercise payload: {0}")]
    Payload(String),

    #[error("native image size {width}x{height} is not usable")]
    ImageSize { width: f64, height: f64 },

    #[error("container {width}x{height} is not measurable yet")]
    ContainerSize { width: f64, height: f64 },

    #[error("no reference image size to fit against")]
    NoReferenceSize,

    #[error("image `{url}` unavailable: {reason}")]
    Resource { url: String, reason: String },

    #[error("unknown word `{0}`")]
    UnknownWord(String),

    #[error("unknown block `{0}`")]
    UnknownBlock(String),
}

impl EngineError {
    pub fn data(entity: EntityKind, id: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Data {
            entity,
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Data { .. } | Self::Payload(_) => DiagnosticKind::Data,
            Self::ImageSize { .. } | Self::ContainerSize { .. } | Self::NoReferenceSize => {
                DiagnosticKind::Geometry
            }
            Self::Resource { .. } => DiagnosticKind::Resource,
            Self::UnknownWord(_) | Self::UnknownBlock(_) => DiagnosticKind::State,
        }
    }

    /// Id of the entity the error is about, when there is one
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Self::Data { id, .. } | Self::UnknownWord(id) | Self::UnknownBlock(id) => {
                Some(id.as_str())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            EngineError::data(EntityKind::Block, "b1", "bad").kind(),
            DiagnosticKind::Data
        );
        assert_eq!(
            EngineError::ImageSize { width: 0.0, height: 10.0 }.kind(),
            DiagnosticKind::Geometry
        );
        assert_eq!(
            EngineError::Resource { url: "x.png".into(), reason: "404".into() }.kind(),
            DiagnosticKind::Resource
        );
        assert_eq!(EngineError::UnknownBlock("9".into()).kind(), DiagnosticKind::State);
    }

    #[test]
    fn test_display() {
        let err = EngineError::data(EntityKind::Arrow, "a7", "out of bounds");
        assert_eq!(err.to_string(), "arrow `a7` skipped: out of bounds");
        assert_eq!(err.entity_id(), Some("a7"));
        assert_eq!(EngineError::NoReferenceSize.entity_id(), None);
    }
}
