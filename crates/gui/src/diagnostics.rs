//! Structured diagnostics channel.
//!
//! The engine never logs ad hoc: every skipped entity, deferred pass, failed
//! image load or rejected drop becomes a [`Diagnostic`]. Each one is emitted as
//! a `tracing` event and delivered to every subscriber, so a host can show
//! notices without installing any particular logging setup.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::Serialize;

use crate::error::EngineError;

/// How many diagnostics are retained for inspection
const RECENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed or missing authored data; the entity is skipped
    Data,
    /// Unusable container or image dimensions; recompute deferred
    Geometry,
    /// Image load failure or timeout; backdrop is transparent
    Resource,
    /// Drop referencing an unknown word or block; ignored
    State,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub message: String,
}

impl From<&EngineError> for Diagnostic {
    fn from(err: &EngineError) -> Self {
        Self {
            kind: err.kind(),
            entity_id: err.entity_id().map(str::to_string),
            message: err.to_string(),
        }
    }
}

#[derive(Default)]
pub struct Diagnostics {
    subscribers: Vec<Sender<Diagnostic>>,
    recent: VecDeque<Diagnostic>,
    total: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<Diagnostic> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        let entity = diagnostic.entity_id.as_deref().unwrap_or("-");
        match diagnostic.kind {
            DiagnosticKind::Data | DiagnosticKind::State => {
                tracing::warn!(kind = ?diagnostic.kind, entity, "{}", diagnostic.message)
            }
            DiagnosticKind::Geometry => {
                tracing::debug!(kind = ?diagnostic.kind, entity, "{}", diagnostic.message)
            }
            DiagnosticKind::Resource => {
                tracing::error!(kind = ?diagnostic.kind, entity, "{}", diagnostic.message)
            }
        }

        self.subscribers
            .retain(|tx| tx.send(diagnostic.clone()).is_ok());

        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(diagnostic);
        self.total += 1;
    }

    pub fn report(&mut self, err: &EngineError) {
        self.emit(Diagnostic::from(err));
    }

    /// Most recent diagnostics, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &Diagnostic> {
        self.recent.iter()
    }

    /// Number of diagnostics emitted since creation
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.recent.iter().filter(|d| d.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;

    #[test]
    fn test_subscriber_receives() {
        let mut diagnostics = Diagnostics::new();
        let rx = diagnostics.subscribe();
        diagnostics.report(&EngineError::data(EntityKind::Block, "b1", "missing"));

        let got = rx.try_recv().unwrap();
        assert_eq!(got.kind, DiagnosticKind::Data);
        assert_eq!(got.entity_id.as_deref(), Some("b1"));
        assert_eq!(diagnostics.total(), 1);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut diagnostics = Diagnostics::new();
        let rx = diagnostics.subscribe();
        drop(rx);
        diagnostics.report(&EngineError::NoReferenceSize);
        assert!(diagnostics.subscribers.is_empty());
        assert_eq!(diagnostics.count_of(DiagnosticKind::Geometry), 1);
    }

    #[test]
    fn test_recent_is_bounded() {
        let mut diagnostics = Diagnostics::new();
        for i in 0..(RECENT_CAPACITY + 10) {
            diagnostics.report(&EngineError::UnknownWord(i.to_string()));
        }
        assert_eq!(diagnostics.recent().count(), RECENT_CAPACITY);
        assert_eq!(diagnostics.total(), (RECENT_CAPACITY + 10) as u64);
        assert_eq!(
            diagnostics.recent().next().unwrap().entity_id.as_deref(),
            Some("10")
        );
    }
}
