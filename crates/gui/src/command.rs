//! JSON command protocol over the headless harness.
//!
//! Lets scripts and integration tests drive a whole session: load, image
//! results, viewport changes, clock, drops and submission.

use serde::{Deserialize, Serialize};
use shared::ExercisePayload;

use crate::harness::TestHarness;

/// A command the harness can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HarnessCommand {
    /// Load an exercise payload (replaces current)
    Load { payload: ExercisePayload },
    /// The image of the current load decoded
    ImageReady { width: f64, height: f64 },
    /// The image of the current load failed
    ImageFailed { reason: String },
    /// Container measured
    Resize { width: f64, height: f64 },
    /// Explicit recenter request
    Recenter,
    /// Advance the clock.
    Advance { ms: u64 },
    /// Drop a word on a block through the overlay.
    Drop { word_id: String, block_id: String },
    /// Unplace a word.
    Remove { word_id: String },
    /// Unplace every word.
    Reset,
    /// Inspect geometry and placement.
    Inspect,
    /// Produce the submission records.
    Submit,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

fn inspect(harness: &TestHarness) -> serde_json::Value {
    let session = &harness.session;
    let placement = session.placement();
    let blocks: Vec<serde_json::Value> = session
        .model()
        .blocks()
        .iter()
        .map(|block| {
            serde_json::json!({
                "id": block.id,
                "rect": harness.block_rect(&block.id),
                "region": harness.region_rect(&block.id),
                "occupant": placement.occupant(&block.id),
            })
        })
        .collect();
    let words: Vec<serde_json::Value> = session
        .model()
        .words()
        .iter()
        .map(|word| {
            serde_json::json!({
                "id": word.id,
                "text": word.text,
                "state": placement.state(&word.id),
            })
        })
        .collect();
    let diagnostics: Vec<_> = session.diagnostics().recent().collect();

    serde_json::json!({
        "test_id": session.model().test_id,
        "pass": session.engine().passes(),
        "transform": harness.transform(),
        "backdrop": session.render().backdrop(),
        "blocks": blocks,
        "words": words,
        "placed": placement.placed_count(),
        "correct": placement.correct_count(),
        "total": placement.total(),
        "complete": placement.is_complete(),
        "diagnostics": diagnostics,
        "validation_errors": harness.validator().validate_all(),
    })
}

/// Execute a single command on the harness.
pub fn execute_command(harness: &mut TestHarness, cmd: HarnessCommand) -> CommandResponse {
    match cmd {
        HarnessCommand::Load { payload } => {
            harness.load(&payload);
            CommandResponse::ok_with_data(serde_json::json!({
                "blocks": harness.session.model().blocks().len(),
                "words": harness.session.model().words().len(),
            }))
        }

        HarnessCommand::ImageReady { width, height } => {
            harness.image_ready(width, height);
            CommandResponse::ok_with_data(serde_json::json!({ "pass": harness.passes() }))
        }

        HarnessCommand::ImageFailed { reason } => {
            harness.image_failed(&reason);
            CommandResponse::ok()
        }

        HarnessCommand::Resize { width, height } => {
            harness.resize(width, height);
            CommandResponse::ok()
        }

        HarnessCommand::Recenter => {
            harness.recenter();
            CommandResponse::ok()
        }

        HarnessCommand::Advance { ms } => {
            let outcomes = harness.advance(ms);
            CommandResponse::ok_with_data(serde_json::json!({
                "elapsed_ms": harness.elapsed_ms(),
                "pass": harness.passes(),
                "drops": outcomes,
            }))
        }

        HarnessCommand::Drop { word_id, block_id } => match harness.drop_word(&word_id, &block_id) {
            Some(outcome) => CommandResponse::ok_with_data(serde_json::json!({ "outcome": outcome })),
            None => CommandResponse::err(format!("drop of `{word_id}` on `{block_id}` was rejected")),
        },

        HarnessCommand::Remove { word_id } => match harness.remove(&word_id) {
            Ok(outcome) => CommandResponse::ok_with_data(serde_json::json!({ "outcome": outcome })),
            Err(e) => CommandResponse::err(e.to_string()),
        },

        HarnessCommand::Reset => {
            harness.reset();
            CommandResponse::ok()
        }

        HarnessCommand::Inspect => CommandResponse::ok_with_data(inspect(harness)),

        HarnessCommand::Submit => match harness.submit() {
            Some(submission) => match serde_json::to_value(&submission) {
                Ok(data) => CommandResponse::ok_with_data(data),
                Err(e) => CommandResponse::err(e.to_string()),
            },
            None => CommandResponse::err("not every word is placed"),
        },
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json(harness: &mut TestHarness, json: &str) -> Result<CommandResponse, String> {
    let cmd: HarnessCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(harness, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(
    harness: &mut TestHarness,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<HarnessCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(harness, cmd))
        .collect())
}
