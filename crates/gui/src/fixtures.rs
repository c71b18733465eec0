//! Factory functions for creating test data.
//!
//! Provides convenient helpers to construct blocks, arrows, words and whole
//! `ExercisePayload`s used in tests and by the command protocol.

use shared::*;

// ── Block factories ─────────────────────────────────────────────

/// Block in absolute native-image pixels.
pub fn absolute_block(id: &str, x: f64, y: f64, width: f64, height: f64) -> BlockPayload {
    BlockPayload {
        id: id.to_string(),
        coordinates: Some(RawCoordinates {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }),
    }
}

/// Block in percent of a recorded native image size.
pub fn relative_block(
    id: &str,
    rel_x: f64,
    rel_y: f64,
    rel_width: f64,
    rel_height: f64,
    native: (f64, f64),
) -> BlockPayload {
    BlockPayload {
        id: id.to_string(),
        coordinates: Some(RawCoordinates {
            rel_x: Some(rel_x),
            rel_y: Some(rel_y),
            rel_width: Some(rel_width),
            rel_height: Some(rel_height),
            native_image_width: Some(native.0),
            native_image_height: Some(native.1),
            ..Default::default()
        }),
    }
}

// ── Arrow factories ─────────────────────────────────────────────

pub fn absolute_point(x: f64, y: f64) -> RawPoint {
    RawPoint {
        x: Some(x),
        y: Some(y),
        ..Default::default()
    }
}

pub fn relative_point(rel_x: f64, rel_y: f64, native: (f64, f64)) -> RawPoint {
    RawPoint {
        rel_x: Some(rel_x),
        rel_y: Some(rel_y),
        native_image_width: Some(native.0),
        native_image_height: Some(native.1),
        ..Default::default()
    }
}

/// Arrow with the default style.
pub fn arrow(id: &str, block_id: Option<&str>, start: RawPoint, end: RawPoint) -> ArrowPayload {
    ArrowPayload {
        id: id.to_string(),
        block_id: block_id.map(str::to_string),
        start: Some(start),
        end: Some(end),
        style: ArrowStyle::default(),
    }
}

// ── Words and payloads ──────────────────────────────────────────

pub fn word(id: &str, text: &str) -> WordPayload {
    WordPayload {
        id: id.to_string(),
        text: text.to_string(),
    }
}

/// Payload without a recorded image size.
pub fn exercise_payload(
    blocks: Vec<BlockPayload>,
    arrows: Vec<ArrowPayload>,
    words: Vec<WordPayload>,
) -> ExercisePayload {
    ExercisePayload {
        test_id: "test".to_string(),
        test_name: "Test exercise".to_string(),
        image_url: "diagram.png".to_string(),
        image_width: None,
        image_height: None,
        blocks,
        arrows,
        words,
    }
}

/// Native size of the reference image used by [`six_word_payload`].
pub const NATIVE: (f64, f64) = (1600.0, 1200.0);

/// Six blocks (three absolute, three relative) with matching words and two
/// arrows, authored against a 1600x1200 image.
pub fn six_word_payload() -> ExercisePayload {
    let blocks = vec![
        absolute_block("1", 100.0, 100.0, 240.0, 90.0),
        absolute_block("2", 600.0, 120.0, 240.0, 90.0),
        relative_block("3", 10.0, 10.0, 20.0, 15.0, NATIVE),
        relative_block("4", 60.0, 40.0, 15.0, 7.5, NATIVE),
        absolute_block("5", 200.0, 900.0, 300.0, 100.0),
        relative_block("6", 70.0, 80.0, 20.0, 10.0, NATIVE),
    ];
    let mut dashed = arrow(
        "a2",
        Some("2"),
        relative_point(45.0, 20.0, NATIVE),
        relative_point(60.0, 45.0, NATIVE),
    );
    dashed.style.dashed = true;
    dashed.style.color = "#1e88e5".to_string();
    let arrows = vec![
        arrow(
            "a1",
            Some("1"),
            absolute_point(340.0, 145.0),
            absolute_point(700.0, 500.0),
        ),
        dashed,
    ];
    let words = (1..=6)
        .map(|i| word(&i.to_string(), &format!("word {i}")))
        .collect();

    let mut payload = exercise_payload(blocks, arrows, words);
    payload.test_id = "six".to_string();
    payload.image_width = Some(NATIVE.0);
    payload.image_height = Some(NATIVE.1);
    payload
}
