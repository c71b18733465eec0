//! Headless test harness for scripted exercise sessions.
//!
//! Wraps an [`ExerciseSession`] over recording surfaces and drives it with a
//! manual clock, so debounce and image timeouts are deterministic.

use std::time::{Duration, Instant};

use kurbo::{Rect, Size};
use shared::{ExercisePayload, Submission};

use crate::error::Result;
use crate::geometry::{ArrowGeometry, ImageTransform};
use crate::placement::{PlacementOutcome, WordState};
use crate::session::{ExerciseSession, SessionConfig};
use crate::surface::{RecordingOverlaySurface, RecordingRenderSurface};
use crate::sync::ImageTicket;
use crate::validation::SurfaceValidator;

pub type HeadlessSession = ExerciseSession<RecordingRenderSurface, RecordingOverlaySurface>;

/// Headless test harness: session, recording surfaces and a manual clock
pub struct TestHarness {
    pub session: HeadlessSession,
    epoch: Instant,
    elapsed: Duration,
    ticket: Option<ImageTicket>,
}

impl TestHarness {
    /// Create a harness with default timings.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            session: ExerciseSession::new(
                RecordingRenderSurface::new(),
                RecordingOverlaySurface::new(),
                config,
            ),
            epoch: Instant::now(),
            elapsed: Duration::ZERO,
            ticket: None,
        }
    }

    // ── Clock ─────────────────────────────────────────────────

    /// Current harness time
    pub fn now(&self) -> Instant {
        self.epoch + self.elapsed
    }

    /// Milliseconds since the harness was created
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Move the clock forward and let the session react
    pub fn advance(&mut self, ms: u64) -> Vec<PlacementOutcome> {
        self.elapsed += Duration::from_millis(ms);
        let now = self.now();
        self.session.tick(now)
    }

    /// Advance past the resize debounce so pending viewport work settles
    pub fn settle(&mut self) -> Vec<PlacementOutcome> {
        let delay = self.session.config().resize_debounce.as_millis() as u64;
        self.advance(delay)
    }

    // ── Loading ───────────────────────────────────────────────

    /// Load an exercise (replaces current)
    pub fn load(&mut self, payload: &ExercisePayload) {
        let now = self.now();
        self.ticket = Some(self.session.load(payload, now));
    }

    /// Load an exercise from a JSON string
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let now = self.now();
        self.ticket = Some(self.session.load_json(json, now)?);
        Ok(())
    }

    /// Deliver the image of the current load
    pub fn image_ready(&mut self, width: f64, height: f64) {
        if let Some(ticket) = self.ticket {
            self.session.image_loaded(ticket, Size::new(width, height));
        }
    }

    pub fn image_failed(&mut self, reason: &str) {
        if let Some(ticket) = self.ticket {
            self.session.image_failed(ticket, reason);
        }
    }

    /// Ticket of the current load, to simulate late or stale completions
    pub fn ticket(&self) -> Option<ImageTicket> {
        self.ticket
    }

    // ── Viewport ──────────────────────────────────────────────

    pub fn resize(&mut self, width: f64, height: f64) {
        let now = self.now();
        self.session.resize(Size::new(width, height), now);
    }

    pub fn recenter(&mut self) {
        let now = self.now();
        self.session.recenter(now);
    }

    // ── Placement ─────────────────────────────────────────────

    /// Drop a word through the overlay, as a drag gesture would
    pub fn drop_word(&mut self, word_id: &str, block_id: &str) -> Option<PlacementOutcome> {
        self.session
            .overlay_mut()
            .simulate_drop(word_id, block_id);
        self.advance(0).pop()
    }

    pub fn remove(&mut self, word_id: &str) -> Result<PlacementOutcome> {
        self.session.remove_word(word_id)
    }

    pub fn reset(&mut self) {
        self.session.reset_placements();
    }

    pub fn submit(&self) -> Option<Submission> {
        self.session.submit()
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn transform(&self) -> Option<ImageTransform> {
        self.session.engine().transform()
    }

    /// Block rect on the render surface
    pub fn block_rect(&self, block_id: &str) -> Option<Rect> {
        self.session.render().block_rect(block_id)
    }

    /// Region rect on the overlay surface
    pub fn region_rect(&self, block_id: &str) -> Option<Rect> {
        self.session.overlay().region_rect(block_id)
    }

    pub fn arrow(&self, arrow_id: &str) -> Option<&ArrowGeometry> {
        self.session.render().arrow(arrow_id)
    }

    pub fn region_count(&self) -> usize {
        self.session.overlay().region_count()
    }

    pub fn word_state(&self, word_id: &str) -> Option<WordState> {
        self.session.placement().state(word_id)
    }

    pub fn placed_count(&self) -> usize {
        self.session.placement().placed_count()
    }

    pub fn correct_count(&self) -> usize {
        self.session.placement().correct_count()
    }

    pub fn is_complete(&self) -> bool {
        self.session.placement().is_complete()
    }

    pub fn passes(&self) -> u64 {
        self.session.engine().passes()
    }

    pub fn repaints(&self) -> u64 {
        self.session.render().repaints()
    }

    /// Create a validator for the current surfaces
    pub fn validator(&self) -> SurfaceValidator<'_> {
        SurfaceValidator::new(
            self.session.render(),
            self.session.overlay(),
            self.session.engine().frame(),
        )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
