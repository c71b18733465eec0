//! One running exercise: model, sync engine, placement and both surfaces.
//!
//! The session is the single entry point of the event loop. Every host event
//! (load, image result, resize, recenter, drop, clock tick) is a method call
//! that runs to completion; nothing here is shared across threads.

use std::time::{Duration, Instant};

use kurbo::Size;
use shared::{ExercisePayload, Submission};

use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::geometry::FitMode;
use crate::model::ExerciseModel;
use crate::placement::{PlacementOutcome, PlacementStateMachine};
use crate::surface::{Backdrop, DropEvent, OverlaySurface, RenderSurface};
use crate::sync::{
    GateEvent, ImageGate, ImageState, ImageTicket, ResizeDebouncer, SyncEngine, SyncTrigger,
    ViewportRequest, DEFAULT_IMAGE_TIMEOUT, DEFAULT_RESIZE_DEBOUNCE,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub resize_debounce: Duration,
    pub image_timeout: Duration,
    /// Fit mode of plain resizes after the first fit
    pub resize_mode: FitMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
            resize_mode: FitMode::NoUpscaleCentered,
        }
    }
}

pub struct ExerciseSession<R: RenderSurface, O: OverlaySurface> {
    config: SessionConfig,
    model: ExerciseModel,
    engine: SyncEngine,
    placement: PlacementStateMachine,
    debouncer: ResizeDebouncer,
    gate: ImageGate,
    ticket: Option<ImageTicket>,
    diagnostics: Diagnostics,
    render: R,
    overlay: O,
}

impl<R: RenderSurface, O: OverlaySurface> ExerciseSession<R, O> {
    pub fn new(render: R, overlay: O, config: SessionConfig) -> Self {
        Self {
            config,
            model: ExerciseModel::default(),
            engine: SyncEngine::new(config.resize_mode),
            placement: PlacementStateMachine::default(),
            debouncer: ResizeDebouncer::new(config.resize_debounce),
            gate: ImageGate::new(config.image_timeout),
            ticket: None,
            diagnostics: Diagnostics::new(),
            render,
            overlay,
        }
    }

    // ── Loading ───────────────────────────────────────────────

    /// Replace the current exercise. Returns the ticket the image result
    /// must be delivered with; results of earlier loads are ignored.
    pub fn load(&mut self, payload: &ExercisePayload, now: Instant) -> ImageTicket {
        self.engine.reset(&mut self.render, &mut self.overlay);
        // A burst still in flight carries the latest container size; the
        // host will not report it again.
        if let Some(pending) = self.debouncer.flush() {
            if let Some(size) = pending.size {
                self.engine.set_container(size);
            }
        }
        self.model = ExerciseModel::from_payload(payload, &mut self.diagnostics);
        self.placement = PlacementStateMachine::from_model(&self.model);

        let ticket = self.gate.begin(now);
        self.ticket = Some(ticket);
        tracing::info!(
            test_id = %self.model.test_id,
            image = %self.model.image_url,
            generation = ticket.generation(),
            "exercise loaded, waiting for image"
        );
        ticket
    }

    pub fn load_json(&mut self, json: &str, now: Instant) -> Result<ImageTicket> {
        let payload: ExercisePayload = serde_json::from_str(json).map_err(|e| {
            let err = EngineError::Payload(e.to_string());
            self.diagnostics.report(&err);
            err
        })?;
        Ok(self.load(&payload, now))
    }

    /// Image decoded with the given native size.
    pub fn image_loaded(&mut self, ticket: ImageTicket, native: Size) {
        if let Some(event) = self.gate.complete(ticket, Ok(native)) {
            self.on_gate_event(event);
        }
    }

    pub fn image_failed(&mut self, ticket: ImageTicket, reason: impl Into<String>) {
        if let Some(event) = self.gate.complete(ticket, Err(reason.into())) {
            self.on_gate_event(event);
        }
    }

    fn on_gate_event(&mut self, event: GateEvent) {
        match event {
            GateEvent::Ready(native) => {
                tracing::info!(width = native.width, height = native.height, "image ready");
                self.engine
                    .set_reference(Some(native), Backdrop::image(native));
                self.sync(SyncTrigger::Load);
            }
            GateEvent::Unavailable(reason) => {
                self.diagnostics.report(&EngineError::Resource {
                    url: self.model.image_url.clone(),
                    reason,
                });
                let fallback = self
                    .model
                    .reference_size()
                    .map(|(w, h)| Size::new(w, h));
                self.engine.set_reference(fallback, Backdrop::Unavailable);
                if fallback.is_none() {
                    self.diagnostics.report(&EngineError::NoReferenceSize);
                }
                if !self.sync(SyncTrigger::Load) {
                    self.engine.show_backdrop(&mut self.render);
                }
            }
        }
    }

    // ── Viewport ──────────────────────────────────────────────

    /// Container measured. The first measurement applies at once; later
    /// ones are coalesced.
    pub fn resize(&mut self, size: Size, now: Instant) {
        if self.engine.container().is_none() {
            self.engine.set_container(size);
            self.sync(SyncTrigger::Resize);
        } else {
            self.debouncer.push_resize(size, now);
        }
    }

    pub fn recenter(&mut self, now: Instant) {
        self.debouncer.push_recenter(now);
    }

    /// Advance the clock: image timeout, settled viewport bursts, queued
    /// drops. Returns the effect of every drop that was applied.
    pub fn tick(&mut self, now: Instant) -> Vec<PlacementOutcome> {
        if let Some(event) = self.gate.poll_timeout(now) {
            self.on_gate_event(event);
        }
        if let Some(settled) = self.debouncer.poll(now) {
            if let Some(size) = settled.size {
                self.engine.set_container(size);
            }
            tracing::debug!(coalesced = settled.coalesced, request = ?settled.request, "viewport settled");
            self.sync(match settled.request {
                ViewportRequest::Resize => SyncTrigger::Resize,
                ViewportRequest::Recenter => SyncTrigger::Recenter,
            });
        }
        self.process_drops()
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do
    pub fn next_wakeup(&self) -> Option<Instant> {
        match (self.debouncer.next_deadline(), self.gate.timeout_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run a pass if the image has settled and the container is known.
    fn sync(&mut self, trigger: SyncTrigger) -> bool {
        if self.engine.reference().is_none() || self.engine.container().is_none() {
            tracing::debug!(?trigger, "sync deferred");
            return false;
        }
        self.engine
            .run_pass(
                trigger,
                &self.model,
                &mut self.render,
                &mut self.overlay,
                &mut self.diagnostics,
            )
            .is_ok()
    }

    // ── Placement ─────────────────────────────────────────────

    /// Apply one drop. Unknown ids are reported and leave the state as is.
    pub fn handle_drop(&mut self, event: &DropEvent) -> Result<PlacementOutcome> {
        self.placement
            .drop_word(&event.dragged_word_id, &event.block_id)
            .inspect_err(|e| self.diagnostics.report(e))
    }

    /// Drain the overlay's drop queue.
    pub fn process_drops(&mut self) -> Vec<PlacementOutcome> {
        let drops = self.overlay.drain_drops();
        drops
            .iter()
            .filter_map(|event| self.handle_drop(event).ok())
            .collect()
    }

    pub fn remove_word(&mut self, word_id: &str) -> Result<PlacementOutcome> {
        self.placement
            .remove(word_id)
            .inspect_err(|e| self.diagnostics.report(e))
    }

    /// Unplace every word. Geometry is untouched.
    pub fn reset_placements(&mut self) {
        self.placement.reset();
        tracing::info!(test_id = %self.model.test_id, "placements reset");
    }

    /// Submission records, once every word is placed
    pub fn submit(&self) -> Option<Submission> {
        self.placement
            .can_submit()
            .then(|| self.placement.submission(&self.model.test_id))
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
        self.debouncer.set_delay(config.resize_debounce);
        self.gate.set_timeout(config.image_timeout);
        self.engine.set_resize_mode(config.resize_mode);
    }

    pub fn model(&self) -> &ExerciseModel {
        &self.model
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn placement(&self) -> &PlacementStateMachine {
        &self.placement
    }

    pub fn image_state(&self) -> &ImageState {
        self.gate.state()
    }

    pub fn current_ticket(&self) -> Option<ImageTicket> {
        self.ticket
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut R {
        &mut self.render
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::fixtures::*;
    use crate::surface::{RecordingOverlaySurface, RecordingRenderSurface};

    type Session = ExerciseSession<RecordingRenderSurface, RecordingOverlaySurface>;

    fn session() -> Session {
        ExerciseSession::new(
            RecordingRenderSurface::new(),
            RecordingOverlaySurface::new(),
            SessionConfig::default(),
        )
    }

    fn native() -> Size {
        Size::new(NATIVE.0, NATIVE.1)
    }

    #[test]
    fn test_geometry_waits_for_image() {
        let t0 = Instant::now();
        let mut s = session();
        let ticket = s.load(&six_word_payload(), t0);
        s.resize(Size::new(800.0, 600.0), t0);
        assert!(s.engine().frame().is_none());
        assert_eq!(s.overlay().region_count(), 0);

        s.image_loaded(ticket, native());
        let frame = s.engine().frame().unwrap();
        assert_eq!(frame.mode, FitMode::FitContainMargin);
        assert!((frame.transform.offset_x - 20.0).abs() < 1e-9);
        assert_eq!(s.overlay().region_count(), 6);
        assert_eq!(s.render().backdrop(), Backdrop::image(native()));
    }

    #[test]
    fn test_image_timeout_without_reference_stays_deferred() {
        let t0 = Instant::now();
        let mut s = session();
        let mut payload = six_word_payload();
        payload.image_width = None;
        payload.image_height = None;
        payload.blocks.retain(|b| matches!(b.id.as_str(), "1" | "2" | "5"));
        payload.arrows.clear();
        s.load(&payload, t0);
        s.resize(Size::new(800.0, 600.0), t0);

        s.tick(t0 + Duration::from_secs(16));
        assert!(matches!(s.image_state(), ImageState::Unavailable { .. }));
        assert!(s.engine().transform().is_none());
        assert_eq!(s.render().backdrop(), Backdrop::Unavailable);
        assert_eq!(s.diagnostics().count_of(DiagnosticKind::Resource), 1);
    }

    #[test]
    fn test_image_timeout_falls_back_to_recorded_size() {
        let t0 = Instant::now();
        let mut s = session();
        let ticket = s.load(&six_word_payload(), t0);
        s.resize(Size::new(800.0, 600.0), t0);

        assert!(s.tick(t0 + Duration::from_secs(5)).is_empty());
        assert!(s.engine().frame().is_none());

        s.tick(t0 + Duration::from_secs(15));
        assert_eq!(s.render().backdrop(), Backdrop::Unavailable);
        assert_eq!(s.overlay().region_count(), 6);

        // Drop targets stay interactive without a backdrop.
        s.overlay_mut().simulate_drop("3", "3");
        let outcomes = s.tick(t0 + Duration::from_secs(16));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(s.placement().correct_count(), 1);

        // The image shows up late: backdrop restored, geometry unchanged.
        let before = s.engine().frame().cloned().unwrap();
        s.image_loaded(ticket, native());
        assert_eq!(s.render().backdrop(), Backdrop::image(native()));
        assert!(s.engine().frame().unwrap().same_geometry(&before));
    }

    #[test]
    fn test_superseded_image_is_ignored() {
        let t0 = Instant::now();
        let mut s = session();
        s.resize(Size::new(800.0, 600.0), t0);
        let old = s.load(&six_word_payload(), t0);
        let new = s.load(&six_word_payload(), t0);

        s.image_loaded(old, Size::new(10.0, 10.0));
        assert!(s.engine().frame().is_none());
        s.image_loaded(new, native());
        assert!(s.engine().frame().is_some());
    }

    #[test]
    fn test_resize_burst_runs_one_trailing_pass() {
        let t0 = Instant::now();
        let mut s = session();
        let ticket = s.load(&six_word_payload(), t0);
        s.resize(Size::new(800.0, 600.0), t0);
        s.image_loaded(ticket, native());
        assert_eq!(s.engine().passes(), 1);

        for i in 1..=10u32 {
            let at = t0 + Duration::from_millis(10 * u64::from(i));
            s.resize(Size::new(800.0 + 20.0 * f64::from(i), 600.0), at);
            s.tick(at);
        }
        assert_eq!(s.engine().passes(), 1);
        let wake = s.next_wakeup().unwrap();
        assert_eq!(wake, t0 + Duration::from_millis(100) + DEFAULT_RESIZE_DEBOUNCE);

        s.tick(wake);
        assert_eq!(s.engine().passes(), 2);
        assert_eq!(s.engine().container(), Some(Size::new(1000.0, 600.0)));
        assert_eq!(s.render().repaints(), 2);
    }

    #[test]
    fn test_load_keeps_size_of_unsettled_resize() {
        let t0 = Instant::now();
        let mut s = session();
        s.resize(Size::new(800.0, 600.0), t0);
        s.resize(Size::new(1200.0, 900.0), t0 + Duration::from_millis(10));
        let ticket = s.load(&six_word_payload(), t0 + Duration::from_millis(20));
        s.image_loaded(ticket, native());
        s.tick(t0 + Duration::from_secs(5));

        assert_eq!(s.engine().container(), Some(Size::new(1200.0, 900.0)));
        let t = s.engine().transform().unwrap();
        assert!((t.offset_x - 30.0).abs() < 1e-9);
        assert!((t.display_width - 1140.0).abs() < 1e-9);
        assert!(s.next_wakeup().is_none());
    }

    #[test]
    fn test_unknown_drop_reported_and_ignored() {
        let t0 = Instant::now();
        let mut s = session();
        s.load(&six_word_payload(), t0);
        s.overlay_mut().simulate_drop("42", "1");
        s.overlay_mut().simulate_drop("1", "42");
        s.overlay_mut().simulate_drop("1", "1");

        let outcomes = s.process_drops();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(s.diagnostics().count_of(DiagnosticKind::State), 2);
        assert_eq!(s.placement().placed_count(), 1);
    }

    #[test]
    fn test_submit_requires_every_word() {
        let t0 = Instant::now();
        let mut s = session();
        s.load(&six_word_payload(), t0);
        for i in 1..=5 {
            let id = i.to_string();
            s.handle_drop(&DropEvent {
                dragged_word_id: id.clone(),
                block_id: id,
            })
            .unwrap();
        }
        assert!(s.submit().is_none());
        s.handle_drop(&DropEvent {
            dragged_word_id: "6".into(),
            block_id: "6".into(),
        })
        .unwrap();
        let submission = s.submit().unwrap();
        assert_eq!(submission.test_id, "six");
        assert_eq!(submission.summary.correct, 6);

        s.reset_placements();
        assert!(s.submit().is_none());
    }

    #[test]
    fn test_load_json_payload_error() {
        let mut s = session();
        assert!(s.load_json("{\"testId\": ", Instant::now()).is_err());
        assert_eq!(s.diagnostics().count_of(DiagnosticKind::Data), 1);
        assert!(s.current_ticket().is_none());
    }
}
