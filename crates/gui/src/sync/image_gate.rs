//! The one suspension point: waiting for the backdrop image.
//!
//! Every load gets a generation. Completions from an older generation are
//! ignored, so a slow image of a superseded exercise can never touch the
//! current one.

use std::time::{Duration, Instant};

use kurbo::Size;

pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Identifies one image load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageTicket {
    generation: u64,
}

impl ImageTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageState {
    Idle,
    Pending { started: Instant },
    Ready { native: Size },
    Unavailable { reason: String },
}

/// A state change the session has to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum GateEvent {
    Ready(Size),
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct ImageGate {
    generation: u64,
    state: ImageState,
    timeout: Duration,
}

impl Default for ImageGate {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_TIMEOUT)
    }
}

impl ImageGate {
    pub fn new(timeout: Duration) -> Self {
        Self {
            generation: 0,
            state: ImageState::Idle,
            timeout,
        }
    }

    pub fn state(&self) -> &ImageState {
        &self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Start a new load, superseding any pending one.
    pub fn begin(&mut self, now: Instant) -> ImageTicket {
        self.generation += 1;
        self.state = ImageState::Pending { started: now };
        tracing::debug!(generation = self.generation, "image load started");
        ImageTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: ImageTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Deliver the result of a load. A late success after a timeout still
    /// upgrades the state to ready.
    pub fn complete(&mut self, ticket: ImageTicket, result: Result<Size, String>) -> Option<GateEvent> {
        if !self.is_current(ticket) {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "ignoring superseded image completion"
            );
            return None;
        }
        let pending = matches!(self.state, ImageState::Pending { .. });
        let unavailable = matches!(self.state, ImageState::Unavailable { .. });
        match result {
            Ok(native) if pending || unavailable => {
                self.state = ImageState::Ready { native };
                Some(GateEvent::Ready(native))
            }
            Err(reason) if pending => {
                self.state = ImageState::Unavailable {
                    reason: reason.clone(),
                };
                Some(GateEvent::Unavailable(reason))
            }
            _ => None,
        }
    }

    /// Give up on a load that has been pending for longer than the timeout.
    pub fn poll_timeout(&mut self, now: Instant) -> Option<GateEvent> {
        let deadline = self.timeout_deadline()?;
        if now < deadline {
            return None;
        }
        let reason = format!("timed out after {:.1}s", self.timeout.as_secs_f64());
        self.state = ImageState::Unavailable {
            reason: reason.clone(),
        };
        Some(GateEvent::Unavailable(reason))
    }

    pub fn timeout_deadline(&self) -> Option<Instant> {
        match self.state {
            ImageState::Pending { started } => Some(started + self.timeout),
            _ => None,
        }
    }
}
