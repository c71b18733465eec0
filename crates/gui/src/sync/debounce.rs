//! Trailing-edge coalescing of viewport events.
//!
//! Continuous window resizing produces a size event per frame. Only the last
//! one of a burst triggers a sync pass, once no new event has arrived for the
//! configured delay. The clock is passed in so behaviour is deterministic.

use std::time::{Duration, Instant};

use kurbo::Size;
use serde::Serialize;

pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportRequest {
    Resize,
    Recenter,
}

/// The settled outcome of one burst.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PendingViewport {
    /// Latest container size seen in the burst, if any
    pub size: Option<Size>,
    pub request: ViewportRequest,
    /// Number of raw events folded into this one
    pub coalesced: u32,
}

#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: Duration,
    pending: Option<PendingViewport>,
    deadline: Option<Instant>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DEBOUNCE)
    }
}

impl ResizeDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    fn touch(&mut self, now: Instant) -> &mut PendingViewport {
        self.deadline = Some(now + self.delay);
        let pending = self.pending.get_or_insert(PendingViewport {
            size: None,
            request: ViewportRequest::Resize,
            coalesced: 0,
        });
        pending.coalesced += 1;
        pending
    }

    /// Record a container size; the latest size of a burst wins.
    pub fn push_resize(&mut self, size: Size, now: Instant) {
        self.touch(now).size = Some(size);
    }

    /// Record a recenter request; it upgrades the whole burst.
    pub fn push_recenter(&mut self, now: Instant) {
        self.touch(now).request = ViewportRequest::Recenter;
    }

    /// Take the settled burst once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<PendingViewport> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => None,
        }
    }

    /// Take the pending burst immediately.
    pub fn flush(&mut self) -> Option<PendingViewport> {
        self.deadline = None;
        self.pending.take()
    }

    /// When the host must wake up for the trailing pass
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_coalesces_to_last_size() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(ms(100));
        d.push_resize(Size::new(500.0, 400.0), t0);
        d.push_resize(Size::new(600.0, 400.0), t0 + ms(30));
        d.push_resize(Size::new(700.0, 400.0), t0 + ms(60));

        assert!(d.poll(t0 + ms(120)).is_none());
        let settled = d.poll(t0 + ms(160)).unwrap();
        assert_eq!(settled.size, Some(Size::new(700.0, 400.0)));
        assert_eq!(settled.request, ViewportRequest::Resize);
        assert_eq!(settled.coalesced, 3);
        assert_eq!(d.next_deadline(), None);
        assert!(d.poll(t0 + ms(500)).is_none());
    }

    #[test]
    fn test_recenter_upgrades_burst() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(ms(50));
        d.push_resize(Size::new(500.0, 400.0), t0);
        d.push_recenter(t0 + ms(10));
        d.push_resize(Size::new(510.0, 400.0), t0 + ms(20));

        let settled = d.poll(t0 + ms(70)).unwrap();
        assert_eq!(settled.request, ViewportRequest::Recenter);
        assert_eq!(settled.size, Some(Size::new(510.0, 400.0)));
    }

    #[test]
    fn test_deadline_tracks_last_event() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(ms(100));
        assert_eq!(d.next_deadline(), None);
        d.push_recenter(t0);
        d.push_recenter(t0 + ms(40));
        assert_eq!(d.next_deadline(), Some(t0 + ms(140)));

        let flushed = d.flush().unwrap();
        assert_eq!(flushed.size, None);
        assert_eq!(d.next_deadline(), None);
    }
}
