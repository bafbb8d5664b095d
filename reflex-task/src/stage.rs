use reflex_core::EventSource;
use reflex_render::Canvas;
use reflex_timing::Clock;
use std::time::Duration;

/// The I/O bundle a stimulus unit runs against: render target, input
/// surface, clock, and the poll-interval knob. A zero interval keeps the
/// original uncapped busy poll.
pub struct Stage<C, E, K> {
    pub canvas: C,
    pub events: E,
    pub clock: K,
    pub poll_interval: Duration,
}

impl<C: Canvas, E: EventSource, K: Clock> Stage<C, E, K> {
    pub fn new(canvas: C, events: E, clock: K) -> Self {
        Self {
            canvas,
            events,
            clock,
            poll_interval: Duration::ZERO,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
