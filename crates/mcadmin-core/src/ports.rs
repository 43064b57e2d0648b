//! Port traits implemented by infrastructure crates.

use crate::events::ServerEvent;

/// Port for publishing server events to observers.
///
/// The runner only knows this trait; the runtime's fan-out dispatcher
/// implements it. Implementations must never block the caller: the runner
/// publishes from its event loop and from the stdout reader.
pub trait ServerEventSink: Send + Sync {
    /// Hand an event to the sink. Delivery is best effort.
    fn publish(&self, event: ServerEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl ServerEventSink for NoopEventSink {
    fn publish(&self, _event: ServerEvent) {}
}
