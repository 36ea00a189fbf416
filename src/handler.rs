//! Event fan-out to subscribers.
//!
//! A subscriber is the sending half of an unbounded channel; the receiver
//! side dropping is the liveness signal. Delivery is fire-and-forget in
//! registration order and never blocks the actor.

use tokio::sync::mpsc;

use crate::event::Event;

/// The sink end handed to [`Dispatcher::add`].
pub type EventSink = mpsc::UnboundedSender<Event>;

/// Ordered subscriber registry.
#[derive(Debug, Default)]
pub struct Dispatcher {
    sinks: Vec<EventSink>,
}

impl Dispatcher {
    pub fn new(sinks: Vec<EventSink>) -> Dispatcher {
        let mut dispatcher = Dispatcher { sinks: Vec::new() };
        for sink in sinks {
            dispatcher.add(sink);
        }
        dispatcher
    }

    /// Register a subscriber. Adding a sender of an already-registered
    /// channel is a no-op.
    pub fn add(&mut self, sink: EventSink) {
        if !self.sinks.iter().any(|s| s.same_channel(&sink)) {
            self.sinks.push(sink);
        }
    }

    /// Deregister by channel identity.
    pub fn remove(&mut self, sink: &EventSink) {
        self.sinks.retain(|s| !s.same_channel(sink));
    }

    /// Deliver an event to every live subscriber. Dead subscribers are
    /// pruned first, so none of them is ever delivered to again after its
    /// receiver dropped.
    pub fn emit(&mut self, event: &Event) {
        self.sinks.retain(|s| !s.is_closed());
        self.sinks.retain(|s| s.send(event.clone()).is_ok());
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
