//! The event relay
//!
//! A [`Relay`] is the publish/subscribe hub of one execution context. It
//! delivers every published event synchronously to the listeners of its
//! own context, in registration order, and hands the event to its
//! [`Transport`] for the other contexts of the host. Events from other
//! contexts are delivered when the context calls [`Relay::pump`].
//!
//! Nothing here is shared between threads. Dispatch iterates over a
//! snapshot of the listener list, so listeners may subscribe, unsubscribe
//! or publish from inside a dispatch; such changes apply from the next
//! event on.

use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    rc::{Rc, Weak},
};

use crate::{
    event::Event,
    transport::{Incoming, Transport, TransportKind},
};

type Listener = Rc<dyn Fn(&Event)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl Listeners {
    fn snapshot(&self) -> Vec<Listener> {
        self.entries.iter().map(|(_, l)| Rc::clone(l)).collect()
    }
}

/// The publish/subscribe hub of one execution context
pub struct Relay {
    transport: Box<dyn Transport>,
    listeners: Rc<RefCell<Listeners>>,
}

impl Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("transport", &self.transport)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Relay {
    /// Creates a relay that mirrors events over `transport`
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            listeners: Rc::default(),
        }
    }

    /// The mode this relay was constructed in
    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    /// Registers `listener` for every event delivered in this context
    ///
    /// The returned [`Subscription`] removes exactly this listener when
    /// [`Subscription::unsubscribe`] is called. Dropping it leaves the
    /// listener registered.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Event) + 'static,
    {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));

        tracing::trace!(listener = id, "subscribed");

        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
            active: Cell::new(true),
        }
    }

    /// Publishes `event` to this context and to every other context
    ///
    /// Local listeners have all run by the time this returns. Delivery to
    /// other contexts is best-effort and happens on their next pump.
    pub fn publish(&self, event: &Event) {
        tracing::debug!(kind = %event.kind(), code = %event.code(), "publishing event");
        self.transport.post(event);
        self.emit_local(event);
    }

    /// Delivers every event received from other contexts since the last
    /// pump
    ///
    /// Text that does not parse as an event is discarded. Returns the
    /// number of events delivered.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        for incoming in self.transport.drain() {
            let event = match incoming {
                Incoming::Event(event) => event,
                Incoming::Text(text) => match Event::from_message(&text) {
                    Ok(event) => event,
                    Err(error) => {
                        tracing::debug!(%error, "discarding malformed relay payload");
                        continue;
                    }
                },
            };
            self.emit_local(&event);
            delivered += 1;
        }
        delivered
    }

    fn emit_local(&self, event: &Event) {
        let snapshot = self.listeners.borrow().snapshot();
        for listener in snapshot {
            listener(event);
        }
    }
}

/// The capability to remove one listener from a [`Relay`]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
    active: Cell<bool>,
}

impl Subscription {
    /// Removes the listener; calling this again does nothing
    ///
    /// An event being dispatched when this is called still reaches the
    /// listener.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().entries.retain(|(id, _)| *id != self.id);
            tracing::trace!(listener = self.id, "unsubscribed");
        }
    }

    /// Whether the listener is still registered
    pub fn is_active(&self) -> bool {
        self.active.get() && self.listeners.strong_count() > 0
    }
}
