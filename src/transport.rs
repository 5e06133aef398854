//! Cross-context transports for the relay
//!
//! A transport carries events from one execution context to the other
//! contexts of the same host. Two host primitives are modelled here: a
//! named broadcast channel that delivers structured events to every
//! other member, and a shared key-value store that notifies every other
//! context when a key changes. Delivery is never echoed back to the
//! sender and always lands in the receiver's inbox; the receiving relay
//! picks it up on its next [`crate::relay::Relay::pump`].

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    fmt::Debug,
    rc::{Rc, Weak},
};

use crate::{environment::ContextId, event::Event};

/// The mode a relay operates in, fixed when it is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TransportKind {
    /// Events travel over a named broadcast channel
    #[display("broadcast")]
    Broadcast,
    /// Events are written as text under one key of a shared store
    #[display("storage-poll")]
    StoragePoll,
    /// No cross-context primitive; events stay in their own context
    #[display("local")]
    Local,
}

/// A message received from another context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A structured event received over a broadcast channel
    Event(Event),
    /// Raw text read from the shared store; may not be a valid event
    Text(String),
}

/// Moves events between execution contexts
///
/// Implementations are best-effort: posting never fails and there is no
/// acknowledgement.
pub trait Transport: Debug {
    /// The mode this transport implements
    fn kind(&self) -> TransportKind;

    /// Sends `event` to every other context
    fn post(&self, event: &Event);

    /// Takes every message received since the last call, oldest first
    fn drain(&self) -> Vec<Incoming>;
}

type Inbox<T> = Rc<RefCell<T>>;

/// A member of a broadcast channel
#[derive(Debug)]
struct Member {
    id: ContextId,
    inbox: Weak<RefCell<VecDeque<Event>>>,
}

/// The host's broadcast primitive
///
/// Clones share the same set of channels. Members that have been dropped
/// are pruned the next time their channel is posted to.
#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
    channels: Rc<RefCell<HashMap<String, Vec<Member>>>>,
}

impl BroadcastHub {
    /// Creates a hub with no channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the channel called `name` on behalf of context `id`
    pub fn open(&self, name: &str, id: ContextId) -> BroadcastTransport {
        let inbox: Inbox<VecDeque<Event>> = Rc::default();
        self.channels
            .borrow_mut()
            .entry(name.to_owned())
            .or_default()
            .push(Member {
                id,
                inbox: Rc::downgrade(&inbox),
            });

        tracing::debug!(channel = name, context = %id, "joined broadcast channel");

        BroadcastTransport {
            hub: self.clone(),
            name: name.to_owned(),
            id,
            inbox,
        }
    }

    /// Number of live members on channel `name`
    pub fn member_count(&self, name: &str) -> usize {
        self.channels
            .borrow()
            .get(name)
            .map_or(0, |members| {
                members.iter().filter(|m| m.inbox.strong_count() > 0).count()
            })
    }

    /// Delivers `event` to every live member of `name` except `sender`
    ///
    /// Returns the number of members that received a copy.
    fn post(&self, name: &str, sender: ContextId, event: &Event) -> usize {
        let mut channels = self.channels.borrow_mut();
        let Some(members) = channels.get_mut(name) else {
            return 0;
        };

        members.retain(|m| m.inbox.strong_count() > 0);

        let mut delivered = 0;
        for inbox in members
            .iter()
            .filter(|m| m.id != sender)
            .filter_map(|m| m.inbox.upgrade())
        {
            inbox.borrow_mut().push_back(event.clone());
            delivered += 1;
        }
        delivered
    }
}

/// A relay transport over a [`BroadcastHub`] channel
#[derive(Debug)]
pub struct BroadcastTransport {
    hub: BroadcastHub,
    name: String,
    id: ContextId,
    inbox: Inbox<VecDeque<Event>>,
}

impl Transport for BroadcastTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Broadcast
    }

    fn post(&self, event: &Event) {
        let delivered = self.hub.post(&self.name, self.id, event);
        tracing::trace!(
            channel = %self.name,
            kind = %event.kind(),
            delivered,
            "posted event on broadcast channel"
        );
    }

    fn drain(&self) -> Vec<Incoming> {
        self.inbox
            .borrow_mut()
            .drain(..)
            .map(Incoming::Event)
            .collect()
    }
}

/// A context watching the shared store
#[derive(Debug)]
struct Watcher {
    id: ContextId,
    pending: Weak<RefCell<HashMap<String, String>>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    values: HashMap<String, String>,
    watchers: Vec<Watcher>,
}

/// The host's shared key-value store
///
/// Writing a key notifies every other watching context with the new
/// value. A context holds at most one pending notification per key, so a
/// second write before the context reads replaces the first.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl SharedStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value of `key`
    pub fn get_item(&self, key: &str) -> Option<String> {
        self.inner.borrow().values.get(key).cloned()
    }

    /// Writes `value` under `key` on behalf of context `origin`
    ///
    /// Every watcher other than `origin` is notified.
    pub fn set_item(&self, origin: ContextId, key: &str, value: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.values.insert(key.to_owned(), value.to_owned());
        inner.watchers.retain(|w| w.pending.strong_count() > 0);

        for pending in inner
            .watchers
            .iter()
            .filter(|w| w.id != origin)
            .filter_map(|w| w.pending.upgrade())
        {
            pending.borrow_mut().insert(key.to_owned(), value.to_owned());
        }
    }

    /// Starts watching the store on behalf of context `id`, relaying
    /// changes of `key`
    pub fn watch(&self, key: &str, id: ContextId) -> StoragePollTransport {
        let pending: Inbox<HashMap<String, String>> = Rc::default();
        self.inner.borrow_mut().watchers.push(Watcher {
            id,
            pending: Rc::downgrade(&pending),
        });

        tracing::debug!(key, context = %id, "watching shared store");

        StoragePollTransport {
            store: self.clone(),
            key: key.to_owned(),
            id,
            pending,
        }
    }
}

/// A relay transport over one key of a [`SharedStore`]
#[derive(Debug)]
pub struct StoragePollTransport {
    store: SharedStore,
    key: String,
    id: ContextId,
    pending: Inbox<HashMap<String, String>>,
}

impl Transport for StoragePollTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::StoragePoll
    }

    fn post(&self, event: &Event) {
        self.store.set_item(self.id, &self.key, &event.to_message());
        tracing::trace!(key = %self.key, kind = %event.kind(), "wrote event to shared store");
    }

    fn drain(&self) -> Vec<Incoming> {
        let mut pending = self.pending.borrow_mut();
        let incoming: Vec<Incoming> = pending
            .remove(&self.key)
            .filter(|value| !value.is_empty())
            .map(Incoming::Text)
            .into_iter()
            .collect();
        pending.clear();
        incoming
    }
}

/// A transport for hosts without any cross-context primitive
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Local
    }

    fn post(&self, _event: &Event) {}

    fn drain(&self) -> Vec<Incoming> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::session_code::SessionCode;
    use pretty_assertions::assert_eq;

    fn ended(code: &str) -> Event {
        Event::SessionEnded {
            code: SessionCode::from_str(code).unwrap(),
        }
    }

    #[test]
    fn test_broadcast_delivers_to_others_only() {
        let hub = BroadcastHub::new();
        let a = hub.open("room", ContextId::new());
        let b = hub.open("room", ContextId::new());
        let c = hub.open("room", ContextId::new());

        a.post(&ended("AB12"));

        assert!(a.drain().is_empty());
        assert_eq!(b.drain(), vec![Incoming::Event(ended("AB12"))]);
        assert_eq!(c.drain(), vec![Incoming::Event(ended("AB12"))]);
        assert!(b.drain().is_empty());
    }

    #[test]
    fn test_broadcast_channels_are_separate() {
        let hub = BroadcastHub::new();
        let a = hub.open("room", ContextId::new());
        let b = hub.open("other", ContextId::new());

        a.post(&ended("AB12"));

        assert!(b.drain().is_empty());
    }

    #[test]
    fn test_broadcast_keeps_order() {
        let hub = BroadcastHub::new();
        let a = hub.open("room", ContextId::new());
        let b = hub.open("room", ContextId::new());

        a.post(&ended("AAA"));
        a.post(&ended("BBB"));

        assert_eq!(
            b.drain(),
            vec![Incoming::Event(ended("AAA")), Incoming::Event(ended("BBB"))]
        );
    }

    #[test]
    fn test_broadcast_prunes_dropped_members() {
        let hub = BroadcastHub::new();
        let a = hub.open("room", ContextId::new());
        let b = hub.open("room", ContextId::new());
        assert_eq!(hub.member_count("room"), 2);

        drop(b);
        a.post(&ended("AB12"));

        assert_eq!(hub.member_count("room"), 1);
        assert_eq!(hub.member_count("missing"), 0);
    }

    #[test]
    fn test_storage_notifies_others_only() {
        let store = SharedStore::new();
        let a = store.watch("bus", ContextId::new());
        let b = store.watch("bus", ContextId::new());

        a.post(&ended("AB12"));

        assert!(a.drain().is_empty());
        assert_eq!(b.drain(), vec![Incoming::Text(ended("AB12").to_message())]);
        assert_eq!(store.get_item("bus"), Some(ended("AB12").to_message()));
    }

    #[test]
    fn test_storage_coalesces_rapid_writes() {
        let store = SharedStore::new();
        let a = store.watch("bus", ContextId::new());
        let b = store.watch("bus", ContextId::new());

        a.post(&ended("AAA"));
        a.post(&ended("BBB"));

        assert_eq!(b.drain(), vec![Incoming::Text(ended("BBB").to_message())]);
    }

    #[test]
    fn test_storage_ignores_other_keys() {
        let store = SharedStore::new();
        let b = store.watch("bus", ContextId::new());

        store.set_item(ContextId::new(), "unrelated", "x");

        assert!(b.drain().is_empty());
        assert_eq!(store.get_item("unrelated"), Some("x".to_owned()));
    }

    #[test]
    fn test_storage_skips_empty_values() {
        let store = SharedStore::new();
        let b = store.watch("bus", ContextId::new());

        store.set_item(ContextId::new(), "bus", "");

        assert!(b.drain().is_empty());
    }

    #[test]
    fn test_local_transport_is_silent() {
        let local = LocalTransport;
        local.post(&ended("AB12"));
        assert!(local.drain().is_empty());
        assert_eq!(local.kind(), TransportKind::Local);
    }
}
