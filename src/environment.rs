//! Host environment and execution contexts
//!
//! An [`Environment`] stands for one browser instance: it owns whichever
//! cross-context primitives the host offers and opens [`Tab`]s. Each tab
//! gets its own relay, whose transport is chosen by probing those
//! primitives once, and its own short-lived session storage.

use std::{cell::RefCell, collections::HashMap, fmt::Display, rc::Rc, str::FromStr};

use garde::Validate;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

use crate::{
    config::RelayConfig,
    relay::Relay,
    transport::{BroadcastHub, LocalTransport, SharedStore, Transport},
};

/// A unique identifier for an execution context
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Creates a new random context ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    /// Creates a new random context ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ContextId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Per-tab string storage that lives as long as the tab
///
/// Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct TabStorage {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl TabStorage {
    /// Creates empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`
    pub fn get_item(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    /// Stores `value` under `key`
    pub fn set_item(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Removes the value stored under `key`
    pub fn remove_item(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }

    /// Removes every value
    pub fn clear(&self) {
        self.values.borrow_mut().clear();
    }
}

/// The cross-context primitives a host offers
#[derive(Debug, Clone, Default)]
pub struct Environment {
    broadcast: Option<BroadcastHub>,
    storage: Option<SharedStore>,
    config: RelayConfig,
}

impl Environment {
    /// A host with both a broadcast channel and a shared store
    pub fn browser() -> Self {
        Self {
            broadcast: Some(BroadcastHub::new()),
            storage: Some(SharedStore::new()),
            config: RelayConfig::default(),
        }
    }

    /// A host with a shared store but no broadcast channel
    pub fn without_broadcast() -> Self {
        Self {
            broadcast: None,
            storage: Some(SharedStore::new()),
            config: RelayConfig::default(),
        }
    }

    /// A host with neither primitive, such as a server-side render
    pub fn headless() -> Self {
        Self::default()
    }

    /// Replaces the relay configuration used by tabs opened afterwards
    ///
    /// # Errors
    ///
    /// Returns the validation report if the channel name or store key is
    /// empty.
    pub fn with_config(mut self, config: RelayConfig) -> Result<Self, garde::Report> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The host's broadcast primitive, if it has one
    pub fn broadcast(&self) -> Option<&BroadcastHub> {
        self.broadcast.as_ref()
    }

    /// The host's shared store, if it has one
    pub fn storage(&self) -> Option<&SharedStore> {
        self.storage.as_ref()
    }

    /// The relay configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Picks the transport for context `id`
    ///
    /// A broadcast channel is preferred, then the shared store; with
    /// neither the relay only delivers within its own context.
    pub fn probe_transport(&self, id: ContextId) -> Box<dyn Transport> {
        if let Some(hub) = &self.broadcast {
            Box::new(hub.open(&self.config.channel_name, id))
        } else if let Some(store) = &self.storage {
            Box::new(store.watch(&self.config.storage_key, id))
        } else {
            Box::new(LocalTransport)
        }
    }

    /// Opens a new execution context
    pub fn open_tab(&self) -> Tab {
        let id = ContextId::new();
        let relay = Rc::new(Relay::new(self.probe_transport(id)));

        tracing::debug!(context = %id, transport = %relay.transport_kind(), "opened tab");

        Tab {
            id,
            relay,
            storage: TabStorage::new(),
        }
    }
}

/// One execution context of a host
#[derive(Debug)]
pub struct Tab {
    id: ContextId,
    relay: Rc<Relay>,
    storage: TabStorage,
}

impl Tab {
    /// The identifier of this context
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The relay of this context
    pub fn relay(&self) -> &Rc<Relay> {
        &self.relay
    }

    /// The session storage of this context
    pub fn storage(&self) -> &TabStorage {
        &self.storage
    }

    /// Delivers every event received from other contexts
    ///
    /// Returns the number of events delivered.
    pub fn pump(&self) -> usize {
        self.relay.pump()
    }
}
