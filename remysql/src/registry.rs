//! Keyed registry of open connections
//!
//! An explicit, caller-owned map — no ambient process-wide state. The
//! registry owns nothing beyond the mapping: removal hands the connection
//! back to its owner, who remains responsible for closing it. Mutation is
//! single-threaded or externally synchronized by the caller.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::RegistryError;

/// A rejected registration, handing the connection back so its owner can
/// still close it.
pub struct RejectedRegistration<D: Driver> {
    pub error: RegistryError,
    pub connection: Connection<D>,
}

impl<D: Driver> std::fmt::Debug for RejectedRegistration<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RejectedRegistration")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Maps string identifiers to live connections, at most one per key.
///
/// Deliberately neither cloneable nor serializable: a registry entry is a
/// live network session, not data.
pub struct ConnectionRegistry<D: Driver> {
    connections: HashMap<String, Connection<D>>,
}

impl<D: Driver> Default for ConnectionRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Driver> ConnectionRegistry<D> {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Register a connection under a key. Re-registration is an error; the
    /// rejected connection is returned to the caller untouched.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        connection: Connection<D>,
    ) -> Result<(), RejectedRegistration<D>> {
        let key = key.into();
        match self.connections.entry(key.clone()) {
            Entry::Occupied(_) => Err(RejectedRegistration {
                error: RegistryError::DuplicateKey(key),
                connection,
            }),
            Entry::Vacant(slot) => {
                slot.insert(connection);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &str) -> Result<&Connection<D>, RegistryError> {
        self.connections
            .get(key)
            .ok_or_else(|| RegistryError::UnknownKey(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Connection<D>, RegistryError> {
        self.connections
            .get_mut(key)
            .ok_or_else(|| RegistryError::UnknownKey(key.to_string()))
    }

    /// Remove a connection, returning it to the caller. The registry never
    /// closes connections on removal.
    pub fn remove(&mut self, key: &str) -> Result<Connection<D>, RegistryError> {
        self.connections
            .remove(key)
            .ok_or_else(|| RegistryError::UnknownKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.connections.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }
}
