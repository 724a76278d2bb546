//! In-memory NVM adapter.
//!
//! Implements [`StoragePort`] over a `HashMap` keyed by `"namespace::key"`.
//! Used by the host binary and tests; a target build supplies its own
//! flash-backed adapter behind the same port.

use std::collections::HashMap;

use log::{debug, info};

use crate::app::ports::StoragePort;
use crate::error::StorageError;

/// Largest value a single key may hold.
pub const MAX_VALUE_SIZE: usize = 4000;

#[derive(Debug, Default)]
pub struct MemoryNvm {
    store: HashMap<String, Vec<u8>>,
}

impl MemoryNvm {
    pub fn new() -> Self {
        info!("MemoryNvm: simulation backend");
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Number of stored keys across all namespaces.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl StoragePort for MemoryNvm {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&Self::composite_key(namespace, key)) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_VALUE_SIZE {
            return Err(StorageError::Full);
        }
        debug!("MemoryNvm: {}::{} <- {} bytes", namespace, key, data.len());
        self.store
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store
            .contains_key(&Self::composite_key(namespace, key))
    }
}
