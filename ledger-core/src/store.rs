//! Byte-oriented key/value storage
//!
//! The raw storage engine belongs to the host process. The state machine only
//! needs `get`/`set`/`delete`, which [`KvStore`] captures; [`MemStore`] is the
//! ordered in-memory implementation used by the node and the tests.

use crate::crypto::{leaf_hash, merkle_root};
use std::collections::BTreeMap;

/// Key/value accessor every layer of the ledger reads and writes through
pub trait KvStore {
    /// Read a value
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Write a value
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Remove a value
    fn delete(&mut self, key: &[u8]);

    /// Whether a key holds a value
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Ordered in-memory store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Entries whose key starts with `prefix`, in key order
    pub fn iter_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Merkle root over every entry in key order
    pub fn app_hash(&self) -> [u8; 32] {
        let leaves: Vec<[u8; 32]> = self.iter().map(|(k, v)| leaf_hash(k, v)).collect();
        merkle_root(&leaves)
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn has(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }
}
