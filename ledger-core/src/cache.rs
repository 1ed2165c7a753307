//! Layered write cache
//!
//! A [`CacheLayer`] overlays a parent store with a private write buffer.
//! Reads fall through to the parent, writes stay in the buffer until
//! [`CacheLayer::sync`] replays them into the parent in write order.
//! Dropping a layer (or calling [`CacheLayer::discard`]) leaves the parent
//! untouched. Layers nest through [`CacheLayer::cache_wrap`].
//!
//! Syncing is only defined on a wrapper, so "sync an unwrapped store" cannot
//! be expressed.

use crate::store::KvStore;
use std::collections::HashMap;

/// Buffered writes, keyed for lookup and journaled for ordered replay
///
/// `None` marks a delete.
#[derive(Debug, Clone, Default)]
pub struct WriteBuffer {
    index: HashMap<Vec<u8>, Option<Vec<u8>>>,
    journal: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl WriteBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffered state of `key`: `Some(None)` if deleted, `None` if untouched
    pub fn lookup(&self, key: &[u8]) -> Option<Option<&Vec<u8>>> {
        self.index.get(key).map(Option::as_ref)
    }

    /// Buffer a write
    pub fn put(&mut self, key: Vec<u8>, value: Option<Vec<u8>>) {
        self.index.insert(key.clone(), value.clone());
        self.journal.push((key, value));
    }

    /// Number of buffered writes (overwrites included)
    pub fn len(&self) -> usize {
        self.journal.len()
    }

    /// Nothing buffered
    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    /// Replay every write into `target` in the order it was made
    pub fn replay_into(self, target: &mut dyn KvStore) -> usize {
        let count = self.journal.len();
        for (key, value) in self.journal {
            match value {
                Some(value) => target.set(key, value),
                None => target.delete(&key),
            }
        }
        count
    }
}

/// Isolated, discardable view over a parent store
pub struct CacheLayer<'a> {
    parent: &'a mut dyn KvStore,
    buffer: WriteBuffer,
}

impl<'a> CacheLayer<'a> {
    /// Wrap `parent` with an empty buffer
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self::with_buffer(parent, WriteBuffer::new())
    }

    /// Wrap `parent`, resuming an earlier buffer
    pub fn with_buffer(parent: &'a mut dyn KvStore, buffer: WriteBuffer) -> Self {
        Self { parent, buffer }
    }

    /// Nested layer whose parent is this one
    pub fn cache_wrap(&mut self) -> CacheLayer<'_> {
        CacheLayer::new(self)
    }

    /// Writes waiting for sync
    pub fn pending_writes(&self) -> usize {
        self.buffer.len()
    }

    /// Flush buffered writes into the parent, returning how many were replayed
    pub fn sync(self) -> usize {
        let CacheLayer { parent, buffer } = self;
        buffer.replay_into(parent)
    }

    /// Drop buffered writes
    pub fn discard(self) {}

    /// Detach the buffer without touching the parent
    pub fn into_buffer(self) -> WriteBuffer {
        self.buffer
    }
}

impl KvStore for CacheLayer<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.buffer.lookup(key) {
            Some(buffered) => buffered.cloned(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.buffer.put(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.buffer.put(key.to_vec(), None);
    }
}

impl std::fmt::Debug for CacheLayer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("pending_writes", &self.buffer.len())
            .finish()
    }
}
