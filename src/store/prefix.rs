use super::{Read, Write};
use crate::Result;

/// A `Store` which wraps another `Store` and prepends a prefix to the key for
/// every read or write.
///
/// This can be useful to create a hierarchy of data within a single store -
/// effectively namespacing the keys to prevent key conflicts.
pub struct Prefixed<S> {
    store: S,
    prefix: Vec<u8>,
}

impl<S> Prefixed<S> {
    /// Constructs a `Prefixed` by wrapping the given store and prepending keys
    /// with the given prefix for all operations.
    pub fn new(store: S, prefix: &[u8]) -> Self {
        Prefixed {
            store,
            prefix: prefix.to_vec(),
        }
    }

    #[inline]
    fn prefixed(&self, key: &[u8]) -> Vec<u8> {
        let mut prefixed = Vec::with_capacity(self.prefix.len() + key.len());
        prefixed.extend_from_slice(self.prefix.as_slice());
        prefixed.extend_from_slice(key);
        prefixed
    }
}

impl<S: Read> Read for Prefixed<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.store.get(self.prefixed(key).as_slice())
    }
}

impl<S: Write> Write for Prefixed<S> {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let key = self.prefixed(key.as_slice());
        self.store.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let key = self.prefixed(key);
        self.store.delete(key.as_slice())
    }
}
