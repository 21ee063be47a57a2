//! Key/value store abstractions.
use crate::error::Result;

mod bufstore;
mod null;
mod prefix;
mod share;

pub use bufstore::{BufStore, Map as BufStoreMap, MapStore};
pub use null::Empty;
pub use prefix::Prefixed;
pub use share::Shared;

/// Trait for read access to key/value stores.
pub trait Read {
    /// Gets a value by key.
    ///
    /// Implementations of `get` should return `None` when there is no value
    /// for the key rather than erroring.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Wraps the store so that every key is prepended with `prefix`.
    fn prefix(self, prefix: &[u8]) -> Prefixed<Self>
    where
        Self: Sized,
    {
        Prefixed::new(self, prefix)
    }

    /// Wraps the store in a reference-counted handle which can be cloned and
    /// handed to several owners.
    fn into_shared(self) -> Shared<Self>
    where
        Self: Sized,
    {
        Shared::new(self)
    }
}

/// Trait for write access to key/value stores.
pub trait Write {
    /// Writes a key and value to the store.
    ///
    /// If a value already exists for the given key, implementations should
    /// overwrite the value.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Deletes the value with the given key.
    ///
    /// If no value exists for the given key, implementations should treat the
    /// operation as a no-op (but may still issue a call to `delete` to an
    /// underlying store).
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// A trait for types which contain data that can be flushed to an underlying
/// store.
pub trait Flush {
    fn flush(&mut self) -> Result<()>;
}

/// Marker for types which implement both `Read` and `Write`.
pub trait Store: Read + Write {}

impl<S: Read + Write> Store for S {}

impl<R: Read + ?Sized> Read for &R {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }
}

impl<R: Read + ?Sized> Read for &mut R {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }
}

impl<W: Write + ?Sized> Write for &mut W {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_store_trait() {
        // (this is a compile-time assertion)
        fn assert_store<S: Store>(_: S) {}
        let mut store = MapStore::new();
        assert_store(&mut store);
        assert_store(store);
    }

    #[test]
    fn mut_ref_writes_through() {
        fn write<S: Write>(mut store: S) {
            store.put(vec![1], vec![2]).unwrap();
        }

        let mut store = MapStore::new();
        write(&mut store);
        assert_eq!(store.get(&[1]).unwrap(), Some(vec![2]));
    }
}
