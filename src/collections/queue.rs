//! A first-in, first-out queue persisted in a store
use std::marker::PhantomData;

use crate::encoding::{Decode, Encode};
use crate::store::{Read, Store};
use crate::Result;

/// A FIFO queue whose elements and cursors live in a store under a key
/// prefix.
///
/// The `head` and `tail` cursors are stored as big-endian `u64`s at
/// `prefix || "head"` and `prefix || "tail"`. The element at index `i` is
/// stored at `prefix || hex(i)`, where `i` is hex-encoded as 8 big-endian
/// bytes.
///
/// - Push: writes at the tail index, increments the tail
/// - Pop: deletes the slot at the head index, increments the head
///
/// Cursors wrap around at `u64::MAX`, and the queue is empty when
/// `head == tail`.
pub struct Queue<T> {
    prefix: Vec<u8>,
    item: PhantomData<T>,
}

impl<T> Queue<T> {
    /// Create a queue which stores its data under the given prefix.
    pub fn new(prefix: &[u8]) -> Self {
        Queue {
            prefix: prefix.to_vec(),
            item: PhantomData,
        }
    }

    fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.prefix.len() + suffix.len());
        key.extend_from_slice(self.prefix.as_slice());
        key.extend_from_slice(suffix);
        key
    }

    fn slot_key(&self, index: u64) -> Vec<u8> {
        self.key(hex::encode(index.to_be_bytes()).as_bytes())
    }

    fn cursor<S: Read>(&self, store: &S, name: &[u8]) -> Result<u64> {
        match store.get(self.key(name).as_slice())? {
            Some(bytes) => Ok(u64::decode(bytes.as_slice())?),
            None => Ok(0),
        }
    }

    fn set_cursor<S: Store>(&self, store: &mut S, name: &[u8], value: u64) -> Result<()> {
        store.put(self.key(name), value.encode()?)
    }

    pub fn head<S: Read>(&self, store: &S) -> Result<u64> {
        self.cursor(store, b"head")
    }

    pub fn tail<S: Read>(&self, store: &S) -> Result<u64> {
        self.cursor(store, b"tail")
    }

    pub fn len<S: Read>(&self, store: &S) -> Result<u64> {
        Ok(self.tail(store)?.wrapping_sub(self.head(store)?))
    }

    pub fn is_empty<S: Read>(&self, store: &S) -> Result<bool> {
        Ok(self.len(store)? == 0)
    }
}

impl<T: Encode + Decode> Queue<T> {
    /// Append a value to the back of the queue.
    pub fn push<S: Store>(&self, store: &mut S, value: &T) -> Result<()> {
        let tail = self.tail(store)?;
        store.put(self.slot_key(tail), value.encode()?)?;
        self.set_cursor(store, b"tail", tail.wrapping_add(1))
    }

    /// Returns the value at the front of the queue without removing it, or
    /// `None` if the queue is empty.
    pub fn peek<S: Read>(&self, store: &S) -> Result<Option<T>> {
        let head = self.head(store)?;
        if head == self.tail(store)? {
            return Ok(None);
        }

        match store.get(self.slot_key(head).as_slice())? {
            Some(bytes) => Ok(Some(T::decode(bytes.as_slice())?)),
            None => Err(crate::Error::Store(format!(
                "Queue slot {} is missing",
                head
            ))),
        }
    }

    /// Remove and return the value at the front of the queue, or `None` if the
    /// queue is empty.
    pub fn pop<S: Store>(&self, store: &mut S) -> Result<Option<T>> {
        let value = match self.peek(store)? {
            Some(value) => value,
            None => return Ok(None),
        };

        let head = self.head(store)?;
        store.delete(self.slot_key(head).as_slice())?;
        self.set_cursor(store, b"head", head.wrapping_add(1))?;

        Ok(Some(value))
    }
}
