use super::*;

/// An implementation of `Read` which is always empty. Used as the "backing
/// store" for a `BufStore` in order to create a store which only lives in
/// memory (`MapStore`).
#[derive(Default, Clone)]
pub struct Empty;

impl Read for Empty {
    #[inline]
    fn get(&self, _: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}
