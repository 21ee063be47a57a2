use crate::error::Result;
use crate::store::{BufStore, Flush, Store};

/// Runs `sm` against a buffered view of `store`, writing its changes through
/// only if it succeeds. On error nothing is written to `store`.
pub fn step_atomic<F, S, I, O>(sm: F, store: S, input: I) -> Result<O>
where
    S: Store,
    F: FnOnce(&mut BufStore<S>, I) -> Result<O>,
{
    let mut flush_store = BufStore::wrap(store);
    let res = sm(&mut flush_store, input)?;
    flush_store.flush()?;
    Ok(res)
}
