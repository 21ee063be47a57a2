//! The interface between the consensus engine and the application, and an
//! in-process state machine which drives an application through blocks.
use log::{info, warn};

use crate::coins::Actor;
use crate::state_machine::step_atomic;
use crate::store::{BufStore, BufStoreMap, Flush, MapStore, Read, Store, Write};
use crate::{Error, Result};

pub use crate::staking::ValidatorUpdate;

/// Genesis document bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestInitChain {
    pub genesis: Vec<u8>,
}

/// An encoded transaction and the actors which signed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestTx {
    pub signers: Vec<Actor>,
    pub tx: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Info,
    Query(Vec<u8>),
    InitChain(RequestInitChain),
    BeginBlock(u64),
    CheckTx(RequestTx),
    DeliverTx(RequestTx),
    EndBlock(u64),
    Commit,
}

/// Outcome of checking or delivering a transaction. A non-zero code means
/// the transaction was rejected and changed nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseTx {
    pub code: u32,
    pub log: String,
    pub validator_updates: Vec<ValidatorUpdate>,
}

impl ResponseTx {
    fn rejected(err: Error) -> Self {
        ResponseTx {
            code: 1,
            log: err.to_string(),
            validator_updates: vec![],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Info { last_block_height: u64 },
    Query { value: Option<Vec<u8>>, height: u64 },
    InitChain,
    BeginBlock,
    CheckTx(ResponseTx),
    DeliverTx(ResponseTx),
    EndBlock { validator_updates: Vec<ValidatorUpdate> },
    Commit { height: u64 },
}

/// Runs an [Application] against a store, one request at a time.
///
/// Writes made while processing a block are kept in a consensus buffer and
/// only reach the store on `Commit`. `CheckTx` runs against a separate
/// mempool buffer which is discarded on every commit.
pub struct ABCIStateMachine<A: Application, S: ABCIStore> {
    app: A,
    store: S,
    mempool_state: Option<BufStoreMap>,
    consensus_state: Option<BufStoreMap>,
    height: u64,
}

impl<A: Application, S: ABCIStore> ABCIStateMachine<A, S> {
    /// Constructs an `ABCIStateMachine` from the given app (a set of handlers
    /// for transactions and blocks), and store (a key/value store to persist
    /// the state data). Blocks resume after the store's committed height.
    pub fn new(app: A, store: S) -> Result<Self> {
        let height = store.height()?;
        Ok(ABCIStateMachine {
            app,
            store,
            mempool_state: Some(Default::default()),
            consensus_state: Some(Default::default()),
            height,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Handles a single request.
    pub fn run(&mut self, req: Request) -> Result<Response> {
        match req {
            Request::Info => {
                let last_block_height = self.store.height()?;
                info!("State is at height {}", last_block_height);
                Ok(Response::Info { last_block_height })
            }
            Request::Query(key) => Ok(Response::Query {
                value: self.store.get(key.as_slice())?,
                height: self.store.height()?,
            }),
            Request::InitChain(req) => {
                let mut store =
                    BufStore::wrap_with_map(&mut self.store, take(&mut self.consensus_state)?);
                let res = step_atomic(
                    |store, req| self.app.init_chain(store, req),
                    &mut store,
                    req,
                );
                if res.is_ok() {
                    store.flush()?;
                    self.store.commit(self.height)?;
                }

                self.consensus_state.replace(Default::default());
                res?;
                Ok(Response::InitChain)
            }
            Request::BeginBlock(height) => {
                if height <= self.height {
                    return Err(Error::Validation(format!(
                        "Block height {} does not follow height {}",
                        height, self.height
                    )));
                }
                self.height = height;

                let mut store =
                    BufStore::wrap_with_map(&mut self.store, take(&mut self.consensus_state)?);
                let res = step_atomic(
                    |store, height| self.app.begin_block(store, height),
                    &mut store,
                    height,
                );
                self.consensus_state.replace(store.into_map());
                res?;
                Ok(Response::BeginBlock)
            }
            Request::DeliverTx(req) => {
                let mut store =
                    BufStore::wrap_with_map(&mut self.store, take(&mut self.consensus_state)?);
                let height = self.height;
                let res = match step_atomic(
                    |store, req| self.app.deliver_tx(store, height, req),
                    &mut store,
                    req,
                ) {
                    Ok(validator_updates) => ResponseTx {
                        validator_updates,
                        ..Default::default()
                    },
                    Err(err) => {
                        warn!("Rejected transaction: {}", err);
                        ResponseTx::rejected(err)
                    }
                };
                self.consensus_state.replace(store.into_map());
                Ok(Response::DeliverTx(res))
            }
            Request::EndBlock(height) => {
                if height != self.height {
                    return Err(Error::Validation(format!(
                        "Ending block {} while at height {}",
                        height, self.height
                    )));
                }

                let mut store =
                    BufStore::wrap_with_map(&mut self.store, take(&mut self.consensus_state)?);
                let res = step_atomic(
                    |store, height| self.app.end_block(store, height),
                    &mut store,
                    height,
                );
                self.consensus_state.replace(store.into_map());
                Ok(Response::EndBlock {
                    validator_updates: res?,
                })
            }
            Request::Commit => {
                let mut store =
                    BufStore::wrap_with_map(&mut self.store, take(&mut self.consensus_state)?);
                store.flush()?;
                self.store.commit(self.height)?;

                self.mempool_state.replace(Default::default());
                self.consensus_state.replace(Default::default());
                Ok(Response::Commit {
                    height: self.height,
                })
            }
            Request::CheckTx(req) => {
                let mut store =
                    BufStore::wrap_with_map(&mut self.store, take(&mut self.mempool_state)?);
                let res = match step_atomic(
                    |store, req| self.app.check_tx(store, req),
                    &mut store,
                    req,
                ) {
                    Ok(()) => ResponseTx::default(),
                    Err(err) => ResponseTx::rejected(err),
                };
                self.mempool_state.replace(store.into_map());
                Ok(Response::CheckTx(res))
            }
        }
    }
}

fn take(state: &mut Option<BufStoreMap>) -> Result<BufStoreMap> {
    state
        .take()
        .ok_or_else(|| Error::Store("Pending state is unavailable".into()))
}

/// An interface for handling consensus requests.
///
/// All methods have a default implementation which does nothing.
pub trait Application {
    fn init_chain<S: Store>(&self, _store: S, _req: RequestInitChain) -> Result<()> {
        Ok(())
    }

    fn begin_block<S: Store>(&self, _store: S, _height: u64) -> Result<()> {
        Ok(())
    }

    fn deliver_tx<S: Store>(
        &self,
        _store: S,
        _height: u64,
        _req: RequestTx,
    ) -> Result<Vec<ValidatorUpdate>> {
        Ok(vec![])
    }

    fn end_block<S: Store>(&self, _store: S, _height: u64) -> Result<Vec<ValidatorUpdate>> {
        Ok(vec![])
    }

    fn check_tx<S: Store>(&self, _store: S, _req: RequestTx) -> Result<()> {
        Ok(())
    }
}

/// Interface for persisting app state, as a supertrait of
/// [`Store`](../store/trait.Store.html).
pub trait ABCIStore: Store {
    fn height(&self) -> Result<u64>;

    fn commit(&mut self, height: u64) -> Result<()>;
}

/// A basic implementation of [`ABCIStore`](trait.ABCIStore.html) which persists
/// data in memory (mostly for use in testing).
#[derive(Default)]
pub struct MemStore {
    height: u64,
    store: MapStore,
}

impl MemStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Read for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.store.get(key)
    }
}

impl Write for MemStore {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.store.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.store.delete(key)
    }
}

impl ABCIStore for MemStore {
    fn height(&self) -> Result<u64> {
        Ok(self.height)
    }

    fn commit(&mut self, height: u64) -> Result<()> {
        self.height = height;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts delivered transactions, rejecting empty ones.
    struct Counter;

    impl Application for Counter {
        fn deliver_tx<S: Store>(
            &self,
            mut store: S,
            _height: u64,
            req: RequestTx,
        ) -> Result<Vec<ValidatorUpdate>> {
            let count = store.get(b"count")?.map(|v| v[0]).unwrap_or(0);
            store.put(b"count".to_vec(), vec![count + 1])?;
            if req.tx.is_empty() {
                return Err(Error::Validation("Empty transaction".into()));
            }
            Ok(vec![])
        }

        fn check_tx<S: Store>(&self, mut store: S, _req: RequestTx) -> Result<()> {
            store.put(b"checked".to_vec(), vec![1])
        }
    }

    fn tx(bytes: &[u8]) -> RequestTx {
        RequestTx {
            signers: vec![],
            tx: bytes.to_vec(),
        }
    }

    #[test]
    fn writes_reach_store_on_commit() -> Result<()> {
        let mut sm = ABCIStateMachine::new(Counter, MemStore::new())?;

        sm.run(Request::BeginBlock(1))?;
        sm.run(Request::DeliverTx(tx(&[1])))?;
        assert_eq!(sm.store().get(b"count")?, None);

        let res = sm.run(Request::DeliverTx(tx(&[])))?;
        assert!(matches!(res, Response::DeliverTx(res) if !res.is_ok()));

        sm.run(Request::EndBlock(1))?;
        assert_eq!(sm.run(Request::Commit)?, Response::Commit { height: 1 });
        assert_eq!(sm.store().get(b"count")?, Some(vec![1]));
        assert_eq!(
            sm.run(Request::Info)?,
            Response::Info {
                last_block_height: 1
            }
        );
        Ok(())
    }

    #[test]
    fn check_tx_uses_mempool_state() -> Result<()> {
        let mut sm = ABCIStateMachine::new(Counter, MemStore::new())?;
        let res = sm.run(Request::CheckTx(tx(&[1])))?;
        assert_eq!(res, Response::CheckTx(ResponseTx::default()));

        sm.run(Request::BeginBlock(1))?;
        sm.run(Request::EndBlock(1))?;
        sm.run(Request::Commit)?;
        assert_eq!(sm.store().get(b"checked")?, None);
        Ok(())
    }

    #[test]
    fn heights_must_increase() -> Result<()> {
        let mut sm = ABCIStateMachine::new(Counter, MemStore::new())?;
        sm.run(Request::BeginBlock(1))?;
        sm.run(Request::EndBlock(1))?;
        sm.run(Request::Commit)?;
        assert!(sm.run(Request::BeginBlock(1)).is_err());
        Ok(())
    }

    #[test]
    fn restart_resumes_from_committed_height() -> Result<()> {
        let mut sm = ABCIStateMachine::new(Counter, MemStore::new())?;
        sm.run(Request::BeginBlock(1))?;
        sm.run(Request::DeliverTx(tx(&[1])))?;
        sm.run(Request::EndBlock(1))?;
        sm.run(Request::Commit)?;

        let mut sm = ABCIStateMachine::new(Counter, sm.into_store())?;
        assert!(sm.run(Request::BeginBlock(1)).is_err());
        sm.run(Request::BeginBlock(2))?;
        sm.run(Request::DeliverTx(tx(&[1])))?;
        sm.run(Request::EndBlock(2))?;
        assert_eq!(sm.run(Request::Commit)?, Response::Commit { height: 2 });
        assert_eq!(sm.store().get(b"count")?, Some(vec![2]));
        Ok(())
    }

    #[test]
    fn end_block_must_match_current_height() -> Result<()> {
        let mut sm = ABCIStateMachine::new(Counter, MemStore::new())?;
        sm.run(Request::BeginBlock(1))?;
        assert!(sm.run(Request::EndBlock(3)).is_err());
        assert!(sm.run(Request::EndBlock(0)).is_err());
        sm.run(Request::EndBlock(1))?;
        assert_eq!(sm.run(Request::Commit)?, Response::Commit { height: 1 });
        Ok(())
    }
}
