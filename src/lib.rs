//! A delegated proof-of-stake ledger and validator selection state machine.

pub mod abci;
pub mod app;
pub mod coins;
pub mod collections;
pub mod encoding;
mod error;
pub mod staking;
pub mod state_machine;
pub mod store;

pub use app::StakeApp;
pub use error::*;

/// Commonly used types.
pub mod prelude {
    pub use crate::abci::{Application, ABCIStateMachine, ABCIStore, MemStore};
    pub use crate::app::StakeApp;
    pub use crate::coins::{Accounts, Actor, Amount, Coin, Fraction, Pay, PubKey};
    pub use crate::encoding::{Decode, Encode};
    pub use crate::staking::{Candidate, DelegatorBond, Genesis, Params, Staking, Tx};
    pub use crate::store::{MapStore, Read, Store, Write};
    pub use crate::{Error, Result};
}
