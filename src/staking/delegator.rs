use crate::coins::{Actor, PubKey};
use crate::encoding::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The bond tokens one delegator holds with one candidate.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorBond {
    pub delegator: Actor,
    pub candidate: PubKey,
    pub bond_tokens: u64,
}

impl DelegatorBond {
    pub fn new(delegator: Actor, candidate: PubKey) -> Self {
        DelegatorBond {
            delegator,
            candidate,
            bond_tokens: 0,
        }
    }
}
