use crate::coins::{Actor, Fraction, PubKey};
use crate::encoding::{Decode, Encode};

/// The part shared by every delayed staking action: which candidate it
/// concerns and the height at which it was requested.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq)]
pub struct QueueElem {
    pub candidate: PubKey,
    pub height_at_init: u64,
}

impl QueueElem {
    pub fn new(candidate: PubKey, height_at_init: u64) -> Self {
        QueueElem {
            candidate,
            height_at_init,
        }
    }

    /// Whether more than `period` blocks have passed since the action was
    /// requested.
    pub fn matured(&self, height: u64, period: u64) -> bool {
        height.saturating_sub(self.height_at_init) > period
    }
}

/// Bond tokens waiting out the unbonding period before they are paid out to
/// `account`.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq)]
pub struct QueueElemUnbond {
    pub elem: QueueElem,
    pub account: Actor,
    pub bond_tokens: u64,
}

/// A commission rate which takes effect once its waiting period has passed.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq)]
pub struct QueueElemModComm {
    pub elem: QueueElem,
    pub commission: Fraction,
}
