//! Delegated proof-of-stake bookkeeping: candidates, the bonds delegators
//! hold with them, delayed unbonding and commission changes, and selection
//! of the validator set.
use crate::coins::{Actor, Amount, Coin, Fraction, Pay, PubKey};
use crate::collections::Queue;
use crate::encoding::{Decode, Encode};
use crate::error::LedgerError;
use crate::store::{Read, Store};
use crate::{Error, Result};
use log::{debug, info};

mod candidate;
pub use candidate::*;

mod delegator;
pub use delegator::*;

mod entries;
pub use entries::*;

mod params;
pub use params::*;

pub mod provision;

mod tx;
pub use tx::*;

mod validators;
pub use validators::*;


const CANDIDATES_KEY: &[u8] = b"bv";
const PARAMS_KEY: &[u8] = b"params";
const GLOBAL_STATE_KEY: &[u8] = b"gs";
const VALIDATORS_KEY: &[u8] = b"vs";
const UNBOND_QUEUE_PREFIX: &[u8] = b"u/";
const COMMISSION_QUEUE_PREFIX: &[u8] = b"c/";

/// The staking ledger, reading and writing its state in `store`.
pub struct Staking<S> {
    store: S,
    unbond_queue: Queue<QueueElemUnbond>,
    commission_queue: Queue<QueueElemModComm>,
}

fn bond_key(delegator: &Actor, pub_key: &PubKey) -> Result<Vec<u8>> {
    Ok(format!("ba/{}/{}", delegator.key()?, pub_key.to_hex()).into_bytes())
}

fn delegator_candidates_key(delegator: &Actor) -> Result<Vec<u8>> {
    Ok(format!("dc/{}", delegator.key()?).into_bytes())
}

impl<S> Staking<S> {
    pub fn new(store: S) -> Self {
        Staking {
            store,
            unbond_queue: Queue::new(UNBOND_QUEUE_PREFIX),
            commission_queue: Queue::new(COMMISSION_QUEUE_PREFIX),
        }
    }
}

impl<S: Read> Staking<S> {
    fn get<T: Decode>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(T::decode(bytes.as_slice())?)),
            None => Ok(None),
        }
    }

    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.store.get(PARAMS_KEY)?.is_some())
    }

    pub fn params(&self) -> Result<Params> {
        self.get(PARAMS_KEY)?.ok_or_else(|| {
            Error::Store("Staking params have not been initialized".into())
        })
    }

    pub fn global_state(&self) -> Result<GlobalState> {
        self.get(GLOBAL_STATE_KEY)?.ok_or_else(|| {
            Error::Store("Global state has not been initialized".into())
        })
    }

    /// Every candidate ever declared, ordered by public key.
    pub fn candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.get(CANDIDATES_KEY)?.unwrap_or_default())
    }

    pub fn candidate(&self, pub_key: &PubKey) -> Result<Option<Candidate>> {
        Ok(self
            .candidates()?
            .into_iter()
            .find(|candidate| candidate.pub_key == *pub_key))
    }

    pub fn delegator_bond(
        &self,
        delegator: &Actor,
        pub_key: &PubKey,
    ) -> Result<Option<DelegatorBond>> {
        self.get(bond_key(delegator, pub_key)?.as_slice())
    }

    /// The candidates the delegator currently holds bond tokens with.
    pub fn delegator_candidates(&self, delegator: &Actor) -> Result<Vec<PubKey>> {
        Ok(self
            .get(delegator_candidates_key(delegator)?.as_slice())?
            .unwrap_or_default())
    }

    /// The validator set as of the last update.
    pub fn validator_set(&self) -> Result<Vec<Validator>> {
        Ok(self.get(VALIDATORS_KEY)?.unwrap_or_default())
    }

    pub fn pending_unbonds(&self) -> Result<u64> {
        self.unbond_queue.len(&self.store)
    }

    pub fn pending_commission_changes(&self) -> Result<u64> {
        self.commission_queue.len(&self.store)
    }
}

impl<S: Store> Staking<S> {
    fn put<T: Encode>(&mut self, key: &[u8], value: &T) -> Result<()> {
        self.store.put(key.to_vec(), value.encode()?)
    }

    /// Writes the initial params and global state.
    pub fn init(&mut self, params: &Params, state: &GlobalState) -> Result<()> {
        params.validate()?;
        self.put(PARAMS_KEY, params)?;
        self.set_global_state(state)
    }

    pub fn set_global_state(&mut self, state: &GlobalState) -> Result<()> {
        self.put(GLOBAL_STATE_KEY, state)
    }

    fn save_candidate(&mut self, candidate: Candidate) -> Result<()> {
        let mut candidates = self.candidates()?;
        match candidates.binary_search_by(|c| c.pub_key.cmp(&candidate.pub_key)) {
            Ok(index) => candidates[index] = candidate,
            Err(index) => candidates.insert(index, candidate),
        }
        self.put(CANDIDATES_KEY, &candidates)
    }

    fn save_bond(&mut self, bond: &DelegatorBond) -> Result<()> {
        let key = bond_key(&bond.delegator, &bond.candidate)?;
        let index_key = delegator_candidates_key(&bond.delegator)?;
        let mut index = self.delegator_candidates(&bond.delegator)?;

        if bond.bond_tokens == 0 {
            self.store.delete(key.as_slice())?;
            index.retain(|pub_key| *pub_key != bond.candidate);
        } else {
            self.put(key.as_slice(), bond)?;
            if let Err(position) = index.binary_search(&bond.candidate) {
                index.insert(position, bond.candidate);
            }
        }

        if index.is_empty() {
            self.store.delete(index_key.as_slice())
        } else {
            self.put(index_key.as_slice(), &index)
        }
    }

    /// Registers `pub_key` as a candidate owned by `owner` and bonds
    /// `amount` from the owner to it, returning the bond tokens issued.
    ///
    /// Declaring a key the same owner already registered bonds to the
    /// existing candidate; if that candidate is dormant its commission is
    /// replaced.
    #[allow(clippy::too_many_arguments)]
    pub fn declare_candidacy<P: Pay>(
        &mut self,
        bank: &mut P,
        params: &Params,
        state: &mut GlobalState,
        owner: &Actor,
        pub_key: PubKey,
        amount: &Coin,
        commission: Fraction,
    ) -> Result<u64> {
        validate_commission(&commission)?;
        let amount = amount.validate(&params.bond_denom)?;

        let candidate = match self.candidate(&pub_key)? {
            Some(existing) if existing.owner != *owner => {
                return Err(LedgerError::DuplicatePubKey.into())
            }
            Some(mut existing) => {
                if existing.is_dormant() {
                    existing.commission = commission;
                }
                existing
            }
            None => {
                info!("New candidate {} owned by {}", pub_key, owner);
                Candidate::new(pub_key, owner.clone(), commission)
            }
        };

        self.bond_to(bank, state, owner, candidate, amount)
    }

    /// Bonds `amount` coins from `delegator` to a candidate, returning the
    /// number of bond tokens issued.
    pub fn delegate<P: Pay>(
        &mut self,
        bank: &mut P,
        params: &Params,
        state: &mut GlobalState,
        delegator: &Actor,
        pub_key: &PubKey,
        amount: &Coin,
    ) -> Result<u64> {
        let amount = amount.validate(&params.bond_denom)?;
        let candidate = self
            .candidate(pub_key)?
            .ok_or(LedgerError::UnknownCandidate)?;

        self.bond_to(bank, state, delegator, candidate, amount)
    }

    fn bond_to<P: Pay>(
        &mut self,
        bank: &mut P,
        state: &mut GlobalState,
        delegator: &Actor,
        mut candidate: Candidate,
        amount: Amount,
    ) -> Result<u64> {
        let pub_key = candidate.pub_key;
        let issued = candidate.add_coins(amount)?;

        let mut bond = self
            .delegator_bond(delegator, &pub_key)?
            .unwrap_or_else(|| DelegatorBond::new(delegator.clone(), pub_key));
        bond.bond_tokens = bond
            .bond_tokens
            .checked_add(issued)
            .ok_or(Error::Overflow)?;
        let bonded_pool = (state.bonded_pool + amount)?;

        bank.pay(delegator, &candidate.hold_account(), amount)?;
        state.bonded_pool = bonded_pool;
        self.save_candidate(candidate)?;
        self.save_bond(&bond)?;

        debug!(
            "{} bonded {} to {} for {} tokens",
            delegator, amount, pub_key, issued
        );
        Ok(issued)
    }

    /// Redeems `tokens` of the delegator's bond tokens. Voting power drops
    /// immediately; the coins are paid out at the candidate's exchange rate
    /// once the unbonding period has passed.
    pub fn unbond(
        &mut self,
        state: &mut GlobalState,
        height: u64,
        delegator: &Actor,
        pub_key: &PubKey,
        tokens: u64,
    ) -> Result<()> {
        if tokens == 0 {
            return Err(Error::Validation("Amount must be positive".into()));
        }
        let mut bond = self
            .delegator_bond(delegator, pub_key)?
            .ok_or(LedgerError::NoSuchBond)?;
        if tokens > bond.bond_tokens {
            return Err(LedgerError::InsufficientBondTokens.into());
        }
        let mut candidate = self
            .candidate(pub_key)?
            .ok_or(LedgerError::UnknownCandidate)?;

        let value = candidate.remove_tokens(tokens)?;
        bond.bond_tokens -= tokens;
        state.bonded_pool = (state.bonded_pool - value)?;

        if candidate.is_dormant() {
            info!("Candidate {} has no bonded tokens left", pub_key);
        }
        self.save_candidate(candidate)?;
        self.save_bond(&bond)?;

        self.unbond_queue.push(
            &mut self.store,
            &QueueElemUnbond {
                elem: QueueElem::new(*pub_key, height),
                account: delegator.clone(),
                bond_tokens: tokens,
            },
        )?;

        debug!(
            "{} unbonded {} tokens ({}) from {} at height {}",
            delegator, tokens, value, pub_key, height
        );
        Ok(())
    }

    /// Schedules a new commission rate for a candidate, to take effect after
    /// the commission change period.
    pub fn modify_commission(
        &mut self,
        height: u64,
        owner: &Actor,
        pub_key: &PubKey,
        commission: Fraction,
    ) -> Result<()> {
        validate_commission(&commission)?;
        let candidate = self
            .candidate(pub_key)?
            .ok_or(LedgerError::UnknownCandidate)?;
        if candidate.owner != *owner {
            return Err(LedgerError::NotOwner.into());
        }

        self.commission_queue.push(
            &mut self.store,
            &QueueElemModComm {
                elem: QueueElem::new(*pub_key, height),
                commission,
            },
        )?;

        debug!(
            "Commission of {} will change to {} (requested at height {})",
            pub_key, commission, height
        );
        Ok(())
    }

    /// Pays out every matured unbond from the front of the queue, returning
    /// the total paid.
    pub fn process_unbond_queue<P: Pay>(
        &mut self,
        bank: &mut P,
        params: &Params,
        height: u64,
    ) -> Result<Amount> {
        let mut paid = Amount::zero();

        while let Some(entry) = self.unbond_queue.peek(&self.store)? {
            if !entry.elem.matured(height, params.period_to_unbond) {
                break;
            }

            let mut candidate = self
                .candidate(&entry.elem.candidate)?
                .ok_or(LedgerError::UnknownCandidate)?;
            let payout = candidate.pay_out(entry.bond_tokens)?;
            bank.pay(&candidate.hold_account(), &entry.account, payout)?;
            self.save_candidate(candidate)?;
            self.unbond_queue.pop(&mut self.store)?;

            debug!(
                "Paid out {} to {} for {} tokens unbonded from {}",
                payout, entry.account, entry.bond_tokens, entry.elem.candidate
            );
            paid = (paid + payout)?;
        }

        Ok(paid)
    }

    /// Applies every matured commission change from the front of the queue,
    /// returning how many were applied.
    pub fn process_commission_queue(&mut self, params: &Params, height: u64) -> Result<usize> {
        let mut applied = 0;

        while let Some(entry) = self.commission_queue.peek(&self.store)? {
            if !entry
                .elem
                .matured(height, params.period_to_modify_commission)
            {
                break;
            }

            let mut candidate = self
                .candidate(&entry.elem.candidate)?
                .ok_or(LedgerError::UnknownCandidate)?;
            candidate.commission = entry.commission;
            self.save_candidate(candidate)?;
            self.commission_queue.pop(&mut self.store)?;

            debug!(
                "Commission of {} changed to {}",
                entry.elem.candidate, entry.commission
            );
            applied += 1;
        }

        Ok(applied)
    }

    /// Recomputes the validator set from candidate voting power, persists it,
    /// and returns the updates against the previous set.
    pub fn update_validator_set(&mut self, params: &Params) -> Result<Vec<ValidatorUpdate>> {
        let candidates = self.candidates()?;
        let new_set = compute_validator_set(&candidates, params.max_validators as usize)?;
        let updates = diff(&self.validator_set()?, &new_set);

        if !updates.is_empty() {
            info!(
                "Validator set changed: {} updates, {} validators",
                updates.len(),
                new_set.len()
            );
            self.put(VALIDATORS_KEY, &new_set)?;
        }

        Ok(updates)
    }
}
