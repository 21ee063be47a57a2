//! The staking application: routes transactions to the ledger and runs the
//! per-block work of paying out unbonds, applying commission changes,
//! provisioning and updating the validator set.
use log::{debug, info};

use crate::abci::{Application, RequestInitChain, RequestTx, ValidatorUpdate};
use crate::coins::{Accounts, Actor};
use crate::encoding::decode_exact;
use crate::staking::provision::provision;
use crate::staking::{Genesis, Params, Staking, Tx};
use crate::state_machine::step_atomic;
use crate::store::{Prefixed, Read, Shared, Store};
use crate::{Error, Result};

/// Key prefix of the staking ledger's state.
pub const STAKE_PREFIX: &[u8] = b"stake/";
/// Key prefix of account balances.
pub const ACCOUNTS_PREFIX: &[u8] = b"acc/";

type Ledger<S> = Staking<Prefixed<Shared<S>>>;
type Bank<S> = Accounts<Prefixed<Shared<S>>>;

/// Hands `op` the staking ledger and the accounts bank, both backed by
/// `store` under their own prefixes.
fn with_ledger<S, T, F>(store: S, op: F) -> Result<T>
where
    S: Store,
    F: FnOnce(&mut Ledger<S>, &mut Bank<S>) -> Result<T>,
{
    let shared = Shared::new(store);
    let mut staking = Staking::new(shared.clone().prefix(STAKE_PREFIX));
    let mut accounts = Accounts::new(shared.prefix(ACCOUNTS_PREFIX));
    op(&mut staking, &mut accounts)
}

/// Transactions must be signed by exactly one non-empty actor.
fn single_signer(signers: &[Actor]) -> Result<&Actor> {
    match signers {
        [signer] if !signer.is_empty() => Ok(signer),
        [_] => Err(Error::Validation("Signer has an empty address".into())),
        _ => Err(Error::Validation(format!(
            "Expected exactly one signer, got {}",
            signers.len()
        ))),
    }
}

fn check<'a>(params: &Params, signers: &'a [Actor], tx: &Tx) -> Result<&'a Actor> {
    let signer = single_signer(signers)?;
    tx.validate(params)?;
    Ok(signer)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StakeApp;

impl StakeApp {
    /// Read access to the staking ledger kept in `store`.
    pub fn staking<S: Read>(store: S) -> Staking<Prefixed<S>> {
        Staking::new(store.prefix(STAKE_PREFIX))
    }

    /// Read access to the account balances kept in `store`.
    pub fn accounts<S: Read>(store: S) -> Accounts<Prefixed<S>> {
        Accounts::new(store.prefix(ACCOUNTS_PREFIX))
    }

    /// Writes the genesis params, global state and account balances.
    pub fn init<S: Store>(&self, store: S, genesis: &Genesis) -> Result<()> {
        genesis.validate()?;

        step_atomic(
            |store, genesis: &Genesis| {
                with_ledger(store, |staking, accounts| {
                    if staking.is_initialized()? {
                        return Err(Error::Validation("Chain is already initialized".into()));
                    }

                    let state = genesis.global_state()?;
                    staking.init(&genesis.params, &state)?;
                    for account in genesis.accounts.iter() {
                        accounts.deposit(&account.address, account.balance)?;
                    }

                    info!(
                        "Initialized chain with {} accounts and a supply of {}",
                        genesis.accounts.len(),
                        state.total_supply
                    );
                    Ok(())
                })
            },
            store,
            genesis,
        )
    }

    /// Checks a transaction without reading the ledger or changing anything.
    pub fn check<S: Read>(&self, store: S, signers: &[Actor], tx: &Tx) -> Result<()> {
        let params = Self::staking(store).params()?;
        check(&params, signers, tx)?;
        Ok(())
    }

    /// Applies a transaction at `height`. Matured unbonds and commission
    /// changes are processed first; the validator set updates caused by the
    /// transaction are returned.
    pub fn deliver<S: Store>(
        &self,
        store: S,
        height: u64,
        signers: &[Actor],
        tx: &Tx,
    ) -> Result<Vec<ValidatorUpdate>> {
        step_atomic(
            |store, tx: &Tx| {
                with_ledger(store, |staking, accounts| {
                    let params = staking.params()?;
                    let sender = check(&params, signers, tx)?;
                    let mut state = staking.global_state()?;

                    staking.process_unbond_queue(accounts, &params, height)?;
                    staking.process_commission_queue(&params, height)?;

                    debug!("Delivering {:?} from {} at height {}", tx, sender, height);
                    match tx {
                        Tx::Bond { candidate, amount } => {
                            staking.delegate(
                                accounts, &params, &mut state, sender, candidate, amount,
                            )?;
                        }
                        Tx::Unbond { candidate, amount } => {
                            staking.unbond(&mut state, height, sender, candidate, *amount)?;
                        }
                        Tx::Nominate {
                            candidate,
                            amount,
                            commission,
                        } => {
                            staking.declare_candidacy(
                                accounts,
                                &params,
                                &mut state,
                                sender,
                                *candidate,
                                amount,
                                *commission,
                            )?;
                        }
                        Tx::ModifyCommission {
                            candidate,
                            commission,
                        } => {
                            staking.modify_commission(height, sender, candidate, *commission)?;
                        }
                    }

                    staking.set_global_state(&state)?;
                    staking.update_validator_set(&params)
                })
            },
            store,
            tx,
        )
    }

    /// Runs the once-per-block work at `height`, returning the validator set
    /// updates.
    pub fn tick<S: Store>(&self, store: S, height: u64) -> Result<Vec<ValidatorUpdate>> {
        step_atomic(
            |store, height| {
                with_ledger(store, |staking, accounts| {
                    let params = staking.params()?;
                    let mut state = staking.global_state()?;

                    let paid = staking.process_unbond_queue(accounts, &params, height)?;
                    let applied = staking.process_commission_queue(&params, height)?;
                    let minted = provision(&params, &mut state, height)?;
                    staking.set_global_state(&state)?;

                    debug!(
                        "Height {}: paid out {}, applied {} commission changes, minted {}",
                        height, paid, applied, minted
                    );
                    staking.update_validator_set(&params)
                })
            },
            store,
            height,
        )
    }
}

impl Application for StakeApp {
    fn init_chain<S: Store>(&self, store: S, req: RequestInitChain) -> Result<()> {
        let genesis = Genesis::from_json(req.genesis.as_slice())?;
        self.init(store, &genesis)
    }

    fn check_tx<S: Store>(&self, store: S, req: RequestTx) -> Result<()> {
        let tx: Tx = decode_exact(req.tx.as_slice())?;
        self.check(store, req.signers.as_slice(), &tx)
    }

    fn deliver_tx<S: Store>(
        &self,
        store: S,
        height: u64,
        req: RequestTx,
    ) -> Result<Vec<ValidatorUpdate>> {
        let tx: Tx = decode_exact(req.tx.as_slice())?;
        self.deliver(store, height, req.signers.as_slice(), &tx)
    }

    fn end_block<S: Store>(&self, store: S, height: u64) -> Result<Vec<ValidatorUpdate>> {
        self.tick(store, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_count() {
        let alice = Actor::new("", "sigs", [1; 20]);
        let bob = Actor::new("", "sigs", [2; 20]);
        let empty = Actor::new("", "sigs", [0; 20]);

        assert_eq!(single_signer(&[alice.clone()]).unwrap(), &alice);
        assert!(single_signer(&[]).is_err());
        assert!(single_signer(&[alice, bob]).is_err());
        assert!(single_signer(&[empty]).is_err());
    }
}
