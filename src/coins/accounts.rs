use super::{Actor, Amount};
use crate::encoding::{Decode, Encode};
use crate::store::{Read, Store};
use crate::{Error, Result};
use log::debug;

/// Moves coins between accounts.
pub trait Pay {
    /// Transfers `amount` from `from` to `to`, failing with
    /// [Error::Payment] if `from` does not hold enough coins.
    fn pay(&mut self, from: &Actor, to: &Actor, amount: Amount) -> Result<()>;
}

/// Coin balances of every account, kept in a store as big-endian `u64`s
/// keyed by the hex encoding of the account's actor.
pub struct Accounts<S> {
    store: S,
}

impl<S> Accounts<S> {
    pub fn new(store: S) -> Self {
        Accounts { store }
    }
}

impl<S: Read> Accounts<S> {
    pub fn balance(&self, address: &Actor) -> Result<Amount> {
        match self.store.get(address.key()?.as_bytes())? {
            Some(bytes) => Ok(Amount::decode(bytes.as_slice())?),
            None => Ok(Amount::zero()),
        }
    }
}

impl<S: Store> Accounts<S> {
    pub fn deposit(&mut self, address: &Actor, amount: Amount) -> Result<()> {
        let balance = (self.balance(address)? + amount)?;
        self.set_balance(address, balance)
    }

    pub fn withdraw(&mut self, address: &Actor, amount: Amount) -> Result<()> {
        let balance = self.balance(address)?;
        let balance = (balance - amount)
            .map_err(|_| Error::Payment(format!("Insufficient funds in {}", address)))?;
        self.set_balance(address, balance)
    }

    fn set_balance(&mut self, address: &Actor, balance: Amount) -> Result<()> {
        let key = address.key()?.into_bytes();
        if balance.is_zero() {
            self.store.delete(key.as_slice())
        } else {
            self.store.put(key, balance.encode()?)
        }
    }
}

impl<S: Store> Pay for Accounts<S> {
    fn pay(&mut self, from: &Actor, to: &Actor, amount: Amount) -> Result<()> {
        self.withdraw(from, amount)?;
        self.deposit(to, amount)?;
        debug!("Paid {} from {} to {}", amount, from, to);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MapStore;

    #[test]
    fn transfer() -> Result<()> {
        let alice = Actor::new("", "sigs", [1; 20]);
        let bob = Actor::new("", "sigs", [2; 20]);
        let mut accounts = Accounts::new(MapStore::new());

        accounts.deposit(&alice, 100.into())?;
        accounts.pay(&alice, &bob, 30.into())?;
        assert_eq!(accounts.balance(&alice)?, Amount::new(70));
        assert_eq!(accounts.balance(&bob)?, Amount::new(30));

        let err = accounts.pay(&alice, &bob, 71.into()).unwrap_err();
        assert!(matches!(err, Error::Payment(_)));
        assert_eq!(accounts.balance(&alice)?, Amount::new(70));
        assert_eq!(accounts.balance(&bob)?, Amount::new(30));

        accounts.pay(&alice, &bob, 70.into())?;
        assert_eq!(accounts.balance(&alice)?, Amount::zero());
        Ok(())
    }
}
