use crate::coins::{Actor, Adjust, Amount, Fraction, PubKey};
use crate::encoding::{Decode, Encode};
use crate::error::LedgerError;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A validator candidate and the pool of coins bonded to it.
///
/// Delegators receive bond tokens in exchange for their coins. `assets` is
/// the number of coins held for the candidate, `liabilities` the number of
/// bonded tokens outstanding and `unbonding` the number of tokens redeemed
/// but not yet paid out. A token is worth `assets / (liabilities +
/// unbonding)` coins, and only bonded tokens carry voting power.
///
/// A candidate with no bonded tokens is dormant: it keeps its record but has
/// no voting power.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub pub_key: PubKey,
    pub owner: Actor,
    pub commission: Fraction,
    pub assets: Fraction,
    pub liabilities: Fraction,
    pub unbonding: Fraction,
    pub voting_power: Fraction,
}

impl Candidate {
    pub fn new(pub_key: PubKey, owner: Actor, commission: Fraction) -> Self {
        Candidate {
            pub_key,
            owner,
            commission,
            assets: Fraction::zero(),
            liabilities: Fraction::zero(),
            unbonding: Fraction::zero(),
            voting_power: Fraction::zero(),
        }
    }

    /// Tokens which still have a claim on the candidate's assets.
    fn outstanding(&self) -> Result<Fraction> {
        self.liabilities + self.unbonding
    }

    /// Coins per bond token, 1 while no tokens are outstanding.
    pub fn exchange_rate(&self) -> Result<Fraction> {
        let outstanding = self.outstanding()?;
        if outstanding.is_zero() {
            return Ok(Fraction::one());
        }
        self.assets / outstanding
    }

    pub fn is_dormant(&self) -> bool {
        self.liabilities.is_zero()
    }

    /// The account holding this candidate's bonded coins.
    pub fn hold_account(&self) -> Actor {
        Actor::hold_account(&self.pub_key)
    }

    /// The coin value of `tokens` bond tokens at the current exchange rate.
    pub fn token_value(&self, tokens: u64) -> Result<Amount> {
        let tokens = Fraction::try_from(tokens)?;
        (tokens * self.exchange_rate()?)?.amount()
    }

    /// Adds `amount` coins to the candidate, returning the number of bond
    /// tokens issued for them.
    pub fn add_coins(&mut self, amount: Amount) -> Result<u64> {
        let coins = Fraction::try_from(amount)?;
        let issued = (coins / self.exchange_rate()?)?.floor()?;
        if issued <= 0 {
            return Err(Error::Validation(
                "Amount is too small to be issued any bond tokens".into(),
            ));
        }

        self.assets = (self.assets + coins)?;
        self.liabilities = (self.liabilities + Fraction::from(issued))?;
        self.update_voting_power()?;

        Ok(issued as u64)
    }

    /// Moves `tokens` bonded tokens to unbonding, returning their current
    /// coin value. The exchange rate is unchanged; the coins stay in the
    /// candidate's assets until [Candidate::pay_out] is called.
    pub fn remove_tokens(&mut self, tokens: u64) -> Result<Amount> {
        let redeemed = Fraction::try_from(tokens)?;
        if redeemed > self.liabilities {
            return Err(LedgerError::InsufficientBondTokens.into());
        }

        let value = self.token_value(tokens)?;
        self.liabilities = (self.liabilities - redeemed)?;
        self.unbonding = (self.unbonding + redeemed)?;
        self.update_voting_power()?;

        Ok(value)
    }

    /// Settles `tokens` unbonding tokens at the current exchange rate,
    /// returning the coins to pay out. Settling the last outstanding tokens
    /// takes all remaining assets.
    pub fn pay_out(&mut self, tokens: u64) -> Result<Amount> {
        let settled = Fraction::try_from(tokens)?;
        if settled > self.unbonding {
            return Err(LedgerError::InsufficientBondTokens.into());
        }

        let value = if settled == self.outstanding()? {
            self.assets.amount()?
        } else {
            self.token_value(tokens)?
        };

        self.unbonding = (self.unbonding - settled)?;
        self.assets = if self.outstanding()?.is_zero() {
            Fraction::zero()
        } else {
            (self.assets - Fraction::try_from(value)?)?
        };
        self.update_voting_power()?;

        Ok(value)
    }

    fn update_voting_power(&mut self) -> Result<()> {
        self.voting_power = if self.is_dormant() {
            Fraction::zero()
        } else {
            (self.liabilities * self.exchange_rate()?)?
        };
        Ok(())
    }
}

impl Adjust for Candidate {
    fn adjust(&mut self, multiplier: Fraction) -> Result<()> {
        if multiplier.is_negative() {
            return Err(Error::Validation("Multiplier may not be negative".into()));
        }
        self.assets = (self.assets * multiplier)?;
        self.update_voting_power()
    }
}
