use crate::coins::{Actor, Amount, Fraction};
use crate::encoding::{Decode, Encode, LengthString};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BOND_DENOM: &str = "fermion";

/// Chain-wide staking parameters.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub max_validators: u16,
    /// Blocks an unbond waits before it is paid out.
    pub period_to_unbond: u64,
    /// Blocks a commission change waits before it takes effect.
    pub period_to_modify_commission: u64,
    pub bond_denom: LengthString,
    pub inflation_min: Fraction,
    pub inflation_max: Fraction,
    /// Yearly change of the inflation rate when the bonded ratio is zero.
    pub inflation_rate_change: Fraction,
    pub goal_bonded_ratio: Fraction,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            max_validators: 100,
            period_to_unbond: 30,
            period_to_modify_commission: 30,
            bond_denom: DEFAULT_BOND_DENOM.into(),
            inflation_min: Fraction::percent(7),
            inflation_max: Fraction::percent(20),
            inflation_rate_change: Fraction::percent(13),
            goal_bonded_ratio: Fraction::percent(67),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::Validation(msg.to_string()));

        if self.max_validators == 0 {
            return invalid("max_validators must be at least 1");
        }
        if self.bond_denom.is_empty() {
            return invalid("bond_denom must not be empty");
        }
        if self.inflation_min.is_negative() || self.inflation_max.is_negative() {
            return invalid("Inflation bounds must not be negative");
        }
        if self.inflation_min > self.inflation_max {
            return invalid("inflation_min must not exceed inflation_max");
        }
        if self.inflation_rate_change.is_negative() {
            return invalid("inflation_rate_change must not be negative");
        }
        if self.goal_bonded_ratio <= Fraction::zero() || self.goal_bonded_ratio > Fraction::one()
        {
            return invalid("goal_bonded_ratio must lie in (0, 1]");
        }

        Ok(())
    }
}

/// Aggregate coin supply and inflation state, updated by bonding and by
/// provisioning.
#[derive(Encode, Decode, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    pub total_supply: Amount,
    pub bonded_pool: Amount,
    pub inflation: Fraction,
    pub last_provision_height: u64,
}

impl GlobalState {
    pub fn new(total_supply: Amount, inflation: Fraction) -> Self {
        GlobalState {
            total_supply,
            inflation,
            ..Default::default()
        }
    }

    /// Fraction of the total supply which is bonded, 0 when there is no
    /// supply.
    pub fn bonded_ratio(&self) -> Result<Fraction> {
        if self.total_supply.is_zero() {
            return Ok(Fraction::zero());
        }
        Fraction::try_from(self.bonded_pool)? / Fraction::try_from(self.total_supply)?
    }
}

/// An initial account balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Actor,
    pub balance: Amount,
}

/// The JSON document a chain starts from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    #[serde(default)]
    pub params: Params,
    /// Starting inflation rate, `inflation_min` if absent.
    #[serde(default)]
    pub inflation: Option<Fraction>,
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
}

impl Genesis {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let genesis: Genesis = serde_json::from_slice(bytes)?;
        genesis.validate()?;
        Ok(genesis)
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        let inflation = self.initial_inflation();
        if inflation < self.params.inflation_min || inflation > self.params.inflation_max {
            return Err(Error::Validation(
                "Initial inflation must lie between inflation_min and inflation_max".into(),
            ));
        }
        for account in self.accounts.iter() {
            if account.address.is_empty() {
                return Err(Error::Validation("Genesis account has an empty address".into()));
            }
        }
        Ok(())
    }

    pub fn initial_inflation(&self) -> Fraction {
        self.inflation.unwrap_or(self.params.inflation_min)
    }

    /// The global state implied by the genesis accounts, with nothing bonded.
    pub fn global_state(&self) -> Result<GlobalState> {
        let mut total_supply = Amount::zero();
        for account in self.accounts.iter() {
            total_supply = (total_supply + account.balance)?;
        }
        Ok(GlobalState::new(total_supply, self.initial_inflation()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let params = Params::default();
        params.validate().unwrap();
        assert_eq!(params.max_validators, 100);
        assert_eq!(params.bond_denom, "fermion");
        assert_eq!(params.inflation_min, Fraction::new(7, 100).unwrap());
        assert_eq!(params.goal_bonded_ratio, Fraction::new(67, 100).unwrap());
    }

    #[test]
    fn invalid_params() {
        let check = |f: fn(&mut Params)| {
            let mut params = Params::default();
            f(&mut params);
            assert!(matches!(params.validate(), Err(Error::Validation(_))));
        };

        check(|p| p.max_validators = 0);
        check(|p| p.bond_denom = LengthString::default());
        check(|p| p.inflation_min = Fraction::new(21, 100).unwrap());
        check(|p| p.goal_bonded_ratio = Fraction::zero());
        check(|p| p.goal_bonded_ratio = Fraction::new(3, 2).unwrap());
    }

    #[test]
    fn params_encoding() -> Result<()> {
        let params = Params::default();
        let bytes = params.encode()?;
        assert_eq!(bytes.len(), params.encoding_length()?);
        assert_eq!(Params::decode(bytes.as_slice())?, params);
        Ok(())
    }

    #[test]
    fn genesis_json() -> Result<()> {
        let json = br#"{
            "params": { "max_validators": 4, "inflation_max": "0.25" },
            "accounts": [
                {
                    "address": { "chain": "", "app": "sigs", "address": "0101010101010101010101010101010101010101" },
                    "balance": 1000
                },
                {
                    "address": { "chain": "", "app": "sigs", "address": "0202020202020202020202020202020202020202" },
                    "balance": 500
                }
            ]
        }"#;

        let genesis = Genesis::from_json(json)?;
        assert_eq!(genesis.params.max_validators, 4);
        assert_eq!(genesis.params.period_to_unbond, 30);
        assert_eq!(genesis.params.inflation_max, Fraction::new(1, 4)?);

        let state = genesis.global_state()?;
        assert_eq!(state.total_supply, Amount::new(1500));
        assert_eq!(state.bonded_pool, Amount::zero());
        assert_eq!(state.inflation, Fraction::new(7, 100)?);
        Ok(())
    }

    #[test]
    fn genesis_rejects_out_of_range_inflation() {
        let json = br#"{ "inflation": "0.5" }"#;
        assert!(matches!(
            Genesis::from_json(json),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn bonded_ratio() -> Result<()> {
        let mut state = GlobalState::new(Amount::new(200), Fraction::zero());
        assert_eq!(state.bonded_ratio()?, Fraction::zero());
        state.bonded_pool = Amount::new(50);
        assert_eq!(state.bonded_ratio()?, Fraction::new(1, 4)?);
        assert_eq!(GlobalState::default().bonded_ratio()?, Fraction::zero());
        Ok(())
    }
}
