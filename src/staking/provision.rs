//! Block-by-block minting of new bonded coins.
use super::{GlobalState, Params};
use crate::coins::{Amount, Fraction};
use crate::{Error, Result};
use log::debug;

/// Average number of hours in a year, 8765.82.
pub const HOURS_PER_YEAR: Fraction = Fraction::percent(876_582);

/// Decimal places intermediate inflation values are rounded to, which keeps
/// their denominators within 64 bits.
const INFLATION_PLACES: u32 = 12;

/// The inflation rate for the next provision. It moves towards
/// `inflation_max` while less than `goal_bonded_ratio` of the supply is
/// bonded and towards `inflation_min` while more is, and always stays
/// between the two.
pub fn next_inflation(params: &Params, state: &GlobalState) -> Result<Fraction> {
    let bonded_ratio = state.bonded_ratio()?.round(INFLATION_PLACES)?;
    let shortfall = (Fraction::one() - (bonded_ratio / params.goal_bonded_ratio)?)?;
    let rate_change = (shortfall * params.inflation_rate_change)?.round(INFLATION_PLACES)?;

    let inflation = (state.inflation + rate_change)?
        .max(params.inflation_min)
        .min(params.inflation_max);
    inflation.round(INFLATION_PLACES)
}

/// Mints this block's provision into the bonded pool, returning the amount
/// minted. Provisioning twice at the same height mints nothing the second
/// time.
pub fn provision(params: &Params, state: &mut GlobalState, height: u64) -> Result<Amount> {
    if height <= state.last_provision_height {
        return Ok(Amount::zero());
    }

    let inflation = next_inflation(params, state)?;
    let supply = Fraction::try_from(state.total_supply)?;
    let minted = supply.mul_div_evaluate(inflation, HOURS_PER_YEAR)?;
    let minted = Amount::new(u64::try_from(minted).map_err(|_| Error::Overflow)?);

    state.inflation = inflation;
    state.bonded_pool = (state.bonded_pool + minted)?;
    state.total_supply = (state.total_supply + minted)?;
    state.last_provision_height = height;

    debug!(
        "Provisioned {} at height {} (inflation {})",
        minted, height, inflation
    );

    Ok(minted)
}
