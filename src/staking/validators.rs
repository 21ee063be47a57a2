//! Selection of the active validator set and the updates consensus needs to
//! move from one set to the next.
use super::Candidate;
use crate::coins::PubKey;
use crate::encoding::{Decode, Encode};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A member of the active validator set.
#[derive(Encode, Decode, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub pub_key: PubKey,
    pub power: u64,
}

/// A change to hand to consensus. A power of 0 removes the validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: PubKey,
    pub power: u64,
}

impl ValidatorUpdate {
    pub fn is_removal(&self) -> bool {
        self.power == 0
    }
}

/// Picks up to `max_validators` candidates with the most voting power,
/// ordered by power descending and then by public key. Candidates whose
/// power rounds to zero are never selected.
pub fn compute_validator_set(
    candidates: &[Candidate],
    max_validators: usize,
) -> Result<Vec<Validator>> {
    let mut eligible = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let power = candidate.voting_power.evaluate()?;
        if power > 0 {
            eligible.push((candidate, power as u64));
        }
    }

    eligible.sort_by(|(a, _), (b, _)| {
        b.voting_power
            .cmp(&a.voting_power)
            .then_with(|| a.pub_key.cmp(&b.pub_key))
    });

    Ok(eligible
        .into_iter()
        .take(max_validators)
        .map(|(candidate, power)| Validator {
            pub_key: candidate.pub_key,
            power,
        })
        .collect())
}

/// The updates which turn validator set `old` into `new`, sorted by public
/// key. Unchanged validators are omitted.
pub fn diff(old: &[Validator], new: &[Validator]) -> Vec<ValidatorUpdate> {
    let old: BTreeMap<_, _> = old.iter().map(|v| (v.pub_key, v.power)).collect();
    let new: BTreeMap<_, _> = new.iter().map(|v| (v.pub_key, v.power)).collect();

    let mut updates: BTreeMap<PubKey, u64> = BTreeMap::new();
    for pub_key in old.keys() {
        if !new.contains_key(pub_key) {
            updates.insert(*pub_key, 0);
        }
    }
    for (pub_key, power) in new.iter() {
        if old.get(pub_key) != Some(power) {
            updates.insert(*pub_key, *power);
        }
    }

    updates
        .into_iter()
        .map(|(pub_key, power)| ValidatorUpdate { pub_key, power })
        .collect()
}
