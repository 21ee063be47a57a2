use crate::encoding::{Decode, Encode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A whole, non-negative number of coins.
#[derive(
    Encode,
    Decode,
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub(crate) u64);

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Amount {
    pub const fn new(value: u64) -> Self {
        Amount(value)
    }

    pub const fn zero() -> Self {
        Amount(0)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::new(value)
    }
}

impl<I: Into<Amount>> Add<I> for Amount {
    type Output = Result<Amount>;

    fn add(self, other: I) -> Result<Amount> {
        let other = other.into();
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Amount>> Sub<I> for Amount {
    type Output = Result<Amount>;

    fn sub(self, other: I) -> Result<Amount> {
        let other = other.into();
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(Error::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops() -> Result<()> {
        let a: Amount = 2u64.into();
        assert_eq!((a + 3u64)?, Amount::new(5));
        assert_eq!((a - 2u64)?, Amount::zero());
        assert!(matches!(a - 3u64, Err(Error::Overflow)));
        assert!(matches!(Amount::new(u64::MAX) + 1u64, Err(Error::Overflow)));
        Ok(())
    }
}
