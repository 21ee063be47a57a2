use super::Fraction;
use crate::Result;

/// Scales a value by a multiplier, eg. when rewards are paid into or a
/// penalty is taken out of a pool of bonded coins.
pub trait Adjust {
    fn adjust(&mut self, multiplier: Fraction) -> Result<()>;
}
