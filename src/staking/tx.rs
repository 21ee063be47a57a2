use super::Params;
use crate::coins::{Coin, Fraction, PubKey};
use crate::encoding::{Decode, Encode};
use crate::{Error, Result};

const BOND: u8 = 0x55;
const UNBOND: u8 = 0x56;
const NOMINATE: u8 = 0x57;
const MODIFY_COMMISSION: u8 = 0x58;

/// A staking transaction. The wire form is one discriminant byte followed by
/// the variant's fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tx {
    /// Delegates coins to a candidate.
    Bond { candidate: PubKey, amount: Coin },
    /// Redeems bond tokens, paid out after the unbonding period.
    Unbond { candidate: PubKey, amount: u64 },
    /// Declares a new candidate, bonding an initial stake from its owner.
    Nominate {
        candidate: PubKey,
        amount: Coin,
        commission: Fraction,
    },
    /// Schedules a change of a candidate's commission rate.
    ModifyCommission {
        candidate: PubKey,
        commission: Fraction,
    },
}

impl Tx {
    pub fn candidate(&self) -> &PubKey {
        match self {
            Tx::Bond { candidate, .. }
            | Tx::Unbond { candidate, .. }
            | Tx::Nominate { candidate, .. }
            | Tx::ModifyCommission { candidate, .. } => candidate,
        }
    }

    /// Structural checks which need no ledger state.
    pub fn validate(&self, params: &Params) -> Result<()> {
        self.candidate().validate()?;

        match self {
            Tx::Bond { amount, .. } => {
                amount.validate(&params.bond_denom)?;
            }
            Tx::Unbond { amount, .. } => {
                if *amount == 0 {
                    return Err(Error::Validation("Amount must be positive".into()));
                }
            }
            Tx::Nominate {
                amount, commission, ..
            } => {
                amount.validate(&params.bond_denom)?;
                validate_commission(commission)?;
            }
            Tx::ModifyCommission { commission, .. } => {
                validate_commission(commission)?;
            }
        }

        Ok(())
    }
}

/// Commission rates must lie in [0, 1].
pub fn validate_commission(commission: &Fraction) -> Result<()> {
    if *commission < Fraction::zero() || *commission > Fraction::one() {
        return Err(Error::Validation(format!(
            "Commission {} must lie between 0 and 1",
            commission
        )));
    }
    Ok(())
}

impl Encode for Tx {
    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        match self {
            Tx::Bond { candidate, amount } => {
                BOND.encode_into(dest)?;
                candidate.encode_into(dest)?;
                amount.encode_into(dest)
            }
            Tx::Unbond { candidate, amount } => {
                UNBOND.encode_into(dest)?;
                candidate.encode_into(dest)?;
                amount.encode_into(dest)
            }
            Tx::Nominate {
                candidate,
                amount,
                commission,
            } => {
                NOMINATE.encode_into(dest)?;
                candidate.encode_into(dest)?;
                amount.encode_into(dest)?;
                commission.encode_into(dest)
            }
            Tx::ModifyCommission {
                candidate,
                commission,
            } => {
                MODIFY_COMMISSION.encode_into(dest)?;
                candidate.encode_into(dest)?;
                commission.encode_into(dest)
            }
        }
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        let fields = match self {
            Tx::Bond { amount, .. } => 32 + amount.encoding_length()?,
            Tx::Unbond { .. } => 32 + 8,
            Tx::Nominate {
                amount, commission, ..
            } => 32 + amount.encoding_length()? + commission.encoding_length()?,
            Tx::ModifyCommission { commission, .. } => 32 + commission.encoding_length()?,
        };
        Ok(1 + fields)
    }
}

impl Decode for Tx {
    fn decode<R: std::io::Read>(mut input: R) -> ed::Result<Self> {
        let tx = match u8::decode(&mut input)? {
            BOND => Tx::Bond {
                candidate: PubKey::decode(&mut input)?,
                amount: Coin::decode(&mut input)?,
            },
            UNBOND => Tx::Unbond {
                candidate: PubKey::decode(&mut input)?,
                amount: u64::decode(&mut input)?,
            },
            NOMINATE => Tx::Nominate {
                candidate: PubKey::decode(&mut input)?,
                amount: Coin::decode(&mut input)?,
                commission: Fraction::decode(&mut input)?,
            },
            MODIFY_COMMISSION => Tx::ModifyCommission {
                candidate: PubKey::decode(&mut input)?,
                commission: Fraction::decode(&mut input)?,
            },
            other => return Err(ed::Error::UnexpectedByte(other)),
        };
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::decode_exact;
    use ed25519_dalek::SigningKey;

    fn pub_key() -> PubKey {
        SigningKey::from_bytes(&[3; 32]).verifying_key().into()
    }

    #[test]
    fn wire_format() -> Result<()> {
        let tx = Tx::Unbond {
            candidate: pub_key(),
            amount: 5,
        };
        let bytes = tx.encode()?;
        assert_eq!(bytes.len(), tx.encoding_length()?);
        assert_eq!(bytes[0], 0x56);
        assert_eq!(&bytes[1..33], pub_key().as_bytes());
        assert_eq!(&bytes[33..], &[0, 0, 0, 0, 0, 0, 0, 5]);
        assert_eq!(decode_exact::<Tx>(&bytes)?, tx);
        Ok(())
    }

    #[test]
    fn every_variant_decodes() -> Result<()> {
        let txs = vec![
            Tx::Bond {
                candidate: pub_key(),
                amount: Coin::new("fermion", 10),
            },
            Tx::Nominate {
                candidate: pub_key(),
                amount: Coin::new("fermion", 10),
                commission: Fraction::new(1, 10)?,
            },
            Tx::ModifyCommission {
                candidate: pub_key(),
                commission: Fraction::new(1, 5)?,
            },
        ];
        for tx in txs {
            let bytes = tx.encode()?;
            assert_eq!(bytes.len(), tx.encoding_length()?);
            assert_eq!(decode_exact::<Tx>(&bytes)?, tx);
        }
        Ok(())
    }

    #[test]
    fn rejects_unknown_and_trailing_bytes() -> Result<()> {
        assert!(matches!(
            decode_exact::<Tx>(&[0x99]),
            Err(Error::Ed(ed::Error::UnexpectedByte(0x99)))
        ));

        let mut bytes = Tx::Unbond {
            candidate: pub_key(),
            amount: 5,
        }
        .encode()?;
        bytes.push(0);
        assert!(decode_exact::<Tx>(&bytes).is_err());
        Ok(())
    }

    #[test]
    fn validation() -> Result<()> {
        let params = Params::default();
        let bond = |amount: Coin| Tx::Bond {
            candidate: pub_key(),
            amount,
        };
        bond(Coin::new("fermion", 1)).validate(&params)?;
        assert!(bond(Coin::new("fermion", 0)).validate(&params).is_err());
        assert!(bond(Coin::new("atom", 5)).validate(&params).is_err());

        let unbond = Tx::Unbond {
            candidate: pub_key(),
            amount: 0,
        };
        assert!(unbond.validate(&params).is_err());

        let commission = |commission: Fraction| Tx::ModifyCommission {
            candidate: pub_key(),
            commission,
        };
        commission(Fraction::one()).validate(&params)?;
        commission(Fraction::zero()).validate(&params)?;
        assert!(commission(Fraction::new(11, 10)?).validate(&params).is_err());
        assert!(commission(Fraction::new(-1, 10)?).validate(&params).is_err());

        let empty_key = Tx::ModifyCommission {
            candidate: PubKey::new([0; 32]),
            commission: Fraction::zero(),
        };
        assert!(empty_key.validate(&params).is_err());
        Ok(())
    }
}
