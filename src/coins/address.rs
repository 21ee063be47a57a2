use super::Amount;
use crate::encoding::{Decode, Encode, LengthString};
use crate::{Error, Result};
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Name of the app which owns candidate hold accounts.
pub const STAKE_APP: &str = "stake";

/// An opaque account identity: the chain and app which own the account, and
/// its 20-byte address.
#[derive(
    Encode, Decode, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Actor {
    pub chain: LengthString,
    pub app: LengthString,
    #[serde(with = "hex_bytes")]
    pub address: [u8; 20],
}

impl Actor {
    pub fn new<C: Into<String>, A: Into<String>>(chain: C, app: A, address: [u8; 20]) -> Self {
        Actor {
            chain: chain.into().into(),
            app: app.into().into(),
            address,
        }
    }

    /// The account which holds the coins bonded to the given candidate.
    pub fn hold_account(pub_key: &PubKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"hold");
        hasher.update(pub_key.as_bytes());
        let hash = hasher.finalize();

        let mut address = [0; 20];
        address.copy_from_slice(&hash[..20]);
        Actor::new("", STAKE_APP, address)
    }

    /// Hex form of the actor's encoding, used as a store key segment.
    pub fn key(&self) -> Result<String> {
        Ok(hex::encode(self.encode()?))
    }

    pub fn is_empty(&self) -> bool {
        self.address == [0; 20]
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.chain, self.app, hex::encode(self.address))
    }
}

/// A candidate's ed25519 consensus public key. Ordered by its bytes.
#[derive(
    Encode, Decode, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PubKey(#[serde(with = "hex_bytes")] [u8; 32]);

impl PubKey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        PubKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Checks that the key is non-empty and decodes to a point on the
    /// curve.
    pub fn validate(&self) -> Result<()> {
        if self.0 == [0; 32] {
            return Err(Error::Validation("Empty candidate public key".into()));
        }
        VerifyingKey::from_bytes(&self.0)
            .map_err(|_| Error::Validation("Invalid candidate public key".into()))?;
        Ok(())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<VerifyingKey> for PubKey {
    fn from(key: VerifyingKey) -> Self {
        PubKey(key.to_bytes())
    }
}

impl std::fmt::Display for PubKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PubKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::Validation("Invalid hex".into()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Validation("Public key must be 32 bytes".into()))?;
        Ok(PubKey(bytes))
    }
}

/// A signed quantity of a named denomination, as carried by transactions.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: LengthString,
    pub amount: i64,
}

impl Coin {
    pub fn new<D: Into<String>>(denom: D, amount: i64) -> Self {
        Coin {
            denom: denom.into().into(),
            amount,
        }
    }

    /// Checks that the coin is positive and of the expected denomination,
    /// returning its amount.
    pub fn validate(&self, denom: &str) -> Result<Amount> {
        if self.amount <= 0 {
            return Err(Error::Validation("Amount must be positive".into()));
        }
        if self.denom != denom {
            return Err(Error::Validation(format!(
                "Invalid denomination {:?}, expected {:?}",
                self.denom.as_str(),
                denom
            )));
        }
        Ok(Amount::new(self.amount as u64))
    }
}

mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> std::result::Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom(format!("expected {} bytes", N)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    #[test]
    fn hold_account_is_deterministic() {
        let pub_key: PubKey = SigningKey::from_bytes(&[7; 32]).verifying_key().into();
        let a = Actor::hold_account(&pub_key);
        let b = Actor::hold_account(&pub_key);
        assert_eq!(a, b);
        assert_eq!(a.app, STAKE_APP);

        let other: PubKey = SigningKey::from_bytes(&[8; 32]).verifying_key().into();
        assert_ne!(a, Actor::hold_account(&other));
    }

    #[test]
    fn validate_pub_key() {
        let pub_key: PubKey = SigningKey::from_bytes(&[7; 32]).verifying_key().into();
        pub_key.validate().unwrap();
        assert!(PubKey::new([0; 32]).validate().is_err());
    }

    #[test]
    fn actor_encoding() {
        let actor = Actor::new("chain", "sigs", [3; 20]);
        let bytes = actor.encode().unwrap();
        assert_eq!(bytes.len(), actor.encoding_length().unwrap());
        assert_eq!(Actor::decode(bytes.as_slice()).unwrap(), actor);
        assert_eq!(actor.key().unwrap(), hex::encode(bytes));
    }

    #[test]
    fn actor_json() {
        let actor = Actor::new("", "sigs", [0xab; 20]);
        let json = serde_json::to_string(&actor).unwrap();
        assert!(json.contains(&"ab".repeat(20)));
        let parsed: Actor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, actor);
    }

    #[test]
    fn coin_validation() {
        let coin = Coin::new("fermion", 10);
        assert_eq!(coin.validate("fermion").unwrap().value(), 10);
        assert!(coin.validate("atom").is_err());
        assert!(Coin::new("fermion", 0).validate("fermion").is_err());
        assert!(Coin::new("fermion", -5).validate("fermion").is_err());
    }
}
