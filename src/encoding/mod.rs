//! Deterministic binary encoding.
//!
//! Integers are fixed-length big-endian, so that every node produces the
//! same bytes for the same value.
pub use ed::*;

use crate::Error;
use derive_more::{Deref, Into};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Decodes a value which must span all of `bytes`.
pub fn decode_exact<T: Decode>(mut bytes: &[u8]) -> crate::Result<T> {
    let value = T::decode(&mut bytes)?;
    if !bytes.is_empty() {
        return Err(Error::Encoding(format!(
            "{} unexpected trailing bytes",
            bytes.len()
        )));
    }
    Ok(value)
}

/// A UTF-8 string, encoded as its byte length (a big-endian `u16`) followed
/// by its bytes.
#[derive(
    Deref, Into, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LengthString(String);

impl From<String> for LengthString {
    fn from(value: String) -> Self {
        LengthString(value)
    }
}

impl From<&str> for LengthString {
    fn from(value: &str) -> Self {
        LengthString(value.to_string())
    }
}

impl PartialEq<str> for LengthString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LengthString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for LengthString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for LengthString {
    fn encode_into<W: Write>(&self, dest: &mut W) -> ed::Result<()> {
        let length: u16 = self
            .0
            .len()
            .try_into()
            .map_err(|_| ed::Error::UnexpectedByte(0))?;
        length.encode_into(dest)?;
        dest.write_all(self.0.as_bytes())?;
        Ok(())
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(2 + self.0.len())
    }
}

impl Decode for LengthString {
    fn decode<R: Read>(mut input: R) -> ed::Result<Self> {
        let length = u16::decode(&mut input)?;
        let mut bytes = vec![0; length as usize];
        input.read_exact(bytes.as_mut_slice())?;
        let value = String::from_utf8(bytes).map_err(|_| ed::Error::UnexpectedByte(0))?;
        Ok(LengthString(value))
    }
}

impl Terminated for LengthString {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_string_layout() {
        let value: LengthString = "stake".into();
        let bytes = value.encode().unwrap();
        assert_eq!(bytes, vec![0, 5, b's', b't', b'a', b'k', b'e']);
        assert_eq!(value.encoding_length().unwrap(), bytes.len());
        assert_eq!(LengthString::decode(bytes.as_slice()).unwrap(), "stake");
    }

    #[test]
    fn length_string_rejects_invalid_utf8() {
        assert!(LengthString::decode(&[0, 2, 0xff, 0xfe][..]).is_err());
        assert!(LengthString::decode(&[0, 3, b'a'][..]).is_err());
    }

    #[derive(Encode, Decode, Debug, PartialEq)]
    struct Labeled {
        label: LengthString,
        value: u8,
    }

    #[test]
    fn length_string_is_terminated() {
        let labeled = Labeled {
            label: "ab".into(),
            value: 7,
        };
        let bytes = labeled.encode().unwrap();
        assert_eq!(bytes, vec![0, 2, b'a', b'b', 7]);
        assert_eq!(Labeled::decode(bytes.as_slice()).unwrap(), labeled);
    }

    #[test]
    fn decode_exact_rejects_trailing_bytes() {
        assert_eq!(decode_exact::<u16>(&[0, 7]).unwrap(), 7);
        assert!(decode_exact::<u16>(&[0, 7, 0]).is_err());
    }
}
