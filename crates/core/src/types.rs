//! Common types

pub use rollup_merkle::Hash;

/// Account identifier (20-byte addresses are left-padded to 32)
pub type AccountId = [u8; 32];

/// Amount type (u128 for large balances)
pub type Amount = u128;

/// Seconds since the Unix epoch
pub type Timestamp = u64;

/// Parse a hex string (optionally `0x`-prefixed) into a 32-byte value.
///
/// Shorter inputs are left-padded with zeros, so a 20-byte address maps to
/// the same account id on every node.
pub fn parse_bytes32(s: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
    if bytes.len() > 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(out)
}

/// Full `0x`-prefixed hex form
pub fn to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// First four bytes in hex, for log lines
pub fn short_hex(bytes: &[u8; 32]) -> String {
    hex::encode(&bytes[..4])
}

/// Serde adapter writing an [`Amount`] as a decimal string.
///
/// JSON numbers stop being exact past `u64::MAX`, so amounts always leave as
/// strings. Plain unsigned integers are still accepted on input.
pub mod decimal {
    use std::fmt;

    use serde::{de, Deserializer, Serializer};

    use super::Amount;

    /// Write `amount` in base 10
    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    /// Read a base-10 string or an unsigned integer
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl de::Visitor<'_> for DecimalVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal string or unsigned integer up to 128 bits")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            v.parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(Amount::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
            Ok(v)
        }
    }
}
