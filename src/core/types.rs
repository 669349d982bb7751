// Basic types for the simulated ledger

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// 256-bit hash type (32 bytes)
/// Used for transaction hashes, block hashes and Merkle roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Create a new Hash256 from a byte array
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a Hash256 from a slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, String> {
        if slice.len() != 32 {
            return Err(format!("Invalid hash length: expected 32, got {}", slice.len()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Get the hash as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create zero hash
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Convert to hex string.
    /// Byte order is kept as computed; the proof-of-work prefix is checked
    /// against this exact string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, String> {
        let bytes = hex::decode(hex_str).map_err(|e| format!("Invalid hex string: {}", e))?;
        Self::from_slice(&bytes)
    }

    /// Whether the hex form starts with `zeros` ASCII '0' characters
    pub fn has_zero_prefix(&self, zeros: usize) -> bool {
        let hex = self.to_hex();
        zeros <= hex.len() && hex.bytes().take(zeros).all(|b| b == b'0')
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Satoshis per coin
pub const COIN: u64 = 100_000_000;

/// Monetary amount stored as integer satoshis.
/// Rendered as an 8-decimal string, e.g. `"50.00000000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_sat(sat: u64) -> Self {
        Self(sat)
    }

    pub const fn from_coins(coins: u64) -> Self {
        Self(coins * COIN)
    }

    pub fn to_sat(self) -> u64 {
        self.0
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Multiply by a rate expressed as `numerator / denominator`,
    /// rounding half-up to the satoshi.
    pub fn mul_rate(self, numerator: u64, denominator: u64) -> Amount {
        let scaled = self.0 as u128 * numerator as u128;
        let rounded = (scaled + denominator as u128 / 2) / denominator as u128;
        Amount(rounded as u64)
    }

    /// Absolute distance between two amounts
    pub fn abs_diff(self, other: Amount) -> Amount {
        Amount(self.0.abs_diff(other.0))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:08}", self.0 / COIN, self.0 % COIN)
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || frac.len() > 8 {
            return Err(format!("Invalid amount: {}", s));
        }
        let whole: u64 = whole.parse().map_err(|_| format!("Invalid amount: {}", s))?;
        let frac_sat = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<8}", frac);
            padded.parse::<u64>().map_err(|_| format!("Invalid amount: {}", s))?
        };
        whole
            .checked_mul(COIN)
            .and_then(|w| w.checked_add(frac_sat))
            .map(Amount)
            .ok_or_else(|| format!("Amount out of range: {}", s))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
