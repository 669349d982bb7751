// Key management

use crate::core::hash160;
use rand::rngs::OsRng;
use rand::Rng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};

/// Human-readable prefix for simulated addresses
pub const ADDRESS_PREFIX: &str = "bc1q";

/// Wallet address, bech32-style: prefix followed by the hex pubkey hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Create address from public key hash
    pub fn from_pubkey_hash(hash: &[u8; 20]) -> Self {
        Self(format!("{}{}", ADDRESS_PREFIX, hex::encode(hash)))
    }

    /// Get address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key pair
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl KeyPair {
    /// Generate a new key pair from the OS RNG
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a new key pair from the given RNG
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let secp = Secp256k1::signing_only();
        let secret_key = SecretKey::new(rng);
        let public_key = secret_key.public_key(&secp);

        let pubkey_hash = hash160(&public_key.serialize());
        let address = Address::from_pubkey_hash(&pubkey_hash);

        Self {
            secret_key,
            public_key,
            address,
        }
    }

    /// Get public key bytes (compressed)
    pub fn pubkey_bytes(&self) -> Vec<u8> {
        self.public_key.serialize().to_vec()
    }

    /// Compressed public key, hex
    pub fn pubkey_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_keypair_generation() {
        let kp = KeyPair::generate();

        assert_eq!(kp.pubkey_bytes().len(), 33); // Compressed pubkey
        assert!(kp.address.as_str().starts_with(ADDRESS_PREFIX));
        assert_eq!(kp.address, Address::from_pubkey_hash(&hash160(&kp.pubkey_bytes())));
    }

    #[test]
    fn test_seeded_generation_is_repeatable() {
        let a = KeyPair::generate_with(&mut StdRng::seed_from_u64(7));
        let b = KeyPair::generate_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a.address, b.address);
    }

    #[test]
    fn test_address_format() {
        let hash = [0x12; 20];
        let addr = Address::from_pubkey_hash(&hash);

        assert_eq!(addr.as_str(), format!("bc1q{}", "12".repeat(20)));
        assert_eq!(addr.to_string(), addr.as_str());
    }
}
