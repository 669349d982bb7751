// Hash primitives shared by blocks, transactions and addresses

use crate::core::Hash256;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA256(SHA256(data))
pub fn hash256(data: &[u8]) -> Hash256 {
    hash256_parts(&[data])
}

/// Double SHA256 over the concatenation of `parts`, without building the
/// joined buffer
pub fn hash256_parts(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let inner = hasher.finalize();
    Hash256::new(Sha256::digest(inner).into())
}

/// RIPEMD160(SHA256(data)), the address payload
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash256_known_vector() {
        // Double SHA256 of the empty string
        assert_eq!(
            hash256(b"").to_hex(),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_parts_match_joined_input() {
        assert_eq!(hash256_parts(&[b"utxo", b"-", b"id"]), hash256(b"utxo-id"));
        assert_ne!(hash256_parts(&[b"a", b"b"]), hash256(b"ba"));
    }

    #[test]
    fn test_hash160() {
        let hash = hash160(b"test data");
        assert_eq!(hash, hash160(b"test data"));
        assert_ne!(hash, hash160(b"test datb"));
    }
}
