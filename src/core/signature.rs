// ECDSA signing and verification over 32-byte digests

use crate::core::Hash256;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Sign a digest, returning the DER-encoded signature as hex
pub fn sign_digest(secret_key: &SecretKey, digest: &Hash256) -> String {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(*digest.as_bytes());
    let signature = secp.sign_ecdsa(&message, secret_key);
    hex::encode(signature.serialize_der().to_vec())
}

/// Verify a hex DER signature against a hex compressed public key.
/// Malformed keys or signatures are reported as errors, a well-formed
/// signature that does not match as `Ok(false)`.
pub fn verify_digest(pubkey_hex: &str, sig_hex: &str, digest: &Hash256) -> Result<bool, String> {
    let pubkey_bytes = hex::decode(pubkey_hex).map_err(|e| format!("Invalid public key hex: {}", e))?;
    let public_key = PublicKey::from_slice(&pubkey_bytes)
        .map_err(|e| format!("Invalid public key: {}", e))?;

    let sig_bytes = hex::decode(sig_hex).map_err(|e| format!("Invalid signature hex: {}", e))?;
    let signature = Signature::from_der(&sig_bytes)
        .map_err(|e| format!("Invalid signature: {}", e))?;

    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*digest.as_bytes());
    Ok(secp.verify_ecdsa(&message, &signature, &public_key).is_ok())
}
