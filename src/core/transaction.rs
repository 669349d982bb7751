// Transaction data structures

use crate::core::{hash256, hash256_parts, sign_digest, Amount, Hash256};
use crate::wallet::Address;
use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque UTXO identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtxoId(pub String);

impl UtxoId {
    /// Derive an id from a unique seed and an output position
    pub fn derive(seed: &[u8], index: u32) -> Self {
        Self(hash256_parts(&[seed, &index.to_le_bytes()]).to_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unspent transaction output - an indivisible owned value record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub id: UtxoId,
    pub value: Amount,
    pub owner: Address,
}

impl Utxo {
    pub fn new(id: UtxoId, value: Amount, owner: Address) -> Self {
        Self { id, value, owner }
    }
}

/// Append a length-prefixed field to a canonical buffer
fn push_field(buf: &mut Vec<u8>, field: &str) {
    buf.extend_from_slice(&(field.len() as u32).to_le_bytes());
    buf.extend_from_slice(field.as_bytes());
}

fn push_utxos(buf: &mut Vec<u8>, utxos: &[Utxo]) {
    buf.extend_from_slice(&(utxos.len() as u32).to_le_bytes());
    for utxo in utxos {
        push_field(buf, utxo.id.as_str());
        push_field(buf, &utxo.value.to_string());
        push_field(buf, utxo.owner.as_str());
    }
}

/// Canonical encoding of the unsigned part of a transaction
fn encode_body(inputs: &[Utxo], outputs: &[Utxo], pub_key: &str, fee: Amount) -> Vec<u8> {
    let mut buf = Vec::new();
    push_utxos(&mut buf, inputs);
    push_utxos(&mut buf, outputs);
    push_field(&mut buf, pub_key);
    push_field(&mut buf, &fee.to_string());
    buf
}

/// Transaction before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreSignedTx {
    pub inputs: Vec<Utxo>,
    pub outputs: Vec<Utxo>,
    /// Hex compressed public key of the spender
    pub pub_key: String,
    pub fee: Amount,
}

impl PreSignedTx {
    /// Hash of the canonical serialization (the signed digest)
    pub fn digest(&self) -> Hash256 {
        hash256(&encode_body(&self.inputs, &self.outputs, &self.pub_key, self.fee))
    }

    /// Sign and seal into a `BlockTx`
    pub fn sign(self, secret_key: &SecretKey) -> BlockTx {
        let sig = sign_digest(secret_key, &self.digest());
        let mut tx = BlockTx {
            inputs: self.inputs,
            outputs: self.outputs,
            pub_key: self.pub_key,
            fee: self.fee,
            sig,
            hash: Hash256::zero(),
        };
        tx.hash = tx.compute_hash();
        tx
    }
}

/// Signed transaction as carried in mempools and blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTx {
    pub inputs: Vec<Utxo>,
    pub outputs: Vec<Utxo>,
    pub pub_key: String,
    pub fee: Amount,
    /// DER signature, hex
    pub sig: String,
    pub hash: Hash256,
}

impl BlockTx {
    /// Digest the signature commits to
    pub fn signing_digest(&self) -> Hash256 {
        hash256(&encode_body(&self.inputs, &self.outputs, &self.pub_key, self.fee))
    }

    /// Hash over every field except `hash` itself
    pub fn compute_hash(&self) -> Hash256 {
        let mut buf = encode_body(&self.inputs, &self.outputs, &self.pub_key, self.fee);
        push_field(&mut buf, &self.sig);
        hash256(&buf)
    }

    pub fn total_input_value(&self) -> Amount {
        self.inputs.iter().map(|u| u.value).sum()
    }

    pub fn total_output_value(&self) -> Amount {
        self.outputs.iter().map(|u| u.value).sum()
    }
}
