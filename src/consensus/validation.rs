// Transaction and block validation

use crate::core::{verify_digest, Block, BlockTx};

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Stored transaction hash does not match its contents
    InvalidHash,
    /// Signature does not verify under the embedded public key
    InvalidSignature,
    /// Public key or signature could not be decoded
    MalformedSignature(String),
    /// Inputs do not equal outputs plus fee
    ValueNotConserved,
    /// Block has not been mined
    MissingHash,
    /// Block hash doesn't match its header or lacks the difficulty prefix
    InvalidProofOfWork,
    /// Merkle root doesn't match calculated value
    InvalidMerkleRoot,
    /// `transaction_count` disagrees with the transaction list
    TransactionCountMismatch,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ValidationError::InvalidHash => write!(f, "Invalid transaction hash"),
            ValidationError::InvalidSignature => write!(f, "Invalid signature"),
            ValidationError::MalformedSignature(e) => write!(f, "Malformed signature: {}", e),
            ValidationError::ValueNotConserved => write!(f, "Inputs do not equal outputs plus fee"),
            ValidationError::MissingHash => write!(f, "Block has no hash"),
            ValidationError::InvalidProofOfWork => write!(f, "Invalid proof of work"),
            ValidationError::InvalidMerkleRoot => write!(f, "Invalid merkle root"),
            ValidationError::TransactionCountMismatch => write!(f, "Transaction count mismatch"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Transaction validator
pub struct TransactionValidator;

impl TransactionValidator {
    /// Signature verifies over the pre-signed digest
    pub fn validate_signature(tx: &BlockTx) -> bool {
        Self::check_signature(tx).is_ok()
    }

    /// Stored hash matches the transaction contents
    pub fn validate_hash(tx: &BlockTx) -> bool {
        tx.hash == tx.compute_hash()
    }

    /// Full check: hash, signature and value conservation
    pub fn validate(tx: &BlockTx) -> Result<(), ValidationError> {
        if !Self::validate_hash(tx) {
            return Err(ValidationError::InvalidHash);
        }

        Self::check_signature(tx)?;

        if tx.total_input_value() != tx.total_output_value() + tx.fee {
            return Err(ValidationError::ValueNotConserved);
        }

        Ok(())
    }

    fn check_signature(tx: &BlockTx) -> Result<(), ValidationError> {
        match verify_digest(&tx.pub_key, &tx.sig, &tx.signing_digest()) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ValidationError::InvalidSignature),
            Err(e) => Err(ValidationError::MalformedSignature(e)),
        }
    }
}

/// Block validator, used only when strict validation is enabled
pub struct BlockValidator;

impl BlockValidator {
    /// Proof-of-work: stored hash equals the header hash and carries the prefix
    pub fn validate_pow(block: &Block) -> Result<(), ValidationError> {
        let hash = block.hash.ok_or(ValidationError::MissingHash)?;

        if hash != block.header.candidate_hash() || !hash.has_zero_prefix(block.difficulty) {
            return Err(ValidationError::InvalidProofOfWork);
        }

        Ok(())
    }

    /// Validate a complete block
    pub fn validate_block(block: &Block) -> Result<(), ValidationError> {
        Self::validate_pow(block)?;

        if block.transaction_count != block.transactions.len() {
            return Err(ValidationError::TransactionCountMismatch);
        }

        if Block::calculate_merkle_root(&block.tx_hashes()) != block.header.merkle_root {
            return Err(ValidationError::InvalidMerkleRoot);
        }

        for tx in &block.transactions {
            TransactionValidator::validate(tx)?;
        }

        Ok(())
    }
}
