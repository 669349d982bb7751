// Block data structures

use crate::core::{hash256, hash256_parts, Amount, BlockTx, Hash256};
use crate::wallet::Address;
use serde::{Deserialize, Serialize};

/// Fixed subsidy paid to the miner of every block
pub const BLOCK_SUBSIDY: Amount = Amount::from_coins(50);

/// Block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hash of the previous block (`None` for the first block of a chain)
    pub previous_block_hash: Option<Hash256>,
    /// Merkle root of the included transaction hashes
    pub merkle_root: Hash256,
    /// Milliseconds since simulation start
    pub timestamp: u64,
    /// Nonce for proof-of-work
    pub nonce: u64,
}

impl BlockHeader {
    pub fn new(previous_block_hash: Option<Hash256>, timestamp: u64) -> Self {
        Self {
            previous_block_hash,
            merkle_root: Hash256::zero(),
            timestamp,
            nonce: 0,
        }
    }

    /// Proof-of-work hash: H(previousHash + merkleRoot + timestamp + nonce).
    /// The previous hash is left out when there is none.
    pub fn candidate_hash(&self) -> Hash256 {
        let mut preimage = String::new();
        if let Some(prev) = &self.previous_block_hash {
            preimage.push_str(&prev.to_hex());
        }
        preimage.push_str(&self.merkle_root.to_hex());
        preimage.push_str(&self.timestamp.to_string());
        preimage.push_str(&self.nonce.to_string());
        hash256(preimage.as_bytes())
    }
}

/// Block - header, reward bookkeeping and transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Set by the miner once a valid nonce is found
    pub hash: Option<Hash256>,
    pub height: u64,
    pub header: BlockHeader,
    pub transaction_count: usize,
    /// Required number of leading '0' hex characters
    pub difficulty: usize,
    pub confirmations: u64,
    pub reward_amount: Amount,
    pub reward_fees: Amount,
    pub miner_reward_address: Option<Address>,
    pub transactions: Vec<BlockTx>,
}

impl Block {
    /// Unmined block skeleton
    pub fn new(
        previous_block_hash: Option<Hash256>,
        height: u64,
        transactions: Vec<BlockTx>,
        difficulty: usize,
        timestamp: u64,
    ) -> Self {
        let reward_fees = transactions.iter().map(|tx| tx.fee).sum();
        Self {
            hash: None,
            height,
            header: BlockHeader::new(previous_block_hash, timestamp),
            transaction_count: transactions.len(),
            difficulty,
            confirmations: 0,
            reward_amount: BLOCK_SUBSIDY,
            reward_fees,
            miner_reward_address: None,
            transactions,
        }
    }

    /// Hashes of the included transactions, in block order
    pub fn tx_hashes(&self) -> Vec<Hash256> {
        self.transactions.iter().map(|tx| tx.hash).collect()
    }

    /// Calculate Merkle root from an ordered list of transaction hashes
    pub fn calculate_merkle_root(tx_hashes: &[Hash256]) -> Hash256 {
        if tx_hashes.is_empty() {
            return Hash256::zero();
        }

        let mut hashes = tx_hashes.to_vec();

        // Build Merkle tree
        while hashes.len() > 1 {
            let mut next_level = Vec::with_capacity(hashes.len().div_ceil(2));

            for chunk in hashes.chunks(2) {
                let left = chunk[0];
                let right = if chunk.len() == 2 { chunk[1] } else { chunk[0] };

                next_level.push(hash256_parts(&[&left.as_bytes()[..], &right.as_bytes()[..]]));
            }

            hashes = next_level;
        }

        hashes[0]
    }
}
