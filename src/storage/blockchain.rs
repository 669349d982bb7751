// Per-node block list

use crate::consensus::BlockValidator;
use crate::core::{Amount, Block, BlockTx, Hash256, Utxo, UtxoId};
use std::collections::HashSet;

/// Append-only chain of accepted blocks with hash de-duplication.
///
/// Predecessor linkage and transaction re-validation are skipped unless
/// strict validation is enabled; re-checking every transaction on every
/// node does not scale to the simulated network size.
#[derive(Debug, Default)]
pub struct Blockchain {
    blocks: Vec<Block>,
    accepted: HashSet<Hash256>,
    strict: bool,
}

impl Blockchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain that validates every block before accepting it
    pub fn with_strict_validation(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn height(&self) -> usize {
        self.blocks.len()
    }

    pub fn contains(&self, hash: &Hash256) -> bool {
        self.accepted.contains(hash)
    }

    /// Unmined block over `txs`, linked to the current tip
    pub fn create_empty_block(&self, txs: Vec<BlockTx>, difficulty: usize, timestamp: u64) -> Block {
        let previous = self.tip().and_then(|b| b.hash);
        Block::new(previous, self.blocks.len() as u64, txs, difficulty, timestamp)
    }

    /// Accept a block unless its hash was already seen.
    /// Returns `false` for duplicates, unmined blocks, and (in strict
    /// mode) blocks that fail validation.
    pub fn add_block(&mut self, block: Block) -> bool {
        let Some(hash) = block.hash else {
            log::warn!("Refusing unmined block at height {}", block.height);
            return false;
        };

        if self.accepted.contains(&hash) {
            return false;
        }

        if self.strict {
            if let Err(e) = BlockValidator::validate_block(&block) {
                log::warn!("Rejected block {}: {}", hash, e);
                return false;
            }
        }

        for existing in &mut self.blocks {
            existing.confirmations += 1;
        }

        self.accepted.insert(hash);
        self.blocks.push(block);
        true
    }

    /// Reward UTXOs for a mined block: the subsidy, plus the aggregated
    /// fees when the block carries transactions
    pub fn get_utxo_reward_from(block: &Block) -> Vec<Utxo> {
        let (Some(hash), Some(owner)) = (block.hash, block.miner_reward_address.clone()) else {
            return Vec::new();
        };

        let seed = hash.as_bytes();
        let mut rewards = vec![Utxo::new(UtxoId::derive(seed, 0), block.reward_amount, owner.clone())];

        if !block.transactions.is_empty() && block.reward_fees > Amount::ZERO {
            rewards.push(Utxo::new(UtxoId::derive(seed, 1), block.reward_fees, owner));
        }

        rewards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::Miner;
    use crate::wallet::KeyPair;

    fn mined(chain: &Blockchain, miner: &mut Miner, timestamp: u64) -> Block {
        miner.set_next_block_to_mine(chain.create_empty_block(vec![], 1, timestamp));
        loop {
            if let Some(block) = miner.mine_next_block().unwrap() {
                return block;
            }
        }
    }

    #[test]
    fn test_create_empty_block_links_tip() {
        let mut chain = Blockchain::new();
        let mut miner = Miner::new(KeyPair::generate().address);

        let first = chain.create_empty_block(vec![], 3, 0);
        assert_eq!(first.header.previous_block_hash, None);
        assert_eq!(first.reward_amount.to_string(), "50.00000000");
        assert!(first.miner_reward_address.is_none());

        let genesis = mined(&chain, &mut miner, 0);
        let genesis_hash = genesis.hash;
        assert!(chain.add_block(genesis));

        let next = chain.create_empty_block(vec![], 3, 1);
        assert_eq!(next.header.previous_block_hash, genesis_hash);
        assert_eq!(next.height, 1);
    }

    #[test]
    fn test_add_block_idempotent() {
        let mut chain = Blockchain::new();
        let mut miner = Miner::new(KeyPair::generate().address);
        let block = mined(&chain, &mut miner, 0);

        assert!(chain.add_block(block.clone()));
        assert!(!chain.add_block(block));
        assert_eq!(chain.height(), 1);
    }

    #[test]
    fn test_confirmations_increase() {
        let mut chain = Blockchain::new();
        let mut miner = Miner::new(KeyPair::generate().address);

        let first = mined(&chain, &mut miner, 0);
        assert!(chain.add_block(first));
        let second = mined(&chain, &mut miner, 1);
        assert!(chain.add_block(second));

        assert_eq!(chain.blocks()[0].confirmations, 1);
        assert_eq!(chain.blocks()[1].confirmations, 0);
    }

    #[test]
    fn test_relaxed_mode_skips_validation() {
        let mut chain = Blockchain::new();
        let mut block = Block::new(None, 0, vec![], 3, 0);
        // Not a real proof of work
        block.hash = Some(Hash256::new([0xff; 32]));
        assert!(chain.add_block(block));
    }

    #[test]
    fn test_strict_mode_rejects_bad_pow() {
        let mut chain = Blockchain::with_strict_validation(true);
        let mut block = Block::new(None, 0, vec![], 3, 0);
        block.hash = Some(Hash256::new([0xff; 32]));
        assert!(!chain.add_block(block));
        assert_eq!(chain.height(), 0);

        let mut miner = Miner::new(KeyPair::generate().address);
        let good = mined(&chain, &mut miner, 0);
        assert!(chain.add_block(good));
    }

    #[test]
    fn test_unmined_block_refused() {
        let mut chain = Blockchain::new();
        assert!(!chain.add_block(Block::new(None, 0, vec![], 3, 0)));
    }

    #[test]
    fn test_reward_without_transactions() {
        let chain = Blockchain::new();
        let mut miner = Miner::new(KeyPair::generate().address);
        let block = mined(&chain, &mut miner, 0);

        let rewards = Blockchain::get_utxo_reward_from(&block);
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].value, Amount::from_coins(50));
        assert_eq!(Some(rewards[0].owner.clone()), block.miner_reward_address);
    }
}
