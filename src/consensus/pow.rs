// Proof of Work implementation

use crate::core::Block;
use crate::wallet::Address;

/// Mining error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningError {
    /// Mining was requested before a block was assigned
    NoBlockAssigned,
}

impl std::fmt::Display for MiningError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MiningError::NoBlockAssigned => write!(f, "No block assigned to miner"),
        }
    }
}

impl std::error::Error for MiningError {}

/// Miner lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinerState {
    Idle,
    BlockAssigned,
    Searching,
    Solved,
    Abandoned,
}

/// Proof of Work miner bound to one wallet's reward address
#[derive(Debug)]
pub struct Miner {
    reward_address: Address,
    block: Option<Block>,
    state: MinerState,
    /// Nonce trials since the current block was assigned
    attempts: u64,
}

impl Miner {
    pub fn new(reward_address: Address) -> Self {
        Self {
            reward_address,
            block: None,
            state: MinerState::Idle,
            attempts: 0,
        }
    }

    pub fn state(&self) -> MinerState {
        self.state
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Block currently being searched, if any
    pub fn current_block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    /// Assign a block: compute its merkle root and reset the nonce
    pub fn set_next_block_to_mine(&mut self, mut block: Block) {
        block.header.merkle_root = Block::calculate_merkle_root(&block.tx_hashes());
        block.header.nonce = 0;
        block.hash = None;
        self.block = Some(block);
        self.attempts = 0;
        self.state = MinerState::BlockAssigned;
    }

    /// One nonce trial against the assigned block.
    /// Returns the sealed block on success, `None` while still searching.
    pub fn mine_next_block(&mut self) -> Result<Option<Block>, MiningError> {
        self.trial()
    }

    /// Like `mine_next_block`, but for a block with no predecessor
    pub fn mine_genesis_block(&mut self) -> Result<Option<Block>, MiningError> {
        let block = self.block.as_mut().ok_or(MiningError::NoBlockAssigned)?;
        block.header.previous_block_hash = None;
        self.trial()
    }

    /// Drop the assigned block without solving it
    pub fn abandon(&mut self) {
        if self.block.take().is_some() {
            self.state = MinerState::Abandoned;
        }
    }

    fn trial(&mut self) -> Result<Option<Block>, MiningError> {
        let block = self.block.as_mut().ok_or(MiningError::NoBlockAssigned)?;

        self.state = MinerState::Searching;
        self.attempts += 1;
        block.header.nonce += 1;

        let candidate = block.header.candidate_hash();
        if !candidate.has_zero_prefix(block.difficulty) {
            return Ok(None);
        }

        let mut solved = match self.block.take() {
            Some(block) => block,
            None => return Err(MiningError::NoBlockAssigned),
        };
        solved.hash = Some(candidate);
        solved.miner_reward_address = Some(self.reward_address.clone());
        self.state = MinerState::Solved;

        log::debug!(
            "Solved block {} at nonce {} after {} attempts",
            candidate,
            solved.header.nonce,
            self.attempts
        );

        Ok(Some(solved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Hash256;
    use crate::wallet::KeyPair;

    fn miner() -> Miner {
        Miner::new(KeyPair::generate().address)
    }

    fn mine_until_solved(miner: &mut Miner, genesis: bool) -> Block {
        for _ in 0..100_000 {
            let result = if genesis {
                miner.mine_genesis_block()
            } else {
                miner.mine_next_block()
            };
            if let Some(block) = result.unwrap() {
                return block;
            }
        }
        panic!("no solution within bound");
    }

    #[test]
    fn test_no_block_assigned() {
        let mut miner = miner();
        assert_eq!(miner.mine_next_block(), Err(MiningError::NoBlockAssigned));
        assert_eq!(miner.mine_genesis_block(), Err(MiningError::NoBlockAssigned));
        assert_eq!(miner.state(), MinerState::Idle);
    }

    #[test]
    fn test_genesis_difficulty_one() {
        let mut miner = miner();
        miner.set_next_block_to_mine(Block::new(None, 0, vec![], 1, 0));
        assert_eq!(miner.state(), MinerState::BlockAssigned);

        let block = mine_until_solved(&mut miner, true);
        let hash = block.hash.unwrap();
        assert!(hash.to_hex().starts_with('0'));
        assert_eq!(hash, block.header.candidate_hash());
        assert_eq!(block.header.merkle_root, Hash256::zero());
        assert_eq!(miner.state(), MinerState::Solved);
    }

    #[test]
    fn test_pow_prefix_and_reward_address() {
        let mut miner = miner();
        let reward = miner.reward_address.clone();
        miner.set_next_block_to_mine(Block::new(Some(Hash256::new([9; 32])), 1, vec![], 2, 42));

        let block = mine_until_solved(&mut miner, false);
        assert!(block.hash.unwrap().to_hex().starts_with("00"));
        assert_eq!(block.miner_reward_address, Some(reward));
        assert!(block.header.nonce >= 1);
        assert!(miner.current_block().is_none());
    }

    #[test]
    fn test_reassign_resets_nonce() {
        let mut miner = miner();
        // Difficulty 64 can never be met
        miner.set_next_block_to_mine(Block::new(None, 0, vec![], 64, 0));
        for _ in 0..10 {
            assert_eq!(miner.mine_next_block().unwrap(), None);
        }
        assert_eq!(miner.state(), MinerState::Searching);
        assert_eq!(miner.current_block().unwrap().header.nonce, 10);

        miner.set_next_block_to_mine(Block::new(None, 0, vec![], 64, 1));
        assert_eq!(miner.current_block().unwrap().header.nonce, 0);
        assert_eq!(miner.attempts(), 0);

        miner.abandon();
        assert_eq!(miner.state(), MinerState::Abandoned);
        assert!(miner.current_block().is_none());
    }
}
