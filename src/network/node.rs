// Simulated network node

use crate::consensus::{Miner, TransactionValidator};
use crate::core::{Block, BlockTx};
use crate::storage::{Blockchain, Mempool};
use crate::wallet::{Address, KeyPair, Wallet};
use serde::Serialize;
use std::fmt;

/// Node identity: a simulated IPv4 address string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Simulated address for the n-th node ever created
    pub fn from_index(index: u32) -> Self {
        let n = index + 1;
        Self(format!("10.{}.{}.{}", (n >> 16) & 0xff, (n >> 8) & 0xff, n & 0xff))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position in display space, used for peer selection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Network node: identity plus wallet, mempool, chain and miner
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    pub wallet: Wallet,
    pub mempool: Mempool,
    pub blockchain: Blockchain,
    pub miner: Miner,
    strict: bool,
}

impl Node {
    /// Create a new node
    pub fn new(id: NodeId, position: Position, keypair: KeyPair, strict: bool) -> Self {
        let miner = Miner::new(keypair.address.clone());
        Self {
            id,
            position,
            wallet: Wallet::new(keypair),
            mempool: Mempool::new(),
            blockchain: Blockchain::with_strict_validation(strict),
            miner,
            strict,
        }
    }

    pub fn address(&self) -> &Address {
        self.wallet.address()
    }

    /// Admit a transaction to the mempool.
    /// Returns `false` if it was already seen or fails strict validation.
    pub fn accept_tx(&mut self, tx: BlockTx) -> bool {
        if self.mempool.has_seen(&tx.hash) {
            return false;
        }

        if self.strict {
            if let Err(e) = TransactionValidator::validate(&tx) {
                log::warn!("{} rejected tx {}: {}", self.id, tx.hash, e);
                return false;
            }
        }

        self.mempool.add(tx)
    }

    /// Append a block and drop its transactions from the mempool.
    /// Returns `false` if the chain did not take it.
    pub fn accept_block(&mut self, block: &Block) -> bool {
        if !self.blockchain.add_block(block.clone()) {
            return false;
        }
        let purged = self.mempool.purge(block);
        log::debug!(
            "{} appended block at height {} ({} txs purged)",
            self.id,
            self.blockchain.height(),
            purged
        );
        true
    }
}
