// Per-node pending transaction pool

use crate::core::{Block, BlockTx, Hash256};
use std::collections::HashSet;

/// Ordered list of pending transactions.
/// `seen` remembers every hash ever admitted so a flooded transaction is
/// taken at most once per node.
#[derive(Debug, Default)]
pub struct Mempool {
    txs: Vec<BlockTx>,
    seen: HashSet<Hash256>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction. Returns `false` if its hash was already seen.
    pub fn add(&mut self, tx: BlockTx) -> bool {
        if !self.seen.insert(tx.hash) {
            return false;
        }
        self.txs.push(tx);
        true
    }

    pub fn has_seen(&self, hash: &Hash256) -> bool {
        self.seen.contains(hash)
    }

    pub fn get_all_txs(&self) -> &[BlockTx] {
        &self.txs
    }

    pub fn clear_txs(&mut self) {
        self.txs.clear();
    }

    /// Drop every pending transaction included in `block`.
    /// The hashes stay marked as seen.
    pub fn purge(&mut self, block: &Block) -> usize {
        let included: HashSet<Hash256> = block.tx_hashes().into_iter().collect();
        for hash in &included {
            self.seen.insert(*hash);
        }

        let before = self.txs.len();
        self.txs.retain(|tx| !included.contains(&tx.hash));
        before - self.txs.len()
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Amount, Utxo, UtxoId};
    use crate::wallet::{KeyPair, Wallet};

    fn txs(count: usize) -> Vec<BlockTx> {
        let mut wallet = Wallet::new(KeyPair::generate());
        let funding = (0..count as u32)
            .map(|i| Utxo::new(UtxoId::derive(b"m", i), Amount::from_coins(1), wallet.address().clone()))
            .collect();
        wallet.set_utxos(funding);
        let to = KeyPair::generate().address;
        (0..count)
            .map(|_| wallet.create_tx(Amount::from_sat(10_000_000), &to).unwrap())
            .collect()
    }

    #[test]
    fn test_add_and_dedup() {
        let mut pool = Mempool::new();
        let tx = txs(1).remove(0);

        assert!(pool.add(tx.clone()));
        assert!(!pool.add(tx));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_order_preserved() {
        let mut pool = Mempool::new();
        let batch = txs(3);
        for tx in &batch {
            pool.add(tx.clone());
        }
        let hashes: Vec<_> = pool.get_all_txs().iter().map(|t| t.hash).collect();
        let expected: Vec<_> = batch.iter().map(|t| t.hash).collect();
        assert_eq!(hashes, expected);
    }

    #[test]
    fn test_purge_by_block() {
        let mut pool = Mempool::new();
        let batch = txs(3);
        for tx in &batch {
            pool.add(tx.clone());
        }

        let block = Block::new(None, 0, vec![batch[0].clone(), batch[2].clone()], 1, 0);
        assert_eq!(pool.purge(&block), 2);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get_all_txs()[0].hash, batch[1].hash);

        // Purged transactions are not re-admitted
        assert!(!pool.add(batch[0].clone()));
    }

    #[test]
    fn test_purge_marks_unseen_as_seen() {
        let mut pool = Mempool::new();
        let batch = txs(1);
        let block = Block::new(None, 0, batch.clone(), 1, 0);
        assert_eq!(pool.purge(&block), 0);
        assert!(pool.has_seen(&batch[0].hash));
    }

    #[test]
    fn test_clear() {
        let mut pool = Mempool::new();
        for tx in txs(2) {
            pool.add(tx);
        }
        pool.clear_txs();
        assert!(pool.is_empty());
    }
}
