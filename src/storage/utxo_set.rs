// Global UTXO ledger and wallet reconciliation

use crate::core::{Amount, Block, Utxo, UtxoId};
use crate::storage::Blockchain;
use crate::wallet::{Address, Wallet};
use std::collections::HashSet;

/// Authoritative superset of produced UTXOs.
///
/// The consumed-id set is kept for auditing only; it does not gate
/// acceptance.
#[derive(Debug, Default)]
pub struct UtxoSet {
    utxos: Vec<Utxo>,
    consumed: HashSet<UtxoId>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn utxos(&self) -> &[Utxo] {
        &self.utxos
    }

    pub fn count(&self) -> usize {
        self.utxos.len()
    }

    pub fn contains(&self, id: &UtxoId) -> bool {
        self.utxos.iter().any(|u| &u.id == id)
    }

    pub fn is_consumed(&self, id: &UtxoId) -> bool {
        self.consumed.contains(id)
    }

    pub fn owned_by(&self, owner: &Address) -> Vec<Utxo> {
        self.utxos.iter().filter(|u| &u.owner == owner).cloned().collect()
    }

    pub fn total_value(&self) -> Amount {
        self.utxos.iter().map(|u| u.value).sum()
    }

    /// Fold a mined block into the ledger: spend inputs, add outputs and
    /// the miner's reward UTXOs
    pub fn apply_block(&mut self, block: &Block) {
        for tx in &block.transactions {
            let spent: HashSet<&UtxoId> = tx.inputs.iter().map(|u| &u.id).collect();
            for id in &spent {
                self.consumed.insert((*id).clone());
            }
            self.utxos.retain(|u| !spent.contains(&u.id));
            self.utxos.extend(tx.outputs.iter().cloned());
        }

        self.utxos.extend(Blockchain::get_utxo_reward_from(block));
    }

    /// Rebuild every wallet's owned set from the ledger
    pub fn reconcile<'a, I>(&self, wallets: I)
    where
        I: IntoIterator<Item = &'a mut Wallet>,
    {
        for wallet in wallets {
            let owned = self.owned_by(wallet.address());
            wallet.set_utxos(owned);
        }
    }

    /// Apply a freshly mined block, then recompute all wallet views
    pub fn handle_newly_mined_block<'a, I>(&mut self, block: &Block, wallets: I)
    where
        I: IntoIterator<Item = &'a mut Wallet>,
    {
        self.apply_block(block);
        self.reconcile(wallets);
        log::debug!(
            "Reconciled block {:?}: {} UTXOs, {} consumed",
            block.hash.map(|h| h.to_hex()),
            self.utxos.len(),
            self.consumed.len()
        );
    }
}
