// In-memory ledger state: per-node chain and mempool, global UTXO set

mod blockchain;
mod mempool;
mod utxo_set;

pub use blockchain::Blockchain;
pub use mempool::Mempool;
pub use utxo_set::UtxoSet;
