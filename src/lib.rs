// Miniature UTXO network simulation
// Nodes with wallets, mempools, chains and miners, flooding over a peer graph

pub mod core;
pub mod consensus;
pub mod storage;
pub mod network;
pub mod wallet;
pub mod sim;
pub mod cli;

// Re-exports for convenience
pub use self::core::{Amount, Block, BlockHeader, BlockTx, Hash256, PreSignedTx, Utxo, UtxoId};
pub use consensus::{BlockValidator, Miner, MinerState, MiningError, TransactionValidator, ValidationError};
pub use storage::{Blockchain, Mempool, UtxoSet};
pub use network::{Command, ConnectionGraph, Envelope, Event, Node, NodeId, Payload, PayloadKind, Propagation};
pub use wallet::{Address, KeyPair, Wallet, WalletError};
pub use sim::{MiningScheduler, SimConfig, Simulation};
pub use cli::Cli;
