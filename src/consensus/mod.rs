// Consensus and validation logic

pub mod pow;
pub mod validation;

pub use pow::{Miner, MinerState, MiningError};
pub use validation::{BlockValidator, TransactionValidator, ValidationError};
