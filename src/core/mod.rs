// Core ledger data structures

mod types;
mod transaction;
mod block;
mod hash;
mod signature;

pub use types::*;
pub use transaction::*;
pub use block::*;
pub use hash::*;
pub use signature::*;
