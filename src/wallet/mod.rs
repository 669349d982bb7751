// Wallet keys and UTXO-based transaction building

mod keys;
mod utxo_wallet;

pub use keys::{Address, KeyPair, ADDRESS_PREFIX};
pub use utxo_wallet::{fee_for, Wallet, WalletError, FEE_RATE_DENOMINATOR, FEE_RATE_NUMERATOR};
