// UTXO wallet and transaction construction

use crate::core::{Amount, BlockTx, PreSignedTx, Utxo, UtxoId};
use crate::wallet::{Address, KeyPair};
use std::fmt;

/// Fee rate applied to the transferred amount: 0.0012345
pub const FEE_RATE_NUMERATOR: u64 = 12_345;
pub const FEE_RATE_DENOMINATOR: u64 = 10_000_000;

/// Fee charged for sending `units`
pub fn fee_for(units: Amount) -> Amount {
    units.mul_rate(FEE_RATE_NUMERATOR, FEE_RATE_DENOMINATOR)
}

/// Wallet error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Owned UTXOs cannot cover amount plus fee
    InsufficientFunds { balance: Amount, needed: Amount },
    /// Transfers must move a positive amount
    ZeroAmount,
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WalletError::InsufficientFunds { balance, needed } => {
                write!(f, "Insufficient funds: have {}, need {}", balance, needed)
            }
            WalletError::ZeroAmount => write!(f, "Cannot send a zero amount"),
        }
    }
}

impl std::error::Error for WalletError {}

/// Single-key wallet holding its owned UTXOs
#[derive(Debug)]
pub struct Wallet {
    keypair: KeyPair,
    utxos: Vec<Utxo>,
    /// Transactions built so far; salts output ids
    sent: u64,
}

impl Wallet {
    pub fn new(keypair: KeyPair) -> Self {
        Self {
            keypair,
            utxos: Vec::new(),
            sent: 0,
        }
    }

    pub fn address(&self) -> &Address {
        &self.keypair.address
    }

    pub fn pubkey_hex(&self) -> String {
        self.keypair.pubkey_hex()
    }

    pub fn utxos(&self) -> &[Utxo] {
        &self.utxos
    }

    /// Sum of owned UTXO values
    pub fn balance(&self) -> Amount {
        self.utxos.iter().map(|u| u.value).sum()
    }

    /// Replace the owned set wholesale, stamping each UTXO with our address
    pub fn set_utxos(&mut self, utxos: Vec<Utxo>) {
        let address = self.keypair.address.clone();
        self.utxos = utxos
            .into_iter()
            .map(|mut utxo| {
                utxo.owner = address.clone();
                utxo
            })
            .collect();
    }

    /// Build and sign a transaction paying `units` to `recipient`.
    ///
    /// Selected inputs leave the wallet immediately and the change output
    /// joins it, so the balance drops by exactly `units` plus the fee. The
    /// caller is responsible for pushing the result into a mempool.
    pub fn create_tx(&mut self, units: Amount, recipient: &Address) -> Result<BlockTx, WalletError> {
        if units == Amount::ZERO {
            return Err(WalletError::ZeroAmount);
        }

        let fee = fee_for(units);
        let needed = units + fee;
        let balance = self.balance();
        if balance < needed {
            return Err(WalletError::InsufficientFunds { balance, needed });
        }

        let inputs = self.select_inputs(units, needed);
        let total_in: Amount = inputs.iter().map(|u| u.value).sum();

        // Inputs can come back on reconciliation while a spend is pending,
        // so the seed also carries the payment and a per-wallet counter
        self.sent += 1;
        let mut seed: Vec<u8> = inputs
            .iter()
            .flat_map(|u| u.id.as_str().bytes())
            .collect();
        seed.extend_from_slice(self.keypair.pubkey_hex().as_bytes());
        seed.extend_from_slice(recipient.as_str().as_bytes());
        seed.extend_from_slice(&units.to_sat().to_le_bytes());
        seed.extend_from_slice(&self.sent.to_le_bytes());

        let mut outputs = vec![Utxo::new(UtxoId::derive(&seed, 0), units, recipient.clone())];

        let change = total_in - needed;
        if change > Amount::ZERO {
            let change_utxo = Utxo::new(UtxoId::derive(&seed, 1), change, self.address().clone());
            self.utxos.push(change_utxo.clone());
            outputs.push(change_utxo);
        }

        let pre_signed = PreSignedTx {
            inputs,
            outputs,
            pub_key: self.pubkey_hex(),
            fee,
        };

        Ok(pre_signed.sign(&self.keypair.secret_key))
    }

    /// Closest-value selection against the unmet part of `units`, removing
    /// each pick from the owned set, until `target` is covered.
    fn select_inputs(&mut self, units: Amount, target: Amount) -> Vec<Utxo> {
        let mut selected = Vec::new();
        let mut total = Amount::ZERO;

        while total < target && !self.utxos.is_empty() {
            let remaining = units.to_sat() as i128 - total.to_sat() as i128;
            let Some(index) = self
                .utxos
                .iter()
                .enumerate()
                .min_by_key(|(_, u)| (u.value.to_sat() as i128 - remaining).abs())
                .map(|(i, _)| i)
            else {
                break;
            };

            let utxo = self.utxos.remove(index);
            total = total + utxo.value;
            selected.push(utxo);
        }

        selected
    }
}
