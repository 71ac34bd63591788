pub mod provider_chain;

#[cfg(test)]
pub(crate) mod mock;

use crate::types::{fee::FeeEstimate, transaction::Transaction};
use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use async_trait::async_trait;
use eyre::Result;

pub use provider_chain::ProviderChain;

/// The parts of a receipt the orchestrator looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub status: bool,
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
}

/// Read access to one chain.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    async fn get_code(&self, address: Address) -> Result<Bytes>;

    async fn is_deployed(&self, address: Address) -> Result<bool> {
        Ok(!self.get_code(address).await?.is_empty())
    }

    async fn get_balance(&self, address: Address) -> Result<U256>;

    async fn get_transaction_count(&self, address: Address) -> Result<u64>;

    /// Base fee of the latest block, `None` on chains without EIP-1559.
    async fn latest_base_fee(&self) -> Result<Option<u128>>;

    async fn gas_price(&self) -> Result<u128>;

    /// `eth_maxPriorityFeePerGas`, `None` when the node does not support it.
    async fn max_priority_fee(&self) -> Result<Option<u128>>;

    /// Priority fee derived from recent blocks' rewards, `None` when unavailable.
    async fn fee_history_priority_fee(&self) -> Result<Option<u128>>;

    /// `eth_call` against the latest block.
    async fn call(&self, from: Address, tx: &Transaction) -> Result<Bytes>;
}

/// A funded signer on the same chain.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    fn address(&self) -> Address;

    /// Signs, sends and waits for the receipt. `fees == None` lets the node price it.
    async fn send_transaction(
        &self,
        tx: Transaction,
        fees: Option<FeeEstimate>,
    ) -> Result<TxReceipt>;

    /// Submits an already signed transaction byte-for-byte and waits for the receipt.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxReceipt>;
}

pub trait Chain: ChainReader + TransactionSender {}

impl<T: ChainReader + TransactionSender> Chain for T {}
