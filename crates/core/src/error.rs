use alloy::primitives::{Address, TxHash};
use thiserror::Error;

use crate::chain::TxReceipt;

/// Failures the caller can match on.
///
/// Everything returns `eyre::Result`; recover one of these with
/// `report.downcast_ref::<DeployError>()`.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("deployment is not enabled for chain {chain_id}")]
    DeploymentDisabled { chain_id: u64 },

    #[error("missing factory configuration for chain {chain_id}: {detail}")]
    MissingFactoryConfig { chain_id: u64, detail: String },

    #[error("no ProxyDeployed event found in receipt of {}", .receipt.tx_hash)]
    NoDeploymentEventFound { receipt: Box<TxReceipt> },

    #[error("keyless sender {from} still underfunded: has {balance}, needs {required}")]
    UnderfundedKeylessSend {
        from: Address,
        balance: alloy::primitives::U256,
        required: alloy::primitives::U256,
    },

    #[error("contract already deployed at {address}")]
    AlreadyDeployed { address: Address },

    #[error("constructor parameter `{name}` has no value and matches no infrastructure contract")]
    UnboundConstructorParam { name: String },

    #[error("transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: TxHash },

    #[error("timed out waiting for receipt of {tx_hash}")]
    ReceiptTimeout { tx_hash: TxHash },

    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),
}

impl DeployError {
    /// Whether retrying the same operation can succeed without changing inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeployError::UnderfundedKeylessSend { .. } | DeployError::ReceiptTimeout { .. }
        )
    }
}
