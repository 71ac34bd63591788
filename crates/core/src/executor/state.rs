use crate::strategy::Strategy;
use alloy::primitives::{Address, TxHash};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentState {
    Planning,
    /// Topping up keyless senders of a batch. Batch 0 is the CREATE2 factory.
    Funding(usize),
    Submitting(usize),
    ImplementationDeploy,
    ProxyDeploy,
    DirectDeploy,
    Completed,
    Failed,
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentState::Planning => f.write_str("planning"),
            DeploymentState::Funding(batch) => write!(f, "funding batch {}", batch),
            DeploymentState::Submitting(batch) => write!(f, "submitting batch {}", batch),
            DeploymentState::ImplementationDeploy => f.write_str("implementation deploy"),
            DeploymentState::ProxyDeploy => f.write_str("proxy deploy"),
            DeploymentState::DirectDeploy => f.write_str("direct deploy"),
            DeploymentState::Completed => f.write_str("completed"),
            DeploymentState::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOutcome {
    pub address: Address,
    pub strategy: Strategy,
    /// The contract was already there; nothing was sent for it.
    pub already_deployed: bool,
    pub tx_hashes: Vec<TxHash>,
    pub history: Vec<DeploymentState>,
}
