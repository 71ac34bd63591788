use super::sender_type::SenderType;
use crate::types::precomputed::KeylessTransaction;
use alloy::primitives::{Address, Bytes, U256};
use serde_json::Value;
use std::fmt;

/// How the orchestrator learns what an action produced once it is mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every listed address must have code afterwards.
    Code(Vec<Address>),
    /// The first `ProxyDeployed` log of the receipt names the proxy.
    ProxyEvent,
    /// The receipt's `contractAddress`.
    ContractAddress,
    /// Address returned by simulating the call right before it is sent.
    CallReturn,
}

pub trait Action: Send + Sync {
    /// `None` creates a contract.
    fn target(&self) -> Option<Address>;
    fn value(&self) -> U256 {
        U256::ZERO
    }
    fn data(&self) -> Bytes;
    fn sender(&self) -> SenderType {
        SenderType::Signer
    }
    /// Addresses this action is expected to leave code at, as known before sending.
    fn expected_addresses(&self) -> Vec<Address>;
    fn resolution(&self) -> Resolution;
    /// Present only for replays of presigned transactions.
    fn keyless(&self) -> Option<&KeylessTransaction> {
        None
    }
    fn describe(&self) -> Value;
}

impl fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
