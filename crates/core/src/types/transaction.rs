use alloy::primitives::{Address, Bytes, U256};
use serde::Serialize;

/// A transaction the caller's signer will send. `to == None` is a contract creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
}

impl Transaction {
    pub fn call(to: Address, data: Bytes) -> Self {
        Self {
            to: Some(to),
            value: U256::ZERO,
            data,
            gas_limit: None,
        }
    }

    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to: Some(to),
            value,
            data: Bytes::new(),
            gas_limit: None,
        }
    }
}
