use alloy::primitives::{Address, B256, Bytes, U256};
use serde::Serialize;

/// A signed transaction nobody holds the key for. It can only ever be replayed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeylessTransaction {
    #[serde(rename = "fromAddress")]
    pub from: Address,
    pub raw_signed_transaction: Bytes,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl KeylessTransaction {
    /// Balance the sender needs before the replay can be mined.
    pub fn funding_amount(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.gas_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecomputedDeploymentTransaction {
    pub salt: B256,
    pub bytecode_hash: B256,
    pub init_bytecode_hash: B256,
    pub predicted_address: Address,
    /// `salt ‖ bytecode ‖ constructorArgs`
    pub raw_transaction_data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyless: Option<KeylessTransaction>,
}
