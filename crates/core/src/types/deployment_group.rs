use alloy::primitives::Address;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupType {
    Create2Factory,
    Infra,
    Preset,
    Proxy,
    Custom,
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupType::Create2Factory => "create2Factory",
            GroupType::Infra => "infra",
            GroupType::Preset => "preset",
            GroupType::Proxy => "proxy",
            GroupType::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// One step of a plan as shown to the caller before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTransactionGroup {
    pub contract_type: GroupType,
    pub addresses: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<usize>,
}

impl DeploymentTransactionGroup {
    pub fn new(contract_type: GroupType, addresses: Vec<Address>) -> Self {
        Self {
            contract_type,
            addresses,
            batch: None,
        }
    }

    pub fn infra_batch(batch: usize, addresses: Vec<Address>) -> Self {
        Self {
            contract_type: GroupType::Infra,
            addresses,
            batch: Some(batch),
        }
    }
}
