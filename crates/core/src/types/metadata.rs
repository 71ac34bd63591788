use alloy::json_abi::Function;
use alloy::primitives::Address;
use eyre::{Result, eyre};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeployType {
    #[default]
    Standard,
    AutoFactory,
    CustomFactory,
}

/// Publish-time deployment policy of a contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedDeployMetadata {
    #[serde(default)]
    pub deploy_type: DeployType,
    #[serde(default)]
    pub is_deployable_via_proxy: bool,
    #[serde(default)]
    pub is_deployable_via_factory: bool,
    #[serde(default)]
    pub factory_deployment_data: Option<FactoryDeploymentData>,
    #[serde(default)]
    pub networks_for_deployment: Option<NetworksForDeployment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryDeploymentData {
    #[serde(default, deserialize_with = "address_map")]
    pub implementation_addresses: BTreeMap<u64, Address>,
    #[serde(default, deserialize_with = "address_map")]
    pub factory_addresses: BTreeMap<u64, Address>,
    #[serde(default)]
    pub implementation_initializer_function: Option<InitializerFunction>,
    #[serde(default)]
    pub custom_factory_input: Option<CustomFactoryInput>,
}

/// Either one initializer name for every chain or one per chain.
///
/// Per-chain keys stay strings: untagged enums buffer their input, and the buffered JSON
/// object keys are not coerced to integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitializerFunction {
    All(String),
    PerChain(BTreeMap<String, String>),
}

impl InitializerFunction {
    pub fn for_chain(&self, chain_id: u64) -> Option<&str> {
        match self {
            InitializerFunction::All(name) => Some(name.as_str()),
            InitializerFunction::PerChain(names) => {
                names.get(&chain_id.to_string()).map(String::as_str)
            }
        }
        .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFactoryInput {
    /// Solidity signature, e.g. `deploy(address,bytes32)`.
    pub factory_function: String,
    #[serde(default)]
    pub params: Vec<FactoryParam>,
    #[serde(default, deserialize_with = "address_map")]
    pub custom_factory_addresses: BTreeMap<u64, Address>,
}

impl CustomFactoryInput {
    /// `factory_function` is either a full signature or a bare name whose parameter
    /// types come from `params`.
    pub fn function(&self) -> Result<Function> {
        let signature = if self.factory_function.contains('(') {
            self.factory_function.clone()
        } else {
            format!(
                "{}({})",
                self.factory_function,
                self.params
                    .iter()
                    .map(|p| p.ty.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            )
        };
        Function::parse(&signature)
            .map_err(|e| eyre!("invalid factory function {}: {}", signature, e))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworksForDeployment {
    #[serde(default)]
    pub all_networks: bool,
    #[serde(default)]
    pub networks_enabled: Vec<u64>,
}

// Published metadata leaves unknown chains as "".
fn address_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<u64, Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<u64, String>::deserialize(deserializer)?;
    raw.into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(chain_id, value)| {
            value
                .parse::<Address>()
                .map(|address| (chain_id, address))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

impl ExtendedDeployMetadata {
    pub fn is_enabled_on(&self, chain_id: u64) -> bool {
        match &self.networks_for_deployment {
            None => true,
            Some(networks) => {
                networks.all_networks || networks.networks_enabled.contains(&chain_id)
            }
        }
    }

    pub fn implementation_address(&self, chain_id: u64) -> Option<Address> {
        self.factory_deployment_data
            .as_ref()
            .and_then(|data| data.implementation_addresses.get(&chain_id).copied())
            .filter(|address| !address.is_zero())
    }

    pub fn factory_address(&self, chain_id: u64) -> Option<Address> {
        self.factory_deployment_data
            .as_ref()
            .and_then(|data| data.factory_addresses.get(&chain_id).copied())
            .filter(|address| !address.is_zero())
    }

    pub fn initializer_function(&self, chain_id: u64) -> Option<&str> {
        self.factory_deployment_data
            .as_ref()
            .and_then(|data| data.implementation_initializer_function.as_ref())
            .and_then(|f| f.for_chain(chain_id))
    }

    pub fn custom_factory_input(&self) -> Option<&CustomFactoryInput> {
        self.factory_deployment_data
            .as_ref()
            .and_then(|data| data.custom_factory_input.as_ref())
    }
}
