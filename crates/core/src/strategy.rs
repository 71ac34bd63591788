use crate::error::DeployError;
use crate::types::metadata::{DeployType, ExtendedDeployMetadata};
use eyre::Result;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Plain CREATE of `bytecode ‖ args` from the caller's signer.
    Direct,
    /// The publisher's own factory function.
    CustomFactory,
    /// Clone of a known implementation through the published factory.
    ViaFactory,
    /// Clone of a known implementation created by the caller, initialized in its constructor.
    ViaProxy,
    /// Deterministic implementation + infrastructure, then a clone through the clone factory.
    AutoFactory,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Direct => "direct",
            Strategy::CustomFactory => "customFactory",
            Strategy::ViaFactory => "viaFactory",
            Strategy::ViaProxy => "viaProxy",
            Strategy::AutoFactory => "autoFactory",
        };
        f.write_str(name)
    }
}

/// Picks how a contract gets onto `chain_id`. Pure: no chain access.
pub fn resolve_strategy(
    metadata: &ExtendedDeployMetadata,
    chain_id: u64,
    force_direct_deploy: bool,
) -> Result<Strategy> {
    if !metadata.is_enabled_on(chain_id) {
        return Err(DeployError::DeploymentDisabled { chain_id }.into());
    }

    if force_direct_deploy || metadata.factory_deployment_data.is_none() {
        return Ok(Strategy::Direct);
    }

    if metadata.deploy_type == DeployType::CustomFactory {
        let input = metadata
            .custom_factory_input()
            .ok_or_else(|| DeployError::MissingFactoryConfig {
                chain_id,
                detail: "customFactory deploy type without customFactoryInput".to_string(),
            })?;
        if !input.custom_factory_addresses.contains_key(&chain_id) {
            return Err(DeployError::MissingFactoryConfig {
                chain_id,
                detail: "no custom factory address for this chain".to_string(),
            }
            .into());
        }
        return Ok(Strategy::CustomFactory);
    }

    if metadata.deploy_type == DeployType::AutoFactory {
        return Ok(Strategy::AutoFactory);
    }

    let upgradeable = metadata.is_deployable_via_proxy || metadata.is_deployable_via_factory;
    if metadata.implementation_address(chain_id).is_none() {
        // First deployment on this chain: build the implementation deterministically.
        return Ok(if upgradeable {
            Strategy::AutoFactory
        } else {
            Strategy::Direct
        });
    }

    if metadata.is_deployable_via_factory {
        if metadata.factory_address(chain_id).is_some() {
            return Ok(Strategy::ViaFactory);
        }
        if !metadata.is_deployable_via_proxy {
            return Err(DeployError::MissingFactoryConfig {
                chain_id,
                detail: "deployable via factory but no factory address for this chain"
                    .to_string(),
            }
            .into());
        }
    }

    if metadata.is_deployable_via_proxy {
        return Ok(Strategy::ViaProxy);
    }

    Ok(Strategy::Direct)
}
