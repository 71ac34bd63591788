pub mod actions;
pub mod bindings;
pub mod chain;
pub mod error;
pub mod executor;
pub mod fees;
pub mod planner;
pub mod registry;
pub mod strategy;
pub mod types;
pub mod utils;

use alloy::primitives::Address;
use chain::{Chain, ChainReader};
use eyre::Result;
use executor::{DeploymentOutcome, Orchestrator};
use planner::PlanBuilder;
use registry::params::bind_constructor_args;
use types::deploy_config::DeployConfig;
use types::deployment_group::DeploymentTransactionGroup;
use types::request::DeploymentRequest;
use utils::create2::precompute_deployment;

pub use error::DeployError;

/// Dry run: the groups `execute_deployment` would send right now from `deployer`.
///
/// Work already on chain is left out, so calling this after a deployment returns only
/// what is still missing (at minimum the proxy for proxy strategies).
pub async fn plan_deployment<R: ChainReader + ?Sized>(
    reader: &R,
    deployer: Address,
    request: &DeploymentRequest,
    config: &DeployConfig,
) -> Result<Vec<DeploymentTransactionGroup>> {
    let plan = PlanBuilder::new(reader, deployer, config)
        .build(request)
        .await?;
    Ok(plan.preview())
}

/// Plans and executes with the chain's signer. Safe to call again after a failure.
pub async fn execute_deployment<C: Chain + ?Sized>(
    chain: &C,
    request: &DeploymentRequest,
    config: &DeployConfig,
) -> Result<DeploymentOutcome> {
    Orchestrator::new(chain, config).deploy(request).await
}

/// Address the deterministic implementation of `request` gets on every chain.
pub fn predict_implementation_address(request: &DeploymentRequest) -> Result<Address> {
    let artifact = &request.artifact;
    let bound = bind_constructor_args(
        &artifact.constructor_params()?,
        &request.constructor_args,
        true,
    )?;
    let args = artifact.encode_constructor_args(&bound.args)?;
    Ok(precompute_deployment(&artifact.bytecode, &args, false)?.predicted_address)
}
