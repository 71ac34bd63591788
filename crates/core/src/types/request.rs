use crate::types::artifact::ContractArtifact;
use crate::types::metadata::{DeployType, ExtendedDeployMetadata};
use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use eyre::{Result, eyre};
use std::collections::BTreeMap;

const DEFAULT_INITIALIZER: &str = "initialize";

/// What the caller wants deployed, on which chain, with which arguments.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub artifact: ContractArtifact,
    pub metadata: ExtendedDeployMetadata,
    pub chain_id: u64,
    /// Constructor values keyed by parameter name.
    pub constructor_args: BTreeMap<String, DynSolValue>,
    /// Positional arguments for the initializer, or for the custom factory function.
    pub initializer_args: Vec<DynSolValue>,
    pub force_direct_deploy: bool,
    /// Fixed proxy salt. Without one every proxy deployment gets a fresh address.
    pub proxy_salt: Option<String>,
}

impl DeploymentRequest {
    pub fn new(artifact: ContractArtifact, metadata: ExtendedDeployMetadata, chain_id: u64) -> Self {
        Self {
            artifact,
            metadata,
            chain_id,
            constructor_args: BTreeMap::new(),
            initializer_args: vec![],
            force_direct_deploy: false,
            proxy_salt: None,
        }
    }

    pub fn with_constructor_arg(mut self, name: impl Into<String>, value: DynSolValue) -> Self {
        self.constructor_args.insert(name.into(), value);
        self
    }

    pub fn with_initializer_args(mut self, args: Vec<DynSolValue>) -> Self {
        self.initializer_args = args;
        self
    }

    pub fn with_proxy_salt(mut self, salt: impl Into<String>) -> Self {
        self.proxy_salt = Some(salt.into());
        self
    }

    pub fn force_direct(mut self) -> Self {
        self.force_direct_deploy = true;
        self
    }

    /// Name of the function proxies are initialized with on this request's chain.
    pub fn initializer_name(&self) -> &str {
        self.metadata
            .initializer_function(self.chain_id)
            .unwrap_or(DEFAULT_INITIALIZER)
    }

    /// Types `arg_count` positional initializer arguments are read as. Custom factory
    /// deployments take the factory function's parameters instead.
    pub fn initializer_types(&self, arg_count: usize) -> Result<Vec<DynSolType>> {
        let inputs = match self.metadata.custom_factory_input() {
            Some(input)
                if self.metadata.deploy_type == DeployType::CustomFactory
                    && !self.force_direct_deploy =>
            {
                input.function()?.inputs
            }
            _ => self
                .artifact
                .function(self.initializer_name(), arg_count)?
                .inputs
                .clone(),
        };
        inputs
            .iter()
            .map(|param| {
                param
                    .resolve()
                    .map_err(|e| eyre!("unsupported parameter type {}: {}", param.ty, e))
            })
            .collect()
    }
}
