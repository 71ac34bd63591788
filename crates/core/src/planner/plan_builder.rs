use super::deployment_plan::{DeploymentPlan, PlannedGroup};
use crate::actions::action::Action;
use crate::actions::custom_factory_action::CustomFactoryDeploy;
use crate::actions::deploy_contract_action::DeployContract;
use crate::actions::deploy_proxy_action::DeployProxy;
use crate::actions::keyless_deploy_action::KeylessDeploy;
use crate::actions::preset_deploy_action::PresetDeploy;
use crate::actions::throwaway_meta_action::ThrowawayMetaAction;
use crate::chain::ChainReader;
use crate::error::DeployError;
use crate::registry::{self, InfraContractType, params::bind_constructor_args};
use crate::strategy::{Strategy, resolve_strategy};
use crate::types::deploy_config::{DeployConfig, InfraMode};
use crate::types::deployment_group::{DeploymentTransactionGroup, GroupType};
use crate::types::request::DeploymentRequest;
use crate::types::transaction::Transaction;
use crate::utils::abi::decode_address_word;
use crate::utils::clone::{initialized_clone_init_code, proxy_salt};
use crate::utils::create2::{CREATE2_FACTORY_ADDRESS, precompute_deployment};
use alloy::dyn_abi::JsonAbiExt;
use alloy::primitives::{Address, Bytes, U256};
use eyre::{Result, eyre};
use futures::future::try_join_all;
use log::{debug, info};
use std::collections::HashSet;
use uuid::Uuid;

/// Turns a request into an ordered, idempotent plan. Reads the chain, never writes to it.
pub struct PlanBuilder<'a, R: ChainReader + ?Sized> {
    reader: &'a R,
    deployer: Address,
    config: &'a DeployConfig,
}

impl<'a, R: ChainReader + ?Sized> PlanBuilder<'a, R> {
    pub fn new(reader: &'a R, deployer: Address, config: &'a DeployConfig) -> Self {
        Self {
            reader,
            deployer,
            config,
        }
    }

    pub async fn build(&self, request: &DeploymentRequest) -> Result<DeploymentPlan> {
        let chain_id = self.reader.chain_id().await?;
        if chain_id != request.chain_id {
            return Err(eyre!(
                "PlanBuilder: request targets chain {} but the provider is on chain {}",
                request.chain_id,
                chain_id
            ));
        }

        let strategy = resolve_strategy(&request.metadata, chain_id, request.force_direct_deploy)?;
        info!(
            "Planning {} deployment of {} on chain {}",
            strategy, request.artifact.name, chain_id
        );

        let mut plan = DeploymentPlan {
            run_id: Uuid::new_v4(),
            strategy,
            chain_id,
            deployer: self.deployer,
            implementation: None,
            factory: None,
            groups: vec![],
        };

        match strategy {
            Strategy::AutoFactory => self.plan_auto_factory(request, &mut plan).await?,
            Strategy::ViaFactory => self.plan_via_factory(request, &mut plan)?,
            Strategy::ViaProxy => self.plan_via_proxy(request, &mut plan).await?,
            Strategy::Direct => self.plan_direct(request, &mut plan).await?,
            Strategy::CustomFactory => self.plan_custom_factory(request, &mut plan).await?,
        }

        debug!("Plan {}: {:?}", plan.run_id, plan.preview());
        Ok(plan)
    }

    async fn plan_auto_factory(
        &self,
        request: &DeploymentRequest,
        plan: &mut DeploymentPlan,
    ) -> Result<()> {
        let artifact = &request.artifact;
        let bound = bind_constructor_args(
            &artifact.constructor_params()?,
            &request.constructor_args,
            true,
        )?;
        let args = artifact.encode_constructor_args(&bound.args)?;
        let implementation = precompute_deployment(&artifact.bytecode, &args, false)?;

        let required = registry::with_dependencies(
            bound
                .required_infra
                .iter()
                .copied()
                .chain([InfraContractType::CloneFactory]),
        );

        let mut candidates = vec![CREATE2_FACTORY_ADDRESS, implementation.predicted_address];
        candidates.extend(required.iter().map(|c| c.address()));
        let deployed = self.deployed_set(&candidates).await?;

        if !deployed.contains(&CREATE2_FACTORY_ADDRESS) {
            plan.groups.push(PlannedGroup {
                group: DeploymentTransactionGroup::new(
                    GroupType::Create2Factory,
                    vec![CREATE2_FACTORY_ADDRESS],
                ),
                actions: vec![Box::new(KeylessDeploy::create2_factory()?)],
            });
        }

        let missing: Vec<InfraContractType> = required
            .into_iter()
            .filter(|c| !deployed.contains(&c.address()))
            .collect();
        for (i, chunk) in missing
            .chunks(self.config.infra_batch_size.max(1))
            .enumerate()
        {
            plan.groups.push(PlannedGroup {
                group: DeploymentTransactionGroup::infra_batch(
                    i + 1,
                    chunk.iter().map(|c| c.address()).collect(),
                ),
                actions: self.infra_actions(chunk)?,
            });
        }

        if !deployed.contains(&implementation.predicted_address) {
            plan.groups.push(PlannedGroup {
                group: DeploymentTransactionGroup::new(
                    GroupType::Preset,
                    vec![implementation.predicted_address],
                ),
                actions: vec![Box::new(PresetDeploy::new(
                    artifact.name.clone(),
                    implementation.clone(),
                ))],
            });
        }

        let clone_factory = InfraContractType::CloneFactory.address();
        plan.implementation = Some(implementation.predicted_address);
        plan.factory = Some(clone_factory);
        plan.groups.push(self.proxy_group(
            request,
            clone_factory,
            implementation.predicted_address,
        )?);
        Ok(())
    }

    fn infra_actions(&self, batch: &[InfraContractType]) -> Result<Vec<Box<dyn Action>>> {
        let precomputed = batch
            .iter()
            .map(|c| Ok((c.contract(), c.contract().precompute()?)))
            .collect::<Result<Vec<_>>>()?;

        match self.config.infra_mode {
            InfraMode::Keyless => precomputed
                .into_iter()
                .map(|(contract, precomputed)| {
                    let keyless = precomputed.keyless.ok_or_else(|| {
                        eyre!("PlanBuilder: {} has no keyless transaction", contract.name)
                    })?;
                    Ok(Box::new(KeylessDeploy::new(
                        contract.name.to_string(),
                        keyless,
                        precomputed.predicted_address,
                    )) as Box<dyn Action>)
                })
                .collect(),
            InfraMode::Throwaway => {
                let presets = precomputed
                    .into_iter()
                    .map(|(contract, precomputed)| {
                        Box::new(PresetDeploy::new(contract.name.to_string(), precomputed))
                            as Box<dyn Action>
                    })
                    .collect();
                Ok(vec![Box::new(ThrowawayMetaAction::new(presets)?)])
            }
        }
    }

    fn plan_via_factory(&self, request: &DeploymentRequest, plan: &mut DeploymentPlan) -> Result<()> {
        let implementation = self.known_implementation(request, plan.chain_id)?;
        let factory = request
            .metadata
            .factory_address(plan.chain_id)
            .ok_or_else(|| DeployError::MissingFactoryConfig {
                chain_id: plan.chain_id,
                detail: "no factory address for this chain".to_string(),
            })?;

        plan.implementation = Some(implementation);
        plan.factory = Some(factory);
        plan.groups
            .push(self.proxy_group(request, factory, implementation)?);
        Ok(())
    }

    async fn plan_via_proxy(
        &self,
        request: &DeploymentRequest,
        plan: &mut DeploymentPlan,
    ) -> Result<()> {
        let implementation = self.known_implementation(request, plan.chain_id)?;
        let nonce = self.reader.get_transaction_count(self.deployer).await?;
        let proxy = self.deployer.create(nonce);

        // Initialized in its constructor, nobody can front-run the initializer.
        let init_data = self.initializer_call(request)?.unwrap_or_default();

        plan.implementation = Some(implementation);
        plan.groups.push(PlannedGroup {
            group: DeploymentTransactionGroup::new(GroupType::Proxy, vec![proxy]),
            actions: vec![Box::new(DeployContract::new(
                format!("{}Proxy", request.artifact.name),
                initialized_clone_init_code(implementation, &init_data),
                Bytes::new(),
                U256::ZERO,
                proxy,
            ))],
        });
        Ok(())
    }

    async fn plan_direct(&self, request: &DeploymentRequest, plan: &mut DeploymentPlan) -> Result<()> {
        let artifact = &request.artifact;
        let bound = bind_constructor_args(
            &artifact.constructor_params()?,
            &request.constructor_args,
            false,
        )?;
        let args = artifact.encode_constructor_args(&bound.args)?;
        let nonce = self.reader.get_transaction_count(self.deployer).await?;
        let expected = self.deployer.create(nonce);

        plan.groups.push(PlannedGroup {
            group: DeploymentTransactionGroup::new(GroupType::Custom, vec![expected]),
            actions: vec![Box::new(DeployContract::new(
                artifact.name.clone(),
                artifact.bytecode.clone(),
                args,
                U256::ZERO,
                expected,
            ))],
        });
        Ok(())
    }

    async fn plan_custom_factory(
        &self,
        request: &DeploymentRequest,
        plan: &mut DeploymentPlan,
    ) -> Result<()> {
        let chain_id = plan.chain_id;
        let missing = |detail: &str| DeployError::MissingFactoryConfig {
            chain_id,
            detail: detail.to_string(),
        };
        let input = request
            .metadata
            .custom_factory_input()
            .ok_or_else(|| missing("customFactory deploy type without customFactoryInput"))?;
        let factory = input
            .custom_factory_addresses
            .get(&chain_id)
            .copied()
            .ok_or_else(|| missing("no custom factory address for this chain"))?;

        let function = input.function()?;
        let data: Bytes = function.abi_encode_input(&request.initializer_args)?.into();

        // The factory decides the address; ask it before sending anything.
        let returned = self
            .reader
            .call(self.deployer, &Transaction::call(factory, data.clone()))
            .await?;
        let simulated = decode_address_word(&returned)?;
        debug!("Custom factory {} would deploy {}", factory, simulated);

        plan.factory = Some(factory);
        plan.groups.push(PlannedGroup {
            group: DeploymentTransactionGroup::new(GroupType::Custom, vec![simulated]),
            actions: vec![Box::new(CustomFactoryDeploy::new(
                factory,
                function.signature(),
                data,
                simulated,
            ))],
        });
        Ok(())
    }

    fn known_implementation(&self, request: &DeploymentRequest, chain_id: u64) -> Result<Address> {
        request
            .metadata
            .implementation_address(chain_id)
            .ok_or_else(|| {
                DeployError::MissingFactoryConfig {
                    chain_id,
                    detail: "no implementation address for this chain".to_string(),
                }
                .into()
            })
    }

    /// Proxies are never filtered: a fresh salt always yields a fresh address.
    fn proxy_group(
        &self,
        request: &DeploymentRequest,
        factory: Address,
        implementation: Address,
    ) -> Result<PlannedGroup> {
        let init_data = self.initializer_call(request)?.unwrap_or_default();
        let salt = proxy_salt(request.proxy_salt.as_deref());
        let action = DeployProxy::new(factory, implementation, init_data, salt, self.deployer);

        Ok(PlannedGroup {
            group: DeploymentTransactionGroup::new(GroupType::Proxy, action.expected_addresses()),
            actions: vec![Box::new(action)],
        })
    }

    /// Initializer calldata. `None` when the contract has nothing to initialize.
    fn initializer_call(&self, request: &DeploymentRequest) -> Result<Option<Bytes>> {
        let name = request.initializer_name();

        match request
            .artifact
            .function(name, request.initializer_args.len())
        {
            Ok(function) => Ok(Some(
                function.abi_encode_input(&request.initializer_args)?.into(),
            )),
            Err(_) if request.initializer_args.is_empty() => {
                debug!("{} has no {}(), deploying uninitialized", request.artifact.name, name);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn deployed_set(&self, addresses: &[Address]) -> Result<HashSet<Address>> {
        let deployed =
            try_join_all(addresses.iter().map(|address| self.reader.is_deployed(*address)))
                .await?;
        Ok(addresses
            .iter()
            .zip(deployed)
            .filter(|(_, deployed)| *deployed)
            .map(|(address, _)| *address)
            .collect())
    }
}
