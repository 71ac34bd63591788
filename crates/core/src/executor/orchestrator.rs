use super::state::{DeploymentOutcome, DeploymentState};
use crate::actions::action::{Action, Resolution};
use crate::bindings::clone_factory::TWCloneFactory;
use crate::chain::{Chain, TxReceipt};
use crate::error::DeployError;
use crate::fees::FeeEstimator;
use crate::planner::{DeploymentPlan, PlanBuilder};
use crate::types::deploy_config::DeployConfig;
use crate::types::deployment_group::GroupType;
use crate::types::fee::FeeEstimate;
use crate::types::precomputed::KeylessTransaction;
use crate::types::request::DeploymentRequest;
use crate::types::transaction::Transaction;
use crate::utils::abi::decode_address_word;
use alloy::primitives::{Address, TxHash};
use alloy::sol_types::SolEvent;
use eyre::{Report, Result, eyre};
use futures::future::try_join_all;
use log::{debug, error, info, warn};

/// Drives a plan to completion with a funded signer.
///
/// Infra batches run one after another. Inside a batch the signer funds each keyless
/// sender in turn, since they share its nonce, then the replays run concurrently. Nothing is persisted: a retry re-plans and the code checks skip
/// whatever already landed.
pub struct Orchestrator<'a, C: Chain + ?Sized> {
    chain: &'a C,
    config: &'a DeployConfig,
    fees: FeeEstimator,
    history: Vec<DeploymentState>,
    tx_hashes: Vec<TxHash>,
}

impl<'a, C: Chain + ?Sized> Orchestrator<'a, C> {
    pub fn new(chain: &'a C, config: &'a DeployConfig) -> Self {
        Self {
            chain,
            config,
            fees: FeeEstimator::new(config.fees.clone()),
            history: vec![],
            tx_hashes: vec![],
        }
    }

    /// Plans against the current chain state, then executes.
    pub async fn deploy(mut self, request: &DeploymentRequest) -> Result<DeploymentOutcome> {
        self.transition(DeploymentState::Planning);
        let plan = match PlanBuilder::new(self.chain, self.chain.address(), self.config)
            .build(request)
            .await
        {
            Ok(plan) => plan,
            Err(e) => return Err(self.fail(e)),
        };
        self.run(&plan).await
    }

    /// Executes a plan built earlier, e.g. after the caller confirmed its preview.
    pub async fn execute(mut self, plan: &DeploymentPlan) -> Result<DeploymentOutcome> {
        self.transition(DeploymentState::Planning);
        self.run(plan).await
    }

    fn transition(&mut self, state: DeploymentState) {
        match self.history.last() {
            Some(previous) => info!("Deployment: {} -> {}", previous, state),
            None => info!("Deployment: {}", state),
        }
        self.history.push(state);
    }

    fn fail(&mut self, e: Report) -> Report {
        let last = self.history.last().copied();
        self.transition(DeploymentState::Failed);
        match last {
            Some(state) => error!("Deployment failed during {}: {}", state, e),
            None => error!("Deployment failed: {}", e),
        }
        e
    }

    async fn run(mut self, plan: &DeploymentPlan) -> Result<DeploymentOutcome> {
        if plan.deployer != self.chain.address() {
            let e = eyre!(
                "Orchestrator: plan was built for {} but the signer is {}",
                plan.deployer,
                self.chain.address()
            );
            return Err(self.fail(e));
        }

        match self.run_groups(plan).await {
            Ok((address, already_deployed)) => {
                self.transition(DeploymentState::Completed);
                info!("{} deployment finished at {}", plan.strategy, address);
                Ok(DeploymentOutcome {
                    address,
                    strategy: plan.strategy,
                    already_deployed,
                    tx_hashes: self.tx_hashes,
                    history: self.history,
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run_groups(&mut self, plan: &DeploymentPlan) -> Result<(Address, bool)> {
        let mut deployed = None;

        for planned in &plan.groups {
            debug!(
                "Running {} group for {:?}",
                planned.group.contract_type, planned.group.addresses
            );
            match planned.group.contract_type {
                GroupType::Create2Factory => self.run_batch(0, &planned.actions).await?,
                GroupType::Infra => {
                    self.run_batch(planned.group.batch.unwrap_or(1), &planned.actions)
                        .await?
                }
                GroupType::Preset => {
                    self.transition(DeploymentState::ImplementationDeploy);
                    self.run_signer_actions(&planned.actions).await?;
                }
                GroupType::Proxy => {
                    self.transition(DeploymentState::ProxyDeploy);
                    deployed = self.run_signer_actions(&planned.actions).await?;
                }
                GroupType::Custom => {
                    self.transition(DeploymentState::DirectDeploy);
                    deployed = self.run_signer_actions(&planned.actions).await?;
                }
            }
        }

        deployed.ok_or_else(|| eyre!("Orchestrator: plan {} deployed nothing", plan.run_id))
    }

    async fn run_batch(&mut self, batch: usize, actions: &[Box<dyn Action>]) -> Result<()> {
        let (keyless, signer): (Vec<&dyn Action>, Vec<&dyn Action>) = actions
            .iter()
            .map(|action| action.as_ref())
            .partition(|action| action.keyless().is_some());

        if !keyless.is_empty() {
            self.transition(DeploymentState::Funding(batch));
            let fees = self.fees.estimate(self.chain).await?;
            debug!("Funding batch {} at {} wei/gas", batch, fees.max_price_per_gas());
            for action in &keyless {
                if let Some(tx_hash) = self.fund_keyless(*action, fees).await? {
                    self.tx_hashes.push(tx_hash);
                }
            }

            self.transition(DeploymentState::Submitting(batch));
            let replayed =
                try_join_all(keyless.iter().map(|action| self.replay_keyless(*action))).await?;
            self.tx_hashes.extend(replayed.into_iter().flatten());
        }

        if !signer.is_empty() {
            if keyless.is_empty() {
                self.transition(DeploymentState::Submitting(batch));
            }
            for action in signer {
                self.send_signer_action(action).await?;
            }
        }
        Ok(())
    }

    /// A keyless sender whose only nonce is used has replayed already, by us or anyone.
    /// Its deployment only counts as done when the code is actually there.
    async fn keyless_spent(
        &self,
        action: &dyn Action,
        keyless: &KeylessTransaction,
    ) -> Result<bool> {
        if self.chain.get_transaction_count(keyless.from).await? == 0 {
            return Ok(false);
        }
        self.verify_code(&action.expected_addresses())
            .await
            .map_err(|e| {
                eyre!(
                    "Keyless sender {} already used its nonce but the deployment is missing: {}",
                    keyless.from,
                    e
                )
            })?;
        Ok(true)
    }

    async fn fund_keyless(&self, action: &dyn Action, fees: FeeEstimate) -> Result<Option<TxHash>> {
        let Some(keyless) = action.keyless() else {
            return Ok(None);
        };
        if self.keyless_spent(action, keyless).await? {
            warn!(
                "Keyless sender {} already used its nonce, its deployment is in place",
                keyless.from
            );
            return Ok(None);
        }

        let required = keyless.funding_amount();
        let balance = self.chain.get_balance(keyless.from).await?;
        if balance >= required {
            debug!("Keyless sender {} already holds {}", keyless.from, balance);
            return Ok(None);
        }

        let shortfall = required - balance;
        info!("Funding keyless sender {} with {} wei", keyless.from, shortfall);
        // No gas limit, the provider estimates it.
        let transfer = Transaction::transfer(keyless.from, shortfall);
        let receipt = self.chain.send_transaction(transfer, Some(fees)).await?;
        ensure_success(&receipt)?;
        Ok(Some(receipt.tx_hash))
    }

    async fn replay_keyless(&self, action: &dyn Action) -> Result<Option<TxHash>> {
        let Some(keyless) = action.keyless() else {
            return Ok(None);
        };
        if self.keyless_spent(action, keyless).await? {
            return Ok(None);
        }

        let required = keyless.funding_amount();
        let balance = self.chain.get_balance(keyless.from).await?;
        if balance < required {
            return Err(DeployError::UnderfundedKeylessSend {
                from: keyless.from,
                balance,
                required,
            }
            .into());
        }

        let receipt = match self
            .chain
            .send_raw_transaction(keyless.raw_signed_transaction.clone())
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                // Someone may have replayed the same bytes first.
                if self.all_deployed(&action.expected_addresses()).await? {
                    warn!("Replay from {} rejected but code is in place: {}", keyless.from, e);
                    return Ok(None);
                }
                return Err(e);
            }
        };
        ensure_success(&receipt)?;
        self.verify_code(&action.expected_addresses()).await?;
        Ok(Some(receipt.tx_hash))
    }

    /// Address produced by the first action that produces one.
    async fn run_signer_actions(
        &mut self,
        actions: &[Box<dyn Action>],
    ) -> Result<Option<(Address, bool)>> {
        let mut produced = None;
        for action in actions {
            match self.send_signer_action(action.as_ref()).await {
                Ok(Some(address)) => {
                    produced.get_or_insert((address, false));
                }
                Ok(None) => {}
                Err(e) => match e.downcast_ref::<DeployError>() {
                    Some(DeployError::AlreadyDeployed { address }) => {
                        info!("{} is already deployed", address);
                        return Ok(Some((*address, true)));
                    }
                    _ => return Err(e),
                },
            }
        }
        Ok(produced)
    }

    async fn send_signer_action(&mut self, action: &dyn Action) -> Result<Option<Address>> {
        let tx = Transaction {
            to: action.target(),
            value: action.value(),
            data: action.data(),
            gas_limit: None,
        };
        let resolution = action.resolution();

        let simulated = match resolution {
            Resolution::CallReturn => {
                let returned = self.chain.call(self.chain.address(), &tx).await?;
                let address = decode_address_word(&returned)?;
                if self.chain.is_deployed(address).await? {
                    return Err(DeployError::AlreadyDeployed { address }.into());
                }
                Some(address)
            }
            _ => None,
        };

        let fees = self.fees.estimate(self.chain).await?;
        debug!("Sending {}", action.describe());
        let receipt = self.chain.send_transaction(tx, Some(fees)).await?;
        self.tx_hashes.push(receipt.tx_hash);
        ensure_success(&receipt)?;

        match resolution {
            Resolution::Code(addresses) => {
                self.verify_code(&addresses).await?;
                Ok(addresses.first().copied())
            }
            Resolution::ProxyEvent => Ok(Some(proxy_from_receipt(&receipt)?)),
            Resolution::ContractAddress => {
                let address = receipt.contract_address.ok_or_else(|| {
                    eyre!("Receipt of {} has no contract address", receipt.tx_hash)
                })?;
                if let Some(expected) = action.expected_addresses().first() {
                    if *expected != address {
                        return Err(eyre!(
                            "Contract landed at {} instead of planned {}, the signer's nonce moved since planning",
                            address,
                            expected
                        ));
                    }
                }
                Ok(Some(address))
            }
            Resolution::CallReturn => {
                let address = simulated.ok_or_else(|| {
                    eyre!("Orchestrator: no simulated address for {}", receipt.tx_hash)
                })?;
                self.verify_code(&[address]).await?;
                Ok(Some(address))
            }
        }
    }

    async fn all_deployed(&self, addresses: &[Address]) -> Result<bool> {
        let deployed =
            try_join_all(addresses.iter().map(|address| self.chain.is_deployed(*address)))
                .await?;
        Ok(!deployed.is_empty() && deployed.into_iter().all(|d| d))
    }

    async fn verify_code(&self, addresses: &[Address]) -> Result<()> {
        for address in addresses {
            if !self.chain.is_deployed(*address).await? {
                return Err(eyre!("No code at {} after deployment", address));
            }
        }
        Ok(())
    }
}

fn ensure_success(receipt: &TxReceipt) -> Result<()> {
    if receipt.status {
        Ok(())
    } else {
        Err(DeployError::TransactionReverted {
            tx_hash: receipt.tx_hash,
        }
        .into())
    }
}

/// Proxy named by the first `ProxyDeployed` log.
fn proxy_from_receipt(receipt: &TxReceipt) -> Result<Address> {
    receipt
        .logs
        .iter()
        .find_map(|log| TWCloneFactory::ProxyDeployed::decode_log(log, true).ok())
        .map(|event| event.data.proxy)
        .ok_or_else(|| {
            DeployError::NoDeploymentEventFound {
                receipt: Box::new(receipt.clone()),
            }
            .into()
        })
}
