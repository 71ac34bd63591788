use crate::actions::action::Action;
use crate::strategy::Strategy;
use crate::types::deployment_group::DeploymentTransactionGroup;
use alloy::primitives::Address;
use serde_json::{Value, json};
use uuid::Uuid;

/// A preview group plus the actions that realize it.
#[derive(Debug)]
pub struct PlannedGroup {
    pub group: DeploymentTransactionGroup,
    pub actions: Vec<Box<dyn Action>>,
}

#[derive(Debug)]
pub struct DeploymentPlan {
    pub run_id: Uuid,
    pub strategy: Strategy,
    pub chain_id: u64,
    pub deployer: Address,
    /// Implementation the final proxy points at, when there is one.
    pub implementation: Option<Address>,
    /// Factory used for the final step, when there is one.
    pub factory: Option<Address>,
    pub groups: Vec<PlannedGroup>,
}

impl DeploymentPlan {
    pub fn preview(&self) -> Vec<DeploymentTransactionGroup> {
        self.groups.iter().map(|g| g.group.clone()).collect()
    }

    pub fn describe(&self) -> Value {
        json!({
            "runId": self.run_id.to_string(),
            "strategy": self.strategy.to_string(),
            "chainId": self.chain_id,
            "deployer": self.deployer.to_string(),
            "implementation": self.implementation.map(|a| a.to_string()),
            "factory": self.factory.map(|a| a.to_string()),
            "groups": self.groups.iter().map(|planned| json!({
                "contractType": planned.group.contract_type.to_string(),
                "batch": planned.group.batch,
                "addresses": planned.group.addresses.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
                "actions": planned.actions.iter().map(|a| a.describe()).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        })
    }
}
