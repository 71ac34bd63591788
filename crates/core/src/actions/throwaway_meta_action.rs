use super::action::{Action, Resolution};
use super::meta_action::MetaAction;
use super::sender_type::SenderType;
use crate::bindings::deployer::ThrowawayDeployer;
use crate::registry::throwaway_deployer_init_code;
use alloy::primitives::{Address, Bytes};
use eyre::{Result, eyre};
use serde_json::{Value, json};

/// Folds a batch of deterministic deployments into one contract creation from the signer.
/// The throwaway deployer skips entries that already have code and leaves nothing behind.
pub struct ThrowawayMetaAction {
    actions: Vec<Box<dyn Action>>,
}

impl ThrowawayMetaAction {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Result<Self> {
        let sender = Self::validate_children(&actions)?;
        if sender != SenderType::Signer {
            return Err(eyre!(
                "ThrowawayMetaAction: Only signer actions can be batched, got {}",
                sender
            ));
        }
        Ok(Self { actions })
    }

    fn transactions(&self) -> Vec<ThrowawayDeployer::Transaction> {
        self.actions
            .iter()
            .filter_map(|action| {
                Some(ThrowawayDeployer::Transaction {
                    predictedAddress: *action.expected_addresses().first()?,
                    to: action.target()?,
                    data: action.data(),
                })
            })
            .collect()
    }
}

impl MetaAction for ThrowawayMetaAction {
    fn children(&self) -> &[Box<dyn Action>] {
        &self.actions
    }
}

impl Action for ThrowawayMetaAction {
    fn target(&self) -> Option<Address> {
        None
    }

    fn data(&self) -> Bytes {
        throwaway_deployer_init_code(self.transactions())
    }

    fn expected_addresses(&self) -> Vec<Address> {
        self.child_addresses()
    }

    fn resolution(&self) -> Resolution {
        Resolution::Code(self.expected_addresses())
    }

    fn describe(&self) -> Value {
        json!({
            "action": "ThrowawayDeployer",
            "inner": self.describe_children()
        })
    }
}
