use super::action::{Action, Resolution};
use crate::types::precomputed::PrecomputedDeploymentTransaction;
use crate::utils::create2::CREATE2_FACTORY_ADDRESS;
use alloy::primitives::{Address, Bytes};
use serde_json::{Value, json};

/// `salt ‖ bytecode ‖ args` sent to the CREATE2 factory by the signer.
pub struct PresetDeploy {
    name: String,
    precomputed: PrecomputedDeploymentTransaction,
}

impl PresetDeploy {
    pub fn new(name: String, precomputed: PrecomputedDeploymentTransaction) -> Self {
        Self { name, precomputed }
    }
}

impl Action for PresetDeploy {
    fn target(&self) -> Option<Address> {
        Some(CREATE2_FACTORY_ADDRESS)
    }

    fn data(&self) -> Bytes {
        self.precomputed.raw_transaction_data.clone()
    }

    fn expected_addresses(&self) -> Vec<Address> {
        vec![self.precomputed.predicted_address]
    }

    fn resolution(&self) -> Resolution {
        Resolution::Code(vec![self.precomputed.predicted_address])
    }

    fn describe(&self) -> Value {
        json!({
            "action": "PresetDeploy",
            "name": self.name,
            "salt": self.precomputed.salt.to_string(),
            "predictedAddress": self.precomputed.predicted_address.to_string(),
        })
    }
}
