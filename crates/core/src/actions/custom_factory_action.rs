use super::action::{Action, Resolution};
use alloy::primitives::{Address, Bytes};
use serde_json::{Value, json};

/// Call to the publisher's own factory function. The deployed address is whatever the
/// function returns, learned by simulation.
pub struct CustomFactoryDeploy {
    factory: Address,
    function: String,
    data: Bytes,
    simulated: Address,
}

impl CustomFactoryDeploy {
    pub fn new(factory: Address, function: String, data: Bytes, simulated: Address) -> Self {
        Self {
            factory,
            function,
            data,
            simulated,
        }
    }
}

impl Action for CustomFactoryDeploy {
    fn target(&self) -> Option<Address> {
        Some(self.factory)
    }

    fn data(&self) -> Bytes {
        self.data.clone()
    }

    fn expected_addresses(&self) -> Vec<Address> {
        vec![self.simulated]
    }

    fn resolution(&self) -> Resolution {
        Resolution::CallReturn
    }

    fn describe(&self) -> Value {
        json!({
            "action": "CustomFactoryDeploy",
            "factory": self.factory.to_string(),
            "function": self.function,
            "simulatedAddress": self.simulated.to_string(),
        })
    }
}
