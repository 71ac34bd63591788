use super::action::{Action, Resolution};
use crate::bindings::clone_factory::TWCloneFactory;
use crate::utils::clone::predict_clone_address;
use alloy::primitives::{Address, B256, Bytes};
use alloy::sol_types::SolCall;
use serde_json::{Value, json};

/// `deployProxyByImplementation` on a clone factory.
pub struct DeployProxy {
    factory: Address,
    implementation: Address,
    init_data: Bytes,
    salt: B256,
    deployer: Address,
}

impl DeployProxy {
    pub fn new(
        factory: Address,
        implementation: Address,
        init_data: Bytes,
        salt: B256,
        deployer: Address,
    ) -> Self {
        Self {
            factory,
            implementation,
            init_data,
            salt,
            deployer,
        }
    }
}

impl Action for DeployProxy {
    fn target(&self) -> Option<Address> {
        Some(self.factory)
    }

    fn data(&self) -> Bytes {
        let bytes_data = TWCloneFactory::deployProxyByImplementationCall::new((
            self.implementation,
            self.init_data.clone(),
            self.salt,
        ))
        .abi_encode();
        Bytes::from(bytes_data)
    }

    fn expected_addresses(&self) -> Vec<Address> {
        vec![predict_clone_address(
            self.factory,
            self.implementation,
            self.deployer,
            self.salt,
        )]
    }

    fn resolution(&self) -> Resolution {
        Resolution::ProxyEvent
    }

    fn describe(&self) -> Value {
        json!({
            "action": "DeployProxy",
            "factory": self.factory.to_string(),
            "implementation": self.implementation.to_string(),
            "salt": self.salt.to_string(),
            "initData": self.init_data.to_string(),
        })
    }
}
