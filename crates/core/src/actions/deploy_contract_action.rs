use super::action::{Action, Resolution};
use alloy::primitives::{Address, Bytes, U256};
use serde_json::{Value, json};

/// Plain CREATE from the signer. `expected` is `signer.create(nonce)` at planning time.
pub struct DeployContract {
    name: String,
    creation_code: Bytes,
    constructor_args: Bytes,
    value: U256,
    expected: Address,
}

impl DeployContract {
    pub fn new(
        name: String,
        creation_code: Bytes,
        constructor_args: Bytes,
        value: U256,
        expected: Address,
    ) -> Self {
        Self {
            name,
            creation_code,
            constructor_args,
            value,
            expected,
        }
    }
}

impl Action for DeployContract {
    fn target(&self) -> Option<Address> {
        None
    }

    fn value(&self) -> U256 {
        self.value
    }

    fn data(&self) -> Bytes {
        [self.creation_code.as_ref(), self.constructor_args.as_ref()]
            .concat()
            .into()
    }

    fn expected_addresses(&self) -> Vec<Address> {
        vec![self.expected]
    }

    fn resolution(&self) -> Resolution {
        Resolution::ContractAddress
    }

    fn describe(&self) -> Value {
        json!({
            "action": "DeployContract",
            "name": self.name,
            "expectedAddress": self.expected.to_string(),
            "constructorArgs": self.constructor_args.to_string(),
        })
    }
}
