use super::action::{Action, Resolution};
use super::sender_type::SenderType;
use crate::types::precomputed::KeylessTransaction;
use crate::utils::create2::CREATE2_FACTORY_ADDRESS;
use crate::utils::keyless::create2_factory_keyless_transaction;
use alloy::primitives::{Address, Bytes};
use eyre::Result;
use serde_json::{Value, json};

/// Replay of a presigned deployment. The signer only pays for gas by funding `keyless.from`.
pub struct KeylessDeploy {
    name: String,
    keyless: KeylessTransaction,
    to: Option<Address>,
    predicted_address: Address,
}

impl KeylessDeploy {
    /// Deployment through the CREATE2 factory.
    pub fn new(name: String, keyless: KeylessTransaction, predicted_address: Address) -> Self {
        Self {
            name,
            keyless,
            to: Some(CREATE2_FACTORY_ADDRESS),
            predicted_address,
        }
    }

    /// The transaction creating the CREATE2 factory itself.
    pub fn create2_factory() -> Result<Self> {
        Ok(Self {
            name: "Create2Factory".to_string(),
            keyless: create2_factory_keyless_transaction()?,
            to: None,
            predicted_address: CREATE2_FACTORY_ADDRESS,
        })
    }
}

impl Action for KeylessDeploy {
    fn target(&self) -> Option<Address> {
        self.to
    }

    fn data(&self) -> Bytes {
        self.keyless.raw_signed_transaction.clone()
    }

    fn sender(&self) -> SenderType {
        SenderType::Keyless(self.keyless.from)
    }

    fn expected_addresses(&self) -> Vec<Address> {
        vec![self.predicted_address]
    }

    fn resolution(&self) -> Resolution {
        Resolution::Code(vec![self.predicted_address])
    }

    fn keyless(&self) -> Option<&KeylessTransaction> {
        Some(&self.keyless)
    }

    fn describe(&self) -> Value {
        json!({
            "action": "KeylessDeploy",
            "name": self.name,
            "from": self.keyless.from.to_string(),
            "predictedAddress": self.predicted_address.to_string(),
            "funding": self.keyless.funding_amount().to_string(),
        })
    }
}
