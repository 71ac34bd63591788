use super::action::Action;
use super::sender_type::SenderType;
use alloy::primitives::Address;
use eyre::{Result, eyre};
use serde_json::Value;

/// An action that lands several child actions in a single transaction.
pub trait MetaAction: Action {
    fn children(&self) -> &[Box<dyn Action>];

    /// Children must exist, share one sender and each be a single deterministic call.
    /// Returns the shared sender.
    fn validate_children(children: &[Box<dyn Action>]) -> Result<SenderType>
    where
        Self: Sized,
    {
        let Some(first) = children.first() else {
            return Err(eyre!("MetaAction: Empty actions"));
        };
        let sender = first.sender();

        for child in children {
            if child.sender() != sender {
                return Err(eyre!(
                    "MetaAction: Mixed senders {} and {}",
                    sender,
                    child.sender()
                ));
            }
            if child.target().is_none() || child.expected_addresses().len() != 1 {
                return Err(eyre!(
                    "MetaAction: Action {} is not a single deterministic call",
                    child.describe()
                ));
            }
        }
        Ok(sender)
    }

    fn child_addresses(&self) -> Vec<Address> {
        self.children()
            .iter()
            .flat_map(|child| child.expected_addresses())
            .collect()
    }

    fn describe_children(&self) -> Vec<Value> {
        self.children().iter().map(|child| child.describe()).collect()
    }
}
