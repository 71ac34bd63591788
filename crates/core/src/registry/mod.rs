//! Canonical support contracts. Every entry lives at the same address on every chain
//! because its deployment is a keyless replay through the CREATE2 factory.

pub mod params;


use crate::bindings::deployer::ThrowawayDeployer;
use crate::types::precomputed::PrecomputedDeploymentTransaction;
use crate::utils::create2::precompute_deployment;
use alloy::primitives::{Address, Bytes, address, hex};
use alloy::sol_types::SolConstructor;
use eyre::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Ordered so that dependencies sort before their dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InfraContractType {
    Forwarder,
    EoaForwarder,
    NativeTokenWrapper,
    CloneFactory,
}

impl fmt::Display for InfraContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.contract().name)
    }
}

#[derive(Debug)]
pub struct InfrastructureContract {
    pub contract_type: InfraContractType,
    pub name: &'static str,
    pub bytecode: &'static [u8],
    /// Infra contracts whose addresses are this contract's constructor arguments, in order.
    pub dependencies: &'static [InfraContractType],
    pub predicted_address: Address,
    pub keyless_from: Address,
}

pub static INFRA_CONTRACTS: [InfrastructureContract; 4] = [
    // ERC-2771 forwarder: execute(address,bytes) appends msg.sender to the forwarded call.
    InfrastructureContract {
        contract_type: InfraContractType::Forwarder,
        name: "Forwarder",
        bytecode: &hex!(
            "61004f8061000d6000396000f360003560e01c631cff79cd1461001457600080fd5b60243560040180359060200181906000373360601b815260140160006000826000346004355af13d600060003e61004a573d6000fd5b3d6000f3"
        ),
        dependencies: &[],
        predicted_address: address!("0x0388c1E0DfeC6356DE3B6688B5070d411b1308ed"),
        keyless_from: address!("0x642EB5A3A24B4522b5494Dea446894f6CaDf9c8E"),
    },
    // Same as the forwarder but only callable by EOAs (tx.origin == msg.sender).
    InfrastructureContract {
        contract_type: InfraContractType::EoaForwarder,
        name: "ForwarderEOAOnly",
        bytecode: &hex!(
            "61005b8061000d6000396000f360003560e01c631cff79cd1461001457600080fd5b33321461002057600080fd5b60243560040180359060200181906000373360601b815260140160006000826000346004355af13d600060003e610056573d6000fd5b3d6000f3"
        ),
        dependencies: &[],
        predicted_address: address!("0x3a9F95760231AB521aC2C2f6D215F3288Ea3D5ca"),
        keyless_from: address!("0x1130c96a3B129C9DaC239F30E7d5c27a2862355B"),
    },
    // deposit / withdraw / balanceOf / totalSupply, plain transfers deposit.
    InfrastructureContract {
        contract_type: InfraContractType::NativeTokenWrapper,
        name: "NativeTokenWrapper",
        bytecode: &hex!(
            "6100818061000d6000396000f3361561003c5760003560e01c8063d0e30db01461003c5780632e1a7d4d1461004457806370a082311461006a57806318160ddd1461007757600080fd5b343354013355005b6004353354818110610063578190033355600080808084335af1610068575b600080fd5b005b6004355460005260206000f35b4760005260206000f3"
        ),
        dependencies: &[],
        predicted_address: address!("0x7f39bd6B8d94D8ed9B95E61fe80943f3b79b9126"),
        keyless_from: address!("0x8cdCFca4228E09af0Fd13Ed0354eb3655F69bA44"),
    },
    // deployProxyByImplementation(address,bytes,bytes32), trusts the forwarder for msgSender.
    InfrastructureContract {
        contract_type: InfraContractType::CloneFactory,
        name: "TWCloneFactory",
        bytecode: &hex!(
            "60208038036000396000516000556100f68061001b6000396000f360003560e01c6311b804ab1461001457600080fd5b338060005414156100295750601436033560601c5b8060601b6080526044356094526034608020733d602d80600a3d3981f3363d3d373d3d3d363d7360601b60005260043560601b6014526e5af43d82803e903d91602b57fd5bf360881b602852603760006000f580156100f15780600052816004357f9e0862c4ebff2150fbbfd3f8547483f55bdec0c34fd977d3fccaa55d6c4ce78460206000a3602435600401803580156100e55780916020016020376000808260206000865af16100df573d6000803e3d6000fd5b506100e8565b50505b60005260206000f35b600080fd"
        ),
        dependencies: &[InfraContractType::Forwarder],
        predicted_address: address!("0xc21bAca4B33a39CDD92D402bDBd6aa9bEc0e17C1"),
        keyless_from: address!("0xBaee18F7bF95C0b59f6b1D81F72Cef275ab85021"),
    },
];

/// Creation code of [`ThrowawayDeployer`]; its constructor arguments are appended per batch.
pub const THROWAWAY_DEPLOYER_BYTECODE: &[u8] = &hex!(
    "6100608038039060003960005b602051811015610051578060051b6040015160400180513b6100485780604001518101600080825183602001600086602001515af11561005657505b5060010161000c565b600080f35b3d6000803e3d6000fd"
);

impl InfraContractType {
    pub fn contract(&self) -> &'static InfrastructureContract {
        let index = match self {
            InfraContractType::Forwarder => 0,
            InfraContractType::EoaForwarder => 1,
            InfraContractType::NativeTokenWrapper => 2,
            InfraContractType::CloneFactory => 3,
        };
        &INFRA_CONTRACTS[index]
    }

    pub fn address(&self) -> Address {
        self.contract().predicted_address
    }
}

impl InfrastructureContract {
    /// Each dependency's address as one ABI word.
    pub fn constructor_args(&self) -> Bytes {
        self.dependencies
            .iter()
            .flat_map(|dep| dep.address().into_word().0)
            .collect::<Vec<u8>>()
            .into()
    }

    pub fn precompute(&self) -> Result<PrecomputedDeploymentTransaction> {
        precompute_deployment(self.bytecode, &self.constructor_args(), true)
    }
}

/// `required` plus everything it transitively depends on, dependencies first.
pub fn with_dependencies(
    required: impl IntoIterator<Item = InfraContractType>,
) -> Vec<InfraContractType> {
    let mut resolved = BTreeSet::new();
    let mut stack: Vec<InfraContractType> = required.into_iter().collect();
    while let Some(contract_type) = stack.pop() {
        if resolved.insert(contract_type) {
            stack.extend_from_slice(contract_type.contract().dependencies);
        }
    }
    resolved.into_iter().collect()
}

/// Init code deploying every `(predictedAddress, to, data)` entry in a single transaction.
pub fn throwaway_deployer_init_code(txs: Vec<ThrowawayDeployer::Transaction>) -> Bytes {
    let args = ThrowawayDeployer::constructorCall { txs }.abi_encode();
    [THROWAWAY_DEPLOYER_BYTECODE, args.as_slice()].concat().into()
}
