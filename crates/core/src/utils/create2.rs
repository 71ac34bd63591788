use crate::types::precomputed::PrecomputedDeploymentTransaction;
use crate::utils::keyless::construct_keyless_transaction;
use alloy::primitives::{Address, B256, Bytes, address, keccak256};
use eyre::Result;

/// Canonical deterministic-deployment proxy, same address on every chain it exists on.
pub const CREATE2_FACTORY_ADDRESS: Address = address!("0x4e59b44847b379578588920cA78FbF26c0B4956C");

/// Prefix mixed into every bytecode-derived salt.
pub const SALT_NAMESPACE: &str = "tw.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Create2Computation {
    pub predicted_address: Address,
    pub salt: B256,
    pub bytecode_hash: B256,
    pub init_bytecode_hash: B256,
    /// `salt ‖ bytecode ‖ args`, the calldata the CREATE2 factory expects.
    pub raw_deploy_data: Bytes,
}

/// keccak256 of `"tw." + 0x-hex(keccak256(bytecode))`. Constructor args do not take part.
pub fn bytecode_salt(bytecode: &[u8]) -> B256 {
    let bytecode_hash = keccak256(bytecode);
    keccak256(format!("{}0x{}", SALT_NAMESPACE, hex::encode(bytecode_hash)))
}

pub fn create2_address(factory: Address, salt: B256, init_code_hash: B256) -> Address {
    factory.create2(salt, init_code_hash)
}

pub fn compute_create2_address(
    factory: Address,
    bytecode: &[u8],
    constructor_args: &[u8],
) -> Create2Computation {
    let salt = bytecode_salt(bytecode);
    let init_code = [bytecode, constructor_args].concat();
    let init_bytecode_hash = keccak256(&init_code);

    Create2Computation {
        predicted_address: create2_address(factory, salt, init_bytecode_hash),
        salt,
        bytecode_hash: keccak256(bytecode),
        init_bytecode_hash,
        raw_deploy_data: Bytes::from([salt.as_slice(), &init_code].concat()),
    }
}

/// Everything needed to deploy `bytecode ‖ args` through the canonical factory.
/// `keyless` additionally attaches the signer-less replay transaction.
pub fn precompute_deployment(
    bytecode: &[u8],
    constructor_args: &[u8],
    keyless: bool,
) -> Result<PrecomputedDeploymentTransaction> {
    let computation = compute_create2_address(CREATE2_FACTORY_ADDRESS, bytecode, constructor_args);
    let keyless = if keyless {
        Some(construct_keyless_transaction(bytecode, constructor_args)?)
    } else {
        None
    };

    Ok(PrecomputedDeploymentTransaction {
        salt: computation.salt,
        bytecode_hash: computation.bytecode_hash,
        init_bytecode_hash: computation.init_bytecode_hash,
        predicted_address: computation.predicted_address,
        raw_transaction_data: computation.raw_deploy_data,
        keyless,
    })
}
