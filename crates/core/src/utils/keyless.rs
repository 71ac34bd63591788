use crate::types::precomputed::KeylessTransaction;
use crate::utils::create2::{CREATE2_FACTORY_ADDRESS, compute_create2_address};
use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Bytes, PrimitiveSignature, TxKind, U256, hex};

/// 100 gwei. Fixed so the signed payload never changes.
pub const KEYLESS_GAS_PRICE: u128 = 100_000_000_000;
pub const KEYLESS_GAS_LIMIT: u64 = 500_000;
pub const CREATE2_FACTORY_GAS_LIMIT: u64 = 100_000;

/// Creation code of the deterministic-deployment proxy: `salt ‖ initcode` in, CREATE2 out.
pub const CREATE2_FACTORY_BYTECODE: &[u8] = &hex!(
    "604580600e600039806000f350fe7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe03601600081602082378035828234f58015156039578182fd5b8082525050506014600cf3"
);

const SIGNATURE_COMPONENT: [u8; 32] = [0x22; 32];

/// `r = s = 0x2222…22`, `v = 27`. Nobody knows a key for it; the sender is whatever
/// address recovers from it over a given payload.
fn keyless_signature() -> PrimitiveSignature {
    PrimitiveSignature::new(
        U256::from_be_bytes(SIGNATURE_COMPONENT),
        U256::from_be_bytes(SIGNATURE_COMPONENT),
        false,
    )
}

/// Attaches the fixed signature to a pre-EIP-155 legacy transaction and recovers its sender.
pub fn sign_keyless(tx: TxLegacy) -> eyre::Result<KeylessTransaction> {
    let signature = keyless_signature();
    let from = signature.recover_address_from_prehash(&tx.signature_hash())?;
    let gas_limit = tx.gas_limit;
    let gas_price = tx.gas_price;

    let envelope = TxEnvelope::from(tx.into_signed(signature));

    Ok(KeylessTransaction {
        from,
        raw_signed_transaction: Bytes::from(envelope.encoded_2718()),
        gas_limit,
        gas_price,
    })
}

/// Replayable deployment of `bytecode ‖ args` through the canonical CREATE2 factory.
///
/// No chain id is signed in, so the same bytes are valid on every chain and the
/// recovered sender only depends on the inputs.
pub fn construct_keyless_transaction(
    bytecode: &[u8],
    constructor_args: &[u8],
) -> eyre::Result<KeylessTransaction> {
    let computation = compute_create2_address(CREATE2_FACTORY_ADDRESS, bytecode, constructor_args);

    sign_keyless(TxLegacy {
        chain_id: None,
        nonce: 0,
        gas_price: KEYLESS_GAS_PRICE,
        gas_limit: KEYLESS_GAS_LIMIT,
        to: TxKind::Call(CREATE2_FACTORY_ADDRESS),
        value: U256::ZERO,
        input: computation.raw_deploy_data,
    })
}

/// The well-known transaction that creates the CREATE2 factory itself.
pub fn create2_factory_keyless_transaction() -> eyre::Result<KeylessTransaction> {
    sign_keyless(TxLegacy {
        chain_id: None,
        nonce: 0,
        gas_price: KEYLESS_GAS_PRICE,
        gas_limit: CREATE2_FACTORY_GAS_LIMIT,
        to: TxKind::Create,
        value: U256::ZERO,
        input: Bytes::from_static(CREATE2_FACTORY_BYTECODE),
    })
}
