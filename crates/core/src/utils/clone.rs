use crate::utils::create2::create2_address;
use alloy::primitives::{Address, B256, Bytes, hex, keccak256};
use uuid::Uuid;

const CLONE_PREFIX: &[u8] = &hex!("3d602d80600a3d3981f3363d3d373d3d3d363d73");
const CLONE_SUFFIX: &[u8] = &hex!("5af43d82803e903d91602b57fd5bf3");
/// Creation code length of [`clone_init_code`]; the runtime follows it.
const CLONE_CREATION_LEN: usize = 10;

/// Constructor of an initialized clone around the implementation address. It delegatecalls
/// the implementation with the calldata appended after the runtime, bubbles a revert, then
/// returns the runtime. Offsets assume a 67 byte constructor and a 45 byte runtime.
const INITIALIZED_CLONE_PREFIX: &[u8] = &hex!("61007080380380916000396000600091600073");
const INITIALIZED_CLONE_SUFFIX: &[u8] =
    &hex!("5af46035573d6000803e3d6000fd5b602d610043600039602d6000f3");

/// EIP-1167 minimal proxy creation code delegating to `implementation`.
pub fn clone_init_code(implementation: Address) -> Bytes {
    Bytes::from([CLONE_PREFIX, implementation.as_slice(), CLONE_SUFFIX].concat())
}

/// EIP-1167 clone whose constructor runs `init_data` against `implementation`, so the proxy
/// exists and is initialized within one transaction. Empty `init_data` gives a plain clone.
pub fn initialized_clone_init_code(implementation: Address, init_data: &[u8]) -> Bytes {
    if init_data.is_empty() {
        return clone_init_code(implementation);
    }
    let clone = clone_init_code(implementation);
    Bytes::from(
        [
            INITIALIZED_CLONE_PREFIX,
            implementation.as_slice(),
            INITIALIZED_CLONE_SUFFIX,
            &clone[CLONE_CREATION_LEN..],
            init_data,
        ]
        .concat(),
    )
}

/// Implementation and initializer calldata of an [`initialized_clone_init_code`].
pub fn decode_initialized_clone(init_code: &[u8]) -> Option<(Address, &[u8])> {
    let rest = init_code.strip_prefix(INITIALIZED_CLONE_PREFIX)?;
    let implementation = Address::from_slice(rest.get(..20)?);
    let rest = rest[20..].strip_prefix(INITIALIZED_CLONE_SUFFIX)?;
    let runtime_len = CLONE_PREFIX.len() - CLONE_CREATION_LEN + 20 + CLONE_SUFFIX.len();
    Some((implementation, rest.get(runtime_len..)?))
}

/// Salt the clone factory actually passes to CREATE2: `keccak256(deployer ‖ salt)`.
pub fn clone_salt_hash(deployer: Address, salt: B256) -> B256 {
    keccak256([deployer.as_slice(), salt.as_slice()].concat())
}

/// Address `deployProxyByImplementation(implementation, _, salt)` yields when sent by `deployer`.
pub fn predict_clone_address(
    clone_factory: Address,
    implementation: Address,
    deployer: Address,
    salt: B256,
) -> Address {
    create2_address(
        clone_factory,
        clone_salt_hash(deployer, salt),
        keccak256(clone_init_code(implementation)),
    )
}

/// Proxy salt from a caller-chosen string, or a random one.
pub fn proxy_salt(explicit: Option<&str>) -> B256 {
    match explicit {
        Some(salt) => keccak256(salt),
        None => keccak256(Uuid::new_v4().as_bytes()),
    }
}
