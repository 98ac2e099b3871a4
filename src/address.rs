//! CREATE2 addresses of EIP-1167 minimal proxy clones.
//!
//! The factory deploys `MINIMAL_PROXY_PREFIX ++ implementation ++ MINIMAL_PROXY_SUFFIX`
//! as init code, so a clone address is known before the clone exists and can be
//! used as the deposit withdrawal target.
//! <https://eips.ethereum.org/EIPS/eip-1167>
use alloy::primitives::{Address, B256, keccak256};
use log::*;
use rand::RngCore;

/// Init code up to the implementation address
pub const MINIMAL_PROXY_PREFIX: [u8; 20] = [
    0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d,
    0x3d, 0x36, 0x3d, 0x73,
];

/// Init code after the implementation address
pub const MINIMAL_PROXY_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

const ADDRESS_LEN: usize = 20;

/// Byte offset of the implementation address in the init code
pub const IMPLEMENTATION_OFFSET: usize = MINIMAL_PROXY_PREFIX.len();

pub const MINIMAL_PROXY_INIT_CODE_LEN: usize =
    MINIMAL_PROXY_PREFIX.len() + ADDRESS_LEN + MINIMAL_PROXY_SUFFIX.len();

/// Clone init code with `implementation` spliced in at [`IMPLEMENTATION_OFFSET`]
pub fn minimal_proxy_init_code(implementation: Address) -> [u8; MINIMAL_PROXY_INIT_CODE_LEN] {
    let mut code = [0u8; MINIMAL_PROXY_INIT_CODE_LEN];
    code[..IMPLEMENTATION_OFFSET].copy_from_slice(&MINIMAL_PROXY_PREFIX);
    code[IMPLEMENTATION_OFFSET..IMPLEMENTATION_OFFSET + ADDRESS_LEN]
        .copy_from_slice(implementation.as_slice());
    code[IMPLEMENTATION_OFFSET + ADDRESS_LEN..].copy_from_slice(&MINIMAL_PROXY_SUFFIX);
    code
}

pub fn minimal_proxy_init_code_hash(implementation: Address) -> B256 {
    keccak256(minimal_proxy_init_code(implementation))
}

/// `keccak256(0xff ++ deployer ++ salt ++ init_code_hash)[12..]`
pub fn create2_address(deployer: Address, salt: B256, init_code_hash: B256) -> Address {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(deployer.as_slice());
    preimage[21..53].copy_from_slice(salt.as_slice());
    preimage[53..].copy_from_slice(init_code_hash.as_slice());
    Address::from_slice(&keccak256(preimage)[12..])
}

/// Address of the clone of `implementation` that `deployer` creates with `salt`
pub fn derive_address(deployer: Address, salt: B256, implementation: Address) -> Address {
    let address = create2_address(deployer, salt, minimal_proxy_init_code_hash(implementation));
    trace!(
        "create2 deployer: {} salt: {} implementation: {} => {}",
        deployer, salt, implementation, address
    );
    address
}

/// `index` left padded to 32 bytes, the salt used for sequential deployments
pub fn salt_from_index(index: u64) -> B256 {
    let mut salt = [0u8; 32];
    salt[24..].copy_from_slice(&index.to_be_bytes());
    B256::from(salt)
}

pub fn random_salt() -> B256 {
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; 32];
    rng.fill_bytes(&mut salt);
    B256::from(salt)
}
