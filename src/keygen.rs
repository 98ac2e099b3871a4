use alloy::signers::local::coins_bip39::{English, Mnemonic};
use log::*;
use rand::RngCore;

use crate::{
    bls::SecretKey,
    errors::{BlsError, DepositError, Result},
    helpers,
};

/// EIP-2334 signing key path, `{}` is the validator index
pub const VALIDATOR_PATH: &str = "m/12381/3600/{}/0/0";

/// A fresh operator key from 32 bytes of OS randomness (EIP-2333 KeyGen)
pub fn random_secret_key() -> Result<SecretKey> {
    let mut rng = rand::thread_rng();
    let mut ikm = [0u8; 32];
    rng.fill_bytes(&mut ikm);
    secret_key_from_ikm(&ikm)
}

/// Deterministic KeyGen from input key material of at least 32 bytes
pub fn secret_key_from_ikm(ikm: &[u8]) -> Result<SecretKey> {
    let sk = blst::min_pk::SecretKey::key_gen(ikm, &[])
        .map_err(|e| BlsError::KeyGeneration(format!("{:?}", e)))?;
    SecretKey::from_slice(&sk.to_bytes())
}

/// EIP-2333 master key for `seed`
pub fn derive_master(seed: &[u8]) -> Result<SecretKey> {
    let sk = blst::min_pk::SecretKey::derive_master_eip2333(seed)
        .map_err(|e| BlsError::KeyGeneration(format!("{:?}", e)))?;
    SecretKey::from_slice(&sk.to_bytes())
}

/// EIP-2333 child key at `path` below the master key for `seed`
pub fn derive_path(seed: &[u8], path: &[u32]) -> Result<SecretKey> {
    let master = blst::min_pk::SecretKey::derive_master_eip2333(seed)
        .map_err(|e| BlsError::KeyGeneration(format!("{:?}", e)))?;
    let sk = path
        .iter()
        .fold(master, |sk, index| sk.derive_child_eip2333(*index));
    SecretKey::from_slice(&sk.to_bytes())
}

/// Validator signing key for `index` from a BIP-39 mnemonic
pub fn from_mnemonic(
    mnemonic_phrase: &str,
    mnemonic_password: Option<&str>,
    index: u32,
) -> Result<SecretKey> {
    debug!("Using derivation path {}", VALIDATOR_PATH.replace("{}", &index.to_string()));
    let mnemonic = Mnemonic::<English>::new_from_phrase(mnemonic_phrase.trim())
        .map_err(|e| DepositError::Mnemonic(e.to_string()))?;
    let seed = mnemonic
        .to_seed(mnemonic_password)
        .map_err(|e| DepositError::Mnemonic(e.to_string()))?;
    let sk = derive_path(&seed, &[12381, 3600, index, 0, 0])?;
    trace!("pubkey: {}", helpers::to_hex(sk.public_key()?));
    Ok(sk)
}

/// A new random 24 word mnemonic
pub fn new_mnemonic() -> Result<String> {
    let mut rng = rand::thread_rng();
    let phrase = Mnemonic::<English>::new_with_count(&mut rng, 24)
        .map_err(|e| DepositError::Mnemonic(e.to_string()))?;
    Ok(phrase.to_phrase())
}
