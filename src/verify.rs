//! Local deposit signature checks, run before any deposit is submitted.
//!
//! Verification never fails with an error: malformed input is logged and
//! reported as an invalid deposit.
use alloy::primitives::B256;
use log::*;

use crate::{
    bls::{self, BlsBackend},
    deposit::{OperatorDepositData, compute_signing_root},
    domain,
    errors::Result,
    helpers,
    network::NetworkConfig,
    ssz::{DepositData, SszContainer, fixed_field},
};

/// Which root the deposit signature is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyAgainst {
    /// The deposit message root, as the beacon chain checks it. The claimed
    /// deposit data root must also match the deposit fields.
    #[default]
    DepositMessageRoot,
    /// The supplied deposit data root taken as the signed object. Only data
    /// produced by a generator that signed the data root passes.
    DepositDataRoot,
}

/// Verifies `signature` by `pubkey` over the deposit signing root of `object_root`
pub fn verify_signing_root(
    pubkey: &[u8],
    signature: &[u8],
    object_root: B256,
    network: &NetworkConfig,
) -> bool {
    verify_signing_root_with(bls::backend(), pubkey, signature, object_root, network)
}

pub fn verify_signing_root_with(
    backend: &dyn BlsBackend,
    pubkey: &[u8],
    signature: &[u8],
    object_root: B256,
    network: &NetworkConfig,
) -> bool {
    let signing_root = compute_signing_root(object_root, domain::deposit_domain(network));
    match backend.verify(pubkey, signing_root.as_slice(), signature) {
        Ok(valid) => {
            if !valid {
                debug!(
                    "Signature mismatch for {} on {}",
                    helpers::to_hex(pubkey),
                    network
                );
            }
            valid
        }
        Err(e) => {
            warn!("Signature verification failed for {}: {}", helpers::to_hex(pubkey), e);
            false
        }
    }
}

/// Checks `signature` taken as a signature over `deposit_data_root` itself
/// ([`VerifyAgainst::DepositDataRoot`]).
///
/// Only signatures made over a data root pass. Deposits from
/// [`crate::deposit::build_deposit_data`] sign the deposit message root and are
/// rejected here; check those with [`verify_deposit_data`] or [`verify_deposit`].
pub fn verify(
    pubkey: &[u8],
    signature: &[u8],
    deposit_data_root: &[u8],
    network: &NetworkConfig,
) -> bool {
    match root_from_slice(deposit_data_root) {
        Ok(root) => verify_signing_root(pubkey, signature, root, network),
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}

/// Checks a full deposit record (fields as found in deposit data files or
/// contract storage).
pub fn verify_deposit(
    pubkey: &[u8],
    withdrawal_credentials: &[u8],
    amount: u64,
    signature: &[u8],
    deposit_data_root: &[u8],
    network: &NetworkConfig,
    against: VerifyAgainst,
) -> bool {
    let data = match DepositData::from_slices(pubkey, withdrawal_credentials, amount, signature) {
        Ok(data) => data,
        Err(e) => {
            warn!("Malformed deposit: {}", e);
            return false;
        }
    };
    match root_from_slice(deposit_data_root) {
        Ok(root) => check_deposit(bls::backend(), &data, root, network, against),
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}

fn check_deposit(
    backend: &dyn BlsBackend,
    data: &DepositData,
    deposit_data_root: B256,
    network: &NetworkConfig,
    against: VerifyAgainst,
) -> bool {
    let pubkey = data.pubkey.as_slice();
    let signature = data.signature.as_slice();
    match against {
        VerifyAgainst::DepositDataRoot => {
            verify_signing_root_with(backend, pubkey, signature, deposit_data_root, network)
        }
        VerifyAgainst::DepositMessageRoot => {
            let computed = data.hash_tree_root();
            if computed != deposit_data_root {
                debug!(
                    "Deposit data root mismatch: claimed {} computed {}",
                    deposit_data_root, computed
                );
                return false;
            }
            let message_root = data.as_deposit_message().hash_tree_root();
            verify_signing_root_with(backend, pubkey, signature, message_root, network)
        }
    }
}

/// Checks a deposit produced by [`crate::deposit::build_deposit_data`] or
/// loaded from a deposit data file. The record must also belong to `network`.
pub fn verify_deposit_data(
    deposit: &OperatorDepositData,
    network: &NetworkConfig,
    against: VerifyAgainst,
) -> bool {
    verify_deposit_data_with(bls::backend(), deposit, network, against)
}

pub fn verify_deposit_data_with(
    backend: &dyn BlsBackend,
    deposit: &OperatorDepositData,
    network: &NetworkConfig,
    against: VerifyAgainst,
) -> bool {
    if deposit.fork_version != network.fork_version {
        warn!(
            "Deposit for fork version {} checked against {}",
            deposit.fork_version, network
        );
    }
    if against == VerifyAgainst::DepositMessageRoot {
        let message_root = deposit.deposit_message().hash_tree_root();
        if message_root != deposit.deposit_message_root {
            debug!(
                "Deposit message root mismatch: claimed {} computed {}",
                deposit.deposit_message_root, message_root
            );
            return false;
        }
    }
    check_deposit(
        backend,
        &deposit.deposit_data(),
        deposit.deposit_data_root,
        network,
        against,
    )
}

fn root_from_slice(root: &[u8]) -> Result<B256> {
    fixed_field::<32>("deposit_data_root", root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deposit::build_deposit_data, keygen};
    use alloy::primitives::Address;

    fn fresh_deposit(network: &NetworkConfig) -> OperatorDepositData {
        let sk = keygen::random_secret_key().unwrap();
        build_deposit_data(&sk, Address::repeat_byte(0x42), network).unwrap()
    }

    fn check(deposit: &OperatorDepositData, network: &NetworkConfig) -> bool {
        verify_deposit_data(deposit, network, VerifyAgainst::DepositMessageRoot)
    }

    #[test]
    fn round_trip() {
        for name in ["mainnet", "goerli", "holesky", "gnosis"] {
            let network = NetworkConfig::from_name(name).unwrap();
            let deposit = fresh_deposit(&network);
            assert!(check(&deposit, &network), "{name} deposit must verify");
            assert!(verify_signing_root(
                deposit.pubkey.as_slice(),
                deposit.signature.as_slice(),
                deposit.deposit_message_root,
                &network
            ));
        }
    }

    #[test]
    fn single_bit_flips_fail() {
        let network = NetworkConfig::mainnet();
        let deposit = fresh_deposit(&network);
        for byte in [0usize, 1, 24, 47] {
            for bit in [0u8, 5, 7] {
                let mut flipped = deposit.clone();
                flipped.pubkey[byte] ^= 1 << bit;
                assert!(!check(&flipped, &network), "pubkey byte {byte} bit {bit}");
            }
        }
        for byte in [0usize, 1, 48, 95] {
            for bit in [0u8, 5, 7] {
                let mut flipped = deposit.clone();
                flipped.signature[byte] ^= 1 << bit;
                assert!(!check(&flipped, &network), "signature byte {byte} bit {bit}");
            }
        }
        for byte in [0usize, 16, 31] {
            let mut flipped = deposit.clone();
            flipped.deposit_data_root[byte] ^= 1;
            assert!(!check(&flipped, &network), "deposit data root byte {byte}");
        }
        let mut flipped = deposit.clone();
        flipped.withdrawal_credentials[31] ^= 1;
        assert!(!check(&flipped, &network), "withdrawal credentials");
        let mut flipped = deposit;
        flipped.amount += 1;
        assert!(!check(&flipped, &network), "amount");
    }

    #[test]
    fn wrong_network_fails() {
        let mainnet = NetworkConfig::mainnet();
        let goerli = NetworkConfig::from_name("goerli").unwrap();
        let gnosis = NetworkConfig::from_name("gnosis").unwrap();
        let deposit = fresh_deposit(&mainnet);
        assert!(!check(&deposit, &goerli));
        assert!(!check(&deposit, &gnosis));
        assert!(!check(&fresh_deposit(&goerli), &mainnet));
        // Same fork version, same domain
        assert!(check(&deposit, &NetworkConfig::from_name("hardhat").unwrap()));
    }

    #[test]
    fn deposit_data_root_convention() {
        let network = NetworkConfig::mainnet();
        let deposit = fresh_deposit(&network);
        // The builder signs the message root, so the data root convention rejects it
        assert!(!verify_deposit_data(&deposit, &network, VerifyAgainst::DepositDataRoot));
        assert!(!verify(
            deposit.pubkey.as_slice(),
            deposit.signature.as_slice(),
            deposit.deposit_data_root.as_slice(),
            &network
        ));

        // A signature made over the data root passes it
        let sk = keygen::derive_master(&[0u8; 32]).unwrap();
        let root = B256::repeat_byte(0x5a);
        let signing_root = compute_signing_root(root, domain::deposit_domain(&network));
        let signature = bls::sign(&sk, signing_root.as_slice()).unwrap();
        let pubkey = sk.public_key().unwrap();
        assert!(verify(pubkey.as_slice(), signature.as_slice(), root.as_slice(), &network));
        assert!(!verify(pubkey.as_slice(), signature.as_slice(), &root[..31], &network));
    }

    #[test]
    fn malformed_input_is_false() {
        let network = NetworkConfig::mainnet();
        let deposit = fresh_deposit(&network);
        assert!(!verify_deposit(
            &deposit.pubkey[..47],
            deposit.withdrawal_credentials.as_slice(),
            deposit.amount,
            deposit.signature.as_slice(),
            deposit.deposit_data_root.as_slice(),
            &network,
            VerifyAgainst::DepositMessageRoot,
        ));
        assert!(!verify(&[0u8; 48], &[0u8; 96], &[0u8; 32], &network));
        assert!(!verify(&[], &[], &[], &network));
    }
}
