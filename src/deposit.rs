use alloy::primitives::{Address, B256};
use log::*;
use serde_derive::{Deserialize, Serialize};

use crate::{
    bls::{self, BlsBackend, SecretKey},
    domain,
    errors::{DepositError, Result},
    helpers,
    network::NetworkConfig,
    ssz::{
        BlsPubkey, BlsSignature, DepositData, DepositMessage, ForkVersion, SigningData,
        SszContainer,
    },
};

/// 32 ETH in gwei, the initial deposit of a validator
pub const DEPOSIT_AMOUNT_GWEI: u64 = 32_000_000_000;

/// Withdrawal credentials type byte for an execution layer (eth1) address
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: u8 = 0x01;

/// `0x01 ++ 11 zero bytes ++ address`
pub fn withdrawal_credentials(address: Address) -> B256 {
    let mut credentials = [0u8; 32];
    credentials[0] = ETH1_ADDRESS_WITHDRAWAL_PREFIX;
    credentials[12..].copy_from_slice(address.as_slice());
    B256::from(credentials)
}

/// The address encoded in eth1 withdrawal credentials
pub fn withdrawal_address(credentials: &B256) -> Result<Address> {
    match credentials[0] == ETH1_ADDRESS_WITHDRAWAL_PREFIX
        && credentials[1..12].iter().all(|b| *b == 0)
    {
        true => Ok(Address::from_slice(&credentials[12..])),
        false => Err(DepositError::InvalidAddressFormat(format!(
            "not eth1 withdrawal credentials: {}",
            credentials
        ))),
    }
}

/// `hash_tree_root(SigningData(object_root, domain))`
pub fn compute_signing_root(object_root: B256, domain: B256) -> B256 {
    SigningData::new(object_root, domain).hash_tree_root()
}

/// A signed deposit ready for the deposit contract, in the deposit-cli json shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDepositData {
    pub pubkey: BlsPubkey,
    pub withdrawal_credentials: B256,
    pub amount: u64,
    pub signature: BlsSignature,
    pub deposit_message_root: B256,
    pub deposit_data_root: B256,
    pub fork_version: ForkVersion,
    pub network_name: String,
}

impl OperatorDepositData {
    pub fn deposit_message(&self) -> DepositMessage {
        DepositMessage {
            pubkey: self.pubkey,
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
        }
    }

    pub fn deposit_data(&self) -> DepositData {
        DepositData {
            pubkey: self.pubkey,
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
            signature: self.signature,
        }
    }

    pub fn withdrawal_address(&self) -> Result<Address> {
        withdrawal_address(&self.withdrawal_credentials)
    }
}

/// Signs a 32 ETH deposit for `secret_key` withdrawing to `withdrawal_target`,
/// using the installed BLS backend.
pub fn build_deposit_data(
    secret_key: &SecretKey,
    withdrawal_target: Address,
    network: &NetworkConfig,
) -> Result<OperatorDepositData> {
    build_deposit_data_with(bls::backend(), secret_key, withdrawal_target, network)
}

pub fn build_deposit_data_with(
    backend: &dyn BlsBackend,
    secret_key: &SecretKey,
    withdrawal_target: Address,
    network: &NetworkConfig,
) -> Result<OperatorDepositData> {
    let pubkey = backend.public_key(secret_key)?;
    let withdrawal_credentials = withdrawal_credentials(withdrawal_target);

    let message = DepositMessage {
        pubkey,
        withdrawal_credentials,
        amount: DEPOSIT_AMOUNT_GWEI,
    };
    let deposit_message_root = message.hash_tree_root();
    let domain = domain::deposit_domain(network);
    let signing_root = compute_signing_root(deposit_message_root, domain);
    trace!(
        "deposit_message_root: {} domain: {} signing_root: {}",
        deposit_message_root, domain, signing_root
    );

    // The signing root is signed, never the message root itself
    let signature = backend.sign(secret_key, signing_root.as_slice())?;

    let deposit_data_root = DepositData {
        pubkey,
        withdrawal_credentials,
        amount: DEPOSIT_AMOUNT_GWEI,
        signature,
    }
    .hash_tree_root();
    debug!(
        "Deposit data for {} on {}: {}",
        helpers::to_hex(pubkey),
        network.name,
        deposit_data_root
    );

    Ok(OperatorDepositData {
        pubkey,
        withdrawal_credentials,
        amount: DEPOSIT_AMOUNT_GWEI,
        signature,
        deposit_message_root,
        deposit_data_root,
        fork_version: network.fork_version,
        network_name: network.name.clone(),
    })
}
