//! BLS signing domains.
//!
//! `domain = domain_type (4 bytes) ++ fork_data_root[..28]`, see
//! <https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#compute_domain>
use alloy::primitives::B256;

use crate::{
    network::NetworkConfig,
    ssz::{ForkData, ForkVersion, SszContainer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DomainType {
    BeaconProposer = 0,
    BeaconAttester = 1,
    Randao = 2,
    Deposit = 3,
    VoluntaryExit = 4,
    SelectionProof = 5,
    AggregateAndProof = 6,
    SyncCommittee = 7,
    SyncCommitteeSelectionProof = 8,
    ContributionAndProof = 9,
}

impl DomainType {
    /// The 4-byte tag, type as first byte followed by zero padding
    pub fn to_bytes(self) -> [u8; 4] {
        [self as u8, 0, 0, 0]
    }
}

impl From<DomainType> for u8 {
    fn from(domain_type: DomainType) -> u8 {
        domain_type as u8
    }
}

pub fn compute_fork_data_root(fork_version: ForkVersion, genesis_validators_root: B256) -> B256 {
    ForkData {
        current_version: fork_version,
        genesis_validators_root,
    }
    .hash_tree_root()
}

pub fn derive_domain(
    domain_type: u8,
    genesis_validators_root: B256,
    fork_version: ForkVersion,
) -> B256 {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[0] = domain_type;
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    B256::from(domain)
}

/// Deposit signing domain for `network`
pub fn deposit_domain(network: &NetworkConfig) -> B256 {
    derive_domain(
        DomainType::Deposit.into(),
        network.genesis_validators_root,
        network.fork_version,
    )
}
