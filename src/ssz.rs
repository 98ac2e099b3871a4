//! Fixed-layout SSZ containers used to build and check validator deposits.
//!
//! Only the four containers a deposit needs are modelled here. Every field is a
//! fixed-size byte vector or a `uint64`, so serialization is plain concatenation in
//! declaration order and the hash tree root is computed by `tree_hash`.
use alloy::primitives::{B256, FixedBytes};
use tree_hash::TreeHash;

use crate::errors::{DepositError, Result};

pub const PUBKEY_LEN: usize = 48;
pub const SIGNATURE_LEN: usize = 96;
pub const ROOT_LEN: usize = 32;
pub const FORK_VERSION_LEN: usize = 4;

pub type BlsPubkey = FixedBytes<PUBKEY_LEN>;
pub type BlsSignature = FixedBytes<SIGNATURE_LEN>;
pub type ForkVersion = FixedBytes<FORK_VERSION_LEN>;

/// A container with a fixed byte layout and a merkleized root.
pub trait SszContainer: TreeHash {
    /// Flat SSZ serialization, fields concatenated in declaration order
    fn as_ssz_bytes(&self) -> Vec<u8>;

    fn hash_tree_root(&self) -> B256 {
        self.tree_hash_root()
    }
}

/// Copies `bytes` into a fixed size field, refusing to truncate or pad.
pub fn fixed_field<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<FixedBytes<N>> {
    match bytes.len() == N {
        true => Ok(FixedBytes::<N>::from_slice(bytes)),
        false => Err(DepositError::InvalidFieldLength {
            field,
            expected: N,
            actual: bytes.len(),
        }),
    }
}

/// The object actually signed: a root bound to a domain.
#[derive(Debug, Clone, PartialEq, Eq, tree_hash_derive::TreeHash)]
pub struct SigningData {
    pub object_root: B256,
    pub domain: B256,
}

impl SigningData {
    pub fn new(object_root: B256, domain: B256) -> Self {
        Self {
            object_root,
            domain,
        }
    }

    pub fn from_slices(object_root: &[u8], domain: &[u8]) -> Result<Self> {
        Ok(Self {
            object_root: fixed_field("object_root", object_root)?,
            domain: fixed_field("domain", domain)?,
        })
    }
}

impl SszContainer for SigningData {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        [self.object_root.as_slice(), self.domain.as_slice()].concat()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, tree_hash_derive::TreeHash)]
pub struct ForkData {
    pub current_version: ForkVersion,
    pub genesis_validators_root: B256,
}

impl ForkData {
    pub fn from_slices(current_version: &[u8], genesis_validators_root: &[u8]) -> Result<Self> {
        Ok(Self {
            current_version: fixed_field("current_version", current_version)?,
            genesis_validators_root: fixed_field(
                "genesis_validators_root",
                genesis_validators_root,
            )?,
        })
    }
}

impl SszContainer for ForkData {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        [
            self.current_version.as_slice(),
            self.genesis_validators_root.as_slice(),
        ]
        .concat()
    }
}

/// The part of a deposit covered by the validator signature.
#[derive(Debug, Clone, PartialEq, Eq, tree_hash_derive::TreeHash)]
pub struct DepositMessage {
    /// Validator public key
    pub pubkey: BlsPubkey,
    /// Withdrawal credentials
    pub withdrawal_credentials: B256,
    /// Amount of ether deposited in gwei
    pub amount: u64,
}

impl DepositMessage {
    pub fn from_slices(pubkey: &[u8], withdrawal_credentials: &[u8], amount: u64) -> Result<Self> {
        Ok(Self {
            pubkey: fixed_field("pubkey", pubkey)?,
            withdrawal_credentials: fixed_field("withdrawal_credentials", withdrawal_credentials)?,
            amount,
        })
    }
}

impl SszContainer for DepositMessage {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        [
            self.pubkey.as_slice(),
            self.withdrawal_credentials.as_slice(),
            &self.amount.to_le_bytes(),
        ]
        .concat()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, tree_hash_derive::TreeHash)]
pub struct DepositData {
    /// Validator public key
    pub pubkey: BlsPubkey,
    /// Withdrawal credentials
    pub withdrawal_credentials: B256,
    /// Amount of ether deposited in gwei
    pub amount: u64,
    /// Deposit signature
    pub signature: BlsSignature,
}

impl DepositData {
    pub fn from_slices(
        pubkey: &[u8],
        withdrawal_credentials: &[u8],
        amount: u64,
        signature: &[u8],
    ) -> Result<Self> {
        Ok(Self {
            pubkey: fixed_field("pubkey", pubkey)?,
            withdrawal_credentials: fixed_field("withdrawal_credentials", withdrawal_credentials)?,
            amount,
            signature: fixed_field("signature", signature)?,
        })
    }

    /// The signed subset of this deposit
    pub fn as_deposit_message(&self) -> DepositMessage {
        DepositMessage {
            pubkey: self.pubkey,
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
        }
    }
}

impl SszContainer for DepositData {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        [
            self.pubkey.as_slice(),
            self.withdrawal_credentials.as_slice(),
            &self.amount.to_le_bytes(),
            self.signature.as_slice(),
        ]
        .concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{b256, hex};

    const PUBKEY: [u8; 48] = hex!(
        "a695ad325dfc7e1191fbc9f186f58eff42a634029731b18380ff89bf42c464a42cb8ca55b200f051f57f1e1893c68759"
    );
    const CREDENTIALS: [u8; 32] =
        hex!("0100000000000000000000000000000000000000000000000000000000000001");

    #[test]
    fn rejects_wrong_pubkey_length() {
        for len in [47usize, 49] {
            let err = DepositMessage::from_slices(&vec![0xab; len], &CREDENTIALS, 32_000_000_000)
                .unwrap_err();
            assert_eq!(
                err,
                DepositError::InvalidFieldLength {
                    field: "pubkey",
                    expected: 48,
                    actual: len
                },
                "pubkey of {len} bytes must be rejected"
            );
        }
    }

    #[test]
    fn rejects_wrong_signature_and_root_lengths() {
        let err = DepositData::from_slices(&PUBKEY, &CREDENTIALS, 1, &[0u8; 95]).unwrap_err();
        assert!(matches!(
            err,
            DepositError::InvalidFieldLength {
                field: "signature",
                ..
            }
        ));
        let err = SigningData::from_slices(&[0u8; 31], &[0u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            DepositError::InvalidFieldLength {
                field: "object_root",
                ..
            }
        ));
        let err = ForkData::from_slices(&[0u8; 5], &[0u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            DepositError::InvalidFieldLength {
                field: "current_version",
                ..
            }
        ));
    }

    #[test]
    fn deposit_message_serialization_layout() {
        let msg = DepositMessage::from_slices(&PUBKEY, &CREDENTIALS, 32_000_000_000).unwrap();
        let bytes = msg.as_ssz_bytes();
        assert_eq!(bytes.len(), 88);
        assert_eq!(&bytes[..48], &PUBKEY[..]);
        assert_eq!(&bytes[48..80], &CREDENTIALS[..]);
        // uint64 little-endian
        assert_eq!(&bytes[80..], &hex!("0040597307000000")[..]);

        let data = DepositData::from_slices(&PUBKEY, &CREDENTIALS, 32_000_000_000, &[0xaa; 96])
            .unwrap();
        assert_eq!(data.as_ssz_bytes().len(), 184);
        assert_eq!(&data.as_ssz_bytes()[..88], &bytes[..]);
    }

    #[test]
    fn fork_data_root_of_zero_values() {
        let fork_data = ForkData::from_slices(&[0u8; 4], &[0u8; 32]).unwrap();
        assert_eq!(fork_data.as_ssz_bytes().len(), 36);
        assert_eq!(
            fork_data.hash_tree_root(),
            b256!("f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b"),
            "fork data root mismatch"
        );
    }

    #[test]
    fn pinned_container_roots() {
        let msg = DepositMessage::from_slices(&PUBKEY, &CREDENTIALS, 32_000_000_000).unwrap();
        let msg_root = msg.hash_tree_root();
        assert_eq!(
            msg_root,
            b256!("bf128255bfe3f4917ad2d3e9af49bf52c13982deaaab5ab0c71f17b68bac16d0"),
            "deposit message root mismatch"
        );

        let signing = SigningData::new(
            msg_root,
            b256!("03000000f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a9"),
        );
        assert_eq!(
            signing.hash_tree_root(),
            b256!("4be8098fc2b14623df0c671ed454c692c0e0cb7f7b5b744f9557fe31dbd702e1"),
            "signing root mismatch"
        );

        let data = DepositData::from_slices(&PUBKEY, &CREDENTIALS, 32_000_000_000, &[0xaa; 96])
            .unwrap();
        assert_eq!(
            data.hash_tree_root(),
            b256!("dc7de54cdac1deafcf4e107da2057f209850adeddaccfb63ecec0bbd423df19a"),
            "deposit data root mismatch"
        );
        assert_eq!(data.as_deposit_message(), msg);
    }
}
