//! Operator commitment stored by the factory alongside a new clone.
//!
//! `keccak256(abi.encodePacked(address, bytes, bytes, bytes32, uint64))`, a flat
//! concatenation unrelated to SSZ merkleization.
use alloy::{
    primitives::{Address, B256, Bytes, keccak256},
    sol_types::SolValue,
};

use crate::deposit::OperatorDepositData;

pub fn commitment(
    contract_address: Address,
    pubkey: &[u8],
    signature: &[u8],
    deposit_data_root: B256,
    exit_date: u64,
) -> B256 {
    let packed = (
        contract_address,
        Bytes::copy_from_slice(pubkey),
        Bytes::copy_from_slice(signature),
        deposit_data_root,
        exit_date,
    )
        .abi_encode_packed();
    keccak256(packed)
}

/// Commitment for a deposit built for the clone at `contract_address`
pub fn deposit_commitment(
    contract_address: Address,
    deposit: &OperatorDepositData,
    exit_date: u64,
) -> B256 {
    commitment(
        contract_address,
        deposit.pubkey.as_slice(),
        deposit.signature.as_slice(),
        deposit.deposit_data_root,
        exit_date,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, hex};

    const CONTRACT: Address = address!("7730997904463f97f27982aedfaf1adba9a0e6b4");
    const PUBKEY: [u8; 48] = hex!(
        "a695ad325dfc7e1191fbc9f186f58eff42a634029731b18380ff89bf42c464a42cb8ca55b200f051f57f1e1893c68759"
    );
    const ROOT: B256 = b256!("dc7de54cdac1deafcf4e107da2057f209850adeddaccfb63ecec0bbd423df19a");
    // 2025-01-01T00:00:00Z
    const EXIT_DATE: u64 = 1_735_689_600;

    #[test]
    fn pinned_commitment() {
        assert_eq!(
            commitment(CONTRACT, &PUBKEY, &[0xaa; 96], ROOT, EXIT_DATE),
            b256!("904d263f7bca3c785df57b31df4c1960d4fa2ddf1894303f4715dc7d11c9598c"),
            "commitment mismatch"
        );
    }

    #[test]
    fn exit_date_is_bound() {
        assert_eq!(
            commitment(CONTRACT, &PUBKEY, &[0xaa; 96], ROOT, EXIT_DATE + 1),
            b256!("34e093b74f86a1274b75bf855e4d34f41c4ad6ee52f84bb05cac5fbc25ce587e"),
            "one second later must change the commitment"
        );
    }

    #[test]
    fn packed_layout() {
        let mut expected = Vec::new();
        expected.extend_from_slice(CONTRACT.as_slice());
        expected.extend_from_slice(&PUBKEY);
        expected.extend_from_slice(&[0xaa; 96]);
        expected.extend_from_slice(ROOT.as_slice());
        // uint64 packs to 8 big-endian bytes
        expected.extend_from_slice(&EXIT_DATE.to_be_bytes());
        assert_eq!(expected.len(), 20 + 48 + 96 + 32 + 8);
        assert_eq!(
            commitment(CONTRACT, &PUBKEY, &[0xaa; 96], ROOT, EXIT_DATE),
            keccak256(&expected)
        );
    }
}
