//! Deposit data for a run of clone deployments.
//!
//! Each operator key is paired with a salt. The clone address for that salt becomes
//! the withdrawal target, and every record is verified locally before it is kept.
use alloy::primitives::{Address, B256};
use log::*;
use serde_derive::{Deserialize, Serialize};

use crate::{
    address,
    bls::{self, BlsBackend, SecretKey},
    deposit::{self, OperatorDepositData},
    errors::{DepositError, Result},
    network::NetworkConfig,
    verify::{self, VerifyAgainst},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub salt: B256,
    pub contract_address: Address,
    pub deposit: OperatorDepositData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    /// Entries that passed local verification, in salt order
    pub prepared: Vec<BatchEntry>,
    /// The entry that failed verification and ended the batch
    pub rejected: Option<BatchEntry>,
}

impl Batch {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_none()
    }
}

pub fn prepare_batch(
    keys: &[SecretKey],
    deployer: Address,
    implementation: Address,
    salts: &[B256],
    network: &NetworkConfig,
) -> Result<Batch> {
    prepare_batch_with(bls::backend(), keys, deployer, implementation, salts, network)
}

pub fn prepare_batch_with(
    backend: &dyn BlsBackend,
    keys: &[SecretKey],
    deployer: Address,
    implementation: Address,
    salts: &[B256],
    network: &NetworkConfig,
) -> Result<Batch> {
    if keys.len() != salts.len() {
        return Err(DepositError::BatchLength {
            keys: keys.len(),
            salts: salts.len(),
        });
    }

    let mut batch = Batch::default();
    for (i, (key, salt)) in keys.iter().zip(salts).enumerate() {
        let contract_address = address::derive_address(deployer, *salt, implementation);
        let deposit =
            deposit::build_deposit_data_with(backend, key, contract_address, network)?;
        let entry = BatchEntry {
            salt: *salt,
            contract_address,
            deposit,
        };
        if !verify::verify_deposit_data_with(
            backend,
            &entry.deposit,
            network,
            VerifyAgainst::DepositMessageRoot,
        ) {
            error!(
                "Deposit signature invalid for pubkey {} (entry {})",
                entry.deposit.pubkey, i
            );
            batch.rejected = Some(entry);
            break;
        }
        debug!("[{}] {} => {}", i, salt, contract_address);
        batch.prepared.push(entry);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bls::Blst,
        errors::BlsError,
        keygen,
        ssz::{BlsPubkey, BlsSignature},
    };
    use alloy::primitives::address;

    const DEPLOYER: Address = address!("deadbeef00000000000000000000000000000000");
    const IMPLEMENTATION: Address = address!("bebebebebebebebebebebebebebebebebebebebe");

    /// Signs garbage for one key, everything else goes to blst
    struct FaultySigner {
        bad_key: SecretKey,
    }

    impl BlsBackend for FaultySigner {
        fn name(&self) -> &'static str {
            "faulty"
        }

        fn public_key(&self, secret: &SecretKey) -> std::result::Result<BlsPubkey, BlsError> {
            Blst.public_key(secret)
        }

        fn sign(
            &self,
            secret: &SecretKey,
            message: &[u8],
        ) -> std::result::Result<BlsSignature, BlsError> {
            match *secret == self.bad_key {
                true => Blst.sign(secret, b"not the signing root"),
                false => Blst.sign(secret, message),
            }
        }

        fn verify(
            &self,
            pubkey: &[u8],
            message: &[u8],
            signature: &[u8],
        ) -> std::result::Result<bool, BlsError> {
            Blst.verify(pubkey, message, signature)
        }
    }

    fn keys(n: usize) -> Vec<SecretKey> {
        (0..n)
            .map(|_| keygen::random_secret_key().unwrap())
            .collect()
    }

    #[test]
    fn prepares_every_entry() {
        let keys = keys(3);
        let salts: Vec<B256> = (1..=3).map(address::salt_from_index).collect();
        let network = NetworkConfig::mainnet();
        let batch = prepare_batch(&keys, DEPLOYER, IMPLEMENTATION, &salts, &network).unwrap();
        assert!(batch.is_complete());
        assert_eq!(batch.prepared.len(), 3);
        assert_eq!(
            batch.prepared[0].contract_address,
            address!("7730997904463f97f27982aedfaf1adba9a0e6b4")
        );
        for entry in &batch.prepared {
            assert_eq!(
                entry.deposit.withdrawal_address().unwrap(),
                entry.contract_address,
                "withdrawal target must be the clone"
            );
            assert!(verify::verify_deposit_data(
                &entry.deposit,
                &network,
                VerifyAgainst::DepositMessageRoot
            ));
        }
    }

    #[test]
    fn stops_at_first_failure() {
        let keys = keys(4);
        let salts: Vec<B256> = (1..=4).map(address::salt_from_index).collect();
        let backend = FaultySigner {
            bad_key: keys[2].clone(),
        };
        let batch = prepare_batch_with(
            &backend,
            &keys,
            DEPLOYER,
            IMPLEMENTATION,
            &salts,
            &NetworkConfig::mainnet(),
        )
        .unwrap();
        assert!(!batch.is_complete());
        assert_eq!(batch.prepared.len(), 2, "entries after the failure are not built");
        let rejected = batch.rejected.unwrap();
        assert_eq!(rejected.salt, salts[2]);
        assert_eq!(rejected.deposit.pubkey, keys[2].public_key().unwrap());
    }

    #[test]
    fn mismatched_lengths() {
        let err = prepare_batch(
            &keys(2),
            DEPLOYER,
            IMPLEMENTATION,
            &[address::salt_from_index(1)],
            &NetworkConfig::mainnet(),
        )
        .unwrap_err();
        assert_eq!(err, DepositError::BatchLength { keys: 2, salts: 1 });
    }
}
