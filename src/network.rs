use alloy::primitives::{Address, B256};
use log::*;
use once_cell::sync::Lazy;
use serde_derive::Deserialize;
use std::collections::BTreeMap;

use crate::{
    errors::{DepositError, Result},
    helpers,
    macros::parse_address,
    ssz::ForkVersion,
};

/// Deposit domains are computed before genesis, the validators root is all zeroes.
/// Scripts traditionally spell this constant as the string `"0"`.
pub const PRE_GENESIS_VALIDATORS_ROOT: B256 = B256::ZERO;

/// Everything needed to bind a deposit signature to one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub fork_version: ForkVersion,
    pub genesis_validators_root: B256,
    pub deposit_contract: Option<Address>,
}

impl NetworkConfig {
    pub fn new(name: &str, fork_version: ForkVersion, genesis_validators_root: B256) -> Self {
        Self {
            name: name.to_string(),
            fork_version,
            genesis_validators_root,
            deposit_contract: None,
        }
    }

    /// Mainnet fork version with the pre-genesis root. This is the only default
    /// offered, callers must ask for it by name.
    pub fn mainnet() -> Self {
        NETWORKS["mainnet"].clone()
    }

    /// Looks up a built-in network, unknown names are an error rather than mainnet.
    pub fn from_name(name: &str) -> Result<Self> {
        match NETWORKS.get(name) {
            Some(network) => Ok(network.clone()),
            None => Err(DepositError::UnknownNetwork(name.to_string())),
        }
    }

    pub fn with_deposit_contract(mut self, deposit_contract: Address) -> Self {
        self.deposit_contract = Some(deposit_contract);
        self
    }
}

impl std::fmt::Display for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} (fork_version: {})", self.name, self.fork_version)
    }
}

/// A network table entry as written in a networks file
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkEntry {
    pub fork_version: String,
    pub genesis_validators_root: Option<String>,
    pub deposit_contract: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworksFile {
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkEntry>,
}

impl NetworkEntry {
    pub fn to_config(&self, name: &str) -> Result<NetworkConfig> {
        let fork_version = helpers::parse_fixed_hex::<4>("fork_version", &self.fork_version)
            .map_err(|_| DepositError::InvalidForkVersion(self.fork_version.clone()))?;
        let genesis_validators_root = match &self.genesis_validators_root {
            Some(root) => helpers::parse_fixed_hex::<32>("genesis_validators_root", root)?,
            None => PRE_GENESIS_VALIDATORS_ROOT,
        };
        let mut network = NetworkConfig::new(name, fork_version, genesis_validators_root);
        if let Some(addr) = &self.deposit_contract {
            network = network.with_deposit_contract(helpers::parse_address(addr)?);
        }
        Ok(network)
    }
}

/// Built-in networks extended (or overridden) by user supplied entries.
#[derive(Debug, Clone)]
pub struct NetworkTable {
    networks: BTreeMap<String, NetworkConfig>,
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self {
            networks: NETWORKS
                .iter()
                .map(|(name, network)| (name.to_string(), network.clone()))
                .collect(),
        }
    }
}

impl NetworkTable {
    pub fn extend(&mut self, file: &NetworksFile) -> Result<&mut Self> {
        for (name, entry) in file.networks.iter() {
            let network = entry.to_config(name)?;
            if self.networks.contains_key(name) {
                warn!("Overriding built-in network {}", name);
            }
            trace!("{:#?}", network);
            self.networks.insert(name.clone(), network);
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<NetworkConfig> {
        self.networks
            .get(name)
            .cloned()
            .ok_or_else(|| DepositError::UnknownNetwork(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.values()
    }
}

fn network(
    name: &'static str,
    fork_version: [u8; 4],
    deposit_contract: Option<&'static str>,
) -> NetworkConfig {
    NetworkConfig {
        name: name.to_string(),
        fork_version: fork_version.into(),
        genesis_validators_root: PRE_GENESIS_VALIDATORS_ROOT,
        deposit_contract: deposit_contract.map(|addr| parse_address!(addr)),
    }
}

pub static NETWORKS: Lazy<BTreeMap<&'static str, NetworkConfig>> = Lazy::new(|| {
    let mut m = BTreeMap::new();
    let mainnet_deposit = Some("0x00000000219ab540356cBB839Cbe05303d7705Fa");
    m.insert("mainnet", network("mainnet", [0x00, 0x00, 0x00, 0x00], mainnet_deposit));
    // Local development chains sign with the mainnet fork version
    m.insert("hardhat", network("hardhat", [0x00, 0x00, 0x00, 0x00], None));
    // Prater fork version, kept under the names the deployment scripts use
    m.insert("testnet", network("testnet", [0x00, 0x00, 0x10, 0x20], None));
    m.insert("ganache", network("ganache", [0x00, 0x00, 0x10, 0x20], None));
    m.insert(
        "goerli",
        network(
            "goerli",
            [0x00, 0x00, 0x10, 0x20],
            Some("0xff50ed3d0ec03aC01D4C79aAd74928BFF48a7b2b"),
        ),
    );
    m.insert(
        "holesky",
        network(
            "holesky",
            [0x01, 0x01, 0x70, 0x00],
            Some("0x4242424242424242424242424242424242424242"),
        ),
    );
    m.insert(
        "sepolia",
        network(
            "sepolia",
            [0x90, 0x00, 0x00, 0x69],
            Some("0x7f02C3E3c98b133055B8B348B2Ac625669Ed295D"),
        ),
    );
    m.insert("hoodi", network("hoodi", [0x10, 0x00, 0x09, 0x10], mainnet_deposit));
    m.insert(
        "gnosis",
        network(
            "gnosis",
            [0x00, 0x00, 0x00, 0x64],
            Some("0x0B98057eA310F4d31F2a452B414647007d1645d9"),
        ),
    );
    m.insert(
        "chiado",
        network(
            "chiado",
            [0x00, 0x00, 0x00, 0x6f],
            Some("0xb97036A26259B7147018913bD58a774cf91acf25"),
        ),
    );
    m
});
