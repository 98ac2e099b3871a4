use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{fs::File, io::BufReader};

use eyre::{Result, WrapErr, bail};
use serde_derive::Deserialize;

use clap_serde_derive::{
    ClapSerde,
    clap::{self, Args, Parser, Subcommand, ValueEnum},
};

use alloy::primitives::{Address, B256};

use crate::{
    address, helpers,
    network::{NetworkTable, NetworksFile},
    verify::VerifyAgainst,
};

#[allow(deprecated)]
fn config_dir() -> PathBuf {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config"),
    }
}

fn config_file() -> PathBuf {
    config_dir().join("deposit-knife").join("config.toml")
}

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Config file
    #[arg(short, long = "config", default_value = config_file().into_os_string())]
    pub config_path: Option<PathBuf>,

    /// Global arguments
    #[command(flatten)]
    pub config: <CliArgs as ClapSerde>::Opt,

    // Subcommands
    #[command(subcommand)]
    pub command: CliCmd,
}

// All values are optional, a config file may set any subset of them and
// clap defaults would shadow it
#[derive(Debug, Clone, ClapSerde, Deserialize)]
pub struct CliArgs {
    /// Logging level, 0 (critical) to 5 (trace) [default: 3]
    #[arg(short, long = "log-level", required = false)]
    pub log_level: Option<u8>,

    /// Default network name
    #[arg(short, long, required = false)]
    pub network: Option<String>,

    /// Custom networks file (toml/json/jsonc)
    #[arg(long = "networks-file", required = false)]
    pub networks_file: Option<PathBuf>,

    /// Output directory for generated files [default: .]
    #[arg(long, required = false)]
    pub outdir: Option<PathBuf>,
}

// Command line cmds
#[derive(Subcommand)]
pub enum CliCmd {
    /// Print version information
    #[clap(visible_alias = "ver")]
    Version {},
    /// List known networks
    #[clap(visible_alias = "net")]
    Networks {},
    /// Generate a validator key
    #[clap(visible_alias = "kg")]
    Keygen {
        /// Derive from the mnemonic in this file instead of a random key
        #[arg(long, visible_alias = "mf", required = false)]
        mnemonic_file: Option<PathBuf>,
        /// Mnemonic password
        #[arg(long, visible_alias = "mp", required = false)]
        mnemonic_password: Option<String>,
        /// Validator index in "m/12381/3600/{}/0/0"
        #[arg(long, visible_alias = "i", required = false, default_value_t = 0)]
        index: u32,
        /// Generate a new 24 word mnemonic and derive from it
        #[arg(long, required = false, action = clap::ArgAction::SetTrue, conflicts_with = "mnemonic_file")]
        new_mnemonic: bool,
    },
    /// Build signed deposit data
    #[clap(visible_alias = "dd")]
    DepositData {
        /// Validator secret key (hex)
        #[arg(short, long, required = false, conflicts_with = "key_file")]
        secret_key: Option<String>,
        /// File containing the validator secret key (hex)
        #[arg(short, long, required = false)]
        key_file: Option<PathBuf>,
        /// Withdrawal address, otherwise the clone address is derived
        #[arg(short, long, required = false, conflicts_with = "deployer")]
        withdrawal_address: Option<String>,
        #[command(flatten)]
        clone: CloneArgs,
        /// Output file, relative to the output directory
        #[arg(short, long, value_name = "FILEPATH", required = false)]
        out: Option<PathBuf>,
    },
    /// Build deposit data for a run of clones from mnemonic keys
    #[clap(visible_alias = "b")]
    Batch {
        /// File containing the mnemonic phrase
        #[arg(long, visible_alias = "mf", required = true)]
        mnemonic_file: PathBuf,
        /// Mnemonic password
        #[arg(long, visible_alias = "mp", required = false)]
        mnemonic_password: Option<String>,
        /// First validator index, its clone uses salt index start + 1
        #[arg(long, required = false, default_value_t = 0)]
        start: u32,
        /// Number of deposits
        #[arg(long, required = true)]
        count: u32,
        /// Factory (CREATE2 deployer) address
        #[arg(long, required = true)]
        deployer: String,
        /// Implementation address the clones delegate to
        #[arg(long, required = true)]
        implementation: String,
        /// Output file, relative to the output directory
        #[arg(short, long, value_name = "FILEPATH", required = false)]
        out: Option<PathBuf>,
    },
    /// Predict a clone address
    #[clap(visible_alias = "addr")]
    Address {
        #[command(flatten)]
        clone: CloneArgs,
    },
    /// Compute the operator commitment for a clone
    #[clap(visible_alias = "com")]
    Commitment {
        /// Clone contract address
        #[arg(short, long, required = true)]
        contract: String,
        /// Deposit data file, instead of the individual fields
        #[arg(short, long, required = false, conflicts_with_all = &["pubkey", "signature", "deposit_data_root"])]
        file: Option<PathBuf>,
        /// Validator public key
        #[arg(short, long, required = false)]
        pubkey: Option<String>,
        /// Deposit signature
        #[arg(short, long, required = false)]
        signature: Option<String>,
        /// Deposit data root
        #[arg(short, long, required = false)]
        deposit_data_root: Option<String>,
        /// Exit date, unix seconds or YYYY-MM-DD
        #[arg(short, long, required = true)]
        exit_date: String,
    },
    /// Verify deposit signatures
    #[clap(visible_alias = "v")]
    Verify {
        /// Deposit data file (one deposit or an array)
        #[arg(short, long, required = false, conflicts_with_all = &["pubkey", "signature"])]
        file: Option<PathBuf>,
        /// Validator public key
        #[arg(short, long, required = false)]
        pubkey: Option<String>,
        /// Withdrawal credentials, required when checking against the message
        #[arg(short, long, required = false)]
        withdrawal_credentials: Option<String>,
        /// Amount in gwei
        #[arg(short, long, required = false, default_value_t = crate::deposit::DEPOSIT_AMOUNT_GWEI)]
        amount: u64,
        /// Deposit signature
        #[arg(short, long, required = false)]
        signature: Option<String>,
        /// Deposit data root
        #[arg(short, long, required = false)]
        deposit_data_root: Option<String>,
        /// Root the signature is checked against
        #[arg(long, value_enum, required = false, default_value_t = Against::Message)]
        against: Against,
    },
}

/// Clone parameters, the salt is given, built from an index or random
#[derive(Args)]
#[clap(group(clap::ArgGroup::new("salt_args")
    .required(false)
    .multiple(false)
    .args(&["salt", "index", "random_salt"])
))]
pub struct CloneArgs {
    /// Factory (CREATE2 deployer) address
    #[arg(long, required = false)]
    pub deployer: Option<String>,
    /// Implementation address the clone delegates to
    #[arg(long, required = false, requires = "deployer")]
    pub implementation: Option<String>,
    /// CREATE2 salt (32 bytes hex)
    #[arg(long, required = false)]
    pub salt: Option<String>,
    /// Salt as a left padded index
    #[arg(long, required = false)]
    pub index: Option<u64>,
    /// Random 32 byte salt
    #[arg(long, required = false, action = clap::ArgAction::SetTrue)]
    pub random_salt: bool,
}

impl CloneArgs {
    /// Deployer, implementation and salt of the clone
    pub fn resolve(&self) -> Result<(Address, Address, B256)> {
        let (Some(deployer), Some(implementation)) = (&self.deployer, &self.implementation) else {
            bail!("--deployer and --implementation are required");
        };
        let salt = match (&self.salt, self.index, self.random_salt) {
            (Some(salt), _, _) => helpers::parse_fixed_hex::<32>("salt", salt)?,
            (None, Some(index), _) => address::salt_from_index(index),
            (None, None, true) => address::random_salt(),
            (None, None, false) => bail!("One of --salt, --index or --random-salt is required"),
        };
        Ok((
            helpers::parse_address(deployer)?,
            helpers::parse_address(implementation)?,
            salt,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Against {
    /// Deposit message root (beacon chain rule)
    Message,
    /// Supplied deposit data root
    Data,
}

impl From<Against> for VerifyAgainst {
    fn from(against: Against) -> Self {
        match against {
            Against::Message => VerifyAgainst::DepositMessageRoot,
            Against::Data => VerifyAgainst::DepositDataRoot,
        }
    }
}

/// Expands `~` and environment variables in a path
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let s = path
        .to_str()
        .ok_or_else(|| eyre::eyre!("path is not valid utf-8: {:?}", path))?;
    Ok(shellexpand::full(s)?.to_string().into())
}

pub fn merge_args_from_file<T>(
    args: <T as ClapSerde>::Opt,
    maybe_path: Option<PathBuf>,
) -> Result<T>
where
    T: ClapSerde + serde::de::DeserializeOwned,
{
    match maybe_path {
        Some(path) => {
            let path = expand_path(&path)?;
            match path.exists() {
                true => {
                    let config = read_config_file::<<T as ClapSerde>::Opt>(&path)?;
                    // CLI values win, the file fills what was not given
                    Ok(T::from(config).merge(args))
                }
                false => Ok(T::from(args)),
            }
        }
        None => Ok(T::from(args)),
    }
}

fn read_config_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    match path.extension().and_then(OsStr::to_str) {
        Some("toml") => read_toml_config(path),
        Some("json") => read_json_config(path),
        Some("jsonc") => read_jsonc_config(path),
        _ => {
            bail!("Unsupported config file type: {:?}", path);
        }
    }
}

fn read_toml_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path).wrap_err_with(|| format!("{:?}", path))?;
    toml::from_str(&content).wrap_err_with(|| format!("{:?}", path))
}

fn read_json_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let f = File::open(path).wrap_err_with(|| format!("{:?}", path))?;
    serde_json::from_reader(BufReader::new(f)).wrap_err_with(|| format!("{:?}", path))
}

fn read_jsonc_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let f = File::open(path).wrap_err_with(|| format!("{:?}", path))?;
    serde_jsonc::from_reader(BufReader::new(f)).wrap_err_with(|| format!("{:?}", path))
}

/// Reads a `[networks.<name>]` document of custom networks
pub fn load_networks_file(path: &Path) -> Result<NetworksFile> {
    read_config_file(&expand_path(path)?)
}

/// The built-in network table extended with `networks_file`, if any
pub fn network_table(networks_file: Option<&Path>) -> Result<NetworkTable> {
    let mut table = NetworkTable::default();
    if let Some(path) = networks_file {
        let file = load_networks_file(path)?;
        table
            .extend(&file)
            .wrap_err_with(|| format!("{:?}", path))?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssz::ForkVersion;
    use alloy::primitives::B256;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("deposit-knife-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn custom_networks_toml() {
        let path = temp_file(
            "networks.toml",
            r#"
[networks.devnet]
fork_version = "0x10000038"

[networks.goerli]
fork_version = "0x00001020"
deposit_contract = "0x0000000000000000000000000000000000000001"
"#,
        );
        let table = network_table(Some(&path)).unwrap();
        let devnet = table.get("devnet").unwrap();
        assert_eq!(devnet.fork_version, ForkVersion::from([0x10, 0x00, 0x00, 0x38]));
        assert_eq!(devnet.genesis_validators_root, B256::ZERO);
        assert_eq!(
            table.get("goerli").unwrap().deposit_contract,
            Some(alloy::primitives::Address::with_last_byte(1))
        );
        // built-ins are kept
        assert!(table.get("mainnet").is_ok());
    }

    #[test]
    fn custom_networks_jsonc() {
        let path = temp_file(
            "networks.jsonc",
            r#"{
  // local testnet
  "networks": { "local": { "fork_version": "0x00000001" } }
}"#,
        );
        let table = network_table(Some(&path)).unwrap();
        assert_eq!(
            table.get("local").unwrap().fork_version,
            ForkVersion::from([0, 0, 0, 1])
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        let path = temp_file("networks.yaml", "networks: {}");
        assert!(load_networks_file(&path).is_err());
    }

    #[test]
    fn config_file_fills_missing_args() {
        let path = temp_file("config.toml", "network = \"goerli\"\nlog_level = 5\n");
        let cli = Cli::try_parse_from(["deposit-knife", "--log-level", "1", "networks"]).unwrap();
        let config = merge_args_from_file::<CliArgs>(cli.config, Some(path)).unwrap();
        assert_eq!(config.network.as_deref(), Some("goerli"));
        assert_eq!(config.log_level, Some(1), "cli wins over the config file");
    }

    #[test]
    fn parses_verify_args() {
        let cli = Cli::try_parse_from([
            "deposit-knife",
            "verify",
            "--file",
            "deposits.json",
            "--against",
            "data",
        ])
        .unwrap();
        match cli.command {
            CliCmd::Verify { file, against, .. } => {
                assert_eq!(file, Some(PathBuf::from("deposits.json")));
                assert_eq!(VerifyAgainst::from(against), VerifyAgainst::DepositDataRoot);
            }
            _ => panic!("expected verify"),
        }
    }

    fn clone_args(args: &[&str]) -> Result<CloneArgs> {
        let cli = Cli::try_parse_from(
            [
                "deposit-knife",
                "address",
                "--deployer",
                "0xdeadbeef00000000000000000000000000000000",
                "--implementation",
                "0xbebebebebebebebebebebebebebebebebebebebe",
            ]
            .iter()
            .chain(args),
        )?;
        match cli.command {
            CliCmd::Address { clone } => Ok(clone),
            _ => panic!("expected address"),
        }
    }

    #[test]
    fn clone_salt_sources() {
        let (_, _, salt) = clone_args(&["--index", "7"]).unwrap().resolve().unwrap();
        assert_eq!(salt, address::salt_from_index(7));

        let salt_hex = format!("{}", B256::repeat_byte(0x33));
        let (_, _, salt) = clone_args(&["--salt", &salt_hex]).unwrap().resolve().unwrap();
        assert_eq!(salt, B256::repeat_byte(0x33));

        let random = clone_args(&["--random-salt"]).unwrap();
        let (deployer, implementation, first) = random.resolve().unwrap();
        let (_, _, second) = random.resolve().unwrap();
        assert_ne!(first, second);
        assert_eq!(
            deployer,
            "0xdeadbeef00000000000000000000000000000000".parse::<Address>().unwrap()
        );
        assert_eq!(implementation, Address::repeat_byte(0xbe));

        assert!(clone_args(&[]).unwrap().resolve().is_err());
        assert!(clone_args(&["--index", "7", "--random-salt"]).is_err());
    }
}
