#[macro_use]
extern crate log;

use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Result, WrapErr, bail};
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};

use alloy::primitives::B256;

use deposit_knife::{
    address, batch,
    bls::{self, BlsBackend, SecretKey},
    commitment,
    config::{self, *},
    deposit::{self, OperatorDepositData},
    format_gwei, format_kv,
    helpers::{self, datetime},
    keygen,
    logger::{DEFAULT_LOG_LEVEL, Logger},
    network::NetworkConfig,
    verify::{self, VerifyAgainst},
};

/// deposit-cli writes an array, a single object is accepted as well
#[derive(Deserialize)]
#[serde(untagged)]
enum DepositFile {
    Many(Vec<OperatorDepositData>),
    One(OperatorDepositData),
}

impl DepositFile {
    fn into_vec(self) -> Vec<OperatorDepositData> {
        match self {
            DepositFile::Many(deposits) => deposits,
            DepositFile::One(deposit) => vec![deposit],
        }
    }
}

fn main() -> Result<()> {
    // Parse args with clap
    let args = Cli::parse();

    // Log at the default level until the config file is read
    let logger = Logger::new(DEFAULT_LOG_LEVEL);
    logger.set_global()?;

    let mut config = config::merge_args_from_file::<CliArgs>(args.config, args.config_path)?;
    logger.set_log_level(config.log_level.unwrap_or(DEFAULT_LOG_LEVEL));
    config.outdir = Some(config::expand_path(
        &config.outdir.clone().unwrap_or_else(|| PathBuf::from(".")),
    )?);
    debug!("{:?}", config);

    let backend = bls::init_default()?;
    debug!("Using BLS backend {}", backend.name());

    cmd_dispatch(&Cli::command(), &config, &args.command)
}

fn cmd_dispatch(app: &clap::Command, config: &CliArgs, cmd: &CliCmd) -> Result<()> {
    match cmd {
        CliCmd::Version {} => {
            let mut ver = app.render_version();
            ver.pop(); // remove "\n"
            println!("version: {}", ver);
        }
        CliCmd::Networks {} => {
            let table = config::network_table(config.networks_file.as_deref())?;
            for network in table.iter() {
                println!(
                    "{:10} {} {}",
                    network.name.green().bold(),
                    helpers::to_hex(network.fork_version).blue(),
                    network
                        .deposit_contract
                        .map(|addr| addr.to_string())
                        .unwrap_or_default()
                        .white()
                );
            }
        }
        CliCmd::Keygen {
            mnemonic_file,
            mnemonic_password,
            index,
            new_mnemonic,
        } => {
            let phrase = match (mnemonic_file, new_mnemonic) {
                (Some(path), _) => Some(read_secret_file(path)?),
                (None, true) => {
                    let phrase = keygen::new_mnemonic()?;
                    println!("{} {}", "mnemonic:".white().bold(), phrase.red());
                    Some(phrase)
                }
                (None, false) => None,
            };
            let sk = match phrase {
                Some(phrase) => {
                    keygen::from_mnemonic(&phrase, mnemonic_password.as_deref(), *index)?
                }
                None => keygen::random_secret_key()?,
            };
            println!(
                "{} {}",
                "privkey:".white().bold(),
                helpers::to_hex(sk.as_bytes()).red()
            );
            println!(
                "{} {}",
                "bls pubkey:".white().bold(),
                helpers::to_hex(sk.public_key()?).blue()
            );
        }
        CliCmd::DepositData {
            secret_key,
            key_file,
            withdrawal_address,
            clone,
            out,
        } => {
            let sk = match (secret_key, key_file) {
                (Some(key), _) => SecretKey::from_hex(key)?,
                (None, Some(path)) => SecretKey::from_hex(&read_secret_file(path)?)?,
                (None, None) => bail!("Either --secret-key or --key-file is required"),
            };
            let network = selected_network(config)?;
            let target = match withdrawal_address {
                Some(addr) => helpers::parse_address(addr)?,
                None => {
                    let (deployer, implementation, salt) = clone.resolve()?;
                    println!("{} {}", "salt:".white().bold(), salt.to_string().white());
                    address::derive_address(deployer, salt, implementation)
                }
            };
            let data = deposit::build_deposit_data(&sk, target, &network)?;
            if !verify::verify_deposit_data(&data, &network, VerifyAgainst::DepositMessageRoot) {
                bail!("Deposit signature invalid for pubkey {}", data.pubkey);
            }
            print!("{}", pretty_deposit(&data));
            if let Some(out) = out {
                write_deposits(config, out, &[data])?;
            }
        }
        CliCmd::Batch {
            mnemonic_file,
            mnemonic_password,
            start,
            count,
            deployer,
            implementation,
            out,
        } => {
            let network = selected_network(config)?;
            let phrase = read_secret_file(mnemonic_file)?;
            let indexes = *start..start.saturating_add(*count);
            let keys = indexes
                .clone()
                .map(|i| keygen::from_mnemonic(&phrase, mnemonic_password.as_deref(), i))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            // Salts start at 1, a zero salt is never deployed
            let salts = indexes
                .map(|i| address::salt_from_index(u64::from(i) + 1))
                .collect::<Vec<B256>>();
            let batch = batch::prepare_batch(
                &keys,
                helpers::parse_address(deployer)?,
                helpers::parse_address(implementation)?,
                &salts,
                &network,
            )?;
            for entry in &batch.prepared {
                println!(
                    "{} {} {}",
                    entry.salt.to_string().white(),
                    entry.contract_address.to_string().green().bold(),
                    entry.deposit.pubkey.to_string().blue()
                );
            }
            let deposits = batch
                .prepared
                .iter()
                .map(|entry| entry.deposit.clone())
                .collect::<Vec<_>>();
            if let Some(out) = out {
                write_deposits(config, out, &deposits)?;
            }
            if let Some(rejected) = batch.rejected {
                bail!(
                    "Deposit signature invalid for pubkey {}, stopped after {} deposits",
                    rejected.deposit.pubkey,
                    deposits.len()
                );
            }
        }
        CliCmd::Address { clone } => {
            let (deployer, implementation, salt) = clone.resolve()?;
            println!("{} {}", "salt:".white().bold(), salt.to_string().white());
            println!(
                "{} {}",
                "address:".white().bold(),
                address::derive_address(deployer, salt, implementation)
                    .to_string()
                    .green()
            );
        }
        CliCmd::Commitment {
            contract,
            file,
            pubkey,
            signature,
            deposit_data_root,
            exit_date,
        } => {
            let contract = helpers::parse_address(contract)?;
            let exit_date = datetime::parse_exit_date(exit_date)?;
            let commitment = match file {
                Some(path) => match read_deposits(path)?.as_slice() {
                    [deposit] => commitment::deposit_commitment(contract, deposit, exit_date),
                    deposits => {
                        bail!("Expected one deposit in {:?}, found {}", path, deposits.len())
                    }
                },
                None => {
                    let (Some(pubkey), Some(signature), Some(root)) =
                        (pubkey, signature, deposit_data_root)
                    else {
                        bail!("--pubkey, --signature and --deposit-data-root are required");
                    };
                    commitment::commitment(
                        contract,
                        helpers::parse_hex("pubkey", pubkey)?.as_slice(),
                        helpers::parse_hex("signature", signature)?.as_slice(),
                        helpers::parse_fixed_hex::<32>("deposit_data_root", root)?,
                        exit_date,
                    )
                }
            };
            match datetime::from_unix(exit_date) {
                Ok(date) => info!("exit date: {}", date),
                Err(e) => warn!("exit date: {}", e),
            }
            println!(
                "{} {}",
                "commitment:".white().bold(),
                commitment.to_string().magenta().bold()
            );
        }
        CliCmd::Verify {
            file,
            pubkey,
            withdrawal_credentials,
            amount,
            signature,
            deposit_data_root,
            against,
        } => {
            let against = VerifyAgainst::from(*against);
            match file {
                Some(path) => {
                    let table = config::network_table(config.networks_file.as_deref())?;
                    let mut failed = 0;
                    for deposit in read_deposits(path)? {
                        // An explicit --network wins over the network stored in the file
                        let network = match &config.network {
                            Some(name) => table.get(name)?,
                            None => table.get(&deposit.network_name)?,
                        };
                        let valid = verify::verify_deposit_data(&deposit, &network, against);
                        print_verify_result(&deposit.pubkey.to_string(), &network, valid);
                        if !valid {
                            failed += 1;
                        }
                    }
                    if failed > 0 {
                        bail!("{} deposit(s) failed verification", failed);
                    }
                }
                None => {
                    let network = selected_network(config)?;
                    let (Some(pubkey), Some(signature), Some(root)) =
                        (pubkey, signature, deposit_data_root)
                    else {
                        bail!("--pubkey, --signature and --deposit-data-root are required");
                    };
                    let pubkey_bytes = helpers::parse_hex("pubkey", pubkey)?;
                    let signature = helpers::parse_hex("signature", signature)?;
                    let root = helpers::parse_hex("deposit_data_root", root)?;
                    let valid = match (against, withdrawal_credentials) {
                        (VerifyAgainst::DepositDataRoot, _) => {
                            verify::verify(&pubkey_bytes, &signature, &root, &network)
                        }
                        (VerifyAgainst::DepositMessageRoot, Some(credentials)) => {
                            verify::verify_deposit(
                                &pubkey_bytes,
                                &helpers::parse_hex("withdrawal_credentials", credentials)?,
                                *amount,
                                &signature,
                                &root,
                                &network,
                                against,
                            )
                        }
                        (VerifyAgainst::DepositMessageRoot, None) => {
                            bail!("--withdrawal-credentials is required with --against message")
                        }
                    };
                    print_verify_result(pubkey, &network, valid);
                    if !valid {
                        bail!("Deposit failed verification");
                    }
                }
            }
        }
    }
    Ok(())
}

fn selected_network(config: &CliArgs) -> Result<NetworkConfig> {
    let table = config::network_table(config.networks_file.as_deref())?;
    match &config.network {
        Some(name) => Ok(table.get(name)?),
        None => bail!("No network selected, use --network <NAME> (see `networks`)"),
    }
}

fn read_secret_file(path: &Path) -> Result<String> {
    let path = config::expand_path(path)?;
    Ok(std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("{:?}", path))?
        .trim()
        .to_string())
}

fn read_deposits(path: &Path) -> Result<Vec<OperatorDepositData>> {
    Ok(helpers::json::read::<DepositFile>(&config::expand_path(path)?)?.into_vec())
}

fn write_deposits(config: &CliArgs, out: &Path, deposits: &[OperatorDepositData]) -> Result<()> {
    let path = match &config.outdir {
        Some(outdir) => outdir.join(out),
        None => out.to_path_buf(),
    };
    helpers::json::write(&path, deposits)?;
    info!("Wrote {} deposit(s) to {:?}", deposits.len(), path);
    Ok(())
}

fn print_verify_result(pubkey: &str, network: &NetworkConfig, valid: bool) {
    println!(
        "{} {} {}",
        match valid {
            true => "VALID".green().bold(),
            false => "INVALID".red().bold(),
        },
        pubkey.blue(),
        network.name.white()
    );
}

fn pretty_deposit(data: &OperatorDepositData) -> String {
    let align = 24;
    let mut pretty = String::new();
    pretty.push_str(&format_kv!(align, "pubkey", white, data.pubkey, blue));
    pretty.push_str(&format_kv!(
        align,
        "withdrawal_credentials",
        white,
        data.withdrawal_credentials,
        normal
    ));
    if let Ok(addr) = data.withdrawal_address() {
        pretty.push_str(&format_kv!(align, "withdrawal_address", white, addr, green));
    }
    pretty.push_str(&format_gwei!(align, "amount", white, data.amount, yellow));
    pretty.push_str(&format_kv!(align, "signature", white, data.signature, normal));
    pretty.push_str(&format_kv!(
        align,
        "deposit_message_root",
        white,
        data.deposit_message_root,
        normal
    ));
    pretty.push_str(&format_kv!(
        align,
        "deposit_data_root",
        white,
        data.deposit_data_root,
        magenta
    ));
    pretty.push_str(&format_kv!(
        align,
        "network",
        white,
        format!("{} ({})", data.network_name, data.fork_version),
        normal
    ));
    pretty
}
