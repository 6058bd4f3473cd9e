use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use zeroize::Zeroizing;

use hawala_delegation::api::{self, ApiResponse, DecodeTransactionRequest, InspectResponse};
use hawala_delegation::codec::parse_address;
use hawala_delegation::config::{validate_endpoint_url, DelegationConfig};
use hawala_delegation::delegation::{RetryingFetcher, RpcCodeFetcher};
use hawala_delegation::eip7702::Authorization;
use hawala_delegation::error::{Eip7702Error, Eip7702Result};
use hawala_delegation::utils::logging;
use hawala_delegation::log_warn;

#[derive(Parser)]
#[command(name = "hawala-delegation")]
#[command(about = "Sign EIP-7702 authorizations and transactions, and inspect account delegation")]
struct Cli {
    /// Emit debug logs on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign an authorization; reads a JSON request from FILE or stdin
    SignAuthorization {
        input: Option<PathBuf>,
    },

    /// Build and sign a type-4 transaction; reads a JSON request from FILE or stdin
    SignTransaction {
        input: Option<PathBuf>,

        /// Chain configuration used for explorer links
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Recover the authority of a signed authorization; reads JSON from FILE or stdin
    Recover {
        input: Option<PathBuf>,
    },

    /// Decode a signed type-4 transaction and recover its signers
    Decode {
        /// 0x-prefixed wire bytes
        raw_transaction: String,
    },

    /// Report whether an account currently delegates its code
    Inspect {
        address: String,

        /// Query this endpoint instead of the configured ones
        #[arg(long)]
        rpc_url: Option<String>,

        #[arg(long, default_value = "1")]
        chain_id: u64,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the signing digest of an authorization
    Digest {
        #[arg(long)]
        chain_id: u64,

        /// Delegate contract address
        #[arg(long)]
        address: String,

        #[arg(long)]
        nonce: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }

    match cli.command {
        Command::SignAuthorization { input } => {
            let payload = read_payload(input.as_deref())?;
            emit(api::handle_sign_authorization(&payload), cli.compact)
        }
        Command::SignTransaction { input, config } => {
            let config = config.as_deref().map(load_config).transpose()?;
            let payload = read_payload(input.as_deref())?;
            emit(api::handle_sign_transaction(&payload, config.as_ref()), cli.compact)
        }
        Command::Recover { input } => {
            let payload = read_payload(input.as_deref())?;
            emit(api::handle_recover_authorization(&payload), cli.compact)
        }
        Command::Decode { raw_transaction } => {
            let request = DecodeTransactionRequest { raw_transaction };
            emit(ApiResponse::from(api::decode_transaction(&request)), cli.compact)
        }
        Command::Inspect {
            address,
            rpc_url,
            chain_id,
            config,
        } => {
            let config = match config.as_deref() {
                Some(path) => load_config(path)?,
                None => DelegationConfig::default(),
            };
            let endpoints = match rpc_url {
                Some(url) => {
                    validate_endpoint_url(&url)?;
                    vec![url]
                }
                None => config.rpc_urls(chain_id)?.to_vec(),
            };
            emit(ApiResponse::from(inspect_with_fallback(&address, &endpoints, &config)), cli.compact)
        }
        Command::Digest {
            chain_id,
            address,
            nonce,
        } => {
            let authorization = Authorization::new(chain_id, parse_address(&address)?, nonce);
            emit(ApiResponse::ok(api::authorization_digest(&authorization)), cli.compact)
        }
    }
}

/// Try each endpoint in order, moving on only when the fetch itself failed
fn inspect_with_fallback(
    address: &str,
    endpoints: &[String],
    config: &DelegationConfig,
) -> Eip7702Result<InspectResponse> {
    let mut result = Err(Eip7702Error::Config("no RPC endpoints".to_string()));

    for endpoint in endpoints {
        let rpc = RpcCodeFetcher::with_settings(endpoint.as_str(), &config.fetch)?;
        let fetcher = RetryingFetcher::with_settings(rpc, &config.fetch);
        result = api::inspect_account(address, &fetcher, Some(config));

        match &result {
            Err(e @ Eip7702Error::Fetch(_)) => {
                log_warn!("cli", "Endpoint failed, trying next", endpoint = endpoint, error = e);
            }
            _ => break,
        }
    }

    result
}

fn load_config(path: &Path) -> anyhow::Result<DelegationConfig> {
    DelegationConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))
}

/// Request body from a file, or stdin when no file is given
fn read_payload(path: Option<&Path>) -> anyhow::Result<Zeroizing<String>> {
    let payload = match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("reading stdin")?;
            buffer
        }
    };
    let payload = Zeroizing::new(payload);

    api::ensure_object(&payload)?;
    Ok(payload)
}

fn emit<T: Serialize>(response: ApiResponse<T>, compact: bool) -> anyhow::Result<()> {
    if compact {
        println!("{}", response.to_json());
    } else {
        println!("{}", response.to_json_pretty());
    }

    match response.error {
        Some(error) => bail!("{}", error.message),
        None => Ok(()),
    }
}
