//! `rpctest`: call one method on a signed JSON RPC server and print the
//! parsed reply.

mod args;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rpcsign_core::{RpcClient, RpcError};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use args::{parse_headers, parse_params, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (params, headers) = match parse_params(&cli.params)
        .and_then(|params| Ok((params, parse_headers(&cli.headers)?)))
    {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    match run(&cli, params, headers) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(data) = e.downcast_ref::<RpcError>().and_then(RpcError::data) {
                eprintln!("{}", String::from_utf8_lossy(data));
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli, params: Map<String, Value>, headers: Vec<(String, String)>) -> Result<()> {
    let client = RpcClient::new(&cli.url, cli.client_config(headers))
        .with_context(|| format!("cannot use {}", cli.url))?;
    tracing::debug!(endpoint = %client.endpoint(), method = %cli.method, "client ready");

    let response = client.call(&cli.method, &params)?;
    let decoded = client.decode(response)?;
    let value = client.parse(&decoded)?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Logs go to stderr so stdout carries only the result.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
