// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use clap::Parser;
use mgmt::{LoggingWorker, SetupConfig, SetupError};
use std::io::Read;
use std::process::ExitCode;
use tracing::error;

/// Build the virtual network described by a GraphML topology and an
/// edge-node table, driving a [`mgmt::worker::Worker`] through the whole
/// setup pipeline.
#[derive(Parser)]
#[command(name = "netsetup")]
#[command(version = option_env!("VERSION").unwrap_or("dev"))]
#[command(about = "Instantiate a virtual network topology from a GraphML file", long_about = None)]
struct Cli {
    /// Path to the YAML setup configuration, or `-` to read it from stdin.
    #[arg(long, value_name = "PATH", default_value = "-")]
    config: String,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read configuration from {path:?}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
    #[error(transparent)]
    Setup(#[from] SetupError),
}

fn load_config(path: &str) -> Result<SetupConfig, CliError> {
    let raw = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Read { path: path.to_string(), source })?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_string(), source })?
    };
    Ok(serde_yaml_ng::from_str(&raw)?)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(&cli.config)?;
    let mut worker = LoggingWorker::new();
    mgmt::run_setup(&config, &mut worker)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(true).with_line_number(true).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "setup failed");
            ExitCode::FAILURE
        }
    }
}
