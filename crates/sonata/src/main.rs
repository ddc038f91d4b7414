//! son-validate - Validator for SONATA network service packages
//!
//! This is the main entry point for the son-validate command-line interface.

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use sonata_core::DescriptorKind;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

/// Exit code when validation could not be carried out
const EXIT_INVOCATION_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before the remote schema master is contacted
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    let workspace = cli.workspace.as_deref();
    let result = match cli.command {
        Commands::Package(args) => {
            commands::validate::run(DescriptorKind::Package, args, workspace, cli.quiet).await
        }
        Commands::Service(args) => {
            commands::validate::run(DescriptorKind::Service, args, workspace, cli.quiet).await
        }
        Commands::Function(args) => {
            commands::validate::run(DescriptorKind::Function, args, workspace, cli.quiet).await
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::from(EXIT_INVOCATION_ERROR)
        }
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
