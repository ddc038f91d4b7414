//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// son-validate - Validate SONATA packages, services, and functions
#[derive(Parser, Debug)]
#[command(name = "son-validate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Workspace directory holding workspace.yml and eventcfg.yml
    /// (default: $WORKSPACE_DIR or ~/.son-workspace)
    #[arg(short, long, global = true)]
    pub workspace: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a package archive (.son) or package directory
    Package(ValidateArgs),

    /// Validate a service descriptor and the functions it references
    Service(ValidateArgs),

    /// Validate a function descriptor
    Function(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Descriptor file, package archive, or package directory
    pub path: Utf8PathBuf,

    /// Run the syntax layer
    #[arg(long)]
    pub syntax: bool,

    /// Run the integrity layer
    #[arg(long)]
    pub integrity: bool,

    /// Run the topology layer
    #[arg(long)]
    pub topology: bool,

    /// Directory searched for function descriptors referenced by services
    #[arg(short, long)]
    pub dpath: Option<Utf8PathBuf>,

    /// Topology graph level: 0 functions, 1 function ports, 2 units,
    /// 3 unit ports
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub level: u8,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the topology graph as GraphML
    #[arg(long)]
    pub graph_out: Option<Utf8PathBuf>,
}

impl ValidateArgs {
    /// Selected layers as (syntax, integrity, topology). Without any layer
    /// flag every layer runs.
    pub fn layers(&self) -> (bool, bool, bool) {
        if !self.syntax && !self.integrity && !self.topology {
            return (true, true, true);
        }
        (self.syntax, self.integrity, self.topology)
    }
}
