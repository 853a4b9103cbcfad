//! CLI argument definitions for the neurowrap command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use neurowrap_cli::input::CallRequest;

/// Neurowrap - command lines for FreeSurfer and FSL tools
#[derive(Parser)]
#[command(name = "neurowrap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Log debug diagnostics to stderr (overridden by NEUROWRAP_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List the available interfaces
    List {
        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Show the input and output fields of an interface
    Describe {
        /// Interface name (case-insensitive)
        interface: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the command line a configured call would run
    Render(CallArgs),

    /// Print the files a configured call would produce
    Outputs(CallArgs),

    /// Print the signature of a configured call
    Hash(CallArgs),
}

/// Arguments shared by the commands that configure an interface.
#[derive(Args, Debug)]
pub(crate) struct CallArgs {
    /// Interface name (case-insensitive)
    pub interface: String,

    /// Input assignment as name=value (repeatable, applied after --inputs)
    #[arg(short, long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// JSON object of input values
    #[arg(short, long)]
    pub inputs: Option<PathBuf>,

    /// Working directory for generated paths (default: current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Output machine-readable JSON (no colored output)
    #[arg(long)]
    pub json: bool,
}

impl CallArgs {
    /// Splits off the JSON flag and converts the rest into a request.
    pub fn into_request(self) -> (CallRequest, bool) {
        let request = CallRequest {
            interface: self.interface,
            assignments: self.set,
            inputs_file: self.inputs,
            cwd: self.cwd,
        };
        (request, self.json)
    }
}
