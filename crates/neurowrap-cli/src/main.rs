//! Neurowrap CLI - command lines for wrapped neuroimaging tools
//!
//! This binary lists the wrapped FreeSurfer and FSL tools, and renders,
//! predicts and hashes configured calls without running them.

use std::process::ExitCode;

use clap::Parser;

mod cli_args;

use cli_args::{Cli, Commands};
use neurowrap_cli::{commands, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::List { json } => commands::list::run(json),
        Commands::Describe { interface, json } => commands::describe::run(&interface, json),
        Commands::Render(args) => {
            let (request, json) = args.into_request();
            commands::render::run(&request, json)
        }
        Commands::Outputs(args) => {
            let (request, json) = args.into_request();
            commands::outputs::run(&request, json)
        }
        Commands::Hash(args) => {
            let (request, json) = args.into_request();
            commands::hash::run(&request, json)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
