//! Hash command implementation
//!
//! Prints the call signature: a BLAKE3 hash over the command and its hashed
//! inputs, independent of the order values were given in.

use std::process::ExitCode;

use anyhow::{Context, Result};
use neurowrap_interfaces::EnvConfig;

use super::json_output::HashResult;
use super::{load_config, report_json};
use crate::input::{prepare, CallRequest, InputError};

/// Computes the signature of the requested call.
pub fn execute(request: &CallRequest, config: &EnvConfig) -> Result<HashResult, InputError> {
    let interface = prepare(request, config)?;
    Ok(HashResult {
        interface: interface.name().to_string(),
        command: interface.command().to_string(),
        signature: interface.signature()?,
    })
}

/// Run the hash command
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(request: &CallRequest, json_output: bool) -> Result<ExitCode> {
    let result = load_config().and_then(|config| execute(request, &config));
    if json_output {
        return report_json(result);
    }

    let hashed = result.with_context(|| format!("Failed to hash {}", request.interface))?;
    println!("{}", hashed.signature);
    Ok(ExitCode::SUCCESS)
}
