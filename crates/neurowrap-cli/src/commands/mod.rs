//! CLI command implementations

pub mod describe;
pub mod hash;
pub mod json_output;
pub mod list;
pub mod outputs;
pub mod render;

use std::process::ExitCode;

use anyhow::Result;
use serde::Serialize;

use crate::input::InputError;
use json_output::{CommandOutput, JsonError};

/// Prints `output` as pretty JSON and maps success to the exit code.
fn print_json<T: Serialize>(output: &CommandOutput<T>) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// JSON-mode reporting shared by the commands that configure an interface.
fn report_json<T: Serialize>(result: Result<T, InputError>) -> Result<ExitCode> {
    let output = match result {
        Ok(value) => CommandOutput::success(value),
        Err(err) => {
            tracing::debug!(code = err.code(), error = %err, "command failed");
            CommandOutput::failure(vec![JsonError::new(err.code(), err.to_string())])
        }
    };
    print_json(&output)
}

/// Reads the environment configuration.
fn load_config() -> Result<neurowrap_interfaces::EnvConfig, InputError> {
    Ok(neurowrap_interfaces::EnvConfig::from_env()?)
}
