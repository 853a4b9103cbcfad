//! Builds a configured interface from command-line input.
//!
//! Values come from two places, applied in this order:
//!
//! 1. `--inputs file.json`: a JSON object mapping field names to values,
//! 2. `--set name=value`: textual values parsed for the field's kind.
//!
//! A later assignment of the same field replaces the earlier one.

use std::fs;
use std::path::{Path, PathBuf};

use neurowrap_interfaces::{catalog, ConfigError, EnvConfig};
use neurowrap_spec::{Interface, SpecError};
use thiserror::Error;

use crate::commands::json_output::error_codes;

/// A request to configure one interface.
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    /// Interface name, matched case-insensitively.
    pub interface: String,
    /// `name=value` assignments.
    pub assignments: Vec<String>,
    /// JSON file of input values.
    pub inputs_file: Option<PathBuf>,
    /// Working directory; the process directory when unset.
    pub cwd: Option<PathBuf>,
}

/// Errors turning command-line input into a configured interface.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("unknown interface '{name}' (run `neurowrap list` to see all interfaces)")]
    UnknownInterface { name: String },

    #[error("invalid assignment '{0}', expected NAME=VALUE")]
    BadAssignment(String),

    #[error("failed to read inputs file {path}: {source}")]
    ReadInputs {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse inputs file {path}: {source}")]
    ParseInputs {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("inputs file {path} must contain a JSON object")]
    NotAnObject { path: String },

    #[error("cannot determine the working directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Spec(#[from] SpecError),
}

impl InputError {
    /// Stable code for JSON diagnostics. Engine errors keep their own code.
    pub fn code(&self) -> &'static str {
        match self {
            InputError::UnknownInterface { .. } => error_codes::UNKNOWN_INTERFACE,
            InputError::BadAssignment(_) => error_codes::BAD_ASSIGNMENT,
            InputError::ReadInputs { .. } => error_codes::INPUTS_READ,
            InputError::ParseInputs { .. } | InputError::NotAnObject { .. } => error_codes::INPUTS_PARSE,
            InputError::WorkingDir(_) => error_codes::WORKING_DIR,
            InputError::Config(_) => error_codes::CONFIG,
            InputError::Spec(err) => err.code().code(),
        }
    }
}

/// Splits `name=value` at the first `=`.
pub fn parse_assignment(assignment: &str) -> Result<(&str, &str), InputError> {
    match assignment.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(InputError::BadAssignment(assignment.to_string())),
    }
}

/// Reads a JSON object of input values.
pub fn load_inputs_file(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>, InputError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| InputError::ReadInputs {
        path: display.clone(),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| InputError::ParseInputs {
            path: display.clone(),
            source,
        })?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(InputError::NotAnObject { path: display }),
    }
}

/// Instantiates the requested interface and applies every assignment.
pub fn prepare(request: &CallRequest, config: &EnvConfig) -> Result<Interface, InputError> {
    let entry = catalog::find(&request.interface).ok_or_else(|| InputError::UnknownInterface {
        name: request.interface.clone(),
    })?;
    let cwd = match &request.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(InputError::WorkingDir)?,
    };
    let mut interface = entry.instantiate(config, cwd)?;

    if let Some(path) = &request.inputs_file {
        for (name, value) in load_inputs_file(path)? {
            interface.set_json(&name, &value)?;
        }
    }
    for assignment in &request.assignments {
        let (name, value) = parse_assignment(assignment)?;
        interface.set_str(name, value)?;
    }

    tracing::debug!(
        interface = %interface.name(),
        state = %interface.state(),
        "prepared interface"
    );
    Ok(interface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("hemi=lh").unwrap(), ("hemi", "lh"));
        assert_eq!(parse_assignment("args=-a=1").unwrap(), ("args", "-a=1"));
        assert_eq!(parse_assignment("args=").unwrap(), ("args", ""));
        assert!(matches!(
            parse_assignment("=lh"),
            Err(InputError::BadAssignment(_))
        ));
        assert!(matches!(
            parse_assignment("hemi"),
            Err(InputError::BadAssignment(_))
        ));
    }

    #[test]
    fn test_unknown_interface() {
        let request = CallRequest {
            interface: "Bet".to_string(),
            cwd: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let err = prepare(&request, &EnvConfig::default()).unwrap_err();
        assert_eq!(err.code(), "CLI_001");
    }

    #[test]
    fn test_engine_errors_keep_their_code() {
        let request = CallRequest {
            interface: "SurfaceSmooth".to_string(),
            assignments: vec!["hemi=both".to_string()],
            cwd: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let err = prepare(&request, &EnvConfig::default()).unwrap_err();
        assert_eq!(err.code(), "NW003");
    }
}
