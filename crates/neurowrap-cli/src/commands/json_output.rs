//! JSON output types for the `--json` flag.
//!
//! Every command prints one [`CommandOutput`] object. Failures carry
//! [`JsonError`]s with stable codes: `CLI_xxx` for input handling, or the
//! engine's own `NWxxx` codes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error codes for CLI-level failures.
pub mod error_codes {
    /// Interface name not in the catalog
    pub const UNKNOWN_INTERFACE: &str = "CLI_001";
    /// `--set` argument is not NAME=VALUE
    pub const BAD_ASSIGNMENT: &str = "CLI_002";
    /// Inputs file could not be read
    pub const INPUTS_READ: &str = "CLI_003";
    /// Inputs file is not a JSON object
    pub const INPUTS_PARSE: &str = "CLI_004";
    /// Working directory could not be determined
    pub const WORKING_DIR: &str = "CLI_005";
    /// Environment configuration is invalid
    pub const CONFIG: &str = "CLI_006";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "NW010")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl JsonError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Envelope printed by every command in JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput<T> {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> CommandOutput<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}

/// Result of `render`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderResult {
    pub interface: String,
    pub command_line: String,
    pub tokens: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub environment: BTreeMap<String, String>,
}

/// Result of `hash`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashResult {
    pub interface: String,
    pub command: String,
    pub signature: String,
}
