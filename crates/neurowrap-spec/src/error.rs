//! Error types for field validation, rendering and output prediction.

use thiserror::Error;

/// Stable error codes for every [`SpecError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Assignment errors (NW001-NW004)
    /// NW001: Field name not declared in the registry
    UnknownField,
    /// NW002: Value does not match the field kind
    TypeMismatch,
    /// NW003: Value outside the allowed choices or range
    ValueOutOfRange,
    /// NW004: Field excluded by an already set field
    ConflictingFields,

    // Render-time errors (NW010-NW013)
    /// NW010: One or more mandatory fields are unset
    MissingMandatoryFields,
    /// NW011: One or more co-requirements are unmet
    UnmetRequirements,
    /// NW012: Computed default depends on an unset field
    UnresolvedDefault,
    /// NW013: Output path depends on an unset input
    UnresolvableOutput,

    // Definition errors (NW020-NW022)
    /// NW020: Registry declaration is inconsistent
    InvalidRegistry,
    /// NW021: Argument or name template is malformed
    InvalidTemplate,
    /// NW022: Textual value could not be parsed for a field
    InvalidValue,

    /// NW030: Interface already failed and accepts no further work
    InterfaceFailed,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "NW001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::UnknownField => "NW001",
            ErrorCode::TypeMismatch => "NW002",
            ErrorCode::ValueOutOfRange => "NW003",
            ErrorCode::ConflictingFields => "NW004",
            ErrorCode::MissingMandatoryFields => "NW010",
            ErrorCode::UnmetRequirements => "NW011",
            ErrorCode::UnresolvedDefault => "NW012",
            ErrorCode::UnresolvableOutput => "NW013",
            ErrorCode::InvalidRegistry => "NW020",
            ErrorCode::InvalidTemplate => "NW021",
            ErrorCode::InvalidValue => "NW022",
            ErrorCode::InterfaceFailed => "NW030",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A field whose `requires` list names a field that is not set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmetRequirement {
    /// The field that was set.
    pub field: String,
    /// The companion field it needs.
    pub required: String,
}

impl std::fmt::Display for UnmetRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' requires '{}'", self.field, self.required)
    }
}

/// Top-level error type for spec operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    /// Field name is not part of the registry.
    #[error("unknown field '{field}' in {registry}")]
    UnknownField { registry: String, field: String },

    /// Value shape does not match the declared kind.
    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Value is not one of the allowed choices or outside the range.
    #[error("value {value} for field '{field}' is not in {allowed}")]
    ValueOutOfRange {
        field: String,
        value: String,
        allowed: String,
    },

    /// Field is mutually exclusive with fields that are already set.
    #[error("field '{field}' cannot be set together with {}", quoted(.conflicts))]
    ConflictingFields {
        field: String,
        conflicts: Vec<String>,
    },

    /// Every unset mandatory field, in declaration order.
    #[error("missing mandatory field(s): {}", quoted(.fields))]
    MissingMandatoryFields { fields: Vec<String> },

    /// Every unmet co-requirement, in declaration order.
    #[error("unmet requirement(s): {}", list(.unmet))]
    UnmetRequirements { unmet: Vec<UnmetRequirement> },

    /// A computed default needs a field that has no value.
    #[error("cannot compute default for '{field}': '{dependency}' is not set")]
    UnresolvedDefault { field: String, dependency: String },

    /// A predicted output needs an input that has no value.
    #[error("cannot predict output '{output}': input '{source_field}' is not set")]
    UnresolvableOutput {
        output: String,
        source_field: String,
    },

    /// Registry declaration is inconsistent.
    #[error("invalid registry {registry}: {reason}")]
    InvalidRegistry { registry: String, reason: String },

    /// Argument or name template is malformed or cannot consume a value.
    #[error("invalid template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Textual input could not be parsed for the field kind.
    #[error("cannot parse '{input}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        input: String,
        reason: String,
    },

    /// Interface entered the failed state earlier.
    #[error("interface {interface} has failed ({cause}) and cannot be reused")]
    InterfaceFailed { interface: String, cause: ErrorCode },
}

impl SpecError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SpecError::UnknownField { .. } => ErrorCode::UnknownField,
            SpecError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            SpecError::ValueOutOfRange { .. } => ErrorCode::ValueOutOfRange,
            SpecError::ConflictingFields { .. } => ErrorCode::ConflictingFields,
            SpecError::MissingMandatoryFields { .. } => ErrorCode::MissingMandatoryFields,
            SpecError::UnmetRequirements { .. } => ErrorCode::UnmetRequirements,
            SpecError::UnresolvedDefault { .. } => ErrorCode::UnresolvedDefault,
            SpecError::UnresolvableOutput { .. } => ErrorCode::UnresolvableOutput,
            SpecError::InvalidRegistry { .. } => ErrorCode::InvalidRegistry,
            SpecError::InvalidTemplate { .. } => ErrorCode::InvalidTemplate,
            SpecError::InvalidValue { .. } => ErrorCode::InvalidValue,
            SpecError::InterfaceFailed { .. } => ErrorCode::InterfaceFailed,
        }
    }

    pub(crate) fn invalid_template(template: &str, reason: impl Into<String>) -> Self {
        SpecError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_registry(registry: &str, reason: impl Into<String>) -> Self {
        SpecError::InvalidRegistry {
            registry: registry.to_string(),
            reason: reason.into(),
        }
    }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn list(unmet: &[UnmetRequirement]) -> String {
    unmet
        .iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
