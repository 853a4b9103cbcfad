//! FSL interfaces.
//!
//! FSL tools pick their output file format from `FSLOUTPUTTYPE`. Every FSL
//! interface declares an `output_type` input (defaulting to the configured
//! type) and exports it back to the tool's environment.

pub mod proj_thresh;

use std::fmt;
use std::str::FromStr;

use neurowrap_spec::{FieldKind, FieldSpec, InterfaceDefinition, InterfaceDefinitionBuilder, Resolver, SpecError};
use serde::Serialize;

use crate::base::{command_line_fields, optional_text};
use crate::config::{ConfigError, EnvConfig, FSL_OUTPUT_TYPE_VAR};

/// Output file type of FSL tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FslOutputType {
    Nifti,
    NiftiPair,
    #[default]
    NiftiGz,
    NiftiPairGz,
}

impl FslOutputType {
    pub const ALL: [FslOutputType; 4] = [
        FslOutputType::Nifti,
        FslOutputType::NiftiPair,
        FslOutputType::NiftiGz,
        FslOutputType::NiftiPairGz,
    ];

    /// The `FSLOUTPUTTYPE` spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            FslOutputType::Nifti => "NIFTI",
            FslOutputType::NiftiPair => "NIFTI_PAIR",
            FslOutputType::NiftiGz => "NIFTI_GZ",
            FslOutputType::NiftiPairGz => "NIFTI_PAIR_GZ",
        }
    }

    /// File extension, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FslOutputType::Nifti => ".nii",
            FslOutputType::NiftiPair => ".img",
            FslOutputType::NiftiGz => ".nii.gz",
            FslOutputType::NiftiPairGz => ".img.gz",
        }
    }
}

impl fmt::Display for FslOutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FslOutputType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                var: FSL_OUTPUT_TYPE_VAR,
                value: s.to_string(),
                expected: Self::ALL.map(|t| t.as_str()).join(", "),
            })
    }
}

/// Starts an FSL interface definition with the common fields.
pub(crate) fn definition_builder(name: &str, command: &str, config: &EnvConfig) -> InterfaceDefinitionBuilder {
    InterfaceDefinition::builder(name, command)
        .inputs_with(command_line_fields)
        .input(
            FieldSpec::new("output_type", FieldKind::Enum)
                .desc("FSL output type")
                .choices(FslOutputType::ALL.map(|t| t.as_str()))
                .default_value(config.fsl_output_type.as_str()),
        )
        .env_var(FSL_OUTPUT_TYPE_VAR, "output_type")
}

/// Extension selected by the instance's `output_type`.
pub(crate) fn output_extension(resolver: &Resolver<'_>) -> Result<&'static str, SpecError> {
    let output_type = match optional_text(resolver, "output_type")? {
        Some(name) => name.parse().map_err(|err: ConfigError| SpecError::InvalidValue {
            field: "output_type".to_string(),
            input: name.clone(),
            reason: err.to_string(),
        })?,
        None => FslOutputType::default(),
    };
    Ok(output_type.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_type_names_and_extensions() {
        assert_eq!("NIFTI_GZ".parse::<FslOutputType>().unwrap(), FslOutputType::NiftiGz);
        assert_eq!(FslOutputType::NiftiPairGz.extension(), ".img.gz");
        assert_eq!(FslOutputType::Nifti.to_string(), "NIFTI");
        assert!("nifti".parse::<FslOutputType>().is_err());
    }

    #[test]
    fn test_output_type_serializes_like_the_variable() {
        let json = serde_json::to_string(&FslOutputType::NiftiPair).unwrap();
        assert_eq!(json, "\"NIFTI_PAIR\"");
    }
}
