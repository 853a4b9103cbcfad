//! Environment configuration for wrapped tools.
//!
//! Two variables affect interface defaults:
//!
//! | variable        | effect                                               |
//! |-----------------|------------------------------------------------------|
//! | `SUBJECTS_DIR`  | default `subjects_dir` of FreeSurfer interfaces      |
//! | `FSLOUTPUTTYPE` | default `output_type` and output extension for FSL   |
//!
//! [`EnvConfig::from_lookup`] takes the variable lookup as a function so
//! callers (and tests) can supply values without touching the process
//! environment.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::fsl::FslOutputType;

/// Variable naming the FreeSurfer subjects directory.
pub const SUBJECTS_DIR_VAR: &str = "SUBJECTS_DIR";

/// Variable selecting the FSL output file type.
pub const FSL_OUTPUT_TYPE_VAR: &str = "FSLOUTPUTTYPE";

/// Errors reading the environment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable holds a value outside its allowed set.
    #[error("invalid {var} value '{value}', expected one of: {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: String,
    },
}

/// Defaults taken from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvConfig {
    /// FreeSurfer subjects directory.
    pub subjects_dir: Option<PathBuf>,
    /// FSL output file type.
    pub fsl_output_type: FslOutputType,
}

impl EnvConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let subjects_dir = read(SUBJECTS_DIR_VAR).map(PathBuf::from);
        let fsl_output_type = match read(FSL_OUTPUT_TYPE_VAR) {
            Some(value) => value.trim().parse()?,
            None => FslOutputType::default(),
        };

        tracing::debug!(
            subjects_dir = ?subjects_dir,
            fsl_output_type = %fsl_output_type,
            "loaded environment configuration"
        );
        Ok(Self {
            subjects_dir,
            fsl_output_type,
        })
    }

    /// Sets the subjects directory.
    pub fn subjects_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.subjects_dir = Some(dir.into());
        self
    }

    /// Sets the FSL output type.
    pub fn fsl_output_type(mut self, output_type: FslOutputType) -> Self {
        self.fsl_output_type = output_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = EnvConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EnvConfig::default());
        assert_eq!(config.fsl_output_type, FslOutputType::NiftiGz);
        assert!(config.subjects_dir.is_none());
    }

    #[test]
    fn test_reads_variables() {
        let config = EnvConfig::from_lookup(lookup(&[
            ("SUBJECTS_DIR", "/opt/subjects"),
            ("FSLOUTPUTTYPE", "NIFTI_PAIR"),
        ]))
        .unwrap();
        assert_eq!(config.subjects_dir, Some(PathBuf::from("/opt/subjects")));
        assert_eq!(config.fsl_output_type, FslOutputType::NiftiPair);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = EnvConfig::from_lookup(lookup(&[("SUBJECTS_DIR", ""), ("FSLOUTPUTTYPE", " ")]))
            .unwrap();
        assert_eq!(config, EnvConfig::default());
    }

    #[test]
    fn test_invalid_output_type() {
        let err = EnvConfig::from_lookup(lookup(&[("FSLOUTPUTTYPE", "ANALYZE")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid FSLOUTPUTTYPE value 'ANALYZE', expected one of: NIFTI, NIFTI_PAIR, NIFTI_GZ, NIFTI_PAIR_GZ"
        );
    }

    #[test]
    fn test_builder_setters() {
        let config = EnvConfig::default()
            .subjects_dir("/subjects")
            .fsl_output_type(FslOutputType::Nifti);
        assert_eq!(config.subjects_dir, Some(PathBuf::from("/subjects")));
        assert_eq!(config.fsl_output_type.extension(), ".nii");
    }
}
