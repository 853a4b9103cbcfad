//! Outputs command implementation
//!
//! Prints the paths a configured call would write, without running it.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use neurowrap_interfaces::EnvConfig;
use neurowrap_spec::PredictedPath;

use super::{load_config, report_json};
use crate::input::{prepare, CallRequest, InputError};

/// Predicts the outputs of the requested call.
pub fn execute(
    request: &CallRequest,
    config: &EnvConfig,
) -> Result<BTreeMap<String, PredictedPath>, InputError> {
    let interface = prepare(request, config)?;
    Ok(interface.predicted_outputs()?)
}

/// Run the outputs command
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(request: &CallRequest, json_output: bool) -> Result<ExitCode> {
    let result = load_config().and_then(|config| execute(request, &config));
    if json_output {
        return report_json(result);
    }

    let outputs = result.with_context(|| format!("Failed to predict outputs of {}", request.interface))?;
    if outputs.is_empty() {
        println!("{}", "No outputs".dimmed());
    }
    for (name, predicted) in &outputs {
        for path in predicted.paths() {
            println!("{}: {}", name.bold(), path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_outputs_of_surface_smooth() {
        let request = CallRequest {
            interface: "surfacesmooth".to_string(),
            assignments: vec![
                "in_file=lh.a.nii".to_string(),
                "fwhm=5".to_string(),
                "hemi=lh".to_string(),
                "subject_id=fsaverage".to_string(),
            ],
            cwd: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let outputs = execute(&request, &EnvConfig::default()).unwrap();
        assert_eq!(
            outputs["out_file"],
            PredictedPath::Single(PathBuf::from("/work/lh.a_smooth5.nii"))
        );
    }
}
