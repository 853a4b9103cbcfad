//! Render command implementation
//!
//! Configures an interface from the command line and prints the command
//! line it would run, along with the environment the tool needs.

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use neurowrap_interfaces::EnvConfig;

use super::json_output::RenderResult;
use super::{load_config, report_json};
use crate::input::{prepare, CallRequest, InputError};

/// Renders the requested call.
pub fn execute(request: &CallRequest, config: &EnvConfig) -> Result<RenderResult, InputError> {
    let mut interface = prepare(request, config)?;
    let tokens = interface.render()?;
    let environment = interface.environment()?;
    Ok(RenderResult {
        interface: interface.name().to_string(),
        command_line: tokens.join(" "),
        tokens,
        environment,
    })
}

/// Run the render command
///
/// # Arguments
/// * `request` - Interface name, assignments and working directory
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(request: &CallRequest, json_output: bool) -> Result<ExitCode> {
    let result = load_config().and_then(|config| execute(request, &config));
    if json_output {
        return report_json(result);
    }

    let rendered = result.with_context(|| format!("Failed to render {}", request.interface))?;
    for (var, value) in &rendered.environment {
        eprintln!("{} {}={}", "env".dimmed(), var, value);
    }
    println!("{}", rendered.command_line);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_render_segment_wm() {
        let request = CallRequest {
            interface: "SegmentWM".to_string(),
            assignments: vec!["in_file=a.nii".to_string(), "out_file=b.mgz".to_string()],
            cwd: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let rendered = execute(&request, &EnvConfig::default()).unwrap();
        assert_eq!(rendered.command_line, "mri_segment a.nii b.mgz");
        assert_eq!(rendered.tokens.len(), 3);
        assert!(rendered.environment.is_empty());
    }

    #[test]
    fn test_render_reports_missing_fields() {
        let request = CallRequest {
            interface: "SegmentWM".to_string(),
            assignments: vec!["in_file=a.nii".to_string()],
            cwd: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let err = execute(&request, &EnvConfig::default()).unwrap_err();
        assert_eq!(err.code(), "NW010");
        assert_eq!(err.to_string(), "missing mandatory field(s): 'out_file'");
    }
}
