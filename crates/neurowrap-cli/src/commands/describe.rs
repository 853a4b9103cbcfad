//! Describe command implementation
//!
//! Prints the input and output schema of one interface.

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use neurowrap_interfaces::{catalog, EnvConfig};
use neurowrap_spec::{FieldSummary, InterfaceSummary};

use super::{load_config, report_json};
use crate::input::InputError;

/// Builds the schema of `name`.
pub fn execute(name: &str, config: &EnvConfig) -> Result<InterfaceSummary, InputError> {
    let entry = catalog::find(name).ok_or_else(|| InputError::UnknownInterface {
        name: name.to_string(),
    })?;
    Ok(entry.definition(config)?.describe())
}

/// Run the describe command
///
/// # Arguments
/// * `name` - Interface name (case-insensitive)
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(name: &str, json_output: bool) -> Result<ExitCode> {
    let result = load_config().and_then(|config| execute(name, &config));
    if json_output {
        return report_json(result);
    }

    let summary = result.with_context(|| format!("Failed to describe {}", name))?;
    println!(
        "{} {}",
        summary.name.cyan().bold(),
        format!("({})", summary.command).dimmed()
    );

    println!("\n{}", "Inputs:".bold());
    for field in &summary.inputs {
        print_field(field);
    }
    println!("\n{}", "Outputs:".bold());
    for field in &summary.outputs {
        print_field(field);
    }
    if !summary.environment.is_empty() {
        println!("\n{}", "Environment:".bold());
        for (var, field) in &summary.environment {
            println!("  {} <- {}", var, field);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_field(field: &FieldSummary) {
    let marker = if field.mandatory { "*".red().bold() } else { " ".normal() };
    let mut details = vec![field.kind.clone()];
    if let Some(argstr) = &field.argstr {
        details.push(format!("'{}'", argstr));
    }
    if let Some(position) = field.position {
        details.push(format!("position {}", position));
    }
    if let Some(default) = &field.default {
        details.push(format!("default {}", default));
    }
    if let Some(genfile) = &field.genfile {
        details.push(format!("computed {}", genfile));
    }
    if !field.xor.is_empty() {
        details.push(format!("xor {}", field.xor.join(",")));
    }
    if !field.requires.is_empty() {
        details.push(format!("requires {}", field.requires.join(",")));
    }
    if field.nohash {
        details.push("nohash".to_string());
    }

    println!("{} {} {}", marker, field.name.bold(), details.join(", ").dimmed());
    if let Some(desc) = &field.desc {
        println!("    {}", desc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_segment_wm() {
        let summary = execute("segmentwm", &EnvConfig::default()).unwrap();
        assert_eq!(summary.name, "SegmentWM");
        assert_eq!(summary.command, "mri_segment");
        let in_file = summary.inputs.iter().find(|f| f.name == "in_file").unwrap();
        assert_eq!(in_file.position, Some(-2));
        assert!(in_file.mandatory);
        assert_eq!(summary.environment.get("SUBJECTS_DIR").map(String::as_str), Some("subjects_dir"));
    }

    #[test]
    fn test_describe_unknown() {
        let err = execute("nope", &EnvConfig::default()).unwrap_err();
        assert!(matches!(err, InputError::UnknownInterface { .. }));
    }
}
