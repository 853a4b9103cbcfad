//! List command implementation
//!
//! Prints every interface in the catalog with its command and package.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use neurowrap_interfaces::{catalog, CatalogEntry};

use super::json_output::CommandOutput;
use super::print_json;

/// Run the list command
///
/// # Returns
/// Exit code: always 0
pub fn run(json_output: bool) -> Result<ExitCode> {
    let entries = catalog::entries();
    if json_output {
        return print_json(&CommandOutput::success(entries));
    }

    println!("{}", "Interfaces:".cyan().bold());
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in entries {
        print_entry(entry, width);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_entry(entry: &CatalogEntry, width: usize) {
    println!(
        "  {:<width$}  {:<14} {:<11} {}",
        entry.name.bold(),
        entry.command,
        format!("[{}]", entry.package).dimmed(),
        entry.summary,
        width = width
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_serializes_without_builders() {
        let json = serde_json::to_value(CommandOutput::success(catalog::entries())).unwrap();
        let first = &json["result"][0];
        assert_eq!(first["name"], "SampleToSurface");
        assert_eq!(first["command"], "mri_vol2surf");
        assert_eq!(first["package"], "freesurfer");
        assert!(first.get("build").is_none());
    }
}
