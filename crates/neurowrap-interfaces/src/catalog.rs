//! Catalog of every interface this crate defines.
//!
//! ```
//! use neurowrap_interfaces::{catalog, EnvConfig};
//!
//! let entry = catalog::find("segmentwm").unwrap();
//! let mut segment = entry.instantiate(&EnvConfig::default(), "/work").unwrap();
//! segment.set("in_file", "norm.mgz").unwrap();
//! segment.set("out_file", "wm.mgz").unwrap();
//! assert_eq!(segment.cmdline().unwrap(), "mri_segment norm.mgz wm.mgz");
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use neurowrap_spec::{Interface, InterfaceDefinition, SpecError};
use serde::Serialize;

use crate::config::EnvConfig;
use crate::freesurfer::{sample_to_surface, segment_wm, surface_smooth, surface_snapshots, surface_transform};
use crate::fsl::proj_thresh;

/// Builds an interface definition for a configuration.
pub type BuildFn = fn(&EnvConfig) -> Result<InterfaceDefinition, SpecError>;

/// Tool package an interface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    FreeSurfer,
    Fsl,
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Package::FreeSurfer => write!(f, "freesurfer"),
            Package::Fsl => write!(f, "fsl"),
        }
    }
}

/// One catalog row.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub command: &'static str,
    pub package: Package,
    pub summary: &'static str,
    #[serde(skip)]
    build: BuildFn,
}

impl CatalogEntry {
    /// Builds the definition for `config`.
    pub fn definition(&self, config: &EnvConfig) -> Result<InterfaceDefinition, SpecError> {
        (self.build)(config)
    }

    /// Builds the definition and wraps it in a fresh interface.
    pub fn instantiate(&self, config: &EnvConfig, working_dir: impl Into<PathBuf>) -> Result<Interface, SpecError> {
        let definition = self.definition(config)?;
        Ok(Interface::new(Arc::new(definition), working_dir))
    }
}

/// All interfaces, grouped by package.
pub static ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: sample_to_surface::NAME,
        command: sample_to_surface::COMMAND,
        package: Package::FreeSurfer,
        summary: "Sample a volume onto a cortical surface",
        build: sample_to_surface::definition,
    },
    CatalogEntry {
        name: surface_smooth::NAME,
        command: surface_smooth::COMMAND,
        package: Package::FreeSurfer,
        summary: "Smooth a surface image",
        build: surface_smooth::definition,
    },
    CatalogEntry {
        name: surface_transform::NAME,
        command: surface_transform::COMMAND,
        package: Package::FreeSurfer,
        summary: "Transform a surface file from one subject to another",
        build: surface_transform::definition,
    },
    CatalogEntry {
        name: surface_snapshots::NAME,
        command: surface_snapshots::COMMAND,
        package: Package::FreeSurfer,
        summary: "Take surface snapshots with tksurfer",
        build: surface_snapshots::definition,
    },
    CatalogEntry {
        name: segment_wm::NAME,
        command: segment_wm::COMMAND,
        package: Package::FreeSurfer,
        summary: "Segment white matter from a normalized volume",
        build: segment_wm::definition,
    },
    CatalogEntry {
        name: proj_thresh::NAME,
        command: proj_thresh::COMMAND,
        package: Package::Fsl,
        summary: "Threshold connectivity distributions from probabilistic tractography",
        build: proj_thresh::definition,
    },
];

/// All catalog entries.
pub fn entries() -> &'static [CatalogEntry] {
    ENTRIES
}

/// Looks up an interface by name, ignoring case.
pub fn find(name: &str) -> Option<&'static CatalogEntry> {
    ENTRIES.iter().find(|entry| entry.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_every_definition_builds() {
        let config = EnvConfig::default().subjects_dir("/subjects");
        for entry in entries() {
            let definition = entry
                .definition(&config)
                .unwrap_or_else(|err| panic!("{} failed to build: {}", entry.name, err));
            assert_eq!(definition.name(), entry.name);
            assert_eq!(definition.command(), entry.command);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<String> = entries().iter().map(|e| e.name.to_lowercase()).collect();
        assert_eq!(names.len(), entries().len());
    }

    #[test]
    fn test_find_ignores_case() {
        assert_eq!(find("SampleToSurface").map(|e| e.command), Some("mri_vol2surf"));
        assert_eq!(find("projthresh").map(|e| e.package), Some(Package::Fsl));
        assert!(find("BET").is_none());
    }

    #[test]
    fn test_common_fields_everywhere() {
        let config = EnvConfig::default();
        for entry in entries() {
            let definition = entry.definition(&config).unwrap();
            for name in ["args", "ignore_exception", "terminal_output"] {
                assert!(
                    definition.inputs().contains(name),
                    "{} lacks {}",
                    entry.name,
                    name
                );
            }
            let env_var = match entry.package {
                Package::FreeSurfer => "SUBJECTS_DIR",
                Package::Fsl => "FSLOUTPUTTYPE",
            };
            assert!(definition
                .environment_fields()
                .iter()
                .any(|(var, _)| var == env_var));
        }
    }
}
