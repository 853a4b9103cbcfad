//! FreeSurfer interfaces.
//!
//! Every FreeSurfer interface declares a `subjects_dir` input. It is never
//! rendered; its resolved value is exported as `SUBJECTS_DIR` instead.

pub mod sample_to_surface;
pub mod segment_wm;
pub mod surface_smooth;
pub mod surface_snapshots;
pub mod surface_transform;

use neurowrap_spec::{FieldKind, FieldSpec, InterfaceDefinition, InterfaceDefinitionBuilder};

use crate::base::command_line_fields;
use crate::config::{EnvConfig, SUBJECTS_DIR_VAR};

/// Hemisphere choices.
pub const HEMISPHERES: [&str; 2] = ["lh", "rh"];

/// Volume and surface format names understood by FreeSurfer tools, with the
/// file extension each one writes.
pub const FILEMAP: &[(&str, &str)] = &[
    ("cor", "cor"),
    ("mgh", "mgh"),
    ("mgz", "mgz"),
    ("minc", "mnc"),
    ("afni", "brik"),
    ("brik", "brik"),
    ("bshort", "bshort"),
    ("spm", "img"),
    ("analyze", "img"),
    ("analyze4d", "img"),
    ("bfloat", "bfloat"),
    ("nifti1", "img"),
    ("nii", "nii"),
    ("niigz", "nii.gz"),
    ("gii", "gii"),
];

/// Extension (without the dot) written for `format`.
pub fn format_extension(format: &str) -> Option<&'static str> {
    FILEMAP
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, ext)| *ext)
}

/// True when `ext` (without the dot) is written by some known format.
pub fn is_known_extension(ext: &str) -> bool {
    FILEMAP.iter().any(|(_, known)| *known == ext)
}

/// Every format name, in table order.
pub fn format_names() -> Vec<&'static str> {
    FILEMAP.iter().map(|(name, _)| *name).collect()
}

/// Starts a FreeSurfer interface definition with the common fields.
pub(crate) fn definition_builder(name: &str, command: &str, config: &EnvConfig) -> InterfaceDefinitionBuilder {
    let subjects_dir = FieldSpec::new("subjects_dir", FieldKind::Directory).desc("subjects directory");
    let subjects_dir = match &config.subjects_dir {
        Some(dir) => subjects_dir.default_value(dir.clone()),
        None => subjects_dir,
    };
    InterfaceDefinition::builder(name, command)
        .inputs_with(command_line_fields)
        .input(subjects_dir)
        .env_var(SUBJECTS_DIR_VAR, "subjects_dir")
}
