//! `mri_surf2surf` as a transform between subjects.
//!
//! The transformed file defaults to `{cwd}/{stem}.{target_subject}{ext}`.
//! Recon-all surface files have no real extension (`lh.thickness`), so
//! their last component stays in the stem and no extension is appended.
//! An explicit `target_type` always picks the extension.

use neurowrap_spec::{
    fname_presuffix, split_filename, FieldKind, FieldSpec, FieldValue, InterfaceDefinition, Resolver, SpecError,
};

use super::{definition_builder, format_extension, format_names, HEMISPHERES};
use crate::base::{optional_text, require_path, require_text};
use crate::config::EnvConfig;

pub const NAME: &str = "SurfaceTransform";
pub const COMMAND: &str = "mri_surf2surf";

/// Recon-all surface and measure names that look like extensions.
const RECON_ALL_SUFFIXES: &[&str] = &[
    "area",
    "mid",
    "pial",
    "avg_curv",
    "curv",
    "inflated",
    "jacobian_white",
    "orig",
    "nofix",
    "smoothwm",
    "crv",
    "sphere",
    "sulc",
    "thickness",
    "volume",
    "white",
];

pub fn definition(config: &EnvConfig) -> Result<InterfaceDefinition, SpecError> {
    definition_builder(NAME, COMMAND, config)
        .input(
            FieldSpec::new("hemi", FieldKind::Enum)
                .desc("hemisphere to transform")
                .choices(HEMISPHERES)
                .argstr("--hemi %s")
                .mandatory(),
        )
        .input(
            FieldSpec::new("out_file", FieldKind::File)
                .desc("surface file to write")
                .argstr("--tval %s")
                .derived("transformed_file", transformed_file),
        )
        .input(
            FieldSpec::new("reshape", FieldKind::Boolean)
                .desc("reshape output surface to conform with Nifti")
                .argstr("--reshape"),
        )
        .input(
            FieldSpec::new("reshape_factor", FieldKind::Integer)
                .desc("number of slices in reshaped image")
                .argstr("--reshape-factor %d"),
        )
        .input(
            FieldSpec::new("source_annot_file", FieldKind::File)
                .desc("surface annotation file")
                .argstr("--sval-annot %s")
                .mandatory()
                .excludes(["source_file"]),
        )
        .input(
            FieldSpec::new("source_file", FieldKind::File)
                .desc("surface file with source values")
                .argstr("--sval %s")
                .mandatory()
                .excludes(["source_annot_file"]),
        )
        .input(
            FieldSpec::new("source_subject", FieldKind::String)
                .desc("subject id for source surface")
                .argstr("--srcsubject %s")
                .mandatory(),
        )
        .input(
            FieldSpec::new("source_type", FieldKind::Enum)
                .desc("source file format")
                .choices(format_names())
                .argstr("--sfmt %s")
                .requires(["source_file"]),
        )
        .input(
            FieldSpec::new("target_ico_order", FieldKind::Enum)
                .desc("order of the icosahedron if target_subject is 'ico'")
                .choices(1..=7)
                .argstr("--trgicoorder %d"),
        )
        .input(
            FieldSpec::new("target_subject", FieldKind::String)
                .desc("subject id of target surface")
                .argstr("--trgsubject %s")
                .mandatory(),
        )
        .input(
            FieldSpec::new("target_type", FieldKind::Enum)
                .desc("output format")
                .choices(format_names())
                .argstr("--tfmt %s"),
        )
        .output(FieldSpec::new("out_file", FieldKind::File).desc("transformed surface file"))
        .build()
}

fn transformed_file(resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
    let source = if resolver.is_set("source_file") {
        require_path(resolver, "source_file")?
    } else {
        require_path(resolver, "source_annot_file")?
    };
    let target_subject = require_text(resolver, "target_subject")?;

    let (_, _, ext) = split_filename(&source);
    let mut keep_ext = !RECON_ALL_SUFFIXES.contains(&ext.trim_start_matches('.'));
    let source = if keep_ext {
        source
    } else {
        source.with_file_name(format!(
            "{}.stripme",
            source.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        ))
    };

    let mut suffix = format!(".{}", target_subject);
    if let Some(target_type) = optional_text(resolver, "target_type")? {
        if let Some(ext) = format_extension(&target_type) {
            suffix.push('.');
            suffix.push_str(ext);
        }
        keep_ext = false;
    }

    let path = fname_presuffix(&source, "", &suffix, keep_ext, resolver.working_dir());
    Ok(Some(FieldValue::Path(path)))
}
