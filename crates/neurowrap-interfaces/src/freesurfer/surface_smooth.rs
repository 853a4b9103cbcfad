//! `mri_surf2surf` as a surface smoother.
//!
//! Smoothing is given either as a Gaussian FWHM or as a number of nearest
//! neighbor iterations. The smoothed file defaults to
//! `{cwd}/{stem}_smooth{N}{ext}` where `N` is the integer part of whichever
//! kernel was given.

use neurowrap_spec::{fname_presuffix, FieldKind, FieldSpec, FieldValue, InterfaceDefinition, Resolver, SpecError};

use super::{definition_builder, HEMISPHERES};
use crate::base::require_path;
use crate::config::EnvConfig;

pub const NAME: &str = "SurfaceSmooth";
pub const COMMAND: &str = "mri_surf2surf";

pub fn definition(config: &EnvConfig) -> Result<InterfaceDefinition, SpecError> {
    definition_builder(NAME, COMMAND, config)
        .input(
            FieldSpec::new("cortex", FieldKind::Boolean)
                .desc("only smooth within $hemi.cortex.label")
                .argstr("--cortex")
                .default_value(true),
        )
        .input(
            FieldSpec::new("fwhm", FieldKind::Float)
                .desc("effective FWHM of the smoothing process")
                .argstr("--fwhm %.4f")
                .excludes(["smooth_iters"]),
        )
        .input(
            FieldSpec::new("hemi", FieldKind::Enum)
                .desc("hemisphere to operate on")
                .choices(HEMISPHERES)
                .argstr("--hemi %s")
                .mandatory(),
        )
        .input(
            FieldSpec::new("in_file", FieldKind::File)
                .desc("source surface file")
                .argstr("--sval %s")
                .mandatory(),
        )
        .input(
            FieldSpec::new("out_file", FieldKind::File)
                .desc("surface file to write")
                .argstr("--tval %s")
                .derived("smoothed_file", smoothed_file),
        )
        .input(
            FieldSpec::new("reshape", FieldKind::Boolean)
                .desc("reshape surface vector to fit in non-mgh format")
                .argstr("--reshape"),
        )
        .input(
            FieldSpec::new("smooth_iters", FieldKind::Integer)
                .desc("iterations of the smoothing process")
                .argstr("--smooth %d")
                .excludes(["fwhm"]),
        )
        .input(
            FieldSpec::new("subject_id", FieldKind::String)
                .desc("subject id of surface file")
                .argstr("--s %s")
                .mandatory(),
        )
        .output(FieldSpec::new("out_file", FieldKind::File).desc("smoothed surface file"))
        .build()
}

fn smoothed_file(resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
    let in_file = require_path(resolver, "in_file")?;
    let kernel = match resolver.get("fwhm")? {
        Some(fwhm) => fwhm,
        None => resolver.require("smooth_iters").map_err(|_| SpecError::UnresolvedDefault {
            field: "out_file".to_string(),
            dependency: "fwhm".to_string(),
        })?,
    };
    let kernel = kernel.as_i64().ok_or_else(|| SpecError::TypeMismatch {
        field: "out_file".to_string(),
        expected: "numeric smoothing kernel".to_string(),
        found: kernel.shape(),
    })?;
    let path = fname_presuffix(
        &in_file,
        "",
        &format!("_smooth{}", kernel),
        true,
        resolver.working_dir(),
    );
    Ok(Some(FieldValue::Path(path)))
}
