//! `mri_vol2surf`: sample a volume onto a cortical surface.
//!
//! The sampling flags fold three inputs into one token: `sampling_method`,
//! `sampling_range` and `sampling_units` render as
//! `--proj{units}{-max|-avg} {range}`, where `mm` units are spelled `dist`.
//!
//! The surface file defaults to `{cwd}/{hemi}.{source stem}.{ext}` with the
//! extension chosen by `out_type` (`mgz` when unset). Hits and voxel-count
//! files are written only when requested; `true` picks a generated name.

use std::path::PathBuf;

use neurowrap_spec::{
    fname_presuffix, split_filename, ArgTemplate, FieldKind, FieldSpec, FieldValue, InterfaceDefinition,
    Resolver, SpecError,
};

use super::{definition_builder, format_extension, format_names, is_known_extension, HEMISPHERES};
use crate::base::{optional_text, require_path, require_text};
use crate::config::EnvConfig;

pub const NAME: &str = "SampleToSurface";
pub const COMMAND: &str = "mri_vol2surf";

const REGISTRATION: [&str; 3] = ["reg_file", "reg_header", "mni152reg"];

pub fn definition(config: &EnvConfig) -> Result<InterfaceDefinition, SpecError> {
    let float3 = || FieldKind::Tuple(vec![FieldKind::Float; 3]);

    definition_builder(NAME, COMMAND, config)
        .input(
            FieldSpec::new("apply_rot", float3())
                .desc("rotation angles (in degrees) to apply to reg matrix")
                .argstr("--rot %.3f %.3f %.3f"),
        )
        .input(
            FieldSpec::new("apply_trans", float3())
                .desc("translation (in mm) to apply to reg matrix")
                .argstr("--trans %.3f %.3f %.3f"),
        )
        .input(
            FieldSpec::new("cortex_mask", FieldKind::Boolean)
                .desc("mask the target surface with hemi.cortex.label")
                .argstr("--cortex")
                .excludes(["mask_label"]),
        )
        .input(
            FieldSpec::new("fix_tk_reg", FieldKind::Boolean)
                .desc("make reg matrix round-compatible")
                .argstr("--fixtkreg"),
        )
        .input(
            FieldSpec::new("float2int_method", FieldKind::Enum)
                .desc("method to convert reg matrix values")
                .choices(["round", "tkregister"])
                .argstr("--float2int %s"),
        )
        .input(
            FieldSpec::new("frame", FieldKind::Integer)
                .desc("save only one frame (0-based)")
                .argstr("--frame %d"),
        )
        .input(
            FieldSpec::new("hemi", FieldKind::Enum)
                .desc("target hemisphere")
                .choices(HEMISPHERES)
                .argstr("--hemi %s")
                .mandatory(),
        )
        .input(
            FieldSpec::new("hits_file", FieldKind::Either(vec![FieldKind::Boolean, FieldKind::File]))
                .desc("save image with number of hits at each voxel")
                .formatter("hits_file", format_hits),
        )
        .input(
            FieldSpec::new("hits_type", FieldKind::Enum)
                .desc("hits file type")
                .choices(format_names())
                .argstr("--srchit_type %s"),
        )
        .input(
            FieldSpec::new("ico_order", FieldKind::Integer)
                .desc("icosahedron order when target_subject is 'ico'")
                .argstr("--icoorder %d")
                .requires(["target_subject"]),
        )
        .input(
            FieldSpec::new("interp_method", FieldKind::Enum)
                .desc("interpolation method")
                .choices(["nearest", "trilinear"])
                .argstr("--interp %s"),
        )
        .input(
            FieldSpec::new("mask_label", FieldKind::File)
                .desc("label file to mask output with")
                .argstr("--mask %s")
                .excludes(["cortex_mask"]),
        )
        .input(
            FieldSpec::new("mni152reg", FieldKind::Boolean)
                .desc("source volume is in MNI152 space")
                .argstr("--mni152reg")
                .mandatory()
                .excludes(REGISTRATION),
        )
        .input(
            FieldSpec::new("no_reshape", FieldKind::Boolean)
                .desc("do not reshape surface vector (default)")
                .argstr("--noreshape")
                .excludes(["reshape"]),
        )
        .input(
            FieldSpec::new("out_file", FieldKind::File)
                .desc("surface file to write")
                .argstr("--o %s")
                .derived("surface_file", surface_file),
        )
        .input(
            FieldSpec::new("out_type", FieldKind::Enum)
                .desc("output file type")
                .choices(format_names())
                .formatter("out_type", format_out_type),
        )
        .input(
            FieldSpec::new("override_reg_subj", FieldKind::Boolean)
                .desc("override the subject in the reg file header")
                .formatter("srcsubject", format_source_subject)
                .requires(["subject_id"]),
        )
        .input(
            FieldSpec::new("projection_stem", FieldKind::String)
                .desc("stem for precomputed linear estimates and volume fractions")
                .mandatory()
                .excludes(["sampling_method"]),
        )
        .input(
            FieldSpec::new("reference_file", FieldKind::File)
                .desc("reference volume (default is orig.mgz)")
                .argstr("--ref %s"),
        )
        .input(
            FieldSpec::new("reg_file", FieldKind::File)
                .desc("source-to-reference registration file")
                .argstr("--reg %s")
                .mandatory()
                .excludes(REGISTRATION),
        )
        .input(
            FieldSpec::new("reg_header", FieldKind::Boolean)
                .desc("register based on header geometry")
                .formatter("regheader", format_reg_header)
                .mandatory()
                .excludes(REGISTRATION)
                .requires(["subject_id"]),
        )
        .input(
            FieldSpec::new("reshape", FieldKind::Boolean)
                .desc("reshape surface vector to fit in non-mgh format")
                .argstr("--reshape")
                .excludes(["no_reshape"]),
        )
        .input(
            FieldSpec::new("reshape_slices", FieldKind::Integer)
                .desc("number of 'slices' for reshaping")
                .argstr("--rf %d"),
        )
        .input(
            FieldSpec::new("sampling_method", FieldKind::Enum)
                .desc("how to sample: at a point, or the max or average over a range")
                .choices(["point", "max", "average"])
                .formatter("projection", format_projection)
                .mandatory()
                .excludes(["projection_stem"])
                .requires(["sampling_range", "sampling_units"]),
        )
        .input(
            FieldSpec::new(
                "sampling_range",
                FieldKind::Either(vec![FieldKind::Float, float3()]),
            )
            .desc("sampling range: a point or a (min, max, step) tuple"),
        )
        .input(
            FieldSpec::new("sampling_units", FieldKind::Enum)
                .desc("sampling range type, either 'mm' or 'frac'")
                .choices(["mm", "frac"]),
        )
        .input(
            FieldSpec::new("scale_input", FieldKind::Float)
                .desc("multiply all intensities by scale factor")
                .argstr("--scale %.3f"),
        )
        .input(
            FieldSpec::new("smooth_surf", FieldKind::Float)
                .desc("smooth output surface (mm fwhm)")
                .argstr("--surf-fwhm %.3f"),
        )
        .input(
            FieldSpec::new("smooth_vol", FieldKind::Float)
                .desc("smooth input volume (mm fwhm)")
                .argstr("--fwhm %.3f"),
        )
        .input(
            FieldSpec::new("source_file", FieldKind::File)
                .desc("volume to sample values from")
                .argstr("--mov %s")
                .mandatory(),
        )
        .input(FieldSpec::new("subject_id", FieldKind::String).desc("subject id"))
        .input(
            FieldSpec::new("surf_reg", FieldKind::Boolean)
                .desc("use surface registration to target subject")
                .argstr("--surfreg")
                .requires(["target_subject"]),
        )
        .input(
            FieldSpec::new("surface", FieldKind::String)
                .desc("target surface (default is white)")
                .argstr("--surf %s"),
        )
        .input(
            FieldSpec::new("target_subject", FieldKind::String)
                .desc("sample to surface of different subject than source")
                .argstr("--trgsubject %s"),
        )
        .input(
            FieldSpec::new("vox_file", FieldKind::Either(vec![FieldKind::Boolean, FieldKind::File]))
                .desc("text file with the number of voxels intersecting the surface")
                .formatter("vox_file", format_vox),
        )
        .output(FieldSpec::new("out_file", FieldKind::File).desc("surface file"))
        .output(
            FieldSpec::new("hits_file", FieldKind::File)
                .desc("image with number of hits at each voxel")
                .derived("hits_file", hits_output),
        )
        .output(
            FieldSpec::new("vox_file", FieldKind::File)
                .desc("text file with the number of voxels intersecting the surface")
                .derived("vox_file", vox_output),
        )
        .build()
}

/// `{cwd}/{hemi}.{source stem}{suffix}`.
fn source_derived_name(resolver: &Resolver<'_>, suffix: &str) -> Result<PathBuf, SpecError> {
    let source = require_path(resolver, "source_file")?;
    let hemi = require_text(resolver, "hemi")?;
    Ok(fname_presuffix(
        &source,
        &format!("{}.", hemi),
        suffix,
        false,
        resolver.working_dir(),
    ))
}

fn out_extension(resolver: &Resolver<'_>) -> Result<&'static str, SpecError> {
    Ok(optional_text(resolver, "out_type")?
        .and_then(|format| format_extension(&format))
        .unwrap_or("mgz"))
}

fn surface_file(resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
    let ext = out_extension(resolver)?;
    let path = source_derived_name(resolver, &format!(".{}", ext))?;
    Ok(Some(FieldValue::Path(path)))
}

fn hits_file_name(resolver: &Resolver<'_>) -> Result<PathBuf, SpecError> {
    let ext = out_extension(resolver)?;
    source_derived_name(resolver, &format!("_hits.{}", ext))
}

fn vox_file_name(resolver: &Resolver<'_>) -> Result<PathBuf, SpecError> {
    source_derived_name(resolver, "_vox.txt")
}

/// Resolves an optional "true or a path" input to the file it names.
fn requested_file(
    resolver: &Resolver<'_>,
    field: &str,
    generated: fn(&Resolver<'_>) -> Result<PathBuf, SpecError>,
) -> Result<Option<PathBuf>, SpecError> {
    match resolver.get(field)? {
        Some(FieldValue::Bool(true)) => generated(resolver).map(Some),
        Some(FieldValue::Bool(false)) | None => Ok(None),
        Some(other) => Ok(other.as_path().map(|p| resolver.in_working_dir(p))),
    }
}

fn hits_output(resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
    Ok(requested_file(resolver, "hits_file", hits_file_name)?.map(FieldValue::Path))
}

fn vox_output(resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
    Ok(requested_file(resolver, "vox_file", vox_file_name)?.map(FieldValue::Path))
}

fn format_hits(_value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    Ok(requested_file(resolver, "hits_file", hits_file_name)?
        .map(|path| format!("--srchit {}", path.display())))
}

fn format_vox(_value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    Ok(requested_file(resolver, "vox_file", vox_file_name)?
        .map(|path| format!("--nvox {}", path.display())))
}

fn format_out_type(value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    let format = value.to_string();
    if let Some(out_file) = resolver.instance().explicit("out_file").and_then(FieldValue::as_path) {
        let (_, _, ext) = split_filename(out_file);
        let ext = ext.trim_start_matches('.');
        if is_known_extension(ext) && format_extension(&format) != Some(ext) {
            return Err(SpecError::InvalidValue {
                field: "out_type".to_string(),
                input: format.clone(),
                reason: format!("cannot write {} format to a file ending in .{}", format, ext),
            });
        }
    }
    Ok(Some(format!("--out_type {}", format)))
}

fn format_projection(value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    let range = resolver.require("sampling_range")?;
    let units = require_text(resolver, "sampling_units")?;
    let units = if units == "mm" { "dist" } else { units.as_str() };
    let method = match value.as_str() {
        Some("max") => "-max",
        Some("average") => "-avg",
        _ => "",
    };
    let range = match &range {
        FieldValue::Tuple(items) => ArgTemplate::new("%.3f %.3f %.3f").format(items)?,
        single => ArgTemplate::new("%.3f").format(std::slice::from_ref(single))?,
    };
    Ok(Some(format!("--proj{}{} {}", units, method, range)))
}

fn subject_flag(flag: &str, value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    if value.as_bool() != Some(true) {
        return Ok(None);
    }
    let subject = require_text(resolver, "subject_id")?;
    Ok(Some(format!("{} {}", flag, subject)))
}

fn format_reg_header(value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    subject_flag("--regheader", value, resolver)
}

fn format_source_subject(value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    subject_flag("--srcsubject", value, resolver)
}
