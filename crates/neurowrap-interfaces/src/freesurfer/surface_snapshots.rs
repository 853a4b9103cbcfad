//! `tksurfer` driven by a Tcl script to take surface snapshots.
//!
//! Snapshots are written to `{cwd}/{stem}-lat.tif` and `{cwd}/{stem}-med.tif`
//! (plus dorsal, ventral, anterior and posterior views with `six_images`).
//! The stem is `{subject_id}_{hemi}_{surface}` unless `screenshot_stem` is
//! given. `stem_template_args` names inputs whose values fill the `%s`
//! directives of a custom stem.

use std::path::Path;

use neurowrap_spec::{ArgTemplate, FieldKind, FieldSpec, FieldValue, InterfaceDefinition, Resolver, SpecError};

use super::{definition_builder, HEMISPHERES};
use crate::base::{optional_text, require_text};
use crate::config::EnvConfig;

pub const NAME: &str = "SurfaceSnapshots";
pub const COMMAND: &str = "tksurfer";

/// Script file passed with `-tcl` when none is given.
pub const DEFAULT_TCL_SCRIPT: &str = "snapshots.tcl";

const OVERLAY_REGISTRATION: [&str; 3] = ["overlay_reg", "identity_reg", "mni152_reg"];

pub fn definition(config: &EnvConfig) -> Result<InterfaceDefinition, SpecError> {
    let float = || FieldKind::Float;

    definition_builder(NAME, COMMAND, config)
        .input(
            FieldSpec::new("subject_id", FieldKind::String)
                .desc("subject to visualize")
                .argstr("%s")
                .position(1)
                .mandatory(),
        )
        .input(
            FieldSpec::new("hemi", FieldKind::Enum)
                .desc("hemisphere to visualize")
                .choices(HEMISPHERES)
                .argstr("%s")
                .position(2)
                .mandatory(),
        )
        .input(
            FieldSpec::new("surface", FieldKind::String)
                .desc("surface to visualize")
                .argstr("%s")
                .position(3)
                .mandatory(),
        )
        .input(
            FieldSpec::new("annot_file", FieldKind::File)
                .desc("path to annotation file to display")
                .argstr("-annotation %s")
                .excludes(["annot_name"]),
        )
        .input(
            FieldSpec::new("annot_name", FieldKind::String)
                .desc("name of annotation to display (must be in $subject/label directory)")
                .formatter("annotation", format_annot_name)
                .excludes(["annot_file"]),
        )
        .input(
            FieldSpec::new("colortable", FieldKind::File)
                .desc("load colortable file")
                .argstr("-colortable %s"),
        )
        .input(
            FieldSpec::new("demean_overlay", FieldKind::Boolean)
                .desc("remove mean from overlay")
                .argstr("-zm"),
        )
        .input(
            FieldSpec::new("identity_reg", FieldKind::Boolean)
                .desc("use the identity matrix to register the overlay to the surface")
                .argstr("-overlay-reg-identity")
                .excludes(OVERLAY_REGISTRATION)
                .requires(["overlay"]),
        )
        .input(
            FieldSpec::new("invert_overlay", FieldKind::Boolean)
                .desc("invert overlay display")
                .argstr("-invphaseflag 1"),
        )
        .input(
            FieldSpec::new("label_file", FieldKind::File)
                .desc("path to label file to display")
                .argstr("-label %s")
                .excludes(["label_name"]),
        )
        .input(
            FieldSpec::new("label_name", FieldKind::String)
                .desc("name of label to display (must be in $subject/label directory)")
                .argstr("-label %s")
                .excludes(["label_file"]),
        )
        .input(
            FieldSpec::new("label_outline", FieldKind::Boolean)
                .desc("draw label/annotation as outline")
                .argstr("-label-outline"),
        )
        .input(
            FieldSpec::new("label_under", FieldKind::Boolean)
                .desc("draw label/annotation under overlay")
                .argstr("-labels-under"),
        )
        .input(
            FieldSpec::new("mni152_reg", FieldKind::Boolean)
                .desc("use to display a volume in MNI152 space on the average subject")
                .argstr("-mni152reg")
                .excludes(OVERLAY_REGISTRATION)
                .requires(["overlay"]),
        )
        .input(
            FieldSpec::new("orig_suffix", FieldKind::String)
                .desc("set the orig surface suffix string")
                .argstr("-orig %s"),
        )
        .input(
            FieldSpec::new("overlay", FieldKind::File)
                .desc("load an overlay volume/surface")
                .argstr("-overlay %s")
                .requires(["overlay_range"]),
        )
        .input(
            FieldSpec::new("overlay_range", FieldKind::Either(vec![
                float(),
                FieldKind::Tuple(vec![float(); 2]),
                FieldKind::Tuple(vec![float(); 3]),
            ]))
            .desc("overlay range: a threshold, (min, max) or (min, mid, max)")
            .formatter("overlay_range", format_overlay_range),
        )
        .input(
            FieldSpec::new("overlay_range_offset", FieldKind::Float)
                .desc("overlay range will be symmetric around offset value")
                .argstr("-foffset %.3f"),
        )
        .input(
            FieldSpec::new("overlay_reg", FieldKind::File)
                .desc("registration matrix file to register overlay to surface")
                .argstr("-overlay-reg %s")
                .excludes(OVERLAY_REGISTRATION)
                .requires(["overlay"]),
        )
        .input(
            FieldSpec::new("patch_file", FieldKind::File)
                .desc("load a patch")
                .argstr("-patch %s"),
        )
        .input(
            FieldSpec::new("reverse_overlay", FieldKind::Boolean)
                .desc("reverse overlay display")
                .argstr("-revphaseflag 1"),
        )
        .input(
            FieldSpec::new("screenshot_stem", FieldKind::String)
                .desc("stem to use for screenshot file names"),
        )
        .input(
            FieldSpec::new("show_color_scale", FieldKind::Boolean)
                .desc("display the color scale bar")
                .argstr("-colscalebarflag 1"),
        )
        .input(
            FieldSpec::new("show_color_text", FieldKind::Boolean)
                .desc("display text in the color scale bar")
                .argstr("-colscaletext 1"),
        )
        .input(
            FieldSpec::new("show_curv", FieldKind::Boolean)
                .desc("show curvature")
                .argstr("-curv")
                .excludes(["show_gray_curv"]),
        )
        .input(
            FieldSpec::new("show_gray_curv", FieldKind::Boolean)
                .desc("show curvature in gray")
                .argstr("-gray")
                .excludes(["show_curv"]),
        )
        .input(
            FieldSpec::new("six_images", FieldKind::Boolean)
                .desc("also take anterior, posterior, dorsal and ventral snapshots"),
        )
        .input(
            FieldSpec::new("sphere_suffix", FieldKind::String)
                .desc("set the sphere.reg suffix string")
                .argstr("-sphere %s"),
        )
        .input(
            FieldSpec::new("stem_template_args", FieldKind::list(FieldKind::String))
                .desc("input names to use as arguments for a string-formatted stem template")
                .requires(["screenshot_stem"]),
        )
        .input(
            FieldSpec::new("tcl_script", FieldKind::String)
                .desc("override default screenshot script")
                .argstr("-tcl %s")
                .default_value(DEFAULT_TCL_SCRIPT),
        )
        .input(
            FieldSpec::new("truncate_overlay", FieldKind::Boolean)
                .desc("truncate the overlay display")
                .argstr("-truncphaseflag 1"),
        )
        .output(
            FieldSpec::new("snapshots", FieldKind::list(FieldKind::File))
                .desc("tiff images of the surface from different perspectives")
                .derived("snapshots", snapshot_files),
        )
        .build()
}

fn format_annot_name(value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    let hemi = require_text(resolver, "hemi")?;
    let mut name = value.to_string();
    if let Some(stripped) = name.strip_suffix(".annot") {
        name = stripped.to_string();
    }
    let hemi_prefixed = ['.', '-', '_']
        .iter()
        .any(|sep| name.starts_with(&format!("{}{}", hemi, sep)));
    if hemi_prefixed {
        name = name[hemi.len() + 1..].to_string();
    }
    Ok(Some(format!("-annotation {}", name)))
}

fn format_overlay_range(value: &FieldValue, _resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
    let items = value.items().unwrap_or(std::slice::from_ref(value));
    let formatted = match items {
        [threshold] => ArgTemplate::new("-fthresh %.3f").format(&[threshold.clone()])?,
        [min, max] => ArgTemplate::new("-fminmax %.3f %.3f").format(&[min.clone(), max.clone()])?,
        [min, mid, max] => ArgTemplate::new("-fminmax %.3f %.3f -fmid %.3f")
            .format(&[min.clone(), max.clone(), mid.clone()])?,
        _ => {
            return Err(SpecError::TypeMismatch {
                field: "overlay_range".to_string(),
                expected: "float or 2/3-tuple of floats".to_string(),
                found: value.shape(),
            })
        }
    };
    Ok(Some(formatted))
}

fn screenshot_stem(resolver: &Resolver<'_>) -> Result<String, SpecError> {
    let Some(stem) = optional_text(resolver, "screenshot_stem")? else {
        return Ok(format!(
            "{}_{}_{}",
            require_text(resolver, "subject_id")?,
            require_text(resolver, "hemi")?,
            require_text(resolver, "surface")?
        ));
    };
    let Some(args) = resolver.get("stem_template_args")? else {
        return Ok(stem);
    };
    let values = args
        .items()
        .unwrap_or_default()
        .iter()
        .map(|name| resolver.require(&name.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    ArgTemplate::new(stem).format(&values)
}

fn snapshot_files(resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
    let stem = screenshot_stem(resolver)?;
    let mut views = vec!["lat", "med"];
    if resolver.get("six_images")?.and_then(|v| v.as_bool()) == Some(true) {
        views.extend(["dor", "ven", "ant", "pos"]);
    }
    let files = views
        .into_iter()
        .map(|view| FieldValue::Path(resolver.in_working_dir(Path::new(&format!("{}-{}.tif", stem, view)))))
        .collect();
    Ok(Some(FieldValue::List(files)))
}
