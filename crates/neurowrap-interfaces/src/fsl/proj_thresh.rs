//! `proj_thresh`: threshold connectivity distributions from probabilistic
//! tractography.
//!
//! One output is written per input, next to it, named
//! `{stem}_proj_seg_thr_{threshold}{ext}` with the extension taken from the
//! FSL output type.

use std::path::Path;

use neurowrap_spec::{split_filename, FieldKind, FieldSpec, FieldValue, InterfaceDefinition, Resolver, SpecError};

use super::{definition_builder, output_extension};
use crate::base::require_text;
use crate::config::EnvConfig;

pub const NAME: &str = "ProjThresh";
pub const COMMAND: &str = "proj_thresh";

pub fn definition(config: &EnvConfig) -> Result<InterfaceDefinition, SpecError> {
    definition_builder(NAME, COMMAND, config)
        .input(
            FieldSpec::new("in_files", FieldKind::list(FieldKind::File))
                .desc("a list of input volumes")
                .argstr("%s")
                .position(0)
                .mandatory(),
        )
        .input(
            FieldSpec::new("threshold", FieldKind::Integer)
                .desc("threshold indicating minimum number of seed voxels entering this mask region")
                .argstr("%d")
                .position(1)
                .mandatory(),
        )
        .output(
            FieldSpec::new("out_files", FieldKind::list(FieldKind::File))
                .desc("path/name of output volume after thresholding")
                .derived("thresholded_files", thresholded_files),
        )
        .build()
}

fn thresholded_files(resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
    let in_files = resolver.require("in_files")?;
    let threshold = require_text(resolver, "threshold")?;
    let ext = output_extension(resolver)?;

    let files = in_files
        .items()
        .unwrap_or_default()
        .iter()
        .filter_map(FieldValue::as_path)
        .map(|path| {
            let (dir, stem, _) = split_filename(path);
            let dir = if dir.as_os_str().is_empty() {
                resolver.working_dir().to_path_buf()
            } else {
                resolver.in_working_dir(&dir)
            };
            let name = format!("{}_proj_seg_thr_{}{}", stem, threshold, ext);
            FieldValue::Path(dir.join(Path::new(&name)))
        })
        .collect();
    Ok(Some(FieldValue::List(files)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    use neurowrap_spec::{ErrorCode, Interface, PredictedPath};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fsl::FslOutputType;

    fn proj_thresh(config: &EnvConfig) -> Interface {
        let mut proj = Interface::new(Arc::new(definition(config).unwrap()), "/work");
        proj.set("in_files", vec!["/data/seeds_to_a.nii.gz", "seeds_to_b.nii.gz"])
            .unwrap();
        proj.set("threshold", 3).unwrap();
        proj
    }

    #[test]
    fn test_inputs_metadata() {
        let definition = definition(&EnvConfig::default()).unwrap();
        let inputs = definition.inputs();

        let in_files = inputs.lookup("in_files").unwrap().summary();
        assert_eq!(in_files.argstr.as_deref(), Some("%s"));
        assert!(in_files.mandatory);
        assert_eq!(in_files.position, Some(0));

        let threshold = inputs.lookup("threshold").unwrap().summary();
        assert_eq!(threshold.argstr.as_deref(), Some("%d"));
        assert!(threshold.mandatory);
        assert_eq!(threshold.position, Some(1));

        let output_type = inputs.lookup("output_type").unwrap().summary();
        assert_eq!(output_type.argstr, None);
        assert!(!output_type.mandatory);

        for name in ["ignore_exception", "terminal_output"] {
            assert!(inputs.lookup(name).unwrap().summary().nohash);
        }
    }

    #[test]
    fn test_command_line() {
        let mut proj = proj_thresh(&EnvConfig::default());
        assert_eq!(
            proj.cmdline().unwrap(),
            "proj_thresh /data/seeds_to_a.nii.gz seeds_to_b.nii.gz 3"
        );
    }

    #[test]
    fn test_outputs_follow_output_type() {
        let proj = proj_thresh(&EnvConfig::default());
        assert_eq!(
            proj.predicted_outputs().unwrap()["out_files"],
            PredictedPath::Multiple(vec![
                PathBuf::from("/data/seeds_to_a_proj_seg_thr_3.nii.gz"),
                PathBuf::from("/work/seeds_to_b_proj_seg_thr_3.nii.gz"),
            ])
        );

        let config = EnvConfig::default().fsl_output_type(FslOutputType::NiftiPair);
        let proj = proj_thresh(&config);
        assert_eq!(
            proj.predicted_outputs().unwrap()["out_files"].to_string(),
            "/data/seeds_to_a_proj_seg_thr_3.img /work/seeds_to_b_proj_seg_thr_3.img"
        );
        assert_eq!(
            proj.environment().unwrap(),
            BTreeMap::from([("FSLOUTPUTTYPE".to_string(), "NIFTI_PAIR".to_string())])
        );
    }

    #[test]
    fn test_output_type_override() {
        let mut proj = proj_thresh(&EnvConfig::default());
        proj.set("output_type", "NIFTI").unwrap();
        assert_eq!(
            proj.predicted_outputs().unwrap()["out_files"].to_string(),
            "/data/seeds_to_a_proj_seg_thr_3.nii /work/seeds_to_b_proj_seg_thr_3.nii"
        );
        assert_eq!(
            proj.set("output_type", "ANALYZE").unwrap_err().code(),
            ErrorCode::ValueOutOfRange
        );
    }

    #[test]
    fn test_missing_inputs() {
        let definition = Arc::new(definition(&EnvConfig::default()).unwrap());
        let mut proj = Interface::new(definition, "/work");
        proj.set("threshold", 3).unwrap();
        assert_eq!(
            proj.predicted_outputs().unwrap_err(),
            SpecError::UnresolvableOutput {
                output: "out_files".to_string(),
                source_field: "in_files".to_string(),
            }
        );
        assert_eq!(
            proj.render().unwrap_err(),
            SpecError::MissingMandatoryFields {
                fields: vec!["in_files".to_string()],
            }
        );
    }
}
