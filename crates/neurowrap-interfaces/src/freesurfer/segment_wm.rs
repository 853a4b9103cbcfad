//! `mri_segment`: white matter segmentation of an intensity normalized
//! volume.

use neurowrap_spec::{FieldKind, FieldSpec, InterfaceDefinition, SpecError};

use super::definition_builder;
use crate::config::EnvConfig;

pub const NAME: &str = "SegmentWM";
pub const COMMAND: &str = "mri_segment";

pub fn definition(config: &EnvConfig) -> Result<InterfaceDefinition, SpecError> {
    definition_builder(NAME, COMMAND, config)
        .input(
            FieldSpec::new("in_file", FieldKind::File)
                .desc("input volume for segmentation")
                .argstr("%s")
                .position(-2)
                .mandatory(),
        )
        .input(
            FieldSpec::new("out_file", FieldKind::File)
                .desc("file to write the segmented volume to")
                .argstr("%s")
                .position(-1)
                .mandatory(),
        )
        .output(FieldSpec::new("out_file", FieldKind::File).desc("segmented volume"))
        .build()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    use neurowrap_spec::{Interface, PredictedPath};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_inputs_metadata() {
        let definition = definition(&EnvConfig::default()).unwrap();
        let inputs = definition.inputs();

        let in_file = inputs.lookup("in_file").unwrap().summary();
        assert_eq!(in_file.argstr.as_deref(), Some("%s"));
        assert!(in_file.mandatory);
        assert_eq!(in_file.position, Some(-2));

        let out_file = inputs.lookup("out_file").unwrap().summary();
        assert!(out_file.mandatory);
        assert_eq!(out_file.position, Some(-1));

        let subjects_dir = inputs.lookup("subjects_dir").unwrap().summary();
        assert_eq!(subjects_dir.argstr, None);
        assert!(!subjects_dir.mandatory);

        let outputs: Vec<&str> = definition.outputs().fields().iter().map(|f| f.name()).collect();
        assert_eq!(outputs, vec!["out_file"]);
    }

    #[test]
    fn test_command_line_and_output() {
        let config = EnvConfig::default().subjects_dir("/subjects");
        let mut segment = Interface::new(Arc::new(definition(&config).unwrap()), "/work");
        segment.set("in_file", "norm.mgz").unwrap();
        segment.set("out_file", "wm.seg.mgz").unwrap();
        segment.set("args", "-keep").unwrap();

        assert_eq!(
            segment.render().unwrap(),
            vec!["mri_segment", "-keep", "norm.mgz", "wm.seg.mgz"]
        );
        assert_eq!(
            segment.predicted_outputs().unwrap()["out_file"],
            PredictedPath::Single(PathBuf::from("/work/wm.seg.mgz"))
        );
        assert_eq!(
            segment.environment().unwrap(),
            BTreeMap::from([("SUBJECTS_DIR".to_string(), "/subjects".to_string())])
        );
    }
}
