//! End-to-end tests of the command implementations, driven through
//! inputs files on disk the way the binary receives them.

use std::fs;
use std::path::{Path, PathBuf};

use neurowrap_cli::commands::{hash, outputs, render};
use neurowrap_cli::input::{CallRequest, InputError};
use neurowrap_interfaces::{EnvConfig, FslOutputType};
use neurowrap_spec::PredictedPath;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn write_inputs(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("inputs.json");
    fs::write(&path, json).unwrap();
    path
}

fn proj_thresh_request(inputs_file: PathBuf, assignments: &[&str]) -> CallRequest {
    CallRequest {
        interface: "projthresh".to_string(),
        assignments: assignments.iter().map(|a| a.to_string()).collect(),
        inputs_file: Some(inputs_file),
        cwd: Some(PathBuf::from("/work")),
    }
}

#[test]
fn render_from_inputs_file() {
    let dir = tempdir().unwrap();
    let inputs = write_inputs(
        dir.path(),
        r#"{"in_files": ["/data/seeds_to_a.nii.gz", "seeds_to_b.nii.gz"], "threshold": 2}"#,
    );

    let rendered = render::execute(&proj_thresh_request(inputs, &[]), &EnvConfig::default()).unwrap();
    assert_eq!(rendered.interface, "ProjThresh");
    assert_eq!(
        rendered.command_line,
        "proj_thresh /data/seeds_to_a.nii.gz seeds_to_b.nii.gz 2"
    );
    assert_eq!(rendered.environment["FSLOUTPUTTYPE"], "NIFTI_GZ");
}

#[test]
fn assignments_override_inputs_file() {
    let dir = tempdir().unwrap();
    let inputs = write_inputs(
        dir.path(),
        r#"{"in_files": ["seeds_to_a.nii.gz"], "threshold": 2}"#,
    );

    let request = proj_thresh_request(inputs, &["threshold=5"]);
    let config = EnvConfig::default().fsl_output_type(FslOutputType::Nifti);
    let rendered = render::execute(&request, &config).unwrap();
    assert_eq!(rendered.tokens, vec!["proj_thresh", "seeds_to_a.nii.gz", "5"]);
    assert_eq!(rendered.environment["FSLOUTPUTTYPE"], "NIFTI");

    let predicted = outputs::execute(&request, &config).unwrap();
    assert_eq!(
        predicted["out_files"],
        PredictedPath::Multiple(vec![PathBuf::from("/work/seeds_to_a_proj_seg_thr_5.nii")])
    );
}

#[test]
fn hash_matches_between_file_and_assignments() {
    let dir = tempdir().unwrap();
    let inputs = write_inputs(dir.path(), r#"{"in_file": "norm.mgz", "out_file": "wm.seg.mgz"}"#);
    let config = EnvConfig::default();

    let from_file = hash::execute(
        &CallRequest {
            interface: "SegmentWM".to_string(),
            inputs_file: Some(inputs),
            cwd: Some(PathBuf::from("/work")),
            ..Default::default()
        },
        &config,
    )
    .unwrap();
    let from_assignments = hash::execute(
        &CallRequest {
            interface: "SegmentWM".to_string(),
            assignments: vec![
                "out_file=wm.seg.mgz".to_string(),
                "in_file=norm.mgz".to_string(),
                "terminal_output=stream".to_string(),
            ],
            cwd: Some(PathBuf::from("/elsewhere")),
            ..Default::default()
        },
        &config,
    )
    .unwrap();
    assert_eq!(from_file.signature, from_assignments.signature);
}

#[test]
fn inputs_file_errors() {
    let dir = tempdir().unwrap();
    let config = EnvConfig::default();

    let missing = proj_thresh_request(dir.path().join("absent.json"), &[]);
    let err = render::execute(&missing, &config).unwrap_err();
    assert!(matches!(err, InputError::ReadInputs { .. }));
    assert_eq!(err.code(), "CLI_003");

    let array = write_inputs(dir.path(), "[1, 2]");
    let err = render::execute(&proj_thresh_request(array, &[]), &config).unwrap_err();
    assert!(matches!(err, InputError::NotAnObject { .. }));
    assert_eq!(err.code(), "CLI_004");

    let broken = write_inputs(dir.path(), "{\"threshold\": ");
    let err = render::execute(&proj_thresh_request(broken, &[]), &config).unwrap_err();
    assert!(matches!(err, InputError::ParseInputs { .. }));
}

#[test]
fn bad_values_report_engine_codes() {
    let dir = tempdir().unwrap();
    let inputs = write_inputs(dir.path(), r#"{"in_files": ["a.nii.gz"], "threshold": "high"}"#);
    let err = render::execute(&proj_thresh_request(inputs, &[]), &EnvConfig::default()).unwrap_err();
    assert!(matches!(err, InputError::Spec(_)));
    assert!(err.code().starts_with("NW"));
}
