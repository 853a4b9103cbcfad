//! Output path prediction.
//!
//! An output field with its own default rule is predicted from that rule,
//! evaluated against the inputs. An output without one mirrors the
//! same-named input field (explicit value, static or computed default).
//!
//! Outputs with no value, or whose rule reports "not produced", are
//! omitted. Nothing touches the filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SpecError;
use crate::field::{DefaultPolicy, FieldSpec};
use crate::instance::{Resolver, SpecInstance};
use crate::registry::SpecRegistry;
use crate::value::FieldValue;

/// A predicted output: one path or a list of paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PredictedPath {
    Single(PathBuf),
    Multiple(Vec<PathBuf>),
}

impl PredictedPath {
    /// All paths, in order.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            PredictedPath::Single(path) => vec![path.as_path()],
            PredictedPath::Multiple(paths) => paths.iter().map(PathBuf::as_path).collect(),
        }
    }

    fn from_value(output: &str, value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<Self>, SpecError> {
        let as_path = |v: &FieldValue| {
            v.as_path()
                .map(|p| resolver.in_working_dir(p))
                .ok_or_else(|| SpecError::TypeMismatch {
                    field: output.to_string(),
                    expected: "path".to_string(),
                    found: v.shape(),
                })
        };
        match value {
            FieldValue::Bool(false) => Ok(None),
            FieldValue::List(items) => items
                .iter()
                .map(as_path)
                .collect::<Result<Vec<_>, _>>()
                .map(|paths| Some(PredictedPath::Multiple(paths))),
            other => as_path(other).map(|path| Some(PredictedPath::Single(path))),
        }
    }
}

impl std::fmt::Display for PredictedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paths: Vec<String> = self.paths().iter().map(|p| p.display().to_string()).collect();
        write!(f, "{}", paths.join(" "))
    }
}

/// Predicts output paths for one output registry.
#[derive(Debug, Clone, Copy)]
pub struct OutputPathPredictor<'a> {
    outputs: &'a SpecRegistry,
}

impl<'a> OutputPathPredictor<'a> {
    pub fn new(outputs: &'a SpecRegistry) -> Self {
        Self { outputs }
    }

    /// Maps each produced output to its predicted path(s).
    ///
    /// A computed output whose source input is unset fails with
    /// `UnresolvableOutput`. Calling this twice on an unmodified instance
    /// gives identical results.
    pub fn predict(
        &self,
        instance: &SpecInstance,
        working_dir: &Path,
    ) -> Result<BTreeMap<String, PredictedPath>, SpecError> {
        let resolver = instance.resolver_in(working_dir);
        let mut predicted = BTreeMap::new();

        for output in self.outputs.fields() {
            let value = self
                .resolve(output, instance, &resolver)
                .map_err(|err| unresolvable(output.name(), err))?;
            let Some(value) = value else {
                continue;
            };
            if let Some(path) = PredictedPath::from_value(output.name(), &value, &resolver)? {
                predicted.insert(output.name().to_string(), path);
            }
        }

        tracing::debug!(
            registry = %self.outputs.name(),
            outputs = predicted.len(),
            "predicted outputs"
        );
        Ok(predicted)
    }

    fn resolve(
        &self,
        output: &FieldSpec,
        instance: &SpecInstance,
        resolver: &Resolver<'_>,
    ) -> Result<Option<FieldValue>, SpecError> {
        match output.default_policy() {
            DefaultPolicy::Computed(derivation) => resolver.evaluate(output.name(), derivation),
            DefaultPolicy::Static(value) => Ok(Some(value.clone())),
            DefaultPolicy::None if instance.registry().contains(output.name()) => {
                resolver.get(output.name())
            }
            DefaultPolicy::None => Ok(None),
        }
    }
}

fn unresolvable(output: &str, err: SpecError) -> SpecError {
    match err {
        SpecError::UnresolvedDefault { dependency, .. } => SpecError::UnresolvableOutput {
            output: output.to_string(),
            source_field: dependency,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorCode;
    use crate::value::FieldKind;

    fn registries() -> (Arc<SpecRegistry>, SpecRegistry) {
        let inputs = SpecRegistry::builder("Smooth.inputs")
            .register(FieldSpec::new("in_file", FieldKind::File).argstr("%s").mandatory())
            .register(
                FieldSpec::new("out_file", FieldKind::File)
                    .argstr("--o %s")
                    .computed("{in_file:stem}_smooth.nii"),
            )
            .register(FieldSpec::new("keep_log", FieldKind::Boolean))
            .build()
            .unwrap();
        let outputs = SpecRegistry::builder("Smooth.outputs")
            .register(FieldSpec::new("out_file", FieldKind::File))
            .register(FieldSpec::new("log_file", FieldKind::File).derived("log_file", log_file))
            .register(FieldSpec::new("report", FieldKind::File))
            .build_outputs(&inputs)
            .unwrap();
        (Arc::new(inputs), outputs)
    }

    fn log_file(resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
        if resolver.get("keep_log")?.and_then(|v| v.as_bool()) != Some(true) {
            return Ok(None);
        }
        let in_file = resolver.require("in_file")?;
        let (_, stem, _) = crate::naming::split_filename(in_file.as_path().unwrap_or(Path::new("")));
        Ok(Some(FieldValue::Path(PathBuf::from(format!("{}.log", stem)))))
    }

    #[test]
    fn test_computed_output() {
        let (inputs, outputs) = registries();
        let mut inst = SpecInstance::new(inputs, "/elsewhere");
        inst.set("in_file", "/d/lh.a.nii").unwrap();

        let predicted = OutputPathPredictor::new(&outputs)
            .predict(&inst, Path::new("/d"))
            .unwrap();
        assert_eq!(
            predicted.get("out_file"),
            Some(&PredictedPath::Single(PathBuf::from("/d/lh.a_smooth.nii")))
        );
        assert!(!predicted.contains_key("log_file"));
        assert!(!predicted.contains_key("report"));
    }

    #[test]
    fn test_output_rule_reads_inputs() {
        let (inputs, outputs) = registries();
        let mut inst = SpecInstance::new(inputs, "/d");
        inst.set("in_file", "lh.a.nii").unwrap();
        inst.set("keep_log", true).unwrap();
        let predicted = OutputPathPredictor::new(&outputs)
            .predict(&inst, Path::new("/d"))
            .unwrap();
        assert_eq!(
            predicted["log_file"],
            PredictedPath::Single(PathBuf::from("/d/lh.a.log"))
        );
    }

    #[test]
    fn test_explicit_output_resolved_against_working_dir() {
        let (inputs, outputs) = registries();
        let mut inst = SpecInstance::new(inputs, "/d");
        inst.set("in_file", "a.nii").unwrap();
        inst.set("out_file", "b.mgz").unwrap();
        let predicted = OutputPathPredictor::new(&outputs)
            .predict(&inst, Path::new("/d"))
            .unwrap();
        assert_eq!(predicted["out_file"], PredictedPath::Single(PathBuf::from("/d/b.mgz")));

        inst.set("out_file", "/abs/b.mgz").unwrap();
        let predicted = OutputPathPredictor::new(&outputs)
            .predict(&inst, Path::new("/d"))
            .unwrap();
        assert_eq!(predicted["out_file"], PredictedPath::Single(PathBuf::from("/abs/b.mgz")));
    }

    #[test]
    fn test_missing_source_is_unresolvable() {
        let (inputs, outputs) = registries();
        let inst = SpecInstance::new(inputs, "/d");
        let err = OutputPathPredictor::new(&outputs)
            .predict(&inst, Path::new("/d"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnresolvableOutput);
        assert_eq!(
            err,
            SpecError::UnresolvableOutput {
                output: "out_file".to_string(),
                source_field: "in_file".to_string(),
            }
        );
    }

    #[test]
    fn test_prediction_is_idempotent() {
        let (inputs, outputs) = registries();
        let mut inst = SpecInstance::new(inputs, "/d");
        inst.set("in_file", "/d/lh.a.nii").unwrap();
        let predictor = OutputPathPredictor::new(&outputs);
        let first = predictor.predict(&inst, Path::new("/d")).unwrap();
        let second = predictor.predict(&inst, Path::new("/d")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_predicted_path_display() {
        let multiple = PredictedPath::Multiple(vec![PathBuf::from("/a.nii"), PathBuf::from("/b.nii")]);
        assert_eq!(multiple.to_string(), "/a.nii /b.nii");
        assert_eq!(multiple.paths().len(), 2);
    }
}
