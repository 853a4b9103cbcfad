//! Interfaces: a base command, its input and output registries, and one
//! input instance.
//!
//! # States
//!
//! ```text
//! Unconfigured ──set──▶ PartiallyConfigured ──set──▶ Ready ──render──▶ Rendered
//!                              ▲    │                  │  ▲              │
//!                              └────┘ set              │  └────set───────┘
//!                                                      └──render error──▶ Failed
//! ```
//!
//! - The state after any successful `set`/`unset` follows from the inputs:
//!   `Unconfigured` while nothing is set, `Ready` when every mandatory field
//!   is satisfied, `PartiallyConfigured` otherwise. An interface without
//!   mandatory fields still starts `Unconfigured`.
//! - `unset` reopens configuration: removing a mandatory value moves
//!   `Ready`/`Rendered` back to `PartiallyConfigured`, and removing the
//!   last value moves back to `Unconfigured`. Any later `set`/`unset` on a
//!   `Rendered` interface recomputes the state the same way.
//! - A rejected assignment leaves both inputs and state unchanged.
//! - `render` with mandatory fields missing reports them all and leaves the
//!   state unchanged.
//! - Any other render failure moves to `Failed`. `Failed` is terminal: every
//!   later operation returns `InterfaceFailed`.
//! - Output prediction, signatures and environment queries do not change
//!   the state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ErrorCode, SpecError};
use crate::field::{FieldSpec, FieldSummary};
use crate::hash::call_signature;
use crate::instance::SpecInstance;
use crate::predict::{OutputPathPredictor, PredictedPath};
use crate::registry::{RegistryBuilder, SpecRegistry};
use crate::render::CommandRenderer;
use crate::value::FieldValue;

/// Lifecycle of an [`Interface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceState {
    Unconfigured,
    PartiallyConfigured,
    Ready,
    Rendered,
    /// Terminal; carries the code of the error that caused it.
    Failed(ErrorCode),
}

impl InterfaceState {
    pub fn is_failed(&self) -> bool {
        matches!(self, InterfaceState::Failed(_))
    }
}

impl std::fmt::Display for InterfaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceState::Unconfigured => write!(f, "unconfigured"),
            InterfaceState::PartiallyConfigured => write!(f, "partially configured"),
            InterfaceState::Ready => write!(f, "ready"),
            InterfaceState::Rendered => write!(f, "rendered"),
            InterfaceState::Failed(code) => write!(f, "failed ({})", code),
        }
    }
}

/// The static description of a wrapped tool.
#[derive(Debug)]
pub struct InterfaceDefinition {
    name: String,
    command: String,
    inputs: Arc<SpecRegistry>,
    outputs: SpecRegistry,
    environment: Vec<(String, String)>,
}

impl InterfaceDefinition {
    pub fn builder(name: impl Into<String>, command: impl Into<String>) -> InterfaceDefinitionBuilder {
        let name = name.into();
        InterfaceDefinitionBuilder {
            inputs: SpecRegistry::builder(format!("{}.inputs", name)),
            outputs: SpecRegistry::builder(format!("{}.outputs", name)),
            name,
            command: command.into(),
            environment: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn inputs(&self) -> &SpecRegistry {
        &self.inputs
    }

    pub fn outputs(&self) -> &SpecRegistry {
        &self.outputs
    }

    /// `(variable, input field)` pairs exported to the tool's environment.
    pub fn environment_fields(&self) -> &[(String, String)] {
        &self.environment
    }

    /// Serializable schema of both registries.
    pub fn describe(&self) -> InterfaceSummary {
        InterfaceSummary {
            name: self.name.clone(),
            command: self.command.clone(),
            inputs: self.inputs.summary(),
            outputs: self.outputs.summary(),
            environment: self
                .environment
                .iter()
                .map(|(var, field)| (var.clone(), field.clone()))
                .collect(),
        }
    }
}

/// Builder for [`InterfaceDefinition`].
#[derive(Debug)]
pub struct InterfaceDefinitionBuilder {
    name: String,
    command: String,
    inputs: RegistryBuilder,
    outputs: RegistryBuilder,
    environment: Vec<(String, String)>,
}

impl InterfaceDefinitionBuilder {
    /// Applies `declare` to the input registry, e.g. to add fields shared by
    /// a family of tools.
    pub fn inputs_with(mut self, declare: impl FnOnce(RegistryBuilder) -> RegistryBuilder) -> Self {
        self.inputs = declare(self.inputs);
        self
    }

    pub fn input(mut self, field: FieldSpec) -> Self {
        self.inputs = self.inputs.register(field);
        self
    }

    pub fn output(mut self, field: FieldSpec) -> Self {
        self.outputs = self.outputs.register(field);
        self
    }

    /// Exports the resolved value of `field` as environment variable `var`.
    pub fn env_var(mut self, var: impl Into<String>, field: impl Into<String>) -> Self {
        self.environment.push((var.into(), field.into()));
        self
    }

    pub fn build(self) -> Result<InterfaceDefinition, SpecError> {
        let inputs = self.inputs.build()?;
        let outputs = self.outputs.build_outputs(&inputs)?;
        for (var, field) in &self.environment {
            if !inputs.contains(field) {
                return Err(SpecError::invalid_registry(
                    inputs.name(),
                    format!("environment variable {} reads unknown field '{}'", var, field),
                ));
            }
        }
        Ok(InterfaceDefinition {
            name: self.name,
            command: self.command,
            inputs: Arc::new(inputs),
            outputs,
            environment: self.environment,
        })
    }
}

/// Serializable schema of an interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceSummary {
    pub name: String,
    pub command: String,
    pub inputs: Vec<FieldSummary>,
    pub outputs: Vec<FieldSummary>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

/// A configurable call of one wrapped tool.
#[derive(Debug, Clone)]
pub struct Interface {
    definition: Arc<InterfaceDefinition>,
    inputs: SpecInstance,
    state: InterfaceState,
}

impl Interface {
    pub fn new(definition: Arc<InterfaceDefinition>, working_dir: impl Into<PathBuf>) -> Self {
        let inputs = SpecInstance::new(Arc::clone(&definition.inputs), working_dir);
        Self {
            definition,
            inputs,
            state: InterfaceState::Unconfigured,
        }
    }

    pub fn definition(&self) -> &InterfaceDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn command(&self) -> &str {
        self.definition.command()
    }

    pub fn inputs(&self) -> &SpecInstance {
        &self.inputs
    }

    pub fn state(&self) -> InterfaceState {
        self.state
    }

    pub fn working_dir(&self) -> &Path {
        self.inputs.working_dir()
    }

    fn ensure_usable(&self) -> Result<(), SpecError> {
        match self.state {
            InterfaceState::Failed(cause) => Err(SpecError::InterfaceFailed {
                interface: self.name().to_string(),
                cause,
            }),
            _ => Ok(()),
        }
    }

    fn refresh_state(&mut self) {
        self.state = if self.inputs.is_empty() {
            InterfaceState::Unconfigured
        } else if self.inputs.validate_complete().is_ok() {
            InterfaceState::Ready
        } else {
            InterfaceState::PartiallyConfigured
        };
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), SpecError> {
        self.ensure_usable()?;
        self.inputs.set(name, value)?;
        self.refresh_state();
        Ok(())
    }

    /// Sets a field from command-line text.
    pub fn set_str(&mut self, name: &str, input: &str) -> Result<(), SpecError> {
        self.ensure_usable()?;
        self.inputs.set_str(name, input)?;
        self.refresh_state();
        Ok(())
    }

    /// Sets a field from a JSON value.
    pub fn set_json(&mut self, name: &str, value: &serde_json::Value) -> Result<(), SpecError> {
        self.ensure_usable()?;
        self.inputs.set_json(name, value)?;
        self.refresh_state();
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> Result<Option<FieldValue>, SpecError> {
        self.ensure_usable()?;
        let removed = self.inputs.unset(name)?;
        self.refresh_state();
        Ok(removed)
    }

    /// The input's value or its resolved default.
    pub fn get(&self, name: &str) -> Result<Option<FieldValue>, SpecError> {
        self.ensure_usable()?;
        self.inputs.get(name)
    }

    /// Renders the command line tokens; the first token is the command.
    pub fn render(&mut self) -> Result<Vec<String>, SpecError> {
        self.ensure_usable()?;
        self.inputs.validate_complete()?;
        match CommandRenderer::new(self.definition.command()).render(&self.inputs) {
            Ok(tokens) => {
                self.state = InterfaceState::Rendered;
                Ok(tokens)
            }
            Err(err) => {
                tracing::debug!(interface = %self.name(), error = %err, "render failed");
                self.state = InterfaceState::Failed(err.code());
                Err(err)
            }
        }
    }

    /// The rendered tokens joined with single spaces.
    pub fn cmdline(&mut self) -> Result<String, SpecError> {
        Ok(self.render()?.join(" "))
    }

    /// Predicted output paths in the interface's working directory.
    pub fn predicted_outputs(&self) -> Result<BTreeMap<String, PredictedPath>, SpecError> {
        self.predicted_outputs_in(self.working_dir())
    }

    /// Predicted output paths for a run in `working_dir`.
    pub fn predicted_outputs_in(
        &self,
        working_dir: &Path,
    ) -> Result<BTreeMap<String, PredictedPath>, SpecError> {
        self.ensure_usable()?;
        OutputPathPredictor::new(self.definition.outputs()).predict(&self.inputs, working_dir)
    }

    /// Order-independent signature over the hashed inputs.
    pub fn signature(&self) -> Result<String, SpecError> {
        self.ensure_usable()?;
        Ok(call_signature(self.command(), &self.inputs))
    }

    /// Environment variables the tool needs, from resolved inputs.
    pub fn environment(&self) -> Result<BTreeMap<String, String>, SpecError> {
        self.ensure_usable()?;
        let mut env = BTreeMap::new();
        for (var, field) in self.definition.environment_fields() {
            if let Some(value) = self.inputs.get(field)? {
                env.insert(var.clone(), value.to_string());
            }
        }
        Ok(env)
    }

    pub fn describe(&self) -> InterfaceSummary {
        self.definition.describe()
    }
}

impl PartialEq for Interface {
    /// Same command and identical input values.
    fn eq(&self, other: &Self) -> bool {
        self.command() == other.command() && self.inputs == other.inputs
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::FieldKind;

    fn segment() -> Arc<InterfaceDefinition> {
        Arc::new(
            InterfaceDefinition::builder("SegmentWM", "mri_segment")
                .input(
                    FieldSpec::new("in_file", FieldKind::File)
                        .argstr("%s")
                        .position(-2)
                        .mandatory(),
                )
                .input(
                    FieldSpec::new("out_file", FieldKind::File)
                        .argstr("%s")
                        .position(-1)
                        .mandatory(),
                )
                .input(FieldSpec::new("subjects_dir", FieldKind::Directory))
                .input(
                    FieldSpec::new("reference", FieldKind::File)
                        .argstr("--ref %s")
                        .computed("{in_file:stem}.ref"),
                )
                .input(FieldSpec::new("use_ref", FieldKind::Boolean).requires(["subjects_dir"]))
                .output(FieldSpec::new("out_file", FieldKind::File))
                .env_var("SUBJECTS_DIR", "subjects_dir")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_state_follows_assignments() {
        let mut iface = Interface::new(segment(), "/work");
        assert_eq!(iface.state(), InterfaceState::Unconfigured);

        iface.set("in_file", "a.nii").unwrap();
        assert_eq!(iface.state(), InterfaceState::PartiallyConfigured);
        iface.set("subjects_dir", "/subjects").unwrap();
        assert_eq!(iface.state(), InterfaceState::PartiallyConfigured);

        iface.set("out_file", "b.mgz").unwrap();
        assert_eq!(iface.state(), InterfaceState::Ready);

        iface.render().unwrap();
        assert_eq!(iface.state(), InterfaceState::Rendered);

        iface.unset("out_file").unwrap();
        assert_eq!(iface.state(), InterfaceState::PartiallyConfigured);
    }

    #[test]
    fn test_starts_unconfigured_without_mandatory_fields() {
        let definition = Arc::new(
            InterfaceDefinition::builder("Info", "mri_info")
                .input(FieldSpec::new("in_file", FieldKind::File).argstr("%s"))
                .build()
                .unwrap(),
        );
        let mut iface = Interface::new(definition, "/work");
        assert_eq!(iface.state(), InterfaceState::Unconfigured);
        assert_eq!(iface.cmdline().unwrap(), "mri_info");
        assert_eq!(iface.state(), InterfaceState::Rendered);

        iface.set("in_file", "a.mgz").unwrap();
        assert_eq!(iface.state(), InterfaceState::Ready);
        iface.unset("in_file").unwrap();
        assert_eq!(iface.state(), InterfaceState::Unconfigured);
    }

    #[test]
    fn test_unset_reopens_configuration() {
        let mut iface = Interface::new(segment(), "/work");
        iface.set("in_file", "a.nii").unwrap();
        iface.set("out_file", "b.mgz").unwrap();
        iface.render().unwrap();

        iface.unset("subjects_dir").unwrap();
        assert_eq!(iface.state(), InterfaceState::Ready);

        iface.unset("in_file").unwrap();
        assert_eq!(iface.state(), InterfaceState::PartiallyConfigured);
        let err = iface.render().unwrap_err();
        assert_eq!(
            err,
            SpecError::MissingMandatoryFields {
                fields: vec!["in_file".to_string()]
            }
        );

        iface.set("in_file", "c.nii").unwrap();
        assert_eq!(iface.state(), InterfaceState::Ready);
        assert_eq!(iface.cmdline().unwrap(), "mri_segment --ref /work/c.ref c.nii b.mgz");

        iface.unset("in_file").unwrap();
        iface.unset("out_file").unwrap();
        assert_eq!(iface.state(), InterfaceState::Unconfigured);
    }

    #[test]
    fn test_rejected_assignment_keeps_state() {
        let mut iface = Interface::new(segment(), "/work");
        assert!(iface.set("in_file", 3).is_err());
        assert_eq!(iface.state(), InterfaceState::Unconfigured);
    }

    #[test]
    fn test_render_before_ready_keeps_state() {
        let mut iface = Interface::new(segment(), "/work");
        iface.set("in_file", "a.nii").unwrap();
        let err = iface.render().unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingMandatoryFields);
        assert_eq!(iface.state(), InterfaceState::PartiallyConfigured);
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut iface = Interface::new(segment(), "/work");
        iface.set("in_file", "a.nii").unwrap();
        iface.set("out_file", "b.mgz").unwrap();
        iface.set("use_ref", true).unwrap();

        let err = iface.render().unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnmetRequirements);
        assert_eq!(iface.state(), InterfaceState::Failed(ErrorCode::UnmetRequirements));

        let err = iface.set("subjects_dir", "/subjects").unwrap_err();
        assert_eq!(
            err,
            SpecError::InterfaceFailed {
                interface: "SegmentWM".to_string(),
                cause: ErrorCode::UnmetRequirements,
            }
        );
        assert_eq!(iface.render().unwrap_err().code(), ErrorCode::InterfaceFailed);
        assert!(iface.signature().is_err());
    }

    #[test]
    fn test_render_and_predict() {
        let mut iface = Interface::new(segment(), "/work");
        iface.set("out_file", "b.mgz").unwrap();
        iface.set("in_file", "a.nii").unwrap();
        assert_eq!(
            iface.cmdline().unwrap(),
            "mri_segment --ref /work/a.ref a.nii b.mgz"
        );

        let outputs = iface.predicted_outputs().unwrap();
        assert_eq!(
            outputs["out_file"],
            PredictedPath::Single(PathBuf::from("/work/b.mgz"))
        );
    }

    #[test]
    fn test_environment() {
        let mut iface = Interface::new(segment(), "/work");
        assert!(iface.environment().unwrap().is_empty());
        iface.set("subjects_dir", "/subjects").unwrap();
        assert_eq!(iface.environment().unwrap()["SUBJECTS_DIR"], "/subjects");
    }

    #[test]
    fn test_equality() {
        let mut a = Interface::new(segment(), "/work");
        a.set("in_file", "a.nii").unwrap();
        let mut b = Interface::new(segment(), "/elsewhere");
        b.set("in_file", "a.nii").unwrap();
        assert_eq!(a, b);
        b.set("in_file", "b.nii").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_environment_field_must_exist() {
        let err = InterfaceDefinition::builder("Broken", "tool")
            .env_var("SUBJECTS_DIR", "subjects_dir")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRegistry);
    }

    #[test]
    fn test_describe() {
        let summary = segment().describe();
        assert_eq!(summary.command, "mri_segment");
        assert_eq!(summary.inputs.len(), 5);
        assert_eq!(summary.inputs[0].position, Some(-2));
        assert_eq!(summary.environment["SUBJECTS_DIR"], "subjects_dir");
    }
}
