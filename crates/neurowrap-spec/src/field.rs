//! Field specifications.
//!
//! A [`FieldSpec`] is built with chained setters and becomes immutable once
//! it is registered:
//!
//! ```
//! use neurowrap_spec::{FieldKind, FieldSpec};
//!
//! let hemi = FieldSpec::new("hemi", FieldKind::Enum)
//!     .desc("target hemisphere")
//!     .choices(["lh", "rh"])
//!     .argstr("--hemi %s")
//!     .mandatory();
//! assert!(hemi.is_mandatory());
//! assert_eq!(hemi.get_position(), None);
//! ```

use std::fmt;

use serde::Serialize;

use crate::argstr::ArgTemplate;
use crate::error::SpecError;
use crate::instance::Resolver;
use crate::naming::NameTemplate;
use crate::value::{Constraint, FieldKind, FieldValue};

/// Computes a default value from other fields. `None` means the value is
/// not produced (e.g. an optional output that was not requested).
pub type DeriveFn = fn(&Resolver<'_>) -> Result<Option<FieldValue>, SpecError>;

/// Renders a field value when one flag folds several fields together.
pub type FormatFn = fn(&FieldValue, &Resolver<'_>) -> Result<Option<String>, SpecError>;

/// A computed default rule.
#[derive(Clone)]
pub enum Derivation {
    /// File name built from a name template.
    Template(NameTemplate),
    /// Named derivation function.
    Function { name: &'static str, func: DeriveFn },
}

impl Derivation {
    pub(crate) fn evaluate(&self, resolver: &Resolver<'_>) -> Result<Option<FieldValue>, SpecError> {
        match self {
            Derivation::Template(template) => template
                .evaluate(resolver)
                .map(|path| Some(FieldValue::Path(path))),
            Derivation::Function { func, .. } => func(resolver),
        }
    }

    /// Short description used by `describe`.
    pub fn label(&self) -> String {
        match self {
            Derivation::Template(template) => template.to_string(),
            Derivation::Function { name, .. } => format!("<{}>", name),
        }
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Derivation::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Derivation::Function { name, .. } => f.debug_tuple("Function").field(name).finish(),
        }
    }
}

/// How a field obtains a value when it is not set.
#[derive(Debug, Clone, Default)]
pub enum DefaultPolicy {
    #[default]
    None,
    /// Used whenever the field is unset; renders and hashes.
    Static(FieldValue),
    /// Derived lazily from other fields; never hashed.
    Computed(Derivation),
}

/// How a field turns into a command-line token.
#[derive(Clone, Default)]
pub enum ArgRule {
    /// Never rendered.
    #[default]
    None,
    Template(ArgTemplate),
    Formatter { name: &'static str, func: FormatFn },
}

impl ArgRule {
    /// Human-readable form used by `describe`.
    pub fn label(&self) -> Option<String> {
        match self {
            ArgRule::None => None,
            ArgRule::Template(template) => Some(template.to_string()),
            ArgRule::Formatter { name, .. } => Some(format!("<{}>", name)),
        }
    }
}

impl fmt::Debug for ArgRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgRule::None => write!(f, "None"),
            ArgRule::Template(template) => f.debug_tuple("Template").field(template).finish(),
            ArgRule::Formatter { name, .. } => f.debug_tuple("Formatter").field(name).finish(),
        }
    }
}

/// One named, typed input or output slot.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    desc: Option<String>,
    mandatory: bool,
    position: Option<i32>,
    arg: ArgRule,
    sep: Option<String>,
    constraint: Option<Constraint>,
    excludes: Vec<String>,
    requires: Vec<String>,
    use_in_hash: bool,
    default: DefaultPolicy,
}

impl FieldSpec {
    /// Creates an optional, hashed field with no argument rule.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            desc: None,
            mandatory: false,
            position: None,
            arg: ArgRule::None,
            sep: None,
            constraint: None,
            excludes: Vec::new(),
            requires: Vec::new(),
            use_in_hash: true,
            default: DefaultPolicy::None,
        }
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Places the field in the positional token sequence. Negative values
    /// count from the end.
    pub fn position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn argstr(mut self, template: impl Into<String>) -> Self {
        self.arg = ArgRule::Template(ArgTemplate::new(template));
        self
    }

    /// Separator between list elements (default: one space).
    pub fn sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = Some(sep.into());
        self
    }

    pub fn formatter(mut self, name: &'static str, func: FormatFn) -> Self {
        self.arg = ArgRule::Formatter { name, func };
        self
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.constraint = Some(Constraint::Choices(
            choices.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.constraint = Some(Constraint::Range { min, max });
        self
    }

    pub fn excludes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if name != self.name && !self.excludes.contains(&name) {
                self.excludes.push(name);
            }
        }
        self
    }

    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.requires.contains(&name) {
                self.requires.push(name);
            }
        }
        self
    }

    /// Leaves the field out of the call signature.
    pub fn nohash(mut self) -> Self {
        self.use_in_hash = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = DefaultPolicy::Static(value.into());
        self
    }

    /// Computed default from a name template such as `{in_file:stem}_smooth.nii`.
    pub fn computed(mut self, template: impl Into<String>) -> Self {
        self.default = DefaultPolicy::Computed(Derivation::Template(NameTemplate::new(template)));
        self
    }

    /// Computed default from a derivation function.
    pub fn derived(mut self, name: &'static str, func: DeriveFn) -> Self {
        self.default = DefaultPolicy::Computed(Derivation::Function { name, func });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn get_position(&self) -> Option<i32> {
        self.position
    }

    pub fn arg_rule(&self) -> &ArgRule {
        &self.arg
    }

    pub fn separator(&self) -> &str {
        self.sep.as_deref().unwrap_or(" ")
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub fn excluded(&self) -> &[String] {
        &self.excludes
    }

    pub fn required(&self) -> &[String] {
        &self.requires
    }

    pub fn use_in_hash(&self) -> bool {
        self.use_in_hash
    }

    pub fn default_policy(&self) -> &DefaultPolicy {
        &self.default
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default, DefaultPolicy::None)
    }

    pub(crate) fn add_exclusion(&mut self, name: &str) {
        if name != self.name && !self.excludes.iter().any(|e| e == name) {
            self.excludes.push(name.to_string());
        }
    }

    /// Type check and constraint check for an assigned value. Returns the
    /// value in its canonical shape.
    pub fn check(&self, value: &FieldValue) -> Result<FieldValue, SpecError> {
        let coerced = self
            .kind
            .coerce(value)
            .ok_or_else(|| SpecError::TypeMismatch {
                field: self.name.clone(),
                expected: self.kind.to_string(),
                found: value.shape(),
            })?;

        if let Some(constraint) = &self.constraint {
            if !constraint.allows(&coerced) {
                return Err(SpecError::ValueOutOfRange {
                    field: self.name.clone(),
                    value: coerced.to_string(),
                    allowed: constraint.to_string(),
                });
            }
        }
        Ok(coerced)
    }

    /// Parses command-line text for this field, then checks it.
    pub fn parse(&self, input: &str) -> Result<FieldValue, SpecError> {
        let value = self
            .kind
            .parse_str(input)
            .map_err(|reason| SpecError::InvalidValue {
                field: self.name.clone(),
                input: input.to_string(),
                reason,
            })?;
        self.check(&value)
    }

    /// Renders the field's token for `value`, or `None` when it produces none.
    pub fn render(&self, value: &FieldValue, resolver: &Resolver<'_>) -> Result<Option<String>, SpecError> {
        match &self.arg {
            ArgRule::None => Ok(None),
            ArgRule::Template(template) => template.render(value, self.separator()),
            ArgRule::Formatter { func, .. } => func(value, resolver),
        }
    }

    /// Introspectable metadata for this field.
    pub fn summary(&self) -> FieldSummary {
        FieldSummary {
            name: self.name.clone(),
            kind: self.kind.to_string(),
            desc: self.desc.clone(),
            mandatory: self.mandatory,
            position: self.position,
            argstr: self.arg.label(),
            sep: self.sep.clone(),
            allowed: self.constraint.as_ref().map(|c| c.to_string()),
            xor: self.excludes.clone(),
            requires: self.requires.clone(),
            nohash: !self.use_in_hash,
            usedefault: matches!(self.default, DefaultPolicy::Static(_)),
            default: match &self.default {
                DefaultPolicy::Static(value) => Some(value.to_json()),
                _ => None,
            },
            genfile: match &self.default {
                DefaultPolicy::Computed(derivation) => Some(derivation.label()),
                _ => None,
            },
        }
    }
}

/// Serializable view of a [`FieldSpec`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub mandatory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argstr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub xor: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    pub nohash: bool,
    pub usedefault: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genfile: Option<String>,
}
