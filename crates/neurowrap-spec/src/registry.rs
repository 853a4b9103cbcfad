//! Field registries.
//!
//! A registry is an ordered, immutable set of [`FieldSpec`]s. Declaration
//! order is significant: flagged arguments render in it.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::SpecError;
use crate::field::{ArgRule, DefaultPolicy, Derivation, FieldSpec, FieldSummary};
use crate::value::{Constraint, FieldKind};

/// Field names: lowercase identifier.
const FIELD_NAME_PATTERN: &str = r"^[a-z_][a-z0-9_]*$";

static FIELD_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn field_name_regex() -> &'static Regex {
    FIELD_NAME_REGEX.get_or_init(|| Regex::new(FIELD_NAME_PATTERN).expect("invalid regex pattern"))
}

/// Checks whether a string is a valid field name.
pub fn is_valid_field_name(name: &str) -> bool {
    field_name_regex().is_match(name)
}

/// Immutable mapping from field name to [`FieldSpec`], in declaration order.
#[derive(Debug, Clone)]
pub struct SpecRegistry {
    name: String,
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl SpecRegistry {
    pub fn builder(name: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Registry name, e.g. `SurfaceSmooth.inputs`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lookup(&self, name: &str) -> Result<&FieldSpec, SpecError> {
        self.get(name).ok_or_else(|| SpecError::UnknownField {
            registry: self.name.clone(),
            field: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Names of mandatory fields, in declaration order.
    pub fn mandatory_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_mandatory())
            .map(|f| f.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn summary(&self) -> Vec<FieldSummary> {
        self.fields.iter().map(FieldSpec::summary).collect()
    }
}

/// Collects field declarations and checks them on [`RegistryBuilder::build`].
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    name: String,
    fields: Vec<FieldSpec>,
}

impl RegistryBuilder {
    pub fn register(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Builds an input registry. Name templates may only reference fields of
    /// this registry.
    pub fn build(self) -> Result<SpecRegistry, SpecError> {
        self.finish(None)
    }

    /// Builds an output registry whose computed defaults read `inputs`.
    pub fn build_outputs(self, inputs: &SpecRegistry) -> Result<SpecRegistry, SpecError> {
        self.finish(Some(inputs))
    }

    fn finish(self, scope: Option<&SpecRegistry>) -> Result<SpecRegistry, SpecError> {
        let RegistryBuilder { name, mut fields } = self;
        let invalid = |reason: String| SpecError::invalid_registry(&name, reason);

        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if !is_valid_field_name(field.name()) {
                return Err(invalid(format!("invalid field name '{}'", field.name())));
            }
            if index.insert(field.name().to_string(), i).is_some() {
                return Err(invalid(format!("duplicate field '{}'", field.name())));
            }
        }

        let mut positions = HashSet::new();
        for field in &fields {
            if let Some(position) = field.get_position() {
                if !positions.insert(position) {
                    return Err(invalid(format!(
                        "position {} is used more than once (field '{}')",
                        position,
                        field.name()
                    )));
                }
            }
            for other in field.excluded().iter().chain(field.required()) {
                if !index.contains_key(other) {
                    return Err(invalid(format!(
                        "field '{}' references unknown field '{}'",
                        field.name(),
                        other
                    )));
                }
            }
            if field.required().iter().any(|r| r == field.name()) {
                return Err(invalid(format!("field '{}' requires itself", field.name())));
            }
            check_declaration(field).map_err(invalid)?;
            check_templates(field, scope.map_or(&index, |s| &s.index)).map_err(|err| match err {
                TemplateIssue::Syntax(err) => err,
                TemplateIssue::Reference(reason) => invalid(reason),
            })?;
        }

        // Exclusion is symmetric.
        let pairs: Vec<(usize, String)> = fields
            .iter()
            .flat_map(|f| {
                f.excluded()
                    .iter()
                    .map(|other| (index[other.as_str()], f.name().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (target, name) in pairs {
            fields[target].add_exclusion(&name);
        }

        tracing::debug!(registry = %name, fields = fields.len(), "built registry");
        Ok(SpecRegistry {
            name,
            fields,
            index,
        })
    }
}

fn check_declaration(field: &FieldSpec) -> Result<(), String> {
    if matches!(field.kind(), FieldKind::Enum)
        && !matches!(field.constraint(), Some(Constraint::Choices(_)))
    {
        return Err(format!("enum field '{}' declares no choices", field.name()));
    }
    if matches!(field.constraint(), Some(Constraint::Range { min, max }) if min > max) {
        return Err(format!("field '{}' has an empty range", field.name()));
    }
    if let DefaultPolicy::Static(value) = field.default_policy() {
        field
            .check(value)
            .map_err(|err| format!("bad default for '{}': {}", field.name(), err))?;
    }
    Ok(())
}

enum TemplateIssue {
    Syntax(SpecError),
    Reference(String),
}

fn check_templates(field: &FieldSpec, scope: &HashMap<String, usize>) -> Result<(), TemplateIssue> {
    if let ArgRule::Template(template) = field.arg_rule() {
        template.validate().map_err(TemplateIssue::Syntax)?;
    }
    if let DefaultPolicy::Computed(Derivation::Template(template)) = field.default_policy() {
        for name in template.fields().map_err(TemplateIssue::Syntax)? {
            if name == field.name() {
                return Err(TemplateIssue::Reference(format!(
                    "default of '{}' references itself",
                    field.name()
                )));
            }
            if !scope.contains_key(&name) {
                return Err(TemplateIssue::Reference(format!(
                    "default of '{}' references unknown field '{}'",
                    field.name(),
                    name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn segment_inputs() -> RegistryBuilder {
        SpecRegistry::builder("SegmentWM.inputs")
            .register(
                FieldSpec::new("in_file", FieldKind::File)
                    .argstr("%s")
                    .position(-2)
                    .mandatory(),
            )
            .register(
                FieldSpec::new("out_file", FieldKind::File)
                    .argstr("%s")
                    .position(-1)
                    .mandatory(),
            )
    }

    #[test]
    fn test_lookup_and_mandatory() {
        let registry = segment_inputs().build().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("in_file").unwrap().get_position(), Some(-2));
        assert_eq!(registry.mandatory_fields(), vec!["in_file", "out_file"]);

        let err = registry.lookup("nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownField);
        assert_eq!(err.to_string(), "unknown field 'nope' in SegmentWM.inputs");
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let err = segment_inputs()
            .register(FieldSpec::new("extra", FieldKind::String).argstr("%s").position(-1))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRegistry);
        assert!(err.to_string().contains("position -1"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = segment_inputs()
            .register(FieldSpec::new("in_file", FieldKind::File))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate field 'in_file'"));
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let err = SpecRegistry::builder("r")
            .register(FieldSpec::new("a", FieldKind::Boolean).excludes(["b"]))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown field 'b'"));

        let err = SpecRegistry::builder("r")
            .register(FieldSpec::new("out", FieldKind::File).computed("{missing}.nii"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown field 'missing'"));
    }

    #[test]
    fn test_malformed_template_rejected() {
        let err = SpecRegistry::builder("r")
            .register(FieldSpec::new("a", FieldKind::Float).argstr("--a %z"))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTemplate);
    }

    #[test]
    fn test_enum_without_choices_rejected() {
        let err = SpecRegistry::builder("r")
            .register(FieldSpec::new("hemi", FieldKind::Enum))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("declares no choices"));
    }

    #[test]
    fn test_bad_static_default_rejected() {
        let err = SpecRegistry::builder("r")
            .register(
                FieldSpec::new("hemi", FieldKind::Enum)
                    .choices(["lh", "rh"])
                    .default_value("both"),
            )
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("bad default for 'hemi'"));
    }

    #[test]
    fn test_excludes_made_symmetric() {
        let registry = SpecRegistry::builder("SurfaceSmooth.inputs")
            .register(FieldSpec::new("fwhm", FieldKind::Float).excludes(["smooth_iters"]))
            .register(FieldSpec::new("smooth_iters", FieldKind::Integer))
            .build()
            .unwrap();
        assert_eq!(registry.lookup("smooth_iters").unwrap().excluded(), ["fwhm"]);
    }

    #[test]
    fn test_outputs_resolve_against_inputs() {
        let inputs = segment_inputs().build().unwrap();
        let outputs = SpecRegistry::builder("SegmentWM.outputs")
            .register(FieldSpec::new("mask", FieldKind::File).computed("{in_file:stem}_mask.nii"))
            .build_outputs(&inputs)
            .unwrap();
        assert!(outputs.contains("mask"));

        let err = SpecRegistry::builder("SegmentWM.outputs")
            .register(FieldSpec::new("mask", FieldKind::File).computed("{hemi}.mask"))
            .build_outputs(&inputs)
            .unwrap_err();
        assert!(err.to_string().contains("unknown field 'hemi'"));
    }

    #[test]
    fn test_field_names() {
        assert!(is_valid_field_name("in_file"));
        assert!(is_valid_field_name("mni152reg"));
        assert!(!is_valid_field_name("InFile"));
        assert!(!is_valid_field_name("9lives"));
    }
}
