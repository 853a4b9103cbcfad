//! Field values bound to a registry.
//!
//! [`SpecInstance`] stores explicitly assigned values. Reads go through a
//! [`Resolver`], which falls back to static defaults and evaluates computed
//! defaults on demand. Computed results are memoized per instance until the
//! next assignment.


use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{SpecError, UnmetRequirement};
use crate::field::{DefaultPolicy, Derivation, FieldSpec};
use crate::registry::SpecRegistry;
use crate::value::FieldValue;

/// A mutable bag of field values validated against one registry.
#[derive(Debug, Clone)]
pub struct SpecInstance {
    registry: Arc<SpecRegistry>,
    values: HashMap<String, FieldValue>,
    working_dir: PathBuf,
    memo: RefCell<HashMap<String, Option<FieldValue>>>,
}

impl SpecInstance {
    /// Creates an empty instance. Computed defaults place relative file
    /// names in `working_dir`.
    pub fn new(registry: Arc<SpecRegistry>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            values: HashMap::new(),
            working_dir: working_dir.into(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &SpecRegistry {
        &self.registry
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn set_working_dir(&mut self, working_dir: impl Into<PathBuf>) {
        self.working_dir = working_dir.into();
        self.memo.get_mut().clear();
    }

    /// Validates and stores a value.
    ///
    /// Checks run in order: kind, allowed values, exclusivity against fields
    /// that are already set. Co-requirements are checked at render time.
    /// A rejected value leaves the instance unchanged.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), SpecError> {
        let field = self.registry.lookup(name)?;
        let value = field.check(&value.into())?;
        let name = field.name().to_string();
        self.store(name, value)
    }

    /// Parses command-line text for the field and stores it.
    pub fn set_str(&mut self, name: &str, input: &str) -> Result<(), SpecError> {
        let value = self.registry.lookup(name)?.parse(input)?;
        self.set(name, value)
    }

    /// Stores a JSON value (as read from an inputs file).
    pub fn set_json(&mut self, name: &str, json: &serde_json::Value) -> Result<(), SpecError> {
        self.registry.lookup(name)?;
        let value = FieldValue::from_json(json).map_err(|reason| SpecError::InvalidValue {
            field: name.to_string(),
            input: json.to_string(),
            reason,
        })?;
        self.set(name, value)
    }

    fn store(&mut self, name: String, value: FieldValue) -> Result<(), SpecError> {
        let field = self.registry.lookup(&name)?;
        let conflicts: Vec<String> = field
            .excluded()
            .iter()
            .filter(|other| self.values.contains_key(other.as_str()))
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            return Err(SpecError::ConflictingFields {
                field: name,
                conflicts,
            });
        }

        tracing::debug!(registry = %self.registry.name(), field = %name, value = %value, "set field");
        self.values.insert(name, value);
        self.memo.get_mut().clear();
        Ok(())
    }

    /// Removes an explicit value, returning it.
    pub fn unset(&mut self, name: &str) -> Result<Option<FieldValue>, SpecError> {
        self.registry.lookup(name)?;
        let removed = self.values.remove(name);
        if removed.is_some() {
            self.memo.get_mut().clear();
        }
        Ok(removed)
    }

    /// True when the field was explicitly assigned.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True when no field was explicitly assigned.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The explicitly assigned value, ignoring defaults.
    pub fn explicit(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Explicit values in declaration order.
    pub fn explicit_values(&self) -> Vec<(&str, &FieldValue)> {
        self.registry
            .fields()
            .iter()
            .filter_map(|f| self.values.get(f.name()).map(|v| (f.name(), v)))
            .collect()
    }

    /// Returns the stored value or the resolved default.
    ///
    /// `Ok(None)` means the field has no value: it is unset without a
    /// default, or its computed default is not produced.
    pub fn get(&self, name: &str) -> Result<Option<FieldValue>, SpecError> {
        self.resolver().get(name)
    }

    /// A resolver over this instance's working directory.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self, self.working_dir.clone(), true)
    }

    /// A resolver placing computed names in `working_dir`. Memoized results
    /// are shared only when it matches the instance's directory.
    pub fn resolver_in(&self, working_dir: &Path) -> Resolver<'_> {
        let memoize = working_dir == self.working_dir;
        Resolver::new(self, working_dir.to_path_buf(), memoize)
    }

    fn satisfies(&self, field: &FieldSpec) -> bool {
        self.is_set(field.name())
            || field.has_default()
            || field.excluded().iter().any(|other| self.is_set(other))
    }

    /// Fails with every unset mandatory field.
    ///
    /// A mandatory field counts as set when it has a default, or when one
    /// of the fields it excludes is set (one member of a mandatory
    /// exclusive group is enough).
    pub fn validate_complete(&self) -> Result<(), SpecError> {
        let missing: Vec<String> = self
            .registry
            .fields()
            .iter()
            .filter(|f| f.is_mandatory() && !self.satisfies(f))
            .map(|f| f.name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SpecError::MissingMandatoryFields { fields: missing })
        }
    }

    /// Fails with every `(field, required)` pair where `field` is set and
    /// `required` is not.
    pub fn validate_requirements(&self) -> Result<(), SpecError> {
        let unmet: Vec<UnmetRequirement> = self
            .registry
            .fields()
            .iter()
            .filter(|f| self.is_set(f.name()))
            .flat_map(|f| {
                f.required()
                    .iter()
                    .filter(|r| !self.is_set(r) && !self.has_static_default(r))
                    .map(|r| UnmetRequirement {
                        field: f.name().to_string(),
                        required: r.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        if unmet.is_empty() {
            Ok(())
        } else {
            Err(SpecError::UnmetRequirements { unmet })
        }
    }

    fn has_static_default(&self, name: &str) -> bool {
        self.registry
            .get(name)
            .and_then(|f| self.static_default(f))
            .is_some()
    }

    /// The field's static default, withheld while a field it excludes is set.
    fn static_default<'f>(&self, field: &'f FieldSpec) -> Option<&'f FieldValue> {
        match field.default_policy() {
            DefaultPolicy::Static(value)
                if !field.excluded().iter().any(|other| self.is_set(other)) =>
            {
                Some(value)
            }
            _ => None,
        }
    }

    /// Values that feed the call signature: every `use_in_hash` field that
    /// is set or has an applicable static default. Computed defaults are
    /// excluded.
    pub fn hashed_values(&self) -> BTreeMap<String, FieldValue> {
        self.registry
            .fields()
            .iter()
            .filter(|f| f.use_in_hash())
            .filter_map(|f| {
                let value = match self.values.get(f.name()) {
                    Some(value) => value.clone(),
                    None => self.static_default(f)?.clone(),
                };
                Some((f.name().to_string(), value))
            })
            .collect()
    }
}

impl PartialEq for SpecInstance {
    /// Same registry name and identical explicit values.
    fn eq(&self, other: &Self) -> bool {
        self.registry.name() == other.registry.name() && self.values == other.values
    }
}

/// Reads resolved field values while a computed default or formatter runs.
///
/// The resolver tracks which defaults are being evaluated, so a missing
/// dependency is reported against the field that needed it and a default
/// that depends on itself fails instead of recursing.
pub struct Resolver<'a> {
    instance: &'a SpecInstance,
    working_dir: PathBuf,
    memoize: bool,
    stack: RefCell<Vec<String>>,
    target: RefCell<Option<String>>,
}

impl<'a> Resolver<'a> {
    fn new(instance: &'a SpecInstance, working_dir: PathBuf, memoize: bool) -> Self {
        Self {
            instance,
            working_dir,
            memoize,
            stack: RefCell::new(Vec::new()),
            target: RefCell::new(None),
        }
    }

    pub fn instance(&self) -> &'a SpecInstance {
        self.instance
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Joins a relative path to the working directory.
    pub fn in_working_dir(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// True when the field was explicitly assigned.
    pub fn is_set(&self, name: &str) -> bool {
        self.instance.is_set(name)
    }

    /// The field's value: explicit, static default, or computed default.
    pub fn get(&self, name: &str) -> Result<Option<FieldValue>, SpecError> {
        let field = self.instance.registry.lookup(name)?;
        if let Some(value) = self.instance.values.get(name) {
            return Ok(Some(value.clone()));
        }
        match field.default_policy() {
            DefaultPolicy::None => Ok(None),
            DefaultPolicy::Static(_) => Ok(self.instance.static_default(field).cloned()),
            DefaultPolicy::Computed(derivation) => self.compute(field.name(), derivation),
        }
    }

    /// Like [`Resolver::get`], but a missing value is an error attributed to
    /// the default currently being computed.
    pub fn require(&self, name: &str) -> Result<FieldValue, SpecError> {
        self.get(name)?.ok_or_else(|| SpecError::UnresolvedDefault {
            field: self.current().unwrap_or_else(|| name.to_string()),
            dependency: name.to_string(),
        })
    }

    /// Evaluates a derivation that does not belong to the instance's
    /// registry (an output field). The result is not memoized.
    pub fn evaluate(&self, label: &str, derivation: &Derivation) -> Result<Option<FieldValue>, SpecError> {
        let previous = self.target.replace(Some(label.to_string()));
        let result = derivation.evaluate(self);
        self.target.replace(previous);
        result
    }

    fn current(&self) -> Option<String> {
        self.stack
            .borrow()
            .last()
            .cloned()
            .or_else(|| self.target.borrow().clone())
    }

    fn compute(&self, name: &str, derivation: &Derivation) -> Result<Option<FieldValue>, SpecError> {
        if self.memoize {
            let cached = self.instance.memo.borrow().get(name).cloned();
            if let Some(value) = cached {
                return Ok(value);
            }
        }
        if self.stack.borrow().iter().any(|n| n == name) {
            let chain = self.stack.borrow().join(" -> ");
            return Err(SpecError::invalid_registry(
                self.instance.registry.name(),
                format!("computed default cycle: {} -> {}", chain, name),
            ));
        }

        self.stack.borrow_mut().push(name.to_string());
        let result = derivation.evaluate(self);
        self.stack.borrow_mut().pop();
        let value = result?;

        tracing::debug!(field = %name, resolved = value.is_some(), "computed default");
        if self.memoize {
            self.instance
                .memo
                .borrow_mut()
                .insert(name.to_string(), value.clone());
        }
        Ok(value)
    }
}
