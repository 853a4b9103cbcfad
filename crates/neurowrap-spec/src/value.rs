//! Field kinds, concrete values and value constraints.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Declared shape of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free-form text.
    String,
    /// Whole number.
    Integer,
    /// Floating point number; integer values are accepted and widened.
    Float,
    /// Flag-like true/false value.
    Boolean,
    /// Path to a file.
    File,
    /// Path to a directory.
    Directory,
    /// Scalar drawn from the field's choices constraint.
    Enum,
    /// Fixed-arity sequence of element kinds.
    Tuple(Vec<FieldKind>),
    /// Variable-length sequence of one element kind.
    List(Box<FieldKind>),
    /// First matching alternative wins.
    Either(Vec<FieldKind>),
}

impl FieldKind {
    /// Shorthand for a list kind.
    pub fn list(element: FieldKind) -> Self {
        FieldKind::List(Box::new(element))
    }

    /// Returns true for integer and float kinds.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Float)
    }

    /// Checks a value against this kind and converts it to its canonical
    /// shape (strings become paths for file kinds, integers widen to floats,
    /// lists of the right arity become tuples).
    ///
    /// Returns `None` when the value does not fit.
    pub fn coerce(&self, value: &FieldValue) -> Option<FieldValue> {
        match (self, value) {
            (FieldKind::String, FieldValue::Str(_)) => Some(value.clone()),
            (FieldKind::String, FieldValue::Path(p)) => {
                Some(FieldValue::Str(p.to_string_lossy().into_owned()))
            }
            (FieldKind::Integer, FieldValue::Int(_)) => Some(value.clone()),
            (FieldKind::Float, FieldValue::Float(x)) if x.is_finite() => Some(value.clone()),
            (FieldKind::Float, FieldValue::Int(i)) => Some(FieldValue::Float(*i as f64)),
            (FieldKind::Boolean, FieldValue::Bool(_)) => Some(value.clone()),
            (FieldKind::File | FieldKind::Directory, FieldValue::Path(_)) => Some(value.clone()),
            (FieldKind::File | FieldKind::Directory, FieldValue::Str(s)) => {
                Some(FieldValue::Path(PathBuf::from(s)))
            }
            (FieldKind::Enum, FieldValue::Str(_) | FieldValue::Int(_)) => Some(value.clone()),
            (FieldKind::Tuple(kinds), FieldValue::Tuple(items) | FieldValue::List(items)) => {
                if kinds.len() != items.len() {
                    return None;
                }
                kinds
                    .iter()
                    .zip(items)
                    .map(|(k, v)| k.coerce(v))
                    .collect::<Option<Vec<_>>>()
                    .map(FieldValue::Tuple)
            }
            (FieldKind::List(element), FieldValue::List(items)) => items
                .iter()
                .map(|v| element.coerce(v))
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::List),
            (FieldKind::Either(alternatives), _) => {
                alternatives.iter().find_map(|k| k.coerce(value))
            }
            _ => None,
        }
    }

    /// Parses a textual value (as given on a command line) for this kind.
    ///
    /// Tuple and list elements are separated by commas.
    pub fn parse_str(&self, input: &str) -> Result<FieldValue, String> {
        let input = input.trim();
        match self {
            FieldKind::String => Ok(FieldValue::Str(input.to_string())),
            FieldKind::Integer => input
                .parse::<i64>()
                .map(FieldValue::Int)
                .map_err(|e| format!("not an integer: {}", e)),
            FieldKind::Float => match input.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(FieldValue::Float(x)),
                Ok(_) => Err(format!("not a finite number: {}", input)),
                Err(e) => Err(format!("not a number: {}", e)),
            },
            FieldKind::Boolean => match input.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(FieldValue::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(FieldValue::Bool(false)),
                other => Err(format!("not a boolean: {}", other)),
            },
            FieldKind::File | FieldKind::Directory => {
                if input.is_empty() {
                    Err("path cannot be empty".to_string())
                } else {
                    Ok(FieldValue::Path(PathBuf::from(input)))
                }
            }
            FieldKind::Enum => Ok(input
                .parse::<i64>()
                .map(FieldValue::Int)
                .unwrap_or_else(|_| FieldValue::Str(input.to_string()))),
            FieldKind::Tuple(kinds) => {
                let parts: Vec<&str> = input.split(',').collect();
                if parts.len() != kinds.len() {
                    return Err(format!(
                        "expected {} comma-separated values, got {}",
                        kinds.len(),
                        parts.len()
                    ));
                }
                kinds
                    .iter()
                    .zip(parts)
                    .map(|(k, p)| k.parse_str(p))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FieldValue::Tuple)
            }
            FieldKind::List(element) => {
                if input.is_empty() {
                    return Ok(FieldValue::List(Vec::new()));
                }
                input
                    .split(',')
                    .map(|p| element.parse_str(p))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FieldValue::List)
            }
            FieldKind::Either(alternatives) => alternatives
                .iter()
                .find_map(|k| k.parse_str(input).ok())
                .ok_or_else(|| format!("does not match {}", self)),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::File => write!(f, "file"),
            FieldKind::Directory => write!(f, "directory"),
            FieldKind::Enum => write!(f, "enum"),
            FieldKind::Tuple(kinds) => write!(f, "tuple({})", joined(kinds, ", ")),
            FieldKind::List(element) => write!(f, "list({})", element),
            FieldKind::Either(kinds) => write!(f, "{}", joined(kinds, " | ")),
        }
    }
}

fn joined<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// A concrete field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    Tuple(Vec<FieldValue>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Short name of the value shape, used in type mismatch messages.
    pub fn shape(&self) -> String {
        match self {
            FieldValue::Bool(_) => "boolean".to_string(),
            FieldValue::Int(_) => "integer".to_string(),
            FieldValue::Float(_) => "float".to_string(),
            FieldValue::Str(_) => "string".to_string(),
            FieldValue::Path(_) => "path".to_string(),
            FieldValue::Tuple(items) => format!("{}-tuple", items.len()),
            FieldValue::List(items) => format!("list of {}", items.len()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            FieldValue::Path(p) => p.to_str(),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            FieldValue::Path(p) => Some(p),
            FieldValue::Str(s) => Some(Path::new(s)),
            _ => None,
        }
    }

    /// Elements of a tuple or list value.
    pub fn items(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Tuple(items) | FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts the value to JSON for hashing and machine-readable output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Int(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Str(s) => serde_json::Value::String(s.clone()),
            FieldValue::Path(p) => serde_json::Value::String(p.to_string_lossy().into_owned()),
            FieldValue::Tuple(items) | FieldValue::List(items) => {
                serde_json::Value::Array(items.iter().map(FieldValue::to_json).collect())
            }
        }
    }

    /// Builds a value from JSON. Arrays become lists; kind coercion turns
    /// them into tuples where the field expects one.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Null => Err("null is not a field value".to_string()),
            serde_json::Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(FieldValue::Int(i)),
                None => n
                    .as_f64()
                    .map(FieldValue::Float)
                    .ok_or_else(|| format!("unsupported number {}", n)),
            },
            serde_json::Value::String(s) => Ok(FieldValue::Str(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(FieldValue::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            serde_json::Value::Object(_) => Err("objects are not field values".to_string()),
        }
    }
}

/// Formats a float the way the wrapped tools' configuration layer prints
/// plain numbers: integral values keep one decimal.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", format_float(*x)),
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Path(p) => write!(f, "{}", p.display()),
            FieldValue::Tuple(items) => write!(f, "({})", joined(items, ", ")),
            FieldValue::List(items) => write!(f, "[{}]", joined(items, ", ")),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<PathBuf> for FieldValue {
    fn from(value: PathBuf) -> Self {
        FieldValue::Path(value)
    }
}

impl From<&Path> for FieldValue {
    fn from(value: &Path) -> Self {
        FieldValue::Path(value.to_path_buf())
    }
}

impl From<(f64, f64)> for FieldValue {
    fn from(value: (f64, f64)) -> Self {
        FieldValue::Tuple(vec![value.0.into(), value.1.into()])
    }
}

impl From<(f64, f64, f64)> for FieldValue {
    fn from(value: (f64, f64, f64)) -> Self {
        FieldValue::Tuple(vec![value.0.into(), value.1.into(), value.2.into()])
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(value: Vec<T>) -> Self {
        FieldValue::List(value.into_iter().map(Into::into).collect())
    }
}

/// Restriction on the values a field accepts beyond its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Value must equal one of these.
    Choices(Vec<FieldValue>),
    /// Numeric value (or every numeric element) must lie in `[min, max]`.
    Range { min: f64, max: f64 },
}

impl Constraint {
    /// Returns true when the (already coerced) value satisfies the constraint.
    pub fn allows(&self, value: &FieldValue) -> bool {
        match self {
            Constraint::Choices(choices) => choices.iter().any(|c| same_choice(c, value)),
            Constraint::Range { min, max } => match value {
                FieldValue::Tuple(items) | FieldValue::List(items) => {
                    items.iter().all(|v| self.allows(v))
                }
                other => other
                    .as_f64()
                    .map(|x| x >= *min && x <= *max)
                    .unwrap_or(false),
            },
        }
    }
}

fn same_choice(choice: &FieldValue, value: &FieldValue) -> bool {
    match (choice, value) {
        (FieldValue::Int(_) | FieldValue::Float(_), FieldValue::Int(_) | FieldValue::Float(_)) => {
            choice.as_f64() == value.as_f64()
        }
        _ => choice == value,
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Choices(choices) => write!(f, "{{{}}}", joined(choices, ", ")),
            Constraint::Range { min, max } => {
                write!(f, "[{}, {}]", format_float(*min), format_float(*max))
            }
        }
    }
}
