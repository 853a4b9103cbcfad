//! File name helpers and name templates for computed defaults.
//!
//! A name template is literal text with `{field}` placeholders. A
//! placeholder may carry one modifier:
//!
//! | modifier | result for `/d/lh.a.nii.gz` |
//! |----------|-----------------------------|
//! | (none)   | `/d/lh.a.nii.gz`            |
//! | `name`   | `lh.a.nii.gz`               |
//! | `stem`   | `lh.a`                      |
//! | `ext`    | `.nii.gz`                   |
//! | `dir`    | `/d`                        |
//! | `int`    | integer part of a number    |
//!
//! `{{` and `}}` produce literal braces.

use std::path::{Path, PathBuf};

use crate::error::SpecError;
use crate::instance::Resolver;
use crate::value::FieldValue;

/// Extensions that span more than one dot.
const COMPOUND_EXTENSIONS: &[&str] = &[".nii.gz", ".tar.gz", ".niml.dset"];

/// Splits a path into directory, stem and extension.
///
/// Compound extensions such as `.nii.gz` count as one extension.
/// Leading dots of hidden files are part of the stem.
pub fn split_filename(path: &Path) -> (PathBuf, String, String) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    for ext in COMPOUND_EXTENSIONS {
        if name.len() > ext.len() && name.to_lowercase().ends_with(ext) {
            let cut = name.len() - ext.len();
            return (dir, name[..cut].to_string(), name[cut..].to_string());
        }
    }

    let search_from = name.len() - name.trim_start_matches('.').len();
    match name[search_from..].rfind('.') {
        Some(idx) => {
            let cut = search_from + idx;
            (dir, name[..cut].to_string(), name[cut..].to_string())
        }
        None => (dir, name, String::new()),
    }
}

/// Builds `prefix + stem + suffix + ext` inside `dir`.
///
/// With `keep_ext` false the original extension is dropped; an explicit new
/// extension can then be carried in `suffix`.
pub fn fname_presuffix(path: &Path, prefix: &str, suffix: &str, keep_ext: bool, dir: &Path) -> PathBuf {
    let (_, stem, ext) = split_filename(path);
    let ext = if keep_ext { ext } else { String::new() };
    dir.join(format!("{}{}{}{}", prefix, stem, suffix, ext))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Value,
    Name,
    Stem,
    Ext,
    Dir,
    Int,
}

impl Modifier {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Modifier::Name),
            "stem" => Some(Modifier::Stem),
            "ext" => Some(Modifier::Ext),
            "dir" => Some(Modifier::Dir),
            "int" => Some(Modifier::Int),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { name: String, modifier: Modifier },
}

/// A file name rule evaluated against an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    raw: String,
}

impl NameTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn segments(&self) -> Result<Vec<Segment>, SpecError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = self.raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(SpecError::invalid_template(&self.raw, "unclosed '{'"));
                    }
                    let (name, modifier) = match inner.split_once(':') {
                        Some((name, m)) => {
                            let modifier = Modifier::parse(m).ok_or_else(|| {
                                SpecError::invalid_template(
                                    &self.raw,
                                    format!("unknown modifier '{}'", m),
                                )
                            })?;
                            (name, modifier)
                        }
                        None => (inner.as_str(), Modifier::Value),
                    };
                    if name.is_empty() {
                        return Err(SpecError::invalid_template(&self.raw, "empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        name: name.to_string(),
                        modifier,
                    });
                }
                '}' => {
                    return Err(SpecError::invalid_template(&self.raw, "unmatched '}'"));
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(segments)
    }

    /// Checks the template syntax.
    pub fn validate(&self) -> Result<(), SpecError> {
        self.segments().map(|_| ())
    }

    /// Field names referenced by the template, in order of appearance.
    pub fn fields(&self) -> Result<Vec<String>, SpecError> {
        Ok(self
            .segments()?
            .into_iter()
            .filter_map(|s| match s {
                Segment::Field { name, .. } => Some(name),
                Segment::Literal(_) => None,
            })
            .collect())
    }

    /// Evaluates the template and places the result in the resolver's
    /// working directory unless it is already absolute.
    pub fn evaluate(&self, resolver: &Resolver<'_>) -> Result<PathBuf, SpecError> {
        let mut out = String::new();
        for segment in self.segments()? {
            match segment {
                Segment::Literal(text) => out.push_str(&text),
                Segment::Field { name, modifier } => {
                    let value = resolver.require(&name)?;
                    out.push_str(&self.apply(&name, modifier, &value)?);
                }
            }
        }
        Ok(resolver.in_working_dir(Path::new(&out)))
    }

    fn apply(&self, field: &str, modifier: Modifier, value: &FieldValue) -> Result<String, SpecError> {
        if modifier == Modifier::Value {
            return Ok(value.to_string());
        }
        if modifier == Modifier::Int {
            return value.as_i64().map(|i| i.to_string()).ok_or_else(|| {
                SpecError::invalid_template(
                    &self.raw,
                    format!("'{}' is {}, not a number", field, value.shape()),
                )
            });
        }

        let path = value.as_path().ok_or_else(|| {
            SpecError::invalid_template(
                &self.raw,
                format!("'{}' is {}, not a path", field, value.shape()),
            )
        })?;
        let (dir, stem, ext) = split_filename(path);
        Ok(match modifier {
            Modifier::Name => format!("{}{}", stem, ext),
            Modifier::Stem => stem,
            Modifier::Ext => ext,
            Modifier::Dir => dir.to_string_lossy().into_owned(),
            Modifier::Value | Modifier::Int => unreachable!("handled above"),
        })
    }
}

impl std::fmt::Display for NameTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
