//! printf-style argument templates (`--hemi %s`, `--fwhm %.4f`).
//!
//! Supported directives: `%s`, `%d`, `%f`, `%.Nf` and the `%%` escape.
//! A template ending in `...` repeats once per list element.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::SpecError;
use crate::value::{format_float, FieldValue};

/// Trailing marker for templates that repeat per list element.
pub const REPEAT_MARKER: &str = "...";

const DIRECTIVE_PATTERN: &str = r"%(%|s|d|f|\.(\d+)f)?";

static DIRECTIVE_REGEX: OnceLock<Regex> = OnceLock::new();

fn directive_regex() -> &'static Regex {
    DIRECTIVE_REGEX.get_or_init(|| Regex::new(DIRECTIVE_PATTERN).expect("invalid regex pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Str,
    Int,
    Float(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Directive(Directive),
}

/// A command-line argument template consuming a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgTemplate {
    raw: String,
}

impl ArgTemplate {
    /// Wraps a raw template. Syntax is checked by [`ArgTemplate::validate`]
    /// when the owning registry is built.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The template text as declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the template repeats per list element.
    pub fn repeats(&self) -> bool {
        self.raw.ends_with(REPEAT_MARKER)
    }

    fn body(&self) -> &str {
        self.raw
            .strip_suffix(REPEAT_MARKER)
            .unwrap_or(self.raw.as_str())
    }

    fn pieces(&self) -> Result<Vec<Piece>, SpecError> {
        let body = self.body();
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in directive_regex().captures_iter(body) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            literal.push_str(&body[last..whole.start()]);
            last = whole.end();

            let directive = match caps.get(1).map(|m| m.as_str()) {
                Some("%") => {
                    literal.push('%');
                    continue;
                }
                Some("s") => Directive::Str,
                Some("d") => Directive::Int,
                Some("f") => Directive::Float(6),
                Some(_) => {
                    let precision = caps
                        .get(2)
                        .and_then(|m| m.as_str().parse::<usize>().ok())
                        .ok_or_else(|| {
                            SpecError::invalid_template(&self.raw, "bad float precision")
                        })?;
                    Directive::Float(precision)
                }
                None => {
                    return Err(SpecError::invalid_template(
                        &self.raw,
                        format!("unsupported directive at byte {}", whole.start()),
                    ))
                }
            };

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Directive(directive));
        }

        literal.push_str(&body[last..]);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(pieces)
    }

    /// Checks the template syntax.
    pub fn validate(&self) -> Result<(), SpecError> {
        self.pieces().map(|_| ())
    }

    /// Number of value directives in the template.
    pub fn directive_count(&self) -> Result<usize, SpecError> {
        Ok(self
            .pieces()?
            .iter()
            .filter(|p| matches!(p, Piece::Directive(_)))
            .count())
    }

    /// Substitutes `args` into the directives, in order.
    pub fn format(&self, args: &[FieldValue]) -> Result<String, SpecError> {
        let pieces = self.pieces()?;
        let expected = pieces
            .iter()
            .filter(|p| matches!(p, Piece::Directive(_)))
            .count();
        if expected != args.len() {
            return Err(SpecError::invalid_template(
                &self.raw,
                format!("expects {} value(s), got {}", expected, args.len()),
            ));
        }

        let mut out = String::new();
        let mut args = args.iter();
        for piece in &pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Directive(directive) => {
                    if let Some(arg) = args.next() {
                        out.push_str(&self.format_one(*directive, arg)?);
                    }
                }
            }
        }
        Ok(out)
    }

    fn format_one(&self, directive: Directive, value: &FieldValue) -> Result<String, SpecError> {
        match directive {
            Directive::Str => Ok(value.to_string()),
            Directive::Int => match value {
                FieldValue::Bool(b) => Ok(i64::from(*b).to_string()),
                other => other.as_i64().map(|i| i.to_string()).ok_or_else(|| {
                    SpecError::invalid_template(
                        &self.raw,
                        format!("%d cannot format {}", other.shape()),
                    )
                }),
            },
            Directive::Float(precision) => value
                .as_f64()
                .map(|x| format!("{:.*}", precision, x))
                .ok_or_else(|| {
                    SpecError::invalid_template(
                        &self.raw,
                        format!("%f cannot format {}", value.shape()),
                    )
                }),
        }
    }

    /// Renders one field value into a command-line token.
    ///
    /// - A template without directives is a bare flag: emitted when a
    ///   boolean value is true, or whenever a non-boolean value is set.
    /// - Tuples fill one directive per element.
    /// - Lists are joined with `sep` and substituted once, or rendered per
    ///   element and joined with `sep` when the template repeats.
    ///
    /// Returns `None` when the value produces no token.
    pub fn render(&self, value: &FieldValue, sep: &str) -> Result<Option<String>, SpecError> {
        let directives = self.directive_count()?;

        if directives == 0 {
            return Ok(match value {
                FieldValue::Bool(false) => None,
                _ => Some(self.format(&[])?),
            });
        }

        match value {
            FieldValue::List(items) if items.is_empty() => Ok(None),
            FieldValue::List(items) if self.repeats() => {
                let rendered = items
                    .iter()
                    .map(|item| self.format(std::slice::from_ref(item)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(rendered.join(sep)))
            }
            FieldValue::List(items) => {
                let joined = items
                    .iter()
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join(sep);
                self.format(&[FieldValue::Str(joined)]).map(Some)
            }
            FieldValue::Tuple(items) => self.format(items).map(Some),
            other => self.format(std::slice::from_ref(other)).map(Some),
        }
    }
}

fn element_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(x) => format_float(*x),
        other => other.to_string(),
    }
}

impl std::fmt::Display for ArgTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn render(template: &str, value: impl Into<FieldValue>) -> Option<String> {
        ArgTemplate::new(template).render(&value.into(), " ").unwrap()
    }

    #[test]
    fn test_string_and_path() {
        assert_eq!(render("--hemi %s", "lh").as_deref(), Some("--hemi lh"));
        assert_eq!(
            render("--mov %s", PathBuf::from("a.nii")).as_deref(),
            Some("--mov a.nii")
        );
    }

    #[test]
    fn test_float_precision() {
        assert_eq!(render("--fwhm %.4f", 5.0).as_deref(), Some("--fwhm 5.0000"));
        assert_eq!(render("--projfrac %.3f", 0.5).as_deref(), Some("--projfrac 0.500"));
        assert_eq!(render("%f", 1.5).as_deref(), Some("1.500000"));
    }

    #[test]
    fn test_integer_directive_truncates() {
        assert_eq!(render("%d", 7).as_deref(), Some("7"));
        assert_eq!(render("--smooth %d", 5.9).as_deref(), Some("--smooth 5"));
    }

    #[test]
    fn test_bool_flag() {
        assert_eq!(render("--cortex", true).as_deref(), Some("--cortex"));
        assert_eq!(render("--cortex", false), None);
    }

    #[test]
    fn test_tuple_fills_each_directive() {
        assert_eq!(
            render("-fminmax %.3f %.3f", (1.0, 2.5)).as_deref(),
            Some("-fminmax 1.000 2.500")
        );
        let err = ArgTemplate::new("%.3f")
            .render(&(1.0, 2.0).into(), " ")
            .unwrap_err();
        assert!(err.to_string().contains("expects 1 value(s), got 2"));
    }

    #[test]
    fn test_list_joined_and_repeated() {
        let files = vec![PathBuf::from("a.nii"), PathBuf::from("b.nii")];
        assert_eq!(render("%s", files.clone()).as_deref(), Some("a.nii b.nii"));
        assert_eq!(
            render("--i %s...", files).as_deref(),
            Some("--i a.nii --i b.nii")
        );
        assert_eq!(render("%s", Vec::<String>::new()), None);
    }

    #[test]
    fn test_percent_escape_and_invalid_directive() {
        assert_eq!(render("%d%%", 50).as_deref(), Some("50%"));
        assert!(ArgTemplate::new("--x %q").validate().is_err());
        assert!(ArgTemplate::new("--x %").validate().is_err());
    }

    #[test]
    fn test_string_rejected_by_number_directive() {
        let err = ArgTemplate::new("%d")
            .render(&"abc".into(), " ")
            .unwrap_err();
        assert!(err.to_string().contains("%d cannot format string"));
    }
}
