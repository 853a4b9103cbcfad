//! Fields shared by every command-line interface, and value helpers for
//! derivation and formatter functions.

use std::path::{Path, PathBuf};

use neurowrap_spec::{FieldKind, FieldSpec, RegistryBuilder, Resolver, SpecError};

/// Allowed values of `terminal_output`.
pub const TERMINAL_OUTPUT: [&str; 4] = ["stream", "allatonce", "file", "none"];

/// Declares `args`, `ignore_exception` and `terminal_output`.
pub fn command_line_fields(inputs: RegistryBuilder) -> RegistryBuilder {
    inputs
        .register(
            FieldSpec::new("args", FieldKind::String)
                .desc("Additional parameters to the command")
                .argstr("%s"),
        )
        .register(
            FieldSpec::new("ignore_exception", FieldKind::Boolean)
                .desc("Print an error message instead of failing when the tool fails")
                .nohash()
                .default_value(false),
        )
        .register(
            FieldSpec::new("terminal_output", FieldKind::Enum)
                .desc("Control terminal output")
                .choices(TERMINAL_OUTPUT)
                .nohash(),
        )
}

/// A resolved path-valued field.
pub(crate) fn require_path(resolver: &Resolver<'_>, name: &str) -> Result<PathBuf, SpecError> {
    let value = resolver.require(name)?;
    value
        .as_path()
        .map(Path::to_path_buf)
        .ok_or_else(|| SpecError::TypeMismatch {
            field: name.to_string(),
            expected: "path".to_string(),
            found: value.shape(),
        })
}

/// A resolved field as text.
pub(crate) fn require_text(resolver: &Resolver<'_>, name: &str) -> Result<String, SpecError> {
    Ok(resolver.require(name)?.to_string())
}

/// A resolved field as text, or `None` when it has no value.
pub(crate) fn optional_text(resolver: &Resolver<'_>, name: &str) -> Result<Option<String>, SpecError> {
    Ok(resolver.get(name)?.map(|value| value.to_string()))
}

#[cfg(test)]
mod tests {
    use neurowrap_spec::SpecRegistry;

    use super::*;

    #[test]
    fn test_common_fields_metadata() {
        let registry = command_line_fields(SpecRegistry::builder("Tool.inputs"))
            .build()
            .unwrap();

        let args = registry.lookup("args").unwrap().summary();
        assert_eq!(args.argstr.as_deref(), Some("%s"));
        assert!(!args.nohash);

        let ignore = registry.lookup("ignore_exception").unwrap().summary();
        assert!(ignore.nohash);
        assert!(ignore.usedefault);
        assert_eq!(ignore.argstr, None);

        let terminal = registry.lookup("terminal_output").unwrap().summary();
        assert!(terminal.nohash);
        assert!(!terminal.usedefault);
    }
}
