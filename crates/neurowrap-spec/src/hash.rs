//! Call signatures.
//!
//! A signature identifies a configured call for caching and
//! reproducibility checks:
//!
//! ```text
//! signature = hex(BLAKE3(JCS({"command": cmd, "inputs": {name: value}})))
//! ```
//!
//! where JCS is the JSON Canonicalization Scheme of RFC 8785. Only hashed
//! fields that are set or carry a static default contribute.

use crate::instance::SpecInstance;

/// Computes the signature of a configured call.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use neurowrap_spec::{FieldKind, FieldSpec, SpecInstance, SpecRegistry};
/// use neurowrap_spec::hash::call_signature;
///
/// let registry = SpecRegistry::builder("Tool.inputs")
///     .register(FieldSpec::new("in_file", FieldKind::File).argstr("%s"))
///     .build()
///     .unwrap();
/// let mut inputs = SpecInstance::new(Arc::new(registry), "/work");
/// inputs.set("in_file", "a.nii").unwrap();
///
/// let signature = call_signature("tool", &inputs);
/// assert_eq!(signature.len(), 64);
/// ```
pub fn call_signature(command: &str, instance: &SpecInstance) -> String {
    let inputs: serde_json::Map<String, serde_json::Value> = instance
        .hashed_values()
        .into_iter()
        .map(|(name, value)| (name, value.to_json()))
        .collect();
    let document = serde_json::json!({
        "command": command,
        "inputs": inputs,
    });
    canonical_value_hash(&document)
}

/// Computes the BLAKE3 hash of a JSON value's canonical form.
///
/// Returns a 64-character lowercase hexadecimal string.
pub fn canonical_value_hash(value: &serde_json::Value) -> String {
    let canonical = canonicalize_json(value);
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}

/// Canonicalizes a JSON value according to RFC 8785 (JCS).
///
/// - Object keys are sorted lexicographically
/// - No whitespace between tokens
/// - Integral floats print without a fraction
/// - Strings use minimal escaping
pub fn canonicalize_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => format_jcs_number(n),
        serde_json::Value::String(s) => format_jcs_string(s),
        serde_json::Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonicalize_json).collect();
            format!("[{}]", items.join(","))
        }
        serde_json::Value::Object(obj) => {
            let mut pairs: Vec<(&String, &serde_json::Value)> = obj.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            let pairs: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", format_jcs_string(k), canonicalize_json(v)))
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}

fn format_jcs_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if !f.is_finite() => "null".to_string(),
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => {
            let s = format!("{}", f);
            if s.contains('.') && !s.contains('e') {
                s.trim_end_matches('0').trim_end_matches('.').to_string()
            } else {
                s
            }
        }
        None => "null".to_string(),
    }
}

fn format_jcs_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if c < '\x20' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::field::FieldSpec;
    use crate::registry::SpecRegistry;
    use crate::value::FieldKind;

    fn inputs() -> SpecInstance {
        let registry = SpecRegistry::builder("SurfaceSmooth.inputs")
            .register(FieldSpec::new("cortex", FieldKind::Boolean).argstr("--cortex").default_value(true))
            .register(FieldSpec::new("fwhm", FieldKind::Float).argstr("--fwhm %.4f"))
            .register(FieldSpec::new("hemi", FieldKind::String).argstr("--hemi %s"))
            .register(
                FieldSpec::new("out_file", FieldKind::File)
                    .argstr("--tval %s")
                    .computed("{hemi}.smooth.nii"),
            )
            .register(
                FieldSpec::new("terminal_output", FieldKind::String).nohash(),
            )
            .build()
            .unwrap();
        SpecInstance::new(Arc::new(registry), "/work")
    }

    #[test]
    fn test_signature_is_order_independent() {
        let mut a = inputs();
        a.set("hemi", "lh").unwrap();
        a.set("fwhm", 5.0).unwrap();
        let mut b = inputs();
        b.set("fwhm", 5).unwrap();
        b.set("hemi", "lh").unwrap();
        assert_eq!(call_signature("mri_surf2surf", &a), call_signature("mri_surf2surf", &b));
    }

    #[test]
    fn test_signature_ignores_nohash_and_computed() {
        let mut a = inputs();
        a.set("hemi", "lh").unwrap();
        let before = call_signature("mri_surf2surf", &a);

        a.set("terminal_output", "stream").unwrap();
        assert_eq!(call_signature("mri_surf2surf", &a), before);

        // The computed out_file moves with the working directory; the
        // signature does not.
        a.set_working_dir("/other");
        assert_eq!(call_signature("mri_surf2surf", &a), before);
    }

    #[test]
    fn test_signature_tracks_values_and_command() {
        let mut a = inputs();
        a.set("hemi", "lh").unwrap();
        let mut b = inputs();
        b.set("hemi", "rh").unwrap();
        assert_ne!(call_signature("tool", &a), call_signature("tool", &b));
        assert_ne!(call_signature("tool", &a), call_signature("other", &a));
    }

    #[test]
    fn test_canonicalize_json_object_ordering() {
        let json1: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        let json2: serde_json::Value = serde_json::from_str(r#"{"a": 2, "b": 1}"#).unwrap();
        assert_eq!(canonicalize_json(&json1), canonicalize_json(&json2));
        assert_eq!(canonicalize_json(&json1), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_canonicalize_json_numbers_and_strings() {
        let json = serde_json::json!({"x": 5.0, "y": 0.5, "s": "a\tb"});
        assert_eq!(canonicalize_json(&json), r#"{"s":"a\tb","x":5,"y":0.5}"#);
    }
}
