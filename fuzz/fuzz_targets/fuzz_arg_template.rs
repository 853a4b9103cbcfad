#![no_main]

use libfuzzer_sys::fuzz_target;
use neurowrap_spec::{ArgTemplate, FieldValue};

// Template text and value come from the same input, split at the first newline.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (template, value) = text.split_once('\n').unwrap_or((text, ""));
    let template = ArgTemplate::new(template);
    if template.validate().is_err() {
        return;
    }

    let value = serde_json::from_str::<serde_json::Value>(value)
        .ok()
        .and_then(|json| FieldValue::from_json(&json).ok())
        .unwrap_or_else(|| FieldValue::Str(value.to_string()));
    let _ = template.render(&value, " ");
    if let Some(items) = value.items() {
        let _ = template.format(items);
    }
});
