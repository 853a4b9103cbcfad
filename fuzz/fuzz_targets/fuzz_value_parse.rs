#![no_main]

use libfuzzer_sys::fuzz_target;
use neurowrap_spec::FieldKind;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let kinds = [
        FieldKind::String,
        FieldKind::Integer,
        FieldKind::Float,
        FieldKind::Boolean,
        FieldKind::File,
        FieldKind::Enum,
        FieldKind::Tuple(vec![FieldKind::Float, FieldKind::Float, FieldKind::Float]),
        FieldKind::list(FieldKind::File),
        FieldKind::Either(vec![FieldKind::Boolean, FieldKind::File]),
    ];
    for kind in &kinds {
        if let Ok(value) = kind.parse_str(text) {
            // A parsed value must be accepted by its own kind.
            assert!(kind.coerce(&value).is_some(), "{kind:?} rejected its own parse of {text:?}");
        }
    }
});
