//! Quoting and escaping of HCL tokens.

use k2tf_document::Value;

/// Quote a string literal. Template sequences are escaped so the text is
/// taken literally.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Attribute or object key. Keys arriving already quoted are written as-is.
pub fn key(s: &str) -> String {
    if is_identifier(s) || (s.len() >= 2 && s.starts_with('"') && s.ends_with('"')) {
        s.to_string()
    } else {
        quote(s)
    }
}

/// Single-line rendering of a value.
pub fn inline_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        Value::Float(f) => quote(&f.to_string()),
        Value::List(items) => {
            let inner = items.iter().map(inline_value).collect::<Vec<_>>().join(", ");
            format!("[{inner}]")
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| format!("{} = {}", key(k), inline_value(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{ {entries} }}")
        }
    }
}
