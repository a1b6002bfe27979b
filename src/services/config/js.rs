//! JavaScript literal writer for generated config source

use serde_json::Value;
use std::fmt::Write;

const INDENT: &str = "  ";
const INLINE_ARRAY_WIDTH: usize = 60;

#[must_use]
pub fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

/// Quote a string with single quotes, escaping as needed.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Whether `key` can be written as a bare property name.
#[must_use]
pub fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[must_use]
pub fn property_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Append `value` as a JavaScript literal. Nested lines are indented one
/// level deeper than `level`; the first line is not indented.
pub fn write_value(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&quote(s)),
        Value::Array(items) => write_array(out, items, level),
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (key, item) in map {
                out.push_str(&indent(level + 1));
                out.push_str(&property_key(key));
                out.push_str(": ");
                write_value(out, item, level + 1);
                out.push_str(",\n");
            }
            out.push_str(&indent(level));
            out.push('}');
        }
    }
}

fn write_array(out: &mut String, items: &[Value], level: usize) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }

    let scalar = items
        .iter()
        .all(|v| !matches!(v, Value::Array(_) | Value::Object(_)));
    if scalar {
        let mut inline = String::from("[");
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                inline.push_str(", ");
            }
            write_value(&mut inline, item, level);
        }
        inline.push(']');
        if inline.len() <= INLINE_ARRAY_WIDTH {
            out.push_str(&inline);
            return;
        }
    }

    out.push_str("[\n");
    for item in items {
        out.push_str(&indent(level + 1));
        write_value(out, item, level + 1);
        out.push_str(",\n");
    }
    out.push_str(&indent(level));
    out.push(']');
}
