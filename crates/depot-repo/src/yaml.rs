//! Minimal YAML rendering for the published index document.
//!
//! The index only ever contains maps, sequences and scalars, so a small block
//! emitter over [`serde_json::Value`] is all that is needed. Map keys come
//! from `serde_json`'s sorted map type, which keeps the output deterministic
//! for identical inputs.

use serde_json::{Map, Value};

use crate::{RepoError, Result};

pub(crate) fn to_yaml(value: &Value) -> Result<String> {
    let Value::Object(map) = value else {
        return Err(RepoError::Regeneration {
            message: "index document root must be a mapping".to_string(),
        });
    };
    let mut out = String::new();
    write_map(&mut out, map, 0)?;
    Ok(out)
}

fn write_map(out: &mut String, map: &Map<String, Value>, indent: usize) -> Result<()> {
    for (key, value) in map {
        push_indent(out, indent);
        write_entry(out, key, value, indent)?;
    }
    Ok(())
}

/// Writes one `key: value` entry, assuming the cursor already sits at the
/// key's column. Block values are nested two spaces past `indent`.
fn write_entry(out: &mut String, key: &str, value: &Value, indent: usize) -> Result<()> {
    out.push_str(&scalar_from_str(key)?);
    match value {
        Value::Object(map) if !map.is_empty() => {
            out.push_str(":\n");
            write_map(out, map, indent + 2)?;
        }
        Value::Array(items) if !items.is_empty() => {
            out.push_str(":\n");
            write_seq(out, items, indent + 2)?;
        }
        Value::Object(_) => out.push_str(": {}\n"),
        Value::Array(_) => out.push_str(": []\n"),
        scalar => {
            out.push_str(": ");
            out.push_str(&scalar_value(scalar)?);
            out.push('\n');
        }
    }
    Ok(())
}

fn write_seq(out: &mut String, items: &[Value], indent: usize) -> Result<()> {
    for item in items {
        match item {
            Value::Object(map) if !map.is_empty() => {
                let mut first = true;
                for (key, value) in map {
                    if first {
                        push_indent(out, indent);
                        out.push_str("- ");
                        first = false;
                    } else {
                        push_indent(out, indent + 2);
                    }
                    write_entry(out, key, value, indent + 2)?;
                }
            }
            other => {
                push_indent(out, indent);
                out.push_str("- ");
                out.push_str(&scalar_value(other)?);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push(' ');
    }
}

fn scalar_value(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => scalar_from_str(s),
        Value::Array(_) | Value::Object(_) => Err(RepoError::Regeneration {
            message: "nested collection used as scalar".to_string(),
        }),
    }
}

fn scalar_from_str(s: &str) -> Result<String> {
    if needs_quotes(s) {
        // JSON string escaping is a valid YAML double-quoted scalar.
        serde_json::to_string(s).map_err(RepoError::from)
    } else {
        Ok(s.to_string())
    }
}

fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }
    if matches!(s, "null" | "~" | "true" | "false" | "yes" | "no" | "on" | "off") {
        return true;
    }
    // Quote anything a YAML parser could mistake for a number.
    if s.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
        && s.parse::<f64>().is_ok()
    {
        return true;
    }
    // Leading indicator characters open comments, anchors, flow collections
    // and friends.
    if s.starts_with([
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%',
        '@', '`',
    ]) {
        return true;
    }
    // In block context a colon only terminates a plain scalar before
    // whitespace (or at the end), so URLs stay unquoted.
    if s.contains(": ") || s.ends_with(':') || s.contains(" #") {
        return true;
    }
    s.chars().any(|c| matches!(c, '\n' | '\t'))
}
