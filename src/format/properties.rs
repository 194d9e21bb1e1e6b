//! Flat `key=value` properties files
//!
//! Supports `=`, `:` and whitespace separators, `#`/`!` comments, trailing
//! backslash line continuation and the usual escapes. All values are
//! strings; dotted keys become nested maps.

use pruner_core::{flatten, unflatten, FlatPropertyMap};
use serde_json::Value;

use super::FormatError;

/// Parse properties text into a tree
pub fn parse_properties(contents: &str) -> Result<Value, FormatError> {
    let mut flat = FlatPropertyMap::new();

    for (line_no, logical) in logical_lines(contents) {
        let (key, value) = split_key_value(&logical);
        let key = unescape(key, line_no)?;
        if key.is_empty() {
            return Err(FormatError::Properties {
                line: line_no,
                message: "empty key".to_string(),
            });
        }
        let value = unescape(value, line_no)?;
        flat.insert(key, Value::String(value));
    }

    Ok(unflatten(&flat)?)
}

/// Serialize a tree as sorted `key=value` lines
pub fn render_properties(tree: &Value) -> Result<String, FormatError> {
    let flat = flatten(tree)?;
    let mut out = String::new();
    for (key, value) in &flat {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(&text, false));
        out.push('\n');
    }
    Ok(out)
}

/// Join continuation lines and drop comments/blank lines.
///
/// Yields the 1-based number of the first physical line of each entry.
fn logical_lines(contents: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, raw) in contents.lines().enumerate() {
        let trimmed = raw.trim_start();

        let (start, mut buf) = match current.take() {
            Some(pending) => pending,
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        if ends_with_continuation(trimmed) {
            buf.push_str(&trimmed[..trimmed.len() - 1]);
            current = Some((start, buf));
        } else {
            buf.push_str(trimmed);
            lines.push((start, buf));
        }
    }

    if let Some(pending) = current {
        lines.push(pending);
    }
    lines
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

/// Split at the first unescaped `=`, `:` or whitespace.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    (key, rest.trim_start_matches([' ', '\t', '\x0c']))
}

fn unescape(text: &str, line: usize) -> Result<String, FormatError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| FormatError::Properties {
                        line,
                        message: format!("invalid unicode escape \\u{}", hex),
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '#' | '!' if i == 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
