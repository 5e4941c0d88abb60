// src/codec/render.rs

//! Rendering values back into the manifest subset
//!
//! Everything rendered here parses back to the same value with
//! [`super::parser::parse`], with one exception: a mapping nested inside a
//! list is written as a flow mapping, which the parser rejects.

use super::parser::resolve_plain;
use super::value::{Mapping, Value};

/// Column limit for folded descriptions
pub const WRAP_WIDTH: usize = 78;

const INDENT: &str = "  ";

/// Characters that force a string into quotes
const INDICATORS: &[char] = &[
    ':', '{', '}', '[', ']', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
];

/// Whether a single-line string must be quoted to survive a re-parse
fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.contains(INDICATORS)
        || s != s.trim()
        || s == "-"
        || s.starts_with("- ")
        || !matches!(resolve_plain(s), Value::String(_))
}

fn single_quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a string as a single-line scalar, quoting only when required
pub fn render_scalar(s: &str) -> String {
    if s.chars().any(|c| c.is_control() && c != '\t') {
        double_quoted(s)
    } else if needs_quotes(s) {
        single_quoted(s)
    } else {
        s.to_string()
    }
}

/// Render any value on one line
pub fn render_inline(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.clone(),
        Value::String(s) => render_scalar(s),
        Value::List(items) => render_flow_list(items),
        Value::Map(map) if map.is_empty() => "{}".to_string(),
        Value::Map(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, render_flow_item(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

fn render_flow_item(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains(',') && !s.chars().any(char::is_control) => single_quoted(s),
        other => render_inline(other),
    }
}

/// Render a flow sequence such as `[a, b]`
pub fn render_flow_list(items: &[Value]) -> String {
    let rendered: Vec<String> = items.iter().map(render_flow_item).collect();
    format!("[{}]", rendered.join(", "))
}

/// Whether a multi-line string can be written as a `|` / `|-` block
fn literal_representable(s: &str) -> bool {
    if !s.contains('\n') || s.contains('\r') {
        return false;
    }
    let body = s.strip_suffix('\n').unwrap_or(s);
    if body.is_empty() || body.ends_with('\n') {
        return false;
    }
    let lines: Vec<&str> = body.split('\n').collect();
    if lines.iter().any(|l| !l.is_empty() && l.trim().is_empty()) {
        return false;
    }
    match lines.iter().find(|l| !l.is_empty()) {
        Some(first) => !first.starts_with([' ', '\t']),
        None => false,
    }
}

/// Append `key: value` at `depth`, expanding collections into blocks
pub fn render_entry(out: &mut String, depth: usize, key: &str, value: &Value) {
    let pad = INDENT.repeat(depth);

    match value {
        Value::Map(map) if !map.is_empty() => {
            out.push_str(&format!("{}{}:\n", pad, key));
            for (k, v) in map.iter() {
                render_entry(out, depth + 1, k, v);
            }
        }
        Value::List(items) if !items.is_empty() => {
            out.push_str(&format!("{}{}:\n", pad, key));
            for item in items {
                out.push_str(&format!("{}{}- {}\n", pad, INDENT, render_inline(item)));
            }
        }
        Value::String(s) if literal_representable(s) => {
            let (header, body) = match s.strip_suffix('\n') {
                Some(body) => ("|", body),
                None => ("|-", s.as_str()),
            };
            out.push_str(&format!("{}{}: {}\n", pad, key, header));
            for line in body.split('\n') {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&format!("{}{}{}\n", pad, INDENT, line));
                }
            }
        }
        other => out.push_str(&format!("{}{}: {}\n", pad, key, render_inline(other))),
    }
}

/// Render a whole mapping as a document
pub fn render_document(map: &Mapping) -> String {
    let mut out = String::new();
    for (key, value) in map.iter() {
        render_entry(&mut out, 0, key, value);
    }
    out
}

/// Append `key: >` followed by `text` word-wrapped at [`WRAP_WIDTH`]
///
/// Whitespace runs collapse to single spaces, which is exactly what the
/// folded style reads back.
pub fn render_folded(out: &mut String, depth: usize, key: &str, text: &str) {
    let pad = INDENT.repeat(depth);
    let lead = format!("{}{}", pad, INDENT);
    out.push_str(&format!("{}{}: >\n", pad, key));

    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && lead.len() + current.len() + 1 + word.len() > WRAP_WIDTH {
            out.push_str(&format!("{}{}\n", lead, current));
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push_str(&format!("{}{}\n", lead, current));
    }
}
