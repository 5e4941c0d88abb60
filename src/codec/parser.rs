// src/codec/parser.rs

//! Line-oriented parser for the manifest subset of YAML
//!
//! Accepted: block mappings with plain keys, block sequences of scalars,
//! one-line flow sequences of scalars, the empty tokens `[]` and `{}`,
//! plain/single-quoted/double-quoted scalars, and `|`, `|-`, `>`, `>-` block
//! scalars. Anything else is rejected with the offending line number.
//!
//! A plain scalar may continue on following lines indented deeper than its
//! key or dash; the lines join with single spaces, and blank lines between
//! them become line breaks.
//!
//! Folded (`>`) block scalars join their non-blank lines with single spaces
//! and carry no trailing newline; literal (`|`) block scalars follow YAML's
//! clip (`|`) and strip (`|-`) rules.

use super::value::{Mapping, Value};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// 1-based line number
    number: usize,
    /// Count of leading spaces
    indent: usize,
    /// Content after indentation, trailing whitespace removed
    text: &'a str,
    /// The full line as written
    raw: &'a str,
    /// Indentation contains a tab
    tabbed: bool,
}

impl<'a> Line<'a> {
    fn new(number: usize, raw: &'a str) -> Self {
        let after_spaces = raw.trim_start_matches(' ');
        let indent = raw.len() - after_spaces.len();
        let tabbed = after_spaces.starts_with('\t');
        Self {
            number,
            indent,
            text: after_spaces.trim(),
            raw,
            tabbed,
        }
    }

    /// Blank lines and full-line comments carry no content
    fn is_significant(&self) -> bool {
        !self.text.is_empty() && !self.text.starts_with('#')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockStyle {
    LiteralClip,
    LiteralStrip,
    Folded,
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

/// Parse a document into its top-level mapping
///
/// An empty document (or one holding only comments) is an empty mapping.
pub fn parse(input: &str) -> Result<Mapping> {
    let mut parser = Parser::new(input);

    parser.skip_insignificant();
    if let Some(line) = parser.peek() {
        if line.indent == 0 && line.text == "---" {
            parser.pos += 1;
        }
    }

    parser.skip_insignificant();
    let Some(first) = parser.peek() else {
        return Ok(Mapping::new());
    };
    if is_sequence_entry(first.text) {
        return Err(parse_error(first.number, "document must be a mapping"));
    }

    let map = parser.parse_mapping(first.indent)?;

    parser.skip_insignificant();
    if let Some(line) = parser.peek() {
        return Err(parse_error(line.number, "unexpected indentation"));
    }

    Ok(map)
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let lines = input
            .lines()
            .enumerate()
            .map(|(i, raw)| Line::new(i + 1, raw))
            .collect();
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    fn skip_insignificant(&mut self) {
        while let Some(line) = self.peek() {
            if line.is_significant() {
                break;
            }
            self.pos += 1;
        }
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Mapping> {
        let mut map = Mapping::new();

        loop {
            self.skip_insignificant();
            let Some(line) = self.peek() else {
                break;
            };
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(parse_error(line.number, "unexpected indentation"));
            }
            if line.tabbed {
                return Err(parse_error(line.number, "tabs are not allowed in indentation"));
            }
            if is_sequence_entry(line.text) {
                return Err(parse_error(line.number, "expected a mapping key, found a sequence entry"));
            }

            let (key, rest) = split_key(line)?;
            self.pos += 1;
            let value = self.parse_value(indent, rest, line.number)?;
            map.insert(key, value);
        }

        Ok(map)
    }

    /// Parse whatever follows `key:` on a line indented at `indent`
    fn parse_value(&mut self, indent: usize, rest: &str, number: usize) -> Result<Value> {
        if rest.is_empty() || rest.starts_with('#') {
            self.skip_insignificant();
            return match self.peek() {
                Some(next) if next.indent > indent => {
                    if is_sequence_entry(next.text) {
                        Ok(Value::List(self.parse_sequence(next.indent)?))
                    } else {
                        Ok(Value::Map(self.parse_mapping(next.indent)?))
                    }
                }
                // Compact form: sequence entries at the key's own indentation
                Some(next) if next.indent == indent && is_sequence_entry(next.text) => {
                    Ok(Value::List(self.parse_sequence(indent)?))
                }
                _ => Ok(Value::Null),
            };
        }

        if let Some(style) = block_style(rest, number)? {
            return Ok(Value::String(self.parse_block_scalar(indent, style)?));
        }

        self.parse_plain_or_inline(indent, rest, number)
    }

    /// Parse an inline value, folding in continuation lines of a plain scalar
    fn parse_plain_or_inline(&mut self, indent: usize, rest: &str, number: usize) -> Result<Value> {
        if starts_plain(rest) && strip_comment(rest) == rest {
            if let Some(text) = self.continue_plain(indent, rest) {
                return Ok(Value::String(text));
            }
        }
        parse_inline(rest, number)
    }

    /// Join lines indented past `indent` onto `first`
    ///
    /// Returns `None` when the next content line is not a continuation.
    /// Lines that read as keys or sequence entries are left for the caller,
    /// which rejects them.
    fn continue_plain(&mut self, indent: usize, first: &str) -> Option<String> {
        let mut text = first.to_string();
        let mut pos = self.pos;
        let mut breaks = 0;
        let mut continued = false;

        while let Some(line) = self.lines.get(pos) {
            if line.text.is_empty() {
                breaks += 1;
                pos += 1;
                continue;
            }
            if line.indent <= indent
                || line.tabbed
                || line.text.starts_with('#')
                || is_sequence_entry(line.text)
                || looks_like_mapping_entry(line.text)
            {
                break;
            }

            let content = strip_comment(line.text);
            if breaks == 0 {
                text.push(' ');
            } else {
                text.push_str(&"\n".repeat(breaks));
            }
            text.push_str(content);
            breaks = 0;
            continued = true;
            pos += 1;
            self.pos = pos;

            // A comment ends the scalar
            if content.len() != line.text.len() {
                break;
            }
        }

        continued.then_some(text)
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Vec<Value>> {
        let mut items = Vec::new();

        loop {
            self.skip_insignificant();
            let Some(line) = self.peek() else {
                break;
            };
            if line.indent > indent {
                return Err(parse_error(line.number, "unexpected indentation"));
            }
            if line.indent < indent || !is_sequence_entry(line.text) {
                break;
            }
            if line.tabbed {
                return Err(parse_error(line.number, "tabs are not allowed in indentation"));
            }

            let rest = line.text[1..].trim_start();
            self.pos += 1;

            if rest.is_empty() || rest.starts_with('#') {
                self.skip_insignificant();
                if let Some(next) = self.peek() {
                    if next.indent > indent {
                        return Err(parse_error(
                            next.number,
                            "collections inside sequences are not supported",
                        ));
                    }
                }
                items.push(Value::Null);
                continue;
            }

            if is_sequence_entry(rest) {
                return Err(parse_error(line.number, "nested block sequences are not supported"));
            }
            if rest.starts_with('|') || rest.starts_with('>') {
                return Err(parse_error(
                    line.number,
                    "block scalars inside sequences are not supported",
                ));
            }
            if looks_like_mapping_entry(rest) {
                return Err(parse_error(
                    line.number,
                    "mappings inside sequences are not supported",
                ));
            }

            items.push(self.parse_plain_or_inline(indent, rest, line.number)?);
        }

        Ok(items)
    }

    fn parse_block_scalar(&mut self, parent_indent: usize, style: BlockStyle) -> Result<String> {
        let mut body: Vec<&str> = Vec::new();
        let mut block_indent: Option<usize> = None;

        while let Some(line) = self.peek() {
            if line.text.is_empty() {
                body.push("");
                self.pos += 1;
                continue;
            }
            if line.indent <= parent_indent {
                break;
            }
            let indent = *block_indent.get_or_insert(line.indent);
            if line.indent < indent {
                return Err(parse_error(
                    line.number,
                    "block scalar line is less indented than its first line",
                ));
            }
            body.push(&line.raw[indent..]);
            self.pos += 1;
        }

        while body.last().is_some_and(|l| l.is_empty()) {
            body.pop();
        }

        let text = match style {
            BlockStyle::Folded => body
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            BlockStyle::LiteralClip | BlockStyle::LiteralStrip => {
                let mut text = body.join("\n");
                if style == BlockStyle::LiteralClip && !text.is_empty() {
                    text.push('\n');
                }
                text
            }
        };

        Ok(text)
    }
}

fn is_sequence_entry(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Whether `text` opens a plain scalar rather than a quoted or flow value
fn starts_plain(text: &str) -> bool {
    !text.is_empty()
        && !text.starts_with(['\'', '"', '[', '{', '&', '*', '!', '%', '@', '`', '|', '>', '#'])
        && !is_sequence_entry(text)
}

/// A plain item that reads as `key: value` or `key:`
fn looks_like_mapping_entry(text: &str) -> bool {
    if text.starts_with(['\'', '"', '[', '{']) {
        return false;
    }
    let content = strip_comment(text);
    content.contains(": ") || content.ends_with(':')
}

fn split_key(line: Line<'_>) -> Result<(String, &str)> {
    let text = line.text;
    let bytes = text.as_bytes();

    let colon = bytes
        .iter()
        .enumerate()
        .position(|(i, b)| *b == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' '))
        .ok_or_else(|| parse_error(line.number, "expected `key: value`"))?;

    let key = text[..colon].trim_end();
    if key.is_empty() {
        return Err(parse_error(line.number, "empty mapping key"));
    }
    if key.starts_with(['\'', '"', '[', '{', '&', '*', '!', '|', '>', '%', '@', '`', '?', '#']) {
        return Err(parse_error(line.number, format!("unsupported mapping key `{}`", key)));
    }

    Ok((key.to_string(), text[colon + 1..].trim()))
}

fn block_style(rest: &str, number: usize) -> Result<Option<BlockStyle>> {
    if !rest.starts_with(['|', '>']) {
        return Ok(None);
    }
    match strip_comment(rest) {
        "|" => Ok(Some(BlockStyle::LiteralClip)),
        "|-" => Ok(Some(BlockStyle::LiteralStrip)),
        ">" | ">-" => Ok(Some(BlockStyle::Folded)),
        other => Err(parse_error(
            number,
            format!("unsupported block scalar header `{}`", other),
        )),
    }
}

/// Remove a trailing ` #comment` from a plain scalar
fn strip_comment(text: &str) -> &str {
    match text.find(" #") {
        Some(idx) => text[..idx].trim_end(),
        None => text,
    }
}

/// Parse a value written on the same line as its key or sequence dash
fn parse_inline(text: &str, number: usize) -> Result<Value> {
    match text.chars().next() {
        Some('[') => parse_flow_sequence(text, number),
        Some('{') => {
            let inner = strip_comment(text);
            if inner.strip_prefix('{').and_then(|s| s.strip_suffix('}')).is_some_and(|s| s.trim().is_empty()) {
                Ok(Value::Map(Mapping::new()))
            } else {
                Err(parse_error(number, "flow mappings are not supported"))
            }
        }
        Some('\'') | Some('"') => {
            let (value, rest) = parse_quoted(text, number)?;
            let rest = rest.trim_start();
            if !rest.is_empty() && !rest.starts_with('#') {
                return Err(parse_error(number, "unexpected content after quoted scalar"));
            }
            Ok(Value::String(value))
        }
        Some('&') => Err(parse_error(number, "anchors are not supported")),
        Some('*') => Err(parse_error(number, "aliases are not supported")),
        Some('!') => Err(parse_error(number, "tags are not supported")),
        Some('%') | Some('@') | Some('`') => Err(parse_error(
            number,
            format!("plain scalars cannot start with `{}`", &text[..1]),
        )),
        _ => {
            if is_sequence_entry(text) {
                return Err(parse_error(number, "sequence entries are not allowed here"));
            }
            Ok(resolve_plain(strip_comment(text)))
        }
    }
}

/// Parse a quoted scalar at the start of `text`, returning it and the remainder
fn parse_quoted(text: &str, number: usize) -> Result<(String, &str)> {
    let mut chars = text.char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(parse_error(number, "expected a quoted scalar")),
    };
    let mut value = String::new();

    while let Some((idx, c)) = chars.next() {
        if quote == '\'' {
            if c == '\'' {
                if text[idx + 1..].starts_with('\'') {
                    chars.next();
                    value.push('\'');
                    continue;
                }
                return Ok((value, &text[idx + 1..]));
            }
            value.push(c);
            continue;
        }

        match c {
            '"' => return Ok((value, &text[idx + 1..])),
            '\\' => {
                let escaped = match chars.next() {
                    Some((_, e)) => e,
                    None => break,
                };
                match escaped {
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    '/' => value.push('/'),
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    'u' => {
                        let start = idx + 2;
                        let hex = text
                            .get(start..start + 4)
                            .ok_or_else(|| parse_error(number, "truncated \\u escape"))?;
                        let ch = u32::from_str_radix(hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| parse_error(number, format!("invalid \\u escape `{}`", hex)))?;
                        value.push(ch);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    other => {
                        return Err(parse_error(
                            number,
                            format!("unsupported escape `\\{}`", other),
                        ));
                    }
                }
            }
            _ => value.push(c),
        }
    }

    Err(parse_error(number, "unterminated quoted scalar"))
}

fn parse_flow_sequence(text: &str, number: usize) -> Result<Value> {
    let mut items = Vec::new();
    let mut rest = text[1..].trim_start();

    loop {
        if let Some(after) = rest.strip_prefix(']') {
            rest = after;
            break;
        }
        if rest.is_empty() {
            return Err(parse_error(number, "unterminated flow sequence"));
        }

        let item = if rest.starts_with(['\'', '"']) {
            let (value, after) = parse_quoted(rest, number)?;
            rest = after.trim_start();
            Value::String(value)
        } else {
            let end = rest
                .find([',', ']'])
                .ok_or_else(|| parse_error(number, "unterminated flow sequence"))?;
            let raw = rest[..end].trim();
            if raw.is_empty() {
                return Err(parse_error(number, "empty flow sequence entry"));
            }
            if raw.starts_with(['[', '{']) {
                return Err(parse_error(number, "nested flow collections are not supported"));
            }
            if raw.starts_with(['&', '*', '!', '%', '@', '`']) {
                return Err(parse_error(
                    number,
                    format!("unsupported flow sequence entry `{}`", raw),
                ));
            }
            rest = &rest[end..];
            resolve_plain(raw)
        };
        items.push(item);

        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
        } else if !rest.starts_with(']') {
            return Err(parse_error(number, "expected `,` or `]` in flow sequence"));
        }
    }

    let trailing = rest.trim_start();
    if !trailing.is_empty() && !trailing.starts_with('#') {
        return Err(parse_error(number, "unexpected content after flow sequence"));
    }

    Ok(Value::List(items))
}

/// Resolve an unquoted scalar to null, bool, number or string
pub(crate) fn resolve_plain(text: &str) -> Value {
    match text {
        "null" | "Null" | "NULL" | "~" => Value::Null,
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ if is_number(text) => Value::Number(text.to_string()),
        _ => Value::String(text.to_string()),
    }
}

fn is_number(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }

    let mut digits = 0;
    let mut dots = 0;
    for b in mantissa.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}
