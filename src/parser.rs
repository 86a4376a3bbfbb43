use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::Error;
use crate::model::Entry;

/// Parse dotenv entries from UTF-8 text.
///
/// Total over any input: statements that do not match the grammar are
/// skipped, so the worst case is an empty entry list.
pub fn parse_str(input: &str) -> Vec<Entry> {
    parse_str_with_source(input, None)
}

/// Parse dotenv entries from UTF-8 bytes.
pub fn parse_bytes(input: &[u8]) -> Result<Vec<Entry>, Error> {
    let text = std::str::from_utf8(input)?;
    Ok(parse_str(text))
}

/// Parse dotenv entries from a buffered reader.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<Vec<Entry>, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    parse_bytes(&buf)
}

pub(crate) fn parse_str_with_source(input: &str, source: Option<&Path>) -> Vec<Entry> {
    let normalized = normalize_newlines(input);
    let input = normalized.as_ref();

    let mut entries: Vec<Entry> = Vec::new();
    let mut by_key = HashMap::<String, usize>::new();

    let mut offset = 0usize;
    let mut line_num = 1u32;

    while offset < input.len() {
        let (parsed, next_offset) = scan_statement(input, offset, line_num, source);
        line_num += count_newlines(&input.as_bytes()[offset..next_offset]);
        offset = next_offset;

        let Some(entry) = parsed else {
            continue;
        };

        // Last write wins, first position kept.
        if let Some(existing_idx) = by_key.get(&entry.key).copied() {
            entries[existing_idx] = entry;
        } else {
            by_key.insert(entry.key.clone(), entries.len());
            entries.push(entry);
        }
    }

    entries
}

/// Attempt to read one `KEY=VALUE` statement starting at a line boundary.
///
/// Returns the entry (if the line matched the grammar) and the offset of the
/// next statement. A non-matching line consumes exactly itself; a quoted
/// value may consume the following lines up to its closing quote.
fn scan_statement(
    input: &str,
    offset: usize,
    line_num: u32,
    source: Option<&Path>,
) -> (Option<Entry>, usize) {
    let bytes = input.as_bytes();
    let line_end = find_line_end(bytes, offset);
    let after_line = advance_past_newline(bytes, line_end);

    let mut cursor = skip_inline_ws(bytes, offset, line_end);
    if cursor == line_end || bytes[cursor] == b'#' {
        return (None, after_line);
    }

    cursor = strip_export_prefix(bytes, cursor, line_end);

    let key_start = cursor;
    while cursor < line_end && is_key_byte(bytes[cursor]) {
        cursor += 1;
    }
    if cursor == key_start {
        return (None, after_line);
    }
    let key = &input[key_start..cursor];

    // Separator: `:` must follow the key directly; `=` tolerates whitespace.
    let value_region = if cursor < line_end && bytes[cursor] == b':' {
        let after_colon = cursor + 1;
        if after_colon < line_end && !is_inline_ws(bytes[after_colon]) {
            return (None, after_line);
        }
        after_colon
    } else {
        let sep = skip_inline_ws(bytes, cursor, line_end);
        if sep == line_end || bytes[sep] != b'=' {
            return (None, after_line);
        }
        sep + 1
    };

    let (raw, statement_end) = scan_value(input, value_region, line_end);
    let entry = Entry {
        key: key.to_owned(),
        value: resolve_value(raw),
        source: source.map(Path::to_path_buf),
        line: line_num,
    };
    (Some(entry), advance_past_newline(bytes, statement_end))
}

/// Capture the raw value span starting in `value_region..line_end`.
///
/// A value whose first non-blank character is a quote is read as a quoted
/// span, possibly across newlines, provided the closing quote's line ends in
/// whitespace or a comment. Anything else is an unquoted run on the current
/// line, cut at the first `#`.
fn scan_value(input: &str, value_region: usize, line_end: usize) -> (&str, usize) {
    let bytes = input.as_bytes();
    let vstart = skip_inline_ws(bytes, value_region, line_end);
    if vstart == line_end {
        return ("", line_end);
    }

    let quote = bytes[vstart];
    if matches!(quote, b'\'' | b'"' | b'`')
        && let Some(close_idx) = find_closing_quote(bytes, vstart + 1, quote)
    {
        let close_line_end = find_line_end(bytes, close_idx + 1);
        let tail = input[close_idx + 1..close_line_end].trim_start();
        if tail.is_empty() || tail.starts_with('#') {
            return (&input[vstart..=close_idx], close_line_end);
        }
    }

    let unquoted = &input[value_region..line_end];
    let cut = unquoted.find('#').unwrap_or(unquoted.len());
    (&unquoted[..cut], line_end)
}

/// Resolve a raw captured value: trim, strip matching boundary quotes, and
/// expand `\n`/`\r` when the value opened with a double quote.
fn resolve_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();

    let double_quoted = bytes.first() == Some(&b'"');
    let unwrapped = if bytes.len() >= 2
        && bytes[0] == bytes[bytes.len() - 1]
        && matches!(bytes[0], b'\'' | b'"' | b'`')
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    if double_quoted {
        unwrapped.replace("\\n", "\n").replace("\\r", "\r")
    } else {
        unwrapped.to_owned()
    }
}

/// Find the matching closing quote, treating any backslash-preceded quote as
/// escaped. Returns `None` when the span never closes.
fn find_closing_quote(bytes: &[u8], mut idx: usize, quote: u8) -> Option<usize> {
    while idx < bytes.len() {
        if bytes[idx] == quote && bytes[idx - 1] != b'\\' {
            return Some(idx);
        }
        idx += 1;
    }
    None
}

/// Drop a leading `export ` when a key follows it; otherwise `export` itself
/// is the key candidate (so `export = v` assigns the key `export`).
fn strip_export_prefix(bytes: &[u8], cursor: usize, line_end: usize) -> usize {
    let rest = &bytes[cursor..line_end];
    if !rest.starts_with(b"export") {
        return cursor;
    }

    let after_word = cursor + b"export".len();
    if after_word >= line_end || !is_inline_ws(bytes[after_word]) {
        return cursor;
    }

    let key_start = skip_inline_ws(bytes, after_word, line_end);
    if key_start < line_end && is_key_byte(bytes[key_start]) {
        key_start
    } else {
        cursor
    }
}

fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            out.push('\n');
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            continue;
        }
        out.push(ch);
    }

    Cow::Owned(out)
}

fn find_line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map(|pos| from + pos)
        .unwrap_or(bytes.len())
}

fn advance_past_newline(bytes: &[u8], idx: usize) -> usize {
    if idx < bytes.len() && bytes[idx] == b'\n' {
        idx + 1
    } else {
        idx
    }
}

fn skip_inline_ws(bytes: &[u8], mut idx: usize, limit: usize) -> usize {
    while idx < limit && is_inline_ws(bytes[idx]) {
        idx += 1;
    }
    idx
}

fn is_inline_ws(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

fn is_key_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.' || byte == b'-'
}

fn count_newlines(bytes: &[u8]) -> u32 {
    bytes.iter().filter(|&&byte| byte == b'\n').count() as u32
}
