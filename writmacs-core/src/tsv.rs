//! Tab-separated asset files.
//!
//! Lines starting with `#` or holding no tab are skipped. The first field is
//! a comma-separated list of aliases, the second the value; further fields
//! are ignored. Backslash escapes are expanded in both.

use crate::error::{Result, WritError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\(?:u(.{4})|U(.{8})|(.))").expect("valid escape regex"));

/// Expand backslash escapes: `\t \b \n \r \f \\`, `\uXXXX`, `\UXXXXXXXX`,
/// and `\c` for any other character `c`
pub fn unescape(field: &str, line: usize) -> Result<String> {
    let mut out = String::with_capacity(field.len());
    let mut last = 0;

    for caps in ESCAPE.captures_iter(field) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        out.push_str(&field[last..whole.start]);
        last = whole.end;

        if let Some(hex) = caps.get(1).or_else(|| caps.get(2)) {
            out.push(codepoint(hex.as_str(), line)?);
        } else if let Some(c) = caps.get(3) {
            out.push_str(match c.as_str() {
                "t" => "\t",
                "b" => "\u{8}",
                "n" => "\n",
                "r" => "\r",
                "f" => "\u{c}",
                other => other,
            });
        }
    }

    out.push_str(&field[last..]);
    Ok(out)
}

fn codepoint(hex: &str, line: usize) -> Result<char> {
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| WritError::InvalidEscape {
            line,
            message: format!("'{}' is not a unicode codepoint", hex),
        })
}

/// Split an alias list on commas that are not escaped
fn split_aliases(field: &str) -> Vec<&str> {
    let mut aliases = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (ix, c) in field.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            aliases.push(&field[start..ix]);
            start = ix + 1;
        }
    }
    aliases.push(&field[start..]);
    aliases
}

/// Parse a whole file into an alias-to-value mapping; later lines win
pub fn parse_mapping(source: &str) -> Result<HashMap<String, String>> {
    let mut mapping = HashMap::new();

    for (ix, raw) in source.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.starts_with('#') || !line.contains('\t') {
            continue;
        }

        let mut fields = line.split('\t');
        let (Some(before), Some(after)) = (fields.next(), fields.next()) else {
            continue;
        };

        let value = unescape(after, ix + 1)?;
        for alias in split_aliases(before) {
            let alias = unescape(alias, ix + 1)?;
            if !alias.is_empty() {
                mapping.insert(alias, value.clone());
            }
        }
    }

    Ok(mapping)
}
