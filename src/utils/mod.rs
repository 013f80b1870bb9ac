use std::collections::HashSet;

use regex::Regex;

use crate::form::sample::DivisionType;

/// Parses a whole field value the way an `<input type="number">` value is
/// coerced: surrounding whitespace is ignored, the rest must be a complete
/// decimal literal.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Longest-prefix float parse: leading whitespace is skipped and trailing
/// garbage is ignored. `None` when no digits lead the text.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0usize;

    if end < len && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let mut digits = 0usize;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < len && bytes[end] == b'.' {
        let mut j = end + 1;
        let mut frac = 0usize;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
            frac += 1;
        }
        if digits > 0 || frac > 0 {
            end = j;
            digits += frac;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if j < len && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Formats a number the way it shows up in rendered text: integral values
/// carry no fractional part, and magnitudes outside [1e-6, 1e21) switch to
/// exponent form with a signed exponent (`1e-7`, `1.5e+21`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{value:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    format!("{value}")
}

pub fn parse_ids_csv(value: &str) -> Result<Vec<String>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("ids list is empty".to_string());
    }
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_string()) {
            out.push(item.to_string());
        }
    }
    if out.is_empty() {
        return Err("ids list is empty".to_string());
    }
    Ok(out)
}

/// Parses `LABEL`, `LABEL=dec` or `LABEL=qua`.
pub fn parse_item_spec(value: &str) -> Result<(String, Option<DivisionType>), String> {
    let re = Regex::new(r"^\s*([^=]+?)\s*(?:=\s*(\S+)\s*)?$")
        .map_err(|e| format!("failed to build item pattern: {e}"))?;
    let caps = re
        .captures(value)
        .ok_or_else(|| "expected LABEL or LABEL=dec|qua".to_string())?;
    let label = caps
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    if label.is_empty() {
        return Err("item label is empty".to_string());
    }
    let division = match caps.get(2) {
        Some(m) => Some(
            DivisionType::parse(m.as_str())
                .ok_or_else(|| format!("unknown division type '{}'", m.as_str()))?,
        ),
        None => None,
    };
    Ok((label, division))
}

/// Parses `COLUMN`, `COLUMN:asc` or `COLUMN:desc`; ascending when omitted.
pub fn parse_sort_spec(value: &str) -> Result<(String, bool), String> {
    let re = Regex::new(r"(?i)^\s*([^:]+?)\s*(?::\s*(asc|desc)\s*)?$")
        .map_err(|e| format!("failed to build sort pattern: {e}"))?;
    let caps = re
        .captures(value)
        .ok_or_else(|| "expected COLUMN[:asc|desc]".to_string())?;
    let column = caps
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let ascending = caps
        .get(2)
        .map(|m| !m.as_str().eq_ignore_ascii_case("desc"))
        .unwrap_or(true);
    Ok((column, ascending))
}

pub fn pattern_word_ending(count: usize) -> &'static str {
    let last_digit = count % 10;
    let last_two_digits = count % 100;
    if last_digit == 1 && last_two_digits != 11 {
        "шаблон"
    } else if (2..=4).contains(&last_digit) && !(12..=14).contains(&last_two_digits) {
        "шаблона"
    } else {
        "шаблонов"
    }
}
