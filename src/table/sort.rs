use std::cmp::Ordering;

use serde_json::Value;

use crate::utils;

use super::value_text;

/// Numeric sort key of a cell. Numbers are used as they arrived; text has
/// its first decimal comma turned into a point and is read as a leading
/// float. Anything unreadable sorts as 0.
pub fn sort_key(value: &Value) -> f64 {
    let key = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => utils::parse_float_prefix(&s.replacen(',', ".", 1)),
        other => utils::parse_float_prefix(&value_text(other).replacen(',', ".", 1)),
    };
    match key {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

pub fn compare_keys(a: f64, b: f64, ascending: bool) -> Ordering {
    let ordering = if ascending {
        a.partial_cmp(&b)
    } else {
        b.partial_cmp(&a)
    };
    ordering.unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comma_decimal_is_normalized() {
        assert_eq!(sort_key(&json!("3,5")), 3.5);
        assert_eq!(sort_key(&json!("1,5,7")), 1.5);
    }

    #[test]
    fn unreadable_text_sorts_as_zero() {
        assert_eq!(sort_key(&json!("abc")), 0.0);
        assert_eq!(sort_key(&json!(null)), 0.0);
        assert_eq!(sort_key(&json!(true)), 0.0);
    }

    #[test]
    fn numbers_keep_their_value() {
        assert_eq!(sort_key(&json!(0.8123)), 0.8123);
        assert_eq!(sort_key(&json!(12)), 12.0);
    }

    #[test]
    fn infinities_compare_equal() {
        assert_eq!(
            compare_keys(f64::INFINITY, f64::INFINITY, true),
            Ordering::Equal
        );
    }
}
