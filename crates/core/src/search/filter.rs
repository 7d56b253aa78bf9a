//! Metadata filtering engine for search queries.
//!
//! Evaluates [`MetadataFilter`] trees against record metadata. Field paths use
//! dot notation (`"a.b.c"`) and resolve to *absent* as soon as a segment is
//! missing or an intermediate value is not an object. Absent, `null` and a
//! value of the wrong type are kept distinct throughout.
//!
//! Evaluation is permissive: unknown operators are ignored and comparisons
//! between incompatible types evaluate to `false`. Nothing here returns an error.

use crate::document::Metadata;
use crate::filter_types::{Condition, FilterOperator, MetadataFilter};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::cmp::Ordering;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Check if a record's metadata matches the given filter.
///
/// `$and` sub-filters, the `$or` clause and every field condition are AND-ed.
/// An empty `$and` is vacuously true; an empty `$or` never matches.
pub fn matches_filter(metadata: Option<&Metadata>, filter: &MetadataFilter) -> bool {
    if !filter.and.iter().all(|sub| matches_filter(metadata, sub)) {
        return false;
    }
    if let Some(ref or) = filter.or {
        // Empty `$or` is a deliberate non-match, unlike empty `$and`.
        if !or.iter().any(|sub| matches_filter(metadata, sub)) {
            return false;
        }
    }
    filter
        .conditions
        .iter()
        .all(|(path, cond)| evaluate_condition(resolve_path(metadata, path), cond))
}

/// Resolve a dot-path against metadata. `None` means absent.
pub fn resolve_path<'a>(metadata: Option<&'a Metadata>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = metadata?.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

fn evaluate_condition(field: Option<&Value>, cond: &Condition) -> bool {
    match cond {
        Condition::Equals(expected) => field.is_some_and(|v| values_equal(v, expected)),
        Condition::Operators(ops) => ops
            .iter()
            .all(|(op, operand)| evaluate_operator(field, op, operand)),
    }
}

fn evaluate_operator(field: Option<&Value>, op: &FilterOperator, operand: &Value) -> bool {
    match op {
        FilterOperator::Eq => field.is_some_and(|v| values_equal(v, operand)),
        FilterOperator::Ne => !field.is_some_and(|v| values_equal(v, operand)),
        FilterOperator::Gt => compare(field, operand).is_some_and(|o| o == Ordering::Greater),
        FilterOperator::Gte => compare(field, operand).is_some_and(|o| o != Ordering::Less),
        FilterOperator::Lt => compare(field, operand).is_some_and(|o| o == Ordering::Less),
        FilterOperator::Lte => compare(field, operand).is_some_and(|o| o != Ordering::Greater),
        FilterOperator::In => match operand {
            Value::Array(items) => field.is_some_and(|v| items.iter().any(|i| values_equal(v, i))),
            _ => false,
        },
        FilterOperator::Nin => match operand {
            Value::Array(items) => !field.is_some_and(|v| items.iter().any(|i| values_equal(v, i))),
            _ => false,
        },
        FilterOperator::Exists => match operand {
            Value::Bool(want) => field.is_some() == *want,
            _ => false,
        },
        FilterOperator::Contains => string_test(field, operand, |h, n| h.contains(n)),
        FilterOperator::StartsWith => string_test(field, operand, |h, n| h.starts_with(n)),
        FilterOperator::EndsWith => string_test(field, operand, |h, n| h.ends_with(n)),
        FilterOperator::Unknown(_) => true,
    }
}

/// Strict equality without type coercion. Numbers compare by value so that
/// `5` and `5.0` are equal; arrays and objects compare element-wise.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, xv)| ym.get(k).is_some_and(|yv| values_equal(xv, yv)))
        }
        _ => a == b,
    }
}

/// Ordering for `$gt`/`$gte`/`$lt`/`$lte`. Numbers compare numerically;
/// strings compare as timestamps when both parse as dates, otherwise
/// lexicographically. Any other pairing (or an absent field) is incomparable.
fn compare(field: Option<&Value>, operand: &Value) -> Option<Ordering> {
    match (field?, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(ta), Some(tb)) => Some(ta.cmp(&tb)),
            _ => Some(a.as_str().cmp(b.as_str())),
        },
        _ => None,
    }
}

/// Parse a date or datetime string into milliseconds since the Unix epoch (UTC).
fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn string_test(field: Option<&Value>, operand: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (field, operand) {
        (Some(Value::String(haystack)), Value::String(needle)) => {
            test(&haystack.to_lowercase(), &needle.to_lowercase())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::metadata_from_value;
    use serde_json::json;

    fn check(meta: Value, filter: Value) -> bool {
        let meta = metadata_from_value(meta);
        matches_filter(meta.as_ref(), &MetadataFilter::from_value(&filter))
    }

    #[test]
    fn test_eq_string() {
        assert!(check(json!({ "color": "red" }), json!({ "color": "red" })));
        assert!(!check(json!({ "color": "blue" }), json!({ "color": "red" })));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(check(json!({ "any": "value" }), json!({})));
        assert!(matches_filter(None, &MetadataFilter::match_all()));
    }

    #[test]
    fn test_dot_path_nested() {
        assert!(check(json!({ "a": { "b": 5 } }), json!({ "a.b": 5 })));
    }

    #[test]
    fn test_dot_path_no_coercion() {
        assert!(!check(json!({ "a": { "b": "5" } }), json!({ "a.b": 5 })));
    }

    #[test]
    fn test_dot_path_intermediate_not_object() {
        assert!(!check(json!({ "a": 5 }), json!({ "a.b": 5 })));
    }

    #[test]
    fn test_integer_equals_float() {
        assert!(check(json!({ "x": 10 }), json!({ "x": 10.0 })));
    }

    #[test]
    fn test_missing_field_returns_false() {
        assert!(!check(json!({}), json!({ "missing": "anything" })));
    }

    #[test]
    fn test_null_metadata() {
        assert!(!matches_filter(None, &MetadataFilter::from_value(&json!({ "a": 1 }))));
        let exists_false = MetadataFilter::from_value(&json!({ "a": { "$exists": false } }));
        assert!(matches_filter(None, &exists_false));
    }

    #[test]
    fn test_null_value_is_present() {
        assert!(check(json!({ "a": null }), json!({ "a": { "$exists": true } })));
        assert!(check(json!({ "a": null }), json!({ "a": null })));
        assert!(!check(json!({}), json!({ "a": null })));
    }

    #[test]
    fn test_ne_operator() {
        assert!(check(json!({ "status": "active" }), json!({ "status": { "$ne": "deleted" } })));
        assert!(!check(json!({ "status": "deleted" }), json!({ "status": { "$ne": "deleted" } })));
        assert!(check(json!({}), json!({ "status": { "$ne": "deleted" } })));
    }

    #[test]
    fn test_numeric_comparisons() {
        let meta = json!({ "age": 25 });
        assert!(check(meta.clone(), json!({ "age": { "$gt": 18 } })));
        assert!(check(meta.clone(), json!({ "age": { "$gte": 25 } })));
        assert!(check(meta.clone(), json!({ "age": { "$lte": 25 } })));
        assert!(!check(meta.clone(), json!({ "age": { "$lt": 25 } })));
        assert!(check(meta, json!({ "age": { "$gt": 18, "$lt": 30 } })));
    }

    #[test]
    fn test_comparison_absent_field_fails() {
        assert!(!check(json!({}), json!({ "age": { "$lt": 100 } })));
    }

    #[test]
    fn test_comparison_type_mismatch_fails() {
        assert!(!check(json!({ "x": "hello" }), json!({ "x": { "$gt": 10 } })));
        assert!(!check(json!({ "x": 10 }), json!({ "x": { "$gt": "5" } })));
        assert!(!check(json!({ "x": true }), json!({ "x": { "$lt": 10 } })));
    }

    #[test]
    fn test_date_comparison() {
        let meta = json!({ "published": "2024-03-15T10:00:00Z" });
        assert!(check(meta.clone(), json!({ "published": { "$gte": "2024-01-01" } })));
        assert!(!check(meta.clone(), json!({ "published": { "$lt": "2024-03-15" } })));
        assert!(check(meta, json!({ "published": { "$lt": "2024-03-15 12:00:00" } })));
    }

    #[test]
    fn test_date_comparison_offset_aware() {
        // 10:00+02:00 is 08:00Z
        let meta = json!({ "t": "2024-01-01T10:00:00+02:00" });
        assert!(check(meta, json!({ "t": { "$lt": "2024-01-01T09:00:00Z" } })));
    }

    #[test]
    fn test_lexicographic_fallback() {
        assert!(check(json!({ "name": "bravo" }), json!({ "name": { "$gt": "alpha" } })));
        assert!(!check(json!({ "name": "bravo" }), json!({ "name": { "$gt": "charlie" } })));
    }

    #[test]
    fn test_in_and_nin() {
        let meta = json!({ "lang": "it" });
        assert!(check(meta.clone(), json!({ "lang": { "$in": ["en", "it"] } })));
        assert!(!check(meta.clone(), json!({ "lang": { "$in": ["en", "fr"] } })));
        assert!(check(meta.clone(), json!({ "lang": { "$nin": ["en", "fr"] } })));
        assert!(!check(meta, json!({ "lang": { "$nin": ["it"] } })));
    }

    #[test]
    fn test_in_non_array_operand_fails() {
        assert!(!check(json!({ "lang": "it" }), json!({ "lang": { "$in": "it" } })));
        assert!(!check(json!({ "lang": "it" }), json!({ "lang": { "$nin": "en" } })));
    }

    #[test]
    fn test_in_absent_field() {
        assert!(!check(json!({}), json!({ "lang": { "$in": ["en"] } })));
        assert!(check(json!({}), json!({ "lang": { "$nin": ["en"] } })));
    }

    #[test]
    fn test_exists() {
        assert!(check(json!({ "a": 1 }), json!({ "a": { "$exists": true } })));
        assert!(!check(json!({ "a": 1 }), json!({ "a": { "$exists": false } })));
        assert!(check(json!({}), json!({ "a": { "$exists": false } })));
        assert!(!check(json!({ "a": 1 }), json!({ "a": { "$exists": "yes" } })));
    }

    #[test]
    fn test_string_operators_case_insensitive() {
        let meta = json!({ "title": "The Quick Brown Fox" });
        assert!(check(meta.clone(), json!({ "title": { "$contains": "quick" } })));
        assert!(check(meta.clone(), json!({ "title": { "$startsWith": "the" } })));
        assert!(check(meta.clone(), json!({ "title": { "$endsWith": "FOX" } })));
        assert!(!check(meta, json!({ "title": { "$contains": "dog" } })));
    }

    #[test]
    fn test_string_operators_require_strings() {
        assert!(!check(json!({ "n": 123 }), json!({ "n": { "$contains": "2" } })));
        assert!(!check(json!({ "n": "123" }), json!({ "n": { "$contains": 2 } })));
    }

    #[test]
    fn test_unknown_operator_ignored() {
        assert!(check(json!({ "a": 1 }), json!({ "a": { "$regex": "^x" } })));
        assert!(!check(json!({ "a": 1 }), json!({ "a": { "$regex": "^x", "$eq": 2 } })));
    }

    #[test]
    fn test_and_combinator() {
        let meta = json!({ "a": 1, "b": 2 });
        assert!(check(meta.clone(), json!({ "$and": [{ "a": 1 }, { "b": 2 }] })));
        assert!(!check(meta.clone(), json!({ "$and": [{ "a": 1 }, { "b": 3 }] })));
        assert!(check(meta, json!({ "$and": [] })));
    }

    #[test]
    fn test_or_combinator() {
        let meta = json!({ "lang": "en" });
        assert!(check(meta.clone(), json!({ "$or": [{ "lang": "it" }, { "lang": "en" }] })));
        assert!(!check(meta, json!({ "$or": [{ "lang": "it" }, { "lang": "fr" }] })));
    }

    #[test]
    fn test_empty_or_matches_nothing() {
        // Quirk: empty `$or` is a non-match even though empty `$and` is vacuously true.
        assert!(!check(json!({ "a": 1 }), json!({ "$or": [] })));
        assert!(!matches_filter(None, &MetadataFilter::from_value(&json!({ "$or": [] }))));
    }

    #[test]
    fn test_combinators_and_fields_are_anded() {
        let filter = json!({
            "kind": "doc",
            "$or": [{ "lang": "en" }, { "lang": "it" }],
            "$and": [{ "year": { "$gte": 2020 } }]
        });
        assert!(check(json!({ "kind": "doc", "lang": "it", "year": 2021 }), filter.clone()));
        assert!(!check(json!({ "kind": "img", "lang": "it", "year": 2021 }), filter.clone()));
        assert!(!check(json!({ "kind": "doc", "lang": "de", "year": 2021 }), filter.clone()));
        assert!(!check(json!({ "kind": "doc", "lang": "en", "year": 2019 }), filter));
    }

    #[test]
    fn test_literal_array_and_object_equality() {
        assert!(check(json!({ "tags": ["a", "b"] }), json!({ "tags": ["a", "b"] })));
        assert!(!check(json!({ "tags": ["a", "b"] }), json!({ "tags": ["b", "a"] })));
        assert!(check(json!({ "p": { "x": 1, "y": 2.0 } }), json!({ "p": { "x": 1.0, "y": 2 } })));
    }

    #[test]
    fn test_resolve_path_three_levels() {
        let meta = metadata_from_value(json!({ "a": { "b": { "c": "deep" } } }));
        assert_eq!(resolve_path(meta.as_ref(), "a.b.c"), Some(&json!("deep")));
        assert_eq!(resolve_path(meta.as_ref(), "a.x.c"), None);
        assert_eq!(resolve_path(None, "a"), None);
    }
}
