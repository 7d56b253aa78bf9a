//! Metadata filter types for search queries.
//!
//! Filters arrive as MongoDB-style JSON documents:
//!
//! ```json
//! { "category": "news", "year": { "$gte": 2020 }, "$or": [ { "lang": "en" }, { "lang": "it" } ] }
//! ```
//!
//! They are parsed once into a [`MetadataFilter`] tree. Parsing never fails:
//! unrecognized operator keys become [`FilterOperator::Unknown`] and are ignored
//! at evaluation time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A boolean filter expression over record metadata.
///
/// All parts are AND-ed: every `and` sub-filter, the `or` clause (when present)
/// and every field condition must pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    /// `$and` sub-filters. Empty means vacuously true.
    pub and: Vec<MetadataFilter>,
    /// `$or` sub-filters. `Some(vec![])` never matches.
    pub or: Option<Vec<MetadataFilter>>,
    /// Field conditions keyed by dot-path.
    pub conditions: Vec<(String, Condition)>,
}

/// The condition applied to one field path.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Implicit equality against a literal value.
    Equals(Value),
    /// Operator object; every operator must pass.
    Operators(Vec<(FilterOperator, Value)>),
}

/// Operator keys recognized inside a condition object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Exists,
    Contains,
    StartsWith,
    EndsWith,
    /// Unrecognized key, kept for round-tripping and ignored by the evaluator.
    Unknown(String),
}

impl FilterOperator {
    /// Parse an operator key such as `"$gte"`.
    pub fn parse(key: &str) -> Self {
        match key {
            "$eq" => FilterOperator::Eq,
            "$ne" => FilterOperator::Ne,
            "$gt" => FilterOperator::Gt,
            "$gte" => FilterOperator::Gte,
            "$lt" => FilterOperator::Lt,
            "$lte" => FilterOperator::Lte,
            "$in" => FilterOperator::In,
            "$nin" => FilterOperator::Nin,
            "$exists" => FilterOperator::Exists,
            "$contains" => FilterOperator::Contains,
            "$startsWith" => FilterOperator::StartsWith,
            "$endsWith" => FilterOperator::EndsWith,
            other => FilterOperator::Unknown(other.to_string()),
        }
    }

    /// The operator's JSON key.
    pub fn as_str(&self) -> &str {
        match self {
            FilterOperator::Eq => "$eq",
            FilterOperator::Ne => "$ne",
            FilterOperator::Gt => "$gt",
            FilterOperator::Gte => "$gte",
            FilterOperator::Lt => "$lt",
            FilterOperator::Lte => "$lte",
            FilterOperator::In => "$in",
            FilterOperator::Nin => "$nin",
            FilterOperator::Exists => "$exists",
            FilterOperator::Contains => "$contains",
            FilterOperator::StartsWith => "$startsWith",
            FilterOperator::EndsWith => "$endsWith",
            FilterOperator::Unknown(key) => key,
        }
    }
}

impl MetadataFilter {
    /// A filter that matches every record.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Parse a JSON filter document. Non-object values yield a match-all filter.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let mut filter = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "$and" => {
                    if let Value::Array(items) = value {
                        filter.and = items.iter().map(Self::from_value).collect();
                    }
                }
                "$or" => {
                    if let Value::Array(items) = value {
                        filter.or = Some(items.iter().map(Self::from_value).collect());
                    }
                }
                field => {
                    filter
                        .conditions
                        .push((field.to_string(), Condition::from_value(value)));
                }
            }
        }
        filter
    }

    /// Convert back into the JSON filter document.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if !self.and.is_empty() {
            map.insert(
                "$and".to_string(),
                Value::Array(self.and.iter().map(Self::to_value).collect()),
            );
        }
        if let Some(ref or) = self.or {
            map.insert(
                "$or".to_string(),
                Value::Array(or.iter().map(Self::to_value).collect()),
            );
        }
        for (field, cond) in &self.conditions {
            map.insert(field.clone(), cond.to_value());
        }
        Value::Object(map)
    }

    /// Builder: add an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.conditions.push((field.into(), Condition::Equals(value)));
        self
    }

    /// Builder: add a single-operator condition.
    pub fn op(mut self, field: impl Into<String>, op: FilterOperator, operand: Value) -> Self {
        self.conditions
            .push((field.into(), Condition::Operators(vec![(op, operand)])));
        self
    }
}

impl Condition {
    /// An object with at least one `$`-prefixed key is an operator object;
    /// anything else is a literal for implicit equality.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) if map.keys().any(|k| k.starts_with('$')) => Condition::Operators(
                map.iter()
                    .map(|(k, v)| (FilterOperator::parse(k), v.clone()))
                    .collect(),
            ),
            other => Condition::Equals(other.clone()),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Condition::Equals(v) => v.clone(),
            Condition::Operators(ops) => Value::Object(
                ops.iter()
                    .map(|(op, v)| (op.as_str().to_string(), v.clone()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for MetadataFilter {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl<'de> Deserialize<'de> for MetadataFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Serialize for MetadataFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_literal_and_operators() {
        let f = MetadataFilter::from_value(&json!({
            "color": "red",
            "year": { "$gte": 2020, "$lt": 2025 }
        }));
        assert_eq!(f.conditions.len(), 2);
        let year = f.conditions.iter().find(|(k, _)| k == "year").unwrap();
        match &year.1 {
            Condition::Operators(ops) => {
                assert_eq!(ops.len(), 2);
                assert!(ops.iter().any(|(op, _)| *op == FilterOperator::Gte));
                assert!(ops.iter().any(|(op, _)| *op == FilterOperator::Lt));
            }
            other => panic!("expected operators, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_object_is_literal() {
        let cond = Condition::from_value(&json!({ "b": 5 }));
        assert_eq!(cond, Condition::Equals(json!({ "b": 5 })));
    }

    #[test]
    fn test_unknown_operator_kept() {
        let cond = Condition::from_value(&json!({ "$regex": "^a" }));
        assert_eq!(
            cond,
            Condition::Operators(vec![(FilterOperator::Unknown("$regex".into()), json!("^a"))])
        );
    }

    #[test]
    fn test_empty_or_is_some_empty() {
        let f = MetadataFilter::from_value(&json!({ "$or": [] }));
        assert_eq!(f.or, Some(vec![]));
        let f = MetadataFilter::from_value(&json!({}));
        assert_eq!(f.or, None);
    }

    #[test]
    fn test_non_array_combinators_ignored() {
        let f = MetadataFilter::from_value(&json!({ "$and": 1, "$or": "x" }));
        assert!(f.and.is_empty());
        assert!(f.or.is_none());
        assert!(f.conditions.is_empty());
    }

    #[test]
    fn test_serde_round_trip_preserves_shape() {
        let doc = json!({
            "$and": [ { "a": 1 } ],
            "$or": [ { "b": { "$in": [1, 2] } } ],
            "c.d": { "$exists": true }
        });
        let f: MetadataFilter = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(serde_json::to_value(&f).unwrap(), doc);
    }
}
