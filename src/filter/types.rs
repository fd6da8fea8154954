use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::FilterError;

/// One `ORDER BY` term as supplied by the client:
/// `{"field": "last_name", "ascending": false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub field: String,
    /// Omitted means no direction keyword (database default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascending: Option<bool>,
}

impl OrderSpec {
    pub fn new(field: impl Into<String>, ascending: Option<bool>) -> Self {
        Self { field: field.into(), ascending }
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.ascending.map(|asc| if asc { SortDirection::Asc } else { SortDirection::Desc })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Equality predicate for `GET /<table>/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub value: Value,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        let column = column.into();
        if column.trim().is_empty() {
            return Err(FilterError::InvalidFilter("column cannot be empty".to_string()));
        }
        Ok(Self { column, value: value.into() })
    }
}

/// One `SET field = ?` pair of an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

impl FieldUpdate {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into() }
    }

    /// Parse the `updates` member of a request body.
    pub fn parse_list(updates: Option<&Value>) -> Result<Vec<FieldUpdate>, FilterError> {
        match updates {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(_)) => Ok(serde_json::from_value(updates.cloned().unwrap_or_default())?),
            Some(Value::Object(obj)) => {
                // Shorthand: { "first_name": "x", "last_name": "y" }
                Ok(obj.iter().map(|(k, v)| FieldUpdate::new(k.clone(), v.clone())).collect())
            }
            Some(other) => Err(FilterError::InvalidUpdates(format!(
                "expected an array of {{field, value}}, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_direction_follows_ascending_flag() {
        assert_eq!(OrderSpec::new("id", Some(true)).direction(), Some(SortDirection::Asc));
        assert_eq!(OrderSpec::new("id", Some(false)).direction(), Some(SortDirection::Desc));
        assert_eq!(OrderSpec::new("id", None).direction(), None);
    }

    #[test]
    fn parses_update_arrays_and_shorthand() {
        let body = json!([{ "field": "first_name", "value": "zombified" }, { "field": "age", "value": 3 }]);
        let updates = FieldUpdate::parse_list(Some(&body)).unwrap();
        assert_eq!(updates, vec![FieldUpdate::new("first_name", "zombified"), FieldUpdate::new("age", 3)]);

        let body = json!({ "last_name": "grumpy" });
        let updates = FieldUpdate::parse_list(Some(&body)).unwrap();
        assert_eq!(updates, vec![FieldUpdate::new("last_name", "grumpy")]);

        assert!(FieldUpdate::parse_list(None).unwrap().is_empty());
        assert!(FieldUpdate::parse_list(Some(&json!("nope"))).is_err());
        assert!(FieldUpdate::parse_list(Some(&json!([{ "value": 1 }]))).is_err());
    }

    #[test]
    fn column_filter_requires_column() {
        assert!(ColumnFilter::new("  ", "x").is_err());
        let f = ColumnFilter::new("email", "a@b.c").unwrap();
        assert_eq!(f.value, json!("a@b.c"));
    }
}
