use serde_json::Value;

use super::error::FilterError;
use super::types::OrderSpec;

pub struct FilterOrder;

impl FilterOrder {
    /// Parse the raw `orders` query values. Each entry is one of:
    /// - a JSON object `{"field": "name", "ascending": true}`
    /// - a JSON array of such objects
    /// - a plain string like `"created_at desc, name asc"`
    ///
    /// An empty result is an error; ordering by nothing is never intended.
    pub fn parse(raw: &[String]) -> Result<Vec<OrderSpec>, FilterError> {
        let mut out = Vec::new();
        for entry in raw {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                let value: Value = serde_json::from_str(trimmed)?;
                out.extend(Self::from_value(&value)?);
            } else {
                out.extend(Self::parse_order_string(trimmed)?);
            }
        }

        if out.is_empty() {
            return Err(FilterError::EmptyOrder);
        }
        Ok(out)
    }

    pub fn from_value(value: &Value) -> Result<Vec<OrderSpec>, FilterError> {
        match value {
            Value::Object(_) => Ok(vec![serde_json::from_value(value.clone())?]),
            Value::Array(arr) => {
                let mut out = Vec::with_capacity(arr.len());
                for v in arr {
                    out.extend(Self::from_value(v)?);
                }
                Ok(out)
            }
            Value::String(s) => Self::parse_order_string(s),
            other => Err(FilterError::InvalidOrder(format!("unexpected order value {}", other))),
        }
    }

    fn parse_order_string(s: &str) -> Result<Vec<OrderSpec>, FilterError> {
        // split on commas, then each token into column and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            let field = it.next().unwrap_or_default();
            let ascending = match it.next() {
                None => None,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => Some(true),
                Some(dir) if dir.eq_ignore_ascii_case("desc") => Some(false),
                Some(dir) => {
                    return Err(FilterError::InvalidOrder(format!("unknown direction '{}' for {}", dir, field)))
                }
            };
            if it.next().is_some() {
                return Err(FilterError::InvalidOrder(format!("unexpected tokens in '{}'", trimmed)));
            }
            out.push(OrderSpec::new(field, ascending));
        }
        Ok(out)
    }
}
