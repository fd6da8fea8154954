use std::convert::Infallible;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::ApiError;
use crate::filter::FilterError;
use crate::types::Operation;

/// Query-string pairs in arrival order. Keys may repeat (`orders=..&orders=..`).
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn from_query(query: &str) -> Self {
        Self { pairs: form_urlencoded::parse(query.as_bytes()).into_owned().collect() }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, also accepting the bracketed `key[]` form.
    pub fn all(&self, key: &str) -> Vec<String> {
        let bracketed = format!("{}[]", key);
        self.pairs
            .iter()
            .filter(|(k, _)| k == key || *k == bracketed)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Zero-based page; absent means 0. Negative values are left for the
    /// query builder to clamp.
    pub fn page(&self) -> Result<i64, FilterError> {
        match self.get("page").map(str::trim) {
            None | Some("") => Ok(0),
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| FilterError::InvalidPage(format!("'{}' is not an integer", raw))),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestParams {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.uri.query().map(Self::from_query).unwrap_or_default())
    }
}

/// Parse a POST body as a JSON object. An empty body is an empty object.
pub fn json_object(op: Operation, body: Result<Bytes, BytesRejection>) -> Result<Map<String, Value>, ApiError> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(format!("{} failed: request body too large", op))
        } else {
            ApiError::bad_request(format!("{} failed: {}", op, rejection.body_text()))
        }
    })?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::invalid_json(format!("{} failed: body must be a JSON object", op))),
        Err(e) => Err(ApiError::invalid_json(format!("{} failed: {}", op, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_and_bracketed_keys() {
        let params = RequestParams::from_query(
            "orders=%7B%22field%22%3A%22a%22%7D&page=2&orders[]=%7B%22field%22%3A%22b%22%7D",
        );
        assert_eq!(params.all("orders"), vec![r#"{"field":"a"}"#, r#"{"field":"b"}"#]);
        assert_eq!(params.page().unwrap(), 2);
    }

    #[test]
    fn page_defaults_and_rejects_garbage() {
        assert_eq!(RequestParams::default().page().unwrap(), 0);
        assert_eq!(RequestParams::from_query("page=-3").page().unwrap(), -3);
        assert!(matches!(RequestParams::from_query("page=two").page(), Err(FilterError::InvalidPage(_))));
    }

    #[test]
    fn body_must_be_an_object() {
        let op = Operation::CreateRecord;
        assert!(json_object(op, Ok(Bytes::from_static(b""))).unwrap().is_empty());
        assert!(json_object(op, Ok(Bytes::from_static(br#"{"record":{}}"#))).unwrap().contains_key("record"));
        assert!(matches!(json_object(op, Ok(Bytes::from_static(b"[1]"))), Err(ApiError::InvalidJson(_))));
        assert!(matches!(json_object(op, Ok(Bytes::from_static(b"{oops"))), Err(ApiError::InvalidJson(_))));
    }
}
