//! Body parsing utilities for HTTP requests
//!
//! Provides async body collection and parsing of JSON, form-urlencoded and
//! query-string data into [`FormData`].

use super::FormData;
use crate::error::FrameworkError;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Collect the full body from an Incoming stream
pub async fn collect_body(body: Incoming) -> Result<Bytes, FrameworkError> {
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| FrameworkError::Body(format!("failed to read request body: {}", e)))
}

/// Parse bytes as JSON into the target type
pub fn parse_json<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, FrameworkError> {
    serde_json::from_slice(bytes)
        .map_err(|e| FrameworkError::Body(format!("failed to parse JSON body: {}", e)))
}

/// Parse bytes as form-urlencoded into the target type
pub fn parse_form<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, FrameworkError> {
    serde_urlencoded::from_bytes(bytes)
        .map_err(|e| FrameworkError::Body(format!("failed to parse form body: {}", e)))
}

/// Parse a query string (without the `?`) into flat key/value data
pub fn parse_query(query: Option<&str>) -> Result<FormData, FrameworkError> {
    match query {
        Some(query) if !query.is_empty() => serde_urlencoded::from_str(query)
            .map_err(|e| FrameworkError::Body(format!("failed to parse query string: {}", e))),
        _ => Ok(FormData::new()),
    }
}

/// Parse a submitted body by Content-Type
///
/// - `application/json` -> top-level object, flattened
/// - anything else -> form-urlencoded
///
/// An empty body is empty data regardless of Content-Type.
pub fn parse_input(content_type: Option<&str>, bytes: &Bytes) -> Result<FormData, FrameworkError> {
    if bytes.is_empty() {
        return Ok(FormData::new());
    }

    match content_type {
        Some(ct) if ct.starts_with("application/json") => {
            let value: Value = parse_json(bytes)?;
            flatten_json(value)
        }
        _ => parse_form(bytes),
    }
}

fn flatten_json(value: Value) -> Result<FormData, FrameworkError> {
    let Value::Object(fields) = value else {
        return Err(FrameworkError::Body(
            "JSON body must be an object".to_string(),
        ));
    };

    Ok(fields
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_form_body() {
        let body = Bytes::from_static(b"title=Hello+world&tags=a%2Cb");
        let form = parse_input(Some("application/x-www-form-urlencoded"), &body).unwrap();
        assert_eq!(form, FormData::from([("title", "Hello world"), ("tags", "a,b")]));
    }

    #[test]
    fn test_json_body_is_flattened() {
        let body = Bytes::from_static(br#"{"title":"Hi","draft":true,"views":3,"meta":{"a":1},"x":null}"#);
        let form = parse_input(Some("application/json; charset=utf-8"), &body).unwrap();

        assert_eq!(form.get("title"), Some("Hi"));
        assert_eq!(form.get("draft"), Some("true"));
        assert_eq!(form.get("views"), Some("3"));
        assert_eq!(form.get("meta"), Some(r#"{"a":1}"#));
        assert_eq!(form.get("x"), Some(""));
    }

    #[test]
    fn test_json_array_is_rejected() {
        let body = Bytes::from_static(b"[1,2]");
        let err = parse_input(Some("application/json"), &body).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_empty_body_and_query() {
        assert!(parse_input(Some("application/json"), &Bytes::new()).unwrap().is_empty());
        assert!(parse_query(None).unwrap().is_empty());
        assert_eq!(parse_query(Some("page=2")).unwrap().get("page"), Some("2"));
    }
}
