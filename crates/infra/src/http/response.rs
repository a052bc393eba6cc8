//! Cloudflare response envelope
//!
//! Every v4 REST endpoint wraps its payload in the same JSON envelope:
//! `{success, result, errors, messages, result_info}`. The envelope is
//! parsed once; HTTP status codes are irrelevant here because Cloudflare
//! returns `200` with `success: false` for most business errors.

use cloudgate_domain::{ApiErrorEntry, CloudflareError, Result, ResultInfo};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Parsed Cloudflare response envelope.
///
/// All fields default safely when absent: `success` false, `result` null,
/// error and message lists empty, pagination metadata empty.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
    #[serde(default)]
    messages: Vec<Value>,
    #[serde(default)]
    result_info: ResultInfo,
}

impl ApiResponse {
    /// Parse an envelope from a response body.
    ///
    /// The body must decode as a JSON object; anything else is a
    /// [`CloudflareError::MalformedResponse`], which indicates a transport
    /// or proxy problem and must never be treated as an empty result.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| CloudflareError::MalformedResponse(e.to_string()))?;

        if !value.is_object() {
            return Err(CloudflareError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_type_name(&value)
            )));
        }

        serde_json::from_value(value).map_err(|e| CloudflareError::MalformedResponse(e.to_string()))
    }

    /// Read and parse a transport response.
    pub async fn from_response(response: reqwest::Response) -> Result<Self> {
        let body = response
            .bytes()
            .await
            .map_err(|e| CloudflareError::MalformedResponse(e.to_string()))?;
        Self::from_body(&body)
    }

    pub fn is_successful(&self) -> bool {
        self.success
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ApiErrorEntry] {
        &self.errors
    }

    /// First error message, falling back to its code. `None` when the
    /// error list is empty (the provider does not guarantee errors on
    /// failure).
    pub fn first_error(&self) -> Option<String> {
        self.errors.first().map(|e| {
            if e.message.is_empty() {
                e.code.to_string()
            } else {
                e.message.clone()
            }
        })
    }

    pub fn messages(&self) -> &[Value] {
        &self.messages
    }

    pub fn result_info(&self) -> &ResultInfo {
        &self.result_info
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Deserialize `result` into a typed value, using the type's default
    /// when the result is null or absent.
    pub fn result_or_default<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match &self.result {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| CloudflareError::MalformedResponse(e.to_string())),
        }
    }

    /// The single gate for API-level failures: no-op when `success` is
    /// true, otherwise an [`CloudflareError::Api`] carrying the full error
    /// list. Call this immediately after every envelope-producing request.
    pub fn throw_if_failed(&self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(CloudflareError::from_api_errors(self.errors.clone()))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_failed_envelope() {
        let body = br#"{"success":false,"errors":[{"code":1004,"message":"Invalid zone ID"}]}"#;
        let response = ApiResponse::from_body(body).unwrap();

        assert!(!response.is_successful());
        assert!(response.has_errors());
        assert_eq!(response.first_error().as_deref(), Some("Invalid zone ID"));

        let err = response.throw_if_failed().unwrap_err();
        assert!(err.has_error_code(1004));
    }

    #[test]
    fn empty_object_defaults_all_fields() {
        let response = ApiResponse::from_body(b"{}").unwrap();

        assert!(!response.is_successful());
        assert!(!response.has_errors());
        assert!(response.first_error().is_none());
        assert!(response.result().is_none());
        assert!(response.messages().is_empty());
        assert_eq!(response.result_info(), &ResultInfo::default());
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = ApiResponse::from_body(b"<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, CloudflareError::MalformedResponse(_)));
    }

    #[test]
    fn non_object_json_is_malformed() {
        let err = ApiResponse::from_body(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, CloudflareError::MalformedResponse(m) if m.contains("an array")));
    }

    #[test]
    fn first_error_falls_back_to_code() {
        let body = br#"{"success":false,"errors":[{"code":10003}]}"#;
        let response = ApiResponse::from_body(body).unwrap();
        assert_eq!(response.first_error().as_deref(), Some("10003"));
    }

    #[test]
    fn result_or_default_handles_null() {
        let response = ApiResponse::from_body(br#"{"success":true,"result":null}"#).unwrap();
        let value: Vec<Value> = response.result_or_default().unwrap();
        assert!(value.is_empty());
        assert!(response.throw_if_failed().is_ok());
    }

    #[test]
    fn parses_pagination_metadata() {
        let body = br#"{
            "success": true,
            "result": [{"id": "r1"}],
            "result_info": {"page": 2, "per_page": 50, "total_count": 120, "total_pages": 3}
        }"#;
        let response = ApiResponse::from_body(body).unwrap();

        assert_eq!(response.result_info().page, Some(2));
        assert_eq!(response.result_info().total_pages, Some(3));
    }
}
