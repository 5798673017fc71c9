//! Decoding of the gateway's `{code, body, msg}` response envelope.

use serde_json::Value;

use crate::forwarder::error::ForwardError;

const UNKNOWN_FAILURE: &str = "unknown error";

/// Turn a 2xx upstream body into the relay result.
///
/// Only text that is not JSON passes through unchanged. Any JSON value is
/// read as an envelope, which succeeds only with `code == 0` and a
/// non-empty `body`.
pub fn decode(text: String) -> Result<String, ForwardError> {
    let envelope = match serde_json::from_str::<Value>(&text) {
        Ok(value) => value,
        Err(_) => return Ok(text),
    };

    let code = envelope.get("code").and_then(Value::as_i64);
    let body = match envelope.get("body") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    if code == Some(0) && !body.is_empty() {
        return Ok(body);
    }

    let msg = envelope
        .get("msg")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(UNKNOWN_FAILURE);
    Err(ForwardError::UpstreamLogical(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_returns_body() {
        let out = decode(r#"{"code":0,"body":"X","msg":""}"#.into()).unwrap();
        assert_eq!(out, "X");
    }

    #[test]
    fn test_failure_envelope_returns_msg() {
        let err = decode(r#"{"code":1,"body":"","msg":"bad"}"#.into()).unwrap_err();
        assert_eq!(err, ForwardError::UpstreamLogical("bad".into()));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_plaintext_passes_through() {
        assert_eq!(decode("plaintext".into()).unwrap(), "plaintext");
        assert_eq!(decode("".into()).unwrap(), "");
    }

    #[test]
    fn test_json_without_code_fails() {
        for text in [r#"{"token":"abc"}"#, "null", r#""str""#, "12345", "[]", "true"] {
            let err = decode(text.into()).unwrap_err();
            assert_eq!(err, ForwardError::UpstreamLogical(UNKNOWN_FAILURE.into()), "{}", text);
        }
    }

    #[test]
    fn test_object_without_code_reports_msg() {
        let err = decode(r#"{"body":"X","msg":"no code"}"#.into()).unwrap_err();
        assert_eq!(err, ForwardError::UpstreamLogical("no code".into()));
    }

    #[test]
    fn test_success_code_with_empty_body_fails() {
        let err = decode(r#"{"code":0,"body":"","msg":""}"#.into()).unwrap_err();
        assert_eq!(err, ForwardError::UpstreamLogical(UNKNOWN_FAILURE.into()));
    }

    #[test]
    fn test_non_numeric_code_fails() {
        let err = decode(r#"{"code":"0","body":"X","msg":"odd"}"#.into()).unwrap_err();
        assert_eq!(err, ForwardError::UpstreamLogical("odd".into()));
    }

    #[test]
    fn test_structured_body_is_serialized() {
        let out = decode(r#"{"code":0,"body":{"k":1},"msg":""}"#.into()).unwrap();
        assert_eq!(out, r#"{"k":1}"#);
    }
}
