//! Turning non-2xx response bodies into [`Error::Http`]

use serde::Deserialize;

use super::Error;
use crate::constants::UNKNOWN_ERROR;

/// Error bodies come in a few shapes depending on which layer of the service rejected us:
/// `{"error": {"code", "message"}}`, `{"error": "..."}`, `{"code", "message"}` or `{"detail": "..."}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default, alias = "error_code", alias = "errorCode")]
    code: Option<ErrorCode>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<NestedError>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NestedError {
    Body(Box<ApiErrorBody>),
    Message(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorCode {
    Text(String),
    Number(i64),
}

impl ErrorCode {
    fn into_string(self) -> String {
        match self {
            ErrorCode::Text(text) => text,
            ErrorCode::Number(number) => number.to_string(),
        }
    }
}

impl ApiErrorBody {
    fn into_parts(self) -> (Option<String>, Option<String>) {
        let ApiErrorBody {
            code,
            message,
            detail,
            error,
        } = self;
        let (nested_code, nested_message) = match error {
            Some(NestedError::Body(body)) => body.into_parts(),
            Some(NestedError::Message(message)) => (None, Some(message)),
            None => (None, None),
        };
        (
            nested_code.or(code.map(ErrorCode::into_string)),
            nested_message.or(message).or(detail),
        )
    }
}

/// Classifies a failed response. The message comes from the structured body when there is one,
/// then the raw body text, then a generic placeholder.
pub(crate) fn from_response_body(status: u16, body: &[u8]) -> Error {
    let (code, message) = serde_json::from_slice::<ApiErrorBody>(body)
        .map(ApiErrorBody::into_parts)
        .unwrap_or_default();

    let message = message
        .filter(|message| !message.trim().is_empty())
        .or_else(|| {
            let text = String::from_utf8_lossy(body);
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_owned())
        })
        .unwrap_or_else(|| UNKNOWN_ERROR.to_owned());

    Error::Http {
        status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(status: u16, body: &str) -> (u16, Option<String>, String) {
        match from_response_body(status, body.as_bytes()) {
            Error::Http {
                status,
                code,
                message,
            } => (status, code, message),
            other => panic!("expected an http error, got {other:?}"),
        }
    }

    #[test]
    fn nested_error_object() {
        assert_eq!(
            parts(
                422,
                r#"{"error": {"code": "invalid_request", "message": "content is required"}}"#
            ),
            (
                422,
                Some("invalid_request".into()),
                "content is required".into()
            )
        );
    }

    #[test]
    fn flat_error_object() {
        assert_eq!(
            parts(401, r#"{"code": "unauthorized", "message": "bad api key"}"#),
            (401, Some("unauthorized".into()), "bad api key".into())
        );
        assert_eq!(
            parts(404, r#"{"errorCode": 4040, "message": "memory not found"}"#),
            (404, Some("4040".into()), "memory not found".into())
        );
    }

    #[test]
    fn detail_and_string_errors() {
        assert_eq!(
            parts(400, r#"{"detail": "limit must be positive"}"#),
            (400, None, "limit must be positive".into())
        );
        assert_eq!(
            parts(429, r#"{"error": "slow down"}"#),
            (429, None, "slow down".into())
        );
    }

    #[test]
    fn falls_back_to_raw_text_then_placeholder() {
        assert_eq!(
            parts(502, "  upstream connect error\n"),
            (502, None, "upstream connect error".into())
        );
        assert_eq!(parts(500, ""), (500, None, UNKNOWN_ERROR.into()));
        // valid json, just nothing useful in it
        assert_eq!(parts(503, "{}"), (503, None, "{}".into()));
    }
}
