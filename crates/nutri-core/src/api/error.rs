use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - credential missing or rejected")]
    Unauthorized { body: Value },

    #[error("Request failed with status {status}")]
    RequestFailed { status: StatusCode, body: Value },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &Value) -> String {
        let text = body.to_string();
        if text.len() <= MAX_ERROR_BODY_LENGTH {
            return text;
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &text[..end], text.len())
    }

    /// HTTP status the server answered with, if one was obtained.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed response body attached to a failed request.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Unauthorized { body } | ApiError::RequestFailed { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Message suitable for showing to the user: the server's `message`
    /// field when it sent one, otherwise the error text.
    pub fn user_message(&self) -> String {
        self.body()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            ApiError::Transport(format!("unable to connect: {}", err))
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_and_body_exposed() {
        let err = ApiError::RequestFailed {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: json!({ "message": "name is required" }),
        };
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert_eq!(err.body(), Some(&json!({ "message": "name is required" })));

        let err = ApiError::Unauthorized { body: Value::Null };
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(err.is_unauthorized());

        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert!(err.body().is_none());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = ApiError::RequestFailed {
            status: StatusCode::CONFLICT,
            body: json!({ "message": "Email already registered" }),
        };
        assert_eq!(err.user_message(), "Email already registered");

        let err = ApiError::RequestFailed {
            status: StatusCode::BAD_GATEWAY,
            body: Value::String("<html>".to_string()),
        };
        assert_eq!(err.user_message(), "Request failed with status 502 Bad Gateway");
    }

    #[test]
    fn test_truncate_body() {
        let short = json!({ "ok": false });
        assert_eq!(ApiError::truncate_body(&short), r#"{"ok":false}"#);

        let long = Value::String("x".repeat(2000));
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with("\"xxx"));
        assert!(truncated.contains("truncated, 2002 total bytes"));
    }
}
