//! Client error types.
//!
//! Maps HTTP status codes to typed error variants. Error bodies are read in
//! both shapes the backend produces: `{"error": "message"}` from the account
//! routes and `{"error": {"code", "message"}}` from better-auth itself.

use std::fmt;

/// Transport-level failure talking to the backend.
///
/// `message` fields hold what the server said, when it said anything;
/// [`ClientError::message`] falls back to a generic text per status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Network-level error (DNS, connection refused, timeout, TLS).
    Network(String),

    /// 400 Bad Request.
    BadRequest {
        code: Option<String>,
        message: Option<String>,
    },

    /// 401 Unauthorized: no session.
    Unauthorized {
        code: Option<String>,
        message: Option<String>,
    },

    /// 404 Not Found.
    NotFound { message: Option<String> },

    /// Any other non-2xx status.
    Server {
        status: u16,
        message: Option<String>,
    },

    /// Failed to deserialize the response body.
    Deserialization(String),
}

impl ClientError {
    pub fn network(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }

    /// Build an error from a non-2xx status and its raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let (code, message) = parse_error_body(body);
        match status {
            400 => Self::BadRequest { code, message },
            401 => Self::Unauthorized { code, message },
            404 => Self::NotFound { message },
            _ => Self::Server { status, message },
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::BadRequest { code, .. } | Self::Unauthorized { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// The message the server put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::NotFound { message }
            | Self::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        if let Some(message) = self.server_message() {
            return message;
        }
        match self {
            Self::Network(msg) | Self::Deserialization(msg) => msg,
            Self::BadRequest { .. } => "Bad request",
            Self::Unauthorized { .. } => "Unauthorized",
            Self::NotFound { .. } => "Not found",
            Self::Server { .. } => "Server error",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Pull `(code, message)` out of an error body.
fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return (None, None);
    };
    match value.get("error") {
        Some(serde_json::Value::String(message)) => (None, Some(message.clone())),
        Some(serde_json::Value::Object(err)) => (
            err.get("code").and_then(|c| c.as_str()).map(str::to_string),
            err.get("message").and_then(|m| m.as_str()).map(str::to_string),
        ),
        _ => (
            None,
            value.get("message").and_then(|m| m.as_str()).map(str::to_string),
        ),
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            other => match (other.status(), other.code()) {
                (Some(status), Some(code)) => write!(f, "HTTP {} [{}]: {}", status, code, other.message()),
                (Some(status), None) => write!(f, "HTTP {}: {}", status, other.message()),
                _ => f.write_str(other.message()),
            },
        }
    }
}

impl std::error::Error for ClientError {}
