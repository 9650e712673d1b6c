//! Error types for the BizFly API client.
//!
//! # Design
//! Request-side failures (`MalformedUrl`, `Encoding`) never reach the network.
//! `Transport` wraps network failures unchanged and is never retried. The
//! status-derived variants keep the raw response body verbatim so callers can
//! parse structured error payloads themselves; their messages lead with that
//! body.

use thiserror::Error;

/// Failure reported by a `Transport` before any response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// Free-form failure for custom transports.
    #[error("{0}")]
    Other(String),
}

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request path could not be resolved against the base URL.
    #[error("malformed url {input:?}: {source}")]
    MalformedUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered 401 and obtaining a new token failed too.
    #[error("{body}: token refresh failed: {source}")]
    AuthRefreshFailed {
        body: String,
        #[source]
        source: Box<ApiError>,
    },

    /// The server returned 404.
    #[error("{body}: Resource not found")]
    NotFound { body: String },

    /// The server returned 403.
    #[error("{body}: You are not allowed to do this action")]
    PermissionDenied { body: String },

    /// Any other status >= 400.
    #[error("{body}: Error (HTTP {status})")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("failed to decode response body: {0}")]
    Decoding(#[source] serde_json::Error),

    /// `/api/token` answered with an empty token.
    #[error("token endpoint returned an empty token")]
    EmptyToken,

    /// A token refresh was needed but no credentials are configured.
    #[error("no credentials configured for token refresh")]
    MissingCredentials,

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Map a failed response status to its error kind, keeping `body` as is.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => ApiError::NotFound { body },
            403 => ApiError::PermissionDenied { body },
            _ => ApiError::Http { status, body },
        }
    }

    /// Raw response body carried by a status-derived error.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { body }
            | ApiError::PermissionDenied { body }
            | ApiError::Http { body, .. }
            | ApiError::AuthRefreshFailed { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_body() {
        let err = ApiError::from_status(404, "not found".to_string());
        assert!(err.is_not_found());
        assert!(err.to_string().contains("not found"));
        assert_eq!(err.body(), Some("not found"));
    }

    #[test]
    fn forbidden_maps_to_permission_denied() {
        let err = ApiError::from_status(403, "{\"message\":\"nope\"}".to_string());
        assert!(matches!(err, ApiError::PermissionDenied { .. }));
        assert!(err.to_string().starts_with("{\"message\":\"nope\"}"));
    }

    #[test]
    fn other_statuses_are_generic() {
        for status in [400, 409, 422, 500, 503] {
            let err = ApiError::from_status(status, "boom".to_string());
            match err {
                ApiError::Http { status: got, ref body } => {
                    assert_eq!(got, status);
                    assert_eq!(body, "boom");
                }
                other => panic!("status {status} mapped to {other:?}"),
            }
        }
    }

    #[test]
    fn refresh_failure_exposes_source() {
        use std::error::Error as _;

        let err = ApiError::AuthRefreshFailed {
            body: "token expired".to_string(),
            source: Box::new(ApiError::from_status(500, "keystone down".to_string())),
        };
        let message = err.to_string();
        assert!(message.contains("token expired"));
        assert!(message.contains("keystone down"));
        assert!(err.source().is_some());
    }
}
