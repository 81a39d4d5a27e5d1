//! Error types for discovery gateway operations.
//!
//! This module provides [`XdsError`], the single error type shared by the
//! stores, the gateway and the HTTP layer. Each variant maps to exactly one
//! HTTP status code through [`XdsError::status_code`].

use http::StatusCode;

/// Error type for discovery gateway operations.
///
/// Every error is terminal for the call that produced it: there are no
/// partial responses and no retries inside the gateway.
///
/// # Example
///
/// ```rust
/// use xds_core::XdsError;
/// use http::StatusCode;
///
/// let err = XdsError::invalid_request(
///     "type.googleapis.com/envoy.api.v2.ClusterLoadAssignment",
///     "must have exactly 1 resource name",
/// );
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum XdsError {
    /// The request body could not be decoded.
    #[error("decoding error for {type_url}: {message}")]
    DecodingError {
        /// The type URL of the discovery kind being decoded for.
        type_url: String,
        /// Decoder message, including line and column.
        message: String,
    },

    /// The request decoded but violates a protocol constraint.
    #[error("invalid request for {type_url}: {reason}")]
    InvalidRequest {
        /// The type URL of the discovery kind.
        type_url: String,
        /// Which constraint was violated.
        reason: String,
    },

    /// The route exists but not for this verb.
    #[error("method not allowed: {method} {path}")]
    MethodNotAllowed {
        /// The rejected HTTP method.
        method: String,
        /// The requested path.
        path: String,
    },

    /// Requested resource or node snapshot doesn't exist.
    #[error("resource not found: {type_url}/{name}")]
    ResourceNotFound {
        /// The type URL of the resource.
        type_url: String,
        /// The resource name, or the node id for node-keyed kinds.
        name: String,
    },

    /// No route matches the requested path.
    #[error("not found: {path}")]
    RouteNotFound {
        /// The requested path.
        path: String,
    },

    /// The refresh pipeline's most recent attempt failed.
    #[error("refresh failed: {message}")]
    RefreshError {
        /// Error text reported by the refresh pipeline.
        message: String,
    },

    /// Transport setup or serving failed.
    #[error("transport error: {message}")]
    TransportError {
        /// Error message.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unexpected internal error.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl XdsError {
    /// Create a decoding error for a discovery kind.
    pub fn decoding(type_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DecodingError {
            type_url: type_url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid request error for a discovery kind.
    pub fn invalid_request(type_url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            type_url: type_url.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(type_url: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            type_url: type_url.into(),
            name: name.into(),
        }
    }

    /// Create a wrong-verb error.
    pub fn method_not_allowed(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Create an unmatched-route error.
    pub fn route_not_found(path: impl Into<String>) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// Create an internal error from any error type.
    pub fn internal<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a transport error from any error type.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::TransportError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// HTTP status code reported to the caller for this error.
    ///
    /// Decode failures are reported as server errors even though the client
    /// sent the malformed body.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            XdsError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            XdsError::ResourceNotFound { .. } | XdsError::RouteNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            XdsError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            XdsError::DecodingError { .. }
            | XdsError::RefreshError { .. }
            | XdsError::TransportError { .. }
            | XdsError::Internal { .. }
            | XdsError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text returned to the caller.
    ///
    /// Decode errors surface the raw decoder message so proxy operators can
    /// fix the request; everything else uses the display form.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            XdsError::DecodingError { message, .. } => message.clone(),
            XdsError::InvalidRequest { reason, .. } => reason.clone(),
            XdsError::ResourceNotFound { .. } | XdsError::RouteNotFound { .. } => {
                "not found".to_string()
            }
            XdsError::MethodNotAllowed { .. } => "method not allowed".to_string(),
            XdsError::RefreshError { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&XdsError> for StatusCode {
    fn from(err: &XdsError) -> Self {
        err.status_code()
    }
}
