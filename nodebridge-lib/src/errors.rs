//! Error types for node bridge operations.
//!
//! Failures are split by where they happened: the transport never reached the
//! node, the node answered with an error payload, or the answer could not be
//! decoded. Only transport failures are worth retrying.

/// Error codes for FFI and host-application integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum NodeBridgeErrorCode {
    /// Transport/network layer error
    Transport = 2000,
    /// Retries exhausted without reaching the backend
    Unreachable = 2001,
    /// Backend answered with a structured error
    Backend = 3000,
    /// Requested resource does not exist on the backend
    NotFound = 4000,
    /// Capability not offered by this backend or configuration
    NotSupported = 4001,
    /// Invalid configuration
    InvalidConfig = 5000,
    /// Response could not be decoded
    Decode = 5002,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Error type for every backend interaction.
#[derive(Debug, thiserror::Error)]
pub enum NodeBridgeError {
    /// The request never produced an HTTP response (connect, timeout, request construction).
    #[error("transport error: {0}")]
    Transport(String),

    /// Transport failures persisted through every retry attempt.
    #[error("backend unreachable after {attempts} attempts: {reason}")]
    Unreachable {
        /// Attempts made before giving up
        attempts: u32,
        /// Last transport failure
        reason: String,
    },

    /// The backend returned a non-success status with an error payload.
    #[error("backend error ({status}): {message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Error text reported by the backend
        message: String,
    },

    /// Resource not found (invoice, channel, payment).
    #[error("{resource_type} not found: {identifier}")]
    NotFound {
        /// Type of resource (e.g., "invoice")
        resource_type: String,
        /// Resource identifier
        identifier: String,
    },

    /// Capability not supported by this backend or missing collaborator.
    #[error("{0} is not supported")]
    NotSupported(String),

    /// Invalid configuration value.
    #[error("invalid {field}: {reason}")]
    InvalidConfig {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Response body did not match the declared shape.
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// What was being decoded (usually the backend method)
        what: String,
        /// Underlying parser message
        reason: String,
    },

    /// Internal/unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NodeBridgeError {
    /// Get the error code for FFI integration.
    pub fn code(&self) -> NodeBridgeErrorCode {
        match self {
            Self::Transport(_) => NodeBridgeErrorCode::Transport,
            Self::Unreachable { .. } => NodeBridgeErrorCode::Unreachable,
            Self::Backend { .. } => NodeBridgeErrorCode::Backend,
            Self::NotFound { .. } => NodeBridgeErrorCode::NotFound,
            Self::NotSupported(_) => NodeBridgeErrorCode::NotSupported,
            Self::InvalidConfig { .. } => NodeBridgeErrorCode::InvalidConfig,
            Self::Decode { .. } => NodeBridgeErrorCode::Decode,
            Self::Internal(_) => NodeBridgeErrorCode::Internal,
        }
    }

    /// Returns true if the retry policy may attempt the call again.
    ///
    /// Backend-reported errors are never retried: the node already answered.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if the backend could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Unreachable { .. })
    }

    /// The backend's own error text, if this error carries one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Create a not found error.
    pub fn not_found(resource_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for NodeBridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode("json", err)
    }
}

impl From<reqwest::Error> for NodeBridgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode("response", err)
        } else {
            Self::Transport(err.to_string())
        }
    }
}
