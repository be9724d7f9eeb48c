//! Vendor connector error types
//!
//! Error definitions with transient/permanent classification for retry logic.

use thiserror::Error;

use crate::types::ProtocolType;

/// Error that can occur during vendor connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Connection errors (usually transient)
    /// Failed to establish connection to the vendor system.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection timed out.
    #[error("connection timeout after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// Vendor system is temporarily unavailable (5xx, 429).
    #[error("vendor unavailable: {message}")]
    TargetUnavailable { message: String },

    /// Network error during communication.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Authentication errors (permanent)
    /// Vendor rejected the supplied credentials.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Credentials have expired and could not be refreshed.
    #[error("authentication failed: credentials expired")]
    CredentialsExpired,

    // Configuration errors (permanent)
    /// Configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A credential field required by the selected protocol is missing.
    #[error("missing credential '{field}' for {protocol} protocol")]
    MissingCredential {
        field: &'static str,
        protocol: ProtocolType,
    },

    /// Data operation invoked before credentials were validated.
    #[error("client not initialized: call validate_credentials first")]
    ClientNotInitialized,

    // Capability errors (permanent)
    /// The protocol does not implement this operation.
    #[error("{operation} is not supported over {protocol}")]
    Unsupported {
        protocol: ProtocolType,
        operation: &'static str,
    },

    // Vendor responses
    /// Vendor answered with `success: false`.
    #[error("vendor rejected request: {message}")]
    VendorRejected { message: String },

    /// Vendor returned an unexpected HTTP status.
    #[error("vendor returned HTTP {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// Payload did not have the expected shape.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// Field mapping could not be applied.
    #[error("mapping failed for '{field}': {message}")]
    MappingFailed { field: String, message: String },

    /// Serialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    // Caller aborts
    /// Operation cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Operation ran past the caller's deadline.
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl ConnectorError {
    /// Check if this error is transient and the operation should be retried.
    ///
    /// Transient errors are those caused by temporary conditions that may resolve
    /// themselves, such as network issues or temporary unavailability.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. }
                | ConnectorError::ConnectionTimeout { .. }
                | ConnectorError::TargetUnavailable { .. }
                | ConnectorError::NetworkError { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Check if the vendor refused the caller's identity.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            ConnectorError::AuthenticationFailed { .. } | ConnectorError::CredentialsExpired
        )
    }

    /// Check if this error is a configuration problem.
    ///
    /// Configuration errors are surfaced immediately and never retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ConnectorError::InvalidConfiguration { .. }
                | ConnectorError::MissingCredential { .. }
                | ConnectorError::ClientNotInitialized
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            ConnectorError::ConnectionTimeout { .. } => "CONNECTION_TIMEOUT",
            ConnectorError::TargetUnavailable { .. } => "TARGET_UNAVAILABLE",
            ConnectorError::NetworkError { .. } => "NETWORK_ERROR",
            ConnectorError::AuthenticationFailed { .. } => "AUTH_FAILED",
            ConnectorError::CredentialsExpired => "CREDENTIALS_EXPIRED",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::MissingCredential { .. } => "MISSING_CREDENTIAL",
            ConnectorError::ClientNotInitialized => "CLIENT_NOT_INITIALIZED",
            ConnectorError::Unsupported { .. } => "UNSUPPORTED_OPERATION",
            ConnectorError::VendorRejected { .. } => "VENDOR_REJECTED",
            ConnectorError::UnexpectedStatus { .. } => "UNEXPECTED_STATUS",
            ConnectorError::InvalidData { .. } => "INVALID_DATA",
            ConnectorError::MappingFailed { .. } => "MAPPING_FAILED",
            ConnectorError::Serialization { .. } => "SERIALIZATION_ERROR",
            ConnectorError::Cancelled => "CANCELLED",
            ConnectorError::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ConnectorError::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication failed error.
    pub fn authentication(message: impl Into<String>) -> Self {
        ConnectorError::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ConnectorError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        ConnectorError::InvalidData {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(protocol: ProtocolType, operation: &'static str) -> Self {
        ConnectorError::Unsupported {
            protocol,
            operation,
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        ConnectorError::Serialization {
            message: e.to_string(),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
