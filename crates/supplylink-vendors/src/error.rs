//! Vendor management error types.

use thiserror::Error;

use supplylink_connector::error::ConnectorError;

/// Error that can occur while managing vendor profiles and building connectors.
#[derive(Debug, Error)]
pub enum VendorError {
    /// No registry entry with this id.
    #[error("vendor not registered: {vendor_id}")]
    RegistryEntryNotFound { vendor_id: String },

    /// An entry with this id already exists; use `update` to change it.
    #[error("vendor already registered: {vendor_id}")]
    DuplicateVendor { vendor_id: String },

    /// The vendor type is known but has no connector yet.
    #[error("connector for vendor type '{vendor_type}' is not yet implemented")]
    NotYetImplemented { vendor_type: String },

    /// The vendor type is not recognised.
    #[error("unsupported vendor type: {vendor_type}")]
    UnsupportedVendorType { vendor_type: String },

    /// The request is malformed.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Building or driving a connector failed.
    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

impl VendorError {
    pub fn not_found(vendor_id: impl Into<String>) -> Self {
        VendorError::RegistryEntryNotFound {
            vendor_id: vendor_id.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        VendorError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Configuration problems are surfaced immediately and never retried.
    pub fn is_configuration(&self) -> bool {
        match self {
            VendorError::Connector(e) => e.is_configuration(),
            _ => true,
        }
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            VendorError::RegistryEntryNotFound { .. } => "VENDOR_NOT_REGISTERED",
            VendorError::DuplicateVendor { .. } => "DUPLICATE_VENDOR",
            VendorError::NotYetImplemented { .. } => "NOT_YET_IMPLEMENTED",
            VendorError::UnsupportedVendorType { .. } => "UNSUPPORTED_VENDOR_TYPE",
            VendorError::InvalidRequest { .. } => "INVALID_REQUEST",
            VendorError::Connector(e) => e.error_code(),
        }
    }
}

/// Result type for vendor management operations.
pub type VendorResult<T> = Result<T, VendorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_errors_keep_their_code() {
        let err: VendorError = ConnectorError::ClientNotInitialized.into();
        assert_eq!(err.error_code(), "CLIENT_NOT_INITIALIZED");
        assert!(err.is_configuration());

        let err: VendorError = ConnectorError::network("reset").into();
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_messages() {
        let err = VendorError::NotYetImplemented {
            vendor_type: "ingram_micro".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "connector for vendor type 'ingram_micro' is not yet implemented"
        );
        assert_eq!(VendorError::not_found("acme").error_code(), "VENDOR_NOT_REGISTERED");
    }
}
