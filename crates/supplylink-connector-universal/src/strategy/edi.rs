//! EDI strategy.
//!
//! Only checks that trading-partner identifiers are present; no document
//! exchange is implemented.

use tracing::warn;

use supplylink_connector::credentials::VendorCredentials;
use supplylink_connector::error::{ConnectorError, ConnectorResult};
use supplylink_connector::types::ProtocolType;

use crate::config::UniversalConnectorConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdiStrategy {
    partner_id: Option<String>,
    sender_id: Option<String>,
    receiver_id: Option<String>,
}

impl EdiStrategy {
    pub fn new(config: &UniversalConnectorConfig) -> ConnectorResult<Self> {
        let VendorCredentials::Edi {
            partner_id,
            sender_id,
            receiver_id,
        } = config.credentials()
        else {
            return Err(ConnectorError::invalid_config(
                "EDI vendors require EDI credentials",
            ));
        };

        Ok(Self {
            partner_id: partner_id.clone(),
            sender_id: sender_id.clone(),
            receiver_id: receiver_id.clone(),
        })
    }

    /// Identifiers that are absent or blank.
    pub fn missing_identifiers(&self) -> Vec<&'static str> {
        [
            ("partner_id", &self.partner_id),
            ("sender_id", &self.sender_id),
            ("receiver_id", &self.receiver_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> bool {
        let missing = self.missing_identifiers();
        if !missing.is_empty() {
            warn!(missing = ?missing, "EDI credentials incomplete");
        }
        missing.is_empty()
    }

    pub fn unsupported(&self, operation: &'static str) -> ConnectorError {
        ConnectorError::unsupported(ProtocolType::Edi, operation)
    }
}
