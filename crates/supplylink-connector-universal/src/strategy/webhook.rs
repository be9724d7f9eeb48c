//! Webhook strategy.
//!
//! Webhooks are pushed by the vendor, so there is nothing to pull; the
//! strategy only checks that an endpoint is configured.

use supplylink_connector::error::ConnectorError;
use supplylink_connector::types::ProtocolType;

use crate::config::UniversalConnectorConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookStrategy {
    endpoint: Option<String>,
}

impl WebhookStrategy {
    pub fn new(config: &UniversalConnectorConfig) -> Self {
        Self {
            endpoint: config.base_url().map(str::to_string),
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn validate(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn unsupported(&self, operation: &'static str) -> ConnectorError {
        ConnectorError::unsupported(ProtocolType::Webhook, operation)
    }
}
