//! Protocol strategies.
//!
//! The strategy is picked once from the configured protocol when the
//! connector is built. Only the API strategy moves data; the others validate
//! their credentials and report `Unsupported` for data calls.

mod api;
mod edi;
mod sftp;
mod webhook;

pub use api::ApiStrategy;
pub use edi::EdiStrategy;
pub use sftp::{SftpSession, SftpStrategy, SftpTarget, SftpTransport, SshSftpTransport};
pub use webhook::WebhookStrategy;

use serde_json::Value;
use std::sync::Arc;

use supplylink_connector::context::OperationContext;
use supplylink_connector::error::ConnectorResult;
use supplylink_connector::types::ProtocolType;

use crate::config::UniversalConnectorConfig;

/// Protocol-specific behaviour of a universal connector.
#[derive(Debug)]
pub enum ProtocolStrategy {
    Api(ApiStrategy),
    Sftp(SftpStrategy),
    Edi(EdiStrategy),
    Webhook(WebhookStrategy),
}

impl ProtocolStrategy {
    /// Build the strategy for `config`. `custom` vendors use the API strategy.
    pub fn for_config(
        config: &UniversalConnectorConfig,
        sftp_transport: Arc<dyn SftpTransport>,
    ) -> ConnectorResult<Self> {
        Ok(match config.effective_protocol() {
            ProtocolType::Api | ProtocolType::Custom => Self::Api(ApiStrategy::new(config)?),
            ProtocolType::Sftp => Self::Sftp(SftpStrategy::new(config, sftp_transport)?),
            ProtocolType::Edi => Self::Edi(EdiStrategy::new(config)?),
            ProtocolType::Webhook => Self::Webhook(WebhookStrategy::new(config)),
        })
    }

    pub fn protocol(&self) -> ProtocolType {
        match self {
            Self::Api(_) => ProtocolType::Api,
            Self::Sftp(_) => ProtocolType::Sftp,
            Self::Edi(_) => ProtocolType::Edi,
            Self::Webhook(_) => ProtocolType::Webhook,
        }
    }

    /// Whether this strategy can pull and push data.
    pub fn moves_data(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    pub async fn validate(&self, ctx: &OperationContext) -> ConnectorResult<bool> {
        match self {
            Self::Api(api) => api.validate(ctx).await,
            Self::Sftp(sftp) => sftp.validate(ctx).await,
            Self::Edi(edi) => Ok(edi.validate()),
            Self::Webhook(webhook) => Ok(webhook.validate()),
        }
    }

    /// GET `path`, `None` when the vendor answers 404.
    pub async fn fetch(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(String, String)],
        ctx: &OperationContext,
    ) -> ConnectorResult<Option<Value>> {
        match self {
            Self::Api(api) => api.fetch(path, query, ctx).await,
            Self::Sftp(sftp) => Err(sftp.unsupported(operation)),
            Self::Edi(edi) => Err(edi.unsupported(operation)),
            Self::Webhook(webhook) => Err(webhook.unsupported(operation)),
        }
    }

    /// POST `payload` to `path`.
    pub async fn submit(
        &self,
        operation: &'static str,
        path: &str,
        payload: &Value,
        ctx: &OperationContext,
    ) -> ConnectorResult<Value> {
        match self {
            Self::Api(api) => api.submit(path, payload, ctx).await,
            Self::Sftp(sftp) => Err(sftp.unsupported(operation)),
            Self::Edi(edi) => Err(edi.unsupported(operation)),
            Self::Webhook(webhook) => Err(webhook.unsupported(operation)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supplylink_connector::config::VendorConfig;
    use supplylink_connector::credentials::VendorCredentials;
    use supplylink_connector::error::ConnectorError;
    use supplylink_connector::types::AuthenticationMode;

    fn build(protocol: ProtocolType, creds: VendorCredentials) -> ConnectorResult<ProtocolStrategy> {
        let config = UniversalConnectorConfig::new(
            "acme",
            "Acme",
            VendorConfig::new(protocol, creds.mode()).with_base_url("https://api.acme.test"),
            creds,
        );
        ProtocolStrategy::for_config(&config, Arc::new(SshSftpTransport))
    }

    #[test]
    fn test_custom_protocol_uses_api() {
        let strategy = build(ProtocolType::Custom, VendorCredentials::api_key("k")).unwrap();
        assert_eq!(strategy.protocol(), ProtocolType::Api);
        assert!(strategy.moves_data());
    }

    #[test]
    fn test_strategy_per_protocol() {
        let sftp = build(
            ProtocolType::Sftp,
            VendorCredentials::sftp_password("sftp.acme.test", "u", "p"),
        )
        .unwrap();
        assert_eq!(sftp.protocol(), ProtocolType::Sftp);

        let edi = build(ProtocolType::Edi, VendorCredentials::edi("P", "S", "R")).unwrap();
        assert_eq!(edi.protocol(), ProtocolType::Edi);

        let webhook = build(ProtocolType::Webhook, VendorCredentials::None).unwrap();
        assert_eq!(webhook.protocol(), ProtocolType::Webhook);
        assert!(!webhook.moves_data());
    }

    #[tokio::test]
    async fn test_webhook_validates_endpoint_presence() {
        let webhook = build(ProtocolType::Webhook, VendorCredentials::None).unwrap();
        assert!(webhook.validate(&OperationContext::new()).await.unwrap());

        let config = UniversalConnectorConfig::new(
            "hook",
            "Hook",
            VendorConfig::new(ProtocolType::Webhook, AuthenticationMode::None),
            VendorCredentials::None,
        );
        let bare = ProtocolStrategy::for_config(&config, Arc::new(SshSftpTransport)).unwrap();
        assert!(!bare.validate(&OperationContext::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_api_fetch_is_unsupported() {
        let edi = build(ProtocolType::Edi, VendorCredentials::edi("P", "S", "R")).unwrap();
        let err = edi
            .fetch("get_products", "/products", &[], &OperationContext::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::Unsupported {
                protocol: ProtocolType::Edi,
                operation: "get_products"
            }
        ));
    }

    #[tokio::test]
    async fn test_api_fetch_before_validate() {
        let api = build(ProtocolType::Api, VendorCredentials::api_key("k")).unwrap();
        let err = api
            .fetch("get_products", "/products", &[], &OperationContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::ClientNotInitialized));
    }
}
