//! Vendor credential model.
//!
//! Credentials are a tagged union per authentication mode, so a connector only
//! ever sees the fields its protocol uses. Secret material is held in
//! [`SecretString`] and never appears in `Debug` output.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{ConnectorError, ConnectorResult};
use crate::types::{AuthenticationMode, ProtocolType};

/// Authentication material for one vendor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "auth_type", rename_all = "snake_case")]
pub enum VendorCredentials {
    /// No authentication.
    #[default]
    None,

    /// Static API key sent as a header.
    ApiKey {
        api_key: SecretString,
        #[serde(default)]
        api_secret: Option<SecretString>,
        #[serde(default = "default_api_key_header")]
        header_name: String,
    },

    /// `OAuth2` client credentials, optionally with a token already issued.
    #[serde(rename = "oauth2")]
    OAuth2 {
        client_id: String,
        client_secret: SecretString,
        #[serde(default)]
        token_url: Option<String>,
        #[serde(default)]
        access_token: Option<SecretString>,
        #[serde(default)]
        refresh_token: Option<SecretString>,
        #[serde(default)]
        expires_at: Option<DateTime<Utc>>,
        #[serde(default)]
        scopes: Vec<String>,
    },

    /// Pre-issued bearer token.
    Bearer { token: SecretString },

    /// HTTP basic authentication.
    Basic {
        username: String,
        password: SecretString,
    },

    /// SFTP login.
    Sftp {
        host: String,
        #[serde(default = "default_sftp_port")]
        port: u16,
        username: String,
        auth: SftpAuth,
    },

    /// EDI trading-partner identifiers.
    Edi {
        #[serde(default)]
        partner_id: Option<String>,
        #[serde(default)]
        sender_id: Option<String>,
        #[serde(default)]
        receiver_id: Option<String>,
    },

    /// Arbitrary headers and query parameters.
    Custom {
        #[serde(default)]
        headers: BTreeMap<String, String>,
        #[serde(default)]
        params: BTreeMap<String, String>,
    },
}

/// SFTP authentication method.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SftpAuth {
    Password {
        password: SecretString,
    },
    PrivateKey {
        private_key: SecretString,
        #[serde(default)]
        passphrase: Option<SecretString>,
    },
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

fn default_sftp_port() -> u16 {
    22
}

fn secret(value: impl Into<String>) -> SecretString {
    SecretString::new(value.into())
}

impl VendorCredentials {
    /// API key credentials using the `X-API-Key` header.
    pub fn api_key(key: impl Into<String>) -> Self {
        VendorCredentials::ApiKey {
            api_key: secret(key),
            api_secret: None,
            header_name: default_api_key_header(),
        }
    }

    /// `OAuth2` client credentials.
    pub fn oauth2(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        VendorCredentials::OAuth2 {
            client_id: client_id.into(),
            client_secret: secret(client_secret),
            token_url: None,
            access_token: None,
            refresh_token: None,
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    /// Bearer token credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        VendorCredentials::Bearer {
            token: secret(token),
        }
    }

    /// Basic authentication credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        VendorCredentials::Basic {
            username: username.into(),
            password: secret(password),
        }
    }

    /// SFTP credentials authenticated by password.
    pub fn sftp_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        VendorCredentials::Sftp {
            host: host.into(),
            port: default_sftp_port(),
            username: username.into(),
            auth: SftpAuth::Password {
                password: secret(password),
            },
        }
    }

    /// SFTP credentials authenticated by private key.
    pub fn sftp_key(
        host: impl Into<String>,
        username: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        VendorCredentials::Sftp {
            host: host.into(),
            port: default_sftp_port(),
            username: username.into(),
            auth: SftpAuth::PrivateKey {
                private_key: secret(private_key),
                passphrase: None,
            },
        }
    }

    /// EDI identifiers.
    pub fn edi(
        partner_id: impl Into<String>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
    ) -> Self {
        VendorCredentials::Edi {
            partner_id: Some(partner_id.into()),
            sender_id: Some(sender_id.into()),
            receiver_id: Some(receiver_id.into()),
        }
    }

    /// Set an already-issued access token on `OAuth2` credentials.
    ///
    /// Has no effect on other variants.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>, expires: DateTime<Utc>) -> Self {
        if let VendorCredentials::OAuth2 {
            access_token,
            expires_at,
            ..
        } = &mut self
        {
            *access_token = Some(secret(token));
            *expires_at = Some(expires);
        }
        self
    }

    /// Attach a refresh token to `OAuth2` credentials.
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        if let VendorCredentials::OAuth2 { refresh_token, .. } = &mut self {
            *refresh_token = Some(secret(token));
        }
        self
    }

    /// Set the token endpoint on `OAuth2` credentials.
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        if let VendorCredentials::OAuth2 { token_url, .. } = &mut self {
            *token_url = Some(url.into());
        }
        self
    }

    /// Authentication mode these credentials implement.
    #[must_use]
    pub fn mode(&self) -> AuthenticationMode {
        match self {
            VendorCredentials::None => AuthenticationMode::None,
            VendorCredentials::ApiKey { .. } => AuthenticationMode::ApiKey,
            VendorCredentials::OAuth2 { .. } => AuthenticationMode::OAuth2,
            VendorCredentials::Bearer { .. } => AuthenticationMode::Bearer,
            VendorCredentials::Basic { .. } => AuthenticationMode::Basic,
            VendorCredentials::Sftp {
                auth: SftpAuth::Password { .. },
                ..
            } => AuthenticationMode::SftpPassword,
            VendorCredentials::Sftp {
                auth: SftpAuth::PrivateKey { .. },
                ..
            } => AuthenticationMode::SftpKey,
            VendorCredentials::Edi { .. } => AuthenticationMode::Edi,
            VendorCredentials::Custom { .. } => AuthenticationMode::Custom,
        }
    }

    /// Whether these credentials can be used with the given protocol.
    #[must_use]
    pub fn supports(&self, protocol: ProtocolType) -> bool {
        match protocol {
            ProtocolType::Api | ProtocolType::Custom | ProtocolType::Webhook => !matches!(
                self,
                VendorCredentials::Sftp { .. } | VendorCredentials::Edi { .. }
            ),
            ProtocolType::Sftp => matches!(self, VendorCredentials::Sftp { .. }),
            ProtocolType::Edi => matches!(self, VendorCredentials::Edi { .. }),
        }
    }

    /// Reject credentials whose shape does not fit the protocol, or whose
    /// required fields are blank.
    pub fn validate_for(&self, protocol: ProtocolType) -> ConnectorResult<()> {
        if !self.supports(protocol) {
            return Err(ConnectorError::invalid_config(format!(
                "{} credentials cannot be used with the {protocol} protocol",
                self.mode()
            )));
        }

        let missing = |field: &'static str| ConnectorError::MissingCredential { field, protocol };

        match self {
            VendorCredentials::ApiKey { api_key, .. } if api_key.expose_secret().is_empty() => {
                Err(missing("api_key"))
            }
            VendorCredentials::OAuth2 { client_id, .. } if client_id.is_empty() => {
                Err(missing("client_id"))
            }
            VendorCredentials::Bearer { token } if token.expose_secret().is_empty() => {
                Err(missing("token"))
            }
            VendorCredentials::Basic { username, .. } if username.is_empty() => {
                Err(missing("username"))
            }
            VendorCredentials::Sftp { host, .. } if host.is_empty() => Err(missing("host")),
            VendorCredentials::Sftp { username, .. } if username.is_empty() => {
                Err(missing("username"))
            }
            _ => Ok(()),
        }
    }
}

/// Credentials plus the protocol-independent parts supplied with them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialBundle {
    /// Authentication material.
    #[serde(default)]
    pub credentials: VendorCredentials,

    /// Headers added to every request.
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,

    /// Replaces `endpoints.base_url` when set.
    #[serde(default)]
    pub endpoint_override: Option<String>,
}

impl CredentialBundle {
    pub fn new(credentials: VendorCredentials) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_endpoint_override(mut self, url: impl Into<String>) -> Self {
        self.endpoint_override = Some(url.into());
        self
    }
}

impl From<VendorCredentials> for CredentialBundle {
    fn from(credentials: VendorCredentials) -> Self {
        Self::new(credentials)
    }
}
