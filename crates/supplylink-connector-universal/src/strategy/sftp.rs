//! SFTP strategy.
//!
//! Credentials are validated by logging in over SSH, opening the `sftp`
//! subsystem and closing the session again. File download and parsing are
//! not implemented, so data calls fail with `Unsupported`.

use async_trait::async_trait;
use russh::client;
use russh::Disconnect;
use russh_keys::key;
use russh_sftp::client::SftpSession as SftpClient;
use secrecy::ExposeSecret;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use supplylink_connector::context::OperationContext;
use supplylink_connector::credentials::{SftpAuth, VendorCredentials};
use supplylink_connector::error::{ConnectorError, ConnectorResult};
use supplylink_connector::types::ProtocolType;

use crate::config::UniversalConnectorConfig;

/// Where and as whom to log in.
#[derive(Clone)]
pub struct SftpTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: SftpAuth,
    pub timeout: Duration,
}

impl fmt::Debug for SftpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// An authenticated session. Dropping it releases the connection without
/// a graceful shutdown.
#[async_trait]
pub trait SftpSession: Send {
    /// Close the session gracefully.
    async fn close(self: Box<Self>) -> ConnectorResult<()>;
}

/// Opens SFTP sessions.
///
/// `connect` fails with `AuthenticationFailed` when the server refuses the
/// login material.
#[async_trait]
pub trait SftpTransport: Send + Sync + fmt::Debug {
    async fn connect(&self, target: &SftpTarget) -> ConnectorResult<Box<dyn SftpSession>>;
}

/// SSH transport: password or public-key login, then the `sftp` subsystem.
///
/// Server host keys are accepted without a known-hosts check.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshSftpTransport;

struct HostKeyPolicy {
    host: String,
}

#[async_trait]
impl client::Handler for HostKeyPolicy {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(
            host = %self.host,
            fingerprint = %server_public_key.fingerprint(),
            "Accepting SFTP host key"
        );
        Ok(true)
    }
}

struct SshSftpSession {
    sftp: SftpClient,
    handle: client::Handle<HostKeyPolicy>,
}

#[async_trait]
impl SftpSession for SshSftpSession {
    async fn close(self: Box<Self>) -> ConnectorResult<()> {
        let SshSftpSession { sftp, handle } = *self;
        drop(sftp);
        handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| ConnectorError::network_with_source("failed to close SFTP session", e))
    }
}

impl SshSftpTransport {
    async fn login(
        handle: &mut client::Handle<HostKeyPolicy>,
        target: &SftpTarget,
    ) -> ConnectorResult<bool> {
        let result = match &target.auth {
            SftpAuth::Password { password } => {
                handle
                    .authenticate_password(target.username.as_str(), password.expose_secret().as_str())
                    .await
            }
            SftpAuth::PrivateKey {
                private_key,
                passphrase,
            } => {
                let key_pair = russh_keys::decode_secret_key(
                    private_key.expose_secret(),
                    passphrase.as_ref().map(|p| p.expose_secret().as_str()),
                )
                .map_err(|e| {
                    ConnectorError::authentication(format!("private key could not be decoded: {e}"))
                })?;
                handle
                    .authenticate_publickey(target.username.as_str(), Arc::new(key_pair))
                    .await
            }
        };
        result.map_err(|e| ConnectorError::network_with_source("SSH authentication failed", e))
    }
}

#[async_trait]
impl SftpTransport for SshSftpTransport {
    async fn connect(&self, target: &SftpTarget) -> ConnectorResult<Box<dyn SftpSession>> {
        let timeout_secs = target.timeout.as_secs();
        let open = async {
            let config = Arc::new(client::Config {
                inactivity_timeout: Some(target.timeout),
                ..Default::default()
            });
            let policy = HostKeyPolicy {
                host: target.host.clone(),
            };
            let mut handle = client::connect(config, (target.host.as_str(), target.port), policy)
                .await
                .map_err(|e| {
                    ConnectorError::connection_failed_with_source(
                        format!("failed to connect to {}:{}", target.host, target.port),
                        e,
                    )
                })?;

            if !Self::login(&mut handle, target).await? {
                return Err(ConnectorError::authentication(format!(
                    "server refused login for user '{}'",
                    target.username
                )));
            }
            debug!(host = %target.host, user = %target.username, "SSH login accepted");

            let channel = handle
                .channel_open_session()
                .await
                .map_err(|e| ConnectorError::network_with_source("failed to open SSH channel", e))?;
            channel
                .request_subsystem(true, "sftp")
                .await
                .map_err(|e| ConnectorError::network_with_source("failed to start sftp subsystem", e))?;
            let sftp = SftpClient::new(channel.into_stream()).await.map_err(|e| {
                ConnectorError::connection_failed_with_source("SFTP handshake failed", e)
            })?;

            Ok::<_, ConnectorError>(Box::new(SshSftpSession { sftp, handle }) as Box<dyn SftpSession>)
        };

        tokio::time::timeout(target.timeout, open)
            .await
            .map_err(|_| ConnectorError::ConnectionTimeout { timeout_secs })?
    }
}

/// SFTP strategy state.
#[derive(Debug)]
pub struct SftpStrategy {
    target: SftpTarget,
    transport: Arc<dyn SftpTransport>,
}

impl SftpStrategy {
    pub fn new(
        config: &UniversalConnectorConfig,
        transport: Arc<dyn SftpTransport>,
    ) -> ConnectorResult<Self> {
        let VendorCredentials::Sftp {
            host,
            port,
            username,
            auth,
        } = config.credentials()
        else {
            return Err(ConnectorError::invalid_config(
                "SFTP vendors require SFTP credentials",
            ));
        };

        Ok(Self {
            target: SftpTarget {
                host: host.clone(),
                port: *port,
                username: username.clone(),
                auth: auth.clone(),
                timeout: config.settings.connect_timeout(),
            },
            transport,
        })
    }

    pub fn target(&self) -> &SftpTarget {
        &self.target
    }

    /// Open a session and close it again.
    ///
    /// Returns `Ok(false)` when the login material is blank or the server
    /// rejects it.
    pub async fn validate(&self, ctx: &OperationContext) -> ConnectorResult<bool> {
        let secret_present = match &self.target.auth {
            SftpAuth::Password { password } => !password.expose_secret().is_empty(),
            SftpAuth::PrivateKey { private_key, .. } => !private_key.expose_secret().is_empty(),
        };
        if !secret_present {
            warn!(host = %self.target.host, "SFTP credentials have no password or private key");
            return Ok(false);
        }

        let session = match ctx.run(self.transport.connect(&self.target)).await {
            Ok(session) => session,
            Err(e) if e.is_authentication() => {
                warn!(host = %self.target.host, error = %e, "SFTP login rejected");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        session.close().await?;
        info!(
            host = %self.target.host,
            port = self.target.port,
            "SFTP connection validated"
        );
        Ok(true)
    }

    pub fn unsupported(&self, operation: &'static str) -> ConnectorError {
        ConnectorError::unsupported(ProtocolType::Sftp, operation)
    }
}
