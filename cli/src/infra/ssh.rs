//! SSH/SFTP implementation of the `RemoteConnector` and `RemoteSession` ports.
//!
//! One `russh` connection per session. Commands run on their own channel;
//! each transfer opens a short-lived SFTP subsystem channel.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use russh::ChannelMsg;
use russh::client::{self, AuthResult, Handle};
use russh::keys::{PrivateKey, PublicKey};
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::application::ports::{RemoteConnector, RemoteSession};
use crate::domain::remote::EXIT_STATUS_UNKNOWN;
use crate::domain::{CommandResult, CredentialBundle, HostDescriptor, RemoteError};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Accepts the server key of freshly provisioned hosts and logs its
/// fingerprint.
pub struct HostKeyLogger {
    host: String,
}

impl client::Handler for HostKeyLogger {
    type Error = russh::Error;

    fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        let fingerprint = server_public_key.fingerprint(russh::keys::ssh_key::HashAlg::Sha256);
        info!(host = %self.host, %fingerprint, algorithm = %server_public_key.algorithm(), "server key");
        async { Ok(true) }
    }
}

pub struct SshConnector {
    connect_timeout: Duration,
    key_passphrase: Option<String>,
}

impl SshConnector {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            key_passphrase: None,
        }
    }

    /// Decrypt encrypted login keys with `passphrase`.
    #[must_use]
    pub fn with_key_passphrase(mut self, passphrase: Option<String>) -> Self {
        self.key_passphrase = passphrase.filter(|p| !p.is_empty());
        self
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new(CONNECT_TIMEOUT)
    }
}

impl RemoteConnector for SshConnector {
    type Session = SshSession;

    async fn connect(&self, host: &HostDescriptor) -> Result<SshSession> {
        let address = host.address().to_string();
        let port = host.ssh_port;
        let connect_err = |reason: String| RemoteError::Connect {
            host: address.clone(),
            port,
            reason,
        };
        anyhow::ensure!(!address.is_empty(), connect_err("host has no address yet".into()));

        debug!(host = %address, port, "connecting");
        let stream = tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect((address.as_str(), port)),
        )
        .await
        .map_err(|_| connect_err(format!("timed out after {}s", self.connect_timeout.as_secs())))?
        .map_err(|e| connect_err(e.to_string()))?;

        let config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..client::Config::default()
        });
        let handler = HostKeyLogger {
            host: address.clone(),
        };
        let mut handle = tokio::time::timeout(
            self.connect_timeout,
            client::connect_stream(config, stream, handler),
        )
        .await
        .map_err(|_| connect_err("ssh handshake timed out".into()))?
        .map_err(|e| connect_err(e.to_string()))?;

        authenticate(&mut handle, host, &address, self.key_passphrase.as_deref()).await?;
        debug!(host = %address, user = %host.credentials.username, "authenticated");
        Ok(SshSession {
            handle,
            host: address,
        })
    }
}

/// One way to log in, in the order they are tried.
enum Login<'a> {
    Key(PrivateKey),
    Password(&'a str),
}

/// Key first, then password. A key that cannot be decoded is skipped and
/// its reason kept for the error report.
fn login_attempts<'a>(
    credentials: &'a CredentialBundle,
    passphrase: Option<&str>,
) -> (Vec<Login<'a>>, Vec<String>) {
    let mut logins = Vec::new();
    let mut skipped = Vec::new();
    if let Some(pair) = &credentials.ssh {
        match russh::keys::decode_secret_key(&pair.private_key, passphrase) {
            Ok(key) => logins.push(Login::Key(key)),
            Err(e) => skipped.push(format!("cannot decode private key: {e}")),
        }
    }
    if let Some(password) = credentials.password.as_deref().filter(|p| !p.is_empty()) {
        logins.push(Login::Password(password));
    }
    (logins, skipped)
}

async fn authenticate(
    handle: &mut Handle<HostKeyLogger>,
    host: &HostDescriptor,
    address: &str,
    passphrase: Option<&str>,
) -> Result<()> {
    let user = host.credentials.username.as_str();
    let (logins, mut failures) = login_attempts(&host.credentials, passphrase);
    if logins.is_empty() && failures.is_empty() {
        failures.push("no ssh key or password available".to_string());
    }

    for login in logins {
        let (method, result) = match login {
            Login::Key(key) => {
                let key = russh::keys::PrivateKeyWithHashAlg::new(Arc::new(key), None);
                ("publickey", handle.authenticate_publickey(user, key).await)
            }
            Login::Password(password) => {
                ("password", handle.authenticate_password(user, password).await)
            }
        };
        match result {
            Ok(AuthResult::Success) => {
                debug!(host = address, method, "login accepted");
                return Ok(());
            }
            Ok(AuthResult::Failure {
                remaining_methods, ..
            }) => failures.push(format!(
                "{method} rejected; server offers {remaining_methods:?}"
            )),
            Err(e) => failures.push(format!("{method}: {e}")),
        }
        debug!(host = address, method, "login failed, trying next method");
    }

    Err(RemoteError::Authentication {
        user: user.to_string(),
        host: address.to_string(),
        reason: failures.join("; "),
    }
    .into())
}

/// A live SSH connection. Closed explicitly with `close`.
pub struct SshSession {
    handle: Handle<HostKeyLogger>,
    host: String,
}

/// SFTP paths are relative to the login directory, so `~/x` becomes `x`.
pub(crate) fn sftp_path(path: &str) -> &str {
    match path {
        "~" => ".",
        p => p.strip_prefix("~/").unwrap_or(p),
    }
}

/// Every ancestor of `dir`, shallowest first.
pub(crate) fn dir_prefixes(dir: &str) -> Vec<String> {
    let absolute = dir.starts_with('/');
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for part in dir.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if !current.is_empty() || absolute {
            current.push('/');
        }
        current.push_str(part);
        prefixes.push(current.clone());
    }
    prefixes
}

impl SshSession {
    async fn sftp(&self) -> Result<SftpSession> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .context("opening sftp channel")?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .context("requesting sftp subsystem")?;
        SftpSession::new(channel.into_stream())
            .await
            .context("starting sftp session")
    }

    async fn upload_bytes(
        &self,
        content: &[u8],
        file_name: &str,
        dest_dir: &str,
        mode: Option<u32>,
    ) -> Result<()> {
        let remote = format!("{dest_dir}/{file_name}");
        let transfer_err = |reason: String| RemoteError::Transfer {
            path: remote.clone(),
            reason,
        };
        let sftp = self.sftp().await.map_err(|e| transfer_err(format!("{e:#}")))?;
        let dir = sftp_path(dest_dir);
        for prefix in dir_prefixes(dir) {
            // Existing directories fail here; that is fine.
            let _ = sftp.create_dir(prefix).await;
        }

        let path = format!("{dir}/{file_name}");
        let mut file = sftp
            .create(path)
            .await
            .map_err(|e| transfer_err(e.to_string()))?;
        file.write_all(content)
            .await
            .map_err(|e| transfer_err(e.to_string()))?;
        file.shutdown()
            .await
            .map_err(|e| transfer_err(e.to_string()))?;
        debug!(host = %self.host, path = %remote, bytes = content.len(), "uploaded");

        if let Some(mode) = mode {
            let out = self.exec(&format!("chmod {mode:o} {remote}")).await?;
            if !out.success() {
                return Err(transfer_err(format!("chmod failed: {}", out.combined_output())).into());
            }
        }
        Ok(())
    }
}

impl RemoteSession for SshSession {
    async fn exec(&self, command: &str) -> Result<CommandResult> {
        debug!(host = %self.host, command, "exec");
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .with_context(|| format!("opening channel on {}", self.host))?;
        channel
            .exec(true, command)
            .await
            .with_context(|| format!("starting '{command}' on {}", self.host))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = EXIT_STATUS_UNKNOWN;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                ChannelMsg::ExtendedData { data, ext } if ext == 1 => {
                    stderr.extend_from_slice(&data);
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    exit_code = i32::try_from(exit_status).unwrap_or(EXIT_STATUS_UNKNOWN);
                }
                _ => {}
            }
        }
        let result = CommandResult::new(
            exit_code,
            String::from_utf8_lossy(&stdout),
            String::from_utf8_lossy(&stderr),
        );
        debug!(host = %self.host, exit_code, "exec finished");
        Ok(result)
    }

    async fn upload_text(
        &self,
        content: &str,
        file_name: &str,
        dest_dir: &str,
        mode: Option<u32>,
    ) -> Result<()> {
        self.upload_bytes(content.as_bytes(), file_name, dest_dir, mode)
            .await
    }

    async fn upload_file(
        &self,
        local: &Path,
        file_name: &str,
        dest_dir: &str,
        mode: Option<u32>,
    ) -> Result<()> {
        let content = tokio::fs::read(local)
            .await
            .map_err(|e| RemoteError::Transfer {
                path: local.display().to_string(),
                reason: e.to_string(),
            })?;
        self.upload_bytes(&content, file_name, dest_dir, mode).await
    }

    async fn download_text(&self, remote_path: &str) -> Result<String> {
        let transfer_err = |reason: String| RemoteError::Transfer {
            path: remote_path.to_string(),
            reason,
        };
        let sftp = self.sftp().await.map_err(|e| transfer_err(format!("{e:#}")))?;
        let mut file = sftp
            .open(sftp_path(remote_path))
            .await
            .map_err(|e| transfer_err(e.to_string()))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .await
            .map_err(|e| transfer_err(e.to_string()))?;
        debug!(host = %self.host, path = remote_path, bytes = content.len(), "downloaded");
        Ok(content)
    }

    async fn close(self) -> Result<()> {
        if let Err(e) = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
        {
            warn!(host = %self.host, error = %e, "disconnect failed");
        }
        Ok(())
    }
}
