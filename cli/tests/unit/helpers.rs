//! Shared fakes for the unit tests.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::Path;
use std::process::Output;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use dockhand_cli::application::ports::{
    CommandRunner, ProgressReporter, RemoteConnector, RemoteSession, SecretStore,
};
use dockhand_cli::domain::cloud::VaultInfo;
use dockhand_cli::domain::{CommandResult, HostDescriptor};

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    std::process::ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub fn fail_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// `az` stand-in answering by argument prefix. Unmatched calls succeed with
/// empty output. Every call is recorded.
#[derive(Default)]
pub struct ScriptedAz {
    answers: Vec<(String, Output)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAz {
    pub fn answer(mut self, prefix: &str, output: Output) -> Self {
        self.answers.push((prefix.to_string(), output));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    fn reply(&self, args: &[&str]) -> Output {
        let joined = args.join(" ");
        self.calls.lock().unwrap().push(joined.clone());
        self.answers
            .iter()
            .find(|(prefix, _)| joined.starts_with(prefix.as_str()))
            .map_or_else(|| ok_output(""), |(_, out)| out.clone())
    }
}

impl CommandRunner for &ScriptedAz {
    async fn run(&self, _program: &str, args: &[&str]) -> Result<Output> {
        Ok(self.reply(args))
    }

    async fn run_with_timeout(
        &self,
        _program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        Ok(self.reply(args))
    }

    async fn run_with_stdin(&self, _program: &str, args: &[&str], _stdin: &[u8]) -> Result<Output> {
        Ok(self.reply(args))
    }
}

/// Reporter that discards everything.
pub struct Quiet;

impl ProgressReporter for Quiet {
    fn step(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

/// In-memory vault keeping write order.
#[derive(Default)]
pub struct MemoryVault {
    secrets: Mutex<HashMap<(String, String), String>>,
    writes: Mutex<Vec<String>>,
    vaults: Mutex<Vec<String>>,
}

impl MemoryVault {
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn remove(&self, vault: &str, key: &str) {
        self.secrets
            .lock()
            .unwrap()
            .remove(&(vault.to_string(), key.to_string()));
    }
}

impl SecretStore for MemoryVault {
    async fn find_vault(&self, name: &str) -> Result<Option<VaultInfo>> {
        let known = self.vaults.lock().unwrap().iter().any(|v| v == name);
        Ok(known.then(|| VaultInfo {
            name: name.to_string(),
            uri: format!("https://{name}.vault.azure.net/"),
            resource_group: "rg".to_string(),
            location: "westus".to_string(),
        }))
    }

    async fn create_vault(&self, name: &str, group: &str, location: &str) -> Result<VaultInfo> {
        self.vaults.lock().unwrap().push(name.to_string());
        Ok(VaultInfo {
            name: name.to_string(),
            uri: format!("https://{name}.vault.azure.net/"),
            resource_group: group.to_string(),
            location: location.to_string(),
        })
    }

    async fn signed_in_principal(&self) -> Result<String> {
        Ok("00000000-0000-0000-0000-000000000001".to_string())
    }

    async fn grant_secret_access(&self, _vault: &str, _object_id: &str) -> Result<()> {
        Ok(())
    }

    async fn set_secret(&self, vault: &str, key: &str, value: &str) -> Result<()> {
        self.writes.lock().unwrap().push(key.to_string());
        self.secrets
            .lock()
            .unwrap()
            .insert((vault.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn delete_secret(&self, vault: &str, key: &str) -> Result<()> {
        self.remove(vault, key);
        Ok(())
    }

    async fn get_secret(&self, vault: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .get(&(vault.to_string(), key.to_string()))
            .cloned())
    }

    async fn list_secret_names(&self, vault: &str) -> Result<Vec<String>> {
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .keys()
            .filter(|(v, _)| v == vault)
            .map(|(_, k)| k.clone())
            .collect())
    }
}

/// Connector whose sessions accept every command.
#[derive(Default)]
pub struct AcceptingConnector {
    connects: Mutex<u32>,
}

impl AcceptingConnector {
    pub fn connects(&self) -> u32 {
        *self.connects.lock().unwrap()
    }
}

pub struct AcceptingSession;

impl RemoteSession for AcceptingSession {
    async fn exec(&self, _command: &str) -> Result<CommandResult> {
        Ok(CommandResult::new(0, "", ""))
    }

    async fn upload_text(
        &self,
        _content: &str,
        _file_name: &str,
        _dest_dir: &str,
        _mode: Option<u32>,
    ) -> Result<()> {
        Ok(())
    }

    async fn upload_file(
        &self,
        _local: &Path,
        _file_name: &str,
        _dest_dir: &str,
        _mode: Option<u32>,
    ) -> Result<()> {
        Ok(())
    }

    async fn download_text(&self, remote_path: &str) -> Result<String> {
        anyhow::bail!("no such file: {remote_path}")
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

impl RemoteConnector for AcceptingConnector {
    type Session = AcceptingSession;

    async fn connect(&self, _host: &HostDescriptor) -> Result<AcceptingSession> {
        *self.connects.lock().unwrap() += 1;
        Ok(AcceptingSession)
    }
}
