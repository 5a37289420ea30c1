//! OpenSSH Session Adapter
//!
//! Opens one multiplexed OpenSSH master connection per array and runs
//! commands through its control socket. Passwords are fed by `sshpass`
//! through the `SSHPASS` environment variable.

use crate::domain::ports::{ArrayDescriptor, AuthMethod, RemoteSession, SessionConnector};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the OpenSSH connector
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Login user on the array CLI
    pub username: String,
    /// Password for both credential methods
    pub password: String,
    /// SSH port
    pub port: u16,
    /// Dial timeout for the master connection
    pub connect_timeout: Duration,
    /// Idle time after which an unreleased master connection exits
    pub control_persist: Duration,
    /// Directory holding control sockets
    pub control_dir: PathBuf,
    /// ssh client binary
    pub ssh_binary: String,
    /// sshpass binary
    pub sshpass_binary: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            port: 22,
            connect_timeout: Duration::from_secs(10),
            control_persist: Duration::from_secs(60),
            control_dir: std::env::temp_dir(),
            ssh_binary: "ssh".to_string(),
            sshpass_binary: "sshpass".to_string(),
        }
    }
}

// =============================================================================
// Connector
// =============================================================================

/// Session connector backed by the system OpenSSH client
pub struct SshConnector {
    config: SshConfig,
    next_socket: AtomicU64,
}

impl SshConnector {
    /// Create a new connector
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            next_socket: AtomicU64::new(0),
        }
    }

    fn control_path(&self, array: &ArrayDescriptor) -> PathBuf {
        let name: String = array
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let seq = self.next_socket.fetch_add(1, Ordering::Relaxed);
        self.config
            .control_dir
            .join(format!("aci-{}-{}-{}.sock", name, std::process::id(), seq))
    }

    fn destination(&self, array: &ArrayDescriptor) -> String {
        format!("{}@{}", self.config.username, array.address)
    }
}

#[async_trait]
impl SessionConnector for SshConnector {
    async fn connect(
        &self,
        array: &ArrayDescriptor,
        method: AuthMethod,
    ) -> Result<Box<dyn RemoteSession>> {
        let control_path = self.control_path(array);
        let destination = self.destination(array);

        debug!("Opening {} session to {} ({})", method, array.name, array.address);

        let mut cmd = Command::new(&self.config.sshpass_binary);
        cmd.arg("-e")
            .arg(&self.config.ssh_binary)
            .args(["-M", "-N"])
            .arg("-S")
            .arg(&control_path)
            .arg("-o")
            .arg(format!(
                "ControlPersist={}",
                self.config.control_persist.as_secs().max(1)
            ))
            .arg("-o")
            .arg(format!("PreferredAuthentications={}", method))
            .args(["-o", "PubkeyAuthentication=no"])
            .args(["-o", "NumberOfPasswordPrompts=1"])
            .arg("-o")
            .arg(format!(
                "ConnectTimeout={}",
                self.config.connect_timeout.as_secs().max(1)
            ))
            .args(["-o", "StrictHostKeyChecking=no"])
            .args(["-o", "UserKnownHostsFile=/dev/null"])
            .arg("-p")
            .arg(self.config.port.to_string())
            .arg(&destination)
            .env("SSHPASS", &self.config.password)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // The master detaches once authenticated; allow for the auth exchange
        // on top of the dial timeout.
        let deadline = self.config.connect_timeout * 2;
        let output = tokio::time::timeout(deadline, cmd.output())
            .await
            .map_err(|_| {
                Error::Internal(format!("{} login timed out after {:?}", method, deadline))
            })?
            .map_err(|e| Error::Internal(format!("failed to spawn ssh: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Internal(format!(
                "{} login failed ({}): {}",
                method,
                output.status,
                stderr.trim()
            )));
        }

        Ok(Box::new(SshSession {
            ssh_binary: self.config.ssh_binary.clone(),
            array: array.name.clone(),
            destination,
            control_path,
            closed: false,
        }))
    }
}

// =============================================================================
// Session
// =============================================================================

/// Commands multiplexed over one master connection
pub struct SshSession {
    ssh_binary: String,
    array: String,
    destination: String,
    control_path: PathBuf,
    closed: bool,
}

impl SshSession {
    fn base_command(&self, control_path: &Path) -> Command {
        let mut cmd = Command::new(&self.ssh_binary);
        cmd.arg("-S")
            .arg(control_path)
            .args(["-o", "ControlMaster=no"])
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn execute(&mut self, command: &str) -> Result<Vec<u8>> {
        let output = self
            .base_command(&self.control_path)
            .arg(&self.destination)
            .arg(command)
            .output()
            .await
            .map_err(|e| Error::CommandExecutionFailure {
                array: self.array.clone(),
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::CommandExecutionFailure {
                array: self.array.clone(),
                command: command.to_string(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        Ok(combined)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let status = self
            .base_command(&self.control_path)
            .args(["-O", "exit"])
            .arg(&self.destination)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        remove_control_socket(&self.control_path).await;

        if !status.success() {
            return Err(Error::Internal(format!(
                "ssh master for {} did not exit cleanly: {}",
                self.array, status
            )));
        }
        Ok(())
    }
}

/// Remove a leftover master socket. The master usually unlinks it on exit.
async fn remove_control_socket(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed control socket {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!("Could not remove control socket {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::VendorModel;

    fn array(name: &str) -> ArrayDescriptor {
        ArrayDescriptor {
            name: name.into(),
            address: "192.0.2.10".into(),
            site: "P16".into(),
            array_type: "Internal SSD".into(),
            client: "Telia".into(),
            model: VendorModel::Ibm,
        }
    }

    #[test]
    fn test_control_paths_are_unique_and_sanitized() {
        let connector = SshConnector::new(SshConfig::default());
        let a = connector.control_path(&array("v7k/p16 01"));
        let b = connector.control_path(&array("v7k/p16 01"));

        assert_ne!(a, b);
        let file = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(file.starts_with("aci-v7k_p16_01-"));
        assert!(file.ends_with(".sock"));
    }

    #[test]
    fn test_destination() {
        let connector = SshConnector::new(SshConfig {
            username: "monitor".into(),
            ..Default::default()
        });
        assert_eq!(connector.destination(&array("v7k")), "monitor@192.0.2.10");
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_login_error() {
        let connector = SshConnector::new(SshConfig {
            sshpass_binary: "/nonexistent/sshpass".into(),
            ..Default::default()
        });
        let result = connector.connect(&array("v7k"), AuthMethod::Password).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_leftover_control_socket_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctl-v7k");
        std::fs::write(&path, b"").unwrap();

        remove_control_socket(&path).await;
        assert!(!path.exists());

        // Already gone
        remove_control_socket(&path).await;
        assert!(!path.exists());
    }
}
