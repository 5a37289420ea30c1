//! Fixture Session Adapter
//!
//! Serves canned command output instead of talking to arrays. Used for
//! dry runs against captured output and throughout the test suite.

use crate::domain::ports::{ArrayDescriptor, AuthMethod, RemoteSession, SessionConnector};
use crate::error::{Error, Result};
use crate::vendors::VendorRegistry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Default, Clone)]
struct FixtureState {
    /// Output keyed by command, shared by every array
    outputs: HashMap<String, Vec<u8>>,
    /// Output keyed by (array, command), taking precedence
    array_outputs: HashMap<(String, String), Vec<u8>>,
    /// Credential methods that fail per array
    refused: HashMap<String, HashSet<AuthMethod>>,
    /// Commands that fail per array
    failing: HashSet<(String, String)>,
    /// Artificial command latency per array
    latency: HashMap<String, Duration>,
}

/// Session connector serving canned output
#[derive(Default)]
pub struct FixtureConnector {
    state: Arc<FixtureState>,
    attempts: Mutex<Vec<(String, AuthMethod)>>,
    closed: Arc<AtomicUsize>,
}

impl FixtureConnector {
    /// Create a connector with no fixtures
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `<vendor>-pools.txt` and `<vendor>-firmware.txt` for every
    /// registered vendor that has a command set
    pub fn from_dir(dir: &Path, registry: &VendorRegistry) -> Result<Self> {
        let mut connector = Self::new();

        for model in registry.models() {
            let Some(commands) = registry.get(model)?.commands() else {
                continue;
            };
            for (command, kind) in [(commands.pools, "pools"), (commands.firmware, "firmware")] {
                let path = dir.join(format!("{}-{}.txt", model, kind));
                if path.exists() {
                    debug!("Loading fixture {}", path.display());
                    connector = connector.with_output(command, std::fs::read(&path)?);
                }
            }
        }

        Ok(connector)
    }

    fn state_mut(&mut self) -> &mut FixtureState {
        Arc::make_mut(&mut self.state)
    }

    /// Serve `output` for `command` on every array
    pub fn with_output(mut self, command: &str, output: impl Into<Vec<u8>>) -> Self {
        self.state_mut()
            .outputs
            .insert(command.to_string(), output.into());
        self
    }

    /// Serve `output` for `command` on one array
    pub fn with_array_output(
        mut self,
        array: &str,
        command: &str,
        output: impl Into<Vec<u8>>,
    ) -> Self {
        self.state_mut()
            .array_outputs
            .insert((array.to_string(), command.to_string()), output.into());
        self
    }

    /// Reject logins to `array` using `method`
    pub fn refuse(mut self, array: &str, method: AuthMethod) -> Self {
        self.state_mut()
            .refused
            .entry(array.to_string())
            .or_default()
            .insert(method);
        self
    }

    /// Make `command` fail on `array`
    pub fn fail_command(mut self, array: &str, command: &str) -> Self {
        self.state_mut()
            .failing
            .insert((array.to_string(), command.to_string()));
        self
    }

    /// Delay every command on `array`
    pub fn with_latency(mut self, array: &str, latency: Duration) -> Self {
        self.state_mut()
            .latency
            .insert(array.to_string(), latency);
        self
    }

    /// Login attempts made so far, in order
    pub fn attempts(&self) -> Vec<(String, AuthMethod)> {
        self.attempts.lock().clone()
    }

    /// Number of sessions released
    pub fn closed_sessions(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for FixtureConnector {
    async fn connect(
        &self,
        array: &ArrayDescriptor,
        method: AuthMethod,
    ) -> Result<Box<dyn RemoteSession>> {
        self.attempts.lock().push((array.name.clone(), method));

        let refused = self
            .state
            .refused
            .get(&array.name)
            .is_some_and(|methods| methods.contains(&method));
        if refused {
            return Err(Error::Internal(format!("{} login refused", method)));
        }

        Ok(Box::new(FixtureSession {
            array: array.name.clone(),
            state: self.state.clone(),
            closed: self.closed.clone(),
        }))
    }
}

struct FixtureSession {
    array: String,
    state: Arc<FixtureState>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RemoteSession for FixtureSession {
    async fn execute(&mut self, command: &str) -> Result<Vec<u8>> {
        if let Some(latency) = self.state.latency.get(&self.array) {
            tokio::time::sleep(*latency).await;
        }

        let key = (self.array.clone(), command.to_string());
        if self.state.failing.contains(&key) {
            return Err(Error::CommandExecutionFailure {
                array: self.array.clone(),
                command: command.to_string(),
                reason: "exit status: 1".into(),
            });
        }

        self.state
            .array_outputs
            .get(&key)
            .or_else(|| self.state.outputs.get(command))
            .cloned()
            .ok_or_else(|| Error::CommandExecutionFailure {
                array: self.array.clone(),
                command: command.to_string(),
                reason: "no fixture for command".into(),
            })
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
