//! Per-Array Collection
//!
//! Runs one array through session acquisition, command execution, parsing
//! and inventory tagging. Every failure is logged and contained to the array.

use crate::domain::ports::{
    ArrayDescriptor, AuthMethod, PoolRecord, RemoteSession, SessionConnectorRef, VendorModel,
};
use crate::error::{Error, Result};
use crate::vendors::VendorRegistry;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

// =============================================================================
// Collection Report
// =============================================================================

/// Terminal state of one array's collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    /// A session was opened (or none was needed) and output was processed
    Succeeded,
    /// No session could be opened or the array timed out
    Failed,
}

/// What one array contributed to the run
#[derive(Debug)]
pub struct ArrayReport {
    /// Array name
    pub array: String,
    /// Vendor model
    pub vendor: VendorModel,
    /// Terminal state
    pub status: CollectionStatus,
    /// Tagged pool records
    pub records: Vec<PoolRecord>,
    /// Everything that went wrong along the way, already logged
    pub issues: Vec<Error>,
}

impl ArrayReport {
    pub(crate) fn failed(array: &ArrayDescriptor, error: Error) -> Self {
        Self {
            array: array.name.clone(),
            vendor: array.model,
            status: CollectionStatus::Failed,
            records: Vec::new(),
            issues: vec![error],
        }
    }
}

// =============================================================================
// Array Collector
// =============================================================================

/// Collects pool records from one array at a time
pub struct ArrayCollector {
    connector: SessionConnectorRef,
    registry: VendorRegistry,
}

impl ArrayCollector {
    /// Create a new array collector
    pub fn new(connector: SessionConnectorRef, registry: VendorRegistry) -> Self {
        Self {
            connector,
            registry,
        }
    }

    /// Collect every pool of one array
    pub async fn collect(&self, array: &ArrayDescriptor) -> ArrayReport {
        let driver = match self.registry.get(array.model) {
            Ok(driver) => driver,
            Err(e) => {
                error!(array = %array.name, "{}", e);
                return ArrayReport::failed(array, e);
            }
        };

        let Some(commands) = driver.commands() else {
            info!(
                array = %array.name,
                "{} arrays are not supported yet, skipping", array.model
            );
            return ArrayReport {
                array: array.name.clone(),
                vendor: array.model,
                status: CollectionStatus::Succeeded,
                records: Vec::new(),
                issues: Vec::new(),
            };
        };

        info!(array = %array.name, "Connecting to {} host {}", array.model, array.address);

        let mut session = match self.open_session(array).await {
            Ok(session) => session,
            Err(e) => {
                error!(array = %array.name, "{}", e);
                return ArrayReport::failed(array, e);
            }
        };

        let mut issues = Vec::new();
        let pool_output = run_command(session.as_mut(), array, commands.pools, &mut issues).await;
        let firmware_output =
            run_command(session.as_mut(), array, commands.firmware, &mut issues).await;

        if let Err(e) = session.close().await {
            warn!(array = %array.name, "Failed to release session: {}", e);
        }

        let mut records = Vec::new();
        match driver.parse(&array.name, &pool_output, &firmware_output) {
            Ok(report) => {
                for issue in &report.issues {
                    warn!(array = %array.name, "{}", issue);
                }
                records.extend(
                    report
                        .records
                        .into_iter()
                        .map(|record| record.with_inventory_tags(array)),
                );
                issues.extend(report.issues);
            }
            Err(e) => {
                error!(array = %array.name, "{}", e);
                issues.push(e);
            }
        }

        debug!(array = %array.name, "Collected {} pools", records.len());

        ArrayReport {
            array: array.name.clone(),
            vendor: array.model,
            status: CollectionStatus::Succeeded,
            records,
            issues,
        }
    }

    /// Password first, then keyboard-interactive
    async fn open_session(&self, array: &ArrayDescriptor) -> Result<Box<dyn RemoteSession>> {
        let primary = match self.connector.connect(array, AuthMethod::Password).await {
            Ok(session) => return Ok(session),
            Err(e) => e,
        };

        debug!(
            array = %array.name,
            "Password login failed ({}), trying keyboard-interactive", primary
        );

        self.connector
            .connect(array, AuthMethod::KeyboardInteractive)
            .await
            .map_err(|fallback| Error::ConnectionFailure {
                array: array.name.clone(),
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            })
    }
}

/// Run one command, logging and recording a failure as empty output
async fn run_command(
    session: &mut dyn RemoteSession,
    array: &ArrayDescriptor,
    command: &str,
    issues: &mut Vec<Error>,
) -> String {
    match session.execute(command).await {
        Ok(output) => String::from_utf8_lossy(&output).into_owned(),
        Err(e) => {
            error!(array = %array.name, "{}", e);
            issues.push(e);
            String::new()
        }
    }
}
