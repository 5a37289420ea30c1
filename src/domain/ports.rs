//! Domain Ports - Core types and trait definitions for the capacity inventory
//!
//! These traits define the boundaries between the collection/aggregation logic
//! and external systems (remote sessions, vendor command sets, metrics sinks).
//! Adapters implement these traits to provide concrete functionality.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

// =============================================================================
// Vendor Models
// =============================================================================

/// Storage controller vendors known to the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorModel {
    /// IBM Spectrum Virtualize (SVC, Storwize, FlashSystem)
    Ibm,
    /// Huawei OceanStor
    Huawei,
    /// HPE 3PAR
    #[serde(rename = "3par")]
    ThreePar,
    /// Dell EMC
    Dell,
}

impl VendorModel {
    /// All known models, in registry order
    pub const ALL: [VendorModel; 4] = [
        VendorModel::Ibm,
        VendorModel::Huawei,
        VendorModel::ThreePar,
        VendorModel::Dell,
    ];
}

impl std::fmt::Display for VendorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VendorModel::Ibm => write!(f, "ibm"),
            VendorModel::Huawei => write!(f, "huawei"),
            VendorModel::ThreePar => write!(f, "3par"),
            VendorModel::Dell => write!(f, "dell"),
        }
    }
}

impl std::str::FromStr for VendorModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ibm" => Ok(VendorModel::Ibm),
            "huawei" => Ok(VendorModel::Huawei),
            "3par" | "hpe" => Ok(VendorModel::ThreePar),
            "dell" => Ok(VendorModel::Dell),
            other => Err(Error::UnsupportedVendor {
                model: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Inventory Types
// =============================================================================

/// One storage array to query, as supplied by the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDescriptor {
    /// Array name (used in logs and metric tags)
    pub name: String,
    /// Management host name or IP
    pub address: String,
    /// Site tag (e.g. P16, Z141, Stretched)
    pub site: String,
    /// Free-form tier tag combining locality and media (e.g. "Internal SSD")
    pub array_type: String,
    /// Client the capacity is reported for
    pub client: String,
    /// Vendor model selecting the command set and parser
    pub model: VendorModel,
}

// =============================================================================
// Pool Record
// =============================================================================

/// A normalized storage pool, one per parsed line of vendor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRecord {
    /// Pool ID as reported by the array
    pub id: String,
    /// Name of the array the pool belongs to
    pub array_name: String,
    /// Pool name as reported by the array
    pub pool_name: String,
    /// Firmware/version string of the array
    pub firmware: String,
    /// Site tag from inventory
    pub site: String,
    /// Tier tag from inventory
    pub pool_type: String,
    /// Client from inventory
    pub client: String,
    /// Total capacity in bytes
    pub capacity_total_bytes: f64,
    /// Free capacity in bytes
    pub capacity_free_bytes: f64,
    /// Used capacity in bytes
    pub capacity_used_bytes: f64,
    /// used / total; `None` when total capacity is zero
    pub allocation_fraction: Option<f64>,
}

impl PoolRecord {
    /// Create a record from parsed vendor values. Inventory tags are empty
    /// until [`PoolRecord::with_inventory_tags`] is applied.
    pub fn new(
        id: impl Into<String>,
        array_name: impl Into<String>,
        pool_name: impl Into<String>,
        firmware: impl Into<String>,
        total_bytes: f64,
        free_bytes: f64,
        used_bytes: f64,
    ) -> Self {
        Self {
            id: id.into(),
            array_name: array_name.into(),
            pool_name: pool_name.into(),
            firmware: firmware.into(),
            site: String::new(),
            pool_type: String::new(),
            client: String::new(),
            capacity_total_bytes: total_bytes,
            capacity_free_bytes: free_bytes,
            capacity_used_bytes: used_bytes,
            allocation_fraction: allocation_fraction(used_bytes, total_bytes),
        }
    }

    /// Attach site, type and client from the inventory descriptor
    pub fn with_inventory_tags(mut self, array: &ArrayDescriptor) -> Self {
        self.site = array.site.clone();
        self.pool_type = array.array_type.clone();
        self.client = array.client.clone();
        self
    }
}

/// Compute used/total, refusing to produce a non-finite value
pub fn allocation_fraction(used_bytes: f64, total_bytes: f64) -> Option<f64> {
    if total_bytes == 0.0 {
        return None;
    }
    let fraction = used_bytes / total_bytes;
    fraction.is_finite().then_some(fraction)
}

// =============================================================================
// Remote Session Port
// =============================================================================

/// Credential methods tried when opening a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Direct password authentication
    Password,
    /// Challenge-response answering every prompt with the password
    KeyboardInteractive,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Password => write!(f, "password"),
            AuthMethod::KeyboardInteractive => write!(f, "keyboard-interactive"),
        }
    }
}

/// An authenticated command-execution session on one array
#[async_trait]
pub trait RemoteSession: Send {
    /// Run a command, returning combined stdout/stderr
    async fn execute(&mut self, command: &str) -> Result<Vec<u8>>;

    /// Release the session
    async fn close(&mut self) -> Result<()>;
}

/// Port for opening remote sessions
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Open a session to the array using one credential method
    async fn connect(
        &self,
        array: &ArrayDescriptor,
        method: AuthMethod,
    ) -> Result<Box<dyn RemoteSession>>;
}

// =============================================================================
// Vendor Driver Port
// =============================================================================

/// The fixed pair of commands run against an array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSet {
    /// Pool-listing command
    pub pools: &'static str,
    /// Firmware/version command
    pub firmware: &'static str,
}

/// Outcome of parsing one array's output
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Records that parsed cleanly
    pub records: Vec<PoolRecord>,
    /// Record-level problems that were skipped over
    pub issues: Vec<Error>,
}

/// Port for vendor-specific command sets and output grammars
pub trait VendorDriver: Send + Sync {
    /// Vendor this driver handles
    fn model(&self) -> VendorModel;

    /// Commands to run, or `None` when the vendor is not yet supported
    fn commands(&self) -> Option<CommandSet>;

    /// Extract the firmware/version string from the firmware command output
    fn extract_firmware(&self, array: &str, raw: &str) -> Result<String>;

    /// Parse pool-listing output into records carrying `firmware`
    fn parse_pools(&self, array: &str, raw: &str, firmware: &str) -> Result<ParseReport>;

    /// Parse both outputs of one array
    fn parse(&self, array: &str, pool_output: &str, firmware_output: &str) -> Result<ParseReport> {
        let (firmware, firmware_issue) = match self.extract_firmware(array, firmware_output) {
            Ok(firmware) => (firmware, None),
            Err(e) => (String::new(), Some(e)),
        };

        match self.parse_pools(array, pool_output, &firmware) {
            Ok(mut report) => {
                report.issues.extend(firmware_issue);
                Ok(report)
            }
            Err(e) => {
                if let Some(issue) = firmware_issue {
                    warn!(array = %array, "{}", issue);
                }
                Err(e)
            }
        }
    }
}

// =============================================================================
// Metrics Sink Port
// =============================================================================

/// Port for the metrics write endpoint
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Write one line-protocol record
    async fn write(&self, line: &str) -> Result<()>;

    /// Human-readable endpoint for logs
    fn endpoint(&self) -> &str;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type SessionConnectorRef = Arc<dyn SessionConnector>;
pub type VendorDriverRef = Arc<dyn VendorDriver>;
pub type MetricsSinkRef = Arc<dyn MetricsSink>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_model_round_trip_names() {
        for model in VendorModel::ALL {
            let parsed: VendorModel = model.to_string().parse().unwrap();
            assert_eq!(parsed, model);
        }
        assert!("netapp".parse::<VendorModel>().is_err());
    }

    #[test]
    fn test_allocation_fraction_guards_zero_total() {
        assert_eq!(allocation_fraction(50.0, 200.0), Some(0.25));
        assert_eq!(allocation_fraction(0.0, 0.0), None);
        assert_eq!(allocation_fraction(10.0, 0.0), None);
    }

    #[test]
    fn test_pool_record_tags_come_from_inventory() {
        let array = ArrayDescriptor {
            name: "v7k-01".into(),
            address: "10.0.0.1".into(),
            site: "P16".into(),
            array_type: "Internal SSD".into(),
            client: "Telia".into(),
            model: VendorModel::Ibm,
        };
        let record = PoolRecord::new("0", "v7k-01", "P16_SSD01", "8.3.1.5", 100.0, 40.0, 60.0)
            .with_inventory_tags(&array);

        assert_eq!(record.site, "P16");
        assert_eq!(record.pool_type, "Internal SSD");
        assert_eq!(record.client, "Telia");
        assert_eq!(record.allocation_fraction, Some(0.6));
    }

    #[test]
    fn test_auth_method_display() {
        assert_eq!(AuthMethod::Password.to_string(), "password");
        assert_eq!(
            AuthMethod::KeyboardInteractive.to_string(),
            "keyboard-interactive"
        );
    }
}
