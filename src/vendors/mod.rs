//! Vendor Drivers
//!
//! Provides command sets and output parsers for storage controllers:
//! - IBM Spectrum Virtualize: delimited `lsmdiskgrp` output
//! - Huawei OceanStor: whitespace-tabulated `show storage_pool general` output
//! - HPE 3PAR, Dell: not yet supported (no-op)

pub mod huawei;
pub mod ibm;
pub mod stub;
pub mod units;

pub use huawei::*;
pub use ibm::*;
pub use stub::*;
pub use units::*;

use crate::domain::ports::{ParseReport, PoolRecord, VendorDriverRef, VendorModel};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// First field of table separator rows
const SEPARATOR_SENTINEL: &str = "--";

/// Lookup table of vendor drivers keyed by model
#[derive(Clone)]
pub struct VendorRegistry {
    drivers: BTreeMap<VendorModel, VendorDriverRef>,
}

impl VendorRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            drivers: BTreeMap::new(),
        }
    }

    /// Create a registry with every built-in driver
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(IbmDriver));
        registry.register(Arc::new(HuaweiDriver));
        registry.register(Arc::new(StubDriver::new(VendorModel::ThreePar)));
        registry.register(Arc::new(StubDriver::new(VendorModel::Dell)));
        registry
    }

    /// Register a driver, replacing any previous driver for the same model
    pub fn register(&mut self, driver: VendorDriverRef) {
        self.drivers.insert(driver.model(), driver);
    }

    /// Look up the driver for a model
    pub fn get(&self, model: VendorModel) -> Result<VendorDriverRef> {
        self.drivers
            .get(&model)
            .cloned()
            .ok_or_else(|| Error::UnsupportedVendor {
                model: model.to_string(),
            })
    }

    /// Registered models
    pub fn models(&self) -> impl Iterator<Item = VendorModel> + '_ {
        self.drivers.keys().copied()
    }
}

impl Default for VendorRegistry {
    fn default() -> Self {
        Self::with_builtin_drivers()
    }
}

/// A split line is a pool candidate when it has at least two fields and is
/// not a separator row. Anything else is noise.
fn is_record_candidate(fields: &[&str]) -> bool {
    fields.len() > 1 && fields[0].trim() != SEPARATOR_SENTINEL
}

/// Push a parsed record, flagging an undefined allocation fraction
fn push_record(report: &mut ParseReport, record: PoolRecord) {
    if record.allocation_fraction.is_none() {
        report.issues.push(Error::DivisionByZeroCapacity {
            array: record.array_name.clone(),
            pool: record.pool_name.clone(),
        });
    }
    report.records.push(record);
}

/// Turn a report in which every candidate line failed into a parse failure
fn finish_report(
    report: ParseReport,
    candidates: usize,
    vendor: VendorModel,
    array: &str,
) -> Result<ParseReport> {
    if candidates > 0 && report.records.is_empty() {
        for issue in &report.issues {
            warn!(array = %array, "{}", issue);
        }
        let reasons: Vec<String> = report.issues.iter().map(|e| e.to_string()).collect();
        return Err(Error::ParseFailure {
            vendor: vendor.to_string(),
            array: array.to_string(),
            reason: format!(
                "none of {} pool lines parsed ({})",
                candidates,
                reasons.join("; ")
            ),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_registry_has_every_builtin_model() {
        let registry = VendorRegistry::with_builtin_drivers();
        for model in VendorModel::ALL {
            assert_eq!(registry.get(model).unwrap().model(), model);
        }
    }

    #[test]
    fn test_empty_registry_rejects_lookup() {
        let registry = VendorRegistry::empty();
        assert_matches!(
            registry.get(VendorModel::Ibm).err(),
            Some(Error::UnsupportedVendor { .. })
        );
    }

    #[test]
    fn test_failed_parse_keeps_every_row_issue() {
        let report = ParseReport {
            records: Vec::new(),
            issues: vec![
                Error::MalformedCapacityValue { value: "x1".into() },
                Error::MalformedCapacityValue { value: "x2".into() },
            ],
        };

        let err = finish_report(report, 2, VendorModel::Huawei, "oceanstor").unwrap_err();

        assert_matches!(err, Error::ParseFailure { ref reason, .. } => {
            assert!(reason.contains("none of 2 pool lines"));
            assert!(reason.contains("\"x1\""));
            assert!(reason.contains("\"x2\""));
        });
    }

    #[test]
    fn test_partial_parse_is_kept() {
        let record = PoolRecord::new("0", "v7k", "p0", "", 10.0, 5.0, 5.0);
        let report = ParseReport {
            records: vec![record],
            issues: vec![Error::MalformedCapacityValue { value: "x".into() }],
        };

        let report = finish_report(report, 2, VendorModel::Ibm, "v7k").unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_record_candidate_rule() {
        assert!(is_record_candidate(&["0", "pool"]));
        assert!(!is_record_candidate(&["0"]));
        assert!(!is_record_candidate(&[""]));
        assert!(!is_record_candidate(&["--", "----"]));
    }
}
