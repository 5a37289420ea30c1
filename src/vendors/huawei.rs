//! Huawei OceanStor Driver
//!
//! Parses the whitespace-aligned table printed by `show storage_pool general`
//! and the `key : value` block printed by `show system general`.

use super::{finish_report, is_record_candidate, normalize_capacity, push_record};
use crate::domain::ports::{CommandSet, ParseReport, PoolRecord, VendorDriver, VendorModel};
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

// =============================================================================
// Output Layout
// =============================================================================

/// Blank line, column labels and the dashed separator row
const HEADER_LINES: usize = 3;

const COL_ID: usize = 0;
const COL_NAME: usize = 1;
const COL_TOTAL_CAPACITY: usize = 5;
const COL_FREE_CAPACITY: usize = 6;

const PRODUCT_VERSION_LABEL: &str = "Product Version";
const PATCH_VERSION_LABEL: &str = "Patch Version";

const COMMANDS: CommandSet = CommandSet {
    pools: "show storage_pool general",
    firmware: "show system general",
};

static COLUMN_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

// =============================================================================
// Huawei Driver
// =============================================================================

/// Driver for Huawei OceanStor arrays
#[derive(Debug, Clone, Copy, Default)]
pub struct HuaweiDriver;

impl HuaweiDriver {
    fn parse_line(
        &self,
        array: &str,
        line_no: usize,
        fields: &[&str],
        firmware: &str,
    ) -> Result<PoolRecord> {
        if fields.len() <= COL_FREE_CAPACITY {
            return Err(Error::ParseFailure {
                vendor: VendorModel::Huawei.to_string(),
                array: array.to_string(),
                reason: format!(
                    "line {} has {} columns, expected at least {}",
                    line_no + 1,
                    fields.len(),
                    COL_FREE_CAPACITY + 1
                ),
            });
        }

        let total = normalize_capacity(fields[COL_TOTAL_CAPACITY])?;
        let free = normalize_capacity(fields[COL_FREE_CAPACITY])?;

        // OceanStor does not report used capacity
        Ok(PoolRecord::new(
            fields[COL_ID],
            array,
            fields[COL_NAME],
            firmware,
            total,
            free,
            total - free,
        ))
    }
}

/// Strip tabs and edge whitespace, then collapse column gaps to one space
fn normalize_row(line: &str) -> String {
    let line = line.replace('\t', "");
    COLUMN_GAP.replace_all(line.trim(), " ").into_owned()
}

/// Value after the first colon of the first line carrying `label`, with all
/// whitespace removed
fn labelled_value(raw: &str, label: &str) -> Option<String> {
    raw.lines()
        .filter(|line| line.contains(label))
        .find_map(|line| line.split(':').nth(1))
        .map(|value| value.chars().filter(|c| !c.is_whitespace()).collect())
}

impl VendorDriver for HuaweiDriver {
    fn model(&self) -> VendorModel {
        VendorModel::Huawei
    }

    fn commands(&self) -> Option<CommandSet> {
        Some(COMMANDS)
    }

    /// `"<product version>, <patch version>"`, or only the product version
    /// when no patch is installed
    fn extract_firmware(&self, array: &str, raw: &str) -> Result<String> {
        let version = labelled_value(raw, PRODUCT_VERSION_LABEL)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::ParseFailure {
                vendor: VendorModel::Huawei.to_string(),
                array: array.to_string(),
                reason: format!("no {} in system output", PRODUCT_VERSION_LABEL),
            })?;

        match labelled_value(raw, PATCH_VERSION_LABEL).filter(|p| !p.is_empty()) {
            Some(patch) => Ok(format!("{}, {}", version, patch)),
            None => Ok(version),
        }
    }

    fn parse_pools(&self, array: &str, raw: &str, firmware: &str) -> Result<ParseReport> {
        let mut report = ParseReport::default();
        let mut candidates = 0;

        for (line_no, line) in raw.lines().enumerate().skip(HEADER_LINES) {
            let row = normalize_row(line);
            let fields: Vec<&str> = row.split(' ').collect();
            if !is_record_candidate(&fields) {
                continue;
            }
            candidates += 1;

            match self.parse_line(array, line_no, &fields, firmware) {
                Ok(record) => push_record(&mut report, record),
                Err(e) => report.issues.push(e),
            }
        }

        finish_report(report, candidates, VendorModel::Huawei, array)
    }
}
