//! IBM Spectrum Virtualize Driver
//!
//! Parses `lsmdiskgrp -bytes -delim ,` output. Capacities are already raw
//! byte counts.

use super::{finish_report, is_record_candidate, normalize_capacity, push_record};
use crate::domain::ports::{CommandSet, ParseReport, PoolRecord, VendorDriver, VendorModel};
use crate::error::{Error, Result};

// =============================================================================
// Output Layout
// =============================================================================

const DELIMITER: char = ',';

const COL_ID: usize = 0;
const COL_NAME: usize = 1;
const COL_CAPACITY: usize = 5;
const COL_FREE_CAPACITY: usize = 7;
const COL_USED_CAPACITY: usize = 9;

const COMMANDS: CommandSet = CommandSet {
    pools: "lsmdiskgrp -bytes -delim ,",
    firmware: "lssystem -delim , | grep -i code",
};

// =============================================================================
// IBM Driver
// =============================================================================

/// Driver for IBM SVC/Storwize/FlashSystem arrays
#[derive(Debug, Clone, Copy, Default)]
pub struct IbmDriver;

impl IbmDriver {
    fn parse_line(
        &self,
        array: &str,
        line_no: usize,
        fields: &[&str],
        firmware: &str,
    ) -> Result<PoolRecord> {
        if fields.len() <= COL_USED_CAPACITY {
            return Err(Error::ParseFailure {
                vendor: VendorModel::Ibm.to_string(),
                array: array.to_string(),
                reason: format!(
                    "line {} has {} fields, expected at least {}",
                    line_no + 1,
                    fields.len(),
                    COL_USED_CAPACITY + 1
                ),
            });
        }

        let total = normalize_capacity(fields[COL_CAPACITY])?;
        let free = normalize_capacity(fields[COL_FREE_CAPACITY])?;
        let used = normalize_capacity(fields[COL_USED_CAPACITY])?;

        let id = fields[COL_ID].replace('\t', "");

        Ok(PoolRecord::new(
            id.trim(),
            array,
            fields[COL_NAME].trim(),
            firmware,
            total,
            free,
            used,
        ))
    }
}

impl VendorDriver for IbmDriver {
    fn model(&self) -> VendorModel {
        VendorModel::Ibm
    }

    fn commands(&self) -> Option<CommandSet> {
        Some(COMMANDS)
    }

    /// `code_level,8.3.1.5 (build 150.27.2104221539000)` yields `8.3.1.5`
    fn extract_firmware(&self, array: &str, raw: &str) -> Result<String> {
        raw.lines()
            .filter_map(|line| line.trim().split(DELIMITER).nth(1))
            .filter_map(|value| value.trim().split(' ').next())
            .find(|version| !version.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::ParseFailure {
                vendor: VendorModel::Ibm.to_string(),
                array: array.to_string(),
                reason: "no code_level value in firmware output".into(),
            })
    }

    fn parse_pools(&self, array: &str, raw: &str, firmware: &str) -> Result<ParseReport> {
        let mut report = ParseReport::default();
        let mut candidates = 0;

        // First line is the column header
        for (line_no, line) in raw.lines().enumerate().skip(1) {
            let fields: Vec<&str> = line.split(DELIMITER).collect();
            if !is_record_candidate(&fields) {
                continue;
            }
            candidates += 1;

            match self.parse_line(array, line_no, &fields, firmware) {
                Ok(record) => push_record(&mut report, record),
                Err(e) => report.issues.push(e),
            }
        }

        finish_report(report, candidates, VendorModel::Ibm, array)
    }
}
