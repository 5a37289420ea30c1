//! Placeholder driver for vendors without a parser yet.
//!
//! Arrays of these models are accepted in the inventory but contribute no
//! pools and raise no errors.

use crate::domain::ports::{CommandSet, ParseReport, VendorDriver, VendorModel};
use crate::error::Result;

/// No-op driver for a not-yet-supported vendor
#[derive(Debug, Clone, Copy)]
pub struct StubDriver {
    model: VendorModel,
}

impl StubDriver {
    pub fn new(model: VendorModel) -> Self {
        Self { model }
    }
}

impl VendorDriver for StubDriver {
    fn model(&self) -> VendorModel {
        self.model
    }

    fn commands(&self) -> Option<CommandSet> {
        None
    }

    fn extract_firmware(&self, _array: &str, _raw: &str) -> Result<String> {
        Ok(String::new())
    }

    fn parse_pools(&self, _array: &str, _raw: &str, _firmware: &str) -> Result<ParseReport> {
        Ok(ParseReport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_parses_to_nothing() {
        let driver = StubDriver::new(VendorModel::ThreePar);
        assert_eq!(driver.model(), VendorModel::ThreePar);
        assert!(driver.commands().is_none());

        let report = driver.parse("3par-01", "anything\nat all", "fw").unwrap();
        assert!(report.records.is_empty());
        assert!(report.issues.is_empty());
    }
}
