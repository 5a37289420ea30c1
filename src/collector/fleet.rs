//! Fleet Collection
//!
//! Fans collection out over every array with a bounded number of arrays in
//! flight, then fans the reports back in, in inventory order.

use super::array::{ArrayCollector, ArrayReport};
use crate::domain::ports::ArrayDescriptor;
use crate::error::Error;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for fleet collection
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Arrays collected concurrently
    pub concurrency: usize,
    /// Upper bound on one array's collection
    pub array_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            array_timeout: Duration::from_secs(120),
        }
    }
}

// =============================================================================
// Fleet Collector
// =============================================================================

/// Collects every array of the inventory
pub struct FleetCollector {
    config: CollectorConfig,
    collector: Arc<ArrayCollector>,
}

impl FleetCollector {
    /// Create a new fleet collector
    pub fn new(config: CollectorConfig, collector: ArrayCollector) -> Self {
        Self {
            config,
            collector: Arc::new(collector),
        }
    }

    /// Collect all arrays. Returns one report per array, in input order.
    pub async fn collect(&self, arrays: &[ArrayDescriptor]) -> Vec<ArrayReport> {
        info!(
            "Collecting {} arrays ({} at a time)",
            arrays.len(),
            self.config.concurrency.max(1)
        );

        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let timeout = self.config.array_timeout;

        let handles: Vec<_> = arrays
            .iter()
            .cloned()
            .map(|array| {
                let collector = self.collector.clone();
                let permits = permits.clone();
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await;
                    match tokio::time::timeout(timeout, collector.collect(&array)).await {
                        Ok(report) => report,
                        Err(_) => {
                            let e = Error::CollectionTimeout {
                                array: array.name.clone(),
                                seconds: timeout.as_secs(),
                            };
                            error!(array = %array.name, "{}", e);
                            ArrayReport::failed(&array, e)
                        }
                    }
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(arrays)
            .map(|(joined, array)| match joined {
                Ok(report) => report,
                Err(e) => {
                    let e = Error::Internal(format!("collection task aborted: {}", e));
                    error!(array = %array.name, "{}", e);
                    ArrayReport::failed(array, e)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectionStatus;
    use crate::domain::ports::{AuthMethod, VendorModel};
    use crate::transport::FixtureConnector;
    use crate::vendors::VendorRegistry;
    use assert_matches::assert_matches;

    const IBM_POOLS: &str = include_str!("../../fixtures/ibm-pools.txt");
    const IBM_FIRMWARE: &str = include_str!("../../fixtures/ibm-firmware.txt");

    fn ibm_array(name: &str) -> ArrayDescriptor {
        ArrayDescriptor {
            name: name.into(),
            address: "192.0.2.10".into(),
            site: "Z141".into(),
            array_type: "Shared MIX".into(),
            client: "Telia".into(),
            model: VendorModel::Ibm,
        }
    }

    fn fleet(connector: FixtureConnector, config: CollectorConfig) -> FleetCollector {
        let connector = connector
            .with_output("lsmdiskgrp -bytes -delim ,", IBM_POOLS)
            .with_output("lssystem -delim , | grep -i code", IBM_FIRMWARE);
        FleetCollector::new(
            config,
            ArrayCollector::new(Arc::new(connector), VendorRegistry::default()),
        )
    }

    #[tokio::test]
    async fn test_one_bad_array_does_not_block_the_fleet() {
        let connector = FixtureConnector::new()
            .refuse("v7k-02", AuthMethod::Password)
            .refuse("v7k-02", AuthMethod::KeyboardInteractive);
        let fleet = fleet(connector, CollectorConfig::default());

        let arrays = vec![ibm_array("v7k-01"), ibm_array("v7k-02"), ibm_array("v7k-03")];
        let reports = fleet.collect(&arrays).await;

        let names: Vec<&str> = reports.iter().map(|r| r.array.as_str()).collect();
        assert_eq!(names, ["v7k-01", "v7k-02", "v7k-03"]);
        assert_eq!(reports[0].status, CollectionStatus::Succeeded);
        assert_eq!(reports[1].status, CollectionStatus::Failed);
        assert_eq!(reports[2].status, CollectionStatus::Succeeded);

        let pools: usize = reports.iter().map(|r| r.records.len()).sum();
        assert_eq!(pools, 4);
    }

    #[tokio::test]
    async fn test_slow_array_times_out() {
        let connector = FixtureConnector::new().with_latency("v7k-slow", Duration::from_secs(30));
        let fleet = fleet(
            connector,
            CollectorConfig {
                concurrency: 2,
                array_timeout: Duration::from_millis(50),
            },
        );

        let reports = fleet
            .collect(&[ibm_array("v7k-slow"), ibm_array("v7k-01")])
            .await;

        assert_eq!(reports[0].status, CollectionStatus::Failed);
        assert_matches!(reports[0].issues[0], Error::CollectionTimeout { .. });
        assert_eq!(reports[1].status, CollectionStatus::Succeeded);
        assert_eq!(reports[1].records.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_inventory() {
        let fleet = fleet(FixtureConnector::new(), CollectorConfig::default());
        assert!(fleet.collect(&[]).await.is_empty());
    }
}
