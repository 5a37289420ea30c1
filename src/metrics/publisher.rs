//! Metrics Publisher
//!
//! Writes one line per pool and one per client, all stamped with the same
//! batch timestamp. A failed write is logged and the batch continues.

use super::line_protocol::{client_line, pool_line, LineRecord};
use crate::aggregation::ClientSummary;
use crate::domain::ports::{MetricsSinkRef, PoolRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Configuration for the publisher
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Measurement for per-pool records
    pub pool_measurement: String,
    /// Measurement for per-client records
    pub client_measurement: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            pool_measurement: "pool_capacity".to_string(),
            client_measurement: "client_capacity".to_string(),
        }
    }
}

/// Outcome of one publish batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub sent: usize,
    pub failed: usize,
}

/// Publishes pool records and client summaries to a sink
pub struct Publisher {
    config: PublisherConfig,
    sink: MetricsSinkRef,
}

impl Publisher {
    /// Create a new publisher
    pub fn new(config: PublisherConfig, sink: MetricsSinkRef) -> Self {
        Self { config, sink }
    }

    /// Encode a batch without sending it
    pub fn lines(
        &self,
        records: &[PoolRecord],
        summaries: &[ClientSummary],
        timestamp_ns: i64,
    ) -> Vec<LineRecord> {
        records
            .iter()
            .map(|record| pool_line(&self.config.pool_measurement, record, timestamp_ns))
            .chain(summaries.iter().map(|summary| {
                client_line(&self.config.client_measurement, summary, timestamp_ns)
            }))
            .collect()
    }

    /// Send a batch, one write per line
    pub async fn publish(
        &self,
        records: &[PoolRecord],
        summaries: &[ClientSummary],
        timestamp_ns: i64,
    ) -> PublishReport {
        let mut report = PublishReport::default();

        for line in self.lines(records, summaries, timestamp_ns) {
            let encoded = line.to_string();
            match self.sink.write(&encoded).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!(measurement = %line.measurement, "Dropping record: {}", e);
                    debug!("Dropped line: {}", encoded);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Published {} records to {} ({} failed)",
            report.sent,
            self.sink.endpoint(),
            report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{CapacityAggregator, SiteLayout};
    use crate::domain::ports::MetricsSink;
    use crate::error::{Error, Result};
    use crate::metrics::MemorySink;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Sink that rejects every other write
    #[derive(Default)]
    struct FlakySink {
        calls: Mutex<usize>,
        accepted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MetricsSink for FlakySink {
        async fn write(&self, line: &str) -> Result<()> {
            let mut calls = self.calls.lock();
            *calls += 1;
            if *calls % 2 == 0 {
                return Err(Error::PublishFailure {
                    endpoint: "flaky".into(),
                    reason: "HTTP 500".into(),
                });
            }
            self.accepted.lock().push(line.to_string());
            Ok(())
        }

        fn endpoint(&self) -> &str {
            "flaky"
        }
    }

    fn records() -> Vec<PoolRecord> {
        (0..3)
            .map(|i| {
                let mut record = PoolRecord::new(
                    i.to_string(),
                    "v7k-01",
                    format!("pool{}", i),
                    "8.3",
                    10.0,
                    5.0,
                    5.0,
                );
                record.site = "P16".into();
                record.pool_type = "Internal SSD".into();
                record.client = "Telia".into();
                record
            })
            .collect()
    }

    #[tokio::test]
    async fn test_publish_shares_one_timestamp() {
        let sink = Arc::new(MemorySink::new());
        let publisher = Publisher::new(PublisherConfig::default(), sink.clone());
        let records = records();
        let summaries = CapacityAggregator::new(SiteLayout::default())
            .summarize_all(&["Telia".to_string()], &records);

        let report = publisher.publish(&records, &summaries, 1234).await;

        assert_eq!(report, PublishReport { sent: 4, failed: 0 });
        let lines = sink.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.ends_with(" 1234")));
        assert!(lines[0].starts_with("pool_capacity,ID=0v7k-01,"));
        assert!(lines[3].starts_with("client_capacity,client=Telia "));
    }

    #[tokio::test]
    async fn test_publish_continues_after_failure() {
        let sink = Arc::new(FlakySink::default());
        let publisher = Publisher::new(PublisherConfig::default(), sink.clone());

        let report = publisher.publish(&records(), &[], 1).await;

        assert_eq!(report, PublishReport { sent: 2, failed: 1 });
        assert_eq!(sink.accepted.lock().len(), 2);
    }

    #[test]
    fn test_custom_measurements() {
        let publisher = Publisher::new(
            PublisherConfig {
                pool_measurement: "testData".into(),
                client_measurement: "clientData".into(),
            },
            Arc::new(MemorySink::new()),
        );
        let summaries = vec![ClientSummary::new("Telia", &SiteLayout::default())];

        let lines = publisher.lines(&records()[..1], &summaries, 9);

        assert_eq!(lines[0].measurement, "testData");
        assert_eq!(lines[1].measurement, "clientData");
    }
}
