//! Run Pipeline
//!
//! One inventory run: collect every array, roll the pool records up per
//! client, then publish pools and summaries under one batch timestamp.

use crate::aggregation::{CapacityAggregator, ClientSummary};
use crate::collector::{ArrayReport, CollectionStatus, FleetCollector};
use crate::domain::ports::{ArrayDescriptor, PoolRecord};
use crate::metrics::{PublishReport, Publisher};
use tracing::info;

/// Everything one run produced
#[derive(Debug)]
pub struct RunReport {
    /// One report per array, in inventory order
    pub arrays: Vec<ArrayReport>,
    /// Every collected pool
    pub records: Vec<PoolRecord>,
    /// One summary per requested client
    pub summaries: Vec<ClientSummary>,
    /// Delivery outcome
    pub published: PublishReport,
}

impl RunReport {
    /// Arrays whose collection failed outright
    pub fn failed_arrays(&self) -> impl Iterator<Item = &ArrayReport> {
        self.arrays
            .iter()
            .filter(|r| r.status == CollectionStatus::Failed)
    }
}

/// Collect, aggregate and publish
pub struct Pipeline {
    fleet: FleetCollector,
    aggregator: CapacityAggregator,
    publisher: Publisher,
}

impl Pipeline {
    pub fn new(
        fleet: FleetCollector,
        aggregator: CapacityAggregator,
        publisher: Publisher,
    ) -> Self {
        Self {
            fleet,
            aggregator,
            publisher,
        }
    }

    /// Run once over `arrays`, summarizing `clients`
    pub async fn run(
        &self,
        arrays: &[ArrayDescriptor],
        clients: &[String],
        timestamp_ns: i64,
    ) -> RunReport {
        let mut reports = self.fleet.collect(arrays).await;

        let records: Vec<PoolRecord> = reports
            .iter_mut()
            .flat_map(|report| std::mem::take(&mut report.records))
            .collect();

        let summaries = self.aggregator.summarize_all(clients, &records);
        let published = self.publisher.publish(&records, &summaries, timestamp_ns).await;

        let report = RunReport {
            arrays: reports,
            records,
            summaries,
            published,
        };

        info!(
            "Run complete: {} arrays ({} failed), {} pools, {} clients",
            report.arrays.len(),
            report.failed_arrays().count(),
            report.records.len(),
            report.summaries.len()
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{Locality, Media, SiteLayout};
    use crate::collector::{ArrayCollector, CollectorConfig};
    use crate::domain::ports::{AuthMethod, VendorModel};
    use crate::inventory::{Inventory, InventoryFormat};
    use crate::metrics::{MemorySink, PublisherConfig};
    use crate::transport::FixtureConnector;
    use crate::vendors::VendorRegistry;
    use std::path::Path;
    use std::sync::Arc;

    const IBM_INVENTORY: &str = include_str!("../fixtures/ibm-inventory.json");
    const HUAWEI_INVENTORY: &str = include_str!("../fixtures/huawei-inventory.yaml");

    fn inventory() -> Inventory {
        let mut arrays =
            Inventory::parse(VendorModel::Ibm, IBM_INVENTORY, InventoryFormat::Json).unwrap();
        arrays.extend(
            Inventory::parse(VendorModel::Huawei, HUAWEI_INVENTORY, InventoryFormat::Yaml).unwrap(),
        );
        arrays.push(ArrayDescriptor {
            name: "3par-p16-01".into(),
            address: "10.16.0.31".into(),
            site: "P16".into(),
            array_type: "Internal SAS".into(),
            client: "Telia".into(),
            model: VendorModel::ThreePar,
        });
        Inventory::new(arrays)
    }

    fn pipeline(connector: FixtureConnector, sink: Arc<MemorySink>) -> Pipeline {
        let registry = VendorRegistry::default();
        let collector = ArrayCollector::new(Arc::new(connector), registry);
        Pipeline::new(
            FleetCollector::new(CollectorConfig::default(), collector),
            CapacityAggregator::new(SiteLayout::default()),
            Publisher::new(PublisherConfig::default(), sink),
        )
    }

    fn fixtures() -> FixtureConnector {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        FixtureConnector::from_dir(&dir, &VendorRegistry::default()).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_run() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = pipeline(fixtures(), sink.clone());
        let inventory = inventory();

        let report = pipeline
            .run(inventory.arrays(), &inventory.clients(), 1_000)
            .await;

        // 3 IBM arrays x 2 pools, 2 Huawei arrays x 6 pools, 3PAR skipped
        assert_eq!(report.arrays.len(), 6);
        assert_eq!(report.failed_arrays().count(), 0);
        assert_eq!(report.records.len(), 18);
        assert_eq!(report.summaries.len(), 2);

        let telia = &report.summaries[0];
        assert_eq!(telia.client, "Telia");

        let mut telia_records: Vec<&PoolRecord> =
            report.records.iter().filter(|r| r.client == "Telia").collect();
        assert_eq!(telia_records.len(), 16);
        telia_records.sort_by(|a, b| {
            a.array_name
                .cmp(&b.array_name)
                .then_with(|| a.id.cmp(&b.id))
                .then_with(|| a.pool_name.cmp(&b.pool_name))
        });
        let expected: f64 = telia_records.iter().map(|r| r.capacity_total_bytes).sum();
        assert_eq!(telia.capacity.total_bytes, expected);

        let p16 = telia.site("P16").unwrap();
        assert!(p16.bucket(Locality::Internal, Media::Ssd).capacity.total_bytes > 0.0);
        let z141 = telia.site("Z141").unwrap();
        assert!(z141.bucket(Locality::External, Media::Ssd).capacity.total_bytes > 0.0);
        assert!(z141.bucket(Locality::Internal, Media::Hdd).capacity.total_bytes > 0.0);

        assert_eq!(report.published.sent, 18 + 2);
        assert_eq!(report.published.failed, 0);
        let lines = sink.lines();
        assert_eq!(lines.len(), 20);
        assert!(lines.iter().all(|l| l.ends_with(" 1000")));
    }

    #[tokio::test]
    async fn test_failed_array_still_publishes_the_rest() {
        let connector = fixtures()
            .refuse("v7k-p16-01", AuthMethod::Password)
            .refuse("v7k-p16-01", AuthMethod::KeyboardInteractive);
        let sink = Arc::new(MemorySink::new());
        let pipeline = pipeline(connector, sink.clone());
        let inventory = inventory().filter_clients(&["Telia".to_string()]);

        let report = pipeline.run(inventory.arrays(), &["Telia".to_string()], 7).await;

        let failed: Vec<&str> = report.failed_arrays().map(|r| r.array.as_str()).collect();
        assert_eq!(failed, ["v7k-p16-01"]);
        assert_eq!(report.records.len(), 14);
        assert_eq!(sink.lines().len(), 15);
    }

    #[tokio::test]
    async fn test_no_arrays_still_publishes_zeroed_summary() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = pipeline(fixtures(), sink.clone());

        let report = pipeline.run(&[], &["Telia".to_string()], 1).await;

        assert!(report.records.is_empty());
        assert_eq!(report.summaries[0].capacity.total_bytes, 0.0);
        assert_eq!(sink.lines().len(), 1);
    }
}
