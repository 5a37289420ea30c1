//! Capacity Aggregator
//!
//! Folds a client's pool records into a [`ClientSummary`].
//!
//! Records are folded in a canonical order so the floating point sums do not
//! depend on the order collection finished in.

use super::layout::SiteLayout;
use super::summary::ClientSummary;
use crate::domain::ports::PoolRecord;
use std::cmp::Ordering;
use tracing::debug;

/// Rolls pool records up per client
#[derive(Debug, Clone, Default)]
pub struct CapacityAggregator {
    layout: SiteLayout,
}

impl CapacityAggregator {
    /// Create a new aggregator
    pub fn new(layout: SiteLayout) -> Self {
        Self { layout }
    }

    /// Get the site layout
    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// Summarize one client. Records of other clients are ignored.
    pub fn summarize(&self, client: &str, records: &[PoolRecord]) -> ClientSummary {
        let mut ordered: Vec<&PoolRecord> = records.iter().filter(|r| r.client == client).collect();
        ordered.sort_by(|a, b| canonical_order(a, b));

        let mut summary = ClientSummary::new(client, &self.layout);
        for record in &ordered {
            self.accumulate(&mut summary, record);
        }

        debug!(
            client = %client,
            "Summarized {} pools: {} bytes total, {} bytes free",
            ordered.len(),
            summary.capacity.total_bytes,
            summary.capacity.free_bytes
        );

        summary
    }

    /// Summarize several clients, in the order given
    pub fn summarize_all(&self, clients: &[String], records: &[PoolRecord]) -> Vec<ClientSummary> {
        clients
            .iter()
            .map(|client| self.summarize(client, records))
            .collect()
    }

    fn accumulate(&self, summary: &mut ClientSummary, record: &PoolRecord) {
        summary.capacity.add(record);

        if self.layout.is_stretched(&record.site) {
            let home = self
                .layout
                .stretched_home(&record.pool_name)
                .and_then(|home| summary.sites.get_mut(home));
            match home {
                Some(site) => {
                    site.capacity.add(record);
                    site.stretched.add(record);
                }
                None => debug!(
                    array = %record.array_name,
                    "Stretched pool {} names no known site", record.pool_name
                ),
            }
            return;
        }

        let Some(site) = summary.sites.get_mut(&record.site) else {
            return;
        };
        site.capacity.add(record);

        let Some(locality) = self.layout.locality(&record.pool_type) else {
            return;
        };
        site.localities.entry(locality).or_default().add(record);

        if let Some(media) = self.layout.media(&record.pool_type) {
            site.buckets.entry((locality, media)).or_default().add(record);
        }
    }
}

/// Total order over records, independent of collection order
fn canonical_order(a: &PoolRecord, b: &PoolRecord) -> Ordering {
    a.array_name
        .cmp(&b.array_name)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.pool_name.cmp(&b.pool_name))
        .then_with(|| a.site.cmp(&b.site))
        .then_with(|| a.pool_type.cmp(&b.pool_type))
        .then_with(|| a.capacity_total_bytes.total_cmp(&b.capacity_total_bytes))
        .then_with(|| a.capacity_free_bytes.total_cmp(&b.capacity_free_bytes))
        .then_with(|| a.capacity_used_bytes.total_cmp(&b.capacity_used_bytes))
}
