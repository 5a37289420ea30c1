//! Client Capacity Summary
//!
//! Nested capacity totals for one client: global, per site, per locality and
//! per (locality, media) bucket, plus the stretched pool bucket of each site.

use super::layout::{Locality, Media, SiteLayout};
use crate::domain::ports::PoolRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed LUN size behind the minimum usable LUN heuristic (10 TB, decimal)
pub const MIN_LUN_SIZE_BYTES: f64 = 10_000_000_000_000.0;

/// Whole LUNs that fit in one pool's free capacity
pub fn min_usable_luns(free_bytes: f64) -> u64 {
    if !free_bytes.is_finite() || free_bytes <= 0.0 {
        return 0;
    }
    (free_bytes / MIN_LUN_SIZE_BYTES).floor() as u64
}

// =============================================================================
// Totals
// =============================================================================

/// Total and free capacity in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityTotals {
    pub total_bytes: f64,
    pub free_bytes: f64,
}

impl CapacityTotals {
    pub(crate) fn add(&mut self, record: &PoolRecord) {
        self.total_bytes += record.capacity_total_bytes;
        self.free_bytes += record.capacity_free_bytes;
    }
}

/// Capacity totals plus the minimum usable LUN count.
///
/// The LUN count is accumulated per record, so it can be lower than the
/// count derived from the bucket's free total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LunBucket {
    pub capacity: CapacityTotals,
    pub min_lun_count: u64,
}

impl LunBucket {
    pub(crate) fn add(&mut self, record: &PoolRecord) {
        self.capacity.add(record);
        self.min_lun_count += min_usable_luns(record.capacity_free_bytes);
    }
}

// =============================================================================
// Site Summary
// =============================================================================

/// Capacity of one named site
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSummary {
    /// Site pools plus stretched pools homed here
    pub capacity: CapacityTotals,
    /// Per locality
    pub localities: BTreeMap<Locality, CapacityTotals>,
    /// Per locality and media
    pub buckets: BTreeMap<(Locality, Media), LunBucket>,
    /// Stretched pools homed here
    pub stretched: LunBucket,
}

impl Default for SiteSummary {
    fn default() -> Self {
        let localities = Locality::ALL
            .into_iter()
            .map(|locality| (locality, CapacityTotals::default()))
            .collect();
        let buckets = Locality::ALL
            .into_iter()
            .flat_map(|locality| Media::ALL.into_iter().map(move |media| (locality, media)))
            .map(|key| (key, LunBucket::default()))
            .collect();

        Self {
            capacity: CapacityTotals::default(),
            localities,
            buckets,
            stretched: LunBucket::default(),
        }
    }
}

impl SiteSummary {
    /// Totals for one locality
    pub fn locality(&self, locality: Locality) -> CapacityTotals {
        self.localities.get(&locality).copied().unwrap_or_default()
    }

    /// Bucket for one locality and media
    pub fn bucket(&self, locality: Locality, media: Media) -> LunBucket {
        self.buckets
            .get(&(locality, media))
            .copied()
            .unwrap_or_default()
    }
}

// =============================================================================
// Client Summary
// =============================================================================

/// Capacity rollup for one client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSummary {
    /// Client name
    pub client: String,
    /// Every pool of the client, whatever its site
    pub capacity: CapacityTotals,
    /// Named sites
    pub sites: BTreeMap<String, SiteSummary>,
}

impl ClientSummary {
    /// Zeroed summary with every site of the layout present
    pub fn new(client: impl Into<String>, layout: &SiteLayout) -> Self {
        Self {
            client: client.into(),
            capacity: CapacityTotals::default(),
            sites: layout
                .sites
                .iter()
                .map(|site| (site.clone(), SiteSummary::default()))
                .collect(),
        }
    }

    /// Summary of one named site
    pub fn site(&self, name: &str) -> Option<&SiteSummary> {
        self.sites.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_usable_luns() {
        assert_eq!(min_usable_luns(25_000_000_000_000.0), 2);
        assert_eq!(min_usable_luns(9_000_000_000_000.0), 0);
        assert_eq!(min_usable_luns(10_000_000_000_000.0), 1);
        assert_eq!(min_usable_luns(0.0), 0);
        assert_eq!(min_usable_luns(-5.0), 0);
        assert_eq!(min_usable_luns(f64::NAN), 0);
    }

    #[test]
    fn test_new_summary_is_zeroed_with_all_keys() {
        let summary = ClientSummary::new("Telia", &SiteLayout::default());

        assert_eq!(summary.capacity, CapacityTotals::default());
        assert_eq!(summary.sites.len(), 2);

        let site = summary.site("P16").unwrap();
        assert_eq!(site.localities.len(), 2);
        assert_eq!(site.buckets.len(), 4);
        assert_eq!(site.bucket(Locality::External, Media::Hdd), LunBucket::default());
    }
}
