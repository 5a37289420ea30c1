//! Line Protocol Encoding
//!
//! `measurement,tag=value,... field=value,... timestamp`
//!
//! Pool records and client summaries are turned into [`LineRecord`]s here;
//! the [`std::fmt::Display`] impl produces the wire form.

use crate::aggregation::{ClientSummary, Locality, Media};
use crate::domain::ports::PoolRecord;
use std::fmt;

// =============================================================================
// Field Values
// =============================================================================

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}i", v),
            FieldValue::Text(v) => {
                f.write_str("\"")?;
                for c in v.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")
            }
        }
    }
}

// =============================================================================
// Line Record
// =============================================================================

/// One line-protocol record
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub measurement: String,
    pub tags: Vec<(String, String)>,
    pub fields: Vec<(String, FieldValue)>,
    pub timestamp_ns: i64,
}

impl LineRecord {
    /// Create an empty record
    pub fn new(measurement: impl Into<String>, timestamp_ns: i64) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp_ns,
        }
    }

    /// Add a tag. Empty values are dropped since the endpoint rejects them.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.tags.push((key.into(), value));
        }
        self
    }

    /// Add a float field. Non-finite values are dropped.
    pub fn float(mut self, key: impl Into<String>, value: f64) -> Self {
        if value.is_finite() {
            self.fields.push((key.into(), FieldValue::Float(value)));
        }
        self
    }

    /// Add an integer field
    pub fn integer(mut self, key: impl Into<String>, value: i64) -> Self {
        self.fields.push((key.into(), FieldValue::Integer(value)));
        self
    }

    /// Add a string field
    pub fn text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), FieldValue::Text(value.into())));
        self
    }

    /// Look up a field by key
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a tag by key
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for LineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.measurement, &[',', ' '])?;
        for (key, value) in &self.tags {
            f.write_str(",")?;
            write_escaped(f, key, &[',', '=', ' '])?;
            f.write_str("=")?;
            write_escaped(f, value, &[',', '=', ' '])?;
        }
        for (i, (key, value)) in self.fields.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { "," })?;
            write_escaped(f, key, &[',', '=', ' '])?;
            write!(f, "={}", value)?;
        }
        write!(f, " {}", self.timestamp_ns)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str, special: &[char]) -> fmt::Result {
    for c in s.chars() {
        if special.contains(&c) {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

// =============================================================================
// Record Builders
// =============================================================================

/// Line for one pool
pub fn pool_line(measurement: &str, record: &PoolRecord, timestamp_ns: i64) -> LineRecord {
    let mut line = LineRecord::new(measurement, timestamp_ns)
        .tag("ID", format!("{}{}", record.id, record.array_name))
        .tag("site", record.site.as_str())
        .tag("type", record.pool_type.as_str())
        .text("Array", record.array_name.as_str())
        .text("Firmware", record.firmware.as_str())
        .text("Pool", record.pool_name.as_str())
        .float("TotalCapacity", record.capacity_total_bytes)
        .float("FreeCapacity", record.capacity_free_bytes)
        .float("UsedCapacity", record.capacity_used_bytes);

    if let Some(fraction) = record.allocation_fraction {
        line = line.float("AllocationPCT", fraction);
    }
    line
}

/// Line for one client summary
pub fn client_line(measurement: &str, summary: &ClientSummary, timestamp_ns: i64) -> LineRecord {
    let mut line = LineRecord::new(measurement, timestamp_ns)
        .tag("client", summary.client.as_str())
        .float("Total", summary.capacity.total_bytes)
        .float("TotalFree", summary.capacity.free_bytes);

    for (name, site) in &summary.sites {
        line = line
            .float(format!("{}Total", name), site.capacity.total_bytes)
            .float(format!("{}Free", name), site.capacity.free_bytes);

        for locality in Locality::ALL {
            let totals = site.locality(locality);
            line = line
                .float(format!("{}{}Total", name, locality), totals.total_bytes)
                .float(format!("{}{}Free", name, locality), totals.free_bytes);

            for media in Media::ALL {
                let bucket = site.bucket(locality, media);
                let prefix = format!("{}{}{}", name, locality, media);
                line = line
                    .float(format!("{}Total", prefix), bucket.capacity.total_bytes)
                    .float(format!("{}Free", prefix), bucket.capacity.free_bytes)
                    .integer(format!("{}MinLun", prefix), lun_count(bucket.min_lun_count));
            }
        }

        line = line
            .float(format!("Stretched{}Total", name), site.stretched.capacity.total_bytes)
            .float(format!("Stretched{}Free", name), site.stretched.capacity.free_bytes)
            .integer(
                format!("Stretched{}MinLun", name),
                lun_count(site.stretched.min_lun_count),
            );
    }

    line
}

fn lun_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{CapacityAggregator, SiteLayout};

    fn telia_pool() -> PoolRecord {
        let mut record = PoolRecord::new("0", "v7k-01", "qwe4", "8.3.1.5", 100.0, 25.0, 75.0);
        record.site = "P16".into();
        record.pool_type = "Internal SSD".into();
        record.client = "Telia".into();
        record
    }

    #[test]
    fn test_pool_line_format() {
        let line = pool_line("pool_capacity", &telia_pool(), 1_700_000_000_000_000_000);

        assert_eq!(
            line.to_string(),
            "pool_capacity,ID=0v7k-01,site=P16,type=Internal\\ SSD \
             Array=\"v7k-01\",Firmware=\"8.3.1.5\",Pool=\"qwe4\",\
             TotalCapacity=100,FreeCapacity=25,UsedCapacity=75,AllocationPCT=0.75 \
             1700000000000000000"
        );
    }

    #[test]
    fn test_undefined_allocation_is_omitted() {
        let record = PoolRecord::new("1", "v7k-01", "empty", "", 0.0, 0.0, 0.0);
        let line = pool_line("pool_capacity", &record, 1);

        assert!(line.field("AllocationPCT").is_none());
        assert_eq!(line.field("TotalCapacity"), Some(&FieldValue::Float(0.0)));
        // empty inventory tags are not emitted
        assert_eq!(line.tags.len(), 1);
    }

    #[test]
    fn test_escaping() {
        let line = LineRecord::new("cap data,x", 7)
            .tag("k=1", "a,b c")
            .text("Firmware", "V300R006C20, \"SPH\\035\"");

        assert_eq!(
            line.to_string(),
            "cap\\ data\\,x,k\\=1=a\\,b\\ c Firmware=\"V300R006C20, \\\"SPH\\\\035\\\"\" 7"
        );
    }

    #[test]
    fn test_non_finite_floats_are_dropped() {
        let line = LineRecord::new("m", 1).float("a", f64::NAN).float("b", 2.5);
        assert_eq!(line.to_string(), "m b=2.5 1");
    }

    #[test]
    fn test_client_line_fields() {
        let aggregator = CapacityAggregator::new(SiteLayout::default());
        let summary = aggregator.summarize("Telia", &[telia_pool()]);
        let line = client_line("client_capacity", &summary, 42);

        assert_eq!(line.tag_value("client"), Some("Telia"));
        assert_eq!(line.field("Total"), Some(&FieldValue::Float(100.0)));
        assert_eq!(line.field("P16InternalSSDTotal"), Some(&FieldValue::Float(100.0)));
        assert_eq!(line.field("P16InternalSSDMinLun"), Some(&FieldValue::Integer(0)));
        assert_eq!(line.field("Z141ExternalHDDFree"), Some(&FieldValue::Float(0.0)));
        assert_eq!(line.field("StretchedZ141MinLun"), Some(&FieldValue::Integer(0)));

        // 2 global + per site (2 + 2*2 + 2*2*3 + 3) for two sites
        assert_eq!(line.fields.len(), 2 + 2 * 21);
        assert!(line.to_string().contains("P16InternalSSDMinLun=0i"));
    }
}
