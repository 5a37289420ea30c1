//! Array Capacity Inventory
//!
//! Collects pool capacity from a fleet of SAN arrays over SSH, rolls it up
//! per client and site, and publishes both levels to an InfluxDB-compatible
//! write endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                               Run Pipeline                                   │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │    Inventory    │  │ Fleet Collector │  │    Capacity Aggregator      │  │
//! │  │  (JSON / YAML)  │─▶│ (bounded tasks) │─▶│  (site × locality × media)  │  │
//! │  └─────────────────┘  └────────┬────────┘  └─────────────┬───────────────┘  │
//! │                                │                         │                   │
//! │                    ┌───────────┴───────────┐  ┌──────────┴──────────┐       │
//! │                    │    Vendor Drivers     │  │      Publisher      │       │
//! │                    │ (IBM, Huawei, stubs)  │  │   (line protocol)   │       │
//! │                    └───────────┬───────────┘  └──────────┬──────────┘       │
//! ├────────────────────────────────┼─────────────────────────┼──────────────────┤
//! │                          Adapters                        │                   │
//! │  ┌─────────────────────────────┴───┐  ┌──────────────────┴────────────────┐ │
//! │  │  SSH (OpenSSH ControlMaster)    │  │  InfluxDB /write  │  Memory sink  │ │
//! │  │  Fixture connector              │  │                   │               │ │
//! │  └─────────────────────────────────┘  └───────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`inventory`]: Array descriptors loaded per vendor
//! - [`transport`]: Remote sessions (SSH and fixtures)
//! - [`vendors`]: Command sets and output parsers
//! - [`collector`]: Per-array collection and fleet fan-out
//! - [`aggregation`]: Per-client capacity rollups
//! - [`metrics`]: Line protocol and metrics sinks
//! - [`pipeline`]: One end-to-end run
//! - [`domain`]: Core domain types and traits
//! - [`error`]: Error types and handling

pub mod aggregation;
pub mod collector;
pub mod domain;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod transport;
pub mod vendors;

// Re-export commonly used types
pub use aggregation::{
    CapacityAggregator, CapacityTotals, ClientSummary, Locality, LunBucket, Media, SiteLayout,
    SiteSummary,
};

pub use collector::{ArrayCollector, ArrayReport, CollectionStatus, CollectorConfig, FleetCollector};

pub use domain::ports::{
    ArrayDescriptor, AuthMethod, MetricsSink, PoolRecord, RemoteSession, SessionConnector,
    VendorDriver, VendorModel,
};

pub use error::{Error, ErrorScope, Result};

pub use inventory::{Inventory, InventorySource};

pub use metrics::{InfluxConfig, InfluxSink, MemorySink, PublishReport, Publisher, PublisherConfig};

pub use pipeline::{Pipeline, RunReport};

pub use transport::{FixtureConnector, SshConfig, SshConnector};

pub use vendors::VendorRegistry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
