//! Aggregation Module
//!
//! Per-client capacity rollups:
//! - Layout: site names and tag markers
//! - Summary: nested totals with minimum usable LUN counts
//! - Aggregator: order-independent fold over pool records

pub mod aggregator;
pub mod layout;
pub mod summary;

pub use aggregator::*;
pub use layout::*;
pub use summary::*;
