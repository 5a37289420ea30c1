//! Metrics Module
//!
//! Line-protocol encoding and delivery of pool and client records.

pub mod influx;
pub mod line_protocol;
pub mod publisher;

pub use influx::*;
pub use line_protocol::*;
pub use publisher::*;
