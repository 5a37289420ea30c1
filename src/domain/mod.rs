//! Domain layer - Core data model and port definitions
//!
//! This module defines the pool record model and the traits (ports) that
//! transport, vendor and metrics adapters implement.

pub mod ports;

pub use ports::*;
