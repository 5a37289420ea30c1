//! Session Transports
//!
//! Provides session connectors for reaching array CLIs:
//! - OpenSSH: multiplexed master connection per array
//! - Fixture: canned command output

pub mod fixture;
pub mod ssh;

pub use fixture::*;
pub use ssh::*;
