//! Collection Module
//!
//! Turns inventory descriptors into tagged pool records:
//! - Array: session, commands and parsing for one array
//! - Fleet: bounded fan-out over the whole inventory

pub mod array;
pub mod fleet;

pub use array::*;
pub use fleet::*;
