//! Capacity Unit Normalization
//!
//! Converts vendor capacity strings such as `123.410TB` or `512B` to bytes.
//! All multipliers are binary (1024-based).

use crate::error::{Error, Result};

const KIB: f64 = 1024.0;

/// Unit suffixes, longest first so that `TB` is never read as `B`
const UNIT_SUFFIXES: [(&str, f64); 6] = [
    ("PB", KIB * KIB * KIB * KIB * KIB),
    ("TB", KIB * KIB * KIB * KIB),
    ("GB", KIB * KIB * KIB),
    ("MB", KIB * KIB),
    ("KB", KIB),
    ("B", 1.0),
];

/// Normalize a capacity string to bytes.
///
/// A value without a recognised suffix is taken as plain bytes. Suffixes are
/// case-sensitive.
pub fn normalize_capacity(value: &str) -> Result<f64> {
    let trimmed = value.trim();

    let (number, multiplier) = UNIT_SUFFIXES
        .iter()
        .find_map(|(suffix, multiplier)| {
            trimmed
                .strip_suffix(suffix)
                .map(|number| (number, *multiplier))
        })
        .unwrap_or((trimmed, 1.0));

    let parsed: f64 = number
        .trim()
        .parse()
        .map_err(|_| Error::MalformedCapacityValue {
            value: value.to_string(),
        })?;

    // f64 parsing accepts "inf" and "NaN"; neither is a capacity
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(Error::MalformedCapacityValue {
            value: value.to_string(),
        });
    }

    Ok(parsed * multiplier)
}
