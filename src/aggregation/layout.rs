//! Site Layout
//!
//! Maps inventory tags onto the fixed aggregation key space:
//! site × locality × media.

use serde::{Deserialize, Serialize};

// =============================================================================
// Key Space
// =============================================================================

/// Whether a pool serves internal or shared (external) consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Locality {
    Internal,
    External,
}

impl Locality {
    pub const ALL: [Locality; 2] = [Locality::Internal, Locality::External];
}

impl std::fmt::Display for Locality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locality::Internal => write!(f, "Internal"),
            Locality::External => write!(f, "External"),
        }
    }
}

/// Media class of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Media {
    /// Flash or hybrid
    Ssd,
    /// Spinning disk
    Hdd,
}

impl Media {
    pub const ALL: [Media; 2] = [Media::Ssd, Media::Hdd];
}

impl std::fmt::Display for Media {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Media::Ssd => write!(f, "SSD"),
            Media::Hdd => write!(f, "HDD"),
        }
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Sites and tag markers used to classify pool records.
///
/// Classification is by substring and is not exhaustive: a type tag matching
/// no locality marker still counts toward its site total but toward no
/// locality bucket, and likewise for media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLayout {
    /// Named sites, in the order stretched pool names are matched against
    pub sites: Vec<String>,
    /// Site tag of pools spanning two sites
    pub stretched_site: String,
    /// Type tag marker for internal pools
    pub internal_marker: String,
    /// Type tag marker for shared pools
    pub external_marker: String,
    /// Type tag markers for flash/hybrid pools
    pub ssd_markers: Vec<String>,
    /// Type tag markers for spinning-disk pools
    pub hdd_markers: Vec<String>,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            sites: vec!["P16".to_string(), "Z141".to_string()],
            stretched_site: "Stretched".to_string(),
            internal_marker: "Internal".to_string(),
            external_marker: "Shared".to_string(),
            ssd_markers: vec!["SSD".to_string(), "MIX".to_string()],
            hdd_markers: vec!["SAS".to_string()],
        }
    }
}

impl SiteLayout {
    /// Locality of a type tag; internal wins when both markers appear
    pub fn locality(&self, type_tag: &str) -> Option<Locality> {
        if type_tag.contains(&self.internal_marker) {
            Some(Locality::Internal)
        } else if type_tag.contains(&self.external_marker) {
            Some(Locality::External)
        } else {
            None
        }
    }

    /// Media of a type tag; flash wins when both kinds of marker appear
    pub fn media(&self, type_tag: &str) -> Option<Media> {
        if self.ssd_markers.iter().any(|m| type_tag.contains(m.as_str())) {
            Some(Media::Ssd)
        } else if self.hdd_markers.iter().any(|m| type_tag.contains(m.as_str())) {
            Some(Media::Hdd)
        } else {
            None
        }
    }

    /// Whether a site tag marks a stretched pool
    pub fn is_stretched(&self, site: &str) -> bool {
        site == self.stretched_site
    }

    /// Named site a stretched pool rolls into, by pool name
    pub fn stretched_home(&self, pool_name: &str) -> Option<&str> {
        self.sites
            .iter()
            .map(String::as_str)
            .find(|site| pool_name.contains(site))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locality() {
        let layout = SiteLayout::default();
        assert_eq!(layout.locality("Internal SSD"), Some(Locality::Internal));
        assert_eq!(layout.locality("Shared SAS"), Some(Locality::External));
        assert_eq!(layout.locality("Internal Shared"), Some(Locality::Internal));
        assert_eq!(layout.locality("Backup SSD"), None);
    }

    #[test]
    fn test_media() {
        let layout = SiteLayout::default();
        assert_eq!(layout.media("Internal SSD"), Some(Media::Ssd));
        assert_eq!(layout.media("Shared MIX"), Some(Media::Ssd));
        assert_eq!(layout.media("Shared SAS"), Some(Media::Hdd));
        assert_eq!(layout.media("Internal NL"), None);
    }

    #[test]
    fn test_stretched_home_by_pool_name() {
        let layout = SiteLayout::default();
        assert!(layout.is_stretched("Stretched"));
        assert!(!layout.is_stretched("P16"));
        assert_eq!(layout.stretched_home("HyperMetro_P16_01"), Some("P16"));
        assert_eq!(layout.stretched_home("Z141_metro"), Some("Z141"));
        assert_eq!(layout.stretched_home("metro_pool"), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Locality::External.to_string(), "External");
        assert_eq!(Media::Ssd.to_string(), "SSD");
        assert_eq!(Media::Hdd.to_string(), "HDD");
    }
}
