//! Array Inventory
//!
//! Inventory files list the arrays of one vendor:
//!
//! ```json
//! {"array": [{"name": "v7k-01", "ip": "10.0.0.1", "site": "P16",
//!             "type_arr": "Internal SSD", "client": "Telia"}]}
//! ```
//!
//! YAML is accepted for `.yaml`/`.yml` files. `address` and `type` are
//! accepted in place of `ip` and `type_arr`.

use crate::domain::ports::{ArrayDescriptor, VendorModel};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// =============================================================================
// File Format
// =============================================================================

#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    array: Vec<InventoryEntry>,
}

#[derive(Debug, Deserialize)]
struct InventoryEntry {
    name: String,
    #[serde(alias = "address")]
    ip: String,
    site: String,
    #[serde(alias = "type")]
    type_arr: String,
    client: String,
}

impl InventoryEntry {
    fn into_descriptor(self, model: VendorModel) -> ArrayDescriptor {
        ArrayDescriptor {
            name: self.name.trim().to_string(),
            address: self.ip.trim().to_string(),
            site: self.site.trim().to_string(),
            array_type: self.type_arr.trim().to_string(),
            client: self.client.trim().to_string(),
            model,
        }
    }
}

/// Serialization format of an inventory file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryFormat {
    Json,
    Yaml,
}

impl InventoryFormat {
    /// Pick the format from the file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                InventoryFormat::Yaml
            }
            _ => InventoryFormat::Json,
        }
    }
}

// =============================================================================
// Inventory Source
// =============================================================================

/// One `<vendor>=<path>` inventory argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySource {
    pub model: VendorModel,
    pub path: PathBuf,
}

impl std::str::FromStr for InventorySource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (vendor, path) = s.split_once('=').ok_or_else(|| {
            Error::Configuration(format!("inventory '{}' is not of the form <vendor>=<path>", s))
        })?;

        let model = vendor
            .parse::<VendorModel>()
            .map_err(|e| Error::Configuration(format!("inventory '{}': {}", s, e)))?;

        let path = path.trim();
        if path.is_empty() {
            return Err(Error::Configuration(format!("inventory '{}' has no path", s)));
        }

        Ok(Self {
            model,
            path: PathBuf::from(path),
        })
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Arrays to collect, across all vendors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    arrays: Vec<ArrayDescriptor>,
}

impl Inventory {
    pub fn new(arrays: Vec<ArrayDescriptor>) -> Self {
        Self { arrays }
    }

    /// Load every source, in order
    pub fn load(sources: &[InventorySource]) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::Configuration("no inventory files given".into()));
        }

        let mut arrays = Vec::new();
        for source in sources {
            let loaded = Self::from_file(source.model, &source.path)?;
            info!(
                "Loaded {} {} arrays from {}",
                loaded.len(),
                source.model,
                source.path.display()
            );
            arrays.extend(loaded);
        }

        let mut seen = HashSet::new();
        for array in &arrays {
            if !seen.insert(array.name.as_str()) {
                warn!(array = %array.name, "Array listed more than once in the inventory");
            }
        }

        Ok(Self { arrays })
    }

    /// Read one inventory file
    pub fn from_file(model: VendorModel, path: &Path) -> Result<Vec<ArrayDescriptor>> {
        let inventory_error = |reason: String| Error::Inventory {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| inventory_error(e.to_string()))?;
        Self::parse(model, &content, InventoryFormat::from_path(path))
            .map_err(|e| inventory_error(e.to_string()))
    }

    /// Parse inventory content for one vendor
    pub fn parse(
        model: VendorModel,
        content: &str,
        format: InventoryFormat,
    ) -> Result<Vec<ArrayDescriptor>> {
        let file: InventoryFile = match format {
            InventoryFormat::Json => serde_json::from_str(content)?,
            InventoryFormat::Yaml => serde_yaml::from_str(content)?,
        };

        file.array
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let array = entry.into_descriptor(model);
                if array.name.is_empty() || array.address.is_empty() {
                    return Err(Error::Configuration(format!(
                        "array entry {} needs both a name and an address",
                        i
                    )));
                }
                Ok(array)
            })
            .collect()
    }

    pub fn arrays(&self) -> &[ArrayDescriptor] {
        &self.arrays
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Distinct clients, in first-seen order
    pub fn clients(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.arrays
            .iter()
            .filter(|a| seen.insert(a.client.as_str()))
            .map(|a| a.client.clone())
            .collect()
    }

    /// Keep only arrays of the given clients; an empty filter keeps all
    pub fn filter_clients(&self, clients: &[String]) -> Self {
        if clients.is_empty() {
            return self.clone();
        }
        Self {
            arrays: self
                .arrays
                .iter()
                .filter(|a| clients.contains(&a.client))
                .cloned()
                .collect(),
        }
    }
}
