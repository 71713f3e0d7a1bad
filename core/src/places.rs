//! Place-name lookup
//!
//! A small fixed table of spoken destinations to street addresses. Anything
//! not in the table resolves to the default address; this is not a geocoder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceBook {
    /// Address used when the spoken name is not in `entries`
    #[serde(default = "default_address")]
    pub default_address: String,

    /// Lower-case place name -> street address
    #[serde(default = "default_entries")]
    pub entries: BTreeMap<String, String>,
}

impl Default for PlaceBook {
    fn default() -> Self {
        Self {
            default_address: default_address(),
            entries: default_entries(),
        }
    }
}

impl PlaceBook {
    /// Resolve a spoken place name to an address.
    ///
    /// The name is trimmed and lower-cased before lookup.
    pub fn resolve(&self, spoken: &str) -> &str {
        let key = spoken.trim().to_lowercase();
        self.entries
            .get(&key)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(name, _)| name.trim().to_lowercase() == key)
                    .map(|(_, address)| address)
            })
            .map(String::as_str)
            .unwrap_or(&self.default_address)
    }

    /// Whether `spoken` is a known place rather than the fallback
    pub fn knows(&self, spoken: &str) -> bool {
        let key = spoken.trim().to_lowercase();
        self.entries
            .keys()
            .any(|name| name.trim().to_lowercase() == key)
    }
}

fn default_address() -> String {
    "Pier 48, San Francisco, CA".to_string()
}

fn default_entries() -> BTreeMap<String, String> {
    [
        ("levis stadium", "4900 Marie P DeBartolo Way, Santa Clara, CA"),
        ("amazon san francisco office", "475 Sansome St, San Francisco, CA"),
        ("pier 39", "Pier 39, San Francisco, CA"),
        ("twin peaks", "501 Twin Peaks Blvd, San Francisco, CA"),
        ("google office", "1600 Amphitheatre Parkway, Mountain View, CA"),
    ]
    .into_iter()
    .map(|(name, address)| (name.to_string(), address.to_string()))
    .collect()
}
