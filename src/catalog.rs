//! Preset city catalog
//!
//! Hand-curated reference data for a handful of cities. A query that matches
//! a key exactly skips geocoding and live weather entirely.

use std::collections::HashMap;

use crate::models::{ClimateSample, Location};

/// Reference climate and heat-island data for one known city
#[derive(Debug, Clone, PartialEq)]
pub struct PresetEntry {
    pub location: Location,
    pub baseline: ClimateSample,
    /// Reference UHI score used when the prediction service is unavailable
    pub reference_uhi: f64,
    pub note: String,
}

/// Read-only lookup table of presets, keyed by exact city name.
///
/// Keys iterate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    entries: Vec<(String, PresetEntry)>,
    index: HashMap<String, usize>,
}

// (name, lat, lon, avg, high, low, uhi, note)
type PresetRow = (&'static str, f64, f64, f64, f64, f64, f64, &'static str);

const BUILTIN: &[PresetRow] = &[
    ("Ahmedabad, India", 23.0225, 72.5714, 28.5, 45.0, 12.0, 78.0, "Hot, arid core; limited green cover"),
    ("Chennai, India", 13.0827, 80.2707, 28.0, 41.0, 20.0, 65.0, "Coastal humidity + built-up heat"),
    ("Shillong, India", 25.5788, 91.8933, 18.5, 26.0, 8.0, 22.0, "Hilly & green — low UHI"),
    ("Patna, India", 25.5941, 85.1376, 26.0, 44.0, 9.0, 70.0, "Dense urban core with heat spikes"),
    ("Detroit, USA", 42.3314, -83.0458, 10.5, 38.0, -18.0, 48.0, "Mixed industrial/residential footprint"),
    ("San Diego, USA", 32.7157, -117.1611, 17.5, 35.0, 8.0, 28.0, "Coastal moderation, sea breeze reduces extremes"),
    ("Los Angeles, USA", 34.0522, -118.2437, 18.5, 42.0, 6.0, 60.0, "Urban sprawl & heat trapping surfaces"),
];

impl PresetCatalog {
    /// Catalog with the built-in city presets
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for &(name, lat, lon, avg, high, low, uhi, note) in BUILTIN {
            // Built-in rows are literal and in range; skip rather than panic if one is not.
            let (Ok(location), Ok(baseline)) =
                (Location::new(lat, lon), ClimateSample::new(avg, high, low))
            else {
                tracing::error!("Skipping malformed built-in preset '{}'", name);
                continue;
            };
            catalog.insert(
                name,
                PresetEntry {
                    location,
                    baseline,
                    reference_uhi: uhi,
                    note: note.to_string(),
                },
            );
        }
        catalog
    }

    /// Add or replace an entry
    pub fn insert(&mut self, name: impl Into<String>, entry: PresetEntry) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&position) => self.entries[position].1 = entry,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, entry));
            }
        }
    }

    /// Exact-match lookup; no trimming or case folding
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PresetEntry> {
        self.index.get(name).map(|&position| &self.entries[position].1)
    }

    /// The keys that take the preset fast path
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}
