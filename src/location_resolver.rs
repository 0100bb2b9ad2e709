//! Location Resolution Module
//!
//! This module turns a free-text city query into coordinates. Exact preset
//! names short-circuit; everything else goes to the geocoder, and a miss lands
//! on a fixed default location so the analysis always completes.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{PresetCatalog, PresetEntry};
use crate::models::{Location, LocationSource};
use crate::upstream::{Geocoder, Lookup};

/// How a query was resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exact preset match, carries the entry
    Preset(PresetEntry),
    Geocoded(Location),
    /// Geocoding failed; the default location stands in
    Fallback(Location),
}

impl Resolution {
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Resolution::Preset(entry) => entry.location,
            Resolution::Geocoded(location) | Resolution::Fallback(location) => *location,
        }
    }

    #[must_use]
    pub fn source(&self) -> LocationSource {
        match self {
            Resolution::Preset(_) => LocationSource::Preset,
            Resolution::Geocoded(_) => LocationSource::Geocoded,
            Resolution::Fallback(_) => LocationSource::Fallback,
        }
    }

    #[must_use]
    pub fn preset(&self) -> Option<&PresetEntry> {
        match self {
            Resolution::Preset(entry) => Some(entry),
            _ => None,
        }
    }
}

/// Service for resolving city queries
pub struct LocationResolver {
    catalog: Arc<PresetCatalog>,
    geocoder: Arc<dyn Geocoder>,
    default_location: Location,
}

impl LocationResolver {
    pub fn new(
        catalog: Arc<PresetCatalog>,
        geocoder: Arc<dyn Geocoder>,
        default_location: Location,
    ) -> Self {
        Self {
            catalog,
            geocoder,
            default_location,
        }
    }

    /// Resolve a query; never fails
    pub async fn resolve(&self, query: &str) -> Resolution {
        debug!("Resolving location query: {:?}", query);

        if let Some(entry) = self.catalog.get(query) {
            debug!("Preset match for '{}'", query);
            return Resolution::Preset(entry.clone());
        }

        let resolution = match self.geocoder.locate(query).await {
            Lookup::Found(location) => Resolution::Geocoded(location),
            Lookup::Unavailable(reason) => {
                debug!(
                    "Geocoding failed: {}, using default location ({})",
                    reason,
                    self.default_location.format_coordinates()
                );
                Resolution::Fallback(self.default_location)
            }
        };

        debug!(
            "Resolved '{}' to ({}) via {:?}",
            query,
            resolution.location().format_coordinates(),
            resolution.source()
        );

        resolution
    }
}
