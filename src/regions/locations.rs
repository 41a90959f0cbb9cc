//! Approximate geolocations of AWS regions.
//!
//! AWS doesn't publish coordinates for regions, so these are estimates based
//! on public datacenter listings (or simply on the city name). The bundled
//! table can be replaced at runtime without a rebuild.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::types::UtilResult;

/// Bundled table, mapping region identifiers to `[latitude, longitude]`.
const BUNDLED: &str = include_str!("locations.json");

/// Latitude/longitude pair for a region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Lookup table from region identifier to `Location`.
pub struct Locations {
    table: HashMap<String, [f64; 2]>,
}

impl Locations {
    /// Loads the table compiled into the binary.
    pub fn bundled() -> UtilResult<Self> {
        Self::parse(BUNDLED)
    }

    /// Loads a table from a JSON file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> UtilResult<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parses a table from a JSON object of `"id": [lat, lon]` pairs.
    pub fn parse(input: &str) -> UtilResult<Self> {
        Ok(Self {
            table: serde_json::from_str(input)?,
        })
    }

    /// Looks up the location of a region.
    ///
    /// Regions are added by AWS over time, so a missing entry means the
    /// table needs updating; this is reported as an error.
    pub fn get(&self, region: &str) -> UtilResult<Location> {
        match self.table.get(region) {
            Some([latitude, longitude]) => Ok(Location {
                latitude: *latitude,
                longitude: *longitude,
            }),
            None => Err(format!("No location known for region {}", region).into()),
        }
    }
}
