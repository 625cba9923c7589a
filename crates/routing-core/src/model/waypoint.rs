//! Waypoint: a point in (lat, lon, altitude) with optional metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::altitude::Altitude;
use crate::error::PlanningError;

static NEXT_WAYPOINT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh, process-unique waypoint id. Used by geometric routines
/// (resampling, steering) that synthesize intermediate waypoints which must
/// still be distinguishable by identity in a parent map, per the
/// arena-plus-index model in SPEC_FULL.md §9.
pub fn fresh_waypoint_id() -> u64 {
    NEXT_WAYPOINT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A point in (lat, lon, altitude) space.
///
/// Identity is by reference in the original design (two waypoints at the
/// same coordinates are distinct tree nodes); here that's modelled by giving
/// every waypoint an opaque `id` assigned at construction, so storage can key
/// parent-map entries on `id` rather than on coordinate equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
    pub alt: Altitude,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl Waypoint {
    pub fn new(id: u64, lat: f64, lon: f64, alt: Altitude) -> Result<Self, PlanningError> {
        Self::validate_coords(lat, lon)?;
        Ok(Self {
            id,
            lat,
            lon,
            alt,
            tags: HashMap::new(),
        })
    }

    pub fn validate_coords(lat: f64, lon: f64) -> Result<(), PlanningError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(PlanningError::invalid_input(format!(
                "latitude {lat} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(PlanningError::invalid_input(format!(
                "longitude {lon} out of range [-180, 180]"
            )));
        }
        Ok(())
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn point2d(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::altitude::AltitudeUnit;

    #[test]
    fn rejects_out_of_range_latitude() {
        let result = Waypoint::new(0, 120.0, 0.0, Altitude::new(100.0, AltitudeUnit::Meters));
        assert!(result.is_err());
    }

    #[test]
    fn accepts_valid_coordinates() {
        let wp = Waypoint::new(1, 50.0, 4.0, Altitude::new(100.0, AltitudeUnit::Meters)).unwrap();
        assert_eq!(wp.point2d(), (4.0, 50.0));
    }
}
