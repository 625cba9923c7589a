//! Feature3D: a 2D polygon with an altitude band, used for both obstacles
//! and the search volume.

use serde::{Deserialize, Serialize};

use super::altitude::AltitudeBound;

/// An outer ring plus zero or more holes, all expressed as `(lon, lat)`
/// pairs forming a closed ring (first point equals last point).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ring {
    pub points: Vec<(f64, f64)>,
}

impl Ring {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn bbox(&self) -> BBox {
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        for &(lon, lat) in &self.points {
            min_lon = min_lon.min(lon);
            max_lon = max_lon.max(lon);
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
        }
        BBox {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}

/// A 2D polygon (outer ring plus holes) paired with an altitude band.
///
/// Invariant: `min_alt`'s normalised value is ≤ `max_alt`'s — swapped at
/// construction if violated, matching `feature3d.go`'s `SetAltitude`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature3D {
    pub exterior: Ring,
    #[serde(default)]
    pub holes: Vec<Ring>,
    pub min_alt: AltitudeBound,
    pub max_alt: AltitudeBound,
}

impl Feature3D {
    pub fn new(
        exterior: Ring,
        holes: Vec<Ring>,
        min_alt: AltitudeBound,
        max_alt: AltitudeBound,
    ) -> Self {
        let (min_alt, max_alt) = if min_alt.normalize_min() <= max_alt.normalize_max() {
            (min_alt, max_alt)
        } else {
            (max_alt, min_alt)
        };
        Self {
            exterior,
            holes,
            min_alt,
            max_alt,
        }
    }

    pub fn bbox(&self) -> BBox {
        self.exterior.bbox()
    }

    pub fn altitude_overlaps(&self, other_min: &AltitudeBound, other_max: &AltitudeBound) -> bool {
        self.min_alt.normalize_min() <= other_max.normalize_max()
            && self.max_alt.normalize_max() >= other_min.normalize_min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::altitude::Altitude;

    #[test]
    fn swaps_inverted_altitude_bounds() {
        let f = Feature3D::new(
            Ring::new(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]),
            vec![],
            AltitudeBound::Bounded(Altitude::meters(100.0)),
            AltitudeBound::Bounded(Altitude::meters(0.0)),
        );
        assert_eq!(f.min_alt.normalize_min(), 0.0);
        assert_eq!(f.max_alt.normalize_max(), 100.0);
    }
}
