//! Auxiliary records used by the storage layer: KNN results and AntPath's
//! obstacle-straddle records.

use super::feature::Feature3D;
use super::waypoint::Waypoint;

/// A stored waypoint paired with its distance to some query point. Doubles
/// as the tree's parent record (`{parent, edge_cost_m}`) and as a KNN
/// result element.
#[derive(Debug, Clone)]
pub struct PointDist {
    pub point: Waypoint,
    pub distance_m: f64,
}

impl PointDist {
    pub fn new(point: Waypoint, distance_m: f64) -> Self {
        Self { point, distance_m }
    }
}

/// A straddle pair found while walking a segment `a -> b`, plus the set of
/// polygons whose interiors lie between `entering_point` and `exiting_point`
/// (merged by [`crate::geometry::polygon_union`] when more than one
/// overlaps).
#[derive(Debug, Clone)]
pub struct LinePolygonIntersection {
    pub entering_point: Waypoint,
    pub exiting_point: Waypoint,
    pub polygons: Vec<Feature3D>,
}

impl LinePolygonIntersection {
    pub fn new(entering_point: Waypoint, exiting_point: Waypoint, polygons: Vec<Feature3D>) -> Self {
        Self {
            entering_point,
            exiting_point,
            polygons,
        }
    }
}
