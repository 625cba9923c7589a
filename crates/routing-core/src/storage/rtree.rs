//! R-tree-backed storage (spec §4.3), using `rstar` over the 2D (lon, lat)
//! projection for candidate selection, refined by exact 3D distance.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geometry::{haversine3d, line_in_polygon, point_in_polygon, polygon_overlaps};
use crate::model::{BBox, Feature3D, PointDist, Waypoint};

use super::{Storage, WaypointTree};

#[derive(Clone)]
struct IndexedPoint {
    id: u64,
    lon: f64,
    lat: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.lon - point[0];
        let dy = self.lat - point[1];
        dx * dx + dy * dy
    }
}

/// An obstacle's bounding-box envelope, keyed by its index into
/// `RTreeStorage::obstacles`. A second, independent R-tree from the
/// waypoint index, per spec §4.3.
#[derive(Clone)]
struct IndexedBox {
    id: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn envelope_of(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat])
}

#[derive(Clone)]
pub struct RTreeStorage {
    tree: WaypointTree,
    index: RTree<IndexedPoint>,
    obstacles: Vec<Feature3D>,
    obstacle_index: RTree<IndexedBox>,
}

impl RTreeStorage {
    pub fn new() -> Self {
        Self {
            tree: WaypointTree::new(),
            index: RTree::new(),
            obstacles: Vec::new(),
            obstacle_index: RTree::new(),
        }
    }

    fn insert_index(&mut self, wp: &Waypoint) {
        self.index.insert(IndexedPoint {
            id: wp.id,
            lon: wp.lon,
            lat: wp.lat,
        });
    }

    /// Candidate ids from the 2D index, nearest-first by the (lon, lat)
    /// projection. The 2D ordering is a proxy for true 3D distance; callers
    /// refine with exact `haversine3d` before using these for ranking.
    fn candidates(&self, target: &Waypoint) -> impl Iterator<Item = u64> + '_ {
        self.index
            .nearest_neighbor_iter(&[target.lon, target.lat])
            .map(|p| p.id)
    }

    /// Obstacles whose bounding box intersects `bbox`, prefiltered through
    /// the constraint R-tree before any exact geometric test runs.
    fn obstacles_overlapping(&self, bbox: &BBox) -> Vec<&Feature3D> {
        self.obstacle_index
            .locate_in_envelope_intersecting(&envelope_of(bbox))
            .map(|ib| &self.obstacles[ib.id])
            .collect()
    }
}

impl Default for RTreeStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for RTreeStorage {
    fn add_root(&mut self, wp: Waypoint) {
        self.insert_index(&wp);
        self.tree.insert_root(wp);
    }

    fn add_waypoint_with_previous(&mut self, wp: Waypoint, parent_id: u64) {
        self.insert_index(&wp);
        self.tree.insert_with_parent(wp, parent_id);
    }

    fn change_previous(&mut self, wp_id: u64, new_parent_id: u64) {
        self.tree.change_parent(wp_id, new_parent_id);
    }

    fn nearest(&self, target: &Waypoint) -> Option<Waypoint> {
        // The index alone only ranks by the 2D projection; refine over a
        // small candidate pool to account for altitude.
        let mut best: Option<(f64, Waypoint)> = None;
        for id in self.candidates(target).take(16) {
            let Some(wp) = self.tree.get(id) else { continue };
            let d = haversine3d(target, wp);
            if best.as_ref().map(|(bd, _)| d < *bd).unwrap_or(true) {
                best = Some((d, wp.clone()));
            }
        }
        best.map(|(_, wp)| wp)
    }

    fn nearest_points_in_radius(&self, target: &Waypoint, radius_m: f64) -> Vec<PointDist> {
        let mut hits: Vec<PointDist> = self
            .candidates(target)
            .filter_map(|id| self.tree.get(id))
            .map(|wp| PointDist::new(wp.clone(), haversine3d(target, wp)))
            .filter(|pd| pd.distance_m <= radius_m)
            .collect();
        hits.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        hits
    }

    fn k_nearest(&self, target: &Waypoint, k: usize) -> Vec<Waypoint> {
        let pool = k.saturating_mul(4).max(16);
        let mut candidates: Vec<(f64, Waypoint)> = self
            .candidates(target)
            .take(pool)
            .filter_map(|id| self.tree.get(id))
            .map(|wp| (haversine3d(target, wp), wp.clone()))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.into_iter().take(k).map(|(_, wp)| wp).collect()
    }

    fn path_to_root(&self, wp_id: u64) -> Vec<Waypoint> {
        self.tree.path_to_root(wp_id)
    }

    fn cost_to_root(&self, wp_id: u64) -> f64 {
        self.tree.cost_to_root(wp_id)
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn add_constraint(&mut self, obstacle: Feature3D) {
        let id = self.obstacles.len();
        self.obstacle_index.insert(IndexedBox {
            id,
            envelope: envelope_of(&obstacle.bbox()),
        });
        self.obstacles.push(obstacle);
    }

    fn obstacles(&self) -> &[Feature3D] {
        &self.obstacles
    }

    fn clear_waypoints(&mut self) {
        self.tree.clear();
        self.index = RTree::new();
    }

    fn clear_constraints(&mut self) {
        self.obstacles.clear();
        self.obstacle_index = RTree::new();
    }

    fn box_clone(&self) -> Box<dyn Storage> {
        Box::new(self.clone())
    }

    fn is_point_in_obstacles(&self, p: &Waypoint) -> Option<Feature3D> {
        let point_bbox = BBox {
            min_lon: p.lon,
            max_lon: p.lon,
            min_lat: p.lat,
            max_lat: p.lat,
        };
        self.obstacles_overlapping(&point_bbox)
            .into_iter()
            .find(|o| point_in_polygon(p, o))
            .cloned()
    }

    fn get_all_obstacles_containing_point(&self, p: &Waypoint) -> Vec<Feature3D> {
        let point_bbox = BBox {
            min_lon: p.lon,
            max_lon: p.lon,
            min_lat: p.lat,
            max_lat: p.lat,
        };
        self.obstacles_overlapping(&point_bbox)
            .into_iter()
            .filter(|o| point_in_polygon(p, o))
            .cloned()
            .collect()
    }

    fn is_line_in_obstacles(&self, a: &Waypoint, b: &Waypoint) -> bool {
        let seg_bbox = BBox {
            min_lon: a.lon.min(b.lon),
            max_lon: a.lon.max(b.lon),
            min_lat: a.lat.min(b.lat),
            max_lat: a.lat.max(b.lat),
        };
        let candidates: Vec<Feature3D> = self.obstacles_overlapping(&seg_bbox).into_iter().cloned().collect();
        line_in_polygon(a, b, &candidates)
    }

    fn get_all_obstacles_in_search_volume(&self, volume: &Feature3D) -> Vec<Feature3D> {
        let vbbox = volume.bbox();
        self.obstacles_overlapping(&vbbox)
            .into_iter()
            .filter(|o| o.altitude_overlaps(&volume.min_alt, &volume.max_alt) && polygon_overlaps(o, volume))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{fresh_waypoint_id, Altitude};

    fn wp(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(fresh_waypoint_id(), lat, lon, Altitude::meters(0.0)).unwrap()
    }

    #[test]
    fn nearest_picks_closest() {
        let mut s = RTreeStorage::new();
        let root = wp(50.0, 4.0);
        let root_id = root.id;
        s.add_root(root);
        let near = wp(50.001, 4.0);
        let near_id = near.id;
        s.add_waypoint_with_previous(near, root_id);
        let far = wp(51.0, 4.0);
        s.add_waypoint_with_previous(far, root_id);

        let found = s.nearest(&wp(50.0009, 4.0)).unwrap();
        assert_eq!(found.id, near_id);
    }

    #[test]
    fn k_nearest_returns_requested_count() {
        let mut s = RTreeStorage::new();
        let root = wp(50.0, 4.0);
        let root_id = root.id;
        s.add_root(root);
        for i in 1..10 {
            let p = wp(50.0 + i as f64 * 0.0005, 4.0);
            s.add_waypoint_with_previous(p, root_id);
        }
        let found = s.k_nearest(&wp(50.0, 4.0), 3);
        assert_eq!(found.len(), 3);
    }

    fn square() -> Feature3D {
        Feature3D::new(
            crate::model::Ring::new(vec![
                (4.435823, 50.879178),
                (4.435999, 50.876187),
                (4.443605, 50.878195),
                (4.439679, 50.884467),
                (4.435823, 50.879178),
            ]),
            vec![],
            crate::model::AltitudeBound::Bounded(Altitude::meters(0.0)),
            crate::model::AltitudeBound::Bounded(Altitude::meters(999_999.0)),
        )
    }

    #[test]
    fn is_point_in_obstacles_uses_the_constraint_index() {
        let mut s = RTreeStorage::new();
        s.add_constraint(square());
        assert!(s.is_point_in_obstacles(&wp(50.879, 4.439)).is_some());
        assert!(s.is_point_in_obstacles(&wp(10.0, 10.0)).is_none());
    }

    #[test]
    fn clear_constraints_empties_the_obstacle_index() {
        let mut s = RTreeStorage::new();
        s.add_constraint(square());
        s.clear_constraints();
        assert!(s.obstacles().is_empty());
        assert!(s.is_point_in_obstacles(&wp(50.879, 4.439)).is_none());
    }
}
