//! Linear-scan storage backend (spec §4.3).

use crate::geometry::haversine3d;
use crate::model::{Feature3D, PointDist, Waypoint};

use super::WaypointTree;
use super::Storage;

/// Backs every query with a full scan over stored waypoints and obstacles.
/// Simple, correct, and adequate for the waypoint counts this service plans
/// for (spec's "small-to-moderate" scale note in §4.3).
#[derive(Default, Clone)]
pub struct ListStorage {
    tree: WaypointTree,
    obstacles: Vec<Feature3D>,
}

impl ListStorage {
    pub fn new() -> Self {
        Self {
            tree: WaypointTree::new(),
            obstacles: Vec::new(),
        }
    }
}

impl Storage for ListStorage {
    fn add_root(&mut self, wp: Waypoint) {
        self.tree.insert_root(wp);
    }

    fn add_waypoint_with_previous(&mut self, wp: Waypoint, parent_id: u64) {
        self.tree.insert_with_parent(wp, parent_id);
    }

    fn change_previous(&mut self, wp_id: u64, new_parent_id: u64) {
        self.tree.change_parent(wp_id, new_parent_id);
    }

    fn nearest(&self, target: &Waypoint) -> Option<Waypoint> {
        self.tree
            .all()
            .min_by(|a, b| haversine3d(target, a).total_cmp(&haversine3d(target, b)))
            .cloned()
    }

    fn nearest_points_in_radius(&self, target: &Waypoint, radius_m: f64) -> Vec<PointDist> {
        let mut hits: Vec<PointDist> = self
            .tree
            .all()
            .map(|wp| PointDist::new(wp.clone(), haversine3d(target, wp)))
            .filter(|pd| pd.distance_m <= radius_m)
            .collect();
        // Sort by the raw f64 distance via total_cmp, not a truncating cast:
        // the source's equivalent routine sorted on an integer-truncated
        // distance, which silently misordered near-tied candidates.
        hits.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        hits
    }

    fn k_nearest(&self, target: &Waypoint, k: usize) -> Vec<Waypoint> {
        let mut all: Vec<(f64, Waypoint)> = self
            .tree
            .all()
            .map(|wp| (haversine3d(target, wp), wp.clone()))
            .collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0));
        all.into_iter().take(k).map(|(_, wp)| wp).collect()
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
        self.obstacles.push(obstacle);
    }

    fn obstacles(&self) -> &[Feature3D] {
        &self.obstacles
    }

    fn clear_waypoints(&mut self) {
        self.tree.clear();
    }

    fn clear_constraints(&mut self) {
        self.obstacles.clear();
    }

    fn box_clone(&self) -> Box<dyn Storage> {
        Box::new(self.clone())
    }
}
