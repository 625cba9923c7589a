//! Spatial storage backends for the sampling-based planners (spec §4.3).
//!
//! Both backends (`list`, `rtree`) embed a [`WaypointTree`] for the
//! parent-map / cost-to-root bookkeeping that RRT and RRT* share, and differ
//! only in how they answer nearest-neighbor and radius queries.

mod list;
mod rtree;

pub use list::ListStorage;
pub use rtree::RTreeStorage;

use std::collections::HashMap;

use crate::error::PlanningError;
use crate::geometry::{haversine3d, intersection_points, line_in_polygon, point_in_polygon};
use crate::model::{fresh_waypoint_id, Feature3D, LinePolygonIntersection, PointDist, StorageType, Waypoint};
use crate::sampler::Sampler;

/// Maximum rejection-sampling attempts before giving up on one draw (spec
/// §4.2: sampling is bounded, not retried indefinitely).
const MAX_SAMPLE_ATTEMPTS: usize = 200;

/// Operations a planner needs from its spatial index (spec §4.3 table).
/// Every backend stores both the waypoint tree (parent/cost bookkeeping for
/// RRT/RRT*) and the obstacle set consulted by every planner, including
/// AntPath's deterministic crossing walk.
pub trait Storage: Send {
    /// Insert a free-standing waypoint (the tree root) with no parent.
    fn add_root(&mut self, wp: Waypoint);

    /// Insert `wp` with `parent` as its tree predecessor, cost tracked as
    /// `parent`'s cost-to-root plus the 3D distance between them.
    fn add_waypoint_with_previous(&mut self, wp: Waypoint, parent_id: u64);

    /// Re-point `wp_id`'s parent to `new_parent_id`, used by RRT*'s rewire
    /// step. Recomputes `wp_id`'s cost but NOT its descendants' (spec's
    /// rewire-phase cost-accumulation bug is intentionally not reproduced;
    /// see DESIGN.md).
    fn change_previous(&mut self, wp_id: u64, new_parent_id: u64);

    /// The nearest stored waypoint to `target` by 3D distance.
    fn nearest(&self, target: &Waypoint) -> Option<Waypoint>;

    /// All stored waypoints within `radius_m` of `target`, nearest first.
    fn nearest_points_in_radius(&self, target: &Waypoint, radius_m: f64) -> Vec<PointDist>;

    /// The `k` nearest stored waypoints to `target`, nearest first.
    fn k_nearest(&self, target: &Waypoint, k: usize) -> Vec<Waypoint>;

    /// Walk `wp_id`'s parent chain back to the root, root first.
    fn path_to_root(&self, wp_id: u64) -> Vec<Waypoint>;

    /// Sum of 3D edge lengths from `wp_id` back to the root.
    fn cost_to_root(&self, wp_id: u64) -> f64;

    /// Number of waypoints currently stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert one obstacle.
    fn add_constraint(&mut self, obstacle: Feature3D);

    /// Insert several obstacles.
    fn add_constraints(&mut self, obstacles: &[Feature3D]) {
        for o in obstacles {
            self.add_constraint(o.clone());
        }
    }

    /// Every obstacle currently stored.
    fn obstacles(&self) -> &[Feature3D];

    /// Drop all waypoints and obstacles.
    fn clear(&mut self) {
        self.clear_waypoints();
        self.clear_constraints();
    }

    /// Drop only the waypoint tree, keeping obstacles (RRT/RRT* reuse the
    /// same obstacle set across the segments of one request).
    fn clear_waypoints(&mut self);

    /// Drop only the obstacle set.
    fn clear_constraints(&mut self);

    /// An independent deep copy, used to isolate concurrent workers (spec
    /// §4.4.2/§5) from each other's mutations.
    fn box_clone(&self) -> Box<dyn Storage>;

    /// The first stored obstacle containing `p`, if any.
    fn is_point_in_obstacles(&self, p: &Waypoint) -> Option<Feature3D> {
        self.obstacles().iter().find(|o| point_in_polygon(p, o)).cloned()
    }

    /// Every stored obstacle containing `p`.
    fn get_all_obstacles_containing_point(&self, p: &Waypoint) -> Vec<Feature3D> {
        self.obstacles().iter().filter(|o| point_in_polygon(p, o)).cloned().collect()
    }

    /// True iff any stored obstacle blocks the segment `a -> b`.
    fn is_line_in_obstacles(&self, a: &Waypoint, b: &Waypoint) -> bool {
        line_in_polygon(a, b, self.obstacles())
    }

    /// The ordered sequence of obstacle crossings along `a -> b` (spec
    /// §4.4.5). `None` if `a` or `b` itself lies inside an obstacle.
    fn get_intersection_points(&self, a: &Waypoint, b: &Waypoint) -> Option<Vec<LinePolygonIntersection>> {
        intersection_points(a, b, self.obstacles())
    }

    /// Stored obstacles whose bounding box intersects `volume`'s, whose
    /// altitude band overlaps it, and whose ring actually overlaps it (spec
    /// §4.3: "intersect by bounding box then by full containment").
    fn get_all_obstacles_in_search_volume(&self, volume: &Feature3D) -> Vec<Feature3D> {
        let vbbox = volume.bbox();
        self.obstacles()
            .iter()
            .filter(|o| {
                o.bbox().intersects(&vbbox)
                    && o.altitude_overlaps(&volume.min_alt, &volume.max_alt)
                    && crate::geometry::polygon_overlaps(o, volume)
            })
            .cloned()
            .collect()
    }

    /// Of `waypoints`, those whose coordinate and altitude lie within
    /// `volume` (spec §4.3/§4.5).
    fn get_all_waypoints_in_search_volume(&self, waypoints: &[Waypoint], volume: &Feature3D) -> Vec<Waypoint> {
        waypoints.iter().filter(|w| point_in_polygon(w, volume)).cloned().collect()
    }

    /// Rejection-sample a point inside `volume`'s polygon, ignoring
    /// obstacles.
    fn sample(&self, sampler: &mut dyn Sampler, volume: &Feature3D) -> Option<Waypoint> {
        sample_in_volume(sampler, volume, &[])
    }

    /// Rejection-sample a point inside `volume`'s polygon that also lies
    /// outside every stored obstacle.
    fn sample_free(&self, sampler: &mut dyn Sampler, volume: &Feature3D) -> Option<Waypoint> {
        sample_in_volume(sampler, volume, self.obstacles())
    }
}

/// Draw a point from `sampler` within `volume`'s bounding box and altitude
/// band, rejecting draws outside `volume`'s polygon or inside `obstacles`.
/// Returns `None` if no valid draw is found within the attempt budget.
fn sample_in_volume(sampler: &mut dyn Sampler, volume: &Feature3D, obstacles: &[Feature3D]) -> Option<Waypoint> {
    let bbox = volume.bbox();
    let min_z = volume.min_alt.normalize_min();
    let max_z = volume.max_alt.normalize_max();
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let (lon, lat, z) = sampler.sample_xyz(bbox.min_lon, bbox.max_lon, bbox.min_lat, bbox.max_lat, min_z, max_z);
        let candidate = match Waypoint::new(fresh_waypoint_id(), lat, lon, crate::model::Altitude::meters(z)) {
            Ok(wp) => wp,
            Err(_) => continue,
        };
        if !point_in_polygon(&candidate, volume) {
            continue;
        }
        if obstacles.iter().any(|o| point_in_polygon(&candidate, o)) {
            continue;
        }
        return Some(candidate);
    }
    None
}

/// Parent-map and cost-to-root bookkeeping shared by every [`Storage`]
/// backend. Keyed on [`Waypoint::id`], never on coordinate equality, since
/// the planners treat waypoints as distinct nodes even when co-located.
#[derive(Default, Clone)]
pub struct WaypointTree {
    waypoints: HashMap<u64, Waypoint>,
    parent: HashMap<u64, u64>,
    cost: HashMap<u64, f64>,
}

impl WaypointTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_root(&mut self, wp: Waypoint) {
        let id = wp.id;
        self.waypoints.insert(id, wp);
        self.cost.insert(id, 0.0);
    }

    pub fn insert_with_parent(&mut self, wp: Waypoint, parent_id: u64) {
        let id = wp.id;
        let edge_cost = self
            .waypoints
            .get(&parent_id)
            .map(|p| haversine3d(p, &wp))
            .unwrap_or(0.0);
        let parent_cost = *self.cost.get(&parent_id).unwrap_or(&0.0);
        self.waypoints.insert(id, wp);
        self.parent.insert(id, parent_id);
        self.cost.insert(id, parent_cost + edge_cost);
    }

    pub fn change_parent(&mut self, id: u64, new_parent_id: u64) {
        let Some(wp) = self.waypoints.get(&id).cloned() else {
            return;
        };
        let Some(new_parent) = self.waypoints.get(&new_parent_id).cloned() else {
            return;
        };
        let edge_cost = haversine3d(&new_parent, &wp);
        let parent_cost = *self.cost.get(&new_parent_id).unwrap_or(&0.0);
        self.parent.insert(id, new_parent_id);
        self.cost.insert(id, parent_cost + edge_cost);
    }

    pub fn get(&self, id: u64) -> Option<&Waypoint> {
        self.waypoints.get(&id)
    }

    pub fn cost_to_root(&self, id: u64) -> f64 {
        *self.cost.get(&id).unwrap_or(&0.0)
    }

    pub fn path_to_root(&self, id: u64) -> Vec<Waypoint> {
        let mut path = Vec::new();
        let mut cur = id;
        loop {
            match self.waypoints.get(&cur) {
                Some(wp) => path.push(wp.clone()),
                None => break,
            }
            match self.parent.get(&cur) {
                Some(&p) => cur = p,
                None => break,
            }
        }
        path.reverse();
        path
    }

    pub fn all(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.values()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.parent.clear();
        self.cost.clear();
    }
}

/// Construct the storage backend selected by wire value.
pub fn new_storage(storage_type: StorageType) -> Box<dyn Storage> {
    match storage_type {
        StorageType::List => Box::new(ListStorage::new()),
        StorageType::Rtree => Box::new(RTreeStorage::new()),
    }
}

/// Error raised when a planner asks for a waypoint id that isn't stored.
pub fn missing_waypoint(id: u64) -> PlanningError {
    PlanningError::storage(format!("waypoint {id} not found in storage"))
}
