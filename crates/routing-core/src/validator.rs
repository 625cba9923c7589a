//! Request validation: shape checks plus trimming obstacles that can't
//! possibly matter to the search volume (spec §4.5).

use crate::error::PlanningError;
use crate::model::{Feature3D, PlannerParameters, RoutingRequest, StorageType, Waypoint};
use crate::storage::new_storage;

/// A request reduced to exactly what a planner needs: waypoints to connect
/// in order, obstacles that actually overlap the search volume, the search
/// volume itself, and resolved planner parameters.
pub struct ValidatedRequest {
    pub waypoints: Vec<Waypoint>,
    pub obstacles: Vec<Feature3D>,
    pub search_volume: Feature3D,
    pub params: PlannerParameters,
}

pub fn validate(request: &RoutingRequest) -> Result<ValidatedRequest, PlanningError> {
    if request.waypoints.len() < 2 {
        return Err(PlanningError::invalid_input(
            "a routing request needs at least two waypoints",
        ));
    }

    for wp in &request.waypoints {
        Waypoint::validate_coords(wp.lat, wp.lon)?;
    }

    let search_volume = request.search_volume.clone();

    // Build a temporary R-tree storage to trim both obstacles and
    // waypoints down to what actually lies in the search volume (spec
    // §4.5 step 3): bounding-box intersection, altitude overlap, then full
    // polygon-containment confirmation for obstacles; polygon containment
    // for waypoints.
    let mut staging = new_storage(StorageType::Rtree);
    staging.add_constraints(&request.constraints);
    let obstacles = staging.get_all_obstacles_in_search_volume(&search_volume);
    let waypoints = staging.get_all_waypoints_in_search_volume(&request.waypoints, &search_volume);

    let dropped_obstacles = request.constraints.len() - obstacles.len();
    if dropped_obstacles > 0 {
        tracing::debug!(dropped = dropped_obstacles, "trimmed obstacles outside the search volume");
    }
    let dropped_waypoints = request.waypoints.len() - waypoints.len();
    if dropped_waypoints > 0 {
        tracing::debug!(dropped = dropped_waypoints, "dropped waypoints outside the search volume");
    }

    Ok(ValidatedRequest {
        waypoints,
        obstacles,
        search_volume,
        params: request.planner_parameters(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{fresh_waypoint_id, Altitude, AltitudeBound, Ring};
    use std::collections::HashMap;

    fn wp(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(fresh_waypoint_id(), lat, lon, Altitude::meters(100.0)).unwrap()
    }

    fn volume() -> Feature3D {
        Feature3D::new(
            Ring::new(vec![
                (4.0, 50.0),
                (5.0, 50.0),
                (5.0, 51.0),
                (4.0, 51.0),
                (4.0, 50.0),
            ]),
            vec![],
            AltitudeBound::Bounded(Altitude::meters(0.0)),
            AltitudeBound::Bounded(Altitude::meters(500.0)),
        )
    }

    fn far_away_obstacle() -> Feature3D {
        Feature3D::new(
            Ring::new(vec![
                (40.0, 10.0),
                (41.0, 10.0),
                (41.0, 11.0),
                (40.0, 11.0),
                (40.0, 10.0),
            ]),
            vec![],
            AltitudeBound::Unbounded,
            AltitudeBound::Unbounded,
        )
    }

    #[test]
    fn rejects_single_waypoint_requests() {
        let req = RoutingRequest {
            request_id: "r1".into(),
            waypoints: vec![wp(50.1, 4.1)],
            constraints: vec![],
            search_volume: volume(),
            parameters: HashMap::new(),
            received_at: chrono::Utc::now(),
        };
        assert!(validate(&req).is_err());
    }

    #[test]
    fn trims_obstacles_outside_search_volume() {
        let req = RoutingRequest {
            request_id: "r2".into(),
            waypoints: vec![wp(50.1, 4.1), wp(50.2, 4.2)],
            constraints: vec![far_away_obstacle()],
            search_volume: volume(),
            parameters: HashMap::new(),
            received_at: chrono::Utc::now(),
        };
        let validated = validate(&req).unwrap();
        assert!(validated.obstacles.is_empty());
    }

    #[test]
    fn drops_waypoints_outside_search_volume() {
        let req = RoutingRequest {
            request_id: "r3".into(),
            waypoints: vec![
                wp(50.1, 4.1),
                wp(50.2, 4.2),
                // Outside the volume's lat/lon ring entirely.
                wp(10.0, 10.0),
                // Inside the ring but above its altitude band.
                Waypoint::new(fresh_waypoint_id(), 50.15, 4.15, Altitude::meters(10_000.0)).unwrap(),
            ],
            constraints: vec![],
            search_volume: volume(),
            parameters: HashMap::new(),
            received_at: chrono::Utc::now(),
        };
        let validated = validate(&req).unwrap();
        assert_eq!(validated.waypoints.len(), 2);
    }

    #[test]
    fn drops_an_obstacle_whose_bbox_overlaps_but_whose_ring_does_not() {
        // A triangular obstacle whose bounding box overlaps the volume's
        // corner, but whose ring occupies only the far corner of that box
        // and never actually crosses into the volume.
        let triangle = Feature3D::new(
            Ring::new(vec![
                (5.5, 50.5),
                (5.5, 51.5),
                (4.5, 51.6),
                (5.5, 50.5),
            ]),
            vec![],
            AltitudeBound::Unbounded,
            AltitudeBound::Unbounded,
        );
        let req = RoutingRequest {
            request_id: "r4".into(),
            waypoints: vec![wp(50.1, 4.1), wp(50.2, 4.2)],
            constraints: vec![triangle],
            search_volume: volume(),
            parameters: HashMap::new(),
            received_at: chrono::Utc::now(),
        };
        let validated = validate(&req).unwrap();
        assert!(validated.obstacles.is_empty());
    }
}
