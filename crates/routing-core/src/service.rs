//! Top-level request handling: validate, plan, respond (spec §4.6).

use crate::geometry::total_haversine_distance;
use crate::model::{RoutingRequest, RoutingResponse};
use crate::planner::{compute, compute_concurrently, new_planner};
use crate::validator::validate;

/// Validate `request`, run the configured planner across its waypoints, and
/// produce a response. Never panics or returns `Err`: planning failures are
/// reported as a `route_found: false` response, matching the at-most-one
/// response per request contract in spec §4.6/§7.
pub fn handle_routing_request(request: &RoutingRequest) -> RoutingResponse {
    let validated = match validate(request) {
        Ok(v) => v,
        Err(e) => {
            return RoutingResponse::failure(request, Vec::new(), 0.0, e.to_string(), chrono::Utc::now());
        }
    };

    let planner = new_planner(validated.params.algorithm);
    // A single worker plans every segment on the calling thread; anything
    // else fans segments out across OS threads (spec §5).
    let result = if validated.params.max_workers == 1 {
        compute(
            planner.as_ref(),
            &validated.waypoints,
            &validated.obstacles,
            &validated.search_volume,
            &validated.params,
        )
    } else {
        compute_concurrently(
            planner.as_ref(),
            &validated.waypoints,
            &validated.obstacles,
            &validated.search_volume,
            &validated.params,
        )
    };

    match result {
        Ok(route) => {
            let cost_m = total_haversine_distance(&route);
            RoutingResponse::success(request, route, cost_m, chrono::Utc::now())
        }
        Err(e) => RoutingResponse::failure(request, Vec::new(), 0.0, e.to_string(), chrono::Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{fresh_waypoint_id, Altitude, AltitudeBound, Ring, Waypoint};
    use std::collections::HashMap;

    fn wp(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(fresh_waypoint_id(), lat, lon, Altitude::meters(100.0)).unwrap()
    }

    fn volume() -> crate::model::Feature3D {
        crate::model::Feature3D::new(
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

    #[test]
    fn reports_failure_for_invalid_request() {
        let req = RoutingRequest {
            request_id: "bad".into(),
            waypoints: vec![wp(50.1, 4.1)],
            constraints: vec![],
            search_volume: volume(),
            parameters: HashMap::new(),
            received_at: chrono::Utc::now(),
        };
        let resp = handle_routing_request(&req);
        assert!(!resp.route_found);
        assert_eq!(resp.request_id, "bad");
    }

    #[test]
    fn finds_route_for_valid_request_with_no_obstacles() {
        let mut parameters = HashMap::new();
        parameters.insert("algorithm".to_string(), serde_json::json!("rrtstar"));
        parameters.insert("storage".to_string(), serde_json::json!("list"));
        parameters.insert("max_workers".to_string(), serde_json::json!(1));
        parameters.insert("max_iterations".to_string(), serde_json::json!(3000));

        let req = RoutingRequest {
            request_id: "good".into(),
            waypoints: vec![wp(50.1, 4.1), wp(50.2, 4.2)],
            constraints: vec![],
            search_volume: volume(),
            parameters,
            received_at: chrono::Utc::now(),
        };
        let resp = handle_routing_request(&req);
        assert!(resp.route_found);
        assert!(resp.cost_m > 0.0);
    }
}
