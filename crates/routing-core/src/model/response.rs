//! RoutingResponse: the outcome of planning a request.

use super::request::RoutingRequest;
use super::waypoint::Waypoint;

/// The outcome of planning a request. Embeds the originating request so the
/// boundary adapter can echo it untouched on the wire.
#[derive(Debug, Clone)]
pub struct RoutingResponse {
    pub request_id: String,
    pub route_found: bool,
    pub route: Vec<Waypoint>,
    /// Always meters — see SPEC_FULL.md §9 ("Cost units").
    pub cost_m: f64,
    pub message: String,
    pub received_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl RoutingResponse {
    pub fn success(
        request: &RoutingRequest,
        route: Vec<Waypoint>,
        cost_m: f64,
        completed_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            request_id: request.request_id.clone(),
            route_found: true,
            route,
            cost_m,
            message: "route found".to_string(),
            received_at: request.received_at,
            completed_at,
        }
    }

    pub fn failure(
        request: &RoutingRequest,
        partial_route: Vec<Waypoint>,
        partial_cost_m: f64,
        message: impl Into<String>,
        completed_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            request_id: request.request_id.clone(),
            route_found: false,
            route: partial_route,
            cost_m: partial_cost_m,
            message: message.into(),
            received_at: request.received_at,
            completed_at,
        }
    }

    /// A minimal error response for requests that failed to decode at all
    /// (spec §7 `DecodeFailure`): carries only the echoed `request_id`.
    pub fn decode_failure(request_id: String, message: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            request_id,
            route_found: false,
            route: Vec::new(),
            cost_m: 0.0,
            message: message.into(),
            received_at: now,
            completed_at: now,
        }
    }
}
