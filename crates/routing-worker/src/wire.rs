//! Wire (de)serialization between Kafka message bytes and `routing-core`'s
//! domain types (spec §4.7). Kept thin: the boundary only translates shapes,
//! it never makes planning decisions.

use std::collections::HashMap;

use routing_core::{fresh_waypoint_id, Altitude, AltitudeUnit, Feature3D, RoutingRequest, RoutingResponse, Waypoint};
use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

#[derive(Debug, Deserialize)]
struct WireWaypoint {
    lat: f64,
    lon: f64,
    alt: f64,
    #[serde(default)]
    alt_unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRequest {
    request_id: String,
    waypoints: Vec<WireWaypoint>,
    #[serde(default)]
    constraints: Vec<Feature3D>,
    search_volume: Feature3D,
    #[serde(default)]
    parameters: HashMap<String, serde_json::Value>,
}

/// Decode one Kafka message body into a `RoutingRequest`, stamping it with
/// the time it was received rather than any client-supplied clock.
pub fn decode_request(payload: &[u8]) -> Result<RoutingRequest, WorkerError> {
    let wire: WireRequest = serde_json::from_slice(payload)?;

    let waypoints = wire
        .waypoints
        .into_iter()
        .map(|w| {
            let unit = match w.alt_unit.as_deref() {
                Some("ft") | Some("feet") => AltitudeUnit::Feet,
                _ => AltitudeUnit::Meters,
            };
            Waypoint::new(fresh_waypoint_id(), w.lat, w.lon, Altitude::new(w.alt, unit))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RoutingRequest {
        request_id: wire.request_id,
        waypoints,
        constraints: wire.constraints,
        search_volume: wire.search_volume,
        parameters: wire.parameters,
        received_at: chrono::Utc::now(),
    })
}

/// A best-effort decode failure response, used when `decode_request` itself
/// errors and no `RoutingRequest` exists to build a normal failure from.
pub fn decode_failure_response(raw: &[u8], err: &WorkerError) -> RoutingResponse {
    let request_id = extract_request_id(raw).unwrap_or_else(|| "unknown".to_string());
    RoutingResponse::decode_failure(request_id, err.to_string())
}

fn extract_request_id(raw: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(raw).ok()?;
    value.get("request_id")?.as_str().map(str::to_string)
}

#[derive(Serialize)]
struct WireResponse<'a> {
    request_id: &'a str,
    route_found: bool,
    route: &'a [Waypoint],
    cost_m: f64,
    message: &'a str,
    received_at: chrono::DateTime<chrono::Utc>,
    completed_at: chrono::DateTime<chrono::Utc>,
}

/// Encode a `RoutingResponse` as the Kafka message body published on the
/// output topic.
pub fn encode_response(response: &RoutingResponse) -> Vec<u8> {
    let wire = WireResponse {
        request_id: &response.request_id,
        route_found: response.route_found,
        route: &response.route,
        cost_m: response.cost_m,
        message: &response.message,
        received_at: response.received_at,
        completed_at: response.completed_at,
    };
    serde_json::to_vec(&wire).expect("RoutingResponse always encodes to valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_minimal_request() {
        let payload = serde_json::json!({
            "request_id": "abc",
            "waypoints": [
                {"lat": 50.1, "lon": 4.1, "alt": 100.0},
                {"lat": 50.2, "lon": 4.2, "alt": 100.0}
            ],
            "search_volume": {
                "exterior": {"points": [[4.0, 50.0], [5.0, 50.0], [5.0, 51.0], [4.0, 51.0], [4.0, 50.0]]},
                "holes": [],
                "min_alt": {"bounded": {"value": 0.0, "unit": "meters"}},
                "max_alt": {"bounded": {"value": 500.0, "unit": "meters"}}
            }
        });
        let bytes = serde_json::to_vec(&payload).unwrap();
        let request = decode_request(&bytes).expect("well-formed request decodes");
        assert_eq!(request.request_id, "abc");
        assert_eq!(request.waypoints.len(), 2);
    }

    #[test]
    fn decode_failure_extracts_request_id_when_possible() {
        let bytes = br#"{"request_id": "xyz", "waypoints": "not-an-array"}"#;
        let err = decode_request(bytes).unwrap_err();
        let resp = decode_failure_response(bytes, &err);
        assert_eq!(resp.request_id, "xyz");
        assert!(!resp.route_found);
    }
}
