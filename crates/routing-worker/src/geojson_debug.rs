//! Optional GeoJSON export of a computed route, for local debugging (spec
//! §4.7). Only active when `ROUTING_GEOJSON_DEBUG_DIR` is set; a missing
//! directory or write failure is logged and otherwise ignored, since this
//! path must never affect whether a response gets published.

use std::path::Path;

use routing_core::RoutingResponse;

pub fn maybe_write(debug_dir: Option<&str>, response: &RoutingResponse) {
    let Some(dir) = debug_dir else { return };
    if let Err(err) = write(dir, response) {
        tracing::warn!(request_id = %response.request_id, error = %err, "failed to write geojson debug output");
    }
}

fn write(dir: &str, response: &RoutingResponse) -> std::io::Result<()> {
    let coordinates: Vec<[f64; 3]> = response
        .route
        .iter()
        .map(|wp| [wp.lon, wp.lat, wp.alt.normalize()])
        .collect();

    let feature = serde_json::json!({
        "type": "Feature",
        "properties": {
            "request_id": response.request_id,
            "route_found": response.route_found,
            "cost_m": response.cost_m,
        },
        "geometry": {
            "type": "LineString",
            "coordinates": coordinates,
        },
    });

    std::fs::create_dir_all(dir)?;
    let path = Path::new(dir).join(format!("{}.geojson", response.request_id));
    std::fs::write(path, serde_json::to_vec_pretty(&feature)?)
}
