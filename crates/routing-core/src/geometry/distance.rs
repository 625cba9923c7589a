//! Distance primitives.
//!
//! The 2D component uses the WGS84 geodesic inverse solution (via
//! `geographiclib-rs`, matching the source's use of a geodesic library)
//! rather than a spherical mean-radius approximation.

use geographiclib_rs::{Geodesic, InverseGeodesic};

use crate::model::Waypoint;

/// 3D haversine-equivalent distance: `sqrt(horizontal_m^2 + vertical_m^2)`.
pub fn haversine3d(a: &Waypoint, b: &Waypoint) -> f64 {
    let horizontal = geodesic_distance_m(a.lat, a.lon, b.lat, b.lon);
    let vertical = a.alt.distance(&b.alt);
    (horizontal.powi(2) + vertical.powi(2)).sqrt()
}

/// Horizontal geodesic distance in meters between two (lat, lon) pairs.
pub fn geodesic_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let geod = Geodesic::wgs84();
    let (s12, _azi1, _azi2): (f64, f64, f64) = geod.inverse(lat1, lon1, lat2, lon2);
    s12
}

/// Forward azimuth in degrees from `(lat1,lon1)` to `(lat2,lon2)`.
pub fn geodesic_azimuth_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let geod = Geodesic::wgs84();
    let (_s12, azi1, _azi2): (f64, f64, f64) = geod.inverse(lat1, lon1, lat2, lon2);
    azi1
}

/// Cheaper, non-ranking-only distance using an equirectangular projection.
/// Not used to rank candidates where the small-angle approximation would
/// change the ordering versus [`haversine3d`].
pub fn fast_distance3d(a: &Waypoint, b: &Waypoint) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let mean_lat = (lat1 + lat2) / 2.0;
    let dx = (b.lon - a.lon).to_radians() * mean_lat.cos();
    let dy = (b.lat - a.lat).to_radians();
    let horizontal = EARTH_RADIUS_M * (dx.powi(2) + dy.powi(2)).sqrt();
    let vertical = a.alt.distance(&b.alt);
    (horizontal.powi(2) + vertical.powi(2)).sqrt()
}

/// Sum of `haversine3d` over consecutive pairs.
pub fn total_haversine_distance(route: &[Waypoint]) -> f64 {
    route.windows(2).map(|w| haversine3d(&w[0], &w[1])).sum()
}
