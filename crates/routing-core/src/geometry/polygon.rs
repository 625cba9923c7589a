//! Polygon containment, line-blocking tests, resampling, steering, and union.

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geographiclib_rs::{DirectGeodesic, Geodesic, InverseGeodesic};

use crate::model::{fresh_waypoint_id, Altitude, AltitudeBound, Feature3D, LinePolygonIntersection, Ring, Waypoint};

use super::distance::haversine3d;

/// Maximum spacing between resampled points when probing a segment for
/// obstacle intersection (spec §4.1).
pub const LINE_DIVISION_STEP_M: f64 = 50.0;

/// Three-stage containment test: bounding box, altitude band, then ray cast
/// against the outer ring (holes subtract, per spec §4.1).
pub fn point_in_polygon(p: &Waypoint, f: &Feature3D) -> bool {
    if !f.bbox().contains_point(p.lon, p.lat) {
        return false;
    }
    if !p.alt.is_within(&f.min_alt, &f.max_alt) {
        return false;
    }
    if !ray_cast(p.lon, p.lat, &f.exterior.points) {
        return false;
    }
    for hole in &f.holes {
        if ray_cast(p.lon, p.lat, &hole.points) {
            return false;
        }
    }
    true
}

fn ray_cast(lon: f64, lat: f64, ring: &[(f64, f64)]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// True iff any of `obstacles` blocks the segment `a -> b` (spec §4.1).
/// Short-circuits on first hit.
pub fn line_in_polygon(a: &Waypoint, b: &Waypoint, obstacles: &[Feature3D]) -> bool {
    let seg_bbox = segment_bbox(a, b);
    let candidates: Vec<&Feature3D> = obstacles
        .iter()
        .filter(|f| f.bbox().intersects(&seg_bbox))
        .collect();
    if candidates.is_empty() {
        return false;
    }
    let resampled = resample_line_to_interval(a, b, LINE_DIVISION_STEP_M);
    for point in &resampled {
        for f in &candidates {
            if point_in_polygon(point, f) {
                return true;
            }
        }
    }
    false
}

/// True if two polygons' outer rings overlap beyond a shared bounding box,
/// confirmed by either polygon containing a vertex of the other. A cheap
/// stand-in for full polygon intersection, sufficient for the roughly
/// convex obstacle/search-volume shapes this service deals with.
pub fn polygon_overlaps(a: &Feature3D, b: &Feature3D) -> bool {
    if !a.bbox().intersects(&b.bbox()) {
        return false;
    }
    a.exterior
        .points
        .iter()
        .any(|&(lon, lat)| ray_cast(lon, lat, &b.exterior.points))
        || b.exterior
            .points
            .iter()
            .any(|&(lon, lat)| ray_cast(lon, lat, &a.exterior.points))
}

/// Walk `a -> b` resampled at [`LINE_DIVISION_STEP_M`], recording each
/// false→true / true→false crossing of `obstacles` as a
/// [`LinePolygonIntersection`] (spec §4.4.5's `GetIntersectionPoints`).
/// Returns `None` if the first or last resampled point already lies inside
/// an obstacle — the planner only bypasses obstacles strictly between the
/// endpoints.
pub fn intersection_points(
    a: &Waypoint,
    b: &Waypoint,
    obstacles: &[Feature3D],
) -> Option<Vec<LinePolygonIntersection>> {
    let resampled = resample_line_to_interval(a, b, LINE_DIVISION_STEP_M);
    let first_inside = obstacles.iter().any(|o| point_in_polygon(&resampled[0], o));
    let last_inside = obstacles
        .iter()
        .any(|o| point_in_polygon(resampled.last().expect("resample always yields >=2 points"), o));
    if first_inside || last_inside {
        return None;
    }

    let mut out = Vec::new();
    let mut previous_inside = false;
    let mut entering: Option<Waypoint> = None;
    let mut accumulated: std::collections::BTreeSet<usize> = std::collections::BTreeSet::new();

    for (i, point) in resampled.iter().enumerate() {
        let containing: Vec<usize> = obstacles
            .iter()
            .enumerate()
            .filter(|(_, o)| point_in_polygon(point, o))
            .map(|(idx, _)| idx)
            .collect();
        let inside = !containing.is_empty();

        if inside && !previous_inside {
            entering = Some(resampled[i.saturating_sub(1)].clone());
            accumulated.clear();
        }
        if inside {
            accumulated.extend(containing);
        }
        if !inside && previous_inside {
            let polygons = accumulated.iter().map(|&idx| obstacles[idx].clone()).collect();
            out.push(LinePolygonIntersection::new(
                entering.clone().expect("entering is set on every false->true transition"),
                point.clone(),
                polygons,
            ));
            accumulated.clear();
        }
        previous_inside = inside;
    }

    Some(out)
}

fn segment_bbox(a: &Waypoint, b: &Waypoint) -> crate::model::BBox {
    crate::model::BBox {
        min_lon: a.lon.min(b.lon),
        max_lon: a.lon.max(b.lon),
        min_lat: a.lat.min(b.lat),
        max_lat: a.lat.max(b.lat),
    }
}

/// Produce a sequence of waypoints starting at `a` and ending at `b` with
/// consecutive 3D spacing <= `d_m` (spec §4.1). Horizontal interpolation
/// follows the geodesic from `a` toward `b`; altitude is linear.
pub fn resample_line_to_interval(a: &Waypoint, b: &Waypoint, d_m: f64) -> Vec<Waypoint> {
    let total = haversine3d(a, b);
    if total <= d_m || total == 0.0 {
        return vec![a.clone(), b.clone()];
    }

    let n = (total / d_m).floor() as usize;
    let n = n.max(1);
    let delta_alt = (b.alt.normalize() - a.alt.normalize()) / n as f64;
    let horizontal_step = (d_m * d_m - delta_alt * delta_alt).max(0.0).sqrt();

    let geod = Geodesic::wgs84();
    let (_s12, azi1, _azi2): (f64, f64, f64) = geod.inverse(a.lat, a.lon, b.lat, b.lon);

    let mut points = Vec::with_capacity(n + 1);
    points.push(a.clone());
    for i in 1..n {
        let distance = horizontal_step * i as f64;
        let (lat2, lon2, _azi2): (f64, f64, f64) = geod.direct(a.lat, a.lon, azi1, distance);
        let alt = Altitude::meters(a.alt.normalize() + delta_alt * i as f64);
        points.push(
            Waypoint::new(fresh_waypoint_id(), lat2, lon2, alt)
                .expect("geodesic direct solution stays within valid lat/lon range"),
        );
    }
    points.push(b.clone());
    points
}

/// The point on the geodesic from `a` toward `b` at 3D distance `d_m`.
pub fn steer(a: &Waypoint, b: &Waypoint, d_m: f64) -> Waypoint {
    let resampled = resample_line_to_interval(a, b, d_m);
    resampled
        .into_iter()
        .nth(1)
        .expect("resample_line_to_interval always yields at least [a, b]")
}

/// Boolean union of several 2D polygons. The output altitude band is
/// `[min of mins, max of maxes]` across inputs.
pub fn polygon_union(features: &[Feature3D]) -> Vec<Feature3D> {
    if features.is_empty() {
        return Vec::new();
    }
    if features.len() == 1 {
        return vec![features[0].clone()];
    }

    let mut acc: MultiPolygon<f64> = MultiPolygon::new(vec![to_geo_polygon(&features[0])]);
    for f in &features[1..] {
        let next = MultiPolygon::new(vec![to_geo_polygon(f)]);
        acc = acc.union(&next);
    }

    let min_alt = features
        .iter()
        .fold(AltitudeBound::Unbounded, |acc, f| {
            if matches!(acc, AltitudeBound::Unbounded) {
                f.min_alt
            } else {
                AltitudeBound::min_of(acc, f.min_alt)
            }
        });
    let max_alt = features
        .iter()
        .fold(AltitudeBound::Unbounded, |acc, f| {
            if matches!(acc, AltitudeBound::Unbounded) {
                f.max_alt
            } else {
                AltitudeBound::max_of(acc, f.max_alt)
            }
        });

    acc.0
        .into_iter()
        .map(|poly| from_geo_polygon(poly, min_alt, max_alt))
        .collect()
}

fn to_geo_polygon(f: &Feature3D) -> GeoPolygon<f64> {
    let exterior = LineString::new(
        f.exterior
            .points
            .iter()
            .map(|&(lon, lat)| Coord { x: lon, y: lat })
            .collect(),
    );
    let holes = f
        .holes
        .iter()
        .map(|ring| {
            LineString::new(
                ring.points
                    .iter()
                    .map(|&(lon, lat)| Coord { x: lon, y: lat })
                    .collect(),
            )
        })
        .collect();
    GeoPolygon::new(exterior, holes)
}

fn from_geo_polygon(poly: GeoPolygon<f64>, min_alt: AltitudeBound, max_alt: AltitudeBound) -> Feature3D {
    let (exterior, interiors) = poly.into_inner();
    let exterior = Ring::new(exterior.0.into_iter().map(|c| (c.x, c.y)).collect());
    let holes = interiors
        .into_iter()
        .map(|ls| Ring::new(ls.0.into_iter().map(|c| (c.x, c.y)).collect()))
        .collect();
    Feature3D::new(exterior, holes, min_alt, max_alt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AltitudeUnit;

    fn wp(id: u64, lat: f64, lon: f64, alt_m: f64) -> Waypoint {
        Waypoint::new(id, lat, lon, Altitude::new(alt_m, AltitudeUnit::Meters)).unwrap()
    }

    fn square() -> Feature3D {
        Feature3D::new(
            Ring::new(vec![
                (4.435823, 50.879178),
                (4.435999, 50.876187),
                (4.443605, 50.878195),
                (4.439679, 50.884467),
                (4.435823, 50.879178),
            ]),
            vec![],
            AltitudeBound::Bounded(Altitude::meters(0.0)),
            AltitudeBound::Bounded(Altitude::meters(999_999.0)),
        )
    }

    #[test]
    fn center_of_square_is_inside() {
        let f = square();
        let center = wp(0, 50.879, 4.439, 100.0);
        assert!(point_in_polygon(&center, &f));
    }

    #[test]
    fn far_away_point_is_outside() {
        let f = square();
        let far = wp(0, 10.0, 10.0, 100.0);
        assert!(!point_in_polygon(&far, &f));
    }

    #[test]
    fn altitude_outside_band_is_excluded() {
        let f = Feature3D::new(
            square().exterior,
            vec![],
            AltitudeBound::Bounded(Altitude::meters(0.0)),
            AltitudeBound::Bounded(Altitude::meters(50.0)),
        );
        let high = wp(0, 50.879, 4.439, 100.0);
        assert!(!point_in_polygon(&high, &f));
    }

    #[test]
    fn resample_endpoints_match_and_spacing_is_bounded() {
        let a = wp(0, 50.8727, 4.4337, 100.0);
        let b = wp(1, 50.8844, 4.4699, 100.0);
        let points = resample_line_to_interval(&a, &b, 500.0);
        assert_eq!(points.first().unwrap().lat, a.lat);
        assert_eq!(points.last().unwrap().lat, b.lat);
        for pair in points.windows(2) {
            assert!(haversine3d(&pair[0], &pair[1]) <= 500.0 + 1.0);
        }
    }

    #[test]
    fn short_segment_resamples_to_endpoints_only() {
        let a = wp(0, 50.0, 4.0, 100.0);
        let b = wp(1, 50.0001, 4.0, 100.0);
        let points = resample_line_to_interval(&a, &b, 500.0);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn union_of_singleton_is_itself() {
        let f = square();
        let result = polygon_union(std::slice::from_ref(&f));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].exterior.points.len(), f.exterior.points.len());
    }

    #[test]
    fn line_through_square_is_blocked() {
        let f = square();
        let a = wp(0, 50.8727, 4.4337, 100.0);
        let b = wp(1, 50.8844, 4.4699, 100.0);
        assert!(line_in_polygon(&a, &b, &[f]));
    }

    #[test]
    fn bbox_overlap_without_vertex_containment_is_not_a_polygon_overlap() {
        // Two squares whose bounding boxes intersect in a thin sliver but
        // whose rings never actually cross.
        let a = Feature3D::new(
            Ring::new(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]),
            vec![],
            AltitudeBound::Unbounded,
            AltitudeBound::Unbounded,
        );
        let b = Feature3D::new(
            Ring::new(vec![(0.99, 2.0), (0.99, 3.0), (2.0, 3.0), (2.0, 2.0), (0.99, 2.0)]),
            vec![],
            AltitudeBound::Unbounded,
            AltitudeBound::Unbounded,
        );
        assert!(!a.bbox().intersects(&b.bbox()));
        assert!(!polygon_overlaps(&a, &b));
    }

    #[test]
    fn polygon_overlaps_when_a_vertex_lies_inside_the_other() {
        let outer = square();
        let inner = Feature3D::new(
            Ring::new(vec![
                (4.438, 50.879),
                (4.438, 50.880),
                (4.440, 50.880),
                (4.440, 50.879),
                (4.438, 50.879),
            ]),
            vec![],
            AltitudeBound::Unbounded,
            AltitudeBound::Unbounded,
        );
        assert!(polygon_overlaps(&outer, &inner));
    }

    #[test]
    fn intersection_points_finds_single_crossing() {
        let f = square();
        let a = wp(0, 50.8727, 4.4337, 100.0);
        let b = wp(1, 50.8844, 4.4699, 100.0);
        let ips = intersection_points(&a, &b, &[f]).expect("endpoints are outside the obstacle");
        assert_eq!(ips.len(), 1);
        assert_eq!(ips[0].polygons.len(), 1);
    }

    #[test]
    fn intersection_points_none_when_endpoint_inside_obstacle() {
        let f = square();
        let inside = wp(0, 50.879, 4.439, 100.0);
        let outside = wp(1, 50.9, 4.5, 100.0);
        assert!(intersection_points(&inside, &outside, &[f]).is_none());
    }
}
