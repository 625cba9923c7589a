//! Vertex tours for circumventing an obstacle's outer ring.

use crate::model::{fresh_waypoint_id, Altitude, Feature3D, Waypoint};

use super::distance::total_haversine_distance;
use super::polygon::line_in_polygon;

/// Return the sequence of `f`'s outer-ring vertices traversed to go around
/// `f` from `entering` to `exiting` (spec §4.1): the shorter of the
/// forward-ring and reverse-ring tours, each prefixed/suffixed by the
/// nearest-visible ring vertex to `entering`/`exiting`.
pub fn vertex_tour_around(f: &Feature3D, entering: &Waypoint, exiting: &Waypoint) -> Vec<Waypoint> {
    let mut ring_points = f.exterior.points.clone();
    if ring_points.len() > 1 && ring_points.first() == ring_points.last() {
        ring_points.pop();
    }
    let n = ring_points.len();
    if n == 0 {
        return vec![entering.clone(), exiting.clone()];
    }

    let ring_waypoints: Vec<Waypoint> = ring_points
        .iter()
        .map(|&(lon, lat)| {
            Waypoint::new(fresh_waypoint_id(), lat, lon, mid_altitude(f))
                .expect("obstacle ring vertices carry valid coordinates")
        })
        .collect();

    let entry_idx = nearest_visible_vertex(&ring_waypoints, entering, f);
    let exit_idx = nearest_visible_vertex(&ring_waypoints, exiting, f);

    let forward = build_tour(&ring_waypoints, entry_idx, exit_idx, true);
    let reverse = build_tour(&ring_waypoints, entry_idx, exit_idx, false);

    let mut forward_route = vec![entering.clone()];
    forward_route.extend(forward);
    forward_route.push(exiting.clone());

    let mut reverse_route = vec![entering.clone()];
    reverse_route.extend(reverse);
    reverse_route.push(exiting.clone());

    if total_haversine_distance(&reverse_route) < total_haversine_distance(&forward_route) {
        reverse_route
    } else {
        forward_route
    }
}

fn mid_altitude(f: &Feature3D) -> Altitude {
    let min = f.min_alt.normalize_min();
    let max = f.max_alt.normalize_max();
    if min.is_finite() && max.is_finite() {
        Altitude::meters((min + max) / 2.0)
    } else if min.is_finite() {
        Altitude::meters(min)
    } else if max.is_finite() {
        Altitude::meters(max)
    } else {
        Altitude::meters(0.0)
    }
}

/// The nearest ring vertex with an unobstructed line of sight from `from`.
fn nearest_visible_vertex(ring: &[Waypoint], from: &Waypoint, f: &Feature3D) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, vertex) in ring.iter().enumerate() {
        if line_in_polygon(from, vertex, std::slice::from_ref(f)) {
            continue;
        }
        let d = super::distance::haversine3d(from, vertex);
        if d < best_dist {
            best_dist = d;
            best_idx = idx;
        }
    }
    // If every vertex is blocked (degenerate geometry), fall back to the
    // closest vertex regardless of visibility so the tour is still defined.
    if best_dist.is_infinite() {
        ring.iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                super::distance::haversine3d(from, a).total_cmp(&super::distance::haversine3d(from, b))
            })
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    } else {
        best_idx
    }
}

/// The inclusive slice of `ring` from `entry_idx` to `exit_idx`, wrapping if
/// `entry_idx > exit_idx`, in forward or reverse traversal order.
fn build_tour(ring: &[Waypoint], entry_idx: usize, exit_idx: usize, forward: bool) -> Vec<Waypoint> {
    let n = ring.len();
    let mut result = Vec::new();
    if forward {
        let mut i = entry_idx;
        loop {
            result.push(ring[i].clone());
            if i == exit_idx {
                break;
            }
            i = (i + 1) % n;
        }
    } else {
        let mut i = entry_idx;
        loop {
            result.push(ring[i].clone());
            if i == exit_idx {
                break;
            }
            i = (i + n - 1) % n;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AltitudeBound, Ring};

    fn wp(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(fresh_waypoint_id(), lat, lon, Altitude::meters(100.0)).unwrap()
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
    fn tour_includes_endpoints() {
        let f = square();
        let entering = wp(50.875, 4.436);
        let exiting = wp(50.885, 4.442);
        let tour = vertex_tour_around(&f, &entering, &exiting);
        assert_eq!(tour.first().unwrap().lat, entering.lat);
        assert_eq!(tour.last().unwrap().lat, exiting.lat);
        assert!(tour.len() >= 2);
    }
}
