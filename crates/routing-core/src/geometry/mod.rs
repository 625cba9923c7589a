//! Geometric primitives: distance, polygon containment/blocking, resampling,
//! steering, polygon union, and vertex tours.

mod distance;
mod polygon;
mod tour;

pub use distance::{fast_distance3d, geodesic_azimuth_deg, geodesic_distance_m, haversine3d, total_haversine_distance};
pub use polygon::{
    intersection_points, line_in_polygon, point_in_polygon, polygon_overlaps, polygon_union,
    resample_line_to_interval, steer, LINE_DIVISION_STEP_M,
};
pub use tour::vertex_tour_around;
