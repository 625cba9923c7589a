//! Domain data model: waypoints, altitudes, obstacles, and the request/response shapes.

mod altitude;
mod feature;
mod intersection;
mod request;
mod response;
mod waypoint;

pub use altitude::{Altitude, AltitudeBound, AltitudeUnit};
pub use feature::{BBox, Feature3D, Ring};
pub use intersection::{LinePolygonIntersection, PointDist};
pub use request::{AlgorithmType, PlannerParameters, RoutingRequest, SamplerType, StorageType};
pub use response::RoutingResponse;
pub use waypoint::{fresh_waypoint_id, Waypoint};
