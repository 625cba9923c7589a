//! routing-core - pure logic for 3D geospatial path planning
//!
//! Samplers, spatial index, waypoint tree, planners (RRT / RRT* / AntPath),
//! validator, and request/response orchestration, with NO networking or
//! serialization concerns.

pub mod error;
pub mod geometry;
pub mod model;
pub mod planner;
pub mod sampler;
pub mod service;
pub mod storage;
pub mod validator;

pub use error::PlanningError;
pub use model::{
    fresh_waypoint_id, Altitude, AltitudeBound, AltitudeUnit, AlgorithmType, Feature3D,
    LinePolygonIntersection, PointDist, PlannerParameters, RoutingRequest, RoutingResponse,
    SamplerType, StorageType, Waypoint,
};
pub use service::handle_routing_request;
