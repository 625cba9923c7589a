//! Error kinds produced by the planning engine.

use thiserror::Error;

use crate::model::Waypoint;

/// Errors raised while validating input or running a planner.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("goal not found after {iterations} iterations")]
    GoalNotFound { iterations: usize },

    #[error("segment {segment_index} failed: {source}")]
    SegmentFailure {
        segment_index: usize,
        #[source]
        source: Box<PlanningError>,
    },

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PlanningError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Partial planning result: the route computed so far, its cost, and the
/// error that interrupted further progress (if any).
#[derive(Debug)]
pub struct PartialRoute {
    pub route: Vec<Waypoint>,
    pub cost_m: f64,
    pub error: PlanningError,
}
