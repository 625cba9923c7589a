//! Errors at the process boundary: decoding, Kafka I/O, and config problems.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to decode request payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("message had no payload")]
    EmptyPayload,

    #[error("invalid waypoint in request: {0}")]
    InvalidWaypoint(#[from] routing_core::PlanningError),
}
