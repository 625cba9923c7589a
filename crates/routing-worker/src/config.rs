//! Worker configuration from environment.

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub kafka_bootstrap_servers: String,
    pub kafka_consumer_group: String,
    pub kafka_input_topic: String,
    pub kafka_output_topic: String,
    pub max_in_flight_requests: usize,
    pub geojson_debug_dir: Option<String>,
}

impl Config {
    /// Reads configuration from the environment, failing fast on missing
    /// required Kafka settings rather than falling back to a value that
    /// would silently point at nothing (spec §6).
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            kafka_bootstrap_servers: require_env("KAFKA_BOOTSTRAP_SERVERS")?,
            kafka_consumer_group: require_env("KAFKA_CONSUMER_GROUP")?,
            kafka_input_topic: require_env("KAFKA_INPUT_TOPIC")?,
            kafka_output_topic: require_env("KAFKA_OUTPUT_TOPIC")?,
            max_in_flight_requests: env::var("ROUTING_MAX_IN_FLIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8),
            geojson_debug_dir: env::var("ROUTING_GEOJSON_DEBUG_DIR").ok(),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}
