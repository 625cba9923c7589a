//! RoutingRequest and its parameter enums.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::feature::Feature3D;
use super::waypoint::Waypoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmType {
    Rrt,
    #[default]
    Rrtstar,
    Antpath,
}

impl AlgorithmType {
    /// Falls back to the documented default on an unrecognised wire value,
    /// per spec §3: "invalid enum values fall back to documented defaults".
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("rrt") => AlgorithmType::Rrt,
            Some("rrtstar") => AlgorithmType::Rrtstar,
            Some("antpath") => AlgorithmType::Antpath,
            _ => AlgorithmType::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    List,
    #[default]
    Rtree,
}

impl StorageType {
    /// `memory` is accepted on the wire as a synonym for `list` (spec §6);
    /// there is no third, Redis-backed storage type.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("list") | Some("memory") => StorageType::List,
            Some("rtree") => StorageType::Rtree,
            _ => StorageType::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SamplerType {
    #[default]
    Uniform,
    Halton,
}

impl SamplerType {
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("uniform") => SamplerType::Uniform,
            Some("halton") => SamplerType::Halton,
            _ => SamplerType::default(),
        }
    }
}

/// Planner tuning parameters, all with documented defaults (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct PlannerParameters {
    pub algorithm: AlgorithmType,
    pub storage: StorageType,
    pub sampler_type: SamplerType,
    pub seed: u64,
    pub max_iterations: usize,
    pub step_size_m: f64,
    pub goal_bias: f64,
    pub max_workers: usize,
}

impl Default for PlannerParameters {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmType::default(),
            storage: StorageType::default(),
            sampler_type: SamplerType::default(),
            seed: 945,
            max_iterations: 100_000,
            step_size_m: 20.0,
            goal_bias: 0.10,
            max_workers: 0,
        }
    }
}

impl PlannerParameters {
    /// Read from a loosely-typed `parameters` map (spec §3/§6): unknown keys
    /// are ignored, invalid values fall back to the default for that key.
    pub fn from_map(parameters: &HashMap<String, serde_json::Value>) -> Self {
        let defaults = Self::default();
        let get_str = |key: &str| parameters.get(key).and_then(|v| v.as_str());
        let get_f64 = |key: &str, default: f64| {
            parameters
                .get(key)
                .and_then(|v| v.as_f64())
                .unwrap_or(default)
        };
        let get_usize = |key: &str, default: usize| {
            parameters
                .get(key)
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .unwrap_or(default)
        };

        Self {
            algorithm: AlgorithmType::from_wire(get_str("algorithm")),
            storage: StorageType::from_wire(get_str("storage")),
            sampler_type: SamplerType::from_wire(get_str("sampler_type")),
            seed: get_usize("seed", defaults.seed as usize) as u64,
            max_iterations: get_usize("max_iterations", defaults.max_iterations),
            step_size_m: get_f64("step_size_mt", defaults.step_size_m),
            goal_bias: get_f64("goal_bias", defaults.goal_bias),
            max_workers: get_usize("max_workers", defaults.max_workers),
        }
    }
}

/// An inbound routing request, already decoded from the wire.
#[derive(Debug, Clone)]
pub struct RoutingRequest {
    pub request_id: String,
    pub waypoints: Vec<Waypoint>,
    pub constraints: Vec<Feature3D>,
    pub search_volume: Feature3D,
    pub parameters: HashMap<String, serde_json::Value>,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

impl RoutingRequest {
    pub fn planner_parameters(&self) -> PlannerParameters {
        PlannerParameters::from_map(&self.parameters)
    }
}
