//! Planners (RRT, RRT*, AntPath) and the multi-segment driver that runs one
//! of them across each consecutive pair of requested waypoints (spec §4.4).

mod antpath;
mod rrt;
mod rrt_star;

pub use antpath::AntPathPlanner;
pub use rrt::RrtPlanner;
pub use rrt_star::RrtStarPlanner;

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use crate::error::PlanningError;
use crate::model::{AlgorithmType, Feature3D, PlannerParameters, Waypoint};
use crate::storage::{new_storage, Storage};

/// A planner finds a feasible, obstacle-avoiding path between two waypoints
/// within a bounded search volume, consulting `storage` for obstacle
/// queries and (for the sampling-based planners) the waypoint tree.
pub trait Planner: Send + Sync {
    fn plan_segment(
        &self,
        storage: &mut dyn Storage,
        start: &Waypoint,
        goal: &Waypoint,
        search_volume: &Feature3D,
        params: &PlannerParameters,
    ) -> Result<Vec<Waypoint>, PlanningError>;
}

pub fn new_planner(algorithm: AlgorithmType) -> Box<dyn Planner> {
    match algorithm {
        AlgorithmType::Rrt => Box::new(RrtPlanner),
        AlgorithmType::Rrtstar => Box::new(RrtStarPlanner),
        AlgorithmType::Antpath => Box::new(AntPathPlanner),
    }
}

/// Concatenate a newly-planned `segment` onto `route`, skipping the first
/// element for every segment after the first since it duplicates the
/// previous segment's last waypoint (spec §4.4.1).
fn append_segment(route: &mut Vec<Waypoint>, segment: Vec<Waypoint>) {
    if route.is_empty() {
        route.extend(segment);
    } else {
        route.extend(segment.into_iter().skip(1));
    }
}

/// Plan each consecutive pair of `waypoints` in turn on the calling thread,
/// concatenating the resulting route (spec §4.4.1). Constraints are
/// inserted into storage once and reused across every segment; the
/// storage is cleared after the last segment completes.
pub fn compute(
    planner: &dyn Planner,
    waypoints: &[Waypoint],
    obstacles: &[Feature3D],
    search_volume: &Feature3D,
    params: &PlannerParameters,
) -> Result<Vec<Waypoint>, PlanningError> {
    if waypoints.len() < 2 {
        return Err(PlanningError::invalid_input(
            "at least two waypoints are required to plan a route",
        ));
    }

    let mut storage = new_storage(params.storage);
    storage.add_constraints(obstacles);

    let mut route = Vec::new();
    for (idx, pair) in waypoints.windows(2).enumerate() {
        let segment = planner
            .plan_segment(storage.as_mut(), &pair[0], &pair[1], search_volume, params)
            .map_err(|e| PlanningError::SegmentFailure {
                segment_index: idx,
                source: Box::new(e),
            })?;
        append_segment(&mut route, segment);
    }
    storage.clear();
    Ok(route)
}

/// Effective worker count for a request with `pairs` segments: the
/// requested count (0 meaning "auto", i.e. the CPU count), clamped to
/// `[1, min(#cpu, #pairs)]` (spec §4.4.2/§5).
fn worker_count(requested: usize, pairs: usize) -> usize {
    let cpu = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let requested = if requested == 0 { cpu } else { requested };
    requested.clamp(1, cpu.min(pairs).max(1))
}

/// Same as [`compute`], but segments are drained by a bounded pool of `W`
/// worker threads from a job queue of size `P = #pairs`, each worker
/// operating on its own deep clone of `storage` for isolation (spec
/// §4.4.2/§5). Falls back to [`compute`] when `W` resolves to 1.
pub fn compute_concurrently(
    planner: &dyn Planner,
    waypoints: &[Waypoint],
    obstacles: &[Feature3D],
    search_volume: &Feature3D,
    params: &PlannerParameters,
) -> Result<Vec<Waypoint>, PlanningError> {
    if waypoints.len() < 2 {
        return Err(PlanningError::invalid_input(
            "at least two waypoints are required to plan a route",
        ));
    }

    let pairs: Vec<(Waypoint, Waypoint)> = waypoints
        .windows(2)
        .map(|p| (p[0].clone(), p[1].clone()))
        .collect();

    let workers = worker_count(params.max_workers, pairs.len());
    if workers <= 1 {
        return compute(planner, waypoints, obstacles, search_volume, params);
    }

    let mut base_storage = new_storage(params.storage);
    base_storage.add_constraints(obstacles);

    let (job_tx, job_rx) = mpsc::sync_channel::<(usize, Waypoint, Waypoint)>(pairs.len());
    for (idx, (start, goal)) in pairs.iter().cloned().enumerate() {
        job_tx
            .send((idx, start, goal))
            .expect("job queue is sized to exactly the number of segments");
    }
    drop(job_tx);
    let job_rx = Mutex::new(job_rx);

    let (result_tx, result_rx) = mpsc::sync_channel::<(usize, Result<Vec<Waypoint>, PlanningError>)>(pairs.len());

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = &job_rx;
            let result_tx = result_tx.clone();
            let mut worker_storage = base_storage.box_clone();
            scope.spawn(move || loop {
                let job = job_rx.lock().expect("job queue mutex is never poisoned").recv();
                let Ok((idx, start, goal)) = job else {
                    break;
                };
                let out = planner.plan_segment(worker_storage.as_mut(), &start, &goal, search_volume, params);
                if result_tx.send((idx, out)).is_err() {
                    break;
                }
            });
        }
        drop(result_tx);
    });

    let mut results: Vec<Option<Result<Vec<Waypoint>, PlanningError>>> = (0..pairs.len()).map(|_| None).collect();
    for (idx, out) in result_rx {
        results[idx] = Some(out);
    }

    let mut route = Vec::new();
    for (idx, result) in results.into_iter().enumerate() {
        let segment = result
            .unwrap_or_else(|| Err(PlanningError::internal("segment worker did not report a result")))
            .map_err(|e| PlanningError::SegmentFailure {
                segment_index: idx,
                source: Box::new(e),
            })?;
        append_segment(&mut route, segment);
    }
    Ok(route)
}
