//! Rapidly-exploring Random Tree planner (spec §4.4.3).

use crate::error::PlanningError;
use crate::geometry::{haversine3d, steer};
use crate::model::{Feature3D, PlannerParameters, Waypoint};
use crate::sampler::{new_sampler, GoalBiasSampler};
use crate::storage::Storage;

use super::Planner;

pub struct RrtPlanner;

impl Planner for RrtPlanner {
    fn plan_segment(
        &self,
        storage: &mut dyn Storage,
        start: &Waypoint,
        goal: &Waypoint,
        search_volume: &Feature3D,
        params: &PlannerParameters,
    ) -> Result<Vec<Waypoint>, PlanningError> {
        storage.clear_waypoints();
        storage.add_root(start.clone());

        // Direct shot: if start already sees the goal, no search is needed,
        // regardless of how far apart they are (spec §4.4.3).
        if !storage.is_line_in_obstacles(start, goal) {
            storage.add_waypoint_with_previous(goal.clone(), start.id);
            return Ok(storage.path_to_root(goal.id));
        }

        let base = new_sampler(params.sampler_type, params.seed);
        let mut sampler = GoalBiasSampler::new(base, goal.clone(), params.goal_bias, params.seed);

        for _ in 0..params.max_iterations {
            let Some(sample) = storage.sample_free(sampler.as_mut(), search_volume) else {
                continue;
            };
            let Some(nearest) = storage.nearest(&sample) else {
                continue;
            };
            let new_point = steer(&nearest, &sample, params.step_size_m);
            if storage.is_line_in_obstacles(&nearest, &new_point) {
                continue;
            }
            if !crate::geometry::point_in_polygon(&new_point, search_volume) {
                continue;
            }
            storage.add_waypoint_with_previous(new_point.clone(), nearest.id);

            if haversine3d(&new_point, goal) < params.step_size_m && !storage.is_line_in_obstacles(&new_point, goal) {
                storage.add_waypoint_with_previous(goal.clone(), new_point.id);
                return Ok(storage.path_to_root(goal.id));
            }
        }

        Err(PlanningError::GoalNotFound {
            iterations: params.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{fresh_waypoint_id, Altitude, AltitudeBound, Ring, StorageType};
    use crate::storage::new_storage;

    fn open_volume() -> Feature3D {
        Feature3D::new(
            Ring::new(vec![
                (4.0, 50.0),
                (5.0, 50.0),
                (5.0, 51.0),
                (4.0, 51.0),
                (4.0, 50.0),
            ]),
            vec![],
            AltitudeBound::Bounded(Altitude::meters(0.0)),
            AltitudeBound::Bounded(Altitude::meters(500.0)),
        )
    }

    #[test]
    fn finds_direct_path_with_no_obstacles() {
        let start = Waypoint::new(fresh_waypoint_id(), 50.1, 4.1, Altitude::meters(100.0)).unwrap();
        let goal = Waypoint::new(fresh_waypoint_id(), 50.2, 4.2, Altitude::meters(100.0)).unwrap();
        let volume = open_volume();
        let mut params = PlannerParameters::default();
        params.storage = StorageType::List;
        params.max_iterations = 2000;
        let mut storage = new_storage(params.storage);

        let planner = RrtPlanner;
        let route = planner
            .plan_segment(storage.as_mut(), &start, &goal, &volume, &params)
            .expect("planner should find a path with no obstacles");
        assert_eq!(route.first().unwrap().id, start.id);
        assert_eq!(route.last().unwrap().id, goal.id);
    }

    #[test]
    fn fast_path_is_taken_regardless_of_distance() {
        // ~13km apart, far past any reasonable step_size_m, but nothing
        // blocks a straight line between them: the fast path must still
        // fire unconditionally (spec §4.4.3).
        let start = Waypoint::new(fresh_waypoint_id(), 50.0, 4.0, Altitude::meters(100.0)).unwrap();
        let goal = Waypoint::new(fresh_waypoint_id(), 50.1, 4.1, Altitude::meters(100.0)).unwrap();
        let volume = Feature3D::new(
            Ring::new(vec![
                (3.0, 49.0),
                (6.0, 49.0),
                (6.0, 52.0),
                (3.0, 52.0),
                (3.0, 49.0),
            ]),
            vec![],
            AltitudeBound::Bounded(Altitude::meters(0.0)),
            AltitudeBound::Bounded(Altitude::meters(500.0)),
        );
        let mut params = PlannerParameters::default();
        params.storage = StorageType::List;
        params.step_size_m = 50.0;
        params.max_iterations = 1;
        let mut storage = new_storage(params.storage);

        let planner = RrtPlanner;
        let route = planner
            .plan_segment(storage.as_mut(), &start, &goal, &volume, &params)
            .expect("fast path should succeed with a single direct hop");
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].id, start.id);
        assert_eq!(route[1].id, goal.id);
    }
}
