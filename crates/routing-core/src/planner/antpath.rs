//! AntPath planner: deterministic obstacle circumvention by walking the
//! ordered crossings of the original start->end line, with no sampling
//! involved (spec §4.4.5).

use crate::error::PlanningError;
use crate::geometry::{polygon_union, vertex_tour_around};
use crate::model::{Feature3D, PlannerParameters, Waypoint};
use crate::storage::Storage;

use super::Planner;

pub struct AntPathPlanner;

impl Planner for AntPathPlanner {
    fn plan_segment(
        &self,
        storage: &mut dyn Storage,
        start: &Waypoint,
        goal: &Waypoint,
        _search_volume: &Feature3D,
        _params: &PlannerParameters,
    ) -> Result<Vec<Waypoint>, PlanningError> {
        let Some(crossings) = storage.get_intersection_points(start, goal) else {
            return Err(PlanningError::invalid_input(
                "start or goal lies inside an obstacle",
            ));
        };

        let mut route = vec![start.clone()];
        for crossing in &crossings {
            let obstacle = if crossing.polygons.len() > 1 {
                polygon_union(&crossing.polygons)
                    .into_iter()
                    .next()
                    .expect("a non-empty polygon list produces a non-empty union")
            } else {
                crossing.polygons[0].clone()
            };
            let tour = vertex_tour_around(&obstacle, &crossing.entering_point, &crossing.exiting_point);
            route.extend(tour);
        }
        route.push(goal.clone());
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::line_in_polygon;
    use crate::model::{fresh_waypoint_id, Altitude, AltitudeBound, PlannerParameters, Ring, StorageType};
    use crate::storage::new_storage;

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

    fn search_volume() -> Feature3D {
        Feature3D::new(
            Ring::new(vec![
                (4.0, 50.0),
                (5.0, 50.0),
                (5.0, 51.0),
                (4.0, 51.0),
                (4.0, 50.0),
            ]),
            vec![],
            AltitudeBound::Unbounded,
            AltitudeBound::Unbounded,
        )
    }

    #[test]
    fn direct_path_with_no_obstacles() {
        let start = wp(50.875, 4.436);
        let goal = wp(50.885, 4.442);
        let params = PlannerParameters::default();
        let mut storage = new_storage(StorageType::List);
        let route = AntPathPlanner
            .plan_segment(storage.as_mut(), &start, &goal, &search_volume(), &params)
            .unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].id, start.id);
        assert_eq!(route[1].id, goal.id);
    }

    #[test]
    fn routes_around_blocking_square() {
        let start = wp(50.875, 4.436);
        let goal = wp(50.885, 4.442);
        let obstacle = square();
        let params = PlannerParameters::default();
        let mut storage = new_storage(StorageType::List);
        storage.add_constraint(obstacle.clone());
        let route = AntPathPlanner
            .plan_segment(storage.as_mut(), &start, &goal, &search_volume(), &params)
            .unwrap();
        assert_eq!(route.first().unwrap().id, start.id);
        assert_eq!(route.last().unwrap().id, goal.id);
        assert!(route.len() > 2);
        for pair in route.windows(2) {
            assert!(!line_in_polygon(&pair[0], &pair[1], std::slice::from_ref(&obstacle)));
        }
    }
}
