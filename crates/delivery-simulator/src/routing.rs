//! Route lookup for path-following legs.
//!
//! Graph search lives outside this crate. Whatever owns the map graph plugs
//! in through [`Router`]; the simulator only consumes waypoint lists.

use delivery_domain::{SearchStrategy, Vector3};

/// Produces the waypoints between two points.
pub trait Router: Send + Sync {
    /// Waypoints from `from` to `to`, ending at `to`. An empty list means no
    /// route was found.
    fn route(&self, from: Vector3, to: Vector3, search: SearchStrategy) -> Vec<Vector3>;
}

/// Router with no graph: every route is the straight segment to the goal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineRouter;

impl Router for StraightLineRouter {
    fn route(&self, from: Vector3, to: Vector3, _search: SearchStrategy) -> Vec<Vector3> {
        vec![from, to]
    }
}

/// Router that climbs to a cruise altitude, crosses, then descends.
#[derive(Debug, Clone, Copy)]
pub struct CruiseRouter {
    pub cruise_altitude: f64,
}

impl Router for CruiseRouter {
    fn route(&self, from: Vector3, to: Vector3, _search: SearchStrategy) -> Vec<Vector3> {
        vec![
            from.with_y(self.cruise_altitude),
            to.with_y(self.cruise_altitude),
            to,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line_route_ends_at_goal() {
        let goal = Vector3::new(5.0, 0.0, 5.0);
        let route = StraightLineRouter.route(Vector3::ZERO, goal, SearchStrategy::Astar);
        assert_eq!(route.last(), Some(&goal));
    }

    #[test]
    fn test_cruise_route_climbs_first() {
        let router = CruiseRouter { cruise_altitude: 400.0 };
        let route = router.route(Vector3::ZERO, Vector3::new(10.0, 0.0, 0.0), SearchStrategy::Bfs);
        assert_eq!(route.len(), 3);
        assert_eq!(route[0].y, 400.0);
        assert_eq!(route[2], Vector3::new(10.0, 0.0, 0.0));
    }
}
