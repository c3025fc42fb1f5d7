//! # Strategy Module
//!
//! Enum-dispatched movement strategies. A strategy owns everything it needs
//! to steer one entity toward a goal; dropping it aborts the trip and leaves
//! the entity wherever it last was.
//!
//! ## Available Strategies
//!
//! - `Beeline` - Straight line to a fixed target
//! - `Path` - Follow an ordered list of waypoints produced by a router
//! - `Celebration` - Run an inner strategy, then jump or spin for a while

pub mod beeline;
pub mod celebration;
pub mod path;

pub use beeline::BeelineStrategy;
pub use celebration::{Celebration, CelebrationStrategy};
pub use path::PathStrategy;

use delivery_domain::{SearchStrategy, Vector3};

use crate::entity::EntityCore;
use crate::routing::Router;

/// Distance under which a target or waypoint counts as reached
pub const ARRIVAL_EPSILON: f64 = 4.0;

/// Movement strategy enum - determines how an entity closes on its goal.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Straight line toward a fixed point
    Beeline(BeelineStrategy),
    /// Waypoint chain
    Path(PathStrategy),
    /// Inner strategy followed by a timed celebration
    Celebration(CelebrationStrategy),
}

impl Strategy {
    #[must_use]
    pub const fn beeline(from: Vector3, to: Vector3) -> Self {
        Self::Beeline(BeelineStrategy::new(from, to))
    }

    #[must_use]
    pub fn path(waypoints: Vec<Vector3>) -> Self {
        Self::Path(PathStrategy::new(waypoints))
    }

    /// Final-leg strategy for a delivery searched with `search`.
    ///
    /// Graph searches route through `router` and get a celebration on
    /// arrival; a beeline goes straight there.
    #[must_use]
    pub fn for_search(router: &dyn Router, from: Vector3, to: Vector3, search: SearchStrategy) -> Self {
        let path = || Self::path(router.route(from, to, search));
        match search {
            SearchStrategy::Beeline => Self::beeline(from, to),
            SearchStrategy::Astar => CelebrationStrategy::wrap(path(), Celebration::Jump),
            SearchStrategy::Dfs => CelebrationStrategy::wrap(
                CelebrationStrategy::wrap(path(), Celebration::Jump),
                Celebration::Spin,
            ),
            SearchStrategy::Bfs => CelebrationStrategy::wrap(path(), Celebration::Spin),
            SearchStrategy::Dijkstra => CelebrationStrategy::wrap(
                CelebrationStrategy::wrap(path(), Celebration::Spin),
                Celebration::Jump,
            ),
        }
    }

    /// Advance `entity` one tick.
    pub fn advance(&mut self, entity: &mut EntityCore, dt: f64) {
        match self {
            Self::Beeline(s) => s.advance(entity, dt),
            Self::Path(s) => s.advance(entity, dt),
            Self::Celebration(s) => s.advance(entity, dt),
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        match self {
            Self::Beeline(s) => s.is_completed(),
            Self::Path(s) => s.is_completed(),
            Self::Celebration(s) => s.is_completed(),
        }
    }

    /// Distance still to cover from `from`, following whatever is left of
    /// this strategy.
    #[must_use]
    pub fn current_path_distance(&self, from: Vector3) -> f64 {
        match self {
            Self::Beeline(s) => s.current_path_distance(from),
            Self::Path(s) => s.current_path_distance(from),
            Self::Celebration(s) => s.current_path_distance(from),
        }
    }

    /// Distance of the whole strategy from `from`, ignoring progress.
    #[must_use]
    pub fn total_path_distance(&self, from: Vector3) -> f64 {
        match self {
            Self::Beeline(s) => s.total_path_distance(from),
            Self::Path(s) => s.total_path_distance(from),
            Self::Celebration(s) => s.total_path_distance(from),
        }
    }

    /// Where the strategy ends up, if it knows.
    #[must_use]
    pub fn destination(&self) -> Option<Vector3> {
        match self {
            Self::Beeline(s) => Some(s.destination()),
            Self::Path(s) => s.destination(),
            Self::Celebration(s) => s.destination(),
        }
    }
}

/// Move `entity` toward `target` by at most `speed * dt`, pointing it along
/// the direction of travel. Returns the distance left afterwards.
pub(crate) fn step_toward(entity: &mut EntityCore, target: Vector3, dt: f64) -> f64 {
    let offset = target - entity.position;
    let remaining = offset.magnitude();
    if remaining == 0.0 {
        return 0.0;
    }

    let dir = offset.unit();
    let step = (entity.speed * dt).min(remaining);
    entity.position += dir * step;
    entity.direction = dir;
    entity.position.dist(&target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::StraightLineRouter;

    #[test]
    fn test_beeline_search_is_plain_beeline() {
        let s = Strategy::for_search(
            &StraightLineRouter,
            Vector3::ZERO,
            Vector3::new(10.0, 0.0, 0.0),
            SearchStrategy::Beeline,
        );
        assert!(matches!(s, Strategy::Beeline(_)));
    }

    #[test]
    fn test_graph_search_celebrates() {
        let s = Strategy::for_search(
            &StraightLineRouter,
            Vector3::ZERO,
            Vector3::new(10.0, 0.0, 0.0),
            SearchStrategy::Dfs,
        );
        assert!(matches!(s, Strategy::Celebration(_)));
        assert_eq!(s.destination(), Some(Vector3::new(10.0, 0.0, 0.0)));
        assert!((s.current_path_distance(Vector3::ZERO) - 10.0).abs() < 1e-9);
    }
}
