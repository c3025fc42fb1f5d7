//! Waypoint-following movement.

use delivery_domain::Vector3;

use super::{ARRIVAL_EPSILON, step_toward};
use crate::entity::EntityCore;

/// Follows a router-produced path one waypoint at a time.
#[derive(Debug, Clone, Default)]
pub struct PathStrategy {
    path: Vec<Vector3>,
    index: usize,
}

impl PathStrategy {
    #[must_use]
    pub fn new(path: Vec<Vector3>) -> Self {
        Self { path, index: 0 }
    }

    pub fn advance(&mut self, entity: &mut EntityCore, dt: f64) {
        let Some(&waypoint) = self.path.get(self.index) else {
            return;
        };

        if step_toward(entity, waypoint, dt) < ARRIVAL_EPSILON {
            self.index += 1;
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.index >= self.path.len()
    }

    /// `from` to the current waypoint, then along the rest of the chain.
    #[must_use]
    pub fn current_path_distance(&self, from: Vector3) -> f64 {
        chain_length(from, self.path.get(self.index..).unwrap_or_default())
    }

    /// `from` to the first waypoint, then along the whole chain.
    #[must_use]
    pub fn total_path_distance(&self, from: Vector3) -> f64 {
        chain_length(from, &self.path)
    }

    #[must_use]
    pub fn destination(&self) -> Option<Vector3> {
        self.path.last().copied()
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

fn chain_length(from: Vector3, waypoints: &[Vector3]) -> f64 {
    waypoints
        .iter()
        .fold((from, 0.0), |(last, total), next| (*next, total + last.dist(next)))
        .1
}
