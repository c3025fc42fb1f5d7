//! Direct-line movement.

use delivery_domain::Vector3;

use super::{ARRIVAL_EPSILON, step_toward};
use crate::entity::EntityCore;

/// Flies straight at a fixed target.
#[derive(Debug, Clone)]
pub struct BeelineStrategy {
    /// Last known position of the entity being moved
    position: Vector3,
    destination: Vector3,
}

impl BeelineStrategy {
    #[must_use]
    pub const fn new(from: Vector3, to: Vector3) -> Self {
        Self {
            position: from,
            destination: to,
        }
    }

    pub fn advance(&mut self, entity: &mut EntityCore, dt: f64) {
        self.position = entity.position;
        if self.is_completed() {
            return;
        }
        step_toward(entity, self.destination, dt);
        self.position = entity.position;
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.position.dist(&self.destination) < ARRIVAL_EPSILON
    }

    #[must_use]
    pub fn current_path_distance(&self, from: Vector3) -> f64 {
        from.dist(&self.destination)
    }

    #[must_use]
    pub fn total_path_distance(&self, from: Vector3) -> f64 {
        from.dist(&self.destination)
    }

    #[must_use]
    pub const fn destination(&self) -> Vector3 {
        self.destination
    }
}
