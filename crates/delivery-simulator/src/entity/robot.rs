//! Robots that request and receive deliveries.

use super::EntityId;

/// Receiver of deliveries.
#[derive(Debug, Clone)]
pub struct Robot {
    /// Still waiting for a trip to be scheduled
    pub requested_delivery: bool,
    received: Vec<EntityId>,
}

impl Default for Robot {
    fn default() -> Self {
        Self {
            requested_delivery: true,
            received: Vec::new(),
        }
    }
}

impl Robot {
    pub fn receive(&mut self, package: EntityId) {
        if !self.received.contains(&package) {
            self.received.push(package);
        }
    }

    #[must_use]
    pub fn received(&self) -> &[EntityId] {
        &self.received
    }
}
