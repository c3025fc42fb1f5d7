//! Fleet-wide shared lists.
//!
//! Drones and recharge drones coordinate only through these lists. Every
//! entity sees them through the [`World`](crate::world::World) handle passed
//! to its update, so within a tick an entity observes whatever entities
//! updated before it already wrote.

use std::collections::VecDeque;

use delivery_domain::Vector3;

use crate::entity::EntityId;

/// Horizontal distance under which a drone counts as docked at a station
pub const STATION_RADIUS: f64 = 5.0;

#[derive(Debug, Clone, Default)]
pub struct Fleet {
    /// Drones stranded at zero charge, oldest first
    dead: VecDeque<EntityId>,
    /// Dead drones a recharge drone has claimed
    charging: Vec<EntityId>,
    /// Drones that reached full charge
    functional: Vec<EntityId>,
    recharge_stations: Vec<Vector3>,
}

impl Fleet {
    /// Queue a stranded drone. Returns `false` if it was already queued.
    pub fn mark_dead(&mut self, id: EntityId) -> bool {
        if self.dead.contains(&id) {
            return false;
        }
        self.dead.push_back(id);
        true
    }

    pub fn pop_dead(&mut self) -> Option<EntityId> {
        self.dead.pop_front()
    }

    #[must_use]
    pub fn is_dead(&self, id: EntityId) -> bool {
        self.dead.contains(&id)
    }

    #[must_use]
    pub fn dead_drones(&self) -> &VecDeque<EntityId> {
        &self.dead
    }

    /// Claim a drone for rescue. Returns `false` if someone already has it.
    pub fn claim_charging(&mut self, id: EntityId) -> bool {
        if self.charging.contains(&id) {
            return false;
        }
        self.charging.push(id);
        true
    }

    pub fn release_charging(&mut self, id: EntityId) {
        if let Some(i) = self.charging.iter().position(|d| *d == id) {
            self.charging.remove(i);
        }
    }

    #[must_use]
    pub fn is_charging(&self, id: EntityId) -> bool {
        self.charging.contains(&id)
    }

    #[must_use]
    pub fn charging_drones(&self) -> &[EntityId] {
        &self.charging
    }

    pub fn mark_functional(&mut self, id: EntityId) {
        if !self.functional.contains(&id) {
            self.functional.push(id);
        }
    }

    pub fn unmark_functional(&mut self, id: EntityId) {
        self.functional.retain(|d| *d != id);
    }

    #[must_use]
    pub fn is_functional(&self, id: EntityId) -> bool {
        self.functional.contains(&id)
    }

    #[must_use]
    pub fn functional_drones(&self) -> &[EntityId] {
        &self.functional
    }

    #[must_use]
    pub fn recharge_stations(&self) -> &[Vector3] {
        &self.recharge_stations
    }

    pub fn add_recharge_station(&mut self, station: Vector3) {
        self.recharge_stations.push(station);
    }

    /// Remove the first station at exactly `station`.
    pub fn remove_recharge_station(&mut self, station: Vector3) -> bool {
        match self.recharge_stations.iter().position(|s| *s == station) {
            Some(i) => {
                self.recharge_stations.remove(i);
                true
            }
            None => false,
        }
    }

    /// Nearest station to `from`, lifted to `from`'s altitude.
    #[must_use]
    pub fn nearest_station(&self, from: Vector3) -> Option<Vector3> {
        self.recharge_stations
            .iter()
            .map(|s| s.with_y(from.y))
            .min_by(|a, b| from.dist(a).total_cmp(&from.dist(b)))
    }

    /// Whether `position` is docked at any station.
    #[must_use]
    pub fn is_at_station(&self, position: Vector3) -> bool {
        self.recharge_stations
            .iter()
            .any(|s| position.dist(&s.with_y(position.y)) <= STATION_RADIUS)
    }

    /// Drop every reference to a removed drone.
    pub fn forget(&mut self, id: EntityId) {
        self.dead.retain(|d| *d != id);
        self.release_charging(id);
        self.unmark_functional(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_queue_is_fifo_and_idempotent() {
        let mut fleet = Fleet::default();
        assert!(fleet.mark_dead(1));
        assert!(fleet.mark_dead(2));
        assert!(!fleet.mark_dead(1));

        assert_eq!(fleet.dead_drones().len(), 2);
        assert_eq!(fleet.pop_dead(), Some(1));
        assert_eq!(fleet.pop_dead(), Some(2));
        assert_eq!(fleet.pop_dead(), None);
    }

    #[test]
    fn test_claim_charging_once() {
        let mut fleet = Fleet::default();
        assert!(fleet.claim_charging(7));
        assert!(!fleet.claim_charging(7));
        fleet.release_charging(7);
        assert!(!fleet.is_charging(7));
    }

    #[test]
    fn test_nearest_station_normalizes_altitude() {
        let mut fleet = Fleet::default();
        fleet.add_recharge_station(Vector3::new(100.0, 0.0, 0.0));
        fleet.add_recharge_station(Vector3::new(-30.0, 0.0, 0.0));

        let from = Vector3::new(0.0, 250.0, 0.0);
        assert_eq!(fleet.nearest_station(from), Some(Vector3::new(-30.0, 250.0, 0.0)));
        assert!(Fleet::default().nearest_station(from).is_none());
    }

    #[test]
    fn test_at_station_ignores_altitude() {
        let mut fleet = Fleet::default();
        fleet.add_recharge_station(Vector3::new(10.0, 0.0, 10.0));

        assert!(fleet.is_at_station(Vector3::new(13.0, 300.0, 14.0)));
        assert!(!fleet.is_at_station(Vector3::new(16.0, 0.0, 10.0)));
    }

    #[test]
    fn test_remove_station_removes_one_copy() {
        let mut fleet = Fleet::default();
        let s = Vector3::new(1.0, 2.0, 3.0);
        fleet.add_recharge_station(s);
        fleet.add_recharge_station(s);

        assert!(fleet.remove_recharge_station(s));
        assert_eq!(fleet.recharge_stations().len(), 1);
        assert!(fleet.remove_recharge_station(s));
        assert!(!fleet.remove_recharge_station(s));
    }

    #[test]
    fn test_forget_clears_all_lists() {
        let mut fleet = Fleet::default();
        fleet.mark_dead(3);
        fleet.claim_charging(3);
        fleet.mark_functional(3);

        fleet.forget(3);
        assert!(!fleet.is_dead(3));
        assert!(!fleet.is_charging(3));
        assert!(!fleet.is_functional(3));
    }
}
