//! Rescue drones that bring a temporary charging point to dead drones.

use delivery_domain::Vector3;
use tracing::{info, warn};

use super::{EntityCore, EntityId};
use crate::strategy::Strategy;
use crate::world::World;

#[derive(Debug, Clone)]
pub struct RechargeDrone {
    available: bool,
    rescuing: Option<EntityId>,
    to_dead_drone: Option<Strategy>,
    to_origin: Option<Strategy>,
    /// Waiting beside the rescued drone for it to come back into service
    charging: bool,
    /// Station marker this drone placed, if any
    station_marker: Option<Vector3>,
}

impl Default for RechargeDrone {
    fn default() -> Self {
        Self {
            available: true,
            rescuing: None,
            to_dead_drone: None,
            to_origin: None,
            charging: false,
            station_marker: None,
        }
    }
}

impl RechargeDrone {
    pub fn update(&mut self, core: &mut EntityCore, dt: f64, world: &mut World) {
        if self.available {
            self.claim_next(core, world);
        }

        if let Some(strategy) = &mut self.to_dead_drone {
            strategy.advance(core, dt);
            if strategy.is_completed() {
                self.to_dead_drone = None;
                self.charging = true;
                self.station_marker = Some(core.position);
                world.fleet.add_recharge_station(core.position);
            }
        } else if self.charging {
            let Some(target) = self.rescuing else {
                self.charging = false;
                return;
            };
            let gone = world.entity(target).is_none();
            if gone || world.fleet.is_functional(target) {
                if gone {
                    warn!(recharge_drone = %core.name, drone = target, "rescued drone removed");
                } else {
                    info!(recharge_drone = %core.name, drone = target, "drone back in service");
                }
                self.charging = false;
                self.release(world);
            }
        } else if let Some(strategy) = &mut self.to_origin {
            strategy.advance(core, dt);
            if strategy.is_completed() {
                self.to_origin = None;
                self.rescuing = None;
                self.available = true;
            }
        }
    }

    /// Take the oldest dead drone unless another rescuer already has it.
    fn claim_next(&mut self, core: &EntityCore, world: &mut World) {
        let Some(target) = world.fleet.pop_dead() else {
            return;
        };
        if !world.fleet.claim_charging(target) {
            return;
        }
        let Some(dead_position) = world.entity(target).map(|e| e.core.position) else {
            world.fleet.release_charging(target);
            return;
        };

        let message = format!("{} heading to: {}", core.name, world.name_of(target));
        world.notify(message);

        self.available = false;
        self.charging = false;
        self.rescuing = Some(target);
        self.to_dead_drone = Some(Strategy::beeline(core.position, dead_position));
        self.to_origin = Some(Strategy::beeline(dead_position, core.position));
    }

    /// Withdraw the station marker and let go of the rescued drone.
    pub fn release(&mut self, world: &mut World) {
        if let Some(marker) = self.station_marker.take() {
            world.fleet.remove_recharge_station(marker);
        }
        if let Some(target) = self.rescuing {
            world.fleet.release_charging(target);
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    #[must_use]
    pub const fn rescuing(&self) -> Option<EntityId> {
        self.rescuing
    }

    #[must_use]
    pub const fn station_marker(&self) -> Option<Vector3> {
        self.station_marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::entity::test_support::core_at;
    use delivery_domain::{EntityDetails, EntityType};

    fn world() -> World {
        World::new(SimConfig::default().with_seed(8))
    }

    fn dead_drone(world: &mut World, name: &str, position: Vector3) -> EntityId {
        let id = world.create_entity(EntityDetails::new(name, EntityType::Drone, position));
        world.fleet.mark_dead(id);
        id
    }

    #[test]
    fn test_claims_oldest_dead_drone() {
        let mut world = world();
        let first = dead_drone(&mut world, "D1", Vector3::new(50.0, 0.0, 0.0));
        let second = dead_drone(&mut world, "D2", Vector3::new(-50.0, 0.0, 0.0));
        let mut core = core_at(Vector3::ZERO, 30.0);
        let mut rescuer = RechargeDrone::default();

        rescuer.update(&mut core, 0.1, &mut world);

        assert_eq!(rescuer.rescuing(), Some(first));
        assert!(!rescuer.is_available());
        assert!(world.fleet.is_charging(first));
        assert_eq!(world.fleet.dead_drones().front(), Some(&second));
    }

    #[test]
    fn test_second_rescuer_does_not_double_claim() {
        let mut world = world();
        let target = dead_drone(&mut world, "D1", Vector3::new(50.0, 0.0, 0.0));
        world.fleet.claim_charging(target);
        let mut core = core_at(Vector3::ZERO, 30.0);
        let mut rescuer = RechargeDrone::default();

        rescuer.update(&mut core, 0.1, &mut world);

        assert!(rescuer.is_available());
        assert!(rescuer.rescuing().is_none());
    }

    #[test]
    fn test_round_trip_withdraws_marker() {
        let mut world = world();
        let target = dead_drone(&mut world, "D1", Vector3::new(30.0, 0.0, 0.0));
        let origin = Vector3::ZERO;
        let mut core = core_at(origin, 30.0);
        let mut rescuer = RechargeDrone::default();

        for _ in 0..3 {
            rescuer.update(&mut core, 0.5, &mut world);
        }
        let marker = rescuer.station_marker().unwrap();
        assert!(world.fleet.recharge_stations().contains(&marker));

        rescuer.update(&mut core, 0.5, &mut world);
        assert!(world.fleet.recharge_stations().contains(&marker));

        world.fleet.mark_functional(target);
        rescuer.update(&mut core, 0.5, &mut world);
        assert!(world.fleet.recharge_stations().is_empty());
        assert!(!world.fleet.is_charging(target));

        for _ in 0..5 {
            rescuer.update(&mut core, 0.5, &mut world);
        }
        assert!(rescuer.is_available());
        assert!(core.position.dist(&origin) < 4.0);
    }
}
