//! Delivery drones.
//!
//! [`Drone`] is the bare delivery loop. [`Courier`] layers the optional
//! multi-delivery capability over it and [`DeliveryDrone`] layers the
//! optional battery over that. Each layer owns the one beneath it.

use delivery_domain::Vector3;
use tracing::info;

use super::{Battery, EntityCore, EntityId, MultiDelivery};
use crate::strategy::Strategy;
use crate::world::World;

/// What the current trip did during one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripOutcome {
    InProgress,
    /// The carried package was dropped off at its destination
    Delivered,
    /// The carried package disappeared and the trip was dropped
    Abandoned,
}

/// Base delivery loop: fetch the next scheduled package, carry it to its
/// destination, hand it off.
#[derive(Debug, Clone)]
pub struct Drone {
    available: bool,
    picked_up: bool,
    package: Option<EntityId>,
    /// Package the current pickup leg leads to
    fetching: Option<EntityId>,
    to_package: Option<Strategy>,
    to_final: Option<Strategy>,
}

impl Default for Drone {
    fn default() -> Self {
        Self {
            available: true,
            picked_up: false,
            package: None,
            fetching: None,
            to_package: None,
            to_final: None,
        }
    }
}

impl Drone {
    pub fn update(&mut self, core: &mut EntityCore, dt: f64, world: &mut World) -> TripOutcome {
        if self.available {
            self.next_delivery(core, world);
        }

        if let Some(package) = self.package {
            if world.entity(package).is_none() {
                info!(drone = %core.name, package, "package removed mid-delivery");
                self.abandon();
                return TripOutcome::Abandoned;
            }
        }

        if let Some(strategy) = &mut self.to_package {
            strategy.advance(core, dt);
            if strategy.is_completed() {
                self.to_package = None;
                self.picked_up = true;
                let target = self.fetching.take().or(self.package);
                let message = format!(
                    "{} picked up: {}",
                    core.name,
                    target.map_or("", |id| world.name_of(id))
                );
                world.notify(message);
            }
        } else if let Some(strategy) = &mut self.to_final {
            strategy.advance(core, dt);
            let completed = strategy.is_completed();
            if let Some(package) = self.package {
                world.carry(package, core.position, core.direction);
            }
            if completed {
                self.to_final = None;
                let delivered = self.package.take();
                if let Some(package) = delivered {
                    let message = format!("{} dropped off: {}", core.name, world.name_of(package));
                    world.notify(message);
                    world.deliver(package);
                }
                self.available = true;
                self.picked_up = false;
                if delivered.is_some() {
                    return TripOutcome::Delivered;
                }
            }
        }
        TripOutcome::InProgress
    }

    fn next_delivery(&mut self, core: &EntityCore, world: &mut World) {
        let Some(id) = world.next_scheduled() else {
            return;
        };
        let Some((position, destination, search)) = world.entity(id).and_then(|e| {
            let package = e.as_package()?;
            Some((e.core.position, package.destination()?, package.search()))
        }) else {
            return;
        };

        let message = format!("{} heading to: {}", core.name, world.name_of(id));
        world.notify(message);
        info!(drone = %core.name, package = id, search = search.as_str(), "delivery started");

        self.package = Some(id);
        self.fetching = Some(id);
        self.available = false;
        self.picked_up = false;
        self.to_package = Some(Strategy::beeline(core.position, position));
        self.to_final = Some(Strategy::for_search(world.router(), position, destination, search));
    }

    fn abandon(&mut self) {
        *self = Self::default();
    }

    /// Replace the pickup leg with a detour to `target`.
    pub fn set_to_package(&mut self, strategy: Strategy, target: EntityId) {
        self.to_package = Some(strategy);
        self.fetching = Some(target);
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    #[must_use]
    pub const fn picked_up(&self) -> bool {
        self.picked_up
    }

    #[must_use]
    pub const fn package(&self) -> Option<EntityId> {
        self.package
    }

    #[must_use]
    pub const fn to_package(&self) -> Option<&Strategy> {
        self.to_package.as_ref()
    }

    #[must_use]
    pub const fn to_final(&self) -> Option<&Strategy> {
        self.to_final.as_ref()
    }
}

/// Delivery loop plus the optional multi-delivery layer.
#[derive(Debug, Clone, Default)]
pub struct Courier {
    pub multi_delivery: Option<MultiDelivery>,
    pub drone: Drone,
}

impl Courier {
    pub fn update(&mut self, core: &mut EntityCore, dt: f64, world: &mut World) {
        if let Some(multi) = &mut self.multi_delivery {
            multi.before_update(core, world);
        }
        let outcome = self.drone.update(core, dt, world);
        if let Some(multi) = &mut self.multi_delivery {
            match outcome {
                TripOutcome::Delivered => multi.hand_off(core, world),
                TripOutcome::Abandoned => multi.abandon(core, world),
                TripOutcome::InProgress => {}
            }
        }
    }

    /// Whether a POI may offer this drone another package right now.
    #[must_use]
    pub fn can_take_additional(&self) -> bool {
        self.drone.picked_up()
            && self
                .multi_delivery
                .as_ref()
                .is_some_and(MultiDelivery::can_take_additional)
    }

    /// Detour to `poi` for one more package. Returns whether it was accepted.
    pub fn pickup_additional(
        &mut self,
        core: &EntityCore,
        poi: Vector3,
        poi_name: &str,
        world: &mut World,
    ) -> bool {
        match &mut self.multi_delivery {
            Some(multi) => multi.pickup_additional(core, &mut self.drone, poi, poi_name, world),
            None => false,
        }
    }
}

/// Outermost drone record.
#[derive(Debug, Clone, Default)]
pub struct DeliveryDrone {
    pub battery: Option<Battery>,
    pub courier: Courier,
}

impl DeliveryDrone {
    pub fn update(&mut self, core: &mut EntityCore, dt: f64, world: &mut World) {
        match &mut self.battery {
            Some(battery) => battery.update(core, &mut self.courier, dt, world),
            None => self.courier.update(core, dt, world),
        }
    }

    #[must_use]
    pub const fn drone(&self) -> &Drone {
        &self.courier.drone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::entity::Entity;
    use delivery_domain::{EntityDetails, EntityType, SearchStrategy};

    fn setup() -> (World, EntityId, EntityId) {
        let mut world = World::new(SimConfig::default().with_seed(5));
        let robot = world.create_entity(EntityDetails::new(
            "Bot",
            EntityType::Robot,
            Vector3::new(100.0, 0.0, 0.0),
        ));
        let package = world.create_entity(EntityDetails::new(
            "Bot_package",
            EntityType::Package,
            Vector3::new(20.0, 0.0, 0.0),
        ));
        world
            .entity_mut(package)
            .and_then(Entity::as_package_mut)
            .unwrap()
            .bind(robot, Vector3::new(100.0, 0.0, 0.0), SearchStrategy::Beeline);
        world.scheduled.push_back(package);
        (world, robot, package)
    }

    #[test]
    fn test_delivery_loop_hands_off() {
        let (mut world, robot, package) = setup();
        let mut core = crate::entity::test_support::core_at(Vector3::ZERO, 10.0);
        let mut drone = Drone::default();

        assert_eq!(drone.update(&mut core, 1.0, &mut world), TripOutcome::InProgress);
        assert!(!drone.is_available());
        assert_eq!(drone.package(), Some(package));
        assert!(drone.to_package().is_some() && drone.to_final().is_some());

        let outcomes: Vec<_> = (0..20).map(|_| drone.update(&mut core, 1.0, &mut world)).collect();
        assert_eq!(outcomes.iter().filter(|o| **o == TripOutcome::Delivered).count(), 1);

        assert!(drone.is_available());
        assert!(drone.package().is_none());
        let received = world.entity(robot).and_then(Entity::as_robot).unwrap().received();
        assert_eq!(received, &[package]);
        let carried = world.entity(package).unwrap().core.position;
        assert!(carried.dist(&Vector3::new(100.0, 0.0, 0.0)) < 4.0);
    }

    #[test]
    fn test_removed_package_abandons_trip() {
        let (mut world, _, package) = setup();
        let mut core = crate::entity::test_support::core_at(Vector3::ZERO, 10.0);
        let mut drone = Drone::default();

        drone.update(&mut core, 1.0, &mut world);
        world.entities.remove(&package);
        assert_eq!(drone.update(&mut core, 1.0, &mut world), TripOutcome::Abandoned);

        assert!(drone.is_available());
        assert!(drone.to_package().is_none() && drone.to_final().is_none());
    }
}
