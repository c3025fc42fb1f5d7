//! Opportunistic extra pickups at points of interest.

use delivery_domain::{EntityType, Vector3};
use tracing::info;

use super::{Drone, Entity, EntityCore, EntityId};
use crate::strategy::Strategy;
use crate::world::World;

/// A drone within this distance of a POI may be offered an extra package
pub const POI_RANGE: f64 = 200.0;

/// Distance at which a pending extra package is collected
pub const PICKUP_RADIUS: f64 = 5.0;

#[derive(Debug, Clone, Default)]
pub struct MultiDelivery {
    /// Packages riding with the drone; the base package first
    held: Vec<EntityId>,
    /// Extra package created at a POI and not yet collected
    pending: Option<(EntityId, Vector3)>,
}

impl MultiDelivery {
    /// Collect a pending extra and carry everything held. Runs before the
    /// drone moves.
    pub fn before_update(&mut self, core: &EntityCore, world: &mut World) {
        if let Some((package, at)) = self.pending {
            if core.position.dist(&at) < PICKUP_RADIUS && self.held.last() != Some(&package) {
                self.held.push(package);
                self.pending = None;
            }
        }

        for &package in &self.held {
            world.carry(package, core.position, core.direction);
        }
    }

    /// Release every extra to its owner once the base package is dropped off.
    pub fn hand_off(&mut self, core: &EntityCore, world: &mut World) {
        let extras = self.take_extras();
        for &package in &extras {
            world.carry(package, core.position, core.direction);
            world.deliver(package);
        }
        if !extras.is_empty() {
            info!(drone = %core.name, count = extras.len(), "extra packages handed off");
        }
        self.unbind_pending(world);
    }

    /// The base trip was dropped. Extras stay where the drone left them and
    /// may be scheduled again.
    pub fn abandon(&mut self, core: &EntityCore, world: &mut World) {
        let extras = self.take_extras();
        for &package in &extras {
            unbind(world, package);
        }
        if !extras.is_empty() {
            info!(drone = %core.name, count = extras.len(), "extra packages left behind");
        }
        self.unbind_pending(world);
    }

    fn take_extras(&mut self) -> Vec<EntityId> {
        let extras = if self.held.is_empty() {
            Vec::new()
        } else {
            self.held.split_off(1)
        };
        self.held.clear();
        extras
    }

    fn unbind_pending(&mut self, world: &mut World) {
        if let Some((package, _)) = self.pending.take() {
            unbind(world, package);
        }
    }

    /// Only one extra may be in transit at a time.
    #[must_use]
    pub const fn can_take_additional(&self) -> bool {
        self.pending.is_none()
    }

    /// Spawn a copy of the carried package at `poi` and detour to it.
    pub fn pickup_additional(
        &mut self,
        core: &EntityCore,
        drone: &mut Drone,
        poi: Vector3,
        poi_name: &str,
        world: &mut World,
    ) -> bool {
        if core.position.dist(&poi) >= POI_RANGE || !drone.picked_up() || self.pending.is_some() {
            return false;
        }
        let Some(base) = drone.package() else {
            return false;
        };
        let Some(original) = world.entity(base) else {
            return false;
        };
        let Some(binding) = original
            .as_package()
            .and_then(|p| Some((p.owner()?, p.destination()?, p.search())))
        else {
            return false;
        };

        let mut details = original.core.details.clone();
        details.entity_type = EntityType::Package;
        details.position = poi;
        details.name = format!("Additional {poi_name} Package");

        let (owner, destination, search) = binding;
        let extra = world.create_entity(details);
        if let Some(package) = world.entity_mut(extra).and_then(Entity::as_package_mut) {
            package.bind(owner, destination, search);
        }

        if self.held.is_empty() {
            self.held.push(base);
        }
        self.pending = Some((extra, poi));
        drone.set_to_package(Strategy::beeline(core.position, poi), extra);

        info!(drone = %core.name, poi = poi_name, package = extra, "detour accepted");
        true
    }

    #[must_use]
    pub fn held(&self) -> &[EntityId] {
        &self.held
    }

    #[must_use]
    pub const fn pending(&self) -> Option<EntityId> {
        match self.pending {
            Some((id, _)) => Some(id),
            None => None,
        }
    }
}

fn unbind(world: &mut World, package: EntityId) {
    if let Some(package) = world.entity_mut(package).and_then(Entity::as_package_mut) {
        package.unbind();
    }
}
