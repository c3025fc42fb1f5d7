//! Shared state handed to every entity update.
//!
//! The model takes the entity being updated out of the table, so the world
//! an entity sees contains everyone except itself. Side effects meant for the
//! controller are queued in an outbox and flushed by the model after each
//! entity update.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use delivery_domain::{EntityDetails, EntityType, Vector3, ViewEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::SimConfig;
use crate::entity::{Entity, EntityId};
use crate::factory;
use crate::fleet::Fleet;
use crate::routing::{Router, StraightLineRouter};

/// Something the controller must hear about
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Added(EntityId),
    Event { event: ViewEvent, payload: Value },
}

pub struct World {
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    pub fleet: Fleet,
    /// Packages waiting for a drone, in scheduling order
    pub(crate) scheduled: VecDeque<EntityId>,
    pub(crate) outbox: Vec<Outgoing>,
    pub(crate) removed: BTreeSet<EntityId>,
    rng: StdRng,
    router: Box<dyn Router>,
    config: SimConfig,
    next_id: EntityId,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("fleet", &self.fleet)
            .field("scheduled", &self.scheduled)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl World {
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            entities: BTreeMap::new(),
            fleet: Fleet::default(),
            scheduled: VecDeque::new(),
            outbox: Vec::new(),
            removed: BTreeSet::new(),
            rng,
            router: Box::new(StraightLineRouter),
            config,
            next_id: 0,
        }
    }

    pub fn set_router(&mut self, router: Box<dyn Router>) {
        self.router = router;
    }

    #[must_use]
    pub fn router(&self) -> &dyn Router {
        self.router.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Name of an entity, or an empty string if it is gone.
    #[must_use]
    pub fn name_of(&self, id: EntityId) -> &str {
        self.entities.get(&id).map_or("", Entity::name)
    }

    /// Build and register an entity.
    ///
    /// The new entity is first updated on the tick after it was created.
    pub fn create_entity(&mut self, details: EntityDetails) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;

        let entity = factory::build(id, details, &self.config);
        let entity_type = entity.core.entity_type;
        let position = entity.core.position;
        debug!(id, name = %entity.core.name, kind = %entity_type, "entity created");
        self.entities.insert(id, entity);

        match entity_type {
            EntityType::RechargeStation => self.fleet.add_recharge_station(position),
            EntityType::Drone => self.subscribe_drone(id),
            EntityType::Poi => self.subscribe_poi(id),
            _ => {}
        }

        self.outbox.push(Outgoing::Added(id));
        id
    }

    fn subscribe_drone(&mut self, drone: EntityId) {
        for poi in self.entities.values_mut().filter_map(Entity::as_poi_mut) {
            poi.subscribe(drone);
        }
    }

    fn subscribe_poi(&mut self, poi: EntityId) {
        let drones: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.as_drone().is_some())
            .map(Entity::id)
            .collect();
        if let Some(poi) = self.entities.get_mut(&poi).and_then(Entity::as_poi_mut) {
            for drone in drones {
                poi.subscribe(drone);
            }
        }
    }

    /// Mark an entity for removal at the end of the tick.
    pub fn remove(&mut self, id: EntityId) {
        self.removed.insert(id);
    }

    /// Next scheduled package that still exists.
    pub fn next_scheduled(&mut self) -> Option<EntityId> {
        while let Some(id) = self.scheduled.pop_front() {
            if self.entities.contains_key(&id) {
                return Some(id);
            }
        }
        None
    }

    #[must_use]
    pub fn scheduled(&self) -> &VecDeque<EntityId> {
        &self.scheduled
    }

    /// Move a carried package along with its carrier.
    pub fn carry(&mut self, package: EntityId, position: Vector3, direction: Vector3) {
        if let Some(entity) = self.entities.get_mut(&package) {
            entity.core.position = position;
            entity.core.direction = direction;
        }
    }

    /// Hand a package to whoever it was bound to.
    pub fn deliver(&mut self, package: EntityId) {
        let Some(owner) = self
            .entities
            .get_mut(&package)
            .and_then(Entity::as_package_mut)
            .and_then(|p| p.hand_off())
        else {
            return;
        };
        if let Some(robot) = self.entities.get_mut(&owner).and_then(Entity::as_robot_mut) {
            robot.receive(package);
        }
    }

    /// Free-text status line for the view.
    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "notification");
        self.send_event(ViewEvent::Notification, json!({ "message": message }));
    }

    pub fn send_event(&mut self, event: ViewEvent, payload: Value) {
        self.outbox.push(Outgoing::Event { event, payload });
    }

    /// Roll whether a station malfunctions on arrival.
    pub fn roll_malfunction(&mut self) -> bool {
        self.rng.r#gen::<f64>() < self.config.malfunction_chance
    }

    /// Uniform random point inside `[min, max)` on every axis.
    pub fn random_point(&mut self, min: Vector3, max: Vector3) -> Vector3 {
        let mut point = min;
        for axis in 0..3 {
            if max[axis] > min[axis] {
                point[axis] = self.rng.gen_range(min[axis]..max[axis]);
            }
        }
        point
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(SimConfig::default().with_seed(3))
    }

    #[test]
    fn test_create_registers_station() {
        let mut world = world();
        let pos = Vector3::new(5.0, 0.0, 5.0);
        let id = world.create_entity(EntityDetails::new("S", EntityType::RechargeStation, pos));

        assert_eq!(world.fleet.recharge_stations(), &[pos]);
        assert_eq!(world.take_outbox(), vec![Outgoing::Added(id)]);
    }

    #[test]
    fn test_drones_and_pois_subscribe_both_ways() {
        let mut world = world();
        let early = world.create_entity(EntityDetails::new("D1", EntityType::Drone, Vector3::ZERO));
        let poi = world.create_entity(EntityDetails::new("Cafe", EntityType::Poi, Vector3::ZERO));
        let late = world.create_entity(EntityDetails::new("D2", EntityType::Drone, Vector3::ZERO));

        let poi = world.entity(poi).and_then(Entity::as_poi).unwrap();
        assert!(poi.is_subscribed(early));
        assert!(poi.is_subscribed(late));
    }

    #[test]
    fn test_next_scheduled_skips_missing() {
        let mut world = world();
        let pkg = world.create_entity(EntityDetails::new("P", EntityType::Package, Vector3::ZERO));
        world.scheduled.push_back(99);
        world.scheduled.push_back(pkg);

        assert_eq!(world.next_scheduled(), Some(pkg));
        assert_eq!(world.next_scheduled(), None);
    }

    #[test]
    fn test_malfunction_chance_extremes() {
        let mut always = World::new(SimConfig::default().with_seed(1).with_malfunction_chance(1.0));
        let mut never = World::new(SimConfig::default().with_seed(1).with_malfunction_chance(0.0));
        assert!((0..20).all(|_| always.roll_malfunction()));
        assert!((0..20).all(|_| !never.roll_malfunction()));
    }

    #[test]
    fn test_random_point_in_bounds() {
        let mut world = world();
        let min = Vector3::new(-10.0, 5.0, 0.0);
        let max = Vector3::new(10.0, 5.0, 3.0);
        for _ in 0..50 {
            let p = world.random_point(min, max);
            assert!(p.x >= -10.0 && p.x < 10.0);
            assert_eq!(p.y, 5.0);
            assert!(p.z >= 0.0 && p.z < 3.0);
        }
    }
}
