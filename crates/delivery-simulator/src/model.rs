//! # Simulation Model
//!
//! Owns the world and the controller. Drives one synchronous pass over all
//! entities per tick in id order, forwards queued side effects to the
//! controller after each entity, and sweeps removals once the pass is done.

use delivery_domain::{EntityDetails, SearchStrategy, TripRequest, Vector3, ViewEvent};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::controller::Controller;
use crate::entity::{Entity, EntityId, EntityKind};
use crate::fleet::Fleet;
use crate::routing::Router;
use crate::world::{Outgoing, World};

pub struct SimulationModel<C: Controller> {
    world: World,
    controller: C,
    ticks: u64,
}

impl<C: Controller> SimulationModel<C> {
    pub fn new(controller: C, config: SimConfig) -> Self {
        Self {
            world: World::new(config),
            controller,
            ticks: 0,
        }
    }

    #[must_use]
    pub fn with_router(mut self, router: Box<dyn Router>) -> Self {
        self.world.set_router(router);
        self
    }

    /// Create an entity from a raw descriptor. Malformed descriptors create
    /// nothing.
    pub fn create_entity(&mut self, descriptor: &Value) -> Option<EntityId> {
        match EntityDetails::from_value(descriptor) {
            Ok(details) => Some(self.create_from_details(details)),
            Err(err) => {
                warn!(error = %err, "entity not created");
                None
            }
        }
    }

    pub fn create_from_details(&mut self, details: EntityDetails) -> EntityId {
        let id = self.world.create_entity(details);
        self.flush();
        id
    }

    /// Queue an entity for removal at the end of the current tick.
    pub fn remove_entity(&mut self, id: EntityId) {
        self.world.remove(id);
    }

    /// Bind the robot named in `details` to its package and queue the
    /// package for delivery. Does nothing if either cannot be found.
    pub fn schedule_trip(&mut self, details: &Value) {
        let trip: TripRequest = match serde_json::from_value(details.clone()) {
            Ok(trip) => trip,
            Err(err) => {
                debug!(error = %err, "trip request not understood");
                return;
            }
        };

        let receiver = self.world.entities().find_map(|e| {
            let robot = e.as_robot()?;
            (e.name() == trip.name && robot.requested_delivery).then_some((e.id(), e.core.position))
        });
        let package_name = trip.package_name();
        let package = self.world.entities().find_map(|e| {
            let package = e.as_package()?;
            (e.name() == package_name && package.requires_delivery()).then_some(e.id())
        });

        let (Some((robot, destination)), Some(package)) = (receiver, package) else {
            debug!(name = %trip.name, "no receiver or package for trip");
            return;
        };

        let search = SearchStrategy::parse(&trip.search);
        if let Some(p) = self.world.entity_mut(package).and_then(Entity::as_package_mut) {
            p.bind(robot, destination, search);
        }
        if let Some(r) = self.world.entity_mut(robot).and_then(Entity::as_robot_mut) {
            r.requested_delivery = false;
        }
        self.world.scheduled.push_back(package);

        info!(name = %trip.name, package, search = search.as_str(), "delivery scheduled");
        self.controller
            .send_event_to_view(ViewEvent::DeliveryScheduled.as_str(), details);
    }

    /// Advance every entity by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        let ids: Vec<EntityId> = self.world.entities.keys().copied().collect();
        for id in ids {
            let Some(mut entity) = self.world.entities.remove(&id) else {
                continue;
            };
            entity.update(dt, &mut self.world);
            let snapshot = entity.snapshot();
            self.world.entities.insert(id, entity);

            self.flush();
            self.controller.update_entity(&snapshot);
        }

        self.sweep();
        self.ticks += 1;
    }

    /// Accept an additional delivery for `drone` at `poi`.
    pub fn pit_stop(&mut self, drone: EntityId, poi: EntityId) -> bool {
        let Some((poi_position, poi_name)) = self
            .world
            .entity(poi)
            .filter(|e| e.as_poi().is_some())
            .map(|e| (e.core.position, e.core.name.clone()))
        else {
            return false;
        };
        let Some(mut entity) = self.world.entities.remove(&drone) else {
            return false;
        };

        let accepted = match &mut entity.kind {
            EntityKind::Drone(d) => {
                d.courier
                    .pickup_additional(&entity.core, poi_position, &poi_name, &mut self.world)
            }
            _ => false,
        };
        self.world.entities.insert(drone, entity);
        self.flush();
        accepted
    }

    /// [`pit_stop`](Self::pit_stop) by entity names.
    pub fn pit_stop_by_name(&mut self, drone: &str, poi: &str) -> bool {
        let find = |name: &str, want_poi: bool| {
            self.world
                .entities()
                .find(|e| e.name() == name && (e.as_poi().is_some() == want_poi))
                .map(Entity::id)
        };
        match (find(drone, false), find(poi, true)) {
            (Some(d), Some(p)) => self.pit_stop(d, p),
            _ => false,
        }
    }

    /// Dispatch a view command by name.
    pub fn handle_command(&mut self, command: &str, data: &Value) {
        match command {
            "CreateEntity" => {
                self.create_entity(data);
            }
            "ScheduleTrip" => self.schedule_trip(data),
            "RemoveEntity" => {
                if let Some(id) = data.get("id").and_then(Value::as_u64) {
                    if let Ok(id) = EntityId::try_from(id) {
                        self.remove_entity(id);
                    }
                }
            }
            "PitStop" => {
                let field = |key: &str| data.get(key).and_then(Value::as_str).unwrap_or_default();
                let (drone, poi) = (field("name").to_string(), field("POI").to_string());
                if !self.pit_stop_by_name(&drone, &poi) {
                    debug!(%drone, %poi, "pit stop declined");
                }
            }
            "Stop" => self.stop(),
            other => debug!(command = other, "unknown command"),
        }
    }

    pub fn stop(&self) {
        info!(ticks = self.ticks, entities = self.world.entities.len(), "simulation stopped");
    }

    pub fn add_recharge_station(&mut self, station: Vector3) {
        self.world.fleet.add_recharge_station(station);
    }

    pub fn remove_recharge_station(&mut self, station: Vector3) -> bool {
        self.world.fleet.remove_recharge_station(station)
    }

    #[must_use]
    pub fn recharge_stations(&self) -> &[Vector3] {
        self.world.fleet.recharge_stations()
    }

    #[must_use]
    pub const fn fleet(&self) -> &Fleet {
        &self.world.fleet
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.world.entity(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.world.entities()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.world.entities().find(|e| e.name() == name)
    }

    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub const fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    fn flush(&mut self) {
        for outgoing in self.world.take_outbox() {
            match outgoing {
                Outgoing::Added(id) => {
                    if let Some(entity) = self.world.entity(id) {
                        self.controller.add_entity(&entity.snapshot());
                    }
                }
                Outgoing::Event { event, payload } => {
                    self.controller.send_event_to_view(event.as_str(), &payload);
                }
            }
        }
    }

    fn sweep(&mut self) {
        let removed = std::mem::take(&mut self.world.removed);
        for id in removed {
            let Some(mut entity) = self.world.entities.remove(&id) else {
                continue;
            };

            self.world.scheduled.retain(|p| *p != id);
            self.world.fleet.forget(id);
            match &mut entity.kind {
                EntityKind::RechargeStation => {
                    self.world.fleet.remove_recharge_station(entity.core.position);
                }
                EntityKind::RechargeDrone(rescuer) => rescuer.release(&mut self.world),
                _ => {}
            }

            debug!(id, name = %entity.core.name, "entity removed");
            self.controller.remove_entity(&entity.snapshot());
        }
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::RecordingController;
    use serde_json::json;

    fn model() -> SimulationModel<RecordingController> {
        let config = SimConfig::default().with_seed(21).with_malfunction_chance(0.0);
        SimulationModel::new(RecordingController::default(), config)
    }

    fn spawn(model: &mut SimulationModel<RecordingController>, name: &str, kind: &str, pos: [f64; 3]) -> EntityId {
        model
            .create_entity(&json!({ "name": name, "type": kind, "position": pos }))
            .unwrap()
    }

    #[test]
    fn test_bad_descriptor_creates_nothing() {
        let mut model = model();
        assert!(model.create_entity(&json!({ "name": "x", "type": "tank", "position": [0, 0, 0] })).is_none());
        assert!(model.create_entity(&json!({ "type": "drone" })).is_none());
        assert!(model.controller().added.is_empty());
    }

    #[test]
    fn test_schedule_trip_requires_robot_and_package() {
        let mut model = model();
        spawn(&mut model, "Bot", "robot", [200.0, 270.0, 0.0]);

        model.schedule_trip(&json!({ "name": "Bot", "search": "astar" }));
        assert!(model.world().scheduled().is_empty());
        assert!(model.controller().events_named("DeliveryScheduled").is_empty());

        let package = spawn(&mut model, "Bot_package", "package", [50.0, 270.0, 0.0]);
        model.schedule_trip(&json!({ "name": "Bot", "search": "astar" }));
        assert_eq!(model.world().scheduled().front(), Some(&package));
        assert_eq!(model.controller().events_named("DeliveryScheduled").len(), 1);

        model.schedule_trip(&json!({ "name": "Bot", "search": "astar" }));
        assert_eq!(model.world().scheduled().len(), 1);
    }

    #[test]
    fn test_removal_is_deferred_and_cleans_up() {
        let mut model = model();
        let station = spawn(&mut model, "Station", "recharge_station", [0.0, 0.0, 0.0]);
        assert_eq!(model.recharge_stations().len(), 1);

        model.remove_entity(station);
        assert!(model.entity(station).is_some());

        model.update(0.1);
        assert!(model.entity(station).is_none());
        assert!(model.recharge_stations().is_empty());
        assert_eq!(model.controller().removed.len(), 1);
    }

    #[test]
    fn test_prompt_once_per_visit() {
        let mut model = model();
        spawn(&mut model, "Bot", "robot", [3000.0, 270.0, 0.0]);
        spawn(&mut model, "Bot_package", "package", [0.0, 270.0, 0.0]);
        spawn(&mut model, "Cafe", "POI", [1000.0, 270.0, 0.0]);
        let drone = spawn(&mut model, "Drone", "drone", [0.0, 270.0, 0.0]);
        model.schedule_trip(&json!({ "name": "Bot", "search": "beeline" }));

        let prompts = |m: &SimulationModel<RecordingController>| m.controller().events_named("AdditionalPrompt").len();

        for _ in 0..45 {
            model.update(1.0);
        }
        let pos = model.entity(drone).unwrap().core.position;
        assert!(pos.x > 1200.0, "drone at {pos}");
        assert_eq!(prompts(&model), 1);

        for _ in 0..20 {
            model.update(1.0);
        }
        assert_eq!(prompts(&model), 1);
        assert!(model.controller().notifications().contains(&"Drone is near Cafe"));
    }

    #[test]
    fn test_pit_stop_spawns_extra_and_delivers_both() {
        let mut model = model();
        let bot = spawn(&mut model, "Bot", "robot", [600.0, 270.0, 0.0]);
        spawn(&mut model, "Bot_package", "package", [0.0, 270.0, 0.0]);
        spawn(&mut model, "Cafe", "POI", [100.0, 270.0, 100.0]);
        let drone = spawn(&mut model, "Drone", "drone", [0.0, 270.0, 0.0]);
        model.schedule_trip(&json!({ "name": "Bot", "search": "beeline" }));

        model.update(0.5);
        model.update(0.5);
        assert!(model.entity(drone).and_then(Entity::as_drone).unwrap().drone().picked_up());
        assert_eq!(model.controller().events_named("AdditionalPrompt").len(), 1);

        assert!(model.pit_stop_by_name("Drone", "Cafe"));
        assert!(!model.pit_stop_by_name("Drone", "Cafe"));
        let extra = model.find("Additional Cafe Package").map(Entity::id).unwrap();

        for _ in 0..120 {
            model.update(0.5);
        }

        let robot = model.entity(bot).and_then(Entity::as_robot).unwrap();
        assert_eq!(robot.received().len(), 2);
        assert!(robot.received().contains(&extra));
    }
}
