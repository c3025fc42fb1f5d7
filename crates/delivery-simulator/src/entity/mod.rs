//! Simulated entities.
//!
//! Every entity is an [`EntityCore`] (identity and kinematics) plus an
//! [`EntityKind`] carrying the kind-specific state. Drones compose their
//! capabilities as nested layers: battery over multi-delivery over the base
//! delivery drone.

pub mod battery;
pub mod drone;
pub mod multi_delivery;
pub mod package;
pub mod poi;
pub mod recharge_drone;
pub mod robot;
pub mod wanderer;

pub use battery::{Battery, BatteryState};
pub use drone::{Courier, DeliveryDrone, Drone, TripOutcome};
pub use multi_delivery::MultiDelivery;
pub use package::Package;
pub use poi::Poi;
pub use recharge_drone::RechargeDrone;
pub use robot::Robot;
pub use wanderer::{WanderMode, Wanderer};

use delivery_domain::{EntityDetails, EntityType, Vector3};
use serde::Serialize;
use serde_json::Value;

use crate::world::World;

/// Identifier assigned by the model on creation
pub type EntityId = u32;

/// Identity and kinematics shared by all entities
#[derive(Debug, Clone)]
pub struct EntityCore {
    pub id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
    pub position: Vector3,
    /// Unit heading
    pub direction: Vector3,
    pub speed: f64,
    pub color: Option<String>,
    /// Descriptor the entity was created from
    pub details: EntityDetails,
}

impl EntityCore {
    #[must_use]
    pub fn from_details(id: EntityId, details: EntityDetails) -> Self {
        Self {
            id,
            name: details.name.clone(),
            entity_type: details.entity_type,
            position: details.position,
            direction: details
                .direction
                .map_or(Vector3::new(1.0, 0.0, 0.0), |d| d.unit()),
            speed: details
                .speed
                .unwrap_or_else(|| details.entity_type.default_speed()),
            color: details.color.clone(),
            details,
        }
    }

    /// Rotate the heading about the vertical axis.
    pub fn rotate(&mut self, angle: f64) {
        let (sin, cos) = angle.sin_cos();
        let d = self.direction;
        self.direction = Vector3::new(d.x * cos - d.z * sin, d.y, d.x * sin + d.z * cos);
    }
}

/// Kind-specific state
#[derive(Debug)]
pub enum EntityKind {
    Drone(Box<DeliveryDrone>),
    Package(Package),
    Robot(Robot),
    Human(Wanderer),
    Helicopter(Wanderer),
    RechargeStation,
    RechargeDrone(RechargeDrone),
    Poi(Poi),
}

#[derive(Debug)]
pub struct Entity {
    pub core: EntityCore,
    pub kind: EntityKind,
}

impl Entity {
    #[must_use]
    pub const fn new(core: EntityCore, kind: EntityKind) -> Self {
        Self { core, kind }
    }

    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.core.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Advance one tick.
    pub fn update(&mut self, dt: f64, world: &mut World) {
        let core = &mut self.core;
        match &mut self.kind {
            EntityKind::Drone(drone) => drone.update(core, dt, world),
            EntityKind::Human(w) | EntityKind::Helicopter(w) => w.update(core, dt, world),
            EntityKind::RechargeDrone(r) => r.update(core, dt, world),
            EntityKind::Poi(p) => p.update(core, world),
            EntityKind::Package(_) | EntityKind::Robot(_) | EntityKind::RechargeStation => {}
        }
    }

    #[must_use]
    pub fn as_drone(&self) -> Option<&DeliveryDrone> {
        match &self.kind {
            EntityKind::Drone(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_package(&self) -> Option<&Package> {
        match &self.kind {
            EntityKind::Package(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_package_mut(&mut self) -> Option<&mut Package> {
        match &mut self.kind {
            EntityKind::Package(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_robot(&self) -> Option<&Robot> {
        match &self.kind {
            EntityKind::Robot(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_robot_mut(&mut self) -> Option<&mut Robot> {
        match &mut self.kind {
            EntityKind::Robot(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_recharge_drone(&self) -> Option<&RechargeDrone> {
        match &self.kind {
            EntityKind::RechargeDrone(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_poi(&self) -> Option<&Poi> {
        match &self.kind {
            EntityKind::Poi(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_poi_mut(&mut self) -> Option<&mut Poi> {
        match &mut self.kind {
            EntityKind::Poi(p) => Some(p),
            _ => None,
        }
    }

    /// What the view is told about this entity
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.core.id,
            name: self.core.name.clone(),
            entity_type: self.core.entity_type,
            position: self.core.position,
            direction: self.core.direction,
            color: self.core.color.clone(),
            charge: self
                .as_drone()
                .and_then(|d| d.battery.as_ref())
                .map(Battery::current_charge),
            details: self.core.details.to_value(),
        }
    }
}

/// Serializable view of an entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub position: Vector3,
    pub direction: Vector3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<u32>,
    pub details: Value,
}
