//! Builds entities from descriptors.

use delivery_domain::{EntityDetails, EntityType};

use crate::config::SimConfig;
use crate::entity::{
    Battery, Courier, DeliveryDrone, Drone, Entity, EntityCore, EntityId, EntityKind,
    MultiDelivery, Package, Poi, RechargeDrone, Robot, WanderMode, Wanderer,
};

/// Assemble the entity a descriptor names.
///
/// Drones always get the multi-delivery layer and a battery, taken from the
/// descriptor when it carries one and from `config` otherwise.
#[must_use]
pub fn build(id: EntityId, details: EntityDetails, config: &SimConfig) -> Entity {
    let kind = match details.entity_type {
        EntityType::Drone => {
            let profile = details.battery.unwrap_or(config.battery);
            EntityKind::Drone(Box::new(DeliveryDrone {
                battery: Some(Battery::new(profile)),
                courier: Courier {
                    multi_delivery: Some(MultiDelivery::default()),
                    drone: Drone::default(),
                },
            }))
        }
        EntityType::Package => EntityKind::Package(Package::new(&details.colors)),
        EntityType::Robot => EntityKind::Robot(Robot::default()),
        EntityType::Human => EntityKind::Human(Wanderer::new(WanderMode::Walk)),
        EntityType::Helicopter => EntityKind::Helicopter(Wanderer::new(WanderMode::Fly)),
        EntityType::RechargeStation => EntityKind::RechargeStation,
        EntityType::RechargeDrone => EntityKind::RechargeDrone(RechargeDrone::default()),
        EntityType::Poi => EntityKind::Poi(Poi::default()),
    };

    let mut core = EntityCore::from_details(id, details);
    if let EntityKind::Package(package) = &kind {
        if let Some(tint) = package.tint() {
            core.color = Some(tint.to_css());
        }
    }
    Entity::new(core, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_domain::{BatteryProfile, PackageColor, Vector3};

    #[test]
    fn test_drone_gets_both_layers() {
        let details = EntityDetails::new("D", EntityType::Drone, Vector3::ZERO);
        let entity = build(1, details, &SimConfig::default());
        let drone = entity.as_drone().unwrap();

        assert!(drone.battery.is_some());
        assert!(drone.courier.multi_delivery.is_some());
        assert_eq!(entity.snapshot().charge, Some(100));
    }

    #[test]
    fn test_descriptor_battery_overrides_config() {
        let profile = BatteryProfile {
            current_charge: 40,
            ..BatteryProfile::default()
        };
        let details = EntityDetails::new("D", EntityType::Drone, Vector3::ZERO).with_battery(profile);
        let entity = build(1, details, &SimConfig::default());
        assert_eq!(entity.snapshot().charge, Some(40));
    }

    #[test]
    fn test_package_color_layers() {
        let mut details = EntityDetails::new("P", EntityType::Package, Vector3::ZERO);
        details.colors = vec![PackageColor::Green];
        let entity = build(2, details, &SimConfig::default());
        assert_eq!(entity.core.color.as_deref(), Some("hsl(120, 100%, 50%)"));
    }
}
