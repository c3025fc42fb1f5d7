//! Points of interest that offer passing drones an extra package.

use std::collections::BTreeMap;

use delivery_domain::ViewEvent;
use serde_json::json;

use super::multi_delivery::POI_RANGE;
use super::{EntityCore, EntityId};
use crate::world::World;

/// Per-drone visit state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Visit {
    in_range: bool,
    prompted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Poi {
    subscribers: BTreeMap<EntityId, Visit>,
}

impl Poi {
    pub fn subscribe(&mut self, drone: EntityId) {
        self.subscribers.entry(drone).or_default();
    }

    #[must_use]
    pub fn is_subscribed(&self, drone: EntityId) -> bool {
        self.subscribers.contains_key(&drone)
    }

    /// Prompt each subscribed drone at most once per visit.
    pub fn update(&mut self, core: &EntityCore, world: &mut World) {
        self.subscribers.retain(|id, _| world.entity(*id).is_some());

        let mut prompts = Vec::new();
        for (&id, visit) in &mut self.subscribers {
            let Some(entity) = world.entity(id) else {
                continue;
            };
            let Some(drone) = entity.as_drone() else {
                continue;
            };

            if entity.core.position.dist(&core.position) >= POI_RANGE {
                *visit = Visit::default();
                continue;
            }
            if !visit.in_range {
                visit.in_range = true;
                visit.prompted = false;
            }

            if !visit.prompted && drone.courier.can_take_additional() {
                visit.prompted = true;
                prompts.push(entity.core.name.clone());
            }
        }

        for drone in prompts {
            world.send_event(
                ViewEvent::AdditionalPrompt,
                json!({ "name": drone, "POI": core.name }),
            );
            world.notify(format!("{drone} is near {}", core.name));
        }
    }
}
