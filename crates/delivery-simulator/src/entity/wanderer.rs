//! Background traffic: humans walking and helicopters flying between random
//! destinations.

use delivery_domain::{SearchStrategy, Vector3};

use super::EntityCore;
use crate::strategy::Strategy;
use crate::world::World;

/// Simulation units in one mile
pub const UNITS_PER_MILE: f64 = 1625.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WanderMode {
    /// Routed along the ground at the entity's own altitude
    Walk,
    /// Straight lines at any altitude in the map bounds
    Fly,
}

#[derive(Debug, Clone)]
pub struct Wanderer {
    mode: WanderMode,
    movement: Option<Strategy>,
    distance_travelled: f64,
    miles: u32,
}

impl Wanderer {
    #[must_use]
    pub const fn new(mode: WanderMode) -> Self {
        Self {
            mode,
            movement: None,
            distance_travelled: 0.0,
            miles: 0,
        }
    }

    pub fn update(&mut self, core: &mut EntityCore, dt: f64, world: &mut World) {
        if self.movement.as_ref().is_none_or(Strategy::is_completed) {
            self.movement = Some(self.next_leg(core, world));
        }

        let before = core.position;
        if let Some(movement) = &mut self.movement {
            movement.advance(core, dt);
        }

        if self.mode == WanderMode::Fly {
            self.distance_travelled += before.dist(&core.position);
            while self.distance_travelled >= UNITS_PER_MILE {
                self.distance_travelled -= UNITS_PER_MILE;
                self.miles += 1;
                world.notify(format!("{} has travelled {} miles", core.name, self.miles));
            }
        }
    }

    fn next_leg(&self, core: &EntityCore, world: &mut World) -> Strategy {
        let bounds = world.config().bounds;
        match self.mode {
            WanderMode::Walk => {
                let ground = core.position.y;
                let to = world.random_point(bounds.min.with_y(ground), bounds.max.with_y(ground));
                Strategy::path(world.router().route(core.position, to, SearchStrategy::Astar))
            }
            WanderMode::Fly => {
                let to = world.random_point(bounds.min, bounds.max);
                Strategy::beeline(core.position, to)
            }
        }
    }

    #[must_use]
    pub const fn miles(&self) -> u32 {
        self.miles
    }

    #[must_use]
    pub fn destination(&self) -> Option<Vector3> {
        self.movement.as_ref().and_then(Strategy::destination)
    }
}
