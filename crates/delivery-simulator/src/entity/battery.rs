//! # Drone Battery
//!
//! Charge bookkeeping layered over a [`Courier`]. The battery decides when
//! the courier may fly at all: it discharges while the drone is away from a
//! station, diverts to the nearest station when a leg looks infeasible or
//! the drone sits idle, charges while docked, and parks the drone in the
//! fleet's dead queue when charge runs out in the field.
//!
//! ## States
//!
//! - `Dead` - no charge, away from any station, waiting for rescue
//! - `EnRouteToStation` - flying a reroute to the nearest station
//! - `Malfunctioned` - docked at a station that is being repaired
//! - `Charging` - docked and charging
//! - `Suspended` - docked and full, waiting to be released to the courier
//! - `InService` - the courier is in control

use delivery_domain::BatteryProfile;
use tracing::{debug, info, warn};

use super::{Courier, Drone, EntityCore};
use crate::strategy::Strategy;
use crate::world::World;

/// Charge lost or gained per interval
pub const CHARGE_STEP: u32 = 2;

/// Consecutive idle ticks before an idle drone heads to a station
pub const IDLE_TICKS_BEFORE_RECHARGE: u32 = 5;

/// Status notifications fire when charge crosses a multiple of this
const STATUS_EVERY: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryState {
    Dead,
    EnRouteToStation,
    Malfunctioned,
    Charging,
    Suspended,
    InService,
}

#[derive(Debug, Clone)]
pub struct Battery {
    max_charge: u32,
    current_charge: u32,
    low_charge: u32,
    decrease_time: f64,
    charging_rate: f64,
    /// Charge/discharge accumulator
    elapsed: f64,
    malfunction_remaining: f64,
    to_station: Option<Strategy>,
    /// Whether the courier is allowed to run
    ready: bool,
    docked: bool,
    idle_ticks: u32,
    going_to_package: bool,
    going_to_final: bool,
}

impl Default for Battery {
    fn default() -> Self {
        Self::new(BatteryProfile::default())
    }
}

impl Battery {
    #[must_use]
    pub fn new(profile: BatteryProfile) -> Self {
        let profile = profile.normalized();
        Self {
            max_charge: profile.max_charge,
            current_charge: profile.current_charge,
            low_charge: profile.low_charge,
            decrease_time: profile.decrease_time,
            charging_rate: profile.charging_rate,
            elapsed: 0.0,
            malfunction_remaining: 0.0,
            to_station: None,
            ready: true,
            docked: false,
            idle_ticks: 0,
            going_to_package: false,
            going_to_final: false,
        }
    }

    #[must_use]
    pub const fn current_charge(&self) -> u32 {
        self.current_charge
    }

    #[must_use]
    pub const fn max_charge(&self) -> u32 {
        self.max_charge
    }

    #[must_use]
    pub const fn low_charge(&self) -> u32 {
        self.low_charge
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub const fn idle_ticks(&self) -> u32 {
        self.idle_ticks
    }

    #[must_use]
    pub const fn to_station(&self) -> Option<&Strategy> {
        self.to_station.as_ref()
    }

    #[must_use]
    pub const fn malfunction_remaining(&self) -> f64 {
        self.malfunction_remaining
    }

    #[must_use]
    pub fn state(&self) -> BatteryState {
        if self.to_station.is_some() {
            BatteryState::EnRouteToStation
        } else if self.docked && self.malfunction_remaining > 0.0 {
            BatteryState::Malfunctioned
        } else if self.docked && self.current_charge < self.max_charge {
            BatteryState::Charging
        } else if self.current_charge == 0 {
            BatteryState::Dead
        } else if !self.ready {
            BatteryState::Suspended
        } else {
            BatteryState::InService
        }
    }

    pub fn update(&mut self, core: &mut EntityCore, courier: &mut Courier, dt: f64, world: &mut World) {
        let id = core.id;

        if self.current_charge == 0 && !world.fleet.is_at_station(core.position) {
            if world.fleet.is_charging(id) {
                return;
            }
            if world.fleet.mark_dead(id) {
                info!(drone = %core.name, "drone stranded without charge");
            }
            world.fleet.unmark_functional(id);
            self.to_station = None;
            self.ready = false;
            self.idle_ticks = 0;
            return;
        }

        if !world.fleet.is_at_station(core.position) {
            self.discharge(core, dt, world);
        }

        if let Some(strategy) = &mut self.to_station {
            strategy.advance(core, dt);
            if world.fleet.is_at_station(core.position) {
                self.arrive(core, world);
            } else if strategy.is_completed() {
                warn!(drone = %core.name, "station gone before arrival");
                self.to_station = None;
            }
        } else if self.ready {
            courier.update(core, dt, world);
        }

        if world.fleet.is_at_station(core.position) {
            if !self.docked {
                self.docked = true;
                self.elapsed = 0.0;
                self.ready = false;
            } else if self.malfunction_remaining > 0.0 {
                self.repair(core, dt, world);
                self.idle_ticks = 0;
                return;
            } else if self.current_charge < self.max_charge {
                self.charge(core, dt, world);
                self.idle_ticks = 0;
                return;
            } else {
                world.fleet.mark_functional(id);
                self.ready = true;
            }
        } else {
            if self.docked && !self.ready && self.current_charge > 0 {
                warn!(drone = %core.name, charge = self.current_charge, "station gone while docked");
                self.ready = true;
                self.lookahead(core, &courier.drone, world);
            }
            self.docked = false;
        }

        self.track_legs(core, &courier.drone, world);
        self.track_idle(core, &courier.drone, world);
    }

    fn discharge(&mut self, core: &EntityCore, dt: f64, world: &mut World) {
        if self.current_charge == 0 {
            self.elapsed = 0.0;
            return;
        }

        self.elapsed += dt;
        while self.elapsed >= self.decrease_time && self.current_charge > 0 {
            self.elapsed -= self.decrease_time;
            let previous = self.current_charge;
            self.current_charge = self.current_charge.saturating_sub(CHARGE_STEP);

            if self.current_charge == 0 {
                self.elapsed = 0.0;
                world.notify(format!("{} has died", core.name));
            } else if (previous - 1) / STATUS_EVERY != (self.current_charge - 1) / STATUS_EVERY {
                world.notify(format!("{} now at {}% charge", core.name, self.current_charge));
            }
        }
    }

    fn charge(&mut self, core: &EntityCore, dt: f64, world: &mut World) {
        self.elapsed += dt * self.charging_rate;
        while self.elapsed >= self.decrease_time && self.current_charge < self.max_charge {
            self.elapsed -= self.decrease_time;
            self.current_charge = (self.current_charge + CHARGE_STEP).min(self.max_charge);

            if self.current_charge == self.max_charge {
                self.elapsed = 0.0;
                world.notify(format!("{} is now fully charged", core.name));
            }
        }
    }

    fn repair(&mut self, core: &EntityCore, dt: f64, world: &mut World) {
        self.malfunction_remaining -= dt;
        if self.malfunction_remaining <= 0.0 {
            self.malfunction_remaining = 0.0;
            world.notify(format!("Station charging {} has been fixed.", core.name));
        }
    }

    fn arrive(&mut self, core: &EntityCore, world: &mut World) {
        self.to_station = None;
        world.notify(format!("{} arrived at recharge station", core.name));

        if world.roll_malfunction() {
            let secs = world.config().malfunction_secs;
            self.malfunction_remaining = secs;
            world.notify(format!(
                "Station has malfunctioned attempting to recharge {}. Please wait {secs} seconds for it to be fixed.",
                core.name
            ));
        }
    }

    /// Charge needed to cover `distance` at `speed`.
    #[must_use]
    pub fn battery_needed(&self, distance: f64, speed: f64) -> f64 {
        if speed <= 0.0 {
            return 0.0;
        }
        (f64::from(CHARGE_STEP) / self.decrease_time) * (distance / speed)
    }

    /// Divert to the nearest station if the legs ahead look infeasible.
    /// Returns whether a reroute was started.
    pub fn lookahead(&mut self, core: &EntityCore, drone: &Drone, world: &mut World) -> bool {
        if world.fleet.is_at_station(core.position) || self.to_station.is_some() {
            return false;
        }

        let to_package = drone.to_package();
        let to_final = drone.to_final();
        if to_package.is_none() && to_final.is_none() {
            return false;
        }

        let package_leg = to_package.map_or(0.0, |s| s.current_path_distance(core.position));
        let final_from = to_package
            .and_then(Strategy::destination)
            .unwrap_or(core.position);
        let final_leg = to_final.map_or(0.0, |s| s.current_path_distance(final_from));

        let needed_package = self.battery_needed(package_leg, core.speed);
        let needed_total = needed_package + self.battery_needed(final_leg, core.speed);

        let current = f64::from(self.current_charge);
        let low = f64::from(self.low_charge);
        let max = f64::from(self.max_charge);

        debug!(
            drone = %core.name,
            current,
            needed_package,
            needed_total,
            "lookahead"
        );

        if needed_total + low >= max {
            if current - needed_package <= low {
                return self.head_to_station(
                    core,
                    world,
                    "does not have enough charge to get to package, so heading to recharge station",
                );
            }
            return false;
        }

        if current - needed_total <= low {
            return self.head_to_station(
                core,
                world,
                "does not have enough charge to finish strategy, so heading to recharge station",
            );
        }
        false
    }

    fn head_to_station(&mut self, core: &EntityCore, world: &mut World, reason: &str) -> bool {
        let Some(station) = world.fleet.nearest_station(core.position) else {
            debug!(drone = %core.name, "no recharge station to head to");
            return false;
        };
        self.to_station = Some(Strategy::beeline(core.position, station));
        world.notify(format!("{} {reason}", core.name));
        true
    }

    fn track_legs(&mut self, core: &EntityCore, drone: &Drone, world: &mut World) {
        let package_active = drone.to_package().is_some();
        let final_active = drone.to_final().is_some();

        if self.going_to_package && !package_active {
            self.going_to_package = false;
        }
        if self.going_to_final && !final_active {
            self.going_to_final = false;
        }

        if package_active {
            if !self.going_to_package {
                self.going_to_package = true;
                self.lookahead(core, drone, world);
            }
        } else if final_active && !self.going_to_final {
            self.going_to_final = true;
            self.lookahead(core, drone, world);
        }
    }

    fn track_idle(&mut self, core: &EntityCore, drone: &Drone, world: &mut World) {
        let idle = drone.to_package().is_none()
            && drone.to_final().is_none()
            && self.to_station.is_none()
            && !world.fleet.is_at_station(core.position);

        if !idle {
            self.idle_ticks = 0;
            return;
        }

        self.idle_ticks += 1;
        if self.idle_ticks >= IDLE_TICKS_BEFORE_RECHARGE {
            self.idle_ticks = 0;
            self.head_to_station(core, world, "is idle, so heading to recharge station");
        }
    }
}
