//! # Simulator Configuration
//!
//! Environment-based configuration with hard defaults. CLI flags layer on
//! top of this in the binary.

use std::env;

use delivery_domain::{BatteryProfile, Vector3};

use crate::error::{Result, SimError};

/// Simulator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Battery given to drones whose descriptor has none
    pub battery: BatteryProfile,

    /// Probability a station malfunctions when a drone docks
    pub malfunction_chance: f64,

    /// How long a malfunctioned station blocks charging
    pub malfunction_secs: f64,

    /// RNG seed; random when absent
    pub seed: Option<u64>,

    /// Area wandering entities pick destinations in
    pub bounds: MapBounds,

    /// Logging level
    pub log_level: String,
}

/// Axis-aligned box in simulation space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub min: Vector3,
    pub max: Vector3,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            min: Vector3::new(-1400.0, 240.0, -800.0),
            max: Vector3::new(1500.0, 600.0, 800.0),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            battery: BatteryProfile::default(),
            malfunction_chance: 0.1,
            malfunction_secs: 10.0,
            seed: None,
            bounds: MapBounds::default(),
            log_level: "info".to_string(),
        }
    }
}

impl SimConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let battery = defaults.battery;

        Self {
            battery: BatteryProfile {
                max_charge: parse_env("DRONE_MAX_CHARGE").unwrap_or(battery.max_charge),
                current_charge: parse_env("DRONE_START_CHARGE").unwrap_or(battery.current_charge),
                low_charge: parse_env("DRONE_LOW_CHARGE").unwrap_or(battery.low_charge),
                decrease_time: parse_env("DRONE_DECREASE_TIME").unwrap_or(battery.decrease_time),
                charging_rate: parse_env("DRONE_CHARGING_RATE").unwrap_or(battery.charging_rate),
            }
            .normalized(),

            malfunction_chance: parse_env("MALFUNCTION_CHANCE")
                .unwrap_or(defaults.malfunction_chance),

            malfunction_secs: parse_env("MALFUNCTION_SECS").unwrap_or(defaults.malfunction_secs),

            seed: parse_env("SIM_SEED"),

            bounds: defaults.bounds,

            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Reject values the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.malfunction_chance) {
            return Err(SimError::Config {
                key: "MALFUNCTION_CHANCE",
                value: self.malfunction_chance.to_string(),
            });
        }
        if self.malfunction_secs < 0.0 {
            return Err(SimError::Config {
                key: "MALFUNCTION_SECS",
                value: self.malfunction_secs.to_string(),
            });
        }
        if self.battery.max_charge == 0 {
            return Err(SimError::Config {
                key: "DRONE_MAX_CHARGE",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_malfunction_chance(mut self, chance: f64) -> Self {
        self.malfunction_chance = chance;
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.battery.max_charge, 100);
        assert_eq!(config.battery.low_charge, 20);
    }

    #[test]
    fn test_validate_rejects_bad_chance() {
        let config = SimConfig::default().with_malfunction_chance(1.5);
        assert!(matches!(
            config.validate(),
            Err(SimError::Config { key: "MALFUNCTION_CHANCE", .. })
        ));
    }
}
