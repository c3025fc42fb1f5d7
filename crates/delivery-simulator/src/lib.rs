//! # Delivery Simulator
//!
//! Tick-driven simulation of battery-powered delivery drones working a map of
//! packages, robots, points of interest and recharge stations.
//!
//! ## Features
//!
//! - Battery state machine with lookahead rerouting and idle recharge trips
//! - Opportunistic extra pickups at points of interest
//! - Recharge drones that rescue drones stranded without charge
//! - Pluggable routing and a controller boundary for the view

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod factory;
pub mod fleet;
pub mod model;
pub mod routing;
pub mod scenario;
pub mod strategy;
pub mod world;

pub use config::SimConfig;
pub use controller::{ConsoleController, Controller, RecordingController};
pub use entity::{Entity, EntityId, EntitySnapshot};
pub use error::{Result, SimError};
pub use fleet::Fleet;
pub use model::SimulationModel;
pub use routing::{CruiseRouter, Router, StraightLineRouter};
pub use scenario::{Scenario, TripQueue};
pub use strategy::Strategy;
pub use world::World;
