//! # Drone Delivery Simulation - Domain Model
//!
//! Value objects, enums, creation descriptors and view event names shared by
//! the simulator core and whatever controller sits in front of it. These
//! types are the single source of truth for the wire shape of entities.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Point or vector in simulation space. `y` is altitude.
///
/// Serialized as a plain `[x, y, z]` array, which is how descriptors and the
/// view describe positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    #[must_use]
    pub fn unit(&self) -> Self {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return Self::ZERO;
        }
        *self / magnitude
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn dist(&self, other: &Self) -> f64 {
        (*self - *other).magnitude()
    }

    /// Copy of this vector with the altitude replaced.
    #[must_use]
    pub const fn with_y(&self, y: f64) -> Self {
        Self::new(self.x, y, self.z)
    }

    /// Build from a JSON array of three numbers.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidVector`] if the value is not an array of
    /// exactly three numbers.
    pub fn from_json(value: &Value) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidVector(value.to_string());
        let items = value.as_array().ok_or_else(invalid)?;
        if items.len() != 3 {
            return Err(invalid());
        }
        let mut out = [0.0; 3];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.as_f64().ok_or_else(invalid)?;
        }
        Ok(Self::from(out))
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vector3> for [f64; 3] {
    fn from(v: Vector3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vector3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Index<usize> for Vector3 {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vector3 index out of range: {i}"),
        }
    }
}

impl IndexMut<usize> for Vector3 {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vector3 index out of range: {i}"),
        }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}, {:.2}]", self.x, self.y, self.z)
    }
}

/// HSL tint applied to a package by a color layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub hue: f64,
    pub saturation: f64,
    pub light: f64,
}

impl Tint {
    #[must_use]
    pub const fn new(hue: f64, saturation: f64, light: f64) -> Self {
        Self {
            hue,
            saturation,
            light,
        }
    }

    /// Component-wise average with another tint.
    #[must_use]
    pub fn mix(&self, other: &Self) -> Self {
        Self::new(
            (self.hue + other.hue) / 2.0,
            (self.saturation + other.saturation) / 2.0,
            (self.light + other.light) / 2.0,
        )
    }

    /// CSS color string understood by the view
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "hsl({:.0}, {:.0}%, {:.0}%)",
            self.hue, self.saturation, self.light
        )
    }
}

// =============================================================================
// ENUMS
// =============================================================================

/// Entity kinds recognized by the entity factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "drone")]
    Drone,
    #[serde(rename = "package")]
    Package,
    #[serde(rename = "robot")]
    Robot,
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "helicopter")]
    Helicopter,
    #[serde(rename = "recharge_station")]
    RechargeStation,
    #[serde(rename = "recharge_drone")]
    RechargeDrone,
    #[serde(rename = "POI")]
    Poi,
}

impl EntityType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Drone => "drone",
            Self::Package => "package",
            Self::Robot => "robot",
            Self::Human => "human",
            Self::Helicopter => "helicopter",
            Self::RechargeStation => "recharge_station",
            Self::RechargeDrone => "recharge_drone",
            Self::Poi => "POI",
        }
    }

    /// Default travel speed for entities of this kind
    pub const fn default_speed(&self) -> f64 {
        match self {
            Self::Drone | Self::RechargeDrone => 30.0,
            Self::Helicopter => 40.0,
            Self::Human | Self::Robot => 10.0,
            Self::Package | Self::RechargeStation | Self::Poi => 0.0,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route search requested for the final leg of a delivery.
///
/// Anything the view sends that is not a known graph search falls back to a
/// straight beeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    #[default]
    Beeline,
    Astar,
    Dfs,
    Bfs,
    Dijkstra,
}

impl SearchStrategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beeline => "beeline",
            Self::Astar => "astar",
            Self::Dfs => "dfs",
            Self::Bfs => "bfs",
            Self::Dijkstra => "dijkstra",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "astar" => Self::Astar,
            "dfs" => Self::Dfs,
            "bfs" => Self::Bfs,
            "dijkstra" => Self::Dijkstra,
            _ => Self::Beeline,
        }
    }
}

/// Named package colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageColor {
    Red,
    Green,
    Blue,
}

impl PackageColor {
    pub const fn tint(&self) -> Tint {
        match self {
            Self::Red => Tint::new(0.0, 100.0, 50.0),
            Self::Green => Tint::new(120.0, 100.0, 50.0),
            Self::Blue => Tint::new(240.0, 100.0, 50.0),
        }
    }
}

/// Events the core pushes to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewEvent {
    Notification,
    DeliveryScheduled,
    AdditionalPrompt,
}

impl ViewEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "Notification",
            Self::DeliveryScheduled => "DeliveryScheduled",
            Self::AdditionalPrompt => "AdditionalPrompt",
        }
    }
}

impl fmt::Display for ViewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// Battery parameters for a drone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryProfile {
    pub max_charge: u32,
    pub current_charge: u32,
    pub low_charge: u32,
    /// Seconds of flight per 2 units of charge
    pub decrease_time: f64,
    /// How many times faster the accumulator runs while docked
    pub charging_rate: f64,
}

impl Default for BatteryProfile {
    fn default() -> Self {
        Self {
            max_charge: 100,
            current_charge: 100,
            low_charge: 20,
            decrease_time: 4.0,
            charging_rate: 2.0,
        }
    }
}

impl BatteryProfile {
    /// Clamp the starting charge into `[0, max_charge]`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.current_charge = self.current_charge.min(self.max_charge);
        self.low_charge = self.low_charge.min(self.max_charge);
        if self.decrease_time <= 0.0 {
            self.decrease_time = Self::default().decrease_time;
        }
        if self.charging_rate <= 0.0 {
            self.charging_rate = Self::default().charging_rate;
        }
        self
    }
}

/// Structured descriptor an entity is created from.
///
/// Only `name`, `type` and `position` are required. Everything else that
/// arrives is kept in `extra` so it can be echoed back to the view and copied
/// onto derived entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDetails {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub position: Vector3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Vector3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<BatteryProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<PackageColor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityDetails {
    #[must_use]
    pub fn new(name: impl Into<String>, entity_type: EntityType, position: Vector3) -> Self {
        Self {
            name: name.into(),
            entity_type,
            position,
            direction: None,
            speed: None,
            color: None,
            battery: None,
            colors: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Parse a raw descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] when `name`, `type` or `position`
    /// are absent, [`DomainError::UnknownEntityType`] for an unrecognized
    /// `type`, and [`DomainError::InvalidDescriptor`] for anything else that
    /// does not deserialize.
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        let object = value
            .as_object()
            .ok_or_else(|| DomainError::InvalidDescriptor("descriptor is not an object".into()))?;

        for field in ["name", "type", "position"] {
            if !object.contains_key(field) {
                return Err(DomainError::MissingField(field));
            }
        }

        let type_name = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::InvalidDescriptor("type is not a string".into()))?;
        serde_json::from_value::<EntityType>(Value::String(type_name.to_string()))
            .map_err(|_| DomainError::UnknownEntityType(type_name.to_string()))?;

        Vector3::from_json(&object["position"])?;

        Ok(serde_json::from_value(value.clone())?)
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    #[must_use]
    pub fn with_battery(mut self, battery: BatteryProfile) -> Self {
        self.battery = Some(battery);
        self
    }

    /// Descriptor as JSON, for echoing to the view
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Request to deliver a package to the robot that asked for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    /// Name of the receiving robot; its package is named `<name>_package`
    pub name: String,
    #[serde(default)]
    pub start: Option<Vector3>,
    #[serde(default)]
    pub end: Option<Vector3>,
    #[serde(default)]
    pub search: String,
}

impl TripRequest {
    #[must_use]
    pub fn package_name(&self) -> String {
        format!("{}_package", self.name)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Descriptor is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDescriptor(err.to_string())
    }
}
