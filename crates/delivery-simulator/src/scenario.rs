//! JSON scenario files: the entities to create and the trips to schedule.

use std::collections::VecDeque;
use std::path::Path;

use delivery_domain::EntityDetails;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::controller::Controller;
use crate::entity::EntityId;
use crate::error::{Result, SimError};
use crate::model::SimulationModel;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub entities: Vec<Value>,
    #[serde(default)]
    pub trips: Vec<TimedTrip>,
    /// Accept every additional-delivery prompt
    #[serde(default)]
    pub auto_accept: bool,
}

/// Trip request released once the simulation clock reaches `at`
#[derive(Debug, Clone, Deserialize)]
pub struct TimedTrip {
    #[serde(default)]
    pub at: f64,
    #[serde(flatten)]
    pub request: Map<String, Value>,
}

impl Scenario {
    /// Read and validate a scenario file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not a scenario, or names an
    /// entity that cannot be created.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ScenarioIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse and validate scenario JSON.
    ///
    /// # Errors
    ///
    /// See [`Scenario::load`].
    pub fn parse(text: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        for (index, descriptor) in self.entities.iter().enumerate() {
            EntityDetails::from_value(descriptor)
                .map_err(|source| SimError::ScenarioEntity { index, source })?;
        }
        Ok(())
    }

    /// Create every entity in file order.
    pub fn populate<C: Controller>(&self, model: &mut SimulationModel<C>) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter_map(|descriptor| model.create_entity(descriptor))
            .collect()
    }

    #[must_use]
    pub fn trip_queue(&self) -> TripQueue {
        TripQueue::new(self.trips.clone())
    }
}

/// Trips ordered by release time
#[derive(Debug, Clone, Default)]
pub struct TripQueue {
    trips: VecDeque<TimedTrip>,
}

impl TripQueue {
    #[must_use]
    pub fn new(mut trips: Vec<TimedTrip>) -> Self {
        trips.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            trips: trips.into(),
        }
    }

    /// Pop every trip due by `clock` seconds.
    pub fn due(&mut self, clock: f64) -> Vec<Value> {
        let mut due = Vec::new();
        while self.trips.front().is_some_and(|t| t.at <= clock) {
            if let Some(trip) = self.trips.pop_front() {
                due.push(Value::Object(trip.request));
            }
        }
        due
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trips.len()
    }
}
