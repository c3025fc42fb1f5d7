//! Controller/view boundary.
//!
//! The model reports entity lifecycle and named events through
//! [`Controller`]. [`ConsoleController`] streams them as JSON lines;
//! [`RecordingController`] keeps them in memory for inspection.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::entity::EntitySnapshot;

/// Receiver for everything the model wants the view to know.
pub trait Controller {
    fn add_entity(&mut self, entity: &EntitySnapshot);
    fn update_entity(&mut self, entity: &EntitySnapshot);
    fn remove_entity(&mut self, entity: &EntitySnapshot);
    fn send_event_to_view(&mut self, event: &str, payload: &Value);
}

/// One emitted line of the console stream
#[derive(Debug, Clone, Serialize)]
pub struct EventLine<'a> {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: &'a str,
    pub payload: &'a Value,
}

/// An `AdditionalPrompt` waiting for an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub drone: String,
    pub poi: String,
}

/// Writes named events as JSON lines. Entity updates are not streamed; the
/// binary summarizes them instead.
pub struct ConsoleController<W: Write> {
    out: W,
    run_id: Uuid,
    prompts: Vec<Prompt>,
    events_written: u64,
}

impl<W: Write> ConsoleController<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            run_id: Uuid::now_v7(),
            prompts: Vec::new(),
            events_written: 0,
        }
    }

    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub const fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Prompts received since the last call
    pub fn take_prompts(&mut self) -> Vec<Prompt> {
        std::mem::take(&mut self.prompts)
    }

    fn write_line(&mut self, event: &str, payload: &Value) {
        let line = EventLine {
            run_id: self.run_id,
            timestamp: Utc::now(),
            event,
            payload,
        };
        let written = serde_json::to_string(&line)
            .map_err(std::io::Error::from)
            .and_then(|json| writeln!(self.out, "{json}"));
        match written {
            Ok(()) => self.events_written += 1,
            Err(err) => warn!(error = %err, event, "failed to write event"),
        }
    }
}

impl<W: Write> Controller for ConsoleController<W> {
    fn add_entity(&mut self, entity: &EntitySnapshot) {
        let payload = serde_json::to_value(entity).unwrap_or(Value::Null);
        self.write_line("AddEntity", &payload);
    }

    fn update_entity(&mut self, _entity: &EntitySnapshot) {}

    fn remove_entity(&mut self, entity: &EntitySnapshot) {
        let payload = serde_json::json!({ "id": entity.id, "name": entity.name });
        self.write_line("RemoveEntity", &payload);
    }

    fn send_event_to_view(&mut self, event: &str, payload: &Value) {
        if event == "AdditionalPrompt" {
            let field = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);
            if let (Some(drone), Some(poi)) = (field("name"), field("POI")) {
                self.prompts.push(Prompt { drone, poi });
            }
        }
        self.write_line(event, payload);
    }
}

/// Everything a controller saw, in order
#[derive(Debug, Clone, Default)]
pub struct RecordingController {
    pub added: Vec<EntitySnapshot>,
    pub removed: Vec<EntitySnapshot>,
    pub events: Vec<(String, Value)>,
    pub updates: usize,
    pub last_update: Option<EntitySnapshot>,
}

impl RecordingController {
    /// Payloads of every event named `event`
    #[must_use]
    pub fn events_named(&self, event: &str) -> Vec<&Value> {
        self.events
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload)
            .collect()
    }

    /// Text of every notification
    #[must_use]
    pub fn notifications(&self) -> Vec<&str> {
        self.events_named("Notification")
            .into_iter()
            .filter_map(|p| p.get("message").and_then(Value::as_str))
            .collect()
    }
}

impl Controller for RecordingController {
    fn add_entity(&mut self, entity: &EntitySnapshot) {
        self.added.push(entity.clone());
    }

    fn update_entity(&mut self, entity: &EntitySnapshot) {
        self.updates += 1;
        self.last_update = Some(entity.clone());
    }

    fn remove_entity(&mut self, entity: &EntitySnapshot) {
        self.removed.push(entity.clone());
    }

    fn send_event_to_view(&mut self, event: &str, payload: &Value) {
        self.events.push((event.to_string(), payload.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_console_writes_json_lines_and_collects_prompts() {
        let mut controller = ConsoleController::new(Vec::new());
        controller.send_event_to_view("Notification", &json!({ "message": "hi" }));
        controller.send_event_to_view("AdditionalPrompt", &json!({ "name": "D1", "POI": "Cafe" }));

        assert_eq!(controller.events_written(), 2);
        assert_eq!(
            controller.take_prompts(),
            vec![Prompt { drone: "D1".into(), poi: "Cafe".into() }]
        );
        assert!(controller.take_prompts().is_empty());

        let text = String::from_utf8(controller.out.clone()).unwrap();
        let first: Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["event"], "Notification");
        assert_eq!(first["payload"]["message"], "hi");
        assert_eq!(first["run_id"], controller.run_id().to_string());
    }
}
