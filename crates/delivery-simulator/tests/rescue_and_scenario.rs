//! Whole-model runs: rescue round trips, dispatch order and the bundled
//! campus scenario.

use std::collections::HashMap;

use delivery_domain::Vector3;
use delivery_simulator::entity::{BatteryState, Entity};
use delivery_simulator::{EntityId, RecordingController, Scenario, SimConfig, SimulationModel};
use serde_json::{Value, json};

type Model = SimulationModel<RecordingController>;

fn model(seed: u64) -> Model {
    let config = SimConfig::default()
        .with_seed(seed)
        .with_malfunction_chance(0.0);
    SimulationModel::new(RecordingController::default(), config)
}

fn spawn(model: &mut Model, descriptor: Value) -> EntityId {
    model.create_entity(&descriptor).unwrap()
}

fn dead_drone(model: &mut Model, name: &str, x: f64) -> EntityId {
    spawn(
        model,
        json!({
            "name": name,
            "type": "drone",
            "position": [x, 270.0, 0.0],
            "battery": { "current_charge": 0 }
        }),
    )
}

fn rescuer(model: &Model, id: EntityId) -> &delivery_simulator::entity::RechargeDrone {
    model.entity(id).and_then(Entity::as_recharge_drone).unwrap()
}

#[test]
fn test_rescue_round_trip() {
    let mut model = model(1);
    spawn(&mut model, json!({ "name": "Bot", "type": "robot", "position": [2000.0, 270.0, 0.0] }));
    spawn(&mut model, json!({ "name": "Bot_package", "type": "package", "position": [0.0, 270.0, 0.0] }));
    let drone = spawn(
        &mut model,
        json!({
            "name": "Drone",
            "type": "drone",
            "position": [0.0, 270.0, 0.0],
            "battery": {
                "max_charge": 10,
                "current_charge": 2,
                "low_charge": 1,
                "decrease_time": 4.0,
                "charging_rate": 2.0
            }
        }),
    );
    let rescue = spawn(
        &mut model,
        json!({ "name": "Rescue", "type": "recharge_drone", "position": [0.0, 270.0, -60.0] }),
    );
    model.schedule_trip(&json!({ "name": "Bot", "search": "beeline" }));

    let mut saw_marker = false;
    let mut finished = false;
    for _ in 0..2000 {
        model.update(0.5);

        let charge = model.entity(drone).unwrap().snapshot().charge.unwrap();
        assert!(charge <= 10);

        if rescuer(&model, rescue).station_marker().is_some() {
            saw_marker = true;
            assert!(model.fleet().is_charging(drone));
            assert!(!model.fleet().is_dead(drone));
        }
        if saw_marker && rescuer(&model, rescue).is_available() {
            finished = true;
            break;
        }
    }

    assert!(finished, "rescue never completed");
    assert!(model.recharge_stations().is_empty());
    assert!(model.fleet().is_functional(drone));
    assert!(!model.fleet().is_charging(drone));

    let notes = model.controller().notifications();
    assert!(notes.contains(&"Drone has died"));
    assert!(notes.contains(&"Rescue heading to: Drone"));
    assert!(notes.contains(&"Drone is now fully charged"));
}

#[test]
fn test_dispatch_is_fifo() {
    let mut model = model(2);
    let first = dead_drone(&mut model, "D1", 500.0);
    let second = dead_drone(&mut model, "D2", -500.0);
    let rescue = spawn(
        &mut model,
        json!({ "name": "Rescue", "type": "recharge_drone", "position": [0.0, 270.0, 0.0] }),
    );

    model.update(0.1);

    assert_eq!(rescuer(&model, rescue).rescuing(), Some(first));
    assert_eq!(model.fleet().dead_drones().front(), Some(&second));
}

#[test]
fn test_rescuers_never_share_a_drone() {
    let mut model = model(3);
    let target = dead_drone(&mut model, "D1", 500.0);
    let a = spawn(
        &mut model,
        json!({ "name": "R1", "type": "recharge_drone", "position": [0.0, 270.0, 0.0] }),
    );
    let b = spawn(
        &mut model,
        json!({ "name": "R2", "type": "recharge_drone", "position": [0.0, 270.0, 10.0] }),
    );

    for _ in 0..5 {
        model.update(0.1);
    }

    assert_eq!(rescuer(&model, a).rescuing(), Some(target));
    assert!(rescuer(&model, b).rescuing().is_none());
    assert!(rescuer(&model, b).is_available());
    assert_eq!(model.fleet().charging_drones(), &[target]);
}

fn battery_state(model: &Model, id: EntityId) -> (BatteryState, u32) {
    let battery = model
        .entity(id)
        .and_then(Entity::as_drone)
        .and_then(|d| d.battery.as_ref())
        .unwrap();
    (battery.state(), battery.current_charge())
}

#[test]
fn test_drone_leaves_when_its_station_is_removed() {
    let mut model = model(5);
    let near = Vector3::new(-60.0, 270.0, 0.0);
    let station = spawn(&mut model, json!({ "name": "Near", "type": "recharge_station", "position": [-60.0, 270.0, 0.0] }));
    spawn(&mut model, json!({ "name": "Far", "type": "recharge_station", "position": [-1000.0, 270.0, 0.0] }));
    spawn(&mut model, json!({ "name": "Bot", "type": "robot", "position": [1500.0, 270.0, 0.0] }));
    spawn(&mut model, json!({ "name": "Bot_package", "type": "package", "position": [200.0, 270.0, 0.0] }));
    let drone = spawn(
        &mut model,
        json!({
            "name": "Drone",
            "type": "drone",
            "position": [0.0, 270.0, 0.0],
            "speed": 30.0,
            "battery": { "current_charge": 40 }
        }),
    );
    model.schedule_trip(&json!({ "name": "Bot", "search": "beeline" }));

    let mut charging = false;
    for _ in 0..100 {
        model.update(0.5);
        let (state, charge) = battery_state(&model, drone);
        if state == BatteryState::Charging && charge >= 46 {
            charging = true;
            break;
        }
    }
    assert!(charging, "drone never charged at the near station");

    model.remove_entity(station);
    for _ in 0..120 {
        model.update(0.5);
    }

    let (state, charge) = battery_state(&model, drone);
    assert!(charge > 0);
    assert_ne!(state, BatteryState::Suspended);
    let position = model.entity(drone).unwrap().core.position;
    assert!(position.dist(&near) > 100.0, "drone still at {position}");
}

#[test]
fn test_campus_scenario_runs() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../scenarios/campus.json");
    let scenario = Scenario::load(path).unwrap();
    let mut model = model(4);
    let created = scenario.populate(&mut model);
    assert_eq!(created.len(), scenario.entities.len());

    let mut trips = scenario.trip_queue();
    let mut last_charge: HashMap<EntityId, u32> = HashMap::new();
    let mut clock = 0.0;

    for _ in 0..3000 {
        for trip in trips.due(clock) {
            model.schedule_trip(&trip);
        }
        model.update(0.1);
        clock += 0.1;

        for entity in model.entities().filter(|e| e.as_drone().is_some()) {
            let charge = entity.snapshot().charge.unwrap();
            assert!(charge <= 100);
            if let Some(previous) = last_charge.insert(entity.id(), charge) {
                assert!(previous.abs_diff(charge) <= 2, "{} jumped {previous} -> {charge}", entity.name());
            }
        }
    }

    assert!(trips.is_empty());
    assert_eq!(model.controller().events_named("DeliveryScheduled").len(), 3);
    let delivered = model
        .entities()
        .filter_map(Entity::as_package)
        .filter(|p| p.is_delivered())
        .count();
    assert!(delivered >= 1);
}
