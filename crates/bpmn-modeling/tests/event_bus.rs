//! Integration tests: event bus dispatch order, propagation and fault routing.

use bpmn_modeling::{DEFAULT_PRIORITY, Event, EventBus, EventError};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn record(bus: &EventBus, event: &str, priority: i32, log: &Log, entry: &str) {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    bus.on(event, priority, move |_| {
        log.borrow_mut().push(entry.clone());
        Ok(None)
    });
}

// ─── Ordering ───────────────────────────────────────────────────────────

#[test]
fn listeners_run_by_descending_priority() {
    let bus = EventBus::new();
    let calls = log();
    record(&bus, "ping", 500, &calls, "500");
    record(&bus, "ping", 1000, &calls, "1000");
    record(&bus, "ping", 200, &calls, "200");

    bus.fire("ping", Value::Null).unwrap();

    assert_eq!(*calls.borrow(), vec!["1000", "500", "200"]);
}

#[test]
fn ties_keep_registration_order_across_fires() {
    let bus = EventBus::new();
    let calls = log();
    record(&bus, "ping", DEFAULT_PRIORITY, &calls, "a");
    record(&bus, "ping", 1500, &calls, "high");
    record(&bus, "ping", DEFAULT_PRIORITY, &calls, "b");

    bus.fire("ping", Value::Null).unwrap();
    bus.fire("ping", Value::Null).unwrap();

    assert_eq!(*calls.borrow(), vec!["high", "a", "b", "high", "a", "b"]);
}

#[test]
fn one_listener_for_several_events() {
    let bus = EventBus::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let c = Rc::clone(&calls);
    bus.subscribe(["shape.added", "connection.added"], move |event| {
        c.borrow_mut().push(event.kind().to_string());
        Ok(None)
    });

    bus.fire("shape.added", Value::Null).unwrap();
    bus.fire("connection.added", Value::Null).unwrap();
    bus.fire("label.added", Value::Null).unwrap();

    assert_eq!(*calls.borrow(), vec!["shape.added", "connection.added"]);
}

// ─── Propagation ────────────────────────────────────────────────────────

#[test]
fn stop_propagation_skips_lower_priorities_for_one_fire_only() {
    let bus = EventBus::new();
    let calls = log();
    let stop = Rc::new(RefCell::new(true));

    let s = Rc::clone(&stop);
    let c = Rc::clone(&calls);
    bus.on("ping", 2000, move |event| {
        c.borrow_mut().push("gate".into());
        if *s.borrow() {
            event.stop_propagation();
        }
        Ok(None)
    });
    record(&bus, "ping", 1000, &calls, "low");

    bus.fire("ping", Value::Null).unwrap();
    assert_eq!(*calls.borrow(), vec!["gate"]);

    *stop.borrow_mut() = false;
    bus.fire("ping", Value::Null).unwrap();
    assert_eq!(*calls.borrow(), vec!["gate", "gate", "low"]);
}

#[test]
fn fire_reports_false_when_default_prevented() {
    let bus = EventBus::new();
    bus.on("veto", 2000, |event| {
        event.prevent_default();
        Ok(None)
    });
    bus.on("veto", 1000, |_| Ok(Some(json!("ignored"))));

    assert_eq!(bus.fire("veto", Value::Null).unwrap(), Some(Value::Bool(false)));
}

#[test]
fn unanswered_fire_returns_none() {
    let bus = EventBus::new();
    bus.subscribe("quiet", |_| Ok(None));
    assert_eq!(bus.fire("quiet", json!({ "a": 1 })).unwrap(), None);
}

#[test]
fn caller_sees_payload_rewritten_by_listeners() {
    let bus = EventBus::new();
    bus.subscribe("hint", |event| {
        event.data["docking"] = json!({ "x": 10, "y": 20 });
        Ok(None)
    });

    let mut event = Event::new("hint", json!({}));
    bus.emit(&mut event).unwrap();
    assert_eq!(event.data, json!({ "docking": { "x": 10, "y": 20 } }));
}

// ─── Re-entrancy ────────────────────────────────────────────────────────

#[test]
fn nested_fire_from_a_listener() {
    let bus = Rc::new(EventBus::new());
    let calls = log();
    let weak = Rc::downgrade(&bus);
    let c = Rc::clone(&calls);
    bus.subscribe("outer", move |_| {
        c.borrow_mut().push("outer".into());
        if let Some(bus) = weak.upgrade() {
            bus.fire("inner", Value::Null)?;
        }
        c.borrow_mut().push("outer done".into());
        Ok(None)
    });
    record(&bus, "inner", DEFAULT_PRIORITY, &calls, "inner");

    bus.fire("outer", Value::Null).unwrap();
    assert_eq!(*calls.borrow(), vec!["outer", "inner", "outer done"]);
}

#[test]
fn removal_during_dispatch_does_not_affect_current_fire() {
    let bus = Rc::new(EventBus::new());
    let calls = log();
    let weak = Rc::downgrade(&bus);
    let c = Rc::clone(&calls);
    bus.on("ping", 2000, move |_| {
        c.borrow_mut().push("first".into());
        if let Some(bus) = weak.upgrade() {
            bus.off("ping", None);
        }
        Ok(None)
    });
    record(&bus, "ping", 1000, &calls, "second");

    bus.fire("ping", Value::Null).unwrap();
    bus.fire("ping", Value::Null).unwrap();
    assert_eq!(*calls.borrow(), vec!["first", "second"]);
}

#[test]
fn once_listener_can_be_registered_again() {
    let bus = EventBus::new();
    let calls = log();
    for _ in 0..2 {
        let c = Rc::clone(&calls);
        bus.once("tick", DEFAULT_PRIORITY, move |_| {
            c.borrow_mut().push("tick".into());
            Ok(None)
        });
        bus.fire("tick", Value::Null).unwrap();
        bus.fire("tick", Value::Null).unwrap();
    }
    assert_eq!(calls.borrow().len(), 2);
}

// ─── Errors ─────────────────────────────────────────────────────────────

#[test]
fn listener_error_reaches_the_caller() {
    let bus = EventBus::new();
    bus.subscribe("boom", |event| Err(EventError::listener(event.kind(), "kaputt")));
    bus.subscribe("error", |_| Ok(None));

    assert_eq!(
        bus.fire("boom", Value::Null),
        Err(EventError::listener("boom", "kaputt"))
    );
}

#[test]
fn error_listener_preventing_default_swallows_the_error() {
    let bus = EventBus::new();
    let calls = log();
    bus.on("boom", 2000, |event| Err(EventError::listener(event.kind(), "kaputt")));
    record(&bus, "boom", 1000, &calls, "after");

    let c = Rc::clone(&calls);
    bus.subscribe("error", move |event| {
        let message = event.get("error").and_then(Value::as_str).unwrap_or_default();
        c.borrow_mut().push(format!("handled: {message}"));
        event.prevent_default();
        Ok(None)
    });

    assert_eq!(bus.fire("boom", Value::Null).unwrap(), None);
    assert_eq!(
        *calls.borrow(),
        vec!["handled: listener for `boom` failed: kaputt", "after"]
    );
}

#[test]
fn failing_error_listener_propagates() {
    let bus = EventBus::new();
    bus.subscribe("error", |_| Err(EventError::listener("error", "double fault")));
    bus.subscribe("boom", |_| Err(EventError::listener("boom", "kaputt")));

    assert_eq!(
        bus.fire("boom", Value::Null),
        Err(EventError::listener("error", "double fault"))
    );
}
