//! Per-element change notifications.
//!
//! Turns every `elements.changed { elements }` into one `element.changed`
//! plus one `shape.changed`, `connection.changed`, `label.changed` or
//! `root.changed` per element, each with `{ element }`. Elements no longer
//! in the diagram are announced as `element.removed`.

use crate::error::EventError;
use crate::event_bus::{Event, EventBus, ListenerHandle};
use bpmn_core::{Element, ElementId};
use serde_json::json;
use std::rc::{Rc, Weak};

/// Priority of the `elements.changed` listener; renderers listening to the
/// per-kind events see them before lower-priority `elements.changed` listeners.
pub const CHANGE_SUPPORT_PRIORITY: i32 = 500;

#[derive(Debug)]
pub struct ChangeSupport {
    handle: ListenerHandle,
}

impl ChangeSupport {
    pub fn install(bus: &Rc<EventBus>) -> Self {
        let weak: Weak<EventBus> = Rc::downgrade(bus);
        let handle = bus.on("elements.changed", CHANGE_SUPPORT_PRIORITY, move |event| {
            match weak.upgrade() {
                Some(bus) => republish(&bus, event),
                None => Ok(None),
            }
        });
        Self { handle }
    }

    pub fn uninstall(self, bus: &EventBus) {
        bus.off("elements.changed", Some(self.handle));
    }
}

fn kind_event(element: &Element) -> &'static str {
    if element.is_root() {
        "root.changed"
    } else if element.is_connection() {
        "connection.changed"
    } else if element.is_label() {
        "label.changed"
    } else {
        "shape.changed"
    }
}

fn republish(bus: &EventBus, event: &mut Event<'_>) -> Result<Option<serde_json::Value>, EventError> {
    let diagram = event.require_diagram()?;
    let ids: Vec<ElementId> = event
        .get("elements")
        .cloned()
        .map(serde_json::from_value::<Vec<ElementId>>)
        .transpose()
        .map_err(|e| EventError::InvalidPayload {
            event: event.kind().to_string(),
            message: e.to_string(),
        })?
        .unwrap_or_default();

    for id in ids {
        let payload = json!({ "element": id });
        match diagram.get(id) {
            Some(element) => {
                bus.fire_with("element.changed", payload.clone(), diagram)?;
                bus.fire_with(kind_event(element), payload, diagram)?;
            }
            None => {
                bus.fire_with("element.removed", payload, diagram)?;
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpmn_core::{Bounds, BpmnType, Diagram};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[test]
    fn changes_are_republished_per_kind() {
        let bus = Rc::new(EventBus::new());
        let _support = ChangeSupport::install(&bus);

        let seen = Rc::new(RefCell::new(Vec::new()));
        for name in ["shape.changed", "root.changed", "element.removed"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(name, move |event| {
                let id = event.get("element").and_then(|v| v.as_str()).unwrap_or_default();
                seen.borrow_mut().push(format!("{} {id}", event.kind()));
                Ok(None)
            });
        }

        let mut diagram = Diagram::with_root(Element::root("Process_1", BpmnType::Process)).unwrap();
        diagram
            .add_shape(
                Element::shape("Task_1", BpmnType::Task, Bounds::new(0.0, 0.0, 100.0, 80.0)),
                ElementId::intern("Process_1"),
            )
            .unwrap();

        bus.fire_with(
            "elements.changed",
            json!({ "elements": ["Task_1", "Process_1", "Gone_1"] }),
            &diagram,
        )
        .unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                "shape.changed Task_1",
                "root.changed Process_1",
                "element.removed Gone_1",
            ]
        );
    }

    #[test]
    fn uninstall_stops_republishing() {
        let bus = Rc::new(EventBus::new());
        let support = ChangeSupport::install(&bus);
        support.uninstall(&bus);
        assert_eq!(bus.listener_count("elements.changed"), 0);
    }
}
