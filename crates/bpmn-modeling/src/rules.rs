//! Rule queries over the event bus.
//!
//! A rule is a `commandStack.<action>.canExecute` listener. [`Rules::allowed`]
//! fires that event and interprets the first answer; [`RuleProvider`]
//! registers typed rule closures.

use crate::error::EventError;
use crate::event_bus::{Event, EventBus, EventNames};
use bpmn_core::{AssociationDirection, BpmnType, Diagram, Element, ElementId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::rc::Rc;

// ─── Outcomes ─────────────────────────────────────────────────────────────

/// Connection type a `connection.*` rule allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    #[serde(rename = "type")]
    pub bpmn_type: BpmnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_direction: Option<AssociationDirection>,
}

impl ConnectionDescriptor {
    pub fn new(bpmn_type: BpmnType) -> Self {
        Self {
            bpmn_type,
            association_direction: None,
        }
    }

    pub fn association(direction: AssociationDirection) -> Self {
        Self {
            bpmn_type: BpmnType::Association,
            association_direction: Some(direction),
        }
    }
}

/// Element to be swapped for another type when a move is carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    pub old_element_id: ElementId,
    pub new_element_type: BpmnType,
}

/// Answer of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Allowed,
    Forbidden,
    /// No decision; callers fall back to their own default.
    Neutral,
    /// Allowed as a boundary attachment.
    Attach,
    Connection(ConnectionDescriptor),
    Replace(Vec<Replacement>),
}

impl RuleOutcome {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            RuleOutcome::Allowed
        } else {
            RuleOutcome::Forbidden
        }
    }

    /// Anything but `Forbidden` and `Neutral`.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, RuleOutcome::Forbidden | RuleOutcome::Neutral)
    }

    pub fn connection(&self) -> Option<ConnectionDescriptor> {
        match self {
            RuleOutcome::Connection(descriptor) => Some(*descriptor),
            _ => None,
        }
    }

    /// Wire form: `true`, `false`, `null`, `"attach"`, a connection
    /// descriptor or `{ "replacements": [...] }`.
    pub fn to_value(&self) -> Value {
        match self {
            RuleOutcome::Allowed => Value::Bool(true),
            RuleOutcome::Forbidden => Value::Bool(false),
            RuleOutcome::Neutral => Value::Null,
            RuleOutcome::Attach => json!("attach"),
            RuleOutcome::Connection(descriptor) => json!(descriptor),
            RuleOutcome::Replace(replacements) => json!({ "replacements": replacements }),
        }
    }

    /// Inverse of [`to_value`](Self::to_value). Unknown truthy answers
    /// count as allowed.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => RuleOutcome::Neutral,
            Value::Bool(allowed) => RuleOutcome::from_bool(*allowed),
            Value::String(s) if s == "attach" => RuleOutcome::Attach,
            Value::Object(map) => {
                if let Some(replacements) = map.get("replacements") {
                    if let Ok(list) = serde_json::from_value(replacements.clone()) {
                        return RuleOutcome::Replace(list);
                    }
                }
                match serde_json::from_value(value.clone()) {
                    Ok(descriptor) => RuleOutcome::Connection(descriptor),
                    Err(_) => RuleOutcome::Allowed,
                }
            }
            _ => RuleOutcome::Allowed,
        }
    }
}

// ─── Element references ───────────────────────────────────────────────────

/// An element in a rule context: the id of a diagram element, or an
/// element that is not part of the diagram yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementRef {
    Id(ElementId),
    Inline(Box<Element>),
}

impl ElementRef {
    pub fn id(&self) -> ElementId {
        match self {
            ElementRef::Id(id) => *id,
            ElementRef::Inline(element) => element.id,
        }
    }
}

impl From<ElementId> for ElementRef {
    fn from(id: ElementId) -> Self {
        ElementRef::Id(id)
    }
}

impl From<&str> for ElementRef {
    fn from(id: &str) -> Self {
        ElementRef::Id(ElementId::intern(id))
    }
}

impl From<Element> for ElementRef {
    fn from(element: Element) -> Self {
        ElementRef::Inline(Box::new(element))
    }
}

// ─── Queries ──────────────────────────────────────────────────────────────

/// Query side of the rule system.
#[derive(Debug, Clone)]
pub struct Rules {
    bus: Rc<EventBus>,
}

impl Rules {
    #[must_use]
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self { bus }
    }

    /// Ask whether `rule` is allowed for `context`. Without an answering
    /// rule the action is allowed.
    pub fn allowed(
        &self,
        rule: &str,
        context: &Value,
        diagram: &Diagram,
    ) -> Result<RuleOutcome, EventError> {
        let mut event = Event::new(
            format!("commandStack.{rule}.canExecute"),
            json!({ "command": rule, "context": context }),
        )
        .with_diagram(diagram);

        let outcome = match self.bus.emit(&mut event)? {
            None => RuleOutcome::Allowed,
            Some(answer) => RuleOutcome::from_value(&answer),
        };
        log::trace!("rule <{rule}> -> {outcome:?}");
        Ok(outcome)
    }
}

/// Registration side of the rule system.
#[derive(Debug, Clone)]
pub struct RuleProvider {
    bus: Rc<EventBus>,
}

impl RuleProvider {
    #[must_use]
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self { bus }
    }

    /// Register `rule` for `actions`. The event's context is deserialized
    /// into `C`; `None` from the rule leaves the decision to lower
    /// priority rules.
    pub fn add_rule<C, F>(&self, actions: impl Into<EventNames>, priority: i32, rule: F)
    where
        C: DeserializeOwned,
        F: Fn(&C, &Diagram) -> Option<RuleOutcome> + 'static,
    {
        let events: Vec<String> = actions
            .into()
            .iter()
            .map(|action| format!("commandStack.{action}.canExecute"))
            .collect();

        self.bus.on(events, priority, move |event| {
            let diagram = event.require_diagram()?;
            let context = event.get("context").cloned().unwrap_or(Value::Null);
            let context: C = serde_json::from_value(context).map_err(|e| {
                EventError::InvalidPayload {
                    event: event.kind().to_string(),
                    message: e.to_string(),
                }
            })?;
            Ok(rule(&context, diagram).map(|outcome| outcome.to_value()))
        });
    }
}
