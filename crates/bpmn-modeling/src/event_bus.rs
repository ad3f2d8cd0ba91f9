//! Synchronous, priority-ordered event bus.
//!
//! Listeners for one event run by descending priority; equal priorities run
//! in registration order. A listener may stop propagation, prevent the
//! default, or answer the event with a value (which also stops it). Every
//! dispatch iterates a snapshot of the listener list, so listeners may
//! register, remove or fire events of their own while being dispatched.

use crate::error::EventError;
use bpmn_core::Diagram;
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Priority listeners get unless they ask for another one.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Event errors are routed to listeners of this event first.
pub const ERROR_EVENT: &str = "error";

/// What a listener answers: `Some(value)` decides the event, `None` passes.
pub type ListenerResult = Result<Option<Value>, EventError>;

type Callback = dyn Fn(&mut Event<'_>) -> ListenerResult;

// ─── Events ───────────────────────────────────────────────────────────────

/// One dispatch of a named event.
///
/// `data` is both input and output: listeners may rewrite it in place for
/// listeners that run after them and for the caller of [`EventBus::emit`].
pub struct Event<'a> {
    kind: String,
    pub data: Value,
    diagram: Option<&'a Diagram>,
    propagation_stopped: bool,
    default_prevented: bool,
    return_value: Option<Value>,
}

impl<'a> Event<'a> {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            diagram: None,
            propagation_stopped: false,
            default_prevented: false,
            return_value: None,
        }
    }

    /// Give listeners read access to the diagram.
    pub fn with_diagram(mut self, diagram: &'a Diagram) -> Self {
        self.diagram = Some(diagram);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Re-dispatch the same event object under another name.
    pub(crate) fn set_kind(&mut self, kind: impl Into<String>) {
        self.kind = kind.into();
    }

    pub fn diagram(&self) -> Option<&'a Diagram> {
        self.diagram
    }

    /// The diagram, or an error naming this event.
    pub fn require_diagram(&self) -> Result<&'a Diagram, EventError> {
        self.diagram
            .ok_or_else(|| EventError::MissingDiagram(self.kind.clone()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    /// What `fire` reports for this event: `false` once the default was
    /// prevented, the deciding listener's answer otherwise.
    pub fn result(&self) -> Option<Value> {
        if self.default_prevented {
            Some(Value::Bool(false))
        } else {
            self.return_value.clone()
        }
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("data", &self.data)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("default_prevented", &self.default_prevented)
            .field("return_value", &self.return_value)
            .finish()
    }
}

// ─── Listener table ───────────────────────────────────────────────────────

/// Identifies one registration, for [`EventBus::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

#[derive(Clone)]
struct Listener {
    priority: i32,
    handle: ListenerHandle,
    once: bool,
    callback: Rc<Callback>,
}

/// One event name or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNames(Vec<String>);

impl EventNames {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for EventNames {
    fn from(name: &str) -> Self {
        EventNames(vec![name.to_string()])
    }
}

impl From<String> for EventNames {
    fn from(name: String) -> Self {
        EventNames(vec![name])
    }
}

impl From<&[&str]> for EventNames {
    fn from(names: &[&str]) -> Self {
        EventNames(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EventNames {
    fn from(names: [&str; N]) -> Self {
        EventNames(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for EventNames {
    fn from(names: Vec<String>) -> Self {
        EventNames(names)
    }
}

// ─── Bus ──────────────────────────────────────────────────────────────────

/// The bus every kernel component talks through.
pub struct EventBus {
    listeners: RefCell<HashMap<String, Vec<Listener>>>,
    next_handle: Cell<u64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        let count: usize = listeners.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("events", &listeners.len())
            .field("listeners", &format!("<{count} listeners>"))
            .finish()
    }
}

impl EventBus {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            next_handle: Cell::new(0),
        }
    }

    /// Register `callback` for every name in `events` at `priority`.
    pub fn on<F>(&self, events: impl Into<EventNames>, priority: i32, callback: F) -> ListenerHandle
    where
        F: Fn(&mut Event<'_>) -> ListenerResult + 'static,
    {
        self.add_listener(events.into(), priority, false, Rc::new(callback))
    }

    /// [`on`](Self::on) at [`DEFAULT_PRIORITY`].
    pub fn subscribe<F>(&self, events: impl Into<EventNames>, callback: F) -> ListenerHandle
    where
        F: Fn(&mut Event<'_>) -> ListenerResult + 'static,
    {
        self.on(events, DEFAULT_PRIORITY, callback)
    }

    /// Register a listener that removes itself before its first invocation.
    pub fn once<F>(&self, events: impl Into<EventNames>, priority: i32, callback: F) -> ListenerHandle
    where
        F: Fn(&mut Event<'_>) -> ListenerResult + 'static,
    {
        self.add_listener(events.into(), priority, true, Rc::new(callback))
    }

    /// Remove one registration, or every listener of the events if `handle` is `None`.
    pub fn off(&self, events: impl Into<EventNames>, handle: Option<ListenerHandle>) {
        let mut listeners = self.listeners.borrow_mut();
        for name in events.into().iter() {
            match handle {
                Some(handle) => {
                    if let Some(list) = listeners.get_mut(name) {
                        list.retain(|l| l.handle != handle);
                    }
                }
                None => {
                    listeners.remove(name);
                }
            }
        }
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    fn add_listener(
        &self,
        events: EventNames,
        priority: i32,
        once: bool,
        callback: Rc<Callback>,
    ) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);

        let mut listeners = self.listeners.borrow_mut();
        for name in events.iter() {
            let list = listeners.entry(name.to_string()).or_default();
            // after every listener of the same or higher priority
            let at = list
                .iter()
                .position(|l| l.priority < priority)
                .unwrap_or(list.len());
            list.insert(
                at,
                Listener {
                    priority,
                    handle,
                    once,
                    callback: Rc::clone(&callback),
                },
            );
        }
        handle
    }

    /// Fire `event` with `data` and return its result (see [`Event::result`]).
    pub fn fire(&self, event: &str, data: Value) -> ListenerResult {
        self.emit(&mut Event::new(event, data))
    }

    /// Fire with read access to `diagram`.
    pub fn fire_with(&self, event: &str, data: Value, diagram: &Diagram) -> ListenerResult {
        self.emit(&mut Event::new(event, data).with_diagram(diagram))
    }

    /// Dispatch a caller-owned event. The caller can inspect the event,
    /// including listener changes to `data`, afterwards.
    pub fn emit(&self, event: &mut Event<'_>) -> ListenerResult {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .get(event.kind())
            .cloned()
            .unwrap_or_default();

        for listener in snapshot {
            if event.is_propagation_stopped() {
                break;
            }
            if listener.once {
                let kind = event.kind().to_string();
                self.off(kind.as_str(), Some(listener.handle));
            }
            self.invoke(&listener, event)?;
        }

        Ok(event.result())
    }

    fn invoke(&self, listener: &Listener, event: &mut Event<'_>) -> Result<(), EventError> {
        match (listener.callback)(event) {
            Ok(Some(value)) => {
                if value == Value::Bool(false) {
                    event.prevent_default();
                }
                event.return_value = Some(value);
                event.stop_propagation();
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(error) => self.handle_error(event, error),
        }
    }

    /// Route a listener fault to `error` listeners; it is swallowed if one of
    /// them prevents the default.
    fn handle_error(&self, event: &Event<'_>, error: EventError) -> Result<(), EventError> {
        if event.kind() == ERROR_EVENT {
            return Err(error);
        }
        let mut error_event = Event::new(
            ERROR_EVENT,
            json!({ "event": event.kind(), "error": error.to_string() }),
        );
        if let Some(diagram) = event.diagram() {
            error_event = error_event.with_diagram(diagram);
        }
        if self.emit(&mut error_event)? == Some(Value::Bool(false)) {
            log::debug!("error in `{}` listener handled: {error}", event.kind());
            return Ok(());
        }
        log::error!("unhandled error in event listener for `{}`: {error}", event.kind());
        Err(error)
    }
}
