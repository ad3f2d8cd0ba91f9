//! Undoable command stack.
//!
//! Every graph mutation runs as a named command through registered
//! [`CommandHandler`]s. An execution has three phases:
//!
//! 1. **pre-execute**: interceptors and handler hooks may run nested commands
//! 2. **execute**: every handler for the id applies its change
//! 3. **post-execute**: interceptors and handler hooks may run more nested commands
//!
//! All actions recorded while one outermost command runs form an atomic group.
//! `undo` reverts a whole group newest first; `redo` replays the recorded
//! execute phase of a whole group in its original order.
//!
//! Each phase is mirrored on the [`EventBus`] as
//! `commandStack.<id>.<phase>` followed by `commandStack.<phase>`.

use crate::error::CommandError;
use crate::event_bus::{Event, EventBus, EventNames};
use bpmn_core::{Diagram, ElementId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::rc::Rc;

// ─── Context ──────────────────────────────────────────────────────────────

/// Input and scratch space of one action.
///
/// Handlers read their parameters from it and store whatever they need to
/// revert (old bounds, detached elements). The same context is handed to
/// `revert` and to every later `redo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandContext(Map<String, Value>);

impl CommandContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Insert any serializable value.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CommandError> {
        let value = serde_json::to_value(value).map_err(|e| CommandError::InvalidField {
            field: key.to_string(),
            message: e.to_string(),
        })?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    /// A required field.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, CommandError> {
        self.get_opt(key)?
            .ok_or_else(|| CommandError::MissingField(key.to_string()))
    }

    /// An optional field; `null` counts as absent.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CommandError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| CommandError::InvalidField {
                    field: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for CommandContext {
    fn from(map: Map<String, Value>) -> Self {
        CommandContext(map)
    }
}

// ─── Handlers ─────────────────────────────────────────────────────────────

/// Executes and reverts one command id.
///
/// `execute` and `revert` return the ids of the elements they changed; an
/// empty list marks the handler as not applied for that action. Hooks that
/// receive the [`CommandStack`] may execute nested commands.
pub trait CommandHandler {
    fn can_execute(&self, _ctx: &CommandContext, _diagram: &Diagram) -> bool {
        true
    }

    fn pre_execute(
        &self,
        _ctx: &mut CommandContext,
        _stack: &mut CommandStack,
        _diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        Ok(())
    }

    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError>;

    fn post_execute(
        &self,
        _ctx: &mut CommandContext,
        _stack: &mut CommandStack,
        _diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        Ok(())
    }

    fn revert(
        &self,
        ctx: &CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError>;
}

/// Cross-cutting behavior wrapped around the handlers of one or more ids.
///
/// Interceptors run before the handlers' own pre/post hooks, by descending
/// priority.
pub trait CommandInterceptor {
    fn pre_execute(
        &self,
        _command: &str,
        _ctx: &mut CommandContext,
        _stack: &mut CommandStack,
        _diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        Ok(())
    }

    fn post_execute(
        &self,
        _command: &str,
        _ctx: &mut CommandContext,
        _stack: &mut CommandStack,
        _diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        Ok(())
    }

    /// Runs after every handler of the action was reverted.
    fn reverted(
        &self,
        _command: &str,
        _ctx: &CommandContext,
        _diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        Ok(())
    }
}

struct Interception {
    commands: Option<Vec<String>>,
    priority: i32,
    interceptor: Rc<dyn CommandInterceptor>,
}

impl Interception {
    fn applies_to(&self, command: &str) -> bool {
        self.commands
            .as_ref()
            .is_none_or(|commands| commands.iter().any(|c| c == command))
    }
}

// ─── History ──────────────────────────────────────────────────────────────

/// One executed command as kept in history.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub command: String,
    pub ctx: CommandContext,
    /// Actions sharing a group are undone and redone together.
    pub group: u64,
    /// Per handler, in registration order: whether it changed anything.
    pub applied: Vec<bool>,
    /// Executed from inside another command.
    pub nested: bool,
}

/// The command stack.
pub struct CommandStack {
    bus: Rc<EventBus>,
    handlers: HashMap<String, Vec<Rc<dyn CommandHandler>>>,
    interceptors: Vec<Interception>,
    stack: Vec<ActionRecord>,
    stack_index: isize,
    /// Nesting level of the execution in flight (0 = idle).
    depth: usize,
    next_group: u64,
    current_group: u64,
    /// Stack length when the current group pushed its first action.
    group_start: Option<usize>,
    dirty: Vec<ElementId>,
}

impl std::fmt::Debug for CommandStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut commands: Vec<&String> = self.handlers.keys().collect();
        commands.sort();
        f.debug_struct("CommandStack")
            .field("commands", &commands)
            .field("interceptors", &self.interceptors.len())
            .field("stack", &self.stack)
            .field("stack_index", &self.stack_index)
            .finish()
    }
}

impl CommandStack {
    #[must_use]
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self {
            bus,
            handlers: HashMap::new(),
            interceptors: Vec::new(),
            stack: Vec::new(),
            stack_index: -1,
            depth: 0,
            next_group: 0,
            current_group: 0,
            group_start: None,
            dirty: Vec::new(),
        }
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    // ─── Registration ────────────────────────────────────────────────────

    /// Append a handler for `command`; handlers of one id run in
    /// registration order.
    pub fn register(&mut self, command: &str, handler: impl CommandHandler + 'static) {
        self.register_rc(command, Rc::new(handler));
    }

    pub fn register_rc(&mut self, command: &str, handler: Rc<dyn CommandHandler>) {
        self.handlers
            .entry(command.to_string())
            .or_default()
            .push(handler);
    }

    /// Wrap the handlers of `commands` (every command when `None`).
    pub fn intercept(
        &mut self,
        commands: Option<EventNames>,
        priority: i32,
        interceptor: impl CommandInterceptor + 'static,
    ) {
        let entry = Interception {
            commands: commands.map(|names| names.iter().map(str::to_string).collect()),
            priority,
            interceptor: Rc::new(interceptor),
        };
        let at = self
            .interceptors
            .iter()
            .position(|i| i.priority < priority)
            .unwrap_or(self.interceptors.len());
        self.interceptors.insert(at, entry);
    }

    // ─── Introspection ───────────────────────────────────────────────────

    pub fn get_stack(&self) -> &[ActionRecord] {
        &self.stack
    }

    /// Index of the last applied action, −1 when there is none.
    pub fn get_stack_index(&self) -> isize {
        self.stack_index
    }

    /// Registered command ids, sorted.
    pub fn get_handlers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn can_undo(&self) -> bool {
        self.stack_index >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.stack_index + 1 < self.stack.len() as isize
    }

    pub fn is_executing(&self) -> bool {
        self.depth > 0
    }

    /// Ask `commandStack.<id>.canExecute` listeners, then the handlers.
    pub fn can_execute(
        &self,
        command: &str,
        ctx: &CommandContext,
        diagram: &Diagram,
    ) -> Result<bool, CommandError> {
        let mut event = Event::new(
            format!("commandStack.{command}.canExecute"),
            json!({ "command": command, "context": ctx.as_value() }),
        )
        .with_diagram(diagram);

        if let Some(answer) = self.bus.emit(&mut event)? {
            return Ok(!matches!(answer, Value::Bool(false) | Value::Null));
        }

        let handlers = self.handlers_for(command);
        if handlers.is_empty() {
            return Ok(false);
        }
        Ok(handlers.iter().all(|h| h.can_execute(ctx, diagram)))
    }

    // ─── Execution ───────────────────────────────────────────────────────

    /// Execute `command`. Called from a handler or interceptor hook, the
    /// action joins the group of the command being executed.
    pub fn execute(
        &mut self,
        command: &str,
        ctx: CommandContext,
        diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        if command.is_empty() {
            return Err(CommandError::MissingCommand);
        }

        let outermost = self.depth == 0;
        if outermost {
            self.current_group = self.next_group;
            self.next_group += 1;
            self.group_start = None;
            self.dirty.clear();
        }

        self.depth += 1;
        let result = self.internal_execute(command, ctx, diagram, !outermost);
        self.depth -= 1;

        if !outermost {
            return result;
        }

        match result {
            Ok(()) => self.fire_changed(diagram, "execute"),
            Err(e) => {
                if let Some(start) = self.group_start.take() {
                    log::debug!("dropping {} action(s) of failed <{command}>", self.stack.len() - start);
                    self.stack.truncate(start);
                    self.stack_index = self.stack.len() as isize - 1;
                }
                self.dirty.clear();
                Err(e)
            }
        }
    }

    fn internal_execute(
        &mut self,
        command: &str,
        mut ctx: CommandContext,
        diagram: &mut Diagram,
        nested: bool,
    ) -> Result<(), CommandError> {
        let handlers = self.handlers_for(command);
        if handlers.is_empty() {
            log::warn!("no command handler registered for <{command}>");
        }
        let interceptors = self.interceptors_for(command);
        log::debug!("execute <{command}> (nested: {nested})");

        // pre
        self.fire_phase(command, "preExecute", &mut ctx, diagram)?;
        for interceptor in &interceptors {
            interceptor.pre_execute(command, &mut ctx, self, diagram)?;
        }
        for handler in &handlers {
            handler.pre_execute(&mut ctx, self, diagram)?;
        }
        self.fire_phase(command, "preExecuted", &mut ctx, diagram)?;

        // execute
        self.fire_phase(command, "execute", &mut ctx, diagram)?;
        let mut applied = Vec::with_capacity(handlers.len());
        for handler in &handlers {
            let changed = handler.execute(&mut ctx, diagram)?;
            applied.push(!changed.is_empty());
            self.mark_dirty(changed);
        }
        self.fire_phase(command, "executed", &mut ctx, diagram)?;

        let index = self.push_action(ActionRecord {
            command: command.to_string(),
            ctx,
            group: self.current_group,
            applied,
            nested,
        });

        // post: the recorded context is borrowed out while nested commands run
        let mut ctx = match self.stack.get_mut(index) {
            Some(record) => std::mem::take(&mut record.ctx),
            None => return Ok(()),
        };
        let result = self.post_phase(command, &interceptors, &handlers, &mut ctx, diagram);
        if let Some(record) = self.stack.get_mut(index) {
            record.ctx = ctx;
        }
        result
    }

    fn post_phase(
        &mut self,
        command: &str,
        interceptors: &[Rc<dyn CommandInterceptor>],
        handlers: &[Rc<dyn CommandHandler>],
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        self.fire_phase(command, "postExecute", ctx, diagram)?;
        for interceptor in interceptors {
            interceptor.post_execute(command, ctx, self, diagram)?;
        }
        for handler in handlers {
            handler.post_execute(ctx, self, diagram)?;
        }
        self.fire_phase(command, "postExecuted", ctx, diagram)
    }

    fn push_action(&mut self, record: ActionRecord) -> usize {
        if self.group_start.is_none() {
            // first action of the group drops the redo tail
            self.stack.truncate((self.stack_index + 1) as usize);
            self.group_start = Some(self.stack.len());
        }
        self.stack.push(record);
        self.stack_index = self.stack.len() as isize - 1;
        self.stack.len() - 1
    }

    // ─── Undo / redo ─────────────────────────────────────────────────────

    /// Revert the newest group. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, diagram: &mut Diagram) -> Result<bool, CommandError> {
        if self.depth > 0 {
            return Err(CommandError::IllegalInvocation("undo"));
        }
        let Some(group) = self.record_at(self.stack_index).map(|r| r.group) else {
            return Ok(false);
        };
        self.dirty.clear();

        while let Some(record) = self.record_at(self.stack_index).filter(|r| r.group == group) {
            let command = record.command.clone();
            let mut ctx = record.ctx.clone();
            log::debug!("undo <{command}>");

            self.fire_phase(&command, "revert", &mut ctx, diagram)?;
            for handler in self.handlers_for(&command) {
                let changed = handler.revert(&ctx, diagram)?;
                self.mark_dirty(changed);
            }
            for interceptor in self.interceptors_for(&command) {
                interceptor.reverted(&command, &ctx, diagram)?;
            }
            self.fire_phase(&command, "reverted", &mut ctx, diagram)?;

            self.stack_index -= 1;
        }

        self.fire_changed(diagram, "undo")?;
        Ok(true)
    }

    /// Replay the next group. Returns the group's outermost action, or
    /// `None` when there is nothing to redo.
    pub fn redo(&mut self, diagram: &mut Diagram) -> Result<Option<ActionRecord>, CommandError> {
        if self.depth > 0 {
            return Err(CommandError::IllegalInvocation("redo"));
        }
        let Some(group) = self.record_at(self.stack_index + 1).map(|r| r.group) else {
            return Ok(None);
        };
        self.dirty.clear();

        let mut base = None;
        while let Some(record) = self.record_at(self.stack_index + 1).filter(|r| r.group == group) {
            let command = record.command.clone();
            let mut ctx = record.ctx.clone();
            log::debug!("redo <{command}>");

            self.fire_phase(&command, "execute", &mut ctx, diagram)?;
            let handlers = self.handlers_for(&command);
            let mut applied = Vec::with_capacity(handlers.len());
            for handler in &handlers {
                let changed = handler.execute(&mut ctx, diagram)?;
                applied.push(!changed.is_empty());
                self.mark_dirty(changed);
            }
            self.fire_phase(&command, "executed", &mut ctx, diagram)?;

            self.stack_index += 1;
            if let Some(record) = self.stack.get_mut(self.stack_index as usize) {
                record.ctx = ctx;
                record.applied = applied;
                if !record.nested {
                    base = Some(record.clone());
                }
            }
        }

        self.fire_changed(diagram, "redo")?;
        Ok(base)
    }

    /// Forget all history.
    pub fn clear(&mut self) -> Result<(), CommandError> {
        if self.depth > 0 {
            return Err(CommandError::IllegalInvocation("clear"));
        }
        log::debug!("clear command stack ({} actions)", self.stack.len());
        self.stack.clear();
        self.stack_index = -1;
        self.bus
            .fire("commandStack.changed", json!({ "trigger": "clear" }))?;
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn record_at(&self, index: isize) -> Option<&ActionRecord> {
        usize::try_from(index).ok().and_then(|i| self.stack.get(i))
    }

    fn handlers_for(&self, command: &str) -> Vec<Rc<dyn CommandHandler>> {
        self.handlers.get(command).cloned().unwrap_or_default()
    }

    fn interceptors_for(&self, command: &str) -> Vec<Rc<dyn CommandInterceptor>> {
        self.interceptors
            .iter()
            .filter(|i| i.applies_to(command))
            .map(|i| Rc::clone(&i.interceptor))
            .collect()
    }

    fn mark_dirty(&mut self, changed: Vec<ElementId>) {
        for id in changed {
            if !self.dirty.contains(&id) {
                self.dirty.push(id);
            }
        }
    }

    /// `commandStack.<id>.<phase>`, then `commandStack.<phase>` unless the
    /// first stopped propagation. Listeners may rewrite `context`.
    fn fire_phase(
        &self,
        command: &str,
        phase: &str,
        ctx: &mut CommandContext,
        diagram: &Diagram,
    ) -> Result<(), CommandError> {
        let mut event = Event::new(
            format!("commandStack.{command}.{phase}"),
            json!({ "command": command, "context": ctx.as_value() }),
        )
        .with_diagram(diagram);

        self.bus.emit(&mut event)?;
        if !event.is_propagation_stopped() {
            event.set_kind(format!("commandStack.{phase}"));
            self.bus.emit(&mut event)?;
        }

        if let Some(Value::Object(map)) = event.data.get_mut("context").map(Value::take) {
            *ctx = CommandContext(map);
        }
        Ok(())
    }

    fn fire_changed(&mut self, diagram: &Diagram, trigger: &str) -> Result<(), CommandError> {
        let dirty = std::mem::take(&mut self.dirty);
        if !dirty.is_empty() {
            self.bus
                .fire_with("elements.changed", json!({ "elements": dirty }), diagram)?;
        }
        self.bus
            .fire_with("commandStack.changed", json!({ "trigger": trigger }), diagram)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpmn_core::{BpmnType, Element};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Appends its name to a shared log on execute and revert.
    struct Tracing {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl CommandHandler for Tracing {
        fn execute(
            &self,
            _ctx: &mut CommandContext,
            _diagram: &mut Diagram,
        ) -> Result<Vec<ElementId>, CommandError> {
            self.log.borrow_mut().push(format!("execute {}", self.name));
            Ok(vec![ElementId::intern("Process_1")])
        }

        fn revert(
            &self,
            _ctx: &CommandContext,
            _diagram: &mut Diagram,
        ) -> Result<Vec<ElementId>, CommandError> {
            self.log.borrow_mut().push(format!("revert {}", self.name));
            Ok(vec![ElementId::intern("Process_1")])
        }
    }

    fn setup() -> (CommandStack, Diagram, Rc<RefCell<Vec<String>>>) {
        let diagram = Diagram::with_root(Element::root("Process_1", BpmnType::Process)).unwrap();
        let stack = CommandStack::new(Rc::new(EventBus::new()));
        (stack, diagram, Rc::new(RefCell::new(Vec::new())))
    }

    #[test]
    fn handlers_run_in_registration_order_both_ways() {
        let (mut stack, mut diagram, log) = setup();
        for name in ["a", "b"] {
            stack.register("trace", Tracing { name, log: Rc::clone(&log) });
        }

        stack.execute("trace", CommandContext::new(), &mut diagram).unwrap();
        stack.undo(&mut diagram).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["execute a", "execute b", "revert a", "revert b"]
        );
        assert_eq!(stack.get_stack()[0].applied, vec![true, true]);
    }

    #[test]
    fn unknown_command_is_recorded_without_effect() {
        let (mut stack, mut diagram, _) = setup();
        stack.execute("nothing", CommandContext::new(), &mut diagram).unwrap();
        assert_eq!(stack.get_stack().len(), 1);
        assert!(stack.get_stack()[0].applied.is_empty());
    }

    #[test]
    fn empty_command_id_is_rejected() {
        let (mut stack, mut diagram, _) = setup();
        assert_eq!(
            stack.execute("", CommandContext::new(), &mut diagram),
            Err(CommandError::MissingCommand)
        );
    }

    #[test]
    fn phase_listeners_can_rewrite_the_context() {
        let (mut stack, mut diagram, log) = setup();
        stack.register("trace", Tracing { name: "a", log });
        stack.bus().subscribe("commandStack.trace.preExecute", |event| {
            event.data["context"]["touched"] = json!(true);
            Ok(None)
        });

        stack.execute("trace", CommandContext::new(), &mut diagram).unwrap();
        assert_eq!(stack.get_stack()[0].ctx.value("touched"), Some(&json!(true)));
    }

    #[test]
    fn specific_phase_listener_can_stop_the_generic_one() {
        let (mut stack, mut diagram, log) = setup();
        stack.register("trace", Tracing { name: "a", log: Rc::clone(&log) });
        stack.bus().subscribe("commandStack.trace.execute", |event| {
            event.stop_propagation();
            Ok(None)
        });
        let generic = Rc::clone(&log);
        stack.bus().subscribe("commandStack.execute", move |_| {
            generic.borrow_mut().push("generic".into());
            Ok(None)
        });

        stack.execute("trace", CommandContext::new(), &mut diagram).unwrap();
        assert_eq!(*log.borrow(), vec!["execute a"]);
    }

    #[test]
    fn can_execute_without_handler_is_false() {
        let (stack, diagram, _) = setup();
        assert!(!stack.can_execute("nothing", &CommandContext::new(), &diagram).unwrap());
    }

    #[test]
    fn context_accessors() {
        let mut ctx = CommandContext::new().with("dx", 10);
        ctx.set("name", &"Task").unwrap();
        assert_eq!(ctx.get::<f32>("dx").unwrap(), 10.0);
        assert_eq!(ctx.get::<String>("name").unwrap(), "Task");
        assert_eq!(ctx.get_opt::<f32>("dy").unwrap(), None);
        assert_eq!(
            ctx.get::<f32>("dy"),
            Err(CommandError::MissingField("dy".into()))
        );
        assert!(matches!(
            ctx.get::<f32>("name"),
            Err(CommandError::InvalidField { .. })
        ));
    }
}
