//! The assembled modeling kernel.

use crate::bpmn_rules::BpmnRules;
use crate::change_support::ChangeSupport;
use crate::command::{CommandContext, CommandStack};
use crate::config::ModelerConfig;
use crate::error::CommandError;
use crate::event_bus::EventBus;
use crate::modeling::{Modeling, register_handlers};
use crate::rules::{RuleOutcome, RuleProvider, Rules};
use bpmn_core::{BpmnLayouter, Diagram, ElementId, LayoutHints, Layouter, ModelError, Waypoint};
use serde_json::Value;
use std::rc::Rc;

/// A diagram together with the bus, command stack, rules and layouter
/// that edit it.
pub struct Modeler {
    diagram: Diagram,
    bus: Rc<EventBus>,
    command_stack: CommandStack,
    rules: Rules,
    layouter: Rc<dyn Layouter>,
    config: ModelerConfig,
    _change_support: ChangeSupport,
}

impl Modeler {
    /// Wire a modeler around `diagram` with the BPMN layouter.
    pub fn new(diagram: Diagram, config: ModelerConfig) -> Self {
        Self::with_layouter(diagram, config, Rc::new(BpmnLayouter::new(config.layout)))
    }

    pub fn with_layouter(diagram: Diagram, config: ModelerConfig, layouter: Rc<dyn Layouter>) -> Self {
        let bus = Rc::new(EventBus::new());

        BpmnRules::new(config.resize).register(&RuleProvider::new(Rc::clone(&bus)));
        let change_support = ChangeSupport::install(&bus);

        let mut command_stack = CommandStack::new(Rc::clone(&bus));
        register_handlers(&mut command_stack, Rc::clone(&layouter));

        log::debug!(
            "modeler ready: {} elements, {} commands",
            diagram.len(),
            command_stack.get_handlers().len()
        );

        Self {
            diagram,
            rules: Rules::new(Rc::clone(&bus)),
            bus,
            command_stack,
            layouter,
            config,
            _change_support: change_support,
        }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn command_stack(&self) -> &CommandStack {
        &self.command_stack
    }

    /// For registering more handlers and interceptors.
    pub fn command_stack_mut(&mut self) -> &mut CommandStack {
        &mut self.command_stack
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// For registering more rules.
    pub fn rule_provider(&self) -> RuleProvider {
        RuleProvider::new(Rc::clone(&self.bus))
    }

    pub fn layouter(&self) -> &Rc<dyn Layouter> {
        &self.layouter
    }

    pub fn config(&self) -> &ModelerConfig {
        &self.config
    }

    pub fn modeling(&mut self) -> Modeling<'_> {
        Modeling::new(&mut self.command_stack, &mut self.diagram)
    }

    /// `connect` with this modeler's rules.
    pub fn connect(
        &mut self,
        source: ElementId,
        target: ElementId,
    ) -> Result<Option<ElementId>, CommandError> {
        Modeling::new(&mut self.command_stack, &mut self.diagram).connect(source, target, &self.rules)
    }

    pub fn allowed(&self, rule: &str, context: &Value) -> Result<RuleOutcome, CommandError> {
        Ok(self.rules.allowed(rule, context, &self.diagram)?)
    }

    pub fn execute(&mut self, command: &str, ctx: CommandContext) -> Result<(), CommandError> {
        self.command_stack.execute(command, ctx, &mut self.diagram)
    }

    pub fn can_execute(&self, command: &str, ctx: &CommandContext) -> Result<bool, CommandError> {
        self.command_stack.can_execute(command, ctx, &self.diagram)
    }

    pub fn undo(&mut self) -> Result<bool, CommandError> {
        self.command_stack.undo(&mut self.diagram)
    }

    pub fn redo(&mut self) -> Result<bool, CommandError> {
        Ok(self.command_stack.redo(&mut self.diagram)?.is_some())
    }

    /// Compute (without applying) the route of `connection`.
    pub fn preview_layout(
        &self,
        connection: ElementId,
        hints: &LayoutHints,
    ) -> Result<Vec<Waypoint>, CommandError> {
        let element = self
            .diagram
            .get(connection)
            .ok_or(ModelError::NotFound(connection))?;
        if !element.is_connection() {
            return Err(ModelError::WrongKind {
                id: connection,
                expected: "connection",
            }
            .into());
        }
        Ok(self.layouter.layout_connection(&self.diagram, element, hints)?)
    }
}

impl std::fmt::Debug for Modeler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modeler")
            .field("elements", &self.diagram.len())
            .field("bus", &self.bus)
            .field("command_stack", &self.command_stack)
            .field("config", &self.config)
            .finish()
    }
}
