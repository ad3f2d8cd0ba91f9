//! Modeling commands and the [`Modeling`] facade.
//!
//! Every handler keeps what it needs to revert in the command context, so
//! undo and redo never depend on anything but the context and the diagram.
//! Composite edits are built from nested commands: deleting a shape deletes
//! its connections, attachers, labels and children first; moving or
//! resizing a shape re-lays-out the connections touching it, and so does
//! reconnecting a connection.

use crate::command::{CommandContext, CommandHandler, CommandStack};
use crate::error::CommandError;
use crate::rules::{ElementRef, RuleOutcome, Rules};
use bpmn_core::{
    AssociationDirection, Bounds, BpmnType, DetachedElement, Diagram, Element, ElementId,
    ElementKind, LayoutHints, Layouter, ModelError, Point, Properties, Waypoint,
};
use serde_json::{Value, json};
use std::rc::Rc;

/// Register every modeling command on `stack`.
pub fn register_handlers(stack: &mut CommandStack, layouter: Rc<dyn Layouter>) {
    stack.register("shape.create", CreateShapeHandler);
    stack.register("shape.delete", DeleteShapeHandler);
    stack.register("shape.move", MoveShapeHandler);
    stack.register("shape.resize", ResizeShapeHandler);
    stack.register(
        "connection.create",
        CreateConnectionHandler {
            layouter: Rc::clone(&layouter),
        },
    );
    stack.register("connection.delete", DeleteConnectionHandler);
    stack.register("connection.reconnect", ReconnectConnectionHandler);
    stack.register("connection.layout", LayoutConnectionHandler { layouter });
    stack.register("element.updateProperties", UpdatePropertiesHandler);
}

/// The point at which a connection end docks, ignoring any cropping.
fn docking(waypoint: Option<&Waypoint>) -> Option<Point> {
    waypoint.map(Waypoint::docking)
}

/// `point`, relative to the center of `old`, scaled into `new`.
fn scaled_anchor(point: Point, old: Bounds, new: Bounds) -> Point {
    let scale = |extent_new: f32, extent_old: f32| {
        if extent_old == 0.0 {
            1.0
        } else {
            extent_new / extent_old
        }
    };
    let (old_mid, new_mid) = (old.mid(), new.mid());
    Point::new(
        new_mid.x + (point.x - old_mid.x) * scale(new.width, old.width),
        new_mid.y + (point.y - old_mid.y) * scale(new.height, old.height),
    )
    .round()
}

/// Re-lay-out every connection touching `shape`, moving its docking on the
/// shape's side with `anchor`.
fn layout_incident_connections(
    stack: &mut CommandStack,
    diagram: &mut Diagram,
    shape: ElementId,
    anchor: impl Fn(Point) -> Point,
) -> Result<(), CommandError> {
    let mut connections = diagram.incoming(shape);
    for outgoing in diagram.outgoing(shape) {
        if !connections.contains(&outgoing) {
            connections.push(outgoing);
        }
    }

    for connection in connections {
        let Some(waypoints) = diagram.waypoints(connection) else {
            continue;
        };
        let mut hints = LayoutHints::default();
        if diagram.source(connection) == Some(shape) {
            hints.connection_start = docking(waypoints.first()).map(&anchor);
        }
        if diagram.target(connection) == Some(shape) {
            hints.connection_end = docking(waypoints.last()).map(&anchor);
        }
        let mut ctx = CommandContext::new().with("connection", json!(connection));
        ctx.set("hints", &hints)?;
        stack.execute("connection.layout", ctx, diagram)?;
    }
    Ok(())
}

// ─── Shapes ───────────────────────────────────────────────────────────────

/// `shape.create { shape, parent, position?, parentIndex?, host? }`, with
/// the shape centered on `position`.
struct CreateShapeHandler;

impl CommandHandler for CreateShapeHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let mut shape: Element = ctx.get("shape")?;
        let parent: ElementId = ctx.get("parent")?;
        let index: Option<usize> = ctx.get_opt("parentIndex")?;
        let host: Option<ElementId> = ctx.get_opt("host")?;

        let Some(bounds) = shape.bounds() else {
            return Err(ModelError::WrongKind {
                id: shape.id,
                expected: "shape",
            }
            .into());
        };
        if let Some(position) = ctx.get_opt::<Point>("position")? {
            let centered = Bounds::new(
                position.x - bounds.width / 2.0,
                position.y - bounds.height / 2.0,
                bounds.width,
                bounds.height,
            );
            shape.kind = ElementKind::Shape { bounds: centered };
        }

        let id = shape.id;
        diagram.add_child(shape, parent, index)?;
        if let Some(host) = host {
            diagram.set_host(id, Some(host))?;
        }
        Ok(vec![id, parent])
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let shape: Element = ctx.get("shape")?;
        let detached = diagram.detach(shape.id)?;
        Ok(detached.parent.into_iter().chain([shape.id]).collect())
    }
}

/// `shape.delete { shape }`: everything depending on the shape is deleted
/// by nested commands first.
struct DeleteShapeHandler;

impl CommandHandler for DeleteShapeHandler {
    fn pre_execute(
        &self,
        ctx: &mut CommandContext,
        stack: &mut CommandStack,
        diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        let shape: ElementId = ctx.get("shape")?;

        let mut connections = diagram.incoming(shape);
        connections.extend(diagram.outgoing(shape));
        for connection in connections {
            if diagram.contains(connection) {
                remove_element(stack, diagram, connection)?;
            }
        }
        for dependent in diagram
            .attachers(shape)
            .into_iter()
            .chain(diagram.labels(shape))
            .chain(diagram.children(shape))
        {
            if diagram.contains(dependent) {
                remove_element(stack, diagram, dependent)?;
            }
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let shape: ElementId = ctx.get("shape")?;
        let detached = diagram.detach(shape)?;
        let changed = detached.parent.into_iter().chain([shape]).collect();
        ctx.set("detached", &detached)?;
        Ok(changed)
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let detached: DetachedElement = ctx.get("detached")?;
        let changed = detached.parent.into_iter().chain([detached.element.id]).collect();
        diagram.restore(detached)?;
        Ok(changed)
    }
}

/// Delete a shape, label or connection by a nested command of the right kind.
fn remove_element(
    stack: &mut CommandStack,
    diagram: &mut Diagram,
    id: ElementId,
) -> Result<(), CommandError> {
    let is_connection = diagram.element(id)?.is_connection();
    if is_connection {
        stack.execute(
            "connection.delete",
            CommandContext::new().with("connection", json!(id)),
            diagram,
        )
    } else {
        stack.execute(
            "shape.delete",
            CommandContext::new().with("shape", json!(id)),
            diagram,
        )
    }
}

/// `shape.move { shape, delta, newParent?, newParentIndex?, newHost? }`.
///
/// `newHost` attaches the shape (or detaches it when `null`); without the
/// key the attachment is kept. Children, attachers and labels move along.
struct MoveShapeHandler;

impl CommandHandler for MoveShapeHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let shape: ElementId = ctx.get("shape")?;
        let delta: Point = ctx.get("delta")?;
        let mut changed = vec![shape];

        let old_bounds = diagram
            .bounds(shape)
            .ok_or(ModelError::WrongKind { id: shape, expected: "shape" })?;
        diagram.set_bounds(shape, old_bounds.translate(delta.x, delta.y))?;
        ctx.set("oldBounds", &old_bounds)?;

        if let Some(new_parent) = ctx.get_opt::<ElementId>("newParent")? {
            let index: Option<usize> = ctx.get_opt("newParentIndex")?;
            let (old_parent, old_index) = diagram.set_parent(shape, new_parent, index)?;
            ctx.set("oldParent", &old_parent)?;
            ctx.set("oldParentIndex", &old_index)?;
            changed.extend(old_parent);
            changed.push(new_parent);
        }

        if ctx.contains("newHost") {
            let new_host: Option<ElementId> = ctx.get_opt("newHost")?;
            let old_host = diagram.set_host(shape, new_host)?;
            ctx.set("oldHost", &old_host)?;
        }

        Ok(changed)
    }

    fn post_execute(
        &self,
        ctx: &mut CommandContext,
        stack: &mut CommandStack,
        diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        let shape: ElementId = ctx.get("shape")?;
        let delta: Point = ctx.get("delta")?;

        let along: Vec<ElementId> = diagram
            .children(shape)
            .into_iter()
            .chain(diagram.attachers(shape))
            .chain(diagram.labels(shape))
            .filter(|id| diagram.get(*id).is_some_and(|e| !e.is_connection()))
            .collect();
        for dependent in along {
            stack.execute(
                "shape.move",
                CommandContext::new()
                    .with("shape", json!(dependent))
                    .with("delta", json!(delta)),
                diagram,
            )?;
        }

        layout_incident_connections(stack, diagram, shape, |p| {
            Point::new(p.x + delta.x, p.y + delta.y)
        })
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let shape: ElementId = ctx.get("shape")?;
        let mut changed = vec![shape];

        if ctx.contains("oldHost") {
            let old_host: Option<ElementId> = ctx.get_opt("oldHost")?;
            diagram.set_host(shape, old_host)?;
        }
        if let Some(old_parent) = ctx.get_opt::<ElementId>("oldParent")? {
            let index: usize = ctx.get("oldParentIndex")?;
            let (new_parent, _) = diagram.set_parent(shape, old_parent, Some(index))?;
            changed.extend(new_parent);
            changed.push(old_parent);
        }
        diagram.set_bounds(shape, ctx.get("oldBounds")?)?;
        Ok(changed)
    }
}

/// `shape.resize { shape, newBounds }`.
struct ResizeShapeHandler;

impl CommandHandler for ResizeShapeHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let shape: ElementId = ctx.get("shape")?;
        let new_bounds: Bounds = ctx.get("newBounds")?;
        if new_bounds.width < 0.0 || new_bounds.height < 0.0 {
            return Err(CommandError::InvalidField {
                field: "newBounds".into(),
                message: "width and height must not be negative".into(),
            });
        }
        let old_bounds = diagram.set_bounds(shape, new_bounds)?;
        ctx.set("oldBounds", &old_bounds)?;
        Ok(vec![shape])
    }

    fn post_execute(
        &self,
        ctx: &mut CommandContext,
        stack: &mut CommandStack,
        diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        let shape: ElementId = ctx.get("shape")?;
        let old_bounds: Bounds = ctx.get("oldBounds")?;
        let new_bounds: Bounds = ctx.get("newBounds")?;
        layout_incident_connections(stack, diagram, shape, |p| {
            scaled_anchor(p, old_bounds, new_bounds)
        })
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let shape: ElementId = ctx.get("shape")?;
        diagram.set_bounds(shape, ctx.get("oldBounds")?)?;
        Ok(vec![shape])
    }
}

// ─── Connections ──────────────────────────────────────────────────────────

/// `connection.create { connection, source, target, parent?, hints? }`.
///
/// Message flows default to the root as parent, other connections to the
/// source's parent. A connection without waypoints is laid out.
struct CreateConnectionHandler {
    layouter: Rc<dyn Layouter>,
}

impl CommandHandler for CreateConnectionHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let mut connection: Element = ctx.get("connection")?;
        let source: ElementId = ctx.get("source")?;
        let target: ElementId = ctx.get("target")?;

        let parent = match ctx.get_opt::<ElementId>("parent")? {
            Some(parent) => parent,
            None => {
                let parent = if connection.is(BpmnType::MessageFlow) {
                    diagram.root_id()
                } else {
                    diagram.parent(source).or(diagram.root_id())
                };
                let parent = parent.ok_or(ModelError::NoRoot)?;
                ctx.set("parent", &parent)?;
                parent
            }
        };

        if connection.waypoints().is_none_or(<[Waypoint]>::is_empty) {
            let mut hints: LayoutHints = ctx.get_opt("hints")?.unwrap_or_default();
            hints.source = Some(source);
            hints.target = Some(target);
            let waypoints = self.layouter.layout_connection(diagram, &connection, &hints)?;
            connection.kind = ElementKind::Connection { waypoints };
            ctx.set("connection", &connection)?;
        }

        let id = connection.id;
        diagram.add_connection(connection, parent, source, target)?;
        Ok(vec![id, source, target])
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let connection: Element = ctx.get("connection")?;
        let detached = diagram.detach(connection.id)?;
        Ok([Some(connection.id), detached.source, detached.target]
            .into_iter()
            .flatten()
            .collect())
    }
}

/// `connection.delete { connection }`.
struct DeleteConnectionHandler;

impl CommandHandler for DeleteConnectionHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let connection: ElementId = ctx.get("connection")?;
        if !diagram.element(connection)?.is_connection() {
            return Err(ModelError::WrongKind {
                id: connection,
                expected: "connection",
            }
            .into());
        }
        let detached = diagram.detach(connection)?;
        let changed = [Some(connection), detached.source, detached.target]
            .into_iter()
            .flatten()
            .collect();
        ctx.set("detached", &detached)?;
        Ok(changed)
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let detached: DetachedElement = ctx.get("detached")?;
        let changed = [Some(detached.element.id), detached.source, detached.target]
            .into_iter()
            .flatten()
            .collect();
        diagram.restore(detached)?;
        Ok(changed)
    }
}

/// `connection.reconnect { connection, newSource, newTarget, docking? }`.
///
/// A changed end docks at `docking`, or at the new shape's center; the
/// route is then re-laid-out by a nested `connection.layout`.
struct ReconnectConnectionHandler;

impl CommandHandler for ReconnectConnectionHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let connection: ElementId = ctx.get("connection")?;
        let new_source: ElementId = ctx.get("newSource")?;
        let new_target: ElementId = ctx.get("newTarget")?;
        let (Some(old_source), Some(old_target)) =
            (diagram.source(connection), diagram.target(connection))
        else {
            return Err(ModelError::WrongKind {
                id: connection,
                expected: "connection",
            }
            .into());
        };

        diagram.reconnect(connection, new_source, new_target)?;
        ctx.set("oldSource", &old_source)?;
        ctx.set("oldTarget", &old_target)?;

        let mut changed = vec![connection, old_source, old_target];
        for end in [new_source, new_target] {
            if !changed.contains(&end) {
                changed.push(end);
            }
        }
        Ok(changed)
    }

    fn post_execute(
        &self,
        ctx: &mut CommandContext,
        stack: &mut CommandStack,
        diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        let connection: ElementId = ctx.get("connection")?;
        let docking: Option<Point> = ctx.get_opt("docking")?;
        let dock_on = |shape: ElementId| docking.or_else(|| diagram.bounds(shape).map(|b| b.mid()));

        let mut hints = LayoutHints::default();
        let (old_source, new_source): (ElementId, ElementId) = (ctx.get("oldSource")?, ctx.get("newSource")?);
        if old_source != new_source {
            hints.connection_start = dock_on(new_source);
        }
        let (old_target, new_target): (ElementId, ElementId) = (ctx.get("oldTarget")?, ctx.get("newTarget")?);
        if old_target != new_target {
            hints.connection_end = dock_on(new_target);
        }

        let mut layout = CommandContext::new().with("connection", json!(connection));
        layout.set("hints", &hints)?;
        stack.execute("connection.layout", layout, diagram)
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let connection: ElementId = ctx.get("connection")?;
        let old_source: ElementId = ctx.get("oldSource")?;
        let old_target: ElementId = ctx.get("oldTarget")?;
        let (new_source, new_target) = diagram.reconnect(connection, old_source, old_target)?;
        Ok([Some(connection), Some(old_source), Some(old_target), new_source, new_target]
            .into_iter()
            .flatten()
            .collect())
    }
}

/// `connection.layout { connection, hints? }`. The computed route is kept
/// as `newWaypoints` and reused on redo.
struct LayoutConnectionHandler {
    layouter: Rc<dyn Layouter>,
}

impl CommandHandler for LayoutConnectionHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let connection: ElementId = ctx.get("connection")?;

        let waypoints = match ctx.get_opt::<Vec<Waypoint>>("newWaypoints")? {
            Some(waypoints) => waypoints,
            None => {
                let hints: LayoutHints = ctx.get_opt("hints")?.unwrap_or_default();
                let element = diagram.element(connection)?;
                let waypoints = self.layouter.layout_connection(diagram, element, &hints)?;
                ctx.set("newWaypoints", &waypoints)?;
                waypoints
            }
        };

        let old = diagram.set_waypoints(connection, waypoints)?;
        ctx.set("oldWaypoints", &old)?;
        Ok(vec![connection])
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let connection: ElementId = ctx.get("connection")?;
        diagram.set_waypoints(connection, ctx.get("oldWaypoints")?)?;
        Ok(vec![connection])
    }
}

// ─── Properties ───────────────────────────────────────────────────────────

/// `element.updateProperties { element, properties }`: `properties` is
/// merged over the element's current properties, key by key.
struct UpdatePropertiesHandler;

impl CommandHandler for UpdatePropertiesHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext,
        diagram: &mut Diagram,
    ) -> Result<Vec<ElementId>, CommandError> {
        let id: ElementId = ctx.get("element")?;
        let Some(Value::Object(update)) = ctx.value("properties").cloned() else {
            return Err(CommandError::InvalidField {
                field: "properties".into(),
                message: "expected an object".into(),
            });
        };

        let element = diagram.get_mut(id).ok_or(ModelError::NotFound(id))?;
        let invalid = |e: serde_json::Error| CommandError::InvalidField {
            field: "properties".into(),
            message: e.to_string(),
        };
        let mut merged = serde_json::to_value(&element.props).map_err(invalid)?;
        if let Value::Object(current) = &mut merged {
            current.extend(update);
        }
        let props: Properties = serde_json::from_value(merged).map_err(invalid)?;
        let old = std::mem::replace(&mut element.props, props);

        ctx.set("oldProperties", &old)?;
        Ok(vec![id])
    }

    fn revert(&self, ctx: &CommandContext, diagram: &mut Diagram) -> Result<Vec<ElementId>, CommandError> {
        let id: ElementId = ctx.get("element")?;
        let old: Properties = ctx.get("oldProperties")?;
        let element = diagram.get_mut(id).ok_or(ModelError::NotFound(id))?;
        element.props = old;
        Ok(vec![id])
    }
}

// ─── Facade ───────────────────────────────────────────────────────────────

/// Typed entry points to the modeling commands.
pub struct Modeling<'a> {
    stack: &'a mut CommandStack,
    diagram: &'a mut Diagram,
}

impl<'a> Modeling<'a> {
    pub fn new(stack: &'a mut CommandStack, diagram: &'a mut Diagram) -> Self {
        Self { stack, diagram }
    }

    pub fn diagram(&self) -> &Diagram {
        self.diagram
    }

    fn execute(&mut self, command: &str, ctx: CommandContext) -> Result<(), CommandError> {
        self.stack.execute(command, ctx, self.diagram)
    }

    /// Create `shape` centered on `position` inside `parent`.
    pub fn create_shape(
        &mut self,
        shape: Element,
        position: Point,
        parent: ElementId,
    ) -> Result<ElementId, CommandError> {
        let id = shape.id;
        let mut ctx = CommandContext::new();
        ctx.set("shape", &shape)?;
        ctx.set("position", &position)?;
        ctx.set("parent", &parent)?;
        self.execute("shape.create", ctx)?;
        Ok(id)
    }

    /// Create `shape` centered on `position`, attached to `host`.
    pub fn create_attached_shape(
        &mut self,
        shape: Element,
        position: Point,
        host: ElementId,
    ) -> Result<ElementId, CommandError> {
        let id = shape.id;
        let parent = self.diagram.parent(host).ok_or(ModelError::NotFound(host))?;
        let mut ctx = CommandContext::new();
        ctx.set("shape", &shape)?;
        ctx.set("position", &position)?;
        ctx.set("parent", &parent)?;
        ctx.set("host", &host)?;
        self.execute("shape.create", ctx)?;
        Ok(id)
    }

    /// Add `connection` between `source` and `target`; it is laid out when
    /// it has no waypoints.
    pub fn create_connection(
        &mut self,
        source: ElementId,
        target: ElementId,
        connection: Element,
        parent: Option<ElementId>,
    ) -> Result<ElementId, CommandError> {
        let id = connection.id;
        let mut ctx = CommandContext::new();
        ctx.set("connection", &connection)?;
        ctx.set("source", &source)?;
        ctx.set("target", &target)?;
        if let Some(parent) = parent {
            ctx.set("parent", &parent)?;
        }
        self.execute("connection.create", ctx)?;
        Ok(id)
    }

    /// Connect `source` to `target` with whatever connection the
    /// `connection.create` rule allows. `None` when it allows none.
    pub fn connect(
        &mut self,
        source: ElementId,
        target: ElementId,
        rules: &Rules,
    ) -> Result<Option<ElementId>, CommandError> {
        let context = json!({
            "source": ElementRef::Id(source),
            "target": ElementRef::Id(target),
        });
        let outcome = rules.allowed("connection.create", &context, self.diagram)?;
        let RuleOutcome::Connection(descriptor) = outcome else {
            log::trace!("no connection allowed from {source} to {target}: {outcome:?}");
            return Ok(None);
        };

        let id = ElementId::for_type(descriptor.bpmn_type);
        let mut connection = Element::connection(id, descriptor.bpmn_type, Vec::new());
        if descriptor.bpmn_type == BpmnType::Association {
            connection.props.association_direction = Some(
                descriptor
                    .association_direction
                    .unwrap_or(AssociationDirection::None),
            );
        }
        self.create_connection(source, target, connection, None).map(Some)
    }

    pub fn move_shape(
        &mut self,
        shape: ElementId,
        delta: Point,
        new_parent: Option<ElementId>,
    ) -> Result<(), CommandError> {
        let mut ctx = CommandContext::new();
        ctx.set("shape", &shape)?;
        ctx.set("delta", &delta)?;
        if let Some(new_parent) = new_parent {
            ctx.set("newParent", &new_parent)?;
        }
        self.execute("shape.move", ctx)
    }

    /// Move `shape` and attach it to `host` (detach with `None`).
    pub fn move_and_attach(
        &mut self,
        shape: ElementId,
        delta: Point,
        host: Option<ElementId>,
    ) -> Result<(), CommandError> {
        let mut ctx = CommandContext::new();
        ctx.set("shape", &shape)?;
        ctx.set("delta", &delta)?;
        ctx.set("newHost", &host)?;
        self.execute("shape.move", ctx)
    }

    pub fn resize_shape(&mut self, shape: ElementId, new_bounds: Bounds) -> Result<(), CommandError> {
        let mut ctx = CommandContext::new();
        ctx.set("shape", &shape)?;
        ctx.set("newBounds", &new_bounds)?;
        self.execute("shape.resize", ctx)
    }

    /// Delete `shape` with everything that depends on it.
    pub fn remove_shape(&mut self, shape: ElementId) -> Result<(), CommandError> {
        self.execute("shape.delete", CommandContext::new().with("shape", json!(shape)))
    }

    pub fn remove_connection(&mut self, connection: ElementId) -> Result<(), CommandError> {
        self.execute(
            "connection.delete",
            CommandContext::new().with("connection", json!(connection)),
        )
    }

    /// Point `connection` at `new_source` and `new_target`.
    pub fn reconnect(
        &mut self,
        connection: ElementId,
        new_source: ElementId,
        new_target: ElementId,
        docking: Option<Point>,
    ) -> Result<(), CommandError> {
        let mut ctx = CommandContext::new().with("connection", json!(connection));
        ctx.set("newSource", &new_source)?;
        ctx.set("newTarget", &new_target)?;
        if let Some(docking) = docking {
            ctx.set("docking", &docking)?;
        }
        self.execute("connection.reconnect", ctx)
    }

    pub fn reconnect_start(
        &mut self,
        connection: ElementId,
        new_source: ElementId,
        docking: Option<Point>,
    ) -> Result<(), CommandError> {
        let target = self
            .diagram
            .target(connection)
            .ok_or(ModelError::NotFound(connection))?;
        self.reconnect(connection, new_source, target, docking)
    }

    pub fn reconnect_end(
        &mut self,
        connection: ElementId,
        new_target: ElementId,
        docking: Option<Point>,
    ) -> Result<(), CommandError> {
        let source = self
            .diagram
            .source(connection)
            .ok_or(ModelError::NotFound(connection))?;
        self.reconnect(connection, source, new_target, docking)
    }

    pub fn layout_connection(
        &mut self,
        connection: ElementId,
        hints: LayoutHints,
    ) -> Result<(), CommandError> {
        let mut ctx = CommandContext::new().with("connection", json!(connection));
        ctx.set("hints", &hints)?;
        self.execute("connection.layout", ctx)
    }

    /// Merge `properties` (camelCase property names) into the element's.
    pub fn update_properties(&mut self, element: ElementId, properties: Value) -> Result<(), CommandError> {
        self.execute(
            "element.updateProperties",
            CommandContext::new()
                .with("element", json!(element))
                .with("properties", properties),
        )
    }
}
