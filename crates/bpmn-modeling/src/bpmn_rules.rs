//! The BPMN rule set.
//!
//! Decides which connections may be drawn between which elements, where
//! shapes may be created, moved, attached, resized and pasted. Every
//! predicate is a pure function of the element taxonomy and the diagram
//! topology.

use crate::config::{MinSize, ResizeLimits};
use crate::event_bus::DEFAULT_PRIORITY;
use crate::rules::{ConnectionDescriptor, ElementRef, Replacement, RuleOutcome, RuleProvider};
use bpmn_core::geometry::get_point_orientation;
use bpmn_core::{
    AssociationDirection, Bounds, BpmnType, Diagram, Element, ElementId, EventDefinition,
    Orientation, Point,
};
use serde::{Deserialize, Serialize};

use BpmnType as T;
use EventDefinition as E;

/// Inward band on a host's border that counts as an attachment position.
const BOUNDARY_ATTACH_PADDING: f32 = -15.0;

const COMMON_BOUNDARY_DEFINITIONS: [EventDefinition; 4] =
    [E::Message, E::Timer, E::Signal, E::Conditional];

// ─── Nodes ────────────────────────────────────────────────────────────────

/// An element as seen by the rules: a diagram element, or one that is not
/// part of the diagram yet. The parent may be overridden (e.g. for a target
/// that is about to be created inside another element).
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    pub element: &'a Element,
    pub parent: Option<ElementId>,
    in_diagram: bool,
}

impl<'a> Node<'a> {
    /// A diagram element.
    pub fn of(diagram: &'a Diagram, id: ElementId) -> Option<Self> {
        diagram.get(id).map(|element| Self {
            element,
            parent: diagram.parent(id),
            in_diagram: true,
        })
    }

    /// An element that is not part of the diagram.
    pub fn detached(element: &'a Element) -> Self {
        Self {
            element,
            parent: None,
            in_diagram: false,
        }
    }

    pub fn resolve(diagram: &'a Diagram, element: &'a ElementRef) -> Option<Self> {
        match element {
            ElementRef::Id(id) => Self::of(diagram, *id),
            ElementRef::Inline(element) => Some(Self::detached(element)),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn id(&self) -> ElementId {
        self.element.id
    }

    fn is(&self, ty: BpmnType) -> bool {
        self.element.is(ty)
    }

    fn is_any(&self, types: &[BpmnType]) -> bool {
        self.element.is_any(types)
    }

    fn is_label(&self) -> bool {
        self.element.is_label()
    }

    fn host(&self, diagram: &Diagram) -> Option<ElementId> {
        if self.in_diagram {
            diagram.host(self.id())
        } else {
            None
        }
    }
}

/// A reference in a rule context named an element the diagram does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unresolved;

fn resolve<'a>(diagram: &'a Diagram, element: &'a ElementRef) -> Result<Node<'a>, Unresolved> {
    Node::resolve(diagram, element).ok_or(Unresolved)
}

fn resolve_opt<'a>(
    diagram: &'a Diagram,
    element: &'a Option<ElementRef>,
) -> Result<Option<Node<'a>>, Unresolved> {
    element.as_ref().map(|e| resolve(diagram, e)).transpose()
}

fn resolve_all<'a>(diagram: &'a Diagram, elements: &'a [ElementRef]) -> Result<Vec<Node<'a>>, Unresolved> {
    elements.iter().map(|e| resolve(diagram, e)).collect()
}

// ─── Rule contexts ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionStartContext {
    pub source: Option<ElementRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectHints {
    /// Scope checks treat the target as a child of this element.
    pub target_parent: Option<ElementId>,
    /// The target is a boundary event about to be attached.
    pub target_attach: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionCreateContext {
    pub source: Option<ElementRef>,
    pub target: Option<ElementRef>,
    pub hints: ConnectHints,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconnectContext {
    pub connection: Option<ElementRef>,
    pub source: Option<ElementRef>,
    pub target: Option<ElementRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWaypointsContext {
    pub connection: ElementRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeContext {
    pub shape: ElementRef,
    #[serde(default)]
    pub new_bounds: Option<Bounds>,
}

/// One element of an `elements.create` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItem {
    pub element: ElementRef,
    #[serde(default)]
    pub host: Option<ElementRef>,
    #[serde(default)]
    pub source: Option<ElementRef>,
    #[serde(default)]
    pub target: Option<ElementRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementsCreateContext {
    pub elements: Vec<CreateItem>,
    pub target: Option<ElementRef>,
    pub position: Option<Point>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementsMoveContext {
    pub shapes: Vec<ElementRef>,
    pub target: Option<ElementRef>,
    pub position: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeCreateContext {
    pub shape: ElementRef,
    #[serde(default)]
    pub target: Option<ElementRef>,
    #[serde(default)]
    pub source: Option<ElementRef>,
    #[serde(default)]
    pub position: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeAttachContext {
    pub shape: ElementRef,
    #[serde(default)]
    pub target: Option<ElementRef>,
    #[serde(default)]
    pub position: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyContext {
    pub element: ElementRef,
    #[serde(default)]
    pub elements: Vec<ElementRef>,
}

/// Element of a paste tree; only the type matters to the rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteDescriptor {
    #[serde(default)]
    pub id: Option<ElementId>,
    #[serde(rename = "type")]
    pub bpmn_type: BpmnType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementsPasteContext {
    /// Copied elements by depth; `tree[0]` is the top level.
    #[serde(default)]
    pub tree: Vec<Vec<PasteDescriptor>>,
    pub target: ElementRef,
}

// ─── Rule set ─────────────────────────────────────────────────────────────

/// The BPMN rules, registered on a [`RuleProvider`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BpmnRules {
    limits: ResizeLimits,
}

impl BpmnRules {
    #[must_use]
    pub fn new(limits: ResizeLimits) -> Self {
        Self { limits }
    }

    /// Register every BPMN rule at the default priority.
    pub fn register(self, provider: &RuleProvider) {
        provider.add_rule("connection.start", DEFAULT_PRIORITY, |ctx: &ConnectionStartContext, d| {
            let source = match resolve_opt(d, &ctx.source) {
                Ok(source) => source,
                Err(Unresolved) => return Some(RuleOutcome::Neutral),
            };
            Some(can_start_connection(source))
        });

        provider.add_rule("connection.create", DEFAULT_PRIORITY, |ctx: &ConnectionCreateContext, d| {
            if ctx.hints.target_attach {
                return Some(RuleOutcome::Forbidden);
            }
            let source = resolve_opt(d, &ctx.source).ok().flatten();
            let mut target = resolve_opt(d, &ctx.target).ok().flatten();
            if let Some(parent) = ctx.hints.target_parent {
                target = target.map(|t| t.with_parent(parent));
            }
            Some(can_connect(d, source, target, None))
        });

        provider.add_rule(
            [
                "connection.reconnect",
                "connection.reconnectStart",
                "connection.reconnectEnd",
            ],
            DEFAULT_PRIORITY,
            |ctx: &ReconnectContext, d| {
                let connection = resolve_opt(d, &ctx.connection).ok().flatten();
                let source = resolve_opt(d, &ctx.source).ok().flatten();
                let target = resolve_opt(d, &ctx.target).ok().flatten();
                Some(can_connect(d, source, target, connection))
            },
        );

        provider.add_rule("connection.updateWaypoints", DEFAULT_PRIORITY, |ctx: &UpdateWaypointsContext, d| {
            let outcome = match Node::resolve(d, &ctx.connection) {
                Some(c) => RuleOutcome::Connection(ConnectionDescriptor::new(c.element.bpmn_type)),
                None => RuleOutcome::Neutral,
            };
            Some(outcome)
        });

        provider.add_rule("shape.resize", DEFAULT_PRIORITY, move |ctx: &ResizeContext, d| {
            let outcome = resolve(d, &ctx.shape)
                .map(|shape| RuleOutcome::from_bool(self.can_resize(shape, ctx.new_bounds)));
            Some(outcome.unwrap_or(RuleOutcome::Forbidden))
        });

        provider.add_rule("elements.create", DEFAULT_PRIORITY, |ctx: &ElementsCreateContext, d| {
            Some(elements_create(d, ctx).unwrap_or(RuleOutcome::Forbidden))
        });

        provider.add_rule("elements.move", DEFAULT_PRIORITY, |ctx: &ElementsMoveContext, d| {
            Some(elements_move(d, ctx).unwrap_or(RuleOutcome::Forbidden))
        });

        provider.add_rule("shape.create", DEFAULT_PRIORITY, |ctx: &ShapeCreateContext, d| {
            let outcome = (|| {
                let shape = resolve(d, &ctx.shape)?;
                let target = resolve_opt(d, &ctx.target)?;
                let source = resolve_opt(d, &ctx.source)?;
                Ok::<_, Unresolved>(can_create(d, shape, target, source, ctx.position))
            })();
            Some(RuleOutcome::from_bool(outcome.unwrap_or(false)))
        });

        provider.add_rule("shape.attach", DEFAULT_PRIORITY, |ctx: &ShapeAttachContext, d| {
            let outcome = (|| {
                let shape = resolve(d, &ctx.shape)?;
                let target = resolve_opt(d, &ctx.target)?;
                Ok::<_, Unresolved>(can_attach(d, &[shape], target, ctx.position))
            })();
            Some(attach_outcome(outcome.unwrap_or(false)))
        });

        provider.add_rule("element.copy", DEFAULT_PRIORITY, |ctx: &CopyContext, d| {
            let outcome = (|| {
                let element = resolve(d, &ctx.element)?;
                let elements = resolve_all(d, &ctx.elements)?;
                Ok::<_, Unresolved>(can_copy(d, &elements, element))
            })();
            Some(RuleOutcome::from_bool(outcome.unwrap_or(false)))
        });

        provider.add_rule("element.paste", DEFAULT_PRIORITY, |ctx: &ShapeCreateContext, d| {
            let outcome = (|| {
                let element = resolve(d, &ctx.shape)?;
                let target = resolve_opt(d, &ctx.target)?;
                let source = resolve_opt(d, &ctx.source)?;
                Ok::<_, Unresolved>(can_create(d, element, target, source, ctx.position))
            })();
            Some(RuleOutcome::from_bool(outcome.unwrap_or(false)))
        });

        provider.add_rule("elements.paste", DEFAULT_PRIORITY, |ctx: &ElementsPasteContext, d| {
            let outcome = resolve(d, &ctx.target).map(|target| can_paste(d, &ctx.tree, target));
            Some(RuleOutcome::from_bool(outcome.unwrap_or(false)))
        });
    }

    /// Type-specific minimum sizes; text annotations always resize, other
    /// shapes never.
    pub fn can_resize(&self, shape: Node<'_>, new_bounds: Option<Bounds>) -> bool {
        let admits = |limit: MinSize| {
            new_bounds.is_none_or(|b| limit.admits(b.width, b.height))
        };

        if shape.is(T::SubProcess) {
            return shape.element.is_expanded() && admits(self.limits.sub_process);
        }
        if shape.is(T::Lane) {
            return admits(self.limits.lane);
        }
        if shape.is(T::Participant) {
            return admits(self.limits.participant);
        }
        is_text_annotation(shape)
    }
}

fn attach_outcome(attach: bool) -> RuleOutcome {
    if attach {
        RuleOutcome::Attach
    } else {
        RuleOutcome::Forbidden
    }
}

fn elements_create(d: &Diagram, ctx: &ElementsCreateContext) -> Result<RuleOutcome, Unresolved> {
    let target = resolve_opt(d, &ctx.target)?;
    let mut elements = Vec::with_capacity(ctx.elements.len());
    for item in &ctx.elements {
        elements.push(resolve(d, &item.element)?);
    }

    if let Some(target) = target {
        if target.element.is_connection() && !can_insert(d, &elements, Some(target), ctx.position) {
            return Ok(RuleOutcome::Forbidden);
        }
    }

    for (item, element) in ctx.elements.iter().zip(&elements) {
        let allowed = if element.element.is_connection() {
            let source = resolve_opt(d, &item.source)?;
            let target = resolve_opt(d, &item.target)?;
            can_connect(d, source, target, Some(*element)).is_allowed()
        } else if let Some(host) = &item.host {
            let host = resolve(d, host)?;
            can_attach(d, &[*element], Some(host), ctx.position)
        } else {
            can_create(d, *element, target, None, ctx.position)
        };
        if !allowed {
            return Ok(RuleOutcome::Forbidden);
        }
    }
    Ok(RuleOutcome::Allowed)
}

/// Attach, else replace, else plain move, else insert into a flow.
fn elements_move(d: &Diagram, ctx: &ElementsMoveContext) -> Result<RuleOutcome, Unresolved> {
    let shapes = resolve_all(d, &ctx.shapes)?;
    let target = resolve_opt(d, &ctx.target)?;

    if can_attach(d, &shapes, target, ctx.position) {
        return Ok(RuleOutcome::Attach);
    }
    if let Some(replacements) = can_replace(d, &shapes, target, ctx.position) {
        return Ok(RuleOutcome::Replace(replacements));
    }
    Ok(RuleOutcome::from_bool(
        can_move(d, &shapes, target) || can_insert(d, &shapes, target, ctx.position),
    ))
}

// ─── Element predicates ───────────────────────────────────────────────────

fn is_text_annotation(node: Node<'_>) -> bool {
    node.is(T::TextAnnotation)
}

fn is_group(node: Node<'_>) -> bool {
    node.is(T::Group) && !node.is_label()
}

fn is_for_compensation(node: Node<'_>) -> bool {
    node.element.props.is_for_compensation
}

fn is_compensation_boundary(node: Node<'_>) -> bool {
    node.is(T::BoundaryEvent) && node.element.has_event_definition(E::Compensate)
}

fn is_event_sub_process(node: Node<'_>) -> bool {
    node.element.is_event_sub_process()
}

fn is_boundary_event(node: Node<'_>) -> bool {
    !node.is_label() && node.is(T::BoundaryEvent)
}

fn has_common_boundary_definition(node: Node<'_>) -> bool {
    node.element.has_any_event_definition(&COMMON_BOUNDARY_DEFINITIONS)
}

/// Elements that can become boundary events by attaching them.
fn is_boundary_candidate(node: Node<'_>) -> bool {
    if is_boundary_event(node) {
        return true;
    }
    if node.is(T::IntermediateThrowEvent) && node.element.has_no_event_definition() {
        return true;
    }
    node.is(T::IntermediateCatchEvent) && has_common_boundary_definition(node)
}

fn is_message_flow_source(node: Node<'_>) -> bool {
    node.is(T::InteractionNode)
        && !node.is(T::BoundaryEvent)
        && (!node.is(T::Event)
            || (node.is(T::ThrowEvent) && node.element.has_event_definition_or_none(E::Message)))
}

fn is_message_flow_target(node: Node<'_>) -> bool {
    node.is(T::InteractionNode)
        && !is_for_compensation(node)
        && (!node.is(T::Event)
            || (node.is(T::CatchEvent) && node.element.has_event_definition_or_none(E::Message)))
        && !(node.is(T::BoundaryEvent) && !node.element.has_event_definition(E::Message))
}

fn is_sequence_flow_source(node: Node<'_>) -> bool {
    node.is(T::FlowNode)
        && !node.is(T::EndEvent)
        && !is_event_sub_process(node)
        && !(node.is(T::IntermediateThrowEvent) && node.element.has_event_definition(E::Link))
        && !is_compensation_boundary(node)
        && !is_for_compensation(node)
}

fn is_sequence_flow_target(node: Node<'_>) -> bool {
    node.is(T::FlowNode)
        && !node.is(T::StartEvent)
        && !node.is(T::BoundaryEvent)
        && !is_event_sub_process(node)
        && !(node.is(T::IntermediateCatchEvent) && node.element.has_event_definition(E::Link))
        && !is_for_compensation(node)
}

/// Valid successors of an event-based gateway.
pub fn is_event_based_target(node: Node<'_>) -> bool {
    node.is(T::ReceiveTask)
        || (node.is(T::IntermediateCatchEvent) && has_common_boundary_definition(node))
}

// ─── Topology ─────────────────────────────────────────────────────────────

/// Parent, grandparent … of `node`, nearest first.
fn parents<'a>(d: &'a Diagram, node: Node<'_>) -> Vec<&'a Element> {
    let Some(parent) = node.parent else {
        return Vec::new();
    };
    std::iter::once(parent)
        .chain(d.ancestors(parent))
        .filter_map(|id| d.get(id))
        .collect()
}

fn is_parent(d: &Diagram, possible_parent: Node<'_>, node: Node<'_>) -> bool {
    parents(d, node).iter().any(|p| p.id == possible_parent.id())
}

/// The process `node` belongs to: the nearest process, or the process a
/// participant shows (the participant itself when it shows none).
fn organizational_parent(d: &Diagram, node: Node<'_>) -> Option<ElementId> {
    std::iter::once(node.element)
        .chain(parents(d, node))
        .find_map(|e| {
            if e.is(T::Process) {
                Some(e.id)
            } else if e.is(T::Participant) {
                Some(e.props.process_ref.unwrap_or(e.id))
            } else {
                None
            }
        })
}

/// The container whose flow elements `node` is one of.
fn scope_parent(d: &Diagram, node: Node<'_>) -> Option<ElementId> {
    for parent in parents(d, node) {
        if parent.is(T::FlowElementsContainer) {
            return Some(parent.id);
        }
        if parent.is(T::Participant) {
            return parent.props.process_ref;
        }
    }
    None
}

fn root_element(d: &Diagram, node: Node<'_>) -> Option<ElementId> {
    parents(d, node)
        .iter()
        .find(|p| p.is_any(&[T::Process, T::Collaboration]))
        .map(|p| p.id)
}

pub fn is_same_organization(d: &Diagram, a: Node<'_>, b: Node<'_>) -> bool {
    organizational_parent(d, a) == organizational_parent(d, b)
}

pub fn is_same_scope(d: &Diagram, a: Node<'_>, b: Node<'_>) -> bool {
    scope_parent(d, a) == scope_parent(d, b)
}

fn is_receive_task_after_event_based_gateway(d: &Diagram, node: Node<'_>) -> bool {
    node.is(T::ReceiveTask)
        && node.in_diagram
        && d.incoming(node.id()).into_iter().any(|flow| {
            d.source(flow)
                .and_then(|source| d.get(source))
                .is_some_and(|source| source.is(T::EventBasedGateway))
        })
}

fn is_boundary_attachment(position: Point, target: Node<'_>) -> bool {
    target.element.bounds().is_some_and(|bounds| {
        get_point_orientation(position, &bounds, BOUNDARY_ATTACH_PADDING) != Orientation::Intersect
    })
}

// ─── Connections ──────────────────────────────────────────────────────────

/// Source of a new connection. Missing sources and labels are neutral.
pub fn can_start_connection(source: Option<Node<'_>>) -> RuleOutcome {
    match source {
        Some(source) if !source.is_label() => RuleOutcome::from_bool(source.is_any(&[
            T::FlowNode,
            T::InteractionNode,
            T::DataObjectReference,
            T::DataStoreReference,
            T::Group,
            T::TextAnnotation,
        ])),
        _ => RuleOutcome::Neutral,
    }
}

/// The connection `source → target` may be, first match wins: message
/// flow, sequence flow, data association, compensation association,
/// association. Reconnecting a data association keeps it a data association.
pub fn can_connect(
    d: &Diagram,
    source: Option<Node<'_>>,
    target: Option<Node<'_>>,
    connection: Option<Node<'_>>,
) -> RuleOutcome {
    let (Some(source), Some(target)) = (source, target) else {
        return RuleOutcome::Neutral;
    };
    if source.is_label() || target.is_label() {
        return RuleOutcome::Neutral;
    }

    if !connection.is_some_and(|c| c.is(T::DataAssociation)) {
        if can_connect_message_flow(d, source, target) {
            return RuleOutcome::Connection(ConnectionDescriptor::new(T::MessageFlow));
        }
        if can_connect_sequence_flow(d, source, target) {
            return RuleOutcome::Connection(ConnectionDescriptor::new(T::SequenceFlow));
        }
    }

    if let Some(data_association) = can_connect_data_association(source, target) {
        return RuleOutcome::Connection(ConnectionDescriptor::new(data_association));
    }

    if is_compensation_boundary(source) && is_for_compensation(target) {
        return RuleOutcome::Connection(ConnectionDescriptor::association(AssociationDirection::One));
    }

    if can_connect_association(d, source, target) {
        return RuleOutcome::Connection(ConnectionDescriptor::association(AssociationDirection::None));
    }

    RuleOutcome::Forbidden
}

pub fn can_connect_message_flow(d: &Diagram, source: Node<'_>, target: Node<'_>) -> bool {
    // a target outside of any root cannot receive messages from inside one
    if root_element(d, source).is_some() && root_element(d, target).is_none() {
        return false;
    }
    is_message_flow_source(source)
        && is_message_flow_target(target)
        && !is_same_organization(d, source, target)
}

pub fn can_connect_sequence_flow(d: &Diagram, source: Node<'_>, target: Node<'_>) -> bool {
    is_sequence_flow_source(source)
        && is_sequence_flow_target(target)
        && is_same_scope(d, source, target)
        && !(source.is(T::EventBasedGateway) && !is_event_based_target(target))
}

/// `DataInputAssociation` from data to an activity or throw event,
/// `DataOutputAssociation` from an activity or catch event to data.
pub fn can_connect_data_association(source: Node<'_>, target: Node<'_>) -> Option<BpmnType> {
    let data = [T::DataObjectReference, T::DataStoreReference];
    if source.is_any(&data) && target.is_any(&[T::Activity, T::ThrowEvent]) {
        return Some(T::DataInputAssociation);
    }
    if target.is_any(&data) && source.is_any(&[T::Activity, T::CatchEvent]) {
        return Some(T::DataOutputAssociation);
    }
    None
}

pub fn can_connect_association(d: &Diagram, source: Node<'_>, target: Node<'_>) -> bool {
    if is_compensation_boundary(source) && is_for_compensation(target) {
        return true;
    }
    // never between parent and child
    if is_parent(d, target, source) || is_parent(d, source, target) {
        return false;
    }
    // exactly one end is a text annotation
    if is_text_annotation(source) != is_text_annotation(target) {
        return true;
    }
    can_connect_data_association(source, target).is_some()
}

// ─── Drop, attach, replace, move, insert ──────────────────────────────────

/// Whether `element` may be placed inside `target`.
pub fn can_drop(d: &Diagram, element: Node<'_>, target: Node<'_>) -> bool {
    if element.is_label() || is_group(element) {
        return true;
    }

    // nothing goes into a collapsed pool
    if target.is(T::Participant) && !target.element.is_expanded() {
        return false;
    }

    if element.is(T::Participant) {
        return target.is_any(&[T::Process, T::Collaboration]);
    }

    // data inputs and outputs stay in their container
    if element.is_any(&[T::DataInput, T::DataOutput]) {
        if let Some(parent) = element.parent {
            return target.id() == parent;
        }
    }

    if element.is(T::Lane) {
        return target.is_any(&[T::Participant, T::Lane]);
    }

    // attach-only
    if element.is(T::BoundaryEvent) {
        return false;
    }

    if element.is(T::FlowElement) && !element.is(T::DataStoreReference) {
        if target.is(T::FlowElementsContainer) {
            return target.element.is_expanded();
        }
        return target.is_any(&[T::Participant, T::Lane]);
    }

    // a data store needs a process to live in
    if element.is(T::DataStoreReference) && target.is(T::Collaboration) {
        return d.children(target.id()).into_iter().any(|child| {
            d.get(child)
                .is_some_and(|c| c.is(T::Participant) && c.props.process_ref.is_some())
        });
    }

    if element.is_any(&[T::Artifact, T::DataAssociation, T::DataStoreReference]) {
        return target.is_any(&[
            T::Collaboration,
            T::Lane,
            T::Participant,
            T::Process,
            T::SubProcess,
        ]);
    }

    if element.is(T::MessageFlow) {
        if target.is(T::Collaboration) {
            return true;
        }
        if !element.in_diagram {
            return false;
        }
        let end_parent = |end: Option<ElementId>| end.and_then(|e| d.parent(e));
        return end_parent(d.source(element.id())) == Some(target.id())
            || end_parent(d.target(element.id())) == Some(target.id());
    }

    false
}

/// A single boundary candidate dropped on the border of a non-compensation
/// activity.
pub fn can_attach(
    d: &Diagram,
    elements: &[Node<'_>],
    target: Option<Node<'_>>,
    position: Option<Point>,
) -> bool {
    let ([element], Some(target)) = (elements, target) else {
        return false;
    };
    if element.is_label() || !is_boundary_candidate(*element) {
        return false;
    }
    if is_event_sub_process(target) {
        return false;
    }
    if !target.is(T::Activity) || is_for_compensation(target) {
        return false;
    }
    if position.is_some_and(|p| !is_boundary_attachment(p, target)) {
        return false;
    }
    !is_receive_task_after_event_based_gateway(d, target)
}

/// Element type changes a move onto `target` implies, if any.
pub fn can_replace(
    d: &Diagram,
    elements: &[Node<'_>],
    target: Option<Node<'_>>,
    position: Option<Point>,
) -> Option<Vec<Replacement>> {
    let target = target?;
    let mut replacements = Vec::new();
    let mut replace = |element: Node<'_>, new_element_type: BpmnType| {
        replacements.push(Replacement {
            old_element_id: element.id(),
            new_element_type,
        });
    };

    for &element in elements {
        if !is_event_sub_process(target)
            && element.is(T::StartEvent)
            && !element.is_label()
            && can_drop(d, element, target)
        {
            // start events outside of event sub-processes are interrupting
            if !element.element.is_interrupting() {
                replace(element, T::StartEvent);
            }
            // and never error, escalation or compensation triggered
            if element
                .element
                .has_any_event_definition(&[E::Error, E::Escalation, E::Compensate])
            {
                replace(element, T::StartEvent);
            }
            // plain sub-processes only start blank
            if has_common_boundary_definition(element) && target.is(T::SubProcess) {
                replace(element, T::StartEvent);
            }
        }

        if !target.is(T::Transaction)
            && element.element.has_event_definition(E::Cancel)
            && !element.is_label()
        {
            if element.is(T::EndEvent) && can_drop(d, element, target) {
                replace(element, T::EndEvent);
            }
            if element.is(T::BoundaryEvent) && can_attach(d, &[element], Some(target), position) {
                replace(element, T::BoundaryEvent);
            }
        }
    }

    (!replacements.is_empty()).then_some(replacements)
}

/// No lanes or boundary events in the selection; everything droppable on
/// `target`. Without a target the move may start.
pub fn can_move(d: &Diagram, elements: &[Node<'_>], target: Option<Node<'_>>) -> bool {
    if elements.iter().any(|e| e.is(T::Lane) || is_boundary_event(*e)) {
        return false;
    }
    match target {
        None => true,
        Some(target) => elements.iter().all(|e| can_drop(d, *e, target)),
    }
}

/// A single flow node dropped onto a sequence or message flow it is not an
/// end of.
pub fn can_insert(
    d: &Diagram,
    elements: &[Node<'_>],
    connection: Option<Node<'_>>,
    _position: Option<Point>,
) -> bool {
    let ([shape], Some(connection)) = (elements, connection) else {
        return false;
    };
    if !connection.in_diagram {
        return false;
    }
    let id = shape.id();
    if d.source(connection.id()) == Some(id) || d.target(connection.id()) == Some(id) {
        return false;
    }
    if !connection.is_any(&[T::SequenceFlow, T::MessageFlow]) || connection.is_label() {
        return false;
    }
    if !shape.is(T::FlowNode) || shape.is(T::BoundaryEvent) {
        return false;
    }
    connection
        .parent
        .and_then(|parent| Node::of(d, parent))
        .is_some_and(|parent| can_drop(d, *shape, parent))
}

pub fn can_create(
    d: &Diagram,
    shape: Node<'_>,
    target: Option<Node<'_>>,
    source: Option<Node<'_>>,
    position: Option<Point>,
) -> bool {
    let Some(target) = target else {
        return false;
    };
    if shape.is_label() || is_group(shape) {
        return true;
    }
    if let Some(source) = source {
        // never into the element it is appended to
        if source.id() == target.id() || is_parent(d, source, target) {
            return false;
        }
    }
    can_drop(d, shape, target) || can_insert(d, &[shape], Some(target), position)
}

// ─── Copy / paste ─────────────────────────────────────────────────────────

/// Lanes are copied with their parent, boundary events with their host.
pub fn can_copy(d: &Diagram, elements: &[Node<'_>], element: Node<'_>) -> bool {
    if element.is_label() {
        return true;
    }
    let includes = |id: Option<ElementId>| id.is_some_and(|id| elements.iter().any(|e| e.id() == id));
    if element.is(T::Lane) && !includes(element.parent) {
        return false;
    }
    if is_boundary_event(element) && !includes(element.host(d)) {
        return false;
    }
    true
}

/// Whether `target` accepts the top level of a paste tree.
pub fn can_paste(d: &Diagram, tree: &[Vec<PasteDescriptor>], target: Node<'_>) -> bool {
    let top_level = tree.first().map(Vec::as_slice).unwrap_or_default();

    if target.is(T::Collaboration) {
        return top_level.iter().all(|e| e.bpmn_type == T::Participant);
    }
    if target.is(T::Process) {
        let has_participants = top_level.iter().any(|e| e.bpmn_type == T::Participant);
        return !(has_participants && !d.children(target.id()).is_empty());
    }
    if target.is(T::Participant) && !target.element.is_expanded() {
        return false;
    }
    if target.is(T::FlowElementsContainer) {
        return target.element.is_expanded();
    }
    target.is_any(&[T::Collaboration, T::Lane, T::Participant, T::Process, T::SubProcess])
}
