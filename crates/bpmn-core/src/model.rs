//! The element graph a BPMN diagram is modeled as.
//!
//! Every diagram element (root, shape, connection, label) is a node of a
//! `StableDiGraph`. Edges carry a [`Relation`]: containment runs parent →
//! child, a connection hangs between `source → connection → target`,
//! boundary events hang off their host, labels off the element they name.
//! Child order is kept explicitly per parent, so the graph can answer
//! `children()` in document order and re-insert a removed element at the
//! exact slot it came from.

use crate::bpmn::{BpmnType, EventDefinition};
use crate::error::ModelError;
use crate::geometry::{Bounds, Waypoint};
use crate::id::ElementId;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Elements ────────────────────────────────────────────────────────────

/// What an element is drawn as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// The diagram root (a process or a collaboration).
    Root,
    /// A rectangular shape.
    Shape { bounds: Bounds },
    /// A polyline between a source and a target.
    Connection { waypoints: Vec<Waypoint> },
    /// An external label of another element.
    Label { bounds: Bounds },
}

/// Direction markers of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssociationDirection {
    #[default]
    None,
    One,
    Both,
}

/// Semantic and diagram-interchange attributes the kernel reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Properties {
    pub name: Option<String>,
    /// Sub-processes only: drawn expanded (children visible).
    pub is_expanded: bool,
    pub triggered_by_event: bool,
    /// Boundary events: interrupting when `true`.
    pub cancel_activity: bool,
    /// Start events: interrupting when `true`.
    pub is_interrupting: bool,
    pub is_for_compensation: bool,
    pub event_definitions: SmallVec<[EventDefinition; 1]>,
    /// Participants: the process the pool shows. `None` means a collapsed pool.
    pub process_ref: Option<ElementId>,
    /// Participants and lanes: flow direction of the pool.
    pub is_horizontal: Option<bool>,
    pub association_direction: Option<AssociationDirection>,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            name: None,
            is_expanded: false,
            triggered_by_event: false,
            cancel_activity: true,
            is_interrupting: true,
            is_for_compensation: false,
            event_definitions: SmallVec::new(),
            process_ref: None,
            is_horizontal: None,
            association_direction: None,
        }
    }
}

/// A single element of the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub bpmn_type: BpmnType,
    pub kind: ElementKind,
    #[serde(default)]
    pub props: Properties,
}

impl Element {
    pub fn new(id: ElementId, bpmn_type: BpmnType, kind: ElementKind) -> Self {
        Self {
            id,
            bpmn_type,
            kind,
            props: Properties::default(),
        }
    }

    pub fn root(id: impl Into<ElementId>, bpmn_type: BpmnType) -> Self {
        Self::new(id.into(), bpmn_type, ElementKind::Root)
    }

    pub fn shape(id: impl Into<ElementId>, bpmn_type: BpmnType, bounds: Bounds) -> Self {
        Self::new(id.into(), bpmn_type, ElementKind::Shape { bounds })
    }

    pub fn connection(
        id: impl Into<ElementId>,
        bpmn_type: BpmnType,
        waypoints: Vec<Waypoint>,
    ) -> Self {
        Self::new(id.into(), bpmn_type, ElementKind::Connection { waypoints })
    }

    /// A label carries the type of the element it names.
    pub fn label(id: impl Into<ElementId>, bpmn_type: BpmnType, bounds: Bounds) -> Self {
        Self::new(id.into(), bpmn_type, ElementKind::Label { bounds })
    }

    // ─── Builders ────────────────────────────────────────────────────────

    pub fn expanded(mut self) -> Self {
        self.props.is_expanded = true;
        self
    }

    pub fn with_event_definition(mut self, definition: EventDefinition) -> Self {
        self.props.event_definitions.push(definition);
        self
    }

    pub fn with_process_ref(mut self, process: impl Into<ElementId>) -> Self {
        self.props.process_ref = Some(process.into());
        self
    }

    pub fn with_props(mut self, f: impl FnOnce(&mut Properties)) -> Self {
        f(&mut self.props);
        self
    }

    // ─── Kind queries ────────────────────────────────────────────────────

    pub fn is_root(&self) -> bool {
        matches!(self.kind, ElementKind::Root)
    }

    pub fn is_shape(&self) -> bool {
        matches!(self.kind, ElementKind::Shape { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self.kind, ElementKind::Connection { .. })
    }

    pub fn is_label(&self) -> bool {
        matches!(self.kind, ElementKind::Label { .. })
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self.kind {
            ElementKind::Shape { bounds } | ElementKind::Label { bounds } => Some(bounds),
            _ => None,
        }
    }

    pub fn waypoints(&self) -> Option<&[Waypoint]> {
        match &self.kind {
            ElementKind::Connection { waypoints } => Some(waypoints),
            _ => None,
        }
    }

    // ─── BPMN queries ────────────────────────────────────────────────────

    pub fn is(&self, ty: BpmnType) -> bool {
        self.bpmn_type.is(ty)
    }

    pub fn is_any(&self, types: &[BpmnType]) -> bool {
        self.bpmn_type.is_any(types)
    }

    /// Call activities are never expanded; participants are expanded when
    /// they reference a process; sub-processes carry the flag explicitly.
    pub fn is_expanded(&self) -> bool {
        if self.is(BpmnType::CallActivity) {
            return false;
        }
        if self.is(BpmnType::SubProcess) {
            return self.props.is_expanded;
        }
        if self.is(BpmnType::Participant) {
            return self.props.process_ref.is_some();
        }
        true
    }

    pub fn is_event_sub_process(&self) -> bool {
        self.is(BpmnType::SubProcess) && self.props.triggered_by_event
    }

    pub fn is_interrupting(&self) -> bool {
        self.props.is_interrupting
    }

    pub fn has_event_definition(&self, definition: EventDefinition) -> bool {
        self.props.event_definitions.contains(&definition)
    }

    /// True when every definition is `definition`, including when there are none.
    pub fn has_event_definition_or_none(&self, definition: EventDefinition) -> bool {
        self.props
            .event_definitions
            .iter()
            .all(|d| *d == definition)
    }

    pub fn has_no_event_definition(&self) -> bool {
        self.props.event_definitions.is_empty()
    }

    pub fn has_any_event_definition(&self, definitions: &[EventDefinition]) -> bool {
        definitions.iter().any(|d| self.has_event_definition(*d))
    }
}

// ─── Relations ───────────────────────────────────────────────────────────

/// Edge weights of the element graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// parent → child
    Contains,
    /// source shape → connection
    Source,
    /// connection → target shape
    Target,
    /// host → attached boundary element
    Attach,
    /// labelled element → label
    Label,
}

/// An element taken out of the diagram together with every relation needed
/// to put it back exactly where it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedElement {
    pub element: Element,
    pub parent: Option<ElementId>,
    pub index: usize,
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
    pub host: Option<ElementId>,
    pub label_target: Option<ElementId>,
}

// ─── Diagram ─────────────────────────────────────────────────────────────

/// The complete element graph of one diagram.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    /// The underlying directed graph.
    pub graph: StableDiGraph<Element, Relation>,

    root: Option<NodeIndex>,

    /// Index from ElementId → NodeIndex for fast lookup.
    id_index: HashMap<ElementId, NodeIndex>,

    /// Children of each parent in document order.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl Diagram {
    /// Create a new, empty diagram (no root yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a diagram with the given root element.
    pub fn with_root(root: Element) -> Result<Self, ModelError> {
        let mut diagram = Self::new();
        diagram.set_root(root)?;
        Ok(diagram)
    }

    /// Install the root. A diagram has exactly one.
    pub fn set_root(&mut self, mut root: Element) -> Result<ElementId, ModelError> {
        if let Some(existing) = self.root_id() {
            return Err(ModelError::RootExists(existing));
        }
        if self.id_index.contains_key(&root.id) {
            return Err(ModelError::DuplicateId(root.id));
        }
        root.kind = ElementKind::Root;
        let id = root.id;
        let idx = self.graph.add_node(root);
        self.id_index.insert(id, idx);
        self.root = Some(idx);
        Ok(id)
    }

    pub fn root(&self) -> Option<&Element> {
        self.root.map(|idx| &self.graph[idx])
    }

    pub fn root_id(&self) -> Option<ElementId> {
        self.root().map(|r| r.id)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Look up an element by id.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up an element mutably by id.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    /// Like [`get`](Self::get), but a missing element is an error.
    pub fn element(&self, id: ElementId) -> Result<&Element, ModelError> {
        self.get(id).ok_or(ModelError::NotFound(id))
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.graph.node_weights()
    }

    fn index_of(&self, id: ElementId) -> Result<NodeIndex, ModelError> {
        self.id_index
            .get(&id)
            .copied()
            .ok_or(ModelError::NotFound(id))
    }

    // ─── Containment ─────────────────────────────────────────────────────

    /// Add a shape (or label, or connection without endpoints) as a child of
    /// `parent`, at `index` or appended.
    pub fn add_child(
        &mut self,
        element: Element,
        parent: ElementId,
        index: Option<usize>,
    ) -> Result<(), ModelError> {
        if self.id_index.contains_key(&element.id) {
            return Err(ModelError::DuplicateId(element.id));
        }
        if element.is_root() {
            return Err(ModelError::WrongKind {
                id: element.id,
                expected: "non-root element",
            });
        }
        let parent_idx = self.index_of(parent)?;
        let id = element.id;
        let idx = self.graph.add_node(element);
        self.id_index.insert(id, idx);
        self.link_child(parent_idx, idx, index);
        Ok(())
    }

    /// Add a shape as the last child of `parent`.
    pub fn add_shape(&mut self, shape: Element, parent: ElementId) -> Result<(), ModelError> {
        if !shape.is_shape() {
            return Err(ModelError::WrongKind {
                id: shape.id,
                expected: "shape",
            });
        }
        self.add_child(shape, parent, None)
    }

    /// Add a connection between `source` and `target`, owned by `parent`.
    pub fn add_connection(
        &mut self,
        connection: Element,
        parent: ElementId,
        source: ElementId,
        target: ElementId,
    ) -> Result<(), ModelError> {
        if !connection.is_connection() {
            return Err(ModelError::WrongKind {
                id: connection.id,
                expected: "connection",
            });
        }
        let source_idx = self.index_of(source)?;
        let target_idx = self.index_of(target)?;
        let id = connection.id;
        self.add_child(connection, parent, None)?;
        let idx = self.index_of(id)?;
        self.graph.add_edge(source_idx, idx, Relation::Source);
        self.graph.add_edge(idx, target_idx, Relation::Target);
        Ok(())
    }

    /// Add a label for `target`, owned by `parent`.
    pub fn add_label(
        &mut self,
        label: Element,
        target: ElementId,
        parent: ElementId,
    ) -> Result<(), ModelError> {
        if !label.is_label() {
            return Err(ModelError::WrongKind {
                id: label.id,
                expected: "label",
            });
        }
        let target_idx = self.index_of(target)?;
        let id = label.id;
        self.add_child(label, parent, None)?;
        let idx = self.index_of(id)?;
        self.graph.add_edge(target_idx, idx, Relation::Label);
        Ok(())
    }

    fn link_child(&mut self, parent: NodeIndex, child: NodeIndex, index: Option<usize>) {
        self.graph.add_edge(parent, child, Relation::Contains);
        let order = self.child_order.entry(parent).or_default();
        let at = index.unwrap_or(order.len()).min(order.len());
        order.insert(at, child);
    }

    /// Remove the containment edge and the child-order slot in one go.
    /// Returns the former position.
    fn unlink_child(&mut self, child: NodeIndex) -> Option<(NodeIndex, usize)> {
        let parent = self.parent_index(child)?;
        if let Some(edge) = self.find_relation(parent, child, Relation::Contains) {
            self.graph.remove_edge(edge);
        }
        let order = self.child_order.get_mut(&parent)?;
        let pos = order.iter().position(|c| *c == child)?;
        order.remove(pos);
        Some((parent, pos))
    }

    fn find_relation(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        relation: Relation,
    ) -> Option<petgraph::stable_graph::EdgeIndex> {
        self.graph
            .edges_connecting(from, to)
            .find(|e| *e.weight() == relation)
            .map(|e| e.id())
    }

    fn parent_index(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.related(idx, Relation::Contains, Direction::Incoming)
            .into_iter()
            .next()
    }

    /// Nodes related to `idx` by `relation` in `direction`, in index order.
    fn related(&self, idx: NodeIndex, relation: Relation, direction: Direction) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, direction)
            .filter(|e| *e.weight() == relation)
            .map(|e| match direction {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .collect();
        // petgraph iterates newest-first; keep it deterministic
        out.sort();
        out
    }

    fn related_ids(&self, id: ElementId, relation: Relation, direction: Direction) -> Vec<ElementId> {
        match self.id_index.get(&id) {
            Some(idx) => self
                .related(*idx, relation, direction)
                .into_iter()
                .map(|i| self.graph[i].id)
                .collect(),
            None => Vec::new(),
        }
    }

    fn related_one(&self, id: ElementId, relation: Relation, direction: Direction) -> Option<ElementId> {
        self.related_ids(id, relation, direction).into_iter().next()
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        let idx = self.id_index.get(&id)?;
        self.parent_index(*idx).map(|p| self.graph[p].id)
    }

    /// Children of an element in document order.
    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.id_index
            .get(&id)
            .and_then(|idx| self.child_order.get(idx))
            .map(|order| order.iter().map(|c| self.graph[*c].id).collect())
            .unwrap_or_default()
    }

    /// Parent, grandparent, … up to the root (nearest first).
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Check if `ancestor_id` is a parent/grandparent/etc. of `descendant_id`.
    pub fn is_ancestor_of(&self, ancestor_id: ElementId, descendant_id: ElementId) -> bool {
        ancestor_id != descendant_id && self.ancestors(descendant_id).contains(&ancestor_id)
    }

    /// Move `id` under `new_parent` at `index` (appended when `None`).
    /// Returns the previous parent and position.
    pub fn set_parent(
        &mut self,
        id: ElementId,
        new_parent: ElementId,
        index: Option<usize>,
    ) -> Result<(Option<ElementId>, usize), ModelError> {
        let idx = self.index_of(id)?;
        let parent_idx = self.index_of(new_parent)?;
        if id == new_parent || self.is_ancestor_of(id, new_parent) {
            return Err(ModelError::Cycle(id));
        }
        let previous = self.unlink_child(idx);
        self.link_child(parent_idx, idx, index);
        Ok(match previous {
            Some((p, pos)) => (Some(self.graph[p].id), pos),
            None => (None, 0),
        })
    }

    // ─── Connections ─────────────────────────────────────────────────────

    pub fn source(&self, connection: ElementId) -> Option<ElementId> {
        self.related_one(connection, Relation::Source, Direction::Incoming)
    }

    pub fn target(&self, connection: ElementId) -> Option<ElementId> {
        self.related_one(connection, Relation::Target, Direction::Outgoing)
    }

    /// Connections ending at `shape`.
    pub fn incoming(&self, shape: ElementId) -> Vec<ElementId> {
        self.related_ids(shape, Relation::Target, Direction::Incoming)
    }

    /// Connections starting at `shape`.
    pub fn outgoing(&self, shape: ElementId) -> Vec<ElementId> {
        self.related_ids(shape, Relation::Source, Direction::Outgoing)
    }

    /// Re-point a connection. Returns the previous `(source, target)`.
    pub fn reconnect(
        &mut self,
        connection: ElementId,
        source: ElementId,
        target: ElementId,
    ) -> Result<(Option<ElementId>, Option<ElementId>), ModelError> {
        let idx = self.index_of(connection)?;
        let source_idx = self.index_of(source)?;
        let target_idx = self.index_of(target)?;
        let previous = (self.source(connection), self.target(connection));
        let stale: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|e| *e.weight() == Relation::Source)
            .chain(
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .filter(|e| *e.weight() == Relation::Target),
            )
            .map(|e| e.id())
            .collect();
        for edge in stale {
            self.graph.remove_edge(edge);
        }
        self.graph.add_edge(source_idx, idx, Relation::Source);
        self.graph.add_edge(idx, target_idx, Relation::Target);
        Ok(previous)
    }

    // ─── Attachments & labels ────────────────────────────────────────────

    pub fn host(&self, id: ElementId) -> Option<ElementId> {
        self.related_one(id, Relation::Attach, Direction::Incoming)
    }

    pub fn attachers(&self, host: ElementId) -> Vec<ElementId> {
        self.related_ids(host, Relation::Attach, Direction::Outgoing)
    }

    /// Attach `id` to `host`, or detach it with `None`. Returns the previous host.
    pub fn set_host(
        &mut self,
        id: ElementId,
        host: Option<ElementId>,
    ) -> Result<Option<ElementId>, ModelError> {
        let idx = self.index_of(id)?;
        let previous = self.host(id);
        if let Some(old) = previous {
            let old_idx = self.index_of(old)?;
            if let Some(edge) = self.find_relation(old_idx, idx, Relation::Attach) {
                self.graph.remove_edge(edge);
            }
        }
        if let Some(host) = host {
            let host_idx = self.index_of(host)?;
            self.graph.add_edge(host_idx, idx, Relation::Attach);
        }
        Ok(previous)
    }

    pub fn label_target(&self, label: ElementId) -> Option<ElementId> {
        self.related_one(label, Relation::Label, Direction::Incoming)
    }

    pub fn labels(&self, id: ElementId) -> Vec<ElementId> {
        self.related_ids(id, Relation::Label, Direction::Outgoing)
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    pub fn bounds(&self, id: ElementId) -> Option<Bounds> {
        self.get(id).and_then(Element::bounds)
    }

    pub fn set_bounds(&mut self, id: ElementId, new_bounds: Bounds) -> Result<Bounds, ModelError> {
        let element = self.get_mut(id).ok_or(ModelError::NotFound(id))?;
        match &mut element.kind {
            ElementKind::Shape { bounds } | ElementKind::Label { bounds } => {
                Ok(std::mem::replace(bounds, new_bounds))
            }
            _ => Err(ModelError::WrongKind {
                id,
                expected: "shape",
            }),
        }
    }

    pub fn waypoints(&self, id: ElementId) -> Option<&[Waypoint]> {
        self.get(id).and_then(Element::waypoints)
    }

    pub fn set_waypoints(
        &mut self,
        id: ElementId,
        new_waypoints: Vec<Waypoint>,
    ) -> Result<Vec<Waypoint>, ModelError> {
        let element = self.get_mut(id).ok_or(ModelError::NotFound(id))?;
        match &mut element.kind {
            ElementKind::Connection { waypoints } => Ok(std::mem::replace(waypoints, new_waypoints)),
            _ => Err(ModelError::WrongKind {
                id,
                expected: "connection",
            }),
        }
    }

    // ─── Removal ─────────────────────────────────────────────────────────

    /// Take an element out of the diagram with all of its relations.
    ///
    /// Anything that still depends on it (children, connections, attached
    /// boundary events, labels) must be detached first; the element is then
    /// unlinked from its parent and endpoints atomically.
    pub fn detach(&mut self, id: ElementId) -> Result<DetachedElement, ModelError> {
        let idx = self.index_of(id)?;
        if self.root == Some(idx) {
            return Err(ModelError::WrongKind {
                id,
                expected: "non-root element",
            });
        }
        let dependents = [
            (!self.children(id).is_empty(), "children"),
            (
                !self.incoming(id).is_empty() || !self.outgoing(id).is_empty(),
                "connections",
            ),
            (!self.attachers(id).is_empty(), "attached elements"),
            (!self.labels(id).is_empty(), "labels"),
        ];
        if let Some((_, what)) = dependents.into_iter().find(|(has, _)| *has) {
            return Err(ModelError::HasDependents { id, what });
        }

        let source = self.source(id);
        let target = self.target(id);
        let host = self.host(id);
        let label_target = self.label_target(id);
        let (parent, index) = match self.unlink_child(idx) {
            Some((p, pos)) => (Some(self.graph[p].id), pos),
            None => (None, 0),
        };
        self.child_order.remove(&idx);
        self.id_index.remove(&id);
        let element = self
            .graph
            .remove_node(idx)
            .ok_or(ModelError::NotFound(id))?;

        Ok(DetachedElement {
            element,
            parent,
            index,
            source,
            target,
            host,
            label_target,
        })
    }

    /// Put a detached element back exactly where it was.
    pub fn restore(&mut self, detached: DetachedElement) -> Result<(), ModelError> {
        let DetachedElement {
            element,
            parent,
            index,
            source,
            target,
            host,
            label_target,
        } = detached;
        let id = element.id;
        let parent = parent.or(self.root_id()).ok_or(ModelError::NoRoot)?;
        // resolve every endpoint before touching the graph
        for endpoint in [source, target, host, label_target].into_iter().flatten() {
            self.index_of(endpoint)?;
        }
        self.add_child(element, parent, Some(index))?;
        let idx = self.index_of(id)?;
        if let Some(source) = source {
            let s = self.index_of(source)?;
            self.graph.add_edge(s, idx, Relation::Source);
        }
        if let Some(target) = target {
            let t = self.index_of(target)?;
            self.graph.add_edge(idx, t, Relation::Target);
        }
        if let Some(host) = host {
            let h = self.index_of(host)?;
            self.graph.add_edge(h, idx, Relation::Attach);
        }
        if let Some(label_target) = label_target {
            let l = self.index_of(label_target)?;
            self.graph.add_edge(l, idx, Relation::Label);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Waypoint;
    use pretty_assertions::assert_eq;

    fn process() -> Diagram {
        let mut d = Diagram::with_root(Element::root("Process_1", BpmnType::Process)).unwrap();
        let root = d.root_id().unwrap();
        d.add_shape(
            Element::shape("Start", BpmnType::StartEvent, Bounds::new(0.0, 0.0, 36.0, 36.0)),
            root,
        )
        .unwrap();
        d.add_shape(
            Element::shape("Task", BpmnType::Task, Bounds::new(100.0, 0.0, 100.0, 80.0)),
            root,
        )
        .unwrap();
        d.add_connection(
            Element::connection(
                "Flow",
                BpmnType::SequenceFlow,
                vec![Waypoint::new(36.0, 18.0), Waypoint::new(100.0, 18.0)],
            ),
            root,
            "Start".into(),
            "Task".into(),
        )
        .unwrap();
        d
    }

    #[test]
    fn relations_resolve_both_ways() {
        let d = process();
        let flow = ElementId::intern("Flow");
        assert_eq!(d.source(flow), Some(ElementId::intern("Start")));
        assert_eq!(d.target(flow), Some(ElementId::intern("Task")));
        assert_eq!(d.outgoing("Start".into()), vec![flow]);
        assert_eq!(d.incoming("Task".into()), vec![flow]);
        assert_eq!(d.parent(flow), d.root_id());
        assert_eq!(d.children(d.root_id().unwrap()).len(), 3);
    }

    #[test]
    fn detach_requires_dependents_gone() {
        let mut d = process();
        let err = d.detach("Task".into()).unwrap_err();
        assert_eq!(
            err,
            ModelError::HasDependents {
                id: "Task".into(),
                what: "connections"
            }
        );
    }

    #[test]
    fn detach_restore_keeps_slot() {
        let mut d = process();
        let root = d.root_id().unwrap();
        let before = d.children(root);
        let flow = d.detach("Flow".into()).unwrap();
        let start = d.detach("Start".into()).unwrap();
        assert!(d.get("Start".into()).is_none());
        assert_eq!(d.children(root), vec![ElementId::intern("Task")]);

        d.restore(start).unwrap();
        d.restore(flow).unwrap();
        assert_eq!(d.children(root), before);
        assert_eq!(d.outgoing("Start".into()), vec![ElementId::intern("Flow")]);
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut d = process();
        let root = d.root_id().unwrap();
        d.add_shape(
            Element::shape("Sub", BpmnType::SubProcess, Bounds::new(0.0, 200.0, 300.0, 200.0))
                .expanded(),
            root,
        )
        .unwrap();
        let (old_parent, old_index) = d.set_parent("Task".into(), "Sub".into(), None).unwrap();
        assert_eq!(old_parent, Some(root));
        assert_eq!(old_index, 1);
        assert!(d.is_ancestor_of("Sub".into(), "Task".into()));
        assert!(matches!(
            d.set_parent("Sub".into(), "Sub".into(), None),
            Err(ModelError::Cycle(_))
        ));
    }

    #[test]
    fn host_and_labels() {
        let mut d = process();
        let root = d.root_id().unwrap();
        d.add_shape(
            Element::shape("Boundary", BpmnType::BoundaryEvent, Bounds::new(130.0, 62.0, 36.0, 36.0)),
            root,
        )
        .unwrap();
        assert_eq!(d.set_host("Boundary".into(), Some("Task".into())).unwrap(), None);
        assert_eq!(d.attachers("Task".into()), vec![ElementId::intern("Boundary")]);

        d.add_label(
            Element::label("Start_label", BpmnType::StartEvent, Bounds::new(0.0, 40.0, 40.0, 14.0)),
            "Start".into(),
            root,
        )
        .unwrap();
        assert_eq!(d.label_target("Start_label".into()), Some(ElementId::intern("Start")));
        assert_eq!(d.labels("Start".into()), vec![ElementId::intern("Start_label")]);
    }

    #[test]
    fn expanded_semantics() {
        let collapsed = Element::shape("P", BpmnType::Participant, Bounds::default());
        assert!(!collapsed.is_expanded());
        assert!(collapsed.clone().with_process_ref("Process_2").is_expanded());
        let call = Element::shape("C", BpmnType::CallActivity, Bounds::default()).expanded();
        assert!(!call.is_expanded());
        assert!(Element::shape("T", BpmnType::Task, Bounds::default()).is_expanded());
    }
}
