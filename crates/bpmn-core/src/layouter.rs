//! BPMN connection layout.
//!
//! Picks a preferred manhattan layout per connection from the BPMN types at
//! either end, then repairs or routes the connection with
//! [`repair_connection`]. Vertical diagrams are routed in transposed
//! coordinates so every preference below reads as the horizontal case.

use crate::bpmn::BpmnType;
use crate::config::{FlowDirection, LayoutConfig};
use crate::error::LayoutError;
use crate::geometry::{Bounds, Orientation, Padding, Point, Waypoint, get_orientation, get_point_orientation};
use crate::id::ElementId;
use crate::manhattan::{
    Direction, Directions, ManhattanHints, PreferredLayout, PreserveDocking, repair_connection,
    without_redundant_points,
};
use crate::model::{Diagram, Element};
use serde::{Deserialize, Serialize};

/// How far a boundary event may sit inside its host and still count as
/// attached to that side.
pub const ATTACH_ORIENTATION_PADDING: f32 = -10.0;

/// A boundary-to-host loop ending closer than this to a host corner (or
/// to the boundary event itself) enters through an adjacent side.
pub const BOUNDARY_TO_HOST_THRESHOLD: f32 = 40.0;

/// Overrides for a single layout call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutHints {
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
    pub waypoints: Option<Vec<Waypoint>>,
    /// New start docking; also marks the start as moved.
    pub connection_start: Option<Point>,
    /// New end docking; also marks the end as moved.
    pub connection_end: Option<Point>,
    pub preferred_layouts: Option<Vec<PreferredLayout>>,
    pub preserve_docking: Option<PreserveDocking>,
}

/// Computes the waypoints of a connection.
pub trait Layouter {
    fn layout_connection(
        &self,
        diagram: &Diagram,
        connection: &Element,
        hints: &LayoutHints,
    ) -> Result<Vec<Waypoint>, LayoutError>;
}

/// Straight mid-to-mid connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseLayouter;

impl Layouter for BaseLayouter {
    fn layout_connection(
        &self,
        diagram: &Diagram,
        connection: &Element,
        hints: &LayoutHints,
    ) -> Result<Vec<Waypoint>, LayoutError> {
        let (source, target) = endpoints(diagram, connection, hints)?;
        Ok(vec![
            Waypoint::from(layout_bounds(source)?.mid()).round(),
            Waypoint::from(layout_bounds(target)?.mid()).round(),
        ])
    }
}

/// The BPMN-aware layouter.
#[derive(Debug, Clone, Copy, Default)]
pub struct BpmnLayouter {
    pub config: LayoutConfig,
}

impl BpmnLayouter {
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Flow direction at `element`: the nearest participant or lane stating
    /// `isHorizontal`, else any participant in the diagram that does, else
    /// the configured default.
    pub fn flow_direction(&self, diagram: &Diagram, element: &Element) -> FlowDirection {
        let explicit = |e: &Element| {
            if e.is_any(&[BpmnType::Participant, BpmnType::Lane]) {
                e.props.is_horizontal
            } else {
                None
            }
        };
        std::iter::once(element.id)
            .chain(diagram.ancestors(element.id))
            .filter_map(|id| diagram.get(id))
            .find_map(explicit)
            .or_else(|| {
                diagram
                    .elements()
                    .filter(|e| e.is(BpmnType::Participant))
                    .find_map(|e| e.props.is_horizontal)
            })
            .map(FlowDirection::from_is_horizontal)
            .unwrap_or(self.config.direction)
    }
}

impl Layouter for BpmnLayouter {
    fn layout_connection(
        &self,
        diagram: &Diagram,
        connection: &Element,
        hints: &LayoutHints,
    ) -> Result<Vec<Waypoint>, LayoutError> {
        let (source, target) = endpoints(diagram, connection, hints)?;
        let waypoints: &[Waypoint] = hints
            .waypoints
            .as_deref()
            .or_else(|| connection.waypoints())
            .unwrap_or(&[]);

        let frame = Frame {
            vertical: !self.flow_direction(diagram, source).is_horizontal(),
        };
        let source_bounds = frame.bounds(layout_bounds(source)?);
        let target_bounds = frame.bounds(layout_bounds(target)?);
        let waypoints: Vec<Waypoint> = waypoints.iter().map(|w| frame.waypoint(*w)).collect();

        let start = hints
            .connection_start
            .map(|p| frame.point(p))
            .unwrap_or_else(|| connection_docking(waypoints.first(), &source_bounds));
        let end = hints
            .connection_end
            .map(|p| frame.point(p))
            .unwrap_or_else(|| connection_docking(waypoints.last(), &target_bounds));

        if connection.is_any(&[BpmnType::Association, BpmnType::DataAssociation])
            && !waypoints.is_empty()
            && !is_compensation_association(source, target)
        {
            // keep the drawn path, re-dock the ends
            let inner = &waypoints[1..waypoints.len().saturating_sub(1).max(1)];
            let path: Vec<Waypoint> = std::iter::once(Waypoint::from(start))
                .chain(inner.iter().copied())
                .chain(std::iter::once(Waypoint::from(end)))
                .collect();
            return Ok(frame.finalize(path));
        }

        let host_bounds = diagram
            .host(source.id)
            .and_then(|host| diagram.bounds(host))
            .map(|b| frame.bounds(b));

        let preferences = if connection.is(BpmnType::MessageFlow) {
            Some(message_flow_options(source, target))
        } else if connection.is(BpmnType::SequenceFlow) || is_compensation_association(source, target) {
            Some(sequence_flow_options(
                source,
                target,
                &source_bounds,
                &target_bounds,
                host_bounds.as_ref(),
                diagram.host(source.id) == Some(target.id),
                waypoints.first().map(Waypoint::point),
                end,
            ))
        } else {
            None
        };

        let Some(mut options) = preferences else {
            return Ok(frame.finalize(vec![Waypoint::from(start), Waypoint::from(end)]));
        };

        if let Some(layouts) = &hints.preferred_layouts {
            options.preferred_layouts = layouts.iter().map(|l| frame.layout(*l)).collect();
        }
        if hints.preserve_docking.is_some() {
            options.preserve_docking = hints.preserve_docking;
        }
        options.start_changed = hints.connection_start.is_some();
        options.end_changed = hints.connection_end.is_some();

        log::trace!(
            "layout {}: {:?} (vertical: {})",
            connection.id,
            options.preferred_layouts,
            frame.vertical
        );

        let repaired = repair_connection(
            &source_bounds,
            &target_bounds,
            Some(start),
            Some(end),
            &waypoints,
            &options,
        );
        Ok(frame.finalize(without_redundant_points(&repaired)))
    }
}

// ─── Preferences ──────────────────────────────────────────────────────────

fn message_flow_options(source: &Element, target: &Element) -> ManhattanHints {
    ManhattanHints {
        preserve_docking: message_flow_preserve_docking(source, target),
        ..ManhattanHints::preferring([PreferredLayout::Straight, Directions::V_V.into()])
    }
}

/// Participants, then expanded sub-processes, then events keep their docking.
fn message_flow_preserve_docking(source: &Element, target: &Element) -> Option<PreserveDocking> {
    if target.is(BpmnType::Participant) {
        Some(PreserveDocking::Source)
    } else if source.is(BpmnType::Participant) {
        Some(PreserveDocking::Target)
    } else if is_expanded_sub_process(target) {
        Some(PreserveDocking::Source)
    } else if is_expanded_sub_process(source) {
        Some(PreserveDocking::Target)
    } else if target.is(BpmnType::Event) {
        Some(PreserveDocking::Target)
    } else if source.is(BpmnType::Event) {
        Some(PreserveDocking::Source)
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn sequence_flow_options(
    source: &Element,
    target: &Element,
    source_bounds: &Bounds,
    target_bounds: &Bounds,
    host_bounds: Option<&Bounds>,
    is_host_loop: bool,
    first_waypoint: Option<Point>,
    end: Point,
) -> ManhattanHints {
    if source.id == target.id {
        let layout = loop_layout(source_bounds, first_waypoint);
        return ManhattanHints::preferring([layout.into()]);
    }

    if source.is(BpmnType::BoundaryEvent) {
        if let Some(host) = host_bounds {
            let layout = boundary_event_layout(source_bounds, host, target_bounds, is_host_loop, end);
            return ManhattanHints::preferring([layout.into()]);
        }
    }

    if is_expanded_sub_process(source) || is_expanded_sub_process(target) {
        let preserve = if is_expanded_sub_process(source) {
            PreserveDocking::Target
        } else {
            PreserveDocking::Source
        };
        return ManhattanHints {
            preserve_docking: Some(preserve),
            ..ManhattanHints::preferring([PreferredLayout::Straight, Directions::H_H.into()])
        };
    }

    let layout = if source.is(BpmnType::Gateway) {
        Directions::V_H
    } else if target.is(BpmnType::Gateway) {
        Directions::H_V
    } else {
        Directions::H_H
    };
    ManhattanHints::preferring([layout.into()])
}

/// A loop keeps circling clockwise from the side it currently leaves.
fn loop_layout(bounds: &Bounds, first_waypoint: Option<Point>) -> Directions {
    let side = first_waypoint.map(|p| get_point_orientation(p, bounds, 0.0));
    match side {
        Some(Orientation::Top) => Directions::new(Direction::T, Direction::R),
        Some(Orientation::Right) => Directions::new(Direction::R, Direction::B),
        Some(Orientation::Left) => Directions::new(Direction::L, Direction::T),
        _ => Directions::new(Direction::B, Direction::L),
    }
}

fn side_direction(side: Option<Orientation>) -> Direction {
    side.and_then(Direction::from_side).unwrap_or(Direction::B)
}

fn boundary_event_layout(
    source: &Bounds,
    host: &Bounds,
    target: &Bounds,
    is_host_loop: bool,
    end: Point,
) -> Directions {
    let attach = get_point_orientation(source.mid(), host, ATTACH_ORIENTATION_PADDING);
    let attached_to_side = attach.is_side();

    if is_host_loop {
        return boundary_event_loop_layout(attach, attached_to_side, source, target, end);
    }

    let target_orientation = get_orientation(
        &Bounds::at_point(target.mid()),
        &Bounds::at_point(source.mid()),
        Padding {
            x: source.width / 2.0 + target.width / 2.0,
            y: source.height / 2.0 + target.height / 2.0,
        },
    );

    Directions::new(
        boundary_event_source_layout(attach, target_orientation, attached_to_side),
        boundary_event_target_layout(attach, target_orientation, attached_to_side),
    )
}

fn boundary_event_loop_layout(
    attach: Orientation,
    attached_to_side: bool,
    source: &Bounds,
    host: &Bounds,
    end: Point,
) -> Directions {
    if !attached_to_side {
        return Directions::new(side_direction(attach.vertical()), Direction::V);
    }
    let end_direction = if attach.is_horizontal_side() {
        if should_connect_to_same_side(|p| p.y, source, host, end) {
            Direction::H
        } else {
            Direction::B
        }
    } else if should_connect_to_same_side(|p| p.x, source, host, end) {
        Direction::V
    } else {
        Direction::L
    };
    Directions::new(side_direction(Some(attach)), end_direction)
}

fn should_connect_to_same_side(
    axis: impl Fn(Point) -> f32,
    source: &Bounds,
    host: &Bounds,
    end: Point,
) -> bool {
    let close = |p: Point| (axis(end) - axis(p)).abs() < BOUNDARY_TO_HOST_THRESHOLD;
    !(close(Point::new(host.x, host.y))
        || close(Point::new(host.right(), host.bottom()))
        || close(source.mid()))
}

fn boundary_event_source_layout(
    attach: Orientation,
    target_orientation: Orientation,
    attached_to_side: bool,
) -> Direction {
    if attached_to_side {
        return side_direction(Some(attach));
    }
    // corner: leave vertically when the target lies on the same vertical side
    // or on the opposite horizontal side
    let same_vertical = attach.vertical() == target_orientation.vertical();
    let opposite_horizontal = matches!(
        (attach.horizontal(), target_orientation.horizontal()),
        (Some(a), Some(t)) if a.opposite() == t
    );
    if same_vertical || opposite_horizontal {
        side_direction(attach.vertical())
    } else {
        side_direction(attach.horizontal())
    }
}

fn boundary_event_target_layout(
    attach: Orientation,
    target_orientation: Orientation,
    attached_to_side: bool,
) -> Direction {
    if attached_to_side {
        if attach.is_horizontal_side() {
            let opposite = attach
                .horizontal()
                .is_some_and(|h| target_orientation.mentions(h.opposite()));
            return if opposite || attach == target_orientation {
                Direction::H
            } else {
                Direction::V
            };
        }
        let opposite = attach
            .vertical()
            .is_some_and(|v| target_orientation.mentions(v.opposite()));
        return if opposite || attach == target_orientation {
            Direction::V
        } else {
            Direction::H
        };
    }

    if target_orientation.is_horizontal_side()
        || (attach.vertical() == target_orientation.vertical()
            && target_orientation.horizontal().is_some())
    {
        Direction::H
    } else {
        Direction::V
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────

fn endpoints<'a>(
    diagram: &'a Diagram,
    connection: &Element,
    hints: &LayoutHints,
) -> Result<(&'a Element, &'a Element), LayoutError> {
    let source = hints
        .source
        .or_else(|| diagram.source(connection.id))
        .ok_or(LayoutError::MissingEndpoint(connection.id, "source"))?;
    let target = hints
        .target
        .or_else(|| diagram.target(connection.id))
        .ok_or(LayoutError::MissingEndpoint(connection.id, "target"))?;
    Ok((
        diagram.get(source).ok_or(LayoutError::MissingBounds(source))?,
        diagram.get(target).ok_or(LayoutError::MissingBounds(target))?,
    ))
}

/// Shape bounds, or the bounding box of a connection's waypoints.
fn layout_bounds(element: &Element) -> Result<Bounds, LayoutError> {
    if let Some(bounds) = element.bounds() {
        return Ok(bounds);
    }
    let waypoints = element
        .waypoints()
        .filter(|w| !w.is_empty())
        .ok_or(LayoutError::MissingBounds(element.id))?;
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for w in waypoints {
        min_x = min_x.min(w.x);
        min_y = min_y.min(w.y);
        max_x = max_x.max(w.x);
        max_y = max_y.max(w.y);
    }
    Ok(Bounds::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

fn connection_docking(waypoint: Option<&Waypoint>, bounds: &Bounds) -> Point {
    waypoint.map(Waypoint::docking).unwrap_or_else(|| bounds.mid())
}

fn is_expanded_sub_process(element: &Element) -> bool {
    element.is(BpmnType::SubProcess) && element.is_expanded()
}

fn is_compensation_association(source: &Element, target: &Element) -> bool {
    target.is(BpmnType::Activity)
        && source.is(BpmnType::BoundaryEvent)
        && target.props.is_for_compensation
}

/// Coordinate frame layout runs in: identity, or transposed for vertical flow.
struct Frame {
    vertical: bool,
}

impl Frame {
    fn bounds(&self, b: Bounds) -> Bounds {
        if self.vertical { b.transpose() } else { b }
    }

    fn point(&self, p: Point) -> Point {
        if self.vertical { p.transpose() } else { p }
    }

    fn waypoint(&self, w: Waypoint) -> Waypoint {
        if self.vertical { w.transpose() } else { w }
    }

    fn layout(&self, layout: PreferredLayout) -> PreferredLayout {
        match layout {
            PreferredLayout::Manhattan(d) if self.vertical => PreferredLayout::Manhattan(d.transpose()),
            other => other,
        }
    }

    /// Back to diagram coordinates, rounded to whole pixels for storage.
    fn finalize(&self, waypoints: Vec<Waypoint>) -> Vec<Waypoint> {
        waypoints
            .into_iter()
            .map(|w| self.waypoint(w).round())
            .collect()
    }
}
