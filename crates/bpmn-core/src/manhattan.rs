//! Orthogonal ("manhattan") routing between rectangles.
//!
//! Directions name how a route leaves its start and enters its end:
//! `h`/`v` leave horizontally or vertically on whichever side faces the
//! other end, `t`/`r`/`b`/`l` pin an explicit side. All math here is
//! unrounded; callers round once when they store the result.

use crate::error::LayoutError;
use crate::geometry::{
    Alignment, Axis, Bounds, Orientation, Point, Waypoint, get_orientation, get_point_orientation, in_range,
    point_in_rect, points_aligned, points_on_line,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the stub a route takes off an explicit side before turning.
pub const MIN_SEGMENT_LENGTH: f32 = 20.0;

/// Padding used when orienting two points against each other.
pub const POINT_ORIENTATION_PADDING: f32 = 5.0;

/// Slack around a shape inside which a bendpoint counts as overlapping it.
pub const INTERSECTION_THRESHOLD: f32 = 20.0;

// ─── Layout vocabulary ───────────────────────────────────────────────────

/// How a route leaves or enters a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Horizontally, through the left or right side.
    H,
    /// Vertically, through the top or bottom side.
    V,
    T,
    R,
    B,
    L,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::H | Direction::R | Direction::L)
    }

    /// Pins a concrete side.
    pub fn is_explicit(self) -> bool {
        matches!(self, Direction::T | Direction::R | Direction::B | Direction::L)
    }

    /// `h` ↔ `v`; explicit sides stay as they are.
    fn flip(self) -> Self {
        match self {
            Direction::H => Direction::V,
            Direction::V => Direction::H,
            other => other,
        }
    }

    /// Mirror across the main diagonal.
    pub(crate) fn transpose(self) -> Self {
        match self {
            Direction::H => Direction::V,
            Direction::V => Direction::H,
            Direction::T => Direction::L,
            Direction::L => Direction::T,
            Direction::R => Direction::B,
            Direction::B => Direction::R,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'h' => Direction::H,
            'v' => Direction::V,
            't' => Direction::T,
            'r' => Direction::R,
            'b' => Direction::B,
            'l' => Direction::L,
            _ => return None,
        })
    }

    fn as_char(self) -> char {
        match self {
            Direction::H => 'h',
            Direction::V => 'v',
            Direction::T => 't',
            Direction::R => 'r',
            Direction::B => 'b',
            Direction::L => 'l',
        }
    }

    /// The side an orientation names, for the four pure sides.
    pub fn from_side(side: Orientation) -> Option<Self> {
        match side {
            Orientation::Top => Some(Direction::T),
            Orientation::Right => Some(Direction::R),
            Orientation::Bottom => Some(Direction::B),
            Orientation::Left => Some(Direction::L),
            _ => None,
        }
    }
}

/// A `<start>:<end>` direction pair such as `h:v` or `b:l`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Directions {
    pub start: Direction,
    pub end: Direction,
}

impl Directions {
    pub const H_H: Directions = Directions::new(Direction::H, Direction::H);
    pub const V_V: Directions = Directions::new(Direction::V, Direction::V);
    pub const H_V: Directions = Directions::new(Direction::H, Direction::V);
    pub const V_H: Directions = Directions::new(Direction::V, Direction::H);

    pub const fn new(start: Direction, end: Direction) -> Self {
        Self { start, end }
    }

    pub fn is_explicit(self) -> bool {
        self.start.is_explicit() || self.end.is_explicit()
    }

    pub fn invert(self) -> Self {
        Self::new(self.end, self.start)
    }

    pub(crate) fn transpose(self) -> Self {
        Self::new(self.start.transpose(), self.end.transpose())
    }

    /// Orientation padding that biases rectangle orientation toward this layout.
    pub fn orientation_threshold(self) -> f32 {
        match (self.start, self.end) {
            (Direction::H, Direction::H) | (Direction::V, Direction::V) => 20.0,
            (Direction::H, Direction::V) | (Direction::V, Direction::H) => -10.0,
            _ => 0.0,
        }
    }
}

impl FromStr for Directions {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LayoutError::InvalidDirections(s.to_string());
        let (start, end) = s.split_once(':').ok_or_else(invalid)?;
        let single = |part: &str| {
            let mut chars = part.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Direction::from_char(c),
                _ => None,
            }
        };
        Ok(Self::new(
            single(start).ok_or_else(invalid)?,
            single(end).ok_or_else(invalid)?,
        ))
    }
}

impl TryFrom<String> for Directions {
    type Error = LayoutError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Directions> for String {
    fn from(d: Directions) -> Self {
        d.to_string()
    }
}

impl fmt::Display for Directions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.as_char(), self.end.as_char())
    }
}

/// One entry of a connection's layout preference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PreferredLayout {
    /// A single straight segment, when the rectangles allow one.
    Straight,
    Manhattan(Directions),
}

impl FromStr for PreferredLayout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "straight" {
            return Ok(PreferredLayout::Straight);
        }
        s.parse()
            .map(PreferredLayout::Manhattan)
            .map_err(|_| LayoutError::InvalidLayout(s.to_string()))
    }
}

impl TryFrom<String> for PreferredLayout {
    type Error = LayoutError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PreferredLayout> for String {
    fn from(layout: PreferredLayout) -> Self {
        match layout {
            PreferredLayout::Straight => "straight".to_string(),
            PreferredLayout::Manhattan(d) => d.to_string(),
        }
    }
}

impl From<Directions> for PreferredLayout {
    fn from(d: Directions) -> Self {
        PreferredLayout::Manhattan(d)
    }
}

/// Which end keeps its docking point when laying out straight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreserveDocking {
    Source,
    Target,
}

/// Routing options for [`connect_rectangles`] and [`repair_connection`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManhattanHints {
    pub preferred_layouts: Vec<PreferredLayout>,
    pub preserve_docking: Option<PreserveDocking>,
    /// The start docking moved since the waypoints were computed.
    pub start_changed: bool,
    /// The end docking moved since the waypoints were computed.
    pub end_changed: bool,
}

impl ManhattanHints {
    pub fn preferring(layouts: impl IntoIterator<Item = PreferredLayout>) -> Self {
        Self {
            preferred_layouts: layouts.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn prefers_straight(&self) -> bool {
        self.preferred_layouts.contains(&PreferredLayout::Straight)
    }

    /// First non-straight preference, `h:h` if there is none.
    pub fn preferred_directions(&self) -> Directions {
        self.preferred_layouts
            .iter()
            .find_map(|l| match l {
                PreferredLayout::Manhattan(d) => Some(*d),
                PreferredLayout::Straight => None,
            })
            .unwrap_or(Directions::H_H)
    }
}

// ─── Bendpoints ──────────────────────────────────────────────────────────

/// Bendpoints (excluding `a` and `b`) of an orthogonal route from `a` to `b`.
pub fn get_bendpoints(a: Point, b: Point, directions: Directions) -> Vec<Point> {
    if directions.is_explicit() {
        let start = start_segment(a, b, directions);
        let end = end_segment(a, b, directions);
        let mid = mid_segment(&start, &end);
        return start
            .waypoints
            .into_iter()
            .chain(mid)
            .chain(end.waypoints)
            .collect();
    }
    simple_bendpoints(a, b, directions)
}

fn simple_bendpoints(a: Point, b: Point, directions: Directions) -> Vec<Point> {
    let xmid = (b.x - a.x) / 2.0 + a.x;
    let ymid = (b.y - a.y) / 2.0 + a.y;
    match (directions.start.is_horizontal(), directions.end.is_horizontal()) {
        // one elbow beside a
        (true, false) => vec![Point::new(b.x, a.y)],
        // one elbow above or below a
        (false, true) => vec![Point::new(a.x, b.y)],
        // vertical segment halfway between a and b
        (true, true) => vec![Point::new(xmid, a.y), Point::new(xmid, b.y)],
        // horizontal segment halfway between a and b
        (false, false) => vec![Point::new(a.x, ymid), Point::new(b.x, ymid)],
    }
}

struct Segment {
    waypoints: Vec<Point>,
    directions: Directions,
    turn_next: bool,
}

fn can_layout_straight(direction: Direction, orientation: Orientation) -> bool {
    match direction {
        Direction::T => orientation.vertical() == Some(Orientation::Top),
        Direction::B => orientation.vertical() == Some(Orientation::Bottom),
        Direction::R => orientation.horizontal() == Some(Orientation::Right),
        Direction::L => orientation.horizontal() == Some(Orientation::Left),
        Direction::H => orientation.horizontal().is_some(),
        Direction::V => orientation.vertical().is_some(),
    }
}

fn segment_bendpoints(a: Point, b: Point, directions: Directions) -> Segment {
    let orientation = get_point_orientation(b, &Bounds::at_point(a), POINT_ORIENTATION_PADDING);
    let start = directions.start;
    let horizontal = start.is_horizontal();
    let xmid = (b.x - a.x) / 2.0 + a.x;
    let ymid = (b.y - a.y) / 2.0 + a.y;

    let (segment_end, segment_directions, turn_next) = if can_layout_straight(start, orientation) {
        if horizontal {
            (Point::new(xmid, a.y), Directions::H_H, false)
        } else {
            (Point::new(a.x, ymid), Directions::V_V, false)
        }
    } else if start.is_explicit() {
        // the pinned side faces away from b: take a stub off it, then turn
        if horizontal {
            let turn_next = ymid == a.y;
            let sign = if start == Direction::L { -1.0 } else { 1.0 };
            let y = if turn_next { ymid + MIN_SEGMENT_LENGTH } else { ymid };
            (
                Point::new(a.x + MIN_SEGMENT_LENGTH * sign, y),
                Directions::H_V,
                turn_next,
            )
        } else {
            let turn_next = xmid == a.x;
            let sign = if start == Direction::T { -1.0 } else { 1.0 };
            let x = if turn_next { xmid + MIN_SEGMENT_LENGTH } else { xmid };
            (
                Point::new(x, a.y + MIN_SEGMENT_LENGTH * sign),
                Directions::V_H,
                turn_next,
            )
        }
    } else if horizontal {
        (Point::new(xmid, ymid), Directions::H_V, false)
    } else {
        (Point::new(xmid, ymid), Directions::V_H, false)
    };

    let mut waypoints = simple_bendpoints(a, segment_end, segment_directions);
    waypoints.push(segment_end);
    Segment {
        waypoints,
        directions: segment_directions,
        turn_next,
    }
}

fn start_segment(a: Point, b: Point, directions: Directions) -> Segment {
    segment_bendpoints(a, b, directions)
}

fn end_segment(a: Point, b: Point, directions: Directions) -> Segment {
    let inverted = segment_bendpoints(b, a, directions.invert());
    let mut waypoints = inverted.waypoints;
    waypoints.reverse();
    Segment {
        waypoints,
        directions: inverted.directions.invert(),
        turn_next: inverted.turn_next,
    }
}

fn mid_segment(start: &Segment, end: &Segment) -> Vec<Point> {
    let mut start_direction = start.directions.end;
    let mut end_direction = end.directions.start;
    if start.turn_next {
        start_direction = start_direction.flip();
    }
    if end.turn_next {
        end_direction = end_direction.flip();
    }
    match (start.waypoints.last(), end.waypoints.first()) {
        (Some(from), Some(to)) => simple_bendpoints(
            *from,
            *to,
            Directions::new(start_direction, end_direction),
        ),
        _ => Vec::new(),
    }
}

// ─── Routing ─────────────────────────────────────────────────────────────

/// Route from `a` to `b`, endpoints included, redundant points dropped.
pub fn connect_points(a: Waypoint, b: Waypoint, directions: Directions) -> Vec<Waypoint> {
    let mut points = Vec::with_capacity(6);
    points.push(a);
    points.extend(
        get_bendpoints(a.point(), b.point(), directions)
            .into_iter()
            .map(Waypoint::from),
    );
    points.push(b);
    without_redundant_points(&points)
}

/// Route between two rectangles, docked onto the sides the route uses.
pub fn connect_rectangles(
    source: &Bounds,
    target: &Bounds,
    start: Option<Point>,
    end: Option<Point>,
    hints: &ManhattanHints,
) -> Vec<Waypoint> {
    let preferred = hints.preferred_directions();
    let orientation = get_orientation(source, target, preferred.orientation_threshold());
    let directions = get_directions(orientation, preferred);
    log::trace!("connect_rectangles: orientation {orientation}, directions {directions}");

    let start = start.unwrap_or_else(|| source.mid());
    let end = end.unwrap_or_else(|| target.mid());

    let start_docking = get_docking_point(start, source, directions.start, orientation.opposite());
    let end_docking = get_docking_point(end, target, directions.end, orientation);

    connect_points(start_docking, end_docking, directions)
}

/// Repair an existing route after one of its rectangles moved.
///
/// Only the side flagged as changed is rerouted; when neither is flagged
/// the waypoints are returned as they are. Anything that cannot be repaired
/// is laid out from scratch.
pub fn repair_connection(
    source: &Bounds,
    target: &Bounds,
    start: Option<Point>,
    end: Option<Point>,
    waypoints: &[Waypoint],
    hints: &ManhattanHints,
) -> Vec<Waypoint> {
    let start = start.unwrap_or_else(|| source.mid());
    let end = end.unwrap_or_else(|| target.mid());

    if hints.prefers_straight() {
        if let Some(straight) = try_layout_straight(source, target, start, end, hints) {
            log::trace!("repair_connection: straight");
            return straight;
        }
    }

    if hints.end_changed {
        if let Some(repaired) = try_repair_connection_end(target, source, end, waypoints) {
            log::trace!("repair_connection: repaired end");
            return repaired;
        }
    }

    if hints.start_changed {
        if let Some(repaired) = try_repair_connection_start(source, target, start, waypoints) {
            log::trace!("repair_connection: repaired start");
            return repaired;
        }
    }

    if !hints.start_changed && !hints.end_changed && !waypoints.is_empty() {
        return waypoints.to_vec();
    }

    connect_rectangles(source, target, Some(start), Some(end), hints)
}

/// A two-point straight route, if the rectangles sit side by side and the
/// preserved docking lies within the other rectangle's extent.
pub fn try_layout_straight(
    source: &Bounds,
    target: &Bounds,
    start: Point,
    end: Point,
    hints: &ManhattanHints,
) -> Option<Vec<Waypoint>> {
    let axis = match get_orientation(source, target, 0.0) {
        Orientation::Top | Orientation::Bottom => Axis::X,
        Orientation::Left | Orientation::Right => Axis::Y,
        _ => return None,
    };

    let align = |p: Point, to: Point| match axis {
        Axis::X => Point::new(to.x, p.y),
        Axis::Y => Point::new(p.x, to.y),
    };

    if hints.preserve_docking == Some(PreserveDocking::Target) {
        if !in_range(axis, end, source) {
            return None;
        }
        let docked = align(start, end);
        Some(vec![
            Waypoint::with_original(docked.x, docked.y, docked),
            Waypoint::from(end),
        ])
    } else {
        if !in_range(axis, start, target) {
            return None;
        }
        let docked = align(end, start);
        Some(vec![
            Waypoint::from(start),
            Waypoint::with_original(docked.x, docked.y, docked),
        ])
    }
}

fn try_repair_connection_start(
    moved: &Bounds,
    other: &Bounds,
    new_docking: Point,
    points: &[Waypoint],
) -> Option<Vec<Waypoint>> {
    repair_connection_side(moved, other, new_docking, points.to_vec())
}

fn try_repair_connection_end(
    moved: &Bounds,
    other: &Bounds,
    new_docking: Point,
    points: &[Waypoint],
) -> Option<Vec<Waypoint>> {
    let mut reversed = points.to_vec();
    reversed.reverse();
    let mut repaired = repair_connection_side(moved, other, new_docking, reversed)?;
    repaired.reverse();
    Some(repaired)
}

/// Too few bendpoints to repair, or two of them collapsed onto each other.
fn needs_relayout(points: &[Waypoint]) -> bool {
    if points.len() < 3 {
        return true;
    }
    if points.len() > 4 {
        return false;
    }
    points
        .windows(2)
        .any(|pair| pair[0].point().distance(pair[1].point()) < 3.0)
}

/// Move `candidate` along with its peer, keeping the axis it was aligned on.
fn repair_bendpoint(candidate: Waypoint, old_peer: Point, new_peer: Point) -> Waypoint {
    match points_aligned(&[old_peer, candidate.point()]) {
        Some(Alignment::Vertical) => Waypoint::new(new_peer.x, candidate.y),
        Some(Alignment::Horizontal) => Waypoint::new(candidate.x, new_peer.y),
        None => Waypoint::new(candidate.x, candidate.y),
    }
}

/// The tail of `points` starting at the last inner bendpoint that overlaps
/// either rectangle, if any does.
fn remove_overlapping(points: &[Waypoint], a: &Bounds, b: &Bounds) -> Option<Vec<Waypoint>> {
    (1..points.len().saturating_sub(1)).rev().find_map(|i| {
        let p = points[i].point();
        (point_in_rect(p, a, INTERSECTION_THRESHOLD) || point_in_rect(p, b, INTERSECTION_THRESHOLD))
            .then(|| points[i..].to_vec())
    })
}

/// Repair the route starting at `points[0]`, which now docks at `new_docking`.
fn repair_connection_side(
    moved: &Bounds,
    other: &Bounds,
    new_docking: Point,
    points: Vec<Waypoint>,
) -> Option<Vec<Waypoint>> {
    if needs_relayout(&points) {
        return None;
    }

    let old_docking = points[0].point();
    let mut new_points = points;
    new_points[0] = Waypoint::from(new_docking);
    new_points[1] = repair_bendpoint(new_points[1], old_docking, new_docking);

    if let Some(sliced) = remove_overlapping(&new_points, moved, other) {
        new_points = repair_connection_side(moved, other, new_docking, sliced)?;
    }

    // a fully aligned repair is a straight line; let the caller lay it out
    let positions: Vec<Point> = new_points.iter().map(Waypoint::point).collect();
    if points_aligned(&positions).is_some() {
        return None;
    }
    Some(new_points)
}

// ─── Docking ─────────────────────────────────────────────────────────────

/// Direction pair for two rectangles in `orientation`; explicit layouts win.
pub fn get_directions(orientation: Orientation, default_layout: Directions) -> Directions {
    if default_layout.is_explicit() {
        return default_layout;
    }
    match orientation {
        Orientation::Intersect => Directions::new(Direction::T, Direction::T),
        Orientation::Top | Orientation::Bottom => Directions::V_V,
        Orientation::Left | Orientation::Right => Directions::H_H,
        _ => default_layout,
    }
}

/// Project `point` onto the side of `rect` the route leaves through.
///
/// `h` and `v` resolve to the side facing `target_orientation`.
pub fn get_docking_point(
    point: Point,
    rect: &Bounds,
    direction: Direction,
    target_orientation: Orientation,
) -> Waypoint {
    let side = match direction {
        Direction::H if target_orientation.mentions(Orientation::Left) => Direction::L,
        Direction::H => Direction::R,
        Direction::V if target_orientation.mentions(Orientation::Top) => Direction::T,
        Direction::V => Direction::B,
        explicit => explicit,
    };
    let (x, y) = match side {
        Direction::T => (point.x, rect.y),
        Direction::R => (rect.right(), point.y),
        Direction::B => (point.x, rect.bottom()),
        _ => (rect.x, point.y),
    };
    Waypoint::with_original(x, y, point)
}

/// Drop every point that lies on the line between its neighbours.
pub fn without_redundant_points(waypoints: &[Waypoint]) -> Vec<Waypoint> {
    let mut out: Vec<Waypoint> = Vec::with_capacity(waypoints.len());
    for (idx, p) in waypoints.iter().enumerate() {
        let redundant = match (out.last(), waypoints.get(idx + 1)) {
            (Some(previous), Some(next)) => {
                points_on_line(previous.point(), next.point(), p.point(), 0.0)
            }
            _ => false,
        };
        if !redundant {
            out.push(*p);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pts(waypoints: &[Waypoint]) -> Vec<(f32, f32)> {
        waypoints.iter().map(|w| (w.x, w.y)).collect()
    }

    #[test]
    fn parse_directions() {
        assert_eq!("h:v".parse::<Directions>().unwrap(), Directions::H_V);
        assert_eq!(
            "b:l".parse::<Directions>().unwrap(),
            Directions::new(Direction::B, Direction::L)
        );
        assert!(matches!(
            "x:h".parse::<Directions>(),
            Err(LayoutError::InvalidDirections(_))
        ));
        assert!("hh".parse::<Directions>().is_err());
        assert!("h:hv".parse::<Directions>().is_err());
        assert_eq!(
            "straight".parse::<PreferredLayout>().unwrap(),
            PreferredLayout::Straight
        );
        assert!(matches!(
            "diagonal".parse::<PreferredLayout>(),
            Err(LayoutError::InvalidLayout(_))
        ));
    }

    #[test]
    fn simple_bendpoints_double_the_midpoint() {
        let bends = get_bendpoints(Point::new(50.0, 50.0), Point::new(350.0, 50.0), Directions::H_H);
        assert_eq!(bends, vec![Point::new(200.0, 50.0), Point::new(200.0, 50.0)]);

        let elbow = get_bendpoints(Point::new(0.0, 0.0), Point::new(100.0, 100.0), Directions::H_V);
        assert_eq!(elbow, vec![Point::new(100.0, 0.0)]);
    }

    #[test]
    fn side_by_side_rectangles_dock_on_facing_sides() {
        let source = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let target = Bounds::new(300.0, 0.0, 100.0, 100.0);
        let route = connect_rectangles(
            &source,
            &target,
            None,
            None,
            &ManhattanHints::preferring([Directions::H_H.into()]),
        );
        assert_eq!(pts(&route), vec![(100.0, 50.0), (300.0, 50.0)]);
        assert_eq!(route[0].original, Some(Point::new(50.0, 50.0)));
    }

    #[test]
    fn diagonal_rectangles_get_an_elbow() {
        let source = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let target = Bounds::new(300.0, 300.0, 100.0, 100.0);
        let route = connect_rectangles(
            &source,
            &target,
            None,
            None,
            &ManhattanHints::preferring([Directions::H_V.into()]),
        );
        assert_eq!(pts(&route), vec![(100.0, 50.0), (350.0, 50.0), (350.0, 300.0)]);
    }

    #[test]
    fn explicit_loop_leaves_bottom_enters_left() {
        let task = Bounds::new(100.0, 100.0, 100.0, 80.0);
        let route = connect_rectangles(
            &task,
            &task,
            None,
            None,
            &ManhattanHints::preferring([Directions::new(Direction::B, Direction::L).into()]),
        );
        assert_eq!(
            pts(&route),
            vec![
                (150.0, 180.0),
                (150.0, 200.0),
                (80.0, 200.0),
                (80.0, 140.0),
                (100.0, 140.0),
            ]
        );
    }

    #[test]
    fn repair_moves_only_the_changed_end() {
        let source = Bounds::new(-50.0, 30.0, 50.0, 40.0);
        let moved_target = Bounds::new(300.0, 130.0, 20.0, 40.0);
        let waypoints = [
            Waypoint::new(0.0, 50.0),
            Waypoint::new(50.0, 50.0),
            Waypoint::new(50.0, 150.0),
            Waypoint::new(100.0, 150.0),
        ];
        let hints = ManhattanHints {
            end_changed: true,
            ..ManhattanHints::preferring([Directions::H_H.into()])
        };
        let repaired = repair_connection(
            &source,
            &moved_target,
            Some(Point::new(0.0, 50.0)),
            Some(Point::new(310.0, 150.0)),
            &waypoints,
            &hints,
        );
        assert_eq!(
            pts(&repaired),
            vec![(0.0, 50.0), (50.0, 50.0), (50.0, 150.0), (310.0, 150.0)]
        );
    }

    #[test]
    fn unchanged_connection_keeps_waypoints() {
        let waypoints = [Waypoint::new(0.0, 0.0), Waypoint::new(10.0, 0.0)];
        let repaired = repair_connection(
            &Bounds::new(0.0, 0.0, 10.0, 10.0),
            &Bounds::new(100.0, 0.0, 10.0, 10.0),
            None,
            None,
            &waypoints,
            &ManhattanHints::default(),
        );
        assert_eq!(repaired, waypoints.to_vec());
    }

    #[test]
    fn straight_layout_keeps_the_source_axis() {
        let source = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let target = Bounds::new(300.0, 20.0, 100.0, 100.0);
        let hints = ManhattanHints::preferring([PreferredLayout::Straight, Directions::H_H.into()]);
        let straight = try_layout_straight(
            &source,
            &target,
            Point::new(50.0, 50.0),
            Point::new(350.0, 70.0),
            &hints,
        )
        .unwrap();
        assert_eq!(pts(&straight), vec![(50.0, 50.0), (350.0, 50.0)]);

        // start outside the target's vertical extent
        let far = try_layout_straight(
            &source,
            &Bounds::new(300.0, 60.0, 100.0, 100.0),
            Point::new(50.0, 50.0),
            Point::new(350.0, 110.0),
            &hints,
        );
        assert_eq!(far, None);
    }

    #[test]
    fn redundant_points_are_dropped() {
        let raw = [
            Waypoint::new(0.0, 0.0),
            Waypoint::new(50.0, 0.0),
            Waypoint::new(100.0, 0.0),
            Waypoint::new(100.0, 50.0),
        ];
        assert_eq!(
            pts(&without_redundant_points(&raw)),
            vec![(0.0, 0.0), (100.0, 0.0), (100.0, 50.0)]
        );
    }
}
