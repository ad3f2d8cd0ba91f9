//! Integration tests: modeling operations, layout and change events (bpmn-modeling).

mod common;

use bpmn_core::{
    AssociationDirection, Bounds, BpmnType, Diagram, Element, ElementId, LayoutHints, Point, Waypoint,
};
use bpmn_modeling::{CommandContext, CommandError, CommandInterceptor, CommandStack, Modeler, ModelerConfig};
use common::{collaboration_modeler, id, process_diagram, process_modeler, shape, snapshot, task};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

fn points(waypoints: &[Waypoint]) -> Vec<(f32, f32)> {
    waypoints.iter().map(|w| (w.x, w.y)).collect()
}

fn is_orthogonal(waypoints: &[Waypoint]) -> bool {
    waypoints
        .windows(2)
        .all(|pair| pair[0].x == pair[1].x || pair[0].y == pair[1].y)
}

fn touches(bounds: Bounds, w: &Waypoint) -> bool {
    (bounds.x - 1.0..=bounds.right() + 1.0).contains(&w.x)
        && (bounds.y - 1.0..=bounds.bottom() + 1.0).contains(&w.y)
}

// ─── Connect ────────────────────────────────────────────────────────────

#[test]
fn connect_creates_a_laid_out_sequence_flow() {
    let mut modeler = process_modeler();
    let flow = modeler
        .connect(id("Task_1"), id("Task_2"))
        .unwrap()
        .expect("tasks connect");

    let diagram = modeler.diagram();
    let element = diagram.get(flow).unwrap();
    assert_eq!(element.bpmn_type, BpmnType::SequenceFlow);
    assert_eq!(diagram.source(flow), Some(id("Task_1")));
    assert_eq!(diagram.target(flow), Some(id("Task_2")));
    assert_eq!(diagram.parent(flow), Some(id("Process_1")));
    assert_eq!(
        points(element.waypoints().unwrap()),
        vec![(200.0, 140.0), (300.0, 140.0)]
    );
}

#[test]
fn forbidden_connection_is_not_created() {
    let mut modeler = process_modeler();
    assert_eq!(modeler.connect(id("Task_1"), id("Start_1")).unwrap(), None);
    assert!(modeler.command_stack().get_stack().is_empty());
    assert!(modeler.diagram().incoming(id("Start_1")).is_empty());
}

#[test]
fn message_flow_lives_in_the_collaboration() {
    let mut modeler = collaboration_modeler();
    let flow = modeler.connect(id("TaskA_1"), id("TaskB_1")).unwrap().unwrap();

    let diagram = modeler.diagram();
    assert!(diagram.get(flow).unwrap().is(BpmnType::MessageFlow));
    assert_eq!(diagram.parent(flow), Some(id("Collaboration_1")));
    let waypoints = diagram.waypoints(flow).unwrap();
    assert!(is_orthogonal(waypoints), "message flow is routed orthogonally: {waypoints:?}");
    assert!(touches(diagram.bounds(id("TaskA_1")).unwrap(), &waypoints[0]));
    assert!(touches(diagram.bounds(id("TaskB_1")).unwrap(), waypoints.last().unwrap()));
}

#[test]
fn annotation_connects_by_undirected_association() {
    let mut diagram = process_diagram();
    diagram
        .add_shape(
            shape("Note_1", BpmnType::TextAnnotation, 300.0, 0.0, 100.0, 30.0),
            id("Process_1"),
        )
        .unwrap();
    let mut modeler = Modeler::new(diagram, ModelerConfig::default());

    let association = modeler.connect(id("Note_1"), id("Task_2")).unwrap().unwrap();
    let element = modeler.diagram().get(association).unwrap();
    assert_eq!(element.bpmn_type, BpmnType::Association);
    assert_eq!(element.props.association_direction, Some(AssociationDirection::None));
    assert_eq!(element.waypoints().map(<[Waypoint]>::len), Some(2));
}

// ─── Move / resize ──────────────────────────────────────────────────────

#[test]
fn moving_a_shape_re_lays_out_its_connections() {
    let mut modeler = process_modeler();
    let flow = modeler.connect(id("Task_1"), id("Task_2")).unwrap().unwrap();
    let before = modeler.diagram().waypoints(flow).unwrap().to_vec();

    modeler
        .modeling()
        .move_shape(id("Task_2"), Point::new(0.0, 50.0), None)
        .unwrap();

    let diagram = modeler.diagram();
    let moved = diagram.bounds(id("Task_2")).unwrap();
    assert_eq!(moved, Bounds::new(300.0, 150.0, 100.0, 80.0));

    let after = diagram.waypoints(flow).unwrap();
    assert_ne!(points(after), points(&before), "connection not re-laid-out");
    assert!(is_orthogonal(after), "route must stay orthogonal: {after:?}");
    assert!(touches(diagram.bounds(id("Task_1")).unwrap(), &after[0]));
    assert!(touches(moved, after.last().unwrap()));

    // one group: the move plus the nested layout
    let stack = modeler.command_stack().get_stack();
    let commands: Vec<&str> = stack[1..].iter().map(|r| r.command.as_str()).collect();
    assert_eq!(commands, vec!["shape.move", "connection.layout"]);

    modeler.undo().unwrap();
    assert_eq!(points(modeler.diagram().waypoints(flow).unwrap()), points(&before));
}

#[test]
fn resizing_keeps_connections_docked() {
    let mut modeler = process_modeler();
    let flow = modeler.connect(id("Task_1"), id("Task_2")).unwrap().unwrap();

    let new_bounds = Bounds::new(300.0, 100.0, 200.0, 160.0);
    modeler.modeling().resize_shape(id("Task_2"), new_bounds).unwrap();

    let diagram = modeler.diagram();
    assert_eq!(diagram.bounds(id("Task_2")), Some(new_bounds));
    let waypoints = diagram.waypoints(flow).unwrap();
    let end = waypoints.last().unwrap();
    assert!(touches(new_bounds, end), "end left the resized shape: {waypoints:?}");
    assert_eq!(end.x, 300.0, "end stays on the left side");
    assert!(is_orthogonal(waypoints));
}

#[test]
fn reconnecting_the_end_is_one_undoable_step() {
    let mut modeler = process_modeler();
    let flow = modeler.connect(id("Task_1"), id("Task_2")).unwrap().unwrap();
    let before = snapshot(modeler.diagram());
    let history = modeler.command_stack().get_stack().len();

    modeler.modeling().reconnect_end(flow, id("End_1"), None).unwrap();

    let diagram = modeler.diagram();
    assert_eq!(diagram.source(flow), Some(id("Task_1")));
    assert_eq!(diagram.target(flow), Some(id("End_1")));
    assert!(diagram.incoming(id("Task_2")).is_empty());
    assert_eq!(diagram.incoming(id("End_1")), vec![flow]);
    let waypoints = diagram.waypoints(flow).unwrap().to_vec();
    assert!(touches(diagram.bounds(id("Task_1")).unwrap(), &waypoints[0]));
    assert!(touches(diagram.bounds(id("End_1")).unwrap(), waypoints.last().unwrap()));

    let commands: Vec<&str> = modeler.command_stack().get_stack()[history..]
        .iter()
        .map(|r| r.command.as_str())
        .collect();
    assert_eq!(commands, vec!["connection.reconnect", "connection.layout"]);

    assert!(modeler.undo().unwrap());
    assert_eq!(snapshot(modeler.diagram()), before);

    assert!(modeler.redo().unwrap());
    assert_eq!(modeler.diagram().target(flow), Some(id("End_1")));
    assert_eq!(points(modeler.diagram().waypoints(flow).unwrap()), points(&waypoints));
}

#[test]
fn reconnecting_the_start_uses_the_given_docking() {
    let mut modeler = process_modeler();
    let flow = modeler.connect(id("Task_1"), id("Task_2")).unwrap().unwrap();

    modeler
        .modeling()
        .reconnect_start(flow, id("Start_1"), Some(Point::new(18.0, 118.0)))
        .unwrap();

    let diagram = modeler.diagram();
    assert_eq!(diagram.source(flow), Some(id("Start_1")));
    assert!(diagram.outgoing(id("Task_1")).is_empty());
    let start = diagram.waypoints(flow).unwrap()[0];
    assert!(touches(diagram.bounds(id("Start_1")).unwrap(), &start));
}

#[test]
fn reconnecting_a_shape_is_rejected() {
    let mut modeler = process_modeler();
    let result = modeler
        .modeling()
        .reconnect(id("Task_1"), id("Start_1"), id("End_1"), None);
    assert!(matches!(result, Err(CommandError::Model(_))));
    assert!(modeler.command_stack().get_stack().is_empty());
}

#[test]
fn attached_events_move_with_their_host() {
    let mut modeler = process_modeler();
    let event = Element::shape("Boundary_1", BpmnType::BoundaryEvent, Bounds::new(0.0, 0.0, 36.0, 36.0));
    modeler
        .modeling()
        .create_attached_shape(event, Point::new(150.0, 180.0), id("Task_1"))
        .unwrap();
    assert_eq!(modeler.diagram().host(id("Boundary_1")), Some(id("Task_1")));
    assert_eq!(
        modeler.diagram().bounds(id("Boundary_1")),
        Some(Bounds::new(132.0, 162.0, 36.0, 36.0))
    );

    modeler
        .modeling()
        .move_shape(id("Task_1"), Point::new(10.0, 10.0), None)
        .unwrap();
    assert_eq!(
        modeler.diagram().bounds(id("Boundary_1")),
        Some(Bounds::new(142.0, 172.0, 36.0, 36.0))
    );

    modeler
        .modeling()
        .move_and_attach(id("Boundary_1"), Point::new(200.0, 0.0), Some(id("Task_2")))
        .unwrap();
    assert_eq!(modeler.diagram().host(id("Boundary_1")), Some(id("Task_2")));
    modeler.undo().unwrap();
    assert_eq!(modeler.diagram().host(id("Boundary_1")), Some(id("Task_1")));
}

#[test]
fn preview_layout_does_not_touch_the_diagram() {
    let mut modeler = process_modeler();
    let flow = modeler.connect(id("Task_1"), id("End_1")).unwrap().unwrap();
    let before = snapshot(modeler.diagram());
    let history = modeler.command_stack().get_stack().len();

    let preview = modeler.preview_layout(flow, &LayoutHints::default()).unwrap();
    assert_eq!(snapshot(modeler.diagram()), before);
    assert_eq!(modeler.command_stack().get_stack().len(), history);

    modeler
        .modeling()
        .layout_connection(flow, LayoutHints::default())
        .unwrap();
    assert_eq!(points(modeler.diagram().waypoints(flow).unwrap()), points(&preview));
    assert_eq!(modeler.command_stack().get_stack().len(), history + 1);

    assert!(matches!(
        modeler.preview_layout(id("Task_1"), &LayoutHints::default()),
        Err(CommandError::Model(_))
    ));
}

// ─── Change events ──────────────────────────────────────────────────────

type Seen = Rc<RefCell<Vec<String>>>;

fn watch(modeler: &Modeler, events: &[&str]) -> Seen {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    for event in events {
        let seen = Rc::clone(&seen);
        modeler.bus().subscribe(*event, move |e| {
            let subject = e
                .get("element")
                .or_else(|| e.get("trigger"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            seen.borrow_mut().push(format!("{} {subject}", e.kind()));
            Ok(None)
        });
    }
    seen
}

#[test]
fn move_announces_every_changed_element() {
    let mut modeler = process_modeler();
    let flow = modeler.connect(id("Task_1"), id("Task_2")).unwrap().unwrap();
    let seen = watch(
        &modeler,
        &["shape.changed", "connection.changed", "commandStack.changed"],
    );

    modeler
        .modeling()
        .move_shape(id("Task_2"), Point::new(0.0, 50.0), None)
        .unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            "shape.changed Task_2".to_string(),
            format!("connection.changed {flow}"),
            "commandStack.changed execute".to_string(),
        ]
    );
}

#[test]
fn undo_and_redo_announce_changes_too() {
    let mut modeler = process_modeler();
    modeler
        .modeling()
        .update_properties(id("Task_1"), json!({ "name": "Review" }))
        .unwrap();
    let seen = watch(&modeler, &["shape.changed", "commandStack.changed"]);

    modeler.undo().unwrap();
    assert_eq!(modeler.diagram().get(id("Task_1")).unwrap().props.name, None);
    modeler.redo().unwrap();
    assert_eq!(
        modeler.diagram().get(id("Task_1")).unwrap().props.name.as_deref(),
        Some("Review")
    );

    assert_eq!(
        *seen.borrow(),
        vec![
            "shape.changed Task_1",
            "commandStack.changed undo",
            "shape.changed Task_1",
            "commandStack.changed redo",
        ]
    );
}

#[test]
fn removed_elements_are_announced() {
    let mut modeler = process_modeler();
    let seen = watch(&modeler, &["element.removed", "root.changed"]);

    modeler.modeling().remove_shape(id("End_1")).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec!["root.changed Process_1", "element.removed End_1"]
    );
}

#[test]
fn phase_listener_can_rewrite_the_context() {
    let mut modeler = process_modeler();
    modeler
        .bus()
        .subscribe("commandStack.shape.create.preExecute", |event| {
            event.data["context"]["position"] = json!({ "x": 800.0, "y": 140.0 });
            Ok(None)
        });

    modeler
        .modeling()
        .create_shape(task("Task_9", 0.0, 0.0), Point::new(0.0, 0.0), id("Process_1"))
        .unwrap();
    assert_eq!(
        modeler.diagram().bounds(id("Task_9")),
        Some(Bounds::new(750.0, 100.0, 100.0, 80.0))
    );
}

// ─── Interceptors ───────────────────────────────────────────────────────

/// Names every created shape after its type.
struct NameNewShapes;

impl CommandInterceptor for NameNewShapes {
    fn post_execute(
        &self,
        _command: &str,
        ctx: &mut CommandContext,
        stack: &mut CommandStack,
        diagram: &mut Diagram,
    ) -> Result<(), CommandError> {
        let shape: Element = ctx.get("shape")?;
        stack.execute(
            "element.updateProperties",
            CommandContext::new()
                .with("element", json!(shape.id))
                .with("properties", json!({ "name": shape.bpmn_type.to_string() })),
            diagram,
        )
    }
}

#[test]
fn interceptor_work_is_undone_with_the_command() {
    let mut modeler = process_modeler();
    modeler
        .command_stack_mut()
        .intercept(Some("shape.create".into()), 1000, NameNewShapes);

    let new_id: ElementId = modeler
        .modeling()
        .create_shape(task("Task_7", 0.0, 0.0), Point::new(700.0, 140.0), id("Process_1"))
        .unwrap();
    assert_eq!(
        modeler.diagram().get(new_id).unwrap().props.name.as_deref(),
        Some("bpmn:Task")
    );
    assert_eq!(modeler.command_stack().get_stack().len(), 2);

    modeler.undo().unwrap();
    assert!(!modeler.diagram().contains(new_id));
    assert!(!modeler.command_stack().can_undo());
}
