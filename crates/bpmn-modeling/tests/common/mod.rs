//! Shared fixtures for the modeling integration tests.

#![allow(dead_code)]

use bpmn_core::{Bounds, BpmnType, Diagram, Element, ElementId};
use bpmn_modeling::{Modeler, ModelerConfig};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn id(s: &str) -> ElementId {
    ElementId::intern(s)
}

pub fn shape(s: &str, ty: BpmnType, x: f32, y: f32, width: f32, height: f32) -> Element {
    Element::shape(s, ty, Bounds::new(x, y, width, height))
}

pub fn task(s: &str, x: f32, y: f32) -> Element {
    shape(s, BpmnType::Task, x, y, 100.0, 80.0)
}

/// `Process_1` holding:
///
/// ```text
/// Start_1 (0,100 36×36)   Task_1 (100,100)   Task_2 (300,100)   End_1 (500,100 36×36)
///                          Sub_1 (100,300 300×200, expanded)
/// ```
pub fn process_diagram() -> Diagram {
    let mut d = Diagram::with_root(Element::root("Process_1", BpmnType::Process))
        .expect("fresh diagram");
    let root = id("Process_1");
    for element in [
        shape("Start_1", BpmnType::StartEvent, 0.0, 100.0, 36.0, 36.0),
        task("Task_1", 100.0, 100.0),
        task("Task_2", 300.0, 100.0),
        shape("End_1", BpmnType::EndEvent, 500.0, 100.0, 36.0, 36.0),
        shape("Sub_1", BpmnType::SubProcess, 100.0, 300.0, 300.0, 200.0).expanded(),
    ] {
        d.add_shape(element, root).expect("fixture shape");
    }
    d
}

/// `Collaboration_1` with two pools, each showing its own process:
/// `Pool_A` (0,0 600×250) holding `TaskA_1`, `Pool_B` (0,300 600×250)
/// holding `TaskB_1`.
pub fn collaboration_diagram() -> Diagram {
    let mut d = Diagram::with_root(Element::root("Collaboration_1", BpmnType::Collaboration))
        .expect("fresh diagram");
    let root = id("Collaboration_1");
    d.add_shape(
        shape("Pool_A", BpmnType::Participant, 0.0, 0.0, 600.0, 250.0).with_process_ref("Process_A"),
        root,
    )
    .expect("pool a");
    d.add_shape(
        shape("Pool_B", BpmnType::Participant, 0.0, 300.0, 600.0, 250.0).with_process_ref("Process_B"),
        root,
    )
    .expect("pool b");
    d.add_shape(task("TaskA_1", 100.0, 80.0), id("Pool_A")).expect("task a");
    d.add_shape(task("TaskB_1", 300.0, 380.0), id("Pool_B")).expect("task b");
    d
}

/// One element with every relation it takes part in.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub element: Element,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
    pub host: Option<ElementId>,
    pub label_target: Option<ElementId>,
}

/// Everything observable about `diagram`, ordered by element id.
pub fn snapshot(diagram: &Diagram) -> Vec<Entry> {
    let mut entries: Vec<Entry> = diagram
        .elements()
        .map(|element| {
            let id = element.id;
            Entry {
                element: element.clone(),
                parent: diagram.parent(id),
                children: diagram.children(id),
                source: diagram.source(id),
                target: diagram.target(id),
                host: diagram.host(id),
                label_target: diagram.label_target(id),
            }
        })
        .collect();
    entries.sort_by(|a, b| a.element.id.as_str().cmp(b.element.id.as_str()));
    entries
}

pub fn process_modeler() -> Modeler {
    init_logger();
    Modeler::new(process_diagram(), ModelerConfig::default())
}

pub fn collaboration_modeler() -> Modeler {
    init_logger();
    Modeler::new(collaboration_diagram(), ModelerConfig::default())
}
