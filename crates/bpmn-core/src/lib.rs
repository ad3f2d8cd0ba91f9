pub mod bpmn;
pub mod config;
pub mod error;
pub mod geometry;
pub mod id;
pub mod layouter;
pub mod manhattan;
pub mod model;

pub use bpmn::{BpmnType, EventDefinition};
pub use config::{FlowDirection, LayoutConfig};
pub use error::{LayoutError, ModelError};
pub use geometry::{Bounds, Orientation, Point, Waypoint, get_orientation};
pub use id::ElementId;
pub use layouter::{BaseLayouter, BpmnLayouter, LayoutHints, Layouter};
pub use manhattan::{Direction, Directions, ManhattanHints, PreferredLayout, PreserveDocking};
pub use model::*;
