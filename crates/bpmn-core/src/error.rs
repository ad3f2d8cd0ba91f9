use crate::id::ElementId;
use thiserror::Error;

/// Errors raised by structural mutations of a [`Diagram`](crate::Diagram).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("element `{0}` does not exist")]
    NotFound(ElementId),

    #[error("element `{0}` already exists")]
    DuplicateId(ElementId),

    #[error("diagram already has root `{0}`")]
    RootExists(ElementId),

    #[error("diagram has no root element")]
    NoRoot,

    #[error("element `{id}` still has {what}")]
    HasDependents { id: ElementId, what: &'static str },

    #[error("element `{id}` is not a {expected}")]
    WrongKind { id: ElementId, expected: &'static str },

    #[error("cannot move `{0}` into its own subtree")]
    Cycle(ElementId),
}

/// Errors raised for structurally invalid layout input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("unknown directions `{0}`: expected <start>:<end> with start/end in {{ h, v, t, r, b, l }}")]
    InvalidDirections(String),

    #[error("unknown preferred layout `{0}`")]
    InvalidLayout(String),

    #[error("element `{0}` has no bounds to route against")]
    MissingBounds(ElementId),

    #[error("connection `{0}` is missing its {1}")]
    MissingEndpoint(ElementId, &'static str),
}
