use bpmn_core::{LayoutError, ModelError};
use thiserror::Error;

/// A fault raised by an event listener.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("listener for `{event}` failed: {message}")]
    Listener { event: String, message: String },

    #[error("invalid payload for `{event}`: {message}")]
    InvalidPayload { event: String, message: String },

    #[error("`{0}` was fired without a diagram")]
    MissingDiagram(String),
}

impl EventError {
    pub fn listener(event: &str, message: impl Into<String>) -> Self {
        EventError::Listener {
            event: event.to_string(),
            message: message.into(),
        }
    }
}

/// Errors raised by the command stack and the modeling commands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("command required")]
    MissingCommand,

    #[error("illegal invocation of `{0}` while a command is executing")]
    IllegalInvocation(&'static str),

    #[error("command context is missing `{0}`")]
    MissingField(String),

    #[error("context field `{field}` is invalid: {message}")]
    InvalidField { field: String, message: String },

    #[error("command `{command}` failed: {message}")]
    Handler { command: String, message: String },

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Invalid modeler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid modeler configuration: {0}")]
    Json(#[from] serde_json::Error),
}
