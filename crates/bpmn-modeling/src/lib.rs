pub mod bpmn_rules;
pub mod change_support;
pub mod command;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod modeler;
pub mod modeling;
pub mod rules;

pub use bpmn_rules::{BpmnRules, Node};
pub use change_support::ChangeSupport;
pub use command::{ActionRecord, CommandContext, CommandHandler, CommandInterceptor, CommandStack};
pub use config::{MinSize, ModelerConfig, ResizeLimits};
pub use error::{CommandError, ConfigError, EventError};
pub use event_bus::{DEFAULT_PRIORITY, Event, EventBus, EventNames, ListenerHandle, ListenerResult};
pub use modeler::Modeler;
pub use modeling::{Modeling, register_handlers};
pub use rules::{ConnectionDescriptor, ElementRef, Replacement, RuleOutcome, RuleProvider, Rules};

// Re-export the core crate so downstream crates don't need a direct dependency
pub use bpmn_core;
