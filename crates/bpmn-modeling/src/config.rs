//! Modeler configuration.

use crate::error::ConfigError;
use bpmn_core::LayoutConfig;
use serde::{Deserialize, Serialize};

/// Minimum width and height of a resizable shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinSize {
    pub width: f32,
    pub height: f32,
}

impl MinSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn admits(&self, width: f32, height: f32) -> bool {
        width >= self.width && height >= self.height
    }
}

/// Minimum sizes enforced by the `shape.resize` rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeLimits {
    /// Expanded sub-processes. Default: 100×80.
    pub sub_process: MinSize,
    /// Default: 130×60.
    pub lane: MinSize,
    /// Default: 250×50.
    pub participant: MinSize,
}

impl Default for ResizeLimits {
    fn default() -> Self {
        Self {
            sub_process: MinSize::new(100.0, 80.0),
            lane: MinSize::new(130.0, 60.0),
            participant: MinSize::new(250.0, 50.0),
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for the [`Modeler`](crate::Modeler).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelerConfig {
    pub layout: LayoutConfig,
    pub resize: ResizeLimits,
}

impl ModelerConfig {
    /// Parse a (possibly partial) JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpmn_core::FlowDirection;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ModelerConfig::from_json("{}").unwrap(), ModelerConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let config = ModelerConfig::from_json(
            r#"{ "layout": { "direction": "vertical" }, "resize": { "lane": { "width": 200, "height": 80 } } }"#,
        )
        .unwrap();
        assert_eq!(config.layout.direction, FlowDirection::Vertical);
        assert_eq!(config.resize.lane, MinSize::new(200.0, 80.0));
        assert_eq!(config.resize.participant, MinSize::new(250.0, 50.0));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(ModelerConfig::from_json("{ \"resize\": 3 }").is_err());
    }
}
