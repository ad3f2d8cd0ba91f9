//! Layout configuration.

use serde::{Deserialize, Serialize};

/// Main flow direction of a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowDirection {
    /// Left to right. Default: pools are laid out horizontally.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

impl FlowDirection {
    pub fn from_is_horizontal(is_horizontal: bool) -> Self {
        if is_horizontal {
            FlowDirection::Horizontal
        } else {
            FlowDirection::Vertical
        }
    }

    pub fn is_horizontal(self) -> bool {
        self == FlowDirection::Horizontal
    }
}

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for the [`BpmnLayouter`](crate::BpmnLayouter).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Used when neither the connection's pool or lane nor any participant
    /// in the diagram states `isHorizontal`. Default: **horizontal**.
    pub direction: FlowDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: LayoutConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LayoutConfig::default());

        let vertical: LayoutConfig = serde_json::from_str(r#"{"direction":"vertical"}"#).unwrap();
        assert_eq!(vertical.direction, FlowDirection::Vertical);
    }
}
