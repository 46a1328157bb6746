//! Render engine configuration

use serde::{Deserialize, Serialize};

/// Where a replacement node goes when a lazy subtree changes shape
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplaceStrategy {
    /// Insert the new node where the old one was
    #[default]
    InPlace,
    /// Append the new node after the parent's last child
    Append,
}

/// Tunables for a [`Renderer`](crate::Renderer)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Placement of replacement nodes during lazy reconciliation
    pub replace_strategy: ReplaceStrategy,
    /// Detach event listeners when an element instance is cleaned up
    pub detach_listeners: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            replace_strategy: ReplaceStrategy::InPlace,
            detach_listeners: true,
        }
    }
}

impl RenderConfig {
    /// Set the replacement strategy
    pub fn replace_strategy(mut self, strategy: ReplaceStrategy) -> Self {
        self.replace_strategy = strategy;
        self
    }

    /// Enable or disable listener detachment on cleanup
    pub fn detach_listeners(mut self, detach: bool) -> Self {
        self.detach_listeners = detach;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.replace_strategy, ReplaceStrategy::InPlace);
        assert!(config.detach_listeners);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: RenderConfig = toml::from_str(r#"replace-strategy = "append""#).unwrap();
        assert_eq!(config.replace_strategy, ReplaceStrategy::Append);
        assert!(config.detach_listeners);
    }

    #[test]
    fn test_parse_full_toml() {
        let config: RenderConfig = toml::from_str(
            r#"
            replace-strategy = "in-place"
            detach-listeners = false
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            RenderConfig::default().detach_listeners(false)
        );
    }

    #[test]
    fn test_reject_unknown_strategy() {
        let parsed: Result<RenderConfig, _> = toml::from_str(r#"replace-strategy = "diff""#);
        assert!(parsed.is_err());
    }
}
