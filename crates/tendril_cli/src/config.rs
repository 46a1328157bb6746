//! Tendril configuration file handling
//!
//! The CLI reads `tendril.toml` from the working directory when present,
//! or the file named by `--config`:
//!
//! ```toml
//! [render]
//! replace-strategy = "in-place"
//! detach-listeners = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tendril_render::RenderConfig;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tendril.toml";

/// Top-level configuration
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct TendrilConfig {
    #[serde(default)]
    pub render: RenderConfig,
}

impl TendrilConfig {
    /// Load from an explicit path, or from `tendril.toml` if it exists
    ///
    /// An explicit path must exist. Without one, a missing default file
    /// yields the default configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Self::load_file(path)
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_file(path)
                } else {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendril_render::ReplaceStrategy;

    #[test]
    fn test_empty_file_is_default() {
        let config = TendrilConfig::parse("").unwrap();
        assert_eq!(config, TendrilConfig::default());
    }

    #[test]
    fn test_render_section() {
        let config = TendrilConfig::parse(
            r#"
            [render]
            replace-strategy = "append"
            detach-listeners = false
            "#,
        )
        .unwrap();
        assert_eq!(config.render.replace_strategy, ReplaceStrategy::Append);
        assert!(!config.render.detach_listeners);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = TendrilConfig::parse(
            r#"
            [render]
            replace-strategy = "sideways"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let path = std::env::temp_dir().join("tendril-missing-config-7f3a.toml");
        let err = TendrilConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_explicit_file() {
        let path = std::env::temp_dir().join(format!(
            "tendril-config-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[render]\nreplace-strategy = \"append\"\n").unwrap();

        let config = TendrilConfig::load(Some(&path)).unwrap();
        assert_eq!(config.render.replace_strategy, ReplaceStrategy::Append);

        fs::remove_file(&path).unwrap();
    }
}
