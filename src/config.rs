use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::theme::ThemeName;

const VALIDATION_CACHE_CAPACITY: usize = 256;
const VALIDATION_CACHE_TTL_SECS: u64 = 300;
const RENDER_CACHE_CAPACITY: usize = 64;
const RENDER_CACHE_TTL_SECS: u64 = 900;
const MAX_PARTICIPANTS: usize = 15;
const MAX_MESSAGES: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl CachePolicy {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Strict upper bounds; a diagram is flagged only when it goes past them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_max_participants")]
    pub max_participants: usize,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_participants: MAX_PARTICIPANTS,
            max_messages: MAX_MESSAGES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_validation_cache")]
    pub validation_cache: CachePolicy,
    #[serde(default = "default_render_cache")]
    pub render_cache: CachePolicy,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub theme: ThemeName,
}

fn default_validation_cache() -> CachePolicy {
    CachePolicy {
        capacity: VALIDATION_CACHE_CAPACITY,
        ttl_secs: VALIDATION_CACHE_TTL_SECS,
    }
}
fn default_render_cache() -> CachePolicy {
    CachePolicy {
        capacity: RENDER_CACHE_CAPACITY,
        ttl_secs: RENDER_CACHE_TTL_SECS,
    }
}
fn default_max_participants() -> usize {
    MAX_PARTICIPANTS
}
fn default_max_messages() -> usize {
    MAX_MESSAGES
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation_cache: default_validation_cache(),
            render_cache: default_render_cache(),
            thresholds: Thresholds::default(),
            theme: ThemeName::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Picks the format from the extension; anything else is tried as TOML
    /// first, then YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("toml") => Self::from_toml(&content),
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_toml(&content).or_else(|_| Self::from_yaml(&content)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, policy) in [
            ("validation_cache", &self.validation_cache),
            ("render_cache", &self.render_cache),
        ] {
            if policy.capacity == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.capacity must be greater than zero"
                )));
            }
            if policy.ttl_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.ttl_secs must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = PipelineConfig::from_toml("").expect("empty config");
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.thresholds.max_participants, 15);
        assert_eq!(config.thresholds.max_messages, 50);
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let config = PipelineConfig::from_toml(
            r#"
theme = "Tokyo-Night"

[render_cache]
capacity = 8
ttl_secs = 30

[thresholds]
max_messages = 80
"#,
        )
        .expect("partial config");
        assert_eq!(config.theme, ThemeName::TokyoNight);
        assert_eq!(config.render_cache.capacity, 8);
        assert_eq!(config.render_cache.ttl(), Duration::from_secs(30));
        assert_eq!(config.validation_cache, default_validation_cache());
        assert_eq!(config.thresholds.max_participants, 15);
        assert_eq!(config.thresholds.max_messages, 80);
    }

    #[test]
    fn yaml_is_supported() {
        let config = PipelineConfig::from_yaml("theme: dracula\nvalidation_cache:\n  capacity: 4\n  ttl_secs: 10\n")
            .expect("yaml config");
        assert_eq!(config.theme, ThemeName::Dracula);
        assert_eq!(config.validation_cache.capacity, 4);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = PipelineConfig::from_toml("[validation_cache]\ncapacity = 0\nttl_secs = 5\n")
            .expect_err("zero capacity");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_theme_is_a_parse_error() {
        let err = PipelineConfig::from_toml("theme = \"neon\"").expect_err("unknown theme");
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
