use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What `Scene::remove_entity` does to the removed entity's closed flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePolicy {
    /// Removed entities are closed.
    #[default]
    CloseOnRemove,
    /// Removed entities are reopened, as if still live.
    ReopenOnRemove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub tick_period_ms: u64,
    pub fps_window_ms: u64,
    pub max_ticks_per_poll: u32,
    pub default_priority: i32,
    pub start_running: bool,
    pub lifecycle: LifecyclePolicy,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 50,
            fps_window_ms: 1000,
            max_ticks_per_poll: 5,
            default_priority: 9,
            start_running: true,
            lifecycle: LifecyclePolicy::CloseOnRemove,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid scene config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SceneConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn fps_window(&self) -> Duration {
        Duration::from_millis(self.fps_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = SceneConfig::from_json_str(r#"{ "tick_period_ms": 20 }"#).expect("config");

        assert_eq!(config.tick_period(), Duration::from_millis(20));
        assert_eq!(config.default_priority, 9);
        assert_eq!(config.fps_window(), Duration::from_secs(1));
        assert!(config.start_running);
        assert_eq!(config.lifecycle, LifecyclePolicy::CloseOnRemove);
    }

    #[test]
    fn lifecycle_policy_parses_snake_case() {
        let config =
            SceneConfig::from_json_str(r#"{ "lifecycle": "reopen_on_remove" }"#).expect("config");
        assert_eq!(config.lifecycle, LifecyclePolicy::ReopenOnRemove);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let error = SceneConfig::from_json_str("{ tick_period_ms: }").expect_err("should fail");
        assert!(error.to_string().starts_with("invalid scene config"));
    }
}
