//! Serializable dispatcher settings
//!
//! Lets an app toggle the pipeline stages and the action logger from a
//! JSON file instead of code:
//!
//! ```json
//! {
//!   "action_converter": true,
//!   "app_middlewares": true,
//!   "log": { "include": "Did*", "exclude": "Tick,Render", "capacity": 200 }
//! }
//! ```
//!
//! Every field is optional.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::dispatcher::DispatcherOptions;
use crate::error::ConfigError;
use crate::logger::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};

/// Dispatcher settings loaded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the converter stage
    pub action_converter: bool,
    /// Run the app middlewares registered on the pipeline
    pub app_middlewares: bool,
    /// Action logger settings; `None` disables the logger
    pub log: Option<LogSettings>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            action_converter: true,
            app_middlewares: true,
            log: None,
        }
    }
}

/// Action logger section of [`PipelineConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Comma-separated include globs
    pub include: Option<String>,
    /// Comma-separated exclude globs, default excludes when absent
    pub exclude: Option<String>,
    /// History size, `0` for tracing only
    pub capacity: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            include: None,
            exclude: None,
            capacity: 100,
        }
    }
}

impl LogSettings {
    pub fn filter(&self) -> ActionLoggerConfig {
        ActionLoggerConfig::new(self.include.as_deref(), self.exclude.as_deref())
    }
}

impl PipelineConfig {
    /// Parse from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        tracing::debug!(config = ?config, "Loaded pipeline config");
        Ok(config)
    }

    /// Dispatcher options without extra middlewares
    pub fn dispatcher_options<A: Action, S: 'static>(&self) -> DispatcherOptions<A, S> {
        DispatcherOptions::new()
            .action_converter(self.action_converter)
            .app_middlewares(self.app_middlewares)
    }

    /// The configured action logger, if the `log` section is present
    pub fn logger_middleware(&self) -> Option<ActionLoggerMiddleware> {
        let settings = self.log.as_ref()?;
        let filter = settings.filter();
        Some(if settings.capacity == 0 {
            ActionLoggerMiddleware::new(filter)
        } else {
            ActionLoggerMiddleware::with_log(ActionLogConfig::new(settings.capacity, filter))
        })
    }
}
