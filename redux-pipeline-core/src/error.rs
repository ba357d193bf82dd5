//! Error types for pipeline configuration and dispatch

use thiserror::Error;

/// Boxed error returned by fallible reducers, converters and middleware
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while configuring a pipeline.
///
/// All of these are programming errors. They are meant to be propagated
/// with `?` out of the startup code so a misconfigured routing table never
/// reaches the first dispatch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicate {registry} registration for action kind {kind}")]
    DuplicateRegistration {
        /// Which table rejected the entry (`"reducer"` or `"converter"`)
        registry: &'static str,
        /// `Debug` rendering of the action kind
        kind: String,
    },

    #[error("middlewares can only be registered once per pipeline")]
    AlreadyConfigured,

    #[error("pipeline configuration is frozen after first use")]
    ConfigurationFrozen,

    #[error("invalid pipeline config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Errors surfaced by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
///
/// Errors raised inside registered callbacks are wrapped with the name of
/// the action (or middleware) that failed and returned to the caller as-is.
/// The pipeline never retries.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("reducer failed for action {action}: {source}")]
    Reducer {
        action: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("action converter failed for action {action}: {source}")]
    Converter {
        action: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("middleware {middleware} failed: {source}")]
    Middleware {
        middleware: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("action channel closed")]
    ChannelClosed,
}

impl DispatchError {
    /// Wrap an application error raised inside a middleware stage.
    pub fn middleware(middleware: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Middleware {
            middleware,
            source: source.into(),
        }
    }
}
