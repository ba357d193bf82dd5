//! redux-pipeline: Redux-style action dispatch for Rust apps
//!
//! Actions are converted, intercepted by middleware and reduced into a new
//! immutable state that observers receive through a watch channel. All
//! routing tables are registered once at startup and frozen afterwards.
//!
//! # Example
//! ```ignore
//! use redux_pipeline::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TodoAction {
//!     Add(String),
//!     ClearDone,
//! }
//!
//! let mut builder = PipelineBuilder::<TodoAction, Vec<String>>::new();
//! builder.reducer(TodoActionKind::Add, |action, mut todos| {
//!     if let TodoAction::Add(title) = action {
//!         todos.push(title.clone());
//!     }
//!     todos
//! })?;
//!
//! let dispatcher = Dispatcher::new(Store::default(), Arc::new(builder.build()));
//! dispatcher.dispatch(TodoAction::Add("write docs".into()))?;
//! ```

// Re-export everything from core
pub use redux_pipeline_core::*;

// Re-export derive macros
pub use redux_pipeline_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use redux_pipeline_core::{Action, ActionSummary, Middleware, Module, Slice};

    // Configuration
    pub use redux_pipeline_core::{
        ConfigError, MiddlewareList, Pipeline, PipelineBuilder, PipelineCell, PipelineConfig,
    };

    // Runtime
    pub use redux_pipeline_core::{
        ActionLoop, ActionSender, AppState, DispatchError, Dispatcher, DispatcherOptions, Next,
        Store,
    };

    // Middlewares
    pub use redux_pipeline_core::{
        middleware_fn, typed, ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware,
        LoggingMiddleware, NoopMiddleware,
    };

    // Derive macros
    pub use redux_pipeline_macros::Action;
}
