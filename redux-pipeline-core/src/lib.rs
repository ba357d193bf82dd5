//! Core traits and types for redux-pipeline
//!
//! This crate provides a Redux-style action dispatch pipeline: actions are
//! rewritten by converters, intercepted by an ordered middleware chain and
//! finally folded into a new application state by composed reducers.
//!
//! # Core Concepts
//!
//! - **Action**: an immutable value describing an intent, routed by its kind
//! - **Store**: the single current state value, observable through a watch channel
//! - **PipelineBuilder**: registries for reducers, converters and middlewares,
//!   filled once at startup and frozen into a [`Pipeline`]
//! - **Dispatcher**: converter stage, then middleware chain, then reducers
//!
//! # Basic Example
//!
//! ```ignore
//! use redux_pipeline::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//!     Add(i32),
//!     Reset,
//! }
//!
//! let mut builder = PipelineBuilder::<CounterAction, i32>::new();
//! builder
//!     .reducer(CounterActionKind::Increment, |_, n| n + 1)?
//!     .reducer(CounterActionKind::Add, |action, n| match action {
//!         CounterAction::Add(d) => n + d,
//!         _ => n,
//!     })?
//!     // Reset never reaches the reducers, the converter replaces it
//!     .converter(CounterActionKind::Reset, true, |_| Some(CounterAction::Add(0)))?
//!     .middlewares(MiddlewareList::new().with(LoggingMiddleware::new()))?;
//!
//! let dispatcher = Dispatcher::new(Store::new(0), Arc::new(builder.build()));
//! dispatcher.dispatch(CounterAction::Increment)?;
//! assert_eq!(*dispatcher.state(), 1);
//! ```
//!
//! # Async Follow-ups
//!
//! `dispatch` is synchronous. Middleware that starts async work hands the
//! result back as a new action through an [`ActionSender`]; an
//! [`ActionLoop`] dispatches those in arrival order:
//!
//! ```ignore
//! let action_loop = ActionLoop::new();
//! let sender = action_loop.sender();
//!
//! let fetch = typed(AppActionKind::Fetch, move |_store, next, action| {
//!     let sender = sender.clone();
//!     tokio::spawn(async move {
//!         let payload = load().await;
//!         let _ = sender.send(AppAction::DidFetch(payload));
//!     });
//!     next.run(action)
//! });
//! builder.middlewares(MiddlewareList::new().with(fetch))?;
//!
//! let dispatcher = Dispatcher::new(store, Arc::new(builder.build()));
//! action_loop.run(dispatcher, cancel).await?;
//! ```

pub mod action;
pub mod cell;
pub mod config;
pub mod converter;
pub mod dispatcher;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod reducer;
pub mod registry;
pub mod runtime;
pub mod state;
pub mod store;
pub mod testing;

#[cfg(test)]
mod test_support;

// Core trait exports
pub use action::{Action, ActionKind, ActionSummary};
pub use state::{AppState, Slice};

// Errors
pub use error::{BoxError, ConfigError, DispatchError};

// Pipeline configuration
pub use cell::PipelineCell;
pub use config::{LogSettings, PipelineConfig};
pub use converter::{BoxedConverter, ConverterStage};
pub use reducer::{BoxedReducer, CombinedReducer, Filter, Reduction};
pub use registry::{Module, Pipeline, PipelineBuilder};

// Runtime exports
pub use dispatcher::{Dispatcher, DispatcherOptions};
pub use runtime::{ActionLoop, ActionSender};
pub use store::Store;

// Middleware exports
pub use logger::{
    glob_match, ActionLog, ActionLogConfig, ActionLogEntry, ActionLoggerConfig,
    ActionLoggerMiddleware, SharedActionLog,
};
pub use middleware::{
    middleware_fn, typed, FnMiddleware, LoggingMiddleware, Middleware, MiddlewareList, Next,
    NoopMiddleware, SharedMiddleware, TypedMiddleware,
};

// Testing exports
pub use testing::{RecordingMiddleware, TestHarness};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{Action, ActionSummary};
    pub use crate::cell::PipelineCell;
    pub use crate::dispatcher::{Dispatcher, DispatcherOptions};
    pub use crate::error::{ConfigError, DispatchError};
    pub use crate::logger::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};
    pub use crate::middleware::{
        middleware_fn, typed, LoggingMiddleware, Middleware, MiddlewareList, Next,
        NoopMiddleware,
    };
    pub use crate::registry::{Module, Pipeline, PipelineBuilder};
    pub use crate::runtime::{ActionLoop, ActionSender};
    pub use crate::state::{AppState, Slice};
    pub use crate::store::Store;
}
