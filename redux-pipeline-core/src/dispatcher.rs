//! Dispatcher: the public entry point of a pipeline
//!
//! An action goes through three stages:
//!
//! 1. the [`ConverterStage`](crate::ConverterStage) expands it into zero or
//!    more actions
//! 2. each of those runs through the middleware chain, outermost first
//! 3. the innermost link reduces it and commits the new state to the
//!    [`Store`], notifying observers
//!
//! Converted actions are dispatched one after the other. Each one sees the
//! state committed by its predecessor.

use std::sync::Arc;

use crate::action::Action;
use crate::error::DispatchError;
use crate::middleware::{compose, Link, Middleware, SharedMiddleware};
use crate::registry::Pipeline;
use crate::store::Store;

/// Knobs for assembling a [`Dispatcher`]
pub struct DispatcherOptions<A, S> {
    /// Run the converter stage before the middleware chain
    pub action_converter: bool,
    /// Include the middlewares registered on the pipeline
    pub app_middlewares: bool,
    /// Additional middlewares, placed inside the app middlewares
    pub extra_middlewares: Vec<SharedMiddleware<A, S>>,
}

impl<A, S> Default for DispatcherOptions<A, S> {
    fn default() -> Self {
        Self {
            action_converter: true,
            app_middlewares: true,
            extra_middlewares: Vec::new(),
        }
    }
}

impl<A, S> std::fmt::Debug for DispatcherOptions<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherOptions")
            .field("action_converter", &self.action_converter)
            .field("app_middlewares", &self.app_middlewares)
            .field("extra_middlewares", &self.extra_middlewares.len())
            .finish()
    }
}

impl<A: Action, S: 'static> DispatcherOptions<A, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the converter stage
    pub fn action_converter(mut self, enabled: bool) -> Self {
        self.action_converter = enabled;
        self
    }

    /// Enable or disable the pipeline's app middlewares
    pub fn app_middlewares(mut self, enabled: bool) -> Self {
        self.app_middlewares = enabled;
        self
    }

    /// Append an extra middleware
    pub fn extra_middleware<M: Middleware<A, S>>(mut self, middleware: M) -> Self {
        self.extra_middlewares.push(Arc::new(middleware));
        self
    }

    /// Append an extra middleware the caller keeps a handle to
    pub fn extra_shared(mut self, middleware: SharedMiddleware<A, S>) -> Self {
        self.extra_middlewares.push(middleware);
        self
    }
}

struct Inner<A: Action, S> {
    store: Store<S>,
    pipeline: Arc<Pipeline<A, S>>,
    chain: Link<A>,
    convert: bool,
}

/// Dispatches actions through a configured [`Pipeline`] into a [`Store`].
///
/// Cloning is cheap; clones share the store and the composed chain.
///
/// # Example
/// ```ignore
/// let dispatcher = Dispatcher::new(Store::new(AppState::default()), pipeline);
/// dispatcher.dispatch(AppAction::Increment)?;
/// assert_eq!(dispatcher.state().count, 1);
/// ```
pub struct Dispatcher<A: Action, S> {
    inner: Arc<Inner<A, S>>,
}

impl<A: Action, S> Clone for Dispatcher<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Action, S> std::fmt::Debug for Dispatcher<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pipeline", &self.inner.pipeline)
            .field("action_converter", &self.inner.convert)
            .finish()
    }
}

impl<A, S> Dispatcher<A, S>
where
    A: Action,
    S: Clone + Send + Sync + 'static,
{
    /// Dispatcher with the converter stage and the app middlewares enabled
    pub fn new(store: Store<S>, pipeline: Arc<Pipeline<A, S>>) -> Self {
        Self::with_options(store, pipeline, DispatcherOptions::default())
    }

    pub fn with_options(
        store: Store<S>,
        pipeline: Arc<Pipeline<A, S>>,
        options: DispatcherOptions<A, S>,
    ) -> Self {
        let mut middlewares: Vec<SharedMiddleware<A, S>> = Vec::new();
        if options.app_middlewares {
            middlewares.extend(pipeline.middlewares().iter().cloned());
        }
        middlewares.extend(options.extra_middlewares);

        let terminal = {
            let store = store.clone();
            let pipeline = Arc::clone(&pipeline);
            let link: Link<A> = Arc::new(move |action: A| {
                if pipeline.reducers().handles(&action.kind()) {
                    store.commit(|state| pipeline.reducers().reduce(&action, state))?;
                }
                Ok(action)
            });
            link
        };
        let chain = compose(&store, &middlewares, terminal);

        tracing::debug!(
            middlewares = middlewares.len(),
            action_converter = options.action_converter,
            "Dispatcher assembled"
        );

        Self {
            inner: Arc::new(Inner {
                store,
                pipeline,
                chain,
                convert: options.action_converter,
            }),
        }
    }

    /// Dispatch an action.
    ///
    /// Returns the result of the last action that went through the chain,
    /// or the original action if the converter stage produced nothing.
    pub fn dispatch(&self, action: A) -> Result<A, DispatchError> {
        let actions = self.expand(action.clone())?;
        let mut last = None;
        for action in actions {
            last = Some(self.run(action)?);
        }
        Ok(last.unwrap_or(action))
    }

    /// Dispatch an action and collect the result of every converted action
    pub fn dispatch_all(&self, action: A) -> Result<Vec<A>, DispatchError> {
        self.expand(action)?
            .into_iter()
            .map(|action| self.run(action))
            .collect()
    }

    fn expand(&self, action: A) -> Result<Vec<A>, DispatchError> {
        if !self.inner.convert {
            return Ok(vec![action]);
        }
        let actions = self.inner.pipeline.converters().convert(action)?;
        if actions.len() != 1 {
            tracing::debug!(count = actions.len(), "Action converted");
        }
        Ok(actions)
    }

    fn run(&self, action: A) -> Result<A, DispatchError> {
        tracing::debug!(action = %action.name(), "Dispatching action");
        (self.inner.chain)(action)
    }

    /// The store this dispatcher commits to
    pub fn store(&self) -> &Store<S> {
        &self.inner.store
    }

    /// Snapshot of the current state
    pub fn state(&self) -> Arc<S> {
        self.inner.store.state()
    }

    /// Subscribe to committed states
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Arc<S>> {
        self.inner.store.subscribe()
    }

    pub fn pipeline(&self) -> &Arc<Pipeline<A, S>> {
        &self.inner.pipeline
    }
}
