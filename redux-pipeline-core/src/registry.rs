//! Pipeline configuration
//!
//! All reducers, converters and middlewares are registered on a
//! [`PipelineBuilder`] during startup. [`PipelineBuilder::build`] consumes
//! the builder and produces an immutable [`Pipeline`], so nothing can be
//! registered once dispatching has started.
//!
//! # Example
//!
//! ```ignore
//! let mut builder = PipelineBuilder::<AppAction, AppState>::new();
//! builder
//!     .slice_reducer(AppActionKind::Increment, |_, n: Counter| Counter(n.0 + 1))?
//!     .converter(AppActionKind::Reset, true, |_| Some(AppAction::SetCount(0)))?
//!     .middlewares(MiddlewareList::new().with(LoggingMiddleware::new()))?;
//! let pipeline = Arc::new(builder.build());
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use crate::action::Action;
use crate::converter::{BoxedConverter, ConverterStage};
use crate::error::{BoxError, ConfigError};
use crate::middleware::{MiddlewareList, SharedMiddleware};
use crate::reducer::{BoxedReducer, CombinedReducer, Filter};
use crate::state::Slice;

/// A unit of registrations, typically one per feature of the app.
///
/// Closures of the right shape are modules too.
pub trait Module<A: Action, S> {
    fn register(&self, builder: &mut PipelineBuilder<A, S>) -> Result<(), ConfigError>;
}

impl<A, S, F> Module<A, S> for F
where
    A: Action,
    F: Fn(&mut PipelineBuilder<A, S>) -> Result<(), ConfigError>,
{
    fn register(&self, builder: &mut PipelineBuilder<A, S>) -> Result<(), ConfigError> {
        self(builder)
    }
}

/// Accumulates registrations during the configuration phase.
pub struct PipelineBuilder<A: Action, S> {
    reducers: CombinedReducer<A, S>,
    converters: ConverterStage<A>,
    middlewares: Option<Vec<SharedMiddleware<A, S>>>,
}

impl<A: Action, S> Default for PipelineBuilder<A, S> {
    fn default() -> Self {
        Self {
            reducers: CombinedReducer::default(),
            converters: ConverterStage::default(),
            middlewares: None,
        }
    }
}

impl<A: Action, S> std::fmt::Debug for PipelineBuilder<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("reducers", &self.reducers)
            .field("converters", &self.converters)
            .field("middlewares", &self.middlewares.as_ref().map(Vec::len))
            .finish()
    }
}

fn duplicate<K: std::fmt::Debug>(registry: &'static str, kind: K) -> ConfigError {
    ConfigError::DuplicateRegistration {
        registry,
        kind: format!("{:?}", kind),
    }
}

impl<A: Action, S: 'static> PipelineBuilder<A, S> {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the unique reducer for `kind`.
    ///
    /// Fails with [`ConfigError::DuplicateRegistration`] if `kind` already
    /// has one. Use [`filtered_reducer`](Self::filtered_reducer) to attach
    /// several reducers to the same kind.
    pub fn reducer<F>(&mut self, kind: A::Kind, reducer: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&A, S) -> S + Send + Sync + 'static,
    {
        self.try_reducer(kind, move |action: &A, state: S| {
            Ok::<_, Infallible>(reducer(action, state))
        })
    }

    /// Register a fallible unique reducer for `kind`.
    ///
    /// An error returned by the reducer aborts the dispatch and reaches the
    /// caller as [`DispatchError::Reducer`](crate::DispatchError::Reducer).
    pub fn try_reducer<F, E>(&mut self, kind: A::Kind, reducer: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&A, S) -> Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        let boxed: BoxedReducer<A, S> =
            Arc::new(move |action: &A, state: S| reducer(action, state).map_err(Into::into));
        if !self.reducers.insert_unique(kind, boxed) {
            return Err(duplicate("reducer", kind));
        }
        tracing::trace!(kind = ?kind, "Registered reducer");
        Ok(self)
    }

    /// Register a reducer for `kind` that only runs when `filter` accepts
    /// the action. Filtered reducers run after the unique one, in
    /// registration order.
    pub fn filtered_reducer<P, F>(&mut self, kind: A::Kind, filter: P, reducer: F) -> &mut Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
        F: Fn(&A, S) -> S + Send + Sync + 'static,
    {
        self.try_filtered_reducer(kind, filter, move |action: &A, state: S| {
            Ok::<_, Infallible>(reducer(action, state))
        })
    }

    /// Fallible variant of [`filtered_reducer`](Self::filtered_reducer)
    pub fn try_filtered_reducer<P, F, E>(&mut self, kind: A::Kind, filter: P, reducer: F) -> &mut Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
        F: Fn(&A, S) -> Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        let filter: Filter<A> = Arc::new(filter);
        let boxed: BoxedReducer<A, S> =
            Arc::new(move |action: &A, state: S| reducer(action, state).map_err(Into::into));
        self.reducers.push_filtered(kind, filter, boxed);
        tracing::trace!(kind = ?kind, "Registered filtered reducer");
        self
    }

    /// Register the unique reducer for `kind` against one slice of the state.
    pub fn slice_reducer<T, F>(&mut self, kind: A::Kind, reducer: F) -> Result<&mut Self, ConfigError>
    where
        S: Slice<T>,
        T: 'static,
        F: Fn(&A, T) -> T + Send + Sync + 'static,
    {
        self.reducer(kind, move |action: &A, state: S| {
            let slice = <S as Slice<T>>::slice(&state);
            <S as Slice<T>>::with_slice(state, reducer(action, slice))
        })
    }

    /// Register a filtered reducer for `kind` against one slice of the state.
    pub fn filtered_slice_reducer<T, P, F>(
        &mut self,
        kind: A::Kind,
        filter: P,
        reducer: F,
    ) -> &mut Self
    where
        S: Slice<T>,
        T: 'static,
        P: Fn(&A) -> bool + Send + Sync + 'static,
        F: Fn(&A, T) -> T + Send + Sync + 'static,
    {
        self.filtered_reducer(kind, filter, move |action: &A, state: S| {
            let slice = <S as Slice<T>>::slice(&state);
            <S as Slice<T>>::with_slice(state, reducer(action, slice))
        })
    }

    /// Register an action converter for `kind`.
    ///
    /// With `drop_original = true` this is the unique converter for the
    /// kind: the original action is replaced by the converter's output, and
    /// registering a second one fails with
    /// [`ConfigError::DuplicateRegistration`]. With `drop_original = false`
    /// any number may be registered and the original action is kept.
    pub fn converter<F>(
        &mut self,
        kind: A::Kind,
        drop_original: bool,
        converter: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&A) -> Option<A> + Send + Sync + 'static,
    {
        self.try_converter(kind, drop_original, move |action: &A| {
            Ok::<_, Infallible>(converter(action))
        })
    }

    /// Fallible variant of [`converter`](Self::converter)
    pub fn try_converter<F, E>(
        &mut self,
        kind: A::Kind,
        drop_original: bool,
        converter: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&A) -> Result<Option<A>, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        let boxed: BoxedConverter<A> =
            Arc::new(move |action: &A| converter(action).map_err(Into::into));
        if drop_original {
            if !self.converters.insert_unique(kind, boxed) {
                return Err(duplicate("converter", kind));
            }
        } else {
            self.converters.push(kind, false, None, boxed);
        }
        tracing::trace!(kind = ?kind, drop_original = drop_original, "Registered action converter");
        Ok(self)
    }

    /// Register a converter for `kind` that only runs when `filter` accepts
    /// the action. Filtered converters are never unique; `drop_original`
    /// only applies to actions the filter accepts.
    pub fn filtered_converter<F, P>(
        &mut self,
        kind: A::Kind,
        drop_original: bool,
        converter: F,
        filter: P,
    ) -> &mut Self
    where
        F: Fn(&A) -> Option<A> + Send + Sync + 'static,
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        let filter: Filter<A> = Arc::new(filter);
        let boxed: BoxedConverter<A> =
            Arc::new(move |action: &A| Ok::<_, BoxError>(converter(action)));
        self.converters.push(kind, drop_original, Some(filter), boxed);
        tracing::trace!(
            kind = ?kind,
            drop_original = drop_original,
            "Registered filtered action converter"
        );
        self
    }

    /// Register the app middlewares, first element outermost.
    ///
    /// Can only be called once per builder.
    pub fn middlewares(&mut self, list: MiddlewareList<A, S>) -> Result<&mut Self, ConfigError> {
        if self.middlewares.is_some() {
            return Err(ConfigError::AlreadyConfigured);
        }
        let list: Vec<_> = list.into();
        tracing::trace!(count = list.len(), "Registered middlewares");
        self.middlewares = Some(list);
        Ok(self)
    }

    /// Apply all registrations of a module
    pub fn install<M: Module<A, S> + ?Sized>(&mut self, module: &M) -> Result<&mut Self, ConfigError> {
        module.register(self)?;
        Ok(self)
    }

    /// Freeze the configuration
    pub fn build(self) -> Pipeline<A, S> {
        let pipeline = Pipeline {
            reducers: self.reducers,
            converters: self.converters,
            middlewares: self.middlewares.unwrap_or_default(),
        };
        tracing::debug!(
            reducers = ?pipeline.reducers,
            converters = ?pipeline.converters,
            middlewares = pipeline.middlewares.len(),
            "Pipeline built"
        );
        pipeline
    }
}

/// Immutable, fully configured pipeline shared by dispatchers.
pub struct Pipeline<A: Action, S> {
    reducers: CombinedReducer<A, S>,
    converters: ConverterStage<A>,
    middlewares: Vec<SharedMiddleware<A, S>>,
}

impl<A: Action, S> std::fmt::Debug for Pipeline<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("reducers", &self.reducers)
            .field("converters", &self.converters)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl<A: Action, S> Pipeline<A, S> {
    /// The composed reducer
    pub fn reducers(&self) -> &CombinedReducer<A, S> {
        &self.reducers
    }

    /// The converter stage
    pub fn converters(&self) -> &ConverterStage<A> {
        &self.converters
    }

    /// App middlewares in registration order
    pub fn middlewares(&self) -> &[SharedMiddleware<A, S>] {
        &self.middlewares
    }
}
