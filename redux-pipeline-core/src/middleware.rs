//! Middleware chain
//!
//! A middleware wraps everything downstream of it. It receives the action
//! together with a [`Next`] handle and decides what happens:
//!
//! - forward it unchanged: `next.run(action)`
//! - forward a transformed action
//! - short-circuit by returning without calling `next`
//! - fan out by calling `next.run` more than once
//! - perform side effects before or after forwarding
//!
//! The chain is folded in reverse registration order, so the first
//! registered middleware is the outermost wrapper: it sees the action first
//! on the way in and last on the way out. The innermost `next` runs the
//! combined reducer and commits the result to the store.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::action::Action;
use crate::error::DispatchError;
use crate::store::Store;

/// One link of the composed chain
pub(crate) type Link<A> = Arc<dyn Fn(A) -> Result<A, DispatchError> + Send + Sync>;

/// Handle to the rest of the chain
pub struct Next<'a, A> {
    link: &'a Link<A>,
}

impl<A> Clone for Next<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Next<'_, A> {}

impl<A> Next<'_, A> {
    /// Pass an action to the next stage and return its result
    #[inline]
    pub fn run(&self, action: A) -> Result<A, DispatchError> {
        (self.link)(action)
    }
}

/// Interceptor stage wrapping the reducer call
///
/// Implementations must be `Send + Sync`: a dispatcher can be shared across
/// threads. Keep per-middleware mutable data behind a lock.
pub trait Middleware<A: Action, S>: Send + Sync + 'static {
    /// Handle an action, usually by calling `next.run` somewhere inside
    fn dispatch(&self, store: &Store<S>, next: Next<'_, A>, action: A)
        -> Result<A, DispatchError>;

    /// Name used in logs and error messages
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A middleware shared between builder, pipeline and dispatchers
pub type SharedMiddleware<A, S> = Arc<dyn Middleware<A, S>>;

/// Ordered list of middlewares, first element outermost
///
/// # Example
/// ```ignore
/// let list = MiddlewareList::new()
///     .with(LoggingMiddleware::new())
///     .with(auth_middleware);
/// builder.middlewares(list)?;
/// ```
pub struct MiddlewareList<A, S> {
    items: Vec<SharedMiddleware<A, S>>,
}

impl<A, S> Default for MiddlewareList<A, S> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<A: Action, S: 'static> MiddlewareList<A, S> {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware
    pub fn with<M: Middleware<A, S>>(mut self, middleware: M) -> Self {
        self.items.push(Arc::new(middleware));
        self
    }

    /// Append a middleware the caller keeps a handle to
    pub fn with_shared(mut self, middleware: SharedMiddleware<A, S>) -> Self {
        self.items.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<A, S> From<MiddlewareList<A, S>> for Vec<SharedMiddleware<A, S>> {
    fn from(list: MiddlewareList<A, S>) -> Self {
        list.items
    }
}

/// Compose `middlewares` around `terminal`, first element outermost.
pub(crate) fn compose<A, S>(
    store: &Store<S>,
    middlewares: &[SharedMiddleware<A, S>],
    terminal: Link<A>,
) -> Link<A>
where
    A: Action,
    S: Send + Sync + 'static,
{
    middlewares.iter().rev().fold(terminal, |next, middleware| {
        let middleware = Arc::clone(middleware);
        let store = store.clone();
        let link: Link<A> =
            Arc::new(move |action: A| middleware.dispatch(&store, Next { link: &next }, action));
        link
    })
}

/// Middleware built from a closure
///
/// # Example
/// ```ignore
/// let audit = middleware_fn("audit", |_store: &Store<AppState>, next: Next<'_, AppAction>, action: AppAction| {
///     tracing::info!(action = ?action, "audit");
///     next.run(action)
/// });
/// ```
pub struct FnMiddleware<A, S, F> {
    name: &'static str,
    handler: F,
    _marker: PhantomData<fn(A, &S)>,
}

/// Create a middleware from a closure
pub fn middleware_fn<A, S, F>(name: &'static str, handler: F) -> FnMiddleware<A, S, F>
where
    A: Action,
    F: Fn(&Store<S>, Next<'_, A>, A) -> Result<A, DispatchError> + Send + Sync + 'static,
{
    FnMiddleware {
        name,
        handler,
        _marker: PhantomData,
    }
}

impl<A, S, F> Middleware<A, S> for FnMiddleware<A, S, F>
where
    A: Action,
    S: 'static,
    F: Fn(&Store<S>, Next<'_, A>, A) -> Result<A, DispatchError> + Send + Sync + 'static,
{
    fn dispatch(&self, store: &Store<S>, next: Next<'_, A>, action: A) -> Result<A, DispatchError> {
        (self.handler)(store, next, action)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Middleware that only intercepts one action kind.
///
/// Actions of any other kind are forwarded untouched.
pub struct TypedMiddleware<A: Action, S, F> {
    kind: A::Kind,
    handler: F,
    _marker: PhantomData<fn(&S)>,
}

/// Create a middleware that only runs `handler` for actions of `kind`
pub fn typed<A, S, F>(kind: A::Kind, handler: F) -> TypedMiddleware<A, S, F>
where
    A: Action,
    F: Fn(&Store<S>, Next<'_, A>, A) -> Result<A, DispatchError> + Send + Sync + 'static,
{
    TypedMiddleware {
        kind,
        handler,
        _marker: PhantomData,
    }
}

impl<A, S, F> Middleware<A, S> for TypedMiddleware<A, S, F>
where
    A: Action,
    S: 'static,
    F: Fn(&Store<S>, Next<'_, A>, A) -> Result<A, DispatchError> + Send + Sync + 'static,
{
    fn dispatch(&self, store: &Store<S>, next: Next<'_, A>, action: A) -> Result<A, DispatchError> {
        if action.kind() == self.kind {
            (self.handler)(store, next, action)
        } else {
            next.run(action)
        }
    }
}

/// A no-op middleware that forwards every action
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action, S: 'static> Middleware<A, S> for NoopMiddleware {
    fn dispatch(&self, _store: &Store<S>, next: Next<'_, A>, action: A) -> Result<A, DispatchError> {
        next.run(action)
    }
}

/// Middleware that logs actions (for debugging)
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    /// Whether to log before dispatch
    pub log_before: bool,
    /// Whether to log after dispatch
    pub log_after: bool,
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingMiddleware {
    /// Create a new logging middleware with default settings (log after only)
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Create a logging middleware that logs both before and after
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl<A: Action, S: Send + Sync + 'static> Middleware<A, S> for LoggingMiddleware {
    fn dispatch(&self, store: &Store<S>, next: Next<'_, A>, action: A) -> Result<A, DispatchError> {
        let name = action.name();
        if self.log_before {
            tracing::debug!(action = %name, "Dispatching action");
        }

        let before = store.state();
        let result = next.run(action);

        if self.log_after {
            match &result {
                Ok(_) => tracing::debug!(
                    action = %name,
                    state_changed = !Arc::ptr_eq(&before, &store.state()),
                    "Action processed"
                ),
                Err(error) => tracing::debug!(action = %name, %error, "Action failed"),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestAction, TestKind};
    use parking_lot::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn terminal(trace: &Trace) -> Link<TestAction> {
        let trace = Arc::clone(trace);
        Arc::new(move |action: TestAction| {
            trace.lock().push(format!("reducer:{}", action.name()));
            Ok(action)
        })
    }

    fn tagging(tag: &'static str, trace: &Trace) -> SharedMiddleware<TestAction, i32> {
        let trace = Arc::clone(trace);
        Arc::new(middleware_fn(
            tag,
            move |_: &Store<i32>, next: Next<'_, TestAction>, action: TestAction| {
                trace.lock().push(format!("{tag}:in"));
                let result = next.run(action);
                trace.lock().push(format!("{tag}:out"));
                result
            },
        ))
    }

    #[test]
    fn test_first_registered_is_outermost() {
        let store = Store::new(0);
        let trace = Trace::default();
        let chain = compose(
            &store,
            &[tagging("m1", &trace), tagging("m2", &trace)],
            terminal(&trace),
        );

        chain(TestAction::Increment).unwrap();

        assert_eq!(
            *trace.lock(),
            vec!["m1:in", "m2:in", "reducer:Increment", "m2:out", "m1:out"]
        );
    }

    #[test]
    fn test_short_circuit_skips_rest_of_chain() {
        let store = Store::new(0);
        let trace = Trace::default();
        let blocker: SharedMiddleware<TestAction, i32> = Arc::new(typed(
            TestKind::Blocked,
            |_: &Store<i32>, _next: Next<'_, TestAction>, action: TestAction| Ok(action),
        ));
        let chain = compose(
            &store,
            &[blocker, tagging("m2", &trace)],
            terminal(&trace),
        );

        assert_eq!(chain(TestAction::Blocked).unwrap(), TestAction::Blocked);
        assert!(trace.lock().is_empty());

        chain(TestAction::Noop).unwrap();
        assert_eq!(*trace.lock(), vec!["m2:in", "reducer:Noop", "m2:out"]);
    }

    #[test]
    fn test_fan_out_and_transform() {
        let store = Store::new(0);
        let trace = Trace::default();
        let fan_out: SharedMiddleware<TestAction, i32> = Arc::new(middleware_fn(
            "fan_out",
            |_: &Store<i32>, next: Next<'_, TestAction>, action: TestAction| match action {
                TestAction::Convert => {
                    next.run(TestAction::Add(1))?;
                    next.run(TestAction::Multiply(2))
                }
                other => next.run(other),
            },
        ));
        let chain = compose(&store, &[fan_out], terminal(&trace));

        assert_eq!(chain(TestAction::Convert).unwrap(), TestAction::Multiply(2));
        assert_eq!(*trace.lock(), vec!["reducer:Add", "reducer:Multiply"]);
    }

    #[test]
    fn test_middleware_error_stops_chain() {
        let store = Store::new(0);
        let trace = Trace::default();
        let failing: SharedMiddleware<TestAction, i32> = Arc::new(middleware_fn(
            "failing",
            |_: &Store<i32>, _next: Next<'_, TestAction>, _action: TestAction| {
                Err(DispatchError::middleware("failing", "offline"))
            },
        ));
        let chain = compose(&store, &[failing], terminal(&trace));

        let err = chain(TestAction::Increment).unwrap_err();
        assert!(matches!(err, DispatchError::Middleware { middleware: "failing", .. }));
        assert!(trace.lock().is_empty());
    }

    #[test]
    fn test_builtin_middlewares_forward() {
        let store = Store::new(0);
        let trace = Trace::default();
        let chain = compose(
            &store,
            &[
                Arc::new(NoopMiddleware) as SharedMiddleware<TestAction, i32>,
                Arc::new(LoggingMiddleware::verbose()) as SharedMiddleware<TestAction, i32>,
            ],
            terminal(&trace),
        );

        chain(TestAction::Noop).unwrap();
        assert_eq!(*trace.lock(), vec!["reducer:Noop"]);
    }

    #[test]
    fn test_middleware_names() {
        let named = middleware_fn(
            "audit",
            |_: &Store<i32>, next: Next<'_, TestAction>, action: TestAction| next.run(action),
        );
        assert_eq!(Middleware::<TestAction, i32>::name(&named), "audit");
        assert!(Middleware::<TestAction, i32>::name(&NoopMiddleware).ends_with("NoopMiddleware"));
    }
}
