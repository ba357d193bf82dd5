//! Test utilities for pipelines
//!
//! - [`RecordingMiddleware`]: remembers every action that reaches it
//! - [`TestHarness`]: a store plus a dispatcher with a recorder placed
//!   innermost, so it sees exactly the actions that reach the reducer
//! - Assertion macros for checking recorded actions
//!
//! # Example
//!
//! ```ignore
//! use redux_pipeline::testing::TestHarness;
//! use redux_pipeline::{assert_dispatched, assert_not_dispatched};
//!
//! let harness = TestHarness::new(pipeline, AppState::default());
//! harness.dispatch(AppAction::Checkout).unwrap();
//!
//! let reduced = harness.drain_reduced();
//! assert_dispatched!(reduced, AppAction::ClearCart);
//! assert_not_dispatched!(reduced, AppAction::Checkout);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::Action;
use crate::dispatcher::{Dispatcher, DispatcherOptions};
use crate::error::DispatchError;
use crate::middleware::{Middleware, Next};
use crate::registry::Pipeline;
use crate::store::Store;

/// Middleware that records every action passing through it.
///
/// Clones share the same recording.
#[derive(Debug)]
pub struct RecordingMiddleware<A> {
    recorded: Arc<Mutex<Vec<A>>>,
}

impl<A> Clone for RecordingMiddleware<A> {
    fn clone(&self) -> Self {
        Self {
            recorded: Arc::clone(&self.recorded),
        }
    }
}

impl<A> Default for RecordingMiddleware<A> {
    fn default() -> Self {
        Self {
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<A: Clone> RecordingMiddleware<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first
    pub fn recorded(&self) -> Vec<A> {
        self.recorded.lock().clone()
    }

    /// Take the recording, leaving it empty
    pub fn drain(&self) -> Vec<A> {
        std::mem::take(&mut *self.recorded.lock())
    }
}

impl<A: Action, S: 'static> Middleware<A, S> for RecordingMiddleware<A> {
    fn dispatch(&self, _store: &Store<S>, next: Next<'_, A>, action: A) -> Result<A, DispatchError> {
        self.recorded.lock().push(action.clone());
        next.run(action)
    }

    fn name(&self) -> &'static str {
        "RecordingMiddleware"
    }
}

/// Store, dispatcher and recorder wired together for tests.
///
/// # Type Parameters
///
/// - `A`: the action type
/// - `S`: the pipeline state
pub struct TestHarness<A: Action, S> {
    dispatcher: Dispatcher<A, S>,
    recorder: RecordingMiddleware<A>,
}

impl<A, S> TestHarness<A, S>
where
    A: Action,
    S: Clone + Send + Sync + 'static,
{
    pub fn new(pipeline: Arc<Pipeline<A, S>>, state: S) -> Self {
        let recorder = RecordingMiddleware::new();
        let options = DispatcherOptions::new().extra_middleware(recorder.clone());
        Self {
            dispatcher: Dispatcher::with_options(Store::new(state), pipeline, options),
            recorder,
        }
    }

    pub fn dispatch(&self, action: A) -> Result<A, DispatchError> {
        self.dispatcher.dispatch(action)
    }

    /// Dispatch several actions, stopping at the first error
    pub fn dispatch_many<I>(&self, actions: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = A>,
    {
        for action in actions {
            self.dispatcher.dispatch(action)?;
        }
        Ok(())
    }

    pub fn state(&self) -> Arc<S> {
        self.dispatcher.state()
    }

    pub fn dispatcher(&self) -> &Dispatcher<A, S> {
        &self.dispatcher
    }

    pub fn store(&self) -> &Store<S> {
        self.dispatcher.store()
    }

    /// Actions that reached the reducer since the last drain
    pub fn drain_reduced(&self) -> Vec<A> {
        self.recorder.drain()
    }

    pub fn recorder(&self) -> &RecordingMiddleware<A> {
        &self.recorder
    }
}

/// Assert that an action matching a pattern was recorded.
///
/// # Example
///
/// ```ignore
/// let reduced = harness.drain_reduced();
/// assert_dispatched!(reduced, AppAction::SetCount(n) if *n > 0);
/// ```
#[macro_export]
macro_rules! assert_dispatched {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected an action matching `{}`, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that no recorded action matches a pattern.
#[macro_export]
macro_rules! assert_not_dispatched {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected no action matching `{}`, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// First recorded action matching a pattern.
#[macro_export]
macro_rules! find_dispatched {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().find(|a| matches!(a, $pattern $(if $guard)?))
    };
}

/// Number of recorded actions matching a pattern.
#[macro_export]
macro_rules! count_dispatched {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{typed, MiddlewareList};
    use crate::registry::PipelineBuilder;
    use crate::test_support::{TestAction, TestKind};

    fn pipeline() -> Arc<Pipeline<TestAction, i32>> {
        let mut builder = PipelineBuilder::<TestAction, i32>::new();
        builder
            .reducer(TestKind::Add, |a, n| match a {
                TestAction::Add(d) => n + d,
                _ => n,
            })
            .unwrap()
            .converter(TestKind::Convert, true, |_| Some(TestAction::Add(5)))
            .unwrap()
            .middlewares(MiddlewareList::new().with(typed(
                TestKind::Blocked,
                |_: &Store<i32>, _: Next<'_, TestAction>, action: TestAction| Ok(action),
            )))
            .unwrap();
        Arc::new(builder.build())
    }

    #[test]
    fn test_harness_records_what_reaches_reducer() {
        let harness = TestHarness::new(pipeline(), 0);
        harness
            .dispatch_many([TestAction::Convert, TestAction::Blocked, TestAction::Add(1)])
            .unwrap();

        assert_eq!(*harness.state(), 6);
        let reduced = harness.drain_reduced();
        assert_eq!(reduced, vec![TestAction::Add(5), TestAction::Add(1)]);
        assert!(harness.drain_reduced().is_empty());
    }

    #[test]
    fn test_assertion_macros() {
        let harness = TestHarness::new(pipeline(), 0);
        harness
            .dispatch_many([TestAction::Add(1), TestAction::Add(2), TestAction::Noop])
            .unwrap();
        let reduced = harness.recorder().recorded();

        assert_dispatched!(reduced, TestAction::Add(_));
        assert_dispatched!(reduced, TestAction::Add(n) if *n == 2);
        assert_not_dispatched!(reduced, TestAction::Convert);
        assert_eq!(count_dispatched!(reduced, TestAction::Add(_)), 2);
        assert_eq!(
            find_dispatched!(reduced, TestAction::Add(n) if *n > 1),
            Some(&TestAction::Add(2))
        );
    }

    #[test]
    fn test_recorder_clones_share_recording() {
        let recorder = RecordingMiddleware::<TestAction>::new();
        let store = Store::new(0);
        let handle = recorder.clone();
        let link: crate::middleware::Link<TestAction> =
            Arc::new(|action: TestAction| -> Result<TestAction, DispatchError> { Ok(action) });
        let chain = crate::middleware::compose(
            &store,
            &[Arc::new(recorder) as crate::middleware::SharedMiddleware<TestAction, i32>],
            link,
        );

        chain(TestAction::Increment).unwrap();
        assert_eq!(handle.recorded(), vec![TestAction::Increment]);
    }
}
