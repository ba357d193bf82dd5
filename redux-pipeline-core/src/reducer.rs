//! Reducer composition
//!
//! Reducers are pure functions `(action, state) -> state`. The builder
//! stores them in two tables keyed by action kind:
//!
//! - one *unique* reducer per kind
//! - any number of *filtered* reducers per kind, each behind a predicate
//!
//! [`CombinedReducer`] merges both tables into a single function. For an
//! action of kind `K` it first applies the unique reducer for `K` (if any),
//! then every filtered reducer for `K` whose predicate accepts the action,
//! in registration order. State is threaded through each step.

use std::collections::HashMap;
use std::sync::Arc;

use crate::action::Action;
use crate::error::{BoxError, DispatchError};

/// A type-erased, fallible reducer over the whole pipeline state
pub type BoxedReducer<A, S> = Arc<dyn Fn(&A, S) -> Result<S, BoxError> + Send + Sync>;

/// A predicate over actions, used by filtered reducers and converters
pub type Filter<A> = Arc<dyn Fn(&A) -> bool + Send + Sync>;

pub(crate) struct FilteredReducer<A, S> {
    filter: Filter<A>,
    reducer: BoxedReducer<A, S>,
}

/// Outcome of running the combined reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction<S> {
    /// The new state (the input state if nothing applied)
    pub state: S,
    /// How many reducers ran
    pub applied: usize,
}

impl<S> Reduction<S> {
    /// Whether any reducer ran for the action
    #[inline]
    pub fn is_applied(&self) -> bool {
        self.applied > 0
    }
}

/// The unique and filtered reducer tables, composed into one reducer.
pub struct CombinedReducer<A: Action, S> {
    unique: HashMap<A::Kind, BoxedReducer<A, S>>,
    filtered: HashMap<A::Kind, Vec<FilteredReducer<A, S>>>,
}

impl<A: Action, S> Default for CombinedReducer<A, S> {
    fn default() -> Self {
        Self {
            unique: HashMap::new(),
            filtered: HashMap::new(),
        }
    }
}

impl<A: Action, S> std::fmt::Debug for CombinedReducer<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("unique_kinds", &self.unique.len())
            .field("filtered_kinds", &self.filtered.len())
            .finish()
    }
}

impl<A: Action, S> CombinedReducer<A, S> {
    /// Insert a unique reducer. Returns `false` if the kind is taken.
    pub(crate) fn insert_unique(&mut self, kind: A::Kind, reducer: BoxedReducer<A, S>) -> bool {
        if self.unique.contains_key(&kind) {
            return false;
        }
        self.unique.insert(kind, reducer);
        true
    }

    pub(crate) fn push_filtered(
        &mut self,
        kind: A::Kind,
        filter: Filter<A>,
        reducer: BoxedReducer<A, S>,
    ) {
        self.filtered
            .entry(kind)
            .or_default()
            .push(FilteredReducer { filter, reducer });
    }

    /// Whether any reducer is registered for `kind`
    pub fn handles(&self, kind: &A::Kind) -> bool {
        self.unique.contains_key(kind) || self.filtered.contains_key(kind)
    }

    /// Number of filtered reducers registered for `kind`
    pub fn filtered_count(&self, kind: &A::Kind) -> usize {
        self.filtered.get(kind).map_or(0, Vec::len)
    }

    /// Run the unique reducer, then the matching filtered reducers.
    pub fn reduce(&self, action: &A, state: S) -> Result<Reduction<S>, DispatchError> {
        let kind = action.kind();
        let mut state = state;
        let mut applied = 0;

        if let Some(reducer) = self.unique.get(&kind) {
            state = reducer(action, state).map_err(|source| DispatchError::Reducer {
                action: action.name(),
                source,
            })?;
            applied += 1;
        }

        if let Some(chain) = self.filtered.get(&kind) {
            for entry in chain.iter().filter(|entry| (entry.filter)(action)) {
                state = (entry.reducer)(action, state).map_err(|source| {
                    DispatchError::Reducer {
                        action: action.name(),
                        source,
                    }
                })?;
                applied += 1;
            }
        }

        Ok(Reduction { state, applied })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestAction, TestKind};

    fn boxed(
        f: impl Fn(&TestAction, i32) -> i32 + Send + Sync + 'static,
    ) -> BoxedReducer<TestAction, i32> {
        Arc::new(move |a: &TestAction, s: i32| Ok(f(a, s)))
    }

    fn always() -> Filter<TestAction> {
        Arc::new(|_: &TestAction| true)
    }

    #[test]
    fn test_unknown_kind_is_noop() {
        let reducer = CombinedReducer::<TestAction, i32>::default();
        let reduction = reducer.reduce(&TestAction::Noop, 7).unwrap();
        assert_eq!(reduction.state, 7);
        assert!(!reduction.is_applied());
    }

    #[test]
    fn test_unique_then_filtered() {
        let mut reducer = CombinedReducer::<TestAction, i32>::default();
        assert!(reducer.insert_unique(TestKind::Increment, boxed(|_, n| n + 1)));
        reducer.push_filtered(TestKind::Increment, always(), boxed(|_, n| n * 10));

        let reduction = reducer.reduce(&TestAction::Increment, 1).unwrap();
        assert_eq!(reduction.state, 20);
        assert_eq!(reduction.applied, 2);
    }

    #[test]
    fn test_filtered_run_in_registration_order() {
        let mut reducer = CombinedReducer::<TestAction, i32>::default();
        reducer.push_filtered(TestKind::Add, always(), boxed(|_, n| n + 2));
        reducer.push_filtered(TestKind::Add, always(), boxed(|_, n| n * 3));

        // (0 + 2) * 3, not 0 * 3 + 2
        assert_eq!(reducer.reduce(&TestAction::Add(0), 0).unwrap().state, 6);
        assert_eq!(reducer.filtered_count(&TestKind::Add), 2);
    }

    #[test]
    fn test_filter_rejects() {
        let mut reducer = CombinedReducer::<TestAction, i32>::default();
        reducer.push_filtered(
            TestKind::Add,
            Arc::new(|a: &TestAction| matches!(a, TestAction::Add(n) if *n > 0)),
            boxed(|a, n| match a {
                TestAction::Add(d) => n + d,
                _ => n,
            }),
        );

        let skipped = reducer.reduce(&TestAction::Add(-1), 5).unwrap();
        assert_eq!(skipped.state, 5);
        assert_eq!(skipped.applied, 0);

        assert_eq!(reducer.reduce(&TestAction::Add(4), 5).unwrap().state, 9);
    }

    #[test]
    fn test_duplicate_unique_rejected() {
        let mut reducer = CombinedReducer::<TestAction, i32>::default();
        assert!(reducer.insert_unique(TestKind::Increment, boxed(|_, n| n + 1)));
        assert!(!reducer.insert_unique(TestKind::Increment, boxed(|_, n| n + 2)));
        assert_eq!(reducer.reduce(&TestAction::Increment, 0).unwrap().state, 1);
    }

    #[test]
    fn test_reducer_error_propagates() {
        let mut reducer = CombinedReducer::<TestAction, i32>::default();
        reducer.insert_unique(
            TestKind::Increment,
            Arc::new(|_: &TestAction, _: i32| -> Result<i32, BoxError> { Err("overflow".into()) }),
        );

        let err = reducer.reduce(&TestAction::Increment, 0).unwrap_err();
        assert!(matches!(err, DispatchError::Reducer { action: "Increment", .. }));
    }
}
