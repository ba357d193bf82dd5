//! Slice-partitioned application state
//!
//! A pipeline works with any `S: Clone + Send + Sync`. Larger apps usually
//! split their state into independent slices and register reducers that
//! only know about one slice. The [`Slice`] trait is the seam that lets the
//! builder lift such a slice reducer to the whole state.
//!
//! [`AppState`] is a ready-made state container keyed by slice type:
//!
//! ```
//! use redux_pipeline_core::state::{AppState, Slice};
//!
//! #[derive(Clone, Default, Debug, PartialEq)]
//! struct Counter(i32);
//!
//! let state = AppState::new().with(Counter(2));
//! assert_eq!(state.get::<Counter>(), Some(&Counter(2)));
//!
//! let next = Slice::<Counter>::with_slice(state.clone(), Counter(3));
//! assert_eq!(Slice::<Counter>::slice(&next), Counter(3));
//! // The old value is untouched
//! assert_eq!(state.get::<Counter>(), Some(&Counter(2)));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Access to one typed slice of a larger state value
pub trait Slice<T>: Sized {
    /// Read the slice (owned copy)
    fn slice(&self) -> T;

    /// Return a new state with the slice replaced
    fn with_slice(self, value: T) -> Self;
}

#[derive(Clone)]
struct Entry {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Immutable heterogeneous state, one value per slice type.
///
/// Slices are stored behind `Arc`, so cloning an `AppState` is cheap and
/// replacing one slice never copies the others.
#[derive(Clone, Default)]
pub struct AppState {
    slices: HashMap<TypeId, Entry>,
}

impl AppState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a slice by type, if it was ever set
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.slices
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref::<T>())
    }

    /// Return a new state with the slice of type `T` set to `value`
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.slices.insert(
            TypeId::of::<T>(),
            Entry {
                type_name: std::any::type_name::<T>(),
                value: Arc::new(value),
            },
        );
        self
    }

    /// Whether a slice of type `T` is present
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.slices.contains_key(&TypeId::of::<T>())
    }

    /// Number of slices
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether no slice has been set
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.slices.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        f.debug_struct("AppState").field("slices", &names).finish()
    }
}

/// Missing slices read as `T::default()`.
impl<T> Slice<T> for AppState
where
    T: Any + Clone + Default + Send + Sync,
{
    fn slice(&self) -> T {
        self.get::<T>().cloned().unwrap_or_default()
    }

    fn with_slice(self, value: T) -> Self {
        self.with(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Counter(i32);

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Profile {
        name: String,
    }

    #[test]
    fn test_missing_slice_reads_default() {
        let state = AppState::new();
        assert!(state.get::<Counter>().is_none());
        assert_eq!(Slice::<Counter>::slice(&state), Counter(0));
    }

    #[test]
    fn test_slices_are_independent() {
        let state = AppState::new().with(Counter(1)).with(Profile {
            name: "ada".into(),
        });
        let next = state.clone().with(Counter(5));

        assert_eq!(next.get::<Counter>(), Some(&Counter(5)));
        assert_eq!(next.get::<Profile>().map(|p| p.name.as_str()), Some("ada"));
        assert_eq!(state.get::<Counter>(), Some(&Counter(1)));
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_debug_lists_slice_types() {
        let state = AppState::new().with(Counter(1));
        let debug = format!("{:?}", state);
        assert!(debug.contains("Counter"));
    }
}
