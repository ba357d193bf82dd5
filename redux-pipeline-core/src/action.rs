//! Action trait and kind discriminants used as dispatch keys

use std::fmt::Debug;
use std::hash::Hash;

/// Marker trait for action kinds
///
/// A kind is a cheap, fieldless discriminant that identifies which variant
/// an action is. The pipeline keys every registry by kind, so two actions of
/// the same variant always route to the same reducers and converters.
///
/// Blanket-implemented for anything that satisfies the bounds.
pub trait ActionKind: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> ActionKind for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

/// Trait for actions that can be dispatched through a pipeline
///
/// Actions represent intents to change state. They should be:
/// - Clone: Actions may be logged, converted, or replayed
/// - Debug: For debugging and logging
/// - Send + Sync + 'static: Dispatchers are shared across threads
///
/// Use `#[derive(Action)]` from `redux-pipeline-macros` to generate the
/// implementation together with a `<Name>Kind` enum.
pub trait Action: Clone + Debug + Send + Sync + 'static {
    /// Discriminant used to look up reducers and converters
    type Kind: ActionKind;

    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;

    /// Get the kind of this action
    fn kind(&self) -> Self::Kind;
}

/// Human readable summary of an action, used by the action log
///
/// The default summary is the `Debug` representation. Override it for
/// actions carrying large payloads.
pub trait ActionSummary: Action {
    fn summary(&self) -> String {
        format!("{:?}", self)
    }
}
