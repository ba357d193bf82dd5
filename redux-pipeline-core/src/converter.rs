//! Action converter stage
//!
//! Before an action reaches the middleware chain it can be rewritten into
//! zero, one or many replacement actions. Converters are registered per
//! source action kind:
//!
//! - a *unique* converter (`drop_original = true`, no filter) replaces the
//!   original action; at most one may exist per kind
//! - *non-unique* converters (filtered, or `drop_original = false`) append
//!   their replacement after the original
//!
//! # Example
//!
//! ```ignore
//! // A -> [A, B, C]: keep A, then dispatch B and C
//! builder.converter(Kind::A, false, |_| Some(Action::B))?;
//! builder.converter(Kind::A, false, |_| Some(Action::C))?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::action::Action;
use crate::error::{BoxError, DispatchError};
use crate::reducer::Filter;

/// A type-erased, fallible action converter
pub type BoxedConverter<A> = Arc<dyn Fn(&A) -> Result<Option<A>, BoxError> + Send + Sync>;

struct ConverterEntry<A> {
    unique: bool,
    drop_original: bool,
    filter: Option<Filter<A>>,
    convert: BoxedConverter<A>,
}

impl<A> ConverterEntry<A> {
    fn accepts(&self, action: &A) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(action))
    }
}

/// Converter tables, keyed by source action kind.
pub struct ConverterStage<A: Action> {
    entries: HashMap<A::Kind, Vec<ConverterEntry<A>>>,
}

impl<A: Action> Default for ConverterStage<A> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<A: Action> std::fmt::Debug for ConverterStage<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterStage")
            .field("kinds", &self.entries.len())
            .finish()
    }
}

impl<A: Action> ConverterStage<A> {
    /// Register the unique dropping converter. Returns `false` if one exists.
    pub(crate) fn insert_unique(&mut self, kind: A::Kind, convert: BoxedConverter<A>) -> bool {
        let entries = self.entries.entry(kind).or_default();
        if entries.iter().any(|entry| entry.unique) {
            return false;
        }
        entries.push(ConverterEntry {
            unique: true,
            drop_original: true,
            filter: None,
            convert,
        });
        true
    }

    pub(crate) fn push(
        &mut self,
        kind: A::Kind,
        drop_original: bool,
        filter: Option<Filter<A>>,
        convert: BoxedConverter<A>,
    ) {
        self.entries.entry(kind).or_default().push(ConverterEntry {
            unique: false,
            drop_original,
            filter,
            convert,
        });
    }

    /// Whether any converter is registered for `kind`
    pub fn handles(&self, kind: &A::Kind) -> bool {
        self.entries.contains_key(kind)
    }

    /// Expand an action into the sequence of actions to dispatch.
    ///
    /// The original action comes first unless a unique converter exists
    /// for its kind, or an accepting converter asked to drop it.
    /// Replacements follow in registration order.
    pub fn convert(&self, action: A) -> Result<Vec<A>, DispatchError> {
        let Some(entries) = self.entries.get(&action.kind()) else {
            return Ok(vec![action]);
        };

        let drop_original = entries
            .iter()
            .any(|entry| entry.unique || (entry.drop_original && entry.accepts(&action)));

        let mut converted = Vec::with_capacity(entries.len());
        for entry in entries.iter().filter(|entry| entry.accepts(&action)) {
            let replacement = (entry.convert)(&action).map_err(|source| {
                DispatchError::Converter {
                    action: action.name(),
                    source,
                }
            })?;
            converted.extend(replacement);
        }

        if drop_original {
            tracing::debug!(
                action = %action.name(),
                converted = converted.len(),
                "Dropped original action"
            );
            Ok(converted)
        } else {
            let mut out = Vec::with_capacity(converted.len() + 1);
            out.push(action);
            out.extend(converted);
            Ok(out)
        }
    }
}
