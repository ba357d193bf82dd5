//! Action logging with glob filtering and an optional in-memory history
//!
//! [`ActionLoggerMiddleware`] emits a `tracing` event for every action whose
//! name passes an include/exclude filter. With a history attached it also
//! keeps the most recent entries in an [`ActionLog`] ring buffer, each
//! annotated with whether the action changed the state.
//!
//! # Example
//!
//! ```ignore
//! let logger = ActionLoggerMiddleware::with_log(ActionLogConfig::with_capacity(50));
//! let history = logger.log().cloned();
//! builder.middlewares(MiddlewareList::new().with(logger))?;
//!
//! // later
//! if let Some(history) = history {
//!     for entry in history.lock().recent(10) {
//!         println!("{} {}", entry.elapsed_display(), entry.summary);
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::action::ActionSummary;
use crate::error::DispatchError;
use crate::middleware::{Middleware, Next};
use crate::store::Store;

const DEFAULT_EXCLUDES: [&str; 2] = ["Tick", "Render"];

// Larger logs grow on demand up to their capacity
const PREALLOCATED_ENTRIES: usize = 256;

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

fn split_patterns(patterns: &str) -> Vec<String> {
    patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Which action names get logged.
///
/// Patterns are globs: `*` matches any run of characters, `?` exactly one.
/// An action is logged when it matches at least one include pattern (or
/// the include list is empty) and no exclude pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLoggerConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for ActionLoggerConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: default_excludes(),
        }
    }
}

impl ActionLoggerConfig {
    /// Build a filter from comma-separated pattern lists.
    ///
    /// `None` for `include` logs everything; `None` for `exclude` keeps the
    /// default excludes (`Tick`, `Render`).
    ///
    /// ```
    /// use redux_pipeline_core::ActionLoggerConfig;
    ///
    /// let config = ActionLoggerConfig::new(Some("Load*, Save"), None);
    /// assert!(config.should_log("LoadProfile"));
    /// assert!(config.should_log("Save"));
    /// assert!(!config.should_log("Render"));
    /// assert!(!config.should_log("Delete"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: include.map(split_patterns).unwrap_or_default(),
            exclude_patterns: exclude.map(split_patterns).unwrap_or_else(default_excludes),
        }
    }

    /// Log every action
    pub fn all() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    pub fn should_log(&self, name: &str) -> bool {
        let included = self.include_patterns.is_empty()
            || self.include_patterns.iter().any(|p| glob_match(p, name));
        included && !self.exclude_patterns.iter().any(|p| glob_match(p, name))
    }
}

/// One logged action
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    pub name: &'static str,
    /// From [`ActionSummary::summary`]
    pub summary: String,
    pub timestamp: Instant,
    /// Monotonic per log, starting at 0
    pub sequence: u64,
    /// `None` until the action has been through the reducer, and for
    /// actions whose dispatch failed
    pub state_changed: Option<bool>,
}

impl ActionLogEntry {
    pub fn new(name: &'static str, summary: String, sequence: u64) -> Self {
        Self {
            name,
            summary,
            timestamp: Instant::now(),
            sequence,
            state_changed: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }

    /// Elapsed time as `"150ms"` or `"2.3s"`
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed < Duration::from_secs(1) {
            format!("{}ms", elapsed.as_millis())
        } else {
            format!("{:.1}s", elapsed.as_secs_f64())
        }
    }
}

/// Capacity and filter of an [`ActionLog`]
#[derive(Debug, Clone)]
pub struct ActionLogConfig {
    pub capacity: usize,
    pub filter: ActionLoggerConfig,
}

impl Default for ActionLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: ActionLoggerConfig::default(),
        }
    }
}

impl ActionLogConfig {
    pub fn new(capacity: usize, filter: ActionLoggerConfig) -> Self {
        Self { capacity, filter }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

/// Ring buffer of recently dispatched actions. The oldest entry is
/// discarded once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    config: ActionLogConfig,
    next_sequence: u64,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(ActionLogConfig::default())
    }
}

impl ActionLog {
    pub fn new(config: ActionLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity.min(PREALLOCATED_ENTRIES)),
            config,
            next_sequence: 0,
        }
    }

    /// Record an action if it passes the filter.
    ///
    /// Returns the sequence number of the new entry.
    pub fn log<A: ActionSummary>(&mut self, action: &A) -> Option<u64> {
        let name = action.name();
        if self.config.capacity == 0 || !self.config.filter.should_log(name) {
            return None;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        while self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries
            .push_back(ActionLogEntry::new(name, action.summary(), sequence));
        Some(sequence)
    }

    /// Fill in `state_changed` for the entry with `sequence`, if it is
    /// still in the buffer
    pub fn set_state_changed(&mut self, sequence: u64, changed: bool) {
        if let Some(entry) = self.entries.iter_mut().rev().find(|e| e.sequence == sequence) {
            entry.state_changed = Some(changed);
        }
    }

    /// Oldest first
    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    /// The newest `count` entries, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &ActionLogConfig {
        &self.config
    }
}

/// An [`ActionLog`] shared between the middleware and its readers
pub type SharedActionLog = Arc<Mutex<ActionLog>>;

/// Middleware that logs actions through `tracing` and, optionally, into an
/// [`ActionLog`].
#[derive(Debug, Clone)]
pub struct ActionLoggerMiddleware {
    config: ActionLoggerConfig,
    log: Option<SharedActionLog>,
    active: bool,
}

impl Default for ActionLoggerMiddleware {
    fn default() -> Self {
        Self::new(ActionLoggerConfig::default())
    }
}

impl ActionLoggerMiddleware {
    /// Tracing only
    pub fn new(config: ActionLoggerConfig) -> Self {
        Self {
            config,
            log: None,
            active: true,
        }
    }

    /// Tracing plus an in-memory history using the same filter
    pub fn with_log(config: ActionLogConfig) -> Self {
        Self {
            config: config.filter.clone(),
            log: Some(Arc::new(Mutex::new(ActionLog::new(config)))),
            active: true,
        }
    }

    pub fn with_default_log() -> Self {
        Self::with_log(ActionLogConfig::default())
    }

    /// Turn the middleware into a pass-through when `false`,
    /// e.g. from a `--debug` flag
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// The history, if one was attached
    pub fn log(&self) -> Option<&SharedActionLog> {
        self.log.as_ref()
    }

    pub fn config(&self) -> &ActionLoggerConfig {
        &self.config
    }
}

impl<A, S> Middleware<A, S> for ActionLoggerMiddleware
where
    A: ActionSummary,
    S: Send + Sync + 'static,
{
    fn dispatch(&self, store: &Store<S>, next: Next<'_, A>, action: A) -> Result<A, DispatchError> {
        if !self.active {
            return next.run(action);
        }

        let name = action.name();
        if self.config.should_log(name) {
            tracing::debug!(action = %name, "action");
        }

        let Some(log) = &self.log else {
            return next.run(action);
        };
        // The lock is released before `next` so nested dispatches can log
        let logged = log.lock().log(&action);
        let Some(sequence) = logged else {
            return next.run(action);
        };

        let before = store.state();
        let result = next.run(action);
        if result.is_ok() {
            let changed = !Arc::ptr_eq(&before, &store.state());
            log.lock().set_state_changed(sequence, changed);
        }
        result
    }

    fn name(&self) -> &'static str {
        "ActionLoggerMiddleware"
    }
}

/// Glob match supporting `*` (any run, including empty) and `?` (one char).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen and the text index it is matched up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p).copied() {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::middleware::MiddlewareList;
    use crate::registry::PipelineBuilder;
    use crate::test_support::{TestAction, TestKind};

    #[test]
    fn test_glob_match() {
        assert!(glob_match("Tick", "Tick"));
        assert!(!glob_match("Tick", "TickTock"));
        assert!(glob_match("Load*", "LoadProfile"));
        assert!(glob_match("Load*", "Load"));
        assert!(!glob_match("Load*", "Reload"));
        assert!(glob_match("*Error*", "DidFetchErrorOnce"));
        assert!(glob_match("Did*Fail*", "DidNetworkFailHard"));
        assert!(glob_match("Tick?", "Ticks"));
        assert!(!glob_match("Tick?", "Tick"));
        assert!(glob_match("*", ""));
    }

    #[test]
    fn test_config_include_and_exclude() {
        let config = ActionLoggerConfig::new(Some("Did*"), Some("DidFail*"));
        assert!(config.should_log("DidConnect"));
        assert!(!config.should_log("DidFailConnect"));
        assert!(!config.should_log("Connect"));
    }

    #[test]
    fn test_config_defaults_exclude_noise() {
        let config = ActionLoggerConfig::default();
        assert!(!config.should_log("Tick"));
        assert!(!config.should_log("Render"));
        assert!(config.should_log("Increment"));
        assert_eq!(ActionLoggerConfig::new(None, None), config);
        assert!(ActionLoggerConfig::all().should_log("Tick"));
    }

    #[test]
    fn test_log_honours_capacity() {
        let mut log = ActionLog::new(ActionLogConfig::new(3, ActionLoggerConfig::all()));
        for n in 0..5 {
            log.log(&TestAction::Add(n));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.entries().next().map(|e| e.sequence), Some(2));
        let recent: Vec<_> = log.recent(2).map(|e| e.summary.as_str()).collect();
        assert_eq!(recent, vec!["Add(4)", "Add(3)"]);
    }

    #[test]
    fn test_huge_capacity_grows_on_demand() {
        let mut log = ActionLog::new(ActionLogConfig::new(usize::MAX, ActionLoggerConfig::all()));
        for n in 0..300 {
            log.log(&TestAction::Add(n));
        }
        assert_eq!(log.len(), 300);
        assert_eq!(log.config().capacity, usize::MAX);
    }

    #[test]
    fn test_log_filters_and_zero_capacity() {
        let filter = ActionLoggerConfig::new(None, Some("Noop"));
        let mut log = ActionLog::new(ActionLogConfig::new(10, filter.clone()));
        assert_eq!(log.log(&TestAction::Noop), None);
        assert_eq!(log.log(&TestAction::Increment), Some(0));

        let mut empty = ActionLog::new(ActionLogConfig::new(0, filter));
        assert_eq!(empty.log(&TestAction::Increment), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_entry_elapsed_display() {
        let entry = ActionLogEntry::new("Increment", "Increment".into(), 0);
        assert!(entry.elapsed_display().ends_with("ms"));
    }

    #[test]
    fn test_middleware_records_state_changes() {
        let logger = ActionLoggerMiddleware::with_log(ActionLogConfig::new(
            10,
            ActionLoggerConfig::new(None, Some("Blocked")),
        ));
        let history = logger.log().cloned().unwrap();

        let mut builder = PipelineBuilder::<TestAction, i32>::new();
        builder
            .reducer(TestKind::Increment, |_, n| n + 1)
            .unwrap()
            .middlewares(MiddlewareList::new().with(logger))
            .unwrap();
        let dispatcher = Dispatcher::new(Store::new(0), Arc::new(builder.build()));

        dispatcher.dispatch(TestAction::Increment).unwrap();
        dispatcher.dispatch(TestAction::Noop).unwrap();
        dispatcher.dispatch(TestAction::Blocked).unwrap();

        let log = history.lock();
        let entries: Vec<_> = log
            .entries()
            .map(|e| (e.name, e.state_changed))
            .collect();
        assert_eq!(
            entries,
            vec![("Increment", Some(true)), ("Noop", Some(false))]
        );
    }

    #[test]
    fn test_inactive_middleware_logs_nothing() {
        let logger = ActionLoggerMiddleware::with_default_log().active(false);
        let history = logger.log().cloned().unwrap();
        let dispatcher = Dispatcher::new(
            Store::new(0),
            Arc::new({
                let mut builder = PipelineBuilder::<TestAction, i32>::new();
                builder
                    .middlewares(MiddlewareList::new().with(logger))
                    .unwrap();
                builder.build()
            }),
        );

        dispatcher.dispatch(TestAction::Increment).unwrap();
        assert!(history.lock().is_empty());
    }
}
