//! Multi-module configuration cell
//!
//! Larger apps register their reducers and converters from several
//! independent modules. A [`PipelineCell`] collects those registrations and
//! builds the [`Pipeline`] the first time it is needed. From then on the
//! configuration is frozen: further `configure` calls fail with
//! [`ConfigError::ConfigurationFrozen`].

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

use parking_lot::ReentrantMutex;

use crate::action::Action;
use crate::error::ConfigError;
use crate::registry::{Module, Pipeline, PipelineBuilder};

/// Shareable, freeze-on-first-use pipeline configuration.
pub struct PipelineCell<A: Action, S> {
    // Reentrant: calls nested in a `configure` closure reach the RefCell
    builder: ReentrantMutex<RefCell<Option<PipelineBuilder<A, S>>>>,
    frozen: OnceLock<Arc<Pipeline<A, S>>>,
}

impl<A: Action, S: 'static> Default for PipelineCell<A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action, S> std::fmt::Debug for PipelineCell<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineCell")
            .field("frozen", &self.frozen.get().is_some())
            .finish()
    }
}

impl<A: Action, S: 'static> PipelineCell<A, S> {
    pub fn new() -> Self {
        Self {
            builder: ReentrantMutex::new(RefCell::new(Some(PipelineBuilder::new()))),
            frozen: OnceLock::new(),
        }
    }

    /// Add registrations. Fails once [`pipeline`](Self::pipeline) was called.
    ///
    /// # Panics
    ///
    /// If `configure` calls back into this cell (`configure`, `install`
    /// or a first `pipeline`).
    pub fn configure<F>(&self, configure: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut PipelineBuilder<A, S>) -> Result<(), ConfigError>,
    {
        let guard = self.builder.lock();
        let mut slot = borrow_builder(&*guard);
        let builder = slot.as_mut().ok_or(ConfigError::ConfigurationFrozen)?;
        configure(builder)
    }

    /// Apply a module's registrations
    pub fn install<M: Module<A, S> + ?Sized>(&self, module: &M) -> Result<(), ConfigError> {
        self.configure(|builder| module.register(builder))
    }

    /// The frozen pipeline, built on first access
    ///
    /// # Panics
    ///
    /// On first access from inside a [`configure`](Self::configure) closure.
    pub fn pipeline(&self) -> Arc<Pipeline<A, S>> {
        if let Some(pipeline) = self.frozen.get() {
            return Arc::clone(pipeline);
        }
        let guard = self.builder.lock();
        let pipeline = self.frozen.get_or_init(|| {
            let builder = borrow_builder(&*guard).take().unwrap_or_default();
            tracing::debug!("Pipeline configuration frozen");
            Arc::new(builder.build())
        });
        Arc::clone(pipeline)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get().is_some()
    }
}

fn borrow_builder<T>(slot: &RefCell<T>) -> std::cell::RefMut<'_, T> {
    match slot.try_borrow_mut() {
        Ok(builder) => builder,
        Err(_) => panic!("PipelineCell used from inside its own configure closure"),
    }
}
