//! Async action loop
//!
//! `dispatch` itself is synchronous. Work that completes later (timers,
//! network calls spawned from a middleware) reports back by sending a
//! follow-up action through an [`ActionSender`]. The [`ActionLoop`] owns
//! the receiving end and dispatches queued actions one at a time, in the
//! order they were sent.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

/// Cloneable handle for queueing actions on an [`ActionLoop`]
#[derive(Debug)]
pub struct ActionSender<A> {
    tx: mpsc::UnboundedSender<A>,
}

impl<A> Clone for ActionSender<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A: Action> ActionSender<A> {
    /// Queue an action. Fails once the loop has stopped.
    pub fn send(&self, action: A) -> Result<(), DispatchError> {
        self.tx.send(action).map_err(|_| DispatchError::ChannelClosed)
    }

    /// Whether the loop has stopped receiving
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Queue of actions waiting to be dispatched.
///
/// Senders can be handed out before the [`Dispatcher`] exists, so a
/// middleware registered on the pipeline may hold one.
///
/// # Example
/// ```ignore
/// let action_loop = ActionLoop::new();
/// let sender = action_loop.sender();
/// builder.middlewares(MiddlewareList::new().with(typed(AppActionKind::Fetch, move |_, next, action| {
///     let sender = sender.clone();
///     tokio::spawn(async move {
///         let _ = sender.send(AppAction::DidFetch(load().await));
///     });
///     next.run(action)
/// })))?;
///
/// let dispatcher = Dispatcher::new(store, Arc::new(builder.build()));
/// action_loop.run(dispatcher.clone(), cancel.clone()).await?;
/// ```
pub struct ActionLoop<A> {
    action_tx: mpsc::UnboundedSender<A>,
    action_rx: mpsc::UnboundedReceiver<A>,
}

impl<A: Action> Default for ActionLoop<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> ActionLoop<A> {
    pub fn new() -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            action_tx,
            action_rx,
        }
    }

    /// A new sender for this loop
    pub fn sender(&self) -> ActionSender<A> {
        ActionSender {
            tx: self.action_tx.clone(),
        }
    }

    /// Dispatch queued actions until every sender is dropped or `cancel`
    /// fires. The first dispatch error stops the loop and is returned.
    ///
    /// Actions still queued when the loop stops are discarded.
    pub async fn run<S>(
        self,
        dispatcher: Dispatcher<A, S>,
        cancel: CancellationToken,
    ) -> Result<(), DispatchError>
    where
        S: Clone + Send + Sync + 'static,
    {
        let Self {
            action_tx,
            mut action_rx,
        } = self;
        // The loop must not keep its own channel alive
        drop(action_tx);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!("Action loop cancelled");
                    break;
                }

                action = action_rx.recv() => match action {
                    Some(action) => {
                        let name = action.name();
                        if let Err(error) = dispatcher.dispatch(action) {
                            tracing::warn!(
                                action = %name,
                                %error,
                                "Action loop stopped on dispatch error"
                            );
                            return Err(error);
                        }
                    }
                    None => {
                        tracing::debug!("Action channel closed");
                        break;
                    }
                },
            }
        }
        Ok(())
    }
}
