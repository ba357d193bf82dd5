//! Async follow-up actions through the action loop

use std::sync::Arc;
use std::time::Duration;

use redux_pipeline::prelude::*;
use tokio_util::sync::CancellationToken;

#[derive(Action, Clone, Debug, PartialEq)]
enum FetchAction {
    Fetch(u32),
    DidFetch(u32),
    DidFail,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct FetchState {
    loading: bool,
    value: Option<u32>,
}

fn dispatcher(sender: ActionSender<FetchAction>) -> Dispatcher<FetchAction, FetchState> {
    let mut builder = PipelineBuilder::<FetchAction, FetchState>::new();
    builder
        .reducer(FetchActionKind::Fetch, |_, state| FetchState {
            loading: true,
            ..state
        })
        .unwrap()
        .reducer(FetchActionKind::DidFetch, |action, state| match action {
            FetchAction::DidFetch(value) => FetchState {
                loading: false,
                value: Some(*value),
            },
            _ => state,
        })
        .unwrap()
        .try_reducer(FetchActionKind::DidFail, |_, _| {
            Err::<FetchState, _>("upstream unavailable")
        })
        .unwrap()
        .middlewares(MiddlewareList::new().with(typed(
            FetchActionKind::Fetch,
            move |_: &Store<FetchState>, next: Next<'_, FetchAction>, action: FetchAction| {
                if let FetchAction::Fetch(id) = action {
                    let sender = sender.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        let _ = sender.send(FetchAction::DidFetch(id * 2));
                    });
                }
                next.run(action)
            },
        )))
        .unwrap();
    Dispatcher::new(Store::default(), Arc::new(builder.build()))
}

#[tokio::test]
async fn test_async_result_is_dispatched() {
    let action_loop = ActionLoop::new();
    let dispatcher = dispatcher(action_loop.sender());
    let mut updates = dispatcher.subscribe();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(action_loop.run(dispatcher.clone(), cancel.clone()));
    dispatcher.dispatch(FetchAction::Fetch(21)).unwrap();
    assert!(dispatcher.state().loading);

    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            updates.changed().await.unwrap();
            if updates.borrow_and_update().value.is_some() {
                break;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(
        *dispatcher.state(),
        FetchState {
            loading: false,
            value: Some(42)
        }
    );
    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_loop_surfaces_reducer_error() {
    let action_loop = ActionLoop::new();
    let sender = action_loop.sender();
    let dispatcher = dispatcher(sender.clone());

    sender.send(FetchAction::DidFail).unwrap();
    let err = action_loop
        .run(dispatcher.clone(), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Reducer { action: "DidFail", .. }));
    assert_eq!(*dispatcher.state(), FetchState::default());
}
