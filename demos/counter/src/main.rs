//! Counter demo for redux-pipeline
//!
//! Wires converters, middleware, reducers and the async action loop
//! together, then prints the action history.
//!
//! ```text
//! RUST_LOG=redux_pipeline_core=debug cargo run -p counter -- --ticks 3
//! ```

use std::error::Error;
use std::time::Duration;

use clap::Parser;
use redux_pipeline::prelude::*;
use redux_pipeline::LogSettings;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Counter - redux-pipeline example
#[derive(Parser, Debug)]
#[command(name = "counter")]
#[command(about = "A counter demonstrating redux-pipeline dispatch")]
struct Args {
    /// Dispatcher config as JSON (overrides the log flags)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Comma-separated globs of actions to log
    #[arg(long)]
    log_include: Option<String>,

    /// Comma-separated globs of actions not to log
    #[arg(long)]
    log_exclude: Option<String>,

    /// Number of timer ticks to dispatch from a background task
    #[arg(long, short, default_value = "5")]
    ticks: u32,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "50")]
    interval_ms: u64,
}

#[derive(Action, Clone, Debug, PartialEq)]
enum CounterAction {
    Increment,
    Decrement,
    Add(i64),
    /// Rewritten into two increments
    Bump,
    /// Rewritten into `Add(-count)` by the reset middleware
    Reset,
    Tick,
}

#[derive(Clone, Debug, Default)]
struct CounterState {
    count: i64,
    ticks: u32,
}

fn counter_module(
    builder: &mut PipelineBuilder<CounterAction, CounterState>,
) -> Result<(), ConfigError> {
    builder
        .reducer(CounterActionKind::Increment, |_, state| CounterState {
            count: state.count + 1,
            ..state
        })?
        .reducer(CounterActionKind::Decrement, |_, state| CounterState {
            count: state.count - 1,
            ..state
        })?
        .reducer(CounterActionKind::Add, |action, state| match action {
            CounterAction::Add(delta) => CounterState {
                count: state.count + delta,
                ..state
            },
            _ => state,
        })?
        .reducer(CounterActionKind::Tick, |_, state| CounterState {
            ticks: state.ticks + 1,
            ..state
        })?
        // Bump -> [Increment, Increment]
        .converter(CounterActionKind::Bump, true, |_| Some(CounterAction::Increment))?
        .filtered_converter(
            CounterActionKind::Bump,
            true,
            |_| Some(CounterAction::Increment),
            |_| true,
        )
        // Every tick also counts
        .converter(CounterActionKind::Tick, false, |_| Some(CounterAction::Increment))?;
    Ok(())
}

fn middlewares() -> MiddlewareList<CounterAction, CounterState> {
    // Never go below zero
    let floor = typed(
        CounterActionKind::Decrement,
        |store: &Store<CounterState>, next: Next<'_, CounterAction>, action: CounterAction| {
            if store.state().count <= 0 {
                tracing::info!("Decrement ignored at zero");
                return Ok(action);
            }
            next.run(action)
        },
    );
    // Reset needs the current count, which converters cannot see
    let reset = typed(
        CounterActionKind::Reset,
        |store: &Store<CounterState>, next: Next<'_, CounterAction>, _: CounterAction| {
            next.run(CounterAction::Add(-store.state().count))
        },
    );

    MiddlewareList::new()
        .with(LoggingMiddleware::new())
        .with(floor)
        .with(reset)
}

fn load_config(args: &Args) -> Result<PipelineConfig, Box<dyn Error>> {
    if let Some(path) = &args.config {
        let json = std::fs::read_to_string(path)?;
        return Ok(PipelineConfig::from_json(&json)?);
    }
    Ok(PipelineConfig {
        log: Some(LogSettings {
            include: args.log_include.clone(),
            exclude: args.log_exclude.clone(),
            ..LogSettings::default()
        }),
        ..PipelineConfig::default()
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("counter=info".parse()?))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let cell = PipelineCell::<CounterAction, CounterState>::new();
    cell.install(&counter_module)?;
    cell.configure(|builder| {
        builder.middlewares(middlewares())?;
        Ok(())
    })?;

    let mut options = config.dispatcher_options::<CounterAction, CounterState>();
    let history = match config.logger_middleware() {
        Some(logger) => {
            let history = logger.log().cloned();
            options = options.extra_middleware(logger);
            history
        }
        None => None,
    };
    let dispatcher = Dispatcher::with_options(Store::default(), cell.pipeline(), options);

    for action in [
        CounterAction::Decrement,
        CounterAction::Increment,
        CounterAction::Bump,
        CounterAction::Add(10),
        CounterAction::Decrement,
    ] {
        dispatcher.dispatch(action)?;
    }
    tracing::info!(count = dispatcher.state().count, "Synchronous actions done");

    // Background ticks arrive through the action loop
    let action_loop = ActionLoop::new();
    let sender = action_loop.sender();
    let (ticks, interval) = (args.ticks, Duration::from_millis(args.interval_ms));
    tokio::spawn(async move {
        for _ in 0..ticks {
            tokio::time::sleep(interval).await;
            if sender.send(CounterAction::Tick).is_err() {
                break;
            }
        }
    });

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }
    action_loop.run(dispatcher.clone(), cancel).await?;

    let state = dispatcher.state();
    tracing::info!(count = state.count, ticks = state.ticks, "Ticks done");

    dispatcher.dispatch(CounterAction::Reset)?;
    println!("count after reset: {}", dispatcher.state().count);

    if let Some(history) = history {
        println!("action history (newest first):");
        for entry in history.lock().recent(20) {
            let changed = match entry.state_changed {
                Some(true) => "changed",
                Some(false) => "unchanged",
                None => "-",
            };
            println!(
                "  #{:<3} {:>8} {:<10} {}",
                entry.sequence,
                entry.elapsed_display(),
                changed,
                entry.summary
            );
        }
    }

    Ok(())
}
