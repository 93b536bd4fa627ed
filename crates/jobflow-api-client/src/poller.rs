//! Execution status polling.
//!
//! [`ExecutionPoller::start`] spawns a task that fetches an execution right
//! away and then on a fixed interval, until the status is terminal, a fetch
//! fails, or the [`PollHandle`] is stopped or dropped. Every successful fetch
//! replaces the snapshot published on the handle's watch channel; discrete
//! [`PollEvent`]s report progress, completion (once) and failure (once).
//!
//! Pollers are independent: two handles for the same execution issue their
//! own requests.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use jobflow_core::find_api_error;
use jobflow_core::models::Execution;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ApiClient;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Shortest accepted interval; tokio timers reject a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

const FETCH_FAILED_MESSAGE: &str = "Failed to fetch execution status";

/// Where the poller reads execution state from.
#[async_trait]
pub trait ExecutionSource: Send + Sync + 'static {
    async fn fetch_execution(&self, id: i64) -> Result<Execution>;

    async fn cancel_execution(&self, id: i64) -> Result<()>;
}

#[async_trait]
impl ExecutionSource for ApiClient {
    async fn fetch_execution(&self, id: i64) -> Result<Execution> {
        self.get_execution(id).await
    }

    async fn cancel_execution(&self, id: i64) -> Result<()> {
        ApiClient::cancel_execution(self, id).await
    }
}

/// Latest view of a polled execution.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub execution: Option<Execution>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Non-terminal snapshot
    Snapshot(Execution),
    /// Terminal snapshot; polling has stopped
    Completed(Execution),
    /// Fetch failed; polling has stopped
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(Execution),
    Failed(String),
    /// Stopped by the caller before a terminal status was seen
    Stopped,
    /// Execution id was 0; nothing was polled
    Inert,
}

pub struct ExecutionPoller<S: ExecutionSource> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: ExecutionSource> ExecutionPoller<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Poll period, clamped to [`MIN_POLL_INTERVAL`].
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Start polling `execution_id`. Id 0 yields an inert handle that never
    /// fetches. Must be called inside a Tokio runtime.
    pub fn start(&self, execution_id: i64) -> PollHandle<S> {
        let (state_tx, state_rx) = watch::channel(PollState::default());
        let state_tx = Arc::new(state_tx);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = if execution_id == 0 {
            None
        } else {
            Some(tokio::spawn(run_poll_loop(
                Arc::clone(&self.source),
                execution_id,
                self.interval,
                Arc::clone(&state_tx),
                events_tx,
                cancel.clone(),
            )))
        };

        PollHandle {
            execution_id,
            source: Arc::clone(&self.source),
            state_tx,
            state_rx,
            events: events_rx,
            cancel,
            task,
        }
    }
}

/// Running poll session. Dropping the handle stops the task.
pub struct PollHandle<S: ExecutionSource> {
    execution_id: i64,
    source: Arc<S>,
    state_tx: Arc<watch::Sender<PollState>>,
    state_rx: watch::Receiver<PollState>,
    events: mpsc::UnboundedReceiver<PollEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<PollOutcome>>,
}

impl<S: ExecutionSource> PollHandle<S> {
    pub fn execution_id(&self) -> i64 {
        self.execution_id
    }

    pub fn state(&self) -> PollState {
        self.state_rx.borrow().clone()
    }

    /// Receiver that sees every snapshot replacement.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state_rx.clone()
    }

    /// Next event, or `None` once polling has ended or the handle was stopped.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    /// Stop polling. No further events are delivered.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Ask the backend to cancel the execution, then fetch once to reconcile
    /// the snapshot. Failures are recorded in the state and returned.
    pub async fn cancel_execution(&self) -> Result<()> {
        if self.execution_id == 0 {
            return Ok(());
        }

        let result = async {
            self.source.cancel_execution(self.execution_id).await?;
            self.source.fetch_execution(self.execution_id).await
        }
        .await;

        match result {
            Ok(execution) => {
                info!(execution_id = self.execution_id, status = %execution.status, "Execution cancel requested");
                self.state_tx.send_modify(|state| {
                    state.execution = Some(execution);
                    state.error = None;
                });
                Ok(())
            }
            Err(e) => {
                let message = error_message(&e, "Failed to cancel execution");
                self.state_tx
                    .send_modify(|state| state.error = Some(message.clone()));
                Err(e)
            }
        }
    }

    /// Wait for polling to end.
    pub async fn wait(mut self) -> PollOutcome {
        let Some(task) = self.task.take() else {
            return PollOutcome::Inert;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => PollOutcome::Stopped,
            Err(e) => PollOutcome::Failed(format!("Polling task failed: {}", e)),
        }
    }
}

impl<S: ExecutionSource> Drop for PollHandle<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_poll_loop<S: ExecutionSource>(
    source: Arc<S>,
    execution_id: i64,
    period: Duration,
    state_tx: Arc<watch::Sender<PollState>>,
    events_tx: mpsc::UnboundedSender<PollEvent>,
    cancel: CancellationToken,
) -> PollOutcome {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return stopped(&state_tx, execution_id),
            _ = ticker.tick() => {}
        }

        state_tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return stopped(&state_tx, execution_id),
            fetched = source.fetch_execution(execution_id) => fetched,
        };

        if cancel.is_cancelled() {
            return stopped(&state_tx, execution_id);
        }

        match fetched {
            Ok(execution) => {
                let terminal = execution.status.is_terminal();
                state_tx.send_modify(|state| {
                    state.execution = Some(execution.clone());
                    state.loading = false;
                });

                if terminal {
                    info!(execution_id, status = %execution.status, "Execution finished");
                    let _ = events_tx.send(PollEvent::Completed(execution.clone()));
                    return PollOutcome::Completed(execution);
                }

                debug!(execution_id, status = %execution.status, "Execution still in progress");
                let _ = events_tx.send(PollEvent::Snapshot(execution));
            }
            Err(e) => {
                let message = error_message(&e, FETCH_FAILED_MESSAGE);
                warn!(execution_id, error = %e, "Polling stopped after fetch failure");
                state_tx.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message.clone());
                });
                let _ = events_tx.send(PollEvent::Failed(message.clone()));
                return PollOutcome::Failed(message);
            }
        }
    }
}

fn stopped(state_tx: &watch::Sender<PollState>, execution_id: i64) -> PollOutcome {
    debug!(execution_id, "Polling stopped");
    state_tx.send_modify(|state| state.loading = false);
    PollOutcome::Stopped
}

fn error_message(err: &anyhow::Error, fallback: &str) -> String {
    match find_api_error(err) {
        Some(api_error) => api_error.client_message(),
        None => {
            let message = err.to_string();
            if message.is_empty() {
                fallback.to_string()
            } else {
                message
            }
        }
    }
}
