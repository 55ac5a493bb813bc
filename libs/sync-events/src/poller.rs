use std::time::Duration;

use entity::prelude::*;
use tokio::{
    sync::mpsc::{self, error::TrySendError, Receiver, Sender},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    client::Client,
    container::{Block, Container},
    render::{describe, Zone},
    response::IntoResponse,
    SyncEventsError,
};

pub const EVENTS_PATH: &str = "events";

/// tokio's interval panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered { blocks: usize, skipped: usize },
    /// Fetch, parse or container write failed; the previous render stands.
    Failed,
}

pub struct Poller<C> {
    client: Client,
    zone: Zone,
    container: C,
}

impl<C: Container> Poller<C> {
    pub fn new(client: Client, zone: Zone, container: C) -> Self {
        Self {
            client,
            zone,
            container,
        }
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    /// One fetch-parse-render cycle. Failures are logged, never returned.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        match self.try_refresh().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    task = "refresh events",
                    base_url = self.client.base_url(),
                    err = e.to_string(),
                );
                RefreshOutcome::Failed
            }
        }
    }

    async fn try_refresh(&mut self) -> Result<RefreshOutcome, SyncEventsError> {
        let text = self.client.get(EVENTS_PATH).await?;

        // a body that isn't an array fails the cycle; a bad element only
        // skips itself
        let elements = serde_json::from_str::<Vec<serde_json::Value>>(&text)
            .into_response("failed to parse events")?;

        let mut blocks = Vec::with_capacity(elements.len());
        let mut skipped = 0;
        for element in elements {
            let event = match serde_json::from_value::<EventEntity>(element) {
                Ok(event) => event,
                Err(e) => {
                    skipped += 1;
                    warn!(task = "parse event", err = e.to_string());
                    continue;
                }
            };

            match describe(&event, self.zone) {
                Ok(text) => blocks.push(Block::new(text)),
                Err(reason) => {
                    skipped += 1;
                    warn!(
                        task = "render event",
                        author = event.author,
                        reason = reason.to_string(),
                    );
                }
            }
        }

        self.container.replace(&blocks)?;
        debug!(
            task = "refresh events",
            container = self.container.id(),
            rendered = blocks.len(),
            skipped,
        );

        Ok(RefreshOutcome::Rendered {
            blocks: blocks.len(),
            skipped,
        })
    }
}

/// Cancellable handle over a running poller task.
pub struct PollerHandle {
    cancel: CancellationToken,
    trigger: Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Asks for an extra cycle. Returns `false` once the task has stopped.
    pub fn refresh_now(&self) -> bool {
        match self.trigger.try_send(()) {
            // one is already queued
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels the schedule, abandoning an in-flight cycle, and waits for
    /// the task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(task = "stop event polling", err = e.to_string());
        }
    }
}

/// Runs a cycle immediately, then every `period`. Cycles never overlap: a
/// slow one delays the next tick instead of racing it.
pub fn spawn<C>(poller: Poller<C>, period: Duration) -> PollerHandle
where
    C: Container + Send + 'static,
{
    let cancel = CancellationToken::new();
    let (trigger, rx) = mpsc::channel(1);

    let task = tokio::spawn(run(poller, period.max(MIN_PERIOD), cancel.clone(), rx));

    PollerHandle {
        cancel,
        trigger,
        task,
    }
}

async fn run<C: Container>(
    mut poller: Poller<C>,
    period: Duration,
    cancel: CancellationToken,
    mut rx: Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
            Some(()) = rx.recv() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = poller.refresh() => {}
        }
    }

    info!(task = "stop event polling", container = poller.container().id());
}
