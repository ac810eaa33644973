use crate::{merge, PollError, PollSource, SyncMessage, SyncState};
use mindmap_data::{PollResponse, PushEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Delay between the end of a poll and the start of the next one
    pub poll_interval: Duration,
    /// Longest delay between two polls while the backend keeps failing
    pub max_backoff: Duration,
    /// A poll still unanswered after this long counts as failed
    pub poll_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_backoff: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncConfig {
    /// Delay before the next poll after `failures` consecutive failed polls
    pub fn next_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.poll_interval;
        }
        let factor = 1u32 << failures.min(16);
        self.poll_interval
            .saturating_mul(factor)
            .min(self.max_backoff)
            .max(self.poll_interval)
    }
}

/// Keeps one [`SyncState`] up to date from a poll source and an optional
/// push channel.
///
/// Polls never overlap: the next one is scheduled once the previous one
/// settled. Closing is cooperative, a poll already in flight is left to
/// finish and its response is thrown away.
pub struct SyncCoordinator {
    state: watch::Receiver<SyncState>,
    active: Arc<AtomicBool>,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SyncCoordinator {
    /// Start polling right away. Must be called from within a tokio runtime.
    pub fn spawn<P>(
        poller: P,
        push: Option<mpsc::Receiver<PushEvent>>,
        config: SyncConfig,
    ) -> Self
    where
        P: PollSource,
    {
        let (state_tx, state) = watch::channel(SyncState::default());
        let (stop_tx, stop_rx) = watch::channel(false);
        // Going through a channel so that poll tasks never touch the state
        let (results_tx, results_rx) = mpsc::channel(1);
        let active = Arc::new(AtomicBool::new(true));

        let driver = Driver {
            poller: Arc::new(poller),
            push,
            config,
            active: active.clone(),
            state: SyncState::default(),
            state_tx,
            results_tx,
        };
        let task = tokio::spawn(driver.run(stop_rx, results_rx));

        Self {
            state,
            active,
            stop_tx,
            task: Some(task),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop polling and detach the push channel. Safe to call any number of
    /// times, and after the coordinator stopped on its own.
    pub fn close(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("Closing sync coordinator");
            let _ = self.stop_tx.send(true);
        }
    }

    /// Wait until the coordinator has torn itself down
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Sync coordinator task failed: {e}");
            }
        }
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        self.close();
    }
}

type PollResult = Result<PollResponse, PollError>;

struct Driver<P> {
    poller: Arc<P>,
    push: Option<mpsc::Receiver<PushEvent>>,
    config: SyncConfig,
    active: Arc<AtomicBool>,
    state: SyncState,
    state_tx: watch::Sender<SyncState>,
    results_tx: mpsc::Sender<PollResult>,
}

impl<P: PollSource> Driver<P> {
    async fn run(
        mut self,
        mut stop_rx: watch::Receiver<bool>,
        mut results_rx: mpsc::Receiver<PollResult>,
    ) {
        info!("Sync coordinator started");

        let mut failures = 0u32;
        let mut in_flight = false;
        let mut scheduled = true;
        let next_poll = sleep_until(Instant::now());
        tokio::pin!(next_poll);

        loop {
            let message = tokio::select! {
                biased;

                // Also fires when the coordinator handle is dropped
                _ = stop_rx.changed() => SyncMessage::Close,

                event = next_push(&mut self.push), if self.push.is_some() => match event {
                    Some(event) => SyncMessage::FromPush(event),
                    None => {
                        warn!("Push channel lost, continuing with polling only");
                        self.push = None;
                        continue;
                    }
                },

                Some(result) = results_rx.recv() => {
                    in_flight = false;
                    failures = match result {
                        Ok(_) => 0,
                        Err(_) => failures.saturating_add(1),
                    };
                    let delay = self.config.next_delay(failures);
                    next_poll.as_mut().reset(Instant::now() + delay);
                    scheduled = true;

                    match result {
                        Ok(response) => SyncMessage::FromPoll(response),
                        Err(e) => {
                            warn!("Poll failed ({failures} in a row), retrying in {delay:?}: {e}");
                            continue;
                        }
                    }
                },

                _ = &mut next_poll, if scheduled && !in_flight => {
                    scheduled = false;
                    in_flight = true;
                    self.issue_poll();
                    continue;
                }
            };

            if !self.apply(message) {
                break;
            }
        }

        self.teardown();
    }

    fn issue_poll(&self) {
        debug!("Polling artifact state");
        let poller = self.poller.clone();
        let active = self.active.clone();
        let results_tx = self.results_tx.clone();
        let deadline = self.config.poll_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(deadline, poller.poll()).await {
                Ok(result) => result,
                Err(_) => Err(PollError::Timeout(deadline)),
            };
            if !active.load(Ordering::SeqCst) {
                debug!("Coordinator closed, discarding late poll response");
                return;
            }
            // The driver may be gone by now, nothing to do then
            let _ = results_tx.send(result).await;
        });
    }

    /// Merge a message, publish the new state, return whether to keep going
    fn apply(&mut self, message: SyncMessage) -> bool {
        let message = if self.active.load(Ordering::SeqCst) || message == SyncMessage::Close {
            message
        } else {
            debug!("Coordinator closed, discarding late update");
            SyncMessage::Close
        };

        let transition = merge(&self.state, message);
        if transition.data_changed {
            debug!(
                "Map changed, revision {}",
                transition.state.data_revision
            );
        }
        if transition.state != self.state {
            self.state = transition.state;
            self.state_tx.send_replace(self.state.clone());
        }

        !transition.stop
    }

    fn teardown(mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.push = None;
        info!("Sync coordinator stopped ({:?})", self.state.phase);
    }
}

async fn next_push(push: &mut Option<mpsc::Receiver<PushEvent>>) -> Option<PushEvent> {
    match push {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
