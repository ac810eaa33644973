use mindmap_data::{GlobalMindMap, PayloadHash, PollResponse, PushEvent};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Default)]
pub enum SyncPhase {
    #[default]
    NotStarted,
    /// The backend is generating the map
    InProgress,
    /// A map has been received, it may still get more descriptions
    Ready,
    /// The thread has no map and won't get one. Terminal.
    NoFlow,
    /// Closed by the view or by a completion signal. Terminal.
    Stopped,
}

impl SyncPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncPhase::NoFlow | SyncPhase::Stopped)
    }
}

/// Merged view of the remote artifact
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SyncState {
    pub phase: SyncPhase,
    pub has_artifact_flow: bool,
    pub is_ready: bool,
    pub message: String,
    #[serde(skip)]
    pub data: Option<Arc<GlobalMindMap>>,
    pub is_complete: bool,
    /// Bumped every time `data` changes content
    pub data_revision: u64,
    #[serde(skip)]
    data_hash: Option<PayloadHash>,
    #[serde(skip)]
    push_message_seen: bool,
}

/// Everything that can change the state, tagged by where it came from
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    FromPush(PushEvent),
    FromPoll(PollResponse),
    Close,
}

/// Result of merging one message
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SyncState,
    /// The map content changed, the layout has to be recomputed
    pub data_changed: bool,
    /// No more polls should be issued
    pub stop: bool,
}

/// Merge a message into the state.
///
/// The two channels own disjoint parts of the state:
/// - polls own `has_artifact_flow`, `is_ready` and `data`
/// - push events own the progress `message` and completion
///
/// A poll message is only shown until the first push message arrives.
/// Once stopped, the state no longer changes.
pub fn merge(state: &SyncState, message: SyncMessage) -> Transition {
    let mut next = state.clone();
    let mut data_changed = false;
    let mut stop = false;

    if state.phase == SyncPhase::Stopped {
        return Transition {
            state: next,
            data_changed,
            stop,
        };
    }

    match message {
        SyncMessage::FromPush(event) => {
            if let Some(text) = event.message {
                next.message = text;
                next.push_message_seen = true;
            }
            if event.completed {
                // Whatever data we have is final, no extra poll is made
                next.is_complete = true;
                next.phase = SyncPhase::Stopped;
                stop = true;
            }
        }
        SyncMessage::FromPoll(response) => {
            if !next.push_message_seen && !response.message.is_empty() {
                next.message = response.message;
            }
            next.has_artifact_flow = response.has_artifact_flow;

            if !response.has_artifact_flow {
                next.is_ready = false;
                next.phase = SyncPhase::NoFlow;
                data_changed = next.data.take().is_some();
                next.data_hash = None;
                stop = true;
            } else {
                match response.data.filter(|_| response.is_ready) {
                    Some(data) => {
                        let hash = PayloadHash::new(&data);
                        if next.data_hash != Some(hash) {
                            next.data = Some(Arc::new(data));
                            next.data_hash = Some(hash);
                            data_changed = true;
                        }
                        next.is_ready = true;
                        next.phase = SyncPhase::Ready;
                    }
                    None => {
                        // Keep the last map around, the backend may be
                        // rewriting it
                        next.is_ready = false;
                        next.phase = SyncPhase::InProgress;
                    }
                }
            }
        }
        SyncMessage::Close => {
            next.phase = SyncPhase::Stopped;
            stop = true;
        }
    }

    if data_changed {
        next.data_revision += 1;
    }

    Transition {
        state: next,
        data_changed,
        stop,
    }
}
