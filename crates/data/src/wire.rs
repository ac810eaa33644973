use crate::GlobalMindMap;
use serde::{Deserialize, Serialize};

/// What one poll of the artifact endpoint tells us
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub has_artifact_flow: bool,
    pub is_ready: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<GlobalMindMap>,
}

/// Progress notification on the push channel. Advisory only: either field
/// may be missing and nothing guarantees delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl PushEvent {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            completed: false,
        }
    }

    pub fn completed() -> Self {
        Self {
            message: None,
            completed: true,
        }
    }
}

/// Body of `GET /mindmap/{thread_id}` as the backend writes it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MindMapReply {
    Error {
        error: String,
    },
    Status {
        mind_map: bool,
        #[serde(default)]
        status: bool,
        #[serde(default)]
        data: Option<GlobalMindMap>,
        #[serde(default)]
        message: String,
    },
}

impl MindMapReply {
    /// Map the backend body onto the poll contract, or return the error the
    /// backend reported
    pub fn into_response(self) -> Result<PollResponse, String> {
        match self {
            MindMapReply::Error { error } => Err(error),
            MindMapReply::Status {
                mind_map,
                status,
                data,
                message,
            } => Ok(PollResponse {
                has_artifact_flow: mind_map,
                is_ready: status,
                message,
                data,
            }),
        }
    }
}
