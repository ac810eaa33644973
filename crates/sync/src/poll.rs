use async_trait::async_trait;
use mindmap_data::{MindMapReply, PollResponse};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server reported an error: {0}")]
    Server(String),

    #[error("no answer after {0:?}")]
    Timeout(std::time::Duration),
}

/// One request to the authoritative artifact state
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    async fn poll(&self) -> Result<PollResponse, PollError>;
}

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

/// Polls `GET {base}/mindmap/{thread_id}`
#[derive(Debug, Clone)]
pub struct HttpPollSource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpPollSource {
    pub fn new(base_url: &str, thread_id: &str) -> Result<Self, PollError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: mindmap_url(base_url, thread_id),
            token: None,
        })
    }

    /// Send `token` as a bearer token with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn mindmap_url(base_url: &str, thread_id: &str) -> String {
    format!("{}/mindmap/{thread_id}", base_url.trim_end_matches('/'))
}

#[async_trait]
impl PollSource for HttpPollSource {
    async fn poll(&self) -> Result<PollResponse, PollError> {
        debug!("GET {}", self.url);
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status));
        }

        let body = response.bytes().await?;
        let reply: MindMapReply = serde_json::from_slice(&body)?;
        reply.into_response().map_err(PollError::Server)
    }
}
