use anyhow::{bail, Context, Result};
use mindmap_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tree_layout::LayoutConfig;

/// Settings read from a RON file. Everything is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub layout: LayoutConfig,
    pub poll_interval_secs: f32,
    pub max_backoff_secs: f32,
    pub poll_timeout_secs: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            layout: LayoutConfig::default(),
            poll_interval_secs: sync.poll_interval.as_secs_f32(),
            max_backoff_secs: sync.max_backoff.as_secs_f32(),
            poll_timeout_secs: sync.poll_timeout.as_secs_f32(),
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn sync(&self) -> Result<SyncConfig> {
        Ok(SyncConfig {
            poll_interval: positive_secs("poll interval", self.poll_interval_secs)?,
            max_backoff: positive_secs("max backoff", self.max_backoff_secs)?,
            poll_timeout: positive_secs("poll timeout", self.poll_timeout_secs)?,
        })
    }
}

/// A zero interval would poll back to back
pub fn positive_secs(what: &str, secs: f32) -> Result<Duration> {
    let duration = Duration::try_from_secs_f32(secs).with_context(|| format!("invalid {what}"))?;
    if duration.is_zero() {
        bail!("{what} must be greater than zero");
    }
    Ok(duration)
}
