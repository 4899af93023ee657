//! Session configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::suggest::DEFAULT_ENDPOINT;
use crate::Result;

/// How out-of-order suggestion responses are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseOrdering {
    /// Apply only the response to the newest request.
    #[default]
    LatestRequest,
    /// Apply responses as they arrive; the last to arrive wins.
    Arrival,
}

/// Tunables for one search session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Autocomplete quiet period in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Suggestion endpoint; the encoded query is appended.
    #[serde(default = "default_endpoint")]
    pub suggest_endpoint: String,
    /// Suggestion request timeout in seconds.
    #[serde(default = "default_suggest_timeout")]
    pub suggest_timeout: u64,
    #[serde(default)]
    pub ordering: ResponseOrdering,
    /// Address parameter carrying the query.
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// Address parameter carrying the active engine name.
    #[serde(default = "default_engine_param")]
    pub engine_param: String,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_suggest_timeout() -> u64 {
    5
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_engine_param() -> String {
    "engine".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            suggest_endpoint: default_endpoint(),
            suggest_timeout: default_suggest_timeout(),
            ordering: ResponseOrdering::default(),
            query_param: default_query_param(),
            engine_param: default_engine_param(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn suggest_timeout(&self) -> Duration {
        Duration::from_secs(self.suggest_timeout)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }
}

/// Capabilities of the client hosting the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEnvironment {
    /// Touch is the primary input; no global key listener is attached and
    /// native scheme links are offered.
    pub touch_primary: bool,
}

impl ClientEnvironment {
    pub fn desktop() -> Self {
        Self { touch_primary: false }
    }

    pub fn touch() -> Self {
        Self { touch_primary: true }
    }
}
