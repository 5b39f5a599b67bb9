//! Client configuration.
//!
//! Provides the remote endpoint settings and the knobs that control how
//! writes reach the remote store and how reconciliation behaves.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Remote record store endpoint.
///
/// The token is a per-user credential; it is read from the environment and
/// never written back into a config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
}

impl RemoteConfig {
    /// Build from raw values, dropping blanks.
    pub fn new(base_url: Option<String>, auth_token: Option<String>) -> Self {
        Self {
            base_url: normalize_text_option(base_url).map(|url| url.trim_end_matches('/').to_string()),
            auth_token: normalize_text_option(auth_token),
        }
    }

    /// Whether both an http(s) URL and a token are present.
    pub fn is_configured(&self) -> bool {
        self.auth_token.is_some() && self.base_url.as_deref().is_some_and(is_http_url)
    }
}

/// How service-layer writes reach the remote store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePropagation {
    /// Writes stay local until the next sync pushes them
    #[default]
    LocalOnly,
    /// Each local write is followed by a remote write
    WriteThrough,
}

/// What happens to local words when their deck loses to a newer remote copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanWordPolicy {
    /// The deck is replaced as a whole and its local words go with it
    #[default]
    Discard,
    /// Local words are carried over to the re-materialized deck
    Preserve,
}

/// Reconciliation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    pub push_local_changes: bool,
    pub purge_tombstones: bool,
    pub orphan_words: OrphanWordPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            push_local_changes: true,
            purge_tombstones: true,
            orphan_words: OrphanWordPolicy::default(),
        }
    }
}

impl SyncSettings {
    /// Merge-only settings: nothing is written to the remote store.
    pub const fn pull_only() -> Self {
        Self {
            push_local_changes: false,
            purge_tombstones: false,
            orphan_words: OrphanWordPolicy::Discard,
        }
    }
}

/// Full client configuration as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct VocaConfig {
    pub remote: RemoteConfig,
    pub propagation: RemotePropagation,
    pub sync: SyncSettings,
}

/// Parse a client configuration from a raw JSON payload.
pub fn parse_config(payload: &str) -> Result<VocaConfig> {
    let mut config: VocaConfig = serde_json::from_str(payload)?;
    config.remote = RemoteConfig::new(config.remote.base_url, config.remote.auth_token);

    if let Some(url) = config.remote.base_url.as_deref() {
        if !is_http_url(url) {
            return Err(Error::InvalidInput(
                "remote.base_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(config)
}
