// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Mount configuration
//!
//! `FsConfig` is the typed environment passed when a filesystem is mounted.
//! It deserializes from YAML so connectors can keep it next to their own
//! settings.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default attribute cache time-to-live
pub const DEFAULT_CACHE_TTL_MS: u64 = 60_000;

fn default_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FsConfig {
    /// Attribute cache TTL in milliseconds; 0 disables caching
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Working directory for relative paths; the backend default when absent
    #[serde(default)]
    pub working_directory: Option<String>,

    #[serde(default)]
    pub read_only: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            working_directory: None,
            read_only: false,
        }
    }
}

impl FsConfig {
    /// Configuration with attribute caching disabled
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            cache_ttl_ms: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    pub fn from_yaml_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_yaml_ng::from_slice(bytes)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

/// Registry key for the filesystem addressed by `uri`: scheme plus authority.
///
/// The user name is part of the key, so `sftp://alice@host` and
/// `sftp://bob@host` mount separately. Passwords never are.
#[must_use]
pub fn mount_key(uri: &Url) -> String {
    let mut key = format!("{}://", uri.scheme());
    if !uri.username().is_empty() {
        key.push_str(uri.username());
        key.push('@');
    }
    if let Some(host) = uri.host_str() {
        key.push_str(host);
    }
    if let Some(port) = uri.port() {
        key.push_str(&format!(":{port}"));
    }
    key
}
