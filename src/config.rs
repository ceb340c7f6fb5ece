//! Settings snapshot and the read-only store collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use log::debug;

/// Named, user-defined endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile
{   /// Profile name; lookups take the first match on duplicates
    pub name: String
  , /// Endpoint URL
    pub url: String
  , /// Bearer token attached when non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>
  , /// Default instruction text merged into the request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_preamble: Option<String>
  , /// Default sampling temperature in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_temperature: Option<f32>
}

/// One point-in-time read of the durable settings store.
/// Field names follow the store's key names on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsSnapshot
{   /// URL of the legacy local endpoint slot
    pub local_endpoint: String
  , /// URL of the legacy remote endpoint slot
    pub remote_endpoint: String
  , /// Token for the local slot, empty when unset
    pub local_auth_token: String
  , /// Token for the remote slot, empty when unset
    pub remote_auth_token: String
  , /// Per-dispatch timeout override in milliseconds
    pub request_timeout_ms: Option<u64>
  , /// Ordered list of named profiles
    pub profiles: Vec<Profile>
}

/// Read source for settings. The core never writes through this;
/// mutation belongs to the host's options surface.
#[async_trait]
pub trait SettingsStore: Send + Sync
{   /// Read a fresh snapshot of the current settings
    async fn snapshot(&self) -> SettingsSnapshot;
}

/// In-memory settings store for programmatic hosts and tests
#[derive(Debug, Default)]
pub struct MemoryStore
{   inner: RwLock<SettingsSnapshot>
}

impl MemoryStore
{   /// Create a store seeded with the given snapshot
    pub fn new(snapshot: SettingsSnapshot) -> Self
    {   debug!("Creating MemoryStore");
        MemoryStore
        {   inner: RwLock::new(snapshot)
        }
    }

    /// Replace the stored settings; in-flight dispatches keep
    /// the snapshot they already read
    pub async fn set(&self, snapshot: SettingsSnapshot)
    {   debug!("Replacing stored settings");
        *self.inner.write().await = snapshot;
    }
}

#[async_trait]
impl SettingsStore for MemoryStore
{   async fn snapshot(&self) -> SettingsSnapshot
    {   self.inner.read().await.clone()
    }
}
