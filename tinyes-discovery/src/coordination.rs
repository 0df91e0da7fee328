use async_trait::async_trait;
use tokio_stream::Stream;
use std::pin::Pin;

use crate::error::DiscoveryResult;

pub type LeaseId = i64;

#[derive(Debug, Clone)]
pub enum WatchEvent {
    Put { key: String },
    Delete { key: String },
}

pub type WatchStream = Pin<Box<dyn Stream<Item = DiscoveryResult<WatchEvent>> + Send>>;

/// Capability interface over a lease-based coordination store (etcd's
/// API shape). Anything offering lease grant/keepalive, put/delete
/// under a lease, prefix range-get and prefix watch satisfies this.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    async fn grant_lease(&self, ttl_secs: i64) -> DiscoveryResult<LeaseId>;

    /// Renews `lease_id` once. Returns `Err(DiscoveryError::LeaseNotFound)`
    /// distinguishably from other transport failures.
    async fn keep_alive_once(&self, lease_id: LeaseId) -> DiscoveryResult<()>;

    async fn put_with_lease(&self, key: &str, value: &str, lease_id: LeaseId) -> DiscoveryResult<()>;

    async fn delete(&self, key: &str) -> DiscoveryResult<()>;

    /// Returns the full keys (not stripped of prefix) under `prefix`.
    async fn get_by_prefix(&self, prefix: &str) -> DiscoveryResult<Vec<String>>;

    async fn watch_prefix(&self, prefix: &str) -> DiscoveryResult<WatchStream>;

    async fn close(&self) -> DiscoveryResult<()>;
}
