use std::time::Duration;

use dashmap::DashMap;
use tonic::transport::{Channel, Endpoint};
use tracing::{info, warn};

use crate::error::{SentinelError, SentinelResult};

const DIAL_TIMEOUT: Duration = Duration::from_millis(200);

/// Thread-safe map from endpoint to a connected gRPC channel. Tonic's
/// `Channel` does not expose a connectivity-state query the way a
/// grpc-go `ClientConn` does, so eviction here is caller-driven: a
/// worker RPC that fails with a transport error should call
/// [`ConnectionPool::evict`] so the next lookup redials instead of
/// reusing a channel to a dead peer.
#[derive(Default)]
pub struct ConnectionPool {
    channels: DashMap<String, Channel>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub async fn get_or_connect(&self, endpoint: &str) -> SentinelResult<Channel> {
        if let Some(channel) = self.channels.get(endpoint) {
            return Ok(channel.clone());
        }
        let uri = format!("http://{endpoint}");
        let channel = Endpoint::from_shared(uri)
            .map_err(|_| SentinelError::ConnectFailed(endpoint.to_string()))?
            .connect_timeout(DIAL_TIMEOUT)
            .connect()
            .await
            .map_err(|err| {
                warn!(endpoint, error = %err, "dial failed");
                SentinelError::ConnectFailed(endpoint.to_string())
            })?;
        info!(endpoint, "connected to grpc worker");
        self.channels.insert(endpoint.to_string(), channel.clone());
        Ok(channel)
    }

    pub fn evict(&self, endpoint: &str) {
        self.channels.remove(endpoint);
    }

    pub fn close(&self) {
        self.channels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_to_unreachable_endpoint_fails() {
        let pool = ConnectionPool::new();
        let result = pool.get_or_connect("127.0.0.1:1").await;
        assert!(matches!(result, Err(SentinelError::ConnectFailed(_))));
        assert!(pool.channels.is_empty());
    }

    #[test]
    fn evict_on_empty_pool_is_noop() {
        let pool = ConnectionPool::new();
        pool.evict("127.0.0.1:9999");
        assert!(pool.channels.is_empty());
    }

    #[tokio::test]
    async fn close_clears_pool() {
        let pool = ConnectionPool::new();
        pool.channels.insert("127.0.0.1:1".to_string(), Endpoint::from_static("http://127.0.0.1:1").connect_lazy());
        assert_eq!(pool.channels.len(), 1);
        pool.close();
        assert!(pool.channels.is_empty());
    }
}
