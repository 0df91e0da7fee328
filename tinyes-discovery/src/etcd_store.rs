use std::time::Duration;

use async_trait::async_trait;
use etcd_client::{Client, GetOptions, PutOptions, WatchOptions};
use futures::StreamExt;

use crate::coordination::{CoordinationStore, LeaseId, WatchEvent, WatchStream};
use crate::error::{DiscoveryError, DiscoveryResult};

pub struct EtcdCoordinationStore {
    client: Client,
}

impl EtcdCoordinationStore {
    pub async fn connect(endpoints: &[String]) -> DiscoveryResult<Self> {
        let client = tokio::time::timeout(Duration::from_secs(3), Client::connect(endpoints, None))
            .await
            .map_err(|_| DiscoveryError::Construction("timed out connecting to coordination store".into()))??;
        Ok(Self { client })
    }
}

#[async_trait]
impl CoordinationStore for EtcdCoordinationStore {
    async fn grant_lease(&self, ttl_secs: i64) -> DiscoveryResult<LeaseId> {
        let mut client = self.client.clone();
        let lease = client.lease_grant(ttl_secs, None).await?;
        Ok(lease.id())
    }

    async fn keep_alive_once(&self, lease_id: LeaseId) -> DiscoveryResult<()> {
        let mut client = self.client.clone();
        match client.lease_keep_alive(lease_id).await {
            Ok((mut keeper, mut stream)) => {
                keeper.keep_alive().await?;
                match stream.message().await {
                    Ok(Some(resp)) if resp.ttl() <= 0 => Err(DiscoveryError::LeaseNotFound),
                    Ok(_) => Ok(()),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn put_with_lease(&self, key: &str, value: &str, lease_id: LeaseId) -> DiscoveryResult<()> {
        let mut client = self.client.clone();
        client
            .put(key, value, Some(PutOptions::new().with_lease(lease_id)))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> DiscoveryResult<()> {
        let mut client = self.client.clone();
        client.delete(key, None).await?;
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> DiscoveryResult<Vec<String>> {
        let mut client = self.client.clone();
        let resp = client.get(prefix, Some(GetOptions::new().with_prefix())).await?;
        Ok(resp
            .kvs()
            .iter()
            .filter_map(|kv| kv.key_str().ok().map(|s| s.to_string()))
            .collect())
    }

    async fn watch_prefix(&self, prefix: &str) -> DiscoveryResult<WatchStream> {
        let mut client = self.client.clone();
        let (_watcher, stream) = client
            .watch(prefix, Some(WatchOptions::new().with_prefix()))
            .await?;
        let mapped = stream.flat_map(|resp| {
            let events: Vec<DiscoveryResult<WatchEvent>> = match resp {
                Ok(resp) => resp
                    .events()
                    .iter()
                    .map(|event| {
                        let key = event
                            .kv()
                            .and_then(|kv| kv.key_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        Ok(match event.event_type() {
                            etcd_client::EventType::Put => WatchEvent::Put { key },
                            etcd_client::EventType::Delete => WatchEvent::Delete { key },
                        })
                    })
                    .collect(),
                Err(err) => vec![Err(err.into())],
            };
            tokio_stream::iter(events)
        });
        Ok(Box::pin(mapped))
    }

    async fn close(&self) -> DiscoveryResult<()> {
        Ok(())
    }
}
