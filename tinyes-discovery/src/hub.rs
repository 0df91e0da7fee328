use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::balancer::{LoadBalancer, RoundRobin};
use crate::coordination::{CoordinationStore, LeaseId};
use crate::error::{DiscoveryError, DiscoveryResult};

pub const SERVICE_ROOT_PATH: &str = "/tinyes/index";

fn key_for(service: &str, endpoint: &str) -> String {
    format!("{}/{}/{}", SERVICE_ROOT_PATH.trim_end_matches('/'), service, endpoint)
}

fn prefix_for(service: &str) -> String {
    format!("{}/{}/", SERVICE_ROOT_PATH.trim_end_matches('/'), service)
}

/// Service registry adapter over a coordination store. Process-wide,
/// lazily constructed exactly once.
pub struct ServiceHub {
    store: Arc<dyn CoordinationStore>,
    heartbeat_frequency_secs: i64,
    load_balancer: Box<dyn LoadBalancer>,
}

static HUB: OnceLock<Arc<ServiceHub>> = OnceLock::new();

impl ServiceHub {
    /// Returns the process-wide `ServiceHub`, constructing it on first
    /// call. Subsequent calls ignore their arguments and return the
    /// original instance -- construction is attempted at most once.
    pub fn get_or_init(store: Arc<dyn CoordinationStore>, heartbeat_frequency_secs: i64) -> Arc<ServiceHub> {
        HUB.get_or_init(|| {
            Arc::new(ServiceHub {
                store,
                heartbeat_frequency_secs,
                load_balancer: Box::new(RoundRobin::new()),
            })
        })
        .clone()
    }

    pub fn heartbeat_frequency_secs(&self) -> i64 {
        self.heartbeat_frequency_secs
    }

    pub(crate) fn store(&self) -> Arc<dyn CoordinationStore> {
        Arc::clone(&self.store)
    }

    /// First registration (`lease_id <= 0`) grants a fresh lease and
    /// puts the key under it. Subsequent calls keep the existing lease
    /// alive; if the store reports the lease no longer exists, recurses
    /// with `lease_id = 0` to register from scratch.
    pub async fn regist(&self, service: &str, endpoint: &str, lease_id: LeaseId) -> DiscoveryResult<LeaseId> {
        if lease_id <= 0 {
            let lease = self.store.grant_lease(self.heartbeat_frequency_secs).await?;
            let key = key_for(service, endpoint);
            self.store.put_with_lease(&key, "", lease).await?;
            Ok(lease)
        } else {
            match self.store.keep_alive_once(lease_id).await {
                Ok(()) => Ok(lease_id),
                Err(DiscoveryError::LeaseNotFound) => {
                    Box::pin(self.regist(service, endpoint, 0)).await
                }
                Err(err) => {
                    warn!(error = %err, service, endpoint, "failed to renew lease");
                    Err(err)
                }
            }
        }
    }

    pub async fn unregist(&self, service: &str, endpoint: &str) -> DiscoveryResult<()> {
        let key = key_for(service, endpoint);
        self.store.delete(&key).await?;
        info!(service, endpoint, "unregistered service endpoint");
        Ok(())
    }

    pub async fn get_service_endpoints(&self, service: &str) -> Vec<String> {
        let prefix = prefix_for(service);
        match self.store.get_by_prefix(&prefix).await {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|key| key.rsplit('/').next().map(str::to_string))
                .collect(),
            Err(err) => {
                warn!(error = %err, service, "failed to fetch service endpoints");
                Vec::new()
            }
        }
    }

    pub async fn get_service_endpoint(&self, service: &str) -> String {
        let endpoints = self.get_service_endpoints(service).await;
        self.load_balancer.take(&endpoints)
    }

    /// Picks one endpoint from an already-fetched list using this
    /// hub's load-balancing strategy. Exposed so [`crate::HubProxy`]
    /// can share the same strategy instance over its cached endpoints.
    pub fn take_endpoint(&self, endpoints: &[String]) -> String {
        self.load_balancer.take(endpoints)
    }

    pub async fn close(&self) -> DiscoveryResult<()> {
        self.store.close().await
    }
}
