use std::num::NonZeroU32;
use std::sync::{Arc, OnceLock};

use dashmap::{DashMap, DashSet};
use governor::{Quota, RateLimiter};
use tokio_stream::StreamExt;
use tracing::info;

use crate::hub::ServiceHub;

type Limiter = RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// Wraps a [`ServiceHub`] with a per-service endpoint cache, lazy
/// prefix-watch registration (at most once per service) and a
/// token-bucket rate limiter.
pub struct HubProxy {
    hub: Arc<ServiceHub>,
    endpoint_cache: DashMap<String, Vec<String>>,
    watched: DashSet<String>,
    limiter: Limiter,
}

static PROXY: OnceLock<Arc<HubProxy>> = OnceLock::new();

impl HubProxy {
    /// Returns the process-wide `HubProxy`, constructing it on first
    /// call from the given `hub` and `qps` (permits per second, also
    /// the burst size). Subsequent calls return the original instance.
    pub fn get_or_init(hub: Arc<ServiceHub>, qps: u32) -> Arc<HubProxy> {
        PROXY
            .get_or_init(|| {
                let qps = NonZeroU32::new(qps.max(1)).expect("qps clamped to at least 1");
                Arc::new(HubProxy {
                    hub,
                    endpoint_cache: DashMap::new(),
                    watched: DashSet::new(),
                    limiter: RateLimiter::direct(Quota::per_second(qps).allow_burst(qps)),
                })
            })
            .clone()
    }

    fn watch_endpoints_of_service(self: &Arc<Self>, service: &str) {
        if !self.watched.insert(service.to_string()) {
            return;
        }
        let proxy = Arc::clone(self);
        let service = service.to_string();
        let hub = Arc::clone(&proxy.hub);
        let prefix = format!("{}/{}/", crate::hub::SERVICE_ROOT_PATH.trim_end_matches('/'), service);
        info!(service = %service, "watching service endpoint changes");
        tokio::spawn(async move {
            let store = hub.store();
            let mut stream = match store.watch_prefix(&prefix).await {
                Ok(stream) => stream,
                Err(_) => return,
            };
            while let Some(event) = stream.next().await {
                let key = match event {
                    Ok(crate::coordination::WatchEvent::Put { key }) => key,
                    Ok(crate::coordination::WatchEvent::Delete { key }) => key,
                    Err(_) => continue,
                };
                let mut parts = key.rsplitn(3, '/');
                let _endpoint = parts.next();
                if let Some(changed_service) = parts.next() {
                    let endpoints = hub.get_service_endpoints(changed_service).await;
                    if endpoints.is_empty() {
                        proxy.endpoint_cache.remove(changed_service);
                    } else {
                        proxy.endpoint_cache.insert(changed_service.to_string(), endpoints);
                    }
                }
            }
        });
    }

    /// Rate-limited, cached service discovery. Returns an empty list
    /// immediately if the limiter rejects the call -- callers must
    /// treat an empty result as "try again later," not "no endpoints."
    pub async fn get_service_endpoints(self: &Arc<Self>, service: &str) -> Vec<String> {
        if self.limiter.check().is_err() {
            return Vec::new();
        }
        self.watch_endpoints_of_service(service);
        if let Some(cached) = self.endpoint_cache.get(service) {
            return cached.clone();
        }
        let endpoints = self.hub.get_service_endpoints(service).await;
        if !endpoints.is_empty() {
            self.endpoint_cache.insert(service.to_string(), endpoints.clone());
        }
        endpoints
    }

    pub async fn get_service_endpoint(self: &Arc<Self>, service: &str) -> String {
        let endpoints = self.get_service_endpoints(service).await;
        self.hub.take_endpoint(&endpoints)
    }
}
