use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::warn;

use tinyes_core::{Document, TermQuery};
use tinyes_discovery::{HubProxy, ServiceHub, INDEX_SERVICE};
use tinyes_proto::pb::index_service_client::IndexServiceClient;
use tinyes_proto::pb::{CountRequest, DocIdRequest, SearchRequest};

use crate::error::{SentinelError, SentinelResult};
use crate::pool::ConnectionPool;

/// Discovery facade a [`Sentinel`] can be built over: either direct
/// [`ServiceHub`] access or a rate-limited, caching [`HubProxy`].
#[derive(Clone)]
pub enum Discovery {
    Direct(Arc<ServiceHub>),
    Proxied(Arc<HubProxy>),
}

impl Discovery {
    async fn endpoints(&self) -> Vec<String> {
        match self {
            Discovery::Direct(hub) => hub.get_service_endpoints(INDEX_SERVICE).await,
            Discovery::Proxied(proxy) => proxy.get_service_endpoints(INDEX_SERVICE).await,
        }
    }

    async fn endpoint(&self) -> String {
        match self {
            Discovery::Direct(hub) => hub.get_service_endpoint(INDEX_SERVICE).await,
            Discovery::Proxied(proxy) => proxy.get_service_endpoint(INDEX_SERVICE).await,
        }
    }

    async fn close(&self) {
        if let Discovery::Direct(hub) = self {
            let _ = hub.close().await;
        }
    }
}

/// Cluster-facing index facade that scatter-gathers document
/// operations across workers discovered through `discovery`.
pub struct Sentinel {
    discovery: Discovery,
    pool: ConnectionPool,
}

impl Sentinel {
    pub fn new(discovery: Discovery) -> Self {
        Self {
            discovery,
            pool: ConnectionPool::new(),
        }
    }

    async fn client_for(&self, endpoint: &str) -> SentinelResult<IndexServiceClient<tonic::transport::Channel>> {
        let channel = self.pool.get_or_connect(endpoint).await?;
        Ok(IndexServiceClient::new(channel))
    }

    /// Routes to exactly one worker, chosen by the installed
    /// load-balancing strategy -- cluster sharding is implicit: each
    /// document lives on whichever single worker it was routed to.
    pub async fn add_doc(&self, doc: Document) -> SentinelResult<u32> {
        let endpoint = self.discovery.endpoint().await;
        if endpoint.is_empty() {
            return Err(SentinelError::NoAliveWorker);
        }
        let mut client = self.client_for(&endpoint).await?;
        let resp = client.add_doc(tinyes_proto::pb::Document::from(doc)).await;
        match resp {
            Ok(resp) => Ok(resp.into_inner().count as u32),
            Err(status) => {
                self.pool.evict(&endpoint);
                Err(status.into())
            }
        }
    }

    /// Broadcasts to every known worker since Add's routing is not
    /// deterministic after re-registrations. Returns the sum of
    /// affected counts across all workers.
    pub async fn delete_doc(&self, id: &str) -> u32 {
        let endpoints = self.discovery.endpoints().await;
        if endpoints.is_empty() {
            return 0;
        }
        let mut set = JoinSet::new();
        for endpoint in endpoints {
            let id = id.to_string();
            let client = self.client_for(&endpoint).await;
            set.spawn(async move {
                let mut client = client.ok()?;
                let resp = client
                    .delete_doc(DocIdRequest { doc_id: id })
                    .await
                    .ok()?;
                Some(resp.into_inner().count as u32)
            });
        }
        let mut total = 0u32;
        while let Some(result) = set.join_next().await {
            if let Ok(Some(count)) = result {
                total += count;
            }
        }
        total
    }

    /// Fans out Search to every worker; results stream back through a
    /// bounded channel consumed by one aggregator task, matching the
    /// upstream's waitgroup + buffered channel pattern. Order across
    /// workers is not preserved; order within a worker's response is.
    pub async fn search(&self, query: &TermQuery, on_flag: u64, off_flag: u64, or_flags: &[u64]) -> Vec<Document> {
        let endpoints = self.discovery.endpoints().await;
        if endpoints.is_empty() {
            return Vec::new();
        }

        let (tx, mut rx) = mpsc::channel::<Document>(1000);
        let aggregator = tokio::spawn(async move {
            let mut docs = Vec::with_capacity(1000);
            while let Some(doc) = rx.recv().await {
                docs.push(doc);
            }
            docs
        });

        let mut set = JoinSet::new();
        for endpoint in endpoints {
            let client = self.client_for(&endpoint).await;
            let tx = tx.clone();
            let query = query.clone();
            let or_flags = or_flags.to_vec();
            set.spawn(async move {
                let Ok(mut client) = client else { return };
                let request = SearchRequest {
                    query: Some(query.into()),
                    on_flag,
                    off_flag,
                    or_flags,
                };
                match client.search(request).await {
                    Ok(resp) => {
                        for doc in resp.into_inner().results {
                            if tx.send(doc.into()).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(err) => warn!(endpoint, error = %err, "search from cluster failed"),
                }
            });
        }
        while set.join_next().await.is_some() {}
        drop(tx);
        aggregator.await.unwrap_or_default()
    }

    pub async fn count(&self) -> u32 {
        let endpoints = self.discovery.endpoints().await;
        if endpoints.is_empty() {
            return 0;
        }
        let mut set = JoinSet::new();
        for endpoint in endpoints {
            let client = self.client_for(&endpoint).await;
            set.spawn(async move {
                let mut client = client.ok()?;
                let resp = client.count(CountRequest {}).await.ok()?;
                Some(resp.into_inner().count as u32)
            });
        }
        let mut total = 0u32;
        while let Some(result) = set.join_next().await {
            if let Ok(Some(count)) = result {
                total += count;
            }
        }
        total
    }

    pub async fn close(&self) {
        self.pool.close();
        self.discovery.close().await;
    }
}
