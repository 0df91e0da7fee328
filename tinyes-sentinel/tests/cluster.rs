use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use tinyes_core::{BackendKind, Document, ForwardStoreFactory, Indexer, Keyword, TermQuery};
use tinyes_discovery::{CoordinationStore, DiscoveryError, DiscoveryResult, LeaseId, ServiceHub, WatchStream, SERVICE_ROOT_PATH};
use tinyes_proto::pb::index_service_server::IndexServiceServer;
use tinyes_sentinel::{Discovery, Sentinel};
use tinyes_worker::WorkerEndpoint;

#[derive(Default)]
struct FakeStore {
    entries: Mutex<HashMap<String, String>>,
    next_lease: std::sync::atomic::AtomicI64,
    alive: Mutex<HashSet<LeaseId>>,
}

#[async_trait]
impl CoordinationStore for FakeStore {
    async fn grant_lease(&self, _ttl_secs: i64) -> DiscoveryResult<LeaseId> {
        let id = self.next_lease.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
        self.alive.lock().insert(id);
        Ok(id)
    }

    async fn keep_alive_once(&self, lease_id: LeaseId) -> DiscoveryResult<()> {
        if self.alive.lock().contains(&lease_id) {
            Ok(())
        } else {
            Err(DiscoveryError::LeaseNotFound)
        }
    }

    async fn put_with_lease(&self, key: &str, value: &str, _lease_id: LeaseId) -> DiscoveryResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> DiscoveryResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> DiscoveryResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn watch_prefix(&self, _prefix: &str) -> DiscoveryResult<WatchStream> {
        Ok(Box::pin(tokio_stream::empty()))
    }

    async fn close(&self) -> DiscoveryResult<()> {
        Ok(())
    }
}

async fn spawn_worker() -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = ForwardStoreFactory::open(BackendKind::Lsm, dir.path()).unwrap();
    let indexer = Indexer::new(store, 16);
    let endpoint = WorkerEndpoint::new(indexer);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = Server::builder()
            .add_service(IndexServiceServer::new(endpoint))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await;
    });

    // Give the listener task a moment to start accepting connections.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (addr.to_string(), dir)
}

#[tokio::test]
async fn three_workers_add_search_delete_roundtrip() {
    let mut addrs = Vec::new();
    let mut _dirs = Vec::new();
    for _ in 0..3 {
        let (addr, dir) = spawn_worker().await;
        addrs.push(addr);
        _dirs.push(dir);
    }

    let store = Arc::new(FakeStore::default());
    for addr in &addrs {
        let key = format!("{}/index_service/{}", SERVICE_ROOT_PATH, addr);
        store.put_with_lease(&key, "", 1).await.unwrap();
    }

    let hub = ServiceHub::get_or_init(store, 3);
    let sentinel = Sentinel::new(Discovery::Direct(hub));

    let doc = Document::new(
        "doc-1",
        0,
        vec![Keyword::new("content", "hello")],
        bytes::Bytes::new(),
    );
    let added = sentinel.add_doc(doc).await.unwrap();
    assert_eq!(added, 1);

    let results = sentinel
        .search(&TermQuery::leaf("content", "hello"), 0, 0, &[])
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "doc-1");

    let deleted = sentinel.delete_doc("doc-1").await;
    assert_eq!(deleted, 1);

    let results_after_delete = sentinel
        .search(&TermQuery::leaf("content", "hello"), 0, 0, &[])
        .await;
    assert!(results_after_delete.is_empty());

    sentinel.close().await;
}
