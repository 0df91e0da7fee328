use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tonic::transport::Server;
use tracing::{error, info};

use tinyes_core::{ForwardStoreFactory, Indexer};
use tinyes_discovery::{EtcdCoordinationStore, ServiceHub, INDEX_SERVICE};
use tinyes_proto::pb::index_service_server::IndexServiceServer;

use crate::endpoint::WorkerEndpoint;
use crate::net::local_ipv4;
use crate::settings::Settings;

pub async fn serve(settings: Settings) -> Result<()> {
    if settings.service_port <= 1024 {
        anyhow::bail!("invalid listen port {}, should be more than 1024", settings.service_port);
    }

    let forward = ForwardStoreFactory::open(settings.index.db_type.clone().into(), &settings.index.data_dir)
        .context("failed to open forward store")?;
    let indexer = Indexer::new(forward, settings.index.doc_num_estimate);
    indexer.load_from_index_file().context("failed to rebuild inverted index from forward store")?;

    let hub = if settings.registry.etcd_servers.is_empty() {
        None
    } else {
        let store = EtcdCoordinationStore::connect(&settings.registry.etcd_servers)
            .await
            .context("failed to connect to coordination store")?;
        Some(ServiceHub::get_or_init(
            Arc::new(store),
            settings.registry.heartbeat_frequency_secs,
        ))
    };

    let self_ip = if settings.registry.prefer_loopback {
        std::net::Ipv4Addr::new(127, 0, 0, 1)
    } else {
        local_ipv4()
    };
    let self_addr = format!("{}:{}", self_ip, settings.service_port);

    if let Some(hub) = hub.clone() {
        let lease_id = hub
            .regist(INDEX_SERVICE, &self_addr, 0)
            .await
            .context("failed to register with service hub")?;
        spawn_heartbeat(hub.clone(), self_addr.clone(), lease_id);
    }

    let endpoint = WorkerEndpoint::new(indexer);
    let addr = format!("0.0.0.0:{}", settings.service_port)
        .parse()
        .context("invalid listen address")?;

    info!(%addr, %self_addr, "starting tinyes worker");
    let result = Server::builder()
        .add_service(IndexServiceServer::new(endpoint))
        .serve(addr)
        .await;

    if let Some(hub) = hub {
        if let Err(err) = hub.unregist(INDEX_SERVICE, &self_addr).await {
            error!(error = %err, "failed to unregister on shutdown");
        }
    }

    result.context("tonic server failed")
}

fn spawn_heartbeat(hub: Arc<ServiceHub>, self_addr: String, initial_lease: tinyes_discovery::LeaseId) {
    tokio::spawn(async move {
        let mut lease_id = initial_lease;
        let sleep_for = Duration::from_secs(hub.heartbeat_frequency_secs().max(1) as u64)
            .saturating_sub(Duration::from_millis(100));
        loop {
            tokio::time::sleep(sleep_for).await;
            match hub.regist(INDEX_SERVICE, &self_addr, lease_id).await {
                Ok(fresh) => lease_id = fresh,
                Err(err) => error!(error = %err, "heartbeat re-registration failed"),
            }
        }
    });
}
