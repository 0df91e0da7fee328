pub mod balancer;
pub mod coordination;
pub mod error;
pub mod etcd_store;
pub mod hub;
pub mod hub_proxy;

pub use balancer::{LoadBalancer, RandomSelect, RoundRobin};
pub use coordination::{CoordinationStore, LeaseId, WatchEvent, WatchStream};
pub use error::{DiscoveryError, DiscoveryResult};
pub use etcd_store::EtcdCoordinationStore;
pub use hub::{ServiceHub, SERVICE_ROOT_PATH};
pub use hub_proxy::HubProxy;

/// Name under which worker endpoints register themselves.
pub const INDEX_SERVICE: &str = "index_service";
