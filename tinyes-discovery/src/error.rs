use thiserror::Error;

pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("coordination store transport error")]
    Transport(#[from] etcd_client::Error),
    #[error("lease not found")]
    LeaseNotFound,
    #[error("coordination store construction failed: {0}")]
    Construction(String),
}
