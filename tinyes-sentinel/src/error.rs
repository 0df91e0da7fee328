use thiserror::Error;

pub type SentinelResult<T> = std::result::Result<T, SentinelError>;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("there is no alive index worker")]
    NoAliveWorker,
    #[error("connect to worker {0} failed")]
    ConnectFailed(String),
    #[error("worker rpc failed: {0}")]
    Rpc(#[from] tonic::Status),
}
