use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("backend I/O error")]
    Backend(#[from] std::io::Error),
    #[error("sled error")]
    Sled(#[from] sled::Error),
    #[error("redb database error")]
    RedbDatabase(#[from] redb::DatabaseError),
    #[error("redb transaction error")]
    RedbTransaction(#[from] redb::TransactionError),
    #[error("redb table error")]
    RedbTable(#[from] redb::TableError),
    #[error("redb storage error")]
    RedbStorage(#[from] redb::StorageError),
    #[error("redb commit error")]
    RedbCommit(#[from] redb::CommitError),
    #[error("document codec error")]
    Encoding(#[from] bincode::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no data for key")]
    NoData,
}
