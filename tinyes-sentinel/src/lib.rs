pub mod error;
pub mod pool;
pub mod sentinel;

pub use error::{SentinelError, SentinelResult};
pub use pool::ConnectionPool;
pub use sentinel::{Discovery, Sentinel};
