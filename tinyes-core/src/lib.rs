pub mod document;
pub mod error;
pub mod forward;
pub mod hashing;
pub mod indexer;
pub mod inverted;
pub mod postings;
pub mod segmap;

pub use document::{Document, Keyword, TermQuery};
pub use error::{CoreError, CoreResult};
pub use forward::{BackendKind, ForwardStore, ForwardStoreFactory};
pub use indexer::Indexer;
pub use inverted::InvertedIndex;
pub use postings::{intersect, union, PostingEntry, PostingList};
