//! Generated wire types and gRPC stubs for the worker's `IndexService`.

pub mod pb {
    tonic::include_proto!("tinyes");
}

pub use pb::index_service_client::IndexServiceClient;
pub use pb::index_service_server::{IndexService, IndexServiceServer};
pub use pb::{
    AffectedCount, CountRequest, Document, DocIdRequest, Keyword, SearchRequest, SearchResult,
    TermQuery, TermQueryList,
};

pub const INDEX_SERVICE: &str = "index_service";
