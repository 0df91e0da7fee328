use tonic::{Request, Response, Status};

use tinyes_core::{Document, Indexer, TermQuery};
use tinyes_proto::pb::index_service_server::IndexService;
use tinyes_proto::pb::{AffectedCount, CountRequest, DocIdRequest, SearchRequest, SearchResult};

/// Thin RPC wrapper exposing an [`Indexer`] over the generated
/// `IndexService` tonic trait.
pub struct WorkerEndpoint {
    indexer: Indexer,
}

impl WorkerEndpoint {
    pub fn new(indexer: Indexer) -> Self {
        Self { indexer }
    }
}

fn backend_status(err: tinyes_core::CoreError) -> Status {
    use tinyes_core::CoreError::*;
    match err {
        InvalidArgument(msg) => Status::invalid_argument(msg),
        NoData => Status::not_found("no data for key"),
        other => Status::internal(other.to_string()),
    }
}

#[tonic::async_trait]
impl IndexService for WorkerEndpoint {
    async fn add_doc(&self, request: Request<tinyes_proto::pb::Document>) -> Result<Response<AffectedCount>, Status> {
        let doc: Document = request.into_inner().into();
        let count = self.indexer.add_doc(doc).map_err(backend_status)?;
        Ok(Response::new(AffectedCount { count: count as i32 }))
    }

    async fn delete_doc(&self, request: Request<DocIdRequest>) -> Result<Response<AffectedCount>, Status> {
        let count = self
            .indexer
            .delete_doc(&request.into_inner().doc_id)
            .map_err(backend_status)?;
        Ok(Response::new(AffectedCount { count: count as i32 }))
    }

    async fn search(&self, request: Request<SearchRequest>) -> Result<Response<SearchResult>, Status> {
        let req = request.into_inner();
        let query: TermQuery = req.query.unwrap_or_default().into();
        let results = self
            .indexer
            .search(&query, req.on_flag, req.off_flag, &req.or_flags)
            .map_err(backend_status)?;
        Ok(Response::new(SearchResult {
            results: results.into_iter().map(Into::into).collect(),
        }))
    }

    async fn count(&self, _request: Request<CountRequest>) -> Result<Response<AffectedCount>, Status> {
        let count = self.indexer.count().map_err(backend_status)?;
        Ok(Response::new(AffectedCount { count: count as i32 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyes_core::{BackendKind, ForwardStoreFactory};
    use tinyes_proto::pb::Keyword;

    fn endpoint() -> (tempfile::TempDir, WorkerEndpoint) {
        let dir = tempfile::tempdir().unwrap();
        let store = ForwardStoreFactory::open(BackendKind::Lsm, dir.path()).unwrap();
        (dir, WorkerEndpoint::new(Indexer::new(store, 16)))
    }

    #[tokio::test]
    async fn add_then_search_then_count_then_delete() {
        let (_dir, endpoint) = endpoint();
        let doc = tinyes_proto::pb::Document {
            id: "d1".to_string(),
            int_id: 0,
            bits_feature: 0,
            keywords: vec![Keyword {
                field: "content".to_string(),
                word: "hello".to_string(),
            }],
            bytes: vec![],
        };
        let added = endpoint.add_doc(Request::new(doc)).await.unwrap();
        assert_eq!(added.into_inner().count, 1);

        let search_req = SearchRequest {
            query: Some(tinyes_proto::pb::TermQuery {
                node: Some(tinyes_proto::pb::term_query::Node::Leaf(Keyword {
                    field: "content".to_string(),
                    word: "hello".to_string(),
                })),
            }),
            on_flag: 0,
            off_flag: 0,
            or_flags: vec![],
        };
        let results = endpoint.search(Request::new(search_req)).await.unwrap();
        assert_eq!(results.into_inner().results.len(), 1);

        let counted = endpoint.count(Request::new(CountRequest {})).await.unwrap();
        assert_eq!(counted.into_inner().count, 1);

        let deleted = endpoint
            .delete_doc(Request::new(DocIdRequest { doc_id: "d1".to_string() }))
            .await
            .unwrap();
        assert_eq!(deleted.into_inner().count, 1);
    }
}
