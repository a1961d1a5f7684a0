//! Request dispatch.
//!
//! A [`Dispatcher`] turns one submission into one [`QueryResult`].  It makes a
//! single attempt, never retries, and never touches session state: the
//! session applies whatever comes back.

use tracing::debug;

use crate::client::QueryClient;
use crate::params::QueryParameters;
use crate::types::{QueryRequest, QueryResult};

/// Performs a query against the answer endpoint.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    /// Run one query with a snapshot of the parameters.
    ///
    /// Implementations must not fail: transport and decode problems come back
    /// as [`QueryResult::Failure`] with a payload describing them.
    async fn dispatch(
        &self,
        query_text: &str,
        params: QueryParameters,
        session_id: &str,
    ) -> QueryResult;
}

/// Dispatches queries over HTTP with a [`QueryClient`].
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: QueryClient,
}

impl HttpDispatcher {
    /// Wrap a client.
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(
        &self,
        query_text: &str,
        params: QueryParameters,
        session_id: &str,
    ) -> QueryResult {
        let request = QueryRequest::new(query_text, session_id).with_parameters(&params);
        debug!(%params, session_id, "dispatching query");
        match self.client.query(&request).await {
            Ok((response, raw_payload)) => {
                QueryResult::success(response.generated_answer, raw_payload)
            }
            Err(err) => QueryResult::from(err),
        }
    }
}

#[async_trait::async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for std::sync::Arc<D> {
    async fn dispatch(
        &self,
        query_text: &str,
        params: QueryParameters,
        session_id: &str,
    ) -> QueryResult {
        (**self).dispatch(query_text, params, session_id).await
    }
}
