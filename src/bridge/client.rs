use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use tower::ServiceExt;

use crate::app::{NewswireError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl QueryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a plain GET for a path on the query API and reads the full body.
#[async_trait]
pub trait QueryClient {
    async fn get(&self, path: &str) -> Result<QueryResponse>;
}

/// Calls the API router in-process, without a socket.
#[derive(Clone)]
pub struct RouterClient {
    router: Router,
}

impl RouterClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

#[async_trait]
impl QueryClient for RouterClient {
    async fn get(&self, path: &str) -> Result<QueryResponse> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .map_err(|e| NewswireError::Other(format!("invalid query path {}: {}", path, e)))?;

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| NewswireError::Other(format!("failed to read query body: {}", e)))?;

        Ok(QueryResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

/// Calls a running API over HTTP.
pub struct HttpQueryClient {
    client: reqwest::Client,
    base: url::Url,
}

impl HttpQueryClient {
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base: url::Url::parse(base)?,
        })
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn get(&self, path: &str) -> Result<QueryResponse> {
        let url = self.base.join(path)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(QueryResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
