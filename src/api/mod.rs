pub mod weblog;
pub mod xmlrpc;

use log::{debug, log_enabled, trace};
use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::Value;

use crate::{error::Result, post::PostFields};

const RETRY_LIMIT: u32 = 3;

/// Remote side of the sync.
///
/// Listings are ordered most recent first.
pub trait Blog {
    async fn recent_posts(&self, count: usize) -> Result<Vec<PostFields>>;
    async fn all_posts(&self) -> Result<Vec<PostFields>>;
    async fn get_post(&self, id: u64) -> Result<PostFields>;
    async fn new_post(&self, fields: PostFields) -> Result<u64>;
    async fn edit_post(&self, id: u64, fields: PostFields) -> Result<bool>;
}

/// XML-RPC over HTTP with retries on transient failures.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: ClientWithMiddleware,
    endpoint: String,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(RETRY_LIMIT);
        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        let body = xmlrpc::encode_call(method, params);

        debug!("POST {} ({})", self.endpoint, method);
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        let response = response.text().await?;

        if log_enabled!(log::Level::Trace) {
            trace!("{}", response);
        }

        xmlrpc::decode_response(&response)
    }
}
