use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::{CacheIndex, LookupRequest, LookupResponse, QueryResponse};
use crate::core::{CacheIndexError, CacheIndexResult};

/// Default per-call timeout for cache index requests (in seconds)
pub const DEFAULT_CACHE_INDEX_TIMEOUT_SECS: u64 = 2;

/// HTTP client for a cache index controller
#[derive(Debug, Clone)]
pub struct HttpCacheIndexClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCacheIndexClient {
    /// `controller_addr` may be `host:port` or a full `http(s)://` URL.
    pub fn new(controller_addr: &str, timeout: Duration) -> CacheIndexResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheIndexError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self::with_client(controller_addr, client))
    }

    pub fn with_client(controller_addr: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: normalize_base_url(controller_addr),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn normalize_base_url(addr: &str) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

fn check_status(url: &str, status: StatusCode) -> CacheIndexResult<()> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(CacheIndexError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl CacheIndex for HttpCacheIndexClient {
    async fn lookup(&self, model: &str, prompt: &str) -> CacheIndexResult<LookupResponse> {
        let url = self.endpoint("lookup");
        let body = LookupRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
        };

        let resp = self.client.post(&url).json(&body).send().await?;
        check_status(&url, resp.status())?;

        let found = resp
            .json::<LookupResponse>()
            .await
            .map_err(|e| CacheIndexError::Decode {
                url: url.clone(),
                error: e.to_string(),
            })?;
        debug!(
            "Cache index lookup for model {}: instance '{}', {} tokens",
            model, found.instance_id, found.tokens
        );
        Ok(found)
    }

    async fn resolve(&self, address: &str) -> CacheIndexResult<String> {
        let url = self.endpoint("query");

        let resp = self
            .client
            .get(&url)
            .query(&[("ip", address)])
            .send()
            .await?;
        check_status(&url, resp.status())?;

        let data = resp
            .json::<QueryResponse>()
            .await
            .map_err(|e| CacheIndexError::Decode {
                url: url.clone(),
                error: e.to_string(),
            })?;
        Ok(data.instance_id)
    }
}
