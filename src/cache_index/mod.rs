//! Client side of the remote KV cache index.
//!
//! The index is an external service that knows which serving instance holds the
//! cache for a prompt. It answers two questions:
//!
//! - `POST /lookup` with `{model, prompt}`: which instance holds the longest
//!   cached prefix, and how many tokens of it match.
//! - `GET /query?ip=<address>`: which instance id a server address belongs to.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::CacheIndexResult;

mod http;

pub use http::{HttpCacheIndexClient, DEFAULT_CACHE_INDEX_TIMEOUT_SECS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub model: String,
    pub prompt: String,
}

/// Best match reported by the index. An empty `instance_id` means no match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub tokens: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub instance_id: String,
}

/// Lookup and resolution against a cache index
#[async_trait]
pub trait CacheIndex: Send + Sync + Debug {
    /// Find the instance holding the longest cached prefix of `prompt`
    async fn lookup(&self, model: &str, prompt: &str) -> CacheIndexResult<LookupResponse>;

    /// Resolve a server address to its instance id (empty when unknown)
    async fn resolve(&self, address: &str) -> CacheIndexResult<String>;
}
