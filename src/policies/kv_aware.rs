/*
    KV-Aware Picker

    Routes a request to the endpoint that already holds the longest matching KV
    cache for its prompt, as reported by a remote cache index, and falls back to
    round robin when the index has nothing useful to say.

    Process:
    a. Ask the cache index which instance holds the longest prefix of the prompt
       and how many tokens of it match.
    b. Accept the match when matched tokens + threshold >= whitespace word count
       of the prompt.
    c. Map the instance id to an endpoint address through a local cache. On a
       miss, ask the index for the instance id of every candidate address and
       fill the cache with whatever comes back.
    d. If the address belongs to one of the current candidates, route there.
    e. Otherwise sort candidates by name and take the next one in round-robin
       order.

    Every remote failure (unreachable, timeout, non-200, bad payload) is treated
    as "no match". The picker always returns a decision for a non-empty
    candidate list.

    Configuration Parameters:
    ------------------------
    1. controller_addr: address of the cache index controller (host:port or URL)
    2. threshold: how many prompt words the match may fall short by
    3. timeout_secs: per-call timeout for cache index requests
*/

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use super::{round_robin::RoundRobinCursor, PickRequest, Picker};
use crate::{
    cache_index::{CacheIndex, HttpCacheIndexClient, DEFAULT_CACHE_INDEX_TIMEOUT_SECS},
    core::{CacheIndexResult, Endpoint},
    observability::metrics::Metrics,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvAwareConfig {
    pub controller_addr: String,
    pub threshold: usize,
    pub timeout_secs: u64,
}

impl KvAwareConfig {
    pub fn new(controller_addr: impl Into<String>) -> Self {
        Self {
            controller_addr: controller_addr.into(),
            threshold: 0,
            timeout_secs: DEFAULT_CACHE_INDEX_TIMEOUT_SECS,
        }
    }
}

/// Local, advisory map from cache-index instance id to endpoint address.
///
/// Entries are only a shortcut around resolution queries. An entry whose
/// address is not among the current candidates is dropped on use.
#[derive(Debug, Default)]
pub struct InstanceCache {
    addresses: DashMap<String, String>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, instance_id: &str) -> Option<String> {
        self.addresses.get(instance_id).map(|a| a.value().clone())
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.addresses.contains_key(instance_id)
    }

    pub fn insert(&self, instance_id: impl Into<String>, address: impl Into<String>) {
        self.addresses.insert(instance_id.into(), address.into());
    }

    pub fn remove(&self, instance_id: &str) -> Option<String> {
        self.addresses.remove(instance_id).map(|(_, address)| address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn clear(&self) {
        self.addresses.clear();
    }
}

/// Execution branch for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    NoEndpoints,
    CacheHit,
    Fallback,
}

impl Branch {
    #[inline]
    const fn as_str(&self) -> &'static str {
        match self {
            Self::NoEndpoints => "no_endpoints",
            Self::CacheHit => "cache_hit",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug)]
pub struct KvAwarePicker {
    index: Arc<dyn CacheIndex>,
    threshold: usize,
    instances: Arc<InstanceCache>,
    cursor: Arc<RoundRobinCursor>,
    /// Outcome of the last lookup; failures are warned about only on the transition
    index_reachable: AtomicBool,
}

impl KvAwarePicker {
    /// Create a picker talking HTTP to the configured controller
    pub fn new(config: KvAwareConfig) -> CacheIndexResult<Self> {
        let client = HttpCacheIndexClient::new(
            &config.controller_addr,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::with_index(Arc::new(client), config.threshold))
    }

    pub fn with_index(index: Arc<dyn CacheIndex>, threshold: usize) -> Self {
        Self::with_state(
            index,
            threshold,
            Arc::new(InstanceCache::new()),
            Arc::new(RoundRobinCursor::new()),
        )
    }

    /// Create a picker around externally owned shared state
    pub fn with_state(
        index: Arc<dyn CacheIndex>,
        threshold: usize,
        instances: Arc<InstanceCache>,
        cursor: Arc<RoundRobinCursor>,
    ) -> Self {
        Self {
            index,
            threshold,
            instances,
            cursor,
            index_reachable: AtomicBool::new(true),
        }
    }

    pub fn instances(&self) -> &Arc<InstanceCache> {
        &self.instances
    }

    pub fn cursor(&self) -> &Arc<RoundRobinCursor> {
        &self.cursor
    }

    /// Index of the candidate holding the prompt's cache, if the index knows one
    async fn find_cached_endpoint(
        &self,
        endpoints: &[Arc<dyn Endpoint>],
        request: &PickRequest<'_>,
    ) -> Option<usize> {
        let found = match self.index.lookup(request.model, request.prompt).await {
            Ok(found) => {
                if !self.index_reachable.swap(true, Ordering::Relaxed) {
                    info!("Cache index lookups succeeding again");
                }
                found
            }
            Err(e) => {
                if self.index_reachable.swap(false, Ordering::Relaxed) {
                    warn!("Cache index lookup failed, using round robin: {}", e);
                } else {
                    debug!("Cache index lookup failed, using round robin: {}", e);
                }
                return None;
            }
        };
        if found.instance_id.is_empty() {
            return None;
        }

        let word_count = request.prompt.split_whitespace().count();
        if found.tokens.saturating_add(self.threshold) < word_count {
            debug!(
                "Instance {} matched {} tokens of {} words, below threshold {}",
                found.instance_id, found.tokens, word_count, self.threshold
            );
            return None;
        }

        if !self.instances.contains(&found.instance_id) {
            self.refresh_instances(endpoints).await;
        }

        let address = self.instances.get(&found.instance_id)?;
        match endpoints.iter().position(|e| e.address() == address) {
            Some(idx) => {
                debug!(
                    "Instance {} resolved to {} ({})",
                    found.instance_id,
                    endpoints[idx].name(),
                    address
                );
                Some(idx)
            }
            None => {
                // Address no longer among the candidates; re-resolve next time
                self.instances.remove(&found.instance_id);
                debug!(
                    "Instance {} maps to {} which is not a current candidate",
                    found.instance_id, address
                );
                None
            }
        }
    }

    /// Ask the index for the instance id of every candidate, caching each answer
    /// as it arrives. Individual failures leave that candidate unresolved.
    async fn refresh_instances(&self, endpoints: &[Arc<dyn Endpoint>]) {
        let mut pending: FuturesUnordered<_> = endpoints
            .iter()
            .map(|endpoint| {
                let address = endpoint.address();
                async move { (address, self.index.resolve(address).await) }
            })
            .collect();

        while let Some((address, result)) = pending.next().await {
            match result {
                Ok(instance_id) if !instance_id.is_empty() => {
                    self.instances.insert(instance_id, address);
                }
                Ok(_) => debug!("Cache index does not know address {}", address),
                Err(e) => debug!("Failed to resolve instance for {}: {}", address, e),
            }
        }
    }

    async fn pick_impl(
        &self,
        endpoints: &[Arc<dyn Endpoint>],
        request: &PickRequest<'_>,
    ) -> (Option<usize>, Branch) {
        if endpoints.is_empty() {
            return (None, Branch::NoEndpoints);
        }

        if let Some(idx) = self.find_cached_endpoint(endpoints, request).await {
            return (Some(idx), Branch::CacheHit);
        }

        let idx = self.cursor.select(endpoints);
        if let Some(idx) = idx {
            debug!(
                "KV-aware picker falling back to round robin: {} of {} candidates",
                endpoints[idx].name(),
                endpoints.len()
            );
        }
        (idx, Branch::Fallback)
    }
}

#[async_trait]
impl Picker for KvAwarePicker {
    async fn pick(
        &self,
        endpoints: &[Arc<dyn Endpoint>],
        request: &PickRequest<'_>,
    ) -> Option<usize> {
        let (result, branch) = self.pick_impl(endpoints, request).await;
        Metrics::record_picker_branch(self.name(), branch.as_str());
        if let Some(idx) = result {
            Metrics::record_picker_decision(self.name(), endpoints[idx].url());
        }
        result
    }

    fn name(&self) -> &'static str {
        "kvaware"
    }

    fn needs_request_text(&self) -> bool {
        true
    }

    fn reset(&self) {
        self.cursor.reset();
        self.instances.clear();
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
