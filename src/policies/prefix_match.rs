//! Prefix-match picker
//!
//! Approximates longest-prefix routing from locally observed history only. Each
//! decision is written back into a [`HashTrie`], so later prompts sharing a
//! prefix keep landing on the endpoint that served it before.
//!
//! ## Algorithm
//!
//! 1. Build the set of available endpoint URLs
//! 2. Walk the trie along the prompt's chunk hashes, keeping the endpoint set of
//!    the deepest node that still intersects the available set
//! 3. If nothing matched, every available endpoint is a candidate
//! 4. Pick one candidate uniformly at random
//! 5. Insert the prompt under the picked endpoint

use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::debug;

use super::{
    hash_trie::{HashTrie, DEFAULT_CHUNK_SIZE},
    random_index,
    utils::PeriodicTask,
    PickRequest, Picker,
};
use crate::{core::Endpoint, observability::metrics::Metrics};

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixMatchConfig {
    /// Bytes per trie chunk
    pub chunk_size: usize,
    /// Upper bound on trie nodes; `None` keeps all history
    pub max_trie_nodes: Option<usize>,
    /// Seconds between eviction passes when `max_trie_nodes` is set
    pub eviction_interval_secs: u64,
}

impl Default for PrefixMatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_trie_nodes: None,
            eviction_interval_secs: 30,
        }
    }
}

/// Execution branch for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    NoEndpoints,
    PrefixHit,
    Fallback,
}

impl Branch {
    #[inline]
    const fn as_str(&self) -> &'static str {
        match self {
            Self::NoEndpoints => "no_endpoints",
            Self::PrefixHit => "prefix_hit",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug)]
pub struct PrefixMatchPicker {
    trie: Arc<HashTrie>,
    _eviction_task: Option<PeriodicTask>,
}

impl Default for PrefixMatchPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixMatchPicker {
    pub fn new() -> Self {
        Self::with_config(PrefixMatchConfig::default())
    }

    pub fn with_config(config: PrefixMatchConfig) -> Self {
        let trie = Arc::new(HashTrie::new(config.chunk_size));

        let eviction_task = match config.max_trie_nodes {
            Some(max_nodes) if config.eviction_interval_secs > 0 => {
                let trie_clone = Arc::clone(&trie);
                Some(PeriodicTask::spawn(
                    Duration::from_secs(config.eviction_interval_secs),
                    "PrefixTrieEviction",
                    move || {
                        let evicted = trie_clone.evict_to(max_nodes);
                        if evicted > 0 {
                            debug!(
                                "Evicted {} prefix trie nodes, max_nodes: {}",
                                evicted, max_nodes
                            );
                        }
                    },
                ))
            }
            _ => None,
        };

        Self {
            trie,
            _eviction_task: eviction_task,
        }
    }

    /// Shared handle to the underlying trie
    pub fn trie(&self) -> &Arc<HashTrie> {
        &self.trie
    }

    fn pick_impl(
        &self,
        endpoints: &[Arc<dyn Endpoint>],
        request: &PickRequest<'_>,
    ) -> (Option<usize>, Branch) {
        if endpoints.is_empty() {
            return (None, Branch::NoEndpoints);
        }

        let available: HashSet<&str> = endpoints.iter().map(|e| e.url()).collect();

        let matched = self.trie.longest_prefix_match(request.prompt, &available);
        let (pool, branch) = if matched.is_empty() {
            (available, Branch::Fallback)
        } else {
            (matched, Branch::PrefixHit)
        };

        let pool: Vec<&str> = pool.into_iter().collect();
        let selected = pool[random_index(pool.len())];

        self.trie.insert(request.prompt, selected);

        let idx = endpoints
            .iter()
            .position(|e| e.url() == selected)
            .unwrap_or(0);
        debug!(
            "Prefix match picked {} out of {} candidate(s) ({})",
            selected,
            pool.len(),
            branch.as_str()
        );
        (Some(idx), branch)
    }
}

#[async_trait]
impl Picker for PrefixMatchPicker {
    async fn pick(
        &self,
        endpoints: &[Arc<dyn Endpoint>],
        request: &PickRequest<'_>,
    ) -> Option<usize> {
        let (result, branch) = self.pick_impl(endpoints, request);
        Metrics::record_picker_branch(self.name(), branch.as_str());
        if let Some(idx) = result {
            Metrics::record_picker_decision(self.name(), endpoints[idx].url());
        }
        result
    }

    fn name(&self) -> &'static str {
        "prefixmatch"
    }

    fn needs_request_text(&self) -> bool {
        true
    }

    fn reset(&self) {
        self.trie.clear();
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
