use serde::{Deserialize, Serialize};

use super::{validation::ConfigValidator, ConfigResult};
use crate::{
    cache_index::DEFAULT_CACHE_INDEX_TIMEOUT_SECS,
    policies::{KvAwareConfig, PrefixMatchConfig, DEFAULT_CHUNK_SIZE},
};

/// Picker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PickerConfig {
    /// Route by a remote cache index, round robin otherwise
    #[serde(rename = "kvaware")]
    KvAware {
        controller_addr: String,
        #[serde(default)]
        threshold: usize,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Route by a local hash-chunk trie, random otherwise
    #[serde(rename = "prefixmatch")]
    PrefixMatch {
        #[serde(default = "default_chunk_size")]
        chunk_size: usize,
        #[serde(default)]
        max_trie_nodes: Option<usize>,
        #[serde(default = "default_eviction_interval_secs")]
        eviction_interval_secs: u64,
    },

    #[serde(rename = "round_robin")]
    RoundRobin,

    #[serde(rename = "random")]
    Random,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_CACHE_INDEX_TIMEOUT_SECS
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_eviction_interval_secs() -> u64 {
    30
}

impl Default for PickerConfig {
    fn default() -> Self {
        PickerConfig::PrefixMatch {
            chunk_size: default_chunk_size(),
            max_trie_nodes: None,
            eviction_interval_secs: default_eviction_interval_secs(),
        }
    }
}

impl PickerConfig {
    /// Parse and validate a JSON picker configuration
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: PickerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate(self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PickerConfig::KvAware { .. } => "kvaware",
            PickerConfig::PrefixMatch { .. } => "prefixmatch",
            PickerConfig::RoundRobin => "round_robin",
            PickerConfig::Random => "random",
        }
    }

    pub fn kv_aware(&self) -> Option<KvAwareConfig> {
        match self {
            PickerConfig::KvAware {
                controller_addr,
                threshold,
                timeout_secs,
            } => Some(KvAwareConfig {
                controller_addr: controller_addr.clone(),
                threshold: *threshold,
                timeout_secs: *timeout_secs,
            }),
            _ => None,
        }
    }

    pub fn prefix_match(&self) -> Option<PrefixMatchConfig> {
        match self {
            PickerConfig::PrefixMatch {
                chunk_size,
                max_trie_nodes,
                eviction_interval_secs,
            } => Some(PrefixMatchConfig {
                chunk_size: *chunk_size,
                max_trie_nodes: *max_trie_nodes,
                eviction_interval_secs: *eviction_interval_secs,
            }),
            _ => None,
        }
    }
}
