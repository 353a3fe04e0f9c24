//! Factory for creating pickers

use std::sync::Arc;

use super::{
    KvAwareConfig, KvAwarePicker, Picker, PrefixMatchConfig, PrefixMatchPicker, RandomPicker,
    RoundRobinPicker,
};
use crate::config::{ConfigError, ConfigResult, PickerConfig};

/// Factory for creating picker instances
pub struct PickerFactory;

impl PickerFactory {
    /// Create a picker from configuration. The configuration is validated first.
    pub fn create_from_config(config: &PickerConfig) -> ConfigResult<Arc<dyn Picker>> {
        config.validate()?;

        let picker: Arc<dyn Picker> = match config {
            PickerConfig::KvAware {
                controller_addr,
                threshold,
                timeout_secs,
            } => {
                let picker = KvAwarePicker::new(KvAwareConfig {
                    controller_addr: controller_addr.clone(),
                    threshold: *threshold,
                    timeout_secs: *timeout_secs,
                })
                .map_err(|e| ConfigError::InvalidValue {
                    field: "controller_addr".to_string(),
                    value: controller_addr.clone(),
                    reason: e.to_string(),
                })?;
                Arc::new(picker)
            }
            PickerConfig::PrefixMatch {
                chunk_size,
                max_trie_nodes,
                eviction_interval_secs,
            } => Arc::new(PrefixMatchPicker::with_config(PrefixMatchConfig {
                chunk_size: *chunk_size,
                max_trie_nodes: *max_trie_nodes,
                eviction_interval_secs: *eviction_interval_secs,
            })),
            PickerConfig::RoundRobin => Arc::new(RoundRobinPicker::new()),
            PickerConfig::Random => Arc::new(RandomPicker::new()),
        };
        Ok(picker)
    }

    /// Create a picker by name with default settings.
    ///
    /// `kvaware` is not available here since it needs a controller address.
    pub fn create_by_name(name: &str) -> Option<Arc<dyn Picker>> {
        match name.to_lowercase().as_str() {
            "prefixmatch" | "prefix_match" => Some(Arc::new(PrefixMatchPicker::new())),
            "round_robin" | "roundrobin" => Some(Arc::new(RoundRobinPicker::new())),
            "random" => Some(Arc::new(RandomPicker::new())),
            _ => None,
        }
    }
}
