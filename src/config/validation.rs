use super::{ConfigError, ConfigResult, PickerConfig};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &PickerConfig) -> ConfigResult<()> {
        match config {
            PickerConfig::RoundRobin | PickerConfig::Random => Ok(()),
            PickerConfig::KvAware {
                controller_addr,
                threshold: _,
                timeout_secs,
            } => {
                if controller_addr.trim().is_empty() {
                    return Err(ConfigError::MissingRequired {
                        field: "controller_addr".to_string(),
                    });
                }

                if *timeout_secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "timeout_secs".to_string(),
                        value: timeout_secs.to_string(),
                        reason: "Must be > 0".to_string(),
                    });
                }
                Ok(())
            }
            PickerConfig::PrefixMatch {
                chunk_size,
                max_trie_nodes,
                eviction_interval_secs,
            } => {
                if *chunk_size == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "chunk_size".to_string(),
                        value: chunk_size.to_string(),
                        reason: "Must be > 0".to_string(),
                    });
                }

                if let Some(max_nodes) = max_trie_nodes {
                    if *max_nodes == 0 {
                        return Err(ConfigError::InvalidValue {
                            field: "max_trie_nodes".to_string(),
                            value: max_nodes.to_string(),
                            reason: "Must be > 0 when set".to_string(),
                        });
                    }
                    if *eviction_interval_secs == 0 {
                        return Err(ConfigError::ValidationFailed {
                            reason: "eviction_interval_secs must be > 0 when max_trie_nodes is set"
                                .to_string(),
                        });
                    }
                }
                Ok(())
            }
        }
    }
}
