//! Endpoint pickers
//!
//! Every picker implements [`Picker`]: given the scored candidates for one
//! request, return the index of the endpoint to route to. Pickers are shared
//! across in-flight requests and keep their own synchronized state.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use rand::Rng;

use crate::core::Endpoint;

mod factory;
pub mod hash_trie;
mod kv_aware;
mod prefix_match;
mod random;
mod round_robin;
pub(crate) mod utils;

pub use factory::PickerFactory;
pub use hash_trie::{chunk_and_hash, HashTrie, DEFAULT_CHUNK_SIZE};
pub use kv_aware::{InstanceCache, KvAwareConfig, KvAwarePicker};
pub use prefix_match::{PrefixMatchConfig, PrefixMatchPicker};
pub use random::RandomPicker;
pub use round_robin::{RoundRobinCursor, RoundRobinPicker};

/// Core trait for endpoint pickers
#[async_trait]
pub trait Picker: Send + Sync + Debug {
    /// Pick one endpoint for the request.
    ///
    /// Returns an index into `endpoints`, or `None` only when `endpoints` is
    /// empty. `None` means "no preference": the caller keeps the upstream
    /// scheduler's own choice.
    async fn pick(&self, endpoints: &[Arc<dyn Endpoint>], request: &PickRequest<'_>)
        -> Option<usize>;

    /// Get picker name for metrics and debugging
    fn name(&self) -> &'static str;

    /// Whether the picker reads the prompt
    fn needs_request_text(&self) -> bool {
        false
    }

    /// Reset any internal state
    fn reset(&self) {}

    /// Get as Any for downcasting
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Per-request information passed to a picker
#[derive(Debug, Clone, Copy, Default)]
pub struct PickRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Prompt text, already flattened from any message list
    pub prompt: &'a str,
}

impl<'a> PickRequest<'a> {
    pub fn new(model: &'a str, prompt: &'a str) -> Self {
        Self { model, prompt }
    }
}

/// Endpoint indices ordered by endpoint name (URL breaks ties), independent of
/// the order the caller supplied them in
pub(crate) fn sorted_indices(endpoints: &[Arc<dyn Endpoint>]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..endpoints.len()).collect();
    indices.sort_by(|&a, &b| {
        endpoints[a]
            .name()
            .cmp(endpoints[b].name())
            .then_with(|| endpoints[a].url().cmp(endpoints[b].url()))
    });
    indices
}

/// Uniform random index in `0..len`. `len` must be non-zero.
#[inline]
pub(crate) fn random_index(len: usize) -> usize {
    rand::rng().random_range(0..len)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_indices_by_name() {
        let endpoints = test_util::endpoints(&["c", "a", "b"]);
        let order = sorted_indices(&endpoints);
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_sorted_indices_empty() {
        assert!(sorted_indices(&[]).is_empty());
    }

    #[test]
    fn test_random_index_in_range() {
        for _ in 0..100 {
            assert!(random_index(3) < 3);
        }
        assert_eq!(random_index(1), 0);
    }
}
