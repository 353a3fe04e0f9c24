// Shared helpers for integration tests
#![allow(dead_code)]

pub mod mock_cache_index;

use std::sync::Arc;

use sgl_picker::core::{BasicEndpointBuilder, Endpoint};

/// Endpoints `default/vllm-<i>` at `http://10.0.0.<i>:8000`, created in the given order
pub fn pod_endpoints(ids: &[u8]) -> Vec<Arc<dyn Endpoint>> {
    ids.iter()
        .map(|i| {
            Arc::new(
                BasicEndpointBuilder::new(format!("http://10.0.0.{}:8000", i))
                    .name(format!("default/vllm-{}", i))
                    .build(),
            ) as Arc<dyn Endpoint>
        })
        .collect()
}
