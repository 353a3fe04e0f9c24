//! Random picker

use std::sync::Arc;

use async_trait::async_trait;

use super::{random_index, PickRequest, Picker};
use crate::{core::Endpoint, observability::metrics::Metrics};

/// Selects endpoints uniformly at random.
#[derive(Debug, Default)]
pub struct RandomPicker;

impl RandomPicker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Picker for RandomPicker {
    async fn pick(
        &self,
        endpoints: &[Arc<dyn Endpoint>],
        _request: &PickRequest<'_>,
    ) -> Option<usize> {
        if endpoints.is_empty() {
            return None;
        }
        let idx = random_index(endpoints.len());
        Metrics::record_picker_decision(self.name(), endpoints[idx].url());
        Some(idx)
    }

    fn name(&self) -> &'static str {
        "random"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
