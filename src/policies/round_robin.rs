//! Round-robin picking over a name-sorted candidate list

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use tracing::debug;

use super::{sorted_indices, PickRequest, Picker};
use crate::{core::Endpoint, observability::metrics::Metrics};

/// Process-wide round-robin position.
///
/// Candidates are sorted by name before indexing, so two pickers (or one picker
/// across restarts) given the same set in any order land on the same endpoint
/// for the same cursor value.
#[derive(Debug, Default)]
pub struct RoundRobinCursor {
    counter: AtomicUsize,
}

impl RoundRobinCursor {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(position: usize) -> Self {
        Self {
            counter: AtomicUsize::new(position),
        }
    }

    /// Current value without advancing
    pub fn position(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }

    /// Advance the cursor and return the value it held
    pub fn advance(&self) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Select the next endpoint in name order. Returns its index in `endpoints`.
    pub fn select(&self, endpoints: &[Arc<dyn Endpoint>]) -> Option<usize> {
        if endpoints.is_empty() {
            return None;
        }
        let order = sorted_indices(endpoints);
        let count = self.advance();
        Some(order[count % order.len()])
    }

    pub fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
    }
}

/// Round-robin selection picker
#[derive(Debug, Default)]
pub struct RoundRobinPicker {
    cursor: Arc<RoundRobinCursor>,
}

impl RoundRobinPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(cursor: Arc<RoundRobinCursor>) -> Self {
        Self { cursor }
    }
}

#[async_trait]
impl Picker for RoundRobinPicker {
    async fn pick(
        &self,
        endpoints: &[Arc<dyn Endpoint>],
        _request: &PickRequest<'_>,
    ) -> Option<usize> {
        let idx = self.cursor.select(endpoints)?;
        debug!("Round robin picked {}", endpoints[idx].name());
        Metrics::record_picker_decision(self.name(), endpoints[idx].url());
        Some(idx)
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn reset(&self) {
        self.cursor.reset();
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
