//! Endpoint pickers for KV-cache-aware LLM request routing.
//!
//! A picker receives the candidate endpoints already scored by an upstream
//! scheduler plus the request's model and prompt, and returns the endpoint most
//! likely to hold a reusable KV cache for that prompt.
//!
//! Two cache-aware pickers are provided:
//! - [`policies::KvAwarePicker`] asks a remote cache index which instance holds the
//!   longest matching prefix and falls back to round robin.
//! - [`policies::PrefixMatchPicker`] keeps its own hash-chunk trie of past routing
//!   decisions and falls back to a uniform random choice.

pub mod cache_index;
pub mod config;
pub mod core;
pub mod observability;
pub mod policies;
pub mod protocols;
