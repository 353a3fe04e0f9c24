//! Core types shared by all pickers

mod endpoint;
mod error;

pub use endpoint::{BasicEndpoint, BasicEndpointBuilder, Endpoint, EndpointMetadata};
pub use error::{CacheIndexError, CacheIndexResult};
