use std::fmt;

/// A candidate inference server handed to a picker by the upstream scheduler.
///
/// Pickers never create or mutate endpoints; they only read the identity fields
/// below for the duration of a single pick.
pub trait Endpoint: Send + Sync + fmt::Debug {
    /// Stable name used for deterministic ordering (e.g. `namespace/pod`)
    fn name(&self) -> &str;

    /// Network address the cache index knows this server by (usually the pod IP)
    fn address(&self) -> &str;

    /// Routing identity of the server, recorded in the prefix trie
    fn url(&self) -> &str;

    /// Get endpoint-specific metadata
    fn metadata(&self) -> &EndpointMetadata;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMetadata {
    pub name: String,
    pub address: String,
    pub url: String,
}

/// Plain endpoint backed by owned metadata
#[derive(Debug, Clone)]
pub struct BasicEndpoint {
    metadata: EndpointMetadata,
}

impl BasicEndpoint {
    pub fn new(metadata: EndpointMetadata) -> Self {
        Self { metadata }
    }
}

impl Endpoint for BasicEndpoint {
    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn address(&self) -> &str {
        &self.metadata.address
    }

    fn url(&self) -> &str {
        &self.metadata.url
    }

    fn metadata(&self) -> &EndpointMetadata {
        &self.metadata
    }
}

impl fmt::Display for BasicEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.metadata.name, self.metadata.url)
    }
}

/// Builder for [`BasicEndpoint`].
///
/// Only the URL is required. The address defaults to the URL's host and the
/// name defaults to the URL itself.
#[derive(Debug, Clone)]
pub struct BasicEndpointBuilder {
    url: String,
    name: Option<String>,
    address: Option<String>,
}

impl BasicEndpointBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            address: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn build(self) -> BasicEndpoint {
        let address = self.address.unwrap_or_else(|| host_of(&self.url).to_string());
        let name = self.name.unwrap_or_else(|| self.url.clone());
        BasicEndpoint::new(EndpointMetadata {
            name,
            address,
            url: self.url,
        })
    }
}

/// Host part of a URL such as `http://10.0.0.1:8000/v1`
fn host_of(url: &str) -> &str {
    let rest = url
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    let authority = rest.split('/').next().unwrap_or(rest);

    // Bracketed IPv6 literal
    if let Some(stripped) = authority.strip_prefix('[') {
        return stripped.split(']').next().unwrap_or(stripped);
    }

    authority.split(':').next().unwrap_or(authority)
}
