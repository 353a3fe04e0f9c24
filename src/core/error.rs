//! Error types for talking to the remote cache index
//!
//! None of these escape a picker: every variant is absorbed into the picker's
//! fallback path. They exist so the client can report what went wrong.

#[derive(Debug, thiserror::Error)]
pub enum CacheIndexError {
    #[error("Request to cache index {url} failed: {error}")]
    Network { url: String, error: String },

    #[error("Cache index {url} returned unexpected status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode cache index response from {url}: {error}")]
    Decode { url: String, error: String },

    #[error("Failed to build cache index client: {reason}")]
    ClientBuild { reason: String },
}

pub type CacheIndexResult<T> = Result<T, CacheIndexError>;

impl From<reqwest::Error> for CacheIndexError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_decode() {
            CacheIndexError::Decode {
                url,
                error: err.to_string(),
            }
        } else {
            CacheIndexError::Network {
                url,
                error: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let error = CacheIndexError::Status {
            url: "http://controller:9000/lookup".to_string(),
            status: 503,
        };
        assert_eq!(
            error.to_string(),
            "Cache index http://controller:9000/lookup returned unexpected status 503"
        );
    }

    #[test]
    fn test_decode_display() {
        let error = CacheIndexError::Decode {
            url: "http://controller:9000/query".to_string(),
            error: "expected value at line 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to decode cache index response from http://controller:9000/query: expected value at line 1"
        );
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CacheIndexError>();
    }
}
