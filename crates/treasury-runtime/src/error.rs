//! Transport Error Types

use thiserror::Error;
use treasury_core::TreasuryError;

/// Failures talking to an upstream market data API
#[derive(Error, Debug)]
pub enum FeedError {
    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response decoded but is missing what we asked for
    #[error("Unexpected payload: {0}")]
    Payload(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            FeedError::Network(_) => true,
            FeedError::Payload(_) | FeedError::Config(_) => false,
        }
    }
}

impl From<FeedError> for TreasuryError {
    fn from(err: FeedError) -> Self {
        TreasuryError::ProviderUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_provider_unavailable() {
        let err: TreasuryError = FeedError::Payload("no rates".into()).into();
        assert!(matches!(err, TreasuryError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = FeedError::Status {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            url: "https://api.coingecko.com/api/v3/simple/price".into(),
        };
        assert!(err.is_retryable());

        let err = FeedError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            url: "https://api.coingecko.com/api/v3/simple/price".into(),
        };
        assert!(!err.is_retryable());
    }
}
