//! Error Types for Treasury Valuation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreasuryError>;

#[derive(Error, Debug)]
pub enum TreasuryError {
    /// Non-positive price or rate, negative holdings, unknown currency
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Holdings or price source failed; the caller decides whether to retry
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TreasuryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        TreasuryError::InvalidInput(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        TreasuryError::ProviderUnavailable(msg.into())
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, TreasuryError::ProviderUnavailable(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            TreasuryError::InvalidInput(msg) => format!("Invalid input: {}", msg),
            TreasuryError::ProviderUnavailable(_) => {
                "Market data is currently unavailable. Please try again later.".into()
            }
            TreasuryError::Serialization(_) => "Received malformed market data.".into(),
        }
    }
}
