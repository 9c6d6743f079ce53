use thiserror::Error;

/// Cooldown the ledger enforces between accepted mutations on one account,
/// used when a 429 arrives without a usable Retry-After header.
pub const DEFAULT_COOLDOWN_SECS: u64 = 5;

#[derive(Debug, Error, Clone)]
pub enum LedgerError {
    #[error("account not found")]
    NotFound,

    #[error("ledger rate limit hit, retry in ~{retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("ledger request failed: {0}")]
    Remote(String),
}

impl LedgerError {
    /// True when the failure is the per-account cooldown rather than an
    /// outage or a bad request.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LedgerError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = LedgerError::RateLimited {
            retry_after_secs: 5,
        };
        assert_eq!(err.to_string(), "ledger rate limit hit, retry in ~5s");
        assert!(err.is_rate_limited());
        assert!(!LedgerError::NotFound.is_rate_limited());
    }
}
