use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`crate::traits::RequestStore`] implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("The request store is unavailable. {0}")]
    Unavailable(String),
    #[error("The request store query failed. {0}")]
    QueryFailed(String),
    #[error("The request store rejected the update. {0}")]
    UpdateFailed(String),
}

/// Errors returned by [`crate::traits::MerchantApi`] implementations.
#[derive(Debug, Clone, Error)]
pub enum MerchantError {
    #[error("Could not reach the merchant API for account '{0}'. {1}")]
    Unreachable(String, String),
    #[error("The merchant API call failed for account '{0}'. {1}")]
    CallFailed(String, String),
    #[error("No merchant integration is configured for account '{0}'.")]
    NotConfigured(String),
}

/// Errors raised while decoding raw merchant payloads into typed records.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("Malformed transaction history payload. {0}")]
    History(String),
    #[error("Malformed payout response payload. {0}")]
    PayoutResponse(String),
}

/// A cycle-scoped reconciliation failure. Any of these aborts the current cycle before matching begins; the
/// scheduler logs it and carries on with the next tick.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Fetching exchange requests failed. {0}")]
    RequestFetch(#[from] StoreError),
    #[error("Fetching transaction history for account '{account}' failed. {source}")]
    HistoryFetch {
        account: String,
        source: MerchantError,
    },
    #[error("Decoding transaction history for account '{account}' failed. {source}")]
    HistoryDecode {
        account: String,
        source: DecodeError,
    },
    #[error("{operation} did not complete within {timeout:?}.")]
    Timeout { operation: String, timeout: Duration },
}
