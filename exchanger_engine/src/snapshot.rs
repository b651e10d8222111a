//! # Snapshot fetcher
//!
//! The first stage of a reconciliation cycle. It pulls the two inputs the matcher needs, the actionable exchange
//! requests and every account's transaction history, concurrently, and joins them into a cycle-local
//! [`MerchantSnapshot`].
//!
//! Both legs always run to completion before the cycle proceeds; if either one fails, the whole cycle is abandoned
//! for this tick. A partial snapshot is never analyzed, because stale or missing request data could cause
//! false-negative matches or erroneous payouts.

use std::time::Duration;

use log::*;
use tokio::time::timeout;

use crate::{
    codec::decode_history,
    db_types::{AccountHistory, ExchangeRequest, MerchantAccount, MerchantSnapshot, ACTIONABLE_STATUSES},
    errors::ReconcileError,
    traits::{MerchantApi, RequestStore},
};

//--------------------------------------    PacingPolicy     ---------------------------------------------------------

/// How the history sweep spaces out successive account calls to respect merchant rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingPolicy {
    /// No artificial delay between account calls.
    None,
    /// A fixed pause before each account call.
    FixedDelay(Duration),
}

impl PacingPolicy {
    pub async fn pause(&self) {
        match self {
            PacingPolicy::None => {},
            PacingPolicy::FixedDelay(delay) => tokio::time::sleep(*delay).await,
        }
    }
}

//--------------------------------------  SnapshotFetcher    ---------------------------------------------------------

pub struct SnapshotFetcher<'a, S, M> {
    store: &'a S,
    merchant: &'a M,
    pacing: PacingPolicy,
    call_timeout: Duration,
}

impl<'a, S, M> SnapshotFetcher<'a, S, M>
where
    S: RequestStore,
    M: MerchantApi,
{
    pub fn new(store: &'a S, merchant: &'a M, pacing: PacingPolicy, call_timeout: Duration) -> Self {
        Self { store, merchant, pacing, call_timeout }
    }

    /// Runs both fetch legs concurrently and joins them into a snapshot. The request query and the history sweep
    /// are independent: a failure on one side does not cancel the other, but either failure aborts the cycle
    /// before matching.
    pub async fn fetch(&self, accounts: &[MerchantAccount]) -> Result<MerchantSnapshot, ReconcileError> {
        let (requests, histories) =
            tokio::join!(self.fetch_actionable_requests(), self.fetch_all_histories(accounts));
        let requests = requests?;
        let histories = histories?;
        debug!(
            "📷️ Snapshot ready: {} accounts, {} ledger records, {} actionable requests",
            accounts.len(),
            histories.iter().map(|h| h.records.len()).sum::<usize>(),
            requests.len()
        );
        Ok(MerchantSnapshot::new(accounts.to_vec(), histories, requests))
    }

    async fn fetch_actionable_requests(&self) -> Result<Vec<ExchangeRequest>, ReconcileError> {
        let result = timeout(self.call_timeout, self.store.fetch_requests_by_status(&ACTIONABLE_STATUSES))
            .await
            .map_err(|_| ReconcileError::Timeout {
                operation: "Exchange request fetch".to_string(),
                timeout: self.call_timeout,
            })?;
        Ok(result?)
    }

    /// Sweeps every account's ledger, in roster order, pacing the calls per the configured policy.
    async fn fetch_all_histories(
        &self,
        accounts: &[MerchantAccount],
    ) -> Result<Vec<AccountHistory>, ReconcileError> {
        let mut histories = Vec::with_capacity(accounts.len());
        for account in accounts {
            self.pacing.pause().await;
            histories.push(self.fetch_history(account).await?);
        }
        Ok(histories)
    }

    async fn fetch_history(&self, account: &MerchantAccount) -> Result<AccountHistory, ReconcileError> {
        trace!("📷️ Fetching transaction history for account '{}'", account.name);
        let raw = timeout(self.call_timeout, self.merchant.fetch_history(account))
            .await
            .map_err(|_| ReconcileError::Timeout {
                operation: format!("History fetch for account '{}'", account.name),
                timeout: self.call_timeout,
            })?
            .map_err(|source| ReconcileError::HistoryFetch { account: account.name.clone(), source })?;
        decode_history(&raw)
            .map_err(|source| ReconcileError::HistoryDecode { account: account.name.clone(), source })
    }
}
