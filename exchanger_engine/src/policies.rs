//! Reference [`EventPolicy`] implementation.

use log::*;

use crate::{
    db_types::{ExchangeRequest, HistoryRecord, MerchantAccount},
    errors::StoreError,
    traits::EventPolicy,
};

/// An event policy that records matched pairs in the log and performs no state transitions. Deployments supply
/// their own policy with the real deposit verification rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyPolicy;

impl EventPolicy for LogOnlyPolicy {
    async fn on_deposit(
        &self,
        account: &MerchantAccount,
        record: &HistoryRecord,
        request: &ExchangeRequest,
    ) -> Result<(), StoreError> {
        info!(
            "🔀️ Deposit {} ({} {}) on account '{}' corresponds to request [{}]",
            record.transaction_id, record.amount, record.ticker, account.name, request.id
        );
        Ok(())
    }

    async fn on_withdrawal(
        &self,
        account: &MerchantAccount,
        record: &HistoryRecord,
        request: &ExchangeRequest,
    ) -> Result<(), StoreError> {
        info!(
            "🔀️ Withdrawal {} (status {}) on account '{}' corresponds to request [{}]",
            record.transaction_id, record.status, account.name, request.id
        );
        Ok(())
    }
}
