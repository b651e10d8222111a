use crate::{
    db_types::{ExchangeRequest, HistoryRecord, MerchantAccount},
    errors::StoreError,
};

/// Deposit and withdrawal handling policies.
///
/// The event matcher pairs ledger records with requests and hands each matched pair to this policy. What the pair
/// means for the request's lifecycle (e.g. advancing a `New` request towards `Paid` once a deposit verifies) is the
/// policy's decision, not the matcher's. A policy error aborts handling of that single pair only.
#[allow(async_fn_in_trait)]
pub trait EventPolicy {
    /// Called for each deposit record whose signature corresponds to `request`.
    async fn on_deposit(
        &self,
        account: &MerchantAccount,
        record: &HistoryRecord,
        request: &ExchangeRequest,
    ) -> Result<(), StoreError>;

    /// Called for each terminal-state withdrawal record whose destination corresponds to `request`.
    async fn on_withdrawal(
        &self,
        account: &MerchantAccount,
        record: &HistoryRecord,
        request: &ExchangeRequest,
    ) -> Result<(), StoreError>;
}
