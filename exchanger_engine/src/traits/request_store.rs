use crate::{
    db_types::{ExchangeRequest, RequestStatus},
    errors::StoreError,
};

/// The persistence layer owning exchange requests.
#[allow(async_fn_in_trait)]
pub trait RequestStore {
    /// Fetches every request whose status is one of `statuses`.
    async fn fetch_requests_by_status(
        &self,
        statuses: &[RequestStatus],
    ) -> Result<Vec<ExchangeRequest>, StoreError>;

    /// Persists the request's status and updated-timestamp. No other field is written back by the reconciliation
    /// loop.
    async fn update_request(&self, request: &ExchangeRequest) -> Result<(), StoreError>;
}
