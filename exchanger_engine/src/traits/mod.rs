//! # Capability interfaces
//!
//! The reconciliation loop never talks to the outside world directly. Its two external collaborators sit behind the
//! traits in this module and are resolved once at startup, then injected into the loop by generic parameter:
//!
//! * [`RequestStore`] is the persistence layer owning exchange requests. The loop reads actionable requests and
//!   writes back status changes, nothing else.
//! * [`MerchantApi`] is the merchant capability for a custodial account: fetch a transaction history, issue a payout,
//!   ping. Implementations own the wire protocol; the loop only sees raw response bytes and decodes them itself.
//! * [`EventPolicy`] holds the deposit/withdrawal handling policies the event matcher invokes on matched (record,
//!   request) pairs. Status-transition detail for observed deposits and withdrawals lives behind this trait.
mod event_policy;
mod merchant_api;
mod request_store;

pub use event_policy::EventPolicy;
pub use merchant_api::MerchantApi;
pub use request_store::RequestStore;
