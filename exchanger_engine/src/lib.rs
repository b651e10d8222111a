//! # Exchanger settlement reconciliation engine
//!
//! The engine behind the unattended exchange service: it periodically reconciles externally observed merchant
//! transaction history against internally tracked exchange requests, classifies ledger events, and triggers
//! automatic payouts while updating request state.
//!
//! One reconciliation cycle runs three stages in order:
//! 1. **Snapshot** ([`snapshot`]): concurrently pull the actionable requests and every account's transaction
//!    history. Either failure abandons the cycle; a partial snapshot is never analyzed.
//! 2. **Match** ([`matcher`]): cross-reference every ledger record against every request, route matched
//!    deposit/withdrawal pairs to the [`traits::EventPolicy`], and build the deduplicated payout candidate set.
//! 3. **Dispatch** ([`dispatcher`]): issue one payout instruction per candidate, keyed by the request id so the
//!    merchant can deduplicate retries, and transition accepted requests to `AwaitingConfirmation`.
//!
//! The [`reconciler`] module drives the stages on a fixed interval, forever, tolerating per-cycle failures. The
//! engine's only externally observable effects are the status changes it writes back through the
//! [`traits::RequestStore`] capability and the log records it emits.
//!
//! The external collaborators (the request store and the merchant wire clients) are injected behind the traits in
//! [`traits`]; this crate ships in-memory reference implementations ([`stores`], [`merchants`], [`policies`]) for
//! local runs and tests.
pub mod codec;
pub mod config;
pub mod db_types;
pub mod dispatcher;
pub mod errors;
pub mod matcher;
pub mod merchants;
pub mod policies;
pub mod reconciler;
pub mod snapshot;
pub mod stores;
pub mod traits;

#[cfg(test)]
mod test;

pub use codec::PayoutOutcome;
pub use config::ReconcilerConfig;
pub use dispatcher::DispatchReport;
pub use errors::{DecodeError, MerchantError, ReconcileError, StoreError};
pub use matcher::PayoutCandidates;
pub use reconciler::{run_reconciler, CycleReport, Reconciler};
pub use snapshot::PacingPolicy;
