//! # Reconciler
//!
//! Ties the three cycle stages (fetch, match, dispatch) together and drives them on a fixed interval, forever.
//!
//! The scheduler starts the inter-cycle timer *before* running the cycle, so cycle runtime counts against the
//! interval. A cycle that outruns the interval rolls straight into the next one rather than snapping back to a
//! fixed clock grid. Cycle failures are logged and never fatal. A shutdown signal is honored between cycles only;
//! stopping mid-cycle could leave a payout instruction sent but never persisted.

use std::{fmt::Display, time::Duration};

use log::*;
use tokio::sync::watch;

use crate::{
    config::ReconcilerConfig,
    db_types::MerchantAccount,
    dispatcher::{DispatchReport, PayoutDispatcher},
    errors::{MerchantError, ReconcileError},
    matcher::match_events,
    snapshot::SnapshotFetcher,
    traits::{EventPolicy, MerchantApi, RequestStore},
};

//--------------------------------------     CycleReport     ---------------------------------------------------------

/// What one reconciliation cycle saw and did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub requests: usize,
    pub ledger_records: usize,
    pub payout_candidates: usize,
    pub dispatch: DispatchReport,
}

impl Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requests against {} ledger records; {} payout candidates ({})",
            self.requests, self.ledger_records, self.payout_candidates, self.dispatch
        )
    }
}

//--------------------------------------     Reconciler      ---------------------------------------------------------

/// The settlement reconciliation engine. Owns its capabilities for the lifetime of the process; all per-cycle state
/// lives on the stack of [`Reconciler::run_cycle`].
pub struct Reconciler<S, M, P> {
    store: S,
    merchant: M,
    policy: P,
    accounts: Vec<MerchantAccount>,
    config: ReconcilerConfig,
}

impl<S, M, P> Reconciler<S, M, P>
where
    S: RequestStore,
    M: MerchantApi,
    P: EventPolicy,
{
    pub fn new(store: S, merchant: M, policy: P, accounts: Vec<MerchantAccount>, config: ReconcilerConfig) -> Self {
        Self { store, merchant, policy, accounts, config }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Pings every configured account. Meant as a startup sanity check; the reconciliation loop itself tolerates
    /// unreachable accounts cycle by cycle.
    pub async fn check_connectivity(&self) -> Result<(), MerchantError> {
        for account in &self.accounts {
            self.merchant.ping(account).await?;
            debug!("🔄️ Account '{}' is reachable", account.name);
        }
        Ok(())
    }

    /// Runs one reconciliation cycle: fetch → match → dispatch, strictly in that order. Any fetch failure abandons
    /// the cycle before matching; dispatch failures are per-candidate and reported, not raised.
    pub async fn run_cycle(&self) -> Result<CycleReport, ReconcileError> {
        let fetcher =
            SnapshotFetcher::new(&self.store, &self.merchant, self.config.account_pacing, self.config.call_timeout);
        let snapshot = fetcher.fetch(&self.accounts).await?;
        let candidates = match_events(&snapshot, &self.policy).await;
        let report = CycleReport {
            requests: snapshot.requests().len(),
            ledger_records: snapshot.record_count(),
            payout_candidates: candidates.len(),
            dispatch: DispatchReport::default(),
        };
        let dispatcher = PayoutDispatcher::new(&self.store, &self.merchant, self.config.call_timeout);
        let dispatch = dispatcher.dispatch(candidates, snapshot.accounts()).await;
        Ok(CycleReport { dispatch, ..report })
    }
}

//--------------------------------------   run_reconciler    ---------------------------------------------------------

/// Drives the reconciler forever. Spawn this from the binary; it only returns once `shutdown` flips to `true` (or
/// all senders are dropped), and only between cycles.
pub async fn run_reconciler<S, M, P>(reconciler: Reconciler<S, M, P>, mut shutdown: watch::Receiver<bool>)
where
    S: RequestStore,
    M: MerchantApi,
    P: EventPolicy,
{
    let interval = reconciler.interval();
    info!("🕰️ Settlement reconciliation worker started (interval {interval:?})");
    loop {
        if *shutdown.borrow() {
            break;
        }
        let tick = tokio::time::sleep(interval);
        tokio::pin!(tick);
        match reconciler.run_cycle().await {
            Ok(report) => info!("🕰️ Reconciliation cycle complete: {report}"),
            Err(e) => error!("🕰️ Reconciliation cycle failed: {e}"),
        }
        // Wait out the remainder of the interval, unless shutdown arrives first.
        let stop = loop {
            tokio::select! {
                _ = &mut tick => break false,
                changed = shutdown.changed() => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => break true,
                        // A sleep must not be polled again once it has elapsed.
                        Ok(()) if tick.is_elapsed() => break false,
                        Ok(()) => continue,
                        Err(_) => break true,
                    }
                },
            }
        };
        if stop {
            break;
        }
    }
    info!("🕰️ Settlement reconciliation worker stopped");
}
