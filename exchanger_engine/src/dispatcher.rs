//! # Payout dispatcher
//!
//! The final stage of a reconciliation cycle. Candidates are processed strictly sequentially: payout dispatch
//! mutates request state and calls an external system with side effects, so serializing it avoids duplicate
//! submission without needing a lock.
//!
//! Account selection is roster order. A transport error or timeout falls through to the next account; any decodable
//! response, acceptance or rejection, is the merchant's answer and ends the candidate's attempt for this cycle.
//! A request therefore never receives more than one payout instruction within a single cycle.

use std::{collections::HashSet, fmt::Display, time::Duration};

use log::*;
use tokio::time::timeout;

use crate::{
    codec::{decode_payout_response, PayoutOutcome},
    db_types::{ExchangeRequest, MerchantAccount, PayoutInstruction, RequestId},
    matcher::PayoutCandidates,
    traits::{MerchantApi, RequestStore},
};

//--------------------------------------   DispatchReport    ---------------------------------------------------------

/// Per-cycle payout accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Payouts the merchant accepted.
    pub accepted: usize,
    /// Payouts the merchant rejected; the requests stay `Paid` and retry next cycle.
    pub rejected: usize,
    /// Candidates for which no account produced a usable response.
    pub unreachable: usize,
    /// Accepted payouts whose status change failed to persist. Each of these can cause a re-dispatch next cycle;
    /// the merchant-side idempotency key is the deduplication safety net.
    pub persist_failures: usize,
}

impl Display for DispatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} accepted, {} rejected, {} unreachable, {} persistence failures",
            self.accepted, self.rejected, self.unreachable, self.persist_failures
        )
    }
}

//--------------------------------------  PayoutDispatcher   ---------------------------------------------------------

pub struct PayoutDispatcher<'a, S, M> {
    store: &'a S,
    merchant: &'a M,
    call_timeout: Duration,
}

enum Attempt {
    Accepted,
    Rejected,
    NoAnswer,
}

impl<'a, S, M> PayoutDispatcher<'a, S, M>
where
    S: RequestStore,
    M: MerchantApi,
{
    pub fn new(store: &'a S, merchant: &'a M, call_timeout: Duration) -> Self {
        Self { store, merchant, call_timeout }
    }

    /// Issues a payout instruction for every candidate and transitions accepted requests to
    /// `AwaitingConfirmation`. Per-candidate failures are logged and never abort the cycle.
    pub async fn dispatch(
        &self,
        candidates: PayoutCandidates,
        accounts: &[MerchantAccount],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        // The candidate set is already deduplicated; this guard keeps the one-instruction-per-request invariant
        // local to the dispatcher as well.
        let mut dispatched: HashSet<RequestId> = HashSet::new();
        for mut request in candidates {
            if !dispatched.insert(request.id) {
                continue;
            }
            match self.dispatch_one(&mut request, accounts).await {
                Attempt::Accepted => {
                    report.accepted += 1;
                    if let Err(e) = self.store.update_request(&request).await {
                        // The merchant already holds the instruction, so the in-memory transition stands for the
                        // rest of this cycle. Next cycle the request is re-fetched as Paid and may be
                        // re-dispatched; the idempotency key lets the merchant deduplicate that.
                        report.persist_failures += 1;
                        error!(
                            "💰️ Payout for request [{}] was accepted but the status change failed to persist: \
                             {e}. The request may be re-dispatched next cycle.",
                            request.id
                        );
                    }
                },
                Attempt::Rejected => report.rejected += 1,
                Attempt::NoAnswer => report.unreachable += 1,
            }
        }
        report
    }

    /// Tries each account in roster order until one produces a decodable response. Mutates `request` to
    /// `AwaitingConfirmation` on acceptance.
    async fn dispatch_one(&self, request: &mut ExchangeRequest, accounts: &[MerchantAccount]) -> Attempt {
        for account in accounts {
            let instruction = PayoutInstruction::for_request(request, account);
            debug!(
                "💰️ Sending payout for request [{}] via account '{}': {} {} to {}",
                request.id, account.name, instruction.amount, instruction.ticker, instruction.address
            );
            let raw = match timeout(self.call_timeout, self.merchant.payout(account, &instruction)).await {
                Err(_) => {
                    warn!(
                        "💰️ Payout call for request [{}] via '{}' timed out after {:?}",
                        request.id, account.name, self.call_timeout
                    );
                    continue;
                },
                Ok(Err(e)) => {
                    warn!("💰️ Payout call for request [{}] via '{}' failed: {e}", request.id, account.name);
                    continue;
                },
                Ok(Ok(raw)) => raw,
            };
            match decode_payout_response(&raw) {
                Err(e) => {
                    // The merchant answered with something we cannot interpret. Treat it as an answer: retrying
                    // against another account risks a double payout.
                    error!("💰️ Undecodable payout response for request [{}] via '{}': {e}", request.id, account.name);
                    return Attempt::NoAnswer;
                },
                Ok(PayoutOutcome::Rejected { code, errors }) => {
                    info!(
                        "💰️ Merchant '{}' rejected the payout for request [{}] (code {:?}): {errors}",
                        account.name, request.id, code
                    );
                    return Attempt::Rejected;
                },
                Ok(PayoutOutcome::Accepted) => {
                    request.mark_awaiting_confirmation();
                    info!(
                        "💰️ Payout for request [{}] accepted by '{}'; request is awaiting confirmation",
                        request.id, account.name
                    );
                    return Attempt::Accepted;
                },
            }
        }
        warn!("💰️ No account could take the payout for request [{}]; it stays Paid for the next cycle", request.id);
        Attempt::NoAnswer
    }
}
