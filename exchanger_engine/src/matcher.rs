//! # Event matcher
//!
//! The second stage of a reconciliation cycle. It cross-references every ledger record in the snapshot against
//! every actionable request, hands matched deposit/withdrawal pairs to the [`EventPolicy`], and collects the set of
//! requests eligible for an automatic payout.
//!
//! Absence of a match is expected and common; it is never an error.

use std::collections::HashSet;

use log::*;

use crate::{
    db_types::{ExchangeRequest, MerchantSnapshot, RecordMethod, RequestId, RequestStatus},
    traits::EventPolicy,
};

//-------------------------------------- PayoutCandidates    ---------------------------------------------------------

/// The requests eligible for an automatic payout attempt this cycle. Keyed by request id, so insertion is
/// idempotent: a request referenced by any number of ledger records, across any number of accounts, appears at most
/// once. Preserves first-seen order.
#[derive(Debug, Default)]
pub struct PayoutCandidates {
    ids: HashSet<RequestId>,
    requests: Vec<ExchangeRequest>,
}

impl PayoutCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cycle-scoped copy of the request. Returns false if the request was already present.
    pub fn insert(&mut self, request: &ExchangeRequest) -> bool {
        if !self.ids.insert(request.id) {
            return false;
        }
        self.requests.push(request.clone());
        true
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRequest> {
        self.requests.iter()
    }
}

impl IntoIterator for PayoutCandidates {
    type IntoIter = std::vec::IntoIter<ExchangeRequest>;
    type Item = ExchangeRequest;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}

//--------------------------------------    match_events     ---------------------------------------------------------

/// Classifies every (account, record, request) combination in the snapshot.
///
/// * `Paid` requests join the payout candidate set, at most once each.
/// * `New` requests are matched against the record: deposits go to the deposit policy when the amount/ticker
///   signature corresponds, withdrawals go to the withdrawal policy only once the merchant reports a terminal
///   status code.
/// * Requests already `AwaitingConfirmation` (or later) receive no classification side effects.
pub async fn match_events<P: EventPolicy>(snapshot: &MerchantSnapshot, policy: &P) -> PayoutCandidates {
    let mut candidates = PayoutCandidates::new();
    for (account, history) in snapshot.ledgers() {
        for record in &history.records {
            for request in snapshot.requests() {
                match request.status {
                    RequestStatus::Paid => {
                        if candidates.insert(request) {
                            debug!(
                                "🔀️ Request [{}] is awaiting automatic payout ({} {})",
                                request.id, request.expected_amount, request.exchange_to
                            );
                        }
                    },
                    RequestStatus::New => match record.method {
                        RecordMethod::Deposit => {
                            if record.matches_deposit_for(request) {
                                debug!(
                                    "🔀️ Deposit {} on '{}' corresponds to request [{}]",
                                    record.transaction_id, account.name, request.id
                                );
                                if let Err(e) = policy.on_deposit(account, record, request).await {
                                    warn!(
                                        "🔀️ Deposit handling for request [{}] failed: {e}",
                                        request.id
                                    );
                                }
                            }
                        },
                        RecordMethod::Withdrawal => {
                            if record.has_terminal_status() && record.matches_withdrawal_for(request) {
                                debug!(
                                    "🔀️ Withdrawal {} on '{}' corresponds to request [{}]",
                                    record.transaction_id, account.name, request.id
                                );
                                if let Err(e) = policy.on_withdrawal(account, record, request).await {
                                    warn!(
                                        "🔀️ Withdrawal handling for request [{}] failed: {e}",
                                        request.id
                                    );
                                }
                            }
                        },
                        RecordMethod::Other => {},
                    },
                    // AwaitingConfirmation, Completed and Cancelled requests get no side effects from ledger
                    // records.
                    _ => {},
                }
            }
        }
    }
    candidates
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use exchanger_common::Amount;

    use super::*;
    use crate::db_types::{AccountHistory, AccountKind, HistoryRecord, MerchantAccount};

    fn request(id: i64, status: RequestStatus) -> ExchangeRequest {
        ExchangeRequest {
            id: RequestId(id),
            status,
            exchange_to: "USDT".into(),
            expected_amount: Amount::new(100.0),
            client_address: format!("T{id:03}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn candidate_insertion_is_idempotent() {
        let mut candidates = PayoutCandidates::new();
        let r1 = request(1, RequestStatus::Paid);
        let r2 = request(2, RequestStatus::Paid);
        assert!(candidates.insert(&r1));
        assert!(!candidates.insert(&r1));
        assert!(candidates.insert(&r2));
        assert!(!candidates.insert(&r1));
        assert_eq!(candidates.len(), 2);
        assert!(candidates.contains(RequestId(1)));
        assert!(candidates.contains(RequestId(2)));
        // First-seen order is preserved.
        let ids: Vec<i64> = candidates.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    fn account(name: &str) -> MerchantAccount {
        MerchantAccount::new(name, AccountKind::Whitebit, "key", "secret")
    }

    fn deposit(amount: f64, ticker: &str) -> HistoryRecord {
        HistoryRecord {
            method: RecordMethod::Deposit,
            status: 3,
            amount: Amount::new(amount),
            ticker: ticker.into(),
            address: "T999".to_string(),
            transaction_id: "tx-dep".to_string(),
        }
    }

    struct CountingPolicy {
        deposits: std::sync::Mutex<Vec<RequestId>>,
        withdrawals: std::sync::Mutex<Vec<RequestId>>,
    }

    impl CountingPolicy {
        fn new() -> Self {
            Self { deposits: Default::default(), withdrawals: Default::default() }
        }
    }

    impl EventPolicy for CountingPolicy {
        async fn on_deposit(
            &self,
            _account: &MerchantAccount,
            _record: &HistoryRecord,
            request: &ExchangeRequest,
        ) -> Result<(), crate::errors::StoreError> {
            self.deposits.lock().unwrap().push(request.id);
            Ok(())
        }

        async fn on_withdrawal(
            &self,
            _account: &MerchantAccount,
            _record: &HistoryRecord,
            request: &ExchangeRequest,
        ) -> Result<(), crate::errors::StoreError> {
            self.withdrawals.lock().unwrap().push(request.id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn paid_request_appears_once_across_many_records_and_accounts() {
        let records = AccountHistory { records: vec![deposit(1.0, "BTC"), deposit(2.0, "BTC")] };
        let snapshot = MerchantSnapshot::new(
            vec![account("wb-1"), account("wb-2")],
            vec![records.clone(), records],
            vec![request(7, RequestStatus::Paid)],
        );
        let policy = CountingPolicy::new();
        let candidates = match_events(&snapshot, &policy).await;
        assert_eq!(candidates.len(), 1);
        assert!(candidates.contains(RequestId(7)));
    }

    #[tokio::test]
    async fn paid_requests_without_ledger_records_are_not_candidates() {
        // Candidate discovery is driven by ledger records; an empty sweep yields no payouts this cycle.
        let snapshot = MerchantSnapshot::new(
            vec![account("wb-1")],
            vec![AccountHistory::default()],
            vec![request(7, RequestStatus::Paid)],
        );
        let policy = CountingPolicy::new();
        let candidates = match_events(&snapshot, &policy).await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn deposits_only_reach_the_policy_for_corresponding_new_requests() {
        let history = AccountHistory {
            records: vec![
                deposit(100.0, "USDT"), // matches request 1
                deposit(42.0, "USDT"),  // matches nothing
            ],
        };
        let snapshot = MerchantSnapshot::new(
            vec![account("wb-1")],
            vec![history],
            vec![request(1, RequestStatus::New), request(2, RequestStatus::AwaitingConfirmation)],
        );
        let policy = CountingPolicy::new();
        let candidates = match_events(&snapshot, &policy).await;
        assert!(candidates.is_empty());
        assert_eq!(*policy.deposits.lock().unwrap(), vec![RequestId(1)]);
        assert!(policy.withdrawals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_terminal_withdrawals_never_trigger_withdrawal_handling() {
        let mut pending = HistoryRecord {
            method: RecordMethod::Withdrawal,
            status: 1,
            amount: Amount::new(100.0),
            ticker: "USDT".into(),
            address: "T001".to_string(),
            transaction_id: "tx-wd".to_string(),
        };
        let snapshot = MerchantSnapshot::new(
            vec![account("wb-1")],
            vec![AccountHistory { records: vec![pending.clone()] }],
            vec![request(1, RequestStatus::New)],
        );
        let policy = CountingPolicy::new();
        match_events(&snapshot, &policy).await;
        assert!(policy.withdrawals.lock().unwrap().is_empty());

        pending.status = 7;
        let snapshot = MerchantSnapshot::new(
            vec![account("wb-1")],
            vec![AccountHistory { records: vec![pending] }],
            vec![request(1, RequestStatus::New)],
        );
        match_events(&snapshot, &policy).await;
        assert_eq!(*policy.withdrawals.lock().unwrap(), vec![RequestId(1)]);
    }

    #[tokio::test]
    async fn awaiting_confirmation_requests_get_no_side_effects() {
        let history = AccountHistory { records: vec![deposit(100.0, "USDT")] };
        let snapshot = MerchantSnapshot::new(
            vec![account("wb-1")],
            vec![history],
            vec![request(1, RequestStatus::AwaitingConfirmation), request(2, RequestStatus::Completed)],
        );
        let policy = CountingPolicy::new();
        let candidates = match_events(&snapshot, &policy).await;
        assert!(candidates.is_empty());
        assert!(policy.deposits.lock().unwrap().is_empty());
        assert!(policy.withdrawals.lock().unwrap().is_empty());
    }
}
