use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use exchanger_common::{Amount, Secret, Ticker};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------    RequestStatus    ---------------------------------------------------------

/// The lifecycle state of an exchange request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// The request has been created; no matching deposit has been observed yet.
    New,
    /// A matching deposit has been confirmed and the request is waiting for its automatic payout.
    Paid,
    /// A payout instruction has been accepted by the merchant; the exchange is waiting for on-chain confirmation.
    AwaitingConfirmation,
    /// The payout has been confirmed and the exchange is settled.
    Completed,
    /// The request has been cancelled by the user or an admin.
    Cancelled,
}

/// The statuses the reconciliation loop acts on. Requests in any other state are invisible to the loop.
pub const ACTIONABLE_STATUSES: [RequestStatus; 3] =
    [RequestStatus::New, RequestStatus::Paid, RequestStatus::AwaitingConfirmation];

impl Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::New => write!(f, "New"),
            RequestStatus::Paid => write!(f, "Paid"),
            RequestStatus::AwaitingConfirmation => write!(f, "AwaitingConfirmation"),
            RequestStatus::Completed => write!(f, "Completed"),
            RequestStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid request status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for RequestStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Paid" => Ok(Self::Paid),
            "AwaitingConfirmation" => Ok(Self::AwaitingConfirmation),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------      RequestId      ---------------------------------------------------------

/// The unique identifier of an exchange request. Doubles as the idempotency key on payout instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub i64);

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

//--------------------------------------   ExchangeRequest   ---------------------------------------------------------

/// A user's exchange order, as tracked by the request store.
///
/// The reconciliation loop holds a transient, cycle-scoped copy and only ever writes back a status change (plus the
/// updated timestamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub id: RequestId,
    pub status: RequestStatus,
    /// The currency the user receives.
    pub exchange_to: Ticker,
    /// The payout amount owed to the user.
    pub expected_amount: Amount,
    /// The user's destination address for the payout.
    pub client_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRequest {
    /// Marks the request as dispatched. Only the payout dispatcher performs this transition, and only on a
    /// successful payout call in the current cycle.
    pub fn mark_awaiting_confirmation(&mut self) {
        self.status = RequestStatus::AwaitingConfirmation;
        self.updated_at = Utc::now();
    }
}

//--------------------------------------     RecordMethod    ---------------------------------------------------------

/// The classification of one ledger line. Merchant ledgers encode this as a numeric code: 1 for deposits, 2 for
/// withdrawals; every other code is irrelevant to settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RecordMethod {
    Deposit,
    Withdrawal,
    Other,
}

impl From<i64> for RecordMethod {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::Deposit,
            2 => Self::Withdrawal,
            _ => Self::Other,
        }
    }
}

impl From<RecordMethod> for i64 {
    fn from(method: RecordMethod) -> Self {
        match method {
            RecordMethod::Deposit => 1,
            RecordMethod::Withdrawal => 2,
            RecordMethod::Other => 0,
        }
    }
}

//--------------------------------------    HistoryRecord    ---------------------------------------------------------

/// Withdrawal status codes that mark the transaction as settled on the merchant side (completed or failed).
const TERMINAL_WITHDRAWAL_STATUSES: [i64; 2] = [3, 7];

/// One transaction line from a merchant account's ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub method: RecordMethod,
    /// Merchant-specific status code for the transaction.
    pub status: i64,
    pub amount: Amount,
    pub ticker: Ticker,
    /// Counterparty address: the sender for deposits, the destination for withdrawals.
    pub address: String,
    /// Merchant-assigned transaction identifier.
    pub transaction_id: String,
}

impl HistoryRecord {
    /// Whether this withdrawal has reached a terminal state. Non-terminal withdrawals never trigger withdrawal
    /// handling.
    pub fn has_terminal_status(&self) -> bool {
        TERMINAL_WITHDRAWAL_STATUSES.contains(&self.status)
    }

    /// Whether this deposit's amount/ticker signature corresponds to the given request.
    pub fn matches_deposit_for(&self, request: &ExchangeRequest) -> bool {
        self.amount.matches(request.expected_amount) && self.ticker == request.exchange_to
    }

    /// Whether this withdrawal's destination corresponds to the given request.
    pub fn matches_withdrawal_for(&self, request: &ExchangeRequest) -> bool {
        self.address == request.client_address
    }
}

//--------------------------------------    AccountHistory   ---------------------------------------------------------

/// One merchant account's decoded ledger for the current cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountHistory {
    #[serde(default)]
    pub records: Vec<HistoryRecord>,
}

//--------------------------------------    AccountKind      ---------------------------------------------------------

/// The merchant behind an account. The kind fixes wire details such as the payout transport network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Whitebit,
}

impl AccountKind {
    /// The transport network hint attached to payout instructions for this merchant.
    pub fn network(&self) -> &'static str {
        match self {
            AccountKind::Whitebit => "TRC20",
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountKind::Whitebit => write!(f, "Whitebit"),
        }
    }
}

//--------------------------------------   MerchantAccount   ---------------------------------------------------------

/// Identity and credentials for one custodial account at one merchant. Immutable within a cycle; sourced fresh from
/// configuration each cycle.
#[derive(Debug, Clone)]
pub struct MerchantAccount {
    pub name: String,
    pub kind: AccountKind,
    pub api_key: Secret<String>,
    pub api_secret: Secret<String>,
}

impl MerchantAccount {
    pub fn new<S: Into<String>>(name: S, kind: AccountKind, api_key: &str, api_secret: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            api_key: Secret::new(api_key.to_string()),
            api_secret: Secret::new(api_secret.to_string()),
        }
    }

    pub fn network(&self) -> &'static str {
        self.kind.network()
    }
}

//--------------------------------------  MerchantSnapshot   ---------------------------------------------------------

/// Everything one reconciliation cycle operates on: the account roster, the per-account ledgers and the actionable
/// requests. Cycle-local by construction; it is dropped at the end of the cycle and never cached.
#[derive(Debug, Clone)]
pub struct MerchantSnapshot {
    accounts: Vec<MerchantAccount>,
    histories: Vec<AccountHistory>,
    requests: Vec<ExchangeRequest>,
}

impl MerchantSnapshot {
    /// `histories` must be in roster order, one entry per account.
    pub fn new(
        accounts: Vec<MerchantAccount>,
        histories: Vec<AccountHistory>,
        requests: Vec<ExchangeRequest>,
    ) -> Self {
        debug_assert_eq!(accounts.len(), histories.len());
        Self { accounts, histories, requests }
    }

    pub fn accounts(&self) -> &[MerchantAccount] {
        &self.accounts
    }

    pub fn requests(&self) -> &[ExchangeRequest] {
        &self.requests
    }

    /// Iterates (account, ledger) pairs in roster order.
    pub fn ledgers(&self) -> impl Iterator<Item = (&MerchantAccount, &AccountHistory)> {
        self.accounts.iter().zip(self.histories.iter())
    }

    pub fn record_count(&self) -> usize {
        self.histories.iter().map(|h| h.records.len()).sum()
    }
}

//-------------------------------------- PayoutInstruction   ---------------------------------------------------------

/// A payout order as submitted to the merchant. `unique_id` carries the request id so that a retried submission is
/// identifiable by the merchant as the same instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutInstruction {
    pub ticker: Ticker,
    pub amount: String,
    pub address: String,
    pub unique_id: String,
    pub network: String,
}

impl PayoutInstruction {
    pub fn for_request(request: &ExchangeRequest, account: &MerchantAccount) -> Self {
        Self {
            ticker: request.exchange_to.clone(),
            amount: request.expected_amount.to_payout_string(),
            address: request.client_address.clone(),
            unique_id: request.id.to_string(),
            network: account.network().to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use exchanger_common::Amount;

    use super::*;

    fn request(id: i64, status: RequestStatus) -> ExchangeRequest {
        ExchangeRequest {
            id: RequestId(id),
            status,
            exchange_to: "USDT".into(),
            expected_amount: Amount::new(100.0),
            client_address: "T111aaa".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn method_codes_decode_like_the_merchant_ledger() {
        assert_eq!(RecordMethod::from(1), RecordMethod::Deposit);
        assert_eq!(RecordMethod::from(2), RecordMethod::Withdrawal);
        assert_eq!(RecordMethod::from(0), RecordMethod::Other);
        assert_eq!(RecordMethod::from(99), RecordMethod::Other);
    }

    #[test]
    fn only_codes_3_and_7_are_terminal_withdrawals() {
        let mut rec = HistoryRecord {
            method: RecordMethod::Withdrawal,
            status: 1,
            amount: Amount::new(5.0),
            ticker: "USDT".into(),
            address: "T111aaa".to_string(),
            transaction_id: "tx-1".to_string(),
        };
        assert!(!rec.has_terminal_status());
        rec.status = 3;
        assert!(rec.has_terminal_status());
        rec.status = 7;
        assert!(rec.has_terminal_status());
        rec.status = 5;
        assert!(!rec.has_terminal_status());
    }

    #[test]
    fn payout_instruction_carries_the_request_id_as_idempotency_key() {
        let account = MerchantAccount::new("wb-main", AccountKind::Whitebit, "key", "secret");
        let instruction = PayoutInstruction::for_request(&request(42, RequestStatus::Paid), &account);
        assert_eq!(instruction.unique_id, "42");
        assert_eq!(instruction.amount, "100.000000");
        assert_eq!(instruction.network, "TRC20");
        let wire = serde_json::to_value(&instruction).unwrap();
        assert_eq!(wire["uniqueId"], "42");
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in
            [RequestStatus::New, RequestStatus::Paid, RequestStatus::AwaitingConfirmation, RequestStatus::Completed]
        {
            assert_eq!(status.to_string().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("NotAStatus".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn marking_awaiting_confirmation_touches_the_updated_timestamp() {
        let mut r = request(1, RequestStatus::Paid);
        let before = r.updated_at;
        r.mark_awaiting_confirmation();
        assert_eq!(r.status, RequestStatus::AwaitingConfirmation);
        assert!(r.updated_at >= before);
    }
}
