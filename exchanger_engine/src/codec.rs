//! Decoding of raw merchant payloads.
//!
//! Merchant responses arrive as opaque bytes from the [`crate::traits::MerchantApi`] capability. This module owns
//! turning them into typed values. A payout call answers with either an acceptance or an error-shaped object
//! carrying a status `code` and an `errors` map; anything that is valid JSON but not an object counts as acceptance.

use serde_json::Value;

use crate::{
    db_types::AccountHistory,
    errors::DecodeError,
};

/// The merchant's verdict on a payout instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum PayoutOutcome {
    /// The payout was accepted and the funds are on their way.
    Accepted,
    /// The merchant rejected the payout (e.g. insufficient balance). The request stays `Paid` and is retried on a
    /// later cycle.
    Rejected { code: Option<i64>, errors: Value },
}

/// Decodes an account's raw transaction history payload.
pub fn decode_history(raw: &[u8]) -> Result<AccountHistory, DecodeError> {
    serde_json::from_slice(raw).map_err(|e| DecodeError::History(e.to_string()))
}

/// Decodes a raw payout response into an acceptance or a structured rejection.
pub fn decode_payout_response(raw: &[u8]) -> Result<PayoutOutcome, DecodeError> {
    let body: Value =
        serde_json::from_slice(raw).map_err(|e| DecodeError::PayoutResponse(e.to_string()))?;
    match body {
        Value::Object(map) => {
            let code = map.get("code").and_then(Value::as_i64);
            let errors = map.get("errors").cloned().unwrap_or(Value::Null);
            Ok(PayoutOutcome::Rejected { code, errors })
        },
        _ => Ok(PayoutOutcome::Accepted),
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::db_types::RecordMethod;

    #[test]
    fn history_payload_decodes_into_records() {
        let raw = json!({
            "records": [
                {"method": 1, "status": 3, "amount": 100.0, "ticker": "USDT", "address": "T111aaa", "transactionId": "tx-1"},
                {"method": 2, "status": 7, "amount": 55.5, "ticker": "BTC", "address": "bc1qqq", "transactionId": "tx-2"}
            ]
        })
        .to_string();
        let history = decode_history(raw.as_bytes()).unwrap();
        assert_eq!(history.records.len(), 2);
        assert_eq!(history.records[0].method, RecordMethod::Deposit);
        assert_eq!(history.records[1].method, RecordMethod::Withdrawal);
        assert_eq!(history.records[1].transaction_id, "tx-2");
    }

    #[test]
    fn empty_history_payload_is_valid() {
        let history = decode_history(b"{}").unwrap();
        assert!(history.records.is_empty());
    }

    #[test]
    fn malformed_history_payload_is_a_decode_error() {
        assert!(decode_history(b"not json").is_err());
    }

    #[test]
    fn object_shaped_payout_response_is_a_rejection() {
        let raw = json!({"code": 422, "errors": {"amount": ["Not enough balance."]}}).to_string();
        match decode_payout_response(raw.as_bytes()).unwrap() {
            PayoutOutcome::Rejected { code, errors } => {
                assert_eq!(code, Some(422));
                assert_eq!(errors["amount"][0], "Not enough balance.");
            },
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn non_object_payout_response_is_an_acceptance() {
        assert_eq!(decode_payout_response(b"[]").unwrap(), PayoutOutcome::Accepted);
        assert_eq!(decode_payout_response(b"\"ok\"").unwrap(), PayoutOutcome::Accepted);
        assert_eq!(decode_payout_response(b"null").unwrap(), PayoutOutcome::Accepted);
    }

    #[test]
    fn garbage_payout_response_is_a_decode_error() {
        assert!(decode_payout_response(b"<html>").is_err());
    }
}
