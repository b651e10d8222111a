
use chrono::Utc;
use exchanger_common::Amount;

use crate::db_types::{AccountKind, ExchangeRequest, MerchantAccount, RequestId, RequestStatus};

pub fn test_request(id: i64, status: RequestStatus, amount: f64) -> ExchangeRequest {
    ExchangeRequest {
        id: RequestId(id),
        status,
        exchange_to: "USDT".into(),
        expected_amount: Amount::new(amount),
        client_address: format!("T{id:03}aaa"),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_account(name: &str) -> MerchantAccount {
    MerchantAccount::new(name, AccountKind::Whitebit, "api-key", "api-secret")
}
