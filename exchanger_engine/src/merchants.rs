//! Reference [`MerchantApi`] implementation.
//!
//! Real merchant wire clients live outside this crate and are injected behind the trait. [`StaticMerchant`] serves
//! canned responses for local dry runs and integration tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    db_types::{MerchantAccount, PayoutInstruction},
    errors::MerchantError,
    traits::MerchantApi,
};

/// A merchant capability that answers every call from a canned response table. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct StaticMerchant {
    histories: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    payout_response: Arc<Mutex<Option<Vec<u8>>>>,
    disconnected: bool,
}

impl StaticMerchant {
    /// Every account has an empty ledger and every payout is accepted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every call fails as if no merchant integration were configured.
    pub fn disconnected() -> Self {
        Self { disconnected: true, ..Self::default() }
    }

    pub fn set_history(&self, account_name: &str, raw: Vec<u8>) {
        self.histories.lock().unwrap().insert(account_name.to_string(), raw);
    }

    pub fn set_payout_response(&self, raw: Vec<u8>) {
        *self.payout_response.lock().unwrap() = Some(raw);
    }

    fn check_connected(&self, account: &MerchantAccount) -> Result<(), MerchantError> {
        if self.disconnected {
            Err(MerchantError::NotConfigured(account.name.clone()))
        } else {
            Ok(())
        }
    }
}

impl MerchantApi for StaticMerchant {
    async fn fetch_history(&self, account: &MerchantAccount) -> Result<Vec<u8>, MerchantError> {
        self.check_connected(account)?;
        let histories = self.histories.lock().unwrap();
        Ok(histories.get(&account.name).cloned().unwrap_or_else(|| b"{\"records\":[]}".to_vec()))
    }

    async fn payout(
        &self,
        account: &MerchantAccount,
        _instruction: &PayoutInstruction,
    ) -> Result<Vec<u8>, MerchantError> {
        self.check_connected(account)?;
        let response = self.payout_response.lock().unwrap();
        Ok(response.clone().unwrap_or_else(|| b"null".to_vec()))
    }

    async fn ping(&self, account: &MerchantAccount) -> Result<(), MerchantError> {
        self.check_connected(account)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::AccountKind;

    fn account() -> MerchantAccount {
        MerchantAccount::new("wb-main", AccountKind::Whitebit, "key", "secret")
    }

    #[tokio::test]
    async fn unknown_accounts_get_an_empty_ledger() {
        let merchant = StaticMerchant::empty();
        let raw = merchant.fetch_history(&account()).await.unwrap();
        assert_eq!(raw, b"{\"records\":[]}");
    }

    #[tokio::test]
    async fn disconnected_merchant_fails_every_call() {
        let merchant = StaticMerchant::disconnected();
        assert!(merchant.ping(&account()).await.is_err());
        assert!(merchant.fetch_history(&account()).await.is_err());
    }
}
