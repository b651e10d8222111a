use crate::{
    db_types::{MerchantAccount, PayoutInstruction},
    errors::MerchantError,
};

/// The merchant capability for a custodial account.
///
/// Implementations own the merchant's wire protocol, authentication and endpoints. The engine treats responses as
/// opaque bytes and decodes them via [`crate::codec`].
#[allow(async_fn_in_trait)]
pub trait MerchantApi {
    /// Fetches the account's transaction history. The raw payload decodes into an
    /// [`crate::db_types::AccountHistory`].
    async fn fetch_history(&self, account: &MerchantAccount) -> Result<Vec<u8>, MerchantError>;

    /// Submits a payout instruction. The raw payload decodes into a [`crate::codec::PayoutOutcome`].
    async fn payout(
        &self,
        account: &MerchantAccount,
        instruction: &PayoutInstruction,
    ) -> Result<Vec<u8>, MerchantError>;

    /// Connectivity check for the account's credentials.
    async fn ping(&self, account: &MerchantAccount) -> Result<(), MerchantError>;
}
