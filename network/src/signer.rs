//! Signing delegate: the external holder of key material.

use async_trait::async_trait;

use attest_types::Account;

use crate::{LedgerLink, OperationWatch, SignerError};

/// Lists signing accounts and signs opaque-data operations on their behalf.
///
/// Key handling and the signature scheme are entirely the delegate's
/// concern; this crate only hands it a payload and a link to submit through.
#[async_trait]
pub trait SigningDelegate: Send + Sync {
    /// Accounts the delegate can sign for, in the provider's order.
    async fn list_accounts(&self) -> Result<Vec<Account>, SignerError>;

    /// Wrap `payload` in an arbitrary-data operation, sign it as `account`,
    /// and submit it through `link`.
    async fn sign_and_submit(
        &self,
        link: &dyn LedgerLink,
        payload: &[u8],
        account: &Account,
    ) -> Result<OperationWatch, SignerError>;
}
