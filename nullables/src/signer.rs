//! Nullable signer: scripted accounts, no key material.

use std::sync::Mutex;

use async_trait::async_trait;

use attest_network::{LedgerLink, OperationWatch, SignerError, SigningDelegate};
use attest_types::Account;

/// A signing delegate that "signs" by submitting the payload as-is.
#[derive(Default)]
pub struct NullSigner {
    accounts: Mutex<Vec<Account>>,
    rejection: Mutex<Option<String>>,
    signed: Mutex<Vec<(String, Vec<u8>)>>,
}

impl NullSigner {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            ..Self::default()
        }
    }

    pub fn set_accounts(&self, accounts: Vec<Account>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    /// Refuse every following signing request.
    pub fn reject_with(&self, reason: &str) {
        *self.rejection.lock().unwrap() = Some(reason.to_string());
    }

    /// `(address, payload)` pairs signed so far.
    pub fn signed(&self) -> Vec<(String, Vec<u8>)> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SigningDelegate for NullSigner {
    async fn list_accounts(&self) -> Result<Vec<Account>, SignerError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn sign_and_submit(
        &self,
        link: &dyn LedgerLink,
        payload: &[u8],
        account: &Account,
    ) -> Result<OperationWatch, SignerError> {
        if let Some(reason) = self.rejection.lock().unwrap().clone() {
            return Err(SignerError::Rejected(reason));
        }
        self.signed
            .lock()
            .unwrap()
            .push((account.address.clone(), payload.to_vec()));
        Ok(link.submit(payload.to_vec()).await?)
    }
}
