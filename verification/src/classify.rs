//! Map ledger and signer failures onto submission errors.
//!
//! Ledgers report fee and balance problems in several shapes (pool
//! validity errors, dispatch errors from a balances or payment module), so
//! detection is best-effort over module names and reason text.

use attest_network::{LinkError, OperationStatus, SignerError};

use crate::SubmissionError;

/// Module error names that mean the account cannot pay.
const BALANCE_ERRORS: &[&str] = &["InsufficientBalance", "Payment", "Fees"];

/// Reason fragments that mean the account cannot pay.
const BALANCE_HINTS: &[&str] = &[
    "insufficient",
    "balance",
    "fee",
    "inability to pay",
    "fundsunavailable",
];

pub fn mentions_insufficient_balance(reason: &str) -> bool {
    let lower = reason.to_lowercase();
    BALANCE_HINTS.iter().any(|hint| lower.contains(hint))
}

fn rejected(reason: String) -> SubmissionError {
    if mentions_insufficient_balance(&reason) {
        SubmissionError::InsufficientBalance { reason }
    } else {
        SubmissionError::ModuleRejected { reason }
    }
}

/// The error a failure status ends a submission with, or `None` if the
/// status is progress.
pub fn classify_status(status: &OperationStatus) -> Option<SubmissionError> {
    let error = match status {
        OperationStatus::DispatchFailed { module, reason } => {
            let balance_module = module.as_deref().is_some_and(|m| {
                let name = m.rsplit(['.', ':']).next().unwrap_or(m);
                BALANCE_ERRORS.contains(&name)
            });
            let reason = match module {
                Some(m) => format!("{m}: {reason}"),
                None => reason.clone(),
            };
            if balance_module {
                SubmissionError::InsufficientBalance { reason }
            } else {
                rejected(reason)
            }
        }
        OperationStatus::Invalid { reason } => rejected(reason.clone()),
        OperationStatus::Dropped { reason } => SubmissionError::TransportDropped {
            reason: reason.clone(),
        },
        OperationStatus::Usurped { by } => SubmissionError::TransportDropped {
            reason: format!("usurped by {by}"),
        },
        OperationStatus::FinalityTimeout { block_hash } => SubmissionError::TransportDropped {
            reason: format!("finality timed out in {block_hash}"),
        },
        OperationStatus::Future
        | OperationStatus::Ready
        | OperationStatus::Broadcast
        | OperationStatus::InBlock { .. }
        | OperationStatus::Retracted { .. }
        | OperationStatus::Finalized { .. } => return None,
    };
    Some(error)
}

pub fn classify_link_error(error: LinkError) -> SubmissionError {
    match error {
        LinkError::Rpc { code, message } => rejected(format!("{message} (code {code})")),
        other => SubmissionError::TransportDropped {
            reason: other.to_string(),
        },
    }
}

pub fn classify_signer_error(error: SignerError) -> SubmissionError {
    match error {
        SignerError::Rejected(reason) => rejected(reason),
        SignerError::Unavailable(reason) => SubmissionError::TransportDropped { reason },
        SignerError::Link(e) => classify_link_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_failures_are_insufficient_balance() {
        let status = OperationStatus::Invalid {
            reason: "Inability to pay some fees (e.g. account balance too low)".into(),
        };
        assert!(matches!(
            classify_status(&status),
            Some(SubmissionError::InsufficientBalance { .. })
        ));

        let rpc = LinkError::Rpc {
            code: 1010,
            message: "Invalid Transaction: Inability to pay some fees".into(),
        };
        assert!(matches!(
            classify_link_error(rpc),
            SubmissionError::InsufficientBalance { .. }
        ));
    }

    #[test]
    fn balance_module_errors_are_insufficient_balance() {
        let status = OperationStatus::DispatchFailed {
            module: Some("Balances.InsufficientBalance".into()),
            reason: "Balance too low to send value".into(),
        };
        assert!(matches!(
            classify_status(&status),
            Some(SubmissionError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn unavailable_funds_are_insufficient_balance() {
        let status = OperationStatus::DispatchFailed {
            module: None,
            reason: "Token(FundsUnavailable)".into(),
        };
        assert!(matches!(
            classify_status(&status),
            Some(SubmissionError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn indexed_module_errors_are_rejections() {
        let status = OperationStatus::DispatchFailed {
            module: Some("pallet 5".into()),
            reason: "module error 2".into(),
        };
        assert!(matches!(
            classify_status(&status),
            Some(SubmissionError::ModuleRejected { .. })
        ));
    }

    #[test]
    fn other_module_errors_are_rejections() {
        let status = OperationStatus::DispatchFailed {
            module: Some("System.CallFiltered".into()),
            reason: "call filtered".into(),
        };
        match classify_status(&status) {
            Some(SubmissionError::ModuleRejected { reason }) => {
                assert_eq!(reason, "System.CallFiltered: call filtered");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn drops_are_transport_failures() {
        let status = OperationStatus::Dropped {
            reason: "pool full".into(),
        };
        assert!(matches!(
            classify_status(&status),
            Some(SubmissionError::TransportDropped { .. })
        ));
        assert!(matches!(
            classify_link_error(LinkError::Closed),
            SubmissionError::TransportDropped { .. }
        ));
        assert!(matches!(
            classify_signer_error(SignerError::Link(LinkError::Timeout("submit".into()))),
            SubmissionError::TransportDropped { .. }
        ));
    }

    #[test]
    fn progress_is_not_a_failure() {
        assert!(classify_status(&OperationStatus::Ready).is_none());
        assert!(classify_status(&OperationStatus::InBlock {
            block_hash: "0x1".into()
        })
        .is_none());
    }

    #[test]
    fn signer_rejection_is_a_rejection() {
        assert!(matches!(
            classify_signer_error(SignerError::Rejected("user cancelled".into())),
            SubmissionError::ModuleRejected { .. }
        ));
    }
}
