//! Verification service.
//!
//! Records the SHA-256 digest of a file or certificate on a ledger inside an
//! arbitrary-data operation, then answers "was this content recorded?" from
//! a session cache or, failing that, by scanning recent ledger activity.
//!
//! Flow for a submission:
//! 1. **Connecting**: acquire the live connection for the current network.
//! 2. **Submitting**: encode the record and hand it to the signing delegate.
//! 3. **AwaitingInclusion**: watch operation statuses until the ledger
//!    includes it (record becomes `Verified`) or rejects it (`Failed`).

pub mod cache;
pub mod classify;
pub mod error;
pub mod request;
pub mod service;
pub mod state;
pub mod stats;

pub use cache::SessionCache;
pub use error::{AuthError, QueryError, ServiceError, SubmissionError};
pub use request::SubmissionRequest;
pub use service::{ServiceOptions, Submission, VerificationService, DEFAULT_SCAN_DEPTH};
pub use state::SubmissionState;
pub use stats::{ServiceStats, StatsSnapshot};
