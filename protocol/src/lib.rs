//! Record wire format.
//!
//! A verification record travels as `<TAG>:<json>` inside an arbitrary-data
//! ledger operation. The channel is shared with unrelated activity, so
//! decoding is total: anything that is not a well-formed tagged record is
//! simply not a record.

pub mod codec;
pub mod error;

pub use codec::{decode, decode_str, encode, is_tagged, MAX_PAYLOAD_SIZE, RECORD_TAG};
pub use error::ProtocolError;
