//! Just enough SCALE decoding to find byte-vector arguments in raw
//! extrinsics, and failed dispatches in a block's events, without runtime
//! metadata.

use crate::OperationStatus;

/// Decode a compact-encoded length at the start of `bytes`.
///
/// Returns `(value, prefix_len)`. Non-canonical encodings are rejected.
pub fn decode_compact_len(bytes: &[u8]) -> Option<(usize, usize)> {
    let first = *bytes.first()?;
    let (value, prefix_len): (u64, usize) = match first & 0b11 {
        0b00 => (u64::from(first >> 2), 1),
        0b01 => {
            let raw = u16::from_le_bytes([first, *bytes.get(1)?]);
            let value = u64::from(raw >> 2);
            if value < 1 << 6 {
                return None;
            }
            (value, 2)
        }
        0b10 => {
            let raw = u32::from_le_bytes(bytes.get(..4)?.try_into().ok()?);
            let value = u64::from(raw >> 2);
            if value < 1 << 14 {
                return None;
            }
            (value, 4)
        }
        _ => {
            let len = usize::from(first >> 2) + 4;
            if len > 8 {
                return None;
            }
            let mut buf = [0u8; 8];
            buf[..len].copy_from_slice(bytes.get(1..1 + len)?);
            let value = u64::from_le_bytes(buf);
            if value < 1 << 30 {
                return None;
            }
            (value, 1 + len)
        }
    };
    Some((usize::try_from(value).ok()?, prefix_len))
}

/// Every non-empty length-prefixed byte vector that ends exactly at the end
/// of `encoded`, in order of increasing offset.
///
/// An arbitrary-data call stores its argument last, so one of the returned
/// slices is that argument; the rest are coincidental and left to the
/// caller's own framing to reject.
pub fn trailing_byte_args(encoded: &[u8]) -> Vec<&[u8]> {
    let mut found = Vec::new();
    for offset in 0..encoded.len() {
        let Some((len, prefix_len)) = decode_compact_len(&encoded[offset..]) else {
            continue;
        };
        let start = offset + prefix_len;
        if len > 0 && start.checked_add(len) == Some(encoded.len()) {
            found.push(&encoded[start..]);
        }
    }
    found
}

/// `Phase::ApplyExtrinsic` tag of an event record.
const PHASE_APPLY_EXTRINSIC: u8 = 0;
/// `frame_system` sits at pallet index 0 on Substrate runtimes.
const SYSTEM_PALLET: u8 = 0;
/// `frame_system::Event::ExtrinsicFailed`.
const EXTRINSIC_FAILED: u8 = 1;

const DISPATCH_ERRORS: &[&str] = &[
    "Other",
    "CannotLookup",
    "BadOrigin",
    "Module",
    "ConsumerRemaining",
    "NoProviders",
    "TooManyConsumers",
    "Token",
    "Arithmetic",
    "Transactional",
    "Exhausted",
    "Corruption",
    "Unavailable",
    "RootNotAllowed",
];
const TOKEN_ERRORS: &[&str] = &[
    "FundsUnavailable",
    "OnlyProvider",
    "BelowMinimum",
    "CannotCreate",
    "UnknownAsset",
    "Frozen",
    "Unsupported",
    "CannotCreateHold",
    "NotExpendable",
    "Blocked",
];
const ARITHMETIC_ERRORS: &[&str] = &["Underflow", "Overflow", "DivisionByZero"];
const TRANSACTIONAL_ERRORS: &[&str] = &["LimitReached", "NoLayer"];

/// The failure of extrinsic `extrinsic_index`, if the encoded
/// `System.Events` of its block carry an `ExtrinsicFailed` for it.
///
/// Event payloads cannot be skipped without metadata, so this looks for the
/// phase and event prefix of the failure record directly. A coincidental
/// match inside another event's data is possible but unlikely.
pub fn extrinsic_failure(events: &[u8], extrinsic_index: u32) -> Option<OperationStatus> {
    let mut marker = vec![PHASE_APPLY_EXTRINSIC];
    marker.extend_from_slice(&extrinsic_index.to_le_bytes());
    marker.extend_from_slice(&[SYSTEM_PALLET, EXTRINSIC_FAILED]);

    let at = events
        .windows(marker.len())
        .position(|window| window == marker.as_slice())?;
    Some(dispatch_error(&events[at + marker.len()..]))
}

fn name_at(table: &[&'static str], index: Option<&u8>) -> &'static str {
    index
        .and_then(|&i| table.get(usize::from(i)))
        .copied()
        .unwrap_or("Unknown")
}

/// Describe an encoded `DispatchError`. Module errors name the pallet by
/// index only.
fn dispatch_error(bytes: &[u8]) -> OperationStatus {
    let (module, reason) = match bytes.first() {
        Some(3) => match (bytes.get(1), bytes.get(2)) {
            (Some(pallet), Some(error)) => {
                (Some(format!("pallet {pallet}")), format!("module error {error}"))
            }
            _ => (None, "Module".to_string()),
        },
        Some(7) => (None, format!("Token({})", name_at(TOKEN_ERRORS, bytes.get(1)))),
        Some(8) => (None, format!("Arithmetic({})", name_at(ARITHMETIC_ERRORS, bytes.get(1)))),
        Some(9) => (
            None,
            format!("Transactional({})", name_at(TRANSACTIONAL_ERRORS, bytes.get(1))),
        ),
        other => (None, name_at(DISPATCH_ERRORS, other).to_string()),
    };
    OperationStatus::DispatchFailed { module, reason }
}
