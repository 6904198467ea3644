//! Compact binary payload encoders.
//!
//! All payloads are built from base-128 varints: 7 significant bits per
//! byte, least-significant group first, continuation flag in the high bit.
//! Negative values are encoded through the two's-complement bit pattern of
//! the i64 and so always occupy the full ten bytes.
//!
//! Only the encode side lives here; the controller owns the decoder. The
//! field count and order per wire type make the stream self-delimiting.

use crate::core::error::{RelayError, Result};
use bytes::Bytes;
use smallvec::SmallVec;
use std::time::SystemTime;

/// Scratch buffer sized for the largest fixed-field payload
/// (distribution: four ten-byte varints).
type Scratch = SmallVec<[u8; 40]>;

fn put_varint(buf: &mut Scratch, value: i64) {
    let mut v = value as u64;
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Encodes a scalar counter value as a single varint.
pub fn encode_counter(value: i64) -> Bytes {
    let mut buf = Scratch::new();
    put_varint(&mut buf, value);
    Bytes::copy_from_slice(&buf)
}

/// Encodes a latest-value observation: varint epoch-milliseconds of the
/// observation time, then varint value.
///
/// Observation times are produced internally, so one outside the
/// representable epoch range is an upstream defect and fails fatally.
pub fn encode_latest(at: SystemTime, value: i64) -> Result<Bytes> {
    let millis = epoch_millis(at)?;
    let mut buf = Scratch::new();
    put_varint(&mut buf, millis);
    put_varint(&mut buf, value);
    Ok(Bytes::copy_from_slice(&buf))
}

/// Encodes a distribution as four varints in fixed order:
/// count, sum, min, max.
pub fn encode_distribution(count: i64, sum: i64, min: i64, max: i64) -> Bytes {
    let mut buf = Scratch::new();
    put_varint(&mut buf, count);
    put_varint(&mut buf, sum);
    put_varint(&mut buf, min);
    put_varint(&mut buf, max);
    Bytes::copy_from_slice(&buf)
}

/// Converts an observation time to signed epoch milliseconds.
pub(crate) fn epoch_millis(at: SystemTime) -> Result<i64> {
    let since_epoch = at
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|_| RelayError::Timestamp {
            reason: "observation time precedes the unix epoch".to_string(),
        })?;
    i64::try_from(since_epoch.as_millis()).map_err(|_| RelayError::Timestamp {
        reason: "epoch milliseconds overflow i64".to_string(),
    })
}
