//! Binary per-stroke record format.
//!
//! Layout, all little-endian:
//!
//! ```text
//! [magic "SKRC"] [u32 version]      tagged format only
//! u32 count
//! count x { i32 x, i32 y, i64 t }
//! ```
//!
//! The legacy format is the bare count and body. Readers detect the magic and
//! fall back to legacy when it is absent.

use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use thiserror::Error;

/// Leading bytes of a tagged record.
pub const RECORD_MAGIC: [u8; 4] = *b"SKRC";

/// Version written after the magic.
pub const RECORD_VERSION: u32 = 1;

/// Encoded size of one point.
const POINT_BYTES: u64 = 16;

/// Largest point count a record may hold. Counts with the top bit set were
/// written as negative numbers.
const MAX_COUNT: u32 = i32::MAX as u32;

/// Which header layout to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Bare point count followed by the points.
    Legacy,
    /// Magic and version prefix ahead of the legacy layout.
    #[default]
    Tagged,
}

/// Problems found while decoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("record is {0} bytes, too short for its header")]
    MissingHeader(usize),
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u32),
    #[error("point count {0:#x} is negative")]
    NegativeCount(u32),
    #[error("record body is {actual} bytes, header promises {expected}")]
    Truncated { expected: u64, actual: u64 },
    #[error("record body is {actual} bytes, header promises only {expected}")]
    TrailingBytes { expected: u64, actual: u64 },
}

/// Write the record for `points` into `writer`.
pub(crate) fn encode<W: Write>(writer: &mut W, points: &[Point], format: RecordFormat) -> io::Result<()> {
    let count = u32::try_from(points.len())
        .ok()
        .filter(|count| *count <= MAX_COUNT)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} points do not fit in a stroke record", points.len()),
            )
        })?;

    if format == RecordFormat::Tagged {
        writer.write_all(&RECORD_MAGIC)?;
        writer.write_all(&RECORD_VERSION.to_le_bytes())?;
    }
    writer.write_all(&count.to_le_bytes())?;

    for point in points {
        writer.write_all(&point.x().to_le_bytes())?;
        writer.write_all(&point.y().to_le_bytes())?;
        writer.write_all(&point.t().to_le_bytes())?;
    }
    Ok(())
}

/// Decode a whole record into `(x, y, t)` samples in stored order.
pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<(i32, i32, i64)>, FormatError> {
    let missing_header = || FormatError::MissingHeader(bytes.len());

    let body = match bytes.strip_prefix(&RECORD_MAGIC) {
        Some(rest) => {
            let (version, rest) = split_u32(rest).ok_or_else(missing_header)?;
            if version != RECORD_VERSION {
                return Err(FormatError::UnsupportedVersion(version));
            }
            rest
        }
        None => bytes,
    };

    let (count, body) = split_u32(body).ok_or_else(missing_header)?;
    if count > MAX_COUNT {
        return Err(FormatError::NegativeCount(count));
    }

    let expected = u64::from(count) * POINT_BYTES;
    let actual = body.len() as u64;
    if actual < expected {
        return Err(FormatError::Truncated { expected, actual });
    }
    if actual > expected {
        return Err(FormatError::TrailingBytes { expected, actual });
    }

    body.chunks_exact(POINT_BYTES as usize)
        .map(|chunk| split_sample(chunk).ok_or(FormatError::Truncated { expected, actual }))
        .collect()
}

fn split_u32(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let (head, rest) = bytes.split_first_chunk::<4>()?;
    Some((u32::from_le_bytes(*head), rest))
}

fn split_sample(chunk: &[u8]) -> Option<(i32, i32, i64)> {
    let (x, rest) = chunk.split_first_chunk::<4>()?;
    let (y, rest) = rest.split_first_chunk::<4>()?;
    let (t, _) = rest.split_first_chunk::<8>()?;
    Some((
        i32::from_le_bytes(*x),
        i32::from_le_bytes(*y),
        i64::from_le_bytes(*t),
    ))
}
