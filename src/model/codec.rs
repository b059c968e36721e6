//! # Vector Codec: 24-bit truncated floats
//!
//! Each vector component is stored as the top three bytes of its big-endian
//! IEEE 754 single-precision representation:
//!
//! ```text
//! f32 layout:  [ sign (1b) | exponent (8b) | mantissa (23b) ]
//! stored:      [ byte 0    | byte 1        | byte 2 ]  (low mantissa byte dropped)
//! decoded:     [ byte 0    | byte 1        | byte 2 | 0x7F ]
//! ```
//!
//! Dropping 8 of 23 mantissa bits bounds the relative error by 2^-15 for
//! normal values. The filler `0x7F` sits in the middle of the dropped range,
//! which halves the worst case compared to zero filling.
//!
//! In the catalog file every 3-byte group becomes exactly 4 base64
//! characters, so a vector's text is `4 * dimension` characters long.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Bytes kept per component.
pub const ENCODED_WIDTH: usize = 3;

/// Base64 characters per component in the catalog text form.
pub const TEXT_WIDTH: usize = 4;

/// Byte appended in place of the dropped low mantissa byte.
pub const FILLER: u8 = 0x7F;

/// Round-trip error bound every stored component must satisfy.
pub const RELATIVE_TOLERANCE: f32 = 1e-4;

// ============================================================================
// Component encoding
// ============================================================================

#[inline(always)]
pub fn encode_component(value: f32) -> [u8; ENCODED_WIDTH] {
    let b = value.to_be_bytes();
    [b[0], b[1], b[2]]
}

#[inline(always)]
pub fn decode_component(bytes: [u8; ENCODED_WIDTH]) -> f32 {
    f32::from_be_bytes([bytes[0], bytes[1], bytes[2], FILLER])
}

/// Value after one encode/decode cycle.
#[inline(always)]
pub fn round_trip(value: f32) -> f32 {
    decode_component(encode_component(value))
}

pub fn encode_text(value: f32) -> String {
    BASE64.encode(encode_component(value))
}

pub fn decode_text(text: &str) -> Result<f32> {
    let bytes = BASE64
        .decode(text)
        .map_err(|e| Error::Decode(format!("component '{text}': {e}")))?;
    let bytes: [u8; ENCODED_WIDTH] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| Error::Decode(format!("component '{text}' is {} bytes, expected {ENCODED_WIDTH}", b.len())))?;
    Ok(decode_component(bytes))
}

// ============================================================================
// Vector encoding
// ============================================================================

pub fn encode_vector(values: &[f32]) -> String {
    let mut out = String::with_capacity(values.len() * TEXT_WIDTH);
    for &v in values {
        BASE64.encode_string(encode_component(v), &mut out);
    }
    out
}

pub fn decode_vector(text: &str) -> Result<Vec<f32>> {
    if !text.is_ascii() || text.len() % TEXT_WIDTH != 0 {
        return Err(Error::Decode(format!(
            "vector text length {} is not a multiple of {TEXT_WIDTH}",
            text.len()
        )));
    }
    (0..text.len())
        .step_by(TEXT_WIDTH)
        .map(|i| decode_text(&text[i..i + TEXT_WIDTH]))
        .collect()
}

// ============================================================================
// Validation
// ============================================================================

/// An exactly-zero component. Usually a placeholder for missing source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroComponent {
    pub name: String,
    pub index: usize,
}

/// Relative round-trip error of one component. Zero maps to zero.
pub fn relative_error(value: f32) -> f32 {
    if value == 0.0 {
        return 0.0;
    }
    ((value - round_trip(value)) / value).abs()
}

/// Check one component of `name`'s vector.
///
/// Returns `Ok(true)` for an exact zero, which callers report as suspicious.
pub fn check_component(name: &str, index: usize, value: f32) -> Result<bool> {
    if value == 0.0 {
        return Ok(true);
    }
    let err = relative_error(value);
    // NaN compares false, so non-finite values land here too
    if !(err < RELATIVE_TOLERANCE) {
        return Err(Error::CodecPrecision {
            name: name.to_string(),
            index,
            value,
            decoded: round_trip(value),
            relative_error: err,
        });
    }
    Ok(false)
}

/// Validate every component of a vector, collecting zero warnings.
pub fn validate_vector(name: &str, values: &[f32]) -> Result<Vec<ZeroComponent>> {
    let mut zeros = Vec::new();
    for (index, &v) in values.iter().enumerate() {
        if check_component(name, index, v)? {
            tracing::warn!(name, index, "zero vector component, source data may be missing");
            zeros.push(ZeroComponent { name: name.to_string(), index });
        }
    }
    Ok(zeros)
}
