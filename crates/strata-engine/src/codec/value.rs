//! Order-preserving value encoding for typed column values.
//!
//! Every encoding here satisfies one contract: for two values `a < b` of the
//! same column type, `encode_ascending(a)` sorts strictly below
//! `encode_ascending(b)` under unsigned byte comparison, and the descending
//! variants sort in exactly the opposite order. The scan planner and index
//! key builder are correct only because of this.
//!
//! Per-type scheme:
//!
//! - signed 64-bit family (LONG, TIME, DATE, DATETIME, scaled DECIMAL):
//!   flip the sign bit, so two's-complement order becomes unsigned order;
//! - ULONG: already unsigned, encoded as plain big-endian;
//! - DOUBLE: on a negative value complement all 64 bits, otherwise flip the
//!   sign bit only; this folds IEEE-754's sign/magnitude discontinuity at
//!   zero into one monotone unsigned line;
//! - STRING/BINARY: canonicalize (lowercase for STRING), then right-pad with
//!   `0x00` up to the declared max length. The zero pad keeps a strict
//!   prefix strictly below every extension of it;
//! - descending = bytewise complement of ascending, applied after padding.

use strata_commons::{ColumnSchema, ColumnType, EngineError, Result};

/// Sign bit of a 64-bit value.
const SIGN_FLIP_MASK: u64 = 0x8000_0000_0000_0000;

/// Pad byte for variable-width ascending encodings. Must sort below every
/// content byte so that padding never reorders a prefix past its extensions.
const PAD_BYTE: u8 = 0x00;

/// Encode a raw column value into ascending order-preserving key bytes.
///
/// `raw` is the value's storage form: 8 big-endian bytes for the fixed-width
/// types, plain bytes for STRING/BINARY. Fails with `EncodingError` when the
/// raw form has the wrong width or exceeds the column's declared max length.
pub fn encode_ascending(raw: &[u8], column: &ColumnSchema) -> Result<Vec<u8>> {
    match column.column_type {
        ColumnType::Long
        | ColumnType::Time
        | ColumnType::Date
        | ColumnType::DateTime
        | ColumnType::Decimal => {
            let value = read_u64(raw, column)?;
            Ok((value ^ SIGN_FLIP_MASK).to_be_bytes().to_vec())
        }
        ColumnType::ULong => {
            let value = read_u64(raw, column)?;
            Ok(value.to_be_bytes().to_vec())
        }
        ColumnType::Double => {
            let bits = read_u64(raw, column)?;
            let positioned = if bits & SIGN_FLIP_MASK != 0 {
                !bits
            } else {
                bits ^ SIGN_FLIP_MASK
            };
            Ok(positioned.to_be_bytes().to_vec())
        }
        ColumnType::String | ColumnType::Binary => {
            let canonicalized = canonical(raw, column);
            pad_to_max_length(canonicalized, column)
        }
    }
}

/// Encode a raw column value into descending order-preserving key bytes:
/// the bytewise complement of the ascending encoding.
pub fn encode_descending(raw: &[u8], column: &ColumnSchema) -> Result<Vec<u8>> {
    Ok(complemented(encode_ascending(raw, column)?))
}

/// Canonical form of a value: logically-equal values must canonicalize to
/// identical bytes so they land on identical index keys. Lowercases STRING
/// content; identity for every other type.
pub fn canonical(raw: &[u8], column: &ColumnSchema) -> Vec<u8> {
    match column.column_type {
        ColumnType::String => match std::str::from_utf8(raw) {
            Ok(text) => text.to_lowercase().into_bytes(),
            Err(_) => raw.to_vec(),
        },
        _ => raw.to_vec(),
    }
}

/// Bytewise one's complement. The same unsigned comparator that orders
/// ascending encodings orders complemented ones in reverse.
pub fn complemented(mut bytes: Vec<u8>) -> Vec<u8> {
    for byte in &mut bytes {
        *byte = !*byte;
    }
    bytes
}

/// Parse a textual literal into the raw storage form for `column`.
///
/// This is the entry point for values arriving as text: it enforces range
/// and sign rules (`EncodingError` for a negative unsigned literal or an
/// out-of-range number) and produces the `raw` bytes the encode functions
/// expect.
pub fn parse_literal(text: &str, column: &ColumnSchema) -> Result<Vec<u8>> {
    match column.column_type {
        ColumnType::Long | ColumnType::Time | ColumnType::Date | ColumnType::DateTime => {
            let value: i64 = text.parse().map_err(|_| {
                EngineError::encoding(format!(
                    "malformed or out-of-range signed literal for column {}: {}",
                    column.name, text
                ))
            })?;
            Ok(value.to_be_bytes().to_vec())
        }
        ColumnType::ULong => {
            if text.trim_start().starts_with('-') {
                return Err(EngineError::encoding(format!(
                    "negative literal for unsigned column {}: {}",
                    column.name, text
                )));
            }
            let value: u64 = text.parse().map_err(|_| {
                EngineError::encoding(format!(
                    "malformed or out-of-range unsigned literal for column {}: {}",
                    column.name, text
                ))
            })?;
            Ok(value.to_be_bytes().to_vec())
        }
        ColumnType::Double => {
            let value: f64 = text.parse().map_err(|_| {
                EngineError::encoding(format!(
                    "malformed double literal for column {}: {}",
                    column.name, text
                ))
            })?;
            Ok(value.to_bits().to_be_bytes().to_vec())
        }
        ColumnType::Decimal => {
            let scaled = parse_decimal(text, column)?;
            Ok(scaled.to_be_bytes().to_vec())
        }
        ColumnType::String | ColumnType::Binary => Ok(text.as_bytes().to_vec()),
    }
}

/// Scale a decimal literal by the column's declared scale into an i64,
/// rejecting values outside the (precision, scale) envelope.
fn parse_decimal(text: &str, column: &ColumnSchema) -> Result<i64> {
    let precision = column.precision.ok_or_else(|| {
        EngineError::encoding(format!("column {} has no declared precision", column.name))
    })?;
    let scale = column.scale.ok_or_else(|| {
        EngineError::encoding(format!("column {} has no declared scale", column.name))
    })?;

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (digits, ""),
    };

    let malformed = || {
        EngineError::encoding(format!(
            "malformed decimal literal for column {}: {}",
            column.name, text
        ))
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(malformed());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }
    if frac_part.len() as u32 > scale {
        return Err(EngineError::encoding(format!(
            "literal {} has more fractional digits than scale {} of column {}",
            text, scale, column.name
        )));
    }

    let int_value: i128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| malformed())?
    };
    let frac_value: i128 = if frac_part.is_empty() {
        0
    } else {
        frac_part.parse().map_err(|_| malformed())?
    };

    let scale_factor = 10i128.pow(scale);
    let frac_shift = 10i128.pow(scale - frac_part.len() as u32);
    let mut scaled = int_value
        .checked_mul(scale_factor)
        .and_then(|v| v.checked_add(frac_value * frac_shift))
        .ok_or_else(|| {
            EngineError::encoding(format!(
                "decimal literal out of range for column {}: {}",
                column.name, text
            ))
        })?;
    if negative {
        scaled = -scaled;
    }

    let bound = 10i128.pow(precision.min(38));
    if scaled.abs() >= bound || scaled > i64::MAX as i128 || scaled < i64::MIN as i128 {
        return Err(EngineError::encoding(format!(
            "decimal literal exceeds precision {} of column {}: {}",
            precision, column.name, text
        )));
    }
    Ok(scaled as i64)
}

fn read_u64(raw: &[u8], column: &ColumnSchema) -> Result<u64> {
    let bytes: [u8; 8] = raw.try_into().map_err(|_| {
        EngineError::encoding(format!(
            "column {} expects an 8-byte value, got {} bytes",
            column.name,
            raw.len()
        ))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

fn pad_to_max_length(mut value: Vec<u8>, column: &ColumnSchema) -> Result<Vec<u8>> {
    let max_length = column.max_length.ok_or_else(|| {
        EngineError::encoding(format!(
            "column {} has no declared max length",
            column.name
        ))
    })?;
    if value.len() > max_length {
        return Err(EngineError::encoding(format!(
            "value of {} bytes exceeds max length {} of column {}",
            value.len(),
            max_length,
            column.name
        )));
    }
    value.resize(max_length, PAD_BYTE);
    Ok(value)
}
