//! Byte encodings used inside row keys.
//!
//! Two distinct schemes live here and must not be confused:
//!
//! - [`value`]: fixed-width, order-preserving encodings for typed column
//!   values. These go into index keys, where byte comparison must equal
//!   logical comparison.
//! - [`varint`]: compact self-describing length-prefixed encodings for
//!   metadata keys. These are *not* order-comparable across lengths and
//!   never appear in index value positions.

pub mod value;
pub mod varint;
