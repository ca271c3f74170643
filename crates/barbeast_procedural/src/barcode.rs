//! # Barcode Normalization
//!
//! Every scanned barcode is reduced to ONE canonical 13-digit EAN-13 string
//! before anything is derived from it.
//!
//! ## Accepted Inputs
//!
//! | Cleaned length | Format | Canonical form |
//! |----------------|--------|----------------|
//! | 13 | EAN-13 | as-is (checksum verified) |
//! | 12 | UPC-A  | `"0" + code` (checksum verified as EAN-13) |
//! | 8  | EAN-8  | `"00000" + first 7 digits + recomputed check digit` |
//!
//! Non-digit characters (spaces, dashes, scanner noise) are stripped first.
//! Anything else is rejected with the cleaned length attached.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a canonical barcode.
pub const CANONICAL_LEN: usize = 13;

/// Why a barcode was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeRejection {
    /// Cleaned input is not 8, 12 or 13 digits long.
    UnsupportedLength,
    /// Check digit does not match.
    ChecksumMismatch,
}

/// Errors produced by barcode normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarcodeError {
    /// Input could not be normalized.
    #[error("invalid barcode ({reason:?}): {length} digits after cleaning")]
    InvalidBarcode {
        /// Number of digits left after stripping non-digits.
        length: usize,
        /// Rejection cause.
        reason: BarcodeRejection,
    },
}

impl BarcodeError {
    /// Cleaned digit count carried for diagnostics.
    #[must_use]
    pub const fn cleaned_length(&self) -> usize {
        match self {
            Self::InvalidBarcode { length, .. } => *length,
        }
    }
}

/// Result type for barcode operations.
pub type BarcodeResult<T> = Result<T, BarcodeError>;

/// Symbology of the cleaned input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeFormat {
    /// 13-digit EAN-13.
    Ean13,
    /// 12-digit UPC-A.
    UpcA,
    /// 8-digit EAN-8.
    Ean8,
}

impl BarcodeFormat {
    /// Classifies raw input by its cleaned digit count.
    ///
    /// Does not verify the checksum.
    #[must_use]
    pub fn classify(raw: &str) -> Option<Self> {
        match raw.bytes().filter(u8::is_ascii_digit).count() {
            13 => Some(Self::Ean13),
            12 => Some(Self::UpcA),
            8 => Some(Self::Ean8),
            _ => None,
        }
    }
}

/// A checksum-valid 13-digit EAN-13 barcode.
///
/// Only constructible through [`normalize_to_ean13`] (or by parsing an
/// already-canonical string), so holding one proves validity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalBarcode(String);

impl CanonicalBarcode {
    /// Returns the 13-digit string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates the numeric value of each digit.
    pub fn digits(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b - b'0')
    }

    /// Returns the check digit.
    #[must_use]
    pub fn last_digit(&self) -> u8 {
        self.0.as_bytes()[CANONICAL_LEN - 1] - b'0'
    }
}

impl fmt::Display for CanonicalBarcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalBarcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CanonicalBarcode {
    type Err = BarcodeError;

    /// Parses a string that must already be canonical (13 digits, valid
    /// checksum, no separators).
    fn from_str(s: &str) -> BarcodeResult<Self> {
        if s.len() != CANONICAL_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BarcodeError::InvalidBarcode {
                length: s.bytes().filter(u8::is_ascii_digit).count(),
                reason: BarcodeRejection::UnsupportedLength,
            });
        }
        normalize_to_ean13(s)
    }
}

impl TryFrom<String> for CanonicalBarcode {
    type Error = BarcodeError;

    fn try_from(value: String) -> BarcodeResult<Self> {
        value.parse()
    }
}

impl From<CanonicalBarcode> for String {
    fn from(code: CanonicalBarcode) -> Self {
        code.0
    }
}

/// Normalizes raw scanner input to a canonical EAN-13 barcode.
///
/// # Errors
///
/// Returns [`BarcodeError::InvalidBarcode`] when the cleaned input has an
/// unsupported length or fails its checksum.
pub fn normalize_to_ean13(raw: &str) -> BarcodeResult<CanonicalBarcode> {
    let digits: Vec<u8> = raw
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();
    let length = digits.len();

    let canonical: Vec<u8> = match length {
        13 => digits,
        12 => std::iter::once(0).chain(digits).collect(),
        8 => {
            if ean8_check_digit(&digits[..7]) != digits[7] {
                return Err(checksum_mismatch(length));
            }
            let mut padded = vec![0u8; 5];
            padded.extend_from_slice(&digits[..7]);
            padded.push(ean13_check_digit(&padded));
            padded
        }
        _ => {
            return Err(BarcodeError::InvalidBarcode {
                length,
                reason: BarcodeRejection::UnsupportedLength,
            })
        }
    };

    if ean13_check_digit(&canonical[..12]) != canonical[12] {
        return Err(checksum_mismatch(length));
    }

    Ok(CanonicalBarcode(
        canonical.iter().map(|d| char::from(b'0' + d)).collect(),
    ))
}

fn checksum_mismatch(length: usize) -> BarcodeError {
    BarcodeError::InvalidBarcode {
        length,
        reason: BarcodeRejection::ChecksumMismatch,
    }
}

/// EAN-13 check digit over the first 12 digits (x1 at even index, x3 at odd).
fn ean13_check_digit(body: &[u8]) -> u8 {
    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    // sum % 10 is < 10, so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation)]
    let check = ((10 - sum % 10) % 10) as u8;
    check
}

/// EAN-8 check digit over the first 7 digits (x3 at even index, x1 at odd).
fn ean8_check_digit(body: &[u8]) -> u8 {
    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    #[allow(clippy::cast_possible_truncation)]
    let check = ((10 - sum % 10) % 10) as u8;
    check
}
