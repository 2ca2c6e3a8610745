//! # Document Module
//!
//! Validators and display masks for Brazilian identifiers: CPF, CNPJ,
//! phone numbers and CEP postal codes.
//!
//! ## Validation Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw input ──► only_digits ──► length rule ──► checksum ──► bool        │
//! │                                                                         │
//! │  • Empty or absent input is VALID: presence is checked separately      │
//! │    by `validation::validate_required`.                                 │
//! │  • Every function is total: malformed input returns `false`,           │
//! │    nothing here panics or returns an error.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use crm_core::document::{is_valid_cpf, is_valid_cnpj, format_cpf};
//!
//! assert!(is_valid_cpf("529.982.247-25"));
//! assert!(is_valid_cpf(None));
//! assert!(!is_valid_cpf("111.111.111-11"));
//! assert!(is_valid_cnpj("11.222.333/0001-81"));
//! assert_eq!(format_cpf("52998224725").as_deref(), Some("529.982.247-25"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// CPF length in digits (9 base digits + 2 check digits).
pub const CPF_LEN: usize = 11;

/// CNPJ length in digits (12 base digits + 2 check digits).
pub const CNPJ_LEN: usize = 14;

/// CEP length in digits.
pub const CEP_LEN: usize = 8;

/// Accepted phone digit counts: area code + subscriber, optionally with
/// a country code in front.
pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 15;

/// CNPJ weights for the second check digit. The first check digit uses
/// the same sequence without its leading 6.
const CNPJ_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

// =============================================================================
// Document Kind
// =============================================================================

/// Which national registry a document number belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Individual taxpayer (Cadastro de Pessoas Físicas).
    Cpf,
    /// Company (Cadastro Nacional da Pessoa Jurídica).
    Cnpj,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Cpf => f.write_str("CPF"),
            DocumentKind::Cnpj => f.write_str("CNPJ"),
        }
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Strips every character that is not an ASCII digit.
///
/// ## Example
/// ```rust
/// use crm_core::document::only_digits;
///
/// assert_eq!(only_digits("529.982.247-25"), "52998224725");
/// assert_eq!(only_digits("(11) 98765-4321"), "11987654321");
/// assert_eq!(only_digits(""), "");
/// ```
pub fn only_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Digit values of `raw`, non-digits skipped.
fn digit_values(raw: &str) -> Vec<u32> {
    raw.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// `true` for absent or empty input, which every validator accepts.
fn is_blank(raw: Option<&str>) -> bool {
    raw.map_or(true, str::is_empty)
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

// =============================================================================
// CPF
// =============================================================================

/// CPF check digit over `digits` with descending weights starting at
/// `len + 1`.
fn cpf_check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        d => d,
    }
}

/// Validates a CPF.
///
/// ## Rules
/// - Empty or absent: valid (optional field)
/// - Exactly 11 digits after stripping punctuation
/// - Not a repetition of a single digit (`000.000.000-00` passes the
///   checksum but is not issued)
/// - Both check digits match
///
/// ## Example
/// ```rust
/// use crm_core::document::is_valid_cpf;
///
/// assert!(is_valid_cpf("52998224725"));
/// assert!(is_valid_cpf(""));
/// assert!(!is_valid_cpf("52998224724"));
/// assert!(!is_valid_cpf("00000000000"));
/// ```
pub fn is_valid_cpf<'a>(raw: impl Into<Option<&'a str>>) -> bool {
    let raw = raw.into();
    if is_blank(raw) {
        return true;
    }

    let digits = digit_values(raw.unwrap_or_default());
    if digits.len() != CPF_LEN || all_same(&digits) {
        return false;
    }

    cpf_check_digit(&digits[..9]) == digits[9] && cpf_check_digit(&digits[..10]) == digits[10]
}

// =============================================================================
// CNPJ
// =============================================================================

/// CNPJ check digit over `digits` (12 or 13 of them).
fn cnpj_check_digit(digits: &[u32]) -> u32 {
    let weights = &CNPJ_WEIGHTS[CNPJ_WEIGHTS.len() - digits.len()..];
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

/// Validates a CNPJ.
///
/// ## Rules
/// - Empty or absent: valid (optional field)
/// - Exactly 14 digits after stripping punctuation
/// - Not a repetition of a single digit
/// - Check digits with weights `5,4,3,2,9,8,7,6,5,4,3,2` and
///   `6,5,4,3,2,9,8,7,6,5,4,3,2`
///
/// ## Example
/// ```rust
/// use crm_core::document::is_valid_cnpj;
///
/// assert!(is_valid_cnpj("11.222.333/0001-81"));
/// assert!(!is_valid_cnpj("11.222.333/0001-82"));
/// assert!(!is_valid_cnpj("11111111111111"));
/// ```
pub fn is_valid_cnpj<'a>(raw: impl Into<Option<&'a str>>) -> bool {
    let raw = raw.into();
    if is_blank(raw) {
        return true;
    }

    let digits = digit_values(raw.unwrap_or_default());
    if digits.len() != CNPJ_LEN || all_same(&digits) {
        return false;
    }

    cnpj_check_digit(&digits[..12]) == digits[12] && cnpj_check_digit(&digits[..13]) == digits[13]
}

// =============================================================================
// CPF or CNPJ
// =============================================================================

/// Guesses the document kind from its digit count.
///
/// Used by forms with a single "CPF/CNPJ" input. Says nothing about
/// checksum validity.
pub fn detect_document(raw: &str) -> Option<DocumentKind> {
    match only_digits(raw).len() {
        CPF_LEN => Some(DocumentKind::Cpf),
        CNPJ_LEN => Some(DocumentKind::Cnpj),
        _ => None,
    }
}

/// Validates a value that may be either a CPF or a CNPJ.
pub fn is_valid_cpf_or_cnpj<'a>(raw: impl Into<Option<&'a str>>) -> bool {
    let raw = raw.into();
    match raw {
        None | Some("") => true,
        Some(value) => match detect_document(value) {
            Some(DocumentKind::Cpf) => is_valid_cpf(value),
            Some(DocumentKind::Cnpj) => is_valid_cnpj(value),
            None => false,
        },
    }
}

// =============================================================================
// Phone and CEP
// =============================================================================

/// Validates a phone number by digit count (10 to 15 digits).
///
/// ## Example
/// ```rust
/// use crm_core::document::is_valid_phone;
///
/// assert!(is_valid_phone("(11) 98765-4321"));
/// assert!(is_valid_phone("+55 11 98765-4321"));
/// assert!(!is_valid_phone("123"));
/// ```
pub fn is_valid_phone<'a>(raw: impl Into<Option<&'a str>>) -> bool {
    let raw = raw.into();
    if is_blank(raw) {
        return true;
    }

    let len = only_digits(raw.unwrap_or_default()).len();
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&len)
}

/// Validates a CEP.
///
/// Accepts exactly `DDDDD-DDD` or exactly eight bare digits, after
/// trimming surrounding whitespace. Any other punctuation or digit count
/// is rejected.
///
/// ## Example
/// ```rust
/// use crm_core::document::is_valid_cep;
///
/// assert!(is_valid_cep("01310-100"));
/// assert!(is_valid_cep("01310100"));
/// assert!(!is_valid_cep("0131010"));
/// assert!(!is_valid_cep("013.10-100"));
/// ```
pub fn is_valid_cep<'a>(raw: impl Into<Option<&'a str>>) -> bool {
    let raw = raw.into();
    if is_blank(raw) {
        return true;
    }

    let bytes = raw.unwrap_or_default().trim().as_bytes();
    match bytes.len() {
        8 => bytes.iter().all(u8::is_ascii_digit),
        9 => {
            bytes[5] == b'-'
                && bytes[..5].iter().all(u8::is_ascii_digit)
                && bytes[6..].iter().all(u8::is_ascii_digit)
        }
        _ => false,
    }
}

// =============================================================================
// Display Masks
// =============================================================================

/// Masks a CPF as `000.000.000-00`. `None` unless the input has 11 digits.
pub fn format_cpf(raw: &str) -> Option<String> {
    let d = only_digits(raw);
    (d.len() == CPF_LEN).then(|| format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]))
}

/// Masks a CNPJ as `00.000.000/0000-00`. `None` unless the input has 14 digits.
pub fn format_cnpj(raw: &str) -> Option<String> {
    let d = only_digits(raw);
    (d.len() == CNPJ_LEN).then(|| {
        format!(
            "{}.{}.{}/{}-{}",
            &d[..2],
            &d[2..5],
            &d[5..8],
            &d[8..12],
            &d[12..]
        )
    })
}

/// Masks a CEP as `00000-000`. `None` unless the input has 8 digits.
pub fn format_cep(raw: &str) -> Option<String> {
    let d = only_digits(raw);
    (d.len() == CEP_LEN).then(|| format!("{}-{}", &d[..5], &d[5..]))
}

/// Masks a Brazilian phone number.
///
/// - 11 digits (mobile): `(11) 98765-4321`
/// - 10 digits (landline): `(11) 3456-7890`
///
/// Other lengths (country code included) are returned as `None`; callers
/// keep the digits as typed.
pub fn format_phone(raw: &str) -> Option<String> {
    let d = only_digits(raw);
    match d.len() {
        11 => Some(format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..])),
        10 => Some(format!("({}) {}-{}", &d[..2], &d[2..6], &d[6..])),
        _ => None,
    }
}

/// Masks a CPF or CNPJ depending on its digit count.
pub fn format_document(raw: &str) -> Option<String> {
    match detect_document(raw)? {
        DocumentKind::Cpf => format_cpf(raw),
        DocumentKind::Cnpj => format_cnpj(raw),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Validators are total over arbitrary input.
        #[test]
        fn validators_never_panic(raw in ".{0,40}") {
            let _ = is_valid_cpf(raw.as_str());
            let _ = is_valid_cnpj(raw.as_str());
            let _ = is_valid_phone(raw.as_str());
            let _ = is_valid_cep(raw.as_str());
            let _ = format_document(&raw);
        }

        /// Stripping keeps exactly the digit characters.
        #[test]
        fn only_digits_keeps_digit_count(raw in "[0-9a-z .\\-/()]{0,40}") {
            let expected = raw.chars().filter(|c| c.is_ascii_digit()).count();
            prop_assert_eq!(only_digits(&raw).len(), expected);
        }

        /// Punctuation does not change a CPF verdict.
        #[test]
        fn cpf_mask_is_transparent(digits in "[0-9]{11}") {
            let masked = format_cpf(&digits).unwrap();
            prop_assert_eq!(is_valid_cpf(digits.as_str()), is_valid_cpf(masked.as_str()));
        }

        /// Completing 9 base digits with computed check digits always validates,
        /// unless the result is a repeated digit.
        #[test]
        fn generated_cpf_validates(base in prop::collection::vec(0u32..10, 9)) {
            let mut digits = base;
            digits.push(cpf_check_digit(&digits));
            digits.push(cpf_check_digit(&digits));
            let cpf: String = digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect();
            prop_assert_eq!(is_valid_cpf(cpf.as_str()), !all_same(&digits));
        }

        /// Same for CNPJ with 12 base digits.
        #[test]
        fn generated_cnpj_validates(base in prop::collection::vec(0u32..10, 12)) {
            let mut digits = base;
            digits.push(cnpj_check_digit(&digits));
            digits.push(cnpj_check_digit(&digits));
            let cnpj: String = digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect();
            prop_assert_eq!(is_valid_cnpj(cnpj.as_str()), !all_same(&digits));
        }
    }
}
