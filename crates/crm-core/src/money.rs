//! # Money Module
//!
//! Provides the `Money` type and the masked-currency conversions used by
//! every monetary form field.
//!
//! ## Representations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  keystrokes        "1234,5x6"                                          │
//! │       │  apply_currency_mask (digits read as centavos)                 │
//! │       ▼                                                                 │
//! │  display form      "R$ 1.234,56"      '.' groups, ',' decimals          │
//! │       │  Money::parse_masked                                           │
//! │       ▼                                                                 │
//! │  Money             123456             i64 centavos, exact              │
//! │       │  to_canonical_string                                           │
//! │       ▼                                                                 │
//! │  canonical form    "1234.56"          API payloads                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Floating point only appears at the two edges that hand numbers to and
//! from JavaScript-shaped callers: [`remove_mask_to_number`] and
//! [`format_currency_brl`]. Everything in between is integer centavos.
//!
//! ## Usage
//! ```rust
//! use crm_core::money::{apply_currency_mask_brl, remove_mask_to_string, Money};
//!
//! assert_eq!(apply_currency_mask_brl("123456"), "R$ 1.234,56");
//! assert_eq!(remove_mask_to_string("R$ 1.234,56"), "1234.56");
//!
//! let fee = Money::parse_masked("50,00");
//! assert_eq!(fee.cents(), 5000);
//! assert_eq!(fee.to_string(), "R$ 50,00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use thiserror::Error;
use ts_rs::TS;

use crate::document::only_digits;
use crate::error::{CoreError, CoreResult};

/// Most significant digits `apply_currency_mask` keeps; keystrokes past
/// this are ignored, like a `maxlength` on the input.
pub const MAX_MASK_DIGITS: usize = 18;

/// `Money::MAX` plus one centavo as a float. Number inputs above it are
/// out of range.
const CENTS_LIMIT_F64: f64 = 1e18;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (1/100 of a real).
///
/// - **i64 (signed)**: discounts and refunds can go negative
/// - **Serialized as the centavo count**; use [`canonical`] for decimal
///   strings in API payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // R$ 10,99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a floating-point amount of reais,
    /// rounded to the nearest centavo.
    ///
    /// Non-finite input (NaN, ±∞) and magnitudes beyond [`Money::MAX`]
    /// become zero. Only for values that arrive as numbers from outside
    /// (JSON numbers, chart inputs).
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::Money;
    ///
    /// assert_eq!(Money::from_reais(1234.5).cents(), 123450);
    /// assert_eq!(Money::from_reais(f64::NAN), Money::zero());
    /// assert_eq!(Money::from_reais(1e20), Money::zero());
    /// ```
    pub fn from_reais(value: f64) -> Self {
        Money::try_from_reais(value).unwrap_or_default()
    }

    /// Like [`Money::from_reais`], `None` instead of zero when the value
    /// is not finite or out of range.
    pub fn try_from_reais(value: f64) -> Option<Money> {
        let cents = (value * 100.0).round();
        if cents.is_nan() || cents.abs() > CENTS_LIMIT_F64 {
            return None;
        }
        // The float nearest Money::MAX is the limit itself
        Some(Money((cents as i64).clamp(-Money::MAX.0, Money::MAX.0)))
    }

    /// Largest amount any reader accepts: 18 digits of centavos, the same
    /// limit [`apply_currency_mask`] enforces. Three amounts within it add
    /// without overflowing `i64`.
    pub const MAX: Money = Money(999_999_999_999_999_999);

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole reais portion (truncated toward zero).
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).reais(), 10);
    /// assert_eq!(Money::from_cents(-550).reais(), -5);
    /// ```
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// The value as a float, for callers that need a JS-style number.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Addition, `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtraction, `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Addition clamped to the `i64` range.
    #[inline]
    pub const fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Subtraction clamped to the `i64` range.
    #[inline]
    pub const fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Returns the percentage of this amount given in basis points
    /// (1000 = 10%), rounded half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // R$ 100,00
    /// assert_eq!(subtotal.percentage(1000).cents(), 1000); // R$ 10,00
    /// assert_eq!(Money::from_cents(1999).percentage(500).cents(), 100);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let scaled = self.0 as i128 * bps as i128;
        let rounded = if scaled < 0 {
            (scaled - 5000) / 10000
        } else {
            (scaled + 5000) / 10000
        };
        Money(rounded as i64)
    }

    /// Splits the amount into `parts` installments that add back up to it.
    ///
    /// Leftover centavos go to the first installments, one each.
    /// `parts == 0` yields an empty list.
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::Money;
    ///
    /// let parts = Money::from_cents(1000).split(3);
    /// assert_eq!(parts, vec![Money::from_cents(334), Money::from_cents(333), Money::from_cents(333)]);
    /// ```
    pub fn split(&self, parts: u32) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }
        let n = parts as i64;
        let base = self.0 / n;
        let remainder = self.0 % n;
        let step = remainder.signum();
        (0..n)
            .map(|i| {
                if i < remainder.abs() {
                    Money(base + step)
                } else {
                    Money(base)
                }
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Text conversions
    // -------------------------------------------------------------------------

    /// Parses a pt-BR masked string (`"R$ 1.234,56"`, `"1.234,56"`,
    /// `"-R$ 10,00"`), returning zero when it cannot be read.
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::Money;
    ///
    /// assert_eq!(Money::parse_masked("R$ 1.234,56").cents(), 123456);
    /// assert_eq!(Money::parse_masked("23.820,00").cents(), 2382000);
    /// assert_eq!(Money::parse_masked("abc"), Money::zero());
    /// ```
    pub fn parse_masked(masked: &str) -> Money {
        CurrencyFormat::BRL.parse(masked).unwrap_or_default()
    }

    /// Parses the canonical decimal form (`"1234.56"`, `"-10"`, `"0.5"`).
    ///
    /// Strict: thousands separators or a currency symbol make it `None`.
    pub fn from_canonical_str(s: &str) -> Option<Money> {
        AmountParts::split(s.trim(), None, '.')?.to_money().ok()
    }

    /// Canonical decimal string: `.` decimal separator, no grouping,
    /// exactly two fraction digits.
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(2382000).to_canonical_string(), "23820.00");
    /// assert_eq!(Money::from_cents(-5).to_canonical_string(), "-0.05");
    /// ```
    pub fn to_canonical_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }

    /// Formats with the given currency conventions.
    pub fn format(&self, fmt: &CurrencyFormat) -> String {
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        let space = if fmt.spaced { " " } else { "" };
        format!(
            "{}{}{}{}{}{:02}",
            sign,
            fmt.symbol,
            space,
            group_thousands(abs / 100, fmt.grouping),
            fmt.decimal,
            abs % 100
        )
    }
}

/// Inserts `sep` every three digits from the right.
fn group_thousands(value: u64, sep: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display uses the pt-BR/BRL form: `R$ 1.234,56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(&CurrencyFormat::BRL))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a quantity (e.g. number of seats).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Currency Format
// =============================================================================

/// Display conventions for one locale/currency pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormat {
    /// Currency symbol placed before the amount.
    pub symbol: &'static str,
    /// Thousands separator.
    pub grouping: char,
    /// Decimal separator.
    pub decimal: char,
    /// Whether a space separates symbol and amount.
    pub spaced: bool,
}

impl CurrencyFormat {
    /// pt-BR, Brazilian Real: `R$ 1.234,56`.
    pub const BRL: CurrencyFormat = CurrencyFormat {
        symbol: "R$",
        grouping: '.',
        decimal: ',',
        spaced: true,
    };

    /// en-US, US Dollar: `$1,234.56`.
    pub const USD: CurrencyFormat = CurrencyFormat {
        symbol: "$",
        grouping: ',',
        decimal: '.',
        spaced: false,
    };

    /// Resolves a BCP 47 locale (`pt-BR`, `en_US`, `es`) and an ISO 4217
    /// currency code to a format. `None` for unsupported pairs.
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::CurrencyFormat;
    ///
    /// assert_eq!(CurrencyFormat::resolve("pt-BR", "BRL"), Some(CurrencyFormat::BRL));
    /// assert_eq!(CurrencyFormat::resolve("en-US", "USD"), Some(CurrencyFormat::USD));
    /// assert_eq!(CurrencyFormat::resolve("pt-BR", "USD").unwrap().symbol, "US$");
    /// assert_eq!(CurrencyFormat::resolve("xx", "BRL"), None);
    /// ```
    pub fn resolve(locale: &str, currency_code: &str) -> Option<CurrencyFormat> {
        let language = locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let currency = currency_code.trim().to_ascii_uppercase();

        let (grouping, decimal, spaced) = match language.as_str() {
            "pt" | "es" => ('.', ',', true),
            "en" => (',', '.', false),
            _ => return None,
        };

        let symbol = match (language.as_str(), currency.as_str()) {
            (_, "BRL") => "R$",
            ("en", "USD") => "$",
            (_, "USD") => "US$",
            (_, "EUR") => "€",
            _ => return None,
        };

        Some(CurrencyFormat {
            symbol,
            grouping,
            decimal,
            spaced,
        })
    }

    /// Like [`CurrencyFormat::resolve`], failing with
    /// `CoreError::UnsupportedLocale` for unknown pairs.
    pub fn for_locale(locale: &str, currency_code: &str) -> CoreResult<CurrencyFormat> {
        CurrencyFormat::resolve(locale, currency_code).ok_or_else(|| CoreError::UnsupportedLocale {
            locale: locale.to_string(),
            currency: currency_code.to_string(),
        })
    }

    /// Parses a string masked in this format. `None` when unreadable or
    /// beyond [`Money::MAX`].
    ///
    /// Accepts the symbol (optional), grouping separators anywhere in the
    /// integer part, one decimal separator, and a single `-` either
    /// before or after the symbol. More than two fraction digits round
    /// half away from zero.
    pub fn parse(&self, masked: &str) -> Option<Money> {
        self.try_parse(masked).ok()
    }

    /// [`CurrencyFormat::parse`], telling unreadable text apart from an
    /// amount that is too large.
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::money::{AmountError, CurrencyFormat, Money};
    ///
    /// let brl = CurrencyFormat::BRL;
    /// assert_eq!(brl.try_parse("R$ 10,00"), Ok(Money::from_cents(1000)));
    /// assert_eq!(brl.try_parse("--5,00"), Err(AmountError::Unreadable));
    /// assert_eq!(brl.try_parse("92.233.720.368.547.758,07"), Err(AmountError::TooLarge));
    /// ```
    pub fn try_parse(&self, masked: &str) -> Result<Money, AmountError> {
        self.split_amount(masked)
            .ok_or(AmountError::Unreadable)?
            .to_money()
    }

    fn split_amount<'a>(&self, masked: &'a str) -> Option<AmountParts<'a>> {
        let mut rest = masked.trim();
        let mut negative = false;

        if let Some(r) = rest.strip_prefix('-') {
            negative = true;
            rest = r.trim_start();
        }
        if let Some(r) = rest.strip_prefix(self.symbol) {
            rest = r.trim_start();
        }

        // A '-' after the symbol is picked up by `AmountParts::split`
        let mut parts = AmountParts::split(rest, Some(self.grouping), self.decimal)?;
        if negative && parts.negative {
            return None;
        }
        parts.negative |= negative;
        Some(parts)
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat::BRL
    }
}

/// Why an amount could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("not a monetary amount")]
    Unreadable,

    #[error("amount exceeds {}", Money::MAX)]
    TooLarge,
}

/// Sign, integer digits and fraction digits of a decimal string.
#[derive(Debug)]
struct AmountParts<'a> {
    negative: bool,
    integer: String,
    fraction: &'a str,
}

impl<'a> AmountParts<'a> {
    /// Splits `s` at `decimal`, dropping `grouping` from the integer part.
    /// Fails on any other character or when no digit is present.
    fn split(s: &'a str, grouping: Option<char>, decimal: char) -> Option<Self> {
        let (negative, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (int_raw, fraction) = match s.split_once(decimal) {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        let integer: String = int_raw.chars().filter(|c| Some(*c) != grouping).collect();
        let all_digits = |t: &str| t.chars().all(|c| c.is_ascii_digit());
        if !all_digits(&integer) || !all_digits(fraction) {
            return None;
        }
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }

        Some(AmountParts {
            negative,
            integer,
            fraction,
        })
    }

    /// Exact centavo value, rounding past the second fraction digit.
    /// At most [`Money::MAX`] in magnitude.
    fn to_money(&self) -> Result<Money, AmountError> {
        // Digits only, so a failed parse is an overflow
        let whole: i64 = if self.integer.is_empty() {
            0
        } else {
            self.integer.parse().map_err(|_| AmountError::TooLarge)?
        };

        let mut frac = self.fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = frac.next().unwrap_or(0);
        let hundredths = frac.next().unwrap_or(0);
        let round_up = frac.next().is_some_and(|d| d >= 5);

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .filter(|c| *c <= Money::MAX.0)
            .ok_or(AmountError::TooLarge)?;
        Ok(Money(if self.negative { -cents } else { cents }))
    }

    /// The value as a float, without rounding the fraction.
    fn to_f64(&self) -> Option<f64> {
        let integer = if self.integer.is_empty() { "0" } else { &self.integer };
        let text = if self.fraction.is_empty() {
            integer.to_string()
        } else {
            format!("{}.{}", integer, self.fraction)
        };
        let value: f64 = text.parse().ok()?;
        Some(if self.negative { -value } else { value })
    }
}

// =============================================================================
// Serde Helpers
// =============================================================================

/// Serde adapter that writes `Money` as its canonical decimal string.
///
/// Reading accepts the canonical string, a pt-BR masked string, or a
/// JSON number of reais.
///
/// ```rust
/// use crm_core::money::Money;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Payload {
///     #[serde(with = "crm_core::money::canonical")]
///     value: Money,
/// }
///
/// let json = serde_json::to_string(&Payload { value: Money::from_cents(123450) }).unwrap();
/// assert_eq!(json, r#"{"value":"1234.50"}"#);
/// ```
pub mod canonical {
    use super::Money;
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&money.to_canonical_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string or a number of reais")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                Money::from_api_str(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                Ok(Money::from_reais(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                Ok(Money::from_reais(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                Ok(Money::from_reais(v as f64))
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

impl Money {
    /// Reads a monetary string as APIs send it.
    ///
    /// No `,` and at most one `.` means canonical (`"1234.5"`); anything
    /// else is read as pt-BR masked (`"1.234,50"`, `"R$ 10,00"`).
    pub fn from_api_str(s: &str) -> Option<Money> {
        let trimmed = s.trim();
        if !trimmed.contains(',') && trimmed.matches('.').count() <= 1 {
            if let Some(money) = Money::from_canonical_str(trimmed) {
                return Some(money);
            }
        }
        CurrencyFormat::BRL.parse(trimmed)
    }
}

// =============================================================================
// Form Helpers
// =============================================================================

/// Re-masks keystrokes as a currency display string.
///
/// Non-digits are discarded and the digit stream is read as centavos, so
/// the two rightmost digits are always the fraction. An input with no
/// digits yields an empty string so the field can be cleared.
///
/// ## Example
/// ```rust
/// use crm_core::money::{apply_currency_mask, CurrencyFormat};
///
/// assert_eq!(apply_currency_mask("1", &CurrencyFormat::BRL), "R$ 0,01");
/// assert_eq!(apply_currency_mask("R$ 1.234,567", &CurrencyFormat::BRL), "R$ 12.345,67");
/// assert_eq!(apply_currency_mask("123456", &CurrencyFormat::USD), "$1,234.56");
/// assert_eq!(apply_currency_mask("", &CurrencyFormat::BRL), "");
/// ```
pub fn apply_currency_mask(raw: &str, fmt: &CurrencyFormat) -> String {
    let digits = only_digits(raw);
    if digits.is_empty() {
        return String::new();
    }

    let significant = digits.trim_start_matches('0');
    let kept = &significant[..significant.len().min(MAX_MASK_DIGITS)];
    // At most 18 digits always fits in i64
    let cents: i64 = if kept.is_empty() { 0 } else { kept.parse().unwrap_or(0) };
    Money::from_cents(cents).format(fmt)
}

/// [`apply_currency_mask`] in pt-BR/BRL.
pub fn apply_currency_mask_brl(raw: &str) -> String {
    apply_currency_mask(raw, &CurrencyFormat::BRL)
}

/// Parses a pt-BR masked string to a float: `.` removed, `,` read as the
/// decimal point. Returns `0.0` for empty or unparseable input, and for
/// amounts beyond [`Money::MAX`].
///
/// ## Example
/// ```rust
/// use crm_core::money::remove_mask_to_number;
///
/// assert_eq!(remove_mask_to_number("1.234,56"), 1234.56);
/// assert_eq!(remove_mask_to_number("R$ 0,5"), 0.5);
/// assert_eq!(remove_mask_to_number(""), 0.0);
/// ```
pub fn remove_mask_to_number(masked: &str) -> f64 {
    CurrencyFormat::BRL
        .split_amount(masked)
        .filter(|parts| parts.to_money().is_ok())
        .and_then(|parts| parts.to_f64())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parses a pt-BR masked string to the canonical decimal string with
/// exactly two fraction digits. Returns `"0.00"` for unparseable input.
///
/// ## Example
/// ```rust
/// use crm_core::money::remove_mask_to_string;
///
/// assert_eq!(remove_mask_to_string("23.820,00"), "23820.00");
/// assert_eq!(remove_mask_to_string("R$ 5,5"), "5.50");
/// assert_eq!(remove_mask_to_string("n/a"), "0.00");
/// ```
pub fn remove_mask_to_string(masked: &str) -> String {
    Money::parse_masked(masked).to_canonical_string()
}

/// Formats a number of reais as `R$ 1.234,50`. NaN, infinities and
/// magnitudes beyond [`Money::MAX`] format as `R$ 0,00`, matching what
/// [`remove_mask_to_number`] returns for them.
///
/// ## Example
/// ```rust
/// use crm_core::money::format_currency_brl;
///
/// assert_eq!(format_currency_brl(1234.5), "R$ 1.234,50");
/// assert_eq!(format_currency_brl(f64::NAN), "R$ 0,00");
/// ```
pub fn format_currency_brl(value: f64) -> String {
    Money::from_reais(value).to_string()
}

/// [`format_currency_brl`] for a value that may be absent.
pub fn format_optional_currency_brl(value: Option<f64>) -> String {
    format_currency_brl(value.unwrap_or(0.0))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.reais(), 10);
        assert_eq!(money.centavos_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10,99");
        assert_eq!(Money::from_cents(123456789).to_string(), "R$ 1.234.567,89");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5,50");
        assert_eq!(Money::from_cents(0).to_string(), "R$ 0,00");
        assert_eq!(Money::from_cents(100000).to_string(), "R$ 1.000,00");
    }

    #[test]
    fn test_for_locale_reports_unsupported_pair() {
        assert_eq!(CurrencyFormat::for_locale("es-AR", "BRL").unwrap(), CurrencyFormat::BRL);
        assert!(matches!(
            CurrencyFormat::for_locale("fr-FR", "BRL"),
            Err(CoreError::UnsupportedLocale { ref locale, .. }) if locale == "fr-FR"
        ));
    }

    #[test]
    fn test_display_extremes_do_not_overflow() {
        assert_eq!(
            Money::from_cents(i64::MIN).to_canonical_string(),
            "-92233720368547758.08"
        );
        assert!(Money::from_cents(i64::MAX).to_string().starts_with("R$ 92.233"));
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_and_saturating_arithmetic() {
        let max = Money::from_cents(i64::MAX);
        let one = Money::from_cents(1);

        assert_eq!(max.checked_add(one), None);
        assert_eq!(Money::MAX.checked_add(one), Some(Money::from_cents(1_000_000_000_000_000_000)));
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(one), None);
        assert_eq!(max.saturating_add(one), max);
        assert_eq!(Money::from_cents(i64::MIN).saturating_sub(one).cents(), i64::MIN);
        assert_eq!(Money::from_cents(i64::MIN).abs(), max);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(Money::from_cents(10000).percentage(1000).cents(), 1000);
        assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83);
        assert_eq!(Money::from_cents(-1000).percentage(825).cents(), -83);
        assert_eq!(Money::from_cents(1000).percentage(0), Money::zero());
    }

    #[test]
    fn test_split_preserves_total() {
        let parts = Money::from_cents(100000).split(12);
        assert_eq!(parts.len(), 12);
        assert_eq!(parts.iter().copied().sum::<Money>().cents(), 100000);
        assert_eq!(parts[0].cents(), 8334);
        assert_eq!(parts[11].cents(), 8333);

        let negative = Money::from_cents(-1000).split(3);
        assert_eq!(negative.iter().copied().sum::<Money>().cents(), -1000);
        assert!(Money::from_cents(1000).split(0).is_empty());
    }

    #[test]
    fn test_parse_masked() {
        assert_eq!(Money::parse_masked("1.234,56").cents(), 123456);
        assert_eq!(Money::parse_masked("R$ 1.234,56").cents(), 123456);
        assert_eq!(Money::parse_masked("R$\u{a0}1.234,56").cents(), 123456);
        assert_eq!(Money::parse_masked("-R$ 10,00").cents(), -1000);
        assert_eq!(Money::parse_masked("R$ -10,00").cents(), -1000);
        assert_eq!(Money::parse_masked("1000").cents(), 100000);
        assert_eq!(Money::parse_masked(",5").cents(), 50);
        assert_eq!(Money::parse_masked("0,005").cents(), 1);
        assert_eq!(Money::parse_masked("0,004").cents(), 0);
    }

    #[test]
    fn test_parse_masked_fallbacks() {
        assert_eq!(Money::parse_masked(""), Money::zero());
        assert_eq!(Money::parse_masked("R$"), Money::zero());
        assert_eq!(Money::parse_masked("12a"), Money::zero());
        assert_eq!(Money::parse_masked("1,2,3"), Money::zero());
        assert_eq!(Money::parse_masked("99999999999999999999,00"), Money::zero());
    }

    #[test]
    fn test_parse_rejects_repeated_sign() {
        assert_eq!(Money::parse_masked("--5,00"), Money::zero());
        assert_eq!(Money::parse_masked("-R$ -5,00"), Money::zero());
        assert_eq!(Money::parse_masked("R$ --5,00"), Money::zero());
        assert_eq!(CurrencyFormat::BRL.try_parse("- -5"), Err(AmountError::Unreadable));
        assert_eq!(Money::from_canonical_str("--5.00"), None);
        assert_eq!(remove_mask_to_number("--5,00"), 0.0);
    }

    #[test]
    fn test_parse_caps_at_max() {
        let brl = CurrencyFormat::BRL;
        assert_eq!(brl.try_parse("9.999.999.999.999.999,99"), Ok(Money::MAX));
        assert_eq!(brl.try_parse("-9.999.999.999.999.999,99"), Ok(-Money::MAX));
        assert_eq!(brl.try_parse("10.000.000.000.000.000,00"), Err(AmountError::TooLarge));
        assert_eq!(brl.try_parse("92.233.720.368.547.758,07"), Err(AmountError::TooLarge));
        assert_eq!(brl.try_parse("9.999.999.999.999.999,995"), Err(AmountError::TooLarge));
        assert_eq!(Money::parse_masked("92.233.720.368.547.758,07"), Money::zero());
        assert_eq!(Money::from_api_str("10000000000000000.00"), None);
    }

    #[test]
    fn test_canonical_strings() {
        assert_eq!(Money::from_canonical_str("1234.50"), Some(Money::from_cents(123450)));
        assert_eq!(Money::from_canonical_str("-0.5"), Some(Money::from_cents(-50)));
        assert_eq!(Money::from_canonical_str("1.234,50"), None);

        assert_eq!(Money::from_api_str("1234.5"), Some(Money::from_cents(123450)));
        assert_eq!(Money::from_api_str("1.234,50"), Some(Money::from_cents(123450)));
        assert_eq!(Money::from_api_str("1.234.567"), Some(Money::from_cents(123456700)));
        assert_eq!(Money::from_api_str("R$ 10,00"), Some(Money::from_cents(1000)));
        assert_eq!(Money::from_api_str("x"), None);
    }

    #[test]
    fn test_canonical_serde() {
        #[derive(Serialize, Deserialize)]
        struct Payload {
            #[serde(with = "canonical")]
            value: Money,
        }

        let json = serde_json::to_string(&Payload {
            value: Money::from_cents(5),
        })
        .unwrap();
        assert_eq!(json, r#"{"value":"0.05"}"#);

        let from_str: Payload = serde_json::from_str(r#"{"value":"23.820,00"}"#).unwrap();
        assert_eq!(from_str.value.cents(), 2382000);
        let from_num: Payload = serde_json::from_str(r#"{"value":19.9}"#).unwrap();
        assert_eq!(from_num.value.cents(), 1990);
        let from_int: Payload = serde_json::from_str(r#"{"value":20}"#).unwrap();
        assert_eq!(from_int.value.cents(), 2000);
        assert!(serde_json::from_str::<Payload>(r#"{"value":"abc"}"#).is_err());
    }

    #[test]
    fn test_apply_currency_mask() {
        assert_eq!(apply_currency_mask_brl("123456"), "R$ 1.234,56");
        assert_eq!(apply_currency_mask_brl("R$ 1.234,56"), "R$ 1.234,56");
        assert_eq!(apply_currency_mask_brl("0001"), "R$ 0,01");
        assert_eq!(apply_currency_mask_brl("000"), "R$ 0,00");
        assert_eq!(apply_currency_mask_brl("abc"), "");
        assert_eq!(apply_currency_mask_brl(""), "");
        // Sign characters are not digits
        assert_eq!(apply_currency_mask_brl("-500"), "R$ 5,00");
    }

    #[test]
    fn test_apply_currency_mask_caps_length() {
        let long = "9".repeat(30);
        let masked = apply_currency_mask_brl(&long);
        assert_eq!(Money::parse_masked(&masked).cents(), 999_999_999_999_999_999);
    }

    #[test]
    fn test_remove_mask() {
        assert_eq!(remove_mask_to_number("1.234,56"), 1234.56);
        assert_eq!(remove_mask_to_number("R$ 1.234,567"), 1234.567);
        assert_eq!(remove_mask_to_number("-R$ 2,00"), -2.0);
        assert_eq!(remove_mask_to_number("garbage"), 0.0);

        assert_eq!(remove_mask_to_string("23.820,00"), "23820.00");
        assert_eq!(remove_mask_to_string("R$ 1.234,5"), "1234.50");
        assert_eq!(remove_mask_to_string(""), "0.00");
    }

    #[test]
    fn test_format_currency_brl() {
        assert_eq!(format_currency_brl(950.0), "R$ 950,00");
        assert_eq!(format_currency_brl(0.1 + 0.2), "R$ 0,30");
        assert_eq!(format_currency_brl(-1234.5), "-R$ 1.234,50");
        assert_eq!(format_currency_brl(f64::NAN), "R$ 0,00");
        assert_eq!(format_currency_brl(f64::INFINITY), "R$ 0,00");
        assert_eq!(format_optional_currency_brl(None), "R$ 0,00");
        assert_eq!(format_optional_currency_brl(Some(12.0)), "R$ 12,00");
    }

    #[test]
    fn test_format_beyond_max_is_zero() {
        assert_eq!(format_currency_brl(1e20), "R$ 0,00");
        assert_eq!(format_currency_brl(-1e20), "R$ 0,00");
        assert_eq!(Money::try_from_reais(1e20), None);
        assert_eq!(Money::try_from_reais(1e16), Some(Money::MAX));

        let huge = remove_mask_to_number("1.000.000.000.000.000.000,00");
        assert_eq!(huge, 0.0);
        assert_eq!(format_currency_brl(huge), "R$ 0,00");

        assert_eq!(
            format_currency_brl(remove_mask_to_number("1.000.000.000.000,00")),
            "R$ 1.000.000.000.000,00"
        );
    }

    #[test]
    fn test_currency_format_resolve() {
        assert_eq!(CurrencyFormat::resolve("pt_BR", "brl"), Some(CurrencyFormat::BRL));
        assert_eq!(CurrencyFormat::resolve("pt", "BRL"), Some(CurrencyFormat::BRL));
        assert_eq!(CurrencyFormat::resolve("en-US", "EUR").map(|f| f.symbol), Some("€"));
        assert_eq!(CurrencyFormat::resolve("pt-BR", "JPY"), None);

        let usd = CurrencyFormat::USD;
        assert_eq!(usd.parse("$1,234.56"), Some(Money::from_cents(123456)));
        assert_eq!(Money::from_cents(-123456).format(&usd), "-$1,234.56");
    }
}
