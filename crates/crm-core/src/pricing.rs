//! # Pricing Module
//!
//! Derived totals for enrollment proposals.
//!
//! ## Total Recalculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal field ─┐                                                      │
//! │  fee field ──────┼─► Money::parse_masked (unreadable → 0)              │
//! │  discount field ─┘          │                                           │
//! │                             ▼                                           │
//! │            total = subtotal + enrollment_fee - discount                 │
//! │                             │                                           │
//! │                             ▼                                           │
//! │                  total field: "R$ 950,00" (never NaN)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Recalculation depends only on the three operand strings, so running it
//! again on every change of any operand is idempotent.

use serde::{Deserialize, Serialize};

use crate::money::{self, Money};

/// The monetary operands of an enrollment proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPricing {
    pub subtotal: Money,
    pub enrollment_fee: Money,
    pub discount: Money,
}

impl EnrollmentPricing {
    pub const fn new(subtotal: Money, enrollment_fee: Money, discount: Money) -> Self {
        EnrollmentPricing {
            subtotal,
            enrollment_fee,
            discount,
        }
    }

    /// Reads the three operands from masked form fields.
    ///
    /// ## Example
    /// ```rust
    /// use crm_core::pricing::EnrollmentPricing;
    ///
    /// let pricing = EnrollmentPricing::from_masked("1.000,00", "50,00", "100,00");
    /// assert_eq!(pricing.total_display(), "R$ 950,00");
    /// ```
    pub fn from_masked(subtotal: &str, enrollment_fee: &str, discount: &str) -> Self {
        EnrollmentPricing {
            subtotal: Money::parse_masked(subtotal),
            enrollment_fee: Money::parse_masked(enrollment_fee),
            discount: Money::parse_masked(discount),
        }
    }

    /// `subtotal + enrollment_fee - discount`.
    ///
    /// Operands read from text are bounded by `Money::MAX`, so the sum is
    /// exact for them; operands built from raw centavos clamp at the
    /// `i64` range instead of overflowing.
    pub fn total(&self) -> Money {
        self.subtotal
            .saturating_add(self.enrollment_fee)
            .saturating_sub(self.discount)
    }

    /// The total as shown in the form.
    pub fn total_display(&self) -> String {
        self.total().to_string()
    }

    /// Sets the discount to a percentage (basis points) of the subtotal.
    /// The enrollment fee is never discounted.
    pub fn with_percentage_discount(self, bps: u32) -> Self {
        EnrollmentPricing {
            discount: self.subtotal.percentage(bps),
            ..self
        }
    }

    /// Splits the total into `count` installments; leftover centavos go
    /// to the first ones.
    pub fn installments(&self, count: u32) -> Vec<Money> {
        self.total().split(count)
    }

    /// Payload fields for the API, canonical decimal strings.
    pub fn to_payload(&self) -> PricingPayload {
        PricingPayload {
            subtotal: self.subtotal,
            enrollment_fee: self.enrollment_fee,
            discount: self.discount,
            total: self.total(),
        }
    }
}

/// Recomputes the displayed total from the three masked operand fields.
///
/// Goes through the float edge functions, like the form's change handler:
/// each operand via [`money::remove_mask_to_number`], the result via
/// [`money::format_currency_brl`].
///
/// ## Example
/// ```rust
/// use crm_core::pricing::recompute_total;
///
/// assert_eq!(recompute_total("1000,00", "50,00", "100,00"), "R$ 950,00");
/// assert_eq!(recompute_total("1000,00", "", "oops"), "R$ 1.000,00");
/// ```
pub fn recompute_total(subtotal: &str, enrollment_fee: &str, discount: &str) -> String {
    let total = money::remove_mask_to_number(subtotal) + money::remove_mask_to_number(enrollment_fee)
        - money::remove_mask_to_number(discount);
    money::format_currency_brl(total)
}

/// Outgoing API fields of a proposal's pricing.
///
/// ```json
/// {"subtotal":"1000.00","enrollmentFee":"50.00","discount":"100.00","total":"950.00"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPayload {
    #[serde(with = "money::canonical")]
    pub subtotal: Money,
    #[serde(with = "money::canonical")]
    pub enrollment_fee: Money,
    #[serde(with = "money::canonical")]
    pub discount: Money,
    #[serde(with = "money::canonical")]
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_composition() {
        let pricing = EnrollmentPricing::from_masked("1000,00", "50,00", "100,00");
        assert_eq!(pricing.total().cents(), 95000);
        assert_eq!(pricing.total_display(), "R$ 950,00");
    }

    #[test]
    fn test_unreadable_operands_count_as_zero() {
        let pricing = EnrollmentPricing::from_masked("R$ 1.000,00", "abc", "");
        assert_eq!(pricing.total_display(), "R$ 1.000,00");

        assert_eq!(recompute_total("", "", ""), "R$ 0,00");
        assert_eq!(recompute_total("x", "y", "z"), "R$ 0,00");
    }

    #[test]
    fn test_discount_above_total_goes_negative() {
        assert_eq!(recompute_total("100,00", "0,00", "150,00"), "-R$ 50,00");
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let first = recompute_total("R$ 23.820,00", "R$ 350,00", "R$ 1.191,00");
        let second = recompute_total("R$ 23.820,00", "R$ 350,00", "R$ 1.191,00");
        assert_eq!(first, "R$ 22.979,00");
        assert_eq!(first, second);
    }

    #[test]
    fn test_float_and_integer_paths_agree() {
        let (s, f, d) = ("1.999,99", "0,01", "333,33");
        assert_eq!(
            recompute_total(s, f, d),
            EnrollmentPricing::from_masked(s, f, d).total_display()
        );
    }

    #[test]
    fn test_huge_operands_do_not_overflow() {
        let pricing = EnrollmentPricing::from_masked("92.233.720.368.547.758,07", "1,00", "");
        assert_eq!(pricing.total_display(), "R$ 1,00");

        let raw = EnrollmentPricing::new(Money::from_cents(i64::MAX), Money::from_cents(100), Money::zero());
        assert_eq!(raw.total().cents(), i64::MAX);
        let raw = EnrollmentPricing::new(Money::zero(), Money::zero(), Money::from_cents(i64::MIN));
        assert_eq!(raw.total().cents(), i64::MAX);
    }

    #[test]
    fn test_percentage_discount() {
        let pricing = EnrollmentPricing::from_masked("2.000,00", "100,00", "")
            .with_percentage_discount(1500);
        assert_eq!(pricing.discount.cents(), 30000);
        assert_eq!(pricing.total_display(), "R$ 1.800,00");
    }

    #[test]
    fn test_installments() {
        let pricing = EnrollmentPricing::from_masked("1.000,00", "0,00", "0,00");
        let parts = pricing.installments(3);
        assert_eq!(
            parts,
            vec![
                Money::from_cents(33334),
                Money::from_cents(33333),
                Money::from_cents(33333)
            ]
        );
    }

    #[test]
    fn test_payload_serialization() {
        let payload = EnrollmentPricing::from_masked("1000,00", "50,00", "100,00").to_payload();
        let json = serde_json::to_value(payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "subtotal": "1000.00",
                "enrollmentFee": "50.00",
                "discount": "100.00",
                "total": "950.00",
            })
        );
    }
}
