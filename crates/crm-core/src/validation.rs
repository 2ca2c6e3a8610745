//! # Validation Module
//!
//! Field-level validation for the client and enrollment forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Predicates (document, money)                                 │
//! │  ├── is_valid_cpf, is_valid_cep, ...                                   │
//! │  └── bool only, empty input is valid                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── validate_required: presence                                       │
//! │  ├── validate_cpf, ...: false → ValidationError { field }              │
//! │  └── FieldErrors: first error per field, for the form to display       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: REST API                                                      │
//! │  └── Server-side constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use crm_core::validation::{validate_client_form, ClientForm};
//!
//! let form = ClientForm {
//!     name: "Maria Souza".to_string(),
//!     document: Some("529.982.247-25".to_string()),
//!     ..ClientForm::default()
//! };
//! assert!(validate_client_form(&form).is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::document::{self, DocumentKind};
use crate::error::ValidationError;
use crate::money::{AmountError, CurrencyFormat, Money};
use crate::pricing::EnrollmentPricing;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted person/company/course name.
pub const MAX_NAME_LEN: usize = 200;

/// Treats whitespace-only input as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Presence and Text Validators
// =============================================================================

/// Requires a non-blank value and returns it trimmed.
///
/// ## Example
/// ```rust
/// use crm_core::validation::validate_required;
///
/// assert_eq!(validate_required("name", Some("  Ana ")).unwrap(), "Ana");
/// assert!(validate_required("name", Some("   ")).is_err());
/// assert!(validate_required("name", None).is_err());
/// ```
pub fn validate_required<'a>(field: &str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    present(value).ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

/// Validates a required name of at most 200 characters.
pub fn validate_name<'a>(field: &str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    let name = validate_required(field, value)?;

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name)
}

/// Validates an optional e-mail address.
///
/// ## Rules
/// - Exactly one `@` with text on both sides
/// - A `.` inside the domain, not at its edges
/// - No whitespace
pub fn validate_email(field: &str, value: Option<&str>) -> ValidationResult<()> {
    let Some(email) = present(value) else {
        return Ok(());
    };

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a valid e-mail address".to_string(),
        });
    }

    Ok(())
}

/// Validates a required UUID (API entity ids).
///
/// ## Example
/// ```rust
/// use crm_core::validation::validate_uuid;
///
/// assert!(validate_uuid("clientId", Some("550e8400-e29b-41d4-a716-446655440000")).is_ok());
/// assert!(validate_uuid("clientId", Some("not-a-uuid")).is_err());
/// ```
pub fn validate_uuid(field: &str, value: Option<&str>) -> ValidationResult<uuid::Uuid> {
    let id = validate_required(field, value)?;

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })
}

// =============================================================================
// Document Validators
// =============================================================================

/// Optional CPF: absent passes, present must validate.
pub fn validate_cpf(field: &str, value: Option<&str>) -> ValidationResult<()> {
    if document::is_valid_cpf(present(value)) {
        Ok(())
    } else {
        Err(invalid_document(field, DocumentKind::Cpf))
    }
}

/// Optional CNPJ: absent passes, present must validate.
pub fn validate_cnpj(field: &str, value: Option<&str>) -> ValidationResult<()> {
    if document::is_valid_cnpj(present(value)) {
        Ok(())
    } else {
        Err(invalid_document(field, DocumentKind::Cnpj))
    }
}

/// Optional CPF or CNPJ in one field.
///
/// An unrecognized digit count is reported against the kind it is closer
/// to: up to 11 digits as CPF, longer as CNPJ.
pub fn validate_cpf_or_cnpj(field: &str, value: Option<&str>) -> ValidationResult<()> {
    if document::is_valid_cpf_or_cnpj(present(value)) {
        return Ok(());
    }

    let raw = value.unwrap_or_default();
    let kind = document::detect_document(raw).unwrap_or_else(|| {
        if document::only_digits(raw).len() <= document::CPF_LEN {
            DocumentKind::Cpf
        } else {
            DocumentKind::Cnpj
        }
    });
    Err(invalid_document(field, kind))
}

fn invalid_document(field: &str, kind: DocumentKind) -> ValidationError {
    ValidationError::InvalidDocument {
        field: field.to_string(),
        kind,
    }
}

/// Optional phone number.
pub fn validate_phone(field: &str, value: Option<&str>) -> ValidationResult<()> {
    if document::is_valid_phone(present(value)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone {
            field: field.to_string(),
        })
    }
}

/// Optional CEP.
pub fn validate_cep(field: &str, value: Option<&str>) -> ValidationResult<()> {
    if document::is_valid_cep(present(value)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPostalCode {
            field: field.to_string(),
        })
    }
}

// =============================================================================
// Money Validators
// =============================================================================

/// Reads an optional masked amount that must not be negative.
///
/// Blank is zero. Unlike [`Money::parse_masked`], text that cannot be read
/// is an error here, since the user must correct it before submitting.
/// Amounts beyond [`Money::MAX`] are out of range.
pub fn validate_money_non_negative(field: &str, value: Option<&str>) -> ValidationResult<Money> {
    let Some(masked) = present(value) else {
        return Ok(Money::zero());
    };

    let amount = CurrencyFormat::BRL.try_parse(masked).map_err(|err| match err {
        AmountError::Unreadable => ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a monetary amount".to_string(),
        },
        AmountError::TooLarge => ValidationError::OutOfRange {
            field: field.to_string(),
            min: Money::zero().to_string(),
            max: Money::MAX.to_string(),
        },
    })?;

    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(amount)
}

// =============================================================================
// Field Error Map
// =============================================================================

/// Validation messages keyed by form field, first error per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        FieldErrors::default()
    }

    /// Records the error of `result`, if any, and passes its value through.
    pub fn check<T>(&mut self, result: ValidationResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    /// Records an error unless its field already has one.
    pub fn push(&mut self, err: ValidationError) {
        self.0
            .entry(err.field().to_string())
            .or_insert_with(|| err.to_string());
    }

    /// Message for one field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Client registration form, as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientForm {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// CPF or CNPJ.
    pub document: Option<String>,
    pub cep: Option<String>,
}

/// Validates the client form.
///
/// ## Rules
/// - `name`: required, at most 200 characters
/// - `email`, `phone`, `document`, `cep`: optional, valid when present
pub fn validate_client_form(form: &ClientForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    errors.check(validate_name("name", Some(form.name.as_str())));
    errors.check(validate_email("email", form.email.as_deref()));
    errors.check(validate_phone("phone", form.phone.as_deref()));
    errors.check(validate_cpf_or_cnpj("document", form.document.as_deref()));
    errors.check(validate_cep("cep", form.cep.as_deref()));

    errors.into_result(())
}

/// Enrollment proposal form, money fields still masked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrollmentForm {
    pub client_id: String,
    pub course_name: String,
    pub subtotal: String,
    pub enrollment_fee: String,
    pub discount: String,
}

/// Validates the enrollment form and returns its pricing.
///
/// ## Rules
/// - `clientId`: required UUID
/// - `courseName`: required, at most 200 characters
/// - `subtotal`, `enrollmentFee`, `discount`: readable, not negative
/// - `discount` at most `subtotal + enrollmentFee`
///
/// ## User Workflow
/// ```text
/// Submit proposal
///      │
///      ▼
/// validate_enrollment_form ← THIS FUNCTION
///      │
///      ├── errors? → FieldErrors shown next to each input
///      │
///      └── OK → EnrollmentPricing::to_payload() → POST /enrollments
/// ```
pub fn validate_enrollment_form(form: &EnrollmentForm) -> Result<EnrollmentPricing, FieldErrors> {
    let mut errors = FieldErrors::new();

    errors.check(validate_uuid("clientId", Some(form.client_id.as_str())));
    errors.check(validate_name("courseName", Some(form.course_name.as_str())));

    let subtotal = errors.check(validate_money_non_negative("subtotal", Some(form.subtotal.as_str())));
    let fee = errors.check(validate_money_non_negative(
        "enrollmentFee",
        Some(form.enrollment_fee.as_str()),
    ));
    let discount = errors.check(validate_money_non_negative("discount", Some(form.discount.as_str())));

    if let (Some(subtotal), Some(fee), Some(discount)) = (subtotal, fee, discount) {
        let Some(ceiling) = subtotal.checked_add(fee) else {
            errors.push(ValidationError::OutOfRange {
                field: "enrollmentFee".to_string(),
                min: Money::zero().to_string(),
                max: Money::MAX.to_string(),
            });
            return Err(errors);
        };
        if discount > ceiling {
            errors.push(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: Money::zero().to_string(),
                max: ceiling.to_string(),
            });
        }
        return errors.into_result(EnrollmentPricing::new(subtotal, fee, discount));
    }

    Err(errors)
}

// =============================================================================
// Unit Tests
// =============================================================================
