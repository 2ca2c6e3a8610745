//! # Error Types
//!
//! Domain-specific error types for crm-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  crm-core errors (this file)                                           │
//! │  ├── CoreError        - Domain failures (kanban, API records, locale)  │
//! │  └── ValidationError  - Form field failures                            │
//! │                                                                         │
//! │  crm-cli errors (separate crate)                                       │
//! │  └── CliError / ConfigError                                            │
//! │                                                                         │
//! │  Flow: is_valid_* (bool) → ValidationError → FieldErrors → Frontend    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, card id, etc.)
//! 3. The pure predicates in `document` and `money` never produce these;
//!    they return `bool` or a zero value. Errors start at the `validation`
//!    layer and at stateful components.

use thiserror::Error;

use crate::document::DocumentKind;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A kanban card id is not on the board.
    #[error("Card not found: {0}")]
    CardNotFound(String),

    /// A kanban stage id is not on the board.
    #[error("Stage not found: {0}")]
    StageNotFound(String),

    /// The card already has an unresolved optimistic move.
    ///
    /// ## When This Occurs
    /// ```text
    /// drag card-7 to "Proposta" ──► begin_move (Pending)
    ///      │
    ///      ▼
    /// drag card-7 again before the API answered
    ///      │
    ///      ▼
    /// MoveAlreadyPending("card-7")
    /// ```
    #[error("Card {0} already has a pending move")]
    MoveAlreadyPending(String),

    /// `commit`/`rollback` called for a card without a pending move.
    #[error("Card {0} has no pending move")]
    NoPendingMove(String),

    /// Position outside the column.
    #[error("Position {index} out of bounds for stage {stage_id} (len {len})")]
    PositionOutOfBounds {
        stage_id: String,
        index: usize,
        len: usize,
    },

    /// An API record is missing a field required by the domain type.
    ///
    /// Raised once, at the fetch boundary, after every source key in the
    /// field's priority list came back empty.
    #[error("{entity} record is missing required field '{field}'")]
    MalformedRecord { entity: String, field: String },

    /// No currency format for the locale/currency pair.
    #[error("Unsupported locale/currency: {locale}/{currency}")]
    UnsupportedLocale { locale: String, currency: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Form field validation errors.
///
/// The `Display` output is the message shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// CPF or CNPJ failed its check digits.
    #[error("{field} is not a valid {kind}")]
    InvalidDocument { field: String, kind: DocumentKind },

    /// Phone number has the wrong digit count.
    #[error("{field} must have between 10 and 15 digits")]
    InvalidPhone { field: String },

    /// CEP is not in `00000-000` form.
    #[error("{field} must be a CEP in the form 00000-000")]
    InvalidPostalCode { field: String },

    /// Invalid format (e.g., invalid UUID, invalid e-mail).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Monetary value below zero.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Monetary value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },
}

impl ValidationError {
    /// The form field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidDocument { field, .. }
            | ValidationError::InvalidPhone { field }
            | ValidationError::InvalidPostalCode { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Negative { field }
            | ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
