//! # crm-core: Pure Business Logic for the School CRM
//!
//! Brazilian document validators, BRL currency masking, enrollment pricing
//! and the kanban pipeline, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CRM Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend forms / kanban                      │   │
//! │  │   Client form ──► Enrollment form ──► Pipeline board           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ keystrokes, API records                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ crm-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │ document │ │  money  │ │ pricing │ │validation│ │ kanban │ │   │
//! │  │   │ CPF/CNPJ │ │  Money  │ │  total  │ │FieldErrs │ │ board  │ │   │
//! │  │   │ phone/CEP│ │  masks  │ │         │ │  forms   │ │ moves  │ │   │
//! │  │   └──────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘ │   │
//! │  │                     types: API record normalization             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/crm-cli (thin shell)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`document`] - CPF, CNPJ, phone and CEP predicates and formatters
//! - [`money`] - Money type (integer centavos) and currency masks
//! - [`pricing`] - `total = subtotal + enrollment_fee - discount`
//! - [`validation`] - Field validators and form-level `FieldErrors`
//! - [`types`] - Domain types normalized from API records
//! - [`kanban`] - Pipeline board with optimistic moves
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Total predicates**: validators never panic; absent input is valid
//! 2. **No I/O**: network and storage live in the callers
//! 3. **Integer Money**: amounts are centavos (i64); floats only at the edges
//! 4. **Explicit Errors**: stateful operations return typed errors
//!
//! ## Example Usage
//!
//! ```rust
//! use crm_core::document::{is_valid_cnpj, is_valid_cpf};
//! use crm_core::money::apply_currency_mask_brl;
//! use crm_core::pricing::recompute_total;
//!
//! assert!(is_valid_cpf("529.982.247-25"));
//! assert!(is_valid_cnpj("11.222.333/0001-81"));
//! assert!(is_valid_cpf(None)); // presence is checked separately
//!
//! assert_eq!(apply_currency_mask_brl("95000"), "R$ 950,00");
//! assert_eq!(recompute_total("1.000,00", "50,00", "100,00"), "R$ 950,00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod document;
pub mod error;
pub mod kanban;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use crm_core::Money` instead of
// `use crm_core::money::Money`

pub use document::DocumentKind;
pub use error::{CoreError, CoreResult, ValidationError};
pub use kanban::{KanbanBoard, KanbanCard, MoveState};
pub use money::{AmountError, CurrencyFormat, Money};
pub use pricing::EnrollmentPricing;
pub use types::*;
pub use validation::FieldErrors;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "pt-BR";

/// ISO 4217 code used when none is configured.
pub const DEFAULT_CURRENCY: &str = "BRL";
