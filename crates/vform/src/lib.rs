#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # VForm
//!
//! A headless library for binding form fields to a single validation and
//! submit lifecycle.
//!
//! VForm provides:
//! - A per-form [`FieldRegistry`] mapping field names to get/set/clear accessors
//! - A [`FormContext`] handle that fields receive explicitly at mount time
//! - Field components ([`TextField`], [`NumberField`], [`DateField`],
//!   [`SelectField`]) that keep their own local value and unregister on drop
//! - A [`FormContainer`] exposing `set_data`, `get_data`, `set_errors` and submit
//! - A submit coordinator ([`VForm`]) that remembers whether "save" or
//!   "save and close" triggered the current submit
//! - A declarative [`Schema`] that validates a snapshot into either coerced
//!   data or a path-keyed error map
//!
//! ## Example
//!
//! ```rust,ignore
//! use vform::{FieldPath, Rule, Schema, TextField, VForm};
//!
//! let form = VForm::new();
//! let name = TextField::mount(form.context(), "Nome").label("Nome");
//! let code = TextField::mount(form.context(), "CodigoRegiao");
//!
//! form.form().set_data(&serde_json::json!({ "Nome": "Acme" }));
//! name.input("Acme Ltda".to_string());
//!
//! let schema = Schema::object()
//!     .field("Nome", Rule::string().required())
//!     .field("CodigoRegiao", Rule::string().required());
//!
//! match form.form().validate(&schema) {
//!     Ok(data) => println!("valid: {data}"),
//!     Err(errors) => println!("{} field(s) need attention", errors.len()),
//! }
//! assert_eq!(code.error().as_deref(), Some("O campo é obrigatório"));
//! ```

pub mod context;
pub mod field;
pub mod form;
pub mod path;
pub mod registry;
pub mod schema;
pub mod submit;

pub use context::FormContext;
pub use field::{
    BoundField, DateField, DateKind, Field, FieldKind, NumberField, NumberKind, SelectField,
    SelectKind, SelectOption, TextField, TextKind, new_options,
};
pub use form::{FormContainer, FormSnapshot};
pub use path::{FieldPath, Segment};
pub use registry::{ErrorMap, FieldAccessors, FieldRegistry, RegistrationId};
pub use schema::{Messages, Rule, Schema, ValidationErrors, Violation};
pub use submit::{SubmitHandler, SubmitIntent, SubmitState, VForm};

use thiserror::Error;

// -----------------------------------------------------------------------------
// Errors
// -----------------------------------------------------------------------------

/// Errors returned by the strict form operations.
///
/// Most form operations treat a missing field as a silent no-op, because a
/// field that is not currently mounted (a conditionally rendered input, a row
/// that was just removed) is an expected state rather than a failure. The
/// `try_*` variants on [`FormContainer`] report it instead.
///
/// # Recovery Strategies
///
/// | Error Variant | Recovery Strategy |
/// |--------------|-------------------|
/// | [`InvalidPath`](FormError::InvalidPath) | Fix the field name at the call site |
/// | [`UnknownField`](FormError::UnknownField) | Mount the field first, or use the lenient accessor |
/// | [`Validation`](FormError::Validation) | Show the messages next to the fields, allow retry |
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A field path could not be parsed.
    ///
    /// Paths are dotted keys with optional bracketed indexes, such as
    /// `Categorias[0].Operacao`.
    #[error("invalid field path: {0}")]
    InvalidPath(String),

    /// No field is registered under the given name.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The form data did not satisfy its schema.
    ///
    /// The contained string summarizes the failure; the per-field messages
    /// live in [`ValidationErrors`].
    #[error("validation error: {0}")]
    Validation(String),
}

impl FormError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true if this error is recoverable by the user (validation errors).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<ValidationErrors> for FormError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// A specialized [`Result`] type for vform operations.
pub type Result<T> = std::result::Result<T, FormError>;

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_error_display() {
        let err = FormError::UnknownField("Nome".into());
        assert_eq!(format!("{}", err), "unknown field: Nome");

        let err = FormError::Validation("2 field(s) failed validation".to_string());
        assert_eq!(
            format!("{}", err),
            "validation error: 2 field(s) failed validation"
        );
    }

    #[test]
    fn test_only_validation_is_recoverable() {
        assert!(FormError::validation("x").is_recoverable());
        assert!(!FormError::InvalidPath("a[".into()).is_recoverable());
        assert!(!FormError::UnknownField("a".into()).is_recoverable());
    }
}
