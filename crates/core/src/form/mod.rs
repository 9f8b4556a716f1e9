//! Form input validation.
//!
//! Each form takes raw text as typed and either produces the request body
//! the API expects or a [`FieldErrors`] listing every failing field.

mod auth;
mod delete;
mod errors;
mod product;

pub use auth::{Credentials, LoginForm, RegisterForm, Registration};
pub use delete::{ConfirmedDelete, DeleteRequest};
pub use errors::FieldErrors;
pub use product::{
    IMAGE_EXTENSIONS, NewProduct, ProductChanges, ProductForm, ProductPatchForm,
};

use thiserror::Error;

/// Message for a missing required field.
pub const REQUIRED: &str = "this field is required";

/// Why a form could not be submitted.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error("provide at least one field to update")]
    NothingToUpdate,

    #[error("deletion was not confirmed")]
    NotConfirmed,
}

impl FormError {
    /// Field messages, if this is a validation failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}
