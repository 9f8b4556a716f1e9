//! Two-step product deletion.

use super::FormError;
use crate::types::ProductId;

/// A deletion the user has asked for but not yet confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRequest {
    id: ProductId,
}

/// Proof that a deletion was confirmed. Only [`DeleteRequest`] can mint one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedDelete {
    id: ProductId,
}

impl DeleteRequest {
    #[must_use]
    pub const fn new(id: ProductId) -> Self {
        Self { id }
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    /// Confirm with a typed answer; `y` and `yes` (any case) accept.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::NotConfirmed`] for any other answer.
    pub fn confirm(self, answer: &str) -> Result<ConfirmedDelete, FormError> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(self.confirm_unprompted()),
            _ => Err(FormError::NotConfirmed),
        }
    }

    /// Confirm without asking, for `--yes`.
    #[must_use]
    pub const fn confirm_unprompted(self) -> ConfirmedDelete {
        ConfirmedDelete { id: self.id }
    }
}

impl ConfirmedDelete {
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }
}
