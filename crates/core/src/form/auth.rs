//! Login and registration forms.

use core::fmt;

use serde::Serialize;

use super::{FieldErrors, FormError, REQUIRED};
use crate::types::Email;

/// Raw login input.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Token request body.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns [`FormError::Invalid`] if either field is blank.
    pub fn validate(&self) -> Result<Credentials, FormError> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim();
        if username.is_empty() {
            errors.push("username", REQUIRED);
        }
        // Passwords are sent as typed.
        if self.password.is_empty() {
            errors.push("password", REQUIRED);
        }
        errors
            .into_result(Credentials {
                username: username.to_owned(),
                password: self.password.clone(),
            })
            .map_err(FormError::Invalid)
    }
}

/// Raw registration input.
#[derive(Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration request body.
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: Email,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl RegisterForm {
    /// # Errors
    ///
    /// Returns [`FormError::Invalid`] for blank fields or a malformed email.
    pub fn validate(&self) -> Result<Registration, FormError> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.push("username", REQUIRED);
        }
        let email = Email::parse(&self.email)
            .map_err(|e| errors.push("email", e.to_string()))
            .ok();
        if self.password.is_empty() {
            errors.push("password", REQUIRED);
        }

        match email {
            Some(email) if errors.is_empty() => Ok(Registration {
                username: username.to_owned(),
                email,
                password: self.password.clone(),
            }),
            _ => Err(FormError::Invalid(errors)),
        }
    }
}
