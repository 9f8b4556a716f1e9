//! Email address collected at registration.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an email address was rejected by the registration form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("this field may not be blank")]
    Blank,
    #[error("ensure this field has no more than {max} characters")]
    TooLong { max: usize },
    /// Anything structurally wrong: no `@`, several `@`, an empty side, or
    /// a domain without a dot.
    #[error("enter a valid email address")]
    Malformed,
}

/// A structurally valid email address.
///
/// Only the `local@domain.tld` shape is checked; the server owns uniqueness
/// and deliverability.
///
/// ```
/// use inventory_core::Email;
///
/// assert!(Email::parse("clerk@shop.example").is_ok());
/// assert!(Email::parse("clerk@localhost").is_err());
/// assert!(Email::parse("a@b@c.d").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Parse and trim an address typed into a form.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] when the input is blank, too long, or not of
    /// the form `local@domain.tld`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Blank);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::Malformed)?;
        let domain_ok = domain.contains('.')
            && !domain.contains('@')
            && domain.split('.').all(|label| !label.is_empty());
        if local.is_empty() || !domain_ok || s.chars().any(char::is_whitespace) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_addresses() {
        for ok in [
            "clerk@shop.example",
            "first.last+stock@warehouse.co.uk",
            "a@b.c",
        ] {
            assert!(Email::parse(ok).is_ok(), "{ok} should parse");
        }
    }

    #[test]
    fn test_blank_and_too_long() {
        assert_eq!(Email::parse("   "), Err(EmailError::Blank));
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_malformed_shapes() {
        for bad in [
            "no-at-symbol",
            "@shop.example",
            "clerk@",
            "clerk@localhost",
            "clerk@shop..example",
            "a@b@c.d",
            "cl erk@shop.example",
        ] {
            assert_eq!(Email::parse(bad), Err(EmailError::Malformed), "{bad}");
        }
    }

    #[test]
    fn test_trims_input() {
        let email: Email = "  clerk@shop.example\n".parse().unwrap();
        assert_eq!(email.as_str(), "clerk@shop.example");
        assert_eq!(email.to_string(), "clerk@shop.example");
    }
}
