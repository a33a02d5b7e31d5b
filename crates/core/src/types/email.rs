//! Email address type used for sign-in and sign-up.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
///
/// Messages are user-facing and shown on the login page.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("Informe um email.")]
    Empty,
    /// The input is longer than RFC 5321 allows.
    #[error("O email deve ter no máximo {max} caracteres.")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not `local@domain`.
    #[error("Email inválido.")]
    Malformed,
}

/// A normalized email address.
///
/// The hosted auth provider compares addresses case-insensitively and
/// stores them lowercased, so parsing trims surrounding whitespace (as
/// submitted by an HTML form) and lowercases the whole address.
///
/// ## Constraints
///
/// - Length: 1-254 characters (RFC 5321 limit)
/// - Exactly one `@`, with non-empty text on both sides
/// - No whitespace inside the address
///
/// ## Examples
///
/// ```
/// use gastro_serra_core::Email;
///
/// let email = Email::parse("  Chef@Serra.com.br ").unwrap();
/// assert_eq!(email.as_str(), "chef@serra.com.br");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("sem-arroba").is_err());
/// assert!(Email::parse("a@b@c").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an `Email`.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Empty` for blank input, `EmailError::TooLong`
    /// past 254 characters and `EmailError::Malformed` otherwise.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::Malformed)?;
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || s.chars().any(char::is_whitespace)
        {
            return Err(EmailError::Malformed);
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
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

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
