//! Backend error types.

use thiserror::Error;

use gastro_serra_core::EmailError;

/// Errors from the authentication provider or local credential checks.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email failed local validation.
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),

    /// The password is shorter than the sign-up minimum.
    #[error("A senha deve ter pelo menos {min} caracteres.")]
    WeakPassword { min: usize },

    /// The provider refused the request; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a body we could not read.
    #[error("unexpected auth response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The browser session could not be read or written.
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// Text to show the user on the login page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) | Self::WeakPassword { .. } | Self::Rejected(_) => {
                self.to_string()
            }
            Self::Http(_) | Self::Parse(_) | Self::Session(_) => {
                "Ocorreu um erro. Tente novamente.".to_string()
            }
        }
    }
}

/// Errors from the `restaurants` table.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the request (constraint, policy, validation).
    #[error("{message}")]
    Rejected {
        message: String,
        code: Option<String>,
    },

    /// No row matched the id within the caller's scope.
    #[error("Restaurante não encontrado.")]
    NotFound,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a body we could not read.
    #[error("unexpected store response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StoreError {
    /// Message to surface verbatim, or `None` when the caller should show
    /// its own fallback.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Rejected { message, .. } if message.trim().is_empty() => None,
            Self::Rejected { message, .. } => Some(message.clone()),
            Self::NotFound => Some(self.to_string()),
            Self::Http(e) => Some(e.to_string()),
            Self::Parse(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_is_verbatim() {
        let err = AuthError::Rejected("Invalid login credentials".to_string());
        assert_eq!(err.user_message(), "Invalid login credentials");

        let err = StoreError::Rejected {
            message: "new row violates row-level security policy".to_string(),
            code: Some("42501".to_string()),
        };
        assert_eq!(
            err.user_message().as_deref(),
            Some("new row violates row-level security policy")
        );
    }

    #[test]
    fn test_local_validation_messages() {
        let err = AuthError::WeakPassword { min: 6 };
        assert_eq!(err.user_message(), "A senha deve ter pelo menos 6 caracteres.");

        let err = AuthError::from(EmailError::Malformed);
        assert_eq!(err.user_message(), "Email inválido.");
    }

    #[test]
    fn test_blank_rejection_uses_fallback() {
        let err = StoreError::Rejected {
            message: "  ".to_string(),
            code: None,
        };
        assert_eq!(err.user_message(), None);
    }

    #[test]
    fn test_parse_errors_hide_details() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            AuthError::from(parse).user_message(),
            "Ocorreu um erro. Tente novamente."
        );
    }
}
