use thiserror::Error;

/// Failure of a backend call, classified the way the UI needs it: credential
/// problems carry a mapped human-readable message, a missing composite index
/// is distinguishable from other query failures, everything else is generic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Credential { code: String, message: String },
    #[error("query requires a composite index: {0}")]
    IndexRequired(String),
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("not signed in")]
    NotSignedIn,
}

impl BackendError {
    /// Build a credential error from an identity-provider error code. Known
    /// codes get a fixed message; unknown codes fall back to the raw backend
    /// message.
    pub fn credential(code: &str, raw_message: &str) -> Self {
        let message = known_credential_message(code)
            .map(|m| m.to_string())
            .unwrap_or_else(|| raw_message.to_string());
        Self::Credential {
            code: code.to_string(),
            message,
        }
    }

    pub fn is_index_required(&self) -> bool {
        matches!(self, Self::IndexRequired(_))
    }

    /// Text suitable for an inline notice. Credential errors already carry
    /// their mapped message; everything else collapses to a generic line so
    /// raw backend internals never reach the page.
    pub fn user_message(&self) -> String {
        match self {
            Self::Credential { message, .. } => message.clone(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Fixed messages for the identity-provider error codes the forms know about.
pub fn known_credential_message(code: &str) -> Option<&'static str> {
    match code {
        "INVALID_EMAIL" => Some("Invalid email."),
        "EMAIL_NOT_FOUND" => Some("User not found."),
        "INVALID_PASSWORD" => Some("Wrong password."),
        "USER_DISABLED" => Some("This account has been disabled."),
        "EMAIL_EXISTS" => Some("Email already in use."),
        "WEAK_PASSWORD" => Some("Password is too weak."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_fixed_messages() {
        let e = BackendError::credential("EMAIL_NOT_FOUND", "EMAIL_NOT_FOUND");
        assert_eq!(e.user_message(), "User not found.");
        let e = BackendError::credential("WEAK_PASSWORD", "WEAK_PASSWORD : too short");
        assert_eq!(e.user_message(), "Password is too weak.");
    }

    #[test]
    fn unknown_code_falls_back_to_raw_message() {
        let e = BackendError::credential("TOO_MANY_ATTEMPTS_TRY_LATER", "TOO_MANY_ATTEMPTS_TRY_LATER");
        assert_eq!(e.user_message(), "TOO_MANY_ATTEMPTS_TRY_LATER");
    }

    #[test]
    fn non_credential_errors_are_generic_to_users() {
        let e = BackendError::Api {
            status: 500,
            message: "internal".to_string(),
        };
        assert_eq!(e.user_message(), "Something went wrong. Please try again.");
        assert!(BackendError::IndexRequired("items".to_string()).is_index_required());
        assert!(!e.is_index_required());
    }
}
