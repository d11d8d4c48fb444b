use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The document-store mirror of the identity profile, kept in `users/{uid}`.
///
/// `name` and `profile_image` track the identity provider's display name and
/// photo URL; `created_at` is written once at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            profile_image: None,
            created_at: None,
        }
    }
}

/// Trim a submitted display name; `None` means the update is a silent no-op.
pub fn normalized_name(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Storage object path for a profile photo. Re-uploading the same filename
/// overwrites the previous object (last write wins).
pub fn photo_path(uid: &str, filename: &str) -> String {
    format!("profile_images/{}/{}", uid, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_name_trims_and_rejects_empty() {
        assert_eq!(normalized_name("  Ann  "), Some("Ann".to_string()));
        assert_eq!(normalized_name("Ann"), Some("Ann".to_string()));
        assert_eq!(normalized_name(""), None);
        assert_eq!(normalized_name("   "), None);
    }

    #[test]
    fn photo_path_is_keyed_by_user_and_filename() {
        assert_eq!(
            photo_path("u1", "avatar.png"),
            "profile_images/u1/avatar.png"
        );
    }
}
