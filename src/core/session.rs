use serde::{Deserialize, Serialize};

/// Snapshot of the identity-provider user, as delivered by the auth observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl AuthUser {
    /// Name shown in the header: display name if set, else the email local
    /// part.
    pub fn display_name(&self) -> String {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

/// Runtime-derived session state. Guest is a client-local preview mode with
/// no backend identity behind it.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Unauthenticated,
    Guest,
    Authenticated(AuthUser),
}

impl Session {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Whether the signed-in UI chrome should show.
    pub fn is_signed_in(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Authenticated(user) => user.display_name(),
            Self::Guest => "Guest User (Preview)".to_string(),
            Self::Unauthenticated => String::new(),
        }
    }
}

/// Combine the identity signal with the local guest flag. A real identity
/// always wins over the flag.
pub fn resolve(user: Option<AuthUser>, guest: bool) -> Session {
    match user {
        Some(user) => Session::Authenticated(user),
        None if guest => Session::Guest,
        None => Session::Unauthenticated,
    }
}

/// The page surface, by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Index,
    Login,
    Register,
    Dashboard,
    TaskHistory,
    Profile,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Index => "Home",
            Self::Login => "Log In",
            Self::Register => "Register",
            Self::Dashboard => "Dashboard",
            Self::TaskHistory => "Task History",
            Self::Profile => "Profile",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Index => "index.html",
            Self::Login => "login.html",
            Self::Register => "register.html",
            Self::Dashboard => "dashboard.html",
            Self::TaskHistory => "task_history.html",
            Self::Profile => "profile.html",
        }
    }

    /// Pages that require a session (real or guest preview) to make sense.
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Dashboard | Self::TaskHistory | Self::Profile)
    }

    /// Landing and credential pages; a signed-in visitor is bounced to the
    /// dashboard.
    pub fn is_auth_page(&self) -> bool {
        matches!(self, Self::Index | Self::Login | Self::Register)
    }

    pub const ALL: &'static [Page] = &[
        Page::Index,
        Page::Login,
        Page::Register,
        Page::Dashboard,
        Page::TaskHistory,
        Page::Profile,
    ];
}

/// Access decision for a page under a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    RedirectToDashboard,
    RedirectToLogin,
}

/// Decide what visiting `page` does under `session`.
///
/// Guests get the same treatment as authenticated users here; what they do
/// NOT get is data: no subscriptions are ever established for a guest
/// session, so protected pages render without live content.
pub fn page_access(session: &Session, page: Page) -> Access {
    match session {
        Session::Authenticated(_) | Session::Guest => {
            if page.is_auth_page() {
                Access::RedirectToDashboard
            } else {
                Access::Allow
            }
        }
        Session::Unauthenticated => {
            if page.is_protected() {
                Access::RedirectToLogin
            } else {
                Access::Allow
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthUser {
        AuthUser {
            uid: "u1".to_string(),
            email: "ann@x.com".to_string(),
            display_name: Some("Ann".to_string()),
            photo_url: None,
        }
    }

    #[test]
    fn resolve_prefers_identity_over_guest_flag() {
        assert_eq!(
            resolve(Some(user()), true),
            Session::Authenticated(user())
        );
        assert_eq!(resolve(None, true), Session::Guest);
        assert_eq!(resolve(None, false), Session::Unauthenticated);
    }

    #[test]
    fn authenticated_bounced_off_auth_pages() {
        let session = Session::Authenticated(user());
        assert_eq!(page_access(&session, Page::Login), Access::RedirectToDashboard);
        assert_eq!(page_access(&session, Page::Index), Access::RedirectToDashboard);
        assert_eq!(page_access(&session, Page::Dashboard), Access::Allow);
        assert_eq!(page_access(&session, Page::Profile), Access::Allow);
    }

    #[test]
    fn guest_allowed_on_dashboard_without_redirect() {
        assert_eq!(page_access(&Session::Guest, Page::Dashboard), Access::Allow);
        assert_eq!(
            page_access(&Session::Guest, Page::Register),
            Access::RedirectToDashboard
        );
    }

    #[test]
    fn unauthenticated_redirected_from_protected_pages() {
        let session = Session::Unauthenticated;
        assert_eq!(page_access(&session, Page::Dashboard), Access::RedirectToLogin);
        assert_eq!(page_access(&session, Page::TaskHistory), Access::RedirectToLogin);
        assert_eq!(page_access(&session, Page::Profile), Access::RedirectToLogin);
        assert_eq!(page_access(&session, Page::Login), Access::Allow);
        assert_eq!(page_access(&session, Page::Index), Access::Allow);
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let mut u = user();
        u.display_name = None;
        assert_eq!(u.display_name(), "ann");
        assert_eq!(Session::Guest.display_name(), "Guest User (Preview)");
    }
}
