use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::core::session::AuthUser;

use super::error::BackendError;
use super::traits::{Identity, ProfileUpdate};

const IDENTITY_BASE: &str = "https://identitytoolkit.googleapis.com/v1";

/// Current id token, shared with the document-store and storage clients.
#[derive(Debug, Default)]
pub struct TokenCell(Mutex<Option<String>>);

impl TokenCell {
    pub fn set(&self, token: Option<String>) {
        *self.0.lock().expect("token lock") = token;
    }

    pub fn get(&self) -> Option<String> {
        self.0.lock().expect("token lock").clone()
    }
}

/// Identity Toolkit REST client. Sign-in state lives in process memory: the
/// id token in the shared [`TokenCell`], the user snapshot behind the watch
/// channel the auth observer hands out.
pub struct RestIdentity {
    http: Client,
    api_key: String,
    tokens: Arc<TokenCell>,
    observer: watch::Sender<Option<AuthUser>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

impl RestIdentity {
    pub fn new(http: Client, api_key: String, tokens: Arc<TokenCell>) -> Self {
        let (observer, _) = watch::channel(None);
        Self {
            http,
            api_key,
            tokens,
            observer,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", IDENTITY_BASE, method, self.api_key)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T, BackendError> {
        let resp = self
            .http
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(decode_identity_error(status.as_u16(), &text));
        }
        serde_json::from_str(&text)
            .map_err(|e| BackendError::Network(format!("malformed auth response: {}", e)))
    }

    /// Fetch the full profile for the signed-in user; the password endpoints
    /// do not return the photo URL.
    async fn lookup(&self, id_token: &str) -> Result<Option<LookupUser>, BackendError> {
        let body = serde_json::json!({ "idToken": id_token });
        let mut resp: LookupResponse = self.post("lookup", &body).await?;
        Ok(resp.users.drain(..).next())
    }

    fn publish(&self, user: Option<AuthUser>) {
        self.observer.send_replace(user);
    }
}

#[async_trait]
impl Identity for RestIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let resp: AuthResponse = self.post("signUp", &body).await?;
        self.tokens.set(Some(resp.id_token));

        let user = AuthUser {
            uid: resp.local_id,
            email: resp.email.unwrap_or_else(|| email.to_string()),
            display_name: None,
            photo_url: None,
        };
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let resp: AuthResponse = self.post("signInWithPassword", &body).await?;
        let id_token = resp.id_token.clone();
        self.tokens.set(Some(resp.id_token));

        // Prefer the lookup profile; fall back to the sign-in payload.
        let user = match self.lookup(&id_token).await {
            Ok(Some(profile)) => AuthUser {
                uid: profile.local_id,
                email: profile.email.unwrap_or_else(|| email.to_string()),
                display_name: profile.display_name,
                photo_url: profile.photo_url,
            },
            Ok(None) | Err(_) => AuthUser {
                uid: resp.local_id,
                email: resp.email.unwrap_or_else(|| email.to_string()),
                display_name: resp.display_name,
                photo_url: None,
            },
        };
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        // Password sessions have no revocation endpoint; dropping the token
        // and publishing the signed-out state is the whole operation.
        self.tokens.set(None);
        self.publish(None);
        Ok(())
    }

    async fn update_display_profile(
        &self,
        update: ProfileUpdate,
    ) -> Result<AuthUser, BackendError> {
        let id_token = self.tokens.get().ok_or(BackendError::NotSignedIn)?;
        let mut user = self.current_user().ok_or(BackendError::NotSignedIn)?;

        let body = UpdateRequest {
            id_token: &id_token,
            display_name: update.display_name.as_deref(),
            photo_url: update.photo_url.as_deref(),
            return_secure_token: false,
        };
        let _: serde_json::Value = self.post("update", &body).await?;

        if let Some(name) = update.display_name {
            user.display_name = Some(name);
        }
        if let Some(url) = update.photo_url {
            user.photo_url = Some(url);
        }
        self.publish(Some(user.clone()));
        Ok(user)
    }

    fn observe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.observer.subscribe()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.observer.borrow().clone()
    }
}

/// Identity errors arrive as `{"error":{"message":"CODE"}}`; some codes carry
/// a suffix ("WEAK_PASSWORD : Password should be at least 6 characters").
fn decode_identity_error(status: u16, body: &str) -> BackendError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        });

    match message {
        Some(raw) => {
            let code = raw.split(':').next().unwrap_or(&raw).trim().to_string();
            BackendError::credential(&code, &raw)
        }
        None => BackendError::Api {
            status,
            message: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_code() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND"}}"#;
        let e = decode_identity_error(400, body);
        assert_eq!(e.user_message(), "User not found.");
    }

    #[test]
    fn decodes_code_with_suffix() {
        let body =
            r#"{"error":{"code":400,"message":"WEAK_PASSWORD : Password should be at least 6 characters"}}"#;
        let e = decode_identity_error(400, body);
        assert_eq!(e.user_message(), "Password is too weak.");
    }

    #[test]
    fn non_json_body_is_an_api_error() {
        let e = decode_identity_error(502, "Bad Gateway");
        assert!(matches!(e, BackendError::Api { status: 502, .. }));
    }
}
