pub mod auth;
pub mod error;
pub mod firestore;
pub mod guest;
pub mod memory;
pub mod storage;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::SlateConfig;
use crate::core::item::{advance, Item};
use crate::core::profile::{normalized_name, photo_path, ProfileRecord};
use crate::core::session::{resolve, AuthUser, Session};

pub use error::BackendError;
pub use traits::{
    BlobHandle, BlobStorage, DocumentStore, Identity, ItemQuery, NewItem, ProfileUpdate,
    Snapshot, SnapshotReceiver,
};

use auth::{RestIdentity, TokenCell};
use firestore::RestDocumentStore;
use guest::GuestFlag;
use memory::{MemoryIdentity, MemoryStorage, MemoryStore};
use storage::RestBlobStorage;

/// Handles to the backend services plus the local guest flag, built once at
/// startup and passed to everything that talks to the platform.
pub struct ClientContext {
    pub identity: Arc<dyn Identity>,
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn BlobStorage>,
    pub guest: GuestFlag,
}

impl ClientContext {
    pub fn new(
        identity: Arc<dyn Identity>,
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn BlobStorage>,
        guest: GuestFlag,
    ) -> Self {
        Self {
            identity,
            store,
            storage,
            guest,
        }
    }

    /// Wire up the REST clients against the configured project. One HTTP
    /// client and one token cell are shared across all three services.
    pub fn connect(config: &SlateConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to build HTTP client: {}", e)))?;
        let tokens = Arc::new(TokenCell::default());

        let identity = Arc::new(RestIdentity::new(
            http.clone(),
            config.api_key.clone(),
            tokens.clone(),
        ));
        let store = Arc::new(RestDocumentStore::new(
            http.clone(),
            config.project_id.clone(),
            tokens.clone(),
            Duration::from_secs(config.poll_interval_secs.max(1)),
        ));
        let storage = Arc::new(RestBlobStorage::new(
            http,
            config.storage_bucket.clone(),
            tokens,
        ));

        Ok(Self::new(identity, store, storage, GuestFlag::new()))
    }

    /// Fully in-memory context for the test suite and the console demo mode.
    /// The guest flag gets a throwaway path so parallel instances never share
    /// state.
    pub fn memory() -> Self {
        let guest_path = std::env::temp_dir()
            .join("slate")
            .join(format!("guest-{}", uuid::Uuid::new_v4()));
        Self::new(
            Arc::new(MemoryIdentity::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStorage::new()),
            GuestFlag::at(guest_path),
        )
    }

    /// Current session: the identity signal combined with the guest flag.
    pub fn resolve_session(&self) -> Session {
        resolve(self.identity.current_user(), self.guest.is_set())
    }

    /// Create the account, set the display name, and mirror the profile into
    /// the document store. The mirror record is written exactly once, here.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, BackendError> {
        self.identity.create_account(email, password).await?;
        let user = self
            .identity
            .update_display_profile(ProfileUpdate {
                display_name: Some(name.to_string()),
                photo_url: None,
            })
            .await?;
        self.store
            .set_profile(&user.uid, &ProfileRecord::new(name, email))
            .await?;
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        self.identity.sign_in(email, password).await
    }

    /// Clear the guest flag unconditionally, then sign out of the identity
    /// provider. A guest has no provider session to terminate, so a failure
    /// here is logged and never blocks leaving.
    pub async fn sign_out(&self) {
        self.guest.clear();
        if let Err(e) = self.identity.sign_out().await {
            log::info!("Sign out (guest or error): {}", e);
        }
    }

    pub fn enter_guest_mode(&self) {
        if let Err(e) = self.guest.set() {
            log::warn!("Failed to set guest flag: {}", e);
        }
    }

    pub async fn add_task(&self, content: &str) -> Result<String, BackendError> {
        let user = self.identity.current_user().ok_or(BackendError::NotSignedIn)?;
        self.store.create_item(NewItem::task(user.uid, content)).await
    }

    pub async fn add_note(&self, content: &str) -> Result<String, BackendError> {
        let user = self.identity.current_user().ok_or(BackendError::NotSignedIn)?;
        self.store.create_item(NewItem::note(user.uid, content)).await
    }

    /// Advance a task one step through its lifecycle. Returns `false` when
    /// the computed next status equals the current one (terminal or
    /// unrecognized) and no write was issued.
    pub async fn advance_item(&self, item: &Item) -> Result<bool, BackendError> {
        let next = advance(item.status.as_deref());
        if item.status.as_deref() == Some(next.as_str()) {
            return Ok(false);
        }
        self.store.update_status(&item.id, &next).await?;
        Ok(true)
    }

    pub async fn delete_item(&self, id: &str) -> Result<(), BackendError> {
        self.store.delete_item(id).await
    }

    /// Display-name update: a blank submission is a silent no-op; otherwise
    /// the identity profile and the mirrored record are written as a pair.
    /// If the second write fails the first is not rolled back; the stores
    /// stay inconsistent until the next successful update.
    pub async fn update_profile_name(
        &self,
        user: &AuthUser,
        input: &str,
    ) -> Result<Option<AuthUser>, BackendError> {
        let Some(name) = normalized_name(input) else {
            return Ok(None);
        };
        let updated = self
            .identity
            .update_display_profile(ProfileUpdate {
                display_name: Some(name.clone()),
                photo_url: None,
            })
            .await?;
        self.store
            .update_profile_fields(&user.uid, Some(&name), None)
            .await?;
        Ok(Some(updated))
    }

    /// Photo update: upload under the per-user path (same filename
    /// overwrites), then write the retrievable URL to both stores with the
    /// same pairing semantics as the name update.
    pub async fn update_profile_photo(
        &self,
        user: &AuthUser,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<AuthUser, BackendError> {
        let path = photo_path(&user.uid, filename);
        let handle = self.storage.upload(&path, bytes, content_type).await?;
        let url = self.storage.download_url(&handle).await?;

        let updated = self
            .identity
            .update_display_profile(ProfileUpdate {
                display_name: None,
                photo_url: Some(url.clone()),
            })
            .await?;
        self.store
            .update_profile_fields(&user.uid, None, Some(&url))
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Session;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Store decorator counting mirror-profile writes and optionally failing
    /// the partial-update path.
    struct InstrumentedStore {
        inner: MemoryStore,
        set_profile_calls: AtomicUsize,
        fail_profile_updates: AtomicBool,
    }

    impl InstrumentedStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                set_profile_calls: AtomicUsize::new(0),
                fail_profile_updates: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for InstrumentedStore {
        async fn create_item(&self, item: NewItem) -> Result<String, BackendError> {
            self.inner.create_item(item).await
        }

        async fn update_status(&self, id: &str, status: &str) -> Result<(), BackendError> {
            self.inner.update_status(id, status).await
        }

        async fn delete_item(&self, id: &str) -> Result<(), BackendError> {
            self.inner.delete_item(id).await
        }

        async fn set_profile(
            &self,
            uid: &str,
            profile: &crate::core::profile::ProfileRecord,
        ) -> Result<(), BackendError> {
            self.set_profile_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.set_profile(uid, profile).await
        }

        async fn update_profile_fields(
            &self,
            uid: &str,
            name: Option<&str>,
            profile_image: Option<&str>,
        ) -> Result<(), BackendError> {
            if self.fail_profile_updates.load(Ordering::SeqCst) {
                return Err(BackendError::Api {
                    status: 503,
                    message: "mirror write refused".to_string(),
                });
            }
            self.inner.update_profile_fields(uid, name, profile_image).await
        }

        async fn profile(
            &self,
            uid: &str,
        ) -> Result<Option<crate::core::profile::ProfileRecord>, BackendError> {
            self.inner.profile(uid).await
        }

        async fn run_query(&self, query: &ItemQuery) -> Result<Snapshot, BackendError> {
            self.inner.run_query(query).await
        }

        fn subscribe(&self, query: ItemQuery) -> SnapshotReceiver {
            self.inner.subscribe(query)
        }
    }

    fn instrumented_context() -> (ClientContext, Arc<InstrumentedStore>) {
        let store = Arc::new(InstrumentedStore::new());
        let guest_path = std::env::temp_dir()
            .join("slate")
            .join(format!("guest-{}", uuid::Uuid::new_v4()));
        let ctx = ClientContext::new(
            Arc::new(MemoryIdentity::new()),
            store.clone(),
            Arc::new(MemoryStorage::new()),
            GuestFlag::at(guest_path),
        );
        (ctx, store)
    }

    #[tokio::test]
    async fn register_sets_display_name_and_mirrors_profile_once() {
        let (ctx, store) = instrumented_context();
        let user = ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();

        assert_eq!(user.display_name.as_deref(), Some("Ann"));
        assert_eq!(store.set_profile_calls.load(Ordering::SeqCst), 1);

        let record = ctx.store.profile(&user.uid).await.unwrap().unwrap();
        assert_eq!(record.name, "Ann");
        assert_eq!(record.email, "ann@x.com");
        assert!(record.created_at.is_some());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let ctx = ClientContext::memory();
        ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();
        let err = ctx
            .register("Ann again", "ann@x.com", "secret1")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Email already in use.");
    }

    #[tokio::test]
    async fn sign_in_errors_map_to_fixed_messages() {
        let ctx = ClientContext::memory();
        ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();
        ctx.sign_out().await;

        let err = ctx.sign_in("nobody@x.com", "secret1").await.unwrap_err();
        assert_eq!(err.user_message(), "User not found.");
        let err = ctx.sign_in("ann@x.com", "wrong!").await.unwrap_err();
        assert_eq!(err.user_message(), "Wrong password.");
    }

    #[tokio::test]
    async fn blank_profile_name_is_a_silent_noop() {
        let ctx = ClientContext::memory();
        let user = ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();

        let result = ctx.update_profile_name(&user, "   ").await.unwrap();
        assert!(result.is_none());
        let current = ctx.identity.current_user().unwrap();
        assert_eq!(current.display_name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn profile_name_update_writes_both_stores() {
        let ctx = ClientContext::memory();
        let user = ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();

        let updated = ctx
            .update_profile_name(&user, "  Ann Lee  ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Ann Lee"));

        let record = ctx.store.profile(&user.uid).await.unwrap().unwrap();
        assert_eq!(record.name, "Ann Lee");
    }

    #[tokio::test]
    async fn partial_profile_failure_is_not_rolled_back() {
        let (ctx, store) = instrumented_context();
        let user = ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();
        store.fail_profile_updates.store(true, Ordering::SeqCst);

        let err = ctx.update_profile_name(&user, "Ann Lee").await.unwrap_err();
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");

        // The identity write landed before the mirror write failed and stays.
        let current = ctx.identity.current_user().unwrap();
        assert_eq!(current.display_name.as_deref(), Some("Ann Lee"));
        let record = ctx.store.profile(&user.uid).await.unwrap().unwrap();
        assert_eq!(record.name, "Ann");
    }

    #[tokio::test]
    async fn photo_update_writes_url_to_both_stores() {
        let ctx = ClientContext::memory();
        let user = ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();

        let updated = ctx
            .update_profile_photo(&user, "avatar.png", vec![0xff, 0xd8], "image/png")
            .await
            .unwrap();
        let url = updated.photo_url.unwrap();
        assert!(url.contains(&format!("profile_images/{}/avatar.png", user.uid)));

        let record = ctx.store.profile(&user.uid).await.unwrap().unwrap();
        assert_eq!(record.profile_image.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn advance_writes_once_then_goes_quiet_at_terminal() {
        let ctx = ClientContext::memory();
        ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();
        let id = ctx.add_task("Buy milk").await.unwrap();

        let user = ctx.identity.current_user().unwrap();
        let items = ctx
            .store
            .run_query(&ItemQuery::tasks(user.uid.clone()))
            .await
            .unwrap();
        let item = items.iter().find(|i| i.id == id).unwrap().clone();

        assert!(ctx.advance_item(&item).await.unwrap());
        let items = ctx
            .store
            .run_query(&ItemQuery::tasks(user.uid.clone()))
            .await
            .unwrap();
        let item = items.iter().find(|i| i.id == id).unwrap().clone();
        assert_eq!(item.status.as_deref(), Some("in_progress"));

        assert!(ctx.advance_item(&item).await.unwrap());
        let items = ctx
            .store
            .run_query(&ItemQuery::tasks(user.uid))
            .await
            .unwrap();
        let item = items.iter().find(|i| i.id == id).unwrap().clone();
        assert_eq!(item.status.as_deref(), Some("completed"));

        // Terminal: no further write is issued.
        assert!(!ctx.advance_item(&item).await.unwrap());
    }

    #[tokio::test]
    async fn sign_out_clears_guest_flag_and_identity() {
        let ctx = ClientContext::memory();
        ctx.enter_guest_mode();
        assert_eq!(ctx.resolve_session(), Session::Guest);

        ctx.sign_out().await;
        assert_eq!(ctx.resolve_session(), Session::Unauthenticated);
        // Idempotent on an absent flag.
        ctx.sign_out().await;
        assert_eq!(ctx.resolve_session(), Session::Unauthenticated);
    }

    #[tokio::test]
    async fn identity_wins_over_stale_guest_flag() {
        let ctx = ClientContext::memory();
        ctx.enter_guest_mode();
        ctx.register("Ann", "ann@x.com", "secret1").await.unwrap();
        assert!(matches!(ctx.resolve_session(), Session::Authenticated(_)));
        ctx.guest.clear();
    }
}
