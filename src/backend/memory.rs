use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::core::item::Item;
use crate::core::profile::ProfileRecord;
use crate::core::session::AuthUser;

use super::error::BackendError;
use super::traits::{
    BlobHandle, BlobStorage, DocumentStore, Identity, ItemQuery, NewItem, ProfileUpdate,
    Snapshot, SnapshotReceiver,
};

/// In-memory identity provider with the same observable behavior as the
/// hosted one, including its error codes. Backs the test suite and the
/// console demo mode.
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, MemoryAccount>>,
    observer: watch::Sender<Option<AuthUser>>,
}

struct MemoryAccount {
    password: String,
    user: AuthUser,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        let (observer, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            observer,
        }
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Identity for MemoryIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        if !email.contains('@') {
            return Err(BackendError::credential("INVALID_EMAIL", "INVALID_EMAIL"));
        }
        if password.len() < 6 {
            return Err(BackendError::credential(
                "WEAK_PASSWORD",
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        }

        let mut accounts = self.accounts.lock().expect("accounts lock");
        if accounts.contains_key(email) {
            return Err(BackendError::credential("EMAIL_EXISTS", "EMAIL_EXISTS"));
        }

        let user = AuthUser {
            uid: Uuid::new_v4().to_string(),
            email: email.to_string(),
            display_name: None,
            photo_url: None,
        };
        accounts.insert(
            email.to_string(),
            MemoryAccount {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        drop(accounts);

        self.observer.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        let accounts = self.accounts.lock().expect("accounts lock");
        let account = accounts
            .get(email)
            .ok_or_else(|| BackendError::credential("EMAIL_NOT_FOUND", "EMAIL_NOT_FOUND"))?;
        if account.password != password {
            return Err(BackendError::credential(
                "INVALID_PASSWORD",
                "INVALID_PASSWORD",
            ));
        }
        let user = account.user.clone();
        drop(accounts);

        self.observer.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.observer.send_replace(None);
        Ok(())
    }

    async fn update_display_profile(
        &self,
        update: ProfileUpdate,
    ) -> Result<AuthUser, BackendError> {
        let mut user = self.current_user().ok_or(BackendError::NotSignedIn)?;
        if let Some(name) = update.display_name {
            user.display_name = Some(name);
        }
        if let Some(url) = update.photo_url {
            user.photo_url = Some(url);
        }

        let mut accounts = self.accounts.lock().expect("accounts lock");
        if let Some(account) = accounts.get_mut(&user.email) {
            account.user = user.clone();
        }
        drop(accounts);

        self.observer.send_replace(Some(user.clone()));
        Ok(user)
    }

    fn observe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.observer.subscribe()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.observer.borrow().clone()
    }
}

/// In-memory document store. Every mutation synchronously pushes a fresh
/// snapshot to each matching subscription, so tests observe the same
/// replace-the-whole-list behavior as the live backend.
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    items: HashMap<String, Item>,
    profiles: HashMap<String, ProfileRecord>,
    subscribers: Vec<Subscriber>,
}

struct Subscriber {
    query: ItemQuery,
    tx: mpsc::UnboundedSender<Result<Snapshot, BackendError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    fn snapshot_for(state: &StoreState, query: &ItemQuery) -> Snapshot {
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
        items
    }

    fn notify(state: &mut StoreState) {
        let mut closed = Vec::new();
        for i in 0..state.subscribers.len() {
            let snapshot = Self::snapshot_for(state, &state.subscribers[i].query);
            if state.subscribers[i].tx.send(Ok(snapshot)).is_err() {
                closed.push(i);
            }
        }
        for i in closed.into_iter().rev() {
            state.subscribers.remove(i);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_key(item: &Item) -> DateTime<Utc> {
    item.created_at.unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_item(&self, item: NewItem) -> Result<String, BackendError> {
        let id = Uuid::new_v4().to_string();
        let record = Item {
            id: id.clone(),
            owner_id: item.owner_id,
            kind: item.kind,
            content: item.content,
            status: item.status,
            created_at: Some(Utc::now()),
        };

        let mut state = self.state.lock().expect("store lock");
        state.items.insert(id.clone(), record);
        Self::notify(&mut state);
        Ok(id)
    }

    async fn update_status(&self, id: &str, status: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().expect("store lock");
        match state.items.get_mut(id) {
            Some(item) => item.status = Some(status.to_string()),
            None => {
                return Err(BackendError::Api {
                    status: 404,
                    message: format!("no item {}", id),
                })
            }
        }
        Self::notify(&mut state);
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().expect("store lock");
        // Deleting a missing document succeeds, like the live store.
        state.items.remove(id);
        Self::notify(&mut state);
        Ok(())
    }

    async fn set_profile(&self, uid: &str, profile: &ProfileRecord) -> Result<(), BackendError> {
        let mut record = profile.clone();
        record.created_at = Some(Utc::now());
        let mut state = self.state.lock().expect("store lock");
        state.profiles.insert(uid.to_string(), record);
        Ok(())
    }

    async fn update_profile_fields(
        &self,
        uid: &str,
        name: Option<&str>,
        profile_image: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().expect("store lock");
        let record = state
            .profiles
            .get_mut(uid)
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("no profile record for {}", uid),
            })?;
        if let Some(name) = name {
            record.name = name.to_string();
        }
        if let Some(image) = profile_image {
            record.profile_image = Some(image.to_string());
        }
        Ok(())
    }

    async fn profile(&self, uid: &str) -> Result<Option<ProfileRecord>, BackendError> {
        let state = self.state.lock().expect("store lock");
        Ok(state.profiles.get(uid).cloned())
    }

    async fn run_query(&self, query: &ItemQuery) -> Result<Snapshot, BackendError> {
        let state = self.state.lock().expect("store lock");
        Ok(Self::snapshot_for(&state, query))
    }

    fn subscribe(&self, query: ItemQuery) -> SnapshotReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().expect("store lock");
        let initial = Self::snapshot_for(&state, &query);
        if tx.send(Ok(initial)).is_ok() {
            state.subscribers.push(Subscriber { query, tx });
        }
        rx
    }
}

/// In-memory blob storage; paths overwrite like the hosted bucket.
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, StoredBlob>>,
}

struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
    token: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("storage lock").len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobHandle, BackendError> {
        let token = Uuid::new_v4().to_string();
        let mut objects = self.objects.lock().expect("storage lock");
        objects.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
                token: token.clone(),
            },
        );
        Ok(BlobHandle {
            path: path.to_string(),
            token: Some(token),
        })
    }

    async fn download_url(&self, handle: &BlobHandle) -> Result<String, BackendError> {
        let objects = self.objects.lock().expect("storage lock");
        if !objects.contains_key(&handle.path) {
            return Err(BackendError::Api {
                status: 404,
                message: format!("no object at {}", handle.path),
            });
        }
        match &handle.token {
            Some(token) => Ok(format!("memory://{}?token={}", handle.path, token)),
            None => Ok(format!("memory://{}", handle.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::ItemKind;

    #[tokio::test]
    async fn subscribe_delivers_initial_then_per_mutation_snapshots() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe(ItemQuery::tasks("u1"));

        let initial = rx.recv().await.unwrap().unwrap();
        assert!(initial.is_empty());

        let id = store
            .create_item(NewItem::task("u1", "Buy milk"))
            .await
            .unwrap();
        let snapshot = rx.recv().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "Buy milk");
        assert_eq!(snapshot[0].status.as_deref(), Some("pending"));

        store.delete_item(&id).await.unwrap();
        let snapshot = rx.recv().await.unwrap().unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn subscriptions_are_query_scoped() {
        let store = MemoryStore::new();
        let mut notes_rx = store.subscribe(ItemQuery::notes("u1"));
        notes_rx.recv().await.unwrap().unwrap();

        store
            .create_item(NewItem::task("u1", "a task"))
            .await
            .unwrap();
        store
            .create_item(NewItem::note("u1", "a note"))
            .await
            .unwrap();

        // Task creation produced an unchanged-but-resent note snapshot, then
        // the note arrives.
        let first = notes_rx.recv().await.unwrap().unwrap();
        assert!(first.is_empty());
        let second = notes_rx.recv().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, ItemKind::Note);
    }

    #[tokio::test]
    async fn history_subscription_sees_legacy_done() {
        let store = MemoryStore::new();
        let id = store
            .create_item(NewItem::task("u1", "old task"))
            .await
            .unwrap();
        store.update_status(&id, "done").await.unwrap();

        let mut rx = store.subscribe(ItemQuery::completed_tasks("u1"));
        let snapshot = rx.recv().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].status.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn storage_overwrites_same_path() {
        let storage = MemoryStorage::new();
        let first = storage
            .upload("profile_images/u1/a.png", vec![1], "image/png")
            .await
            .unwrap();
        let second = storage
            .upload("profile_images/u1/a.png", vec![2], "image/png")
            .await
            .unwrap();
        assert_eq!(storage.object_count(), 1);
        assert_ne!(first.token, second.token);

        // Stale handles no longer resolve; the fresh one does.
        let url = storage.download_url(&second).await.unwrap();
        assert!(url.starts_with("memory://profile_images/u1/a.png"));
    }
}
