use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::core::item::{Item, ItemKind, STATUS_COMPLETED, STATUS_DONE_LEGACY, STATUS_PENDING};
use crate::core::profile::ProfileRecord;
use crate::core::session::AuthUser;

use super::error::BackendError;

/// Fields for a new item; the id and creation timestamp are assigned by the
/// store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub owner_id: String,
    pub kind: ItemKind,
    pub content: String,
    pub status: Option<String>,
}

impl NewItem {
    /// A task starts its lifecycle pending.
    pub fn task(owner_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind: ItemKind::Task,
            content: content.into(),
            status: Some(STATUS_PENDING.to_string()),
        }
    }

    /// Notes never carry a status.
    pub fn note(owner_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind: ItemKind::Note,
            content: content.into(),
            status: None,
        }
    }
}

/// One of the three live list queries. All are owner-scoped and ordered by
/// creation time descending on the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemQuery {
    pub owner_id: String,
    pub kind: ItemKind,
    /// `Some` restricts to these literal status values (the history query).
    pub statuses: Option<Vec<String>>,
}

impl ItemQuery {
    pub fn tasks(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind: ItemKind::Task,
            statuses: None,
        }
    }

    pub fn notes(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind: ItemKind::Note,
            statuses: None,
        }
    }

    /// History query; matches the legacy completion literal as well.
    pub fn completed_tasks(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind: ItemKind::Task,
            statuses: Some(vec![
                STATUS_COMPLETED.to_string(),
                STATUS_DONE_LEGACY.to_string(),
            ]),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        if item.owner_id != self.owner_id || item.kind != self.kind {
            return false;
        }
        match &self.statuses {
            Some(statuses) => match item.status.as_deref() {
                Some(status) => statuses.iter().any(|s| s == status),
                None => false,
            },
            None => true,
        }
    }
}

/// A full-replacement batch of matching records.
pub type Snapshot = Vec<Item>;

/// Stream of snapshots for one subscription; an `Err` ends the stream.
pub type SnapshotReceiver = mpsc::UnboundedReceiver<Result<Snapshot, BackendError>>;

/// Partial identity-profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// The identity provider seam.
#[async_trait]
pub trait Identity: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Update the signed-in user's display profile.
    async fn update_display_profile(&self, update: ProfileUpdate)
        -> Result<AuthUser, BackendError>;

    /// Auth-state observer: yields the current identity immediately and on
    /// every change.
    fn observe(&self) -> watch::Receiver<Option<AuthUser>>;

    fn current_user(&self) -> Option<AuthUser>;
}

/// The document store seam.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create an item, returning its assigned id.
    async fn create_item(&self, item: NewItem) -> Result<String, BackendError>;

    async fn update_status(&self, id: &str, status: &str) -> Result<(), BackendError>;

    async fn delete_item(&self, id: &str) -> Result<(), BackendError>;

    /// Write the mirrored profile record for a user (registration).
    async fn set_profile(&self, uid: &str, profile: &ProfileRecord) -> Result<(), BackendError>;

    /// Partial update of the mirrored profile record.
    async fn update_profile_fields(
        &self,
        uid: &str,
        name: Option<&str>,
        profile_image: Option<&str>,
    ) -> Result<(), BackendError>;

    async fn profile(&self, uid: &str) -> Result<Option<ProfileRecord>, BackendError>;

    /// One-shot evaluation of a query.
    async fn run_query(&self, query: &ItemQuery) -> Result<Snapshot, BackendError>;

    /// Live subscription: delivers the current result set once, then a fresh
    /// snapshot after every matching change.
    fn subscribe(&self, query: ItemQuery) -> SnapshotReceiver;
}

/// Opaque handle to an uploaded object.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobHandle {
    pub path: String,
    pub token: Option<String>,
}

/// The blob storage seam.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobHandle, BackendError>;

    /// Resolve a handle to a URL the page can load.
    async fn download_url(&self, handle: &BlobHandle) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(owner: &str, kind: ItemKind, status: Option<&str>) -> Item {
        Item {
            id: "i".to_string(),
            owner_id: owner.to_string(),
            kind,
            content: String::new(),
            status: status.map(|s| s.to_string()),
            created_at: None,
        }
    }

    #[test]
    fn task_query_matches_all_statuses() {
        let q = ItemQuery::tasks("u1");
        assert!(q.matches(&item("u1", ItemKind::Task, None)));
        assert!(q.matches(&item("u1", ItemKind::Task, Some("completed"))));
        assert!(!q.matches(&item("u1", ItemKind::Note, None)));
        assert!(!q.matches(&item("u2", ItemKind::Task, None)));
    }

    #[test]
    fn history_query_matches_both_completion_literals() {
        let q = ItemQuery::completed_tasks("u1");
        assert!(q.matches(&item("u1", ItemKind::Task, Some("completed"))));
        assert!(q.matches(&item("u1", ItemKind::Task, Some("done"))));
        assert!(!q.matches(&item("u1", ItemKind::Task, Some("pending"))));
        assert!(!q.matches(&item("u1", ItemKind::Task, None)));
    }
}
